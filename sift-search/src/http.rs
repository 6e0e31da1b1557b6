//! HTTP backend for the todo server's REST API.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use sift_core::{BatchAction, FilterCriteria, Item, ResultPage};

use crate::backend::SearchBackend;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    todos: Vec<Item>,
    total: Option<usize>,
    page: Option<u32>,
}

impl HttpBackend {
    /// `token` is sent as a bearer token when non-empty.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            let bearer = format!("Bearer {}", token.trim());
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&bearer)?);
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn todos_url(&self) -> String {
        format!("{}/api/todos", self.base_url)
    }
}

/// Query string for `GET /api/todos/search`. Unset filters are omitted.
pub fn search_params(criteria: &FilterCriteria) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    let q = criteria.trimmed_query();
    match (q.is_empty(), criteria.task_number) {
        (false, _) => params.push(("q", q.to_string())),
        // The server matches `#n` queries against task numbers.
        (true, Some(n)) => params.push(("q", format!("#{n}"))),
        (true, None) => {}
    }
    if !criteria.tags.is_empty() {
        let tags: Vec<&str> = criteria.tags.iter().map(String::as_str).collect();
        params.push(("tags", tags.join(",")));
    }
    if let Some(p) = criteria.priority.as_param() {
        params.push(("priority", p.to_string()));
    }
    if let Some(s) = criteria.status.as_param() {
        params.push(("status", s.to_string()));
    }
    if let Some(d) = criteria.start_date {
        params.push(("startDate", d.format("%Y-%m-%d").to_string()));
    }
    if let Some(d) = criteria.end_date {
        params.push(("endDate", d.format("%Y-%m-%d").to_string()));
    }
    if let Some(m) = criteria.min_duration {
        params.push(("minDuration", m.to_string()));
    }
    if let Some(m) = criteria.max_duration {
        params.push(("maxDuration", m.to_string()));
    }
    if criteria.flagged_only {
        params.push(("flagged", "1".to_string()));
    }
    if let Some(n) = criteria.task_number {
        params.push(("taskNumber", n.to_string()));
    }
    params.push(("sortBy", criteria.sort.as_param().to_string()));
    params.push(("page", criteria.page.max(1).to_string()));
    params.push(("limit", criteria.page_size.to_string()));
    params
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn search(&self, criteria: &FilterCriteria) -> Result<ResultPage> {
        let url = format!("{}/search", self.todos_url());
        let resp = self
            .client
            .get(&url)
            .query(&search_params(criteria))
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("search failed: {status} {body}");
        }

        let parsed: SearchResponse = resp.json().await.context("parse search response")?;
        let total = parsed.total.unwrap_or(parsed.todos.len());
        Ok(ResultPage {
            items: parsed.todos,
            total,
            page: parsed.page.unwrap_or(criteria.page).max(1),
        })
    }

    async fn batch_mutate(&self, action: BatchAction, ids: &[String]) -> Result<()> {
        for id in ids {
            let url = format!("{}/{}", self.todos_url(), id);
            let req = match action {
                BatchAction::Delete => self.client.delete(&url),
                BatchAction::Complete | BatchAction::Uncomplete => self
                    .client
                    .patch(&url)
                    .json(&serde_json::json!({ "isCompleted": action == BatchAction::Complete })),
            };
            let resp = req.send().await.with_context(|| format!("{action:?} {url}"))?;
            if !resp.status().is_success() {
                bail!("{action:?} {id} failed: {}", resp.status());
            }
        }
        Ok(())
    }
}
