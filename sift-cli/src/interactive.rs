//! Line-oriented driver for the coordinator.
//!
//! Each stdin line is one edit or action; the view is reprinted whenever
//! the coordinator publishes a new one.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use sift_core::{BatchAction, FilterCriteria, PriorityFilter, SortBy, StatusFilter};
use sift_search::SearchHandle;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::render_view;

pub const HELP: &str = "\
q <text>            set the search text (empty clears)
tag <id>            toggle a required tag
priority <p>        any|low|medium|high
status <s>          any|active|completed
flagged             toggle flagged-only
from <date>|-       start date (YYYY-MM-DD), - clears
to <date>|-         end date, - clears
min <n>|- / max <n>|-  duration bounds in minutes
task <n>|-          task number
sort <s>            date-asc|date-desc|priority|duration|name
next / prev         change page
search              query the server now
clear               reset every filter
done|undo|delete <id>...  batch action on todos
show / help / quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Query(String),
    ToggleTag(String),
    Priority(PriorityFilter),
    Status(StatusFilter),
    ToggleFlagged,
    From(Option<NaiveDate>),
    To(Option<NaiveDate>),
    MinDuration(Option<u32>),
    MaxDuration(Option<u32>),
    TaskNumber(Option<u32>),
    Sort(SortBy),
    Next,
    Prev,
    Search,
    Clear,
    Batch(BatchAction, Vec<String>),
    Show,
    Help,
    Quit,
}

/// `-` or nothing clears an optional value.
fn optional<T: std::str::FromStr>(arg: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match arg {
        "" | "-" => Ok(None),
        s => s.parse().map(Some).map_err(|e| anyhow::anyhow!("bad value {s:?}: {e}")),
    }
}

pub fn parse_line(line: &str) -> Result<Option<Input>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };

    let input = match cmd.to_lowercase().as_str() {
        "q" | "query" => Input::Query(arg.to_string()),
        "tag" => {
            if arg.is_empty() {
                bail!("tag needs a tag id");
            }
            Input::ToggleTag(arg.to_string())
        }
        "priority" => Input::Priority(arg.parse()?),
        "status" => Input::Status(arg.parse()?),
        "flagged" => Input::ToggleFlagged,
        "from" => Input::From(optional(arg)?),
        "to" => Input::To(optional(arg)?),
        "min" => Input::MinDuration(optional(arg)?),
        "max" => Input::MaxDuration(optional(arg)?),
        "task" => Input::TaskNumber(optional(arg.trim_start_matches('#'))?),
        "sort" => Input::Sort(arg.parse()?),
        "next" | "n" => Input::Next,
        "prev" | "p" => Input::Prev,
        "search" => Input::Search,
        "clear" => Input::Clear,
        action @ ("done" | "complete" | "undo" | "uncomplete" | "delete") => {
            let ids: Vec<String> = arg.split_whitespace().map(str::to_string).collect();
            if ids.is_empty() {
                bail!("{action} needs at least one todo id");
            }
            Input::Batch(action.parse()?, ids)
        }
        "show" => Input::Show,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => bail!("unknown command: {other} (try `help`)"),
    };
    Ok(Some(input))
}

/// Apply a criteria edit. Returns false for inputs that are not edits.
pub fn apply_edit(criteria: &mut FilterCriteria, input: &Input) -> bool {
    match input {
        Input::Query(q) => criteria.query = q.clone(),
        Input::ToggleTag(id) => {
            if !criteria.tags.remove(id) {
                criteria.tags.insert(id.clone());
            }
        }
        Input::Priority(p) => criteria.priority = *p,
        Input::Status(s) => criteria.status = *s,
        Input::ToggleFlagged => criteria.flagged_only = !criteria.flagged_only,
        Input::From(d) => criteria.start_date = *d,
        Input::To(d) => criteria.end_date = *d,
        Input::MinDuration(m) => criteria.min_duration = *m,
        Input::MaxDuration(m) => criteria.max_duration = *m,
        Input::TaskNumber(n) => criteria.task_number = *n,
        Input::Sort(s) => criteria.sort = *s,
        _ => return false,
    }
    true
}

pub async fn run(mut handle: SearchHandle) -> Result<()> {
    let mut criteria = handle.criteria();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);
    print!("{}", render_view(&handle.view()));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = match parse_line(&line) {
                    Ok(Some(input)) => input,
                    Ok(None) => continue,
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    }
                };
                match input {
                    Input::Quit => break,
                    Input::Help => println!("{}", HELP),
                    Input::Show => print!("{}", render_view(&handle.view())),
                    Input::Next => handle.next_page()?,
                    Input::Prev => handle.prev_page()?,
                    Input::Search => handle.search_now()?,
                    Input::Clear => {
                        criteria = FilterCriteria::new(criteria.page_size);
                        handle.clear()?;
                    }
                    Input::Batch(action, ids) => {
                        let count = ids.len();
                        match handle.batch(action, ids).await {
                            Ok(()) => println!("{action:?}: {count} todo(s)"),
                            Err(e) => eprintln!("{action:?} failed: {e:#}"),
                        }
                    }
                    edit => {
                        if apply_edit(&mut criteria, &edit) {
                            handle.set_criteria(criteria.clone())?;
                        }
                    }
                }
            }
            view = handle.changed() => {
                print!("{}", render_view(&view?));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Input {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn parses_edits() {
        assert_eq!(parse("q  buy milk "), Input::Query("buy milk".into()));
        assert_eq!(parse("q"), Input::Query(String::new()));
        assert_eq!(parse("priority high"), Input::Priority(PriorityFilter::High));
        assert_eq!(parse("status active"), Input::Status(StatusFilter::Active));
        assert_eq!(parse("from 2025-01-01"), Input::From(NaiveDate::from_ymd_opt(2025, 1, 1)));
        assert_eq!(parse("to -"), Input::To(None));
        assert_eq!(parse("task #12"), Input::TaskNumber(Some(12)));
        assert_eq!(parse("sort name"), Input::Sort(SortBy::Name));
    }

    #[test]
    fn parses_actions() {
        assert_eq!(parse("next"), Input::Next);
        assert_eq!(parse("SEARCH"), Input::Search);
        assert_eq!(
            parse("done a b"),
            Input::Batch(BatchAction::Complete, vec!["a".into(), "b".into()])
        );
        assert_eq!(parse("delete x"), Input::Batch(BatchAction::Delete, vec!["x".into()]));
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_line("delete").is_err());
        assert!(parse_line("from yesterday").is_err());
        assert!(parse_line("priority urgent").is_err());
        assert!(parse_line("tag").is_err());
        assert!(parse_line("frobnicate").is_err());
    }

    #[test]
    fn edits_toggle_and_clear() {
        let mut c = FilterCriteria::default();
        assert!(apply_edit(&mut c, &Input::ToggleTag("t1".into())));
        assert!(c.tags.contains("t1"));
        apply_edit(&mut c, &Input::ToggleTag("t1".into()));
        assert!(c.tags.is_empty());

        apply_edit(&mut c, &Input::ToggleFlagged);
        assert!(c.flagged_only);
        apply_edit(&mut c, &Input::MinDuration(Some(15)));
        assert_eq!(c.min_duration, Some(15));
        assert!(c.has_filters());

        assert!(!apply_edit(&mut c, &Input::Next));
    }
}
