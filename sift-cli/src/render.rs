use sift_core::{DisplayMode, Item};
use sift_search::SearchView;
use std::fmt::Write;

fn mode_label(mode: DisplayMode) -> &'static str {
    match mode {
        DisplayMode::Default => "period",
        DisplayMode::Preview => "preview",
        DisplayMode::Live => "live",
    }
}

pub fn header(view: &SearchView) -> String {
    let pages = view.total.div_ceil(view.page_size.max(1) as usize).max(1);
    let mut s = format!(
        "[{}] page {}/{} | {} total",
        mode_label(view.mode),
        view.page,
        pages,
        view.total
    );
    if view.loading {
        s.push_str(" | searching...");
    }
    if view.fell_back {
        s.push_str(" | server unavailable, showing this month");
    }
    s
}

pub fn row(item: &Item) -> String {
    let number = item.task_number.map(|n| format!("#{n}")).unwrap_or_default();
    let due = item
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut s = format!(
        "{:>5}  {:<10}  {:<6}  [{}]{} {}",
        number,
        due,
        item.priority.as_str(),
        if item.is_completed { "x" } else { " " },
        if item.is_flagged { "!" } else { " " },
        item.title
    );
    if !item.tags.is_empty() {
        let names: Vec<&str> = item.tags.iter().map(|t| t.name.as_str()).collect();
        let _ = write!(s, "  ({})", names.join(", "));
    }
    let _ = write!(s, "  <{}>", item.id);
    s
}

pub fn render_view(view: &SearchView) -> String {
    let mut out = header(view);
    out.push('\n');
    if view.items.is_empty() {
        out.push_str("  (no matching todos)\n");
    }
    for item in &view.items {
        out.push_str(&row(item));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sift_core::{FilterCriteria, Priority, Tag};

    fn view(items: Vec<Item>, total: usize) -> SearchView {
        SearchView {
            mode: DisplayMode::Live,
            criteria: FilterCriteria::default(),
            items,
            total,
            page: 2,
            page_size: 30,
            has_next: true,
            has_prev: true,
            loading: true,
            fell_back: false,
            sequence_id: 3,
        }
    }

    #[test]
    fn header_shows_mode_paging_and_state() {
        let h = header(&view(Vec::new(), 61));
        assert_eq!(h, "[live] page 2/3 | 61 total | searching...");
    }

    #[test]
    fn row_shows_the_useful_fields() {
        let item = Item::new("a1", "Buy milk")
            .with_task_number(7)
            .with_due_date(NaiveDate::from_ymd_opt(2025, 1, 9).unwrap())
            .with_priority(Priority::High)
            .with_completed(true)
            .with_tag(Tag::new("t1", "errands"));
        let r = row(&item);
        assert!(r.contains("#7"));
        assert!(r.contains("2025-01-09"));
        assert!(r.contains("high"));
        assert!(r.contains("[x]"));
        assert!(r.contains("Buy milk"));
        assert!(r.contains("(errands)"));
        assert!(r.ends_with("<a1>"));
    }

    #[test]
    fn empty_view_says_so() {
        let out = render_view(&view(Vec::new(), 0));
        assert!(out.contains("no matching todos"));
    }
}
