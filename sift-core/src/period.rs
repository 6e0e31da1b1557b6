//! Calendar periods: the "current month" the period cache covers.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
            .ok_or_else(|| anyhow!("invalid month start for {date}"))?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| anyhow!("month end out of range for {date}"))?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Local calendar date of `now` in an IANA zone like "America/Chicago".
pub fn today_in(tz: &str, now: DateTime<Utc>) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow!("invalid timezone: {tz}"))?;
    Ok(now.with_timezone(&tz).date_naive())
}

/// The month the user is currently in, judged in their timezone.
pub fn current_month(tz: &str, now: DateTime<Utc>) -> Result<Period> {
    Period::month_of(today_in(tz, now)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_bounds() {
        let p = Period::month_of(NaiveDate::from_ymd_opt(2024, 2, 14).unwrap()).unwrap();
        assert_eq!(p.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(p.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let dec = Period::month_of(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()).unwrap();
        assert_eq!(dec.end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn current_month_uses_local_date() {
        // 03:00 UTC on Feb 1 is still Jan 31 in Chicago (UTC-6).
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 3, 0, 0).unwrap();
        let p = current_month("America/Chicago", now).unwrap();
        assert_eq!(p.start, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

        let utc = current_month("UTC", now).unwrap();
        assert_eq!(utc.start, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
    }

    #[test]
    fn rejects_unknown_timezone() {
        assert!(today_in("Mars/Olympus", Utc::now()).is_err());
    }
}
