// src/common/dates.rs

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

use crate::common::error::AppError;

// =============================================================================
//  1. PAYMENT DATES (CSV IMPORT)
// =============================================================================

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid iso regex"));

static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})$").expect("valid slash regex"));

static TEXT_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]{3,})\s*(\d{4})?\s*$")
        .expect("valid text date regex")
});

fn month_from_name(name: &str) -> Option<u32> {
    let month = match name.to_ascii_lowercase().as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

// Two-digit years pivot like strptime's %y: 69..=99 -> 1900s, 00..=68 -> 2000s.
fn expand_two_digit_year(yy: i32) -> i32 {
    if yy >= 69 { 1900 + yy } else { 2000 + yy }
}

/// Parses the payment date formats found in imported spreadsheets:
/// `2026-01-24`, `24/01/2026`, `24/01/26`, `24TH JAN`, `24 January 2026`.
/// A missing year in the textual form defaults to `current_year`.
pub fn parse_payment_date(value: &str, current_year: i32) -> Result<NaiveDate, AppError> {
    let s = value.trim();
    if s.is_empty() {
        return Err(AppError::BadRequest("payment_date is required".to_string()));
    }

    let invalid = || AppError::BadRequest(format!("Invalid payment_date: {:?}", value));

    if let Some(caps) = ISO_DATE.captures(s) {
        let (y, m, d) = (caps[1].parse().ok(), caps[2].parse().ok(), caps[3].parse().ok());
        return match (y, m, d) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d).ok_or_else(invalid),
            _ => Err(invalid()),
        };
    }

    if let Some(caps) = SLASH_DATE.captures(s) {
        let year_text = &caps[3];
        let year: i32 = year_text.parse().map_err(|_| invalid())?;
        let year = if year_text.len() == 2 { expand_two_digit_year(year) } else { year };
        let month: u32 = caps[2].parse().map_err(|_| invalid())?;
        let day: u32 = caps[1].parse().map_err(|_| invalid())?;
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid);
    }

    if let Some(caps) = TEXT_DATE.captures(s) {
        let day: u32 = caps[1].parse().map_err(|_| invalid())?;
        let month = month_from_name(&caps[2]).ok_or_else(|| {
            AppError::BadRequest(format!("Unrecognized month in payment_date: {:?}", value))
        })?;
        let year = match caps.get(3) {
            Some(y) => y.as_str().parse().map_err(|_| invalid())?,
            None => current_year,
        };
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid);
    }

    Err(AppError::BadRequest(format!(
        "Unrecognized payment_date format: {:?}",
        value
    )))
}

// =============================================================================
//  2. REPORT DATE FILTERS
// =============================================================================

/// Raw query parameters accepted by the filtered listings.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateFilterQuery {
    /// `all`, `day`, `period` / `range` or `month`
    pub filter_type: Option<String>,
    pub date: Option<String>,
    pub selected_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// `YYYY-MM`
    pub month: Option<String>,
    pub selected_month: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DateFilter {
    All,
    Day { date: NaiveDate },
    Period { start: NaiveDate, end: NaiveDate },
    Month { year: i32, month: u32 },
}

fn first_filled(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_iso_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn parse_year_month(value: &str) -> Option<(i32, u32)> {
    let (y, m) = value.split_once('-')?;
    if y.len() != 4 || m.len() != 2 {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1).map(|_| (year, month))
}

impl DateFilter {
    /// Incomplete or malformed filters fall back to `All`.
    pub fn from_query(q: &DateFilterQuery) -> Self {
        let kind = q
            .filter_type
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match kind.as_str() {
            "day" => first_filled(&[&q.date, &q.selected_date, &q.start_date])
                .and_then(|d| parse_iso_day(&d))
                .map(|date| DateFilter::Day { date })
                .unwrap_or(DateFilter::All),
            "period" | "range" => {
                let start = first_filled(&[&q.start_date]).and_then(|d| parse_iso_day(&d));
                let end = first_filled(&[&q.end_date]).and_then(|d| parse_iso_day(&d));
                match (start, end) {
                    (Some(start), Some(end)) => DateFilter::Period { start, end },
                    _ => DateFilter::All,
                }
            }
            "month" => first_filled(&[&q.month, &q.selected_month, &q.start_date])
                .and_then(|m| parse_year_month(&m))
                .map(|(year, month)| DateFilter::Month { year, month })
                .unwrap_or(DateFilter::All),
            _ => DateFilter::All,
        }
    }

    /// Half-open `[from, to)` day range, `None` for `All`.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            DateFilter::All => None,
            DateFilter::Day { date } => Some((date, date.succ_opt().unwrap_or(date))),
            DateFilter::Period { start, end } => Some((start, end.succ_opt().unwrap_or(end))),
            DateFilter::Month { year, month } => {
                let from = NaiveDate::from_ymd_opt(year, month, 1)?;
                let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
                let to = NaiveDate::from_ymd_opt(ny, nm, 1)?;
                Some((from, to))
            }
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        match self.bounds() {
            None => true,
            Some((from, to)) => from <= day && day < to,
        }
    }

    /// Appends ` AND <column>::date` range predicates with bound parameters.
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Postgres>, column: &str) {
        if let Some((from, to)) = self.bounds() {
            qb.push(" AND ")
                .push(column)
                .push("::date >= ")
                .push_bind(from)
                .push(" AND ")
                .push(column)
                .push("::date < ")
                .push_bind(to);
        }
    }
}

/// Whole days between a timestamp's calendar date and `today`.
pub fn days_between(from: NaiveDate, today: NaiveDate) -> i64 {
    (today - from).num_days()
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_iso_and_slash_formats() {
        assert_eq!(parse_payment_date("2026-01-24", 2000).unwrap(), d(2026, 1, 24));
        assert_eq!(parse_payment_date(" 24/01/2026 ", 2000).unwrap(), d(2026, 1, 24));
        assert_eq!(parse_payment_date("24/01/26", 2000).unwrap(), d(2026, 1, 24));
        assert_eq!(parse_payment_date("01/02/99", 2000).unwrap(), d(1999, 2, 1));
    }

    #[test]
    fn parses_spreadsheet_text_dates() {
        assert_eq!(parse_payment_date("24TH JAN", 2026).unwrap(), d(2026, 1, 24));
        assert_eq!(parse_payment_date("1st sept 2025", 2026).unwrap(), d(2025, 9, 1));
        assert_eq!(parse_payment_date("3 March", 2027).unwrap(), d(2027, 3, 3));
    }

    #[test]
    fn rejects_bad_payment_dates() {
        assert!(parse_payment_date("", 2026).is_err());
        assert!(parse_payment_date("24 Foo", 2026).is_err());
        assert!(parse_payment_date("31/02/2026", 2026).is_err());
        assert!(parse_payment_date("next tuesday", 2026).is_err());
    }

    fn query(kind: &str) -> DateFilterQuery {
        DateFilterQuery {
            filter_type: Some(kind.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn builds_filters_from_query() {
        let mut q = query("day");
        q.date = Some("2026-03-05".into());
        assert_eq!(DateFilter::from_query(&q), DateFilter::Day { date: d(2026, 3, 5) });

        let mut q = query("Month");
        q.selected_month = Some("2026-12".into());
        assert_eq!(DateFilter::from_query(&q), DateFilter::Month { year: 2026, month: 12 });

        let mut q = query("range");
        q.start_date = Some("2026-01-01".into());
        q.end_date = Some("2026-01-31".into());
        assert_eq!(
            DateFilter::from_query(&q),
            DateFilter::Period { start: d(2026, 1, 1), end: d(2026, 1, 31) }
        );
    }

    #[test]
    fn incomplete_filters_fall_back_to_all() {
        assert_eq!(DateFilter::from_query(&query("day")), DateFilter::All);
        let mut q = query("month");
        q.month = Some("2026-1".into());
        assert_eq!(DateFilter::from_query(&q), DateFilter::All);
        assert_eq!(DateFilter::from_query(&DateFilterQuery::default()), DateFilter::All);
    }

    #[test]
    fn bounds_are_half_open() {
        let dec = DateFilter::Month { year: 2025, month: 12 };
        assert_eq!(dec.bounds(), Some((d(2025, 12, 1), d(2026, 1, 1))));
        assert!(dec.contains(d(2025, 12, 31)));
        assert!(!dec.contains(d(2026, 1, 1)));

        let period = DateFilter::Period { start: d(2026, 1, 1), end: d(2026, 1, 31) };
        assert!(period.contains(d(2026, 1, 31)));
        assert!(!period.contains(d(2026, 2, 1)));
        assert!(DateFilter::All.contains(d(1999, 1, 1)));
    }

    #[test]
    fn predicate_binds_two_parameters() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM clients c WHERE 1=1");
        DateFilter::Day { date: d(2026, 1, 1) }.push_predicate(&mut qb, "c.created_at");
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM clients c WHERE 1=1 AND c.created_at::date >= $1 AND c.created_at::date < $2"
        );
    }
}
