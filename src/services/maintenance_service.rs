// src/services/maintenance_service.rs
//
// Operator maintenance run from the command line: wiping client data and
// bulk-loading Virtual clients from a spreadsheet export.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use sqlx::PgPool;

use crate::{
    common::{
        dates::{current_year, parse_payment_date},
        error::AppError,
    },
    db::{ClientRepository, schema},
    models::client::{ClientCategory, NewClient},
};

// =============================================================================
//  1. CSV READING
// =============================================================================

/// Splits CSV text into records. Handles quoted fields, `""` escapes,
/// line breaks inside quotes, CRLF endings and a leading UTF-8 BOM.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_header(header: &[String]) -> Self {
        let mut map = HashMap::new();
        for (idx, name) in header.iter().enumerate() {
            map.entry(name.trim().to_lowercase()).or_insert(idx);
        }
        Columns(map)
    }

    fn get<'r>(&self, record: &'r [String], key: &str) -> &'r str {
        self.0
            .get(key)
            .and_then(|&idx| record.get(idx))
            .map(|v| v.trim())
            .unwrap_or("")
    }
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Validates seed rows. Blank rows are skipped and later duplicates of an
/// account number are dropped with a warning.
pub fn seed_rows_from_csv(text: &str, current_year: i32) -> Result<Vec<NewClient>, AppError> {
    let mut records = parse_csv(text).into_iter();
    let header = records
        .next()
        .ok_or_else(|| AppError::BadRequest("CSV has no header row".to_string()))?;
    let columns = Columns::from_header(&header);

    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for (line, record) in records.enumerate() {
        let field = |key: &str| columns.get(&record, key);

        let full_name = field("full_name");
        let phone_number = field("phone_number");
        let account_number = field("account_number");
        let package = field("package");
        let virtual_location = field("virtual_location");
        let ground_location = field("ground_location");
        let payment_date = field("payment_date");

        if full_name.is_empty() || phone_number.is_empty() || account_number.is_empty() {
            let blank = [
                full_name,
                phone_number,
                account_number,
                package,
                virtual_location,
                ground_location,
                payment_date,
            ]
            .iter()
            .all(|v| v.is_empty());
            if blank {
                continue;
            }
            return Err(AppError::BadRequest(format!(
                "Missing full_name/phone_number/account_number in CSV row {}",
                line + 2
            )));
        }

        let payment_date = parse_payment_date(payment_date, current_year)?;

        if !seen.insert(account_number.to_string()) {
            tracing::warn!("Duplicate account_number in CSV, skipping later row: {}", account_number);
            continue;
        }

        rows.push(NewClient {
            full_name: full_name.to_string(),
            phone_number: phone_number.to_string(),
            account_number: account_number.to_string(),
            package: optional(package),
            client_category: ClientCategory::Virtual,
            virtual_location: optional(virtual_location),
            ground_location: optional(ground_location),
            payment_date,
            work_order: None,
        });
    }

    Ok(rows)
}

// =============================================================================
//  2. SERVICE
// =============================================================================

#[derive(Clone)]
pub struct MaintenanceService {
    pool: PgPool,
    client_repo: ClientRepository,
}

impl MaintenanceService {
    pub fn new(pool: PgPool, client_repo: ClientRepository) -> Self {
        Self { pool, client_repo }
    }

    pub async fn reset_client_data(&self) -> Result<(), AppError> {
        tracing::warn!("Resetting client operational data...");
        schema::reset_client_data(&self.pool).await?;
        tracing::warn!("Client operational data wiped.");
        Ok(())
    }

    /// Inserts every valid row as a Pending Virtual client. All or nothing.
    pub async fn seed_virtual_clients_from_csv(&self, path: &Path) -> Result<usize, AppError> {
        tracing::warn!("Seeding virtual clients from CSV: {}", path.display());

        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::BadRequest(format!("Cannot read CSV {}: {}", path.display(), e))
        })?;
        let rows = seed_rows_from_csv(&text, current_year())?;
        if rows.is_empty() {
            tracing::warn!("Seed complete. Inserted 0 clients.");
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for row in &rows {
            self.client_repo.create(&mut *tx, row).await?;
        }
        tx.commit().await?;

        tracing::warn!("Seed complete. Inserted {} clients.", rows.len());
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn csv_handles_quotes_escapes_and_bom() {
        let text = "\u{feff}a,b,c\r\n\"x, y\",\"say \"\"hi\"\"\",z\n\"multi\nline\",,last";
        let records = parse_csv(text);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], vec!["a", "b", "c"]);
        assert_eq!(records[1], vec!["x, y", "say \"hi\"", "z"]);
        assert_eq!(records[2], vec!["multi\nline", "", "last"]);
    }

    #[test]
    fn trailing_newline_adds_no_empty_record() {
        assert_eq!(parse_csv("a,b\n1,2\n").len(), 2);
    }

    #[test]
    fn headers_match_case_insensitively_and_rows_become_virtual_clients() {
        let text = " Full_Name ,PHONE_NUMBER,account_number,Package,payment_date\n\
                    Jane,0700,ACC-1,Home,24TH JAN\n";
        let rows = seed_rows_from_csv(text, 2026).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.full_name, "Jane");
        assert_eq!(row.package.as_deref(), Some("Home"));
        assert_eq!(row.client_category, ClientCategory::Virtual);
        assert_eq!(row.virtual_location, None);
        assert_eq!(row.payment_date, NaiveDate::from_ymd_opt(2026, 1, 24).unwrap());
    }

    #[test]
    fn blank_rows_are_skipped_and_duplicates_keep_the_first() {
        let text = "full_name,phone_number,account_number,payment_date\n\
                    A,1,ACC-1,2026-01-01\n\
                    ,,,\n\
                    B,2,ACC-1,02/01/2026\n";
        let rows = seed_rows_from_csv(text, 2026).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].full_name, "A");
    }

    #[test]
    fn incomplete_rows_and_bad_dates_fail_the_whole_import() {
        let missing = "full_name,phone_number,account_number,payment_date\nA,,ACC-1,2026-01-01\n";
        assert!(matches!(seed_rows_from_csv(missing, 2026), Err(AppError::BadRequest(_))));

        let bad_date = "full_name,phone_number,account_number,payment_date\nA,1,ACC-1,someday\n";
        assert!(seed_rows_from_csv(bad_date, 2026).is_err());

        assert!(seed_rows_from_csv("", 2026).is_err());
    }
}
