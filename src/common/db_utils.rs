// src/common/db_utils.rs

use crate::common::error::AppError;

/// Translates a unique-constraint violation into the matching domain error.
/// Anything else is passed through as a database error.
pub fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                return match constraint {
                    "employees_email_key" => AppError::EmailAlreadyExists,
                    "clients_account_number_key" => AppError::AccountNumberExists,
                    "assets_serial_number_key" => AppError::SerialNumberInUse,
                    "employees_username_key" => {
                        AppError::Conflict("Username already taken.".to_string())
                    }
                    other => AppError::Conflict(format!("Duplicate value violates '{}'.", other)),
                };
            }
        }
    }
    e.into()
}

/// Escapes `%`, `_` and `\` so user input can sit inside an ILIKE pattern.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("50%_x"), "%50\\%\\_x%");
    }

    #[test]
    fn non_database_errors_pass_through() {
        let mapped = map_unique_violation(sqlx::Error::RowNotFound);
        assert!(matches!(mapped, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
