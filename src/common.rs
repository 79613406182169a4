pub mod db_utils;
pub mod dates;
pub mod error;
pub mod serial;
pub mod validation;
