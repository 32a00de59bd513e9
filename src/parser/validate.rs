use tracing::debug;

use crate::record::{Field, FieldSet, SignalRecord};

pub const SYMBOL_MIN_LEN: usize = 3;
pub const SYMBOL_MAX_LEN: usize = 10;

/// All five fields present and non-empty, direction canonical.
pub fn validate_fields(fields: &FieldSet) -> bool {
    for field in Field::ALL {
        match fields.get(field) {
            Some(v) if !v.is_empty() => {}
            _ => {
                debug!(%field, "Validation failed: missing or empty field");
                return false;
            }
        }
    }

    match fields.direction.as_deref() {
        Some("LONG") | Some("SHORT") => true,
        other => {
            debug!(direction = ?other, "Validation failed: non-canonical direction");
            false
        }
    }
}

/// Re-check a record that was assembled outside the parser.
pub fn validate_record(record: &SignalRecord) -> bool {
    validate_fields(&FieldSet::from(record))
}

/// Symbol tokens must be purely alphabetic and 3 to 10 characters long.
pub fn is_valid_symbol(token: &str) -> bool {
    let len = token.chars().count();
    (SYMBOL_MIN_LEN..=SYMBOL_MAX_LEN).contains(&len) && token.chars().all(char::is_alphabetic)
}
