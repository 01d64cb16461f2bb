// ============================================================
// FIELD KIND
// ============================================================
// Coarse value classification used by header sniffing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("numeric pattern")
});

// 1,234,567.89
static GROUPED_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("grouped pattern"));

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Kind of a single field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer or floating point number
    Numeric,

    /// Calendar date or timestamp
    Date,

    /// `true` / `false`
    Boolean,

    /// Anything else, with its length in characters
    Text(usize),
}

impl FieldKind {
    /// Classify a raw field value
    pub fn classify(value: &str) -> Self {
        let trimmed = value.trim();

        if Self::is_numeric_value(trimmed) {
            FieldKind::Numeric
        } else if Self::is_date_value(trimmed) {
            FieldKind::Date
        } else if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
            FieldKind::Boolean
        } else {
            FieldKind::Text(value.chars().count())
        }
    }

    /// Whether `value` classifies as this kind
    pub fn matches(&self, value: &str) -> bool {
        Self::classify(value) == *self
    }

    fn is_numeric_value(trimmed: &str) -> bool {
        !trimmed.is_empty() && (NUMERIC.is_match(trimmed) || GROUPED_NUMERIC.is_match(trimmed))
    }

    fn is_date_value(trimmed: &str) -> bool {
        if trimmed.len() < 8 {
            return false;
        }

        DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(trimmed, fmt).is_ok())
            || DATETIME_FORMATS
                .iter()
                .any(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).is_ok())
            || DateTime::parse_from_rfc3339(trimmed).is_ok()
    }
}
