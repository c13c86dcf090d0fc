// Course-code ordering for output.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

use super::record::ClassRecord;

static CATALOG_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(\.\d+)?").expect("catalog number regex should compile"));

/// Numeric part of a catalog number scaled into `[0, 1000)`.
/// Some catalog numbers carry extra trailing digits (`9500` is `950`).
pub fn catalog_numeric_part(catalog: &str) -> f64 {
    let mut value = CATALOG_NUMBER
        .find(catalog)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);
    while value >= 1000.0 {
        value /= 10.0;
    }
    value
}

pub fn compare_catalog(a: &str, b: &str) -> Ordering {
    catalog_numeric_part(a)
        .total_cmp(&catalog_numeric_part(b))
        .then_with(|| a.cmp(b))
}

/// Numeric when both parse, text otherwise.
pub fn compare_class_numbers(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Discipline, catalog number, term, class number.
pub fn course_order(a: &ClassRecord, b: &ClassRecord) -> Ordering {
    a.discipline
        .cmp(&b.discipline)
        .then_with(|| compare_catalog(&a.catalog_number, &b.catalog_number))
        .then_with(|| a.term.cmp(&b.term))
        .then_with(|| compare_class_numbers(&a.class_number, &b.class_number))
}
