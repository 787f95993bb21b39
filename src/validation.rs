//! Advisory severity hints for the movie form. None of these gate submission.
use chrono::{Datelike, Local};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

pub fn current_year() -> i32 {
    Local::now().year()
}

fn length_hint(len: usize, warn_above: usize, ok_above: usize) -> Severity {
    if len > ok_above {
        Severity::Success
    } else if len > warn_above {
        Severity::Warning
    } else if len > 0 {
        Severity::Error
    } else {
        Severity::Warning
    }
}

/// Lengths count Unicode scalar values, not UTF-16 code units.
pub fn title_hint(title: &str) -> Severity {
    length_hint(title.chars().count(), 5, 10)
}

pub fn description_hint(description: &str) -> Severity {
    length_hint(description.chars().count(), 50, 80)
}

/// Zero counts as empty.
pub fn year_hint(year: Option<i32>, current_year: i32) -> Severity {
    match year {
        None | Some(0) => Severity::Warning,
        Some(y) if y > current_year => Severity::Error,
        Some(_) => Severity::Success,
    }
}

/// Zero counts as empty.
pub fn rating_hint(rating: Option<i32>) -> Severity {
    match rating {
        None | Some(0) => Severity::Warning,
        Some(r) if !(0..=10).contains(&r) => Severity::Error,
        Some(_) => Severity::Success,
    }
}
