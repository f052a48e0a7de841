//! Field validation shared by the resource inputs.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CatalogError;

static LETTERS_AND_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s]+$").expect("valid regex"));

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[A-Za-z0-9\s\-:'",&]+$"#).expect("valid regex"));

static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid regex"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("valid regex")
});

const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Collects validation messages for one request.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` unless `ok` holds.
    pub fn check(&mut self, ok: bool, message: impl Into<String>) -> bool {
        if !ok {
            self.0.push(message.into());
        }
        ok
    }

    /// Returns the trimmed value if present and non-empty, recording
    /// `message` otherwise.
    pub fn require<'a>(&mut self, value: Option<&'a str>, message: &str) -> Option<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.0.push(message.to_string());
                None
            }
        }
    }

    /// Converts collected messages into an error, if any.
    pub fn finish(self) -> Result<(), CatalogError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Validation(self.0))
        }
    }
}

pub fn is_letters_and_spaces(value: &str) -> bool {
    LETTERS_AND_SPACES.is_match(value)
}

pub fn is_title(value: &str) -> bool {
    TITLE.is_match(value)
}

/// `hh:mm`, 00:00 through 23:59.
pub fn is_clock_time(value: &str) -> bool {
    CLOCK_TIME.is_match(value)
}

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// At least eight characters drawn from letters, digits and `@$!%*?&`,
/// with at least one of each of lowercase, uppercase, digit and special.
pub fn is_strong_password(value: &str) -> bool {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    allowed
        && value.chars().count() >= 8
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

/// Character count, not byte length.
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}
