//! Collected validation failures and their messages

use std::fmt;

/// Why a field failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Blank,
    TooShort { minimum: usize },
    TooLong { maximum: usize },
    Taken,
    /// The referenced row does not exist
    MustExist,
}

impl FailureKind {
    /// The message without the field name, e.g. `can't be blank`
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            FailureKind::Blank => "can't be blank".to_string(),
            FailureKind::TooShort { minimum } => {
                format!("is too short (minimum is {minimum} {})", characters(*minimum))
            }
            FailureKind::TooLong { maximum } => {
                format!("is too long (maximum is {maximum} {})", characters(*maximum))
            }
            FailureKind::Taken => "has already been taken".to_string(),
            FailureKind::MustExist => "must exist".to_string(),
        }
    }
}

fn characters(n: usize) -> &'static str {
    if n == 1 {
        "character"
    } else {
        "characters"
    }
}

/// One failed rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub field: String,
    pub kind: FailureKind,
}

impl ValidationFailure {
    /// `Name is too short (minimum is 3 characters)`
    #[must_use]
    pub fn full_message(&self) -> String {
        format!("{} {}", humanize(&self.field), self.kind.message())
    }
}

/// Every failure found by one validation pass, in rule order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    failures: Vec<ValidationFailure>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, kind: FailureKind) {
        self.failures.push(ValidationFailure {
            field: field.into(),
            kind,
        });
    }

    /// Messages for one field, without the field name
    #[must_use]
    pub fn on(&self, field: &str) -> Vec<String> {
        self.failures
            .iter()
            .filter(|f| f.field == field)
            .map(|f| f.kind.message())
            .collect()
    }

    #[must_use]
    pub fn full_messages(&self) -> Vec<String> {
        self.failures.iter().map(ValidationFailure::full_message).collect()
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn clear(&mut self) {
        self.failures.clear();
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {}", self.full_messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// `person_id` becomes `Person`, `addresses.name` becomes `Addresses name`
fn humanize(field: &str) -> String {
    let base = field.strip_suffix("_id").unwrap_or(field).replace(['_', '.'], " ");
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
