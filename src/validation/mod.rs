//! Field validators
//!
//! Pure predicates over untyped JSON input. They never touch the store and
//! never panic; every failure is a [`FieldError`] naming the offending field.

pub mod shapes;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub use shapes::{
    CheckpointDraft, HeatDraft, RunnerDraft, SplitDraft, SplitSubmission,
    validate_checkpoint_shape, validate_heat_shape, validate_runner_shape, validate_split_shape,
    validate_split_submission,
};

/// Characters with special meaning to the document store's query language.
pub const QUERY_METACHARACTERS: [char; 1] = ['$'];

/// Sentinel returned by [`validate_enum`] for unrecognized values.
pub const UNSET: &str = "";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("expected an object")]
    NotObject,

    #[error("'{0}' is required")]
    Missing(&'static str),

    #[error("'{0}' must be text")]
    NotText(&'static str),

    #[error("'{0}' must not be empty")]
    Empty(&'static str),

    #[error("'{field}' must not contain '{character}'")]
    ForbiddenCharacter { field: &'static str, character: char },

    #[error("'{0}' must be a number")]
    NotNumber(&'static str),

    #[error("'{0}' must be a finite number")]
    NotFinite(&'static str),

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(&'static str),

    #[error("'{0}' must be a list")]
    NotList(&'static str),
}

impl FieldError {
    /// The field the error is about, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::NotObject => None,
            Self::Missing(field)
            | Self::NotText(field)
            | Self::Empty(field)
            | Self::NotNumber(field)
            | Self::NotFinite(field)
            | Self::InvalidIdentifier(field)
            | Self::NotList(field) => Some(field),
            Self::ForbiddenCharacter { field, .. } => Some(field),
        }
    }
}

/// Non-empty text free of query metacharacters.
pub fn validate_text<'v>(field: &'static str, value: Option<&'v Value>) -> Result<&'v str, FieldError> {
    let text = match value {
        None | Some(Value::Null) => return Err(FieldError::Missing(field)),
        Some(Value::String(text)) => text.as_str(),
        Some(_) => return Err(FieldError::NotText(field)),
    };
    if text.is_empty() {
        return Err(FieldError::Empty(field));
    }
    if let Some(character) = text.chars().find(|c| QUERY_METACHARACTERS.contains(c)) {
        return Err(FieldError::ForbiddenCharacter { field, character });
    }
    Ok(text)
}

/// Any JSON number. Negative and zero values pass.
pub fn validate_number(field: &'static str, value: Option<&Value>) -> Result<f64, FieldError> {
    match value {
        None | Some(Value::Null) => Err(FieldError::Missing(field)),
        Some(Value::Number(number)) => number
            .as_f64()
            .filter(|n| !n.is_nan())
            .ok_or(FieldError::NotNumber(field)),
        Some(_) => Err(FieldError::NotNumber(field)),
    }
}

pub fn validate_split_time(value: Option<&Value>) -> Result<f64, FieldError> {
    let time = validate_number("splitTime", value)?;
    if time.is_finite() {
        Ok(time)
    } else {
        Err(FieldError::NotFinite("splitTime"))
    }
}

/// Returns the matching member of `allowed`, or [`UNSET`]. Never an error.
pub fn validate_enum<'a>(value: Option<&Value>, allowed: &[&'a str]) -> &'a str {
    value
        .and_then(Value::as_str)
        .and_then(|text| allowed.iter().copied().find(|candidate| *candidate == text))
        .unwrap_or(UNSET)
}

/// Canonical (lowercase, hyphenated) form of a UUID, or `None`.
pub fn parse_id(text: &str) -> Option<String> {
    Uuid::parse_str(text).ok().map(|id| id.to_string())
}

pub fn validate_id(field: &'static str, value: Option<&Value>) -> Result<String, FieldError> {
    let text = match value {
        None | Some(Value::Null) => return Err(FieldError::Missing(field)),
        Some(Value::String(text)) => text,
        Some(_) => return Err(FieldError::NotText(field)),
    };
    parse_id(text).ok_or(FieldError::InvalidIdentifier(field))
}

/// Numbers and numeric text become finite distances; anything else is `None`.
pub fn coerce_distance(value: Option<&Value>) -> Option<f64> {
    let distance = match value? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    distance.is_finite().then_some(distance)
}
