//! Shape checks for the items of each batch kind.

use super::{FieldError, validate_id, validate_split_time, validate_text};
use crate::core::Version;
use serde_json::{Map, Value};

fn as_object(item: &Value) -> Result<&Map<String, Value>, FieldError> {
    item.as_object().ok_or(FieldError::NotObject)
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatDraft {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointDraft {
    pub name: String,
}

/// A runner as submitted. `heat` is a heat id or heat name until resolved against the event.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerDraft {
    pub name: String,
    pub bib: String,
    pub heat: String,
    /// The item exactly as it arrived, echoed back if the runner is rejected at write time.
    pub source: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitDraft {
    pub checkpoint_id: String,
    pub split_time: f64,
}

/// One runner entry of an addSplits batch. Its splits are validated later, per runner.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSubmission {
    pub runner_id: String,
    pub expected_version: Version,
    pub heat: Option<String>,
    pub splits: Vec<Value>,
    pub source: Value,
}

pub fn validate_heat_shape(item: &Value) -> Result<HeatDraft, FieldError> {
    let object = as_object(item)?;
    let name = validate_text("name", object.get("name"))?;
    Ok(HeatDraft {
        name: name.to_string(),
    })
}

pub fn validate_checkpoint_shape(item: &Value) -> Result<CheckpointDraft, FieldError> {
    let object = as_object(item)?;
    let name = validate_text("name", object.get("name"))?;
    Ok(CheckpointDraft {
        name: name.to_string(),
    })
}

pub fn validate_runner_shape(item: &Value) -> Result<RunnerDraft, FieldError> {
    let object = as_object(item)?;
    Ok(RunnerDraft {
        name: validate_text("name", object.get("name"))?.to_string(),
        bib: validate_text("bib", object.get("bib"))?.to_string(),
        heat: validate_text("heat", object.get("heat"))?.to_string(),
        source: item.clone(),
    })
}

pub fn validate_split_shape(item: &Value) -> Result<SplitDraft, FieldError> {
    let object = as_object(item)?;
    Ok(SplitDraft {
        checkpoint_id: validate_id("checkpointId", object.get("checkpointId"))?,
        split_time: validate_split_time(object.get("splitTime"))?,
    })
}

pub fn validate_split_submission(item: &Value) -> Result<SplitSubmission, FieldError> {
    let object = as_object(item)?;
    let runner_id = validate_id("id", object.get("id"))?;

    let expected_version = match object.get("expectedVersion") {
        None | Some(Value::Null) => return Err(FieldError::Missing("expectedVersion")),
        Some(value) => value
            .as_u64()
            .map(Version::new)
            .ok_or(FieldError::NotNumber("expectedVersion"))?,
    };

    let heat = match object.get("heat") {
        None | Some(Value::Null) => None,
        Some(value) => Some(validate_text("heat", Some(value))?.to_string()),
    };

    let splits = match object.get("splits") {
        None | Some(Value::Null) => return Err(FieldError::Missing("splits")),
        Some(Value::Array(splits)) if splits.is_empty() => return Err(FieldError::Empty("splits")),
        Some(Value::Array(splits)) => splits.clone(),
        Some(_) => return Err(FieldError::NotList("splits")),
    };

    Ok(SplitSubmission {
        runner_id,
        expected_version,
        heat,
        splits,
        source: item.clone(),
    })
}
