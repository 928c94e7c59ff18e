//! Request bodies and query strings.
//!
//! Batch items stay untyped (`Value`) so that a malformed item is rejected
//! individually by the partition engine instead of failing the whole request.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: Option<Value>,
    pub unit_of_measure: Option<Value>,
    pub total_distance: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
}

/// `runnerIDs` is a comma-separated list.
#[derive(Debug, Default, Deserialize)]
pub struct RunnersQuery {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    #[serde(rename = "runnerIDs")]
    pub runner_ids: Option<String>,
}

impl RunnersQuery {
    pub fn runner_ids(&self) -> Option<Vec<Value>> {
        self.runner_ids.as_ref().map(|ids| {
            ids.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| Value::String(id.to_string()))
                .collect()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRunnersRequest {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    pub runners: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddHeatsRequest {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    pub heats: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoveHeatsRequest {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    #[serde(rename = "heatIDs")]
    pub heat_ids: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddCheckpointsRequest {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    pub checkpoints: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoveCheckpointsRequest {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    #[serde(rename = "checkpointIDs")]
    pub checkpoint_ids: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartHeatRequest {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    #[serde(rename = "heatID")]
    pub heat_id: Option<Value>,
    #[serde(rename = "startTime")]
    pub start_time: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddSplitsRequest {
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    pub runners: Option<Vec<Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_ids_split_on_commas() {
        let query = RunnersQuery {
            event_id: String::new(),
            runner_ids: Some("a, b,,c".to_string()),
        };
        assert_eq!(
            query.runner_ids(),
            Some(vec![Value::from("a"), Value::from("b"), Value::from("c")])
        );
        assert_eq!(RunnersQuery::default().runner_ids(), None);
    }
}
