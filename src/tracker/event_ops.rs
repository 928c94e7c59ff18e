use super::outcome::{BatchOutcome, CheckpointEntry, HeatEntry};
use super::{RaceTracker, parse_event_id, require_batch};
use crate::core::{Checkpoint, Event, Heat, RaceError, Result, Runner, UnitOfMeasure, new_id};
use crate::partition::{
    CheckpointRemovalRules, HeatRemovalRules, NewCheckpointRules, NewHeatRules, partition,
};
use crate::storage::TypedStoreExt;
use crate::validation::{coerce_distance, validate_enum, validate_id, validate_number, validate_text};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

impl RaceTracker {
    /// Creates an empty event at the initial version.
    ///
    /// `unit_of_measure` outside the known labels is stored unset, and a
    /// `total_distance` that is not a finite number (or numeric text) is stored as null.
    pub async fn create_event(
        &self,
        name: Option<&Value>,
        unit_of_measure: Option<&Value>,
        total_distance: Option<&Value>,
    ) -> Result<Event> {
        let name = validate_text("name", name)
            .map_err(|err| RaceError::invalid_input(format!("Invalid name: {err}")))?;
        let unit = UnitOfMeasure::from_label(validate_enum(unit_of_measure, &UnitOfMeasure::LABELS));
        let distance = coerce_distance(total_distance);

        let event = self.store.insert(Event::new(name, unit, distance)).await?;
        info!(event_id = %event.id, name = %event.name, "event created");
        Ok(event)
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Event> {
        let event_id = parse_event_id(event_id)?;
        self.load_event(&event_id).await
    }

    #[instrument(skip(self, heats))]
    pub async fn add_heats(
        &self,
        event_id: &str,
        heats: Option<Vec<Value>>,
    ) -> Result<BatchOutcome<HeatEntry>> {
        let event_id = parse_event_id(event_id)?;
        let heats = require_batch(heats, "heats")?;
        let event = self.load_event(&event_id).await?;

        let result = partition(&NewHeatRules::new(&event), heats);
        debug!(
            accepted = result.accepted.len(),
            rejected = result.rejected.len(),
            "heats partitioned"
        );
        if result.is_noop() {
            return Ok(BatchOutcome::unchanged(event, result.rejected));
        }

        let accepted: Vec<HeatEntry> = result
            .accepted
            .into_iter()
            .map(|draft| HeatEntry {
                id: new_id(),
                name: draft.name,
                start_time: None,
            })
            .collect();
        let additions = accepted.clone();
        let event = self
            .commit_event(&event, move |event: &mut Event| {
                for heat in additions {
                    event.heats.insert(heat.id, Heat::unscheduled(heat.name));
                }
            })
            .await?;

        info!(version = %event.version, added = accepted.len(), "heats added");
        Ok(BatchOutcome {
            event,
            accepted,
            rejected: result.rejected,
        })
    }

    /// Removes heats that exist and have no runner assigned.
    ///
    /// Usage is computed from the event's runner documents, not from the summary.
    #[instrument(skip(self, heat_ids))]
    pub async fn remove_heats(
        &self,
        event_id: &str,
        heat_ids: Option<Vec<Value>>,
    ) -> Result<BatchOutcome<String>> {
        let event_id = parse_event_id(event_id)?;
        let heat_ids = require_batch(heat_ids, "heatIDs")?;
        let event = self.load_event(&event_id).await?;

        let in_use: HashSet<String> = if heat_ids.is_empty() {
            HashSet::new()
        } else {
            self.store
                .find(|runner: &Runner| runner.event_id == event_id)
                .await?
                .into_iter()
                .map(|runner: Runner| runner.heat)
                .collect()
        };

        let result = partition(&HeatRemovalRules::new(&event, in_use), heat_ids);
        debug!(
            accepted = result.accepted.len(),
            rejected = result.rejected.len(),
            "heat removals partitioned"
        );
        if result.is_noop() {
            return Ok(BatchOutcome::unchanged(event, result.rejected));
        }

        let removals = result.accepted.clone();
        let event = self
            .commit_event(&event, move |event: &mut Event| {
                for heat_id in &removals {
                    event.heats.remove(heat_id);
                }
            })
            .await?;

        info!(version = %event.version, removed = result.accepted.len(), "heats removed");
        Ok(BatchOutcome {
            event,
            accepted: result.accepted,
            rejected: result.rejected,
        })
    }

    #[instrument(skip(self, checkpoints))]
    pub async fn add_checkpoints(
        &self,
        event_id: &str,
        checkpoints: Option<Vec<Value>>,
    ) -> Result<BatchOutcome<CheckpointEntry>> {
        let event_id = parse_event_id(event_id)?;
        let checkpoints = require_batch(checkpoints, "checkpoints")?;
        let event = self.load_event(&event_id).await?;

        let result = partition(&NewCheckpointRules::new(&event), checkpoints);
        debug!(
            accepted = result.accepted.len(),
            rejected = result.rejected.len(),
            "checkpoints partitioned"
        );
        if result.is_noop() {
            return Ok(BatchOutcome::unchanged(event, result.rejected));
        }

        let accepted: Vec<CheckpointEntry> = result
            .accepted
            .into_iter()
            .map(|draft| CheckpointEntry {
                id: new_id(),
                name: draft.name,
            })
            .collect();
        let additions = accepted.clone();
        let event = self
            .commit_event(&event, move |event: &mut Event| {
                for checkpoint in additions {
                    event.checkpoints.insert(
                        checkpoint.id,
                        Checkpoint {
                            name: checkpoint.name,
                        },
                    );
                }
            })
            .await?;

        info!(version = %event.version, added = accepted.len(), "checkpoints added");
        Ok(BatchOutcome {
            event,
            accepted,
            rejected: result.rejected,
        })
    }

    #[instrument(skip(self, checkpoint_ids))]
    pub async fn remove_checkpoints(
        &self,
        event_id: &str,
        checkpoint_ids: Option<Vec<Value>>,
    ) -> Result<BatchOutcome<String>> {
        let event_id = parse_event_id(event_id)?;
        let checkpoint_ids = require_batch(checkpoint_ids, "checkpointIDs")?;
        let event = self.load_event(&event_id).await?;

        let result = partition(&CheckpointRemovalRules::new(&event), checkpoint_ids);
        debug!(
            accepted = result.accepted.len(),
            rejected = result.rejected.len(),
            "checkpoint removals partitioned"
        );
        if result.is_noop() {
            return Ok(BatchOutcome::unchanged(event, result.rejected));
        }

        let removals = result.accepted.clone();
        let event = self
            .commit_event(&event, move |event: &mut Event| {
                for checkpoint_id in &removals {
                    event.checkpoints.remove(checkpoint_id);
                }
            })
            .await?;

        info!(version = %event.version, removed = result.accepted.len(), "checkpoints removed");
        Ok(BatchOutcome {
            event,
            accepted: result.accepted,
            rejected: result.rejected,
        })
    }

    /// Sets a heat's start time. A heat starts at most once.
    #[instrument(skip(self, heat_id, start_time))]
    pub async fn start_heat(
        &self,
        event_id: &str,
        heat_id: Option<&Value>,
        start_time: Option<&Value>,
    ) -> Result<Event> {
        let event_id = parse_event_id(event_id)?;
        let heat_id = validate_id("heatID", heat_id)
            .map_err(|err| RaceError::invalid_input(format!("Invalid heatID: {err}")))?;
        let start_time = validate_number("startTime", start_time)
            .ok()
            .filter(|time| time.is_finite())
            .ok_or_else(|| RaceError::invalid_input("Invalid startTime"))?;

        let event = self.load_event(&event_id).await?;
        let heat = event
            .heats
            .get(&heat_id)
            .ok_or_else(|| RaceError::not_found("Heat not found in event"))?;
        if heat.is_started() {
            return Err(RaceError::ConstraintViolation(
                "Heat has already started".to_string(),
            ));
        }

        let target = heat_id.clone();
        let event = self
            .commit_event(&event, move |event: &mut Event| {
                if let Some(heat) = event.heats.get_mut(&target) {
                    heat.start_time = Some(start_time);
                }
            })
            .await?;

        info!(heat_id = %heat_id, start_time, version = %event.version, "heat started");
        Ok(event)
    }
}
