//! Aggregate documents: the `Event` root and its independently stored `Runner`s.
//!
//! Both documents carry their own [`Version`] stamp. The store advances it on
//! every successful conditional write; callers hand back the last version they
//! observed so concurrent modification is detected without locks.

use chrono::{DateTime, Utc};
use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Generates a fresh document identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Monotonically advancing modification stamp used as the optimistic-concurrency token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Version assigned to every freshly created document.
    pub const INITIAL: Version = Version(1);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The stamp a document carries after one more successful write.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Distance unit of an event. Unrecognized input normalizes to `Unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOfMeasure {
    Kilometers,
    Meters,
    Miles,
    Feet,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl UnitOfMeasure {
    /// Labels accepted on input, in declaration order.
    pub const LABELS: [&'static str; 4] = ["kilometers", "meters", "miles", "feet"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kilometers => "kilometers",
            Self::Meters => "meters",
            Self::Miles => "miles",
            Self::Feet => "feet",
            Self::Unset => "",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "kilometers" => Self::Kilometers,
            "meters" => Self::Meters,
            "miles" => Self::Miles,
            "feet" => Self::Feet,
            _ => Self::Unset,
        }
    }
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub name: String,
}

/// A race wave. `start_time` is set at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heat {
    pub name: String,
    pub start_time: Option<f64>,
}

impl Heat {
    pub fn unscheduled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_time: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }
}

/// Denormalized summary entry for a runner, held by its event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerRef {
    pub id: String,
    pub bib: String,
}

impl From<&Runner> for RunnerRef {
    fn from(runner: &Runner) -> Self {
        Self {
            id: runner.id.clone(),
            bib: runner.bib.clone(),
        }
    }
}

/// Root aggregate document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub version: Version,
    pub last_modified: DateTime<Utc>,
    pub name: String,
    pub unit_of_measure: UnitOfMeasure,
    pub total_distance: Option<f64>,
    pub checkpoints: OrdMap<String, Checkpoint>,
    pub heats: OrdMap<String, Heat>,
    pub runners: Vector<RunnerRef>,
}

impl Event {
    /// Creates an empty event at the initial version.
    pub fn new(
        name: impl Into<String>,
        unit_of_measure: UnitOfMeasure,
        total_distance: Option<f64>,
    ) -> Self {
        Self {
            id: new_id(),
            version: Version::INITIAL,
            last_modified: Utc::now(),
            name: name.into(),
            unit_of_measure,
            total_distance,
            checkpoints: OrdMap::new(),
            heats: OrdMap::new(),
            runners: Vector::new(),
        }
    }

    pub fn heat_names(&self) -> HashSet<&str> {
        self.heats.values().map(|heat| heat.name.as_str()).collect()
    }

    pub fn checkpoint_names(&self) -> HashSet<&str> {
        self.checkpoints
            .values()
            .map(|checkpoint| checkpoint.name.as_str())
            .collect()
    }

    pub fn bibs(&self) -> HashSet<&str> {
        self.runners.iter().map(|runner| runner.bib.as_str()).collect()
    }

    pub fn has_runner(&self, runner_id: &str) -> bool {
        self.runners.iter().any(|runner| runner.id == runner_id)
    }

    /// Resolves a heat reference given either as a heat id or as a heat name.
    ///
    /// Ids win over names; heat names are unique within an event so the name
    /// lookup is unambiguous.
    pub fn resolve_heat(&self, reference: &str) -> Option<&str> {
        if let Some(id) = self.heats.keys().find(|id| id.as_str() == reference) {
            return Some(id.as_str());
        }
        self.heats
            .iter()
            .find(|(_, heat)| heat.name == reference)
            .map(|(id, _)| id.as_str())
    }
}

/// Child document, stored and versioned independently of its event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runner {
    pub id: String,
    pub version: Version,
    pub last_modified: DateTime<Utc>,
    #[serde(rename = "eventID")]
    pub event_id: String,
    pub name: String,
    pub bib: String,
    pub heat: String,
    /// checkpoint id -> split time
    pub splits: OrdMap<String, f64>,
}

impl Runner {
    pub fn new(
        event_id: impl Into<String>,
        name: impl Into<String>,
        bib: impl Into<String>,
        heat: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            version: Version::INITIAL,
            last_modified: Utc::now(),
            event_id: event_id.into(),
            name: name.into(),
            bib: bib.into(),
            heat: heat.into(),
            splits: OrdMap::new(),
        }
    }

    pub fn has_split(&self, checkpoint_id: &str) -> bool {
        self.splits.contains_key(checkpoint_id)
    }
}
