pub mod error;
pub mod types;

pub use error::{ErrorKind, RaceError, Result};
pub use types::{
    Checkpoint, Event, Heat, Runner, RunnerRef, UnitOfMeasure, Version, new_id,
};
