//! Wire-level request and response types.

pub mod request;
pub mod response;

pub use request::{
    AddCheckpointsRequest, AddHeatsRequest, AddSplitsRequest, CreateEventRequest,
    CreateRunnersRequest, EventQuery, RemoveCheckpointsRequest, RemoveHeatsRequest, RunnersQuery,
    StartHeatRequest,
};
pub use response::{ApiError, ApiResponse, Status};
