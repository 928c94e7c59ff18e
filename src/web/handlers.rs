use super::{AppState, malformed};
use crate::api::{
    AddCheckpointsRequest, AddHeatsRequest, AddSplitsRequest, ApiResponse, CreateEventRequest,
    CreateRunnersRequest, EventQuery, RemoveCheckpointsRequest, RemoveHeatsRequest, RunnersQuery,
    StartHeatRequest,
};
use crate::core::Event;
use crate::tracker::{
    AddSplitsOutcome, BatchOutcome, CheckpointEntry, CreateRunnersOutcome, DeleteAllOutcome,
    GetRunnersOutcome, HeatEntry, StoreContents,
};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> ApiResponse<Event> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed(rejection),
    };
    ApiResponse::from_result(
        state
            .tracker
            .create_event(
                request.name.as_ref(),
                request.unit_of_measure.as_ref(),
                request.total_distance.as_ref(),
            )
            .await,
    )
}

pub async fn get_event(
    State(state): State<AppState>,
    query: Result<Query<EventQuery>, QueryRejection>,
) -> ApiResponse<Event> {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return malformed(rejection),
    };
    ApiResponse::from_result(state.tracker.get_event(&query.event_id).await)
}

pub async fn create_runners(
    State(state): State<AppState>,
    payload: Result<Json<CreateRunnersRequest>, JsonRejection>,
) -> ApiResponse<CreateRunnersOutcome> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed(rejection),
    };
    ApiResponse::from_batch(
        state
            .tracker
            .create_runners(&request.event_id, request.runners)
            .await,
    )
}

pub async fn get_runners(
    State(state): State<AppState>,
    query: Result<Query<RunnersQuery>, QueryRejection>,
) -> ApiResponse<GetRunnersOutcome> {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return malformed(rejection),
    };
    ApiResponse::from_batch(
        state
            .tracker
            .get_runners(&query.event_id, query.runner_ids())
            .await,
    )
}

pub async fn add_heats(
    State(state): State<AppState>,
    payload: Result<Json<AddHeatsRequest>, JsonRejection>,
) -> ApiResponse<BatchOutcome<HeatEntry>> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed(rejection),
    };
    ApiResponse::from_batch(state.tracker.add_heats(&request.event_id, request.heats).await)
}

pub async fn remove_heats(
    State(state): State<AppState>,
    payload: Result<Json<RemoveHeatsRequest>, JsonRejection>,
) -> ApiResponse<BatchOutcome<String>> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed(rejection),
    };
    ApiResponse::from_batch(
        state
            .tracker
            .remove_heats(&request.event_id, request.heat_ids)
            .await,
    )
}

pub async fn start_heat(
    State(state): State<AppState>,
    payload: Result<Json<StartHeatRequest>, JsonRejection>,
) -> ApiResponse<Event> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed(rejection),
    };
    ApiResponse::from_result(
        state
            .tracker
            .start_heat(
                &request.event_id,
                request.heat_id.as_ref(),
                request.start_time.as_ref(),
            )
            .await,
    )
}

pub async fn add_checkpoints(
    State(state): State<AppState>,
    payload: Result<Json<AddCheckpointsRequest>, JsonRejection>,
) -> ApiResponse<BatchOutcome<CheckpointEntry>> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed(rejection),
    };
    ApiResponse::from_batch(
        state
            .tracker
            .add_checkpoints(&request.event_id, request.checkpoints)
            .await,
    )
}

pub async fn remove_checkpoints(
    State(state): State<AppState>,
    payload: Result<Json<RemoveCheckpointsRequest>, JsonRejection>,
) -> ApiResponse<BatchOutcome<String>> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed(rejection),
    };
    ApiResponse::from_batch(
        state
            .tracker
            .remove_checkpoints(&request.event_id, request.checkpoint_ids)
            .await,
    )
}

pub async fn add_splits(
    State(state): State<AppState>,
    payload: Result<Json<AddSplitsRequest>, JsonRejection>,
) -> ApiResponse<AddSplitsOutcome> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed(rejection),
    };
    ApiResponse::from_batch(state.tracker.add_splits(&request.event_id, request.runners).await)
}

pub async fn get_all(State(state): State<AppState>) -> ApiResponse<StoreContents> {
    ApiResponse::from_result(state.tracker.get_all().await)
}

pub async fn delete_all(State(state): State<AppState>) -> ApiResponse<DeleteAllOutcome> {
    ApiResponse::from_result(state.tracker.delete_all().await)
}
