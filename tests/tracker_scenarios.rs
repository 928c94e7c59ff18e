use race_tracker::api::{ApiResponse, Status};
use race_tracker::core::ErrorKind;
use race_tracker::partition::Rejected;
use race_tracker::{Event, RaceError, RaceTracker, Version};
use serde_json::{Value, json};

async fn create_event(tracker: &RaceTracker, name: &str) -> Event {
    tracker
        .create_event(Some(&json!(name)), Some(&json!("kilometers")), Some(&json!(10)))
        .await
        .expect("event should be created")
}

async fn add_heat(tracker: &RaceTracker, event: &Event, name: &str) -> String {
    let outcome = tracker
        .add_heats(&event.id, Some(vec![json!({ "name": name })]))
        .await
        .expect("heat batch should run");
    assert_eq!(outcome.accepted.len(), 1, "heat '{name}' should be accepted");
    outcome.accepted[0].id.clone()
}

async fn add_checkpoint(tracker: &RaceTracker, event: &Event, name: &str) -> String {
    let outcome = tracker
        .add_checkpoints(&event.id, Some(vec![json!({ "name": name })]))
        .await
        .expect("checkpoint batch should run");
    assert_eq!(outcome.accepted.len(), 1, "checkpoint '{name}' should be accepted");
    outcome.accepted[0].id.clone()
}

fn codes(rejected: &[Rejected]) -> Vec<&'static str> {
    rejected.iter().map(|r| r.reason.code()).collect()
}

#[tokio::test]
async fn test_end_to_end_checkpoints_and_missing_heat() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "River 10k").await;
    assert!(event.checkpoints.is_empty());

    let first = tracker
        .add_checkpoints(&event.id, Some(vec![json!({"name": "CP1"})]))
        .await
        .unwrap();
    assert_eq!(first.accepted.len(), 1);
    assert_eq!(first.accepted[0].name, "CP1");
    assert_eq!(first.event.checkpoints.len(), 1);

    let again = tracker
        .add_checkpoints(&event.id, Some(vec![json!({"name": "CP1"})]))
        .await
        .unwrap();
    assert!(again.accepted.is_empty());
    assert_eq!(codes(&again.rejected), vec!["checkpointExists"]);
    assert!(again.rejected[0].reason.to_string().contains("already exists"));

    let runners = tracker
        .create_runners(
            &event.id,
            Some(vec![json!({"name": "A", "bib": "1", "heat": "H1"})]),
        )
        .await
        .unwrap();
    assert!(runners.created_runners.is_empty());
    assert_eq!(codes(&runners.rejected_runners), vec!["heatNotFound"]);
    assert!(
        runners.rejected_runners[0]
            .reason
            .to_string()
            .to_lowercase()
            .contains("heat not found")
    );
}

#[tokio::test]
async fn test_every_item_is_accepted_or_rejected_exactly_once() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Partition").await;
    let batch = vec![
        json!({"name": "Elite"}),
        json!({"name": ""}),
        json!({"name": "Open"}),
        json!({"name": "Elite"}),
        json!("Masters"),
        json!({"name": "Masters"}),
    ];

    let outcome = tracker.add_heats(&event.id, Some(batch.clone())).await.unwrap();

    let names: Vec<&str> = outcome.accepted.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["Elite", "Open", "Masters"]);
    assert_eq!(outcome.accepted.len() + outcome.rejected.len(), batch.len());
    let rejected_items: Vec<&Value> = outcome.rejected.iter().map(|r| &r.item).collect();
    assert_eq!(rejected_items, vec![&batch[1], &batch[3], &batch[4]]);
    assert_eq!(outcome.event.heats.len(), 3);
}

#[tokio::test]
async fn test_duplicate_heat_names_keep_the_first_submission() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Waves").await;

    let outcome = tracker
        .add_heats(
            &event.id,
            Some(vec![json!({"name": "Wave A"}), json!({"name": "Wave A"})]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.accepted.len(), 1);
    assert!(outcome.accepted[0].start_time.is_none());
    assert_eq!(codes(&outcome.rejected), vec!["duplicateHeatName"]);
    assert_eq!(outcome.rejected[0].item, json!({"name": "Wave A"}));
}

#[tokio::test]
async fn test_fully_rejected_batch_is_idempotent_and_keeps_version() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Idempotent").await;
    add_heat(&tracker, &event, "Open").await;
    let before = tracker.get_event(&event.id).await.unwrap();

    let batch = vec![json!({"name": "Open"}), json!({"name": "a$b"}), json!(null)];
    let first = tracker.add_heats(&event.id, Some(batch.clone())).await.unwrap();
    let second = tracker.add_heats(&event.id, Some(batch)).await.unwrap();

    assert!(first.accepted.is_empty());
    assert_eq!(first.rejected, second.rejected);
    assert_eq!(codes(&first.rejected), vec!["heatExists", "invalidHeat", "invalidHeat"]);

    let after = tracker.get_event(&event.id).await.unwrap();
    assert_eq!(after.version, before.version);
    assert_eq!(after.last_modified, before.last_modified);
}

#[tokio::test]
async fn test_heat_with_runner_is_never_removed() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Removal").await;
    let busy = add_heat(&tracker, &event, "Busy").await;
    let idle_a = add_heat(&tracker, &event, "Idle A").await;
    let idle_b = add_heat(&tracker, &event, "Idle B").await;

    tracker
        .create_runners(
            &event.id,
            Some(vec![json!({"name": "Ada", "bib": "1", "heat": "Busy"})]),
        )
        .await
        .unwrap();

    for (batch, idle) in [
        (vec![json!(busy), json!(idle_a)], &idle_a),
        (vec![json!(idle_b), json!(busy)], &idle_b),
    ] {
        let outcome = tracker.remove_heats(&event.id, Some(batch)).await.unwrap();
        assert_eq!(outcome.accepted, vec![idle.clone()]);
        assert_eq!(codes(&outcome.rejected), vec!["heatInUse"]);
        assert_eq!(outcome.rejected[0].item, json!(busy));
        assert!(outcome.event.heats.contains_key(&busy));
    }

    let event = tracker.get_event(&event.id).await.unwrap();
    assert_eq!(event.heats.len(), 1);
}

#[tokio::test]
async fn test_remove_checkpoints_reports_unknown_and_duplicate_ids() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Checkpoints").await;
    let cp = add_checkpoint(&tracker, &event, "Bridge").await;
    let unknown = "7d444840-9dc0-11d1-b245-5ffdce74fad2";

    let outcome = tracker
        .remove_checkpoints(
            &event.id,
            Some(vec![json!(cp), json!(cp), json!(unknown), json!(42)]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.accepted, vec![cp]);
    assert_eq!(
        codes(&outcome.rejected),
        vec!["duplicateCheckpointId", "checkpointNotFound", "invalidCheckpointId"]
    );
    assert!(outcome.event.checkpoints.is_empty());
    assert_eq!(outcome.event.version, event.version.next().next());
}

#[tokio::test]
async fn test_create_runners_resolves_heats_and_extends_summary() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Roster").await;
    let heat_id = add_heat(&tracker, &event, "Open").await;

    let outcome = tracker
        .create_runners(
            &event.id,
            Some(vec![
                json!({"name": "Ada", "bib": "10", "heat": "Open"}),
                json!({"name": "Bo", "bib": "11", "heat": heat_id}),
                json!({"name": "Cy", "bib": "10", "heat": "Open"}),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.created_runners.len(), 2);
    assert!(outcome.created_runners.iter().all(|r| r.heat == heat_id));
    assert!(outcome.created_runners.iter().all(|r| r.version == Version::INITIAL));
    assert_eq!(codes(&outcome.rejected_runners), vec!["duplicateBib"]);
    assert_eq!(outcome.event.runners.len(), 2);

    let retry = tracker
        .create_runners(
            &event.id,
            Some(vec![json!({"name": "Di", "bib": "11", "heat": "Open"})]),
        )
        .await
        .unwrap();
    assert_eq!(codes(&retry.rejected_runners), vec!["bibTaken"]);
}

#[tokio::test]
async fn test_get_runners_rejects_foreign_and_malformed_ids() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Home").await;
    let other = create_event(&tracker, "Away").await;
    add_heat(&tracker, &event, "Open").await;
    add_heat(&tracker, &other, "Open").await;

    let home = tracker
        .create_runners(&event.id, Some(vec![json!({"name": "Ada", "bib": "1", "heat": "Open"})]))
        .await
        .unwrap()
        .created_runners
        .remove(0);
    let away = tracker
        .create_runners(&other.id, Some(vec![json!({"name": "Bo", "bib": "1", "heat": "Open"})]))
        .await
        .unwrap()
        .created_runners
        .remove(0);

    let outcome = tracker
        .get_runners(
            &event.id,
            Some(vec![json!(home.id), json!(away.id), json!("x"), json!(home.id)]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.runners, vec![home]);
    let mut rejected = codes(&outcome.rejected_ids);
    rejected.sort_unstable();
    assert_eq!(rejected, vec!["duplicateRunnerId", "invalidRunnerId", "runnerNotFound"]);
}

#[tokio::test]
async fn test_split_for_recorded_checkpoint_is_always_rejected() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Splits").await;
    add_heat(&tracker, &event, "Open").await;
    let cp1 = add_checkpoint(&tracker, &event, "CP1").await;
    let cp2 = add_checkpoint(&tracker, &event, "CP2").await;
    let runner = tracker
        .create_runners(&event.id, Some(vec![json!({"name": "Ada", "bib": "1", "heat": "Open"})]))
        .await
        .unwrap()
        .created_runners
        .remove(0);

    let first = tracker
        .add_splits(
            &event.id,
            Some(vec![json!({
                "id": runner.id,
                "expectedVersion": runner.version,
                "splits": [{"checkpointId": cp1, "splitTime": 600.5}]
            })]),
        )
        .await
        .unwrap();
    let updated = &first.updated_runners[0];
    assert_eq!(updated.splits.get(&cp1), Some(&600.5));

    let second = tracker
        .add_splits(
            &event.id,
            Some(vec![json!({
                "id": runner.id,
                "expectedVersion": updated.version,
                "heat": "Open",
                "splits": [
                    {"checkpointId": cp1, "splitTime": 700.0},
                    {"checkpointId": cp2, "splitTime": 1_200.0},
                    {"checkpointId": cp2, "splitTime": 1_250.0}
                ]
            })]),
        )
        .await
        .unwrap();

    assert!(second.rejected_runners.is_empty());
    let split_codes: Vec<_> = second.rejected_splits.iter().map(|s| s.reason.code()).collect();
    assert_eq!(split_codes, vec!["splitExists", "duplicateSplit"]);
    let runner = &second.updated_runners[0];
    assert_eq!(runner.splits.get(&cp1), Some(&600.5));
    assert_eq!(runner.splits.get(&cp2), Some(&1_200.0));
}

#[tokio::test]
async fn test_runner_without_surviving_splits_is_not_written() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "No-op").await;
    add_heat(&tracker, &event, "Open").await;
    let runner = tracker
        .create_runners(&event.id, Some(vec![json!({"name": "Ada", "bib": "1", "heat": "Open"})]))
        .await
        .unwrap()
        .created_runners
        .remove(0);

    let outcome = tracker
        .add_splits(
            &event.id,
            Some(vec![json!({
                "id": runner.id,
                "expectedVersion": 1,
                "splits": [{"checkpointId": "7d444840-9dc0-11d1-b245-5ffdce74fad2", "splitTime": 5}]
            })]),
        )
        .await
        .unwrap();

    assert!(outcome.updated_runners.is_empty());
    assert_eq!(outcome.rejected_splits[0].reason.code(), "checkpointNotFound");
    assert_eq!(outcome.rejected_splits[0].runner_id, runner.id);
    assert_eq!(codes(&outcome.rejected_runners), vec!["noSplitsAccepted"]);

    let fetched = tracker
        .get_runners(&event.id, Some(vec![json!(runner.id)]))
        .await
        .unwrap();
    assert_eq!(fetched.runners[0].version, Version::INITIAL);
}

#[tokio::test]
async fn test_runner_entry_without_splits_is_rejected() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Empty").await;
    add_heat(&tracker, &event, "Open").await;
    let cp = add_checkpoint(&tracker, &event, "CP1").await;
    let created = tracker
        .create_runners(
            &event.id,
            Some(vec![
                json!({"name": "Ada", "bib": "1", "heat": "Open"}),
                json!({"name": "Bo", "bib": "2", "heat": "Open"}),
            ]),
        )
        .await
        .unwrap()
        .created_runners;

    let empty = json!({"id": created[0].id, "expectedVersion": 1, "splits": []});
    let outcome = tracker
        .add_splits(&event.id, Some(vec![empty.clone()]))
        .await
        .unwrap();
    assert!(outcome.updated_runners.is_empty());
    assert_eq!(outcome.rejected_runners.len(), 1);
    assert_eq!(outcome.rejected_runners[0].item, empty);
    assert_eq!(codes(&outcome.rejected_runners), vec!["invalidRunner"]);
    let response = ApiResponse::from_batch(Ok(outcome));
    assert_eq!(response.status, Status::ClientError);
    assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidInput);

    let outcome = tracker
        .add_splits(
            &event.id,
            Some(vec![
                empty,
                json!({
                    "id": created[1].id,
                    "expectedVersion": 1,
                    "splits": [{"checkpointId": cp, "splitTime": 12.5}]
                }),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(outcome.updated_runners.len() + outcome.rejected_runners.len(), 2);
    assert_eq!(outcome.updated_runners[0].id, created[1].id);
}

#[tokio::test]
async fn test_add_splits_rejects_unknown_declared_heat() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Heats").await;
    add_heat(&tracker, &event, "Open").await;
    let runner = tracker
        .create_runners(&event.id, Some(vec![json!({"name": "Ada", "bib": "1", "heat": "Open"})]))
        .await
        .unwrap()
        .created_runners
        .remove(0);

    let outcome = tracker
        .add_splits(
            &event.id,
            Some(vec![json!({
                "id": runner.id,
                "expectedVersion": 1,
                "heat": "Elite",
                "splits": [{"checkpointId": "7d444840-9dc0-11d1-b245-5ffdce74fad2", "splitTime": 5}]
            })]),
        )
        .await
        .unwrap();

    assert_eq!(codes(&outcome.rejected_runners), vec!["heatNotFound"]);
}

#[tokio::test]
async fn test_heat_starts_exactly_once() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Start").await;
    let heat_id = add_heat(&tracker, &event, "Open").await;

    let started = tracker
        .start_heat(&event.id, Some(&json!(heat_id)), Some(&json!(1_700_000_000.0)))
        .await
        .unwrap();
    assert_eq!(started.heats.get(&heat_id).unwrap().start_time, Some(1_700_000_000.0));

    let err = tracker
        .start_heat(&event.id, Some(&json!(heat_id)), Some(&json!(1_700_000_100.0)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

    let err = tracker
        .start_heat(&event.id, Some(&json!(heat_id)), Some(&json!("noon")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let unknown = "7d444840-9dc0-11d1-b245-5ffdce74fad2";
    let err = tracker
        .start_heat(&event.id, Some(&json!(unknown)), Some(&json!(1.0)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_create_event_normalizes_optional_fields() {
    let tracker = RaceTracker::in_memory();
    let event = tracker
        .create_event(Some(&json!("Ultra")), Some(&json!("leagues")), Some(&json!("50.5")))
        .await
        .unwrap();

    assert_eq!(event.unit_of_measure.as_str(), "");
    assert_eq!(event.total_distance, Some(50.5));
    assert_eq!(event.version, Version::INITIAL);

    let err = tracker
        .create_event(Some(&json!("")), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RaceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_operations_on_missing_event_fail_before_any_write() {
    let tracker = RaceTracker::in_memory();
    let missing = "7d444840-9dc0-11d1-b245-5ffdce74fad2";

    let err = tracker
        .add_heats(missing, Some(vec![json!({"name": "Open"})]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = tracker.get_event("not-a-uuid").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let event = create_event(&tracker, "Present").await;
    let err = tracker.add_heats(&event.id, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    assert!(tracker.get_all().await.unwrap().runners.is_empty());
}

#[tokio::test]
async fn test_admin_lists_and_wipes_everything() {
    let tracker = RaceTracker::in_memory();
    let event = create_event(&tracker, "Admin").await;
    add_heat(&tracker, &event, "Open").await;
    tracker
        .create_runners(&event.id, Some(vec![json!({"name": "Ada", "bib": "1", "heat": "Open"})]))
        .await
        .unwrap();

    let contents = tracker.get_all().await.unwrap();
    assert_eq!(contents.events.len(), 1);
    assert_eq!(contents.runners.len(), 1);

    assert_eq!(tracker.delete_all().await.unwrap().deleted, 2);
    let err = tracker.get_event(&event.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
