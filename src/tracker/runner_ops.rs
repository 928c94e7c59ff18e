use super::outcome::{CreateRunnersOutcome, GetRunnersOutcome};
use super::{RaceTracker, parse_event_id, require_batch};
use crate::core::{Event, Result, Runner, RunnerRef};
use crate::partition::{NewRunnerRules, RejectReason, Rejected, RunnerLookupRules, partition};
use crate::storage::{StoreResult, TypedStoreExt};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

impl RaceTracker {
    /// Creates runner documents and references them from the event summary.
    ///
    /// Runner documents are created concurrently first. A runner whose create
    /// fails is rejected and never reaches the summary, so its bib stays free.
    /// The summary is then extended with the created runners only, in one
    /// additive merge guarded by the event version observed at fetch; a
    /// conflict there fails the whole operation and the created documents are
    /// left unreferenced.
    #[instrument(skip(self, runners))]
    pub async fn create_runners(
        &self,
        event_id: &str,
        runners: Option<Vec<Value>>,
    ) -> Result<CreateRunnersOutcome> {
        let event_id = parse_event_id(event_id)?;
        let runners = require_batch(runners, "runners")?;
        let event = self.load_event(&event_id).await?;

        let result = partition(&NewRunnerRules::new(&event), runners);
        debug!(
            accepted = result.accepted.len(),
            rejected = result.rejected.len(),
            "runners partitioned"
        );
        let mut rejected_runners = result.rejected;

        let creates = result.accepted.into_iter().map(|draft| {
            let store = self.store.clone();
            let runner = Runner::new(&event.id, &draft.name, &draft.bib, &draft.heat);
            async move {
                let runner_id = runner.id.clone();
                let created: StoreResult<Runner> = store.insert(runner).await;
                (draft.source, runner_id, created)
            }
        });

        let mut created_runners = Vec::new();
        for (item, runner_id, created) in join_all(creates).await {
            match created {
                Ok(runner) => created_runners.push(runner),
                Err(err) => {
                    warn!(
                        event_id = %event.id,
                        runner_id = %runner_id,
                        error = %err,
                        "runner create failed"
                    );
                    rejected_runners.push(Rejected::new(
                        item,
                        RejectReason::StoreUnavailable(err.to_string()),
                    ));
                }
            }
        }

        if created_runners.is_empty() {
            return Ok(CreateRunnersOutcome {
                event,
                created_runners,
                rejected_runners,
            });
        }

        let refs: Vec<RunnerRef> = created_runners.iter().map(RunnerRef::from).collect();
        let event = match self
            .commit_event(&event, move |event: &mut Event| {
                for runner_ref in refs {
                    if !event.has_runner(&runner_ref.id) {
                        event.runners.push_back(runner_ref);
                    }
                }
            })
            .await
        {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    event_id = %event.id,
                    orphaned = created_runners.len(),
                    "event summary merge failed; created runners are unreferenced"
                );
                return Err(err);
            }
        };

        info!(
            version = %event.version,
            created = created_runners.len(),
            rejected = rejected_runners.len(),
            "runners created"
        );
        Ok(CreateRunnersOutcome {
            event,
            created_runners,
            rejected_runners,
        })
    }

    /// Fetches runners of one event by id. Ids with no runner document in the event are rejected.
    #[instrument(skip(self, runner_ids))]
    pub async fn get_runners(
        &self,
        event_id: &str,
        runner_ids: Option<Vec<Value>>,
    ) -> Result<GetRunnersOutcome> {
        let event_id = parse_event_id(event_id)?;
        let runner_ids = require_batch(runner_ids, "runnerIDs")?;
        let event = self.load_event(&event_id).await?;

        let result = partition(&RunnerLookupRules, runner_ids);
        let mut rejected_ids = result.rejected;

        let lookups = result.accepted.into_iter().map(|runner_id| {
            let store = self.store.clone();
            async move {
                let found: StoreResult<Option<Runner>> = store.fetch(&runner_id).await;
                (runner_id, found)
            }
        });

        let mut runners = Vec::new();
        for (runner_id, found) in join_all(lookups).await {
            match found {
                Ok(Some(runner)) if runner.event_id == event.id => runners.push(runner),
                Ok(_) => rejected_ids.push(Rejected::new(
                    Value::String(runner_id),
                    RejectReason::RunnerNotFound,
                )),
                Err(err) => rejected_ids.push(Rejected::new(
                    Value::String(runner_id),
                    RejectReason::StoreUnavailable(err.to_string()),
                )),
            }
        }

        debug!(found = runners.len(), rejected = rejected_ids.len(), "runners fetched");
        Ok(GetRunnersOutcome {
            runners,
            rejected_ids,
        })
    }
}
