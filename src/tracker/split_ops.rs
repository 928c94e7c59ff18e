use super::outcome::{AddSplitsOutcome, RejectedSplit};
use super::{RaceTracker, parse_event_id, require_batch};
use crate::core::{Result, Runner, Version};
use crate::partition::{RejectReason, Rejected, SplitEntryRules, SplitSubmissionRules, partition};
use crate::storage::{StoreError, StoreResult, TypedStoreExt};
use crate::validation::SplitDraft;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// A runner that passed every check and has at least one split to write.
struct PendingWrite {
    item: Value,
    runner_id: String,
    expected: Version,
    splits: Vec<SplitDraft>,
}

impl RaceTracker {
    /// Records splits for several runners of one event.
    ///
    /// Each runner is all-or-nothing: its surviving splits land in a single
    /// conditional write keyed by the version the caller observed. Stale
    /// runners are rejected whole; the caller must re-fetch and resubmit.
    #[instrument(skip(self, runners))]
    pub async fn add_splits(
        &self,
        event_id: &str,
        runners: Option<Vec<Value>>,
    ) -> Result<AddSplitsOutcome> {
        let event_id = parse_event_id(event_id)?;
        let runners = require_batch(runners, "runners")?;
        let event = self.load_event(&event_id).await?;

        let result = partition(&SplitSubmissionRules::new(&event), runners);
        debug!(
            accepted = result.accepted.len(),
            rejected = result.rejected.len(),
            "split submissions partitioned"
        );
        let mut rejected_runners = result.rejected;
        let mut rejected_splits = Vec::new();

        let lookups = result.accepted.into_iter().map(|submission| {
            let store = self.store.clone();
            async move {
                let found: StoreResult<Option<Runner>> = store.fetch(&submission.runner_id).await;
                (submission, found)
            }
        });

        let mut pending = Vec::new();
        for (submission, found) in join_all(lookups).await {
            let item = submission.source;
            let runner = match found {
                Ok(Some(runner)) if runner.event_id == event.id => runner,
                Ok(_) => {
                    warn!(runner_id = %submission.runner_id, "runner in event summary has no document");
                    rejected_runners.push(Rejected::new(item, RejectReason::RunnerNotFound));
                    continue;
                }
                Err(err) => {
                    rejected_runners.push(Rejected::new(
                        item,
                        RejectReason::StoreUnavailable(err.to_string()),
                    ));
                    continue;
                }
            };

            if runner.version != submission.expected_version {
                rejected_runners.push(Rejected::new(
                    item,
                    RejectReason::StaleVersion {
                        expected: submission.expected_version,
                        actual: runner.version,
                    },
                ));
                continue;
            }

            let splits = partition(&SplitEntryRules::new(&event, &runner), submission.splits);
            rejected_splits.extend(splits.rejected.into_iter().map(|rejected| RejectedSplit {
                runner_id: runner.id.clone(),
                split: rejected.item,
                reason: rejected.reason,
            }));
            if splits.accepted.is_empty() {
                debug!(runner_id = %runner.id, "no surviving splits; runner not written");
                rejected_runners.push(Rejected::new(item, RejectReason::NoSplitsAccepted));
                continue;
            }

            pending.push(PendingWrite {
                item,
                runner_id: runner.id,
                expected: submission.expected_version,
                splits: splits.accepted,
            });
        }

        let updated_runners = self.write_splits(pending, &mut rejected_runners).await;

        info!(
            updated = updated_runners.len(),
            rejected_runners = rejected_runners.len(),
            rejected_splits = rejected_splits.len(),
            "splits recorded"
        );
        Ok(AddSplitsOutcome {
            updated_runners,
            rejected_runners,
            rejected_splits,
        })
    }

    /// Issues the per-runner conditional writes concurrently.
    async fn write_splits(
        &self,
        pending: Vec<PendingWrite>,
        rejected_runners: &mut Vec<Rejected>,
    ) -> Vec<Runner> {
        let writes = pending.into_iter().map(|write| {
            let store = self.store.clone();
            async move {
                let PendingWrite {
                    item,
                    runner_id,
                    expected,
                    splits,
                } = write;
                let written: StoreResult<Runner> = store
                    .update_if_match(&runner_id, expected, move |runner: &mut Runner| {
                        for split in splits {
                            runner.splits.insert(split.checkpoint_id, split.split_time);
                        }
                    })
                    .await;
                (item, written)
            }
        });

        let mut updated = Vec::new();
        for (item, written) in join_all(writes).await {
            match written {
                Ok(runner) => updated.push(runner),
                Err(StoreError::VersionConflict {
                    id,
                    expected,
                    actual,
                    ..
                }) => {
                    warn!(runner_id = %id, %expected, %actual, "runner modified between fetch and write");
                    rejected_runners.push(Rejected::new(
                        item,
                        RejectReason::StaleVersion { expected, actual },
                    ));
                }
                Err(StoreError::NotFound { .. }) => {
                    rejected_runners.push(Rejected::new(item, RejectReason::RunnerNotFound));
                }
                Err(err) => {
                    rejected_runners.push(Rejected::new(
                        item,
                        RejectReason::StoreUnavailable(err.to_string()),
                    ));
                }
            }
        }
        updated
    }
}
