// SPDX-License-Identifier: Apache-2.0
//! The runtime loop that drains a [`Scheduler`] against an event store
//! (§4.5).

use crate::queue::Scheduler;
use fantasim_core::config::{AppendOptions, TickPolicy};
use fantasim_core::{FantaSimError, Tick};
use fantasim_events::store::{EventDraft, EventStore};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, instrument};

/// Translates one dequeued work item into the event drafts it produces.
///
/// Implementations must be pure with respect to `current_tick`, `kind` and
/// `payload`: the same inputs always produce the same drafts, since the
/// scheduler carries no other state across a run (§4.5 determinism).
pub trait Dispatcher<P> {
    /// Handles one work item, returning the drafts it appends.
    ///
    /// # Errors
    /// Any error aborts the run; the queue is left with this item already
    /// removed (it is not retried).
    fn dispatch(&self, current_tick: Tick, kind: u32, payload: &serde_json::Value) -> Result<Vec<EventDraft<P>>, FantaSimError>;
}

/// Options controlling a [`run`] invocation.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Stop once the queue is empty or its next item is beyond this tick.
    pub end_tick: Tick,
    /// Tick policy enforced on every append (§9: monotonicity is always
    /// enforced during a run, never `Allow` or `Warn`).
    pub tick_policy: TickPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            end_tick: Tick::new(i64::MAX),
            tick_policy: TickPolicy::Reject,
        }
    }
}

/// Summary of a completed (or aborted) run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of work items dispatched.
    pub items_processed: u64,
    /// Number of event records appended across all dispatches.
    pub events_appended: u64,
    /// Tick of the last processed item, if any.
    pub last_tick: Option<Tick>,
}

/// Drains `scheduler` in canonical order, dispatching each item and
/// appending the resulting drafts to `store`, until the queue empties or
/// the next item's tick exceeds `options.end_tick` (§4.5).
///
/// A dispatch or append failure is fatal: it stops the run and returns the
/// error. The failing item has already been popped, so it is not retried;
/// every item processed before it has already been durably appended.
///
/// # Errors
/// Propagates whatever [`Dispatcher::dispatch`] or [`EventStore::append`]
/// returns.
#[instrument(skip(scheduler, store, dispatcher))]
pub fn run<P: Serialize + DeserializeOwned + Clone>(
    scheduler: &Scheduler,
    store: &EventStore<P>,
    dispatcher: &dyn Dispatcher<P>,
    options: RunOptions,
) -> Result<RunSummary, FantaSimError> {
    let mut summary = RunSummary::default();

    loop {
        let Some(when) = scheduler.peek_when() else {
            break;
        };
        if when > options.end_tick {
            break;
        }
        let Some(item) = scheduler.pop() else {
            break;
        };

        let drafts = dispatcher.dispatch(item.when, item.kind, &item.payload)?;
        if !drafts.is_empty() {
            let appended = store.append(
                &drafts,
                AppendOptions {
                    tick_policy: options.tick_policy,
                },
            )?;
            summary.events_appended += appended.len() as u64;
        }
        summary.items_processed += 1;
        summary.last_tick = Some(item.when);
    }

    info!(
        items_processed = summary.items_processed,
        events_appended = summary.events_appended,
        "run drained"
    );
    Ok(summary)
}
