// SPDX-License-Identifier: Apache-2.0
//! `fantasim run`: drains a JSON-described work queue against a stream
//! (§6 `run`, §4.5).

use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Args;
use fantasim_core::{FantaSimError, StreamDomain, StreamIdentity, Tick};
use fantasim_events::store::{EventDraft, EventStore, KinematicsEventStore, TopologyEventStore};
use fantasim_sched::{run as drain, Dispatcher, RunOptions, Scheduler, Sphere};
use serde::de::DeserializeOwned;

use crate::kv;

/// Arguments for `fantasim run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Target stream.
    #[arg(long)]
    stream: String,
    /// Path to a JSON file holding an array of
    /// `{"when": <i64>, "sphere": "geosphere|biosphere|hydrosphere|atmosphere", "kind": <u32>, "payload": <event>}`
    /// work items.
    #[arg(long)]
    work_items: PathBuf,
    /// Stop the drain once the next item's tick exceeds this value.
    #[arg(long)]
    end_tick: i64,
    /// Path to the KV store backing file.
    #[arg(long, default_value = "fantasim.kv")]
    kv: PathBuf,
}

#[derive(Debug, serde::Deserialize)]
struct WorkItemIn {
    when: i64,
    sphere: String,
    kind: u32,
    payload: serde_json::Value,
}

fn parse_sphere(s: &str) -> anyhow::Result<Sphere> {
    match s {
        "geosphere" => Ok(Sphere::Geosphere),
        "biosphere" => Ok(Sphere::Biosphere),
        "hydrosphere" => Ok(Sphere::Hydrosphere),
        "atmosphere" => Ok(Sphere::Atmosphere),
        other => anyhow::bail!("unrecognized sphere `{other}`"),
    }
}

/// Dispatches a work item by deserializing its JSON payload directly into
/// the target stream's event payload type. This models the minimal useful
/// workload language for a developer CLI: one work item produces exactly
/// one event at its own tick. A scheduled simulation with handler-specific
/// branching by `kind` would need its own `Dispatcher` impl, not this one.
struct PassThroughDispatcher<P> {
    _marker: PhantomData<P>,
}

impl<P: DeserializeOwned> Dispatcher<P> for PassThroughDispatcher<P> {
    fn dispatch(&self, current_tick: Tick, _kind: u32, payload: &serde_json::Value) -> Result<Vec<EventDraft<P>>, FantaSimError> {
        let payload: P = serde_json::from_value(payload.clone()).map_err(|e| FantaSimError::Codec(e.to_string()))?;
        Ok(vec![EventDraft::new(current_tick, payload)])
    }
}

fn load_scheduler(path: &PathBuf) -> anyhow::Result<Scheduler> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let items: Vec<WorkItemIn> = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let scheduler = Scheduler::new();
    for item in items {
        let sphere = parse_sphere(&item.sphere)?;
        scheduler.schedule(Tick::new(item.when), sphere, item.kind, item.payload);
    }
    Ok(scheduler)
}

fn run_on<P: serde::Serialize + DeserializeOwned + Clone>(scheduler: &Scheduler, store: &EventStore<P>, end_tick: Tick) -> anyhow::Result<()> {
    let dispatcher = PassThroughDispatcher { _marker: PhantomData };
    let summary = drain(
        scheduler,
        store,
        &dispatcher,
        RunOptions {
            end_tick,
            ..RunOptions::default()
        },
    )?;
    println!(
        "processed {} item(s), appended {} event(s), last tick {}",
        summary.items_processed,
        summary.events_appended,
        summary.last_tick.map_or("-".to_string(), |t| t.index().to_string())
    );
    Ok(())
}

/// Runs `fantasim run`.
pub fn run(args: &RunArgs) -> anyhow::Result<()> {
    let identity = StreamIdentity::from_str(&args.stream).with_context(|| format!("invalid --stream {}", args.stream))?;
    let kv = kv::open(&args.kv)?;
    let scheduler = load_scheduler(&args.work_items)?;
    let end_tick = Tick::new(args.end_tick);

    match identity.domain {
        StreamDomain::PlatesTopology => run_on(&scheduler, &TopologyEventStore::new(kv, identity), end_tick),
        StreamDomain::PlatesKinematics => run_on(&scheduler, &KinematicsEventStore::new(kv, identity), end_tick),
    }
}
