// SPDX-License-Identifier: Apache-2.0
//! `fantasim cache gc`: collects stale cached artifacts under a retention
//! policy (§6 `cache gc`, §4.8).

use std::path::PathBuf;

use clap::Args;
use comfy_table::Table;
use fantasim_cache::{gc, ArtifactCache, RetentionPolicy};

use crate::kv;

/// Arguments for `fantasim cache gc`.
#[derive(Debug, Args)]
pub struct CacheGcArgs {
    /// Stream key prefix to collect under.
    #[arg(long)]
    prefix: String,
    /// Manifests written more than this many write-sequence ticks ago are
    /// eligible for deletion.
    #[arg(long)]
    max_age: u64,
    /// Minimum number of most-recent entries to retain per artifact kind.
    #[arg(long)]
    min_keep: usize,
    /// Path to the KV store backing file.
    #[arg(long, default_value = "fantasim.kv")]
    kv: PathBuf,
}

/// Runs `fantasim cache gc`.
pub fn run(args: &CacheGcArgs) -> anyhow::Result<()> {
    let kv = kv::open(&args.kv)?;
    let cache = ArtifactCache::new(kv);
    let report = gc::collect(
        &cache,
        &args.prefix,
        RetentionPolicy {
            max_sequence_age: args.max_age,
            min_artifacts_to_keep: args.min_keep,
        },
    )?;

    let mut table = Table::new();
    table.set_header(vec!["manifests deleted", "payloads deleted"]);
    table.add_row(vec![report.manifests_deleted.to_string(), report.payloads_deleted.to_string()]);
    println!("{table}");

    Ok(())
}
