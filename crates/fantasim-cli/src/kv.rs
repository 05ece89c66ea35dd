// SPDX-License-Identifier: Apache-2.0
//! Opens the shared, lock-guarded KV backend every subcommand stores its
//! streams and cache entries in.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use fantasim_kv::{FileKv, KvStore};

/// Opens (creating if absent) the whole-file KV store at `path`, wrapped
/// the way [`fantasim_events::store::EventStore`] and
/// [`fantasim_cache::store::ArtifactCache`] expect to receive it.
pub fn open(path: &Path) -> anyhow::Result<Arc<Mutex<dyn KvStore + Send>>> {
    let kv = FileKv::open(path).with_context(|| format!("opening kv store at {}", path.display()))?;
    Ok(Arc::new(Mutex::new(kv)))
}
