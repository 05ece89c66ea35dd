// SPDX-License-Identifier: Apache-2.0
//! Typed option structs for each component, with the same
//! derive-`Default`-then-override shape `warp_core`'s scheduler and
//! retention configs use, rather than stringly-typed option maps.

/// Governs whether an out-of-order or non-increasing tick is rejected,
/// logged and allowed, or silently allowed on append (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TickPolicy {
    /// Reject an append whose tick does not strictly increase the stream's
    /// last-seen tick. The default: silent tick disorder is the kind of bug
    /// a deterministic event-sourced log exists to catch early.
    #[default]
    Reject,
    /// Log a warning but accept the append anyway.
    Warn,
    /// Accept the append without comment.
    Allow,
}

/// Governs how strictly geometric reconstruction tolerates numerical slack
/// (§4.6).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TolerancePolicy {
    /// No slack: any detected inconsistency is an error.
    Strict,
    /// Accept inconsistencies up to `epsilon` radians.
    Lenient {
        /// Maximum tolerated angular inconsistency, in radians.
        epsilon: f64,
    },
    /// The component's own documented default tolerance.
    Default,
}

impl Default for TolerancePolicy {
    fn default() -> Self {
        Self::Default
    }
}

/// Governs how a provenance chain handles a broken or missing link (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProvenanceStrictness {
    /// Any broken link is an error.
    #[default]
    Strict,
    /// A broken link is recorded but does not fail the request.
    Lenient,
    /// Broken links are silently omitted from the returned chain.
    Permissive,
}

/// How far a materialization scans the event log to find the last record at
/// or before the requested tick (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TickFilterMode {
    /// Scan every record on the stream.
    ScanAll,
    /// Stop at the first record strictly beyond the requested tick, relying
    /// on append-order tick monotonicity.
    BreakOnFirstBeyondTick,
    /// Reserved for a future materializer that picks based on the stream's
    /// configured [`TickPolicy`]. The current materializer resolves this
    /// conservatively to `ScanAll` regardless of policy.
    #[default]
    Auto,
}

/// Options accepted by an append operation (§6 `append`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOptions {
    /// Tick monotonicity enforcement for this stream.
    pub tick_policy: TickPolicy,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self {
            tick_policy: TickPolicy::default(),
        }
    }
}

/// Options accepted by a materialize operation (§6 `materialize`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterializeOptions {
    /// How far into the log to scan when locating the target tick.
    pub tick_filter_mode: TickFilterMode,
}

/// Options accepted by a partition/reconstruction operation (§6 `reconstruct`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionOptions {
    /// Numerical tolerance policy applied to the spherical polygon solver.
    pub tolerance: TolerancePolicy,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            tolerance: TolerancePolicy::default(),
        }
    }
}

/// Options accepted by a full reconstruction request, composing partition
/// options with provenance strictness (§6 `reconstruct`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructOptions {
    /// Partition/geometry tolerance policy.
    pub partition: PartitionOptions,
    /// How strictly the returned provenance chain must be fully linked.
    pub provenance: ProvenanceStrictness,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            partition: PartitionOptions::default(),
            provenance: ProvenanceStrictness::default(),
        }
    }
}
