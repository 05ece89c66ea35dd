// SPDX-License-Identifier: Apache-2.0
//! `clap`-facing mirrors of the option enums in `fantasim_core::config`.
//!
//! `clap::ValueEnum` needs a type it owns to derive against, so each config
//! enum gets a thin CLI-side twin here rather than deriving `ValueEnum`
//! directly on the library's enums (which would pull a CLI-only dependency
//! into `fantasim-core`).

use clap::ValueEnum;
use fantasim_core::config::{ProvenanceStrictness, TickFilterMode, TickPolicy};

/// CLI mirror of [`TickPolicy`].
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TickPolicyArg {
    /// See [`TickPolicy::Reject`].
    Reject,
    /// See [`TickPolicy::Warn`].
    Warn,
    /// See [`TickPolicy::Allow`].
    Allow,
}

impl From<TickPolicyArg> for TickPolicy {
    fn from(arg: TickPolicyArg) -> Self {
        match arg {
            TickPolicyArg::Reject => Self::Reject,
            TickPolicyArg::Warn => Self::Warn,
            TickPolicyArg::Allow => Self::Allow,
        }
    }
}

/// CLI mirror of [`TickFilterMode`].
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TickFilterModeArg {
    /// See [`TickFilterMode::Auto`].
    Auto,
    /// See [`TickFilterMode::ScanAll`].
    ScanAll,
    /// See [`TickFilterMode::BreakOnFirstBeyondTick`].
    BreakEarly,
}

impl From<TickFilterModeArg> for TickFilterMode {
    fn from(arg: TickFilterModeArg) -> Self {
        match arg {
            TickFilterModeArg::Auto => Self::Auto,
            TickFilterModeArg::ScanAll => Self::ScanAll,
            TickFilterModeArg::BreakEarly => Self::BreakOnFirstBeyondTick,
        }
    }
}

/// CLI mirror of [`fantasim_core::config::TolerancePolicy`]'s discriminant;
/// `Lenient`'s `epsilon` is a sibling flag (`--epsilon`) since `ValueEnum`
/// variants cannot carry data.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ToleranceKindArg {
    /// See `TolerancePolicy::Strict`.
    Strict,
    /// See `TolerancePolicy::Lenient`; reads `--epsilon`.
    Lenient,
    /// See `TolerancePolicy::Default`.
    Default,
}

/// CLI mirror of [`ProvenanceStrictness`].
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProvenanceStrictnessArg {
    /// See [`ProvenanceStrictness::Strict`].
    Strict,
    /// See [`ProvenanceStrictness::Lenient`].
    Lenient,
    /// See [`ProvenanceStrictness::Permissive`].
    Permissive,
}

impl From<ProvenanceStrictnessArg> for ProvenanceStrictness {
    fn from(arg: ProvenanceStrictnessArg) -> Self {
        match arg {
            ProvenanceStrictnessArg::Strict => Self::Strict,
            ProvenanceStrictnessArg::Lenient => Self::Lenient,
            ProvenanceStrictnessArg::Permissive => Self::Permissive,
        }
    }
}
