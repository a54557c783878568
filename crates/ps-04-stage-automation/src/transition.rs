//! # Transition Resolution
//!
//! The pure `{open, won, lost}` state machine. No side effects, no cache: a
//! function from the current flags and the destination's configuration to a
//! tagged outcome.

use serde::{Deserialize, Serialize};
use shared_types::{
    DealRecord, LifecycleStage, OutcomeDesignation, PipelineConfig, StageConfig,
};

/// Explicit caller override on a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeOverride {
    Won,
    Lost,
}

/// The lifecycle flags of a record, extracted for transition resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleFlags {
    pub is_won: bool,
    pub is_lost: bool,
}

impl From<&DealRecord> for LifecycleFlags {
    fn from(record: &DealRecord) -> Self {
        Self {
            is_won: record.is_won,
            is_lost: record.is_lost,
        }
    }
}

/// Resolved outcome of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The deal closes as won.
    Won { closed_at: u64 },
    /// The deal closes as lost.
    Lost { closed_at: u64 },
    /// A closed deal moves back to an open stage; flags and close timestamp
    /// are cleared.
    Reopened,
    /// Flags are untouched.
    Unchanged,
}

impl Transition {
    /// Whether this transition counts as a win.
    #[must_use]
    pub fn is_won(self) -> bool {
        matches!(self, Self::Won { .. })
    }
}

/// Resolve the transition for a move, in rule order:
///
/// 1. an explicit override wins;
/// 2. the destination is the pipeline's configured won stage; when no won
///    stage is configured, a destination carrying the canonical `Customer`
///    marker or a stage-level won designation counts instead;
/// 3. symmetrically for lost (the lifecycle ladder has no lost marker, so
///    the fallback is the stage-level lost designation alone);
/// 4. a previously closed deal moving anywhere else reopens;
/// 5. otherwise the flags are untouched.
#[must_use]
pub fn resolve_transition(
    flags: LifecycleFlags,
    destination: &StageConfig,
    pipeline: &PipelineConfig,
    overrides: Option<OutcomeOverride>,
    now: u64,
) -> Transition {
    match overrides {
        Some(OutcomeOverride::Won) => return Transition::Won { closed_at: now },
        Some(OutcomeOverride::Lost) => return Transition::Lost { closed_at: now },
        None => {}
    }

    let won = match &pipeline.won_stage {
        Some(stage_id) => stage_id == &destination.id,
        None => {
            destination.lifecycle_marker == Some(LifecycleStage::Customer)
                || destination.designation == Some(OutcomeDesignation::Won)
        }
    };
    if won {
        return Transition::Won { closed_at: now };
    }

    let lost = match &pipeline.lost_stage {
        Some(stage_id) => stage_id == &destination.id,
        None => destination.designation == Some(OutcomeDesignation::Lost),
    };
    if lost {
        return Transition::Lost { closed_at: now };
    }

    if flags.is_won || flags.is_lost {
        return Transition::Reopened;
    }

    Transition::Unchanged
}
