//! Step and attempt state of a bridge transfer.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepId {
    Capture,
    Approve,
    Bridge,
}

impl StepId {
    pub const ORDER: [StepId; 3] = [StepId::Capture, StepId::Approve, StepId::Bridge];

    pub fn title(&self) -> &'static str {
        match self {
            StepId::Capture => "Capturing Metadata",
            StepId::Approve => "Approving Transfer",
            StepId::Bridge => "Bridging NFT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StepId::Capture => "Saving NFT metadata",
            StepId::Approve => "Approving contract",
            StepId::Bridge => "Sending to destination chain",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepId::Capture => "capture",
            StepId::Approve => "approve",
            StepId::Bridge => "bridge",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Loading,
    Completed,
    Error,
}

impl StepStatus {
    /// pending -> loading -> completed | error; nothing else.
    pub fn can_transition_to(self, next: StepStatus) -> bool {
        matches!(
            (self, next),
            (StepStatus::Pending, StepStatus::Loading)
                | (StepStatus::Loading, StepStatus::Completed)
                | (StepStatus::Loading, StepStatus::Error)
        )
    }

    pub fn is_settled(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeStep {
    pub id: StepId,
    pub title: &'static str,
    pub description: &'static str,
    pub status: StepStatus,
}

/// The fixed, ordered step list shown while a transfer runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeSteps {
    steps: Vec<BridgeStep>,
}

impl Default for BridgeSteps {
    fn default() -> Self {
        Self {
            steps: StepId::ORDER
                .iter()
                .map(|&id| BridgeStep {
                    id,
                    title: id.title(),
                    description: id.description(),
                    status: StepStatus::Pending,
                })
                .collect(),
        }
    }
}

impl BridgeSteps {
    pub fn status(&self, id: StepId) -> StepStatus {
        self.steps.iter().find(|s| s.id == id).map(|s| s.status).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BridgeStep> {
        self.steps.iter()
    }

    /// Apply a forward transition. Returns false (and leaves the step alone) otherwise.
    pub fn advance(&mut self, id: StepId, next: StepStatus) -> bool {
        match self.steps.iter_mut().find(|s| s.id == id) {
            Some(step) if step.status.can_transition_to(next) => {
                step.status = next;
                true
            }
            Some(step) => {
                warn!(step = %id, from = ?step.status, to = ?next, "rejected step transition");
                false
            }
            None => false,
        }
    }

    pub fn all_completed(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }
}

/// Where a single transfer attempt currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttemptState {
    #[default]
    Idle,
    Capturing,
    Quoting,
    Approving,
    Sending,
    Confirming,
    Done,
    Failed {
        /// Step that was running when the attempt failed, if any.
        step: Option<StepId>,
        message: String,
    },
}

impl AttemptState {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            AttemptState::Capturing
                | AttemptState::Quoting
                | AttemptState::Approving
                | AttemptState::Sending
                | AttemptState::Confirming
        )
    }

    /// UI step that owns this state.
    pub fn step(&self) -> Option<StepId> {
        match self {
            AttemptState::Capturing => Some(StepId::Capture),
            AttemptState::Approving => Some(StepId::Approve),
            AttemptState::Sending | AttemptState::Confirming => Some(StepId::Bridge),
            AttemptState::Failed { step, .. } => *step,
            _ => None,
        }
    }
}
