//! Adaptive problem selection
//!
//! Decides which problem a learner sees next. Every call walks the same fixed
//! progression: pretest, baseline, required items, posttest-in-progress,
//! adaptive practice on skills below their mastery threshold, and finally the
//! posttest. No phase is stored; it is derived from the interaction log on
//! each call.

pub mod access;
pub mod policy;
pub mod selector;

pub use access::{AccessScope, ParameterAccessMode};
pub use policy::SelectionPolicy;
pub use selector::AdaptiveSelector;

use serde::{Deserialize, Serialize};

use crate::data::{DataError, Problem};
use crate::model::ModelError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectError {
    #[error("parameter access mode is invalid: {0:?}")]
    InvalidAccessMode(String),
    #[error("parameter access mode requires a {0} identifier")]
    ModeMismatch(AccessScope),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

/// Outcome of a selection round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "problem", rename_all = "snake_case")]
pub enum NextProblem {
    Problem(Problem),
    /// The learner has completed the posttest
    Finished,
    /// Nothing is left to serve outside a started posttest
    Exhausted,
}

impl NextProblem {
    pub fn problem(&self) -> Option<&Problem> {
        match self {
            NextProblem::Problem(problem) => Some(problem),
            _ => None,
        }
    }

    pub fn into_problem(self) -> Option<Problem> {
        match self {
            NextProblem::Problem(problem) => Some(problem),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, NextProblem::Finished)
    }
}

/// Mastery estimate of one skill for one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMastery {
    pub skill: String,
    pub probability: f64,
    pub threshold: f64,
    pub mastered: bool,
}

impl SkillMastery {
    pub fn new(skill: impl Into<String>, probability: f64, threshold: f64) -> Self {
        Self {
            skill: skill.into(),
            probability,
            threshold,
            mastered: probability >= threshold,
        }
    }
}
