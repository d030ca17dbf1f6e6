//! Knowledge tracing
//!
//! Stateless student models that turn a trajectory of correct/incorrect
//! observations on one skill into a probability that the skill is mastered.
//! A model holds no information about the learner or the course; everything
//! it needs arrives through the trajectory and the parameter set.

pub mod bkt;

pub use bkt::BayesianKnowledgeTracing;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PARAM_GUESS: &str = "pg";
pub const PARAM_SLIP: &str = "ps";
pub const PARAM_PRIOR: &str = "pi";
pub const PARAM_TRANSIT: &str = "pt";
pub const PARAM_THRESHOLD: &str = "threshold";

const DEFAULT_GUESS: f64 = 0.25;
const DEFAULT_SLIP: f64 = 0.25;
const DEFAULT_PRIOR: f64 = 0.1;
const DEFAULT_TRANSIT: f64 = 0.5;
const DEFAULT_THRESHOLD: f64 = 0.99;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("missing model parameter: {0}")]
    MissingParameter(&'static str),
    #[error("model parameter {name} must be a probability in [0, 1], got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("degenerate posterior update at observation {index}: denominator is {denominator}")]
    DegenerateUpdate { index: usize, denominator: f64 },
}

/// Parameter set of the two-state knowledge tracing model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Probability of answering correctly without mastery
    pub pg: f64,
    /// Probability of answering incorrectly despite mastery
    pub ps: f64,
    /// Prior probability of mastery before any observation
    pub pi: f64,
    /// Probability of moving to the mastered state after a trial
    pub pt: f64,
    /// Mastery cutoff used by the selector
    pub threshold: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            pg: DEFAULT_GUESS,
            ps: DEFAULT_SLIP,
            pi: DEFAULT_PRIOR,
            pt: DEFAULT_TRANSIT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Parameters {
    pub fn new(pg: f64, ps: f64, pi: f64, pt: f64, threshold: f64) -> Self {
        Self {
            pg,
            ps,
            pi,
            pt,
            threshold,
        }
    }

    /// Parse a loosely-typed JSON object (as stored by an external API layer).
    ///
    /// Unknown keys are ignored. A missing or non-numeric required key is
    /// reported by name; range checks are left to [`Parameters::validate`].
    pub fn from_json(value: &Value) -> Result<Self, ModelError> {
        let field = |name: &'static str| {
            value
                .get(name)
                .and_then(Value::as_f64)
                .ok_or(ModelError::MissingParameter(name))
        };

        Ok(Self {
            pg: field(PARAM_GUESS)?,
            ps: field(PARAM_SLIP)?,
            pi: field(PARAM_PRIOR)?,
            pt: field(PARAM_TRANSIT)?,
            threshold: field(PARAM_THRESHOLD)?,
        })
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            PARAM_GUESS: self.pg,
            PARAM_SLIP: self.ps,
            PARAM_PRIOR: self.pi,
            PARAM_TRANSIT: self.pt,
            PARAM_THRESHOLD: self.threshold,
        })
    }

    /// Every parameter must be a finite probability.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in [
            (PARAM_GUESS, self.pg),
            (PARAM_SLIP, self.ps),
            (PARAM_PRIOR, self.pi),
            (PARAM_TRANSIT, self.pt),
            (PARAM_THRESHOLD, self.threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ModelError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

/// A student model able to estimate skill mastery from a correctness trajectory.
///
/// Implementations must be deterministic and free of side effects, so a single
/// instance can be shared by every request.
pub trait KnowledgeModel: Send + Sync {
    /// Probability that the skill is mastered after observing `trajectory`.
    ///
    /// The first `num_pretest` observations are assessment attempts and do not
    /// take part in the update.
    fn compute_mastery_probability(
        &self,
        trajectory: &[bool],
        num_pretest: usize,
        parameters: &Parameters,
    ) -> Result<f64, ModelError>;
}
