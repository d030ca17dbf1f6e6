//! Data provider contract
//!
//! The selector reads courses, problem catalogs, interaction logs and model
//! parameters through [`DataProvider`]. Durable storage lives outside this
//! crate; [`InMemoryDataProvider`] is the reference implementation used by the
//! simulator and the tests.

pub mod memory;

pub use memory::InMemoryDataProvider;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Parameters;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("no parameters stored under key {0:?}")]
    ParametersNotFound(String),
    #[error("course not found: {0}")]
    CourseNotFound(String),
    #[error("problem {problem} not found in course {course}")]
    ProblemNotFound { course: String, problem: String },
    #[error("user {user} is not enrolled in course {course}")]
    UserNotEnrolled { course: String, user: String },
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: &'static str, name: String },
    #[error("storage failure: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub problem_name: String,
    pub course_id: String,
    /// Skills exercised by the problem; the first one drives selection
    pub skills: Vec<String>,
    #[serde(default)]
    pub pretest: bool,
    #[serde(default)]
    pub posttest: bool,
}

impl Problem {
    pub fn new(
        course_id: impl Into<String>,
        problem_name: impl Into<String>,
        skills: &[&str],
    ) -> Self {
        Self {
            problem_name: problem_name.into(),
            course_id: course_id.into(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            pretest: false,
            posttest: false,
        }
    }

    pub fn pretest(mut self) -> Self {
        self.pretest = true;
        self
    }

    pub fn posttest(mut self) -> Self {
        self.posttest = true;
        self
    }

    pub fn primary_skill(&self) -> Option<&str> {
        self.skills.first().map(String::as_str)
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: String,
    pub problem: Problem,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
}

/// Correctness history of one learner on one skill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trajectory {
    pub outcomes: Vec<bool>,
    /// Leading entries that come from pretest problems
    pub num_pretest: usize,
}

impl Trajectory {
    pub fn new(outcomes: Vec<bool>, num_pretest: usize) -> Self {
        Self {
            outcomes,
            num_pretest,
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Storage collaborator consumed by the selector.
///
/// Implementations are expected to serialize writes per key and to provide
/// read-after-write consistency; the selector adds no locking of its own.
pub trait DataProvider: Send + Sync {
    fn get_problems(&self, course_id: &str) -> Result<Vec<Problem>, DataError>;

    /// Every interaction of the user in the course, oldest first.
    fn get_all_interactions(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Vec<Interaction>, DataError>;

    fn get_skill_trajectory(
        &self,
        course_id: &str,
        skill_name: &str,
        user_id: &str,
    ) -> Result<Trajectory, DataError>;

    fn get_skills(&self, course_id: &str) -> Result<Vec<String>, DataError>;

    /// Practice problems of the skill the user has not attempted yet.
    fn get_remaining_problems(
        &self,
        course_id: &str,
        skill_name: &str,
        user_id: &str,
    ) -> Result<Vec<Problem>, DataError>;

    fn get_all_remaining_pretest_problems(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Vec<Problem>, DataError>;

    fn get_all_remaining_posttest_problems(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Vec<Problem>, DataError>;

    fn get(&self, key: &str) -> Result<Parameters, DataError>;

    fn set(&self, key: &str, parameters: Parameters) -> Result<(), DataError>;

    /// Grant the user free navigation through the course.
    fn set_permission(&self, course_id: &str, user_id: &str) -> Result<(), DataError>;
}
