use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{DataError, DataProvider, Interaction, Problem, Trajectory};
use crate::model::Parameters;

#[derive(Debug, Default)]
struct CourseRecord {
    skills: Vec<String>,
    problems: Vec<Problem>,
    users: BTreeSet<String>,
    interactions: HashMap<String, Vec<Interaction>>,
    permissions: HashSet<String>,
}

impl CourseRecord {
    fn attempted(&self, user_id: &str) -> HashSet<&str> {
        self.interactions
            .get(user_id)
            .map(|log| log.iter().map(|i| i.problem.problem_name.as_str()).collect())
            .unwrap_or_default()
    }

    fn remaining<F>(&self, user_id: &str, filter: F) -> Vec<Problem>
    where
        F: Fn(&Problem) -> bool,
    {
        let attempted = self.attempted(user_id);
        self.problems
            .iter()
            .filter(|p| filter(p) && !attempted.contains(p.problem_name.as_str()))
            .cloned()
            .collect()
    }

    fn ensure_enrolled(&self, course_id: &str, user_id: &str) -> Result<(), DataError> {
        if self.users.contains(user_id) {
            Ok(())
        } else {
            Err(DataError::UserNotEnrolled {
                course: course_id.to_string(),
                user: user_id.to_string(),
            })
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    courses: HashMap<String, CourseRecord>,
    parameters: HashMap<String, Parameters>,
}

impl StoreState {
    fn course(&self, course_id: &str) -> Result<&CourseRecord, DataError> {
        self.courses
            .get(course_id)
            .ok_or_else(|| DataError::CourseNotFound(course_id.to_string()))
    }

    fn course_mut(&mut self, course_id: &str) -> Result<&mut CourseRecord, DataError> {
        self.courses
            .get_mut(course_id)
            .ok_or_else(|| DataError::CourseNotFound(course_id.to_string()))
    }
}

/// Process-local course repository.
///
/// Keeps the whole store behind one lock, which trivially gives the per-key
/// write serialization and read-after-write consistency the selector assumes.
#[derive(Debug, Default)]
pub struct InMemoryDataProvider {
    state: RwLock<StoreState>,
}

impl InMemoryDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_course(&self, course_id: &str) -> Result<(), DataError> {
        let mut state = self.state.write();
        if state.courses.contains_key(course_id) {
            return Err(DataError::AlreadyExists {
                kind: "course",
                name: course_id.to_string(),
            });
        }
        state
            .courses
            .insert(course_id.to_string(), CourseRecord::default());
        tracing::debug!(course = course_id, "course created");
        Ok(())
    }

    pub fn add_skill(&self, course_id: &str, skill_name: &str) -> Result<(), DataError> {
        let mut state = self.state.write();
        let course = state.course_mut(course_id)?;
        if course.skills.iter().any(|s| s == skill_name) {
            return Err(DataError::AlreadyExists {
                kind: "skill",
                name: skill_name.to_string(),
            });
        }
        course.skills.push(skill_name.to_string());
        Ok(())
    }

    /// Adds a problem to its course catalog, registering any skill the course
    /// does not know yet.
    pub fn add_problem(&self, problem: Problem) -> Result<(), DataError> {
        let mut state = self.state.write();
        let course = state.course_mut(&problem.course_id)?;
        if course
            .problems
            .iter()
            .any(|p| p.problem_name == problem.problem_name)
        {
            return Err(DataError::AlreadyExists {
                kind: "problem",
                name: problem.problem_name,
            });
        }

        for skill in &problem.skills {
            if !course.skills.contains(skill) {
                tracing::debug!(
                    course = %problem.course_id,
                    skill = %skill,
                    "registering skill from problem"
                );
                course.skills.push(skill.clone());
            }
        }
        course.problems.push(problem);
        Ok(())
    }

    /// Returns `false` when the user was already enrolled.
    pub fn enroll_user(&self, course_id: &str, user_id: &str) -> Result<bool, DataError> {
        let mut state = self.state.write();
        let course = state.course_mut(course_id)?;
        let inserted = course.users.insert(user_id.to_string());
        if inserted {
            tracing::info!(course = course_id, user = user_id, "user enrolled");
        }
        Ok(inserted)
    }

    pub fn users(&self, course_id: &str) -> Result<Vec<String>, DataError> {
        let state = self.state.read();
        Ok(state.course(course_id)?.users.iter().cloned().collect())
    }

    pub fn record_interaction(
        &self,
        course_id: &str,
        user_id: &str,
        problem_name: &str,
        correct: bool,
    ) -> Result<Interaction, DataError> {
        self.record_interaction_at(course_id, user_id, problem_name, correct, Utc::now())
    }

    pub fn record_interaction_at(
        &self,
        course_id: &str,
        user_id: &str,
        problem_name: &str,
        correct: bool,
        timestamp: DateTime<Utc>,
    ) -> Result<Interaction, DataError> {
        let mut state = self.state.write();
        let course = state.course_mut(course_id)?;
        course.ensure_enrolled(course_id, user_id)?;

        let problem = course
            .problems
            .iter()
            .find(|p| p.problem_name == problem_name)
            .cloned()
            .ok_or_else(|| DataError::ProblemNotFound {
                course: course_id.to_string(),
                problem: problem_name.to_string(),
            })?;

        let interaction = Interaction {
            user_id: user_id.to_string(),
            problem,
            correct,
            timestamp,
        };
        course
            .interactions
            .entry(user_id.to_string())
            .or_default()
            .push(interaction.clone());

        tracing::debug!(
            course = course_id,
            user = user_id,
            problem = problem_name,
            correct,
            "interaction recorded"
        );
        Ok(interaction)
    }

    pub fn has_permission(&self, course_id: &str, user_id: &str) -> bool {
        self.state
            .read()
            .courses
            .get(course_id)
            .map(|c| c.permissions.contains(user_id))
            .unwrap_or(false)
    }
}

impl DataProvider for InMemoryDataProvider {
    fn get_problems(&self, course_id: &str) -> Result<Vec<Problem>, DataError> {
        let state = self.state.read();
        Ok(state.course(course_id)?.problems.clone())
    }

    fn get_all_interactions(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Vec<Interaction>, DataError> {
        let state = self.state.read();
        let course = state.course(course_id)?;
        course.ensure_enrolled(course_id, user_id)?;
        Ok(course
            .interactions
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn get_skill_trajectory(
        &self,
        course_id: &str,
        skill_name: &str,
        user_id: &str,
    ) -> Result<Trajectory, DataError> {
        let state = self.state.read();
        let course = state.course(course_id)?;
        course.ensure_enrolled(course_id, user_id)?;

        let log = course
            .interactions
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let (pretest, practice): (Vec<&Interaction>, Vec<&Interaction>) = log
            .iter()
            .filter(|i| i.problem.has_skill(skill_name))
            .partition(|i| i.problem.pretest);

        let num_pretest = pretest.len();
        let outcomes = pretest
            .into_iter()
            .chain(practice)
            .map(|i| i.correct)
            .collect();
        Ok(Trajectory::new(outcomes, num_pretest))
    }

    fn get_skills(&self, course_id: &str) -> Result<Vec<String>, DataError> {
        let state = self.state.read();
        Ok(state.course(course_id)?.skills.clone())
    }

    fn get_remaining_problems(
        &self,
        course_id: &str,
        skill_name: &str,
        user_id: &str,
    ) -> Result<Vec<Problem>, DataError> {
        let state = self.state.read();
        let course = state.course(course_id)?;
        course.ensure_enrolled(course_id, user_id)?;
        Ok(course.remaining(user_id, |p| {
            !p.pretest && !p.posttest && p.has_skill(skill_name)
        }))
    }

    fn get_all_remaining_pretest_problems(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Vec<Problem>, DataError> {
        let state = self.state.read();
        let course = state.course(course_id)?;
        course.ensure_enrolled(course_id, user_id)?;
        Ok(course.remaining(user_id, |p| p.pretest))
    }

    fn get_all_remaining_posttest_problems(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Vec<Problem>, DataError> {
        let state = self.state.read();
        let course = state.course(course_id)?;
        course.ensure_enrolled(course_id, user_id)?;
        Ok(course.remaining(user_id, |p| p.posttest))
    }

    fn get(&self, key: &str) -> Result<Parameters, DataError> {
        self.state
            .read()
            .parameters
            .get(key)
            .copied()
            .ok_or_else(|| DataError::ParametersNotFound(key.to_string()))
    }

    fn set(&self, key: &str, parameters: Parameters) -> Result<(), DataError> {
        self.state
            .write()
            .parameters
            .insert(key.to_string(), parameters);
        Ok(())
    }

    fn set_permission(&self, course_id: &str, user_id: &str) -> Result<(), DataError> {
        let mut state = self.state.write();
        let course = state.course_mut(course_id)?;
        course.ensure_enrolled(course_id, user_id)?;
        if course.permissions.insert(user_id.to_string()) {
            tracing::info!(course = course_id, user = user_id, "navigation permission granted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURSE: &str = "stats";
    const USER: &str = "u1";

    fn store() -> InMemoryDataProvider {
        let store = InMemoryDataProvider::new();
        store.create_course(COURSE).unwrap();
        store
            .add_problem(Problem::new(COURSE, "Pre_assessment_0", &["center"]).pretest())
            .unwrap();
        store
            .add_problem(Problem::new(COURSE, "center_1", &["center"]))
            .unwrap();
        store
            .add_problem(Problem::new(COURSE, "center_2", &["center", "shape"]))
            .unwrap();
        store
            .add_problem(Problem::new(COURSE, "Post_assessment_0", &["center"]).posttest())
            .unwrap();
        store.enroll_user(COURSE, USER).unwrap();
        store
    }

    #[test]
    fn test_add_problem_registers_skills() {
        let store = store();
        assert_eq!(store.get_skills(COURSE).unwrap(), vec!["center", "shape"]);
        assert!(matches!(
            store.add_problem(Problem::new(COURSE, "center_1", &["center"])),
            Err(DataError::AlreadyExists { kind: "problem", .. })
        ));
    }

    #[test]
    fn test_trajectory_puts_pretest_first() {
        let store = store();
        store.record_interaction(COURSE, USER, "center_1", false).unwrap();
        store
            .record_interaction(COURSE, USER, "Pre_assessment_0", true)
            .unwrap();
        store.record_interaction(COURSE, USER, "center_2", true).unwrap();

        let trajectory = store.get_skill_trajectory(COURSE, "center", USER).unwrap();
        assert_eq!(trajectory, Trajectory::new(vec![true, false, true], 1));

        let shape = store.get_skill_trajectory(COURSE, "shape", USER).unwrap();
        assert_eq!(shape, Trajectory::new(vec![true], 0));
    }

    #[test]
    fn test_remaining_excludes_attempted_and_assessments() {
        let store = store();
        store.record_interaction(COURSE, USER, "center_1", true).unwrap();

        let remaining: Vec<String> = store
            .get_remaining_problems(COURSE, "center", USER)
            .unwrap()
            .into_iter()
            .map(|p| p.problem_name)
            .collect();
        assert_eq!(remaining, vec!["center_2"]);

        assert_eq!(
            store.get_all_remaining_pretest_problems(COURSE, USER).unwrap().len(),
            1
        );
        store
            .record_interaction(COURSE, USER, "Post_assessment_0", true)
            .unwrap();
        assert!(store
            .get_all_remaining_posttest_problems(COURSE, USER)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_record_interaction_validates_references() {
        let store = store();
        assert!(matches!(
            store.record_interaction(COURSE, "ghost", "center_1", true),
            Err(DataError::UserNotEnrolled { .. })
        ));
        assert!(matches!(
            store.record_interaction(COURSE, USER, "missing", true),
            Err(DataError::ProblemNotFound { .. })
        ));
        assert!(matches!(
            store.record_interaction("nope", USER, "center_1", true),
            Err(DataError::CourseNotFound(_))
        ));
    }

    #[test]
    fn test_parameters_and_permission() {
        let store = store();
        assert_eq!(
            store.get("statsu1center"),
            Err(DataError::ParametersNotFound("statsu1center".to_string()))
        );
        store.set("statsu1center", Parameters::default()).unwrap();
        assert_eq!(store.get("statsu1center").unwrap(), Parameters::default());

        assert!(!store.has_permission(COURSE, USER));
        store.set_permission(COURSE, USER).unwrap();
        assert!(store.has_permission(COURSE, USER));
    }

    #[test]
    fn test_enroll_is_idempotent() {
        let store = store();
        assert!(!store.enroll_user(COURSE, USER).unwrap());
        assert!(store.enroll_user(COURSE, "u2").unwrap());
        assert_eq!(store.users(COURSE).unwrap(), vec!["u1", "u2"]);
    }
}
