//! Demo course and learner enrollment.

use crate::data::{DataError, DataProvider, InMemoryDataProvider, Problem};
use crate::model::{KnowledgeModel, Parameters};
use crate::select::{AdaptiveSelector, SelectError};

/// Skills every learner is enrolled with unless told otherwise.
pub const DEFAULT_SKILLS: &[&str] = &[
    "center",
    "shape",
    "spread",
    "x axis",
    "y axis",
    "h to d",
    "d to h",
    "histogram",
    "None",
];

const DEMO_PRETEST_COUNT: usize = 4;
const DEMO_POSTTEST_COUNT: usize = 4;
const DEMO_PRACTICE_PER_SKILL: usize = 3;

/// Create a course with pretest, baseline, required, practice and posttest
/// problems covering [`DEFAULT_SKILLS`].
pub fn seed_demo_course(store: &InMemoryDataProvider, course_id: &str) -> Result<(), DataError> {
    store.create_course(course_id)?;
    for skill in DEFAULT_SKILLS {
        store.add_skill(course_id, skill)?;
    }

    for i in 0..DEMO_PRETEST_COUNT {
        let skill = DEFAULT_SKILLS[i % (DEFAULT_SKILLS.len() - 1)];
        let name = format!("Pre_assessment_{i}");
        store.add_problem(Problem::new(course_id, name, &[skill]).pretest())?;
    }

    store.add_problem(Problem::new(course_id, "b3", &["center"]))?;
    store.add_problem(Problem::new(course_id, "b4", &["shape"]))?;
    store.add_problem(Problem::new(course_id, "b3_2_0", &["center"]))?;
    store.add_problem(Problem::new(course_id, "labels_we", &["None"]))?;
    store.add_problem(Problem::new(course_id, "skew_easy_0", &["shape"]))?;

    for &skill in DEFAULT_SKILLS.iter().filter(|s| **s != "None") {
        let slug = skill.replace(' ', "_");
        for i in 0..DEMO_PRACTICE_PER_SKILL {
            store.add_problem(Problem::new(course_id, format!("{slug}_{i}"), &[skill]))?;
        }
    }

    for i in 0..DEMO_POSTTEST_COUNT {
        let skill = DEFAULT_SKILLS[i % (DEFAULT_SKILLS.len() - 1)];
        let name = format!("Post_assessment_{i}");
        store.add_problem(Problem::new(course_id, name, &[skill]).posttest())?;
    }

    tracing::info!(course = course_id, "seeded demo course");
    Ok(())
}

/// Enroll a learner and store the same parameters for each listed skill.
///
/// Already enrolled learners are left untouched. Returns whether the learner
/// was newly enrolled.
pub fn enroll_learner<M, S>(
    selector: &AdaptiveSelector<InMemoryDataProvider, M>,
    course_id: &str,
    user_id: &str,
    parameters: Parameters,
    skills: &[S],
) -> Result<bool, SelectError>
where
    M: KnowledgeModel,
    S: AsRef<str>,
{
    if !selector.data().enroll_user(course_id, user_id)? {
        tracing::debug!(course = course_id, user = user_id, "learner already enrolled");
        return Ok(false);
    }
    selector.set_parameters_bulk(parameters, course_id, Some(user_id), skills)?;
    Ok(true)
}

/// Enroll learners with the same parameters for every skill of the course.
/// Returns how many were newly enrolled.
pub fn enroll_all<M, S>(
    selector: &AdaptiveSelector<InMemoryDataProvider, M>,
    course_id: &str,
    user_ids: &[S],
    parameters: Parameters,
) -> Result<usize, SelectError>
where
    M: KnowledgeModel,
    S: AsRef<str>,
{
    let skills = selector.data().get_skills(course_id)?;
    let mut enrolled = 0;
    for user_id in user_ids {
        if enroll_learner(selector, course_id, user_id.as_ref(), parameters, skills.as_slice())? {
            enrolled += 1;
        }
    }
    Ok(enrolled)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_demo_course_layout() {
        let store = InMemoryDataProvider::new();
        seed_demo_course(&store, "demo").unwrap();

        let problems = store.get_problems("demo").unwrap();
        assert_eq!(problems.iter().filter(|p| p.pretest).count(), DEMO_PRETEST_COUNT);
        assert_eq!(problems.iter().filter(|p| p.posttest).count(), DEMO_POSTTEST_COUNT);
        assert_eq!(store.get_skills("demo").unwrap().len(), DEFAULT_SKILLS.len());
        assert!(problems.iter().any(|p| p.problem_name == "x_axis_0"));
    }

    #[test]
    fn test_enroll_skips_existing_learners() {
        let store = Arc::new(InMemoryDataProvider::new());
        seed_demo_course(&store, "demo").unwrap();
        let selector = AdaptiveSelector::with_bkt(store, "user skill").unwrap();

        let params = Parameters {
            threshold: 0.9,
            ..Parameters::default()
        };
        assert_eq!(enroll_all(&selector, "demo", &["a", "b"], params).unwrap(), 2);
        assert_eq!(enroll_all(&selector, "demo", &["a", "c"], Parameters::default()).unwrap(), 1);

        let stored = selector
            .get_parameter("demo", Some("a"), Some("histogram"))
            .unwrap();
        assert_eq!(stored.threshold, 0.9);
        let stored = selector.get_parameter("demo", Some("c"), Some("None")).unwrap();
        assert_eq!(stored, Parameters::default());
    }
}
