#![allow(dead_code)]

use std::sync::Arc;

use danci_adapt::{AdaptiveSelector, DataProvider, InMemoryDataProvider, Parameters, Problem};

pub const COURSE: &str = "stats101";
pub const USER: &str = "learner";

pub struct Fixture {
    pub store: Arc<InMemoryDataProvider>,
    pub selector: AdaptiveSelector<InMemoryDataProvider>,
}

impl Fixture {
    pub fn answer(&self, problem_name: &str, correct: bool) {
        self.store
            .record_interaction(COURSE, USER, problem_name, correct)
            .unwrap();
    }

    pub fn next_name(&self) -> String {
        self.selector
            .choose_next_problem(COURSE, USER)
            .unwrap()
            .into_problem()
            .expect("expected a problem")
            .problem_name
    }

    pub fn set_skill(&self, skill: &str, parameters: Parameters) {
        self.selector
            .set_parameter(parameters, Some(COURSE), Some(USER), Some(skill))
            .unwrap();
    }
}

/// Course with the given problems, one enrolled learner and default parameters
/// for every skill under the "user skill" access mode.
pub fn fixture(problems: Vec<Problem>) -> Fixture {
    let store = Arc::new(InMemoryDataProvider::new());
    store.create_course(COURSE).unwrap();
    for problem in problems {
        store.add_problem(problem).unwrap();
    }
    store.enroll_user(COURSE, USER).unwrap();

    let selector = AdaptiveSelector::with_bkt(Arc::clone(&store), "user skill").unwrap();
    let skills = store.get_skills(COURSE).unwrap();
    selector
        .set_parameters_bulk(Parameters::default(), COURSE, Some(USER), skills.as_slice())
        .unwrap();

    Fixture { store, selector }
}

pub fn problem(name: &str, skill: &str) -> Problem {
    Problem::new(COURSE, name, &[skill])
}

pub fn pretest(name: &str, skill: &str) -> Problem {
    problem(name, skill).pretest()
}

pub fn posttest(name: &str, skill: &str) -> Problem {
    problem(name, skill).posttest()
}

/// Parameters under which one correct answer already counts as mastery.
pub fn easy_parameters() -> Parameters {
    Parameters::new(0.25, 0.25, 0.1, 0.5, 0.6)
}
