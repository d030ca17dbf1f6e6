use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use danci_adapt::config::{Config, SimulationConfig};
use danci_adapt::logging::init_tracing;
use danci_adapt::seed::{enroll_all, seed_demo_course};
use danci_adapt::{AdaptiveSelector, InMemoryDataProvider, NextProblem, Parameters, SelectError};

fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.logging);

    if let Err(err) = run(&config) {
        tracing::error!(error = %err, "simulation failed");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), SelectError> {
    let sim = &config.simulation;
    let store = Arc::new(InMemoryDataProvider::new());
    seed_demo_course(&store, &sim.course_id)?;

    let selector = AdaptiveSelector::with_bkt(Arc::clone(&store), &config.access_mode)?;
    enroll_all(&selector, &sim.course_id, &[sim.user_id.as_str()], Parameters::default())?;

    let steps = simulate(&selector, &store, sim)?;

    for mastery in selector.skill_report(&sim.course_id, &sim.user_id)? {
        tracing::info!(
            skill = %mastery.skill,
            probability = mastery.probability,
            threshold = mastery.threshold,
            mastered = mastery.mastered,
            "final mastery"
        );
    }
    tracing::info!(
        steps,
        navigation_unlocked = store.has_permission(&sim.course_id, &sim.user_id),
        "simulation complete"
    );
    Ok(())
}

fn simulate(
    selector: &AdaptiveSelector<InMemoryDataProvider>,
    store: &InMemoryDataProvider,
    sim: &SimulationConfig,
) -> Result<usize, SelectError> {
    let seed = sim.seed.unwrap_or_else(|| rand::rng().random());
    let mut learner = ChaCha8Rng::seed_from_u64(seed);
    tracing::info!(seed, accuracy = sim.accuracy, "starting simulated learner");

    if let Some(first) = selector.choose_first_problem(&sim.course_id, &sim.user_id)? {
        tracing::info!(problem = %first.problem_name, "first problem");
    }

    for step in 0..sim.max_steps {
        let problem = match selector.choose_next_problem(&sim.course_id, &sim.user_id)? {
            NextProblem::Problem(problem) => problem,
            NextProblem::Finished => {
                tracing::info!(step, "learner finished the course");
                return Ok(step);
            }
            NextProblem::Exhausted => {
                tracing::warn!(step, "course ran out of problems");
                return Ok(step);
            }
        };

        let correct = learner.random_bool(sim.accuracy);
        store.record_interaction(&sim.course_id, &sim.user_id, &problem.problem_name, correct)?;
        tracing::info!(step, problem = %problem.problem_name, correct, "answered");
    }

    tracing::warn!(max_steps = sim.max_steps, "step limit reached");
    Ok(sim.max_steps)
}
