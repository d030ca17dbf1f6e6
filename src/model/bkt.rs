//! Bayesian Knowledge Tracing
//!
//! Two-state hidden Markov model (unmastered / mastered):
//! - Each observation updates the mastery belief by Bayes' rule, using the
//!   guess and slip probabilities as emission model
//! - After each trial the learner may move to the mastered state with
//!   probability `pt`; there is no forgetting
//! - The prior `pi` is returned unchanged when there is nothing to observe

use super::{KnowledgeModel, ModelError, Parameters};

#[derive(Debug, Clone, Copy, Default)]
pub struct BayesianKnowledgeTracing;

impl BayesianKnowledgeTracing {
    pub fn new() -> Self {
        Self
    }

    fn posterior(
        belief: f64,
        correct: bool,
        params: &Parameters,
        index: usize,
    ) -> Result<f64, ModelError> {
        let (mastered, unmastered) = if correct {
            (belief * (1.0 - params.ps), (1.0 - belief) * params.pg)
        } else {
            (belief * params.ps, (1.0 - belief) * (1.0 - params.pg))
        };

        let denominator = mastered + unmastered;
        if denominator <= 0.0 || !denominator.is_finite() {
            return Err(ModelError::DegenerateUpdate { index, denominator });
        }
        Ok(mastered / denominator)
    }
}

impl KnowledgeModel for BayesianKnowledgeTracing {
    fn compute_mastery_probability(
        &self,
        trajectory: &[bool],
        num_pretest: usize,
        parameters: &Parameters,
    ) -> Result<f64, ModelError> {
        parameters.validate()?;

        let mut belief = parameters.pi;
        for (index, &correct) in trajectory.iter().enumerate().skip(num_pretest) {
            belief = Self::posterior(belief, correct, parameters, index)?;
            belief += (1.0 - belief) * parameters.pt;
        }

        Ok(belief.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_params() -> Parameters {
        Parameters::new(0.25, 0.25, 0.1, 0.5, 0.99)
    }

    #[test]
    fn test_empty_trajectory_returns_prior() {
        let model = BayesianKnowledgeTracing::new();
        let p = model
            .compute_mastery_probability(&[], 0, &reference_params())
            .unwrap();
        assert_eq!(p, 0.1);
    }

    #[test]
    fn test_pretest_only_trajectory_returns_prior() {
        let model = BayesianKnowledgeTracing::new();
        let p = model
            .compute_mastery_probability(&[true, false, true], 3, &reference_params())
            .unwrap();
        assert_eq!(p, 0.1);

        // More pretest attempts than observations behaves the same way
        let p = model
            .compute_mastery_probability(&[true], 4, &reference_params())
            .unwrap();
        assert_eq!(p, 0.1);
    }

    #[test]
    fn test_single_correct_by_hand() {
        let model = BayesianKnowledgeTracing::new();
        let p = model
            .compute_mastery_probability(&[true], 0, &reference_params())
            .unwrap();
        // posterior 0.075 / 0.3 = 0.25, then 0.25 + 0.75 * 0.5
        assert!((p - 0.625).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn test_single_incorrect_by_hand() {
        let model = BayesianKnowledgeTracing::new();
        let p = model
            .compute_mastery_probability(&[false], 0, &reference_params())
            .unwrap();
        // posterior 0.025 / (0.025 + 0.675), then transition
        let posterior = 0.025 / 0.7;
        let expected = posterior + (1.0 - posterior) * 0.5;
        assert!((p - expected).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn test_pretest_entries_are_skipped() {
        let model = BayesianKnowledgeTracing::new();
        let params = reference_params();
        let with_pretest = model
            .compute_mastery_probability(&[false, false, true], 2, &params)
            .unwrap();
        let without = model
            .compute_mastery_probability(&[true], 0, &params)
            .unwrap();
        assert_eq!(with_pretest, without);
    }

    #[test]
    fn test_correct_answers_raise_mastery() {
        let model = BayesianKnowledgeTracing::new();
        let params = Parameters::new(0.2, 0.1, 0.1, 0.1, 0.95);
        let mut previous = params.pi;
        for n in 1..6 {
            let trajectory = vec![true; n];
            let p = model
                .compute_mastery_probability(&trajectory, 0, &params)
                .unwrap();
            assert!(p > previous, "streak {n}: {p} <= {previous}");
            previous = p;
        }
    }

    #[test]
    fn test_degenerate_parameters_error() {
        let model = BayesianKnowledgeTracing::new();
        // Certain slip and no guessing: a correct answer is impossible
        let params = Parameters::new(0.0, 1.0, 0.5, 0.1, 0.9);
        let err = model
            .compute_mastery_probability(&[true], 0, &params)
            .unwrap_err();
        assert!(matches!(err, ModelError::DegenerateUpdate { index: 0, .. }));

        // Certain guess from a zero prior: an incorrect answer is impossible
        let params = Parameters::new(1.0, 0.3, 0.0, 0.0, 0.9);
        let err = model
            .compute_mastery_probability(&[false], 0, &params)
            .unwrap_err();
        assert!(matches!(err, ModelError::DegenerateUpdate { .. }));
    }

    #[test]
    fn test_invalid_parameters_error() {
        let model = BayesianKnowledgeTracing::new();
        let params = Parameters::new(-0.1, 0.2, 0.1, 0.1, 0.9);
        assert_eq!(
            model.compute_mastery_probability(&[], 0, &params),
            Err(ModelError::InvalidParameter {
                name: "pg",
                value: -0.1
            })
        );
    }
}
