use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use super::{NextProblem, ParameterAccessMode, SelectError, SelectionPolicy, SkillMastery};
use crate::data::{DataProvider, Interaction, Problem};
use crate::model::{BayesianKnowledgeTracing, KnowledgeModel, Parameters};

/// Random draws happen in these phases; each gets its own stream.
#[derive(Debug, Clone, Copy)]
enum DrawPhase {
    Posttest,
    Adaptive,
    Fallback,
}

impl DrawPhase {
    fn tag(&self) -> &'static [u8] {
        match self {
            DrawPhase::Posttest => b"posttest",
            DrawPhase::Adaptive => b"adaptive",
            DrawPhase::Fallback => b"fallback",
        }
    }
}

/// Skill-separated random selector.
///
/// For every tracked skill the knowledge model estimates mastery; problems of
/// skills still under their threshold form the candidate pool and one is drawn
/// uniformly. The fixed assessment phases of [`SelectionPolicy`] run before
/// the adaptive phase.
///
/// Draws are seeded from the course, the user and the length of their
/// interaction log, so asking twice without answering returns the same problem.
pub struct AdaptiveSelector<D: ?Sized, M = BayesianKnowledgeTracing> {
    data: Arc<D>,
    model: M,
    access_mode: ParameterAccessMode,
    policy: SelectionPolicy,
}

impl<D> AdaptiveSelector<D, BayesianKnowledgeTracing>
where
    D: DataProvider + ?Sized,
{
    pub fn with_bkt(data: Arc<D>, access_mode: &str) -> Result<Self, SelectError> {
        Self::new(data, BayesianKnowledgeTracing::new(), access_mode)
    }
}

impl<D, M> AdaptiveSelector<D, M>
where
    D: DataProvider + ?Sized,
    M: KnowledgeModel,
{
    /// `access_mode` lists the scopes refining the per-course parameters,
    /// e.g. `"user skill"`. An unknown scope fails here rather than on first use.
    pub fn new(data: Arc<D>, model: M, access_mode: &str) -> Result<Self, SelectError> {
        let access_mode = ParameterAccessMode::parse(access_mode)?;
        tracing::info!(access_mode = %access_mode, "adaptive selector configured");
        Ok(Self {
            data,
            model,
            access_mode,
            policy: SelectionPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn access_mode(&self) -> &ParameterAccessMode {
        &self.access_mode
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    pub fn data(&self) -> &Arc<D> {
        &self.data
    }

    pub fn choose_next_problem(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<NextProblem, SelectError> {
        if let Some(problem) = self.next_pretest(course_id, user_id)? {
            tracing::debug!(
                course = course_id,
                user = user_id,
                problem = %problem.problem_name,
                "serving pretest"
            );
            return Ok(NextProblem::Problem(problem));
        }

        let history = self.data.get_all_interactions(course_id, user_id)?;
        let attempted: HashSet<&str> = history
            .iter()
            .map(|i| i.problem.problem_name.as_str())
            .collect();
        let catalog = self.data.get_problems(course_id)?;

        if let Some(problem) = self.next_baseline(course_id, user_id, &catalog, &attempted)? {
            tracing::debug!(
                course = course_id,
                user = user_id,
                problem = %problem.problem_name,
                "serving baseline"
            );
            return Ok(NextProblem::Problem(problem));
        }

        if let Some(problem) = self.next_required(&catalog, &attempted) {
            tracing::debug!(
                course = course_id,
                user = user_id,
                problem = %problem.problem_name,
                "serving required item"
            );
            return Ok(NextProblem::Problem(problem));
        }

        if history.iter().any(|i| i.problem.posttest) {
            self.data.set_permission(course_id, user_id)?;
            let posttest = self
                .data
                .get_all_remaining_posttest_problems(course_id, user_id)?;
            return Ok(
                match self.draw(posttest, course_id, user_id, &history, DrawPhase::Posttest) {
                    Some(problem) => NextProblem::Problem(problem),
                    None => {
                        tracing::info!(course = course_id, user = user_id, "posttest completed");
                        NextProblem::Finished
                    }
                },
            );
        }

        let candidates = self.adaptive_candidates(course_id, user_id)?;
        if let Some(problem) =
            self.draw(candidates, course_id, user_id, &history, DrawPhase::Adaptive)
        {
            return Ok(NextProblem::Problem(problem));
        }

        let posttest = self
            .data
            .get_all_remaining_posttest_problems(course_id, user_id)?;
        match self.draw(posttest, course_id, user_id, &history, DrawPhase::Fallback) {
            Some(problem) => {
                tracing::debug!(
                    course = course_id,
                    user = user_id,
                    problem = %problem.problem_name,
                    "all skills mastered, starting posttest"
                );
                Ok(NextProblem::Problem(problem))
            }
            None => {
                tracing::warn!(course = course_id, user = user_id, "no problems left to serve");
                Ok(NextProblem::Exhausted)
            }
        }
    }

    pub fn choose_first_problem(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Option<Problem>, SelectError> {
        let first = self.policy.pretest_name(0);
        let pretest = self
            .data
            .get_all_remaining_pretest_problems(course_id, user_id)?;
        Ok(pretest.into_iter().find(|p| p.problem_name == first))
    }

    pub fn get_parameter(
        &self,
        course_id: &str,
        user_id: Option<&str>,
        skill_name: Option<&str>,
    ) -> Result<Parameters, SelectError> {
        let key = self.access_mode.key(Some(course_id), user_id, skill_name)?;
        Ok(self.data.get(&key)?)
    }

    pub fn set_parameter(
        &self,
        parameters: Parameters,
        course_id: Option<&str>,
        user_id: Option<&str>,
        skill_name: Option<&str>,
    ) -> Result<(), SelectError> {
        parameters.validate()?;
        let key = self.access_mode.key(course_id, user_id, skill_name)?;
        self.data.set(&key, parameters)?;
        tracing::debug!(key = %key, "parameters stored");
        Ok(())
    }

    /// Store the same parameters for each listed skill of one learner, as done
    /// at enrollment time.
    pub fn set_parameters_bulk<S: AsRef<str>>(
        &self,
        parameters: Parameters,
        course_id: &str,
        user_id: Option<&str>,
        skills: &[S],
    ) -> Result<(), SelectError> {
        for skill in skills {
            self.set_parameter(parameters, Some(course_id), user_id, Some(skill.as_ref()))?;
        }
        tracing::info!(
            course = course_id,
            user = user_id.unwrap_or_default(),
            skills = skills.len(),
            "bulk parameters stored"
        );
        Ok(())
    }

    /// Mastery estimate of every tracked skill in the course.
    pub fn skill_report(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Vec<SkillMastery>, SelectError> {
        self.data
            .get_skills(course_id)?
            .into_iter()
            .filter(|skill| self.policy.is_tracked(skill))
            .map(|skill| self.skill_mastery(course_id, user_id, &skill))
            .collect()
    }

    fn skill_mastery(
        &self,
        course_id: &str,
        user_id: &str,
        skill: &str,
    ) -> Result<SkillMastery, SelectError> {
        let key = self
            .access_mode
            .key(Some(course_id), Some(user_id), Some(skill))?;
        let parameters = self.data.get(&key)?;
        let trajectory = self.data.get_skill_trajectory(course_id, skill, user_id)?;
        let probability = self.model.compute_mastery_probability(
            &trajectory.outcomes,
            trajectory.num_pretest,
            &parameters,
        )?;

        tracing::debug!(
            skill,
            probability,
            threshold = parameters.threshold,
            observations = trajectory.len(),
            "skill mastery"
        );
        Ok(SkillMastery::new(skill, probability, parameters.threshold))
    }

    fn next_pretest(&self, course_id: &str, user_id: &str) -> Result<Option<Problem>, SelectError> {
        let remaining = self
            .data
            .get_all_remaining_pretest_problems(course_id, user_id)?;
        if remaining.is_empty() {
            return Ok(None);
        }

        for name in self.policy.pretest_names() {
            if let Some(problem) = remaining.iter().find(|p| p.problem_name == name) {
                return Ok(Some(problem.clone()));
            }
        }

        tracing::warn!(
            course = course_id,
            user = user_id,
            remaining = remaining.len(),
            "no conventionally named pretest problem among remaining pretest items"
        );
        Ok(None)
    }

    fn next_baseline(
        &self,
        course_id: &str,
        user_id: &str,
        catalog: &[Problem],
        attempted: &HashSet<&str>,
    ) -> Result<Option<Problem>, SelectError> {
        for name in &self.policy.baseline_problems {
            let pending = catalog.iter().filter(|p| {
                &p.problem_name == name && !attempted.contains(p.problem_name.as_str())
            });
            for problem in pending {
                let Some(skill) = problem.primary_skill() else {
                    tracing::warn!(
                        problem = %problem.problem_name,
                        "baseline problem has no skill, skipping"
                    );
                    continue;
                };
                let mastery = self.skill_mastery(course_id, user_id, skill)?;
                if !mastery.mastered {
                    return Ok(Some(problem.clone()));
                }
            }
        }
        Ok(None)
    }

    fn next_required(&self, catalog: &[Problem], attempted: &HashSet<&str>) -> Option<Problem> {
        self.policy
            .required_problems
            .iter()
            .filter(|name| !attempted.contains(name.as_str()))
            .find_map(|name| catalog.iter().find(|p| &p.problem_name == name))
            .cloned()
    }

    fn adaptive_candidates(
        &self,
        course_id: &str,
        user_id: &str,
    ) -> Result<Vec<Problem>, SelectError> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for skill in self.data.get_skills(course_id)? {
            if !self.policy.is_tracked(&skill) {
                continue;
            }
            let mastery = self.skill_mastery(course_id, user_id, &skill)?;
            if mastery.mastered {
                continue;
            }

            let remaining = self.data.get_remaining_problems(course_id, &skill, user_id)?;
            tracing::info!(
                skill = %skill,
                probability = mastery.probability,
                candidates = remaining.len(),
                "skill under threshold"
            );
            for problem in remaining {
                if seen.insert(problem.problem_name.clone()) {
                    candidates.push(problem);
                }
            }
        }

        Ok(candidates)
    }

    fn draw(
        &self,
        pool: Vec<Problem>,
        course_id: &str,
        user_id: &str,
        history: &[Interaction],
        phase: DrawPhase,
    ) -> Option<Problem> {
        let mut rng = selection_rng(course_id, user_id, history.len(), phase);
        pool.choose(&mut rng).cloned()
    }
}

fn selection_rng(
    course_id: &str,
    user_id: &str,
    history_len: usize,
    phase: DrawPhase,
) -> ChaCha8Rng {
    let mut hasher = Sha256::new();
    hasher.update(course_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(user_id.as_bytes());
    hasher.update([0u8]);
    hasher.update((history_len as u64).to_le_bytes());
    hasher.update(phase.tag());
    let digest = hasher.finalize();

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    ChaCha8Rng::from_seed(seed)
}
