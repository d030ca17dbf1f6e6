use serde::{Deserialize, Serialize};

const PRETEST_PREFIX: &str = "Pre_assessment_";
const PRETEST_SLOTS: usize = 14;
const BASELINE_PROBLEMS: [&str; 3] = ["b3", "b4", "b3_2_0"];
const REQUIRED_PROBLEMS: [&str; 2] = ["labels_we", "skew_easy_0"];
const UNTRACKED_SKILL: &str = "None";

/// Fixed problem names that drive the non-adaptive phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Pretest problems are named `{pretest_prefix}{i}`
    pub pretest_prefix: String,
    /// Number of numbered pretest slots searched, starting at 0
    pub pretest_slots: usize,
    /// Served in order while the learner is below threshold on their skill
    pub baseline_problems: Vec<String>,
    /// Served in order exactly once, regardless of mastery
    pub required_problems: Vec<String>,
    /// Skill name that is never traced
    pub untracked_skill: String,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            pretest_prefix: PRETEST_PREFIX.to_string(),
            pretest_slots: PRETEST_SLOTS,
            baseline_problems: BASELINE_PROBLEMS.iter().map(|s| s.to_string()).collect(),
            required_problems: REQUIRED_PROBLEMS.iter().map(|s| s.to_string()).collect(),
            untracked_skill: UNTRACKED_SKILL.to_string(),
        }
    }
}

impl SelectionPolicy {
    pub fn pretest_name(&self, index: usize) -> String {
        format!("{}{}", self.pretest_prefix, index)
    }

    pub fn pretest_names(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.pretest_slots).map(|i| self.pretest_name(i))
    }

    pub fn is_tracked(&self, skill: &str) -> bool {
        skill != self.untracked_skill
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pretest_names() {
        let policy = SelectionPolicy::default();
        let names: Vec<String> = policy.pretest_names().collect();
        assert_eq!(names.len(), 14);
        assert_eq!(names[0], "Pre_assessment_0");
        assert_eq!(names[13], "Pre_assessment_13");
    }

    #[test]
    fn test_untracked_sentinel() {
        let policy = SelectionPolicy::default();
        assert!(!policy.is_tracked("None"));
        assert!(policy.is_tracked("center"));
    }
}
