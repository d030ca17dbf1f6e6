use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SelectError;

/// Identifier kinds that may scope a parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessScope {
    Course,
    User,
    Skill,
}

impl AccessScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessScope::Course => "course",
            AccessScope::User => "user",
            AccessScope::Skill => "skill",
        }
    }
}

impl fmt::Display for AccessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessScope {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "course" => Ok(AccessScope::Course),
            "user" => Ok(AccessScope::User),
            "skill" => Ok(AccessScope::Skill),
            other => Err(SelectError::InvalidAccessMode(other.to_string())),
        }
    }
}

/// Granularity of model parameters.
///
/// Always scoped per course first, optionally refined per user and/or skill.
/// The order of scopes is the order identifiers are concatenated into the
/// storage key, e.g. `"user skill"` yields `course_id + user_id + skill_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterAccessMode {
    scopes: Vec<AccessScope>,
}

impl Default for ParameterAccessMode {
    fn default() -> Self {
        Self {
            scopes: vec![AccessScope::Course],
        }
    }
}

impl ParameterAccessMode {
    /// Parse a whitespace separated list of extra scopes, e.g. `"user skill"`.
    /// An empty string keeps one parameter set per course.
    pub fn parse(scopes: &str) -> Result<Self, SelectError> {
        let mut mode = Self::default();
        for token in scopes.split_whitespace() {
            mode.scopes.push(token.parse()?);
        }
        Ok(mode)
    }

    pub fn scopes(&self) -> &[AccessScope] {
        &self.scopes
    }

    /// Build the storage key, failing when an identifier the mode needs is
    /// absent or empty.
    pub fn key(
        &self,
        course_id: Option<&str>,
        user_id: Option<&str>,
        skill_name: Option<&str>,
    ) -> Result<String, SelectError> {
        let mut key = String::new();
        for scope in &self.scopes {
            let id = match scope {
                AccessScope::Course => course_id,
                AccessScope::User => user_id,
                AccessScope::Skill => skill_name,
            };
            match id {
                Some(id) if !id.is_empty() => key.push_str(id),
                _ => return Err(SelectError::ModeMismatch(*scope)),
            }
        }
        Ok(key.trim().to_string())
    }
}

impl fmt::Display for ParameterAccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.scopes.iter().map(AccessScope::as_str).collect();
        f.write_str(&names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mode_is_per_course() {
        let mode = ParameterAccessMode::parse("").unwrap();
        assert_eq!(mode.scopes(), &[AccessScope::Course]);
        assert_eq!(mode.key(Some("c1"), None, None).unwrap(), "c1");
    }

    #[test]
    fn test_key_concatenates_in_mode_order() {
        let mode = ParameterAccessMode::parse("user skill").unwrap();
        assert_eq!(mode.to_string(), "course user skill");
        assert_eq!(
            mode.key(Some("c1"), Some("u1"), Some("center")).unwrap(),
            "c1u1center"
        );

        let mode = ParameterAccessMode::parse("  skill\tuser ").unwrap();
        assert_eq!(
            mode.key(Some("c1"), Some("u1"), Some("center")).unwrap(),
            "c1centeru1"
        );
    }

    #[test]
    fn test_invalid_scope_is_rejected() {
        assert_eq!(
            ParameterAccessMode::parse("user lesson"),
            Err(SelectError::InvalidAccessMode("lesson".to_string()))
        );
    }

    #[test]
    fn test_missing_identifier_is_mismatch() {
        let mode = ParameterAccessMode::parse("skill").unwrap();
        assert_eq!(
            mode.key(Some("c1"), Some("u1"), None),
            Err(SelectError::ModeMismatch(AccessScope::Skill))
        );
        assert_eq!(
            mode.key(Some(""), None, Some("center")),
            Err(SelectError::ModeMismatch(AccessScope::Course))
        );
        // Identifiers the mode does not use are ignored
        assert_eq!(mode.key(Some("c1"), Some("u1"), Some("s")).unwrap(), "c1s");
    }
}
