use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Candidate profile the fit scorer works against.
///
/// Free-text fields; `skills` is a comma-separated list maintained by the
/// profile tooling.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub summary: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub projects: Option<String>,
    pub skills: Option<String>,
}

impl UserProfile {
    /// Skill list, lowercased and trimmed, for keyword matching.
    pub fn skill_list(&self) -> Vec<String> {
        self.skills
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_list_splits_and_lowercases() {
        let profile = UserProfile {
            id: Uuid::new_v4(),
            full_name: None,
            summary: None,
            experience: None,
            education: None,
            projects: None,
            skills: Some("Python, Rust , SQL,,".to_string()),
        };
        assert_eq!(profile.skill_list(), vec!["python", "rust", "sql"]);
    }
}
