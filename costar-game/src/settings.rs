use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// Per-game options. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Open chain A with the configured anchor actor.
    #[serde(default = "default_true")]
    pub start_with_anchor: bool,
    /// Permit the configured excluded actor as a starting actor or cast option.
    #[serde(default = "default_true")]
    pub allow_excluded_actor: bool,
}

impl Settings {
    #[must_use]
    pub const fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            start_with_anchor: true,
            allow_excluded_actor: true,
        }
    }

    #[must_use]
    pub const fn with_anchor(mut self, start_with_anchor: bool) -> Self {
        self.start_with_anchor = start_with_anchor;
        self
    }

    #[must_use]
    pub const fn with_excluded_actor(mut self, allow: bool) -> Self {
        self.allow_excluded_actor = allow;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_start_medium_with_anchor() {
        let settings = Settings::default();
        assert_eq!(settings.difficulty, Difficulty::Medium);
        assert!(settings.start_with_anchor);
        assert!(settings.allow_excluded_actor);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"difficulty":"hard"}"#).unwrap();
        assert_eq!(settings, Settings::new(Difficulty::Hard));
    }
}
