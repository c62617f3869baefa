//! Engine tuning: anchor ids, pool sizing, difficulty bands and eligibility.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::ItemId;

const DEFAULT_ENGINE_DATA: &str = include_str!("../data/engine.json");

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineConfigError {
    #[error("{field} must be in (0, 1] (got {value:.2})")]
    FractionRange { field: &'static str, value: f32 },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("invalid engine config JSON: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Actor that opens every game when "start with anchor" is enabled.
    #[serde(default = "EngineConfig::default_anchor_actor_id")]
    pub anchor_actor_id: ItemId,
    /// Actor that players may opt out of.
    #[serde(default = "EngineConfig::default_excluded_actor_id")]
    pub excluded_actor_id: ItemId,
    /// Upper bound on rejection-sampling draws per starting slot.
    #[serde(default = "EngineConfig::default_max_sample_attempts")]
    pub max_sample_attempts: u32,
    #[serde(default = "EngineConfig::default_image_width")]
    pub image_width: u32,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub bands: BandConfig,
    #[serde(default)]
    pub eligibility: EligibilityConfig,
}

impl EngineConfig {
    const fn default_anchor_actor_id() -> ItemId {
        4724
    }

    const fn default_excluded_actor_id() -> ItemId {
        2231
    }

    const fn default_max_sample_attempts() -> u32 {
        1000
    }

    const fn default_image_width() -> u32 {
        154
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_ENGINE_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn default_config() -> Self {
        Self::load_from_static()
    }

    /// Parse a configuration document, filling absent fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails validation.
    pub fn from_json(json: &str) -> Result<Self, EngineConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| EngineConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        validate_min("max_sample_attempts", self.max_sample_attempts, 1)?;
        validate_min("image_width", self.image_width, 1)?;
        self.pool.validate()?;
        self.bands.validate()?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            anchor_actor_id: Self::default_anchor_actor_id(),
            excluded_actor_id: Self::default_excluded_actor_id(),
            max_sample_attempts: Self::default_max_sample_attempts(),
            image_width: Self::default_image_width(),
            pool: PoolConfig::default(),
            bands: BandConfig::default(),
            eligibility: EligibilityConfig::default(),
        }
    }
}

/// Popular-actor pool population rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Paging continues until the pool holds more than this many ids.
    #[serde(default = "PoolConfig::default_min_count")]
    pub min_count: u32,
    #[serde(default = "PoolConfig::default_department")]
    pub department: String,
    /// At least one known-for title must be in this original language.
    #[serde(default = "PoolConfig::default_language")]
    pub language: String,
    /// Hard stop on paging for providers that never run dry.
    #[serde(default = "PoolConfig::default_max_pages")]
    pub max_pages: u32,
}

impl PoolConfig {
    const fn default_min_count() -> u32 {
        500
    }

    fn default_department() -> String {
        String::from("Acting")
    }

    fn default_language() -> String {
        String::from("en")
    }

    const fn default_max_pages() -> u32 {
        60
    }

    fn validate(&self) -> Result<(), EngineConfigError> {
        validate_min("pool.min_count", self.min_count, 1)?;
        validate_min("pool.max_pages", self.max_pages, 1)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_count: Self::default_min_count(),
            department: Self::default_department(),
            language: Self::default_language(),
            max_pages: Self::default_max_pages(),
        }
    }
}

/// Popularity-rank fractions delimiting the difficulty bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    /// Top band covers ranks `[0, top_end * N)`.
    #[serde(default = "BandConfig::default_top_end")]
    pub top_end: f32,
    /// Bottom band covers ranks `[bottom_start * N, N)`.
    #[serde(default = "BandConfig::default_bottom_start")]
    pub bottom_start: f32,
}

impl BandConfig {
    const fn default_top_end() -> f32 {
        0.5
    }

    const fn default_bottom_start() -> f32 {
        0.75
    }

    fn validate(&self) -> Result<(), EngineConfigError> {
        validate_fraction("bands.top_end", self.top_end)?;
        validate_fraction("bands.bottom_start", self.bottom_start)
    }
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            top_end: Self::default_top_end(),
            bottom_start: Self::default_bottom_start(),
        }
    }
}

/// Filmography credits that never become movie options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    /// Documentary (99) and TV movie (10770) by default.
    #[serde(default = "EligibilityConfig::default_excluded_genre_ids")]
    pub excluded_genre_ids: Vec<u32>,
}

impl EligibilityConfig {
    fn default_excluded_genre_ids() -> Vec<u32> {
        vec![99, 10770]
    }
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            excluded_genre_ids: Self::default_excluded_genre_ids(),
        }
    }
}

fn validate_min(field: &'static str, value: u32, min: u32) -> Result<(), EngineConfigError> {
    if value < min {
        return Err(EngineConfigError::MinViolation { field, min, value });
    }
    Ok(())
}

fn validate_fraction(field: &'static str, value: f32) -> Result<(), EngineConfigError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(EngineConfigError::FractionRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_config_matches_defaults() {
        let config = EngineConfig::default_config();
        assert_eq!(config, EngineConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let config = EngineConfig::from_json(r#"{"pool": {"min_count": 40}}"#).unwrap();
        assert_eq!(config.pool.min_count, 40);
        assert_eq!(config.pool.department, "Acting");
        assert_eq!(config.anchor_actor_id, 4724);
        assert!((config.bands.bottom_start - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = EngineConfig::from_json(r#"{"bands": {"top_end": 1.5}}"#).unwrap_err();
        assert_eq!(
            err,
            EngineConfigError::FractionRange {
                field: "bands.top_end",
                value: 1.5
            }
        );

        let err = EngineConfig::from_json(r#"{"max_sample_attempts": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            EngineConfigError::MinViolation {
                field: "max_sample_attempts",
                ..
            }
        ));

        assert!(matches!(
            EngineConfig::from_json("{not json").unwrap_err(),
            EngineConfigError::Parse(_)
        ));
    }
}
