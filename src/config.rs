//! Configuration management for the CV screener

use crate::error::{Result, ScreenerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub processing: ProcessingConfig,
    pub scoring: ScoringPolicy,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible embeddings endpoint.
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key. Empty means no auth header.
    pub api_key_env: String,
    /// Vectors with any other length are dropped. None skips the check.
    pub expected_dimensions: Option<usize>,
    /// Texts per provider call.
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            expected_dimensions: Some(1536),
            batch_size: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Target chunk size in characters.
    pub chunk_target: usize,
    /// Sections up to `chunk_target + chunk_slack` stay a single chunk.
    pub chunk_slack: usize,
    /// Cache extracted text per file path.
    pub enable_cache: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            chunk_target: 1000,
            chunk_slack: 200,
            enable_cache: true,
        }
    }
}

/// Every hand-tuned scoring constant, named and overridable. Scoring code
/// takes this struct and contains no inline thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Must-have matches below this similarity take the penalty.
    pub penalty_similarity_floor: f32,
    /// Points removed from a penalized must-have score.
    pub must_have_penalty: u8,
    /// Must-have requirements below this similarity count as missing.
    pub must_missing_similarity: f32,
    /// Weak-but-present band: similarity at or above this floor...
    pub improve_similarity_floor: f32,
    /// ...with a score below this ceiling lands on the improve list.
    pub improve_score_ceiling: u8,
    /// Minimum must-have coverage percentage to pass the gate.
    pub gate_percent: f32,
    /// Final-score blend weights.
    pub must_weight: f32,
    pub nice_weight: f32,
    pub experience_weight: f32,
    pub quality_weight: f32,
    /// Final score at or above this is recommended.
    pub recommend_floor: f32,
    /// Final score below this is excluded.
    pub exclude_floor: f32,
    pub experience: ExperiencePolicy,
    pub quality: QualityWeights,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            penalty_similarity_floor: 0.3,
            must_have_penalty: 4,
            must_missing_similarity: 0.35,
            improve_similarity_floor: 0.2,
            improve_score_ceiling: 7,
            gate_percent: 60.0,
            must_weight: 0.5,
            nice_weight: 0.2,
            experience_weight: 0.2,
            quality_weight: 0.1,
            recommend_floor: 85.0,
            exclude_floor: 65.0,
            experience: ExperiencePolicy::default(),
            quality: QualityWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperiencePolicy {
    /// Points per year when the job has no experience band.
    pub unbanded_year_points: f32,
    /// Cap for the unbanded scale.
    pub unbanded_cap: f32,
    /// Score when the candidate's years are unknown.
    pub unknown_score: f32,
    /// Below the band: 100 - gap * slope, floored.
    pub below_band_slope: f32,
    pub below_band_floor: f32,
    /// Above the band: start - overshoot * slope, floored.
    pub above_band_start: f32,
    pub above_band_slope: f32,
    pub above_band_floor: f32,
}

impl Default for ExperiencePolicy {
    fn default() -> Self {
        Self {
            unbanded_year_points: 15.0,
            unbanded_cap: 90.0,
            unknown_score: 60.0,
            below_band_slope: 18.0,
            below_band_floor: 25.0,
            above_band_start: 95.0,
            above_band_slope: 10.0,
            above_band_floor: 55.0,
        }
    }
}

/// Additive quality points, capped at 100 when applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub long_text_chars: usize,
    pub long_text_points: f32,
    pub mid_text_chars: usize,
    pub mid_text_points: f32,
    pub short_text_chars: usize,
    pub short_text_points: f32,
    pub headings_points: f32,
    pub bullets_points: f32,
    pub contact_both_points: f32,
    pub contact_one_points: f32,
    pub multilingual_points: f32,
    pub links_points: f32,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            long_text_chars: 2000,
            long_text_points: 40.0,
            mid_text_chars: 900,
            mid_text_points: 28.0,
            short_text_chars: 300,
            short_text_points: 18.0,
            headings_points: 24.0,
            bullets_points: 16.0,
            contact_both_points: 10.0,
            contact_one_points: 6.0,
            multilingual_points: 10.0,
            links_points: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ScreenerError::Configuration(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ScreenerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("cv-screener")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_policy() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.penalty_similarity_floor, 0.3);
        assert_eq!(policy.must_have_penalty, 4);
        assert_eq!(policy.gate_percent, 60.0);
        assert_eq!(policy.must_weight, 0.5);
        assert_eq!(policy.quality.long_text_points, 40.0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let raw = r#"
            [scoring]
            gate_percent = 70.0

            [embedding]
            model = "custom-embedder"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.scoring.gate_percent, 70.0);
        assert_eq!(config.scoring.must_have_penalty, 4);
        assert_eq!(config.embedding.model, "custom-embedder");
        assert_eq!(config.embedding.batch_size, 64);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let raw = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.processing.chunk_target, config.processing.chunk_target);
        assert_eq!(parsed.scoring.exclude_floor, config.scoring.exclude_floor);
    }
}
