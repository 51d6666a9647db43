//! Job specification records: requirements, weights, and the experience band

use crate::error::{Result, ScreenerError};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_REQUIREMENT_WEIGHT: u8 = 3;

/// One weighted job requirement. Immutable once an analysis run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub text: String,
    #[serde(default)]
    pub must_have: bool,
    #[serde(default = "default_weight")]
    pub weight: u8,
}

fn default_weight() -> u8 {
    1
}

impl Requirement {
    pub fn new(text: impl Into<String>, must_have: bool, weight: u8) -> Self {
        Self {
            text: text.into(),
            must_have,
            weight,
        }
    }

    /// Weight capped to 1..=MAX_REQUIREMENT_WEIGHT.
    pub fn effective_weight(&self) -> u8 {
        self.weight.clamp(1, MAX_REQUIREMENT_WEIGHT)
    }
}

/// Accepted years-of-experience range. `max: None` means open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperienceBand {
    pub min: u32,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub title: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub experience_band: Option<ExperienceBand>,
}

impl JobSpec {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let spec: JobSpec = toml::from_str(raw)
            .map_err(|e| ScreenerError::InvalidInput(format!("Failed to parse job spec: {}", e)))?;
        spec.validate()?;
        Ok(spec)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ScreenerError::InvalidInput(
                "job spec needs a title".to_string(),
            ));
        }
        for requirement in &self.requirements {
            if requirement.text.trim().is_empty() {
                return Err(ScreenerError::InvalidInput(
                    "requirement text must not be empty".to_string(),
                ));
            }
            if requirement.weight < 1 || requirement.weight > MAX_REQUIREMENT_WEIGHT {
                warn!(
                    "requirement '{}' has weight {}, clamping to 1..={}",
                    requirement.text, requirement.weight, MAX_REQUIREMENT_WEIGHT
                );
            }
        }
        if let Some(band) = &self.experience_band {
            if let Some(max) = band.max {
                if max < band.min {
                    return Err(ScreenerError::InvalidInput(format!(
                        "experience band max ({}) is below min ({})",
                        max, band.min
                    )));
                }
            }
        }
        Ok(())
    }
}
