//! Analysis engine: segment, embed, match, and aggregate one candidate
//! against one job

use crate::config::{Config, ScoringPolicy};
use crate::error::{Result, ScreenerError};
use crate::job::JobSpec;
use crate::processing::document::Segmenter;
use crate::processing::embeddings::{EmbeddingGateway, EmbeddingProvider};
use crate::processing::matcher::{self, RequirementMatch};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Requirements the candidate misses or only weakly covers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Gaps {
    pub must_have_missing: Vec<String>,
    pub improve: Vec<String>,
}

/// Per-requirement breakdown plus the weighted composite. Owned by the run
/// that produced it; immutable once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub breakdown: Vec<RequirementMatch>,
    pub composite_score10: f32,
    pub gaps: Gaps,
}

pub struct AnalysisEngine {
    segmenter: Segmenter,
    gateway: EmbeddingGateway,
    policy: ScoringPolicy,
}

impl AnalysisEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &Config) -> Self {
        Self {
            segmenter: Segmenter::new(
                config.processing.chunk_target,
                config.processing.chunk_slack,
            ),
            gateway: EmbeddingGateway::new(provider, config.embedding.clone()),
            policy: config.scoring.clone(),
        }
    }

    /// Full analysis for one candidate: chunk the resume, embed chunks and
    /// requirements, find the best chunk per requirement, aggregate.
    ///
    /// Fails fast with `NoJobRequirements` before any embedding call, and
    /// with `NoCvText` when no chunk survives embedding. A provider failure
    /// surfaces as `EmbeddingsFailed` for the whole candidate.
    pub async fn analyze(
        &self,
        job: &JobSpec,
        candidate_id: &str,
        resume_text: &str,
    ) -> Result<AnalysisResult> {
        if job.requirements.is_empty() {
            return Err(ScreenerError::NoJobRequirements(job.title.clone()));
        }

        let mut chunks = self.segmenter.segment(resume_text);
        debug!("candidate '{}': {} chunks", candidate_id, chunks.len());

        let embedded = if chunks.is_empty() {
            0
        } else {
            self.gateway.embed_chunks(&mut chunks).await?
        };
        if embedded == 0 {
            return Err(ScreenerError::NoCvText(candidate_id.to_string()));
        }

        let requirement_texts: Vec<String> = job
            .requirements
            .iter()
            .map(|r| r.text.clone())
            .collect();
        let requirement_vectors = self.gateway.embed_validated(&requirement_texts).await?;

        let breakdown: Vec<RequirementMatch> = job
            .requirements
            .iter()
            .zip(&requirement_vectors)
            .map(|(requirement, vector)| {
                matcher::match_requirement(requirement, vector.as_deref(), &chunks, &self.policy)
            })
            .collect();

        let result = aggregate(breakdown, &self.policy);
        info!(
            "candidate '{}' vs '{}': composite {:.1}/10, {} must-have gaps",
            candidate_id,
            job.title,
            result.composite_score10,
            result.gaps.must_have_missing.len()
        );
        Ok(result)
    }
}

/// Weighted composite over the breakdown plus the gap lists. Pure; scoring
/// behavior comes entirely from the policy.
pub fn aggregate(breakdown: Vec<RequirementMatch>, policy: &ScoringPolicy) -> AnalysisResult {
    let mut weighted_sum = 0.0f32;
    let mut total_weight = 0.0f32;
    for entry in &breakdown {
        let weight = entry.requirement.effective_weight() as f32;
        weighted_sum += entry.score10 as f32 * weight;
        total_weight += weight;
    }
    let composite_score10 = if total_weight > 0.0 {
        round1(weighted_sum / total_weight)
    } else {
        0.0
    };

    let mut gaps = Gaps::default();
    for entry in &breakdown {
        if entry.requirement.must_have && entry.similarity < policy.must_missing_similarity {
            gaps.must_have_missing.push(entry.requirement.text.clone());
        }
        if entry.similarity >= policy.improve_similarity_floor
            && entry.score10 < policy.improve_score_ceiling
        {
            gaps.improve.push(entry.requirement.text.clone());
        }
    }

    AnalysisResult {
        breakdown,
        composite_score10,
        gaps,
    }
}

pub(crate) fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;
    use crate::job::Requirement;
    use async_trait::async_trait;

    fn entry(text: &str, must_have: bool, weight: u8, similarity: f32) -> RequirementMatch {
        let policy = ScoringPolicy::default();
        RequirementMatch {
            requirement: Requirement::new(text, must_have, weight),
            best_chunk: None,
            similarity,
            score10: matcher::score_similarity(similarity, must_have, &policy),
        }
    }

    #[test]
    fn test_weighted_composite() {
        let policy = ScoringPolicy::default();
        // two must-haves (weight 2, scores 8 and 10), one nice-to-have
        // (weight 1, score 4): (8*2 + 10*2 + 4*1) / 5 = 8.0
        let breakdown = vec![
            entry("Node.js", true, 2, 0.8),
            entry("SQL", true, 2, 1.0),
            entry("Docker", false, 1, 0.4),
        ];
        let result = aggregate(breakdown, &policy);
        assert_eq!(result.composite_score10, 8.0);
    }

    #[test]
    fn test_empty_breakdown_scores_zero() {
        let result = aggregate(Vec::new(), &ScoringPolicy::default());
        assert_eq!(result.composite_score10, 0.0);
        assert!(result.gaps.must_have_missing.is_empty());
    }

    #[test]
    fn test_composite_stays_in_bounds() {
        let policy = ScoringPolicy::default();
        let breakdown = vec![
            entry("a", true, 3, 1.0),
            entry("b", false, 3, 1.0),
            entry("c", false, 1, -0.5),
        ];
        let result = aggregate(breakdown, &policy);
        assert!(result.composite_score10 >= 0.0 && result.composite_score10 <= 10.0);
    }

    #[test]
    fn test_gap_lists() {
        let policy = ScoringPolicy::default();
        let breakdown = vec![
            // must-have below 0.35: missing (and penalized to 0, so also weak)
            entry("Kubernetes", true, 3, 0.2),
            // similarity in [0.2, ..) with score below 7: improve
            entry("GraphQL", false, 1, 0.55),
            // strong match: neither list
            entry("Rust", true, 3, 0.9),
        ];
        let result = aggregate(breakdown, &policy);
        assert_eq!(result.gaps.must_have_missing, vec!["Kubernetes".to_string()]);
        assert!(result.gaps.improve.contains(&"Kubernetes".to_string()));
        assert!(result.gaps.improve.contains(&"GraphQL".to_string()));
        assert!(!result.gaps.improve.contains(&"Rust".to_string()));
    }

    #[test]
    fn test_similarity_below_improve_floor_is_not_listed() {
        let policy = ScoringPolicy::default();
        let breakdown = vec![entry("Terraform", false, 1, 0.1)];
        let result = aggregate(breakdown, &policy);
        assert!(result.gaps.improve.is_empty());
    }

    // deterministic vocabulary-overlap provider for pipeline tests
    struct VocabProvider;

    const VOCAB: &[&str] = &["node", "sql", "docker", "rust", "python"];

    fn vocab_vector(text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        VOCAB
            .iter()
            .map(|word| if lowered.contains(word) { 1.0 } else { 0.0 })
            .collect()
    }

    #[async_trait]
    impl EmbeddingProvider for VocabProvider {
        async fn embed(&self, texts: &[String], _model: &str) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vocab_vector(t)).collect())
        }
    }

    fn engine() -> AnalysisEngine {
        let config = Config {
            embedding: EmbeddingConfig {
                expected_dimensions: Some(VOCAB.len()),
                ..EmbeddingConfig::default()
            },
            ..Config::default()
        };
        AnalysisEngine::new(Arc::new(VocabProvider), &config)
    }

    #[tokio::test]
    async fn test_analyze_end_to_end() {
        let job = JobSpec {
            title: "Backend Engineer".to_string(),
            requirements: vec![
                Requirement::new("Node runtime", true, 3),
                Requirement::new("SQL databases", true, 2),
                Requirement::new("Python scripting", false, 1),
            ],
            experience_band: None,
        };
        let resume = "Experience\nBuilt APIs with Node and SQL.\nSkills\nDocker, SQL.";

        let result = engine().analyze(&job, "cand-1", resume).await.unwrap();
        assert_eq!(result.breakdown.len(), 3);
        // node+sql requirements find their chunks, python finds nothing
        assert!(result.breakdown[0].similarity > 0.5);
        assert!(result.breakdown[1].similarity > 0.5);
        assert_eq!(result.breakdown[2].similarity, 0.0);
        // a zero-similarity nice-to-have is absent, not "improvable"
        assert!(!result.gaps.improve.contains(&"Python scripting".to_string()));
        assert!(result.gaps.must_have_missing.is_empty());
        assert!(result.composite_score10 > 0.0);
    }

    #[tokio::test]
    async fn test_no_requirements_fails_fast() {
        let job = JobSpec {
            title: "Empty".to_string(),
            requirements: Vec::new(),
            experience_band: None,
        };
        let err = engine().analyze(&job, "cand-1", "some text").await.unwrap_err();
        assert!(matches!(err, ScreenerError::NoJobRequirements(_)));
    }

    #[tokio::test]
    async fn test_empty_resume_is_no_cv_text() {
        let job = JobSpec {
            title: "Backend Engineer".to_string(),
            requirements: vec![Requirement::new("Node runtime", true, 3)],
            experience_band: None,
        };
        let err = engine().analyze(&job, "cand-1", "   ").await.unwrap_err();
        assert!(matches!(err, ScreenerError::NoCvText(_)));
    }

    #[tokio::test]
    async fn test_all_invalid_embeddings_is_no_cv_text() {
        // resume text with no vocabulary hits embeds to all-zero vectors,
        // which validation drops; every chunk dropped becomes NoCvText
        let job = JobSpec {
            title: "Backend Engineer".to_string(),
            requirements: vec![Requirement::new("Node runtime", true, 3)],
            experience_band: None,
        };
        let err = engine()
            .analyze(&job, "cand-1", "General management career history")
            .await
            .unwrap_err();
        assert!(matches!(err, ScreenerError::NoCvText(_)));
    }
}
