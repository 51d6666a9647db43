//! Composite candidate scoring and batch duplicate resolution

use crate::config::ScoringPolicy;
use crate::job::{ExperienceBand, JobSpec};
use crate::processing::analyzer::{round1, AnalysisResult};
use crate::processing::meta::CandidateMeta;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceStatus {
    Within,
    Below,
    Above,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Recommended,
    Consider,
    Excluded,
}

/// Final ranked outcome for one candidate. Recomputed whenever any input
/// changes; no incremental caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScores {
    pub must_percent: f32,
    pub nice_percent: f32,
    pub experience_score: f32,
    pub experience_status: ExperienceStatus,
    pub quality_score: f32,
    pub final_score: f32,
    pub gate_passed: bool,
    pub status: CandidateStatus,
    pub missing_must: Vec<String>,
    pub duplicate_of: Option<String>,
}

pub struct CompositeScorer {
    policy: ScoringPolicy,
}

impl CompositeScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    /// Pure scoring of one candidate. Duplicate status is an input: the
    /// batch pass resolves it separately so candidates can be scored in
    /// any order.
    pub fn score(
        &self,
        analysis: &AnalysisResult,
        meta: &CandidateMeta,
        band: Option<&ExperienceBand>,
        duplicate_of: Option<String>,
    ) -> CandidateScores {
        let policy = &self.policy;

        let must_percent = priority_percent(analysis, true);
        let nice_percent = priority_percent(analysis, false);

        let must_count = analysis
            .breakdown
            .iter()
            .filter(|m| m.requirement.must_have)
            .count();
        let gate_passed = must_count == 0 || must_percent >= policy.gate_percent;

        let (experience_score, experience_status) = self.experience(meta.years_experience, band);
        let quality_score = self.quality(meta);

        let final_score = (round1(
            policy.must_weight * must_percent
                + policy.nice_weight * nice_percent
                + policy.experience_weight * experience_score
                + policy.quality_weight * quality_score,
        ))
        .clamp(0.0, 100.0);

        let status = if !gate_passed || duplicate_of.is_some() || final_score < policy.exclude_floor
        {
            CandidateStatus::Excluded
        } else if final_score >= policy.recommend_floor {
            CandidateStatus::Recommended
        } else {
            CandidateStatus::Consider
        };

        CandidateScores {
            must_percent,
            nice_percent,
            experience_score,
            experience_status,
            quality_score,
            final_score,
            gate_passed,
            status,
            missing_must: analysis.gaps.must_have_missing.clone(),
            duplicate_of,
        }
    }

    /// Score a whole batch in arrival order. Duplicate resolution runs as
    /// its own serialized pass over the metas before any scoring, keeping
    /// canonical assignment deterministic.
    pub fn score_batch(
        &self,
        job: &JobSpec,
        candidates: &[(String, AnalysisResult, CandidateMeta)],
    ) -> Vec<CandidateScores> {
        let duplicates = resolve_duplicates(
            candidates
                .iter()
                .map(|(id, _, meta)| (id.as_str(), meta)),
        );
        candidates
            .iter()
            .map(|(id, analysis, meta)| {
                self.score(
                    analysis,
                    meta,
                    job.experience_band.as_ref(),
                    duplicates.get(id).cloned(),
                )
            })
            .collect()
    }

    fn experience(
        &self,
        years: Option<u32>,
        band: Option<&ExperienceBand>,
    ) -> (f32, ExperienceStatus) {
        let policy = &self.policy.experience;
        let Some(years) = years else {
            return (policy.unknown_score, ExperienceStatus::Unknown);
        };
        let Some(band) = band else {
            let score = (years as f32 * policy.unbanded_year_points).min(policy.unbanded_cap);
            return (score, ExperienceStatus::Unknown);
        };

        if years < band.min {
            let gap = (band.min - years) as f32;
            let score = (100.0 - gap * policy.below_band_slope).max(policy.below_band_floor);
            (score, ExperienceStatus::Below)
        } else if band.max.map_or(true, |max| years <= max) {
            (100.0, ExperienceStatus::Within)
        } else {
            let overshoot = (years - band.max.unwrap_or(years)) as f32;
            let score =
                (policy.above_band_start - overshoot * policy.above_band_slope).max(policy.above_band_floor);
            (score, ExperienceStatus::Above)
        }
    }

    fn quality(&self, meta: &CandidateMeta) -> f32 {
        let weights = &self.policy.quality;
        let mut score = 0.0f32;

        if meta.text_length > weights.long_text_chars {
            score += weights.long_text_points;
        } else if meta.text_length > weights.mid_text_chars {
            score += weights.mid_text_points;
        } else if meta.text_length > weights.short_text_chars {
            score += weights.short_text_points;
        }

        if meta.has_structural_headings() {
            score += weights.headings_points;
        }
        if meta.has_bullets() {
            score += weights.bullets_points;
        }
        match (meta.email.is_some(), meta.phone.is_some()) {
            (true, true) => score += weights.contact_both_points,
            (true, false) | (false, true) => score += weights.contact_one_points,
            (false, false) => {}
        }
        if meta.languages.len() > 1 {
            score += weights.multilingual_points;
        }
        if meta.has_any_link() {
            score += weights.links_points;
        }

        score.min(100.0)
    }
}

/// Coverage percentage for the must-have (or nice-to-have) subset of the
/// breakdown. Empty subsets yield 0.
fn priority_percent(analysis: &AnalysisResult, must_have: bool) -> f32 {
    let scores: Vec<f32> = analysis
        .breakdown
        .iter()
        .filter(|m| m.requirement.must_have == must_have)
        .map(|m| m.score10 as f32)
        .collect();
    if scores.is_empty() {
        return 0.0;
    }
    let sum: f32 = scores.iter().sum();
    sum / (scores.len() as f32 * 10.0) * 100.0
}

/// Fold over candidates in a fixed order: the first holder of a display
/// name, email, or normalized phone is canonical, every later holder maps
/// to it. Keys introduced by a duplicate also point at its canonical, so
/// chains collapse to one id.
pub fn resolve_duplicates<'a>(
    candidates: impl Iterator<Item = (&'a str, &'a CandidateMeta)>,
) -> HashMap<String, String> {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut duplicates: HashMap<String, String> = HashMap::new();

    for (id, meta) in candidates {
        let mut keys: Vec<String> = Vec::new();
        if !meta.display_name.trim().is_empty() {
            keys.push(format!("name:{}", meta.display_name.trim().to_lowercase()));
        }
        if let Some(email) = &meta.email {
            keys.push(format!("email:{}", email.to_lowercase()));
        }
        if let Some(phone) = &meta.phone {
            let normalized = normalize_phone(phone);
            if !normalized.is_empty() {
                keys.push(format!("phone:{}", normalized));
            }
        }

        let canonical = keys.iter().find_map(|key| seen.get(key)).cloned();
        if let Some(canonical) = canonical {
            debug!("candidate '{}' duplicates '{}'", id, canonical);
            duplicates.insert(id.to_string(), canonical.clone());
            for key in keys {
                seen.entry(key).or_insert_with(|| canonical.clone());
            }
        } else {
            for key in keys {
                seen.entry(key).or_insert_with(|| id.to_string());
            }
        }
    }

    duplicates
}

fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}
