//! Ranked screening report over a batch of candidates

use crate::config::OutputFormat;
use crate::error::Result;
use crate::processing::analyzer::AnalysisResult;
use crate::processing::meta::CandidateMeta;
use crate::processing::scorer::{CandidateScores, CandidateStatus, ExperienceStatus};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    pub id: String,
    pub source: String,
    pub meta: CandidateMeta,
    pub analysis: AnalysisResult,
    pub scores: CandidateScores,
}

/// Batch result, ranked by final score. Ties keep arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub job_title: String,
    pub generated_at: DateTime<Utc>,
    pub candidates: Vec<CandidateReport>,
    /// Candidates that failed analysis, with the error message.
    pub failures: Vec<(String, String)>,
}

impl ScreeningReport {
    pub fn new(
        job_title: impl Into<String>,
        mut candidates: Vec<CandidateReport>,
        failures: Vec<(String, String)>,
    ) -> Self {
        candidates.sort_by(|a, b| {
            b.scores
                .final_score
                .partial_cmp(&a.scores.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self {
            job_title: job_title.into(),
            generated_at: Utc::now(),
            candidates,
            failures,
        }
    }

    pub fn render(&self, format: OutputFormat, detailed: bool) -> Result<String> {
        match format {
            OutputFormat::Console => Ok(self.render_console(detailed)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Markdown => Ok(self.render_markdown(detailed)),
        }
    }

    fn render_console(&self, detailed: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", format!("Screening: {}", self.job_title).bold());
        let _ = writeln!(
            out,
            "{} candidates, {} failed",
            self.candidates.len(),
            self.failures.len()
        );
        let _ = writeln!(out);

        for (rank, candidate) in self.candidates.iter().enumerate() {
            let scores = &candidate.scores;
            let status = match scores.status {
                CandidateStatus::Recommended => "recommended".green().bold(),
                CandidateStatus::Consider => "consider".yellow(),
                CandidateStatus::Excluded => "excluded".red(),
            };
            let _ = writeln!(
                out,
                "{:>2}. {:<30} {:>5.1}  {}",
                rank + 1,
                candidate.meta.display_name,
                scores.final_score,
                status
            );
            let _ = writeln!(
                out,
                "    must {:.0}%  nice {:.0}%  experience {:.0} ({})  quality {:.0}",
                scores.must_percent,
                scores.nice_percent,
                scores.experience_score,
                experience_label(scores.experience_status),
                scores.quality_score
            );
            if let Some(canonical) = &scores.duplicate_of {
                let _ = writeln!(out, "    {} {}", "duplicate of".red(), canonical);
            }
            if !scores.missing_must.is_empty() {
                let _ = writeln!(
                    out,
                    "    {} {}",
                    "missing must-haves:".red(),
                    scores.missing_must.join(", ")
                );
            }
            if detailed {
                for entry in &candidate.analysis.breakdown {
                    let marker = if entry.requirement.must_have { "must" } else { "nice" };
                    let _ = writeln!(
                        out,
                        "      [{}] {:<28} {:>2}/10  sim {:.2}",
                        marker, entry.requirement.text, entry.score10, entry.similarity
                    );
                }
                if !candidate.analysis.gaps.improve.is_empty() {
                    let _ = writeln!(
                        out,
                        "      improve: {}",
                        candidate.analysis.gaps.improve.join(", ")
                    );
                }
            }
            let _ = writeln!(out);
        }

        for (source, error) in &self.failures {
            let _ = writeln!(out, "{} {}: {}", "failed".red().bold(), source, error);
        }
        out
    }

    fn render_markdown(&self, detailed: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Screening: {}", self.job_title);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Generated {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "| # | Candidate | Final | Must | Nice | Experience | Quality | Status |");
        let _ = writeln!(out, "|---|-----------|-------|------|------|------------|---------|--------|");
        for (rank, candidate) in self.candidates.iter().enumerate() {
            let scores = &candidate.scores;
            let _ = writeln!(
                out,
                "| {} | {} | {:.1} | {:.0}% | {:.0}% | {:.0} ({}) | {:.0} | {} |",
                rank + 1,
                candidate.meta.display_name,
                scores.final_score,
                scores.must_percent,
                scores.nice_percent,
                scores.experience_score,
                experience_label(scores.experience_status),
                scores.quality_score,
                status_label(scores.status),
            );
        }

        if detailed {
            for candidate in &self.candidates {
                let _ = writeln!(out);
                let _ = writeln!(out, "## {}", candidate.meta.display_name);
                let _ = writeln!(out);
                for entry in &candidate.analysis.breakdown {
                    let _ = writeln!(
                        out,
                        "- {} `{}`: {}/10 (similarity {:.2})",
                        if entry.requirement.must_have { "**must**" } else { "nice" },
                        entry.requirement.text,
                        entry.score10,
                        entry.similarity
                    );
                }
                if !candidate.scores.missing_must.is_empty() {
                    let _ = writeln!(
                        out,
                        "- missing must-haves: {}",
                        candidate.scores.missing_must.join(", ")
                    );
                }
            }
        }

        if !self.failures.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Failures");
            let _ = writeln!(out);
            for (source, error) in &self.failures {
                let _ = writeln!(out, "- {}: {}", source, error);
            }
        }
        out
    }
}

fn experience_label(status: ExperienceStatus) -> &'static str {
    match status {
        ExperienceStatus::Within => "within",
        ExperienceStatus::Below => "below",
        ExperienceStatus::Above => "above",
        ExperienceStatus::Unknown => "unknown",
    }
}

fn status_label(status: CandidateStatus) -> &'static str {
    match status {
        CandidateStatus::Recommended => "recommended",
        CandidateStatus::Consider => "consider",
        CandidateStatus::Excluded => "excluded",
    }
}
