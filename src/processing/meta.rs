//! Heuristic candidate signal extraction from raw resume text
//!
//! Best-effort only: every pattern miss leaves its field empty, nothing in
//! here returns an error.

use crate::processing::document::{self, Section};
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

pub const SIGNAL_SUMMARY: &str = "summary-heading";
pub const SIGNAL_HEADINGS: &str = "section-headings";
pub const SIGNAL_BULLETS: &str = "bullet-points";

/// Years beyond this are treated as extraction noise.
const MAX_CREDIBLE_YEARS: u32 = 40;

const MAX_OTHER_LINKS: usize = 5;

/// Language keywords, native spellings included. Data, not control flow.
const LANGUAGE_KEYWORDS: &[(&str, &[&str])] = &[
    ("English", &["english", "الإنجليزية", "الانجليزية"]),
    ("Arabic", &["arabic", "العربية", "عربي"]),
    ("French", &["french", "français", "francais", "الفرنسية"]),
    ("German", &["german", "deutsch", "الألمانية"]),
    ("Spanish", &["spanish", "español", "espanol", "الإسبانية"]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectLink {
    pub label: String,
    pub url: String,
}

/// Structured signals pulled out of one resume. Derived once per text,
/// purely heuristic, no external calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateMeta {
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub languages: Vec<String>,
    pub years_experience: Option<u32>,
    pub last_company: Option<String>,
    pub projects: Vec<ProjectLink>,
    pub github: Vec<String>,
    pub linkedin: Vec<String>,
    pub text_length: usize,
    pub word_count: usize,
    pub quality_signals: Vec<String>,
}

impl CandidateMeta {
    pub fn has_signal(&self, signal: &str) -> bool {
        self.quality_signals.iter().any(|s| s == signal)
    }

    pub fn has_structural_headings(&self) -> bool {
        self.has_signal(SIGNAL_HEADINGS)
    }

    pub fn has_bullets(&self) -> bool {
        self.has_signal(SIGNAL_BULLETS)
    }

    pub fn has_any_link(&self) -> bool {
        !self.projects.is_empty() || !self.github.is_empty() || !self.linkedin.is_empty()
    }
}

pub struct MetaExtractor {
    email: Regex,
    phone_candidate: Regex,
    year_range: Regex,
    url: Regex,
    markdown_link: Regex,
    years_patterns: Vec<Regex>,
    company_label: Regex,
    at_company: Regex,
    location_label: Regex,
    numbered_bullet: Regex,
}

impl Default for MetaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaExtractor {
    pub fn new() -> Self {
        let email = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
            .expect("Invalid email regex");

        let phone_candidate =
            Regex::new(r"\+?\(?\d[\d\s().\-/]{5,}\d").expect("Invalid phone regex");

        let year_range = Regex::new(r"^\(?(?:19|20)\d{2}\)?\s*[-–—/]\s*\(?(?:19|20)\d{2}\)?$")
            .expect("Invalid year range regex");

        let url = Regex::new(r"https?://[^\s<>()\[\]]+").expect("Invalid URL regex");

        let markdown_link =
            Regex::new(r"\[([^\]]+)\]\((https?://[^\s)]+)\)").expect("Invalid markdown link regex");

        // experience-years spellings, English and Arabic
        let years_patterns = vec![
            Regex::new(r"(?i)(\d{1,2})\s*\+?\s*(?:years?|yrs?)").expect("Invalid years regex"),
            Regex::new(r"(\d{1,2})\s*\+?\s*(?:سنة|سنوات|عام|أعوام)").expect("Invalid years regex"),
            Regex::new(r"خبرة\s*[:：]?\s*(\d{1,2})").expect("Invalid years regex"),
        ];

        let company_label =
            Regex::new(r"(?im)^\s*(?:company|employer|شركة|الشركة)\s*[:：]\s*(\S.*)$")
                .expect("Invalid company regex");

        let at_company = Regex::new(r"\bat\s+([A-Z][\w&.'-]*(?:\s+[A-Z][\w&.'-]*){0,2})")
            .expect("Invalid at-company regex");

        let location_label =
            Regex::new(r"(?im)^\s*(?:location|address|city|الموقع|العنوان|المدينة)\s*[:：]\s*(\S.*)$")
                .expect("Invalid location regex");

        let numbered_bullet = Regex::new(r"^\d+[.)]\s").expect("Invalid bullet regex");

        Self {
            email,
            phone_candidate,
            year_range,
            url,
            markdown_link,
            years_patterns,
            company_label,
            at_company,
            location_label,
            numbered_bullet,
        }
    }

    /// Pull every signal out of the text. `source_name` is the fallback
    /// display name, typically the file stem.
    pub fn extract(&self, text: &str, source_name: &str) -> CandidateMeta {
        let mut meta = CandidateMeta {
            display_name: self
                .extract_display_name(text)
                .unwrap_or_else(|| source_name.to_string()),
            email: self.email.find(text).map(|m| m.as_str().to_string()),
            phone: self.extract_phone(text),
            location: self
                .location_label
                .captures(text)
                .map(|c| c[1].trim().to_string()),
            languages: self.extract_languages(text),
            years_experience: self.extract_years(text),
            last_company: self.extract_company(text),
            text_length: text.chars().count(),
            word_count: text.unicode_words().count(),
            quality_signals: self.extract_quality_signals(text),
            ..CandidateMeta::default()
        };
        self.extract_links(text, &mut meta);
        meta
    }

    fn extract_display_name(&self, text: &str) -> Option<String> {
        for line in text.lines().take(5) {
            let stripped = line
                .trim()
                .trim_start_matches(['#', '*', '-', '•', '>', ' '])
                .trim_end_matches('*')
                .trim();
            if stripped.is_empty()
                || stripped.contains('@')
                || stripped.contains("http")
                || document::match_marker(stripped).is_some()
            {
                continue;
            }
            let name: String = stripped.chars().take(80).collect();
            return Some(name);
        }
        None
    }

    fn extract_phone(&self, text: &str) -> Option<String> {
        for candidate in self.phone_candidate.find_iter(text) {
            let raw = candidate.as_str().trim();
            // employment date ranges look like phone numbers to the digit scan
            if self.year_range.is_match(raw) {
                continue;
            }
            let digits = raw.chars().filter(|c| c.is_ascii_digit()).count();
            if (7..=15).contains(&digits) {
                return Some(raw.to_string());
            }
        }
        None
    }

    fn extract_years(&self, text: &str) -> Option<u32> {
        let mut best: Option<u32> = None;
        for pattern in &self.years_patterns {
            for captures in pattern.captures_iter(text) {
                if let Ok(years) = captures[1].parse::<u32>() {
                    let years = years.min(MAX_CREDIBLE_YEARS);
                    best = Some(best.map_or(years, |b| b.max(years)));
                }
            }
        }
        best
    }

    fn extract_company(&self, text: &str) -> Option<String> {
        if let Some(captures) = self.company_label.captures(text) {
            return Some(captures[1].trim().to_string());
        }
        self.at_company
            .captures(text)
            .map(|c| c[1].trim().to_string())
    }

    fn extract_languages(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut languages = Vec::new();
        for (canonical, spellings) in LANGUAGE_KEYWORDS {
            if spellings.iter().any(|s| lowered.contains(s)) {
                let canonical = canonical.to_string();
                if !languages.contains(&canonical) {
                    languages.push(canonical);
                }
            }
        }
        languages
    }

    fn extract_links(&self, text: &str, meta: &mut CandidateMeta) {
        let mut labeled: Vec<(String, String)> = Vec::new();
        for captures in self.markdown_link.captures_iter(text) {
            labeled.push((captures[1].to_string(), captures[2].to_string()));
        }

        let mut other = 0usize;
        for found in self.url.find_iter(text) {
            let url = found.as_str().trim_end_matches(['.', ',', ';']).to_string();
            let lowered = url.to_lowercase();
            if lowered.contains("github.com") {
                if !meta.github.contains(&url) {
                    meta.github.push(url);
                }
            } else if lowered.contains("linkedin.com") {
                if !meta.linkedin.contains(&url) {
                    meta.linkedin.push(url);
                }
            } else if other < MAX_OTHER_LINKS {
                let label = labeled
                    .iter()
                    .find(|(_, labeled_url)| {
                        labeled_url.starts_with(url.as_str()) || url.starts_with(labeled_url.as_str())
                    })
                    .map(|(label, _)| label.clone())
                    .unwrap_or_else(|| host_of(&url));
                if !meta.projects.iter().any(|p| p.url == url) {
                    meta.projects.push(ProjectLink { label, url });
                    other += 1;
                }
            }
        }
    }

    fn extract_quality_signals(&self, text: &str) -> Vec<String> {
        let mut signals = Vec::new();
        let mut has_summary = false;
        let mut has_headings = false;
        let mut has_bullets = false;

        for line in text.lines() {
            match document::match_marker(line) {
                Some(Section::Summary) => has_summary = true,
                Some(Section::Experience) | Some(Section::Skills) | Some(Section::Education) => {
                    has_headings = true
                }
                _ => {}
            }
            let trimmed = line.trim_start();
            if trimmed.starts_with(['-', '*', '•', '▪', '‣'])
                || self.numbered_bullet.is_match(trimmed)
            {
                has_bullets = true;
            }
        }

        if has_summary {
            signals.push(SIGNAL_SUMMARY.to_string());
        }
        if has_headings {
            signals.push(SIGNAL_HEADINGS.to_string());
        }
        if has_bullets {
            signals.push(SIGNAL_BULLETS.to_string());
        }
        signals
    }
}

fn host_of(url: &str) -> String {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .split(['/', '?'])
        .next()
        .unwrap_or(url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> CandidateMeta {
        MetaExtractor::new().extract(text, "resume")
    }

    #[test]
    fn test_display_name_from_first_line() {
        let meta = extract("**Jane Doe**\nSenior Engineer\njane@example.com");
        assert_eq!(meta.display_name, "Jane Doe");
    }

    #[test]
    fn test_display_name_skips_contact_and_markers() {
        let meta = extract("jane@example.com\nSummary\nJane Doe");
        assert_eq!(meta.display_name, "Jane Doe");
    }

    #[test]
    fn test_display_name_falls_back_to_source() {
        let meta = MetaExtractor::new().extract("", "jane_doe_cv");
        assert_eq!(meta.display_name, "jane_doe_cv");
    }

    #[test]
    fn test_email_and_phone() {
        let meta = extract("Jane Doe\njane.doe+jobs@mail.example.org\n+1 (555) 123-4567");
        assert_eq!(
            meta.email.as_deref(),
            Some("jane.doe+jobs@mail.example.org")
        );
        assert_eq!(meta.phone.as_deref(), Some("+1 (555) 123-4567"));
    }

    #[test]
    fn test_employment_dates_are_not_phones() {
        let meta = extract("Jane Doe\nACME Corp 2019-2023\nBetaSoft 2015 - 2019");
        assert!(meta.phone.is_none());
    }

    #[test]
    fn test_too_few_digits_is_not_a_phone() {
        let meta = extract("Jane Doe\nRoom 12-345");
        assert!(meta.phone.is_none());
    }

    #[test]
    fn test_years_experience_english() {
        let meta = extract("Jane has 3 yrs in support and 7 years of engineering");
        assert_eq!(meta.years_experience, Some(7));
    }

    #[test]
    fn test_years_experience_arabic() {
        let meta = extract("مهندسة برمجيات، خبرة 5 سنوات");
        assert_eq!(meta.years_experience, Some(5));
    }

    #[test]
    fn test_years_experience_capped() {
        let meta = extract("over 55 years of experience");
        assert_eq!(meta.years_experience, Some(MAX_CREDIBLE_YEARS));
    }

    #[test]
    fn test_company_from_label() {
        let meta = extract("Jane Doe\nCompany: BetaSoft GmbH\nworked at Delta Inc");
        assert_eq!(meta.last_company.as_deref(), Some("BetaSoft GmbH"));
    }

    #[test]
    fn test_company_from_at_heuristic() {
        let meta = extract("Jane Doe\nBackend developer at Orbital Dynamics since 2021");
        assert_eq!(meta.last_company.as_deref(), Some("Orbital Dynamics"));
    }

    #[test]
    fn test_location_label() {
        let meta = extract("Jane Doe\nLocation: Berlin, Germany");
        assert_eq!(meta.location.as_deref(), Some("Berlin, Germany"));
    }

    #[test]
    fn test_link_partitioning() {
        let meta = extract(
            "Jane Doe\nhttps://github.com/jane/widgets\nhttps://www.linkedin.com/in/janedoe\nhttps://janedoe.dev/portfolio",
        );
        assert_eq!(meta.github, vec!["https://github.com/jane/widgets"]);
        assert_eq!(meta.linkedin, vec!["https://www.linkedin.com/in/janedoe"]);
        assert_eq!(meta.projects.len(), 1);
        assert_eq!(meta.projects[0].label, "janedoe.dev");
    }

    #[test]
    fn test_markdown_links_keep_their_labels() {
        let meta = extract("Jane Doe\n[Widget Factory](https://widgets.example.com/demo)");
        assert_eq!(meta.projects.len(), 1);
        assert_eq!(meta.projects[0].label, "Widget Factory");
        assert_eq!(meta.projects[0].url, "https://widgets.example.com/demo");
    }

    #[test]
    fn test_other_links_are_capped() {
        let links: Vec<String> = (0..8)
            .map(|i| format!("https://site{}.example.com", i))
            .collect();
        let meta = extract(&format!("Jane Doe\n{}", links.join("\n")));
        assert_eq!(meta.projects.len(), 5);
    }

    #[test]
    fn test_languages_deduplicated_first_match_order() {
        let meta = extract("Languages: English, Arabic, english, العربية");
        assert_eq!(meta.languages, vec!["English", "Arabic"]);
    }

    #[test]
    fn test_quality_signals() {
        let text = "Jane Doe\nSummary\nBuilds things.\nExperience\n- Shipped the widget API\nSkills\n- Rust";
        let meta = extract(text);
        assert!(meta.has_signal(SIGNAL_SUMMARY));
        assert!(meta.has_structural_headings());
        assert!(meta.has_bullets());
    }

    #[test]
    fn test_plain_paragraph_has_no_signals() {
        let meta = extract("Jane Doe is a developer who writes software.");
        assert!(meta.quality_signals.is_empty());
    }

    #[test]
    fn test_counts() {
        let meta = extract("Jane Doe\nBuilds things.");
        assert_eq!(meta.text_length, "Jane Doe\nBuilds things.".chars().count());
        assert_eq!(meta.word_count, 4);
    }

    #[test]
    fn test_garbage_input_never_panics() {
        let extractor = MetaExtractor::new();
        for text in ["", "\u{0}\u{1}\u{2}", "@@@@", "++++1234567890123456789012345", "((((("] {
            let _ = extractor.extract(text, "x");
        }
    }
}
