//! Resume segmentation into labeled, bounded chunks

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Experience,
    Skills,
    Education,
    Summary,
    Other,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Experience => write!(f, "experience"),
            Section::Skills => write!(f, "skills"),
            Section::Education => write!(f, "education"),
            Section::Summary => write!(f, "summary"),
            Section::Other => write!(f, "other"),
        }
    }
}

/// Marker spellings per section, consumed by one matching pass. Patterns are
/// data so new locales slot in without touching control flow.
pub(crate) const SECTION_MARKERS: &[(Section, &[&str])] = &[
    (
        Section::Experience,
        &[
            "experience",
            "work experience",
            "professional experience",
            "employment",
            "خبرة",
            "الخبرة",
            "الخبرات",
        ],
    ),
    (
        Section::Skills,
        &[
            "skills",
            "technical skills",
            "core competencies",
            "مهارات",
            "المهارات",
        ],
    ),
    (
        Section::Education,
        &["education", "academic background", "تعليم", "التعليم"],
    ),
    (
        Section::Summary,
        &[
            "summary",
            "objective",
            "profile",
            "about",
            "ملخص",
            "الملخص",
            "نبذة",
        ],
    ),
];

/// A bounded slice of a candidate's resume text, tagged with its inferred
/// section. `content` is a contiguous substring of the section text; chunk
/// ids ascend in emission order and stay stable for a given input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    pub section: Section,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn is_embedded(&self) -> bool {
        self.embedding.is_some()
    }
}

/// Returns the section a line opens, if it is a marker line. A marker is a
/// short line whose stripped form starts with a known spelling at a word
/// boundary, so "Experienced developer" does not open a section.
pub(crate) fn match_marker(line: &str) -> Option<Section> {
    let stripped = line
        .trim()
        .trim_start_matches(['#', '*', '-', '•', '▪', ' '])
        .trim_end_matches(':')
        .trim();
    if stripped.is_empty() || stripped.chars().count() > 40 {
        return None;
    }
    let lowered = stripped.to_lowercase();
    for (section, patterns) in SECTION_MARKERS {
        for pattern in *patterns {
            if let Some(rest) = lowered.strip_prefix(pattern) {
                let boundary = rest.chars().next().map_or(true, |c| !c.is_alphanumeric());
                if boundary {
                    return Some(*section);
                }
            }
        }
    }
    None
}

pub struct Segmenter {
    target: usize,
    slack: usize,
}

impl Segmenter {
    pub fn new(target: usize, slack: usize) -> Self {
        Self {
            target: target.max(1),
            slack,
        }
    }

    /// Split raw resume text into chunks grouped by first-seen section.
    /// Concatenating the chunks of a section reconstructs that section's
    /// text exactly; empty input yields no chunks.
    pub fn segment(&self, raw: &str) -> Vec<Chunk> {
        let text = normalize(raw);
        if text.is_empty() {
            return Vec::new();
        }

        let sections = collect_sections(&text);

        let mut chunks = Vec::new();
        let mut next_id = 0usize;
        for (section, content) in sections {
            if content.is_empty() {
                continue;
            }
            if content.chars().count() <= self.target + self.slack {
                chunks.push(Chunk {
                    id: next_id,
                    section,
                    content,
                    embedding: None,
                });
                next_id += 1;
            } else {
                for window in split_windows(&content, self.target) {
                    chunks.push(Chunk {
                        id: next_id,
                        section,
                        content: window,
                        embedding: None,
                    });
                    next_id += 1;
                }
            }
        }
        chunks
    }
}

fn normalize(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Section texts in first-seen order. Marker lines open a span running to
/// the next marker; text before the first marker (or marker-free text) lands
/// in `Other`. Repeated markers for one section append their spans.
fn collect_sections(text: &str) -> Vec<(Section, String)> {
    let mut line_starts = vec![0usize];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            line_starts.push(i + 1);
        }
    }

    let mut markers: Vec<(Section, usize)> = Vec::new();
    for (idx, start) in line_starts.iter().enumerate() {
        let end = line_starts.get(idx + 1).map_or(text.len(), |s| *s);
        if let Some(section) = match_marker(&text[*start..end]) {
            markers.push((section, idx));
        }
    }

    let mut sections: Vec<(Section, String)> = Vec::new();
    let mut append = |section: Section, span: &str| {
        let span = span.trim_end();
        if span.is_empty() {
            return;
        }
        match sections.iter_mut().find(|(s, _)| *s == section) {
            Some((_, content)) => {
                content.push('\n');
                content.push_str(span);
            }
            None => sections.push((section, span.to_string())),
        }
    };

    if markers.is_empty() {
        append(Section::Other, text);
        return sections;
    }

    let first_marker_start = line_starts[markers[0].1];
    if first_marker_start > 0 {
        append(Section::Other, &text[..first_marker_start]);
    }
    for (i, (section, line_idx)) in markers.iter().enumerate() {
        let start = line_starts[*line_idx];
        let end = markers
            .get(i + 1)
            .map_or(text.len(), |(_, next_line)| line_starts[*next_line]);
        append(*section, &text[start..end]);
    }
    sections
}

/// Consecutive windows of `target` characters, final window shorter. Splits
/// on char boundaries so multi-byte text never panics.
fn split_windows(content: &str, target: usize) -> Vec<String> {
    let mut windows = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;
    for (offset, _) in content.char_indices() {
        if count == target {
            windows.push(content[start..offset].to_string());
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < content.len() {
        windows.push(content[start..].to_string());
    }
    windows
}
