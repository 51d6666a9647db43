//! Requirement-to-chunk matching via cosine similarity

use crate::config::ScoringPolicy;
use crate::job::Requirement;
use crate::processing::document::Chunk;
use crate::processing::vector;
use serde::{Deserialize, Serialize};

/// Best match of one requirement against a candidate's chunks. Recomputed
/// per analysis run, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementMatch {
    pub requirement: Requirement,
    pub best_chunk: Option<Chunk>,
    pub similarity: f32,
    pub score10: u8,
}

/// Linear scan over the candidate's embedded chunks; the maximum cosine
/// wins and ties keep the first-seen chunk, so results are deterministic
/// for a fixed chunk order. No eligible chunks means similarity 0.
pub fn best_match<'a>(
    requirement_vector: Option<&[f32]>,
    chunks: &'a [Chunk],
) -> (Option<&'a Chunk>, f32) {
    let Some(requirement_vector) = requirement_vector else {
        return (None, 0.0);
    };

    let mut best: Option<&Chunk> = None;
    let mut best_similarity = 0.0f32;
    for chunk in chunks {
        let Some(embedding) = &chunk.embedding else {
            continue;
        };
        let similarity = vector::cosine(requirement_vector, embedding);
        if best.is_none() || similarity > best_similarity {
            best = Some(chunk);
            best_similarity = similarity;
        }
    }

    match best {
        Some(chunk) => (Some(chunk), best_similarity),
        None => (None, 0.0),
    }
}

/// Map a similarity to a 0-10 score. Must-have requirements below the
/// policy's similarity floor take a flat penalty: a near-miss on a
/// mandatory skill weighs heavier than one on an optional skill.
pub fn score_similarity(similarity: f32, must_have: bool, policy: &ScoringPolicy) -> u8 {
    let base = (similarity * 10.0).round().clamp(0.0, 10.0) as u8;
    if must_have && similarity < policy.penalty_similarity_floor {
        base.saturating_sub(policy.must_have_penalty)
    } else {
        base
    }
}

/// Match one requirement against the candidate's chunks and score it.
pub fn match_requirement(
    requirement: &Requirement,
    requirement_vector: Option<&[f32]>,
    chunks: &[Chunk],
    policy: &ScoringPolicy,
) -> RequirementMatch {
    let (best_chunk, similarity) = best_match(requirement_vector, chunks);
    RequirementMatch {
        requirement: requirement.clone(),
        best_chunk: best_chunk.cloned(),
        similarity,
        score10: score_similarity(similarity, requirement.must_have, policy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::document::Section;

    fn chunk(id: usize, embedding: Option<Vec<f32>>) -> Chunk {
        Chunk {
            id,
            section: Section::Other,
            content: format!("chunk {}", id),
            embedding,
        }
    }

    #[test]
    fn test_strong_match_scores_without_penalty() {
        let policy = ScoringPolicy::default();
        // cosine of these is 0.82 by construction
        let similarity = 0.82f32;
        assert_eq!(score_similarity(similarity, true, &policy), 8);
        assert_eq!(score_similarity(similarity, false, &policy), 8);
    }

    #[test]
    fn test_weak_must_have_takes_penalty() {
        let policy = ScoringPolicy::default();
        // round(0.1 * 10) = 1, then max(0, 1 - 4) = 0
        assert_eq!(score_similarity(0.1, true, &policy), 0);
        // nice-to-have keeps the raw score
        assert_eq!(score_similarity(0.1, false, &policy), 1);
    }

    #[test]
    fn test_penalty_never_goes_negative_and_never_raises() {
        let policy = ScoringPolicy::default();
        for similarity in [-0.4, 0.0, 0.05, 0.15, 0.25, 0.29] {
            let without = score_similarity(similarity, false, &policy);
            let with = score_similarity(similarity, true, &policy);
            assert!(with <= without, "penalty must not raise the score");
        }
    }

    #[test]
    fn test_negative_similarity_clamps_to_zero() {
        let policy = ScoringPolicy::default();
        assert_eq!(score_similarity(-0.7, false, &policy), 0);
    }

    #[test]
    fn test_best_match_prefers_highest_cosine() {
        let chunks = vec![
            chunk(0, Some(vec![1.0, 0.0])),
            chunk(1, Some(vec![0.6, 0.8])),
            chunk(2, None),
        ];
        let (best, similarity) = best_match(Some(&[0.6, 0.8]), &chunks);
        assert_eq!(best.unwrap().id, 1);
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tie_keeps_first_seen_chunk() {
        let chunks = vec![
            chunk(0, Some(vec![1.0, 0.0])),
            chunk(1, Some(vec![2.0, 0.0])),
        ];
        let (best, _) = best_match(Some(&[1.0, 0.0]), &chunks);
        assert_eq!(best.unwrap().id, 0);
    }

    #[test]
    fn test_no_eligible_chunks() {
        let chunks = vec![chunk(0, None)];
        let (best, similarity) = best_match(Some(&[1.0, 0.0]), &chunks);
        assert!(best.is_none());
        assert_eq!(similarity, 0.0);

        let (best, similarity) = best_match(None, &chunks);
        assert!(best.is_none());
        assert_eq!(similarity, 0.0);
    }

    #[test]
    fn test_match_requirement_carries_chunk() {
        let policy = ScoringPolicy::default();
        let requirement = Requirement::new("Node.js", true, 3);
        let chunks = vec![chunk(0, Some(vec![0.9, 0.1]))];
        let matched = match_requirement(&requirement, Some(&[0.9, 0.1]), &chunks, &policy);
        assert_eq!(matched.best_chunk.as_ref().unwrap().id, 0);
        assert_eq!(matched.score10, 10);
    }
}
