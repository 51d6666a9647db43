//! Vector math over embedding vectors

/// Dot product over the overlapping prefix. Mismatched lengths truncate to
/// the shorter vector; a documented tolerance, not an error.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

/// Cosine similarity; 0.0 whenever either norm is zero, so zero vectors
/// (failed embeddings) never raise and never contribute similarity.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot(a, b) / (norm_a * norm_b)
    }
}
