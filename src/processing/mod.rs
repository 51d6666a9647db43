//! Requirement-matching and scoring core

pub mod analyzer;
pub mod document;
pub mod embeddings;
pub mod matcher;
pub mod meta;
pub mod scorer;
pub mod vector;
