//! CV screener library
//!
//! Matches free-text resumes against weighted job requirements using
//! embedding similarity and heuristic candidate signals, producing ranked,
//! explainable fit scores.

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod job;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::{Result, ScreenerError};
