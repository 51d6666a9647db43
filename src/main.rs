//! CV screener: semantic resume screening against weighted job requirements

use clap::Parser;
use cv_screener::cli::{self, Cli, Commands, ConfigAction};
use cv_screener::config::Config;
use cv_screener::error::{Result, ScreenerError};
use cv_screener::input::manager::InputManager;
use cv_screener::job::JobSpec;
use cv_screener::output::report::{CandidateReport, ScreeningReport};
use cv_screener::processing::analyzer::AnalysisEngine;
use cv_screener::processing::embeddings::HttpEmbeddingProvider;
use cv_screener::processing::meta::MetaExtractor;
use cv_screener::processing::scorer::CompositeScorer;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

async fn run_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Screen {
            job,
            resumes,
            output,
            detailed,
            save,
        } => {
            let output_format =
                cli::parse_output_format(&output).map_err(ScreenerError::InvalidInput)?;

            cli::validate_file_extension(&job, &["toml"])
                .map_err(|e| ScreenerError::InvalidInput(format!("Job file: {}", e)))?;
            for resume in &resumes {
                cli::validate_file_extension(resume, &["txt", "md", "markdown"])
                    .map_err(|e| ScreenerError::InvalidInput(format!("Resume file: {}", e)))?;
            }

            let job_spec = JobSpec::load(&job).await?;
            info!(
                "Screening {} resumes against '{}' ({} requirements)",
                resumes.len(),
                job_spec.title,
                job_spec.requirements.len()
            );

            let report = screen_batch(&config, &job_spec, &resumes).await?;

            let rendered = report.render(output_format, detailed || config.output.detailed)?;
            match save {
                Some(path) => {
                    tokio::fs::write(&path, rendered.as_bytes()).await?;
                    info!("Report saved to {}", path.display());
                }
                None => print!("{}", rendered),
            }
            Ok(())
        }

        Commands::Config { action } => {
            match action.unwrap_or(ConfigAction::Show) {
                ConfigAction::Show => {
                    let raw = toml::to_string_pretty(&config)
                        .map_err(|e| ScreenerError::Configuration(e.to_string()))?;
                    println!("{}", raw);
                }
                ConfigAction::Path => {
                    println!("{}", Config::config_path().display());
                }
                ConfigAction::Reset => {
                    Config::default().save()?;
                    println!("Configuration reset to defaults");
                }
            }
            Ok(())
        }
    }
}

/// Analyze every resume in arrival order, then resolve duplicates and score
/// in a second pass over the collected metas.
async fn screen_batch(
    config: &Config,
    job_spec: &JobSpec,
    resumes: &[PathBuf],
) -> Result<ScreeningReport> {
    let provider = Arc::new(HttpEmbeddingProvider::from_config(&config.embedding));
    let engine = AnalysisEngine::new(provider, config);
    let extractor = MetaExtractor::new();
    let mut input_manager = InputManager::new().with_cache(config.processing.enable_cache);

    let mut analyzed = Vec::new();
    let mut sources = Vec::new();
    let mut failures = Vec::new();

    for path in resumes {
        let candidate_id = candidate_id_for(path);
        let text = match input_manager.extract_text(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                failures.push((path.display().to_string(), e.to_string()));
                continue;
            }
        };

        match engine.analyze(job_spec, &candidate_id, &text).await {
            Ok(analysis) => {
                let meta = extractor.extract(&text, &candidate_id);
                sources.push(path.display().to_string());
                analyzed.push((candidate_id, analysis, meta));
            }
            Err(e @ ScreenerError::EmbeddingsFailed(_)) => {
                // upstream failure: the whole batch is suspect, bail out
                return Err(e);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                failures.push((path.display().to_string(), e.to_string()));
            }
        }
    }

    let scorer = CompositeScorer::new(config.scoring.clone());
    let scores = scorer.score_batch(job_spec, &analyzed);

    let candidates = analyzed
        .into_iter()
        .zip(sources)
        .zip(scores)
        .map(|(((id, analysis, meta), source), scores)| CandidateReport {
            id,
            source,
            meta,
            analysis,
            scores,
        })
        .collect();

    Ok(ScreeningReport::new(
        job_spec.title.clone(),
        candidates,
        failures,
    ))
}

fn candidate_id_for(path: &PathBuf) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
