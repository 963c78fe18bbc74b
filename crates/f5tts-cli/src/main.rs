//! F5-TTS CLI - generate speech from text with a reference voice

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod settings;

use args::Cli;
use f5tts_core::inference::BridgeProcess;
use f5tts_core::{EngineConfig, GenerationOrchestrator};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "f5tts_cli=info,f5tts_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = settings::load(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(normalizer) = cli.text_normalizer {
        config.text_normalizer = normalizer.into();
    }
    info!("Models directory: {:?}", config.models_dir);

    if cli.check {
        return check_bridge(&config);
    }

    if cli.ref_text.is_some() && cli.ref_audio.is_none() {
        warn!("--ref-text is ignored without --ref-audio; using the bundled reference clip");
    }

    let request = cli.to_request(&config);
    let orchestrator = GenerationOrchestrator::from_config(&config);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Generating speech");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = orchestrator.generate(&request);
    spinner.finish_and_clear();

    let report = result.with_context(|| {
        format!(
            "generation failed, nothing written to {:?}",
            request.output_path
        )
    })?;

    info!(
        "Wrote {:.2} seconds of audio to {:?} (generation {})",
        report.generated_duration_seconds, report.output_path, report.id
    );
    Ok(())
}

fn check_bridge(config: &EngineConfig) -> anyhow::Result<()> {
    let bridge = BridgeProcess::new(config.python_cmd.clone(), config.bridge_script.clone());
    if !bridge.check_dependencies() {
        anyhow::bail!(
            "Python worker {:?} is not usable with {:?}",
            config.bridge_script,
            config.python_cmd
        );
    }
    info!("Python worker {:?} is ready", config.bridge_script);
    Ok(())
}
