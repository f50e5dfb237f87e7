use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use spatial_scene::app::{loader_for, run_scene};
use spatial_scene::{ConfigManager, EffectTarget, OutputBackend};
use std::path::PathBuf;

/// Play one positioned sound source with reverb and a directional beam
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Config file (defaults to the per-user config)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Where output devices are resolved
    #[clap(long, value_enum)]
    backend: Option<OutputBackend>,

    /// Output device name
    #[clap(long)]
    device: Option<String>,

    /// Sound file bound to the source
    #[clap(long)]
    sound: Option<PathBuf>,

    /// Decode the sound file instead of leaving the buffer empty
    #[clap(long)]
    decode: bool,

    /// Handle the reverb and beam are applied to
    #[clap(long, value_enum)]
    effect_target: Option<EffectTarget>,

    /// Print the selected backend's output devices and exit
    #[clap(long)]
    list_devices: bool,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let manager = match &args.config {
        Some(path) => ConfigManager::with_file(path)?,
        None => ConfigManager::new()?,
    };
    debug!("Configuration from {:?}", manager.path());

    let mut config = manager.into_settings();
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(device) = args.device {
        config.device_name = Some(device);
    }
    if let Some(sound) = args.sound {
        config.sound_path = sound;
    }
    if args.decode {
        config.decode = true;
    }
    if let Some(target) = args.effect_target {
        config.effect_target = target;
    }

    if args.list_devices {
        for name in config.backend.device_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let driver = config.driver();
    let loader = loader_for(&config);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    info!("Starting scene, press Ctrl-C to stop");
    let report = run_scene(driver, &config, &loader, shutdown)
        .await
        .context("Audio scene failed")?;

    info!(
        "Stopped {} on {:?} after {} tick(s)",
        report.source, report.device_name, report.ticks
    );
    Ok(())
}
