pub mod config;

use crate::audio::{AudioSession, BufferLoader, ReverbSend, Scene, SourceParams, SymphoniaDecoder};
use crate::driver::{AudioDriver, BufferHandle, SourceHandle};
use crate::error::Error;
use config::{EffectTarget, SceneConfig};
use log::{info, trace, warn};
use std::future::Future;

/// Handles produced by one run of the demo scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneReport {
    pub device_name: String,
    pub buffer: BufferHandle,
    /// Frames uploaded to `buffer`; zero for the stub loader
    pub frames: usize,
    pub source: SourceHandle,
    /// Handle the reverb send and beam were applied to
    pub effect_target: SourceHandle,
    pub reverb: ReverbSend,
    pub ticks: u64,
}

/// Buffer loader matching the `decode` setting.
pub fn loader_for(config: &SceneConfig) -> BufferLoader {
    if config.decode {
        BufferLoader::stub().with_decoder(SymphoniaDecoder::new())
    } else {
        BufferLoader::stub()
    }
}

/// Build the scene described by `config`, idle until `shutdown` resolves, then tear down.
///
/// The session is released on every path out of this function, including
/// errors raised while the scene is being built.
pub async fn run_scene<D, F>(
    driver: D,
    config: &SceneConfig,
    loader: &BufferLoader,
    shutdown: F,
) -> Result<SceneReport, Error>
where
    D: AudioDriver,
    F: Future<Output = ()>,
{
    let session = AudioSession::open(driver, config.device_name.as_deref())?;
    let device_name = session.driver().device_name(session.device())?;
    info!("Using output device {:?}", device_name);

    let mut scene = Scene::new(session);
    scene.configure_listener(config.listener)?;

    let buffer = scene.load_buffer(loader, &config.sound_path)?;
    let frames = scene.driver().buffer_frames(buffer)?;
    info!("{} holds {} frame(s)", buffer, frames);
    let source = scene.spawn_source(
        buffer,
        SourceParams::at(config.source_position, config.source_velocity),
    )?;

    let effect_target = match config.effect_target {
        EffectTarget::Source => source,
        EffectTarget::Buffer => {
            warn!(
                "Applying effects through {} reinterpreted as a source name",
                buffer
            );
            SourceHandle::from_raw(buffer.raw())
        }
    };

    let reverb = scene.apply_reverb(effect_target, &config.reverb)?;
    scene.beamform(effect_target, config.beam_angle(), &config.beam)?;

    info!("Scene running, waiting for shutdown");
    let ticks = idle_until(config, shutdown).await;
    info!("Shutdown requested after {} tick(s)", ticks);

    scene.close()?;

    Ok(SceneReport {
        device_name,
        buffer,
        frames,
        source,
        effect_target,
        reverb,
        ticks,
    })
}

async fn idle_until<F: Future<Output = ()>>(config: &SceneConfig, shutdown: F) -> u64 {
    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(config.tick());
    let mut ticks = 0u64;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                ticks += 1;
                trace!("tick {}", ticks);
            }
        }
    }

    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{SceneDriver, SoftwareDriver};
    use std::time::Duration;

    fn virtual_config() -> SceneConfig {
        SceneConfig {
            backend: crate::driver::OutputBackend::Virtual,
            tick_ms: 1,
            ..SceneConfig::default()
        }
    }

    #[tokio::test]
    async fn ticks_until_shutdown() {
        let driver = SoftwareDriver::new();
        let config = virtual_config();
        let shutdown = tokio::time::sleep(Duration::from_millis(20));

        let report = run_scene(driver.clone(), &config, &loader_for(&config), shutdown)
            .await
            .unwrap();

        assert!(report.ticks >= 1);
        assert_eq!(driver.open_device_count(), 0);
    }

    #[tokio::test]
    async fn source_target_uses_created_source() {
        let driver = SoftwareDriver::new();
        let config = SceneConfig {
            effect_target: EffectTarget::Source,
            ..virtual_config()
        };

        let report = run_scene(driver.clone(), &config, &BufferLoader::stub(), async {})
            .await
            .unwrap();
        assert_eq!(report.effect_target, report.source);
    }

    #[tokio::test]
    async fn mid_sequence_failure_still_tears_down() {
        let driver = SoftwareDriver::new();
        let mut config = virtual_config();
        config.reverb.decay_time = 50.0;

        let result = run_scene(driver.clone(), &config, &BufferLoader::stub(), async {}).await;

        assert!(matches!(result, Err(Error::Driver(_))));
        assert_eq!(driver.open_device_count(), 0);
        assert_eq!(driver.live_context_count(), 0);
        assert!(driver.gen_buffer().is_err());
    }

    #[test]
    fn decode_setting_selects_loader() {
        let mut config = SceneConfig::default();
        assert!(loader_for(&config).is_stub());
        config.decode = true;
        assert!(loader_for(&config).supported_extensions().contains(&"wav"));
    }
}
