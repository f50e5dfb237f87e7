use crate::driver::{BufferHandle, PcmData, SceneDriver};
use crate::error::Error;
use log::{debug, info, warn};
use std::path::Path;

/// Turns an encoded sound file into PCM samples.
pub trait SoundDecoder: Send + Sync {
    /// Lower-case file extensions this decoder understands
    fn extensions(&self) -> &[&'static str];

    fn decode(&self, path: &Path) -> Result<PcmData, Error>;

    fn supports(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => {
                let ext = ext.to_ascii_lowercase();
                self.extensions().iter().any(|known| *known == ext)
            }
            None => false,
        }
    }
}

/// Allocates buffers and, when a matching decoder is registered, fills them.
///
/// A loader without decoders only allocates: the returned buffer holds no
/// samples and anything bound to it plays silence.
#[derive(Default)]
pub struct BufferLoader {
    decoders: Vec<Box<dyn SoundDecoder>>,
}

impl BufferLoader {
    /// Loader that never reads the sound file
    pub fn stub() -> Self {
        Self::default()
    }

    pub fn with_decoder<T: SoundDecoder + 'static>(mut self, decoder: T) -> Self {
        self.decoders.push(Box::new(decoder));
        self
    }

    pub fn is_stub(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Every extension some registered decoder accepts
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = self
            .decoders
            .iter()
            .flat_map(|d| d.extensions().iter().copied())
            .collect();
        extensions.sort_unstable();
        extensions.dedup();
        extensions
    }

    pub fn load<S: SceneDriver + ?Sized>(
        &self,
        driver: &S,
        path: &Path,
    ) -> Result<BufferHandle, Error> {
        let buffer = driver.gen_buffer()?;

        if self.is_stub() {
            debug!(
                "Allocated {} for {} without sample data",
                buffer,
                path.display()
            );
            return Ok(buffer);
        }

        let decoder = match self.decoders.iter().find(|d| d.supports(path)) {
            Some(decoder) => decoder,
            None => {
                warn!(
                    "No decoder for {}, {} stays empty",
                    path.display(),
                    buffer
                );
                return Ok(buffer);
            }
        };

        let uploaded = decoder
            .decode(path)
            .and_then(|pcm| driver.buffer_data(buffer, &pcm).map(|_| pcm).map_err(Error::from));

        match uploaded {
            Ok(pcm) => {
                info!(
                    "Loaded {} into {}: {} frame(s), {} channel(s) at {} Hz",
                    path.display(),
                    buffer,
                    pcm.frames(),
                    pcm.channels,
                    pcm.sample_rate
                );
                Ok(buffer)
            }
            Err(e) => {
                if let Err(delete_err) = driver.delete_buffer(buffer) {
                    warn!("Failed to delete {}: {}", buffer, delete_err);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::MockScene;
    use crate::error::DriverError;
    use mockall::predicate::*;
    use std::path::PathBuf;

    struct ToneDecoder;

    impl SoundDecoder for ToneDecoder {
        fn extensions(&self) -> &[&'static str] {
            &["tone"]
        }

        fn decode(&self, _path: &Path) -> Result<PcmData, Error> {
            Ok(PcmData {
                channels: 1,
                sample_rate: 8000,
                samples: vec![0.25; 80],
            })
        }
    }

    struct BrokenDecoder;

    impl SoundDecoder for BrokenDecoder {
        fn extensions(&self) -> &[&'static str] {
            &["wav"]
        }

        fn decode(&self, path: &Path) -> Result<PcmData, Error> {
            Err(Error::Decode(format!("corrupt file {}", path.display())))
        }
    }

    #[test]
    fn stub_only_allocates() {
        let mut driver = MockScene::new();
        driver
            .expect_gen_buffer()
            .times(1)
            .returning(|| Ok(BufferHandle::from_raw(1)));
        driver.expect_buffer_data().never();

        let loader = BufferLoader::stub();
        let buffer = loader.load(&driver, Path::new("sound.wav")).unwrap();
        assert_eq!(buffer.raw(), 1);
    }

    #[test]
    fn decoder_output_is_uploaded() {
        let buffer = BufferHandle::from_raw(3);
        let mut driver = MockScene::new();
        driver.expect_gen_buffer().returning(move || Ok(buffer));
        driver
            .expect_buffer_data()
            .with(eq(buffer), function(|pcm: &PcmData| pcm.frames() == 80))
            .times(1)
            .returning(|_, _| Ok(()));

        let loader = BufferLoader::stub().with_decoder(ToneDecoder);
        assert_eq!(loader.load(&driver, Path::new("a.TONE")).unwrap(), buffer);
    }

    #[test]
    fn unsupported_extension_leaves_buffer_empty() {
        let mut driver = MockScene::new();
        driver
            .expect_gen_buffer()
            .returning(|| Ok(BufferHandle::from_raw(1)));
        driver.expect_buffer_data().never();

        let loader = BufferLoader::stub().with_decoder(ToneDecoder);
        assert!(loader.load(&driver, Path::new("sound.wav")).is_ok());
    }

    #[test]
    fn decode_failure_deletes_buffer() {
        let buffer = BufferHandle::from_raw(2);
        let mut driver = MockScene::new();
        driver.expect_gen_buffer().returning(move || Ok(buffer));
        driver
            .expect_delete_buffer()
            .with(eq(buffer))
            .times(1)
            .returning(|_| Ok(()));

        let loader = BufferLoader::stub().with_decoder(BrokenDecoder);
        let result = loader.load(&driver, &PathBuf::from("sound.wav"));
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn allocation_failure_is_reported() {
        let mut driver = MockScene::new();
        driver
            .expect_gen_buffer()
            .returning(|| Err(DriverError::NoCurrentContext));

        let result = BufferLoader::stub().load(&driver, Path::new("sound.wav"));
        assert!(matches!(
            result,
            Err(Error::Driver(DriverError::NoCurrentContext))
        ));
    }

    #[test]
    fn extensions_are_merged() {
        let loader = BufferLoader::stub()
            .with_decoder(BrokenDecoder)
            .with_decoder(ToneDecoder)
            .with_decoder(BrokenDecoder);
        assert_eq!(loader.supported_extensions(), vec!["tone", "wav"]);
        assert!(!loader.is_stub());
    }
}
