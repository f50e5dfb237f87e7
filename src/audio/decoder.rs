use super::buffer::SoundDecoder;
use crate::driver::PcmData;
use crate::error::Error;
use log::{debug, warn};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

const EXTENSIONS: &[&str] = &[
    "wav", "wave", "flac", "mp3", "ogg", "oga", "aac", "m4a", "mp4", "mkv", "webm", "aif",
    "aiff", "caf",
];

/// Decodes any container/codec pair symphonia knows into interleaved f32 PCM.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl SoundDecoder for SymphoniaDecoder {
    fn extensions(&self) -> &[&'static str] {
        EXTENSIONS
    }

    fn decode(&self, path: &Path) -> Result<PcmData, Error> {
        let file = File::open(path)
            .map_err(|e| Error::Decode(format!("Cannot open {}: {}", path.display(), e)))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Unsupported format {}: {}", path.display(), e)))?;
        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| Error::Decode(format!("No audio track in {}", path.display())))?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Unsupported codec: {}", e)))?;

        let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
        let mut channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(0);
        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(Error::Decode(format!("Failed to read packet: {}", e))),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count() as u16;

                    let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                }
                Err(e) => return Err(Error::Decode(format!("Failed to decode packet: {}", e))),
            }
        }

        if channels == 0 || sample_rate == 0 {
            return Err(Error::Decode(format!(
                "Missing stream parameters in {}",
                path.display()
            )));
        }

        debug!(
            "Decoded {} samples from {} ({} channel(s) at {} Hz)",
            samples.len(),
            path.display(),
            channels,
            sample_rate
        );

        Ok(PcmData {
            channels,
            sample_rate,
            samples,
        })
    }
}
