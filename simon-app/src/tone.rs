use simon_core::{Position, ToneEmitter};
use std::time::Duration;
use tracing::{debug, info};

/// Square-wave frequencies per button: C4, G3, E4, G4.
pub const FREQUENCIES_HZ: [f32; 4] = [261.626, 195.998, 329.628, 391.995];

#[derive(Clone)]
pub enum Tone {
    Logged,
    #[cfg(feature = "audio")]
    Square(square::SquareTone),
}

impl Tone {
    /// Opens the default output device, or falls back to logging each tone.
    pub fn open(mute: bool) -> Self {
        if mute {
            info!("Muted: tones will only be logged");
            return Tone::Logged;
        }

        #[cfg(feature = "audio")]
        {
            match square::SquareTone::new() {
                Ok(tone) => return Tone::Square(tone),
                Err(e) => tracing::warn!("Audio unavailable, tones will only be logged: {e:#}"),
            }
        }

        #[cfg(not(feature = "audio"))]
        info!("Built without the `audio` feature: tones will only be logged");

        Tone::Logged
    }
}

impl ToneEmitter for Tone {
    fn emit(&mut self, position: Position, duration: Duration) {
        debug!(
            %position,
            hz = FREQUENCIES_HZ[position.index()],
            ms = duration.as_millis() as u64,
            "tone"
        );
        match self {
            Tone::Logged => {}
            #[cfg(feature = "audio")]
            Tone::Square(tone) => tone.emit(position, duration),
        }
    }
}

#[cfg(feature = "audio")]
mod square {
    use super::FREQUENCIES_HZ;
    use anyhow::{Context, Result, bail};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, Sample, SizedSample};
    use simon_core::Position;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;
    use tracing::{error, info};

    const AMPLITUDE: f32 = 0.2;

    struct Voice {
        frequency: f32,
        phase: f32,
        remaining: u64,
    }

    /// One voice; a new tone replaces whatever is still sounding.
    #[derive(Clone)]
    pub struct SquareTone {
        voice: Arc<Mutex<Option<Voice>>>,
        sample_rate: u32,
        _stream: Rc<cpal::Stream>,
    }

    impl SquareTone {
        pub fn new() -> Result<Self> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .context("no audio output device")?;
            let config = device
                .default_output_config()
                .context("no default output config")?;

            let sample_rate = config.sample_rate().0;
            let channels = config.channels() as usize;
            info!(
                host = ?host.id(),
                sample_rate,
                channels,
                format = ?config.sample_format(),
                "Audio output opened"
            );

            let voice = Arc::new(Mutex::new(None));
            let stream_config = config.config();
            let stream = match config.sample_format() {
                cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, &voice, channels, sample_rate),
                cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, &voice, channels, sample_rate),
                cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, &voice, channels, sample_rate),
                other => bail!("unsupported sample format {other:?}"),
            }?;
            stream.play().context("cannot start audio stream")?;

            Ok(Self {
                voice,
                sample_rate,
                _stream: Rc::new(stream),
            })
        }

        pub fn emit(&mut self, position: Position, duration: Duration) {
            let remaining = (duration.as_secs_f64() * self.sample_rate as f64) as u64;
            let mut voice = self.voice.lock().unwrap_or_else(PoisonError::into_inner);
            *voice = Some(Voice {
                frequency: FREQUENCIES_HZ[position.index()],
                phase: 0.0,
                remaining,
            });
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        voice: &Arc<Mutex<Option<Voice>>>,
        channels: usize,
        sample_rate: u32,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let voice = Arc::clone(voice);
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut voice = voice.lock().unwrap_or_else(PoisonError::into_inner);
                for frame in data.chunks_mut(channels) {
                    let value = T::from_sample(next_sample(&mut voice, sample_rate));
                    for out in frame.iter_mut() {
                        *out = value;
                    }
                }
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )?;
        Ok(stream)
    }

    fn next_sample(voice: &mut Option<Voice>, sample_rate: u32) -> f32 {
        let Some(v) = voice else {
            return 0.0;
        };
        if v.remaining == 0 {
            *voice = None;
            return 0.0;
        }
        v.remaining -= 1;
        let sample = if v.phase < 0.5 { AMPLITUDE } else { -AMPLITUDE };
        v.phase = (v.phase + v.frequency / sample_rate as f32).fract();
        sample
    }

}
