//! Audio sources feeding the analysis pipeline.
//!
//! Device lifecycle lives here: each source opens its stream (or feeder
//! thread), builds an [`AudioPipeline`] for the actual sample rate and
//! publishes into the shared [`ControlQueue`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use glicol::Engine;

use super::pipeline::{AudioPipeline, BlockAssembler};
use super::queue::ControlQueue;
use super::synthesis::GLICOL_COMPOSITION;
use crate::error::{Error, Result};
use crate::params::{audio_constants::SYNTH_BLOCK_SIZE, AnalysisConfig};

/// Where control audio comes from
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// Default input device
    Microphone,
    /// Built-in Glicol melody, played and analysed
    Demo,
    /// WAV file streamed in real time (looped)
    WavFile(PathBuf),
}

/// Running audio source (stream or feeder thread kept alive)
pub struct AudioSystem {
    /// Analysis settings at the device rate
    analysis: AnalysisConfig,
    running: Arc<AtomicBool>,

    /// Device stream (kept alive)
    _stream: Option<cpal::Stream>,

    /// WAV feeder thread handle (joined on drop)
    feeder: Option<thread::JoinHandle<()>>,
}

impl AudioSystem {
    /// Open `source` and start publishing control samples into `queue`
    pub fn start(source: &AudioSource, analysis: &AnalysisConfig, queue: ControlQueue) -> Result<Self> {
        analysis.validate()?;
        let running = Arc::new(AtomicBool::new(true));

        let (stream, feeder, analysis) = match source {
            AudioSource::Microphone => {
                let (stream, config) = start_microphone(analysis, queue)?;
                (Some(stream), None, config)
            }
            AudioSource::Demo => {
                let (stream, config) = start_demo(analysis, queue)?;
                (Some(stream), None, config)
            }
            AudioSource::WavFile(path) => {
                let (handle, config) = start_wav_feeder(path, analysis, queue, Arc::clone(&running))?;
                (None, Some(handle), config)
            }
        };

        Ok(Self {
            analysis,
            running,
            _stream: stream,
            feeder,
        })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.analysis.sample_rate_hz
    }

    /// Analysis settings the running pipeline actually uses (device rate,
    /// possibly enlarged block)
    pub fn analysis(&self) -> &AnalysisConfig {
        &self.analysis
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.feeder.take() {
            let _ = handle.join();
        }
    }
}

fn device_name(device: &cpal::Device) -> String {
    device.name().unwrap_or_else(|_| "Unknown".to_string())
}

/// Capture the default input device; analysis runs inside the callback
fn start_microphone(analysis: &AnalysisConfig, queue: ControlQueue) -> Result<(cpal::Stream, AnalysisConfig)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(Error::NoDevice("no default input device"))?;

    let supported = device.default_input_config()?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(Error::UnsupportedFormat(supported.sample_format()));
    }
    let config: cpal::StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;

    log::info!(
        "Audio input: {} @ {}Hz, {} channel(s)",
        device_name(&device),
        sample_rate,
        channels
    );

    let config_at_rate = analysis.with_sample_rate(sample_rate);
    let mut pipeline = AudioPipeline::new(&config_at_rate);
    let mut assembler = BlockAssembler::new(pipeline.block_size());

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            assembler.push_interleaved(data, channels, |block| {
                pipeline.process_into(block, &queue);
            });
        },
        |err| log::error!("Audio input stream error: {}", err),
        None,
    )?;
    stream.play()?;

    Ok((stream, config_at_rate))
}

/// Play the Glicol demo melody and analyse its first channel
fn start_demo(analysis: &AnalysisConfig, queue: ControlQueue) -> Result<(cpal::Stream, AnalysisConfig)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(Error::NoDevice("no default output device"))?;

    let supported = device.default_output_config()?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(Error::UnsupportedFormat(supported.sample_format()));
    }
    let config: cpal::StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;

    log::info!("Audio demo output: {} @ {}Hz", device_name(&device), sample_rate);

    let mut engine = Engine::<SYNTH_BLOCK_SIZE>::new();
    engine.set_sr(sample_rate as usize);
    engine.update_with_code(GLICOL_COMPOSITION);
    engine
        .update()
        .map_err(|e| Error::Synth(format!("{:?}", e)))?;

    let config_at_rate = analysis.with_sample_rate(sample_rate);
    let mut pipeline = AudioPipeline::new(&config_at_rate);
    let mut assembler = BlockAssembler::new(pipeline.block_size());

    // Synth renders fixed blocks; the device asks for arbitrary lengths
    let mut left = [0.0f32; SYNTH_BLOCK_SIZE];
    let mut right = [0.0f32; SYNTH_BLOCK_SIZE];
    let mut cursor = SYNTH_BLOCK_SIZE;

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                if cursor == SYNTH_BLOCK_SIZE {
                    let (buffers, _) = engine.next_block(vec![]);
                    for i in 0..SYNTH_BLOCK_SIZE {
                        left[i] = buffers[0][i];
                        right[i] = buffers[1][i];
                    }
                    cursor = 0;
                }

                // Safety limiter: hard clip to ±0.5 to prevent ear damage
                let l = left[cursor].clamp(-0.5, 0.5);
                let r = right[cursor].clamp(-0.5, 0.5);
                cursor += 1;

                for (ch, out) in frame.iter_mut().enumerate() {
                    *out = if ch % 2 == 0 { l } else { r };
                }

                assembler.push_interleaved(&[l], 1, |block| {
                    pipeline.process_into(block, &queue);
                });
            }
        },
        |err| log::error!("Audio output stream error: {}", err),
        None,
    )?;
    stream.play()?;

    Ok((stream, config_at_rate))
}

/// Decode the first channel of a WAV file to f32 in [-1, 1]
pub fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mono = interleaved.into_iter().step_by(channels).collect();
    Ok((mono, spec.sample_rate))
}

/// Stream a WAV file through the pipeline at real-time pace, looping
fn start_wav_feeder(
    path: &Path,
    analysis: &AnalysisConfig,
    queue: ControlQueue,
    running: Arc<AtomicBool>,
) -> Result<(thread::JoinHandle<()>, AnalysisConfig)> {
    let (samples, sample_rate) = read_wav_mono(path)?;
    let config = analysis.with_sample_rate(sample_rate);
    config.validate()?;
    if samples.len() < config.block_size {
        return Err(Error::invalid(
            "wav",
            format!("{} holds fewer samples than one block", path.display()),
        ));
    }

    log::info!(
        "Audio file: {} @ {}Hz, {:.1}s",
        path.display(),
        sample_rate,
        samples.len() as f32 / sample_rate as f32
    );

    let block_period = Duration::from_secs_f64(config.block_size as f64 / sample_rate as f64);
    let pipeline_config = config.clone();
    let handle = thread::spawn(move || {
        let mut pipeline = AudioPipeline::new(&pipeline_config);
        let block_size = pipeline.block_size();

        for start in (0..=samples.len() - block_size).step_by(block_size).cycle() {
            if !running.load(Ordering::Relaxed) {
                break;
            }
            pipeline.process_into(&samples[start..start + block_size], &queue);
            thread::sleep(block_period);
        }
    });

    Ok((handle, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn write_tone_wav(path: &Path, freq: f32, seconds: f32) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let frames = (seconds * spec.sample_rate as f32) as usize;
        for i in 0..frames {
            let v = (2.0 * PI * freq * i as f32 / spec.sample_rate as f32).sin() * 0.5;
            writer.write_sample((v * i16::MAX as f32) as i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_wav_keeps_first_channel() {
        let path = std::env::temp_dir().join("pitchflight_read_wav_test.wav");
        write_tone_wav(&path, 200.0, 0.1);

        let (mono, rate) = read_wav_mono(&path).unwrap();
        assert_eq!(rate, 22050);
        assert_eq!(mono.len(), 2205);
        assert!(mono.iter().all(|s| s.abs() <= 0.51));
        assert!(mono.iter().any(|s| s.abs() > 0.4));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_wav_feeder_publishes_samples() {
        let path = std::env::temp_dir().join("pitchflight_feeder_test.wav");
        write_tone_wav(&path, 220.0, 0.5);

        let analysis = AnalysisConfig::default();
        let queue = ControlQueue::new(analysis.history_len, analysis.spectrum_len());
        let system = AudioSystem::start(
            &AudioSource::WavFile(path.clone()),
            &analysis,
            queue.clone(),
        )
        .unwrap();
        assert_eq!(system.sample_rate_hz(), 22050);
        // Overlay band must follow the file rate, not the nominal one
        assert_eq!(
            system.analysis().voice_bins(),
            analysis.with_sample_rate(22050).voice_bins()
        );
        assert_ne!(system.analysis().voice_bins(), analysis.voice_bins());

        let mut waited = 0;
        while queue.appended() < 3 && waited < 200 {
            thread::sleep(Duration::from_millis(10));
            waited += 1;
        }
        drop(system);

        assert!(queue.appended() >= 3);
        let last = queue.last().unwrap();
        assert!(last.voiced);
        assert!((last.pitch_log - 220.0f32.ln()).abs() < 0.02);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_wav_is_error() {
        let analysis = AnalysisConfig::default();
        let queue = ControlQueue::new(8, 0);
        let result = AudioSystem::start(
            &AudioSource::WavFile(PathBuf::from("/nonexistent/input.wav")),
            &analysis,
            queue,
        );
        assert!(matches!(result, Err(Error::Wav(_))));
    }
}
