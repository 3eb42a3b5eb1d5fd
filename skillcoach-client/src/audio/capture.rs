//! Microphone capture using cpal
//!
//! The input stream lives on a blocking thread for the whole recording;
//! the callback appends interleaved f32 samples to a shared buffer.

use super::{AudioClip, PcmAudio};
use crate::error::{Error, Result};
use chrono::Utc;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use skillcoach_common::events::{ClientEvent, EventBus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Names of the available input devices
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices: Vec<String> = host
        .input_devices()
        .map_err(|e| Error::Capture(format!("Failed to enumerate devices: {}", e)))?
        .filter_map(|device| device.name().ok())
        .collect();

    debug!("Found {} input devices", devices.len());
    Ok(devices)
}

/// An opened input device with its stream configuration
pub struct Recorder {
    device: Device,
    device_name: String,
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl Recorder {
    /// Open `device_name`, falling back to the default input device when it
    /// is not found.
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();

        let (device, device_name) = match device_name {
            Some(name) => {
                let mut devices = host
                    .input_devices()
                    .map_err(|e| Error::Capture(format!("Failed to enumerate devices: {}", e)))?;

                match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                    Some(dev) => {
                        info!("Found requested input device: {}", name);
                        (dev, name.to_string())
                    }
                    None => {
                        warn!("Input device '{}' not found, falling back to default device", name);
                        let dev = host.default_input_device().ok_or_else(|| {
                            Error::Capture(format!(
                                "Device '{}' not found and no default input device available",
                                name
                            ))
                        })?;
                        let default_name = dev.name().unwrap_or_else(|_| "Unknown".to_string());
                        (dev, default_name)
                    }
                }
            }
            None => {
                let dev = host
                    .default_input_device()
                    .ok_or_else(|| Error::Capture("No default input device found".to_string()))?;
                let name = dev.name().unwrap_or_else(|_| "Unknown".to_string());
                info!("Using default input device: {}", name);
                (dev, name)
            }
        };

        let supported = device
            .default_input_config()
            .map_err(|e| Error::Capture(format!("Failed to get input config: {}", e)))?;
        let sample_format = supported.sample_format();
        let config = supported.config();

        debug!(
            "Input config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        Ok(Self {
            device,
            device_name,
            config,
            sample_format,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Record until `max_duration` elapses or `stop` is cancelled.
    ///
    /// Blocks the calling thread.
    pub fn record(&self, max_duration: Duration, stop: &CancellationToken) -> Result<PcmAudio> {
        let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let failed = Arc::new(AtomicBool::new(false));

        let stream = self.build_stream(Arc::clone(&buffer), Arc::clone(&failed))?;
        stream
            .play()
            .map_err(|e| Error::Capture(format!("Failed to start input stream: {}", e)))?;

        let started = Instant::now();
        while started.elapsed() < max_duration && !stop.is_cancelled() {
            if failed.load(Ordering::SeqCst) {
                return Err(Error::Capture("Input stream failed".to_string()));
            }
            std::thread::sleep(STOP_CHECK_INTERVAL);
        }
        drop(stream);

        let samples = buffer
            .lock()
            .map(|mut samples| std::mem::take(&mut *samples))
            .map_err(|_| Error::Capture("Sample buffer poisoned".to_string()))?;

        Ok(PcmAudio {
            samples,
            sample_rate: self.config.sample_rate.0,
            channels: self.config.channels,
        })
    }

    fn build_stream(&self, buffer: Arc<Mutex<Vec<f32>>>, failed: Arc<AtomicBool>) -> Result<Stream> {
        let on_error = move |err: cpal::StreamError| {
            error!("Input stream error: {}", err);
            failed.store(true, Ordering::SeqCst);
        };

        let stream = match self.sample_format {
            SampleFormat::F32 => self.device.build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut samples) = buffer.lock() {
                        samples.extend_from_slice(data);
                    }
                },
                on_error,
                None,
            ),
            SampleFormat::I16 => self.device.build_input_stream(
                &self.config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut samples) = buffer.lock() {
                        samples.extend(data.iter().map(|&s| s as f32 / 32768.0));
                    }
                },
                on_error,
                None,
            ),
            SampleFormat::U16 => self.device.build_input_stream(
                &self.config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut samples) = buffer.lock() {
                        samples.extend(data.iter().map(|&s| (s as f32 - 32768.0) / 32768.0));
                    }
                },
                on_error,
                None,
            ),
            other => {
                return Err(Error::Capture(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream.map_err(|e| Error::Capture(format!("Failed to build input stream: {}", e)))
    }
}

/// Record a clip on a blocking thread, reporting start and stop on `events`
pub async fn record_clip(
    device_name: Option<String>,
    max_duration: Duration,
    stop: CancellationToken,
    events: EventBus,
) -> Result<AudioClip> {
    tokio::task::spawn_blocking(move || {
        let recorder = Recorder::open(device_name.as_deref())?;
        events.emit_lossy(ClientEvent::RecordingStarted {
            device: recorder.device_name().to_string(),
            sample_rate: recorder.sample_rate(),
            timestamp: Utc::now(),
        });
        info!(device = %recorder.device_name(), "Recording (max {:?})", max_duration);

        let pcm = recorder.record(max_duration, &stop)?;

        let duration = pcm.duration();
        events.emit_lossy(ClientEvent::RecordingStopped {
            duration_ms: duration.as_millis() as u64,
            timestamp: Utc::now(),
        });
        info!("Recorded {:.1}s", duration.as_secs_f64());

        if pcm.is_empty() {
            return Err(Error::Capture("No audio was captured".to_string()));
        }
        Ok(AudioClip::Pcm(pcm))
    })
    .await
    .map_err(|e| Error::Capture(format!("Recording task failed: {}", e)))?
}
