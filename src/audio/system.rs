//! System audio capture (the other side of the call).
//!
//! PipeWire/PulseAudio expose the system output as "monitor" input devices;
//! we look for one via cpal. When none is available the source still starts
//! and simply returns no samples; system audio is best-effort.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use super::source::CaptureSource;

pub struct SystemSource {
    capture: Option<MonitorCapture>,
    samples: Arc<Mutex<Vec<f32>>>,
    active: bool,
    target_sample_rate: u32,
}

struct MonitorCapture {
    stream: cpal::Stream,
    actual_sample_rate: u32,
}

impl SystemSource {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            capture: None,
            samples: Arc::new(Mutex::new(Vec::new())),
            active: false,
            target_sample_rate: sample_rate,
        }
    }

    /// Find a PipeWire/PulseAudio monitor source via cpal.
    fn find_monitor_device() -> Option<(cpal::Device, u32)> {
        let host = cpal::default_host();

        for device in host.input_devices().ok()? {
            if let Ok(name) = device.name() {
                if name.to_lowercase().contains("monitor") {
                    if let Ok(default_config) = device.default_input_config() {
                        let sample_rate = default_config.sample_rate().0;
                        info!("Found system audio monitor: {} ({}Hz)", name, sample_rate);
                        return Some((device, sample_rate));
                    }
                }
            }
        }

        None
    }
}

impl CaptureSource for SystemSource {
    fn start(&mut self) -> Result<()> {
        if self.active {
            return Err(anyhow::anyhow!("System audio source already recording"));
        }

        {
            let mut samples = self.samples.lock().unwrap();
            samples.clear();
            samples.shrink_to_fit();
        }

        if let Some((device, actual_sample_rate)) = Self::find_monitor_device() {
            let config = cpal::StreamConfig {
                channels: 1,
                sample_rate: cpal::SampleRate(actual_sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let samples_clone = self.samples.clone();
            let err_fn = |err| error!("System audio stream error: {}", err);

            match device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut samples) = samples_clone.lock() {
                        samples.extend_from_slice(data);
                    }
                },
                err_fn,
                None,
            ) {
                Ok(stream) => {
                    stream
                        .play()
                        .context("Failed to start system audio stream")?;
                    self.capture = Some(MonitorCapture {
                        stream,
                        actual_sample_rate,
                    });
                    self.active = true;
                    info!("System audio capture started via monitor source");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Failed to build system audio stream: {}", e);
                }
            }
        }

        warn!(
            "No system audio monitor source found. \
             Recording will rely on the remaining sources."
        );
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<f32>> {
        if !self.active {
            return Err(anyhow::anyhow!("System audio source not recording"));
        }

        if let Some(capture) = self.capture.take() {
            debug!("Stopping system audio stream");
            drop(capture.stream);
        }

        self.active = false;

        let samples = {
            let mut guard = self.samples.lock().unwrap();
            let s = guard.clone();
            guard.clear();
            guard.shrink_to_fit();
            s
        };

        info!("System audio stopped, {} samples captured", samples.len());
        Ok(samples)
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn sample_rate(&self) -> u32 {
        if let Some(capture) = &self.capture {
            return capture.actual_sample_rate;
        }
        self.target_sample_rate
    }
}

impl Drop for SystemSource {
    fn drop(&mut self) {
        if self.active {
            debug!("Dropping active SystemSource, cleaning up");
            let _ = self.stop();
        }
    }
}
