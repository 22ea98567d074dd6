//! Audio Stream Management
//!
//! Wires the duplex microphone -> equalizer -> speaker path:
//!
//! ```text
//! Capture callback ──rtrb──▶ Output callback
//!                            │  pre-filter copy (if monitoring)
//!                            │  Equalizer::process_block (in place)
//!                            │  ObservationBuffer::push(pre, post)
//!                            ▼
//!                            device buffer
//! ```
//!
//! All processing happens inside the output callback, which must finish
//! before the block deadline. The only cross-thread primitive it touches is
//! the observation buffer's lock; events leave the callbacks via `try_send`
//! only.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig as CpalStreamConfig};
use crossbeam_channel::{unbounded, Receiver, Sender};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{error, warn};

use myna_dsp::Equalizer;

use crate::config::StreamConfig;
use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use crate::monitor::ObservationBuffer;

/// An active capture -> process -> playback session.
///
/// Both cpal streams are held for the lifetime of the session and released
/// on drop, on every exit path.
pub struct AudioStream {
    /// The underlying CPAL streams (kept alive to maintain audio flow)
    #[allow(dead_code)]
    capture_stream: Stream,

    #[allow(dead_code)]
    playback_stream: Stream,

    events: Receiver<Event>,

    /// Current stream configuration
    pub config: StreamConfig,
}

impl AudioStream {
    /// Open and start the duplex stream.
    ///
    /// The equalizer moves into the output callback; the optional
    /// observation buffer receives (pre, post) copies of every block. The
    /// devices must have been resolved by the caller - nothing here reads
    /// host defaults.
    pub fn open(
        config: StreamConfig,
        input_device: &Device,
        output_device: &Device,
        equalizer: Equalizer,
        monitor: Option<Arc<ObservationBuffer>>,
    ) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;

        let (event_sender, event_receiver) = unbounded::<Event>();

        // Ring buffer between the capture and output callbacks.
        // Size: 4x block size for safety margin
        let ring_size = config.frame_size as usize * 4;
        let (producer, consumer) = RingBuffer::<f32>::new(ring_size);

        let cpal_config = CpalStreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.frame_size),
        };

        let capture_stream =
            Self::build_capture_stream(input_device, &cpal_config, producer, event_sender.clone())?;

        let playback_stream = Self::build_playback_stream(
            output_device,
            &cpal_config,
            consumer,
            equalizer,
            monitor,
            event_sender,
        )?;

        capture_stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;
        playback_stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

        Ok(Self {
            capture_stream,
            playback_stream,
            events: event_receiver,
            config,
        })
    }

    /// Block until the device reports a stream error.
    ///
    /// Underruns, overruns and dropped blocks are logged and the stream
    /// keeps going; a device error ends the session without retry. The
    /// session also ends cleanly if both streams shut down on their own.
    pub fn run(&self) -> EngineResult<()> {
        loop {
            match self.events.recv() {
                Ok(Event::Error { message }) => {
                    error!("audio stream failed: {}", message);
                    return Err(EngineError::StreamFailed(message));
                }
                Ok(Event::BufferUnderrun) => {
                    warn!("output underrun - emitted a block of silence");
                }
                Ok(Event::BufferOverrun) => {
                    warn!("capture overrun - dropped captured samples");
                }
                Ok(Event::BlockDropped) => {
                    warn!("non-finite output block replaced with silence");
                }
                Err(_) => return Ok(()),
            }
        }
    }

    fn build_capture_stream(
        device: &Device,
        config: &CpalStreamConfig,
        mut producer: Producer<f32>,
        event_sender: Sender<Event>,
    ) -> EngineResult<Stream> {
        let err_sender = event_sender.clone();

        let stream = device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Real-time audio callback - NO allocations allowed here
                    let written = producer.write_chunk_uninit(data.len()).map_or(0, |mut chunk| {
                        let (first, second) = chunk.as_mut_slices();
                        let mut copied = 0;
                        for slot in first.iter_mut().chain(second.iter_mut()) {
                            slot.write(data[copied]);
                            copied += 1;
                        }
                        // Rust pattern: unsafe is required here because we're
                        // working with uninitialized memory for performance
                        unsafe { chunk.commit_all() };
                        copied
                    });

                    if written < data.len() {
                        // Output side is not draining fast enough
                        let _ = event_sender.try_send(Event::BufferOverrun);
                    }
                },
                move |err| {
                    let _ = err_sender.try_send(Event::error(err));
                },
                None, // No timeout
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

        Ok(stream)
    }

    fn build_playback_stream(
        device: &Device,
        config: &CpalStreamConfig,
        mut consumer: Consumer<f32>,
        mut equalizer: Equalizer,
        monitor: Option<Arc<ObservationBuffer>>,
        event_sender: Sender<Event>,
    ) -> EngineResult<Stream> {
        let err_sender = event_sender.clone();

        // Pre-filter copy for the observation buffer, reused across blocks.
        let mut pre_block: Vec<f32> = Vec::new();

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Drain one block of raw microphone samples from the ring
                    let available = consumer.slots();
                    let to_read = data.len().min(available);

                    if to_read < data.len() {
                        // Underrun - fill with silence
                        data.fill(0.0);
                        let _ = event_sender.try_send(Event::BufferUnderrun);
                    }

                    if let Ok(chunk) = consumer.read_chunk(to_read) {
                        let (first, second) = chunk.as_slices();
                        data[..first.len()].copy_from_slice(first);
                        if !second.is_empty() {
                            data[first.len()..first.len() + second.len()].copy_from_slice(second);
                        }
                        chunk.commit_all();
                    }

                    if monitor.is_some() {
                        pre_block.clear();
                        pre_block.extend_from_slice(data);
                    }

                    equalizer.process_block(data);

                    // A fault inside one block must not end the stream:
                    // replace non-finite output with silence and move on.
                    if data.iter().any(|s| !s.is_finite()) {
                        data.fill(0.0);
                        let _ = event_sender.try_send(Event::BlockDropped);
                    }

                    if let Some(buffer) = &monitor {
                        // Copies only - the buffer never sees the device slice
                        buffer.push(&pre_block, data);
                    }
                },
                move |err| {
                    let _ = err_sender.try_send(Event::error(err));
                },
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myna_dsp::design_chain;

    #[test]
    fn test_invalid_config_rejected_before_touching_devices() {
        // validate() runs before any cpal call, so a bogus config must fail
        // the same way with or without hardware.
        let config = StreamConfig {
            sample_rate: 100,
            frame_size: 1024,
        };
        assert!(config.validate().is_err());
    }

    // Hardware-dependent tests
    #[test]
    #[ignore = "requires audio hardware"]
    fn test_stream_open() {
        use crate::device::{resolve_input, resolve_output};

        let config = StreamConfig::default();
        let equalizer = Equalizer::new(design_chain(f64::from(config.sample_rate), &[]).unwrap());

        let input = resolve_input(None);
        let output = resolve_output(None);
        if let (Ok(input), Ok(output)) = (input, output) {
            let result = AudioStream::open(config, &input, &output, equalizer, None);
            // May fail if no audio hardware, which is fine for CI
            if let Ok(stream) = result {
                assert_eq!(stream.config.sample_rate, 44100);
            }
        }
    }
}
