//! rodio-backed playback units: one [`Sink`] per unit on a shared output stream.

use std::fs::File;
use std::io::BufReader;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use log::{error, warn};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::error::BackendError;

use super::{PlaybackBackend, PlaybackUnit, UnitSignal};

const OUTPUT_STREAM_OPEN_RETRIES: usize = 5;
const OUTPUT_STREAM_OPEN_RETRY_MS: u64 = 100;
const TIME_UPDATE_INTERVAL_SECS: f64 = 0.25;

/// Backend owning the default output stream. Units stay audible only while it is alive.
///
/// Clones share the stream, so several engines can play through one device.
#[derive(Clone)]
pub struct RodioBackend {
    stream: Rc<OutputStream>,
}

impl RodioBackend {
    /// Open the default output stream with bounded retry behavior.
    ///
    /// # Errors
    /// Returns [`BackendError::OutputUnavailable`] once every attempt has failed.
    pub fn open_default() -> Result<Self, BackendError> {
        let mut last_error = String::new();
        for attempt in 1..=OUTPUT_STREAM_OPEN_RETRIES {
            match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => {
                    return Ok(Self {
                        stream: Rc::new(stream),
                    })
                }
                Err(err) => {
                    warn!(
                        "open_default_stream attempt {}/{} failed: {}",
                        attempt, OUTPUT_STREAM_OPEN_RETRIES, err
                    );
                    last_error = err.to_string();
                    if attempt < OUTPUT_STREAM_OPEN_RETRIES {
                        thread::sleep(Duration::from_millis(OUTPUT_STREAM_OPEN_RETRY_MS));
                    }
                }
            }
        }
        error!(
            "failed to open default output stream after {} attempts: {}",
            OUTPUT_STREAM_OPEN_RETRIES, last_error
        );
        Err(BackendError::OutputUnavailable(last_error))
    }
}

impl PlaybackBackend for RodioBackend {
    fn create_unit(
        &mut self,
        source: &str,
        looping: bool,
    ) -> Result<Box<dyn PlaybackUnit>, BackendError> {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        let mut unit = RodioUnit {
            sink,
            source: source.to_string(),
            looping,
            playing: false,
            last_reported: 0.0,
        };
        unit.load()?;
        Ok(Box::new(unit))
    }
}

/// A single rodio sink bound to one source file.
pub struct RodioUnit {
    sink: Sink,
    source: String,
    looping: bool,
    playing: bool,
    last_reported: f64,
}

impl RodioUnit {
    /// Decode the source and queue it on the sink.
    fn load(&mut self) -> Result<(), BackendError> {
        let file = File::open(&self.source).map_err(|err| BackendError::Source {
            source: self.source.clone(),
            reason: err.to_string(),
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|err| BackendError::Source {
            source: self.source.clone(),
            reason: err.to_string(),
        })?;
        if self.looping {
            self.sink.append(decoder.repeat_infinite());
        } else {
            self.sink.append(decoder);
        }
        self.last_reported = 0.0;
        Ok(())
    }
}

impl PlaybackUnit for RodioUnit {
    fn volume(&self) -> f32 {
        self.sink.volume()
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume.max(0.0));
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.sink.set_speed(rate);
    }

    fn play(&mut self) -> Result<(), BackendError> {
        if self.sink.empty() {
            self.load()?;
        }
        self.sink.play();
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
        self.playing = false;
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn current_time(&self) -> f64 {
        self.sink.get_pos().as_secs_f64()
    }

    fn set_current_time(&mut self, seconds: f64) {
        if self.sink.empty() {
            if let Err(err) = self.load() {
                warn!("cannot rewind {}: {}", self.source, err);
                return;
            }
            if seconds <= 0.0 {
                return;
            }
        }
        if let Err(err) = self.sink.try_seek(Duration::from_secs_f64(seconds.max(0.0))) {
            warn!("seek to {:.3}s failed for {}: {}", seconds, self.source, err);
        }
        self.last_reported = seconds.max(0.0);
    }

    fn remove(&mut self) {
        self.sink.stop();
        self.playing = false;
    }

    fn poll(&mut self) -> Option<UnitSignal> {
        if !self.playing || self.sink.is_paused() {
            return None;
        }
        if self.sink.empty() {
            self.playing = false;
            self.last_reported = 0.0;
            return Some(UnitSignal::Ended);
        }
        let seconds = self.sink.get_pos().as_secs_f64();
        if (seconds - self.last_reported).abs() >= TIME_UPDATE_INTERVAL_SECS {
            self.last_reported = seconds;
            return Some(UnitSignal::TimeUpdate { seconds });
        }
        None
    }
}
