//! Plays back a recorded landmark capture as if it came from a live camera.
//!
//! A capture is a JSON-lines file, one frame per line:
//!
//! ```text
//! {"time": 0.033, "hand": {"landmarks": [...], "world_landmarks": [...]}}
//! {"time": 0.066, "hand": null}
//! ```
//!
//! `time` is the playback timestamp in seconds. The extractor has already run, so the
//! matching `RecordedExtractor` just hands the stored hand back.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    time::Duration,
};

use serde::Deserialize;
use tokio::time::Instant;

use crate::{
    error::{FingerspellErr, Result},
    landmarks::Hand,
    sampler::{LandmarkExtractor, VideoSource},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayFrame {
    pub time: f64,
    pub hand: Option<Hand>,
}

/// A capture played back against the tokio clock.
#[derive(Debug)]
pub struct ReplaySource {
    frames: Vec<ReplayFrame>,
    started: Instant,
}

impl ReplaySource {
    /// Starts playback now.
    ///
    /// # Errors
    /// `Io` with `InvalidData` if the capture is empty or its timestamps go backwards.
    pub fn new(frames: Vec<ReplayFrame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(invalid("capture has no frames"));
        }
        if frames.windows(2).any(|w| w[1].time < w[0].time) {
            return Err(invalid("capture timestamps are not sorted"));
        }

        Ok(Self {
            frames,
            started: Instant::now(),
        })
    }

    /// Parses a JSON-lines capture, skipping blank lines.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut frames = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let frame = serde_json::from_str(&line)
                .map_err(|e| invalid(&format!("line {}: {e}", n + 1)))?;
            frames.push(frame);
        }

        Self::new(frames)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Length of the recording.
    pub fn duration(&self) -> Duration {
        // SAFETY: `new` rejects empty captures.
        let last = self.frames.last().unwrap();
        Duration::from_secs_f64(last.time.max(0.))
    }

    fn elapsed(&self) -> f64 {
        Instant::now().saturating_duration_since(self.started).as_secs_f64()
    }

    /// Index of the frame on display, `None` before the first one.
    fn position(&self) -> Option<usize> {
        let elapsed = self.elapsed();
        self.frames
            .partition_point(|f| f.time <= elapsed)
            .checked_sub(1)
    }
}

impl VideoSource for ReplaySource {
    type Frame = Option<Hand>;

    fn ready(&self) -> bool {
        self.position().is_some()
    }

    fn current_time(&self) -> f64 {
        self.position().map_or(0., |i| self.frames[i].time)
    }

    fn frame(&self) -> &Option<Hand> {
        &self.frames[self.position().unwrap_or(0)].hand
    }

    fn ended(&self) -> bool {
        self.elapsed() > self.duration().as_secs_f64()
    }
}

/// The extractor paired with `ReplaySource`, the landmarks were detected at record time.
pub struct RecordedExtractor;

impl LandmarkExtractor<Option<Hand>> for RecordedExtractor {
    fn detect(&mut self, frame: &Option<Hand>, _: Duration) -> Result<Option<Hand>> {
        Ok(frame.clone())
    }
}

fn invalid(msg: &str) -> FingerspellErr {
    FingerspellErr::Io(io::Error::new(io::ErrorKind::InvalidData, msg.to_string()))
}
