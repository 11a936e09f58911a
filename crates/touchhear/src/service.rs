//! Background frame loop and the reader-facing handle.
//!
//! The loop thread is the only writer of detector state. Readers get the
//! newest [`DetectionResult`] through an `Arc` swap and annotated JPEG frames
//! through a single-slot, latest-wins buffer.

use crate::audio::AudioSink;
use crate::calibration::CalibrationState;
use crate::hands::FingertipDetector;
use crate::overlay::{encode_jpeg, render};
use crate::pipeline::{DetectionResult, FrameProcessor};
use crate::regions::RegionLayout;
use crate::sensor::{FrameSource, SensorError, SensorSession};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("sensor: {0}")]
    Sensor(#[from] SensorError),
    #[error("failed to spawn frame loop: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Frame loop timing and encoding knobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeParams {
    /// Bounded wait for each sensor frame.
    pub frame_timeout_ms: u64,
    pub jpeg_quality: u8,
}

impl Default for RuntimeParams {
    fn default() -> Self {
        Self {
            frame_timeout_ms: 100,
            jpeg_quality: 80,
        }
    }
}

impl RuntimeParams {
    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}

#[derive(Default)]
struct SlotState {
    seq: u64,
    frame: Option<Arc<[u8]>>,
    closed: bool,
}

/// Latest-frame-wins buffer; consumers wait on the condvar.
#[derive(Default)]
struct FrameSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl FrameSlot {
    fn publish(&self, jpeg: Vec<u8>) {
        let mut s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        s.seq += 1;
        s.frame = Some(Arc::from(jpeg));
        self.ready.notify_all();
    }

    fn close(&self) {
        let mut s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        s.closed = true;
        self.ready.notify_all();
    }

    /// Block until a frame newer than `after` exists or the slot closes.
    fn next_after(&self, after: u64) -> Option<(u64, Arc<[u8]>)> {
        let mut s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if s.seq > after {
                if let Some(frame) = &s.frame {
                    return Some((s.seq, frame.clone()));
                }
            }
            if s.closed {
                return None;
            }
            s = self.ready.wait(s).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

struct Shared {
    running: AtomicBool,
    latest: RwLock<Arc<DetectionResult>>,
    processor: Mutex<FrameProcessor>,
    frames: FrameSlot,
}

impl Shared {
    fn processor(&self) -> std::sync::MutexGuard<'_, FrameProcessor> {
        self.processor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a running detection loop. Dropping it stops the loop and
/// releases the sensor.
pub struct DetectorService {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl DetectorService {
    /// Start the sensor and spawn the frame loop.
    ///
    /// Sensor start failures are returned here; nothing is retried.
    pub fn start(
        source: Box<dyn FrameSource>,
        fingertips: Box<dyn FingertipDetector>,
        audio: Box<dyn AudioSink>,
        processor: FrameProcessor,
        runtime: RuntimeParams,
    ) -> Result<Self, ServiceError> {
        let session = SensorSession::start(source)?;
        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            latest: RwLock::new(Arc::new(DetectionResult::default())),
            processor: Mutex::new(processor),
            frames: FrameSlot::default(),
        });

        let worker = FrameLoop {
            shared: shared.clone(),
            session,
            fingertips,
            audio,
            runtime,
        };
        let handle = thread::Builder::new()
            .name("touchhear-frames".to_string())
            .spawn(move || worker.run())
            .map_err(|e| {
                shared.running.store(false, Ordering::Release);
                ServiceError::Spawn(e)
            })?;

        info!("detector service started");
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Newest snapshot; never blocks on the frame loop.
    pub fn latest_result(&self) -> Arc<DetectionResult> {
        self.shared
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A fresh stream of annotated JPEG frames.
    ///
    /// Yields the newest frame first, then blocks for each new one; ends
    /// once the loop stops.
    pub fn annotated_frames(&self) -> AnnotatedFrames {
        AnnotatedFrames {
            shared: self.shared.clone(),
            last_seq: 0,
        }
    }

    pub fn reset_calibration(&self) {
        self.shared.processor().reset_calibration();
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.shared.processor().calibrator().state().clone()
    }

    /// Replace the active project regions.
    pub fn set_layout(&self, layout: Option<RegionLayout>) {
        self.shared.processor().set_layout(layout);
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.shared.running.load(Ordering::Acquire)
    }

    /// Signal the loop, wait for it and release the sensor. Idempotent.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("frame loop panicked");
            }
            self.shared.frames.close();
            info!("detector service stopped");
        }
    }
}

impl Drop for DetectorService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Blocking iterator over annotated frames, see
/// [`DetectorService::annotated_frames`].
pub struct AnnotatedFrames {
    shared: Arc<Shared>,
    last_seq: u64,
}

impl Iterator for AnnotatedFrames {
    type Item = Arc<[u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        let (seq, frame) = self.shared.frames.next_after(self.last_seq)?;
        self.last_seq = seq;
        Some(frame)
    }
}

struct FrameLoop {
    shared: Arc<Shared>,
    session: SensorSession,
    fingertips: Box<dyn FingertipDetector>,
    audio: Box<dyn AudioSink>,
    runtime: RuntimeParams,
}

impl FrameLoop {
    fn run(mut self) {
        let timeout = self.runtime.frame_timeout();
        while self.shared.running.load(Ordering::Acquire) {
            let frame = match self.session.wait_for_frame(timeout) {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) => {
                    warn!("skipping frame: {e}");
                    thread::sleep(timeout);
                    continue;
                }
            };

            let tips = self.fingertips.detect(&frame.color);
            let output = self
                .shared
                .processor()
                .process(&frame, &tips, Instant::now());

            for trigger in &output.triggers {
                self.audio.play(trigger);
            }
            *self
                .shared
                .latest
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Arc::new(output.result);

            let annotated = render(&frame.color, &output.overlay);
            match encode_jpeg(&annotated, self.runtime.jpeg_quality) {
                Ok(jpeg) => self.shared.frames.publish(jpeg),
                Err(e) => warn!("annotated frame encoding failed: {e}"),
            }
        }
        debug!("frame loop exiting");
        self.session.stop();
        self.shared.frames.close();
    }
}
