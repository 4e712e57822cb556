//! Fixed-cadence control loop
//!
//! Each cycle: drain operator events, read a frame, refresh detections on
//! every `detection_interval`-th cycle, resolve identities against the store,
//! step the autopilot, enroll if requested, then send the command. Identities
//! are resolved before any enrollment in the same cycle, so a new sample is
//! first matched on the following cycle.

use crate::config::{ControlConfig, PilotConfig};
use crate::input::{KeyState, OperatorEvent};
use crate::PilotError;
use camera_capture::{FrameSource, VideoFrame};
use face_id::{BoundingBox, EnrollOutcome, FaceRecognizer, FaceStore, RawFace};
use servo::Autopilot;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use vehicle_link::{VehicleConfig, VehicleLink};

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitReason {
    #[default]
    Quit,
    /// Video stream ended or failed
    StreamLost,
}

/// Session counters, logged at shutdown
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub cycles: u64,
    pub detection_passes: u64,
    /// Cycles that ended with the target reached
    pub reached_cycles: u64,
    pub enrolled: u64,
    pub rejected: u64,
    pub exit: ExitReason,
}

enum Flow {
    Continue,
    Exit(ExitReason),
}

pub struct ControlLoop<S, L, R> {
    control: ControlConfig,
    vehicle: VehicleConfig,
    frame_size: (u32, u32),
    source: S,
    link: L,
    recognizer: R,
    store: FaceStore,
    autopilot: Autopilot,
    /// Raw faces from the last detection pass, reused on skipped cycles
    cached: Vec<RawFace>,
    airborne: bool,
    summary: SessionSummary,
}

impl<S, L, R> ControlLoop<S, L, R>
where
    S: FrameSource,
    L: VehicleLink,
    R: FaceRecognizer,
{
    /// Build the loop and open the face store. The vehicle is not touched yet.
    pub fn new(config: &PilotConfig, source: S, link: L, mut recognizer: R) -> Result<Self, PilotError> {
        config.validate()?;
        let store = FaceStore::open(config.store.clone(), &mut recognizer)?;
        let autopilot = Autopilot::new(config.servo.clone())?;
        let frame = config.servo.frame;

        Ok(Self {
            control: config.control.clone(),
            vehicle: config.vehicle.clone(),
            frame_size: (frame.width as u32, frame.height as u32),
            source,
            link,
            recognizer,
            store,
            autopilot,
            cached: Vec::new(),
            airborne: false,
            summary: SessionSummary::default(),
        })
    }

    pub fn store(&self) -> &FaceStore {
        &self.store
    }

    pub fn autopilot(&self) -> &Autopilot {
        &self.autopilot
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Bring up the vehicle, run until quit or stream loss, then shut down.
    ///
    /// Setup refusals abort before the first cycle.
    pub async fn run(&mut self, events: &mut mpsc::Receiver<OperatorEvent>) -> Result<SessionSummary, PilotError> {
        vehicle_link::initialize(&mut self.link, &self.vehicle).map_err(PilotError::Setup)?;

        let period = Duration::from_secs_f64(1.0 / f64::from(self.control.fps));
        info!(
            "Control loop running at {} fps, detection every {} cycles",
            self.control.fps, self.control.detection_interval
        );

        loop {
            let started = Instant::now();
            if let Flow::Exit(reason) = self.cycle(events) {
                self.summary.exit = reason;
                break;
            }
            if let Some(remaining) = period.checked_sub(started.elapsed()) {
                tokio::time::sleep(remaining).await;
            }
        }

        self.shutdown();
        Ok(self.summary.clone())
    }

    fn cycle(&mut self, events: &mut mpsc::Receiver<OperatorEvent>) -> Flow {
        let Some(keys) = self.drain_events(events) else {
            info!("Quit requested");
            return Flow::Exit(ExitReason::Quit);
        };

        let frame = match self.source.read() {
            Ok(Some(frame)) => self.fit_frame(frame),
            Ok(None) => {
                warn!("Video stream ended");
                return Flow::Exit(ExitReason::StreamLost);
            }
            Err(e) => {
                error!("Video stream lost: {}", e);
                return Flow::Exit(ExitReason::StreamLost);
            }
        };

        if self.summary.cycles % u64::from(self.control.detection_interval) == 0 {
            self.detect(&frame);
        }

        let detections = self.store.known().label_faces(&self.cached);
        let output = self.autopilot.step(&detections, keys.to_input());
        if output.reached() {
            self.summary.reached_cycles += 1;
        }

        if let Some(bbox) = output.enroll {
            self.enroll(&frame, &bbox);
        }

        let (lr, fb, ud, yaw) = output.command.as_tuple();
        if let Err(e) = self.link.send_velocity(lr, fb, ud, yaw) {
            warn!("Failed to send command {}: {}", output.command, e);
        }

        self.summary.cycles += 1;
        Flow::Continue
    }

    /// Apply pending operator events. Returns `None` on quit or once the
    /// input channel has closed and drained.
    fn drain_events(&mut self, events: &mut mpsc::Receiver<OperatorEvent>) -> Option<KeyState> {
        let mut keys = KeyState::default();
        loop {
            let event = match events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => return Some(keys),
                Err(TryRecvError::Disconnected) => {
                    warn!("Operator input closed");
                    return None;
                }
            };
            debug!("Operator event {:?}", event);

            match event {
                OperatorEvent::Quit => return None,
                OperatorEvent::Takeoff => self.takeoff(),
                OperatorEvent::Land => self.land(),
                OperatorEvent::Manual(key) => keys.press(key),
                other => {
                    if let Some(request) = other.mode_request() {
                        self.autopilot.request(request);
                    }
                }
            }
        }
    }

    fn takeoff(&mut self) {
        match self.link.takeoff() {
            Ok(()) => {
                self.airborne = true;
                info!("Takeoff");
                self.log_battery();
            }
            Err(e) => warn!("Takeoff failed: {}", e),
        }
    }

    fn land(&mut self) {
        match self.link.land() {
            Ok(()) => {
                self.airborne = false;
                info!("Landed");
            }
            Err(e) => warn!("Land failed: {}", e),
        }
    }

    fn log_battery(&mut self) {
        match self.link.battery() {
            Ok(level) => info!("Battery: {}%", level),
            Err(e) => warn!("Battery query failed: {}", e),
        }
    }

    /// Bring frames to the controller's reference size
    fn fit_frame(&self, frame: VideoFrame) -> VideoFrame {
        let (width, height) = self.frame_size;
        if frame.width == width && frame.height == height {
            frame
        } else {
            frame.resize(width, height)
        }
    }

    /// Refresh the cached faces. A failed pass counts as no faces.
    fn detect(&mut self, frame: &VideoFrame) {
        self.summary.detection_passes += 1;
        let scale = self.control.detection_scale;
        let small;
        let input = if scale < 1.0 {
            small = frame.scale(scale);
            &small
        } else {
            frame
        };

        let faces = match self.recognizer.detect(input) {
            Ok(faces) => faces,
            Err(e) => {
                warn!("Detection failed: {}", e);
                Vec::new()
            }
        };

        let inverse = 1.0 / f64::from(scale);
        self.cached = faces
            .into_iter()
            .filter_map(|face| match face.bbox.rescale(inverse) {
                Ok(bbox) => Some(RawFace {
                    bbox,
                    embedding: face.embedding,
                }),
                Err(e) => {
                    debug!("Dropping degenerate face: {}", e);
                    None
                }
            })
            .collect();
        debug!("Detection pass found {} faces", self.cached.len());
    }

    fn enroll(&mut self, frame: &VideoFrame, bbox: &BoundingBox) {
        match self.store.enroll(frame, bbox, &mut self.recognizer) {
            Ok(EnrollOutcome::Promoted(label)) => {
                self.summary.enrolled += 1;
                info!("Enrollment promoted {} ({} known)", label, self.store.len());
            }
            Ok(EnrollOutcome::Rejected) => {
                self.summary.rejected += 1;
                info!("Enrollment rejected");
            }
            Err(e) => {
                self.summary.rejected += 1;
                warn!("Enrollment failed: {}", e);
            }
        }
    }

    /// Stop the stream, land if needed, report battery and release the link
    fn shutdown(&mut self) {
        info!("Shutting down");
        if let Err(e) = self.link.stream_off() {
            warn!("Failed to stop video stream: {}", e);
        }
        self.source.stop();
        if self.airborne {
            self.land();
        }
        self.log_battery();
        self.link.end();

        let s = &self.summary;
        info!(
            "Session: {} cycles, {} detection passes, {} cycles at target, {} enrolled, {} rejected, exit {:?}",
            s.cycles, s.detection_passes, s.reached_cycles, s.enrolled, s.rejected, s.exit
        );
    }
}
