//! Visual Servoing Controller
//!
//! Pure per-cycle control for the face follower:
//! - Target selection over labelled detections
//! - Proportional approach (yaw, vertical, forward) with aim/depth tests
//! - No-target search (hold, recover, scan)
//! - Mode arbitration between autonomous, manual override and enrollment
//!
//! No I/O and no clock: the caller feeds detections and operator input and
//! sends the returned command.

pub mod approach;
pub mod command;
pub mod config;
pub mod mode;
pub mod search;
pub mod selector;
pub mod state;

pub use approach::{normalize, ApproachController, ApproachOutput};
pub use command::VelocityCommand;
pub use config::{ApproachConfig, FrameConfig, ManualConfig, SearchConfig, ServoConfig};
pub use mode::{AxisInput, ManualInput, ModeChange, ModeRequest, ModeSupervisor};
pub use search::{SearchAction, SearchPolicy, SearchState};
pub use selector::{Selection, TargetSelector};
pub use state::{Mode, SearchDirection, TrackState};

use face_id::{BoundingBox, Detection};
use thiserror::Error;
use tracing::debug;

/// Servo error types
#[derive(Error, Debug)]
pub enum ServoError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Everything decided in one control cycle
#[derive(Debug, Clone, Default)]
pub struct CycleOutput {
    /// Command to send this cycle, already clamped
    pub command: VelocityCommand,
    pub mode: Mode,
    pub mode_change: Option<ModeChange>,
    /// Detection acted on, if any
    pub target: Option<Detection>,
    pub approach: Option<ApproachOutput>,
    pub search: Option<SearchAction>,
    /// Unknown face reached in enroll mode: crop this box and enroll it
    pub enroll: Option<BoundingBox>,
}

impl CycleOutput {
    pub fn reached(&self) -> bool {
        self.approach.is_some_and(|a| a.reached())
    }
}

/// Composes selection, approach, search and mode arbitration
pub struct Autopilot {
    config: ServoConfig,
    selector: TargetSelector,
    approach: ApproachController,
    search: SearchPolicy,
    supervisor: ModeSupervisor,
    state: TrackState,
    command: VelocityCommand,
}

impl Autopilot {
    pub fn new(config: ServoConfig) -> Result<Self, ServoError> {
        config.validate()?;
        Ok(Self {
            selector: TargetSelector::new(),
            approach: ApproachController::new(&config),
            search: SearchPolicy::new(config.search.clone()),
            supervisor: ModeSupervisor::new(config.manual.clone(), config.target()),
            state: TrackState::default(),
            command: VelocityCommand::HOLD,
            config,
        })
    }

    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    pub fn state(&self) -> &TrackState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Last command produced
    pub fn command(&self) -> VelocityCommand {
        self.command
    }

    pub fn target_name(&self) -> Option<&str> {
        self.supervisor.target_name()
    }

    pub fn search_state(&self) -> Option<SearchState> {
        self.search.state()
    }

    /// Queue a mode or target request; applied at the next `step`
    pub fn request(&mut self, request: ModeRequest) {
        self.supervisor.request(request);
    }

    /// Run one control cycle
    pub fn step(&mut self, detections: &[Detection], manual: ManualInput) -> CycleOutput {
        let mode_change = self.supervisor.begin_cycle(&mut self.state, &mut self.command);
        let mut output = CycleOutput {
            mode: self.state.mode,
            mode_change,
            ..Default::default()
        };

        match self.state.mode {
            Mode::ManualOverride => {
                self.state.locked = false;
                self.command = self.supervisor.manual_command(manual);
            }
            Mode::Autonomous | Mode::Enroll => {
                let selection = self.selector.select(
                    detections,
                    self.state.mode,
                    self.supervisor.target_name(),
                );
                match selection.target {
                    Some(target) => {
                        self.search.on_target(&mut self.state);
                        self.state.locked = true;
                        let approach = self.approach.apply(&target.bbox, &mut self.command);
                        self.state.observe_offset(approach.horizontal_error);

                        if self.state.mode == Mode::Enroll && approach.reached() && target.label.is_unknown() {
                            output.enroll = Some(target.bbox);
                        }
                        debug!(
                            "target {} at {:?} reached={}",
                            target.label,
                            target.bbox.center(),
                            approach.reached()
                        );
                        output.target = Some(target.clone());
                        output.approach = Some(approach);
                    }
                    None => {
                        output.search = Some(self.search.on_miss(&mut self.state, &mut self.command));
                    }
                }
            }
        }

        self.command = self.command.clamped(self.config.command_limit);
        output.command = self.command;
        output
    }
}
