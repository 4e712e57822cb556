//! Vehicle Link
//!
//! Contract for the command/telemetry channel to the aircraft, plus a
//! recording mock and a dry-run wrapper. Velocity commands are four signed
//! axes in the vehicle's native range; the link does not clamp them.

mod dry_run;
mod error;
mod mock;

pub use dry_run::DryRunLink;
pub use error::LinkError;
pub use mock::MockVehicle;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Vehicle link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Speed setting sent during setup (cm/s)
    pub speed: u32,
    /// Log takeoff, land and velocity commands instead of sending them
    pub dry_run: bool,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            speed: 10,
            dry_run: false,
        }
    }
}

/// Command/telemetry channel to the vehicle
pub trait VehicleLink {
    fn connect(&mut self) -> Result<(), LinkError>;

    fn set_speed(&mut self, speed: u32) -> Result<(), LinkError>;

    fn stream_on(&mut self) -> Result<(), LinkError>;

    fn stream_off(&mut self) -> Result<(), LinkError>;

    /// Send one 4-axis velocity command
    fn send_velocity(
        &mut self,
        left_right: i32,
        forward_back: i32,
        up_down: i32,
        yaw: i32,
    ) -> Result<(), LinkError>;

    fn takeoff(&mut self) -> Result<(), LinkError>;

    fn land(&mut self) -> Result<(), LinkError>;

    /// Battery charge in percent
    fn battery(&mut self) -> Result<u8, LinkError>;

    /// Release the link. Always the last call.
    fn end(&mut self);
}

impl<L: VehicleLink + ?Sized> VehicleLink for Box<L> {
    fn connect(&mut self) -> Result<(), LinkError> {
        (**self).connect()
    }

    fn set_speed(&mut self, speed: u32) -> Result<(), LinkError> {
        (**self).set_speed(speed)
    }

    fn stream_on(&mut self) -> Result<(), LinkError> {
        (**self).stream_on()
    }

    fn stream_off(&mut self) -> Result<(), LinkError> {
        (**self).stream_off()
    }

    fn send_velocity(
        &mut self,
        left_right: i32,
        forward_back: i32,
        up_down: i32,
        yaw: i32,
    ) -> Result<(), LinkError> {
        (**self).send_velocity(left_right, forward_back, up_down, yaw)
    }

    fn takeoff(&mut self) -> Result<(), LinkError> {
        (**self).takeoff()
    }

    fn land(&mut self) -> Result<(), LinkError> {
        (**self).land()
    }

    fn battery(&mut self) -> Result<u8, LinkError> {
        (**self).battery()
    }

    fn end(&mut self) {
        (**self).end()
    }
}

/// Bring the link up: connect, set speed, reset and start the video stream.
///
/// Any refusal aborts setup. The stream is switched off first because a
/// previous session may have left it running.
pub fn initialize<L: VehicleLink + ?Sized>(link: &mut L, config: &VehicleConfig) -> Result<(), LinkError> {
    info!("Initializing vehicle link");
    link.connect()?;
    link.set_speed(config.speed)?;
    link.stream_off()?;
    link.stream_on()?;
    info!("Vehicle link ready (speed {})", config.speed);
    Ok(())
}
