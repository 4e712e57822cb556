//! Mock vehicle for testing (no hardware required)

use crate::{LinkError, VehicleLink};
use tracing::{debug, info};

/// Records every command it receives and answers from canned state
#[derive(Debug, Clone)]
pub struct MockVehicle {
    connected: bool,
    streaming: bool,
    airborne: bool,
    ended: bool,
    speed: Option<u32>,
    battery: u8,
    /// Command name that the mock refuses
    fail_on: Option<&'static str>,
    /// Sent velocity commands as (left_right, forward_back, up_down, yaw)
    sent: Vec<(i32, i32, i32, i32)>,
}

impl MockVehicle {
    /// Create a mock vehicle with a full battery
    pub fn new() -> Self {
        info!("Creating mock vehicle");
        Self {
            connected: false,
            streaming: false,
            airborne: false,
            ended: false,
            speed: None,
            battery: 100,
            fail_on: None,
            sent: Vec::new(),
        }
    }

    /// Refuse the named command (e.g. "connect", "stream_on")
    pub fn failing(mut self, command: &'static str) -> Self {
        self.fail_on = Some(command);
        self
    }

    pub fn with_battery(mut self, battery: u8) -> Self {
        self.battery = battery;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn speed(&self) -> Option<u32> {
        self.speed
    }

    /// All velocity commands received so far
    pub fn sent(&self) -> &[(i32, i32, i32, i32)] {
        &self.sent
    }

    fn check(&self, command: &'static str) -> Result<(), LinkError> {
        if self.fail_on == Some(command) {
            debug!("Mock refusing {}", command);
            return Err(LinkError::Rejected { command });
        }
        if command != "connect" && !self.connected {
            return Err(LinkError::NotConnected);
        }
        Ok(())
    }
}

impl Default for MockVehicle {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleLink for MockVehicle {
    fn connect(&mut self) -> Result<(), LinkError> {
        self.check("connect")?;
        self.connected = true;
        Ok(())
    }

    fn set_speed(&mut self, speed: u32) -> Result<(), LinkError> {
        self.check("set_speed")?;
        self.speed = Some(speed);
        Ok(())
    }

    fn stream_on(&mut self) -> Result<(), LinkError> {
        self.check("stream_on")?;
        self.streaming = true;
        Ok(())
    }

    fn stream_off(&mut self) -> Result<(), LinkError> {
        self.check("stream_off")?;
        self.streaming = false;
        Ok(())
    }

    fn send_velocity(
        &mut self,
        left_right: i32,
        forward_back: i32,
        up_down: i32,
        yaw: i32,
    ) -> Result<(), LinkError> {
        self.check("send_velocity")?;
        self.sent.push((left_right, forward_back, up_down, yaw));
        Ok(())
    }

    fn takeoff(&mut self) -> Result<(), LinkError> {
        self.check("takeoff")?;
        self.airborne = true;
        Ok(())
    }

    fn land(&mut self) -> Result<(), LinkError> {
        self.check("land")?;
        self.airborne = false;
        Ok(())
    }

    fn battery(&mut self) -> Result<u8, LinkError> {
        self.check("battery")?;
        Ok(self.battery)
    }

    fn end(&mut self) {
        self.connected = false;
        self.streaming = false;
        self.ended = true;
    }
}
