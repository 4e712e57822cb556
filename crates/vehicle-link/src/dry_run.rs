//! Dry-run wrapper: full loop, no motion

use crate::{LinkError, VehicleLink};
use tracing::{debug, info};

/// Passes setup and telemetry through to the inner link but only logs
/// takeoff, land and velocity commands.
pub struct DryRunLink<L> {
    inner: L,
    last_command: Option<(i32, i32, i32, i32)>,
}

impl<L: VehicleLink> DryRunLink<L> {
    pub fn new(inner: L) -> Self {
        info!("Dry run enabled: no flight commands will reach the vehicle");
        Self {
            inner,
            last_command: None,
        }
    }

    /// Most recent velocity command that would have been sent
    pub fn last_command(&self) -> Option<(i32, i32, i32, i32)> {
        self.last_command
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: VehicleLink> VehicleLink for DryRunLink<L> {
    fn connect(&mut self) -> Result<(), LinkError> {
        self.inner.connect()
    }

    fn set_speed(&mut self, speed: u32) -> Result<(), LinkError> {
        self.inner.set_speed(speed)
    }

    fn stream_on(&mut self) -> Result<(), LinkError> {
        self.inner.stream_on()
    }

    fn stream_off(&mut self) -> Result<(), LinkError> {
        self.inner.stream_off()
    }

    fn send_velocity(
        &mut self,
        left_right: i32,
        forward_back: i32,
        up_down: i32,
        yaw: i32,
    ) -> Result<(), LinkError> {
        debug!(
            "[dry run] rc lr={} fb={} ud={} yaw={}",
            left_right, forward_back, up_down, yaw
        );
        self.last_command = Some((left_right, forward_back, up_down, yaw));
        Ok(())
    }

    fn takeoff(&mut self) -> Result<(), LinkError> {
        info!("[dry run] takeoff suppressed");
        Ok(())
    }

    fn land(&mut self) -> Result<(), LinkError> {
        info!("[dry run] land suppressed");
        Ok(())
    }

    fn battery(&mut self) -> Result<u8, LinkError> {
        self.inner.battery()
    }

    fn end(&mut self) {
        self.inner.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockVehicle;

    #[test]
    fn test_flight_commands_are_not_forwarded() {
        let mut link = DryRunLink::new(MockVehicle::new());
        link.connect().unwrap();
        link.takeoff().unwrap();
        link.send_velocity(1, 2, 3, 4).unwrap();

        assert_eq!(link.last_command(), Some((1, 2, 3, 4)));
        assert!(!link.inner().is_airborne());
        assert!(link.inner().sent().is_empty());
    }

    #[test]
    fn test_setup_and_telemetry_pass_through() {
        let mut link = DryRunLink::new(MockVehicle::new().with_battery(64));
        link.connect().unwrap();
        link.stream_on().unwrap();
        assert!(link.inner().is_connected());
        assert!(link.inner().is_streaming());
        assert_eq!(link.battery().unwrap(), 64);

        let vehicle = link.into_inner();
        assert!(vehicle.is_streaming());
    }

    #[test]
    fn test_setup_refusal_still_surfaces() {
        let mut link = DryRunLink::new(MockVehicle::new().failing("connect"));
        assert!(link.connect().is_err());
    }
}
