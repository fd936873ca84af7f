use anyhow::Result;

/// On/off command issued by the controller toward the heating device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterCommand {
    TurnOn,
    TurnOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterState {
    On,
    Off,
}

/// Vendor-neutral view of the heating device.
///
/// The controller only depends on this trait; each supported vendor supplies
/// its own implementation translating commands into vendor API calls.
/// Commands carry the current setpoint because some vendors regulate to a
/// temperature rather than switching a relay.
pub trait DeviceActuator {
    /// Last known on/off state of the device.
    fn read_state(&self) -> HeaterState;

    /// Issue a command, best effort. Failures are not retried.
    fn apply_command(&mut self, command: HeaterCommand, setpoint_c: f32) -> Result<()>;
}
