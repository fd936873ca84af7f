use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::actuator::{DeviceActuator, HeaterCommand, HeaterState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorKind {
    ElectricalHeater,
    SmartThermostat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatingLevel {
    Comfort,
    Eco,
    Off,
}

/// A single call against the vendor device API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum VendorAction {
    /// `setHeatingLevel` on an on/off electrical heater.
    SetHeatingLevel { level: HeatingLevel },
    /// `setDerogation` to a temperature setpoint, held until further notice.
    SetTemperatureDerogation { temperature_c: f32 },
    /// `setDerogation` into the frost-guard program, held until further notice.
    SetFrostGuardDerogation,
    /// `setModeTemperature` for the frost-guard program.
    SetFrostGuardTemperature { temperature_c: f32 },
}

/// Where vendor actions go. The Tahoma/Somfy API client hooks in here; the
/// actions are fire-and-forget, a failed send is never retried.
pub trait CommandSink {
    fn send(&mut self, action: VendorAction) -> Result<()>;
}

/// Sink that records actions in the log only. Stands in for a real API
/// client on hosts without one configured.
#[derive(Debug, Clone)]
pub struct LogCommandSink {
    device_label: String,
}

impl LogCommandSink {
    pub fn new(device_label: impl Into<String>) -> Self {
        Self {
            device_label: device_label.into(),
        }
    }
}

impl CommandSink for LogCommandSink {
    fn send(&mut self, action: VendorAction) -> Result<()> {
        info!(device = %self.device_label, ?action, "vendor action");
        Ok(())
    }
}

/// Tahoma `io` electrical heater: heating is switched by picking a heating
/// level, `comfort` for on and `off` for off. The setpoint is regulated by
/// the controller itself, so it never reaches the device.
pub struct ElectricalHeaterActuator<S> {
    sink: S,
    heating: bool,
}

impl<S: CommandSink> ElectricalHeaterActuator<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            heating: false,
        }
    }
}

impl<S: CommandSink> DeviceActuator for ElectricalHeaterActuator<S> {
    fn read_state(&self) -> HeaterState {
        if self.heating {
            HeaterState::On
        } else {
            HeaterState::Off
        }
    }

    fn apply_command(&mut self, command: HeaterCommand, _setpoint_c: f32) -> Result<()> {
        let level = match command {
            HeaterCommand::TurnOn => HeatingLevel::Comfort,
            HeaterCommand::TurnOff => HeatingLevel::Off,
        };
        self.sink.send(VendorAction::SetHeatingLevel { level })?;
        self.heating = command == HeaterCommand::TurnOn;
        Ok(())
    }
}

/// Somfy smart thermostat: both commands are expressed as a derogation at
/// the current setpoint. Setpoints below the frost-protection ceiling use
/// the dedicated frost-guard program and carry their temperature separately.
pub struct SmartThermostatActuator<S> {
    sink: S,
    frost_protection_max_c: f32,
    derogation_active: bool,
}

impl<S: CommandSink> SmartThermostatActuator<S> {
    pub fn new(sink: S, frost_protection_max_c: f32) -> Self {
        Self {
            sink,
            frost_protection_max_c,
            derogation_active: false,
        }
    }
}

impl<S: CommandSink> DeviceActuator for SmartThermostatActuator<S> {
    fn read_state(&self) -> HeaterState {
        if self.derogation_active {
            HeaterState::On
        } else {
            HeaterState::Off
        }
    }

    fn apply_command(&mut self, command: HeaterCommand, setpoint_c: f32) -> Result<()> {
        if setpoint_c < self.frost_protection_max_c {
            self.sink.send(VendorAction::SetFrostGuardDerogation)?;
            self.sink.send(VendorAction::SetFrostGuardTemperature {
                temperature_c: setpoint_c,
            })?;
        } else {
            self.sink.send(VendorAction::SetTemperatureDerogation {
                temperature_c: setpoint_c,
            })?;
        }
        self.derogation_active = command == HeaterCommand::TurnOn;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;

    /// Sink that records every action for assertions.
    #[derive(Debug, Clone, Default)]
    struct RecordingSink {
        actions: Arc<Mutex<Vec<VendorAction>>>,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<VendorAction> {
            self.actions.lock().unwrap().clone()
        }
    }

    impl CommandSink for RecordingSink {
        fn send(&mut self, action: VendorAction) -> Result<()> {
            self.actions.lock().unwrap().push(action);
            Ok(())
        }
    }

    #[test]
    fn electrical_heater_maps_commands_to_heating_levels() {
        let sink = RecordingSink::default();
        let mut actuator = ElectricalHeaterActuator::new(sink.clone());

        actuator
            .apply_command(HeaterCommand::TurnOn, 21.0)
            .unwrap();
        assert_eq!(actuator.read_state(), HeaterState::On);

        actuator
            .apply_command(HeaterCommand::TurnOff, 21.0)
            .unwrap();
        assert_eq!(actuator.read_state(), HeaterState::Off);

        assert_eq!(
            sink.sent(),
            vec![
                VendorAction::SetHeatingLevel {
                    level: HeatingLevel::Comfort
                },
                VendorAction::SetHeatingLevel {
                    level: HeatingLevel::Off
                },
            ]
        );
    }

    #[test]
    fn smart_thermostat_derogates_at_the_setpoint() {
        let sink = RecordingSink::default();
        let mut actuator = SmartThermostatActuator::new(sink.clone(), 15.0);

        actuator
            .apply_command(HeaterCommand::TurnOn, 21.0)
            .unwrap();

        assert_eq!(actuator.read_state(), HeaterState::On);
        assert_eq!(
            sink.sent(),
            vec![VendorAction::SetTemperatureDerogation { temperature_c: 21.0 }]
        );
    }

    #[test]
    fn smart_thermostat_uses_frost_guard_below_threshold() {
        let sink = RecordingSink::default();
        let mut actuator = SmartThermostatActuator::new(sink.clone(), 15.0);

        actuator
            .apply_command(HeaterCommand::TurnOn, 8.0)
            .unwrap();

        assert_eq!(
            sink.sent(),
            vec![
                VendorAction::SetFrostGuardDerogation,
                VendorAction::SetFrostGuardTemperature { temperature_c: 8.0 },
            ]
        );
    }

    #[test]
    fn smart_thermostat_turn_off_still_reports_off() {
        let sink = RecordingSink::default();
        let mut actuator = SmartThermostatActuator::new(sink, 15.0);

        actuator
            .apply_command(HeaterCommand::TurnOn, 21.0)
            .unwrap();
        actuator
            .apply_command(HeaterCommand::TurnOff, 21.0)
            .unwrap();

        assert_eq!(actuator.read_state(), HeaterState::Off);
    }
}
