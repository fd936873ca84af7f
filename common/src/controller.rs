use tracing::{info, warn};

use crate::actuator::{DeviceActuator, HeaterCommand, HeaterState};
use crate::config::{
    ClimateSettings, MAX_TARGET_C, MAX_TOLERANCE_C, MIN_TARGET_C, MIN_TOLERANCE_C,
};
use crate::types::{
    CommandError, ControllerStatePayload, ControllerStatus, HvacAction, HvacMode, PresetMode,
};

/// Dead-band thermostat: turns the heater on when the room falls
/// `cold_tolerance` below target and off when it rises `hot_tolerance`
/// above. Between the two thresholds the heater keeps whatever state it has,
/// which is what prevents on/off oscillation.
///
/// One instance drives one device. Callers serialize access (the service
/// keeps the controller behind a mutex), so an evaluation can never overlap
/// another.
pub struct HeatingController {
    settings: ClimateSettings,
    actuator: Box<dyn DeviceActuator + Send>,

    current_temp_c: Option<f32>,
    active: bool,
    device_active: bool,
    action: HvacAction,
    preset: PresetMode,
    saved_target_c: Option<f32>,
}

impl HeatingController {
    pub fn new(mut settings: ClimateSettings, actuator: Box<dyn DeviceActuator + Send>) -> Self {
        settings.sanitize();
        let device_active = actuator.read_state() == HeaterState::On;
        Self {
            settings,
            actuator,
            current_temp_c: None,
            active: false,
            device_active,
            action: if device_active {
                HvacAction::Heating
            } else {
                HvacAction::Off
            },
            preset: PresetMode::None,
            saved_target_c: None,
        }
    }

    pub fn settings(&self) -> &ClimateSettings {
        &self.settings
    }

    pub fn current_temp_c(&self) -> Option<f32> {
        self.current_temp_c
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_device_active(&self) -> bool {
        self.device_active
    }

    pub fn hvac_action(&self) -> HvacAction {
        self.action
    }

    pub fn preset(&self) -> PresetMode {
        self.preset
    }

    /// A vetted sensor reading arrived.
    pub fn on_sensor_update(&mut self, temp_c: f32) {
        self.current_temp_c = Some(temp_c);
        self.evaluate();
    }

    /// Decide whether the heater needs to change state.
    ///
    /// Without a current reading nothing happens and the controller stays
    /// inactive. The first evaluation with a reading flips `active` for the
    /// lifetime of the controller; target temperature is always known since
    /// it is defaulted at construction.
    pub fn evaluate(&mut self) {
        let Some(current) = self.current_temp_c else {
            return;
        };
        let target = self.settings.target_temp_c;

        if !self.active {
            self.active = true;
            info!("obtained current ({current}) and target ({target}) temperature, controller active");
        }

        if self.settings.mode == HvacMode::Off {
            return;
        }

        let too_cold = target - current >= self.settings.cold_tolerance_c;
        let too_hot = current - target >= self.settings.hot_tolerance_c;

        self.device_active = self.actuator.read_state() == HeaterState::On;
        if self.device_active {
            if too_hot {
                info!("turning heater off at {current} (target {target})");
                self.apply(HeaterCommand::TurnOff);
            }
        } else if too_cold {
            info!("turning heater on at {current} (target {target})");
            self.apply(HeaterCommand::TurnOn);
        }
    }

    pub fn set_target_temperature(&mut self, target_c: f32) {
        let clamped = if target_c.is_finite() {
            target_c.clamp(MIN_TARGET_C, MAX_TARGET_C)
        } else {
            self.settings.target_temp_c
        };
        self.settings.target_temp_c = clamped;
        // A manual setpoint ends any preset.
        self.preset = PresetMode::None;
        self.saved_target_c = None;
        self.evaluate();
    }

    pub fn set_tolerances(&mut self, cold_c: f32, hot_c: f32) {
        self.settings.cold_tolerance_c = cold_c.clamp(MIN_TOLERANCE_C, MAX_TOLERANCE_C);
        self.settings.hot_tolerance_c = hot_c.clamp(MIN_TOLERANCE_C, MAX_TOLERANCE_C);
        self.evaluate();
    }

    pub fn set_mode(&mut self, mode: HvacMode) {
        match mode {
            HvacMode::Off => {
                self.device_active = self.actuator.read_state() == HeaterState::On;
                if self.device_active {
                    info!("mode off, turning heater off");
                    self.apply(HeaterCommand::TurnOff);
                }
                self.settings.mode = HvacMode::Off;
            }
            HvacMode::Heat => {
                self.settings.mode = HvacMode::Heat;
                self.evaluate();
            }
        }
    }

    /// Switch to a preset setpoint. `PresetMode::None` restores the target
    /// that was in effect before the first preset was applied.
    pub fn set_preset(&mut self, preset: PresetMode) -> Result<(), CommandError> {
        if preset == self.preset {
            return Ok(());
        }

        match preset {
            PresetMode::None => {
                if let Some(saved) = self.saved_target_c.take() {
                    self.settings.target_temp_c = saved;
                }
                self.preset = PresetMode::None;
            }
            other => {
                let Some(temp) = self.settings.presets.temperature_for(other) else {
                    return Err(CommandError::UnsupportedPreset(other.as_str()));
                };
                if self.preset == PresetMode::None {
                    self.saved_target_c = Some(self.settings.target_temp_c);
                }
                self.settings.target_temp_c = temp;
                self.preset = other;
            }
        }

        self.evaluate();
        Ok(())
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            current_temp: self.current_temp_c,
            target_temp: self.settings.target_temp_c,
            cold_tolerance: self.settings.cold_tolerance_c,
            hot_tolerance: self.settings.hot_tolerance_c,
            mode: self.settings.mode.as_str(),
            action: self.action.as_str(),
            preset: self.preset.as_str(),
            heater_on: self.device_active,
            active: self.active,
        }
    }

    pub fn state_payload(&self) -> ControllerStatePayload {
        ControllerStatePayload {
            temp: self.current_temp_c,
            target: self.settings.target_temp_c,
            mode: self.settings.mode.as_str(),
            action: self.action.as_str(),
            preset: self.preset.as_str(),
            heater: self.device_active,
        }
    }

    fn apply(&mut self, command: HeaterCommand) {
        if let Err(err) = self
            .actuator
            .apply_command(command, self.settings.target_temp_c)
        {
            // No retry; the next evaluation re-reads the device state.
            warn!("heater command failed: {err:#}");
        }
        self.device_active = command == HeaterCommand::TurnOn;
        self.action = if self.device_active {
            HvacAction::Heating
        } else {
            HvacAction::Off
        };
    }
}
