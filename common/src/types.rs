use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unrecognized hvac mode: {0:?}")]
    UnknownMode(String),
    #[error("unrecognized preset: {0:?}")]
    UnknownPreset(String),
    #[error("no temperature configured for preset '{0}'")]
    UnsupportedPreset(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HvacMode {
    Off,
    Heat,
}

impl HvacMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heat => "HEAT",
        }
    }
}

impl FromStr for HvacMode {
    type Err = CommandError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "HEAT" => Ok(Self::Heat),
            "OFF" => Ok(Self::Off),
            _ => Err(CommandError::UnknownMode(value.to_string())),
        }
    }
}

/// What the heater is currently doing, as opposed to what mode it is set to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HvacAction {
    Off,
    Heating,
}

impl HvacAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heating => "HEATING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetMode {
    None,
    Away,
    Eco,
    Comfort,
    FrostGuard,
}

impl PresetMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Away => "away",
            Self::Eco => "eco",
            Self::Comfort => "comfort",
            Self::FrostGuard => "frost_guard",
        }
    }
}

impl FromStr for PresetMode {
    type Err = CommandError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "away" => Ok(Self::Away),
            "eco" => Ok(Self::Eco),
            "comfort" => Ok(Self::Comfort),
            "frost_guard" => Ok(Self::FrostGuard),
            _ => Err(CommandError::UnknownPreset(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ControllerStatus {
    #[serde(rename = "currentTemp")]
    pub current_temp: Option<f32>,
    #[serde(rename = "targetTemp")]
    pub target_temp: f32,
    #[serde(rename = "coldTolerance")]
    pub cold_tolerance: f32,
    #[serde(rename = "hotTolerance")]
    pub hot_tolerance: f32,
    pub mode: &'static str,
    pub action: &'static str,
    pub preset: &'static str,
    #[serde(rename = "heaterOn")]
    pub heater_on: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControllerStatePayload {
    pub temp: Option<f32>,
    pub target: f32,
    pub mode: &'static str,
    pub action: &'static str,
    pub preset: &'static str,
    pub heater: bool,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("heat".parse::<HvacMode>(), Ok(HvacMode::Heat));
        assert_eq!("OFF".parse::<HvacMode>(), Ok(HvacMode::Off));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert_eq!(
            "auto".parse::<HvacMode>(),
            Err(CommandError::UnknownMode("auto".to_string()))
        );
    }

    #[test]
    fn preset_round_trips_through_as_str() {
        for preset in [
            PresetMode::None,
            PresetMode::Away,
            PresetMode::Eco,
            PresetMode::Comfort,
            PresetMode::FrostGuard,
        ] {
            assert_eq!(preset.as_str().parse::<PresetMode>(), Ok(preset));
        }
    }
}
