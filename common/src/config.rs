use serde::{Deserialize, Serialize};

use crate::types::{HvacMode, PresetMode};
use crate::vendor::VendorKind;

pub const MIN_TARGET_C: f32 = 5.0;
pub const MAX_TARGET_C: f32 = 30.0;
pub const MIN_TOLERANCE_C: f32 = 0.1;
pub const MAX_TOLERANCE_C: f32 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub min_valid_temp_c: f32,
    pub max_valid_temp_c: f32,
    pub frost_protection_max_c: f32,
    pub state_publish_interval_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            min_valid_temp_c: -30.0,
            max_valid_temp_c: 60.0,
            frost_protection_max_c: 15.0,
            state_publish_interval_ms: 10_000,
        }
    }
}

/// Per-preset setpoints. A preset without a configured temperature cannot be
/// selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetTemperatures {
    pub away_c: Option<f32>,
    pub eco_c: Option<f32>,
    pub comfort_c: Option<f32>,
    pub frost_guard_c: Option<f32>,
}

impl PresetTemperatures {
    pub fn temperature_for(&self, preset: PresetMode) -> Option<f32> {
        match preset {
            PresetMode::None => None,
            PresetMode::Away => self.away_c,
            PresetMode::Eco => self.eco_c,
            PresetMode::Comfort => self.comfort_c,
            PresetMode::FrostGuard => self.frost_guard_c,
        }
    }

    fn sanitize(&mut self) {
        for slot in [
            &mut self.away_c,
            &mut self.eco_c,
            &mut self.comfort_c,
            &mut self.frost_guard_c,
        ] {
            if let Some(temp) = *slot {
                if temp.is_finite() {
                    *slot = Some(temp.clamp(MIN_TARGET_C, MAX_TARGET_C));
                } else {
                    *slot = None;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateSettings {
    pub target_temp_c: f32,
    pub cold_tolerance_c: f32,
    pub hot_tolerance_c: f32,
    pub mode: HvacMode,
    #[serde(default)]
    pub presets: PresetTemperatures,
}

impl Default for ClimateSettings {
    fn default() -> Self {
        Self {
            target_temp_c: 21.0,
            cold_tolerance_c: 0.3,
            hot_tolerance_c: 0.3,
            mode: HvacMode::Off,
            presets: PresetTemperatures::default(),
        }
    }
}

impl ClimateSettings {
    pub fn sanitize(&mut self) {
        if !self.target_temp_c.is_finite() {
            self.target_temp_c = 21.0;
        }
        self.target_temp_c = self.target_temp_c.clamp(MIN_TARGET_C, MAX_TARGET_C);
        self.cold_tolerance_c = self
            .cold_tolerance_c
            .clamp(MIN_TOLERANCE_C, MAX_TOLERANCE_C);
        self.hot_tolerance_c = self.hot_tolerance_c.clamp(MIN_TOLERANCE_C, MAX_TOLERANCE_C);
        self.presets.sanitize();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "127.0.0.1".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub device_label: String,
    pub vendor: VendorKind,
    pub sensor_entity: String,
    pub http_port: u16,
    pub controller: ControllerConfig,
    pub settings: ClimateSettings,
    pub network: NetworkConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            device_label: "heater".to_string(),
            vendor: VendorKind::ElectricalHeater,
            sensor_entity: "living_room_temperature".to_string(),
            http_port: 8080,
            controller: ControllerConfig::default(),
            settings: ClimateSettings::default(),
            network: NetworkConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_out_of_range_settings() {
        let mut settings = ClimateSettings {
            target_temp_c: 55.0,
            cold_tolerance_c: 0.0,
            hot_tolerance_c: 9.0,
            ..ClimateSettings::default()
        };
        settings.sanitize();

        assert_eq!(settings.target_temp_c, MAX_TARGET_C);
        assert_eq!(settings.cold_tolerance_c, MIN_TOLERANCE_C);
        assert_eq!(settings.hot_tolerance_c, MAX_TOLERANCE_C);
    }

    #[test]
    fn sanitize_drops_non_finite_values() {
        let mut settings = ClimateSettings {
            target_temp_c: f32::NAN,
            presets: PresetTemperatures {
                away_c: Some(f32::INFINITY),
                eco_c: Some(17.0),
                ..PresetTemperatures::default()
            },
            ..ClimateSettings::default()
        };
        settings.sanitize();

        assert_eq!(settings.target_temp_c, 21.0);
        assert_eq!(settings.presets.away_c, None);
        assert_eq!(settings.presets.eco_c, Some(17.0));
    }

    #[test]
    fn service_config_deserializes_with_defaulted_presets() {
        let raw = r#"{
            "device_label": "bedroom heater",
            "vendor": "smart_thermostat",
            "sensor_entity": "bedroom_temperature",
            "http_port": 8090,
            "controller": {
                "min_valid_temp_c": -30.0,
                "max_valid_temp_c": 60.0,
                "frost_protection_max_c": 15.0,
                "state_publish_interval_ms": 10000
            },
            "settings": {
                "target_temp_c": 19.5,
                "cold_tolerance_c": 0.3,
                "hot_tolerance_c": 0.3,
                "mode": "HEAT"
            },
            "network": {
                "mqtt_host": "broker.local",
                "mqtt_port": 1883,
                "mqtt_user": "",
                "mqtt_pass": ""
            }
        }"#;

        let config: ServiceConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.vendor, VendorKind::SmartThermostat);
        assert_eq!(config.settings.target_temp_c, 19.5);
        assert_eq!(config.settings.presets, PresetTemperatures::default());
    }
}
