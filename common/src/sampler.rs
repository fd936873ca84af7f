use thiserror::Error;
use tracing::error;

use crate::config::ControllerConfig;
use crate::controller::HeatingController;

/// A value-change notification from an external sensor entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorEvent {
    pub entity_id: String,
    pub value: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReadingError {
    #[error("sensor value {0:?} is not a number")]
    NotNumeric(String),
    #[error("sensor value {0} outside plausible range {1}..={2}")]
    OutOfRange(f32, f32, f32),
}

/// Follows one named sensor entity and feeds its readings to the
/// controller. Malformed values are logged and dropped; the controller
/// keeps its previous reading.
pub struct TemperatureSampler {
    entity_id: String,
    min_valid_c: f32,
    max_valid_c: f32,
}

impl TemperatureSampler {
    pub fn new(entity_id: impl Into<String>, config: &ControllerConfig) -> Self {
        Self {
            entity_id: entity_id.into(),
            min_valid_c: config.min_valid_temp_c,
            max_valid_c: config.max_valid_temp_c,
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn parse_reading(&self, raw: &str) -> Result<f32, ReadingError> {
        let value: f32 = raw
            .trim()
            .parse()
            .map_err(|_| ReadingError::NotNumeric(raw.to_string()))?;
        if !value.is_finite() {
            return Err(ReadingError::NotNumeric(raw.to_string()));
        }
        if !(self.min_valid_c..=self.max_valid_c).contains(&value) {
            return Err(ReadingError::OutOfRange(
                value,
                self.min_valid_c,
                self.max_valid_c,
            ));
        }
        Ok(value)
    }

    pub fn ingest(&self, event: &SensorEvent, controller: &mut HeatingController) {
        if event.entity_id != self.entity_id {
            return;
        }

        match self.parse_reading(&event.value) {
            Ok(temp_c) => controller.on_sensor_update(temp_c),
            Err(err) => error!(entity = %event.entity_id, "unable to update from sensor: {err}"),
        }
    }
}
