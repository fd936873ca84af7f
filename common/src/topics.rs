pub const TOPIC_SENSOR_STATUS: &str = "climate/sensor/status";
pub const TOPIC_SENSOR_TEMP_WILDCARD: &str = "climate/sensor/+/temperature";

pub const TOPIC_CONTROLLER_STATE: &str = "climate/controller/state";

pub const TOPIC_CMD_TARGET: &str = "climate/cmnd/thermostat/target";
pub const TOPIC_CMD_MODE: &str = "climate/cmnd/thermostat/mode";
pub const TOPIC_CMD_PRESET: &str = "climate/cmnd/thermostat/preset";

pub fn sensor_temperature_topic(entity_id: &str) -> String {
    format!("climate/sensor/{entity_id}/temperature")
}

/// Extract the entity id from a sensor temperature topic, if it is one.
pub fn parse_sensor_temperature_topic(topic: &str) -> Option<&str> {
    let entity = topic
        .strip_prefix("climate/sensor/")?
        .strip_suffix("/temperature")?;
    if entity.is_empty() || entity.contains('/') {
        return None;
    }
    Some(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_topic_round_trips() {
        let topic = sensor_temperature_topic("living_room_temperature");
        assert_eq!(
            parse_sensor_temperature_topic(&topic),
            Some("living_room_temperature")
        );
    }

    #[test]
    fn rejects_foreign_topics() {
        assert_eq!(parse_sensor_temperature_topic(TOPIC_CMD_MODE), None);
        assert_eq!(parse_sensor_temperature_topic("climate/sensor//temperature"), None);
        assert_eq!(
            parse_sensor_temperature_topic("climate/sensor/a/b/temperature"),
            None
        );
    }
}
