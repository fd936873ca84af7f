use std::time::Duration;

use anyhow::Context;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use tracing::{info, warn};

use climate_common::{sensor_temperature_topic, TOPIC_SENSOR_STATUS};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mqtt_host = std::env::var("MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let mqtt_port = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(1883);
    let entity_id = std::env::var("SENSOR_ENTITY_ID")
        .unwrap_or_else(|_| "living_room_temperature".to_string());

    let mut mqtt_options = MqttOptions::new("climate-sensor", mqtt_host, mqtt_port);

    if let Ok(user) = std::env::var("MQTT_USER") {
        let pass = std::env::var("MQTT_PASS").unwrap_or_default();
        mqtt_options.set_credentials(user, pass);
    }

    let (mqtt, mut eventloop) = AsyncClient::new(mqtt_options, 32);

    mqtt.publish(TOPIC_SENSOR_STATUS, QoS::AtLeastOnce, true, "online")
        .await
        .context("failed to publish sensor online status")?;

    tokio::spawn(async move {
        loop {
            if let Err(err) = eventloop.poll().await {
                warn!("sensor mqtt poll error: {err}");
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    });

    info!(entity = %entity_id, "sensor publisher started");

    let topic = sensor_temperature_topic(&entity_id);
    let mut tick: u64 = 0;
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    loop {
        interval.tick().await;
        tick = tick.saturating_add(1);

        // Integration point: replace the simulated reading with the real
        // room sensor (or a bridge to the vendor's sensor API).
        let temperature_c = 20.0 + ((tick % 8) as f32 * 0.1);

        let payload = format!("{temperature_c:.1}");
        mqtt.publish(topic.as_str(), QoS::AtLeastOnce, true, payload)
            .await
            .context("failed to publish sensor temperature")?;
    }
}
