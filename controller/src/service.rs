use std::{collections::HashMap, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use serde::Serialize;
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{error, info, warn};

use climate_common::{
    DeviceActuator, ElectricalHeaterActuator, HeatingController, HvacMode, LogCommandSink,
    PresetMode, SensorEvent, ServiceConfig, SmartThermostatActuator, TemperatureSampler,
    VendorKind, parse_sensor_temperature_topic, TOPIC_CMD_MODE, TOPIC_CMD_PRESET, TOPIC_CMD_TARGET,
    TOPIC_CONTROLLER_STATE, TOPIC_SENSOR_TEMP_WILDCARD,
};

const MAX_MQTT_PAYLOAD_BYTES: usize = 512;

#[derive(Clone)]
struct AppState {
    controller: Arc<Mutex<HeatingController>>,
    sampler: Arc<TemperatureSampler>,
    mqtt: AsyncClient,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = load_service_config().unwrap_or_else(|err| {
        warn!("failed to load service config: {err:#}");
        ServiceConfig::default()
    });
    config.settings.sanitize();

    let actuator = build_actuator(&config);
    let controller = HeatingController::new(config.settings.clone(), actuator);
    let sampler = TemperatureSampler::new(config.sensor_entity.clone(), &config.controller);

    let mqtt_host = std::env::var("MQTT_HOST").unwrap_or(config.network.mqtt_host.clone());
    let mqtt_port = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(config.network.mqtt_port);

    let mut mqtt_options = MqttOptions::new("climate-controller", mqtt_host, mqtt_port);
    let mqtt_user = std::env::var("MQTT_USER").unwrap_or(config.network.mqtt_user.clone());
    let mqtt_pass = std::env::var("MQTT_PASS").unwrap_or(config.network.mqtt_pass.clone());
    if !mqtt_user.is_empty() {
        mqtt_options.set_credentials(mqtt_user, mqtt_pass);
    }

    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 64);

    let app_state = AppState {
        controller: Arc::new(Mutex::new(controller)),
        sampler: Arc::new(sampler),
        mqtt,
    };

    subscribe_topics(&app_state.mqtt).await?;
    spawn_mqtt_loop(app_state.clone(), eventloop);
    spawn_state_publish_loop(
        app_state.clone(),
        config.controller.state_publish_interval_ms,
    );

    let app = Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/target", post(handle_set_target))
        .route("/api/mode", post(handle_set_mode))
        .route("/api/preset", post(handle_set_preset))
        .route("/api/tolerances", post(handle_set_tolerances))
        .with_state(app_state);

    let port = std::env::var("CONTROLLER_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(config.http_port);
    let addr: SocketAddr = format!("0.0.0.0:{port}")
        .parse()
        .context("invalid controller listen address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind controller server at {addr}"))?;

    info!("controller listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn load_service_config() -> anyhow::Result<ServiceConfig> {
    match std::env::var("CLIMATE_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            let raw = std::fs::read(&path)
                .with_context(|| format!("failed to read config at {}", path.display()))?;
            Ok(serde_json::from_slice(&raw)?)
        }
        Err(_) => Ok(ServiceConfig::default()),
    }
}

fn build_actuator(config: &ServiceConfig) -> Box<dyn DeviceActuator + Send> {
    let sink = LogCommandSink::new(config.device_label.clone());
    match config.vendor {
        VendorKind::ElectricalHeater => Box::new(ElectricalHeaterActuator::new(sink)),
        VendorKind::SmartThermostat => Box::new(SmartThermostatActuator::new(
            sink,
            config.controller.frost_protection_max_c,
        )),
    }
}

async fn subscribe_topics(mqtt: &AsyncClient) -> anyhow::Result<()> {
    let topics = [
        TOPIC_SENSOR_TEMP_WILDCARD,
        TOPIC_CMD_TARGET,
        TOPIC_CMD_MODE,
        TOPIC_CMD_PRESET,
    ];

    for topic in topics {
        mqtt.subscribe(topic, QoS::AtMostOnce).await?;
    }
    Ok(())
}

fn spawn_mqtt_loop(app_state: AppState, mut eventloop: rumqttc::EventLoop) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    if let Err(err) =
                        handle_mqtt_message(&app_state, message.topic, message.payload.to_vec())
                            .await
                    {
                        warn!("mqtt message handling error: {err:#}");
                    }
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

fn spawn_state_publish_loop(app_state: AppState, interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1_000)));
        loop {
            interval.tick().await;

            let payload = {
                let controller = app_state.controller.lock().await;
                serde_json::to_vec(&controller.state_payload())
            };

            match payload {
                Ok(body) => {
                    if let Err(err) = app_state
                        .mqtt
                        .publish(TOPIC_CONTROLLER_STATE, QoS::AtLeastOnce, true, body)
                        .await
                    {
                        warn!("controller state publish failed: {err}");
                    }
                }
                Err(err) => warn!("controller state serialization failed: {err}"),
            }
        }
    });
}

async fn handle_mqtt_message(
    app_state: &AppState,
    topic: String,
    payload: Vec<u8>,
) -> anyhow::Result<()> {
    if payload.len() > MAX_MQTT_PAYLOAD_BYTES {
        warn!(
            "dropping oversized MQTT payload on topic {} ({} bytes)",
            topic,
            payload.len()
        );
        return Ok(());
    }

    let message = String::from_utf8(payload).context("non utf8 mqtt payload")?;

    if let Some(entity_id) = parse_sensor_temperature_topic(&topic) {
        let event = SensorEvent {
            entity_id: entity_id.to_string(),
            value: message,
        };
        let mut controller = app_state.controller.lock().await;
        app_state.sampler.ingest(&event, &mut controller);
        return Ok(());
    }

    match topic.as_str() {
        TOPIC_CMD_TARGET => match message.trim().parse::<f32>() {
            Ok(target) => {
                let mut controller = app_state.controller.lock().await;
                controller.set_target_temperature(target);
            }
            Err(_) => error!("invalid target temperature payload: {message:?}"),
        },
        TOPIC_CMD_MODE => match message.trim().parse::<HvacMode>() {
            Ok(mode) => {
                let mut controller = app_state.controller.lock().await;
                controller.set_mode(mode);
            }
            Err(err) => error!("{err}"),
        },
        TOPIC_CMD_PRESET => match message.trim().parse::<PresetMode>() {
            Ok(preset) => {
                let mut controller = app_state.controller.lock().await;
                if let Err(err) = controller.set_preset(preset) {
                    error!("{err}");
                }
            }
            Err(err) => error!("{err}"),
        },
        _ => {}
    }

    Ok(())
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = {
        let controller = state.controller.lock().await;
        controller.status()
    };
    Json(status)
}

async fn handle_set_target(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(value) = params.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'value' parameter");
    };
    let Ok(target) = value.parse::<f32>() else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid temperature value");
    };

    {
        let mut controller = state.controller.lock().await;
        controller.set_target_temperature(target);
    }

    handle_get_status(State(state)).await.into_response()
}

async fn handle_set_mode(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(value) = params.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'value' parameter");
    };

    let mode = match value.parse::<HvacMode>() {
        Ok(mode) => mode,
        Err(err) => {
            error!("{err}");
            return error_response(StatusCode::BAD_REQUEST, "Invalid mode. Use 'HEAT' or 'OFF'");
        }
    };

    {
        let mut controller = state.controller.lock().await;
        controller.set_mode(mode);
    }

    handle_get_status(State(state)).await.into_response()
}

async fn handle_set_preset(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(value) = params.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'value' parameter");
    };

    let preset = match value.parse::<PresetMode>() {
        Ok(preset) => preset,
        Err(err) => {
            error!("{err}");
            return error_response(StatusCode::BAD_REQUEST, "Unknown preset");
        }
    };

    let applied = {
        let mut controller = state.controller.lock().await;
        controller.set_preset(preset)
    };
    if let Err(err) = applied {
        error!("{err}");
        return error_response(StatusCode::BAD_REQUEST, &err.to_string());
    }

    handle_get_status(State(state)).await.into_response()
}

async fn handle_set_tolerances(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let (Some(cold), Some(hot)) = (params.get("cold"), params.get("hot")) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'cold' or 'hot' parameter");
    };
    let (Ok(cold), Ok(hot)) = (cold.parse::<f32>(), hot.parse::<f32>()) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid tolerance value (0.1-5.0)");
    };

    if !(0.1..=5.0).contains(&cold) || !(0.1..=5.0).contains(&hot) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid tolerance value (0.1-5.0)");
    }

    {
        let mut controller = state.controller.lock().await;
        controller.set_tolerances(cold, hot);
    }

    handle_get_status(State(state)).await.into_response()
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
