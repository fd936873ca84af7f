pub mod actuator;
pub mod config;
pub mod controller;
pub mod sampler;
pub mod topics;
pub mod types;
pub mod vendor;

pub use actuator::{DeviceActuator, HeaterCommand, HeaterState};
pub use config::{
    ClimateSettings, ControllerConfig, NetworkConfig, PresetTemperatures, ServiceConfig,
};
pub use controller::HeatingController;
pub use sampler::{ReadingError, SensorEvent, TemperatureSampler};
pub use topics::*;
pub use types::{
    CommandError, ControllerStatePayload, ControllerStatus, HvacAction, HvacMode, PresetMode,
};
pub use vendor::{
    CommandSink, ElectricalHeaterActuator, HeatingLevel, LogCommandSink, SmartThermostatActuator,
    VendorAction, VendorKind,
};
