// huelink-api: Async Rust client for the Hue bridge v1 REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod groups;
pub mod lights;
pub mod models;
pub mod sensors;
pub mod system;
pub mod transport;

pub use client::HueClient;
pub use error::Error;
pub use models::{
    ApiBridgeConfig, ApiColorMode, ApiFullConfig, ApiGroup, ApiGroupState, ApiLight,
    ApiLightState, ApiSensor, ApiStateUpdate,
};
pub use transport::{Protocol, TransportConfig};
