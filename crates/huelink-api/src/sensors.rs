// Sensor endpoints
//
// Sensor state and config bodies depend on the sensor type, so writes
// take raw JSON objects.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::client::HueClient;
use crate::error::Error;
use crate::models::ApiSensor;

impl HueClient {
    /// `GET /api/{user}/sensors`
    pub async fn list_sensors(&self) -> Result<BTreeMap<String, ApiSensor>, Error> {
        let url = self.user_url("sensors")?;
        debug!("listing sensors");
        self.get(url).await
    }

    /// `PUT /api/{user}/sensors/{id}/state`
    pub async fn set_sensor_state(&self, id: &str, update: &Map<String, Value>) -> Result<(), Error> {
        let url = self.user_url(&format!("sensors/{id}/state"))?;
        debug!(sensor_id = id, "setting sensor state");
        let _ = self.put(url, update).await?;
        Ok(())
    }

    /// `PUT /api/{user}/sensors/{id}/config`
    pub async fn set_sensor_config(&self, id: &str, update: &Map<String, Value>) -> Result<(), Error> {
        let url = self.user_url(&format!("sensors/{id}/config"))?;
        debug!(sensor_id = id, "updating sensor config");
        let _ = self.put(url, update).await?;
        Ok(())
    }
}
