// Light endpoints

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tracing::debug;

use crate::client::HueClient;
use crate::error::Error;
use crate::models::{ApiLight, ApiStateUpdate};

impl HueClient {
    /// List all lights keyed by id.
    ///
    /// `GET /api/{user}/lights`
    pub async fn list_lights(&self) -> Result<BTreeMap<String, ApiLight>, Error> {
        let url = self.user_url("lights")?;
        debug!("listing lights");
        self.get(url).await
    }

    /// Change a light's state.
    ///
    /// `PUT /api/{user}/lights/{id}/state`
    pub async fn set_light_state(&self, id: &str, update: &ApiStateUpdate) -> Result<(), Error> {
        let url = self.user_url(&format!("lights/{id}/state"))?;
        debug!(light_id = id, "setting light state");
        let _ = self.put(url, update).await?;
        Ok(())
    }

    /// Start a search for new lights, optionally restricted to serials.
    ///
    /// `POST /api/{user}/lights` with `{}` or `{"deviceid": [...]}`
    pub async fn search_lights(&self, serials: &[String]) -> Result<(), Error> {
        let url = self.user_url("lights")?;
        let body: Value = if serials.is_empty() {
            json!({})
        } else {
            json!({ "deviceid": serials })
        };
        debug!(serials = serials.len(), "starting light search");
        let _ = self.post(url, &body).await?;
        Ok(())
    }
}
