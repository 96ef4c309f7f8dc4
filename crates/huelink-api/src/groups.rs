// Group endpoints

use std::collections::BTreeMap;

use tracing::debug;

use crate::client::HueClient;
use crate::error::Error;
use crate::models::{ApiGroup, ApiStateUpdate};

impl HueClient {
    /// `GET /api/{user}/groups`
    pub async fn list_groups(&self) -> Result<BTreeMap<String, ApiGroup>, Error> {
        let url = self.user_url("groups")?;
        debug!("listing groups");
        self.get(url).await
    }

    /// Apply an action to every light of a group.
    ///
    /// `PUT /api/{user}/groups/{id}/action`
    pub async fn set_group_action(&self, id: &str, update: &ApiStateUpdate) -> Result<(), Error> {
        let url = self.user_url(&format!("groups/{id}/action"))?;
        debug!(group_id = id, "setting group action");
        let _ = self.put(url, update).await?;
        Ok(())
    }
}
