// ── Bridge client contract ──
//
// The narrow surface the core needs from a bridge. `HueClient` from
// `huelink-api` implements it over HTTP; tests supply scripted fakes.

use async_trait::async_trait;
use secrecy::SecretString;

use huelink_api::HueClient;
use huelink_api::models::ApiStateUpdate;

use crate::convert;
use crate::error::BridgeError;
use crate::model::{
    ApiVersion, BridgeInfo, FullConfig, Group, Light, Sensor, SensorUpdate, StateUpdate,
};

#[async_trait]
pub trait Bridge: Send + Sync {
    /// API version the bridge reports.
    async fn api_version(&self) -> Result<ApiVersion, BridgeError>;

    async fn fetch_lights(&self) -> Result<Vec<Light>, BridgeError>;

    /// All resources in one call. Older bridges only report complete
    /// light state this way.
    async fn fetch_full_config(&self) -> Result<FullConfig, BridgeError>;

    async fn fetch_sensors(&self) -> Result<Vec<Sensor>, BridgeError>;

    async fn fetch_groups(&self) -> Result<Vec<Group>, BridgeError>;

    async fn set_light_state(&self, light_id: &str, update: &StateUpdate)
    -> Result<(), BridgeError>;

    async fn set_group_state(&self, group_id: &str, update: &StateUpdate)
    -> Result<(), BridgeError>;

    async fn set_sensor_state(
        &self,
        sensor_id: &str,
        update: &SensorUpdate,
    ) -> Result<(), BridgeError>;

    async fn update_sensor_config(
        &self,
        sensor_id: &str,
        update: &SensorUpdate,
    ) -> Result<(), BridgeError>;

    /// Validate and adopt a stored credential.
    async fn authenticate(&self, credential: &SecretString) -> Result<(), BridgeError>;

    /// Pair with the bridge. Fails with `LinkButtonNotPressed` until the
    /// button has been pressed.
    async fn request_new_credential(&self, device_label: &str)
    -> Result<SecretString, BridgeError>;

    /// Unauthenticated bridge description.
    async fn fetch_metadata(&self) -> Result<BridgeInfo, BridgeError>;

    /// Unauthenticated reachability check. `Err(Io)` means unreachable.
    async fn probe(&self) -> Result<(), BridgeError>;

    /// Ask the bridge to search for new lights, optionally by serial.
    async fn start_search(&self, serials: &[String]) -> Result<(), BridgeError>;
}

#[async_trait]
impl Bridge for HueClient {
    async fn api_version(&self) -> Result<ApiVersion, BridgeError> {
        let raw = HueClient::api_version(self).await?;
        raw.parse().map_err(|e| BridgeError::Api {
            code: 0,
            message: format!("unparseable API version '{raw}': {e}"),
        })
    }

    async fn fetch_lights(&self) -> Result<Vec<Light>, BridgeError> {
        Ok(convert::lights_from_api(self.list_lights().await?))
    }

    async fn fetch_full_config(&self) -> Result<FullConfig, BridgeError> {
        Ok(self.full_config().await?.into())
    }

    async fn fetch_sensors(&self) -> Result<Vec<Sensor>, BridgeError> {
        Ok(convert::sensors_from_api(self.list_sensors().await?))
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>, BridgeError> {
        Ok(convert::groups_from_api(self.list_groups().await?))
    }

    async fn set_light_state(
        &self,
        light_id: &str,
        update: &StateUpdate,
    ) -> Result<(), BridgeError> {
        HueClient::set_light_state(self, light_id, &ApiStateUpdate::from(update)).await?;
        Ok(())
    }

    async fn set_group_state(
        &self,
        group_id: &str,
        update: &StateUpdate,
    ) -> Result<(), BridgeError> {
        self.set_group_action(group_id, &ApiStateUpdate::from(update))
            .await?;
        Ok(())
    }

    async fn set_sensor_state(
        &self,
        sensor_id: &str,
        update: &SensorUpdate,
    ) -> Result<(), BridgeError> {
        HueClient::set_sensor_state(self, sensor_id, update).await?;
        Ok(())
    }

    async fn update_sensor_config(
        &self,
        sensor_id: &str,
        update: &SensorUpdate,
    ) -> Result<(), BridgeError> {
        self.set_sensor_config(sensor_id, update).await?;
        Ok(())
    }

    async fn authenticate(&self, credential: &SecretString) -> Result<(), BridgeError> {
        HueClient::authenticate(self, credential.clone()).await?;
        Ok(())
    }

    async fn request_new_credential(
        &self,
        device_label: &str,
    ) -> Result<SecretString, BridgeError> {
        Ok(self.link(device_label).await?)
    }

    async fn fetch_metadata(&self) -> Result<BridgeInfo, BridgeError> {
        Ok(HueClient::probe(self).await?.into())
    }

    async fn probe(&self) -> Result<(), BridgeError> {
        HueClient::probe(self).await?;
        Ok(())
    }

    async fn start_search(&self, serials: &[String]) -> Result<(), BridgeError> {
        self.search_lights(serials).await?;
        Ok(())
    }
}
