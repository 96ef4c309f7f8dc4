// Bridge-level endpoints: full configuration dump and API version.

use tracing::debug;

use crate::client::HueClient;
use crate::error::Error;
use crate::models::ApiFullConfig;

impl HueClient {
    /// Every resource in a single document.
    ///
    /// `GET /api/{user}`. Older bridges (API < 1.11) only report complete
    /// light state through this endpoint.
    pub async fn full_config(&self) -> Result<ApiFullConfig, Error> {
        let url = self.user_url("")?;
        debug!("fetching full bridge configuration");
        self.get(url).await
    }

    /// The API version string the bridge reports, e.g. `"1.16.0"`.
    pub async fn api_version(&self) -> Result<String, Error> {
        Ok(self.probe().await?.apiversion)
    }
}
