// Bridge authentication
//
// The v1 API has no sessions: a "username" obtained by pairing (pressing
// the link button, then POSTing a device label to `/api`) is embedded in
// every user-scoped path. Validation is just a read with that username.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::client::HueClient;
use crate::error::Error;
use crate::models::{ApiBridgeConfig, NewUser, NewUserReply};

impl HueClient {
    /// Validate `username` against the bridge and adopt it on success.
    ///
    /// `GET /api/{username}/config` answers with an error array (type 1)
    /// for unknown users, which surfaces as [`Error::Unauthorized`].
    pub async fn authenticate(&self, username: SecretString) -> Result<(), Error> {
        let url = self.url_for_user(username.expose_secret(), "config")?;
        debug!("validating bridge username");
        let config: serde_json::Value = self.get(url).await?;

        // Unknown users get the public subset, which lacks the whitelist.
        if config.get("whitelist").is_none() {
            return Err(Error::Unauthorized {
                description: "username is not whitelisted".into(),
            });
        }

        self.set_username(username);
        info!("authenticated with bridge");
        Ok(())
    }

    /// Pair with the bridge and return the new username.
    ///
    /// `POST /api` with `{"devicetype": label}`. Fails with
    /// [`Error::LinkButtonNotPressed`] until the link button is pressed.
    /// The returned username is adopted by this client.
    pub async fn link(&self, devicetype: &str) -> Result<SecretString, Error> {
        let url = self.api_url("")?;
        debug!(devicetype, "requesting new bridge username");
        let results = self.post(url, &NewUser { devicetype }).await?;

        let reply = results
            .into_iter()
            .find_map(|value| serde_json::from_value::<NewUserReply>(value).ok())
            .ok_or_else(|| Error::Deserialization {
                message: "pairing response carried no username".into(),
                body: String::new(),
            })?;

        let username = SecretString::from(reply.username);
        self.set_username(username.clone());
        info!("paired with bridge");
        Ok(username)
    }

    /// Unauthenticated reachability check.
    ///
    /// `GET /api/config` succeeds for anyone who can reach the bridge.
    pub async fn probe(&self) -> Result<ApiBridgeConfig, Error> {
        let url = self.api_url("config")?;
        debug!("probing bridge reachability");
        self.get(url).await
    }
}
