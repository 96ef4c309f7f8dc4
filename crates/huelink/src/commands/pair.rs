//! Pair command handler: wait for the link button and store the new username.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::{Instant, sleep};

use huelink_config::CredentialStore;
use huelink_core::{BridgeError, CoreError};

use crate::cli::{GlobalOpts, PairArgs};
use crate::error::CliError;
use crate::output;

const RETRY_DELAY: Duration = Duration::from_secs(1);

fn spinner(quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub async fn handle(args: &PairArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut session = super::connect(global)?;
    let deadline = Instant::now() + Duration::from_secs(args.wait);

    let bar = spinner(global.quiet);
    bar.set_message(format!(
        "Press the link button on the bridge at {} ...",
        session.host
    ));

    let credential = loop {
        match session.controller.pair().await {
            Ok(credential) => break credential,
            Err(CoreError::Bridge(BridgeError::LinkButtonNotPressed)) => {
                if Instant::now() + RETRY_DELAY > deadline {
                    bar.finish_and_clear();
                    return Err(CliError::PairingTimeout { seconds: args.wait });
                }
                sleep(RETRY_DELAY).await;
            }
            Err(CoreError::Bridge(e @ BridgeError::Io(_))) => {
                bar.finish_and_clear();
                return Err(CliError::ConnectionFailed {
                    host: session.host.clone(),
                    status: e.to_string(),
                });
            }
            Err(e) => {
                bar.finish_and_clear();
                return Err(e.into());
            }
        }
    };
    bar.finish_and_clear();

    let stored = huelink_config::store_credential(
        &mut session.config,
        &credential,
        &session.config_path,
    )?;
    let location = match stored {
        CredentialStore::Keyring => "system keyring".to_owned(),
        CredentialStore::ConfigFile => session.config_path.display().to_string(),
    };

    output::print_output(
        &format!("Paired with {}. Username stored in {location}.", session.host),
        global.quiet,
    );
    Ok(())
}
