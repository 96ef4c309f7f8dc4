//! Watch command handler: run the poll loops and stream bridge events.

use std::time::Duration;

use chrono::Local;
use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use huelink_core::{BridgeEvent, Controller, EntityKind};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

fn entity_name(controller: &Controller, kind: EntityKind, id: &str) -> Option<String> {
    match kind {
        EntityKind::Light => controller.light_by_id(id).map(|l| l.name.clone()),
        EntityKind::Sensor => controller.sensor_by_id(id).map(|s| s.name.clone()),
        EntityKind::Group => controller.group_by_id(id).map(|g| g.name.clone()),
    }
}

fn describe(controller: &Controller, kind: EntityKind, id: &str) -> String {
    match entity_name(controller, kind, id) {
        Some(name) => format!("{kind} {id} ({name})"),
        None => format!("{kind} {id}"),
    }
}

/// One line per event; `None` for events that are handled elsewhere.
fn format_event(controller: &Controller, event: &BridgeEvent, color: bool) -> Option<String> {
    let body = match event {
        BridgeEvent::EntityAdded { kind, id } => {
            format!("+ {}", describe(controller, *kind, id))
        }
        BridgeEvent::EntityChanged { kind, id } => {
            format!("~ {}", describe(controller, *kind, id))
        }
        BridgeEvent::EntityRemoved { kind, id } => format!("- {kind} {id}"),
        BridgeEvent::StatusChanged(status) => {
            format!("bridge {}", output::paint_status(status, color))
        }
        BridgeEvent::PropertiesInitialized(props) => format!(
            "bridge {} firmware {} api {}",
            props.serial_number, props.firmware_version, props.api_version
        ),
        BridgeEvent::PairingCompleted { .. } => return None,
    };
    let stamp = Local::now().format("%H:%M:%S").to_string();
    Some(if color {
        format!("{} {body}", stamp.dimmed())
    } else {
        format!("{stamp} {body}")
    })
}

pub async fn handle(args: &WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut session = super::connect(global)?;
    let color = output::should_color(&global.color);

    let mut events = session.controller.events();
    if args.no_sensors {
        session.controller.start_light_polling();
    } else {
        session.controller.start();
    }
    info!(host = %session.host, "watching bridge");

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            () = &mut deadline => break,
            received = events.recv() => match received {
                Ok(BridgeEvent::PairingCompleted { credential }) => {
                    let stored = huelink_config::store_credential(
                        &mut session.config,
                        &credential,
                        &session.config_path,
                    );
                    match stored {
                        Ok(location) => info!(?location, "stored new bridge username"),
                        Err(e) => warn!(error = %e, "could not persist bridge username"),
                    }
                    output::print_output("Paired with the bridge", global.quiet);
                }
                Ok(event) => {
                    if let Some(line) = format_event(&session.controller, &event, color) {
                        output::print_output(&line, global.quiet);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.controller.shutdown();
    Ok(())
}
