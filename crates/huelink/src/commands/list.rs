//! List command handler.

use std::sync::Arc;

use tabled::Tabled;

use huelink_core::{Color, Group, Light, LightState, Sensor};

use crate::cli::{GlobalOpts, ListArgs, ListKind};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct LightRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    light_type: String,
    #[tabled(rename = "On")]
    on: String,
    #[tabled(rename = "Bri")]
    brightness: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Reachable")]
    reachable: String,
}

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    sensor_type: String,
    #[tabled(rename = "Reachable")]
    reachable: String,
    #[tabled(rename = "Last Updated")]
    last_updated: String,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    group_type: String,
    #[tabled(rename = "Lights")]
    lights: String,
    #[tabled(rename = "On")]
    on: String,
    #[tabled(rename = "Bri")]
    brightness: String,
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.into()
}

fn color_cell(state: &LightState) -> String {
    match state.color() {
        Some(Color::Ct(mired)) => format!("ct {mired}"),
        Some(Color::Xy([x, y])) => format!("xy {x:.3},{y:.3}"),
        Some(Color::Hs { hue, saturation }) => format!("hs {hue}/{saturation}"),
        None => "-".into(),
    }
}

fn brightness_cell(state: &LightState) -> String {
    state
        .brightness
        .map_or_else(|| "-".into(), |b| b.to_string())
}

fn light_row(l: &Arc<Light>) -> LightRow {
    LightRow {
        id: l.id.clone(),
        name: l.name.clone(),
        light_type: l.light_type.clone(),
        on: yes_no(l.state.on),
        brightness: brightness_cell(&l.state),
        color: color_cell(&l.state),
        reachable: yes_no(l.state.reachable),
    }
}

fn sensor_row(s: &Arc<Sensor>) -> SensorRow {
    SensorRow {
        id: s.id.clone(),
        name: s.name.clone(),
        sensor_type: s.sensor_type.clone(),
        reachable: s.is_reachable().map_or_else(|| "-".into(), yes_no),
        last_updated: s.last_updated().unwrap_or("-").to_owned(),
    }
}

fn group_row(g: &Arc<Group>) -> GroupRow {
    GroupRow {
        id: g.id.clone(),
        name: g.name.clone(),
        group_type: g.group_type.clone(),
        lights: g.lights.join(","),
        on: yes_no(g.state.on),
        brightness: brightness_cell(&g.state),
    }
}

/// Numeric bridge ids sort numerically, anything else after them.
fn sort_by_id<T>(items: &mut [Arc<T>], key: impl Fn(&T) -> &str) {
    items.sort_by_key(|item| {
        let id = key(item.as_ref());
        (id.parse::<u64>().unwrap_or(u64::MAX), id.to_owned())
    });
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = super::connect(global)?;
    super::sync_once(&session).await?;
    let store = session.controller.store();

    let rendered = match args.kind {
        ListKind::Lights => {
            let mut lights = store.lights_snapshot().as_ref().clone();
            sort_by_id(&mut lights, |l| l.id.as_str());
            output::render_list(&global.output, &lights, light_row, |l| l.id.clone())?
        }
        ListKind::Sensors => {
            let mut sensors = store.sensors_snapshot().as_ref().clone();
            sort_by_id(&mut sensors, |s| s.id.as_str());
            output::render_list(&global.output, &sensors, sensor_row, |s| s.id.clone())?
        }
        ListKind::Groups => {
            let mut groups = store.groups_snapshot().as_ref().clone();
            sort_by_id(&mut groups, |g| g.id.as_str());
            output::render_list(&global.output, &groups, group_row, |g| g.id.clone())?
        }
    };

    output::print_output(&rendered, global.quiet);
    Ok(())
}
