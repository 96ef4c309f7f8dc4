// ── Group state aggregation ──
//
// A group's state is derived from the cached states of its member
// lights rather than taken from the bridge.

use tracing::trace;

use super::EntityCache;
use crate::model::{Color, Group, Light, LightState};

/// Replace `group.state` with the aggregate of its members' cached states.
///
/// - `on`: any member on
/// - `brightness`: integer mean over members that are on, 0 if none
/// - color: taken from the first on member with a color mode, kept only
///   if every on member with a color mode reports the same color
///
/// Members missing from the cache are skipped.
pub(crate) fn aggregate(group: &mut Group, lights: &EntityCache<Light>) {
    let mut state = LightState {
        reachable: true,
        ..LightState::default()
    };
    let mut sum_bri: u32 = 0;
    let mut on_count: u32 = 0;
    let mut color_ref: Option<(Option<Color>, LightState)> = None;
    let mut colors_agree = true;

    for light in group.lights.iter().filter_map(|id| lights.get(id)) {
        let member = &light.state;
        trace!(
            group = %group.name,
            light = %light.name,
            on = member.on,
            bri = ?member.brightness,
            mode = ?member.color_mode,
            "aggregating member"
        );
        if !member.on {
            continue;
        }
        state.on = true;
        sum_bri += u32::from(member.brightness.unwrap_or(0));
        on_count += 1;

        if member.color_mode.is_some() {
            let color = member.color();
            match &color_ref {
                None => color_ref = Some((color, member.clone())),
                Some((first, _)) if *first != color => colors_agree = false,
                Some(_) => {}
            }
        }
    }

    state.brightness = Some(if on_count == 0 {
        0
    } else {
        u8::try_from(sum_bri / on_count).unwrap_or(u8::MAX)
    });

    if let Some((_, reference)) = color_ref.as_ref().filter(|_| colors_agree) {
        state.copy_color_from(reference);
    }

    trace!(
        group = %group.name,
        on = state.on,
        bri = ?state.brightness,
        mode = ?state.color_mode,
        "aggregated group state"
    );
    group.state = state;
}
