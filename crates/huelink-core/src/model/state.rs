// ── Light state and state updates ──

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which attribute set currently defines a light's color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Hs,
    Xy,
    Ct,
}

/// A light color as defined by its color mode. Brightness is not part of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Color {
    Hs { hue: u16, saturation: u8 },
    Xy([f64; 2]),
    Ct(u16),
}

/// Observed state of a light, or the derived state of a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    pub on: bool,
    pub brightness: Option<u8>,
    pub hue: Option<u16>,
    pub saturation: Option<u8>,
    pub xy: Option<[f64; 2]>,
    pub color_temperature: Option<u16>,
    pub color_mode: Option<ColorMode>,
    pub reachable: bool,
}

impl LightState {
    /// The color the active color mode refers to, if its attributes are present.
    pub fn color(&self) -> Option<Color> {
        match self.color_mode? {
            ColorMode::Hs => Some(Color::Hs {
                hue: self.hue?,
                saturation: self.saturation?,
            }),
            ColorMode::Xy => self.xy.map(Color::Xy),
            ColorMode::Ct => self.color_temperature.map(Color::Ct),
        }
    }

    /// Copy the color attributes (mode, hue, saturation, xy, ct) from `other`.
    pub(crate) fn copy_color_from(&mut self, other: &Self) {
        self.color_mode = other.color_mode;
        self.hue = other.hue;
        self.saturation = other.saturation;
        self.xy = other.xy;
        self.color_temperature = other.color_temperature;
    }
}

/// A desired change to a light or group. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub on: Option<bool>,
    pub brightness: Option<u8>,
    pub hue: Option<u16>,
    pub saturation: Option<u8>,
    pub xy: Option<[f64; 2]>,
    pub color_temperature: Option<u16>,
    pub alert: Option<String>,
    pub effect: Option<String>,
    /// Fade duration; the bridge resolves it to 100 ms steps.
    #[serde(default, with = "duration_ms")]
    pub transition: Option<Duration>,
}

impl StateUpdate {
    /// Just `on: true`.
    pub fn turn_on() -> Self {
        Self {
            on: Some(true),
            ..Self::default()
        }
    }

    pub fn turn_off() -> Self {
        Self {
            on: Some(false),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    #[must_use]
    pub fn with_color_temperature(mut self, mired: u16) -> Self {
        self.color_temperature = Some(mired);
        self
    }

    #[must_use]
    pub fn with_transition(mut self, transition: Duration) -> Self {
        self.transition = Some(transition);
        self
    }

    /// A color temperature change that does not touch brightness.
    ///
    /// Such an update is dropped when the light is off instead of
    /// switching the light on to apply it.
    pub fn is_color_temperature_only(&self) -> bool {
        self.color_temperature.is_some() && self.brightness.is_none()
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_follows_color_mode() {
        let state = LightState {
            on: true,
            hue: Some(8000),
            saturation: Some(140),
            color_temperature: Some(366),
            color_mode: Some(ColorMode::Ct),
            ..LightState::default()
        };
        assert_eq!(state.color(), Some(Color::Ct(366)));

        let hs = LightState {
            color_mode: Some(ColorMode::Hs),
            ..state
        };
        assert_eq!(
            hs.color(),
            Some(Color::Hs {
                hue: 8000,
                saturation: 140
            })
        );
    }

    #[test]
    fn no_color_without_mode() {
        let state = LightState {
            on: true,
            brightness: Some(100),
            ..LightState::default()
        };
        assert_eq!(state.color(), None);
    }

    #[test]
    fn color_temperature_only_detection() {
        assert!(StateUpdate::default().with_color_temperature(300).is_color_temperature_only());
        assert!(
            !StateUpdate::default()
                .with_color_temperature(300)
                .with_brightness(10)
                .is_color_temperature_only()
        );
        assert!(!StateUpdate::turn_on().is_color_temperature_only());
    }
}
