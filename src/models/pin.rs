use super::marker::{MarkerColor, MarkerId, Position};
use serde::Serialize;

/// SVG path of the map pin
pub const PIN_ICON_PATH: &str =
    "M12 2C8.13 2 5 5.13 5 9c0 5.25 7 13 7 13s7-7.75 7-13c0-3.87-3.13-7-7-7z";

pub const CONFIRMED_OPACITY: f32 = 1.0;
pub const DRAFT_OPACITY: f32 = 0.7;

/// Icon description handed to the map widget
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinIcon {
    pub path: &'static str,
    pub fill_color: MarkerColor,
    pub fill_opacity: f32,
    pub stroke_color: &'static str,
    pub stroke_weight: u8,
    pub scale: u8,
    pub anchor: (u8, u8),
}

impl PinIcon {
    fn with(color: MarkerColor, opacity: f32) -> Self {
        Self {
            path: PIN_ICON_PATH,
            fill_color: color,
            fill_opacity: opacity,
            stroke_color: "#000000",
            stroke_weight: 1,
            scale: 2,
            anchor: (12, 24),
        }
    }

    pub fn confirmed(color: MarkerColor) -> Self {
        Self::with(color, CONFIRMED_OPACITY)
    }

    pub fn draft(color: MarkerColor) -> Self {
        Self::with(color, DRAFT_OPACITY)
    }
}

/// One pin on the map. The draft pin has no id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPin {
    pub id: Option<MarkerId>,
    pub position: Position,
    pub icon: PinIcon,
}
