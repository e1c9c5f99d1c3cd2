//! OSD settings as stored on the device

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::format::{DateStyle, TimeStyle};
use crate::geometry::round3;
use crate::wire::int_flag;

/// Font size value meaning "scale with the container"
pub const AUTO_FONT_SIZE: u32 = 0;

/// The three overlay texts the device can burn in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsdItemKind {
    /// Free-form channel name
    ChannelName,
    /// Live date and time
    DateTime,
    /// Device serial number
    SerialNumber,
}

impl OsdItemKind {
    /// All kinds in paint order
    pub const ALL: [OsdItemKind; 3] = [
        OsdItemKind::ChannelName,
        OsdItemKind::DateTime,
        OsdItemKind::SerialNumber,
    ];

    /// Key of this overlay in the settings document
    pub fn wire_name(&self) -> &'static str {
        match self {
            OsdItemKind::ChannelName => "channelNameOverlay",
            OsdItemKind::DateTime => "dateTimeOverlay",
            OsdItemKind::SerialNumber => "SNOverlay",
        }
    }

    /// Whether the overlay text can be edited in place
    pub fn is_text_editable(&self) -> bool {
        matches!(self, OsdItemKind::ChannelName)
    }
}

/// How the device picks the text colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontColorMode {
    /// Automatic black/white
    #[default]
    Auto,
    /// Fixed user colour
    Custom,
}

impl Serialize for FontColorMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            FontColorMode::Auto => 0,
            FontColorMode::Custom => 1,
        })
    }
}

impl<'de> Deserialize<'de> for FontColorMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        // Firmware versions disagree on whether this is a number or a string
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(0) => FontColorMode::Auto,
            Raw::Text(text) if text == "0" => FontColorMode::Auto,
            _ => FontColorMode::Custom,
        })
    }
}

/// Settings shared by every overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsdAttribute {
    /// Font size in pixels, [`AUTO_FONT_SIZE`] to scale with the container
    #[serde(rename = "iOSDFontSize", default)]
    pub font_size: u32,
    /// Hex colour without the leading `#`
    #[serde(rename = "sOSDFrontColor")]
    pub font_color: String,
    /// Colour selection mode
    #[serde(rename = "sOSDFrontColorMode", default)]
    pub color_mode: FontColorMode,
}

impl Default for OsdAttribute {
    fn default() -> Self {
        Self {
            font_size: AUTO_FONT_SIZE,
            font_color: "ffffff".to_string(),
            color_mode: FontColorMode::Auto,
        }
    }
}

impl OsdAttribute {
    /// CSS colour string for the overlay text
    pub fn css_color(&self) -> String {
        format!("#{}", self.font_color)
    }

    /// CSS text-shadow for the configured colour mode
    pub fn text_shadow(&self) -> &'static str {
        match self.color_mode {
            FontColorMode::Auto => "1px 1px 2px rgba(0, 0, 0, 0.8), -1px -1px 2px rgba(255, 255, 255, 0.5)",
            FontColorMode::Custom => "1px 1px 3px rgba(0, 0, 0, 0.9), 0 0 5px rgba(0, 0, 0, 0.5)",
        }
    }
}

/// Relative anchor shared by all overlays
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlayPosition {
    /// Whether the overlay is shown
    #[serde(rename = "iEnabled", with = "int_flag", default)]
    pub enabled: bool,
    /// Left edge as a fraction of container width
    #[serde(rename = "iPositionX", default)]
    pub x: f64,
    /// Top edge as a fraction of container height
    #[serde(rename = "iPositionY", default)]
    pub y: f64,
}

impl OverlayPosition {
    /// Enabled overlay at the given relative position
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            enabled: true,
            x,
            y,
        }
    }

    /// Copy moved to `(x, y)`, clamped to the container and rounded
    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        Self {
            enabled: self.enabled,
            x: round3(x.clamp(0.0, 1.0)),
            y: round3(y.clamp(0.0, 1.0)),
        }
    }
}

/// Channel name overlay
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelNameOverlay {
    /// Anchor and visibility
    #[serde(flatten)]
    pub position: OverlayPosition,
    /// Text shown
    #[serde(rename = "sChannelName", default)]
    pub name: String,
}

/// Date and time overlay
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DateTimeOverlay {
    /// Anchor and visibility
    #[serde(flatten)]
    pub position: OverlayPosition,
    /// Date layout
    #[serde(rename = "sDateStyle", default)]
    pub date_style: DateStyle,
    /// 12 or 24 hour clock
    #[serde(rename = "sTimeStyle", default)]
    pub time_style: TimeStyle,
    /// Append the abbreviated weekday to the date
    #[serde(rename = "iDisplayWeekEnabled", with = "int_flag", default)]
    pub show_weekday: bool,
}

/// Serial number overlay
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerialNumberOverlay {
    /// Anchor and visibility
    #[serde(flatten)]
    pub position: OverlayPosition,
}

/// Full OSD settings document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OsdSettings {
    /// Shared font settings
    #[serde(default)]
    pub attribute: OsdAttribute,
    /// Channel name overlay
    #[serde(rename = "channelNameOverlay", default)]
    pub channel_name: ChannelNameOverlay,
    /// Date and time overlay
    #[serde(rename = "dateTimeOverlay", default)]
    pub date_time: DateTimeOverlay,
    /// Serial number overlay
    #[serde(rename = "SNOverlay", default)]
    pub serial_number: SerialNumberOverlay,
}

impl OsdSettings {
    /// Position of the given overlay
    pub fn position(&self, kind: OsdItemKind) -> OverlayPosition {
        match kind {
            OsdItemKind::ChannelName => self.channel_name.position,
            OsdItemKind::DateTime => self.date_time.position,
            OsdItemKind::SerialNumber => self.serial_number.position,
        }
    }

    /// Copy of these settings with one overlay moved
    pub fn with_position(&self, kind: OsdItemKind, position: OverlayPosition) -> Self {
        let mut next = self.clone();
        match kind {
            OsdItemKind::ChannelName => next.channel_name.position = position,
            OsdItemKind::DateTime => next.date_time.position = position,
            OsdItemKind::SerialNumber => next.serial_number.position = position,
        }
        next
    }

    /// Copy of these settings with a new channel name
    pub fn with_channel_name(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.channel_name.name = name.into();
        next
    }
}
