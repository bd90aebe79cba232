//! Wire types for the device API
//!
//! The poll payload uses single-letter keys to keep responses small on the
//! device; every field is optional and falls back to the firmware default.

use serde::{Deserialize, Serialize};

/// What the display is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Server-rendered dashboard
    #[default]
    #[serde(rename = "dashboard")]
    Dashboard,
    /// A photo from the device's image set
    #[serde(rename = "photo")]
    Image,
}

impl DisplayMode {
    /// The mode name used in query strings and JSON bodies
    pub fn as_wire(&self) -> &'static str {
        match self {
            DisplayMode::Dashboard => "dashboard",
            DisplayMode::Image => "photo",
        }
    }

    /// Parse a wire mode name. Anything other than `photo` is the dashboard.
    pub fn from_wire(value: &str) -> Self {
        if value == "photo" {
            DisplayMode::Image
        } else {
            DisplayMode::Dashboard
        }
    }

    /// The other mode
    pub fn toggled(&self) -> Self {
        match self {
            DisplayMode::Dashboard => DisplayMode::Image,
            DisplayMode::Image => DisplayMode::Dashboard,
        }
    }
}

/// Kind of bitmap to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Dashboard,
    Photo,
}

/// Identifies which bitmap to retrieve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDescriptor {
    pub kind: ContentKind,
    /// Photo index; always 0 for the dashboard
    pub index: u32,
}

impl ContentDescriptor {
    pub fn dashboard() -> Self {
        Self {
            kind: ContentKind::Dashboard,
            index: 0,
        }
    }

    pub fn photo(index: u32) -> Self {
        Self {
            kind: ContentKind::Photo,
            index,
        }
    }

    /// Descriptor for the content shown in `mode`
    pub fn for_mode(mode: DisplayMode, index: u32) -> Self {
        match mode {
            DisplayMode::Dashboard => Self::dashboard(),
            DisplayMode::Image => Self::photo(index),
        }
    }

    /// Value of the `mode` query parameter on the bitmap endpoint
    pub fn query_mode(&self) -> &'static str {
        match self.kind {
            ContentKind::Dashboard => "dashboard",
            ContentKind::Photo => "photo",
        }
    }
}

/// Local state the server diffs against on each poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollRequest {
    pub version: i64,
    pub mode: DisplayMode,
    pub index: u32,
}

/// The server's instruction, as decoded from the wire
///
/// Values are not range-checked; the consumer clamps them before merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResponse {
    pub should_refresh: bool,
    pub mode: DisplayMode,
    pub version: i64,
    pub poll_interval_secs: i64,
    pub index: i64,
    pub total: i64,
}

fn default_mode() -> String {
    "dashboard".to_string()
}

fn default_poll_seconds() -> i64 {
    30
}

/// Raw poll payload: `{"r":bool,"m":str,"v":int,"n":int,"i":int,"t":int}`
#[derive(Debug, Deserialize)]
pub(crate) struct PollPayload {
    #[serde(default)]
    r: bool,
    #[serde(default = "default_mode")]
    m: String,
    #[serde(default)]
    v: i64,
    #[serde(default = "default_poll_seconds")]
    n: i64,
    #[serde(default)]
    i: i64,
    #[serde(default)]
    t: i64,
}

impl From<PollPayload> for PollResponse {
    fn from(payload: PollPayload) -> Self {
        Self {
            should_refresh: payload.r,
            mode: DisplayMode::from_wire(&payload.m),
            version: payload.v,
            poll_interval_secs: payload.n,
            index: payload.i,
            total: payload.t,
        }
    }
}

impl PollResponse {
    /// Decode a poll response body
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<PollPayload>(body).map(PollResponse::from)
    }
}

fn default_rotate_minutes() -> i64 {
    60
}

/// Legacy settings from the image-info endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub current_index: i64,
    #[serde(default = "default_rotate_minutes")]
    pub rotate_minutes: i64,
}

/// Body of the device registration request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub device_id: String,
    pub display_type: String,
    pub firmware_version: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SetModeBody {
    pub mode: DisplayMode,
}

/// Metadata headers sent alongside a bitmap
///
/// These are hints only; none of them decides whether a transfer succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitmapMeta {
    /// `X-Image-Total`
    pub total: Option<u32>,
    /// `X-Image-Index`
    pub index: Option<u32>,
    /// `X-Image-Width`
    pub width: Option<u32>,
    /// `X-Image-Height`
    pub height: Option<u32>,
    /// `X-Content-Type`
    pub content_type: Option<String>,
}

/// A fully received frame and the metadata that came with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub bytes: Vec<u8>,
    pub meta: BitmapMeta,
}
