//! Device capabilities the scanner screen is wired to.
//!
//! Every call that talks to the device is async: permission prompts,
//! position fixes and the image picker all suspend the screen.

pub mod desktop;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LocationError;
use crate::history::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbology {
    Qr,
    Other(String),
}

impl Symbology {
    pub fn as_str(&self) -> &str {
        match self {
            Symbology::Qr => "qr",
            Symbology::Other(name) => name,
        }
    }
}

impl FromStr for Symbology {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Ok(match name.as_str() {
            "qr" | "qrcode" | "qr_code" => Symbology::Qr,
            _ => Symbology::Other(name),
        })
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One successful read from the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeEvent {
    pub symbology: Symbology,
    pub payload: String,
}

impl DecodeEvent {
    pub fn qr(payload: impl Into<String>) -> Self {
        DecodeEvent {
            symbology: Symbology::Qr,
            payload: payload.into(),
        }
    }

    /// Parse one line of a decode stream.
    ///
    /// `[ean13] 4006381333931` carries an explicit symbology, anything
    /// else is a QR payload taken verbatim.
    pub fn parse_line(line: &str) -> Self {
        if let Some(rest) = line.strip_prefix('[') {
            if let Some((tag, payload)) = rest.split_once(']') {
                if let Ok(symbology) = tag.parse::<Symbology>() {
                    return DecodeEvent {
                        symbology,
                        payload: payload.trim_start().to_string(),
                    };
                }
            }
        }
        DecodeEvent::qr(line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ask for foreground location access. Called on every save.
    async fn request_permission(&self) -> Permission;

    /// One position fix. Only called after permission was granted.
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickResult {
    pub canceled: bool,
    pub image: Option<PickedImage>,
}

impl PickResult {
    pub fn canceled() -> Self {
        PickResult { canceled: true, image: None }
    }

    pub fn picked(image: PickedImage) -> Self {
        PickResult { canceled: false, image: Some(image) }
    }
}

#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn pick_image(&self) -> PickResult;
}

#[async_trait]
impl<T: ImagePicker + ?Sized> ImagePicker for Arc<T> {
    async fn pick_image(&self) -> PickResult {
        (**self).pick_image().await
    }
}

/// A modal message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: &'static str,
}

/// Navigation and notification surface of the host app.
pub trait Surface: Send + Sync {
    fn alert(&self, notice: &Notice);

    /// Leave the scanner and return to the previous screen.
    fn go_back(&self);
}

impl<T: Surface + ?Sized> Surface for Arc<T> {
    fn alert(&self, notice: &Notice) {
        (**self).alert(notice)
    }

    fn go_back(&self) {
        (**self).go_back()
    }
}
