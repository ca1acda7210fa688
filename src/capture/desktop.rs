//! Capabilities for running the scanner from a terminal.
//!
//! There is no camera or GPS here: the position comes from the config
//! file, the picker hands out paths queued by the caller, and alerts are
//! printed to stdout.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use super::{ImagePicker, LocationProvider, Notice, Permission, PickResult, PickedImage, Surface};
use crate::error::LocationError;
use crate::history::Coordinates;

/// A configured position, optionally with permission withheld.
pub struct FixedLocation {
    granted: bool,
    position: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(granted: bool, position: Option<Coordinates>) -> Self {
        FixedLocation { granted, position }
    }

    pub fn denied() -> Self {
        FixedLocation { granted: false, position: None }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn request_permission(&self) -> Permission {
        if self.granted {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.position
            .ok_or_else(|| LocationError::Unavailable("no position configured".to_string()))
    }
}

/// Picker that returns whichever path was queued with [`PathPicker::choose`].
#[derive(Default)]
pub struct PathPicker {
    next: Mutex<Option<PathBuf>>,
}

impl PathPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choose(&self, path: PathBuf) {
        if let Ok(mut next) = self.next.lock() {
            *next = Some(path);
        }
    }

    fn take(&self) -> Option<PathBuf> {
        self.next.lock().ok().and_then(|mut next| next.take())
    }
}

#[async_trait]
impl ImagePicker for PathPicker {
    async fn pick_image(&self) -> PickResult {
        let Some(path) = self.take() else {
            return PickResult::canceled();
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => PickResult::picked(PickedImage { path, bytes }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read selected image");
                PickResult::canceled()
            }
        }
    }
}

/// Prints alerts and remembers whether the screen asked to be closed.
#[derive(Default)]
pub struct ConsoleSurface {
    back_requested: AtomicBool,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn back_requested(&self) -> bool {
        self.back_requested.load(Ordering::SeqCst)
    }
}

impl Surface for ConsoleSurface {
    fn alert(&self, notice: &Notice) {
        println!("{}: {}", notice.title, notice.message);
    }

    fn go_back(&self) {
        self.back_requested.store(true, Ordering::SeqCst);
    }
}
