//! The scanner screen.
//!
//! Holds the pending scan, the in-flight flag and the lifecycle
//! subscription for one mounted screen. All methods take `&self` and are
//! driven from a single task; state lives in `Cell`/`RefCell` and no
//! borrow is held across an await.
//!
//! Queued lifecycle transitions are applied before every operation that
//! reads or changes the pending scan, so a resume is never observed late.

use std::cell::{Cell, RefCell};

use tracing::{debug, error};

use crate::capture::{DecodeEvent, ImagePicker, Notice, Surface};
use crate::error::StoreError;
use crate::history::HistoryEntry;
use crate::lifecycle::{AppState, LifecycleBus, Subscription};
use crate::recorder::HistoryRecorder;
use crate::scanner::{ScanMode, ScanSession, ScanTransition};

pub const SAVED: Notice = Notice {
    title: "Success",
    message: "Entry added successfully!",
};

pub const SAVE_FAILED: Notice = Notice {
    title: "Error",
    message: "Failed to add Entry!",
};

pub const GALLERY_UNSUPPORTED: Notice = Notice {
    title: "Feature not implemented",
    message: "Decoding QR from gallery is not yet implemented.",
};

#[derive(Debug)]
pub enum SaveOutcome {
    Saved(HistoryEntry),
    Failed(StoreError),
    /// Nothing pending, or a save already in flight.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryOutcome {
    Cancelled,
    Unsupported,
}

/// Sets the flag for as long as it lives.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        InFlight(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct ScannerScreen {
    recorder: HistoryRecorder,
    surface: Box<dyn Surface>,
    picker: Box<dyn ImagePicker>,
    session: RefCell<ScanSession>,
    saving: Cell<bool>,
    lifecycle: RefCell<Subscription>,
}

impl ScannerScreen {
    /// Mount the screen and start listening for app state changes.
    pub fn mount(
        recorder: HistoryRecorder,
        surface: Box<dyn Surface>,
        picker: Box<dyn ImagePicker>,
        bus: &LifecycleBus,
    ) -> Self {
        ScannerScreen {
            recorder,
            surface,
            picker,
            session: RefCell::new(ScanSession::new()),
            saving: Cell::new(false),
            lifecycle: RefCell::new(bus.subscribe()),
        }
    }

    /// Tear the screen down, releasing the lifecycle listener.
    pub fn unmount(self) {
        debug!("scanner screen unmounted");
    }

    pub fn pending(&self) -> Option<String> {
        self.sync_lifecycle();
        self.session.borrow().pending().map(str::to_owned)
    }

    pub fn mode(&self) -> ScanMode {
        self.sync_lifecycle();
        self.session.borrow().mode()
    }

    /// True while a save is running; the save control is disabled.
    pub fn is_saving(&self) -> bool {
        self.saving.get()
    }

    pub fn on_decode(&self, event: &DecodeEvent) -> ScanTransition {
        self.sync_lifecycle();
        self.session.borrow_mut().on_decode(event)
    }

    pub fn scan_again(&self) {
        self.sync_lifecycle();
        self.session.borrow_mut().clear();
    }

    pub fn on_app_state(&self, state: AppState) {
        if state == AppState::Active {
            debug!("app resumed, dropping pending scan");
            self.session.borrow_mut().clear();
        }
    }

    /// Apply every queued lifecycle transition. Returns how many were seen.
    pub fn sync_lifecycle(&self) -> usize {
        let mut seen = 0;
        loop {
            let next = self.lifecycle.borrow_mut().try_next();
            let Some(state) = next else { break };
            self.on_app_state(state);
            seen += 1;
        }
        seen
    }

    /// Save the pending scan to history.
    ///
    /// On success the user is told and the screen navigates back. On a
    /// storage failure the pending scan is kept so the user can retry.
    pub async fn confirm_save(&self) -> SaveOutcome {
        if self.saving.get() {
            debug!("save already in flight");
            return SaveOutcome::Skipped;
        }
        let Some(data) = self.pending() else {
            return SaveOutcome::Skipped;
        };

        let _in_flight = InFlight::enter(&self.saving);

        match self.recorder.record(&data).await {
            Ok(entry) => {
                self.sync_lifecycle();
                self.session.borrow_mut().clear_if(&data);
                self.surface.alert(&SAVED);
                self.surface.go_back();
                SaveOutcome::Saved(entry)
            }
            Err(e) => {
                error!(error = %e, "failed to save history entry");
                self.surface.alert(&SAVE_FAILED);
                SaveOutcome::Failed(e)
            }
        }
    }

    /// Pick an image from the gallery. Decoding from images is not supported.
    pub async fn import_from_gallery(&self) -> GalleryOutcome {
        let result = self.picker.pick_image().await;
        if result.canceled {
            return GalleryOutcome::Cancelled;
        }

        if let Some(image) = &result.image {
            debug!(path = %image.path.display(), bytes = image.bytes.len(), "image selected");
        }
        self.surface.alert(&GALLERY_UNSUPPORTED);
        GalleryOutcome::Unsupported
    }
}
