use std::path::PathBuf;

use sheetdrop_core::{
    FlashToken, IntakeList, RejectFlash, SelectedFile, declared_mime, is_allowed_mime,
};
use tracing::{info, warn};

/// Outcome of one asynchronous file read, applied on the UI thread.
#[derive(Debug)]
pub enum IntakeEvent {
    Accepted(SelectedFile),
    Rejected { name: String, mime: String },
    FlashExpired(FlashToken),
}

/// UI-side intake state: the display list plus the transient error flash.
#[derive(Debug, Default)]
pub struct IntakePanelState {
    list: IntakeList,
    flash: RejectFlash,
}

impl IntakePanelState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one intake event. Returns a token when a new flash was
    /// tripped; the caller schedules its clear for that token.
    pub fn apply(&mut self, event: IntakeEvent) -> Option<FlashToken> {
        match event {
            IntakeEvent::Accepted(file) => match self.list.accept(file) {
                Ok(()) => {
                    self.flash.clear();
                    None
                }
                // The list re-checks the allow-list; a misclassified file is
                // treated like any other rejection.
                Err(err) => {
                    warn!("intake append refused: {err}");
                    match err {
                        sheetdrop_core::IntakeError::UnsupportedType { name, .. } => {
                            Some(self.flash.trip(name))
                        }
                    }
                }
            },
            IntakeEvent::Rejected { name, mime } => {
                info!(file = %name, mime = %mime, "rejected unsupported file type");
                Some(self.flash.trip(name))
            }
            IntakeEvent::FlashExpired(token) => {
                self.flash.expire(token);
                None
            }
        }
    }

    pub fn entries(&self) -> &[SelectedFile] {
        self.list.entries()
    }

    pub fn total_bytes(&self) -> u64 {
        self.list.total_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn flash_file(&self) -> Option<&str> {
        self.flash.rejected_name()
    }
}

/// Reads one dropped or picked file and classifies it.
///
/// A non-empty `hinted_mime` from the windowing layer is trusted verbatim;
/// otherwise the type is derived from the file-name extension. The size comes
/// from file metadata; contents are never read. Reads run independently per
/// file, so completion order need not match drop order.
pub async fn read_file_entry(path: PathBuf, hinted_mime: String) -> IntakeEvent {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mime = if hinted_mime.is_empty() {
        declared_mime(&path).unwrap_or_default().to_owned()
    } else {
        hinted_mime
    };

    if !is_allowed_mime(&mime) {
        return IntakeEvent::Rejected { name, mime };
    }

    match tokio::fs::metadata(&path).await {
        Ok(metadata) => IntakeEvent::Accepted(SelectedFile {
            name,
            size_bytes: metadata.len(),
            mime,
        }),
        Err(err) => {
            warn!(file = %name, "intake read failed: {err}");
            IntakeEvent::Rejected { name, mime }
        }
    }
}
