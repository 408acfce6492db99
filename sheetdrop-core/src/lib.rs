use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIME_SHEET_XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_SHEET_XLS: &str = "application/vnd.ms-excel";
pub const MIME_CSV: &str = "text/csv";

/// The fixed intake allow-list. Matching is exact on the declared MIME string.
pub const ALLOWED_SHEET_MIMES: [&str; 3] = [MIME_SHEET_XLSX, MIME_SHEET_XLS, MIME_CSV];

/// How long a rejection stays visible before its scheduled clear fires.
pub const REJECT_FLASH_DURATION: Duration = Duration::from_millis(1500);

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// One accepted file in the display list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("unsupported file type for {name:?}: {mime:?}")]
    UnsupportedType { name: String, mime: String },
}

pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_SHEET_MIMES.contains(&mime)
}

/// Maps a file-name extension to the MIME type a browser would declare for it.
///
/// This is a name-based guess only; file contents are never inspected, so a
/// renamed file with a spreadsheet extension passes. Unknown extensions yield
/// `None` and the file is rejected downstream.
pub fn declared_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?;
    if extension.eq_ignore_ascii_case("csv") {
        Some(MIME_CSV)
    } else if extension.eq_ignore_ascii_case("xlsx") {
        Some(MIME_SHEET_XLSX)
    } else if extension.eq_ignore_ascii_case("xls") {
        Some(MIME_SHEET_XLS)
    } else {
        None
    }
}

/// Append-only list of accepted files.
///
/// Invariant: every entry's declared MIME type is in [`ALLOWED_SHEET_MIMES`].
/// `accept` re-checks the type, so the invariant holds even if a caller skips
/// classification.
#[derive(Debug, Default)]
pub struct IntakeList {
    entries: Vec<SelectedFile>,
}

impl IntakeList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, file: SelectedFile) -> Result<(), IntakeError> {
        if !is_allowed_mime(&file.mime) {
            return Err(IntakeError::UnsupportedType {
                name: file.name,
                mime: file.mime,
            });
        }
        self.entries.push(file);
        Ok(())
    }

    pub fn entries(&self) -> &[SelectedFile] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries
            .iter()
            .fold(0, |sum, file| sum.saturating_add(file.size_bytes))
    }
}

/// Identifies one rejection's scheduled clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashToken(u64);

/// Transient error state for the most recent rejected file.
///
/// Each rejection issues a fresh token and invalidates the previous one, so a
/// clear scheduled for an older rejection can never erase a newer one.
#[derive(Debug, Default)]
pub struct RejectFlash {
    generation: u64,
    rejected_name: Option<String>,
}

impl RejectFlash {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a rejection and returns the token its scheduled clear must
    /// present to [`RejectFlash::expire`].
    pub fn trip(&mut self, file_name: impl Into<String>) -> FlashToken {
        self.generation += 1;
        self.rejected_name = Some(file_name.into());
        FlashToken(self.generation)
    }

    /// Clears the flash if `token` belongs to the most recent rejection.
    /// Stale tokens are ignored. Returns whether the flash was cleared.
    pub fn expire(&mut self, token: FlashToken) -> bool {
        if token.0 == self.generation && self.rejected_name.is_some() {
            self.rejected_name = None;
            true
        } else {
            false
        }
    }

    /// Unconditional clear, used when a later file is accepted.
    pub fn clear(&mut self) {
        self.rejected_name = None;
    }

    pub fn is_active(&self) -> bool {
        self.rejected_name.is_some()
    }

    pub fn rejected_name(&self) -> Option<&str> {
        self.rejected_name.as_deref()
    }
}

/// Renders a byte count on the base-1024 unit ladder, rounded to two decimal
/// places with trailing zeros trimmed. Zero renders as a literal `0 Bytes`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_owned();
    }

    let exponent = (bytes.ilog2() / 10).min(SIZE_UNITS.len() as u32 - 1);
    let scaled = bytes as f64 / (1_u64 << (10 * exponent)) as f64;
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[exponent as usize])
}
