//! Handing a prefilled link to the user: copy it, or share it where the
//! platform has a share sheet.
//!
//! Neither operation fails loudly. The caller gets `true` or `false` and
//! the reason is logged.

use tracing::{error, info};

use crate::error::FormsError;

/// Somewhere text can be copied to.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), FormsError>;
}

/// A native share dialog.
pub trait ShareSheet {
    fn is_available(&self) -> bool;
    fn share(&mut self, title: &str, url: &str) -> Result<(), FormsError>;
}

/// The desktop clipboard.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(not(target_arch = "wasm32"))]
impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), FormsError> {
        use arboard::Clipboard;

        let mut clipboard =
            Clipboard::new().map_err(|e| FormsError::ClipboardError(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| FormsError::ClipboardError(e.to_string()))
    }
}

/// A platform without a share sheet; sharing always falls back to copying.
#[derive(Debug, Default)]
pub struct NoShareSheet;

impl ShareSheet for NoShareSheet {
    fn is_available(&self) -> bool {
        false
    }

    fn share(&mut self, _title: &str, _url: &str) -> Result<(), FormsError> {
        Err(FormsError::ClipboardError("no share sheet on this platform".to_string()))
    }
}

pub fn copy_to_clipboard(sink: &mut dyn ClipboardSink, text: &str) -> bool {
    match sink.set_text(text) {
        Ok(()) => {
            info!(chars = text.chars().count(), "copied to clipboard");
            true
        }
        Err(e) => {
            error!(error = %e, "could not copy to clipboard");
            false
        }
    }
}

/// Share through the sheet when there is one, otherwise copy the link.
/// A sheet that fails does not fall back.
pub fn share_url(
    sheet: &mut dyn ShareSheet,
    clipboard: &mut dyn ClipboardSink,
    url: &str,
    title: &str,
) -> bool {
    if !sheet.is_available() {
        return copy_to_clipboard(clipboard, url);
    }
    match sheet.share(title, url) {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "could not share link");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingClipboard {
        copied: Vec<String>,
        broken: bool,
    }

    impl ClipboardSink for RecordingClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), FormsError> {
            if self.broken {
                return Err(FormsError::ClipboardError("denied".to_string()));
            }
            self.copied.push(text.to_string());
            Ok(())
        }
    }

    struct FakeSheet {
        shared: Vec<(String, String)>,
        fails: bool,
    }

    impl ShareSheet for FakeSheet {
        fn is_available(&self) -> bool {
            true
        }

        fn share(&mut self, title: &str, url: &str) -> Result<(), FormsError> {
            if self.fails {
                return Err(FormsError::ClipboardError("dismissed".to_string()));
            }
            self.shared.push((title.to_string(), url.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_copy_reports_success_and_failure() {
        let mut ok = RecordingClipboard::default();
        assert!(copy_to_clipboard(&mut ok, "https://x/forms/ata_apresentacao"));
        assert_eq!(ok.copied.len(), 1);

        let mut broken = RecordingClipboard {
            broken: true,
            ..Default::default()
        };
        assert!(!copy_to_clipboard(&mut broken, "https://x"));
    }

    #[test]
    fn test_share_falls_back_to_clipboard() {
        let mut clipboard = RecordingClipboard::default();
        assert!(share_url(&mut NoShareSheet, &mut clipboard, "https://x/a", "Ata"));
        assert_eq!(clipboard.copied, vec!["https://x/a".to_string()]);
    }

    #[test]
    fn test_share_sheet_used_when_available() {
        let mut clipboard = RecordingClipboard::default();
        let mut sheet = FakeSheet {
            shared: Vec::new(),
            fails: false,
        };
        assert!(share_url(&mut sheet, &mut clipboard, "https://x/a", "Ata"));
        assert_eq!(sheet.shared, vec![("Ata".to_string(), "https://x/a".to_string())]);
        assert!(clipboard.copied.is_empty());
    }

    #[test]
    fn test_failed_share_does_not_copy() {
        let mut clipboard = RecordingClipboard::default();
        let mut sheet = FakeSheet {
            shared: Vec::new(),
            fails: true,
        };
        assert!(!share_url(&mut sheet, &mut clipboard, "https://x/a", "Ata"));
        assert!(clipboard.copied.is_empty());
    }
}
