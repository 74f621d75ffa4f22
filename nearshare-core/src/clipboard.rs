//! Clipboard Copy
//!
//! Copying a snippet or file name is best effort: a rejected write is logged
//! and dropped, never surfaced to the caller.

use crate::item::ShareableItem;
use crate::Result;
use tracing::{debug, warn};

/// Platform clipboard backend
pub trait Clipboard {
    /// Replace the clipboard contents with `text`
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// Copy `text`, logging and dropping any failure
///
/// Returns whether the write went through.
pub fn copy_text(clipboard: &mut dyn Clipboard, text: &str) -> bool {
    match clipboard.set_text(text) {
        Ok(()) => {
            debug!("Copied {} bytes to clipboard", text.len());
            true
        }
        Err(e) => {
            warn!("Failed to write clipboard: {}", e);
            false
        }
    }
}

/// Copy a shareable item: the body of a snippet, the name of a file
pub fn copy_item(clipboard: &mut dyn Clipboard, item: &ShareableItem) -> bool {
    copy_text(clipboard, item.clipboard_text())
}
