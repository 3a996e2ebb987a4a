//! Notifications and browser-facing helpers emitted by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const UNSAVED_CHANGES_WARNING: &str =
    "You have unsaved changes. Are you sure you want to leave?";

/// Where a save landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveTarget {
    Local,
    Remote,
}

/// Store notifications, delivered through [`crate::EditorStore::subscribe`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditorEvent {
    Loaded,
    Changed { history_index: usize },
    DirtyChanged { dirty: bool },
    Saved {
        target: SaveTarget,
        timestamp: DateTime<Utc>,
    },
    SaveFailed { message: String },
    Disposed,
}

/// Viewport the preview is rendered for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewDevice {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl PreviewDevice {
    /// Frame width in CSS pixels
    pub fn width(self) -> u32 {
        match self {
            PreviewDevice::Desktop => 1280,
            PreviewDevice::Tablet => 768,
            PreviewDevice::Mobile => 375,
        }
    }
}

/// Leave-page confirmation, shared with whoever owns the window
#[derive(Debug, Clone)]
pub struct UnloadGuard {
    dirty: Arc<AtomicBool>,
}

impl UnloadGuard {
    pub(crate) fn new(dirty: Arc<AtomicBool>) -> Self {
        Self { dirty }
    }

    /// Warning to show before leaving, if there is unsaved work
    pub fn check(&self) -> Option<&'static str> {
        self.dirty
            .load(Ordering::Acquire)
            .then_some(UNSAVED_CHANGES_WARNING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unload_guard_follows_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = UnloadGuard::new(flag.clone());
        assert_eq!(guard.check(), None);

        flag.store(true, Ordering::Release);
        assert_eq!(guard.check(), Some(UNSAVED_CHANGES_WARNING));
    }

    #[test]
    fn test_event_serialization() {
        let value = serde_json::to_value(EditorEvent::Changed { history_index: 2 }).unwrap();
        assert_eq!(value["type"], "changed");
        assert_eq!(value["historyIndex"], 2);
    }
}
