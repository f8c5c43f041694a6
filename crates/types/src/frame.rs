//! Rendered output handed to the host's surface writers

use crate::display::{BarColor, BarOverlay};
use crate::surface::SurfaceKind;

/// One rendered refresh of a surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceFrame {
    /// Player-list header/footer. A side is `None` when it has no modules and
    /// should be left untouched.
    Tab {
        header: Option<String>,
        footer: Option<String>,
    },
    ActionBar {
        text: String,
    },
    BossBar {
        text: String,
        /// Fill fraction in `[0, 1]`
        progress: f32,
        color: BarColor,
        overlay: BarOverlay,
    },
}

impl SurfaceFrame {
    pub fn kind(&self) -> SurfaceKind {
        match self {
            SurfaceFrame::Tab { .. } => SurfaceKind::Tab,
            SurfaceFrame::ActionBar { .. } => SurfaceKind::ActionBar,
            SurfaceFrame::BossBar { .. } => SurfaceKind::BossBar,
        }
    }

    /// Main text of the frame (footer for the tab list)
    pub fn text(&self) -> &str {
        match self {
            SurfaceFrame::Tab { header, footer } => footer
                .as_deref()
                .or(header.as_deref())
                .unwrap_or_default(),
            SurfaceFrame::ActionBar { text } => text,
            SurfaceFrame::BossBar { text, .. } => text,
        }
    }
}
