//! Sources of the on-screen target region and preview size
//!
//! The pipeline queries the layout fresh on every cycle; nothing here is
//! cached across frames.

use parking_lot::RwLock;

use crate::vision::{Rect, Size};

/// Current on-screen geometry, in display units
pub trait LayoutProvider: Send + Sync {
    /// Target region relative to the preview's top-left corner
    fn target_region(&self) -> Rect;

    /// Preview viewport dimensions
    fn preview_size(&self) -> Size;
}

/// Layout updated by the UI between frames
#[derive(Debug)]
pub struct SharedLayout {
    state: RwLock<(Rect, Size)>,
}

impl SharedLayout {
    pub fn new(target: Rect, preview: Size) -> Self {
        Self {
            state: RwLock::new((target, preview)),
        }
    }

    /// Move or resize the target region
    pub fn set_target_region(&self, target: Rect) {
        self.state.write().0 = target;
    }
}

impl LayoutProvider for SharedLayout {
    fn target_region(&self) -> Rect {
        self.state.read().0
    }

    fn preview_size(&self) -> Size {
        self.state.read().1
    }
}
