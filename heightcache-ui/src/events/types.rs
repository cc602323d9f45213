/// Notifications a host view can broadcast to its helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    OrientationChanged,
    ViewportResized { width: u32, height: u32 },
    ContentSizeCategoryChanged,
    MemoryWarning,
}

impl ViewEvent {
    /// Whether previously measured row heights may no longer be valid.
    pub fn is_reconfiguration(&self) -> bool {
        match self {
            ViewEvent::OrientationChanged
            | ViewEvent::ViewportResized { .. }
            | ViewEvent::ContentSizeCategoryChanged => true,
            ViewEvent::MemoryWarning => false,
        }
    }
}
