//! Sidebar collapse state derived from the viewport width.
//!
//! The controller recomputes on every resize signal without debouncing; the derived
//! value is idempotent so bursts of resize events are harmless.

use super::observers::{Observers, Subscription};
use std::{cell::Cell, fmt, rc::Rc};
use tracing::trace;

/// Widths at or below this value collapse the sidebar.
pub const COLLAPSE_BREAKPOINT: u32 = 768;
pub const COLLAPSED_SIDEBAR_WIDTH: u32 = 80;
pub const EXPANDED_SIDEBAR_WIDTH: u32 = 200;

#[must_use]
pub const fn collapsed_for(width: u32) -> bool {
    width <= COLLAPSE_BREAKPOINT
}

/// Process-wide layout flag. Clones share the same value.
#[derive(Clone, Debug, Default)]
pub struct LayoutState {
    collapsed: Rc<Cell<bool>>,
}

impl LayoutState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed.get()
    }

    #[must_use]
    pub fn sidebar_width(&self) -> u32 {
        if self.is_collapsed() {
            COLLAPSED_SIDEBAR_WIDTH
        } else {
            EXPANDED_SIDEBAR_WIDTH
        }
    }

    fn apply(&self, width: u32) {
        self.collapsed.set(collapsed_for(width));
    }
}

/// Source of viewport-resize signals.
#[derive(Clone)]
pub struct Viewport {
    width: Rc<Cell<u32>>,
    listeners: Observers<u32>,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32) -> Self {
        Self {
            width: Rc::new(Cell::new(width)),
            listeners: Observers::new(),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width.get()
    }

    /// Records a new width and signals every listener synchronously.
    pub fn resize(&self, width: u32) {
        self.width.set(width);
        self.listeners.notify(&width);
    }

    pub fn on_resize(&self, listener: impl Fn(&u32) + 'static) -> Subscription {
        self.listeners.subscribe(listener)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("width", &self.width.get())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Keeps a [`LayoutState`] in sync with a [`Viewport`] while mounted.
#[derive(Debug)]
pub struct ResponsiveLayout {
    state: LayoutState,
    _listener: Subscription,
}

impl ResponsiveLayout {
    /// Applies the current width once, then follows resize signals until dropped.
    #[must_use]
    pub fn mount(viewport: &Viewport, state: LayoutState) -> Self {
        state.apply(viewport.width());

        let listener = {
            let state = state.clone();
            viewport.on_resize(move |width| {
                trace!(width, "viewport resized");
                state.apply(*width);
            })
        };

        Self {
            state,
            _listener: listener,
        }
    }

    #[must_use]
    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    /// Deregisters the resize listener.
    pub fn unmount(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_inclusive() {
        assert!(collapsed_for(0));
        assert!(collapsed_for(767));
        assert!(collapsed_for(768));
        assert!(!collapsed_for(769));
        assert!(!collapsed_for(1920));
    }

    #[test]
    fn collapsed_matches_width_for_every_width() {
        for width in (0..=2_000).step_by(7).chain([768, 769]) {
            let viewport = Viewport::new(width);
            let layout = ResponsiveLayout::mount(&viewport, LayoutState::new());
            assert_eq!(layout.state().is_collapsed(), width <= 768, "width {width}");
        }
    }

    #[test]
    fn mount_applies_current_width() {
        let viewport = Viewport::new(600);
        let layout = ResponsiveLayout::mount(&viewport, LayoutState::new());
        assert!(layout.state().is_collapsed());
        assert_eq!(layout.state().sidebar_width(), COLLAPSED_SIDEBAR_WIDTH);
    }

    #[test]
    fn follows_resize_signals() {
        let viewport = Viewport::new(1280);
        let state = LayoutState::new();
        let _layout = ResponsiveLayout::mount(&viewport, state.clone());
        assert!(!state.is_collapsed());

        viewport.resize(768);
        assert!(state.is_collapsed());
        viewport.resize(769);
        assert!(!state.is_collapsed());
        assert_eq!(state.sidebar_width(), EXPANDED_SIDEBAR_WIDTH);
    }

    #[test]
    fn rapid_resizes_settle_on_last_width() {
        let viewport = Viewport::new(1024);
        let state = LayoutState::new();
        let _layout = ResponsiveLayout::mount(&viewport, state.clone());

        for width in [900, 700, 768, 769, 500, 500, 1200, 640] {
            viewport.resize(width);
        }
        assert!(state.is_collapsed());
    }

    #[test]
    fn unmount_deregisters_listener() {
        let viewport = Viewport::new(1280);
        let state = LayoutState::new();
        let layout = ResponsiveLayout::mount(&viewport, state.clone());
        assert_eq!(viewport.listener_count(), 1);

        layout.unmount();
        assert_eq!(viewport.listener_count(), 0);

        viewport.resize(320);
        assert!(!state.is_collapsed());
    }
}
