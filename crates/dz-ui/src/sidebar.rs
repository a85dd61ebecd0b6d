//! Collapsible, drag-resizable sidebar.
//!
//! The controller mounts only when both the sidebar container and its toggle
//! button are on the page. A drag handle is optional; without it the sidebar
//! can still be opened and closed.
//!
//! # Listener Lifecycle
//!
//! - mount: `click` on the toggle, `pointerdown` on the handle (if present)
//! - pointer-down on the handle: `pointermove` and `pointerup` on the document
//! - pointer-up: both document listeners are removed again
//!
//! The document listeners therefore exist only for the duration of one drag
//! gesture.

use crate::dom::{
    Dom, EventKind, Listener, PageEvent, SIDEBAR_HANDLE_ID, SIDEBAR_ID, SIDEBAR_TOGGLE_ID,
};

/// Sidebar width applied on every page load, in CSS pixels.
pub const DEFAULT_WIDTH: f64 = 300.0;

/// Class marking the closed state.
const CLOSED_CLASS: &str = "closed";

const TOGGLE_CLICK: Listener = Listener::element(SIDEBAR_TOGGLE_ID, EventKind::Click);
const HANDLE_DOWN: Listener = Listener::element(SIDEBAR_HANDLE_ID, EventKind::PointerDown);
const DRAG_MOVE: Listener = Listener::document(EventKind::PointerMove);
const DRAG_UP: Listener = Listener::document(EventKind::PointerUp);

/// Sidebar behavior options.
#[derive(Clone, Debug, PartialEq)]
pub struct SidebarOptions {
    /// Width applied on mount and restored when reopening.
    pub default_width: f64,
    /// Clamp dragged widths to `[0, viewport width]`.
    ///
    /// Off by default: a pointer at or beyond the viewport edge produces an
    /// unclamped width.
    pub clamp_to_viewport: bool,
}

impl Default for SidebarOptions {
    fn default() -> Self {
        Self {
            default_width: DEFAULT_WIDTH,
            clamp_to_viewport: false,
        }
    }
}

/// Mounted sidebar controller.
#[derive(Debug)]
pub struct Sidebar {
    options: SidebarOptions,
    opened: bool,
    width: f64,
    has_handle: bool,
    dragging: bool,
}

impl Sidebar {
    /// Mount the sidebar controller on a page.
    ///
    /// Returns `None` without touching the page when the sidebar container or
    /// the toggle button is missing.
    pub fn mount<D: Dom>(dom: &mut D, options: SidebarOptions) -> Option<Self> {
        if !dom.has_element(SIDEBAR_ID) || !dom.has_element(SIDEBAR_TOGGLE_ID) {
            tracing::debug!("Sidebar elements not found, skipping");
            return None;
        }

        let sidebar = Self {
            width: options.default_width,
            options,
            opened: true,
            has_handle: dom.has_element(SIDEBAR_HANDLE_ID),
            dragging: false,
        };

        sidebar.apply_width(dom, sidebar.width);
        dom.add_listener(TOGGLE_CLICK);
        if sidebar.has_handle {
            dom.add_listener(HANDLE_DOWN);
        }

        tracing::debug!(
            width = sidebar.width,
            resizable = sidebar.has_handle,
            "Sidebar mounted"
        );
        Some(sidebar)
    }

    /// Whether the sidebar is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Width restored when the sidebar is opened.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Whether a drag gesture is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Route a page event to the matching handler.
    ///
    /// Returns `false` if the event is not one the sidebar listens to.
    pub fn handle_event<D: Dom>(&mut self, dom: &mut D, event: &PageEvent) -> bool {
        match (event.listener, event.x) {
            (TOGGLE_CLICK, _) => self.toggle(dom),
            (HANDLE_DOWN, _) if self.has_handle => self.begin_drag(dom),
            (DRAG_MOVE, Some(x)) => self.drag_to(dom, x),
            (DRAG_UP, Some(x)) => self.end_drag(dom, x),
            _ => return false,
        }
        true
    }

    /// Flip between open and closed.
    pub fn toggle<D: Dom>(&mut self, dom: &mut D) {
        self.opened = !self.opened;
        if self.opened {
            self.apply_width(dom, self.width);
            dom.remove_class(SIDEBAR_ID, CLOSED_CLASS);
        } else {
            self.apply_width(dom, 0.0);
            dom.add_class(SIDEBAR_ID, CLOSED_CLASS);
        }
        tracing::debug!(opened = self.opened, "Sidebar toggled");
    }

    /// Start a drag gesture.
    ///
    /// Attaches the document move/up listeners. A closed sidebar is reopened
    /// first. Ignored while a gesture is already running.
    pub fn begin_drag<D: Dom>(&mut self, dom: &mut D) {
        if self.dragging {
            return;
        }
        if !self.opened {
            self.opened = true;
            self.apply_width(dom, self.width);
            dom.remove_class(SIDEBAR_ID, CLOSED_CLASS);
        }

        self.dragging = true;
        dom.add_listener(DRAG_MOVE);
        dom.add_listener(DRAG_UP);
    }

    /// Track the pointer during a drag gesture.
    pub fn drag_to<D: Dom>(&mut self, dom: &mut D, x: f64) {
        if !self.dragging {
            return;
        }
        let width = self.constrain(dom, x);
        self.apply_width(dom, width);
    }

    /// Finish a drag gesture at pointer position `x`.
    ///
    /// Stores the final width and detaches the document listeners.
    pub fn end_drag<D: Dom>(&mut self, dom: &mut D, x: f64) {
        if !self.dragging {
            return;
        }
        let width = self.constrain(dom, x);
        self.apply_width(dom, width);
        self.width = width;

        self.dragging = false;
        dom.remove_listener(DRAG_MOVE);
        dom.remove_listener(DRAG_UP);
        tracing::debug!(width, "Sidebar resized");
    }

    fn constrain<D: Dom>(&self, dom: &D, x: f64) -> f64 {
        if !self.options.clamp_to_viewport {
            return x;
        }
        match dom.viewport_width() {
            Some(max) => x.clamp(0.0, max.max(0.0)),
            None => x.max(0.0),
        }
    }

    #[allow(clippy::unused_self)]
    fn apply_width<D: Dom>(&self, dom: &mut D, width: f64) {
        dom.set_style(SIDEBAR_ID, "width", &format!("{width}px"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDom;
    use pretty_assertions::assert_eq;

    fn page_with_sidebar() -> MockDom {
        MockDom::new()
            .with_element(SIDEBAR_ID)
            .with_element(SIDEBAR_TOGGLE_ID)
    }

    fn resizable_page() -> MockDom {
        page_with_sidebar().with_element(SIDEBAR_HANDLE_ID)
    }

    fn width(dom: &MockDom) -> Option<String> {
        dom.style(SIDEBAR_ID, "width")
    }

    #[test]
    fn test_mount_without_elements_is_noop() {
        let mut dom = MockDom::new();

        assert!(Sidebar::mount(&mut dom, SidebarOptions::default()).is_none());
        assert_eq!(dom.mutation_count(), 0);
        assert!(dom.listeners().is_empty());
    }

    #[test]
    fn test_mount_without_toggle_is_noop() {
        let mut dom = MockDom::new()
            .with_element(SIDEBAR_ID)
            .with_element(SIDEBAR_HANDLE_ID);

        assert!(Sidebar::mount(&mut dom, SidebarOptions::default()).is_none());
        assert_eq!(dom.mutation_count(), 0);
        assert!(dom.listeners().is_empty());
    }

    #[test]
    fn test_mount_applies_default_width() {
        let mut dom = page_with_sidebar();

        let sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        assert!(sidebar.is_open());
        assert_eq!(width(&dom).as_deref(), Some("300px"));
        assert_eq!(dom.listeners(), vec![TOGGLE_CLICK]);
    }

    #[test]
    fn test_mount_with_handle_listens_for_pointer_down() {
        let mut dom = resizable_page();

        Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        assert_eq!(dom.listeners(), vec![TOGGLE_CLICK, HANDLE_DOWN]);
    }

    #[test]
    fn test_toggle_closes_then_reopens() {
        let mut dom = page_with_sidebar();
        let mut sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        assert!(sidebar.handle_event(&mut dom, &PageEvent::click(SIDEBAR_TOGGLE_ID)));
        assert!(!sidebar.is_open());
        assert_eq!(width(&dom).as_deref(), Some("0px"));
        assert!(dom.has_class(SIDEBAR_ID, "closed"));

        assert!(sidebar.handle_event(&mut dom, &PageEvent::click(SIDEBAR_TOGGLE_ID)));
        assert!(sidebar.is_open());
        assert_eq!(width(&dom).as_deref(), Some("300px"));
        assert!(!dom.has_class(SIDEBAR_ID, "closed"));
    }

    #[test]
    fn test_drag_tracks_every_pointer_position() {
        let mut dom = resizable_page();
        let mut sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        sidebar.handle_event(&mut dom, &PageEvent::pointer(HANDLE_DOWN, 300.0));
        assert!(sidebar.is_dragging());
        assert!(dom.is_listening(DRAG_MOVE));
        assert!(dom.is_listening(DRAG_UP));

        for x in [310.0, 342.5, 280.0] {
            sidebar.handle_event(&mut dom, &PageEvent::pointer(DRAG_MOVE, x));
            assert_eq!(width(&dom), Some(format!("{x}px")));
        }

        sidebar.handle_event(&mut dom, &PageEvent::pointer(DRAG_UP, 275.0));
        assert_eq!(width(&dom).as_deref(), Some("275px"));
        assert_eq!(sidebar.width(), 275.0);
    }

    #[test]
    fn test_release_detaches_drag_listeners() {
        let mut dom = resizable_page();
        let mut sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        sidebar.handle_event(&mut dom, &PageEvent::pointer(HANDLE_DOWN, 300.0));
        sidebar.handle_event(&mut dom, &PageEvent::pointer(DRAG_UP, 250.0));

        assert!(!sidebar.is_dragging());
        assert_eq!(dom.listeners(), vec![TOGGLE_CLICK, HANDLE_DOWN]);

        // Moves after release are ignored even if a stale event arrives.
        sidebar.handle_event(&mut dom, &PageEvent::pointer(DRAG_MOVE, 600.0));
        assert_eq!(width(&dom).as_deref(), Some("250px"));
    }

    #[test]
    fn test_second_pointer_down_does_not_duplicate_listeners() {
        let mut dom = resizable_page();
        let mut sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        sidebar.begin_drag(&mut dom);
        sidebar.begin_drag(&mut dom);

        assert_eq!(dom.listener_count(DRAG_MOVE), 1);
        assert_eq!(dom.listener_count(DRAG_UP), 1);
    }

    #[test]
    fn test_reopen_restores_dragged_width() {
        let mut dom = resizable_page();
        let mut sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        sidebar.begin_drag(&mut dom);
        sidebar.end_drag(&mut dom, 420.0);
        sidebar.toggle(&mut dom);
        sidebar.toggle(&mut dom);

        assert_eq!(width(&dom).as_deref(), Some("420px"));
    }

    #[test]
    fn test_drag_from_closed_reopens() {
        let mut dom = resizable_page();
        let mut sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        sidebar.toggle(&mut dom);
        sidebar.begin_drag(&mut dom);

        assert!(sidebar.is_open());
        assert!(!dom.has_class(SIDEBAR_ID, "closed"));
    }

    #[test]
    fn test_press_on_closed_sidebar_restores_width() {
        let mut dom = resizable_page();
        let mut sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        sidebar.toggle(&mut dom);
        assert_eq!(width(&dom).as_deref(), Some("0px"));

        sidebar.begin_drag(&mut dom);

        assert!(sidebar.is_open());
        assert_eq!(width(&dom).as_deref(), Some("300px"));

        sidebar.end_drag(&mut dom, 260.0);
        assert_eq!(width(&dom).as_deref(), Some("260px"));
    }

    #[test]
    fn test_handle_event_ignored_without_handle() {
        let mut dom = page_with_sidebar();
        let mut sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        let handled = sidebar.handle_event(&mut dom, &PageEvent::pointer(HANDLE_DOWN, 10.0));

        assert!(!handled);
        assert!(!sidebar.is_dragging());
    }

    #[test]
    fn test_width_unclamped_by_default() {
        let mut dom = resizable_page().with_viewport_width(1024.0);
        let mut sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();

        sidebar.begin_drag(&mut dom);
        sidebar.drag_to(&mut dom, 1500.0);

        assert_eq!(width(&dom).as_deref(), Some("1500px"));
    }

    #[test]
    fn test_width_clamped_to_viewport_when_enabled() {
        let mut dom = resizable_page().with_viewport_width(1024.0);
        let options = SidebarOptions {
            clamp_to_viewport: true,
            ..SidebarOptions::default()
        };
        let mut sidebar = Sidebar::mount(&mut dom, options).unwrap();

        sidebar.begin_drag(&mut dom);
        sidebar.drag_to(&mut dom, 1500.0);
        assert_eq!(width(&dom).as_deref(), Some("1024px"));

        sidebar.end_drag(&mut dom, -20.0);
        assert_eq!(width(&dom).as_deref(), Some("0px"));
    }

    #[test]
    fn test_custom_default_width() {
        let mut dom = page_with_sidebar();
        let options = SidebarOptions {
            default_width: 240.0,
            ..SidebarOptions::default()
        };

        Sidebar::mount(&mut dom, options).unwrap();

        assert_eq!(width(&dom).as_deref(), Some("240px"));
    }
}
