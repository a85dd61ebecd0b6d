//! Page capability used by the sidebar and theme controllers.
//!
//! Controllers never touch a browser API directly. They address elements by
//! id through the [`Dom`] trait and declare the listeners they need with
//! [`Dom::add_listener`] / [`Dom::remove_listener`]; the host is responsible
//! for routing the matching events back to the controller.
//!
//! # Element Ids
//!
//! | id                   | used by   |
//! |----------------------|-----------|
//! | `sidebar`            | sidebar   |
//! | `btn-toggle-sidebar` | sidebar   |
//! | `sidebar-handle`     | sidebar   |
//! | `btn-toggle-theme`   | theme     |

/// Sidebar container element id.
pub const SIDEBAR_ID: &str = "sidebar";

/// Sidebar toggle button id.
pub const SIDEBAR_TOGGLE_ID: &str = "btn-toggle-sidebar";

/// Sidebar drag handle id.
pub const SIDEBAR_HANDLE_ID: &str = "sidebar-handle";

/// Theme toggle button id.
pub const THEME_TOGGLE_ID: &str = "btn-toggle-theme";

/// Where a listener is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// An element looked up by id.
    Element(&'static str),
    /// The document itself.
    Document,
}

/// DOM event kinds the controllers subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    PointerDown,
    PointerMove,
    PointerUp,
}

impl EventKind {
    /// DOM event type name (e.g., `"pointermove"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::PointerDown => "pointerdown",
            Self::PointerMove => "pointermove",
            Self::PointerUp => "pointerup",
        }
    }
}

/// A listener registration: event kind on a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Listener {
    pub target: Target,
    pub kind: EventKind,
}

impl Listener {
    /// Listener on an element.
    #[must_use]
    pub const fn element(id: &'static str, kind: EventKind) -> Self {
        Self {
            target: Target::Element(id),
            kind,
        }
    }

    /// Listener on the document.
    #[must_use]
    pub const fn document(kind: EventKind) -> Self {
        Self {
            target: Target::Document,
            kind,
        }
    }
}

/// Event delivered by the host to a controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageEvent {
    pub listener: Listener,
    /// Pointer x position in CSS pixels (pointer events only).
    pub x: Option<f64>,
}

impl PageEvent {
    /// Click on an element.
    #[must_use]
    pub const fn click(id: &'static str) -> Self {
        Self {
            listener: Listener::element(id, EventKind::Click),
            x: None,
        }
    }

    /// Pointer event with a horizontal position.
    #[must_use]
    pub const fn pointer(listener: Listener, x: f64) -> Self {
        Self {
            listener,
            x: Some(x),
        }
    }
}

/// Element and listener access for a single page.
///
/// Element operations on an id that does not exist are no-ops.
pub trait Dom {
    /// Whether an element with this id exists.
    fn has_element(&self, id: &str) -> bool;

    /// Set an inline style property on an element.
    fn set_style(&mut self, id: &str, property: &str, value: &str);

    /// Add a class to an element.
    fn add_class(&mut self, id: &str, class: &str);

    /// Remove a class from an element.
    fn remove_class(&mut self, id: &str, class: &str);

    /// Read an attribute of the document root (`<html>`).
    fn root_attribute(&self, name: &str) -> Option<String>;

    /// Set an attribute on the document root (`<html>`).
    fn set_root_attribute(&mut self, name: &str, value: &str);

    /// Viewport width in CSS pixels, if known.
    fn viewport_width(&self) -> Option<f64>;

    /// Start delivering events for `listener`.
    fn add_listener(&mut self, listener: Listener);

    /// Stop delivering events for `listener`.
    fn remove_listener(&mut self, listener: Listener);
}
