//! Host-independent page assembly.
//!
//! A host reads [`PageOptions`] from the document root, applies the theme,
//! then mounts [`PageComponents`] either immediately or on the window `load`
//! event depending on [`MountTiming`]. Page events are routed through
//! [`PageComponents::dispatch`].
//!
//! Sites configure the components with attributes on the root element:
//!
//! ```text
//! <html data-sidebar-width="260" data-sidebar-clamp="true"
//!       data-live-reload-endpoint="/ss-events">
//! ```
//!
//! Missing attributes keep their defaults. Invalid ones are logged and
//! ignored.

use crate::dom::{Dom, PageEvent};
use crate::live_reload::LiveReloadOptions;
use crate::sidebar::{Sidebar, SidebarOptions};
use crate::theme::{ThemeController, ThemeError, ThemeStore};

/// Root attribute holding the sidebar width in CSS pixels.
pub const SIDEBAR_WIDTH_ATTRIBUTE: &str = "data-sidebar-width";

/// Root attribute enabling viewport clamping (`true`/`false`).
pub const SIDEBAR_CLAMP_ATTRIBUTE: &str = "data-sidebar-clamp";

/// Root attribute holding the event-stream endpoint path.
pub const LIVE_RELOAD_ENDPOINT_ATTRIBUTE: &str = "data-live-reload-endpoint";

/// `document.readyState` once the `load` event has fired.
const READY_STATE_COMPLETE: &str = "complete";

/// Options for every component on a page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageOptions {
    pub sidebar: SidebarOptions,
    pub live_reload: LiveReloadOptions,
}

impl PageOptions {
    /// Read options from the document root attributes.
    pub fn from_dom<D: Dom + ?Sized>(dom: &D) -> Self {
        let mut options = Self::default();

        if let Some(value) = dom.root_attribute(SIDEBAR_WIDTH_ATTRIBUTE) {
            match value.trim().parse::<f64>() {
                Ok(width) if width.is_finite() && width > 0.0 => {
                    options.sidebar.default_width = width;
                }
                _ => invalid(SIDEBAR_WIDTH_ATTRIBUTE, &value),
            }
        }

        if let Some(value) = dom.root_attribute(SIDEBAR_CLAMP_ATTRIBUTE) {
            match value.trim() {
                "true" => options.sidebar.clamp_to_viewport = true,
                "false" => options.sidebar.clamp_to_viewport = false,
                _ => invalid(SIDEBAR_CLAMP_ATTRIBUTE, &value),
            }
        }

        if let Some(value) = dom.root_attribute(LIVE_RELOAD_ENDPOINT_ATTRIBUTE) {
            let endpoint = value.trim();
            if endpoint.starts_with('/') {
                endpoint.clone_into(&mut options.live_reload.endpoint);
            } else {
                invalid(LIVE_RELOAD_ENDPOINT_ATTRIBUTE, &value);
            }
        }

        options
    }
}

fn invalid(attribute: &str, value: &str) {
    tracing::warn!(attribute, value, "Ignoring invalid page attribute");
}

/// When to mount the page components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountTiming {
    /// The page has finished loading; mount right away.
    Now,
    /// Wait for the window `load` event.
    OnLoad,
}

impl MountTiming {
    /// Pick the timing for a `document.readyState` value.
    ///
    /// A module started after `load` never sees the event, so a complete
    /// document mounts immediately.
    #[must_use]
    pub fn for_ready_state(ready_state: &str) -> Self {
        if ready_state == READY_STATE_COMPLETE {
            Self::Now
        } else {
            Self::OnLoad
        }
    }
}

/// Sidebar and theme toggle mounted on one page.
#[derive(Debug, Default)]
pub struct PageComponents {
    sidebar: Option<Sidebar>,
    theme: Option<ThemeController>,
}

impl PageComponents {
    /// Mount the sidebar and the theme toggle.
    pub fn mount<D: Dom>(dom: &mut D, options: &SidebarOptions) -> Self {
        Self {
            sidebar: Sidebar::mount(dom, options.clone()),
            theme: Some(ThemeController::mount(dom)),
        }
    }

    /// The sidebar, if its elements were found.
    #[must_use]
    pub fn sidebar(&self) -> Option<&Sidebar> {
        self.sidebar.as_ref()
    }

    /// Whether [`PageComponents::mount`] has run.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.theme.is_some()
    }

    /// Route a page event to the component that listens for it.
    ///
    /// Returns `Ok(false)` if no component handled the event.
    ///
    /// # Errors
    ///
    /// Propagates theme toggle errors.
    pub fn dispatch<D, S>(
        &mut self,
        dom: &mut D,
        store: &mut S,
        event: &PageEvent,
    ) -> Result<bool, ThemeError>
    where
        D: Dom,
        S: ThemeStore + ?Sized,
    {
        if let Some(sidebar) = self.sidebar.as_mut()
            && sidebar.handle_event(dom, event)
        {
            return Ok(true);
        }
        match self.theme.as_ref() {
            Some(theme) => Ok(theme.handle_event(dom, store, event)?.is_some()),
            None => Ok(false),
        }
    }
}
