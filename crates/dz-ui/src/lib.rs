//! Page components for dz documentation sites.
//!
//! Three independent components, each mounted once per page load:
//!
//! - [`Sidebar`]: collapsible sidebar with a drag-resize handle
//! - [`ThemeController`]: light/dark theme resolved from storage or the OS
//!   preference, toggled and persisted on click
//! - [`LiveReload`]: reloads the page when the docs server pushes an event
//!
//! [`PageComponents`] mounts the sidebar and theme toggle together and routes
//! page events to them; [`PageOptions`] reads their settings from the
//! document root.
//!
//! # Architecture
//!
//! Controllers talk to the page only through capability traits:
//!
//! ```text
//! Sidebar ──────────► Dom (elements, styles, classes, listeners)
//! ThemeController ──► Dom (root attribute), ThemeStore, ColorScheme
//! LiveReload ───────► Command ──► driver ──► EventSource / Navigator / Sleep
//! ```
//!
//! Hosts implement the traits:
//!
//! - [`mock`] (behind `mock` feature): in-memory page for tests
//! - [`web`] (behind `web` feature): `web-sys` bindings, installs all three
//!   components on a real page
//! - `dz-sse`: native blocking [`EventSource`] over HTTP
//!
//! # Example
//!
//! ```ignore
//! use dz_ui::mock::{MemoryStorage, MockDom, StaticColorScheme};
//! use dz_ui::{StorageThemeStore, ThemeController};
//!
//! let mut dom = MockDom::new().with_element("btn-toggle-theme");
//! let mut store = StorageThemeStore::new(MemoryStorage::new());
//!
//! ThemeController::init(&mut dom, &store, &StaticColorScheme::dark())?;
//! ThemeController::toggle(&mut dom, &mut store)?; // now light
//! ```

pub mod dom;
pub mod live_reload;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod page;
mod sidebar;
mod storage;
mod theme;
#[cfg(feature = "web")]
pub mod web;

pub use dom::{Dom, EventKind, Listener, PageEvent, Target};
pub use live_reload::{
    Command, Connection, ConnectionState, DEFAULT_ENDPOINT, DEFAULT_EVENT_TYPE,
    DEFAULT_RECONNECT_DELAY, EventSource, Frame, LiveReload, LiveReloadOptions, MessageEvent,
    Navigator, Outcome, ReconnectPolicy, Sleep, ThreadSleep, TransportError, TransportErrorKind,
    run_blocking,
};
pub use page::{
    LIVE_RELOAD_ENDPOINT_ATTRIBUTE, MountTiming, PageComponents, PageOptions, SIDEBAR_CLAMP_ATTRIBUTE,
    SIDEBAR_WIDTH_ATTRIBUTE,
};
pub use sidebar::{DEFAULT_WIDTH, Sidebar, SidebarOptions};
pub use storage::{KeyValueStorage, StorageError, StorageErrorKind};
pub use theme::{
    ColorScheme, ParseThemeError, STORAGE_KEY, StorageThemeStore, THEME_ATTRIBUTE, Theme,
    ThemeController, ThemeError, ThemeStore, resolve_theme,
};
