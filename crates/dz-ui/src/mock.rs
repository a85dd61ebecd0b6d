//! In-memory host for testing.
//!
//! Provides a [`MockDom`] page, [`MemoryStorage`], a fixed colour-scheme
//! preference, and a scripted [`MockEventSource`] so the controllers can be
//! exercised without a browser or a network.
//!
//! # Example
//!
//! ```ignore
//! use dz_ui::mock::MockDom;
//! use dz_ui::{Sidebar, SidebarOptions};
//!
//! let mut dom = MockDom::new()
//!     .with_element("sidebar")
//!     .with_element("btn-toggle-sidebar");
//!
//! let sidebar = Sidebar::mount(&mut dom, SidebarOptions::default()).unwrap();
//! assert_eq!(dom.style("sidebar", "width").as_deref(), Some("300px"));
//! ```

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use crate::dom::{Dom, Listener};
use crate::live_reload::driver::{Navigator, Sleep};
use crate::live_reload::transport::{
    Connection, EventSource, Frame, TransportError, TransportErrorKind,
};
use crate::storage::{KeyValueStorage, StorageError};
use crate::theme::ColorScheme;

/// In-memory page.
///
/// Records styles, classes, root attributes, and registered listeners.
/// Operations on unknown ids are ignored and not counted as mutations.
#[derive(Debug, Default)]
pub struct MockDom {
    elements: HashSet<String>,
    styles: HashMap<(String, String), String>,
    classes: HashMap<String, BTreeSet<String>>,
    root_attributes: HashMap<String, String>,
    listeners: Vec<Listener>,
    mutations: usize,
    viewport_width: Option<f64>,
}

impl MockDom {
    /// Create an empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element with the given id.
    #[must_use]
    pub fn with_element(mut self, id: impl Into<String>) -> Self {
        self.elements.insert(id.into());
        self
    }

    /// Set a document root attribute without counting a mutation.
    #[must_use]
    pub fn with_root_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.root_attributes.insert(name.into(), value.into());
        self
    }

    /// Set the viewport width.
    #[must_use]
    pub fn with_viewport_width(mut self, width: f64) -> Self {
        self.viewport_width = Some(width);
        self
    }

    /// Inline style value of an element.
    #[must_use]
    pub fn style(&self, id: &str, property: &str) -> Option<String> {
        self.styles
            .get(&(id.to_owned(), property.to_owned()))
            .cloned()
    }

    /// Whether an element carries a class.
    #[must_use]
    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.classes.get(id).is_some_and(|set| set.contains(class))
    }

    /// Registered listeners, in registration order.
    #[must_use]
    pub fn listeners(&self) -> Vec<Listener> {
        self.listeners.clone()
    }

    /// Whether at least one registration exists for `listener`.
    #[must_use]
    pub fn is_listening(&self, listener: Listener) -> bool {
        self.listeners.contains(&listener)
    }

    /// Number of registrations for `listener`.
    #[must_use]
    pub fn listener_count(&self, listener: Listener) -> usize {
        self.listeners.iter().filter(|l| **l == listener).count()
    }

    /// Number of style, class, and root attribute writes.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }
}

impl Dom for MockDom {
    fn has_element(&self, id: &str) -> bool {
        self.elements.contains(id)
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) {
        if !self.has_element(id) {
            return;
        }
        self.styles
            .insert((id.to_owned(), property.to_owned()), value.to_owned());
        self.mutations += 1;
    }

    fn add_class(&mut self, id: &str, class: &str) {
        if !self.has_element(id) {
            return;
        }
        self.classes
            .entry(id.to_owned())
            .or_default()
            .insert(class.to_owned());
        self.mutations += 1;
    }

    fn remove_class(&mut self, id: &str, class: &str) {
        if !self.has_element(id) {
            return;
        }
        if let Some(set) = self.classes.get_mut(id) {
            set.remove(class);
        }
        self.mutations += 1;
    }

    fn root_attribute(&self, name: &str) -> Option<String> {
        self.root_attributes.get(name).cloned()
    }

    fn set_root_attribute(&mut self, name: &str, value: &str) {
        self.root_attributes
            .insert(name.to_owned(), value.to_owned());
        self.mutations += 1;
    }

    fn viewport_width(&self) -> Option<f64> {
        self.viewport_width
    }

    fn add_listener(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    fn remove_listener(&mut self, listener: Listener) {
        if let Some(pos) = self.listeners.iter().position(|l| *l == listener) {
            self.listeners.remove(pos);
        }
    }
}

/// In-memory key-value storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    unavailable: bool,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose every access fails, like disabled `localStorage`.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            items: HashMap::new(),
            unavailable: true,
        }
    }

    /// Pre-populate an item.
    #[must_use]
    pub fn with_item(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.items.insert(key.into(), value.into());
        self
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::unavailable("storage disabled"));
        }
        Ok(())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Fixed OS colour-scheme preference.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticColorScheme {
    dark: bool,
}

impl StaticColorScheme {
    /// OS prefers dark.
    #[must_use]
    pub fn dark() -> Self {
        Self { dark: true }
    }

    /// OS prefers light (or has no preference).
    #[must_use]
    pub fn light() -> Self {
        Self { dark: false }
    }
}

impl ColorScheme for StaticColorScheme {
    fn prefers_dark(&self) -> bool {
        self.dark
    }
}

/// Shared, ordered log of transport and navigation calls.
#[derive(Clone, Debug, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    fn record(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    /// Recorded entries in call order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

type Script = Vec<Result<Frame, TransportError>>;

/// Scripted event source.
///
/// Each `connect` consumes the next scripted outcome. Once the script is
/// exhausted, connecting fails with a `Connect` error.
#[derive(Debug, Default)]
pub struct MockEventSource {
    outcomes: VecDeque<Result<Script, TransportError>>,
    connects: Vec<String>,
    journal: Journal,
}

impl MockEventSource {
    /// Create a source with no scripted connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record calls into a shared journal.
    #[must_use]
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Script a successful connection yielding `frames`, then end of stream.
    #[must_use]
    pub fn with_connection(mut self, frames: Script) -> Self {
        self.outcomes.push_back(Ok(frames));
        self
    }

    /// Script a failing connection attempt.
    #[must_use]
    pub fn with_connect_error(mut self, err: TransportError) -> Self {
        self.outcomes.push_back(Err(err));
        self
    }

    /// Endpoints passed to `connect`, in order.
    #[must_use]
    pub fn connects(&self) -> Vec<String> {
        self.connects.clone()
    }
}

impl EventSource for MockEventSource {
    type Connection = MockConnection;

    fn connect(&mut self, endpoint: &str) -> Result<MockConnection, TransportError> {
        self.connects.push(endpoint.to_owned());
        self.journal.record(format!("connect {endpoint}"));

        let frames = self.outcomes.pop_front().unwrap_or_else(|| {
            Err(TransportError::new(
                TransportErrorKind::Connect,
                "no scripted connection",
            ))
        })?;
        Ok(MockConnection {
            frames: frames.into(),
            closed: false,
            journal: self.journal.clone(),
        })
    }
}

/// Connection produced by [`MockEventSource`].
#[derive(Debug)]
pub struct MockConnection {
    frames: VecDeque<Result<Frame, TransportError>>,
    closed: bool,
    journal: Journal,
}

impl Connection for MockConnection {
    fn next_frame(&mut self) -> Result<Option<Frame>, TransportError> {
        if self.closed {
            return Ok(None);
        }
        self.frames.pop_front().transpose()
    }

    fn close(&mut self) {
        self.closed = true;
        self.journal.record("close");
    }
}

/// Navigator that counts reloads.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    reloads: u32,
    journal: Journal,
}

impl RecordingNavigator {
    /// Record reloads into a shared journal.
    #[must_use]
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            reloads: 0,
            journal,
        }
    }

    /// Number of reloads performed.
    #[must_use]
    pub fn reloads(&self) -> u32 {
        self.reloads
    }
}

impl Navigator for RecordingNavigator {
    fn reload(&mut self) {
        self.reloads += 1;
        self.journal.record("reload");
    }
}

/// Sleep that records durations instead of waiting.
#[derive(Debug, Default)]
pub struct RecordingSleep {
    sleeps: Vec<Duration>,
}

impl RecordingSleep {
    /// Requested sleeps, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.clone()
    }
}

impl Sleep for RecordingSleep {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
