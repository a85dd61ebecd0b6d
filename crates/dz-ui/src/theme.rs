//! Light/dark theme resolution and toggle.
//!
//! Resolution runs once, synchronously, before the page is shown so the
//! document never renders with the wrong theme. Precedence:
//!
//! 1. stored preference (`theme` key)
//! 2. OS dark colour-scheme preference
//! 3. [`Theme::Light`]
//!
//! The resolved value is written to the `data-theme` attribute of the
//! document root. The toggle button flips the attribute, persists the new
//! value, and re-applies it. Live OS preference changes are not observed.

use std::fmt;
use std::str::FromStr;

use crate::dom::{Dom, EventKind, Listener, PageEvent, THEME_TOGGLE_ID};
use crate::storage::{KeyValueStorage, StorageError};

/// Root attribute carrying the theme.
pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Storage key for the persisted preference.
pub const STORAGE_KEY: &str = "theme";

const TOGGLE_CLICK: Listener = Listener::element(THEME_TOGGLE_ID, EventKind::Click);

/// Colour theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Attribute/storage value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Theme that follows the given root attribute value on toggle.
    ///
    /// An unset attribute counts as `light`; any value other than `light`
    /// (including unrecognised ones) flips to `light`.
    #[must_use]
    pub fn after_toggle(attribute: Option<&str>) -> Self {
        match attribute.unwrap_or("light") {
            "light" => Self::Dark,
            _ => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a theme name.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown theme: {0:?} (expected \"light\" or \"dark\")")]
pub struct ParseThemeError(pub String);

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ParseThemeError(other.to_owned())),
        }
    }
}

/// Theme controller error.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    /// The preference storage could not be read or written.
    #[error("Theme preference: {0}")]
    Storage(#[from] StorageError),
}

/// OS colour-scheme preference.
pub trait ColorScheme {
    /// Whether `(prefers-color-scheme: dark)` matches.
    fn prefers_dark(&self) -> bool;
}

/// Persisted theme preference.
pub trait ThemeStore {
    /// Stored preference, `None` if nothing usable is stored.
    fn get(&self) -> Result<Option<Theme>, ThemeError>;

    /// Persist a preference.
    fn set(&mut self, theme: Theme) -> Result<(), ThemeError>;
}

/// [`ThemeStore`] backed by key-value storage under a single key.
#[derive(Debug)]
pub struct StorageThemeStore<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStorage> StorageThemeStore<S> {
    /// Store the preference under [`STORAGE_KEY`].
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, STORAGE_KEY)
    }

    /// Store the preference under a custom key.
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: KeyValueStorage> ThemeStore for StorageThemeStore<S> {
    fn get(&self) -> Result<Option<Theme>, ThemeError> {
        let Some(value) = self.storage.get_item(&self.key)? else {
            return Ok(None);
        };
        match value.parse() {
            Ok(theme) => Ok(Some(theme)),
            Err(err) => {
                tracing::warn!(key = %self.key, %err, "Ignoring stored theme");
                Ok(None)
            }
        }
    }

    fn set(&mut self, theme: Theme) -> Result<(), ThemeError> {
        self.storage.set_item(&self.key, theme.as_str())?;
        Ok(())
    }
}

/// Resolve the initial theme: stored > OS preference > light.
///
/// # Errors
///
/// Returns [`ThemeError::Storage`] if the store cannot be read.
pub fn resolve_theme<S, C>(store: &S, scheme: &C) -> Result<Theme, ThemeError>
where
    S: ThemeStore + ?Sized,
    C: ColorScheme + ?Sized,
{
    if let Some(theme) = store.get()? {
        return Ok(theme);
    }
    if scheme.prefers_dark() {
        return Ok(Theme::Dark);
    }
    Ok(Theme::Light)
}

/// Theme toggle controller.
#[derive(Debug)]
pub struct ThemeController {
    has_toggle: bool,
}

impl ThemeController {
    /// Resolve the initial theme and apply it to the document root.
    ///
    /// Call before the page is shown.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError::Storage`] if the store cannot be read; the root
    /// attribute is left untouched in that case.
    pub fn init<D, S, C>(dom: &mut D, store: &S, scheme: &C) -> Result<Theme, ThemeError>
    where
        D: Dom + ?Sized,
        S: ThemeStore + ?Sized,
        C: ColorScheme + ?Sized,
    {
        let theme = resolve_theme(store, scheme)?;
        dom.set_root_attribute(THEME_ATTRIBUTE, theme.as_str());
        tracing::debug!(%theme, "Theme resolved");
        Ok(theme)
    }

    /// Attach the toggle button listener if the button exists.
    pub fn mount<D: Dom + ?Sized>(dom: &mut D) -> Self {
        let has_toggle = dom.has_element(THEME_TOGGLE_ID);
        if has_toggle {
            dom.add_listener(TOGGLE_CLICK);
        }
        Self { has_toggle }
    }

    /// Whether the toggle button was found on mount.
    #[must_use]
    pub fn has_toggle(&self) -> bool {
        self.has_toggle
    }

    /// Route a page event to the toggle handler.
    ///
    /// Returns `Ok(None)` if the event is not a toggle click.
    ///
    /// # Errors
    ///
    /// Propagates [`ThemeController::toggle`] errors.
    pub fn handle_event<D, S>(
        &self,
        dom: &mut D,
        store: &mut S,
        event: &PageEvent,
    ) -> Result<Option<Theme>, ThemeError>
    where
        D: Dom + ?Sized,
        S: ThemeStore + ?Sized,
    {
        if !self.has_toggle || event.listener != TOGGLE_CLICK {
            return Ok(None);
        }
        Self::toggle(dom, store).map(Some)
    }

    /// Flip the theme on the root attribute and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError::Storage`] if the preference cannot be written;
    /// the attribute is not changed then, so it keeps matching storage.
    pub fn toggle<D, S>(dom: &mut D, store: &mut S) -> Result<Theme, ThemeError>
    where
        D: Dom + ?Sized,
        S: ThemeStore + ?Sized,
    {
        let current = dom.root_attribute(THEME_ATTRIBUTE);
        let theme = Theme::after_toggle(current.as_deref());

        store.set(theme)?;
        dom.set_root_attribute(THEME_ATTRIBUTE, theme.as_str());
        tracing::debug!(%theme, "Theme toggled");
        Ok(theme)
    }
}
