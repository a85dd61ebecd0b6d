//! Browser host (`web` feature).
//!
//! Binds the controllers to a real page through `web-sys`:
//!
//! - the theme is resolved and applied as soon as the module starts
//! - the live-reload `EventSource` is opened immediately
//! - the sidebar and theme toggle are mounted on the window `load` event, or
//!   right away if the document has already finished loading
//!
//! Component options come from the document root attributes (see
//! [`PageOptions`]).
//!
//! Listener registrations requested through [`Dom::add_listener`] become
//! `addEventListener` calls whose callbacks route back into the mounted
//! controllers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::dom::{Dom, Listener, PageEvent, Target};
use crate::live_reload::{
    Command, LiveReload, LiveReloadOptions, MessageEvent, TransportError, TransportErrorKind,
};
use crate::page::{MountTiming, PageComponents, PageOptions};
use crate::sidebar::SidebarOptions;
use crate::storage::{KeyValueStorage, StorageError};
use crate::theme::{ColorScheme, StorageThemeStore, ThemeController, ThemeError};

/// `EventSource.readyState` once the browser has failed the connection.
const EVENT_SOURCE_CLOSED: u16 = 2;

type EventClosure = Closure<dyn FnMut(web_sys::Event)>;

/// Install all page components on the current page.
///
/// # Errors
///
/// Returns the theme storage error (as a JS value) if the preference could
/// not be read. The sidebar and live reload are installed regardless.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let timing = MountTiming::for_ready_state(&document.ready_state());

    let page = WebPage::new(window.clone(), document);
    let options = PageOptions::from_dom(&page.borrow().dom);
    let theme_result = page.borrow_mut().init_theme();

    WebLiveReload::start(window.clone(), options.live_reload)?;

    match timing {
        MountTiming::Now => page.borrow_mut().mount(&options.sidebar),
        MountTiming::OnLoad => {
            let on_load = {
                let page = Rc::clone(&page);
                let sidebar = options.sidebar;
                Closure::once_into_js(move || page.borrow_mut().mount(&sidebar))
            };
            window.add_event_listener_with_callback("load", on_load.unchecked_ref())?;
        }
    }
    keep_alive(page);

    theme_result.map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Keep a component alive for the rest of the page's life.
///
/// Callbacks only hold weak references; navigation tears the page down.
fn keep_alive<T>(component: Rc<T>) {
    std::mem::forget(component);
}

/// `localStorage` wrapper.
pub struct WebStorage {
    storage: Option<web_sys::Storage>,
}

impl WebStorage {
    /// Use the window's `localStorage`, if the browser provides one.
    #[must_use]
    pub fn local(window: &web_sys::Window) -> Self {
        Self {
            storage: window.local_storage().ok().flatten(),
        }
    }

    fn storage(&self) -> Result<&web_sys::Storage, StorageError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StorageError::unavailable("localStorage is not available"))
    }
}

impl KeyValueStorage for WebStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(|err| StorageError::unavailable(format!("{err:?}")))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|err| StorageError::unavailable(format!("{err:?}")))
    }
}

/// `matchMedia("(prefers-color-scheme: dark)")`.
pub struct WebColorScheme {
    window: web_sys::Window,
}

impl WebColorScheme {
    #[must_use]
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }
}

impl ColorScheme for WebColorScheme {
    fn prefers_dark(&self) -> bool {
        self.window
            .match_media("(prefers-color-scheme: dark)")
            .ok()
            .flatten()
            .is_some_and(|mq| mq.matches())
    }
}

/// [`Dom`] over a browser document.
struct WebDom {
    window: web_sys::Window,
    document: web_sys::Document,
    page: Weak<RefCell<WebPage>>,
    handlers: HashMap<Listener, EventClosure>,
    // Callbacks removed while one of them may still be running.
    retired: Vec<EventClosure>,
}

impl WebDom {
    fn element(&self, id: &str) -> Option<web_sys::HtmlElement> {
        self.document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
    }

    fn target(&self, target: Target) -> Option<web_sys::EventTarget> {
        match target {
            Target::Element(id) => self.document.get_element_by_id(id).map(Into::into),
            Target::Document => Some(self.document.clone().into()),
        }
    }
}

impl Dom for WebDom {
    fn has_element(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) {
        if let Some(el) = self.element(id) {
            let _ = el.style().set_property(property, value);
        }
    }

    fn add_class(&mut self, id: &str, class: &str) {
        if let Some(el) = self.element(id) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, id: &str, class: &str) {
        if let Some(el) = self.element(id) {
            let _ = el.class_list().remove_1(class);
        }
    }

    fn root_attribute(&self, name: &str) -> Option<String> {
        self.document.document_element()?.get_attribute(name)
    }

    fn set_root_attribute(&mut self, name: &str, value: &str) {
        if let Some(root) = self.document.document_element() {
            let _ = root.set_attribute(name, value);
        }
    }

    fn viewport_width(&self) -> Option<f64> {
        self.window.inner_width().ok()?.as_f64()
    }

    fn add_listener(&mut self, listener: Listener) {
        if self.handlers.contains_key(&listener) {
            return;
        }
        let Some(target) = self.target(listener.target) else {
            return;
        };

        let page = self.page.clone();
        let closure = EventClosure::new(move |event: web_sys::Event| {
            let x = event
                .dyn_ref::<web_sys::MouseEvent>()
                .map(|e| f64::from(e.x()));
            if let Some(page) = page.upgrade() {
                WebPage::dispatch(&page, &PageEvent { listener, x });
            }
        });

        if target
            .add_event_listener_with_callback(listener.kind.as_str(), closure.as_ref().unchecked_ref())
            .is_ok()
        {
            self.handlers.insert(listener, closure);
        }
    }

    fn remove_listener(&mut self, listener: Listener) {
        let Some(closure) = self.handlers.remove(&listener) else {
            return;
        };
        if let Some(target) = self.target(listener.target) {
            let _ = target.remove_event_listener_with_callback(
                listener.kind.as_str(),
                closure.as_ref().unchecked_ref(),
            );
        }
        self.retired.push(closure);
    }
}

/// Mounted components of one page.
struct WebPage {
    dom: WebDom,
    store: StorageThemeStore<WebStorage>,
    scheme: WebColorScheme,
    components: PageComponents,
}

impl WebPage {
    fn new(window: web_sys::Window, document: web_sys::Document) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|weak| {
            RefCell::new(Self {
                store: StorageThemeStore::new(WebStorage::local(&window)),
                scheme: WebColorScheme::new(window.clone()),
                dom: WebDom {
                    window,
                    document,
                    page: weak.clone(),
                    handlers: HashMap::new(),
                    retired: Vec::new(),
                },
                components: PageComponents::default(),
            })
        })
    }

    fn init_theme(&mut self) -> Result<(), ThemeError> {
        ThemeController::init(&mut self.dom, &self.store, &self.scheme).map(|_| ())
    }

    fn mount(&mut self, options: &SidebarOptions) {
        if self.components.is_mounted() {
            return;
        }
        self.components = PageComponents::mount(&mut self.dom, options);
    }

    fn dispatch(page: &Rc<RefCell<Self>>, event: &PageEvent) {
        let Ok(mut guard) = page.try_borrow_mut() else {
            return;
        };
        let page = &mut *guard;
        page.dom.retired.clear();

        if let Err(err) = page
            .components
            .dispatch(&mut page.dom, &mut page.store, event)
        {
            web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
        }
    }
}

/// Live-reload client bound to a browser `EventSource`.
struct WebLiveReload {
    client: LiveReload,
    window: web_sys::Window,
    source: Option<web_sys::EventSource>,
    handlers: Vec<EventClosure>,
    message_handler: Option<Closure<dyn FnMut(web_sys::MessageEvent)>>,
    retired: Vec<EventClosure>,
    retired_message: Option<Closure<dyn FnMut(web_sys::MessageEvent)>>,
}

impl WebLiveReload {
    fn start(window: web_sys::Window, options: LiveReloadOptions) -> Result<(), JsValue> {
        let this = Rc::new(RefCell::new(Self {
            client: LiveReload::new(options),
            window,
            source: None,
            handlers: Vec::new(),
            message_handler: None,
            retired: Vec::new(),
            retired_message: None,
        }));
        Self::connect(&this)?;
        keep_alive(this);
        Ok(())
    }

    /// Open one `EventSource` and wire its callbacks to the state machine.
    fn connect(this: &Rc<RefCell<Self>>) -> Result<(), JsValue> {
        let mut guard = this.borrow_mut();
        let source = web_sys::EventSource::new(guard.client.endpoint())?;

        let weak = Rc::downgrade(this);
        let on_open = EventClosure::new(move |_event: web_sys::Event| {
            if let Some(this) = weak.upgrade() {
                let command = this.borrow_mut().client.on_open();
                Self::execute(&this, command);
            }
        });

        let weak = Rc::downgrade(this);
        let on_message = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(
            move |event: web_sys::MessageEvent| {
                let data = event.data().as_string().unwrap_or_default();
                if let Some(this) = weak.upgrade() {
                    let command = this.borrow_mut().client.on_message(&MessageEvent::new(data));
                    Self::execute(&this, command);
                }
            },
        );

        let weak = Rc::downgrade(this);
        let source_for_error = source.clone();
        let on_error = EventClosure::new(move |_event: web_sys::Event| {
            // The browser only reports readyState; CLOSED means it failed the
            // connection for good (bad status or content type).
            let err = if source_for_error.ready_state() == EVENT_SOURCE_CLOSED {
                TransportError::new(TransportErrorKind::Protocol, "EventSource failed")
            } else {
                TransportError::new(TransportErrorKind::Connect, "EventSource error")
            };
            if let Some(this) = weak.upgrade() {
                let command = this.borrow_mut().client.on_error(&err);
                Self::execute(&this, command);
            }
        });

        source.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        guard.retired.clear();
        guard.retired_message = None;
        guard.source = Some(source);
        guard.handlers = vec![on_open, on_error];
        guard.message_handler = Some(on_message);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(source) = self.source.take() {
            source.close();
        }
        self.retired.append(&mut self.handlers);
        self.retired_message = self.message_handler.take();
    }

    fn execute(this: &Rc<RefCell<Self>>, command: Command) {
        match command {
            Command::None => {}
            Command::CloseAndReload => {
                let mut guard = this.borrow_mut();
                guard.close();
                if let Err(err) = guard.window.location().reload() {
                    web_sys::console::error_1(&err);
                }
            }
            Command::Reconnect(delay) => {
                let mut guard = this.borrow_mut();
                guard.close();
                let weak = Rc::downgrade(this);
                let reconnect = Closure::once_into_js(move || {
                    if let Some(this) = weak.upgrade()
                        && let Err(err) = Self::connect(&this)
                    {
                        web_sys::console::error_1(&err);
                    }
                });
                let timeout = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
                if let Err(err) = guard
                    .window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(
                        reconnect.unchecked_ref(),
                        timeout,
                    )
                {
                    web_sys::console::error_1(&err);
                }
            }
            Command::GiveUp => this.borrow_mut().close(),
        }
    }
}
