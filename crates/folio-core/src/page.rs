//! The page view: composition and lifetime of every component.
//!
//! ## Learning: The Facade Pattern
//!
//! `PageView` is the only thing a renderer talks to. It owns the mounted
//! handles, forwards the mutation calls, and assembles a single
//! [`PageSnapshot`] from the components' independent states. None of the
//! components know about each other.
//!
//! The theme store outlives the view: `unmount` hands it back so the next
//! view (or the next process, through storage) sees the same preference.

use std::sync::Arc;

use folio_delivery::MessageSender;
use tokio::sync::broadcast;

use crate::CoreResult;
use crate::config::Config;
use crate::event::{EngineEvent, EventBus};
use crate::form::{ContactFormHandle, Field, FormController, FormSnapshot};
use crate::nav::NavMenu;
use crate::particles::{ParticleLayer, ParticleSet};
use crate::scroll::{ScrollSignals, ScrollTracker, ScrollTrackerHandle, Viewport};
use crate::theme::{DARK_CLASS, ThemePreference, ThemeStore};
use crate::typewriter::{Typewriter, TypewriterHandle, TypewriterSnapshot};

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub theme: ThemePreference,
    pub root_dark: bool,
    pub typewriter: TypewriterSnapshot,
    pub scroll: ScrollSignals,
    /// Chrome solid because of scrolling or an open menu
    pub solid_chrome: bool,
    pub menu_open: bool,
    pub form: FormSnapshot,
    pub particles: ParticleSet,
}

/// A mounted page.
pub struct PageView {
    theme: ThemeStore,
    typewriter: TypewriterHandle,
    scroll: ScrollTrackerHandle,
    form: ContactFormHandle,
    particles: ParticleLayer,
    nav: NavMenu,
    events: EventBus,
}

impl PageView {
    /// Mounts every per-view component. Must be called within a tokio runtime.
    pub fn mount<S: MessageSender>(
        config: &Config,
        theme: ThemeStore,
        viewport: &mut impl Viewport,
        sender: S,
    ) -> CoreResult<Self> {
        let events = EventBus::new();
        let theme = theme.with_events(events.clone());

        let typewriter =
            Typewriter::new(config.typewriter.phrases.iter().cloned())?.mount(config.typewriter.clone());
        let scroll = ScrollTracker::mount(&config.scroll, viewport);
        let form = FormController::new(&config.form).mount(
            Arc::new(sender),
            config.delivery.recipient_name.clone(),
            events.clone(),
        );

        let view = Self {
            theme,
            typewriter,
            scroll,
            form,
            particles: ParticleLayer::new(config.particles.count),
            nav: NavMenu::new(config.nav.clone()),
            events,
        };

        tracing::info!("Page view mounted");
        view.events.emit(EngineEvent::ViewMounted);
        Ok(view)
    }

    /// Current state of every component.
    pub fn snapshot(&self) -> PageSnapshot {
        let scroll = self.scroll.signals();
        PageSnapshot {
            theme: self.theme.get(),
            root_dark: self.theme.root().has_class(DARK_CLASS),
            typewriter: self.typewriter.snapshot(),
            scroll,
            solid_chrome: self.nav.solid_chrome(scroll),
            menu_open: self.nav.is_open(),
            form: self.form.snapshot(),
            particles: self.particles.particles().clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // ==================== Theme ====================

    pub fn toggle_theme(&mut self) -> ThemePreference {
        self.theme.toggle()
    }

    pub fn theme(&self) -> ThemePreference {
        self.theme.get()
    }

    // ==================== Form ====================

    pub fn update_field(&self, field: Field, value: impl Into<String>) {
        self.form.update_field(field, value);
    }

    /// Updates a field by name, rejecting unknown names.
    pub fn update_named(&self, name: &str, value: impl Into<String>) -> CoreResult<()> {
        self.form.update_named(name, value)
    }

    pub fn submit(&self) {
        self.form.submit();
    }

    pub fn dismiss_notice(&self) {
        self.form.dismiss_notice();
    }

    pub fn form(&self) -> &ContactFormHandle {
        &self.form
    }

    // ==================== Navigation ====================

    pub fn toggle_menu(&mut self) -> bool {
        self.nav.toggle()
    }

    /// Follows a nav link to a section at `section_top`; returns the scroll target.
    pub fn navigate(&mut self, section_top: f64, viewport_width: f64) -> f64 {
        self.nav.navigate(section_top, viewport_width)
    }

    // ==================== Lifecycle ====================

    /// Tears down all per-view tasks and returns the theme store.
    pub fn unmount(self) -> ThemeStore {
        let Self {
            theme,
            typewriter,
            scroll,
            form,
            events,
            ..
        } = self;

        typewriter.unmount();
        scroll.unmount();
        form.unmount();

        tracing::info!("Page view unmounted");
        events.emit(EngineEvent::ViewUnmounted);
        theme
    }
}
