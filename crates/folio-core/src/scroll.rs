//! Scroll-derived navigation signals.
//!
//! Two booleans, each fed by its own source:
//!
//! | Signal | Source | Rule |
//! |--------|--------|------|
//! | `chrome_solid` | scroll events | `offset > solid_threshold` |
//! | `scroll_top_visible` | intersection of the hero region | `!is_intersecting` |
//!
//! The second signal deliberately ignores the scroll offset: whether the
//! hero is on screen depends on its height, which changes between
//! breakpoints, so only the viewport can answer it.
//!
//! ## Learning: Capabilities as Streams
//!
//! A browser hands callbacks to `IntersectionObserver`. Here the
//! [`Viewport`] capability returns channel receivers instead; dropping a
//! receiver is the disconnect. That keeps the tracker free of shared
//! mutable state and lets tests feed it from a [`SimulatedViewport`].

use std::collections::HashMap;

use tokio::sync::{mpsc, watch};

use crate::config::ScrollConfig;
use crate::task::TaskGuard;

/// Derived navigation signals. Read-only outside this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollSignals {
    chrome_solid: bool,
    scroll_top_visible: bool,
}

impl ScrollSignals {
    /// Navigation chrome should use its solid presentation.
    pub fn chrome_solid(&self) -> bool {
        self.chrome_solid
    }

    /// The scroll-to-top control should be shown.
    pub fn scroll_top_visible(&self) -> bool {
        self.scroll_top_visible
    }
}

/// Options for observing a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserveOptions {
    /// Margin (px) added to the top of the viewport; negative shrinks it
    pub root_margin_top: f64,
}

/// One intersection observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub is_intersecting: bool,
}

/// Viewport capability consumed by the tracker.
pub trait Viewport {
    /// Stream of vertical scroll offsets, one per scroll event.
    fn scroll_events(&mut self) -> mpsc::UnboundedReceiver<f64>;

    /// Stream of intersection changes for `region`.
    ///
    /// Implementations deliver the current state first, then one entry per
    /// change. A region the viewport does not know never reports. Dropping
    /// the receiver stops the observation.
    fn observe(
        &mut self,
        region: &str,
        options: ObserveOptions,
    ) -> mpsc::UnboundedReceiver<IntersectionEntry>;
}

/// Scroll tracker state machine.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    solid_threshold: f64,
    signals: ScrollSignals,
}

impl ScrollTracker {
    pub fn new(config: &ScrollConfig) -> Self {
        Self {
            solid_threshold: config.solid_threshold,
            signals: ScrollSignals::default(),
        }
    }

    pub fn signals(&self) -> ScrollSignals {
        self.signals
    }

    /// Applies a scroll event. Returns true if a signal changed.
    pub fn on_scroll(&mut self, offset: f64) -> bool {
        let solid = offset > self.solid_threshold;
        let changed = solid != self.signals.chrome_solid;
        self.signals.chrome_solid = solid;
        changed
    }

    /// Applies a hero intersection change. Returns true if a signal changed.
    pub fn on_intersection(&mut self, entry: IntersectionEntry) -> bool {
        let visible = !entry.is_intersecting;
        let changed = visible != self.signals.scroll_top_visible;
        self.signals.scroll_top_visible = visible;
        changed
    }

    /// Subscribes to `viewport` and starts tracking on the current runtime.
    pub fn mount(config: &ScrollConfig, viewport: &mut impl Viewport) -> ScrollTrackerHandle {
        ScrollTrackerHandle::spawn(config, viewport)
    }
}

enum ViewportEvent {
    Scroll(f64),
    Intersection(IntersectionEntry),
}

/// A mounted scroll tracker.
#[derive(Debug)]
pub struct ScrollTrackerHandle {
    state: watch::Receiver<ScrollSignals>,
    guard: TaskGuard,
}

impl ScrollTrackerHandle {
    fn spawn(config: &ScrollConfig, viewport: &mut impl Viewport) -> Self {
        let mut tracker = ScrollTracker::new(config);
        let mut scrolls = viewport.scroll_events();
        let mut hero = viewport.observe(
            &config.hero_region,
            ObserveOptions {
                root_margin_top: config.hero_root_margin_top,
            },
        );
        let (tx, state) = watch::channel(tracker.signals());

        let guard = TaskGuard::spawn(move |alive| async move {
            loop {
                let event = tokio::select! {
                    Some(offset) = scrolls.recv() => ViewportEvent::Scroll(offset),
                    Some(entry) = hero.recv() => ViewportEvent::Intersection(entry),
                    else => break,
                };
                let Some(_live) = alive.hold() else {
                    break;
                };

                let changed = match event {
                    ViewportEvent::Scroll(offset) => tracker.on_scroll(offset),
                    ViewportEvent::Intersection(entry) => tracker.on_intersection(entry),
                };
                if changed {
                    tracing::trace!(signals = ?tracker.signals(), "Scroll signals changed");
                    if tx.send(tracker.signals()).is_err() {
                        break;
                    }
                }
            }
        });

        Self { state, guard }
    }

    pub fn signals(&self) -> ScrollSignals {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScrollSignals> {
        self.state.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.guard.is_running()
    }

    /// Disconnects both event sources and returns the last signals.
    pub fn unmount(mut self) -> ScrollSignals {
        self.guard.cancel();
        self.signals()
    }
}

/// A vertical band of the page, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub top: f64,
    pub height: f64,
}

impl Region {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

struct Observer {
    region: String,
    options: ObserveOptions,
    last: bool,
    sender: mpsc::UnboundedSender<IntersectionEntry>,
}

/// Geometric viewport for tests and headless hosts.
///
/// Computes intersections from region geometry and the current offset and
/// only reports changes, as a real intersection observer would.
pub struct SimulatedViewport {
    height: f64,
    offset: f64,
    regions: HashMap<String, Region>,
    scroll_listeners: Vec<mpsc::UnboundedSender<f64>>,
    observers: Vec<Observer>,
}

impl SimulatedViewport {
    pub fn new(height: f64) -> Self {
        Self {
            height,
            offset: 0.0,
            regions: HashMap::new(),
            scroll_listeners: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Adds (or moves) a named region.
    pub fn with_region(mut self, name: impl Into<String>, region: Region) -> Self {
        self.regions.insert(name.into(), region);
        self
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Number of live scroll listeners and observers.
    pub fn subscriber_count(&self) -> usize {
        self.scroll_listeners.len() + self.observers.len()
    }

    /// Scrolls to `offset`, emitting a scroll event and any intersection changes.
    pub fn scroll_to(&mut self, offset: f64) {
        self.offset = offset.max(0.0);
        let current = self.offset;
        self.scroll_listeners.retain(|tx| tx.send(current).is_ok());

        let mut observers = std::mem::take(&mut self.observers);
        observers.retain_mut(|observer| {
            let Some(now) = self.intersects(&observer.region, observer.options) else {
                return !observer.sender.is_closed();
            };
            if now == observer.last {
                return !observer.sender.is_closed();
            }
            observer.last = now;
            observer
                .sender
                .send(IntersectionEntry { is_intersecting: now })
                .is_ok()
        });
        self.observers = observers;
    }

    /// `None` if no region is registered under `region`.
    fn intersects(&self, region: &str, options: ObserveOptions) -> Option<bool> {
        let region = self.regions.get(region)?;
        let root_top = self.offset - options.root_margin_top;
        let root_bottom = self.offset + self.height;
        Some(region.top < root_bottom && region.bottom() > root_top)
    }
}

impl Viewport for SimulatedViewport {
    fn scroll_events(&mut self) -> mpsc::UnboundedReceiver<f64> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.scroll_listeners.push(tx);
        rx
    }

    fn observe(
        &mut self,
        region: &str,
        options: ObserveOptions,
    ) -> mpsc::UnboundedReceiver<IntersectionEntry> {
        let (tx, rx) = mpsc::unbounded_channel();
        let Some(now) = self.intersects(region, options) else {
            tracing::debug!(region, "Observed region not found, nothing will be reported");
            return rx;
        };
        if tx.send(IntersectionEntry { is_intersecting: now }).is_ok() {
            self.observers.push(Observer {
                region: region.to_string(),
                options,
                last: now,
                sender: tx,
            });
        }
        rx
    }
}
