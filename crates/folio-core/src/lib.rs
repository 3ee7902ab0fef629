//! # Folio Core
//!
//! Interaction state machines behind the portfolio page.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        PageView                          │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────────────────┐│
//! │  │ ThemeStore │ │  NavMenu   │ │     ParticleLayer      ││
//! │  └────────────┘ └────────────┘ └────────────────────────┘│
//! │  ┌────────────┐ ┌──────────────┐ ┌──────────────────────┐│
//! │  │ Typewriter │ │ScrollTracker │ │   ContactForm        ││
//! │  │   (task)   │ │   (task)     │ │ (task + delivery)    ││
//! │  └────────────┘ └──────────────┘ └──────────────────────┘│
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every component is independent. The timer- and event-driven ones run as
//! tasks and publish plain-data snapshots through `watch` channels; the
//! presentation layer only ever reads those snapshots and calls the
//! mutation methods on the handles.
//!
//! ## Learning: Sync Core, Async Shell
//!
//! Each state machine (`Typewriter`, `ScrollTracker`, `FormController`) is a
//! plain struct with `&mut self` transitions and no I/O. The async part is a
//! thin driver around it. Tests exercise the core directly and the driver
//! with tokio's paused clock.

pub mod config;
pub mod content;
pub mod event;
pub mod form;
pub mod nav;
pub mod page;
pub mod particles;
pub mod scroll;
pub mod storage;
pub mod task;
pub mod theme;
pub mod typewriter;

pub use config::Config;
pub use content::{Content, Skill, SkillCategory};
pub use event::{EngineEvent, EventBus};
pub use form::{ContactFormHandle, Field, FieldErrors, FormController, FormFields, FormPhase};
pub use nav::NavMenu;
pub use page::{PageSnapshot, PageView};
pub use particles::{Particle, ParticleLayer, ParticleSet};
pub use scroll::{ScrollSignals, ScrollTracker, ScrollTrackerHandle, SimulatedViewport, Viewport};
pub use storage::{FileStore, MemoryStore, PreferenceStore};
pub use theme::{ThemePreference, ThemeStore};
pub use typewriter::{Typewriter, TypewriterHandle, TypewriterPhase};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error("Typewriter error: {0}")]
    Typewriter(#[from] typewriter::TypewriterError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}
