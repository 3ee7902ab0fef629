//! Typing/deleting text animation.
//!
//! ## State Machine
//!
//! ```text
//!            full phrase typed            pause elapsed
//!   Typing ───────────────────▶ Pausing ──────────────▶ Deleting
//!     ▲                                                     │
//!     └──────────── emptied, index = (index + 1) % n ───────┘
//! ```
//!
//! Each call to [`Typewriter::advance`] performs exactly one transition or
//! one character step; [`Typewriter::delay`] says how long to wait before
//! the next call. The [`TypewriterHandle`] driver owns the only timer.
//!
//! ## Learning: Graphemes, Not Chars
//!
//! A `char` is a Unicode scalar value, not what a reader sees as one
//! character. "é" may be two chars and a flag emoji is two. Stepping by
//! extended grapheme clusters (`unicode-segmentation`) keeps every
//! displayed prefix renderable.

use std::time::Duration;

use tokio::sync::watch;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::TypewriterConfig;
use crate::task::TaskGuard;

/// Typewriter errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypewriterError {
    #[error("Typewriter needs at least one phrase")]
    NoPhrases,
}

/// Animation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypewriterPhase {
    #[default]
    Typing,
    Pausing,
    Deleting,
}

/// A phrase with its grapheme boundaries precomputed.
#[derive(Debug, Clone)]
struct Phrase {
    text: String,
    /// Byte offset just past each grapheme
    ends: Vec<usize>,
}

impl Phrase {
    fn new(text: String) -> Self {
        let ends = text
            .grapheme_indices(true)
            .map(|(start, g)| start + g.len())
            .collect();
        Self { text, ends }
    }

    fn len(&self) -> usize {
        self.ends.len()
    }

    fn prefix(&self, graphemes: usize) -> &str {
        match graphemes {
            0 => "",
            n => &self.text[..self.ends[n - 1]],
        }
    }
}

/// Plain-data view of the typewriter for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypewriterSnapshot {
    pub displayed: String,
    pub active_index: usize,
    pub phase: TypewriterPhase,
    /// Number of steps taken since mount
    pub steps: u64,
}

/// Typewriter state machine.
#[derive(Debug, Clone)]
pub struct Typewriter {
    phrases: Vec<Phrase>,
    index: usize,
    shown: usize,
    phase: TypewriterPhase,
    steps: u64,
}

impl Typewriter {
    /// Creates a typewriter at the start of the first phrase.
    pub fn new<I, S>(phrases: I) -> Result<Self, TypewriterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phrases: Vec<Phrase> = phrases
            .into_iter()
            .map(|p| Phrase::new(p.into()))
            .collect();
        if phrases.is_empty() {
            return Err(TypewriterError::NoPhrases);
        }

        Ok(Self {
            phrases,
            index: 0,
            shown: 0,
            phase: TypewriterPhase::Typing,
            steps: 0,
        })
    }

    /// Text currently on screen.
    pub fn displayed(&self) -> &str {
        self.active().prefix(self.shown)
    }

    /// Index of the phrase being typed or deleted.
    pub fn active_index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> TypewriterPhase {
        self.phase
    }

    /// Performs one step of the animation.
    pub fn advance(&mut self) {
        self.steps += 1;
        match self.phase {
            TypewriterPhase::Typing => {
                let total = self.active().len();
                if self.shown < total {
                    self.shown += 1;
                }
                if self.shown == total {
                    self.phase = TypewriterPhase::Pausing;
                }
            }
            TypewriterPhase::Pausing => {
                self.phase = TypewriterPhase::Deleting;
            }
            TypewriterPhase::Deleting => {
                self.shown = self.shown.saturating_sub(1);
                if self.shown == 0 {
                    self.index = (self.index + 1) % self.phrases.len();
                    self.phase = TypewriterPhase::Typing;
                    tracing::trace!(index = self.index, "Typewriter moved to next phrase");
                }
            }
        }
    }

    /// Time to wait before the next [`advance`](Self::advance).
    pub fn delay(&self, config: &TypewriterConfig) -> Duration {
        match self.phase {
            TypewriterPhase::Typing => config.type_interval(),
            TypewriterPhase::Pausing => config.pause(),
            TypewriterPhase::Deleting => config.delete_interval(),
        }
    }

    pub fn snapshot(&self) -> TypewriterSnapshot {
        TypewriterSnapshot {
            displayed: self.displayed().to_string(),
            active_index: self.index,
            phase: self.phase,
            steps: self.steps,
        }
    }

    /// Starts animating on the current runtime.
    pub fn mount(self, config: TypewriterConfig) -> TypewriterHandle {
        TypewriterHandle::spawn(self, config)
    }

    fn active(&self) -> &Phrase {
        &self.phrases[self.index]
    }
}

/// A mounted, animating typewriter.
///
/// Dropping the handle or calling [`unmount`](Self::unmount) cancels the
/// pending timer; no step is taken afterwards.
#[derive(Debug)]
pub struct TypewriterHandle {
    state: watch::Receiver<TypewriterSnapshot>,
    guard: TaskGuard,
}

impl TypewriterHandle {
    fn spawn(mut typewriter: Typewriter, config: TypewriterConfig) -> Self {
        let (tx, state) = watch::channel(typewriter.snapshot());

        let guard = TaskGuard::spawn(move |alive| async move {
            loop {
                tokio::time::sleep(typewriter.delay(&config)).await;
                let Some(_live) = alive.hold() else {
                    break;
                };
                typewriter.advance();
                if tx.send(typewriter.snapshot()).is_err() {
                    break;
                }
            }
        });

        tracing::debug!("Typewriter mounted");
        Self { state, guard }
    }

    /// Current state.
    pub fn snapshot(&self) -> TypewriterSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published step.
    pub fn subscribe(&self) -> watch::Receiver<TypewriterSnapshot> {
        self.state.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.guard.is_running()
    }

    /// Cancels the animation and returns the final state.
    pub fn unmount(mut self) -> TypewriterSnapshot {
        self.guard.cancel();
        tracing::debug!("Typewriter unmounted");
        self.snapshot()
    }
}
