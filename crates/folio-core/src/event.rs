//! Engine notifications.
//!
//! ## Learning: Events Are Values
//!
//! Components never call into the presentation layer. Anything a renderer
//! might want to react to once (a failure notice, a theme switch) is
//! broadcast as a value on a `tokio::sync::broadcast` channel. Continuous
//! state is read from snapshots instead.

use crate::form::Field;
use crate::theme::ThemePreference;
use tokio::sync::broadcast;

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A view finished mounting its components
    ViewMounted,
    /// A view tore down its components
    ViewUnmounted,

    /// Theme preference changed
    ThemeChanged(ThemePreference),

    /// Submit was attempted with invalid fields
    InvalidSubmission(Vec<Field>),
    /// A message was handed to the delivery service
    SubmissionStarted,
    /// The delivery service accepted the message
    SubmissionSucceeded,
    /// Delivery failed; carries the user-facing notice
    SubmissionFailed(String),
}

/// Event bus for broadcasting engine events.
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Helper for processing events asynchronously.
pub struct EventHandler {
    receiver: broadcast::Receiver<EngineEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<EngineEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<EngineEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(EngineEvent::ThemeChanged(ThemePreference::Dark));

        let event = rx.recv().await.unwrap();
        assert_eq!(event, EngineEvent::ThemeChanged(ThemePreference::Dark));
    }

    #[tokio::test]
    async fn test_handler_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());

        bus.emit(EngineEvent::SubmissionStarted);
        drop(bus);

        assert_eq!(handler.next().await, Some(EngineEvent::SubmissionStarted));
        assert_eq!(handler.next().await, None);
    }
}
