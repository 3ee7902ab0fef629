//! # Folio Delivery
//!
//! The message-delivery capability consumed by the contact form.
//!
//! ## What is delivered?
//!
//! A submitted contact form becomes a [`MessagePayload`] (the template
//! parameters). A [`MessageSender`] turns it into whatever the hosted
//! delivery service expects. The transport itself is not part of this crate:
//! senders are injected, so the form can be driven by a fake in tests.
//!
//! ```json
//! {
//!   "service_id": "service_x",
//!   "template_id": "template_y",
//!   "user_id": "public-key",
//!   "template_params": {
//!     "from_name": "Ada",
//!     "from_email": "ada@example.com",
//!     "message": "Hello",
//!     "to_name": "Folio Owner"
//!   }
//! }
//! ```
//!
//! ## Learning: `impl Future` in Traits
//!
//! Since Rust 1.75 a trait method can return `impl Future`. Adding `+ Send`
//! to the return type lets callers move the future onto a spawned task,
//! which is what the form driver does with every dispatched submission.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message delivery errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Delivery service unavailable")]
    Unavailable,

    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to encode request: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for DeliveryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

/// Result type for delivery operations
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Identifiers supplied to the delivery service at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Service identifier
    pub service_id: String,

    /// Template identifier
    pub template_id: String,

    /// Public client key
    pub public_key: String,

    /// Name inserted as the template's recipient
    pub recipient_name: String,
}

impl DeliveryConfig {
    /// Returns true if every identifier needed to reach the service is set.
    pub fn is_complete(&self) -> bool {
        !self.service_id.is_empty() && !self.template_id.is_empty() && !self.public_key.is_empty()
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
            recipient_name: "Folio Owner".to_string(),
        }
    }
}

/// Template parameters of one contact message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub from_name: String,
    pub from_email: String,
    pub message: String,
    pub to_name: String,
}

impl MessagePayload {
    pub fn new(
        from_name: impl Into<String>,
        from_email: impl Into<String>,
        message: impl Into<String>,
        to_name: impl Into<String>,
    ) -> Self {
        Self {
            from_name: from_name.into(),
            from_email: from_email.into(),
            message: message.into(),
            to_name: to_name.into(),
        }
    }
}

/// Request envelope sent to the delivery service.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRequest {
    /// Correlation id, only used in logs
    #[serde(skip)]
    pub id: Uuid,
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    pub template_params: MessagePayload,
}

impl DeliveryRequest {
    /// Wraps a payload with the configured identifiers.
    pub fn new(config: &DeliveryConfig, payload: MessagePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            service_id: config.service_id.clone(),
            template_id: config.template_id.clone(),
            user_id: config.public_key.clone(),
            template_params: payload,
        }
    }

    /// Encodes the envelope as JSON.
    pub fn to_json(&self) -> DeliveryResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Capability that delivers a contact message.
///
/// Implementations are shared with the task running a submission, hence
/// the `Send + Sync + 'static` bound.
pub trait MessageSender: Send + Sync + 'static {
    /// Delivers one message. Resolves once the service accepted or refused it.
    fn send(&self, payload: MessagePayload) -> impl Future<Output = DeliveryResult<()>> + Send;
}

/// Sender used when no delivery service is configured. Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableSender;

impl MessageSender for UnavailableSender {
    async fn send(&self, payload: MessagePayload) -> DeliveryResult<()> {
        tracing::warn!(
            from = %payload.from_email,
            "No delivery service configured, dropping message"
        );
        Err(DeliveryError::Unavailable)
    }
}

/// Sender that encodes the request and logs it instead of transmitting.
#[derive(Debug, Clone)]
pub struct DryRunSender {
    config: DeliveryConfig,
}

impl DryRunSender {
    pub fn new(config: DeliveryConfig) -> Self {
        if !config.is_complete() {
            tracing::warn!("Delivery identifiers incomplete, the logged request would be refused");
        }
        Self { config }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }
}

impl MessageSender for DryRunSender {
    async fn send(&self, payload: MessagePayload) -> DeliveryResult<()> {
        let request = DeliveryRequest::new(&self.config, payload);
        let body = request.to_json()?;
        tracing::info!(request_id = %request.id, %body, "Dry run: message not transmitted");
        Ok(())
    }
}
