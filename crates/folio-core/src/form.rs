//! Contact form: fields, validation and the submission lifecycle.
//!
//! ## State Machine
//!
//! ```text
//!                submit (invalid)
//!   Editing ─────────────────────▶ ValidationFailed
//!     │  ▲                             │
//!     │  └──── last error edited away ─┘
//!     │ submit (valid)
//!     ▼
//!   Submitting ──── delivered ────▶ Succeeded ── any edit ──▶ Editing
//!     │
//!     └──────── delivery failed ───▶ Editing (fields kept, notice shown)
//! ```
//!
//! `submitting` and `succeeded` are projections of the single
//! [`FormPhase`], so they can never both be true.
//!
//! ## Learning: Splitting Sync From Async
//!
//! [`FormController`] never awaits. `submit` returns a [`SubmitAttempt`]
//! saying what the caller must do, and `resolve` takes the delivery outcome
//! later. Because the controller is not borrowed across the delivery, edits
//! keep flowing while a message is in flight. [`ContactFormHandle`] is the
//! async shell that wires this to a [`MessageSender`].

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use folio_delivery::{DeliveryError, DeliveryResult, MessagePayload, MessageSender};
use regex::Regex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tokio::time::Instant;

use crate::config::FormConfig;
use crate::event::{EngineEvent, EventBus};
use crate::task::{AbortOnDrop, TaskGuard};
use crate::{CoreError, CoreResult};

/// local-part "@" domain-with-dot
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// A form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Message,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Email, Field::Message];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "message" => Ok(Self::Message),
            other => Err(CoreError::UnknownField(other.to_string())),
        }
    }
}

/// Field values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl FormFields {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Message => &self.message,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Message => &mut self.message,
        };
        *slot = value.into();
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|&f| self.get(f).is_empty())
    }

    /// Template parameters for the delivery service.
    pub fn to_payload(&self, recipient: &str) -> MessagePayload {
        MessagePayload::new(&self.name, &self.email, &self.message, recipient)
    }
}

/// Per-field error messages. An empty string means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl FieldErrors {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Message => &self.message,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Message => &mut self.message,
        }
    }

    pub fn clear(&mut self, field: Field) {
        self.slot(field).clear();
    }

    /// True if no field has an error.
    pub fn is_valid(&self) -> bool {
        Field::ALL.iter().all(|&f| self.get(f).is_empty())
    }

    /// Fields that currently carry an error.
    pub fn invalid_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|&f| !self.get(f).is_empty())
            .collect()
    }
}

/// Validates a single field value. Returns an empty string when valid.
pub fn validate_field(field: Field, value: &str) -> &'static str {
    let blank = value.trim().is_empty();
    match field {
        Field::Name if blank => "Name required",
        Field::Email if blank => "Email required",
        Field::Email if !EMAIL_PATTERN.is_match(value) => "Invalid format",
        Field::Message if blank => "Message required",
        _ => "",
    }
}

/// Validates every field. Pure function of `fields`.
pub fn validate(fields: &FormFields) -> FieldErrors {
    let mut errors = FieldErrors::default();
    for field in Field::ALL {
        *errors.slot(field) = validate_field(field, fields.get(field)).to_string();
    }
    errors
}

/// Lifecycle phase of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FormPhase {
    #[default]
    Editing,
    ValidationFailed,
    Submitting,
    Succeeded,
}

/// What the caller has to do after [`FormController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    /// A submission is already in flight; nothing happened
    Ignored,
    /// Validation failed; errors are set and the invalid pulse started
    Invalid(FieldErrors),
    /// Deliver these fields, then call [`FormController::resolve`]
    Dispatch(FormFields),
}

/// Plain-data view of the form for renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormSnapshot {
    pub fields: FormFields,
    pub errors: FieldErrors,
    pub phase: FormPhase,
    /// Transient shake after an invalid attempt
    pub invalid_pulse: bool,
    /// One-shot failure notice
    pub notice: Option<String>,
}

impl FormSnapshot {
    pub fn is_submitting(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    pub fn is_succeeded(&self) -> bool {
        self.phase == FormPhase::Succeeded
    }
}

/// Contact form state machine.
#[derive(Debug, Clone)]
pub struct FormController {
    fields: FormFields,
    errors: FieldErrors,
    phase: FormPhase,
    invalid_pulse: bool,
    notice: Option<String>,
    failure_notice: String,
    pulse_duration: Duration,
}

impl FormController {
    pub fn new(config: &FormConfig) -> Self {
        Self {
            fields: FormFields::default(),
            errors: FieldErrors::default(),
            phase: FormPhase::Editing,
            invalid_pulse: false,
            notice: None,
            failure_notice: config.failure_notice.clone(),
            pulse_duration: config.invalid_pulse(),
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    pub fn is_succeeded(&self) -> bool {
        self.phase == FormPhase::Succeeded
    }

    pub fn invalid_pulse(&self) -> bool {
        self.invalid_pulse
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// How long the invalid pulse lasts.
    pub fn pulse_duration(&self) -> Duration {
        self.pulse_duration
    }

    /// Sets a field and clears its error.
    ///
    /// Allowed in every phase. An in-flight submission is not affected.
    pub fn update_field(&mut self, field: Field, value: impl Into<String>) {
        self.fields.set(field, value);
        self.errors.clear(field);
        self.notice = None;

        match self.phase {
            FormPhase::Succeeded => self.phase = FormPhase::Editing,
            FormPhase::ValidationFailed if self.errors.is_valid() => {
                self.phase = FormPhase::Editing
            }
            _ => {}
        }
    }

    /// Validates the current fields without changing state.
    pub fn validate(&self) -> FieldErrors {
        validate(&self.fields)
    }

    /// Attempts a submission.
    pub fn submit(&mut self) -> SubmitAttempt {
        if self.phase == FormPhase::Submitting {
            tracing::debug!("Submit ignored, delivery in flight");
            return SubmitAttempt::Ignored;
        }

        self.notice = None;
        let errors = self.validate();
        if !errors.is_valid() {
            tracing::debug!(fields = ?errors.invalid_fields(), "Submit rejected by validation");
            self.errors = errors.clone();
            self.phase = FormPhase::ValidationFailed;
            self.invalid_pulse = true;
            return SubmitAttempt::Invalid(errors);
        }

        self.errors = FieldErrors::default();
        self.phase = FormPhase::Submitting;
        SubmitAttempt::Dispatch(self.fields.clone())
    }

    /// Applies the outcome of a dispatched submission.
    ///
    /// Returns false (and changes nothing) if no submission was in flight,
    /// so each dispatch leaves `Submitting` exactly once.
    pub fn resolve(&mut self, outcome: DeliveryResult<()>) -> bool {
        if self.phase != FormPhase::Submitting {
            tracing::warn!("Delivery outcome arrived with no submission in flight");
            return false;
        }

        match outcome {
            Ok(()) => {
                self.fields = FormFields::default();
                self.phase = FormPhase::Succeeded;
            }
            Err(err) => {
                tracing::warn!("Message delivery failed: {}", err);
                self.notice = Some(self.failure_notice.clone());
                self.phase = FormPhase::Editing;
            }
        }
        true
    }

    /// Ends the invalid-attempt pulse.
    pub fn end_invalid_pulse(&mut self) {
        self.invalid_pulse = false;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            fields: self.fields.clone(),
            errors: self.errors.clone(),
            phase: self.phase,
            invalid_pulse: self.invalid_pulse,
            notice: self.notice.clone(),
        }
    }

    /// Starts the form driver on the current runtime.
    pub fn mount<S: MessageSender>(
        self,
        sender: Arc<S>,
        recipient: impl Into<String>,
        events: EventBus,
    ) -> ContactFormHandle {
        ContactFormHandle::spawn(self, sender, recipient.into(), events)
    }
}

impl Default for FormController {
    fn default() -> Self {
        Self::new(&FormConfig::default())
    }
}

/// Commands accepted by a mounted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormCommand {
    Update(Field, String),
    Submit,
    DismissNotice,
}

enum Step {
    Command(FormCommand),
    Delivered(DeliveryResult<()>),
    PulseEnded,
}

async fn delivery_outcome(
    slot: &mut Option<AbortOnDrop<DeliveryResult<()>>>,
) -> Result<DeliveryResult<()>, JoinError> {
    match slot {
        Some(task) => task.handle_mut().await,
        None => std::future::pending().await,
    }
}

async fn pulse_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// A mounted contact form.
///
/// Commands are processed in arrival order. Unmounting cancels the driver,
/// the pending pulse timer and any in-flight delivery.
#[derive(Debug)]
pub struct ContactFormHandle {
    commands: mpsc::UnboundedSender<FormCommand>,
    state: watch::Receiver<FormSnapshot>,
    guard: TaskGuard,
}

impl ContactFormHandle {
    fn spawn<S: MessageSender>(
        mut controller: FormController,
        sender: Arc<S>,
        recipient: String,
        events: EventBus,
    ) -> Self {
        let (commands, mut inbox) = mpsc::unbounded_channel();
        let (tx, state) = watch::channel(controller.snapshot());

        let guard = TaskGuard::spawn(move |alive| async move {
            let mut in_flight: Option<AbortOnDrop<DeliveryResult<()>>> = None;
            let mut pulse_deadline: Option<Instant> = None;

            loop {
                let step = tokio::select! {
                    command = inbox.recv() => match command {
                        Some(command) => Step::Command(command),
                        None => break,
                    },
                    joined = delivery_outcome(&mut in_flight) => Step::Delivered(
                        joined.unwrap_or_else(|err| Err(DeliveryError::Transport(err.to_string()))),
                    ),
                    _ = pulse_elapsed(pulse_deadline) => Step::PulseEnded,
                };
                let Some(_live) = alive.hold() else {
                    break;
                };

                match step {
                    Step::Command(FormCommand::Update(field, value)) => {
                        controller.update_field(field, value);
                    }
                    Step::Command(FormCommand::Submit) => match controller.submit() {
                        SubmitAttempt::Ignored => {}
                        SubmitAttempt::Invalid(errors) => {
                            pulse_deadline = Some(Instant::now() + controller.pulse_duration());
                            events.emit(EngineEvent::InvalidSubmission(errors.invalid_fields()));
                        }
                        SubmitAttempt::Dispatch(fields) => {
                            let payload = fields.to_payload(&recipient);
                            let sender = Arc::clone(&sender);
                            in_flight = Some(AbortOnDrop::new(tokio::spawn(async move {
                                sender.send(payload).await
                            })));
                            tracing::info!("Contact message dispatched");
                            events.emit(EngineEvent::SubmissionStarted);
                        }
                    },
                    Step::Command(FormCommand::DismissNotice) => controller.dismiss_notice(),
                    Step::Delivered(outcome) => {
                        in_flight = None;
                        let succeeded = outcome.is_ok();
                        if controller.resolve(outcome) {
                            if succeeded {
                                tracing::info!("Contact message delivered");
                                events.emit(EngineEvent::SubmissionSucceeded);
                            } else if let Some(notice) = controller.notice() {
                                events.emit(EngineEvent::SubmissionFailed(notice.to_string()));
                            }
                        }
                    }
                    Step::PulseEnded => {
                        pulse_deadline = None;
                        controller.end_invalid_pulse();
                    }
                }

                if tx.send(controller.snapshot()).is_err() {
                    break;
                }
            }
        });

        Self {
            commands,
            state,
            guard,
        }
    }

    fn command(&self, command: FormCommand) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Form command dropped, form is unmounted");
        }
    }

    pub fn update_field(&self, field: Field, value: impl Into<String>) {
        self.command(FormCommand::Update(field, value.into()));
    }

    /// Updates a field given by its name (`"name"`, `"email"`, `"message"`).
    pub fn update_named(&self, name: &str, value: impl Into<String>) -> CoreResult<()> {
        let field = name.parse()?;
        self.update_field(field, value);
        Ok(())
    }

    pub fn submit(&self) {
        self.command(FormCommand::Submit);
    }

    pub fn dismiss_notice(&self) {
        self.command(FormCommand::DismissNotice);
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormSnapshot> {
        self.state.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.guard.is_running()
    }

    /// Cancels the driver and any in-flight delivery.
    pub fn unmount(mut self) -> FormSnapshot {
        self.guard.cancel();
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn valid_fields() -> FormFields {
        FormFields::new("Ada", "ada@example.com", "Hello there")
    }

    fn filled(controller: &mut FormController, fields: &FormFields) {
        for field in Field::ALL {
            controller.update_field(field, fields.get(field));
        }
    }

    #[test]
    fn test_validate_reference_case() {
        let errors = validate(&FormFields::new("", "a@b.com", "hi"));
        assert_eq!(
            errors,
            FieldErrors {
                name: "Name required".into(),
                email: String::new(),
                message: String::new(),
            }
        );
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(validate_field(Field::Email, "   "), "Email required");
        assert_eq!(validate_field(Field::Email, "ada"), "Invalid format");
        assert_eq!(validate_field(Field::Email, "ada@example"), "Invalid format");
        assert_eq!(validate_field(Field::Email, "a da@example.com"), "Invalid format");
        assert_eq!(validate_field(Field::Email, "a@@b.com"), "Invalid format");
        assert_eq!(validate_field(Field::Email, "ada@example.co.uk"), "");
    }

    #[test]
    fn test_whitespace_only_is_blank() {
        let errors = validate(&FormFields::new("  ", "a@b.com", "\n\t"));
        assert_eq!(errors.name, "Name required");
        assert_eq!(errors.message, "Message required");
        assert_eq!(errors.invalid_fields(), vec![Field::Name, Field::Message]);
    }

    #[test]
    fn test_field_names_parse() {
        assert_eq!("email".parse::<Field>().unwrap(), Field::Email);
        assert!(matches!(
            "phone".parse::<Field>(),
            Err(CoreError::UnknownField(name)) if name == "phone"
        ));
    }

    #[test]
    fn test_invalid_submit_keeps_fields() {
        let mut form = FormController::default();
        form.update_field(Field::Email, "not-an-email");

        let attempt = form.submit();
        assert!(matches!(attempt, SubmitAttempt::Invalid(_)));
        assert_eq!(form.phase(), FormPhase::ValidationFailed);
        assert!(form.invalid_pulse());
        assert_eq!(form.fields().email, "not-an-email");
        assert_eq!(form.errors().email, "Invalid format");
    }

    #[test]
    fn test_editing_clears_errors_and_failed_state() {
        let mut form = FormController::default();
        form.submit();
        assert_eq!(form.phase(), FormPhase::ValidationFailed);

        form.update_field(Field::Name, "Ada");
        assert!(form.errors().name.is_empty());
        assert_eq!(form.phase(), FormPhase::ValidationFailed);

        form.update_field(Field::Email, "ada@example.com");
        form.update_field(Field::Message, "Hi");
        assert!(form.errors().is_valid());
        assert_eq!(form.phase(), FormPhase::Editing);
    }

    #[test]
    fn test_success_clears_fields() {
        let mut form = FormController::default();
        filled(&mut form, &valid_fields());

        assert_eq!(form.submit(), SubmitAttempt::Dispatch(valid_fields()));
        assert!(form.is_submitting());
        assert!(form.resolve(Ok(())));

        assert!(form.is_succeeded());
        assert!(!form.is_submitting());
        assert!(form.fields().is_empty());

        form.update_field(Field::Name, "A");
        assert_eq!(form.phase(), FormPhase::Editing);
    }

    #[test]
    fn test_failure_retains_fields() {
        let mut form = FormController::default();
        filled(&mut form, &valid_fields());
        form.submit();

        assert!(form.resolve(Err(DeliveryError::Unavailable)));
        assert_eq!(form.phase(), FormPhase::Editing);
        assert!(!form.is_submitting());
        assert_eq!(form.fields(), &valid_fields());
        assert_eq!(form.notice(), Some("Submission failed. Try again."));
    }

    #[test]
    fn test_resubmit_while_submitting_is_ignored() {
        let mut form = FormController::default();
        filled(&mut form, &valid_fields());
        form.submit();

        assert_eq!(form.submit(), SubmitAttempt::Ignored);
        form.update_field(Field::Message, "edited in flight");
        assert!(form.is_submitting());
    }

    #[test]
    fn test_resolve_only_once() {
        let mut form = FormController::default();
        filled(&mut form, &valid_fields());
        form.submit();

        assert!(form.resolve(Err(DeliveryError::Unavailable)));
        assert!(!form.resolve(Ok(())));
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.fields(), &valid_fields());
    }

    proptest! {
        #[test]
        fn prop_validate_is_pure(name in ".{0,12}", email in ".{0,20}", message in ".{0,12}") {
            let fields = FormFields::new(name, email, message);
            let mut form = FormController::default();
            filled(&mut form, &fields);

            let first = form.validate();
            prop_assert_eq!(&first, &validate(&fields));
            prop_assert_eq!(&first, &form.validate());
            prop_assert_eq!(form.fields(), &fields);
        }
    }

    struct FakeSender {
        calls: AtomicUsize,
        completed: AtomicUsize,
        latency: Duration,
        outcome: DeliveryResult<()>,
    }

    impl FakeSender {
        fn new(latency_ms: u64, outcome: DeliveryResult<()>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                latency: Duration::from_millis(latency_ms),
                outcome,
            })
        }
    }

    impl MessageSender for FakeSender {
        async fn send(&self, _payload: MessagePayload) -> DeliveryResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn mount(sender: &Arc<FakeSender>) -> ContactFormHandle {
        FormController::default().mount(Arc::clone(sender), "Owner", EventBus::new())
    }

    fn fill(handle: &ContactFormHandle, fields: &FormFields) {
        for field in Field::ALL {
            handle.update_field(field, fields.get(field));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_success_flow() {
        let sender = FakeSender::new(200, Ok(()));
        let handle = mount(&sender);
        let mut state = handle.subscribe();

        fill(&handle, &valid_fields());
        handle.submit();

        let submitting = state.wait_for(|s| s.is_submitting()).await.unwrap().clone();
        assert_eq!(submitting.fields, valid_fields());

        let done = state.wait_for(|s| s.is_succeeded()).await.unwrap().clone();
        assert!(done.fields.is_empty());
        assert!(!done.is_submitting());
        assert_eq!(sender.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_failure_flow() {
        let sender = FakeSender::new(50, Err(DeliveryError::Rejected("quota".into())));
        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let handle = FormController::default().mount(Arc::clone(&sender), "Owner", bus);
        let mut state = handle.subscribe();

        fill(&handle, &valid_fields());
        handle.submit();

        let done = state
            .wait_for(|s| s.notice.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(done.phase, FormPhase::Editing);
        assert_eq!(done.fields, valid_fields());
        assert!(!done.is_submitting());

        assert_eq!(events.recv().await.unwrap(), EngineEvent::SubmissionStarted);
        assert_eq!(
            events.recv().await.unwrap(),
            EngineEvent::SubmissionFailed("Submission failed. Try again.".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_rejects_reentrant_submit() {
        let sender = FakeSender::new(1000, Ok(()));
        let handle = mount(&sender);
        let mut state = handle.subscribe();

        fill(&handle, &valid_fields());
        handle.submit();
        handle.submit();
        handle.update_field(Field::Message, "typed while sending");
        handle.submit();

        let edited = state
            .wait_for(|s| s.fields.message == "typed while sending")
            .await
            .unwrap()
            .clone();
        assert!(edited.is_submitting());

        state.wait_for(|s| s.is_succeeded()).await.unwrap();
        assert_eq!(sender.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_invalid_pulse_clears() {
        let sender = FakeSender::new(0, Ok(()));
        let handle = mount(&sender);
        let mut state = handle.subscribe();

        handle.update_field(Field::Name, "Ada");
        handle.submit();

        let failed = state.wait_for(|s| s.invalid_pulse).await.unwrap().clone();
        assert_eq!(failed.phase, FormPhase::ValidationFailed);
        assert_eq!(failed.fields.name, "Ada");
        assert_eq!(failed.errors.email, "Email required");

        tokio::time::sleep(Duration::from_millis(450)).await;
        assert!(handle.snapshot().invalid_pulse);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let settled = handle.snapshot();
        assert!(!settled.invalid_pulse);
        assert_eq!(settled.phase, FormPhase::ValidationFailed);
        assert_eq!(sender.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_invalid_submit_restarts_pulse() {
        let sender = FakeSender::new(0, Ok(()));
        let handle = mount(&sender);
        let mut state = handle.subscribe();

        handle.submit();
        state.wait_for(|s| s.invalid_pulse).await.unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        handle.submit();

        // First deadline (500ms) has passed; the second runs until 900ms
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(handle.snapshot().invalid_pulse);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!handle.snapshot().invalid_pulse);
        assert_eq!(handle.snapshot().phase, FormPhase::ValidationFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_in_flight_delivery() {
        let sender = FakeSender::new(500, Ok(()));
        let handle = mount(&sender);
        let mut state = handle.subscribe();

        fill(&handle, &valid_fields());
        handle.submit();
        state.wait_for(|s| s.is_submitting()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let last = handle.unmount();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(sender.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sender.completed.load(Ordering::SeqCst), 0);
        assert_eq!(*state.borrow(), last);
    }
}
