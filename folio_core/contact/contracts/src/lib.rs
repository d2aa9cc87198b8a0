use std::future::Future;

use folio_models::contact::{ContactFieldError, ContactFormField, ContactFormInput};

pub mod commands;

pub const FALLBACK_ERROR_MESSAGE: &str =
    "Unable to send right now. Please try again or email directly.";

/// A single contact form instance: holds the draft, enforces the cooldown and
/// runs at most one submission at a time.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFormService: Send + Sync + 'static {
    /// Returns the current field values.
    fn draft(&self) -> ContactFormInput;

    /// Updates a field. Leaves a finished `Success` or `Error` state.
    fn edit(&self, field: ContactFormField, value: String);

    /// Returns the validation error of a single field, if any.
    fn field_error(&self, field: ContactFormField) -> Option<ContactFieldError>;

    fn state(&self) -> ContactFormState;

    /// Clears the draft and returns to `Idle`, abandoning any submission in
    /// flight.
    fn reset(&self);

    /// Cancels any submission in flight. The form does not change state
    /// afterwards.
    fn teardown(&self);

    /// Validates and sends the current draft, superseding any submission
    /// still in flight.
    fn submit(&self) -> impl Future<Output = SubmissionResult> + Send;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContactFormState {
    #[default]
    Idle,
    Submitting,
    Success,
    Error(ContactFormError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFormError {
    pub message: String,
    pub field_errors: Vec<ContactFieldError>,
}

impl ContactFormState {
    /// Returns the message to show in the form's error area.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(ContactFormError { message, .. }) if !message.is_empty() => Some(message),
            Self::Error(_) => Some(FALLBACK_ERROR_MESSAGE),
            Self::Idle | Self::Submitting | Self::Success => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Success,
    /// Rejected locally, the user can fix the problem and try again.
    RecoverableError(String),
    /// The relay refused the message or could not be reached.
    FatalError(String),
    Cancelled,
}

#[cfg(feature = "mock")]
impl MockContactFormService {
    pub fn with_edit(mut self, field: ContactFormField, value: String) -> Self {
        self.expect_edit()
            .once()
            .with(
                mockall::predicate::eq(field),
                mockall::predicate::eq(value),
            )
            .return_const(());
        self
    }

    pub fn with_submit(mut self, result: SubmissionResult) -> Self {
        self.expect_submit()
            .once()
            .return_once(|| Box::pin(std::future::ready(result)));
        self
    }
}
