use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use folio_core_contact_contracts::{
    commands::submit::{ContactSubmitCommandError, ContactSubmitCommandService},
    ContactFormError, ContactFormService, ContactFormState, SubmissionResult,
};
use folio_models::contact::{ContactFieldError, ContactFormField, ContactFormInput};
use folio_shared_contracts::time::TimeService;
use folio_utils::trace_instrument;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::cooldown::ContactCooldown;

pub mod commands;
pub mod cooldown;

#[cfg(test)]
mod tests;

#[derive(Debug)]
pub struct ContactFormServiceImpl<Time, ContactSubmit> {
    time: Time,
    contact_submit: ContactSubmit,
    form: Mutex<Form>,
}

#[derive(Debug, Clone, Copy)]
pub struct ContactFormServiceConfig {
    pub cooldown: Duration,
}

impl Default for ContactFormServiceConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct Form {
    draft: ContactFormInput,
    state: ContactFormState,
    cooldown: ContactCooldown,
    /// Incremented for every submission that reaches the network. Only the
    /// submission holding the current generation may update the state.
    generation: u64,
    in_flight: Option<CancellationToken>,
    torn_down: bool,
}

impl Form {
    fn cancel_in_flight(&mut self) {
        if let Some(cancel) = self.in_flight.take() {
            cancel.cancel();
        }
    }

    fn fail(&mut self, message: String, field_errors: Vec<ContactFieldError>) -> String {
        self.state = ContactFormState::Error(ContactFormError {
            message: message.clone(),
            field_errors,
        });
        message
    }
}

impl<Time, ContactSubmit> ContactFormServiceImpl<Time, ContactSubmit> {
    pub fn new(time: Time, contact_submit: ContactSubmit, config: ContactFormServiceConfig) -> Self {
        Self {
            time,
            contact_submit,
            form: Mutex::new(Form {
                draft: ContactFormInput::default(),
                state: ContactFormState::Idle,
                cooldown: ContactCooldown::new(config.cooldown),
                generation: 0,
                in_flight: None,
                torn_down: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Form> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<Time, ContactSubmit> ContactFormService for ContactFormServiceImpl<Time, ContactSubmit>
where
    Time: TimeService,
    ContactSubmit: ContactSubmitCommandService,
{
    fn draft(&self) -> ContactFormInput {
        self.lock().draft.clone()
    }

    fn edit(&self, field: ContactFormField, value: String) {
        let mut form = self.lock();
        form.draft.set(field, value);
        if matches!(form.state, ContactFormState::Success | ContactFormState::Error(_)) {
            form.state = ContactFormState::Idle;
        }
    }

    fn field_error(&self, field: ContactFormField) -> Option<ContactFieldError> {
        self.lock().draft.validate_field(field)
    }

    fn state(&self) -> ContactFormState {
        self.lock().state.clone()
    }

    #[trace_instrument(skip(self))]
    fn reset(&self) {
        let mut form = self.lock();
        form.cancel_in_flight();
        form.generation += 1;
        form.draft = ContactFormInput::default();
        form.state = ContactFormState::Idle;
    }

    #[trace_instrument(skip(self))]
    fn teardown(&self) {
        let mut form = self.lock();
        form.torn_down = true;
        form.cancel_in_flight();
    }

    #[trace_instrument(skip(self))]
    async fn submit(&self) -> SubmissionResult {
        let (payload, cancel, generation) = {
            let mut form = self.lock();

            if form.torn_down {
                return SubmissionResult::Cancelled;
            }

            if form.draft.is_spam() {
                debug!("dropping contact form submission with filled honeypot");
                return SubmissionResult::Success;
            }

            let submission = match form.draft.validate() {
                Ok(submission) => submission,
                Err(err) => {
                    let message = form.fail(err.to_string(), err.0);
                    return SubmissionResult::RecoverableError(message);
                }
            };

            if let Err(err) = form.cooldown.check(self.time.now()) {
                debug!(until = %err.until, "contact form is cooling down");
                let message = form.fail(err.to_string(), Vec::new());
                return SubmissionResult::RecoverableError(message);
            }

            if form.in_flight.is_some() {
                debug!("superseding contact form submission in flight");
            }
            form.cancel_in_flight();

            let cancel = CancellationToken::new();
            form.in_flight = Some(cancel.clone());
            form.generation += 1;
            form.state = ContactFormState::Submitting;

            (submission.into_payload(), cancel, form.generation)
        };

        let result = self.contact_submit.invoke(payload, cancel).await;

        let mut form = self.lock();
        if form.torn_down || form.generation != generation {
            debug!(?result, "discarding result of abandoned contact form submission");
            return SubmissionResult::Cancelled;
        }
        form.in_flight = None;

        match result {
            Ok(()) => {
                form.cooldown.record_success(self.time.now());
                form.draft = ContactFormInput::default();
                form.state = ContactFormState::Success;
                SubmissionResult::Success
            }
            Err(ContactSubmitCommandError::Cancelled) => {
                form.state = ContactFormState::Idle;
                SubmissionResult::Cancelled
            }
            Err(err) => {
                error!("failed to send contact message: {err}");
                let message = form.fail(err.to_string(), Vec::new());
                SubmissionResult::FatalError(message)
            }
        }
    }
}

impl<Time, ContactSubmit> Drop for ContactFormServiceImpl<Time, ContactSubmit> {
    fn drop(&mut self) {
        self.lock().cancel_in_flight();
    }
}
