use super::{
    CredentialForm, FieldError, GENERIC_FAILURE_MESSAGE, Notice, PasswordField, ResponseClass,
    SubmitOutcome, Transition, ValidationErrors, WorkflowError, WorkflowState,
};
use crate::{
    api::{AdminDataSource, AdminProfile, ApiError},
    console::observers::{Observers, Subscription},
};
use secrecy::SecretString;
use std::{
    cell::RefCell,
    fmt, mem,
    rc::{Rc, Weak},
    time::Duration,
};
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, error, info, warn};

/// How long the success notice stays up before the form closes itself.
pub const AUTO_DISMISS_DELAY: Duration = Duration::from_millis(1500);

#[derive(Default)]
struct Inner {
    state: WorkflowState,
    form: CredentialForm,
    notice: Option<Notice>,
    profile: Option<AdminProfile>,
    in_flight: bool,
    generation: u64,
    dismiss_timer: Option<JoinHandle<()>>,
}

impl Inner {
    fn enter(&mut self, to: WorkflowState, transitions: &mut Vec<Transition>) {
        let from = mem::replace(&mut self.state, to);
        transitions.push(Transition { from, to });
    }

    fn profile_username(&self) -> String {
        self.profile
            .as_ref()
            .map(|profile| profile.username.clone())
            .unwrap_or_default()
    }

    fn abort_timer(&mut self) {
        if let Some(timer) = self.dismiss_timer.take() {
            timer.abort();
        }
    }

    /// Starts a new generation with an empty form.
    fn restart(&mut self) {
        self.abort_timer();
        self.generation += 1;
        let username = self.profile_username();
        self.form.reset(username);
        self.notice = None;
    }
}

#[derive(Default)]
struct Shared {
    inner: RefCell<Inner>,
    transitions: Observers<Transition>,
}

impl Shared {
    /// Runs `f` with the state borrowed, then publishes the transitions it recorded
    /// once the borrow is released.
    fn update<T>(&self, f: impl FnOnce(&mut Inner, &mut Vec<Transition>) -> T) -> T {
        let mut transitions = Vec::new();
        let value = f(&mut self.inner.borrow_mut(), &mut transitions);
        for transition in &transitions {
            debug!(
                from = transition.from.as_str(),
                to = transition.to.as_str(),
                "credential workflow transition"
            );
            self.transitions.notify(transition);
        }
        value
    }

    fn dismiss(&self, generation: u64) {
        self.update(|inner, transitions| {
            if inner.generation != generation || inner.state != WorkflowState::Succeeded {
                return;
            }
            // The timer task is the one running this; dropping its handle detaches it.
            inner.dismiss_timer = None;
            inner.restart();
            inner.enter(WorkflowState::Idle, transitions);
        });
    }
}

/// Held by `submit` while the request is on the wire. If the submit future is
/// dropped before the response settles, the request dies with it: the guard clears
/// the in-flight flag and returns a still-current form to Editing.
struct InFlight {
    shared: Weak<Shared>,
    generation: u64,
    armed: bool,
}

impl InFlight {
    fn settled(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        shared.update(|inner, transitions| {
            inner.in_flight = false;
            if inner.generation == self.generation && inner.state == WorkflowState::Submitting {
                warn!(generation = self.generation, "password change abandoned");
                inner.enter(WorkflowState::Editing, transitions);
            }
        });
    }
}

/// Drives the credential form against an [`AdminDataSource`].
///
/// Handles are cheap to clone and share the same state. Must be used from inside a
/// [`tokio::task::LocalSet`]: the auto-dismiss timer is a local task.
pub struct CredentialWorkflow<S> {
    shared: Rc<Shared>,
    source: Rc<S>,
}

impl<S> Clone for CredentialWorkflow<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            source: Rc::clone(&self.source),
        }
    }
}

impl<S: AdminDataSource + 'static> CredentialWorkflow<S> {
    pub fn new(source: S) -> Self {
        Self {
            shared: Rc::default(),
            source: Rc::new(source),
        }
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub fn state(&self) -> WorkflowState {
        self.shared.inner.borrow().state
    }

    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.shared.inner.borrow().notice.clone()
    }

    #[must_use]
    pub fn profile(&self) -> Option<AdminProfile> {
        self.shared.inner.borrow().profile.clone()
    }

    /// Username shown in the read-only form field.
    #[must_use]
    pub fn username(&self) -> String {
        self.shared.inner.borrow().form.username().to_string()
    }

    /// Whether a request is on the wire. Stays set until the request settles, even if
    /// the form was cancelled or reopened meanwhile.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.shared.inner.borrow().in_flight
    }

    /// Whether the submit control is enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        let inner = self.shared.inner.borrow();
        inner.state == WorkflowState::Editing && !inner.in_flight && inner.form.validate().is_ok()
    }

    #[must_use]
    pub fn field_error(&self, field: PasswordField) -> Option<FieldError> {
        self.shared.inner.borrow().form.field_error(field)
    }

    #[must_use]
    pub fn field_is_empty(&self, field: PasswordField) -> bool {
        self.shared.inner.borrow().form.is_empty(field)
    }

    /// Full validation of the current values.
    ///
    /// # Errors
    /// Returns every error that would block a submission.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.shared.inner.borrow().form.validate()
    }

    pub fn subscribe(&self, listener: impl Fn(&Transition) + 'static) -> Subscription {
        self.shared.transitions.subscribe(listener)
    }

    /// Fetches the admin profile to prefill the username.
    ///
    /// # Errors
    /// Returns the [`ApiError`] from the data source; the workflow keeps its previous
    /// profile.
    pub async fn load_profile(&self) -> Result<AdminProfile, ApiError> {
        let profile = self
            .source
            .fetch_profile()
            .await
            .inspect_err(|err| warn!("Failed to load admin profile: {err}"))?;

        self.shared.update(|inner, _| {
            if inner.state == WorkflowState::Idle || inner.form.username().is_empty() {
                inner.form.set_username(profile.username.clone());
            }
            inner.profile = Some(profile.clone());
        });
        debug!(username = %profile.username, "admin profile loaded");
        Ok(profile)
    }

    /// Opens the form. Reopening while editing is a no-op; reopening after a success
    /// stops the pending auto-dismiss.
    ///
    /// # Errors
    /// Returns [`WorkflowError::InvalidState`] while a submission is being processed.
    pub fn open(&self) -> Result<(), WorkflowError> {
        self.shared.update(|inner, transitions| match inner.state {
            WorkflowState::Editing => Ok(()),
            WorkflowState::Idle | WorkflowState::Succeeded => {
                inner.restart();
                inner.enter(WorkflowState::Editing, transitions);
                Ok(())
            }
            state @ (WorkflowState::Submitting | WorkflowState::Failed) => {
                Err(WorkflowError::InvalidState {
                    operation: "open",
                    state,
                })
            }
        })
    }

    /// Updates one password field.
    ///
    /// # Errors
    /// Returns [`WorkflowError::InvalidState`] unless the form is being edited.
    pub fn input(
        &self,
        field: PasswordField,
        value: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        let value = SecretString::from(value.into());
        self.shared.update(|inner, _| {
            if inner.state != WorkflowState::Editing {
                return Err(WorkflowError::InvalidState {
                    operation: "input",
                    state: inner.state,
                });
            }
            inner.form.set(field, value);
            Ok(())
        })
    }

    /// Closes the form and clears it. Returns `false` when already idle.
    ///
    /// A request still on the wire is left to settle; its response is discarded.
    pub fn cancel(&self) -> bool {
        self.shared.update(|inner, transitions| {
            if inner.state == WorkflowState::Idle {
                return false;
            }
            inner.restart();
            inner.enter(WorkflowState::Idle, transitions);
            true
        })
    }

    /// Validates and submits the form.
    ///
    /// # Errors
    /// Returns [`WorkflowError`] when nothing was sent: the form is not being edited, a
    /// previous request is still in flight, or validation failed. Backend failures are
    /// reported through [`SubmitOutcome`].
    pub async fn submit(&self) -> Result<SubmitOutcome, WorkflowError> {
        let (request, generation) = self.shared.update(|inner, transitions| {
            if inner.state != WorkflowState::Editing {
                return Err(WorkflowError::InvalidState {
                    operation: "submit",
                    state: inner.state,
                });
            }
            if inner.in_flight {
                return Err(WorkflowError::RequestInFlight);
            }
            inner.form.touch_all();
            inner.form.validate()?;

            inner.in_flight = true;
            inner.notice = None;
            inner.enter(WorkflowState::Submitting, transitions);
            Ok((inner.form.to_request(), inner.generation))
        })?;

        let in_flight = InFlight {
            shared: Rc::downgrade(&self.shared),
            generation,
            armed: true,
        };

        debug!(username = request.username(), "submitting password change");
        let response = ResponseClass::classify(self.source.change_password(&request).await);
        drop(request);
        in_flight.settled();

        let outcome = self.shared.update(|inner, transitions| {
            inner.in_flight = false;
            if inner.generation != generation || inner.state != WorkflowState::Submitting {
                debug!(generation, "discarding stale password change response");
                return SubmitOutcome::Discarded;
            }

            match response {
                ResponseClass::Accepted { message } => {
                    let username = inner.form.username().to_string();
                    info!(username = %username, "password updated");
                    inner.form.reset(username);
                    inner.notice = Some(Notice::success(message.clone()));
                    inner.enter(WorkflowState::Succeeded, transitions);
                    self.schedule_dismiss(inner);
                    SubmitOutcome::Succeeded { message }
                }
                ResponseClass::Rejected { status, message } => {
                    warn!(status, "password change rejected: {message}");
                    inner.notice = Some(Notice::error(message.clone()));
                    inner.enter(WorkflowState::Failed, transitions);
                    inner.enter(WorkflowState::Editing, transitions);
                    SubmitOutcome::Rejected { status, message }
                }
                ResponseClass::Failed { detail } => {
                    error!("password change failed: {detail}");
                    let message = GENERIC_FAILURE_MESSAGE.to_string();
                    inner.notice = Some(Notice::error(message.clone()));
                    inner.enter(WorkflowState::Failed, transitions);
                    inner.enter(WorkflowState::Editing, transitions);
                    SubmitOutcome::Failed { message }
                }
            }
        });

        if matches!(outcome, SubmitOutcome::Succeeded { .. }) {
            // Best effort: a refresh failure is logged by load_profile.
            let _ = self.load_profile().await;
        }

        Ok(outcome)
    }

    fn schedule_dismiss(&self, inner: &mut Inner) {
        inner.abort_timer();
        let shared = Rc::downgrade(&self.shared);
        let generation = inner.generation;
        inner.dismiss_timer = Some(tokio::task::spawn_local(async move {
            sleep(AUTO_DISMISS_DELAY).await;
            if let Some(shared) = shared.upgrade() {
                shared.dismiss(generation);
            }
        }));
    }
}

impl<S> fmt::Debug for CredentialWorkflow<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.borrow();
        f.debug_struct("CredentialWorkflow")
            .field("state", &inner.state)
            .field("in_flight", &inner.in_flight)
            .field("generation", &inner.generation)
            .field("form", &inner.form)
            .finish_non_exhaustive()
    }
}
