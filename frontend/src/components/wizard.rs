use std::cell::RefCell;
use std::rc::Rc;

use crate::components::fields::{Callback, FieldChange};
use crate::components::forms::payload_from_snapshot;
use crate::error::{FieldErrors, FormError};
use crate::services::logging::Logger;
use crate::state::form_state::EntityFormState;
use crate::state::schema::FieldSpec;
use shared::Submission;

const COMPONENT: &str = "wizard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Editing,
    Submitting,
    Submitted,
}

/// Step indicator entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepStatus {
    pub index: usize,
    pub title: &'static str,
    pub is_current: bool,
    pub is_complete: bool,
}

/// Sequences a form's fields into steps. Advancing checks the current step's
/// required and typed fields; submitting is only possible from the last step.
#[derive(Debug)]
pub struct WizardController {
    form: EntityFormState,
    current_step: usize,
    step_errors: FieldErrors,
    submission_error: Option<String>,
    status: SubmissionStatus,
}

impl WizardController {
    pub fn new(form: EntityFormState) -> Self {
        Self {
            form,
            current_step: 0,
            step_errors: FieldErrors::new(),
            submission_error: None,
            status: SubmissionStatus::Editing,
        }
    }

    pub fn form(&self) -> &EntityFormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EntityFormState {
        &mut self.form
    }

    /// Route a primitive's change into the draft
    pub fn apply_change(&mut self, field: &str, change: FieldChange) -> Result<(), FormError> {
        self.form.apply_change(field, change)
    }

    /// `on_change` handler for the primitive rendering `field`. Holds the
    /// wizard weakly; changes arriving after it is gone are dropped.
    pub fn field_callback(wizard: &Rc<RefCell<Self>>, field: &'static str) -> Callback<FieldChange> {
        let wizard = Rc::downgrade(wizard);
        Callback::from(move |change: FieldChange| {
            let Some(strong) = wizard.upgrade() else {
                return;
            };
            let Ok(mut wizard) = strong.try_borrow_mut() else {
                Logger::warn_with_component(COMPONENT, &format!("Change to '{}' arrived mid-update; ignored", field));
                return;
            };
            if let Err(e) = wizard.apply_change(field, change) {
                Logger::warn_with_component(COMPONENT, &format!("Could not apply change to '{}': {}", field, e));
            }
        })
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step_count(&self) -> usize {
        self.form.schema().step_count()
    }

    pub fn step_title(&self) -> &'static str {
        self.form
            .schema()
            .steps
            .get(self.current_step)
            .copied()
            .unwrap_or_default()
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 >= self.step_count()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    /// Messages for the current step, keyed by field name
    pub fn step_errors(&self) -> &FieldErrors {
        &self.step_errors
    }

    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    /// Visible fields of the current step, in schema order
    pub fn current_fields(&self) -> Vec<&'static FieldSpec> {
        self.form
            .schema()
            .fields_in_step(self.current_step)
            .filter(|f| self.form.is_visible(f))
            .collect()
    }

    pub fn step_summary(&self) -> Vec<StepStatus> {
        let schema = self.form.schema();
        (0..self.step_count())
            .map(|index| StepStatus {
                index,
                title: schema.steps.get(index).copied().unwrap_or_default(),
                is_current: index == self.current_step,
                is_complete: self.form.validate(Some(index)).is_empty(),
            })
            .collect()
    }

    /// Move to the next step if the current one is complete. On the last step
    /// this is a no-op.
    pub fn advance(&mut self) -> Result<usize, FormError> {
        if self.is_last_step() {
            return Ok(self.current_step);
        }

        let errors = self.form.validate(Some(self.current_step));
        if !errors.is_empty() {
            Logger::debug_with_component(
                COMPONENT,
                &format!("Advance blocked on step {}: {:?}", self.current_step, errors.keys()),
            );
            self.step_errors = errors.clone();
            return Err(FormError::StepValidation(errors));
        }

        self.step_errors.clear();
        self.current_step += 1;
        Ok(self.current_step)
    }

    /// Move back one step; a no-op on the first step
    pub fn retreat(&mut self) -> usize {
        if self.current_step > 0 {
            self.current_step -= 1;
            self.step_errors.clear();
        }
        self.current_step
    }

    /// Validate everything and assemble the entity for the write collaborator.
    /// Errors for the current step are kept for display.
    pub fn prepare_submission(&mut self) -> Result<Submission, FormError> {
        if !self.is_last_step() {
            return Err(FormError::NotOnLastStep);
        }

        let missing = self.form.missing_required(None);
        let format = self.form.format_errors(None);
        if !missing.is_empty() || !format.is_empty() {
            let mut errors = missing;
            let only_format = errors.is_empty();
            errors.extend(format);
            self.step_errors = errors.clone();
            return Err(if only_format {
                FormError::FormatValidation(errors)
            } else {
                FormError::StepValidation(errors)
            });
        }

        let snapshot = self.form.snapshot()?;
        let mode = snapshot.mode;
        let payload = payload_from_snapshot(&snapshot)?;
        payload.validate(mode)?;

        self.step_errors.clear();
        self.submission_error = None;
        self.status = SubmissionStatus::Submitting;
        Ok(Submission { mode, payload })
    }

    /// Keep the draft and surface the collaborator's message
    pub fn record_submission_failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        Logger::warn_with_component(COMPONENT, &format!("Submission rejected: {}", message));
        self.submission_error = Some(message);
        self.status = SubmissionStatus::Editing;
    }

    pub fn mark_submitted(&mut self) {
        self.status = SubmissionStatus::Submitted;
    }

    /// Submit through a synchronous completion callback
    pub fn submit<F>(&mut self, on_complete: F) -> Result<Submission, FormError>
    where
        F: FnOnce(&Submission) -> Result<(), String>,
    {
        let submission = self.prepare_submission()?;
        match on_complete(&submission) {
            Ok(()) => {
                self.mark_submitted();
                Ok(submission)
            }
            Err(message) => {
                self.record_submission_failure(message.clone());
                Err(FormError::SubmissionRejected(message))
            }
        }
    }

    /// Discard the draft without submitting
    pub fn cancel(self) {
        Logger::debug_with_component(
            COMPONENT,
            &format!("Discarding {} draft {}", self.form.kind(), self.form.identifier()),
        );
    }
}
