//! # Modal Host
//!
//! Owns one entity wizard for the lifetime of a modal.
//!
//! ## Responsibilities:
//! - Keyboard routing: Escape cancels, primary modifier + Enter requests
//!   submit, Enter inside a list staging input commits that row
//! - Backdrop clicks cancel; clicks on the content never reach the backdrop
//! - Exactly one of the submit or cancel callbacks fires per lifecycle
//!
//! The key listener is registered on mount and released when the host closes
//! or is dropped, so a closed modal leaves nothing behind in the registry.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};
use uuid::Uuid;

use crate::components::wizard::WizardController;
use crate::error::FormError;
use crate::services::api::EntitySubmitter;
use crate::services::logging::Logger;
use crate::services::session::SessionProvider;
use shared::Submission;

const COMPONENT: &str = "modal_host";

/// Document-level key listeners currently bound
#[derive(Debug, Clone, Default)]
pub struct KeyboardRegistry {
    listeners: Rc<RefCell<BTreeSet<Uuid>>>,
}

impl KeyboardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_bound(&self, id: Uuid) -> bool {
        self.listeners.borrow().contains(&id)
    }

    fn bind(&self, id: Uuid) -> KeyListenerGuard {
        self.listeners.borrow_mut().insert(id);
        KeyListenerGuard {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }
}

/// Removes its listener from the registry when dropped
#[derive(Debug)]
pub struct KeyListenerGuard {
    id: Uuid,
    listeners: Weak<RefCell<BTreeSet<Uuid>>>,
}

impl Drop for KeyListenerGuard {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().remove(&self.id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Character(char),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS
    pub fn is_primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Element that had focus when the key was pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyTarget {
    Field(String),
    /// The add-item input of a list field
    StagingInput(String),
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub target: KeyTarget,
}

impl KeyEvent {
    pub fn new(key: Key, target: KeyTarget) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            target,
        }
    }

    pub fn with_primary(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Backdrop,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalOutcome {
    Submitted,
    Cancelled,
}

/// What a key press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Cancelled,
    /// The caller should run `submit` with its write collaborator
    SubmitRequested,
    /// Enter in a staging input; `false` when the input was blank
    ListItemCommitted(bool),
    Ignored,
}

/// Lifecycle callbacks; exactly one of them runs
pub struct ModalCallbacks {
    pub on_submit: Box<dyn FnOnce(Submission)>,
    pub on_cancel: Box<dyn FnOnce()>,
}

impl ModalCallbacks {
    pub fn new(on_submit: impl FnOnce(Submission) + 'static, on_cancel: impl FnOnce() + 'static) -> Self {
        Self {
            on_submit: Box::new(on_submit),
            on_cancel: Box::new(on_cancel),
        }
    }
}

impl fmt::Debug for ModalCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModalCallbacks")
    }
}

pub struct ModalHost {
    id: Uuid,
    wizard: Option<WizardController>,
    callbacks: Option<ModalCallbacks>,
    listener: Option<KeyListenerGuard>,
    session: Rc<dyn SessionProvider>,
    outcome: Option<ModalOutcome>,
}

impl ModalHost {
    /// Open a modal around `wizard` and bind its key listener
    pub fn mount(
        wizard: WizardController,
        callbacks: ModalCallbacks,
        keyboard: &KeyboardRegistry,
        session: Rc<dyn SessionProvider>,
    ) -> Self {
        let id = Uuid::new_v4();
        Logger::debug_with_component(
            COMPONENT,
            &format!(
                "Mounted modal {} for {} {}",
                id,
                wizard.form().kind(),
                wizard.form().identifier()
            ),
        );

        Self {
            id,
            wizard: Some(wizard),
            callbacks: Some(callbacks),
            listener: Some(keyboard.bind(id)),
            session,
            outcome: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn outcome(&self) -> Option<ModalOutcome> {
        self.outcome
    }

    /// The wizard while the modal is open
    pub fn wizard(&self) -> Option<&WizardController> {
        self.wizard.as_ref()
    }

    pub fn wizard_mut(&mut self) -> Option<&mut WizardController> {
        self.wizard.as_mut()
    }

    /// Whether closing now would lose edits
    pub fn is_dirty(&self) -> bool {
        self.wizard.as_ref().map(|w| w.form().is_dirty()).unwrap_or(false)
    }

    pub fn on_key(&mut self, event: &KeyEvent) -> KeyCommand {
        if !self.is_open() {
            return KeyCommand::Ignored;
        }

        match (event.key, &event.target) {
            (Key::Escape, _) => {
                self.cancel();
                KeyCommand::Cancelled
            }
            (Key::Enter, _) if event.modifiers.is_primary() => KeyCommand::SubmitRequested,
            (Key::Enter, KeyTarget::StagingInput(field)) => {
                let Some(wizard) = self.wizard.as_mut() else {
                    return KeyCommand::Ignored;
                };
                match wizard.form_mut().commit_staging(field) {
                    Ok(added) => KeyCommand::ListItemCommitted(added),
                    Err(e) => {
                        Logger::warn_with_component(COMPONENT, &format!("Enter in staging input: {}", e));
                        KeyCommand::Ignored
                    }
                }
            }
            _ => KeyCommand::Ignored,
        }
    }

    /// Returns whether the click closed the modal
    pub fn on_click(&mut self, target: ClickTarget) -> bool {
        match target {
            ClickTarget::Backdrop if self.is_open() => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    /// Discard the draft and fire the cancel callback
    pub fn cancel(&mut self) {
        let Some(callbacks) = self.close(ModalOutcome::Cancelled) else {
            return;
        };
        if let Some(wizard) = self.wizard.take() {
            wizard.cancel();
        }
        (callbacks.on_cancel)();
    }

    /// Validate, hand the entity to `submitter` and, once it accepts, fire the
    /// submit callback. A rejection keeps the modal open with its draft.
    pub async fn submit(&mut self, submitter: &dyn EntitySubmitter) -> Result<Submission, FormError> {
        if !self.is_open() {
            return Err(FormError::ModalClosed);
        }
        let wizard = self.wizard.as_mut().ok_or(FormError::ModalClosed)?;

        if !self.session.is_authenticated() {
            wizard.record_submission_failure(FormError::NotAuthenticated.to_string());
            return Err(FormError::NotAuthenticated);
        }

        let submission = wizard.prepare_submission()?;
        if let Err(message) = submitter.submit(&submission).await {
            wizard.record_submission_failure(message.clone());
            return Err(FormError::SubmissionRejected(message));
        }
        wizard.mark_submitted();

        Logger::info_with_component(
            COMPONENT,
            &format!("Submitted {} {}", submission.payload.kind(), submission.payload.identifier()),
        );
        if let Some(callbacks) = self.close(ModalOutcome::Submitted) {
            (callbacks.on_submit)(submission.clone());
        }
        self.wizard.take();
        Ok(submission)
    }

    /// Record the outcome, drop the key listener and hand back the callbacks
    /// if they have not been used yet
    fn close(&mut self, outcome: ModalOutcome) -> Option<ModalCallbacks> {
        let callbacks = self.callbacks.take()?;
        self.outcome = Some(outcome);
        self.listener = None;
        Logger::debug_with_component(COMPONENT, &format!("Modal {} closed: {:?}", self.id, outcome));
        Some(callbacks)
    }
}

impl fmt::Debug for ModalHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalHost")
            .field("id", &self.id)
            .field("outcome", &self.outcome)
            .field("wizard", &self.wizard)
            .finish()
    }
}

impl Drop for ModalHost {
    // Unmounting an open modal counts as cancel
    fn drop(&mut self) {
        if self.is_open() {
            self.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::forms::follow_up_form;
    use crate::services::session::StaticSession;
    use crate::state::form_state::ParentLinkage;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    /// Write collaborator that rejects a fixed number of attempts first
    struct RecordingSubmitter {
        rejections: Cell<u32>,
        received: RefCell<Vec<Submission>>,
    }

    impl RecordingSubmitter {
        fn accepting() -> Self {
            Self::rejecting(0)
        }

        fn rejecting(times: u32) -> Self {
            Self {
                rejections: Cell::new(times),
                received: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl EntitySubmitter for RecordingSubmitter {
        async fn submit(&self, submission: &Submission) -> Result<(), String> {
            self.received.borrow_mut().push(submission.clone());
            if self.rejections.get() > 0 {
                self.rejections.set(self.rejections.get() - 1);
                return Err("Record store unavailable".to_string());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Fired {
        submitted: Cell<u32>,
        cancelled: Cell<u32>,
    }

    fn mount_follow_up(keyboard: &KeyboardRegistry, session: Rc<dyn SessionProvider>) -> (ModalHost, Rc<Fired>) {
        let fired = Rc::new(Fired::default());
        let on_submit = {
            let fired = fired.clone();
            move |_: Submission| fired.submitted.set(fired.submitted.get() + 1)
        };
        let on_cancel = {
            let fired = fired.clone();
            move || fired.cancelled.set(fired.cancelled.get() + 1)
        };
        let wizard = follow_up_form::open_create(ParentLinkage::patient("P123"), 0).unwrap();
        let host = ModalHost::mount(wizard, ModalCallbacks::new(on_submit, on_cancel), keyboard, session);
        (host, fired)
    }

    fn signed_in() -> Rc<dyn SessionProvider> {
        Rc::new(StaticSession::signed_in("token"))
    }

    fn fill_valid(host: &mut ModalHost) {
        let form = host.wizard_mut().unwrap().form_mut();
        form.update("visit_date", "2024-06-01").unwrap();
        form.update("outcome", "NoEvidenceOfDisease").unwrap();
    }

    #[test]
    fn test_escape_cancels_once() {
        let keyboard = KeyboardRegistry::new();
        let (mut host, fired) = mount_follow_up(&keyboard, signed_in());
        assert_eq!(keyboard.listener_count(), 1);

        let escape = KeyEvent::new(Key::Escape, KeyTarget::Content);
        assert_eq!(host.on_key(&escape), KeyCommand::Cancelled);
        assert_eq!(host.on_key(&escape), KeyCommand::Ignored);
        host.cancel();
        drop(host);

        assert_eq!(fired.cancelled.get(), 1);
        assert_eq!(fired.submitted.get(), 0);
        assert_eq!(keyboard.listener_count(), 0);
    }

    #[test]
    fn test_backdrop_click_cancels_content_click_does_not() {
        let keyboard = KeyboardRegistry::new();
        let (mut host, fired) = mount_follow_up(&keyboard, signed_in());

        assert!(!host.on_click(ClickTarget::Content));
        assert!(host.is_open());

        assert!(host.on_click(ClickTarget::Backdrop));
        assert_eq!(host.outcome(), Some(ModalOutcome::Cancelled));
        assert!(host.wizard().is_none());
        assert_eq!(fired.cancelled.get(), 1);
    }

    #[test]
    fn test_unmount_without_action_is_cancel() {
        let keyboard = KeyboardRegistry::new();
        let (host, fired) = mount_follow_up(&keyboard, signed_in());
        drop(host);

        assert_eq!(fired.cancelled.get(), 1);
        assert_eq!(keyboard.listener_count(), 0);
    }

    #[test]
    fn test_enter_in_staging_input_commits_row() {
        let keyboard = KeyboardRegistry::new();
        let (mut host, fired) = mount_follow_up(&keyboard, signed_in());
        host.wizard_mut()
            .unwrap()
            .form_mut()
            .set_staging("investigations_ordered", "CT TAP")
            .unwrap();

        let enter = KeyEvent::new(Key::Enter, KeyTarget::StagingInput("investigations_ordered".to_string()));
        assert_eq!(host.on_key(&enter), KeyCommand::ListItemCommitted(true));
        assert_eq!(host.on_key(&enter), KeyCommand::ListItemCommitted(false));
        assert_eq!(host.wizard().unwrap().form().list("investigations_ordered"), &["CT TAP"]);

        // Plain Enter in an ordinary field neither submits nor closes
        let plain = KeyEvent::new(Key::Enter, KeyTarget::Field("notes".to_string()));
        assert_eq!(host.on_key(&plain), KeyCommand::Ignored);
        assert!(host.is_open());
        assert_eq!(fired.submitted.get() + fired.cancelled.get(), 0);
    }

    #[test]
    fn test_primary_enter_requests_submit() {
        let keyboard = KeyboardRegistry::new();
        let (mut host, _fired) = mount_follow_up(&keyboard, signed_in());

        let submit = KeyEvent::new(Key::Enter, KeyTarget::StagingInput("investigations_ordered".to_string()))
            .with_primary();
        assert_eq!(host.on_key(&submit), KeyCommand::SubmitRequested);
        assert!(host.is_open());
    }

    #[tokio::test]
    async fn test_submit_fires_submit_callback_only() {
        let keyboard = KeyboardRegistry::new();
        let (mut host, fired) = mount_follow_up(&keyboard, signed_in());
        fill_valid(&mut host);

        let submitter = RecordingSubmitter::accepting();
        let submission = host.submit(&submitter).await.unwrap();
        assert_eq!(submission.payload.identifier(), "FU-P123-01");
        assert_eq!(host.outcome(), Some(ModalOutcome::Submitted));
        assert_eq!(keyboard.listener_count(), 0);
        assert!(host.wizard().is_none());
        assert!(!host.is_dirty());

        // Nothing after a submit can fire the other callback
        host.cancel();
        assert!(!host.on_click(ClickTarget::Backdrop));
        assert_eq!(host.submit(&submitter).await, Err(FormError::ModalClosed));
        drop(host);

        assert_eq!(fired.submitted.get(), 1);
        assert_eq!(fired.cancelled.get(), 0);
        assert_eq!(submitter.received.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_submit_keeps_modal_open_for_retry() {
        let keyboard = KeyboardRegistry::new();
        let (mut host, fired) = mount_follow_up(&keyboard, signed_in());
        fill_valid(&mut host);

        let submitter = RecordingSubmitter::rejecting(1);
        let result = host.submit(&submitter).await;
        assert_eq!(result, Err(FormError::SubmissionRejected("Record store unavailable".to_string())));
        assert!(host.is_open());
        assert_eq!(fired.submitted.get(), 0);
        assert_eq!(
            host.wizard().unwrap().submission_error(),
            Some("Record store unavailable")
        );
        assert_eq!(host.wizard().unwrap().form().value("outcome"), Some("NoEvidenceOfDisease"));

        assert!(host.submit(&submitter).await.is_ok());
        assert_eq!(fired.submitted.get(), 1);
        assert_eq!(fired.cancelled.get(), 0);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_submitter() {
        let keyboard = KeyboardRegistry::new();
        let (mut host, fired) = mount_follow_up(&keyboard, signed_in());

        let submitter = RecordingSubmitter::accepting();
        let err = host.submit(&submitter).await.unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("outcome"));
        assert!(submitter.received.borrow().is_empty());
        assert!(host.is_open());
        assert_eq!(fired.submitted.get(), 0);
    }

    #[tokio::test]
    async fn test_signed_out_session_blocks_submit() {
        let keyboard = KeyboardRegistry::new();
        let session = Rc::new(StaticSession::new(None));
        let (mut host, _fired) = mount_follow_up(&keyboard, session.clone());
        fill_valid(&mut host);

        let submitter = RecordingSubmitter::accepting();
        assert_eq!(host.submit(&submitter).await, Err(FormError::NotAuthenticated));
        assert!(submitter.received.borrow().is_empty());

        session.set_token(Some("fresh".to_string()));
        assert!(host.submit(&submitter).await.is_ok());
    }

    #[test]
    fn test_listeners_scoped_to_each_mount() {
        let keyboard = KeyboardRegistry::new();
        let (first, _) = mount_follow_up(&keyboard, signed_in());
        let (mut second, _) = mount_follow_up(&keyboard, signed_in());
        assert_eq!(keyboard.listener_count(), 2);
        assert!(keyboard.is_bound(first.id()));

        second.cancel();
        assert_eq!(keyboard.listener_count(), 1);
        assert!(!keyboard.is_bound(second.id()));
        drop(first);
        assert_eq!(keyboard.listener_count(), 0);
    }

    #[test]
    fn test_dirty_tracking() {
        let keyboard = KeyboardRegistry::new();
        let (mut host, _) = mount_follow_up(&keyboard, signed_in());
        assert!(!host.is_dirty());
        fill_valid(&mut host);
        assert!(host.is_dirty());
    }
}
