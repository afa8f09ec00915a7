use std::time::{Duration, Instant};

use super::{Callback, DelayedAction, FieldChange};
use crate::config::ClientConfig;
use crate::hooks::use_reference_search::ReferenceSearchProvider;
use shared::ReferenceCandidate;

/// Text input with a suggestion panel fed by a reference search provider.
///
/// Two pieces of text are tracked: `committed`, the value the form holds, and
/// `draft`, what the user is typing right now. An out-of-band change to the
/// committed value replaces the visible text unless a draft is in progress.
#[derive(Debug)]
pub struct SearchableSelect {
    committed: String,
    selected_id: Option<String>,
    draft: Option<String>,
    panel_open: bool,
    blur_close: DelayedAction,
    grace: Duration,
    on_change: Callback<FieldChange>,
}

impl SearchableSelect {
    pub fn new(committed: impl Into<String>, grace: Duration, on_change: Callback<FieldChange>) -> Self {
        Self {
            committed: committed.into(),
            selected_id: None,
            draft: None,
            panel_open: false,
            blur_close: DelayedAction::new(),
            grace,
            on_change,
        }
    }

    /// Same as `new`, with the blur grace period taken from client config
    pub fn from_config(committed: impl Into<String>, config: &ClientConfig, on_change: Callback<FieldChange>) -> Self {
        Self::new(committed, config.blur_grace(), on_change)
    }

    /// The text shown in the input box
    pub fn visible_text(&self) -> &str {
        self.draft.as_deref().unwrap_or(&self.committed)
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// Id of the candidate picked from the panel, `None` for free text
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.panel_open
    }

    pub fn is_typing(&self) -> bool {
        self.draft.is_some()
    }

    /// Reconcile with a committed value supplied from outside
    pub fn set_committed(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value != self.committed {
            self.selected_id = None;
        }
        self.committed = value;
    }

    pub fn focus(&mut self) {
        self.blur_close.cancel();
        self.panel_open = true;
    }

    pub fn type_text(&mut self, text: &str) {
        self.blur_close.cancel();
        self.draft = Some(text.to_string());
        self.panel_open = true;
    }

    /// Suggestions matching the visible text while the panel is open
    pub fn suggestions<'a, C: ReferenceCandidate>(&self, provider: &'a ReferenceSearchProvider<C>) -> Vec<&'a C> {
        if !self.panel_open {
            return Vec::new();
        }
        provider.filter(self.visible_text())
    }

    /// Commit a suggestion, close the panel and drop any pending blur close
    pub fn select<C: ReferenceCandidate>(&mut self, candidate: &C) {
        self.blur_close.cancel();
        self.committed = candidate.display_name();
        self.selected_id = Some(candidate.id().to_string());
        self.draft = None;
        self.panel_open = false;
        self.on_change.emit(FieldChange::valid(self.committed.clone()));
    }

    /// Start the grace period after which the panel closes. A click on a
    /// suggestion that lands inside the grace period still selects it.
    pub fn blur(&mut self, now: Instant) {
        if self.panel_open || self.draft.is_some() {
            self.blur_close.schedule(now, self.grace);
        }
    }

    /// Advance time; closes the panel once the blur grace period elapses and
    /// keeps typed text as a free-text value. Returns true if it closed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.blur_close.poll(now) {
            return false;
        }
        self.panel_open = false;
        if let Some(draft) = self.draft.take() {
            if draft != self.committed {
                self.committed = draft;
                self.selected_id = None;
                self.on_change.emit(FieldChange::valid(self.committed.clone()));
            }
        }
        true
    }

    /// Discard any pending delayed action; called when the field is torn down
    pub fn unmount(&mut self) {
        self.blur_close.cancel();
        self.panel_open = false;
    }
}

impl Drop for SearchableSelect {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fields::test_support::recorder;
    use crate::error::ApiError;
    use crate::services::api::ReferenceScope;
    use shared::{ReferenceKind, Surgeon};

    const GRACE: Duration = Duration::from_millis(150);

    fn surgeon(id: &str, first: &str, last: &str) -> Surgeon {
        Surgeon {
            id: id.to_string(),
            first_name: first.to_string(),
            surname: last.to_string(),
            is_consultant: true,
            gmc_number: None,
        }
    }

    fn loaded_provider() -> ReferenceSearchProvider<Surgeon> {
        let mut provider = ReferenceSearchProvider::new();
        let token = provider.activate(ReferenceScope::all(ReferenceKind::Surgeon)).unwrap();
        provider.resolve(
            token,
            Ok(vec![surgeon("s1", "Ada", "Lovelace"), surgeon("s2", "Alan", "Turing")]),
        );
        provider
    }

    #[test]
    fn test_typing_filters_suggestions() {
        let provider = loaded_provider();
        let mut field = SearchableSelect::new("", GRACE, Callback::noop());

        assert!(field.suggestions(&provider).is_empty());

        field.type_text("tur");
        let names: Vec<String> = field.suggestions(&provider).iter().map(|s| s.display_name()).collect();
        assert_eq!(names, vec!["Alan Turing"]);
    }

    #[test]
    fn test_select_commits_and_closes() {
        let provider = loaded_provider();
        let (cb, log) = recorder();
        let mut field = SearchableSelect::new("", GRACE, cb);

        field.type_text("ada");
        let pick = field.suggestions(&provider)[0].clone();
        field.select(&pick);

        assert_eq!(field.visible_text(), "Ada Lovelace");
        assert_eq!(field.selected_id(), Some("s1"));
        assert!(!field.is_open());
        assert_eq!(log.borrow().as_slice(), &[FieldChange::valid("Ada Lovelace")]);
    }

    #[test]
    fn test_click_within_grace_period_is_not_lost() {
        let provider = loaded_provider();
        let (cb, log) = recorder();
        let mut field = SearchableSelect::new("", GRACE, cb);
        let start = Instant::now();

        field.type_text("alan");
        field.blur(start);
        assert!(!field.tick(start + Duration::from_millis(50)));
        assert!(field.is_open());

        let pick = provider.filter("alan")[0].clone();
        field.select(&pick);

        // The cancelled blur close must not fire later and overwrite the pick
        assert!(!field.tick(start + Duration::from_secs(1)));
        assert_eq!(field.committed(), "Alan Turing");
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_blur_keeps_free_text() {
        let (cb, log) = recorder();
        let mut field = SearchableSelect::new("", GRACE, cb);
        let start = Instant::now();

        field.type_text("Locum Surgeon");
        field.blur(start);
        assert!(field.tick(start + GRACE));

        assert!(!field.is_open());
        assert!(!field.is_typing());
        assert_eq!(field.committed(), "Locum Surgeon");
        assert_eq!(field.selected_id(), None);
        assert_eq!(log.borrow().as_slice(), &[FieldChange::valid("Locum Surgeon")]);
    }

    #[test]
    fn test_configured_grace_period() {
        let config = ClientConfig {
            blur_grace_ms: 400,
            ..ClientConfig::default()
        };
        let mut field = SearchableSelect::from_config("", &config, Callback::noop());
        let start = Instant::now();

        field.type_text("Ada");
        field.blur(start);
        assert!(!field.tick(start + GRACE));
        assert!(field.is_open());
        assert!(field.tick(start + Duration::from_millis(400)));
        assert!(!field.is_open());
    }

    #[test]
    fn test_external_value_tracks_unless_typing() {
        let mut field = SearchableSelect::new("Ada Lovelace", GRACE, Callback::noop());

        field.set_committed("Alan Turing");
        assert_eq!(field.visible_text(), "Alan Turing");

        field.type_text("Gr");
        field.set_committed("Ada Lovelace");
        assert_eq!(field.visible_text(), "Gr");
        assert_eq!(field.committed(), "Ada Lovelace");
    }

    #[test]
    fn test_failed_provider_leaves_field_editable() {
        let mut provider: ReferenceSearchProvider<Surgeon> = ReferenceSearchProvider::new();
        let token = provider.activate(ReferenceScope::consultants()).unwrap();
        provider.resolve(
            token,
            Err(ApiError::Status {
                status: 500,
                message: "boom".to_string(),
            }),
        );

        let mut field = SearchableSelect::new("", GRACE, Callback::noop());
        field.type_text("Ada");
        assert!(field.suggestions(&provider).is_empty());
        assert_eq!(field.visible_text(), "Ada");
    }

    #[test]
    fn test_unmount_cancels_pending_close() {
        let (cb, log) = recorder();
        let mut field = SearchableSelect::new("", GRACE, cb);
        let start = Instant::now();
        field.type_text("pending");
        field.blur(start);
        field.unmount();
        assert!(!field.tick(start + GRACE));
        assert!(log.borrow().is_empty());
    }
}
