//! # Reference Search
//!
//! Loads surgeons, patients or providers once per scope and answers
//! keystroke-level text filtering from the cached list.
//!
//! ## Behaviour:
//! - `idle -> loading -> ready` on success, `idle -> loading -> failed` on error
//! - A failed load leaves an empty candidate list; search fields keep working
//!   as free text
//! - Only the most recently started fetch may write the cache. Older responses
//!   are dropped by generation comparison
//! - Responses arriving after the owning component is gone are ignored

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{ApiError, FormError};
use crate::services::api::{ReferenceApi, ReferenceScope};
use crate::services::logging::Logger;
use shared::ReferenceCandidate;

const COMPONENT: &str = "reference-search";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    /// Fetch failed; the cache is empty
    Failed,
}

/// Handed out when a fetch starts; required to write its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchToken {
    scope: ReferenceScope,
    generation: u64,
}

impl FetchToken {
    pub fn scope(&self) -> ReferenceScope {
        self.scope
    }
}

/// Cached reference candidates for one search scope
#[derive(Debug)]
pub struct ReferenceSearchProvider<C> {
    scope: Option<ReferenceScope>,
    state: LoadState,
    candidates: Vec<C>,
    generation: u64,
    last_error: Option<FormError>,
}

pub type SharedReferenceSearch<C> = Rc<RefCell<ReferenceSearchProvider<C>>>;

impl<C: ReferenceCandidate> ReferenceSearchProvider<C> {
    pub fn new() -> Self {
        Self {
            scope: None,
            state: LoadState::Idle,
            candidates: Vec::new(),
            generation: 0,
            last_error: None,
        }
    }

    pub fn shared() -> SharedReferenceSearch<C> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn scope(&self) -> Option<ReferenceScope> {
        self.scope
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn candidates(&self) -> &[C] {
        &self.candidates
    }

    /// Why the last load failed; cleared by the next successful load
    pub fn last_error(&self) -> Option<&FormError> {
        self.last_error.as_ref()
    }

    /// Start a fetch for `scope` unless that scope is already loaded or loading
    pub fn activate(&mut self, scope: ReferenceScope) -> Option<FetchToken> {
        if self.scope == Some(scope) && self.state != LoadState::Idle {
            return None;
        }
        Some(self.begin(scope))
    }

    /// Force a new fetch for the current scope
    pub fn refresh(&mut self) -> Option<FetchToken> {
        self.scope.map(|scope| self.begin(scope))
    }

    fn begin(&mut self, scope: ReferenceScope) -> FetchToken {
        self.generation += 1;
        self.scope = Some(scope);
        self.state = LoadState::Loading;
        Logger::debug_with_component(
            COMPONENT,
            &format!("Loading {} (generation {})", scope.path(), self.generation),
        );
        FetchToken {
            scope,
            generation: self.generation,
        }
    }

    /// Apply a fetch result. Returns false when the token is stale.
    pub fn resolve(&mut self, token: FetchToken, result: Result<Vec<C>, ApiError>) -> bool {
        if token.generation != self.generation || Some(token.scope) != self.scope {
            Logger::debug_with_component(
                COMPONENT,
                &format!(
                    "Discarding stale response for {} (generation {}, current {})",
                    token.scope.path(),
                    token.generation,
                    self.generation
                ),
            );
            return false;
        }

        match result {
            Ok(mut candidates) => {
                if token.scope.consultants_only {
                    candidates.retain(|c| c.is_consultant());
                }
                sort_candidates(&mut candidates);
                Logger::info_with_component(
                    COMPONENT,
                    &format!("Loaded {} candidates from {}", candidates.len(), token.scope.path()),
                );
                self.candidates = candidates;
                self.state = LoadState::Ready;
                self.last_error = None;
            }
            Err(e) => {
                Logger::warn_with_component(
                    COMPONENT,
                    &format!("Failed to load {}: {}", token.scope.path(), e),
                );
                self.candidates.clear();
                self.state = LoadState::Failed;
                self.last_error = Some(FormError::ReferenceFetch(e.to_string()));
            }
        }
        true
    }

    /// Candidates whose display name contains `query`, ignoring case
    pub fn filter(&self, query: &str) -> Vec<&C> {
        filter_candidates(&self.candidates, query)
    }
}

impl<C: ReferenceCandidate> Default for ReferenceSearchProvider<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Consultants first, then alphabetical by display name
fn sort_candidates<C: ReferenceCandidate>(candidates: &mut [C]) {
    candidates.sort_by(|a, b| {
        b.is_consultant()
            .cmp(&a.is_consultant())
            .then_with(|| a.display_name().to_lowercase().cmp(&b.display_name().to_lowercase()))
    });
}

pub fn filter_candidates<'a, C: ReferenceCandidate>(candidates: &'a [C], query: &str) -> Vec<&'a C> {
    let needle = query.to_lowercase();
    candidates
        .iter()
        .filter(|c| c.display_name().to_lowercase().contains(&needle))
        .collect()
}

/// Activate `scope` on the provider and load it through `api`.
///
/// Holds only a weak reference across the network call, so a provider
/// dropped by its owner in the meantime is never written to. Returns the
/// provider's state afterwards, or `None` if it no longer exists.
pub async fn use_reference_search<C, A>(
    provider: Weak<RefCell<ReferenceSearchProvider<C>>>,
    api: &A,
    scope: ReferenceScope,
) -> Option<LoadState>
where
    C: ReferenceCandidate,
    A: ReferenceApi<C> + ?Sized,
{
    let token = {
        let strong = provider.upgrade()?;
        let mut provider = strong.borrow_mut();
        match provider.activate(scope) {
            Some(token) => token,
            None => return Some(provider.state()),
        }
    };

    let result = api.fetch_candidates(&scope).await;

    let Some(strong) = provider.upgrade() else {
        Logger::debug_with_component(
            COMPONENT,
            &format!("Dropping response for {}; consumer unmounted", scope.path()),
        );
        return None;
    };
    let mut provider = strong.borrow_mut();
    provider.resolve(token, result);
    Some(provider.state())
}
