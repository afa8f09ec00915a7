use std::cell::RefCell;

/// Read access to the signed-in user's credential. Passed explicitly to the
/// API client and the modal host instead of being read from global state.
pub trait SessionProvider {
    fn bearer_token(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }
}

/// Session whose token is set by the host after sign-in
#[derive(Debug, Default)]
pub struct StaticSession {
    token: RefCell<Option<String>>,
}

impl StaticSession {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RefCell::new(token),
        }
    }

    pub fn signed_in(token: impl Into<String>) -> Self {
        Self::new(Some(token.into()))
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.borrow_mut() = token;
    }
}

impl SessionProvider for StaticSession {
    fn bearer_token(&self) -> Option<String> {
        self.token
            .borrow()
            .as_ref()
            .filter(|t| !t.trim().is_empty())
            .cloned()
    }
}
