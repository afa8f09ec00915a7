//! Typed input controls. Each owns exactly one value and reports every change
//! through its `on_change` callback; none of them look at other fields.

use std::fmt;
use std::rc::Rc;

pub mod delayed_action;
pub mod searchable_select;
pub mod select_field;
pub mod text_inputs;

pub use delayed_action::DelayedAction;
pub use searchable_select::SearchableSelect;
pub use select_field::SelectField;
pub use text_inputs::{DateField, NumberField, TextField};

/// Shared, clonable handler invoked with a field's new value
pub struct Callback<T> {
    cb: Rc<dyn Fn(T)>,
}

impl<T> Callback<T> {
    pub fn emit(&self, value: T) {
        (self.cb)(value)
    }

    pub fn noop() -> Self {
        Self { cb: Rc::new(|_| {}) }
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self { cb: Rc::clone(&self.cb) }
    }
}

impl<T, F: Fn(T) + 'static> From<F> for Callback<T> {
    fn from(f: F) -> Self {
        Self { cb: Rc::new(f) }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

/// What a primitive reports upward after its value changes
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Normalised value when valid, the raw input otherwise
    pub value: String,
    pub error: Option<String>,
}

impl FieldChange {
    pub fn valid(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            error: None,
        }
    }

    pub fn invalid(value: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;

    /// Callback that records every change it receives
    pub fn recorder() -> (Callback<FieldChange>, Rc<RefCell<Vec<FieldChange>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let cb = Callback::from(move |change: FieldChange| sink.borrow_mut().push(change));
        (cb, log)
    }
}
