use super::{Callback, FieldChange};

/// Dropdown over a fixed set of codes. The option list may be swapped when a
/// controlling field changes; a selection that is no longer offered is
/// cleared and reported.
#[derive(Debug)]
pub struct SelectField {
    options: Vec<String>,
    value: String,
    on_change: Callback<FieldChange>,
}

impl SelectField {
    pub fn new<S: AsRef<str>>(options: &[S], initial: impl Into<String>, on_change: Callback<FieldChange>) -> Self {
        let options: Vec<String> = options.iter().map(|o| o.as_ref().to_string()).collect();
        let initial = initial.into();
        let value = if options.contains(&initial) { initial } else { String::new() };
        Self {
            options,
            value,
            on_change,
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Choose a code; returns false and reports nothing if it is not offered
    pub fn select(&mut self, code: &str) -> bool {
        if !code.is_empty() && !self.options.iter().any(|o| o == code) {
            return false;
        }
        self.value = code.to_string();
        self.on_change.emit(FieldChange::valid(code));
        true
    }

    pub fn clear(&mut self) {
        self.select("");
    }

    pub fn set_options<S: AsRef<str>>(&mut self, options: &[S]) {
        self.options = options.iter().map(|o| o.as_ref().to_string()).collect();
        if !self.value.is_empty() && !self.options.contains(&self.value) {
            self.clear();
        }
    }
}
