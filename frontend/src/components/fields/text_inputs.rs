use super::{Callback, FieldChange};
use crate::services::date_utils::{format_date_for_display, normalize_date_input};

/// Free text input
#[derive(Debug)]
pub struct TextField {
    value: String,
    on_change: Callback<FieldChange>,
}

impl TextField {
    pub fn new(initial: impl Into<String>, on_change: Callback<FieldChange>) -> Self {
        Self {
            value: initial.into(),
            on_change,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn input(&mut self, raw: &str) {
        self.value = raw.to_string();
        self.on_change.emit(FieldChange::valid(raw));
    }

    /// Replace the value from outside without reporting it back
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}

/// Decimal input such as a lab value or a weight. Empty input is valid and
/// means "not recorded".
#[derive(Debug)]
pub struct NumberField {
    value: String,
    error: Option<String>,
    on_change: Callback<FieldChange>,
}

impl NumberField {
    pub fn new(initial: impl Into<String>, on_change: Callback<FieldChange>) -> Self {
        let value = initial.into();
        let error = number_error(&value);
        Self {
            value,
            error,
            on_change,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn input(&mut self, raw: &str) {
        self.value = raw.trim().to_string();
        self.error = number_error(&self.value);
        self.on_change.emit(FieldChange {
            value: self.value.clone(),
            error: self.error.clone(),
        });
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.error = number_error(&self.value);
    }
}

/// Parse a decimal, `None` for blank input. `Err` for anything else that is
/// not a finite number.
pub fn parse_number_input(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err("Enter a number".to_string()),
    }
}

fn number_error(value: &str) -> Option<String> {
    parse_number_input(value).err()
}

/// Date input accepting `YYYY-MM-DD` or `DD/MM/YYYY`; valid input is reported
/// in ISO form.
#[derive(Debug)]
pub struct DateField {
    value: String,
    error: Option<String>,
    on_change: Callback<FieldChange>,
}

pub const DATE_FORMAT_MESSAGE: &str = "Enter a date as YYYY-MM-DD or DD/MM/YYYY";

impl DateField {
    pub fn new(initial: impl Into<String>, on_change: Callback<FieldChange>) -> Self {
        let mut field = Self {
            value: String::new(),
            error: None,
            on_change,
        };
        field.set_value(initial);
        field
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Long form for read-only display, e.g. "5 November 2024"
    pub fn display_text(&self) -> String {
        format_date_for_display(&self.value)
    }

    pub fn input(&mut self, raw: &str) {
        let change = check_date(raw);
        self.value = change.value.clone();
        self.error = change.error.clone();
        self.on_change.emit(change);
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        let change = check_date(&value.into());
        self.value = change.value;
        self.error = change.error;
    }
}

fn check_date(raw: &str) -> FieldChange {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldChange::valid("");
    }
    match normalize_date_input(trimmed) {
        Some(iso) => FieldChange::valid(iso),
        None => FieldChange::invalid(trimmed, DATE_FORMAT_MESSAGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fields::test_support::recorder;

    #[test]
    fn test_text_field_reports_raw_value() {
        let (cb, log) = recorder();
        let mut field = TextField::new("", cb);
        field.input("Adenocarcinoma ");
        assert_eq!(field.value(), "Adenocarcinoma ");
        assert_eq!(log.borrow().as_slice(), &[FieldChange::valid("Adenocarcinoma ")]);

        field.set_value("quiet");
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_number_field() {
        let (cb, log) = recorder();
        let mut field = NumberField::new("", cb);

        field.input(" 4.5 ");
        assert_eq!(field.value(), "4.5");
        assert!(field.error().is_none());

        field.input("abc");
        assert_eq!(field.error(), Some("Enter a number"));
        assert!(!log.borrow().last().unwrap().is_valid());

        field.input("");
        assert!(field.error().is_none());
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_parse_number_input() {
        assert_eq!(parse_number_input(""), Ok(None));
        assert_eq!(parse_number_input("  "), Ok(None));
        assert_eq!(parse_number_input("0"), Ok(Some(0.0)));
        assert_eq!(parse_number_input("72.25"), Ok(Some(72.25)));
        assert!(parse_number_input("NaN").is_err());
        assert!(parse_number_input("inf").is_err());
        assert!(parse_number_input("12kg").is_err());
    }

    #[test]
    fn test_date_field_normalises() {
        let (cb, log) = recorder();
        let mut field = DateField::new("", cb);

        field.input("05/11/2024");
        assert_eq!(field.value(), "2024-11-05");
        assert_eq!(log.borrow()[0], FieldChange::valid("2024-11-05"));
        assert_eq!(field.display_text(), "5 November 2024");

        field.input("31/02/2024");
        assert_eq!(field.value(), "31/02/2024");
        assert_eq!(field.error(), Some(DATE_FORMAT_MESSAGE));
    }

    #[test]
    fn test_date_field_initial_value_is_checked() {
        let field = DateField::new("2024-01-09", Callback::noop());
        assert!(field.error().is_none());

        let field = DateField::new("yesterday", Callback::noop());
        assert!(field.error().is_some());
    }
}
