//! # Entity Form State
//!
//! Draft values for one entity while its modal is open.
//!
//! ## Responsibilities:
//! - Hold raw input per field, plus staging text for list fields
//! - Derive the record identifier in create mode, keep it verbatim in edit mode
//! - Clear dependent dropdowns whose options no longer include their value
//! - Produce a typed snapshot for submission without touching stored state
//!
//! Nothing is validated on `update`; required and format checks run when the
//! wizard advances or submits.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::components::fields::text_inputs::{parse_number_input, DATE_FORMAT_MESSAGE};
use crate::components::fields::FieldChange;
use crate::error::{FieldErrors, FormError};
use crate::services::api::ReferenceScope;
use crate::services::date_utils::parse_date_input;
use crate::state::schema::{CodeOptions, FieldKind, FieldSpec, FormSchema};
use shared::{derive_identifier, sanitize_parent_id, EntityKind, SubmissionMode};

#[derive(Debug, Clone, PartialEq)]
pub enum DraftValue {
    Scalar(String),
    List(Vec<String>),
}

impl DraftValue {
    pub fn text(value: impl Into<String>) -> Self {
        DraftValue::Scalar(value.into())
    }

    fn is_filled(&self) -> bool {
        match self {
            DraftValue::Scalar(s) => !s.trim().is_empty(),
            DraftValue::List(items) => !items.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// `existing_count` records already hang off the same parent
    Create { existing_count: u32 },
    Edit { identifier: String },
}

/// Parent identifiers supplied by the host; never edited through the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLinkage {
    pub patient_id: String,
    pub episode_id: Option<String>,
}

impl ParentLinkage {
    pub fn patient(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            episode_id: None,
        }
    }

    pub fn episode(patient_id: impl Into<String>, episode_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            episode_id: Some(episode_id.into()),
        }
    }

    /// Identifier that seeds derived ids for `kind`. A parent with no ASCII
    /// letters or digits would derive an id the write boundary rejects, so
    /// it counts as missing.
    pub fn parent_for(&self, kind: EntityKind) -> Result<&str, FormError> {
        let (parent, name) = match kind {
            EntityKind::FollowUp | EntityKind::Episode => (Some(self.patient_id.as_str()), "patient_id"),
            EntityKind::Tumour | EntityKind::Treatment => (self.episode_id.as_deref(), "episode_id"),
        };
        parent
            .filter(|id| !sanitize_parent_id(id).is_empty())
            .ok_or(FormError::MissingLinkage(name))
    }
}

/// Typed value of one field at submit time
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotValue {
    Text(String),
    /// `None` when the input was left empty
    Number(Option<f64>),
    Date(Option<NaiveDate>),
    Code(Option<String>),
    List(Vec<String>),
}

/// Draft merged with identifier and parent linkage, ready for conversion to
/// an entity payload
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub kind: EntityKind,
    pub mode: SubmissionMode,
    pub identifier: String,
    pub linkage: ParentLinkage,
    pub fields: BTreeMap<String, SnapshotValue>,
}

impl EntitySnapshot {
    /// Trimmed text of a text or reference field, `None` when blank
    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name) {
            Some(SnapshotValue::Text(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    pub fn required_text(&self, name: &str) -> Result<String, FormError> {
        self.text(name).ok_or_else(|| missing(name))
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.fields.get(name) {
            Some(SnapshotValue::Number(n)) => *n,
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.fields.get(name) {
            Some(SnapshotValue::Date(d)) => *d,
            _ => None,
        }
    }

    pub fn required_date(&self, name: &str) -> Result<NaiveDate, FormError> {
        self.date(name).ok_or_else(|| missing(name))
    }

    pub fn code(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(SnapshotValue::Code(Some(c))) => Some(c.as_str()),
            _ => None,
        }
    }

    /// Parse a code field into its enum
    pub fn code_as<T: FromStr>(&self, name: &str) -> Result<Option<T>, FormError> {
        match self.code(name) {
            Some(code) => T::from_str(code).map(Some).map_err(|_| {
                let mut errors = FieldErrors::new();
                errors.insert(name.to_string(), format!("Unrecognised value '{}'", code));
                FormError::FormatValidation(errors)
            }),
            None => Ok(None),
        }
    }

    pub fn required_code_as<T: FromStr>(&self, name: &str) -> Result<T, FormError> {
        self.code_as(name)?.ok_or_else(|| missing(name))
    }

    pub fn list(&self, name: &str) -> Vec<String> {
        match self.fields.get(name) {
            Some(SnapshotValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }
}

fn missing(name: &str) -> FormError {
    let mut errors = FieldErrors::new();
    errors.insert(name.to_string(), "This field is required".to_string());
    FormError::StepValidation(errors)
}

/// Draft state of one entity form
#[derive(Debug, Clone)]
pub struct EntityFormState {
    schema: &'static FormSchema,
    mode: FormMode,
    linkage: ParentLinkage,
    values: BTreeMap<&'static str, DraftValue>,
    initial: BTreeMap<&'static str, DraftValue>,
    staging: BTreeMap<&'static str, String>,
    /// Messages reported by the input primitives themselves
    input_errors: BTreeMap<&'static str, String>,
}

impl EntityFormState {
    /// Empty draft for a new record
    pub fn create(schema: &'static FormSchema, linkage: ParentLinkage, existing_count: u32) -> Result<Self, FormError> {
        linkage.parent_for(schema.kind)?;
        let values = empty_values(schema);
        Ok(Self {
            schema,
            mode: FormMode::Create { existing_count },
            linkage,
            initial: values.clone(),
            values,
            staging: BTreeMap::new(),
            input_errors: BTreeMap::new(),
        })
    }

    /// Draft pre-populated from an existing record
    pub fn edit<I, K>(
        schema: &'static FormSchema,
        linkage: ParentLinkage,
        identifier: impl Into<String>,
        existing: I,
    ) -> Result<Self, FormError>
    where
        I: IntoIterator<Item = (K, DraftValue)>,
        K: AsRef<str>,
    {
        let mut values = empty_values(schema);
        for (name, value) in existing {
            let spec = schema
                .field(name.as_ref())
                .ok_or_else(|| FormError::UnknownField(name.as_ref().to_string()))?;
            match (&value, spec.is_list()) {
                (DraftValue::List(_), false) => return Err(FormError::NotAListField(spec.name.to_string())),
                (DraftValue::Scalar(_), true) => return Err(FormError::NotAScalarField(spec.name.to_string())),
                _ => {}
            }
            values.insert(spec.name, value);
        }

        Ok(Self {
            schema,
            mode: FormMode::Edit {
                identifier: identifier.into(),
            },
            linkage,
            initial: values.clone(),
            values,
            staging: BTreeMap::new(),
            input_errors: BTreeMap::new(),
        })
    }

    pub fn schema(&self) -> &'static FormSchema {
        self.schema
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn submission_mode(&self) -> SubmissionMode {
        match self.mode {
            FormMode::Create { .. } => SubmissionMode::Create,
            FormMode::Edit { .. } => SubmissionMode::Edit,
        }
    }

    pub fn linkage(&self) -> &ParentLinkage {
        &self.linkage
    }

    fn spec(&self, field: &str) -> Result<&'static FieldSpec, FormError> {
        self.schema
            .field(field)
            .ok_or_else(|| FormError::UnknownField(field.to_string()))
    }

    fn list_spec(&self, field: &str) -> Result<&'static FieldSpec, FormError> {
        let spec = self.spec(field)?;
        if !spec.is_list() {
            return Err(FormError::NotAListField(field.to_string()));
        }
        Ok(spec)
    }

    /// Replace one scalar field's value
    pub fn update(&mut self, field: &str, value: impl Into<String>) -> Result<(), FormError> {
        let spec = self.spec(field)?;
        if spec.is_list() {
            return Err(FormError::NotAScalarField(field.to_string()));
        }
        self.values.insert(spec.name, DraftValue::Scalar(value.into()));
        self.input_errors.remove(spec.name);
        self.clear_invalid_dependents(spec.name);
        Ok(())
    }

    /// Store what an input primitive reported. Its error, if any, is shown
    /// in place of the form's own format check until the field changes again.
    pub fn apply_change(&mut self, field: &str, change: FieldChange) -> Result<(), FormError> {
        let spec = self.spec(field)?;
        self.update(spec.name, change.value)?;
        if let Some(error) = change.error {
            self.input_errors.insert(spec.name, error);
        }
        Ok(())
    }

    /// Search scope for a reference field, handed to the reference provider
    pub fn reference_scope(&self, field: &str) -> Option<ReferenceScope> {
        self.schema.reference_scope(field)
    }

    fn clear_invalid_dependents(&mut self, controller: &str) {
        let dependents: Vec<&'static FieldSpec> = self.schema.dependents_of(controller).collect();
        for dependent in dependents {
            let current = self.value(dependent.name).unwrap_or_default().to_string();
            if !current.is_empty() && !self.code_options(dependent).contains(&current.as_str()) {
                self.values.insert(dependent.name, DraftValue::Scalar(String::new()));
            }
        }
    }

    /// Raw value of a scalar field
    pub fn value(&self, field: &str) -> Option<&str> {
        match self.values.get(field) {
            Some(DraftValue::Scalar(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn list(&self, field: &str) -> &[String] {
        match self.values.get(field) {
            Some(DraftValue::List(items)) => items,
            _ => &[],
        }
    }

    pub fn set_staging(&mut self, field: &str, text: impl Into<String>) -> Result<(), FormError> {
        let spec = self.list_spec(field)?;
        self.staging.insert(spec.name, text.into());
        Ok(())
    }

    pub fn staging(&self, field: &str) -> &str {
        self.staging.get(field).map(String::as_str).unwrap_or("")
    }

    /// Append a trimmed entry to a list field and clear its staging input.
    /// Blank entries are dropped; returns whether anything was appended.
    pub fn append_list_item(&mut self, field: &str, item: &str) -> Result<bool, FormError> {
        let spec = self.list_spec(field)?;
        let item = item.trim();
        if item.is_empty() {
            self.staging.remove(spec.name);
            return Ok(false);
        }

        match self.values.get_mut(spec.name) {
            Some(DraftValue::List(items)) => items.push(item.to_string()),
            _ => {
                self.values.insert(spec.name, DraftValue::List(vec![item.to_string()]));
            }
        }
        self.staging.remove(spec.name);
        Ok(true)
    }

    /// Append whatever is in the field's staging input
    pub fn commit_staging(&mut self, field: &str) -> Result<bool, FormError> {
        let pending = self.staging(field).to_string();
        self.append_list_item(field, &pending)
    }

    /// Remove the entry at `index`; out-of-range indices are ignored
    pub fn remove_list_item(&mut self, field: &str, index: usize) -> Result<bool, FormError> {
        let spec = self.list_spec(field)?;
        match self.values.get_mut(spec.name) {
            Some(DraftValue::List(items)) if index < items.len() => {
                items.remove(index);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Derived in create mode, the stored identifier in edit mode
    pub fn identifier(&self) -> String {
        match &self.mode {
            FormMode::Create { existing_count } => {
                let parent = self.linkage.parent_for(self.schema.kind).unwrap_or_default();
                derive_identifier(self.schema.kind.id_prefix(), parent, *existing_count)
            }
            FormMode::Edit { identifier } => identifier.clone(),
        }
    }

    pub fn is_visible(&self, spec: &FieldSpec) -> bool {
        match spec.visible_when {
            Some(condition) => {
                let current = self.value(condition.field).unwrap_or_default();
                condition.any_of.contains(&current)
            }
            None => true,
        }
    }

    /// Options currently offered by a code field
    pub fn code_options(&self, spec: &FieldSpec) -> &'static [&'static str] {
        match spec.kind {
            FieldKind::Code(CodeOptions::Fixed(options)) => options,
            FieldKind::Code(CodeOptions::DependsOn { field, options }) => {
                options(self.value(field).unwrap_or_default())
            }
            _ => &[],
        }
    }

    pub fn is_filled(&self, spec: &FieldSpec) -> bool {
        self.values.get(spec.name).map(DraftValue::is_filled).unwrap_or(false)
    }

    fn visible_fields(&self, step: Option<usize>) -> impl Iterator<Item = &'static FieldSpec> + '_ {
        let fields: &'static [FieldSpec] = self.schema.fields;
        fields
            .iter()
            .filter(move |f| step.map_or(true, |s| f.step == s))
            .filter(move |f| self.is_visible(f))
    }

    /// Required, visible fields without a value; `None` checks every step
    pub fn missing_required(&self, step: Option<usize>) -> FieldErrors {
        self.visible_fields(step)
            .filter(|f| f.required && !self.is_filled(f))
            .map(|f| (f.name.to_string(), format!("{} is required", f.label)))
            .collect()
    }

    /// Visible fields whose input does not parse as their type
    pub fn format_errors(&self, step: Option<usize>) -> FieldErrors {
        self.visible_fields(step)
            .filter_map(|f| self.format_error(f).map(|msg| (f.name.to_string(), msg)))
            .collect()
    }

    fn format_error(&self, spec: &FieldSpec) -> Option<String> {
        if let Some(reported) = self.input_errors.get(spec.name) {
            return Some(reported.clone());
        }
        let raw = self.value(spec.name)?.trim();
        if raw.is_empty() {
            return None;
        }
        match spec.kind {
            FieldKind::Number => parse_number_input(raw).err(),
            FieldKind::Date => match parse_date_input(raw) {
                Some(_) => None,
                None => Some(DATE_FORMAT_MESSAGE.to_string()),
            },
            FieldKind::Code(_) => {
                if self.code_options(spec).contains(&raw) {
                    None
                } else {
                    Some(format!("Choose a valid {}", spec.label.to_lowercase()))
                }
            }
            _ => None,
        }
    }

    /// Required and format problems together, format messages taking precedence
    pub fn validate(&self, step: Option<usize>) -> FieldErrors {
        let mut errors = self.missing_required(step);
        errors.extend(self.format_errors(step));
        errors
    }

    /// Current draft merged with the identifier and parent linkage. Numeric
    /// input is coerced here; blank numbers become `None`, never zero.
    pub fn snapshot(&self) -> Result<EntitySnapshot, FormError> {
        let format_errors = self.format_errors(None);
        if !format_errors.is_empty() {
            return Err(FormError::FormatValidation(format_errors));
        }

        let fields = self
            .visible_fields(None)
            .map(|spec| (spec.name.to_string(), self.snapshot_value(spec)))
            .collect();

        Ok(EntitySnapshot {
            kind: self.schema.kind,
            mode: self.submission_mode(),
            identifier: self.identifier(),
            linkage: self.linkage.clone(),
            fields,
        })
    }

    fn snapshot_value(&self, spec: &FieldSpec) -> SnapshotValue {
        let raw = self.value(spec.name).unwrap_or_default().trim();
        match spec.kind {
            FieldKind::Text | FieldKind::Reference(_) => SnapshotValue::Text(raw.to_string()),
            FieldKind::Number => SnapshotValue::Number(parse_number_input(raw).ok().flatten()),
            FieldKind::Date => SnapshotValue::Date(parse_date_input(raw)),
            FieldKind::Code(_) => {
                SnapshotValue::Code(if raw.is_empty() { None } else { Some(raw.to_string()) })
            }
            FieldKind::List => SnapshotValue::List(self.list(spec.name).to_vec()),
        }
    }

    /// Whether anything differs from the values the form opened with
    pub fn is_dirty(&self) -> bool {
        self.values != self.initial
    }
}

fn empty_values(schema: &FormSchema) -> BTreeMap<&'static str, DraftValue> {
    let fields: &'static [FieldSpec] = schema.fields;
    fields
        .iter()
        .map(|f| {
            let value = if f.is_list() {
                DraftValue::List(Vec::new())
            } else {
                DraftValue::Scalar(String::new())
            };
            (f.name, value)
        })
        .collect()
}
