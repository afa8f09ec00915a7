//! Static description of an entity form: which fields exist, how their input
//! is typed, which step they belong to and when they apply.

use crate::services::api::ReferenceScope;
use shared::EntityKind;

/// Where a code field gets its options from
#[derive(Debug, Clone, Copy)]
pub enum CodeOptions {
    Fixed(&'static [&'static str]),
    /// Options depend on the current value of another field
    DependsOn {
        field: &'static str,
        options: fn(&str) -> &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Code(CodeOptions),
    /// Repeatable free-text entries with a staging input
    List,
    Reference(ReferenceScope),
}

/// Field applies only while `field` holds one of `any_of`
#[derive(Debug, Clone, Copy)]
pub struct Condition {
    pub field: &'static str,
    pub any_of: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub step: usize,
    pub visible_when: Option<Condition>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind, step: usize) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            step,
            visible_when: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn visible_when(mut self, field: &'static str, any_of: &'static [&'static str]) -> Self {
        self.visible_when = Some(Condition { field, any_of });
        self
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, FieldKind::List)
    }

    /// Provider scope a reference field searches; `None` for other kinds
    pub fn reference_scope(&self) -> Option<ReferenceScope> {
        match self.kind {
            FieldKind::Reference(scope) => Some(scope),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct FormSchema {
    pub kind: EntityKind,
    /// Step titles; a single entry means a single-step form
    pub steps: &'static [&'static str],
    pub fields: &'static [FieldSpec],
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        // Borrow through the 'static slice so callers keep a 'static spec
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    pub fn reference_scope(&self, name: &str) -> Option<ReferenceScope> {
        self.field(name).and_then(FieldSpec::reference_scope)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len().max(1)
    }

    pub fn fields_in_step(&self, step: usize) -> impl Iterator<Item = &'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().filter(move |f| f.step == step)
    }

    /// Code fields whose options are driven by `controller`
    pub fn dependents_of<'a>(&'a self, controller: &'a str) -> impl Iterator<Item = &'static FieldSpec> + 'a {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().filter(move |f| {
            matches!(f.kind, FieldKind::Code(CodeOptions::DependsOn { field, .. }) if field == controller)
        })
    }
}
