use strum::VariantNames;

use super::{code_value, date_value, list_value, number_value, optional_text};
use crate::components::wizard::WizardController;
use crate::error::FormError;
use crate::services::api::ReferenceScope;
use crate::state::form_state::{DraftValue, EntityFormState, EntitySnapshot, ParentLinkage};
use crate::state::schema::{CodeOptions, FieldKind, FieldSpec, FormSchema};
use shared::{EntityKind, FollowUp, FollowUpOutcome, ReferenceKind};

/// Single-step follow-up visit form
pub static FOLLOW_UP_SCHEMA: FormSchema = FormSchema {
    kind: EntityKind::FollowUp,
    steps: &["Visit"],
    fields: &[
        FieldSpec::new("visit_date", "Visit date", FieldKind::Date, 0).required(),
        FieldSpec::new(
            "clinician",
            "Clinician",
            FieldKind::Reference(ReferenceScope {
                kind: ReferenceKind::Surgeon,
                consultants_only: false,
            }),
            0,
        ),
        FieldSpec::new(
            "outcome",
            "Outcome",
            FieldKind::Code(CodeOptions::Fixed(FollowUpOutcome::VARIANTS)),
            0,
        )
        .required(),
        FieldSpec::new("cea_level", "CEA (ug/L)", FieldKind::Number, 0),
        FieldSpec::new("weight_kg", "Weight (kg)", FieldKind::Number, 0),
        FieldSpec::new("investigations_ordered", "Investigations ordered", FieldKind::List, 0),
        FieldSpec::new("next_review_date", "Next review", FieldKind::Date, 0),
        FieldSpec::new("notes", "Notes", FieldKind::Text, 0),
    ],
};

pub fn follow_up_from_snapshot(snapshot: &EntitySnapshot) -> Result<FollowUp, FormError> {
    Ok(FollowUp {
        follow_up_id: snapshot.identifier.clone(),
        patient_id: snapshot.linkage.patient_id.clone(),
        episode_id: snapshot.linkage.episode_id.clone(),
        visit_date: snapshot.required_date("visit_date")?,
        clinician: snapshot.text("clinician"),
        outcome: snapshot.required_code_as("outcome")?,
        cea_level: snapshot.number("cea_level"),
        weight_kg: snapshot.number("weight_kg"),
        investigations_ordered: snapshot.list("investigations_ordered"),
        next_review_date: snapshot.date("next_review_date"),
        notes: snapshot.text("notes"),
    })
}

pub fn draft_from_follow_up(record: &FollowUp) -> Vec<(&'static str, DraftValue)> {
    vec![
        ("visit_date", date_value(Some(record.visit_date))),
        ("clinician", optional_text(record.clinician.as_deref())),
        ("outcome", code_value(Some(record.outcome))),
        ("cea_level", number_value(record.cea_level)),
        ("weight_kg", number_value(record.weight_kg)),
        ("investigations_ordered", list_value(&record.investigations_ordered)),
        ("next_review_date", date_value(record.next_review_date)),
        ("notes", optional_text(record.notes.as_deref())),
    ]
}

/// New follow-up for a patient. `existing_count` must come from the records
/// store so the derived sequence does not collide with earlier visits.
pub fn open_create(linkage: ParentLinkage, existing_count: u32) -> Result<WizardController, FormError> {
    let form = EntityFormState::create(&FOLLOW_UP_SCHEMA, linkage, existing_count)?;
    Ok(WizardController::new(form))
}

pub fn open_edit(record: &FollowUp) -> Result<WizardController, FormError> {
    let linkage = ParentLinkage {
        patient_id: record.patient_id.clone(),
        episode_id: record.episode_id.clone(),
    };
    let form = EntityFormState::edit(
        &FOLLOW_UP_SCHEMA,
        linkage,
        record.follow_up_id.clone(),
        draft_from_follow_up(record),
    )?;
    Ok(WizardController::new(form))
}
