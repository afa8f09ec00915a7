use strum::VariantNames;

use super::{code_value, date_value, list_value, number_value, optional_text, required_episode};
use crate::components::wizard::WizardController;
use crate::error::FormError;
use crate::services::api::ReferenceScope;
use crate::state::form_state::{DraftValue, EntityFormState, EntitySnapshot, ParentLinkage};
use crate::state::schema::{CodeOptions, FieldKind, FieldSpec, FormSchema};
use shared::{EntityKind, ReferenceKind, Treatment, TreatmentModality};

const SURGICAL: &[&str] = &["Surgery"];
const SYSTEMIC: &[&str] = &["Chemotherapy", "Immunotherapy"];
const RADIATION: &[&str] = &["Radiotherapy"];

/// Treatment form. Detail fields shown on the second step depend on the
/// chosen modality.
pub static TREATMENT_SCHEMA: FormSchema = FormSchema {
    kind: EntityKind::Treatment,
    steps: &["Treatment", "Details"],
    fields: &[
        FieldSpec::new(
            "modality",
            "Modality",
            FieldKind::Code(CodeOptions::Fixed(TreatmentModality::VARIANTS)),
            0,
        )
        .required(),
        FieldSpec::new("start_date", "Start date", FieldKind::Date, 0).required(),
        FieldSpec::new("end_date", "End date", FieldKind::Date, 0),
        FieldSpec::new(
            "surgeon",
            "Operating surgeon",
            FieldKind::Reference(ReferenceScope {
                kind: ReferenceKind::Surgeon,
                consultants_only: true,
            }),
            1,
        )
        .required()
        .visible_when("modality", SURGICAL),
        FieldSpec::new(
            "provider",
            "Provider",
            FieldKind::Reference(ReferenceScope {
                kind: ReferenceKind::Provider,
                consultants_only: false,
            }),
            1,
        ),
        FieldSpec::new("regimen", "Regimen", FieldKind::Text, 1).visible_when("modality", SYSTEMIC),
        FieldSpec::new("cycles", "Cycles", FieldKind::Number, 1).visible_when("modality", SYSTEMIC),
        FieldSpec::new("dose_gy", "Dose (Gy)", FieldKind::Number, 1).visible_when("modality", RADIATION),
        FieldSpec::new("complications", "Complications", FieldKind::List, 1),
        FieldSpec::new("notes", "Notes", FieldKind::Text, 1),
    ],
};

/// Hidden fields are absent from the snapshot, so they come through as `None`
pub fn treatment_from_snapshot(snapshot: &EntitySnapshot) -> Result<Treatment, FormError> {
    Ok(Treatment {
        treatment_id: snapshot.identifier.clone(),
        patient_id: snapshot.linkage.patient_id.clone(),
        episode_id: required_episode(snapshot)?,
        modality: snapshot.required_code_as("modality")?,
        start_date: snapshot.required_date("start_date")?,
        end_date: snapshot.date("end_date"),
        surgeon: snapshot.text("surgeon"),
        provider: snapshot.text("provider"),
        regimen: snapshot.text("regimen"),
        cycles: snapshot.number("cycles"),
        dose_gy: snapshot.number("dose_gy"),
        complications: snapshot.list("complications"),
        notes: snapshot.text("notes"),
    })
}

pub fn draft_from_treatment(record: &Treatment) -> Vec<(&'static str, DraftValue)> {
    vec![
        ("modality", code_value(Some(record.modality))),
        ("start_date", date_value(Some(record.start_date))),
        ("end_date", date_value(record.end_date)),
        ("surgeon", optional_text(record.surgeon.as_deref())),
        ("provider", optional_text(record.provider.as_deref())),
        ("regimen", optional_text(record.regimen.as_deref())),
        ("cycles", number_value(record.cycles)),
        ("dose_gy", number_value(record.dose_gy)),
        ("complications", list_value(&record.complications)),
        ("notes", optional_text(record.notes.as_deref())),
    ]
}

pub fn open_create(linkage: ParentLinkage, existing_count: u32) -> Result<WizardController, FormError> {
    let form = EntityFormState::create(&TREATMENT_SCHEMA, linkage, existing_count)?;
    Ok(WizardController::new(form))
}

pub fn open_edit(record: &Treatment) -> Result<WizardController, FormError> {
    let form = EntityFormState::edit(
        &TREATMENT_SCHEMA,
        ParentLinkage::episode(record.patient_id.clone(), record.episode_id.clone()),
        record.treatment_id.clone(),
        draft_from_treatment(record),
    )?;
    Ok(WizardController::new(form))
}
