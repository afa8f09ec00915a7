use strum::VariantNames;

use super::{code_value, date_value, list_value, optional_text, text_value};
use crate::components::wizard::WizardController;
use crate::error::{FieldErrors, FormError};
use crate::services::api::ReferenceScope;
use crate::state::form_state::{DraftValue, EntityFormState, EntitySnapshot, ParentLinkage};
use crate::state::schema::{CodeOptions, FieldKind, FieldSpec, FormSchema};
use shared::{CancerType, EntityKind, Episode, ReferenceKind, TreatmentIntent, PERFORMANCE_STATUSES};

/// Three-step cancer episode wizard: referral, diagnosis, plan
pub static EPISODE_SCHEMA: FormSchema = FormSchema {
    kind: EntityKind::Episode,
    steps: &["Referral", "Diagnosis", "Plan"],
    fields: &[
        FieldSpec::new("referral_date", "Referral date", FieldKind::Date, 0).required(),
        FieldSpec::new(
            "referring_provider",
            "Referring provider",
            FieldKind::Reference(ReferenceScope {
                kind: ReferenceKind::Provider,
                consultants_only: false,
            }),
            0,
        ),
        FieldSpec::new(
            "lead_surgeon",
            "Lead surgeon",
            FieldKind::Reference(ReferenceScope {
                kind: ReferenceKind::Surgeon,
                consultants_only: true,
            }),
            0,
        )
        .required(),
        FieldSpec::new(
            "cancer_type",
            "Cancer type",
            FieldKind::Code(CodeOptions::Fixed(CancerType::VARIANTS)),
            1,
        )
        .required(),
        FieldSpec::new("diagnosis_date", "Diagnosis date", FieldKind::Date, 1),
        FieldSpec::new(
            "performance_status",
            "Performance status",
            FieldKind::Code(CodeOptions::Fixed(PERFORMANCE_STATUSES)),
            1,
        ),
        FieldSpec::new("mdt_date", "MDT date", FieldKind::Date, 2),
        FieldSpec::new(
            "treatment_intent",
            "Treatment intent",
            FieldKind::Code(CodeOptions::Fixed(TreatmentIntent::VARIANTS)),
            2,
        )
        .required(),
        FieldSpec::new("investigations", "Investigations", FieldKind::List, 2),
        FieldSpec::new("notes", "Notes", FieldKind::Text, 2),
    ],
};

pub fn episode_from_snapshot(snapshot: &EntitySnapshot) -> Result<Episode, FormError> {
    let performance_status = match snapshot.code("performance_status") {
        Some(code) => Some(code.parse::<u8>().map_err(|_| {
            let mut errors = FieldErrors::new();
            errors.insert("performance_status".to_string(), "Choose a valid performance status".to_string());
            FormError::FormatValidation(errors)
        })?),
        None => None,
    };

    Ok(Episode {
        episode_id: snapshot.identifier.clone(),
        patient_id: snapshot.linkage.patient_id.clone(),
        referral_date: snapshot.required_date("referral_date")?,
        referring_provider: snapshot.text("referring_provider"),
        lead_surgeon: snapshot.required_text("lead_surgeon")?,
        cancer_type: snapshot.required_code_as("cancer_type")?,
        diagnosis_date: snapshot.date("diagnosis_date"),
        performance_status,
        mdt_date: snapshot.date("mdt_date"),
        treatment_intent: snapshot.required_code_as("treatment_intent")?,
        investigations: snapshot.list("investigations"),
        notes: snapshot.text("notes"),
    })
}

pub fn draft_from_episode(record: &Episode) -> Vec<(&'static str, DraftValue)> {
    vec![
        ("referral_date", date_value(Some(record.referral_date))),
        ("referring_provider", optional_text(record.referring_provider.as_deref())),
        ("lead_surgeon", text_value(&record.lead_surgeon)),
        ("cancer_type", code_value(Some(record.cancer_type))),
        ("diagnosis_date", date_value(record.diagnosis_date)),
        (
            "performance_status",
            DraftValue::text(record.performance_status.map(|s| s.to_string()).unwrap_or_default()),
        ),
        ("mdt_date", date_value(record.mdt_date)),
        ("treatment_intent", code_value(Some(record.treatment_intent))),
        ("investigations", list_value(&record.investigations)),
        ("notes", optional_text(record.notes.as_deref())),
    ]
}

pub fn open_create(patient_id: impl Into<String>, existing_count: u32) -> Result<WizardController, FormError> {
    let form = EntityFormState::create(&EPISODE_SCHEMA, ParentLinkage::patient(patient_id), existing_count)?;
    Ok(WizardController::new(form))
}

pub fn open_edit(record: &Episode) -> Result<WizardController, FormError> {
    let form = EntityFormState::edit(
        &EPISODE_SCHEMA,
        ParentLinkage::patient(record.patient_id.clone()),
        record.episode_id.clone(),
        draft_from_episode(record),
    )?;
    Ok(WizardController::new(form))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use shared::EntityPayload;

    fn sample_episode() -> Episode {
        Episode {
            episode_id: "EP-P55-01".to_string(),
            patient_id: "P55".to_string(),
            referral_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            referring_provider: Some("St Elsewhere".to_string()),
            lead_surgeon: "Alan Turing".to_string(),
            cancer_type: CancerType::UpperGi,
            diagnosis_date: None,
            performance_status: Some(2),
            mdt_date: None,
            treatment_intent: TreatmentIntent::Curative,
            investigations: vec!["OGD".to_string(), "CT chest".to_string()],
            notes: None,
        }
    }

    #[test]
    fn test_edit_prepopulates_every_step() {
        let wizard = open_edit(&sample_episode()).unwrap();
        let form = wizard.form();
        assert_eq!(form.identifier(), "EP-P55-01");
        assert_eq!(form.value("cancer_type"), Some("UpperGi"));
        assert_eq!(form.value("performance_status"), Some("2"));
        assert_eq!(form.list("investigations"), &["OGD", "CT chest"]);
        assert!(wizard.step_summary().iter().all(|s| s.is_complete));
    }

    #[test]
    fn test_edit_submission_matches_record() {
        let record = sample_episode();
        let mut wizard = open_edit(&record).unwrap();
        wizard.advance().unwrap();
        wizard.advance().unwrap();

        let submission = wizard.submit(|_| Ok(())).unwrap();
        assert_eq!(submission.payload, EntityPayload::Episode(record));
    }

    #[test]
    fn test_lead_surgeon_uses_consultant_scope() {
        assert_eq!(
            EPISODE_SCHEMA.reference_scope("lead_surgeon"),
            Some(ReferenceScope::consultants())
        );
        assert_eq!(EPISODE_SCHEMA.reference_scope("cancer_type"), None);
    }
}
