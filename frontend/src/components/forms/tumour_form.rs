use std::str::FromStr;
use strum::VariantNames;

use super::{code_value, number_value, optional_text, required_episode, text_value};
use crate::components::wizard::WizardController;
use crate::error::FormError;
use crate::state::form_state::{DraftValue, EntityFormState, EntitySnapshot, ParentLinkage};
use crate::state::schema::{CodeOptions, FieldKind, FieldSpec, FormSchema};
use shared::{EntityKind, Laterality, Tumour, TumourSite, GRADES, M_STAGES, N_STAGES};

/// T stages offered for the selected site; none until a site is chosen
fn t_stages_for(site: &str) -> &'static [&'static str] {
    TumourSite::from_str(site).map(|s| s.t_stages()).unwrap_or(&[])
}

pub static TUMOUR_SCHEMA: FormSchema = FormSchema {
    kind: EntityKind::Tumour,
    steps: &["Site", "Staging"],
    fields: &[
        FieldSpec::new("site", "Site", FieldKind::Code(CodeOptions::Fixed(TumourSite::VARIANTS)), 0).required(),
        FieldSpec::new("laterality", "Laterality", FieldKind::Code(CodeOptions::Fixed(Laterality::VARIANTS)), 0),
        FieldSpec::new("histology", "Histology", FieldKind::Text, 0).required(),
        FieldSpec::new(
            "t_stage",
            "T stage",
            FieldKind::Code(CodeOptions::DependsOn {
                field: "site",
                options: t_stages_for,
            }),
            1,
        )
        .required(),
        FieldSpec::new("n_stage", "N stage", FieldKind::Code(CodeOptions::Fixed(N_STAGES)), 1),
        FieldSpec::new("m_stage", "M stage", FieldKind::Code(CodeOptions::Fixed(M_STAGES)), 1),
        FieldSpec::new("grade", "Grade", FieldKind::Code(CodeOptions::Fixed(GRADES)), 1),
        FieldSpec::new("size_mm", "Size (mm)", FieldKind::Number, 1),
    ],
};

pub fn tumour_from_snapshot(snapshot: &EntitySnapshot) -> Result<Tumour, FormError> {
    Ok(Tumour {
        tumour_id: snapshot.identifier.clone(),
        patient_id: snapshot.linkage.patient_id.clone(),
        episode_id: required_episode(snapshot)?,
        site: snapshot.required_code_as("site")?,
        laterality: snapshot.code_as("laterality")?,
        histology: snapshot.required_text("histology")?,
        t_stage: snapshot.required_code_as("t_stage")?,
        n_stage: snapshot.code("n_stage").map(str::to_string),
        m_stage: snapshot.code("m_stage").map(str::to_string),
        grade: snapshot.code("grade").map(str::to_string),
        size_mm: snapshot.number("size_mm"),
    })
}

pub fn draft_from_tumour(record: &Tumour) -> Vec<(&'static str, DraftValue)> {
    vec![
        ("site", code_value(Some(record.site))),
        ("laterality", code_value(record.laterality)),
        ("histology", text_value(&record.histology)),
        ("t_stage", text_value(&record.t_stage)),
        ("n_stage", optional_text(record.n_stage.as_deref())),
        ("m_stage", optional_text(record.m_stage.as_deref())),
        ("grade", optional_text(record.grade.as_deref())),
        ("size_mm", number_value(record.size_mm)),
    ]
}

pub fn open_create(linkage: ParentLinkage, existing_count: u32) -> Result<WizardController, FormError> {
    let form = EntityFormState::create(&TUMOUR_SCHEMA, linkage, existing_count)?;
    Ok(WizardController::new(form))
}

pub fn open_edit(record: &Tumour) -> Result<WizardController, FormError> {
    let form = EntityFormState::edit(
        &TUMOUR_SCHEMA,
        ParentLinkage::episode(record.patient_id.clone(), record.episode_id.clone()),
        record.tumour_id.clone(),
        draft_from_tumour(record),
    )?;
    Ok(WizardController::new(form))
}
