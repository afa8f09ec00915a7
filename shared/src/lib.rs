use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumString, IntoStaticStr, VariantNames};

/// Kinds of clinical entity that can be created or edited through a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    FollowUp,
    Episode,
    Tumour,
    Treatment,
}

impl EntityKind {
    /// Prefix used when deriving identifiers for this kind
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EntityKind::FollowUp => "FU",
            EntityKind::Episode => "EP",
            EntityKind::Tumour => "TUM",
            EntityKind::Treatment => "TRT",
        }
    }

    /// REST collection segment, e.g. `/api/follow-ups`
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::FollowUp => "follow-ups",
            EntityKind::Episode => "episodes",
            EntityKind::Tumour => "tumours",
            EntityKind::Treatment => "treatments",
        }
    }

    /// Query key naming the parent whose identifier seeds derived ids
    pub fn parent_key(&self) -> &'static str {
        match self {
            EntityKind::FollowUp | EntityKind::Episode => "patient_id",
            EntityKind::Tumour | EntityKind::Treatment => "episode_id",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::FollowUp => "Follow-up",
            EntityKind::Episode => "Episode",
            EntityKind::Tumour => "Tumour",
            EntityKind::Treatment => "Treatment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Derived identifiers
// ---------------------------------------------------------------------------

/// Strip every character that is not an ASCII letter or digit
pub fn sanitize_parent_id(parent_id: &str) -> String {
    parent_id.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Derive an identifier in format: "<PREFIX>-<sanitizedParentId>-<NN>"
///
/// `existing_count` is the number of records already attached to the parent,
/// so the first record gets sequence `01`.
pub fn derive_identifier(prefix: &str, parent_id: &str, existing_count: u32) -> String {
    format!(
        "{}-{}-{:02}",
        prefix,
        sanitize_parent_id(parent_id),
        existing_count.saturating_add(1)
    )
}

/// Components of a derived identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentifier {
    pub prefix: String,
    pub parent: String,
    pub sequence: u32,
}

/// Parse a derived identifier back into its components
pub fn parse_identifier(id: &str) -> Result<ParsedIdentifier, IdentifierError> {
    let parts: Vec<&str> = id.split('-').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(IdentifierError::InvalidFormat);
    }

    if !parts[1].chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(IdentifierError::InvalidParent);
    }

    if parts[2].len() < 2 {
        return Err(IdentifierError::InvalidSequence);
    }
    let sequence = parts[2]
        .parse::<u32>()
        .map_err(|_| IdentifierError::InvalidSequence)?;
    if sequence == 0 {
        return Err(IdentifierError::InvalidSequence);
    }

    Ok(ParsedIdentifier {
        prefix: parts[0].to_string(),
        parent: parts[1].to_string(),
        sequence,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdentifierError {
    InvalidFormat,
    InvalidParent,
    InvalidSequence,
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierError::InvalidFormat => write!(f, "Invalid identifier format"),
            IdentifierError::InvalidParent => write!(f, "Invalid parent segment in identifier"),
            IdentifierError::InvalidSequence => write!(f, "Invalid sequence number in identifier"),
        }
    }
}

impl std::error::Error for IdentifierError {}

// ---------------------------------------------------------------------------
// Coded values
// ---------------------------------------------------------------------------

/// Outcome recorded at a follow-up visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr, VariantNames)]
pub enum FollowUpOutcome {
    NoEvidenceOfDisease,
    SuspectedRecurrence,
    ConfirmedRecurrence,
    FurtherInvestigation,
    Discharged,
    Deceased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr, VariantNames)]
pub enum CancerType {
    Colorectal,
    Breast,
    UpperGi,
    Hepatobiliary,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr, VariantNames)]
pub enum TreatmentIntent {
    Curative,
    Palliative,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr, VariantNames)]
pub enum TumourSite {
    Colon,
    Rectum,
    Breast,
    Oesophagus,
    Stomach,
    Liver,
    Pancreas,
}

impl TumourSite {
    /// T stages that may be recorded for a tumour at this site
    pub fn t_stages(&self) -> &'static [&'static str] {
        match self {
            TumourSite::Colon | TumourSite::Rectum => COLORECTAL_T_STAGES,
            TumourSite::Breast => BREAST_T_STAGES,
            _ => GENERIC_T_STAGES,
        }
    }
}

pub const COLORECTAL_T_STAGES: &[&str] = &["TX", "Tis", "T1", "T2", "T3", "T4a", "T4b"];
pub const BREAST_T_STAGES: &[&str] = &["TX", "Tis", "T1", "T2", "T3", "T4"];
pub const GENERIC_T_STAGES: &[&str] = &["TX", "T1", "T2", "T3", "T4"];
pub const N_STAGES: &[&str] = &["NX", "N0", "N1", "N2", "N3"];
pub const M_STAGES: &[&str] = &["MX", "M0", "M1"];
pub const GRADES: &[&str] = &["GX", "G1", "G2", "G3", "G4"];
pub const PERFORMANCE_STATUSES: &[&str] = &["0", "1", "2", "3", "4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr, VariantNames)]
pub enum Laterality {
    Left,
    Right,
    Bilateral,
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr, VariantNames)]
pub enum TreatmentModality {
    Surgery,
    Chemotherapy,
    Radiotherapy,
    Immunotherapy,
    Other,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Post-treatment follow-up visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    /// Identifier in format "FU-<patient>-<NN>"
    pub follow_up_id: String,
    pub patient_id: String,
    pub episode_id: Option<String>,
    pub visit_date: NaiveDate,
    pub clinician: Option<String>,
    pub outcome: FollowUpOutcome,
    /// Carcinoembryonic antigen, ug/L
    pub cea_level: Option<f64>,
    pub weight_kg: Option<f64>,
    pub investigations_ordered: Vec<String>,
    pub next_review_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Course of cancer care for a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Identifier in format "EP-<patient>-<NN>"
    pub episode_id: String,
    pub patient_id: String,
    pub referral_date: NaiveDate,
    pub referring_provider: Option<String>,
    pub lead_surgeon: String,
    pub cancer_type: CancerType,
    pub diagnosis_date: Option<NaiveDate>,
    pub performance_status: Option<u8>,
    pub mdt_date: Option<NaiveDate>,
    pub treatment_intent: TreatmentIntent,
    pub investigations: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tumour {
    /// Identifier in format "TUM-<episode>-<NN>"
    pub tumour_id: String,
    pub patient_id: String,
    pub episode_id: String,
    pub site: TumourSite,
    pub laterality: Option<Laterality>,
    pub histology: String,
    pub t_stage: String,
    pub n_stage: Option<String>,
    pub m_stage: Option<String>,
    pub grade: Option<String>,
    pub size_mm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    /// Identifier in format "TRT-<episode>-<NN>"
    pub treatment_id: String,
    pub patient_id: String,
    pub episode_id: String,
    pub modality: TreatmentModality,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Operating surgeon, only recorded for surgical treatments
    pub surgeon: Option<String>,
    pub provider: Option<String>,
    pub regimen: Option<String>,
    pub cycles: Option<f64>,
    pub dose_gy: Option<f64>,
    pub complications: Vec<String>,
    pub notes: Option<String>,
}

/// A fully assembled entity handed to the write collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityPayload {
    FollowUp(FollowUp),
    Episode(Episode),
    Tumour(Tumour),
    Treatment(Treatment),
}

impl EntityPayload {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::FollowUp(_) => EntityKind::FollowUp,
            EntityPayload::Episode(_) => EntityKind::Episode,
            EntityPayload::Tumour(_) => EntityKind::Tumour,
            EntityPayload::Treatment(_) => EntityKind::Treatment,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            EntityPayload::FollowUp(f) => &f.follow_up_id,
            EntityPayload::Episode(e) => &e.episode_id,
            EntityPayload::Tumour(t) => &t.tumour_id,
            EntityPayload::Treatment(t) => &t.treatment_id,
        }
    }

    pub fn patient_id(&self) -> &str {
        match self {
            EntityPayload::FollowUp(f) => &f.patient_id,
            EntityPayload::Episode(e) => &e.patient_id,
            EntityPayload::Tumour(t) => &t.patient_id,
            EntityPayload::Treatment(t) => &t.patient_id,
        }
    }

    /// Check the payload against the rules the write boundary relies on.
    ///
    /// Only freshly derived identifiers are parsed. An edited record keeps
    /// whatever identifier it was stored under, so it just has to be present.
    pub fn validate(&self, mode: SubmissionMode) -> Result<(), PayloadValidationError> {
        match mode {
            SubmissionMode::Create => {
                let parsed = parse_identifier(self.identifier())
                    .map_err(PayloadValidationError::Identifier)?;
                if parsed.prefix != self.kind().id_prefix() {
                    return Err(PayloadValidationError::PrefixMismatch {
                        expected: self.kind().id_prefix(),
                        found: parsed.prefix,
                    });
                }
            }
            SubmissionMode::Edit => {
                if self.identifier().trim().is_empty() {
                    return Err(PayloadValidationError::MissingField("identifier"));
                }
            }
        }

        if self.patient_id().trim().is_empty() {
            return Err(PayloadValidationError::MissingLinkage("patient_id"));
        }

        match self {
            EntityPayload::FollowUp(f) => {
                check_measurement("cea_level", f.cea_level)?;
                check_measurement("weight_kg", f.weight_kg)?;
                check_list("investigations_ordered", &f.investigations_ordered)?;
                if let Some(next) = f.next_review_date {
                    check_date_order("next_review_date", f.visit_date, next)?;
                }
            }
            EntityPayload::Episode(e) => {
                if e.lead_surgeon.trim().is_empty() {
                    return Err(PayloadValidationError::MissingField("lead_surgeon"));
                }
                if let Some(status) = e.performance_status {
                    if status > 4 {
                        return Err(PayloadValidationError::OutOfRange("performance_status"));
                    }
                }
                check_list("investigations", &e.investigations)?;
            }
            EntityPayload::Tumour(t) => {
                if t.episode_id.trim().is_empty() {
                    return Err(PayloadValidationError::MissingLinkage("episode_id"));
                }
                if t.histology.trim().is_empty() {
                    return Err(PayloadValidationError::MissingField("histology"));
                }
                if !t.site.t_stages().contains(&t.t_stage.as_str()) {
                    return Err(PayloadValidationError::InvalidCode("t_stage"));
                }
                check_code("n_stage", t.n_stage.as_deref(), N_STAGES)?;
                check_code("m_stage", t.m_stage.as_deref(), M_STAGES)?;
                check_code("grade", t.grade.as_deref(), GRADES)?;
                check_measurement("size_mm", t.size_mm)?;
            }
            EntityPayload::Treatment(t) => {
                if t.episode_id.trim().is_empty() {
                    return Err(PayloadValidationError::MissingLinkage("episode_id"));
                }
                let surgical = t.modality == TreatmentModality::Surgery;
                match (&t.surgeon, surgical) {
                    (None, true) => return Err(PayloadValidationError::MissingField("surgeon")),
                    (Some(_), false) => {
                        return Err(PayloadValidationError::UnexpectedField("surgeon"))
                    }
                    _ => {}
                }
                if let Some(end) = t.end_date {
                    check_date_order("end_date", t.start_date, end)?;
                }
                check_measurement("cycles", t.cycles)?;
                check_measurement("dose_gy", t.dose_gy)?;
                check_list("complications", &t.complications)?;
            }
        }

        Ok(())
    }
}

fn check_measurement(field: &'static str, value: Option<f64>) -> Result<(), PayloadValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(PayloadValidationError::OutOfRange(field)),
        _ => Ok(()),
    }
}

fn check_list(field: &'static str, items: &[String]) -> Result<(), PayloadValidationError> {
    if items.iter().any(|item| item.trim().is_empty()) {
        return Err(PayloadValidationError::EmptyListItem(field));
    }
    Ok(())
}

fn check_code(
    field: &'static str,
    value: Option<&str>,
    allowed: &[&str],
) -> Result<(), PayloadValidationError> {
    match value {
        Some(code) if !allowed.contains(&code) => Err(PayloadValidationError::InvalidCode(field)),
        _ => Ok(()),
    }
}

fn check_date_order(
    field: &'static str,
    earlier: NaiveDate,
    later: NaiveDate,
) -> Result<(), PayloadValidationError> {
    if later < earlier {
        return Err(PayloadValidationError::DateOrder(field));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValidationError {
    Identifier(IdentifierError),
    PrefixMismatch { expected: &'static str, found: String },
    MissingLinkage(&'static str),
    MissingField(&'static str),
    UnexpectedField(&'static str),
    InvalidCode(&'static str),
    OutOfRange(&'static str),
    EmptyListItem(&'static str),
    DateOrder(&'static str),
}

impl fmt::Display for PayloadValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadValidationError::Identifier(e) => write!(f, "{}", e),
            PayloadValidationError::PrefixMismatch { expected, found } => {
                write!(f, "Identifier prefix {} does not match entity prefix {}", found, expected)
            }
            PayloadValidationError::MissingLinkage(field) => write!(f, "Missing parent link {}", field),
            PayloadValidationError::MissingField(field) => write!(f, "{} is required", field),
            PayloadValidationError::UnexpectedField(field) => {
                write!(f, "{} does not apply to this record", field)
            }
            PayloadValidationError::InvalidCode(field) => write!(f, "{} has an unrecognised code", field),
            PayloadValidationError::OutOfRange(field) => write!(f, "{} is out of range", field),
            PayloadValidationError::EmptyListItem(field) => write!(f, "{} contains an empty entry", field),
            PayloadValidationError::DateOrder(field) => write!(f, "{} is before the start date", field),
        }
    }
}

impl std::error::Error for PayloadValidationError {}

/// Record mode the payload was assembled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    Create,
    Edit,
}

/// What the write collaborator receives on submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub mode: SubmissionMode,
    pub payload: EntityPayload,
}

/// Response body returned by the API when a write is rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Response from entity count queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u32,
}

// ---------------------------------------------------------------------------
// Reference candidates
// ---------------------------------------------------------------------------

/// Kinds of lookup entity selectable through a search field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Surgeon,
    Patient,
    Provider,
}

impl ReferenceKind {
    pub fn collection(&self) -> &'static str {
        match self {
            ReferenceKind::Surgeon => "surgeons",
            ReferenceKind::Patient => "patients",
            ReferenceKind::Provider => "providers",
        }
    }
}

/// Common surface of surgeons, patients and providers for search fields
pub trait ReferenceCandidate {
    fn id(&self) -> &str;
    fn display_name(&self) -> String;

    /// Affects ordering only, unless a consultants-only scope is requested
    fn is_consultant(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surgeon {
    pub id: String,
    pub first_name: String,
    pub surname: String,
    #[serde(default)]
    pub is_consultant: bool,
    pub gmc_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub surname: String,
    pub hospital_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub organisation_code: Option<String>,
}

impl ReferenceCandidate for Surgeon {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }

    fn is_consultant(&self) -> bool {
        self.is_consultant
    }
}

impl ReferenceCandidate for Patient {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

impl ReferenceCandidate for Provider {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_follow_up() -> FollowUp {
        FollowUp {
            follow_up_id: "FU-P123-01".to_string(),
            patient_id: "P123".to_string(),
            episode_id: Some("EP-P123-01".to_string()),
            visit_date: date(2024, 3, 1),
            clinician: Some("Ada Lovelace".to_string()),
            outcome: FollowUpOutcome::NoEvidenceOfDisease,
            cea_level: Some(2.4),
            weight_kg: None,
            investigations_ordered: vec!["CT TAP".to_string()],
            next_review_date: Some(date(2024, 9, 1)),
            notes: None,
        }
    }

    #[test]
    fn test_derive_identifier() {
        assert_eq!(derive_identifier("FU", "P123", 0), "FU-P123-01");
        assert_eq!(derive_identifier("FU", "P123", 8), "FU-P123-09");
        assert_eq!(derive_identifier("EP", "P123", 41), "EP-P123-42");

        // Sequence grows past two digits rather than wrapping
        assert_eq!(derive_identifier("FU", "P123", 99), "FU-P123-100");
    }

    #[test]
    fn test_derive_identifier_strips_parent_punctuation() {
        assert_eq!(derive_identifier("FU", "P-123/a b", 0), "FU-P123ab-01");
        assert_eq!(derive_identifier("TUM", "EP-P1-02", 2), "TUM-EPP102-03");
        assert_eq!(sanitize_parent_id("--__"), "");
    }

    #[test]
    fn test_derive_identifier_is_pure() {
        let first = derive_identifier("TRT", "EP-77-01", 3);
        let second = derive_identifier("TRT", "EP-77-01", 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_identifier() {
        let parsed = parse_identifier("FU-P123-01").unwrap();
        assert_eq!(parsed.prefix, "FU");
        assert_eq!(parsed.parent, "P123");
        assert_eq!(parsed.sequence, 1);

        let parsed = parse_identifier("FU-P123-100").unwrap();
        assert_eq!(parsed.sequence, 100);

        // Invalid format
        assert!(parse_identifier("FU-P123").is_err());
        assert!(parse_identifier("FU--01").is_err());
        assert!(parse_identifier("FU-P-123-01").is_err());

        // Invalid sequence
        assert_eq!(parse_identifier("FU-P123-1"), Err(IdentifierError::InvalidSequence));
        assert_eq!(parse_identifier("FU-P123-00"), Err(IdentifierError::InvalidSequence));
        assert_eq!(parse_identifier("FU-P123-xx"), Err(IdentifierError::InvalidSequence));
    }

    #[test]
    fn test_entity_kind_metadata() {
        assert_eq!(EntityKind::FollowUp.id_prefix(), "FU");
        assert_eq!(EntityKind::Tumour.collection(), "tumours");
        assert_eq!(EntityKind::Treatment.parent_key(), "episode_id");
        assert_eq!(EntityKind::Episode.parent_key(), "patient_id");
    }

    #[test]
    fn test_payload_is_tagged_by_kind() {
        let payload = EntityPayload::FollowUp(sample_follow_up());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "follow_up");
        assert_eq!(json["follow_up_id"], "FU-P123-01");
        assert_eq!(json["outcome"], "NoEvidenceOfDisease");
        assert_eq!(json["weight_kg"], serde_json::Value::Null);

        let back: EntityPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_validate_follow_up() {
        let payload = EntityPayload::FollowUp(sample_follow_up());
        assert!(payload.validate(SubmissionMode::Create).is_ok());

        let mut bad = sample_follow_up();
        bad.follow_up_id = "EP-P123-01".to_string();
        let err = EntityPayload::FollowUp(bad).validate(SubmissionMode::Create).unwrap_err();
        assert!(matches!(err, PayloadValidationError::PrefixMismatch { .. }));

        let mut bad = sample_follow_up();
        bad.cea_level = Some(-1.0);
        assert_eq!(
            EntityPayload::FollowUp(bad).validate(SubmissionMode::Create),
            Err(PayloadValidationError::OutOfRange("cea_level"))
        );

        let mut bad = sample_follow_up();
        bad.next_review_date = Some(date(2023, 1, 1));
        assert_eq!(
            EntityPayload::FollowUp(bad).validate(SubmissionMode::Create),
            Err(PayloadValidationError::DateOrder("next_review_date"))
        );
    }

    #[test]
    fn test_edit_accepts_legacy_identifiers() {
        for legacy in ["FU-P123-1", "FU-P-123-01", "legacy-42"] {
            let mut record = sample_follow_up();
            record.follow_up_id = legacy.to_string();
            let payload = EntityPayload::FollowUp(record);
            assert_eq!(payload.validate(SubmissionMode::Edit), Ok(()));
            assert!(matches!(
                payload.validate(SubmissionMode::Create),
                Err(PayloadValidationError::Identifier(_))
            ));
        }

        let mut blank = sample_follow_up();
        blank.follow_up_id = "  ".to_string();
        assert_eq!(
            EntityPayload::FollowUp(blank).validate(SubmissionMode::Edit),
            Err(PayloadValidationError::MissingField("identifier"))
        );
    }

    #[test]
    fn test_validate_treatment_surgeon_rule() {
        let treatment = Treatment {
            treatment_id: "TRT-EPP12301-01".to_string(),
            patient_id: "P123".to_string(),
            episode_id: "EP-P123-01".to_string(),
            modality: TreatmentModality::Surgery,
            start_date: date(2024, 1, 10),
            end_date: None,
            surgeon: None,
            provider: None,
            regimen: None,
            cycles: None,
            dose_gy: None,
            complications: vec![],
            notes: None,
        };
        assert_eq!(
            EntityPayload::Treatment(treatment.clone()).validate(SubmissionMode::Create),
            Err(PayloadValidationError::MissingField("surgeon"))
        );

        let with_surgeon = Treatment {
            surgeon: Some("Ada Lovelace".to_string()),
            ..treatment.clone()
        };
        assert!(EntityPayload::Treatment(with_surgeon.clone()).validate(SubmissionMode::Create).is_ok());

        let chemo_with_surgeon = Treatment {
            modality: TreatmentModality::Chemotherapy,
            ..with_surgeon
        };
        assert_eq!(
            EntityPayload::Treatment(chemo_with_surgeon).validate(SubmissionMode::Create),
            Err(PayloadValidationError::UnexpectedField("surgeon"))
        );
    }

    #[test]
    fn test_tumour_t_stage_depends_on_site() {
        assert!(TumourSite::Rectum.t_stages().contains(&"T4b"));
        assert!(!TumourSite::Breast.t_stages().contains(&"T4b"));
        assert!(!TumourSite::Liver.t_stages().contains(&"Tis"));
    }

    #[test]
    fn test_reference_display_names() {
        let surgeon = Surgeon {
            id: "s1".to_string(),
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            is_consultant: true,
            gmc_number: None,
        };
        assert_eq!(surgeon.display_name(), "Ada Lovelace");
        assert!(surgeon.is_consultant());

        let provider = Provider {
            id: "pr1".to_string(),
            name: "St Elsewhere".to_string(),
            organisation_code: None,
        };
        assert_eq!(provider.display_name(), "St Elsewhere");
        assert!(!provider.is_consultant());
    }

    #[test]
    fn test_surgeon_consultant_flag_defaults() {
        let surgeon: Surgeon = serde_json::from_str(
            r#"{"id":"s2","first_name":"Grace","surname":"Hopper","gmc_number":null}"#,
        )
        .unwrap();
        assert!(!surgeon.is_consultant);
    }
}
