//! Per-entity form definitions: schema, snapshot-to-payload conversion, and
//! the draft values used to open an existing record for editing.

use chrono::NaiveDate;

use crate::error::FormError;
use crate::services::api::EntityCounter;
use crate::services::logging::Logger;
use crate::state::form_state::{DraftValue, EntitySnapshot, ParentLinkage};
use shared::{EntityKind, EntityPayload};

pub mod episode_form;
pub mod follow_up_form;
pub mod treatment_form;
pub mod tumour_form;

/// Convert a snapshot into the tagged payload for its entity kind
pub fn payload_from_snapshot(snapshot: &EntitySnapshot) -> Result<EntityPayload, FormError> {
    Ok(match snapshot.kind {
        EntityKind::FollowUp => EntityPayload::FollowUp(follow_up_form::follow_up_from_snapshot(snapshot)?),
        EntityKind::Episode => EntityPayload::Episode(episode_form::episode_from_snapshot(snapshot)?),
        EntityKind::Tumour => EntityPayload::Tumour(tumour_form::tumour_from_snapshot(snapshot)?),
        EntityKind::Treatment => EntityPayload::Treatment(treatment_form::treatment_from_snapshot(snapshot)?),
    })
}

/// Records of `kind` already stored under the parent named by `linkage`.
/// Create-mode identifiers are derived from this count, so a failed lookup
/// stops the form from opening rather than guessing.
pub async fn existing_count<E>(counter: &E, kind: EntityKind, linkage: &ParentLinkage) -> Result<u32, FormError>
where
    E: EntityCounter + ?Sized,
{
    let parent = linkage.parent_for(kind)?;
    counter.count_entities(kind, parent).await.map_err(|e| {
        Logger::warn_with_component("forms", &format!("Counting {} for {} failed: {}", kind, parent, e));
        FormError::CountUnavailable(e.to_string())
    })
}

/// Episode link every tumour and treatment must carry
fn required_episode(snapshot: &EntitySnapshot) -> Result<String, FormError> {
    snapshot
        .linkage
        .episode_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or(FormError::MissingLinkage("episode_id"))
}

fn text_value(value: &str) -> DraftValue {
    DraftValue::text(value)
}

fn optional_text(value: Option<&str>) -> DraftValue {
    DraftValue::text(value.unwrap_or_default())
}

fn date_value(value: Option<NaiveDate>) -> DraftValue {
    DraftValue::text(value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default())
}

fn number_value(value: Option<f64>) -> DraftValue {
    DraftValue::text(value.map(|n| n.to_string()).unwrap_or_default())
}

fn code_value<T: Into<&'static str>>(value: Option<T>) -> DraftValue {
    let code: &'static str = value.map(Into::into).unwrap_or_default();
    DraftValue::text(code)
}

fn list_value(items: &[String]) -> DraftValue {
    DraftValue::List(items.to_vec())
}
