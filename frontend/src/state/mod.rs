pub mod form_state;
pub mod schema;

pub use form_state::{DraftValue, EntityFormState, EntitySnapshot, FormMode, ParentLinkage};
pub use schema::{FieldKind, FieldSpec, FormSchema};
