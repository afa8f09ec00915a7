//! Headless form core for surgical records: follow-ups, cancer episodes,
//! tumours and treatments.
//!
//! A host application opens a [`ModalHost`] around a [`WizardController`]
//! for one entity, feeds it key and click events, and supplies the write
//! collaborator that persists the assembled [`shared::EntityPayload`].
//! Reference lookups (surgeons, patients, providers) go through a shared
//! [`ReferenceSearchProvider`] per scope.

pub mod components;
pub mod config;
pub mod error;
pub mod hooks;
pub mod services;
pub mod state;

pub use components::{ModalHost, WizardController};
pub use config::ClientConfig;
pub use error::{ApiError, FieldErrors, FormError};
pub use hooks::ReferenceSearchProvider;
pub use services::logging::init_logging;
