pub mod fields;
pub mod forms;
pub mod modal_host;
pub mod wizard;

pub use modal_host::{KeyboardRegistry, ModalCallbacks, ModalHost, ModalOutcome};
pub use wizard::{SubmissionStatus, WizardController};
