pub mod use_reference_search;

pub use use_reference_search::{use_reference_search, LoadState, ReferenceSearchProvider, SharedReferenceSearch};
