pub mod api;
pub mod date_utils;
pub mod logging;
pub mod session;

pub use api::{ApiClient, EntityCounter, EntitySubmitter, ReferenceApi, ReferenceScope};
pub use logging::Logger;
pub use session::{SessionProvider, StaticSession};
