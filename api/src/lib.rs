//! axum integration for `reqbind`: validated extractors, the HTTP error
//! envelope, configuration, tracing setup and rejection metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod observability;

pub use config::BindConfig;
pub use error::{ApiError, ApiResult};
pub use extract::{BindContext, ValidatedForm, ValidatedJson};
pub use observability::Observability;
