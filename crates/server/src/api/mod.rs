//! HTTP endpoint modules, one per concern.

mod ai_query;
pub mod doc;
mod endpoint;
mod health;
mod schema_info;

pub use ai_query::ai_query;
pub use endpoint::{connect_endpoint, disconnect_endpoint};
pub use health::health;
pub use schema_info::schema_info;
