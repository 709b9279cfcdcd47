pub mod query;
pub mod search;
pub mod service;
pub mod store;
pub mod util;

pub use query::QueryService;
pub use service::DeclSearchService;
