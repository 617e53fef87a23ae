pub mod query;
pub mod retriever;
pub mod scoring;

pub use query::build_query_text;
pub use retriever::Retriever;
