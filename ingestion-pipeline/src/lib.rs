pub mod chunker;
pub mod frontmatter;
pub mod pipeline;

pub use chunker::MarkdownChunker;
pub use frontmatter::{split_front_matter, RunbookFrontMatter};
pub use pipeline::{IngestionPipeline, IngestionReport};
