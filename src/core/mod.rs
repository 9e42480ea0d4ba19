pub mod chunker;
pub mod diff_parser;
pub mod filter;
pub mod pr_link;
pub mod prompt;
pub mod review;

pub use chunker::DiffChunker;
pub use diff_parser::DiffParser;
pub use pr_link::PrLink;
pub use review::ChunkedReviewer;
