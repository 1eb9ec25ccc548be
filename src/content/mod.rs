pub mod source;
pub mod supplier;

pub use source::{ContentSource, Difficulty, MAX_SENTENCE_LEN};
pub use supplier::ContentSupplier;
