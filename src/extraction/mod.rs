//! Per-file fact extraction.
//!
//! Turns raw source text into `FileFacts`: imports, exports, declared
//! symbols, approximate complexity. Dispatch is a closed enum chosen by
//! file extension - JavaScript/TypeScript get the full structural pass,
//! other languages a simpler lexical pass. Both produce the same record,
//! so the graph builder never cares which analyzer ran.

mod complexity;
mod facts;

pub use complexity::approximate_complexity;
pub use facts::{extract_facts, Analyzer};
