//! Citation extraction and linking for streamed assistant text.
//!
//! This crate owns the pure text-processing half of message
//! reconciliation: pulling reference lists out of raw response text,
//! normalizing each reference to an absolute URL when one is present,
//! and rewriting numbered `[n]` markers into resolvable link markup.
//! It performs no I/O and holds no state across calls.

pub mod extract;
pub mod link;

pub use extract::{extract_references, Extraction};
pub use link::{link_citations, render_message, repair_sentence_spacing, LinkedMessage};
