//! Textlens Analysis Library
//!
//! Two layers over extracted text: a pure, deterministic metrics engine
//! ([`metrics::summarize`]) and an optional AI augmentation adapter
//! ([`augment::Augmenter`]) that enriches the local result via an external
//! generative-text service and degrades back to the local result on any
//! failure.

pub mod augment;
pub mod metrics;

pub use augment::{AugmentedAnalysis, Augmenter};
pub use metrics::{clean_text, summarize, TextSummary};
