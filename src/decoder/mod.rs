//! Decoder collaborator: argument schema, configuration handle and the
//! engine traits.
//!
//! # Architecture
//!
//! ```text
//! ArgSchema (immutable) ──▶ DecoderConfig ──▶ DecoderEngine::init ──▶ Box<dyn Decoder>
//!                             ▲
//!                             └── parse_file(-argfile)
//! ```

pub mod args;
pub mod config;
pub mod engine;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use args::{ArgKind, ArgSchema, ArgSpec, ArgValue};
pub use config::DecoderConfig;
pub use engine::{Decoder, DecoderEngine, EngineError};
