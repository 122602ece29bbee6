//! Recognition session: resource ownership, configuration, grammars,
//! utterance segmentation and the controller that ties them together.
//!
//! # Architecture
//!
//! ```text
//!                     ┌──────────────────────┐
//!   host ───────────▶ │  SessionController   │ ───▶ EventDispatcher ───▶ listeners
//!                     └──────────┬───────────┘
//!          ┌──────────────┬──────┴───────┬────────────────────┐
//!          ▼              ▼              ▼                    ▼
//! ConfigurationBuilder  ResourceHandles  GrammarRegistry  UtteranceSegmenter
//! ```

pub mod builder;
pub mod controller;
pub mod events;
pub mod grammar;
pub mod resources;
pub mod segmenter;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use builder::{check_model_assets, log_file_path, ConfigurationBuilder, ASSET_MANIFEST};
pub use controller::{SessionController, DEFAULT_INPUT_DEVICE};
pub use events::{EventDispatcher, SessionEvent, SessionListener};
pub use grammar::{GrammarRegistry, GrammarSource, KeywordConfig, KEYPHRASE_SEARCH};
pub use resources::{AcquireGuard, ResourceHandles};
pub use segmenter::{
    ChunkReport, Transition, UtteranceSegmenter, UtteranceState, DEFAULT_CHUNK_SAMPLES,
};
