//! Conversion pipeline for codebook voice conversion.
//!
//! This module drives a whole folder of recordings through the resynthesis
//! engine and collects one outcome per file.
//!
//! # Architecture
//!
//! ```text
//! BatchTransformer::run(input, output, codebook)
//!        │
//!        ├─ preflight: config · codebook header · input folder · pitch stats
//!        ├─ Preprocessor::run / FeatureExtractor::run   (once per run)
//!        ├─ CodebookMapper::new                          (once per run)
//!        │
//!        └─ for each item (sequential or worker pool)
//!              PassController::convert
//!                 Start → VocalTractPass ─┬─▶ ProsodyPass ──────┐
//!                                         ├─▶ CopyIntermediate ─┼─▶ Finalize → Done
//!                                         └─────────────────────┘
//!              → ItemOutcome { Converted | Failed }
//!
//! BatchReport (sorted by input index) ──▶ optional JSON file
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use codebook_vc::config::TransformerConfig;
//! use codebook_vc::pipeline::BatchTransformer;
//!
//! let config = TransformerConfig::default();
//! let report = BatchTransformer::with_defaults(&config)
//!     .run(Path::new("in"), Path::new("out"), Path::new("voice.wcf"))
//!     .expect("fatal batch error");
//!
//! for failure in report.failures() {
//!     eprintln!("{}: {:?}", failure.input.display(), failure.status);
//! }
//! ```

pub mod batch;
pub mod error;
pub mod pass;
pub mod state;

pub use batch::{BatchReport, BatchTransformer, ItemOutcome, ItemStatus};
pub use error::TransformError;
pub use pass::{ItemReport, PassController};
pub use state::{intermediate_path, PassPlan, PassState, ProsodyStep};
