//! Codebook store.
//!
//! A [`Codebook`] is the table of paired source/target LSF vectors learned
//! from parallel recordings, plus the [`CodebookHeader`] describing how they
//! were analysed.  It is validated and summarised ([`CodebookStats`]) once,
//! when read, and shared read-only by every conversion afterwards.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use codebook_vc::codebook::CodebookFile;
//!
//! let mut file = CodebookFile::open(Path::new("neutral_to_angry.wcf")).unwrap();
//! let header = file.read_header().unwrap();      // LP order, frame settings
//! println!("LP order {}", header.lp_order);
//! let codebook = file.read_entries().unwrap();   // validated entries
//! println!("{} entries", codebook.len());
//! ```

pub mod file;
pub mod store;

pub use file::{write_codebook, CodebookFile};
pub use store::{
    Codebook, CodebookEntry, CodebookError, CodebookHeader, CodebookPitchStatistics,
    CodebookSide, CodebookStats, MAX_FRAME_SECS, MAX_LP_ORDER,
};
