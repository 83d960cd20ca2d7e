//! Per-item pass state machine and pass planning.
//!
//! [`PassPlan`] is derived once per item from the (normalised) configuration.
//! [`PassState`] drives the controller loop through it.

use std::path::{Path, PathBuf};

use crate::config::TransformerConfig;

// ---------------------------------------------------------------------------
// PassState
// ---------------------------------------------------------------------------

/// Stages of one item's conversion.
///
/// The state machine transitions are:
///
/// ```text
/// Start ──▶ VocalTractPass ──▶ ProsodyPass ──────▶ Finalize ──▶ Done
///                         ├──▶ CopyIntermediate ─▶ Finalize
///                         └──▶ Finalize                (single pass)
/// any stage ──error──▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    #[default]
    Start,
    VocalTractPass,
    ProsodyPass,
    CopyIntermediate,
    Finalize,
    Done,
    Failed,
}

impl PassState {
    /// Successor of `self` after the stage succeeded, or `None` once terminal.
    ///
    /// ```
    /// use std::path::Path;
    /// use codebook_vc::config::TransformerConfig;
    /// use codebook_vc::pipeline::{PassPlan, PassState};
    ///
    /// let plan = PassPlan::new(&TransformerConfig::default(), Path::new("out/a.wav"));
    /// assert_eq!(PassState::Start.next(&plan), Some(PassState::VocalTractPass));
    /// assert_eq!(PassState::VocalTractPass.next(&plan), Some(PassState::Finalize));
    /// assert_eq!(PassState::Done.next(&plan), None);
    /// ```
    pub fn next(&self, plan: &PassPlan) -> Option<PassState> {
        match self {
            PassState::Start => Some(PassState::VocalTractPass),
            PassState::VocalTractPass => Some(match plan.prosody {
                Some(ProsodyStep::Resynthesize) => PassState::ProsodyPass,
                Some(ProsodyStep::Copy) => PassState::CopyIntermediate,
                None => PassState::Finalize,
            }),
            PassState::ProsodyPass | PassState::CopyIntermediate => Some(PassState::Finalize),
            PassState::Finalize => Some(PassState::Done),
            PassState::Done | PassState::Failed => None,
        }
    }

    /// `Failed` from any non-terminal stage; terminal states stay put.
    pub fn fail(&self) -> PassState {
        if self.is_terminal() {
            *self
        } else {
            PassState::Failed
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PassState::Done | PassState::Failed)
    }

    /// A short human-readable label for logs and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            PassState::Start => "start",
            PassState::VocalTractPass => "vocal-tract pass",
            PassState::ProsodyPass => "prosody pass",
            PassState::CopyIntermediate => "intermediate copy",
            PassState::Finalize => "finalize",
            PassState::Done => "done",
            PassState::Failed => "failed",
        }
    }
}

// ---------------------------------------------------------------------------
// PassPlan
// ---------------------------------------------------------------------------

/// What happens after the vocal-tract pass of a two-pass conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProsodyStep {
    /// Render the intermediate again with the prosody settings.
    Resynthesize,
    /// Prosody is neutral: copy the intermediate to the output.
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassPlan {
    /// Where the vocal-tract pass writes: the final output for a single pass,
    /// the `_vt.wav` intermediate otherwise.
    pub vocal_tract_output: PathBuf,
    pub final_output: PathBuf,
    /// `None` for a single-pass conversion.
    pub prosody: Option<ProsodyStep>,
    pub keep_intermediate: bool,
}

impl PassPlan {
    /// Plan the passes for `output`.  `config` should already be normalised.
    pub fn new(config: &TransformerConfig, output: &Path) -> Self {
        if !config.pipeline.separate_prosody {
            return Self {
                vocal_tract_output: output.to_path_buf(),
                final_output: output.to_path_buf(),
                prosody: None,
                keep_intermediate: false,
            };
        }

        let step = if config.prosody.requires_resynthesis() {
            ProsodyStep::Resynthesize
        } else {
            ProsodyStep::Copy
        };
        Self {
            vocal_tract_output: intermediate_path(output),
            final_output: output.to_path_buf(),
            prosody: Some(step),
            keep_intermediate: config.pipeline.save_vocal_tract_only,
        }
    }

    /// The `_vt.wav` file, when the plan has one.
    pub fn intermediate(&self) -> Option<&Path> {
        self.prosody.map(|_| self.vocal_tract_output.as_path())
    }

    pub fn is_two_pass(&self) -> bool {
        self.prosody.is_some()
    }
}

/// `<dir>/<stem>_vt.wav` next to `output`.
pub fn intermediate_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    output.with_file_name(format!("{stem}_vt.wav"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
