//! Conversion pass controller: runs one item through its [`PassPlan`].
//!
//! # Pass flow
//!
//! ```text
//! single pass:  input ──engine(mapper, real prosody)──▶ output
//!
//! two passes:   input ──engine(mapper, neutral prosody)──▶ <stem>_vt.wav
//!                 ├─ prosody needed → engine(no mapper, real prosody) ──▶ output
//!                 └─ neutral        → byte copy ──────────────────────▶ output
//!               Finalize removes <stem>_vt.wav unless it is kept.
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adaptation::AdaptationItem;
use crate::codebook::Codebook;
use crate::config::TransformerConfig;
use crate::engine::{ResynthesisRequest, Resynthesizer};
use crate::mapper::CodebookMapper;
use crate::prosody::ProsodyParams;

use super::error::TransformError;
use super::state::{PassPlan, PassState};

/// What a successful conversion did.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReport {
    pub output: PathBuf,
    /// The `_vt.wav` file, when one was written and kept.
    pub kept_intermediate: Option<PathBuf>,
    /// Every state visited, `Start` through `Done`.
    pub trace: Vec<PassState>,
}

pub struct PassController {
    config: TransformerConfig,
    engine: Arc<dyn Resynthesizer>,
}

impl PassController {
    /// The configuration is normalised here, so every plan sees the implied
    /// switches.
    pub fn new(config: &TransformerConfig, engine: Arc<dyn Resynthesizer>) -> Self {
        Self {
            config: config.normalized(),
            engine,
        }
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Convert `item` into `output`.
    pub fn convert(
        &self,
        item: &AdaptationItem,
        output: &Path,
        mapper: &CodebookMapper,
        codebook: &Codebook,
    ) -> Result<ItemReport, TransformError> {
        let plan = PassPlan::new(&self.config, output);
        let mut state = PassState::Start;
        let mut trace = vec![state];

        loop {
            if let Err(e) = self.run_stage(state, &plan, item, mapper, codebook) {
                log::debug!(
                    "pass: {} {} -> {:?}",
                    item.audio_file.display(),
                    state.label(),
                    state.fail()
                );
                return Err(e);
            }
            match state.next(&plan) {
                Some(next) => {
                    state = next;
                    trace.push(state);
                }
                None => break,
            }
        }

        Ok(ItemReport {
            output: plan.final_output.clone(),
            kept_intermediate: plan
                .intermediate()
                .filter(|_| plan.keep_intermediate)
                .map(Path::to_path_buf),
            trace,
        })
    }

    fn run_stage(
        &self,
        state: PassState,
        plan: &PassPlan,
        item: &AdaptationItem,
        mapper: &CodebookMapper,
        codebook: &Codebook,
    ) -> Result<(), TransformError> {
        let switches = &self.config.pipeline;

        match state {
            PassState::Start | PassState::Done | PassState::Failed => Ok(()),

            PassState::VocalTractPass => {
                let prosody = if plan.is_two_pass() {
                    self.config.prosody.neutral()
                } else {
                    self.config.prosody.clone()
                };
                self.render(
                    state,
                    ResynthesisRequest {
                        input: &item.audio_file,
                        pitch_file: &item.pitch_file,
                        output: &plan.vocal_tract_output,
                        vocal_tract_transformation: switches.vocal_tract_transformation,
                        fixed_rate: switches.fixed_rate_conversion,
                        resynthesize_from_source_codebook: switches
                            .resynthesize_from_source_codebook,
                        match_using_target_codebook: switches.match_using_target_codebook,
                        prosody: &prosody,
                        mapper: switches.vocal_tract_transformation.then_some(mapper),
                        codebook,
                        display_progress: switches.display_progress,
                    },
                )
            }

            PassState::ProsodyPass => {
                // The intermediate keeps the input's timing, so the input's
                // pitch track still applies.
                let prosody: &ProsodyParams = &self.config.prosody;
                self.render(
                    state,
                    ResynthesisRequest {
                        input: &plan.vocal_tract_output,
                        pitch_file: &item.pitch_file,
                        output: &plan.final_output,
                        vocal_tract_transformation: false,
                        // Duration changes happen here even in fixed-rate mode.
                        fixed_rate: false,
                        resynthesize_from_source_codebook: false,
                        match_using_target_codebook: false,
                        prosody,
                        mapper: None,
                        codebook,
                        display_progress: switches.display_progress,
                    },
                )
            }

            PassState::CopyIntermediate => {
                std::fs::copy(&plan.vocal_tract_output, &plan.final_output)?;
                Ok(())
            }

            PassState::Finalize => {
                if let Some(intermediate) = plan.intermediate() {
                    if !plan.keep_intermediate {
                        std::fs::remove_file(intermediate)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn render(
        &self,
        state: PassState,
        request: ResynthesisRequest<'_>,
    ) -> Result<(), TransformError> {
        self.engine
            .render(&request)
            .map_err(|source| TransformError::Engine {
                stage: state.label(),
                source,
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebook::{CodebookEntry, CodebookHeader};
    use crate::engine::MockResynthesizer;
    use crate::mapper::MapperParams;
    use crate::prosody::{PitchTransformationMethod, ScaleFactors};
    use tempfile::{tempdir, TempDir};

    struct Setup {
        dir: TempDir,
        item: AdaptationItem,
        codebook: Codebook,
        mapper: CodebookMapper,
    }

    fn setup(input_name: &str) -> Setup {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join(input_name);
        std::fs::write(&input, b"RIFF-input").expect("write input");

        let codebook = Codebook::new(
            CodebookHeader::new(2, 8_000, 0.02, 0.01),
            vec![CodebookEntry::new(
                vec![500.0, 1_500.0],
                vec![1.0, 1.0],
                vec![600.0, 1_600.0],
                vec![1.0, 1.0],
            )],
        )
        .expect("codebook");
        let mapper = CodebookMapper::new(MapperParams::default(), &codebook).expect("mapper");

        Setup {
            item: AdaptationItem::from_wav_path(input),
            dir,
            codebook,
            mapper,
        }
    }

    fn controller(config: &TransformerConfig) -> (PassController, Arc<MockResynthesizer>) {
        let engine = Arc::new(MockResynthesizer::default());
        (PassController::new(config, engine.clone()), engine)
    }

    #[test]
    fn single_pass_calls_engine_once_with_real_prosody() {
        let s = setup("a.wav");
        let mut config = TransformerConfig::default();
        config.prosody.scales = ScaleFactors {
            pitch: vec![1.2],
            ..ScaleFactors::identity()
        };
        let (ctl, engine) = controller(&config);
        let output = s.dir.path().join("a_output.wav");

        let report = ctl
            .convert(&s.item, &output, &s.mapper, &s.codebook)
            .expect("convert");

        let calls = engine.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].with_mapper);
        assert_eq!(calls[0].prosody.scales.pitch, vec![1.2]);
        assert_eq!(calls[0].output, output);
        assert!(output.exists());
        assert_eq!(report.trace.last(), Some(&PassState::Done));
        assert!(report.kept_intermediate.is_none());
    }

    #[test]
    fn neutral_two_pass_copies_without_second_engine_call() {
        let s = setup("b.wav");
        let mut config = TransformerConfig::default();
        config.pipeline.separate_prosody = true;
        let (ctl, engine) = controller(&config);
        let output = s.dir.path().join("b_output.wav");

        let report = ctl
            .convert(&s.item, &output, &s.mapper, &s.codebook)
            .expect("convert");

        assert_eq!(engine.calls().len(), 1);
        assert!(report.trace.contains(&PassState::CopyIntermediate));
        assert_eq!(std::fs::read(&output).expect("read"), b"RIFF-input");
        assert!(!s.dir.path().join("b_output_vt.wav").exists());
    }

    #[test]
    fn prosody_pass_runs_without_mapper_or_vocal_tract_switches() {
        let s = setup("c.wav");
        let mut config = TransformerConfig::default();
        config.pipeline.separate_prosody = true;
        config.pipeline.match_using_target_codebook = true;
        config.prosody.transformation_method = PitchTransformationMethod::GlobalMean;
        let (ctl, engine) = controller(&config);
        let output = s.dir.path().join("c_output.wav");

        ctl.convert(&s.item, &output, &s.mapper, &s.codebook)
            .expect("convert");

        let calls = engine.calls();
        assert_eq!(calls.len(), 2);

        // First pass: mapper on, prosody neutral.
        assert!(calls[0].with_mapper);
        assert!(calls[0].vocal_tract_transformation);
        assert_eq!(
            calls[0].prosody.transformation_method,
            PitchTransformationMethod::NoTransformation
        );
        assert_eq!(calls[0].output, s.dir.path().join("c_output_vt.wav"));

        // Second pass: on the intermediate, mapper off, real prosody.
        assert!(!calls[1].with_mapper);
        assert!(!calls[1].vocal_tract_transformation);
        assert_eq!(calls[1].input, s.dir.path().join("c_output_vt.wav"));
        assert_eq!(
            calls[1].prosody.transformation_method,
            PitchTransformationMethod::GlobalMean
        );
        assert!(!s.dir.path().join("c_output_vt.wav").exists());
    }

    #[test]
    fn intermediate_is_kept_on_request() {
        let s = setup("d.wav");
        let mut config = TransformerConfig::default();
        config.pipeline.separate_prosody = true;
        config.pipeline.save_vocal_tract_only = true;
        let (ctl, _engine) = controller(&config);
        let output = s.dir.path().join("d_output.wav");

        let report = ctl
            .convert(&s.item, &output, &s.mapper, &s.codebook)
            .expect("convert");

        let kept = s.dir.path().join("d_output_vt.wav");
        assert!(kept.exists());
        assert_eq!(report.kept_intermediate, Some(kept));
    }

    #[test]
    fn fixed_rate_runs_two_passes() {
        let s = setup("e.wav");
        let mut config = TransformerConfig::default();
        config.pipeline.fixed_rate_conversion = true;
        let (ctl, engine) = controller(&config);
        assert!(ctl.config().pipeline.separate_prosody);

        ctl.convert(&s.item, &s.dir.path().join("e_output.wav"), &s.mapper, &s.codebook)
            .expect("convert");
        assert_eq!(engine.calls()[0].output, s.dir.path().join("e_output_vt.wav"));
    }

    #[test]
    fn fixed_rate_applies_only_to_vocal_tract_pass() {
        let s = setup("g.wav");
        let mut config = TransformerConfig::default();
        config.pipeline.fixed_rate_conversion = true;
        config.prosody.scales.time = vec![1.5];
        let (ctl, engine) = controller(&config);

        ctl.convert(&s.item, &s.dir.path().join("g_output.wav"), &s.mapper, &s.codebook)
            .expect("convert");

        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].fixed_rate);
        assert_eq!(calls[0].prosody.scales.time, vec![1.0]);
        assert!(!calls[1].fixed_rate);
        assert_eq!(calls[1].prosody.scales.time, vec![1.5]);
    }

    #[test]
    fn disabled_vocal_tract_passes_no_mapper() {
        let s = setup("f.wav");
        let mut config = TransformerConfig::default();
        config.pipeline.vocal_tract_transformation = false;
        let (ctl, engine) = controller(&config);

        ctl.convert(&s.item, &s.dir.path().join("f_output.wav"), &s.mapper, &s.codebook)
            .expect("convert");
        assert!(!engine.calls()[0].with_mapper);
    }

    #[test]
    fn engine_failure_names_the_stage() {
        let s = setup("bad.wav");
        let engine = Arc::new(MockResynthesizer::failing_on("bad"));
        let ctl = PassController::new(&TransformerConfig::default(), engine);

        let err = ctl
            .convert(&s.item, &s.dir.path().join("bad_output.wav"), &s.mapper, &s.codebook)
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::Engine {
                stage: "vocal-tract pass",
                ..
            }
        ));
    }
}
