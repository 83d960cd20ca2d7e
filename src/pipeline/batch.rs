//! Batch transformer: converts every WAV file of a folder with one codebook.
//!
//! # Run flow
//!
//! ```text
//! preflight (fatal)   codebook header · input folder · pitch statistics · mapper params
//!      │
//! build sets          <in>/*.wav  →  <out>[/<parameter folder>]/<stem><suffix>.wav
//!      │
//! once per run        Preprocessor::run · FeatureExtractor::run · read entries · build mapper
//!      │
//! per item            PassController::convert  → ItemOutcome (Converted | Failed)
//!                     sequential, or spawn_blocking workers bounded by a Semaphore
//! ```
//!
//! The parallel path builds its own tokio runtime, so [`BatchTransformer::run`]
//! must be called from synchronous code.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::adaptation::{AdaptationItem, AdaptationSet, WAV_EXTENSION};
use crate::codebook::{Codebook, CodebookFile};
use crate::config::{resolve_output_folder, TransformerConfig};
use crate::engine::{OverlapAddRenderer, Resynthesizer};
use crate::features::{
    AnalysisRequest, AutocorrelationPitchExtractor, FeatureExtractor, NoopPreprocessor,
    Preprocessor,
};
use crate::mapper::CodebookMapper;

use super::error::TransformError;
use super::pass::PassController;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Converted,
    Failed { error: String },
}

/// Result of one item, attributable by `index` into the sorted input list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub index: usize,
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn is_converted(&self) -> bool {
        self.status == ItemStatus::Converted
    }
}

/// Outcomes of a whole run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub output_folder: PathBuf,
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items converted successfully.
    pub fn converted(&self) -> usize {
        self.items.iter().filter(|o| o.is_converted()).count()
    }

    /// Number of items that failed.
    pub fn failed(&self) -> usize {
        self.len() - self.converted()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|o| !o.is_converted())
    }

    /// Write the report as pretty JSON, creating parent directories as needed.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BatchTransformer
// ---------------------------------------------------------------------------

/// One unit of work for the item loop.
struct Job {
    index: usize,
    input: AdaptationItem,
    output: PathBuf,
}

pub struct BatchTransformer {
    config: TransformerConfig,
    preprocessor: Arc<dyn Preprocessor>,
    extractor: Arc<dyn FeatureExtractor>,
    engine: Arc<dyn Resynthesizer>,
}

impl BatchTransformer {
    pub fn new(
        config: &TransformerConfig,
        preprocessor: Arc<dyn Preprocessor>,
        extractor: Arc<dyn FeatureExtractor>,
        engine: Arc<dyn Resynthesizer>,
    ) -> Self {
        Self {
            config: config.normalized(),
            preprocessor,
            extractor,
            engine,
        }
    }

    /// Built-in collaborators: no preprocessing, autocorrelation pitch
    /// tracks, overlap-add rendering.
    pub fn with_defaults(config: &TransformerConfig) -> Self {
        Self::new(
            config,
            Arc::new(NoopPreprocessor),
            Arc::new(AutocorrelationPitchExtractor::default()),
            Arc::new(OverlapAddRenderer::default()),
        )
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Convert every `*.wav` in `input_folder` with the codebook at
    /// `codebook_path`.
    ///
    /// # Errors
    ///
    /// Only preflight and once-per-run steps are fatal.  Failures of single
    /// items are recorded in the returned [`BatchReport`].
    pub fn run(
        &self,
        input_folder: &Path,
        output_folder: &Path,
        codebook_path: &Path,
    ) -> Result<BatchReport, TransformError> {
        // ── 1. Preflight ─────────────────────────────────────────────────
        self.config
            .validate()
            .map_err(|e| TransformError::Config(format!("{e:#}")))?;

        if !codebook_path.is_file() {
            return Err(TransformError::Config(format!(
                "codebook {} does not exist",
                codebook_path.display()
            )));
        }
        let mut codebook_file = CodebookFile::open(codebook_path)?;
        let header = codebook_file.read_header()?;

        if !input_folder.is_dir() {
            return Err(TransformError::Config(format!(
                "input folder {} does not exist or is not a directory",
                input_folder.display()
            )));
        }

        if self.config.prosody.transformation_method.is_transformation() && header.pitch.is_none()
        {
            return Err(TransformError::Config(format!(
                "pitch transformation {:?} requested but codebook {} has no pitch statistics",
                self.config.prosody.transformation_method,
                codebook_path.display()
            )));
        }

        self.config.mapper.validated()?;

        let output_folder = resolve_output_folder(output_folder, &self.config);
        std::fs::create_dir_all(&output_folder)?;

        // ── 2. Item sets ─────────────────────────────────────────────────
        let inputs = AdaptationSet::from_folder(input_folder, WAV_EXTENSION)?;
        if inputs.is_empty() {
            log::warn!(
                "batch: no .{WAV_EXTENSION} files in {}, nothing to do",
                input_folder.display()
            );
            return Ok(BatchReport {
                output_folder,
                items: Vec::new(),
            });
        }
        let outputs = inputs.derive_outputs(&output_folder, &self.config.output.suffix);
        log::info!(
            "batch: {} files from {} into {}",
            inputs.len(),
            input_folder.display(),
            output_folder.display()
        );

        // ── 3. Shared preprocessing and analysis ─────────────────────────
        self.preprocessor.run(&inputs)?;
        let summary = self.extractor.run(
            &inputs,
            &AnalysisRequest {
                window_size_secs: header.window_size_secs,
                skip_size_secs: header.skip_size_secs,
                forced: self.config.pipeline.forced_reanalysis,
            },
        )?;
        log::info!(
            "batch: features analysed {}, reused {}, failed {}",
            summary.analysed,
            summary.reused,
            summary.failed
        );

        let codebook = Arc::new(codebook_file.read_entries()?);
        let mapper = Arc::new(CodebookMapper::new(self.config.mapper.clone(), &codebook)?);
        log::info!(
            "batch: codebook {} ({} entries, LP order {})",
            codebook_path.display(),
            codebook.len(),
            codebook.lp_order()
        );

        // ── 4. Items ─────────────────────────────────────────────────────
        let jobs: Vec<Job> = inputs
            .items
            .into_iter()
            .zip(outputs.items)
            .enumerate()
            .map(|(index, (input, output))| Job {
                index,
                input,
                output: output.audio_file,
            })
            .collect();

        let controller = Arc::new(PassController::new(&self.config, Arc::clone(&self.engine)));
        let items = if self.config.workers > 1 {
            self.run_parallel(jobs, controller, mapper, codebook)?
        } else {
            run_sequential(jobs, &controller, &mapper, &codebook)
        };

        let report = BatchReport {
            output_folder,
            items,
        };
        log::info!(
            "batch: transformation completed, {} converted, {} failed",
            report.converted(),
            report.failed()
        );
        Ok(report)
    }

    fn run_parallel(
        &self,
        jobs: Vec<Job>,
        controller: Arc<PassController>,
        mapper: Arc<CodebookMapper>,
        codebook: Arc<Codebook>,
    ) -> Result<Vec<ItemOutcome>, TransformError> {
        let workers = self.config.workers;
        let total = jobs.len();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("codebook-vc-worker")
            .build()?;

        runtime.block_on(async move {
            let semaphore = Arc::new(Semaphore::new(workers));
            let finished = Arc::new(AtomicUsize::new(0));
            let mut handles = Vec::with_capacity(total);

            for job in jobs {
                let permit = Arc::clone(&semaphore)
                    .acquire_owned()
                    .await
                    .map_err(|e| TransformError::Internal(e.to_string()))?;
                let placeholder = (job.index, job.input.audio_file.clone(), job.output.clone());

                let controller = Arc::clone(&controller);
                let mapper = Arc::clone(&mapper);
                let codebook = Arc::clone(&codebook);
                let finished = Arc::clone(&finished);

                let handle = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    let outcome = convert_item(&controller, &job, &mapper, &codebook);
                    let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
                    log::info!("Transformed file {done} of {total}");
                    outcome
                });
                handles.push((placeholder, handle));
            }

            let mut outcomes = Vec::with_capacity(total);
            for ((index, input, output), handle) in handles {
                match handle.await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        log::warn!("batch: worker for {} panicked: {e}", input.display());
                        outcomes.push(ItemOutcome {
                            index,
                            input,
                            output,
                            status: ItemStatus::Failed {
                                error: format!("worker panicked: {e}"),
                            },
                        });
                    }
                }
            }
            outcomes.sort_by_key(|o| o.index);
            Ok(outcomes)
        })
    }
}

fn run_sequential(
    jobs: Vec<Job>,
    controller: &PassController,
    mapper: &CodebookMapper,
    codebook: &Codebook,
) -> Vec<ItemOutcome> {
    let total = jobs.len();
    jobs.iter()
        .map(|job| {
            let outcome = convert_item(controller, job, mapper, codebook);
            log::info!("Transformed file {} of {total}", job.index + 1);
            outcome
        })
        .collect()
}

fn convert_item(
    controller: &PassController,
    job: &Job,
    mapper: &CodebookMapper,
    codebook: &Codebook,
) -> ItemOutcome {
    let status = match controller.convert(&job.input, &job.output, mapper, codebook) {
        Ok(_) => ItemStatus::Converted,
        Err(e) => {
            log::warn!("batch: {} failed: {e}", job.input.audio_file.display());
            ItemStatus::Failed {
                error: e.to_string(),
            }
        }
    };
    ItemOutcome {
        index: job.index,
        input: job.input.audio_file.clone(),
        output: job.output.clone(),
        status,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{read_wav, write_wav, MonoAudio};
    use crate::codebook::{CodebookEntry, CodebookHeader, CodebookPitchStatistics};
    use crate::engine::{EngineError, MockResynthesizer, ResynthesisRequest};
    use crate::features::{ExtractionSummary, FeatureError};
    use crate::prosody::{PitchTransformationMethod, SpeakerPitchStatistics};
    use std::f64::consts::PI;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    const SR: u32 = 8_000;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Counts runs without touching any file.
    #[derive(Default)]
    struct CountingExtractor {
        runs: Mutex<Vec<usize>>,
    }

    impl FeatureExtractor for CountingExtractor {
        fn run(
            &self,
            set: &AdaptationSet,
            _request: &AnalysisRequest,
        ) -> Result<ExtractionSummary, FeatureError> {
            if let Ok(mut runs) = self.runs.lock() {
                runs.push(set.len());
            }
            Ok(ExtractionSummary {
                analysed: set.len(),
                ..ExtractionSummary::default()
            })
        }
    }

    /// Panics on inputs whose name contains "boom".
    struct PanickingEngine;

    impl Resynthesizer for PanickingEngine {
        fn render(&self, request: &ResynthesisRequest<'_>) -> Result<(), EngineError> {
            if request.input.to_string_lossy().contains("boom") {
                panic!("engine exploded");
            }
            std::fs::copy(request.input, request.output)?;
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    struct Workspace {
        dir: TempDir,
        input: PathBuf,
        output: PathBuf,
        codebook: PathBuf,
    }

    fn workspace(with_pitch: bool, files: &[&str]) -> Workspace {
        let dir = tempdir().expect("temp dir");
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).expect("mkdir");

        for name in files {
            let samples: Vec<f64> = (0..SR as usize / 4)
                .map(|n| 0.3 * (2.0 * PI * 200.0 * n as f64 / SR as f64).sin())
                .collect();
            write_wav(&input.join(name), &MonoAudio::new(samples, SR)).expect("write wav");
        }

        let mut header = CodebookHeader::new(4, SR, 0.032, 0.016);
        if with_pitch {
            header.pitch = Some(CodebookPitchStatistics {
                source: SpeakerPitchStatistics::default(),
                target: SpeakerPitchStatistics::default(),
            });
        }
        let codebook = Codebook::new(
            header,
            vec![
                CodebookEntry::new(
                    vec![400.0, 900.0, 1_800.0, 2_600.0],
                    vec![1.0; 4],
                    vec![450.0, 1_000.0, 1_900.0, 2_800.0],
                    vec![1.0; 4],
                ),
                CodebookEntry::new(
                    vec![300.0, 1_200.0, 2_200.0, 3_100.0],
                    vec![1.0; 4],
                    vec![320.0, 1_250.0, 2_300.0, 3_200.0],
                    vec![1.0; 4],
                ),
            ],
        )
        .expect("codebook");
        let codebook_path = dir.path().join("voice.wcf");
        codebook.save_to(&codebook_path).expect("save codebook");

        Workspace {
            output: dir.path().join("out"),
            input,
            codebook: codebook_path,
            dir,
        }
    }

    fn mock_transformer(
        config: &TransformerConfig,
        engine: Arc<dyn Resynthesizer>,
    ) -> (BatchTransformer, Arc<CountingExtractor>) {
        let extractor = Arc::new(CountingExtractor::default());
        let transformer =
            BatchTransformer::new(config, Arc::new(NoopPreprocessor), extractor.clone(), engine);
        (transformer, extractor)
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    fn failed_item_does_not_stop_the_batch() {
        let ws = workspace(false, &["a.wav", "b_bad.wav", "c.wav"]);
        let (transformer, extractor) = mock_transformer(
            &TransformerConfig::default(),
            Arc::new(MockResynthesizer::failing_on("bad")),
        );

        let report = transformer
            .run(&ws.input, &ws.output, &ws.codebook)
            .expect("run");

        assert_eq!(report.len(), 3);
        assert_eq!(report.converted(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.items[1].index, 1);
        assert!(matches!(report.items[1].status, ItemStatus::Failed { .. }));
        assert!(ws.output.join("a_output.wav").exists());
        assert!(ws.output.join("c_output.wav").exists());
        assert!(!ws.output.join("b_bad_output.wav").exists());

        // Analysis ran once over the whole set.
        assert_eq!(*extractor.runs.lock().expect("lock"), vec![3]);
    }

    #[test]
    fn outputs_follow_input_order_and_suffix() {
        let ws = workspace(false, &["z.wav", "m.WAV", "a.wav"]);
        std::fs::write(ws.input.join("notes.txt"), "skip me").expect("write");

        let mut config = TransformerConfig::default();
        config.output.suffix = "_conv".into();
        let (transformer, _) = mock_transformer(&config, Arc::new(MockResynthesizer::default()));

        let report = transformer
            .run(&ws.input, &ws.output, &ws.codebook)
            .expect("run");
        let outputs: Vec<PathBuf> = report.items.iter().map(|o| o.output.clone()).collect();
        assert_eq!(
            outputs,
            vec![
                ws.output.join("a_conv.wav"),
                ws.output.join("m_conv.wav"),
                ws.output.join("z_conv.wav"),
            ]
        );
    }

    #[test]
    fn parameter_subfolder_is_created() {
        let ws = workspace(false, &["a.wav"]);
        let mut config = TransformerConfig::default();
        config.output.parameter_subfolder = true;
        config.output.info_string = "test".into();
        let (transformer, _) = mock_transformer(&config, Arc::new(MockResynthesizer::default()));

        let report = transformer
            .run(&ws.input, &ws.output, &ws.codebook)
            .expect("run");
        let folder = ws
            .output
            .join("test_best3_steep1_prosodyHertzxNoTransformation");
        assert_eq!(report.output_folder, folder);
        assert!(folder.join("a_output.wav").exists());
    }

    #[test]
    fn empty_input_folder_returns_empty_report() {
        let ws = workspace(false, &[]);
        let (transformer, extractor) = mock_transformer(
            &TransformerConfig::default(),
            Arc::new(MockResynthesizer::default()),
        );

        let report = transformer
            .run(&ws.input, &ws.output, &ws.codebook)
            .expect("run");
        assert!(report.is_empty());
        assert!(extractor.runs.lock().expect("lock").is_empty());
    }

    #[test]
    fn preflight_errors_are_fatal() {
        let ws = workspace(false, &["a.wav"]);
        let engine = Arc::new(MockResynthesizer::default());

        // Missing codebook.
        let (transformer, _) = mock_transformer(&TransformerConfig::default(), engine.clone());
        let err = transformer
            .run(&ws.input, &ws.output, &ws.dir.path().join("absent.wcf"))
            .unwrap_err();
        assert!(matches!(err, TransformError::Config(_)));

        // Codebook with a bad header.
        let junk = ws.dir.path().join("junk.wcf");
        std::fs::write(&junk, b"not a codebook").expect("write");
        let err = transformer.run(&ws.input, &ws.output, &junk).unwrap_err();
        assert!(matches!(err, TransformError::Codebook(_)));

        // Input folder missing.
        let err = transformer
            .run(&ws.dir.path().join("nowhere"), &ws.output, &ws.codebook)
            .unwrap_err();
        assert!(matches!(err, TransformError::Config(_)));

        // Pitch transformation without codebook pitch statistics.
        let mut config = TransformerConfig::default();
        config.prosody.transformation_method = PitchTransformationMethod::GlobalMean;
        let (transformer, _) = mock_transformer(&config, engine.clone());
        let err = transformer
            .run(&ws.input, &ws.output, &ws.codebook)
            .unwrap_err();
        assert!(matches!(err, TransformError::Config(_)));

        // Invalid mapper parameters.
        let mut config = TransformerConfig::default();
        config.mapper.num_best_matches = 0;
        let (transformer, _) = mock_transformer(&config, engine.clone());
        let err = transformer
            .run(&ws.input, &ws.output, &ws.codebook)
            .unwrap_err();
        assert!(matches!(err, TransformError::Mapper(_)));

        // Nothing was converted by any of the failed runs.
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn pitch_transformation_passes_preflight_with_statistics() {
        let ws = workspace(true, &["a.wav"]);
        let mut config = TransformerConfig::default();
        config.prosody.transformation_method = PitchTransformationMethod::GlobalMean;
        let (transformer, _) = mock_transformer(&config, Arc::new(MockResynthesizer::default()));

        let report = transformer
            .run(&ws.input, &ws.output, &ws.codebook)
            .expect("run");
        assert_eq!(report.converted(), 1);
    }

    #[test]
    fn parallel_run_matches_sequential_order() {
        let names = ["a.wav", "b.wav", "c_bad.wav", "d.wav", "e.wav"];
        let ws = workspace(false, &names);
        let mut config = TransformerConfig::default();
        config.workers = 3;
        let (transformer, _) = mock_transformer(
            &config,
            Arc::new(MockResynthesizer::failing_on("bad")),
        );

        let report = transformer
            .run(&ws.input, &ws.output, &ws.codebook)
            .expect("run");
        let indices: Vec<usize> = report.items.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures().next().map(|o| o.index), Some(2));
        for (outcome, name) in report.items.iter().zip(names) {
            assert_eq!(outcome.input, ws.input.join(name));
        }
    }

    #[test]
    fn panicking_worker_becomes_failed_outcome() {
        let ws = workspace(false, &["a.wav", "boom.wav", "c.wav"]);
        let mut config = TransformerConfig::default();
        config.workers = 2;
        let (transformer, _) = mock_transformer(&config, Arc::new(PanickingEngine));

        let report = transformer
            .run(&ws.input, &ws.output, &ws.codebook)
            .expect("run");
        assert_eq!(report.converted(), 2);
        match &report.items[1].status {
            ItemStatus::Failed { error } => assert!(error.contains("panicked")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn report_round_trips_through_json() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("reports").join("run.json");
        let report = BatchReport {
            output_folder: PathBuf::from("/out"),
            items: vec![
                ItemOutcome {
                    index: 0,
                    input: PathBuf::from("/in/a.wav"),
                    output: PathBuf::from("/out/a_output.wav"),
                    status: ItemStatus::Converted,
                },
                ItemOutcome {
                    index: 1,
                    input: PathBuf::from("/in/b.wav"),
                    output: PathBuf::from("/out/b_output.wav"),
                    status: ItemStatus::Failed {
                        error: "vocal-tract pass failed".into(),
                    },
                },
            ],
        };

        report.save_json(&path).expect("save");
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("\"status\": \"failed\""));
        let loaded: BatchReport = serde_json::from_str(&text).expect("parse");
        assert_eq!(loaded, report);
    }

    #[test]
    fn corrupted_wav_fails_alone_with_builtin_collaborators() {
        let ws = workspace(false, &["a.wav", "c.wav"]);
        std::fs::write(ws.input.join("b.wav"), b"RIFF\x10\x00\x00\x00garbage").expect("write");
        let mut config = TransformerConfig::default();
        config.mapper.freq_range = 0.0;

        let report = BatchTransformer::with_defaults(&config)
            .run(&ws.input, &ws.output, &ws.codebook)
            .expect("run");

        let converted: Vec<bool> = report.items.iter().map(ItemOutcome::is_converted).collect();
        assert_eq!(converted, vec![true, false, true]);
        assert_eq!(report.items[1].input, ws.input.join("b.wav"));
        assert!(ws.output.join("a_output.wav").exists());
        assert!(ws.output.join("c_output.wav").exists());
        assert!(!ws.output.join("b_output.wav").exists());
    }

    #[test]
    fn fixed_rate_conversion_still_scales_duration() {
        let ws = workspace(false, &["s01.wav"]);
        let mut config = TransformerConfig::default();
        config.mapper.freq_range = 0.0;
        config.pipeline.fixed_rate_conversion = true;
        config.prosody.scales.time = vec![1.5];

        let report = BatchTransformer::with_defaults(&config)
            .run(&ws.input, &ws.output, &ws.codebook)
            .expect("run");
        assert_eq!(report.converted(), 1, "{:?}", report.items);

        let input = read_wav(&ws.input.join("s01.wav")).expect("read input");
        let output = read_wav(&ws.output.join("s01_output.wav")).expect("read output");
        let ratio = output.samples.len() as f64 / input.samples.len() as f64;
        assert!((ratio - 1.5).abs() < 0.1, "ratio {ratio}");
        assert!(!ws.output.join("s01_output_vt.wav").exists());
    }

    #[test]
    fn end_to_end_with_builtin_collaborators() {
        let ws = workspace(false, &["s01.wav", "s02.wav"]);
        let mut config = TransformerConfig::default();
        config.mapper.freq_range = 0.0;
        config.pipeline.separate_prosody = true;
        config.prosody.scales.energy = vec![0.5];

        let report = BatchTransformer::with_defaults(&config)
            .run(&ws.input, &ws.output, &ws.codebook)
            .expect("run");

        assert_eq!(report.converted(), 2, "{:?}", report.items);
        for name in ["s01", "s02"] {
            assert!(ws.input.join(format!("{name}.ptc")).exists());
            let out = read_wav(&ws.output.join(format!("{name}_output.wav"))).expect("read");
            assert_eq!(out.sample_rate, SR);
            assert!(!out.samples.is_empty());
            assert!(!ws.output.join(format!("{name}_output_vt.wav")).exists());
        }
    }
}
