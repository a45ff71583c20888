use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::acquire::{Acquirer, AcquirerFactory};
use crate::config::{Config, SyncConfig};
use crate::error::{DubError, ErrorKind, Result};
use crate::job::Job;
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::synthesize::{Synthesizer, SynthesizerFactory, VoiceProfile};
use crate::sync::{DubAction, DubPlan, TrackMixer};
use crate::transcribe::{Transcriber, TranscriberFactory};
use crate::translate::{Translator, TranslatorFactory};
use crate::workspace::ScopedWorkspace;

const DUB_FILE: &str = "dub.mp3";

/// Stages of one job, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Acquiring,
    Transcribing,
    Translating,
    Synthesizing,
    Reconciling,
    Mixing,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        Self::Acquiring,
        Self::Transcribing,
        Self::Translating,
        Self::Synthesizing,
        Self::Reconciling,
        Self::Mixing,
    ];

    /// 1-based position used in progress output
    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).map_or(0, |i| i + 1)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acquiring => "acquiring",
            Self::Transcribing => "transcribing",
            Self::Translating => "translating",
            Self::Synthesizing => "synthesizing",
            Self::Reconciling => "reconciling",
            Self::Mixing => "mixing",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the dub was fitted, as recorded in a report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub action: DubAction,
    pub required_ratio: f64,
    pub video_duration: f64,
    pub dub_duration: f64,
}

impl From<&DubPlan> for PlanSummary {
    fn from(plan: &DubPlan) -> Self {
        Self {
            action: plan.action,
            required_ratio: plan.required_ratio,
            video_duration: plan.video.duration,
            dub_duration: plan.dub.duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Done {
        output: PathBuf,
        plan: PlanSummary,
    },
    Failed {
        stage: PipelineStage,
        kind: ErrorKind,
        message: String,
    },
}

/// Result of running one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job: Job,
    pub outcome: JobOutcome,
    /// Stages that finished successfully, in order
    pub completed: Vec<PipelineStage>,
    /// Scratch directory left on disk when the job asked to keep it
    pub kept_workspace: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Done { .. })
    }

    pub fn failed_stage(&self) -> Option<PipelineStage> {
        match &self.outcome {
            JobOutcome::Failed { stage, .. } => Some(*stage),
            JobOutcome::Done { .. } => None,
        }
    }
}

/// Pipeline parameters that are not collaborators
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Language spoken in the source videos
    pub source_language: String,
    pub sync: SyncConfig,
    pub output_dir: PathBuf,
    /// Directory under which per-job workspaces are created
    pub temp_root: PathBuf,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_language: config.transcriber.source_language.clone(),
            sync: config.sync.clone(),
            output_dir: config.paths.output_dir.clone(),
            temp_root: config.paths.temp_dir.clone(),
        }
    }
}

/// External collaborators driven by the pipeline
pub struct PipelineComponents {
    pub acquirer: Box<dyn Acquirer>,
    pub transcriber: Box<dyn Transcriber>,
    pub translator: Box<dyn Translator>,
    pub synthesizer: Box<dyn Synthesizer>,
    pub media: Arc<dyn MediaProcessorTrait>,
    pub voices: VoiceProfile,
}

impl PipelineComponents {
    /// Default adapters for every collaborator
    pub fn from_config(config: &Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        Ok(Self {
            acquirer: AcquirerFactory::create_default(config.acquire.clone(), media.clone()),
            transcriber: TranscriberFactory::create_default(config.transcriber.clone()),
            translator: TranslatorFactory::create_translator(&config.translate)?,
            synthesizer: SynthesizerFactory::create_default(config.synthesize.clone(), media.clone()),
            voices: VoiceProfile::from_config(&config.synthesize),
            media,
        })
    }
}

/// Runs acquire, transcribe, translate, synthesize, reconcile and mix for one job
pub struct Pipeline {
    acquirer: Box<dyn Acquirer>,
    transcriber: Box<dyn Transcriber>,
    translator: Box<dyn Translator>,
    synthesizer: Box<dyn Synthesizer>,
    mixer: TrackMixer,
    voices: VoiceProfile,
    settings: PipelineSettings,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_components(
            PipelineComponents::from_config(config)?,
            PipelineSettings::from_config(config),
        ))
    }

    pub fn with_components(components: PipelineComponents, settings: PipelineSettings) -> Self {
        Self {
            acquirer: components.acquirer,
            transcriber: components.transcriber,
            translator: components.translator,
            synthesizer: components.synthesizer,
            mixer: TrackMixer::new(components.media, &settings.sync),
            voices: components.voices,
            settings,
            show_progress: false,
        }
    }

    /// Show a spinner with the current stage
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run `job` to completion. Never fails: errors are recorded in the report.
    pub async fn run(&self, job: &Job) -> JobReport {
        let started_at = Utc::now();
        info!("Starting job {} ({} -> {})", job.id, job.locator, job.target_language);

        let mut current = PipelineStage::Acquiring;
        let mut completed = Vec::new();
        let mut kept_workspace = None;

        let outcome = match ScopedWorkspace::create(&self.settings.temp_root, job) {
            Ok(workspace) => {
                let spinner = self.spinner();
                let result = self
                    .execute(job, &workspace, &spinner, &mut current, &mut completed)
                    .await;
                spinner.finish_and_clear();
                kept_workspace = workspace.release(job.keep_temp);
                result
            }
            Err(e) => Err(e),
        };

        let outcome = match outcome {
            Ok(done) => {
                if let JobOutcome::Done { output, .. } = &done {
                    info!("Job {} done: {}", job.id, output.display());
                }
                done
            }
            Err(e) => {
                error!("Job {} failed while {}: {}", job.id, current, e);
                JobOutcome::Failed {
                    stage: current,
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };

        JobReport {
            job: job.clone(),
            outcome,
            completed,
            kept_workspace,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn execute(
        &self,
        job: &Job,
        workspace: &ScopedWorkspace,
        spinner: &ProgressBar,
        current: &mut PipelineStage,
        completed: &mut Vec<PipelineStage>,
    ) -> Result<JobOutcome> {
        enter_stage(PipelineStage::Acquiring, current, spinner);
        let acquired = self.acquirer.acquire(&job.locator, workspace.path()).await?;
        completed.push(PipelineStage::Acquiring);

        enter_stage(PipelineStage::Transcribing, current, spinner);
        let transcript = self
            .transcriber
            .transcribe(&acquired.audio, &self.settings.source_language, workspace.path())
            .await?;
        completed.push(PipelineStage::Transcribing);

        enter_stage(PipelineStage::Translating, current, spinner);
        let translated = self
            .translator
            .translate(&transcript.text, &job.target_language)
            .await?;
        if translated.trim().is_empty() {
            return Err(DubError::Translation("translation came back empty".to_string()));
        }
        completed.push(PipelineStage::Translating);

        enter_stage(PipelineStage::Synthesizing, current, spinner);
        let voice = self.voices.voice_for(&job.target_language);
        let dub = self
            .synthesizer
            .synthesize(&translated, voice, &workspace.file(DUB_FILE))
            .await?;
        completed.push(PipelineStage::Synthesizing);

        enter_stage(PipelineStage::Reconciling, current, spinner);
        let plan = DubPlan::build(acquired.video, dub, self.settings.sync.max_scale)?;
        info!(
            "Video {:.2}s, dub {:.2}s, ratio {:.3}: {}",
            plan.video.duration,
            plan.dub.duration,
            plan.required_ratio,
            plan.action.name()
        );
        completed.push(PipelineStage::Reconciling);

        enter_stage(PipelineStage::Mixing, current, spinner);
        let output = self.settings.output_dir.join(job.resolved_output_name());
        let mixed = self
            .mixer
            .mix(&plan, self.settings.sync.original_volume, &output, workspace.path())
            .await?;
        completed.push(PipelineStage::Mixing);

        Ok(JobOutcome::Done {
            output: mixed.path,
            plan: PlanSummary::from(&plan),
        })
    }

    fn spinner(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }
}

fn enter_stage(stage: PipelineStage, current: &mut PipelineStage, spinner: &ProgressBar) {
    *current = stage;
    let label = format!("[{}/{}] {}", stage.number(), PipelineStage::ALL.len(), stage);
    info!("{}", label);
    spinner.set_message(label);
}
