//! Session model and its state machine.
//!
//! Every mutation of a [`Session`] goes through one of the transition
//! methods below. Each one checks the current state first and refuses
//! illegal moves with [`PipelineError::Conflict`] (step transitions) or
//! [`PipelineError::InvalidState`] (session-level requests such as cancel),
//! leaving the session untouched on error.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Phase, SessionStatus, Stage, StageResults, Step, StepStatus};
use crate::error::{PipelineError, Result};

/// Timing and error bookkeeping for a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    /// Set at creation
    pub start_time: Timestamp,

    /// Set exactly once, when the session reaches a terminal status
    pub end_time: Option<Timestamp>,

    /// `end_time - start_time` in milliseconds, derived on every persist
    pub duration_ms: Option<i64>,

    /// Number of failed stages
    pub error_count: u32,
}

/// One complete workflow run for one business idea.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque unique identifier
    #[serde(rename = "sessionId")]
    pub id: String,

    /// The business idea being analyzed
    pub input: String,

    /// Whether the analyzers may improvise a spotlight idea
    #[serde(default)]
    pub lucky: bool,

    pub status: SessionStatus,

    pub current_step: Phase,

    /// 0-100, only ever grows
    pub progress: u8,

    /// One record per phase, in execution order
    pub steps: Vec<Step>,

    /// Stage outputs, present only for completed stages
    #[serde(default)]
    pub results: StageResults,

    pub metadata: SessionMetadata,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,
}

impl Session {
    /// Creates a new `active` session with every step `pending`.
    pub fn new(
        id: impl Into<String>,
        input: impl Into<String>,
        lucky: bool,
        now: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            input: input.into(),
            lucky,
            status: SessionStatus::Active,
            current_step: Phase::Initialization,
            progress: 0,
            steps: Phase::STEPS.iter().copied().map(Step::pending).collect(),
            results: StageResults::new(),
            metadata: SessionMetadata {
                start_time: now,
                end_time: None,
                duration_ms: None,
                error_count: 0,
            },
            created_at: now,
            updated_at: now,
        }
    }

    /// Looks up the step record for a phase.
    pub fn step(&self, name: Phase) -> Option<&Step> {
        self.steps.iter().find(|step| step.name == name)
    }

    fn step_mut(&mut self, name: Phase) -> Result<&mut Step> {
        let id = self.id.clone();
        self.steps
            .iter_mut()
            .find(|step| step.name == name)
            .ok_or_else(|| PipelineError::conflict(id, format!("no step named {}", name.as_str())))
    }

    fn check_step_transition(&self, name: Phase, next: StepStatus) -> Result<()> {
        let current = self
            .step(name)
            .map(|step| step.status)
            .ok_or_else(|| {
                PipelineError::conflict(&self.id, format!("no step named {}", name.as_str()))
            })?;
        if !current.can_transition_to(next) {
            return Err(PipelineError::conflict(
                &self.id,
                format!(
                    "step {} cannot move from {} to {}",
                    name.as_str(),
                    current.as_str(),
                    next.as_str()
                ),
            ));
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(PipelineError::conflict(
                &self.id,
                format!("session is {}", self.status.as_str()),
            ));
        }
        Ok(())
    }

    /// Moves a step to `in_progress`. Only allowed while the session is
    /// active; stage steps also advance `current_step`.
    pub fn begin_step(&mut self, name: Phase, now: Timestamp) -> Result<()> {
        self.ensure_active()?;
        self.check_step_transition(name, StepStatus::InProgress)?;
        if name.stage().is_some() && name < self.current_step {
            return Err(PipelineError::conflict(
                &self.id,
                format!(
                    "current step cannot regress from {} to {}",
                    self.current_step.as_str(),
                    name.as_str()
                ),
            ));
        }

        let step = self.step_mut(name)?;
        step.status = StepStatus::InProgress;
        step.start_time = Some(now);
        if name.stage().is_some() {
            self.current_step = name;
        }
        Ok(())
    }

    /// Moves an `in_progress` step to `completed`. For stage steps the output
    /// is recorded in `results` and progress advances to the stage checkpoint.
    ///
    /// A step already in flight may finish after the session was cancelled;
    /// its outcome is still recorded.
    pub fn complete_step(
        &mut self,
        name: Phase,
        data: Option<serde_json::Value>,
        now: Timestamp,
    ) -> Result<()> {
        let checkpoint = name.stage().map(|stage| stage.checkpoint());
        self.record_completion(name, data, checkpoint, now)
    }

    /// Like [`Session::complete_step`] for a stage step, but progress
    /// advances to `checkpoint` (capped at 100) instead of the stage default.
    pub fn complete_stage(
        &mut self,
        stage: Stage,
        data: serde_json::Value,
        checkpoint: u8,
        now: Timestamp,
    ) -> Result<()> {
        self.record_completion(stage.phase(), Some(data), Some(checkpoint.min(100)), now)
    }

    fn record_completion(
        &mut self,
        name: Phase,
        data: Option<serde_json::Value>,
        checkpoint: Option<u8>,
        now: Timestamp,
    ) -> Result<()> {
        self.check_step_transition(name, StepStatus::Completed)?;

        let step = self.step_mut(name)?;
        step.status = StepStatus::Completed;
        step.end_time = Some(now);
        step.data = data.clone();

        if let Some(stage) = name.stage() {
            self.results
                .insert(stage, data.unwrap_or(serde_json::Value::Null));
        }
        if let Some(checkpoint) = checkpoint {
            self.progress = self.progress.max(checkpoint);
        }
        Ok(())
    }

    /// Moves an `in_progress` step to `failed` with an error message.
    pub fn fail_step(
        &mut self,
        name: Phase,
        error: impl Into<String>,
        now: Timestamp,
    ) -> Result<()> {
        self.check_step_transition(name, StepStatus::Failed)?;

        let step = self.step_mut(name)?;
        step.status = StepStatus::Failed;
        step.end_time = Some(now);
        step.error = Some(error.into());
        Ok(())
    }

    /// Finalizes a successful run. Every stage must have completed.
    pub fn complete(&mut self, now: Timestamp) -> Result<()> {
        self.ensure_active()?;
        if let Some(stage) = Stage::ALL
            .iter()
            .find(|stage| !self.results.contains_key(stage))
        {
            return Err(PipelineError::conflict(
                &self.id,
                format!("stage {} has not completed", stage.as_str()),
            ));
        }

        self.status = SessionStatus::Completed;
        self.current_step = Phase::Completed;
        self.progress = 100;
        self.metadata.end_time = Some(now);
        Ok(())
    }

    /// Finalizes a run whose stage failed.
    pub fn fail(&mut self, now: Timestamp) -> Result<()> {
        self.ensure_active()?;
        self.status = SessionStatus::Failed;
        self.metadata.end_time = Some(now);
        self.metadata.error_count += 1;
        Ok(())
    }

    /// Requests cancellation. Only active sessions can be cancelled.
    pub fn cancel(&mut self, now: Timestamp) -> Result<()> {
        if self.status.is_terminal() {
            return Err(PipelineError::invalid_state(
                &self.id,
                format!("is already {}", self.status.as_str()),
            ));
        }
        self.status = SessionStatus::Cancelled;
        self.metadata.end_time = Some(now);
        Ok(())
    }

    /// Closes out a run that stopped without reaching a normal end: every
    /// `in_progress` step fails with `reason`, and an active session fails.
    /// Returns whether anything changed.
    pub fn abort(&mut self, reason: &str, now: Timestamp) -> Result<bool> {
        let stuck: Vec<Phase> = self
            .steps
            .iter()
            .filter(|step| step.status == StepStatus::InProgress)
            .map(|step| step.name)
            .collect();
        for name in &stuck {
            self.fail_step(*name, reason, now)?;
        }

        if self.status == SessionStatus::Active {
            self.fail(now)?;
            Ok(true)
        } else if !stuck.is_empty() {
            self.metadata.error_count += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Refreshes derived fields; called on every persist.
    pub fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
        self.metadata.duration_ms = self
            .metadata
            .end_time
            .map(|end| end.as_millisecond() - self.metadata.start_time.as_millisecond());
    }

    /// Number of stage steps that have completed.
    pub fn completed_stages(&self) -> usize {
        self.results.len()
    }
}
