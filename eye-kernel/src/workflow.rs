//! Template selection, validation, and deployment for one operator session.

use std::fmt;
use std::sync::Arc;

use eye_adapters::{
    Clipboard, ClipboardError, DeployError, DeployReceipt, DeployRequest, DeployResult, Deployer,
    MemoryClipboard, SimulatedDeployer,
};
use eye_config::WorkflowSettings;
use eye_policy::{ValidationError, Validator};
use eye_primitives::DeploymentId;
use eye_templates::TemplateCatalog;
use futures::FutureExt;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{WorkflowError, WorkflowResult};
use crate::history::{ConfigHistory, HistoryEntry};
use crate::phase::{DeployPhase, PhaseEvent, PhaseMachine};
use crate::scheduler::{DeployScheduler, SchedulerConfig};

/// Immediate answer to [`ConfigWorkflow::deploy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStatus {
    /// A new deployment was handed to the deployer.
    Started(DeploymentId),
    /// A deployment was already running; nothing new was started.
    AlreadyInFlight(DeploymentId),
}

impl DeployStatus {
    /// Identifier of the deployment now in flight.
    #[must_use]
    pub const fn deployment_id(self) -> DeploymentId {
        match self {
            Self::Started(id) | Self::AlreadyInFlight(id) => id,
        }
    }
}

/// Recoverable failure shown to the operator until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The last copy was refused.
    ClipboardDenied(ClipboardError),
    /// The last deployment failed.
    DeploymentFailed(DeployError),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClipboardDenied(err) => write!(f, "Copy failed: {err}"),
            Self::DeploymentFailed(err) => write!(f, "Deployment failed: {err}"),
        }
    }
}

struct InFlight {
    id: DeploymentId,
    template: Option<String>,
    modified: bool,
    handle: JoinHandle<DeployResult<DeployReceipt>>,
}

impl InFlight {
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    fn describe(&self) -> String {
        match (&self.template, self.modified) {
            (Some(template), false) => format!("Deployed `{template}` template"),
            (Some(template), true) => format!("Deployed edited `{template}` configuration"),
            (None, _) => "Deployed custom configuration".to_owned(),
        }
    }
}

/// State of one configuration panel session.
///
/// Owned by a single caller; every mutation goes through `&mut self`. The
/// only background work is the deploy task. Its outcome is folded back in by
/// [`ConfigWorkflow::settle`], by [`ConfigWorkflow::poll_deploy`], or at the
/// start of the next mutating call. A finished deploy reads as
/// [`DeployPhase::Idle`] even before it is folded; its history entry or
/// failure notice appears once it is.
pub struct ConfigWorkflow {
    catalog: TemplateCatalog,
    validator: Validator,
    deployer: Arc<dyn Deployer>,
    clipboard: Arc<dyn Clipboard>,
    scheduler: DeployScheduler,
    settings: WorkflowSettings,
    active_template: Option<String>,
    text: String,
    errors: Vec<ValidationError>,
    phase: PhaseMachine,
    // Some from Start until the outcome is folded in.
    in_flight: Option<InFlight>,
    copied_until: Option<Instant>,
    notice: Option<Notice>,
    history: ConfigHistory,
}

impl fmt::Debug for ConfigWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigWorkflow")
            .field("active_template", &self.active_template)
            .field("errors", &self.errors.len())
            .field("phase", &self.phase())
            .field("deployer", &self.deployer.name())
            .field("notice", &self.notice)
            .finish_non_exhaustive()
    }
}

impl ConfigWorkflow {
    /// Returns a builder with built-in templates and simulated collaborators.
    #[must_use]
    pub fn builder() -> WorkflowBuilder {
        WorkflowBuilder::default()
    }

    /// Opens a session with every default.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Scheduler`] when called outside a tokio
    /// runtime.
    pub fn open() -> WorkflowResult<Self> {
        Self::builder().build()
    }

    /// Loads the named template into the editor.
    ///
    /// Unknown names are ignored and leave the session untouched. Returns
    /// whether the template was applied.
    pub fn select_template(&mut self, name: &str) -> bool {
        self.poll_deploy();
        let Some(template) = self.catalog.get(name) else {
            debug!(template = name, "ignoring unknown template");
            return false;
        };

        let text = template.text().to_owned();
        self.active_template = Some(name.to_owned());
        self.set_text(text);
        debug!(template = name, errors = self.errors.len(), "template selected");
        true
    }

    /// Like [`ConfigWorkflow::select_template`] but reports unknown names.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UnknownTemplate`] when `name` is not in the
    /// catalog; the session is left untouched.
    pub fn try_select_template(&mut self, name: &str) -> WorkflowResult<()> {
        if self.select_template(name) {
            Ok(())
        } else {
            Err(WorkflowError::UnknownTemplate {
                name: name.to_owned(),
            })
        }
    }

    /// Replaces the editor content and revalidates. The active template name
    /// is kept even if the text no longer matches it.
    pub fn edit_text(&mut self, text: impl Into<String>) {
        self.poll_deploy();
        self.set_text(text.into());
    }

    /// Starts deploying the current text.
    ///
    /// Moves the phase to [`DeployPhase::Deploying`] before returning. Calling
    /// again while a deployment is running is a no-op; a deployment that has
    /// already finished is folded in first, so it never blocks the next one.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ValidationFailed`] when the text has findings
    /// (the deployer is not called and the phase stays idle), or
    /// [`WorkflowError::Scheduler`] when the scheduler is closed.
    pub fn deploy(&mut self) -> WorkflowResult<DeployStatus> {
        let just_failed = matches!(self.poll_deploy(), Some(Err(_)));
        if let Some(in_flight) = &self.in_flight {
            debug!(deployment_id = %in_flight.id, "deploy already in flight");
            return Ok(DeployStatus::AlreadyInFlight(in_flight.id));
        }

        if !self.errors.is_empty() {
            warn!(errors = self.errors.len(), "deploy blocked by validation errors");
            return Err(WorkflowError::ValidationFailed {
                errors: self.errors.clone(),
            });
        }

        let id = DeploymentId::random();
        let mut request = DeployRequest::new(id, self.text.clone());
        if let Some(template) = &self.active_template {
            request = request.with_template(template.clone());
        }

        self.phase.transition(PhaseEvent::Start)?;
        let handle = match self
            .scheduler
            .spawn_deploy(Arc::clone(&self.deployer), request)
        {
            Ok(handle) => handle,
            Err(err) => {
                self.phase.transition(PhaseEvent::Cancel)?;
                return Err(err.into());
            }
        };

        // A failure folded by this very call has not been shown yet.
        if !just_failed && matches!(self.notice, Some(Notice::DeploymentFailed(_))) {
            self.notice = None;
        }
        self.in_flight = Some(InFlight {
            id,
            template: self.active_template.clone(),
            modified: self.is_modified(),
            handle,
        });

        Ok(DeployStatus::Started(id))
    }

    /// Waits for the in-flight deployment and folds its result into the
    /// session. Returns `None` when nothing is deploying.
    ///
    /// Dropping the returned future early leaves the deployment in flight.
    pub async fn settle(&mut self) -> Option<WorkflowResult<DeployReceipt>> {
        let joined = match self.in_flight.as_mut() {
            Some(in_flight) => (&mut in_flight.handle).await,
            None => return None,
        };
        let in_flight = self.in_flight.take()?;
        Some(self.finish(&in_flight, joined))
    }

    /// Non-blocking variant of [`ConfigWorkflow::settle`]; returns `None`
    /// while the deployment is still running or when nothing is deploying.
    ///
    /// Front ends call this on every render tick to pick up the outcome,
    /// history entry, and notice of a deployment that finished in the
    /// background.
    pub fn poll_deploy(&mut self) -> Option<WorkflowResult<DeployReceipt>> {
        if !self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.handle.is_finished())
        {
            return None;
        }

        let mut in_flight = self.in_flight.take()?;
        if let Some(joined) = (&mut in_flight.handle).now_or_never() {
            Some(self.finish(&in_flight, joined))
        } else {
            self.in_flight = Some(in_flight);
            None
        }
    }

    /// Aborts the in-flight deployment, returning the phase to idle.
    ///
    /// Returns `false` when nothing was deploying. A deployment that already
    /// finished is folded in rather than cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Phase`] if phase bookkeeping is inconsistent.
    pub fn cancel_deploy(&mut self) -> WorkflowResult<bool> {
        self.poll_deploy();
        let Some(in_flight) = self.in_flight.take() else {
            return Ok(false);
        };

        in_flight.handle.abort();
        self.phase.transition(PhaseEvent::Cancel)?;
        info!(deployment_id = %in_flight.id, "deployment cancelled");
        Ok(true)
    }

    /// Copies the current text to the clipboard and lights the "copied"
    /// indicator.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ClipboardDenied`] when the clipboard refuses
    /// the write; the failure is also kept as the session notice.
    pub async fn copy_to_clipboard(&mut self) -> WorkflowResult<()> {
        self.poll_deploy();
        match self.clipboard.write_text(&self.text).await {
            Ok(()) => {
                self.copied_until = Some(Instant::now() + self.settings.copied_indicator());
                debug!(bytes = self.text.len(), "configuration copied");
                Ok(())
            }
            Err(source) => {
                warn!(error = %source, "clipboard write refused");
                self.copied_until = None;
                self.notice = Some(Notice::ClipboardDenied(source.clone()));
                Err(WorkflowError::ClipboardDenied { source })
            }
        }
    }

    /// Current editor content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Name of the last selected template.
    #[must_use]
    pub fn active_template(&self) -> Option<&str> {
        self.active_template.as_deref()
    }

    /// Findings for the current text, in line order.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Returns `true` when the current text has no findings.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Current deploy phase. Reads [`DeployPhase::Idle`] as soon as the
    /// deploy task has finished.
    #[must_use]
    pub fn phase(&self) -> DeployPhase {
        if self.in_flight.as_ref().is_some_and(InFlight::is_finished) {
            DeployPhase::Idle
        } else {
            self.phase.phase()
        }
    }

    /// Whether the deploy action should be offered.
    #[must_use]
    pub fn can_deploy(&self) -> bool {
        self.phase().is_idle() && self.is_valid()
    }

    /// Identifier of the running deployment.
    #[must_use]
    pub fn in_flight(&self) -> Option<DeploymentId> {
        self.in_flight
            .as_ref()
            .filter(|in_flight| !in_flight.is_finished())
            .map(|in_flight| in_flight.id)
    }

    /// Returns `true` when the text differs from the active template.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.active_template
            .as_deref()
            .and_then(|name| self.catalog.get(name))
            .is_none_or(|template| template.text() != self.text)
    }

    /// Returns `true` for a short while after a successful copy.
    #[must_use]
    pub fn is_copied(&self) -> bool {
        self.copied_until
            .is_some_and(|until| Instant::now() < until)
    }

    /// Last recoverable failure, if not yet dismissed.
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Clears the notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Templates offered in this session.
    #[must_use]
    pub fn templates(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Deployments accepted during this session.
    #[must_use]
    pub fn history(&self) -> &ConfigHistory {
        &self.history
    }

    /// Settings the session was opened with.
    #[must_use]
    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    fn set_text(&mut self, text: String) {
        self.errors = self.validator.validate(&text);
        self.text = text;
    }

    fn finish(
        &mut self,
        in_flight: &InFlight,
        joined: Result<DeployResult<DeployReceipt>, JoinError>,
    ) -> WorkflowResult<DeployReceipt> {
        let outcome = joined.unwrap_or_else(|err| {
            warn!(deployment_id = %in_flight.id, error = %err, "deploy task ended abnormally");
            Err(DeployError::Aborted)
        });

        match outcome {
            Ok(receipt) => {
                self.phase.transition(PhaseEvent::Finish)?;
                self.history.record(HistoryEntry::new(
                    in_flight.id,
                    receipt.accepted_at(),
                    self.settings.operator(),
                    in_flight.template.clone(),
                    in_flight.describe(),
                ));
                self.phase.transition(PhaseEvent::Reset)?;
                info!(deployment_id = %in_flight.id, "deployment finished");
                Ok(receipt)
            }
            Err(source) => {
                self.phase.transition(PhaseEvent::Fail)?;
                warn!(deployment_id = %in_flight.id, error = %source, "deployment failed");
                self.notice = Some(Notice::DeploymentFailed(source.clone()));
                Err(WorkflowError::DeploymentFailed { source })
            }
        }
    }
}

/// Builder for [`ConfigWorkflow`].
pub struct WorkflowBuilder {
    catalog: Option<TemplateCatalog>,
    validator: Option<Validator>,
    deployer: Option<Arc<dyn Deployer>>,
    clipboard: Option<Arc<dyn Clipboard>>,
    scheduler: Option<DeployScheduler>,
    settings: WorkflowSettings,
    history_limit: usize,
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self {
            catalog: None,
            validator: None,
            deployer: None,
            clipboard: None,
            scheduler: None,
            settings: WorkflowSettings::default(),
            history_limit: ConfigHistory::DEFAULT_LIMIT,
        }
    }
}

impl WorkflowBuilder {
    /// Uses a custom template set instead of the built-in one.
    #[must_use]
    pub fn catalog(mut self, catalog: TemplateCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Uses a custom validator instead of [`Validator::standard`].
    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Sets the deployment backend. Defaults to a [`SimulatedDeployer`] using
    /// the settings' deploy delay.
    #[must_use]
    pub fn deployer(mut self, deployer: Arc<dyn Deployer>) -> Self {
        self.deployer = Some(deployer);
        self
    }

    /// Sets the clipboard. Defaults to a [`MemoryClipboard`].
    #[must_use]
    pub fn clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Uses an existing scheduler instead of one bound to the current runtime.
    #[must_use]
    pub fn scheduler(mut self, scheduler: DeployScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Sets timings and operator identity.
    #[must_use]
    pub fn settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Caps the number of history entries kept.
    #[must_use]
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Opens the session, seeded with the catalog's default template.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Scheduler`] when no scheduler was supplied and
    /// no tokio runtime is running.
    pub fn build(self) -> WorkflowResult<ConfigWorkflow> {
        let scheduler = match self.scheduler {
            Some(scheduler) => scheduler,
            None => DeployScheduler::new(SchedulerConfig::default())?,
        };
        let deployer: Arc<dyn Deployer> = match self.deployer {
            Some(deployer) => deployer,
            None => Arc::new(SimulatedDeployer::new(self.settings.deploy_delay())),
        };
        let clipboard: Arc<dyn Clipboard> = match self.clipboard {
            Some(clipboard) => clipboard,
            None => Arc::new(MemoryClipboard::new()),
        };
        let catalog = self.catalog.unwrap_or_default();
        let validator = self.validator.unwrap_or_default();

        let seed = catalog.default_template();
        let active_template = Some(seed.name().to_owned());
        let text = seed.text().to_owned();
        let errors = validator.validate(&text);

        debug!(
            template = seed.name(),
            deployer = deployer.name(),
            errors = errors.len(),
            "configuration session opened"
        );

        Ok(ConfigWorkflow {
            catalog,
            validator,
            deployer,
            clipboard,
            scheduler,
            settings: self.settings,
            active_template,
            text,
            errors,
            phase: PhaseMachine::new(),
            in_flight: None,
            copied_until: None,
            notice: None,
            history: ConfigHistory::with_limit(self.history_limit),
        })
    }
}
