use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use eye_adapters::{
    DeployError, DeployReceipt, DeployRequest, DeployResult, Deployer, MemoryClipboard,
};
use eye_config::WorkflowSettings;
use eye_kernel::{ConfigWorkflow, DeployPhase, DeployStatus, Notice, WorkflowError};
use eye_policy::{NOTIFICATION_LEVEL_MESSAGE, ValidationError, validate};
use eye_primitives::ConfigTemplate;
use eye_templates::TemplateCatalog;
use tokio::sync::Mutex;

const PANIC_LEVEL: &str = "security:\n  notification_level: \"panic\"\n";
const BLOCK_LEVEL: &str = "security:\n  notification_level: \"block\"\n";

/// Records every request and answers with a scripted outcome.
struct RecordingDeployer {
    calls: AtomicUsize,
    requests: Mutex<Vec<DeployRequest>>,
    failure: Option<DeployError>,
    delay: Duration,
}

impl RecordingDeployer {
    fn accepting(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            failure: None,
            delay,
        }
    }

    fn failing(failure: DeployError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::accepting(Duration::from_millis(5))
        }
    }
}

#[async_trait]
impl Deployer for RecordingDeployer {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deploy(&self, request: DeployRequest) -> DeployResult<DeployReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = request.deployment_id();
        self.requests.lock().await.push(request);
        tokio::time::sleep(self.delay).await;
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(DeployReceipt::accepted(id).with_message("applied")),
        }
    }
}

fn workflow_with(deployer: Arc<RecordingDeployer>) -> ConfigWorkflow {
    ConfigWorkflow::builder()
        .settings(WorkflowSettings::default().with_operator("secops@company.com"))
        .deployer(deployer)
        .build()
        .unwrap()
}

#[tokio::test]
async fn invalid_text_never_reaches_deployer() {
    let deployer = Arc::new(RecordingDeployer::accepting(Duration::ZERO));
    let mut workflow = workflow_with(deployer.clone());

    workflow.edit_text(PANIC_LEVEL);
    assert_eq!(
        workflow.errors(),
        [ValidationError::new(2, NOTIFICATION_LEVEL_MESSAGE)]
    );

    for _ in 0..3 {
        assert!(matches!(
            workflow.deploy(),
            Err(WorkflowError::ValidationFailed { .. })
        ));
        assert_eq!(workflow.phase(), DeployPhase::Idle);
    }
    assert_eq!(deployer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn valid_text_deploys_and_returns_to_idle() {
    let deployer = Arc::new(RecordingDeployer::accepting(Duration::from_millis(20)));
    let mut workflow = workflow_with(deployer.clone());

    workflow.edit_text(BLOCK_LEVEL);
    assert!(workflow.errors().is_empty());

    let status = workflow.deploy().unwrap();
    assert_eq!(workflow.phase(), DeployPhase::Deploying);

    let receipt = workflow.settle().await.unwrap().unwrap();
    assert_eq!(receipt.deployment_id(), status.deployment_id());
    assert_eq!(receipt.message(), Some("applied"));
    assert_eq!(workflow.phase(), DeployPhase::Idle);
    assert!(workflow.notice().is_none());

    let requests = deployer.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].config(), BLOCK_LEVEL);
    assert_eq!(requests[0].template(), Some("default"));
}

#[tokio::test]
async fn finished_deploy_frees_session_without_settle() {
    let deployer = Arc::new(RecordingDeployer::accepting(Duration::from_millis(20)));
    let mut workflow = workflow_with(deployer.clone());

    let first = workflow.deploy().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(workflow.phase(), DeployPhase::Idle);
    assert!(workflow.can_deploy());
    assert!(workflow.in_flight().is_none());

    let second = workflow.deploy().unwrap();
    assert!(matches!(second, DeployStatus::Started(id) if id != first.deployment_id()));
    assert_eq!(workflow.history().len(), 1);
    assert_eq!(
        workflow.history().latest().unwrap().deployment_id(),
        first.deployment_id()
    );

    workflow.settle().await.unwrap().unwrap();
    assert_eq!(workflow.history().len(), 2);
    assert_eq!(deployer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failure_folded_by_next_deploy_stays_visible() {
    let deployer = Arc::new(RecordingDeployer::failing(DeployError::network(
        "connection reset",
    )));
    let mut workflow = workflow_with(deployer);

    workflow.deploy().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(workflow.phase(), DeployPhase::Idle);
    assert!(workflow.notice().is_none());

    assert!(matches!(workflow.deploy().unwrap(), DeployStatus::Started(_)));
    assert!(matches!(
        workflow.notice(),
        Some(Notice::DeploymentFailed(DeployError::Network { .. }))
    ));
}

#[tokio::test]
async fn repeated_deploy_while_running_starts_nothing() {
    let deployer = Arc::new(RecordingDeployer::accepting(Duration::from_millis(30)));
    let mut workflow = workflow_with(deployer.clone());

    let first = workflow.deploy().unwrap();
    for _ in 0..5 {
        assert_eq!(
            workflow.deploy().unwrap(),
            DeployStatus::AlreadyInFlight(first.deployment_id())
        );
    }

    workflow.settle().await.unwrap().unwrap();
    assert_eq!(deployer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn selecting_each_builtin_template_matches_catalog() {
    let mut workflow = ConfigWorkflow::builder().build().unwrap();
    let names: Vec<String> = workflow
        .templates()
        .iter()
        .map(|template| template.name().to_owned())
        .collect();
    assert_eq!(names, ["default", "strict", "development"]);

    for name in &names {
        assert!(workflow.select_template(name));
        let expected = workflow.templates().get(name).unwrap().text().to_owned();
        assert_eq!(workflow.text(), expected);
        assert_eq!(workflow.errors(), validate(&expected).as_slice());
        assert!(!workflow.is_modified());
    }
}

#[tokio::test]
async fn unknown_template_leaves_edits_in_place() {
    let mut workflow = ConfigWorkflow::builder().build().unwrap();
    workflow.select_template("strict");
    workflow.edit_text(PANIC_LEVEL);

    assert!(!workflow.select_template("nonexistent"));
    assert_eq!(workflow.text(), PANIC_LEVEL);
    assert_eq!(workflow.active_template(), Some("strict"));
    assert_eq!(workflow.errors().len(), 1);
}

#[tokio::test]
async fn deployer_failure_returns_to_idle_with_notice() {
    let deployer = Arc::new(RecordingDeployer::failing(DeployError::rejected(
        "schema mismatch",
    )));
    let mut workflow = workflow_with(deployer.clone());

    workflow.deploy().unwrap();
    let err = workflow.settle().await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::DeploymentFailed {
            source: DeployError::Rejected { .. }
        }
    ));
    assert_eq!(workflow.phase(), DeployPhase::Idle);
    assert!(workflow.history().is_empty());
    assert!(matches!(
        workflow.notice(),
        Some(Notice::DeploymentFailed(DeployError::Rejected { .. }))
    ));

    // A new attempt clears the stale failure notice.
    workflow.deploy().unwrap();
    assert!(workflow.notice().is_none());
    workflow.settle().await.unwrap().unwrap_err();
    assert_eq!(deployer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cancelled_deploy_is_not_recorded() {
    let deployer = Arc::new(RecordingDeployer::accepting(Duration::from_secs(5)));
    let mut workflow = workflow_with(deployer);

    workflow.deploy().unwrap();
    assert!(workflow.cancel_deploy().unwrap());
    assert_eq!(workflow.phase(), DeployPhase::Idle);
    assert!(workflow.in_flight().is_none());
    assert!(workflow.history().is_empty());
}

#[tokio::test]
async fn history_tracks_each_accepted_deploy() {
    let deployer = Arc::new(RecordingDeployer::accepting(Duration::ZERO));
    let mut workflow = workflow_with(deployer);

    workflow.select_template("strict");
    let first = workflow.deploy().unwrap();
    workflow.settle().await.unwrap().unwrap();

    workflow.select_template("development");
    workflow.edit_text(format!("{}\n# tuned\n", workflow.text()));
    let second = workflow.deploy().unwrap();
    workflow.settle().await.unwrap().unwrap();

    let entries: Vec<_> = workflow.history().newest_first().collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].deployment_id(), second.deployment_id());
    assert_eq!(entries[0].template(), Some("development"));
    assert_eq!(
        entries[0].description(),
        "Deployed edited `development` configuration"
    );
    assert_eq!(entries[1].deployment_id(), first.deployment_id());
    assert_eq!(entries[1].description(), "Deployed `strict` template");
    assert!(entries.iter().all(|entry| entry.operator() == "secops@company.com"));
}

#[tokio::test]
async fn custom_catalog_seeds_session() {
    let catalog = TemplateCatalog::new(
        vec![
            ConfigTemplate::builder("baseline")
                .text(BLOCK_LEVEL)
                .build()
                .unwrap(),
            ConfigTemplate::builder("broken")
                .text(PANIC_LEVEL)
                .build()
                .unwrap(),
        ],
        "baseline",
    )
    .unwrap();

    let clipboard = Arc::new(MemoryClipboard::new());
    let mut workflow = ConfigWorkflow::builder()
        .catalog(catalog)
        .clipboard(clipboard.clone())
        .build()
        .unwrap();

    assert_eq!(workflow.active_template(), Some("baseline"));
    assert!(workflow.can_deploy());

    workflow.select_template("broken");
    assert!(!workflow.can_deploy());

    workflow.copy_to_clipboard().await.unwrap();
    assert_eq!(clipboard.contents().await.as_deref(), Some(PANIC_LEVEL));
}
