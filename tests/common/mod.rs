use std::sync::Arc;

use buildsmart::auth::MemorySessionStore;
use buildsmart::config::AppConfig;
use buildsmart::models::{ApprovalStatus, ApprovalStep, Document, Project, ProjectStatus};
use buildsmart::scheduler::{ManualScheduler, Scheduler, TokioScheduler};
use buildsmart::seed;
use buildsmart::storage::ProjectCatalog;
use buildsmart::AppState;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;

pub const MB: u64 = 1024 * 1024;

pub static START: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(2023, 5, 1, 9, 0, 0).unwrap());

pub struct TestApp {
    pub state: AppState,
    pub catalog: Arc<ProjectCatalog>,
    clock: Option<Arc<ManualScheduler>>,
}

impl TestApp {
    /// Seeded data on a manual clock: every delay resolves immediately.
    pub fn new() -> Self {
        Self::build(AppConfig::default(), seed::projects(), true)
    }

    #[allow(dead_code)]
    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, seed::projects(), true)
    }

    #[allow(dead_code)]
    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self::build(AppConfig::default(), projects, true)
    }

    /// Seeded data on tokio's clock, for tests running with paused time.
    #[allow(dead_code)]
    pub fn on_tokio_clock(config: AppConfig) -> Self {
        Self::build(config, seed::projects(), false)
    }

    fn build(config: AppConfig, projects: Vec<Project>, manual: bool) -> Self {
        let catalog = Arc::new(ProjectCatalog::new(projects));
        let clock = manual.then(|| Arc::new(ManualScheduler::new(*START)));
        let scheduler: Arc<dyn Scheduler> = match &clock {
            Some(clock) => clock.clone(),
            None => Arc::new(TokioScheduler),
        };
        let state = AppState::new(
            config,
            catalog.clone(),
            scheduler,
            Arc::new(MemorySessionStore::default()),
        );
        Self {
            state,
            catalog,
            clock,
        }
    }

    #[allow(dead_code)]
    pub fn clock(&self) -> Arc<ManualScheduler> {
        self.clock
            .clone()
            .expect("test app is running on the tokio clock")
    }
}

fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 4, 20).unwrap()
}

/// A single-stage document whose step already carries `status`.
#[allow(dead_code)]
pub fn fixture_document(project_id: &str, suffix: &str, status: ApprovalStatus) -> Document {
    let id = format!("{project_id}-{suffix}");
    let mut step = ApprovalStep::pending(format!("{id}-step1"), seed::INITIAL_REVIEW);
    if status.is_decided() {
        step.status = status;
        step.approver = seed::users().into_iter().next();
        step.date = Some(fixture_date());
        step.comments = Some("Reviewed".to_string());
    }
    Document {
        id,
        name: format!("Fixture {suffix}"),
        project_id: project_id.to_string(),
        status,
        uploaded_by: "3".to_string(),
        upload_date: fixture_date(),
        doc_type: "drawing".to_string(),
        approval_steps: vec![step],
    }
}

#[allow(dead_code)]
pub fn fixture_project(id: &str, statuses: &[ApprovalStatus]) -> Project {
    Project {
        id: id.to_string(),
        name: format!("Fixture Project {id}"),
        description: "Project used by integration tests".to_string(),
        status: ProjectStatus::Active,
        progress: 50,
        documents: statuses
            .iter()
            .enumerate()
            .map(|(index, status)| fixture_document(id, &format!("doc{}", index + 1), *status))
            .collect(),
    }
}
