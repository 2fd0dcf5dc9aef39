use std::sync::Arc;

use crate::{
    auth::{AuthService, MemorySessionStore, SessionStore},
    config::AppConfig,
    dashboard::Dashboard,
    events::EventBus,
    notifications::NotificationCenter,
    scheduler::{Scheduler, TokioScheduler},
    storage::{MockDataProvider, ProjectCatalog, ProjectQuery},
    upload::{UploadSession, UploadTarget},
    workflow::ApprovalWorkflow,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<ProjectCatalog>,
    pub query: Arc<dyn ProjectQuery>,
    pub workflow: ApprovalWorkflow,
    pub auth: AuthService,
    pub scheduler: Arc<dyn Scheduler>,
    pub events: EventBus,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        catalog: Arc<ProjectCatalog>,
        scheduler: Arc<dyn Scheduler>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let events = EventBus::new();
        let query: Arc<dyn ProjectQuery> = Arc::new(MockDataProvider::new(
            catalog.clone(),
            scheduler.clone(),
            config.list_delay,
            config.lookup_delay,
        ));
        let workflow = ApprovalWorkflow::new(catalog.clone(), scheduler.clone());
        let auth = AuthService::new(session, scheduler.clone(), events.clone(), config.auth_delay);

        Self {
            config: Arc::new(config),
            catalog,
            query,
            workflow,
            auth,
            scheduler,
            events,
        }
    }

    /// Seeded catalog on the real clock with an in-memory session.
    pub fn seeded(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(ProjectCatalog::seeded()),
            Arc::new(TokioScheduler),
            Arc::new(MemorySessionStore::default()),
        )
    }

    pub async fn dashboard(&self) -> Dashboard {
        Dashboard::load(self.query.as_ref()).await
    }

    pub fn notification_center(&self, dashboard: &Dashboard) -> NotificationCenter {
        NotificationCenter::from_projects(
            dashboard.projects(),
            self.scheduler.now(),
            self.events.clone(),
        )
    }

    /// New upload form. Completed uploads are registered in `project_id`
    /// only when `register_uploads` is enabled.
    pub fn upload_session(&self, project_id: &str, uploaded_by: &str) -> UploadSession {
        let session =
            UploadSession::new(self.config.upload, self.scheduler.clone(), self.events.clone());
        if self.config.register_uploads {
            session.with_target(UploadTarget {
                workflow: self.workflow.clone(),
                project_id: project_id.to_string(),
                uploaded_by: uploaded_by.to_string(),
            })
        } else {
            session
        }
    }
}
