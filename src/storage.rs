use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::models::{Document, Project};
use crate::scheduler::Scheduler;
use crate::seed;

/// Read-only query surface consumed by dashboard and detail views.
///
/// Unknown ids are not errors: lookups resolve to `None`.
#[async_trait]
pub trait ProjectQuery: Send + Sync + 'static {
    async fn list_projects(&self) -> Vec<Project>;

    async fn get_project(&self, id: &str) -> Option<Project>;

    async fn get_document(&self, project_id: &str, document_id: &str) -> Option<Document>;
}

/// Shared in-memory source of truth for projects and their documents.
#[derive(Debug, Default)]
pub struct ProjectCatalog {
    projects: RwLock<Vec<Project>>,
}

impl ProjectCatalog {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects: RwLock::new(projects),
        }
    }

    pub fn seeded() -> Self {
        Self::new(seed::projects())
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Vec<Project>> {
        self.projects.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Vec<Project>> {
        self.projects.write().await
    }

    pub async fn snapshot(&self) -> Vec<Project> {
        self.projects.read().await.clone()
    }
}

pub struct MockDataProvider {
    catalog: Arc<ProjectCatalog>,
    scheduler: Arc<dyn Scheduler>,
    list_delay: Duration,
    lookup_delay: Duration,
}

impl MockDataProvider {
    pub fn new(
        catalog: Arc<ProjectCatalog>,
        scheduler: Arc<dyn Scheduler>,
        list_delay: Duration,
        lookup_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            scheduler,
            list_delay,
            lookup_delay,
        }
    }

    pub fn catalog(&self) -> Arc<ProjectCatalog> {
        self.catalog.clone()
    }
}

#[async_trait]
impl ProjectQuery for MockDataProvider {
    async fn list_projects(&self) -> Vec<Project> {
        debug!(delay_ms = self.list_delay.as_millis() as u64, "listing projects");
        self.scheduler.sleep(self.list_delay).await;
        self.catalog.snapshot().await
    }

    async fn get_project(&self, id: &str) -> Option<Project> {
        debug!(project_id = %id, delay_ms = self.lookup_delay.as_millis() as u64, "loading project");
        self.scheduler.sleep(self.lookup_delay).await;
        let projects = self.catalog.read().await;
        projects.iter().find(|project| project.id == id).cloned()
    }

    async fn get_document(&self, project_id: &str, document_id: &str) -> Option<Document> {
        debug!(
            project_id = %project_id,
            document_id = %document_id,
            delay_ms = self.lookup_delay.as_millis() as u64,
            "loading document"
        );
        self.scheduler.sleep(self.lookup_delay).await;
        let projects = self.catalog.read().await;
        projects
            .iter()
            .find(|project| project.id == project_id)
            .and_then(|project| project.document(document_id))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use chrono::Utc;

    fn provider() -> (MockDataProvider, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::new(Utc::now()));
        let provider = MockDataProvider::new(
            Arc::new(ProjectCatalog::seeded()),
            scheduler.clone(),
            Duration::from_millis(800),
            Duration::from_millis(500),
        );
        (provider, scheduler)
    }

    #[tokio::test]
    async fn list_waits_for_the_list_delay() {
        let (provider, scheduler) = provider();
        let projects = provider.list_projects().await;

        assert_eq!(projects.len(), 4);
        assert_eq!(scheduler.recorded_sleeps(), vec![Duration::from_millis(800)]);
    }

    #[tokio::test]
    async fn lookups_resolve_to_none_for_unknown_ids() {
        let (provider, scheduler) = provider();

        assert!(provider.get_project("99").await.is_none());
        assert!(provider.get_document("1", "2-doc1").await.is_none());
        assert!(provider.get_document("99", "1-doc1").await.is_none());
        assert_eq!(scheduler.total_slept(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn document_lookup_requires_matching_project() {
        let (provider, _) = provider();
        let document = provider.get_document("2", "2-doc2").await.unwrap();
        assert_eq!(document.name, "Electrical Schematics");
        assert_eq!(document.project_id, "2");
    }
}
