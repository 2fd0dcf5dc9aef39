use serde::Serialize;

use crate::approval::{
    classify_completion, format_display_date, pending_count, render_timeline, total_count,
    Completion, TimelineEntry,
};
use crate::models::{ApprovalStatus, Document, Project, ProjectStatus};
use crate::storage::ProjectQuery;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub status_label: &'static str,
    pub progress: u8,
    pub total_documents: usize,
    pub pending_documents: usize,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            description: project.description.clone(),
            status: project.status,
            status_label: project.status.label(),
            progress: project.progress.min(100),
            total_documents: total_count(project),
            pending_documents: pending_count(project),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentDocument {
    pub project_id: String,
    pub project_name: String,
    pub document_id: String,
    pub name: String,
    pub status: ApprovalStatus,
    pub status_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDetail {
    pub id: String,
    pub name: String,
    pub status: ApprovalStatus,
    pub status_label: &'static str,
    pub doc_type: String,
    pub upload_date: String,
    pub completion: Completion,
    pub timeline: Vec<TimelineEntry>,
}

impl From<&Document> for DocumentDetail {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            name: document.name.clone(),
            status: document.status,
            status_label: document.status.label(),
            doc_type: capitalize(&document.doc_type),
            upload_date: format_display_date(document.upload_date),
            completion: classify_completion(&document.approval_steps),
            timeline: render_timeline(&document.approval_steps),
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Projects loaded once and the views derived from them.
pub struct Dashboard {
    projects: Vec<Project>,
}

impl Dashboard {
    pub async fn load(query: &dyn ProjectQuery) -> Self {
        Self {
            projects: query.list_projects().await,
        }
    }

    pub fn from_projects(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    pub async fn reload(&mut self, query: &dyn ProjectQuery) {
        self.projects = query.list_projects().await;
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn summaries(&self) -> Vec<ProjectSummary> {
        self.projects.iter().map(ProjectSummary::from).collect()
    }

    /// The first document of each project.
    pub fn recent_documents(&self) -> Vec<RecentDocument> {
        self.projects
            .iter()
            .filter_map(|project| {
                project.documents.first().map(|document| RecentDocument {
                    project_id: project.id.clone(),
                    project_name: project.name.clone(),
                    document_id: document.id.clone(),
                    name: document.name.clone(),
                    status: document.status,
                    status_label: document.status.label(),
                })
            })
            .collect()
    }

    pub fn document_detail(&self, project_id: &str, document_id: &str) -> Option<DocumentDetail> {
        self.projects
            .iter()
            .find(|project| project.id == project_id)
            .and_then(|project| project.document(document_id))
            .map(DocumentDetail::from)
    }
}
