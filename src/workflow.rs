use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::approval::{derive_status, next_pending_step, validate_document};
use crate::error::{AppError, AppResult};
use crate::models::{ApprovalStatus, ApprovalStep, Document, User};
use crate::scheduler::Scheduler;
use crate::seed::APPROVAL_STAGES;
use crate::storage::ProjectCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    fn status(self) -> ApprovalStatus {
        match self {
            Verdict::Approve => ApprovalStatus::Approved,
            Verdict::Reject => ApprovalStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepDecision {
    pub approver: User,
    pub verdict: Verdict,
    pub comments: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub name: String,
    pub doc_type: String,
    pub uploaded_by: String,
}

/// Write side of the catalog: approver decisions and new submissions.
///
/// Documents are only ever appended or advanced, never removed.
#[derive(Clone)]
pub struct ApprovalWorkflow {
    catalog: Arc<ProjectCatalog>,
    scheduler: Arc<dyn Scheduler>,
}

impl ApprovalWorkflow {
    pub fn new(catalog: Arc<ProjectCatalog>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self { catalog, scheduler }
    }

    /// Decides the first pending step of a document and returns the updated
    /// document.
    pub async fn decide_step(
        &self,
        project_id: &str,
        document_id: &str,
        decision: StepDecision,
    ) -> AppResult<Document> {
        let mut projects = self.catalog.write().await;
        let project = projects
            .iter_mut()
            .find(|project| project.id == project_id)
            .ok_or_else(|| AppError::not_found(format!("project {project_id}")))?;
        let document = project
            .document_mut(document_id)
            .ok_or_else(|| AppError::not_found(format!("document {document_id}")))?;

        let Some(index) = next_pending_step(&document.approval_steps) else {
            warn!(
                document_id = %document_id,
                status = %document.status,
                "decision rejected: no step awaiting approval"
            );
            return Err(AppError::conflict(format!(
                "document {document_id} has no step awaiting approval"
            )));
        };

        let date = decision.date.unwrap_or_else(|| self.scheduler.today());
        let comments = decision
            .comments
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let mut updated = document.clone();
        let step = &mut updated.approval_steps[index];
        step.status = decision.verdict.status();
        step.approver = Some(decision.approver.clone());
        step.date = Some(date);
        step.comments = comments;
        let step_name = step.name.clone();

        updated.status = derive_status(&updated.approval_steps);
        if let Err(violation) = validate_document(&updated) {
            error!(document_id = %document_id, %violation, "decision rejected: document would fail validation");
            return Err(AppError::internal(violation));
        }
        *document = updated;

        info!(
            project_id = %project_id,
            document_id = %document_id,
            step = %step_name,
            approver = %decision.approver.name,
            verdict = ?decision.verdict,
            document_status = %document.status,
            "approval step decided"
        );

        Ok(document.clone())
    }

    /// Appends a new document to a project with every review stage pending.
    pub async fn submit_document(
        &self,
        project_id: &str,
        submission: NewSubmission,
    ) -> AppResult<Document> {
        let name = submission.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("document name is required"));
        }

        let mut projects = self.catalog.write().await;
        let project = projects
            .iter_mut()
            .find(|project| project.id == project_id)
            .ok_or_else(|| AppError::not_found(format!("project {project_id}")))?;

        let id = format!("{project_id}-{}", Uuid::new_v4());
        let approval_steps = APPROVAL_STAGES
            .iter()
            .enumerate()
            .map(|(index, stage)| ApprovalStep::pending(format!("{id}-step{}", index + 1), *stage))
            .collect::<Vec<_>>();

        let document = Document {
            status: derive_status(&approval_steps),
            id,
            name: name.to_string(),
            project_id: project_id.to_string(),
            uploaded_by: submission.uploaded_by,
            upload_date: self.scheduler.today(),
            doc_type: submission.doc_type,
            approval_steps,
        };

        project.documents.push(document.clone());
        info!(
            project_id = %project_id,
            document_id = %document.id,
            name = %document.name,
            "document submitted for approval"
        );

        Ok(document)
    }
}
