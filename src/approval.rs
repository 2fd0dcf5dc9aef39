use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::models::{ApprovalStatus, ApprovalStep, Document, Project};

pub const WAITING_FOR_APPROVAL: &str = "Waiting for approval";

const DISPLAY_DATE_FORMAT: &str = "%b %-d, %Y";

/// Overall status implied by an ordered pipeline.
///
/// Any rejection wins; a non-empty pipeline of approvals is approved;
/// everything else, including an empty pipeline, is still pending.
pub fn derive_status(steps: &[ApprovalStep]) -> ApprovalStatus {
    if steps
        .iter()
        .any(|step| step.status == ApprovalStatus::Rejected)
    {
        ApprovalStatus::Rejected
    } else if !steps.is_empty()
        && steps
            .iter()
            .all(|step| step.status == ApprovalStatus::Approved)
    {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    Completed,
    InProgress,
}

pub fn classify_completion(steps: &[ApprovalStep]) -> Completion {
    if steps.iter().all(ApprovalStep::is_completed) {
        Completion::Completed
    } else {
        Completion::InProgress
    }
}

/// Index of the step an approver acts on next, or `None` once the pipeline
/// is finished or halted by a rejection.
pub fn next_pending_step(steps: &[ApprovalStep]) -> Option<usize> {
    for (index, step) in steps.iter().enumerate() {
        match step.status {
            ApprovalStatus::Approved => continue,
            ApprovalStatus::Rejected => return None,
            ApprovalStatus::Pending => return Some(index),
        }
    }
    None
}

pub fn pending_count(project: &Project) -> usize {
    project
        .documents
        .iter()
        .filter(|doc| doc.status == ApprovalStatus::Pending)
        .count()
}

pub fn total_count(project: &Project) -> usize {
    project.documents.len()
}

pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepView {
    Decided {
        decision: ApprovalStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        approver: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        comments: Option<String>,
    },
    Waiting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub step_id: String,
    pub name: String,
    pub is_last: bool,
    #[serde(flatten)]
    pub view: StepView,
}

impl TimelineEntry {
    /// One-line caption: "Approved by Emily Johnson", or the waiting text.
    pub fn caption(&self) -> String {
        match &self.view {
            StepView::Decided {
                decision, approver, ..
            } => match approver {
                Some(name) => format!("{decision} by {name}"),
                None => format!("{decision} by"),
            },
            StepView::Waiting => WAITING_FOR_APPROVAL.to_string(),
        }
    }

    pub fn display_date(&self) -> Option<String> {
        match &self.view {
            StepView::Decided { date, .. } => date.map(format_display_date),
            StepView::Waiting => None,
        }
    }
}

pub fn render_timeline(steps: &[ApprovalStep]) -> Vec<TimelineEntry> {
    let last = steps.len().saturating_sub(1);
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let view = if step.is_completed() {
                StepView::Decided {
                    decision: step.status,
                    approver: step.approver.as_ref().map(|user| user.name.clone()),
                    date: step.date,
                    comments: step.comments.clone(),
                }
            } else {
                StepView::Waiting
            };
            TimelineEntry {
                step_id: step.id.clone(),
                name: step.name.clone(),
                is_last: index == last,
                view,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("document {document_id} has status {actual} but its steps imply {expected}")]
    StatusMismatch {
        document_id: String,
        expected: ApprovalStatus,
        actual: ApprovalStatus,
    },
    #[error("step {step_id} progressed past an earlier rejection")]
    ProgressPastRejection { step_id: String },
    #[error("decided step {step_id} is missing its approver or date")]
    DecisionIncomplete { step_id: String },
    #[error("pending step {step_id} carries decision metadata")]
    PendingWithDecision { step_id: String },
}

/// Checks the pipeline rules every stored document must satisfy.
pub fn validate_document(document: &Document) -> Result<(), InvariantViolation> {
    let mut rejected = false;
    for step in &document.approval_steps {
        if rejected && step.status != ApprovalStatus::Pending {
            return Err(InvariantViolation::ProgressPastRejection {
                step_id: step.id.clone(),
            });
        }

        if step.is_completed() {
            if step.approver.is_none() || step.date.is_none() {
                return Err(InvariantViolation::DecisionIncomplete {
                    step_id: step.id.clone(),
                });
            }
        } else if step.approver.is_some() || step.date.is_some() || step.comments.is_some() {
            return Err(InvariantViolation::PendingWithDecision {
                step_id: step.id.clone(),
            });
        }

        rejected |= step.status == ApprovalStatus::Rejected;
    }

    let expected = derive_status(&document.approval_steps);
    if document.status != expected {
        return Err(InvariantViolation::StatusMismatch {
            document_id: document.id.clone(),
            expected,
            actual: document.status,
        });
    }

    Ok(())
}
