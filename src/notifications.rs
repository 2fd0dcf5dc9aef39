use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::events::{AppEvent, EventBus};
use crate::models::{ApprovalStatus, Document, Project};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub document_id: String,
    pub project_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

pub fn awaiting_approval_message(document_name: &str) -> String {
    format!("Document \"{document_name}\" is awaiting your approval.")
}

/// One notification per pending document, in project then document order.
///
/// Ids and timestamps are minted on every call, so two derivations over the
/// same projects agree on document ids only.
pub fn derive_notifications(projects: &[Project], now: DateTime<Utc>) -> Vec<Notification> {
    projects
        .iter()
        .flat_map(|project| project.documents.iter())
        .filter(|document| document.status == ApprovalStatus::Pending)
        .map(|document| Notification {
            id: Uuid::new_v4(),
            document_id: document.id.clone(),
            project_id: document.project_id.clone(),
            message: awaiting_approval_message(&document.name),
            created_at: now,
        })
        .collect()
}

/// View-local list of notifications. Dismissing never touches documents.
pub struct NotificationCenter {
    notifications: Vec<Notification>,
    events: EventBus,
}

impl NotificationCenter {
    pub fn new(events: EventBus) -> Self {
        Self {
            notifications: Vec::new(),
            events,
        }
    }

    pub fn from_projects(projects: &[Project], now: DateTime<Utc>, events: EventBus) -> Self {
        let mut center = Self::new(events);
        center.refresh(projects, now);
        center
    }

    /// Rebuilds the list from the current document set.
    pub fn refresh(&mut self, projects: &[Project], now: DateTime<Utc>) {
        self.notifications = derive_notifications(projects, now);
        debug!(count = self.notifications.len(), "notifications derived");
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Removes a single notification; returns whether anything was removed.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|notification| notification.id != id);
        let removed = self.notifications.len() != before;
        debug!(notification_id = %id, removed, "notification dismissed");
        removed
    }

    pub fn clear_all(&mut self) {
        let count = self.notifications.len();
        self.notifications.clear();
        info!(count, "notifications cleared");
        self.events.emit(AppEvent::NotificationsCleared { count });
    }

    /// Resolves a notification to the project and document it points at.
    pub fn resolve<'a>(
        &self,
        id: Uuid,
        projects: &'a [Project],
    ) -> Option<(&'a Project, &'a Document)> {
        let notification = self.notifications.iter().find(|n| n.id == id)?;
        let project = projects
            .iter()
            .find(|project| project.id == notification.project_id)?;
        let document = project.document(&notification.document_id)?;
        Some((project, document))
    }
}
