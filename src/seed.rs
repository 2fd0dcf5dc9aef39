//! Fixed demo dataset loaded into the catalog at startup.

use chrono::NaiveDate;

use crate::models::{
    ApprovalStatus, ApprovalStep, Document, Project, ProjectStatus, User, UserRole,
};

pub const INITIAL_REVIEW: &str = "Initial Review";
pub const ENGINEERING_REVIEW: &str = "Engineering Review";
pub const REGULATORY_APPROVAL: &str = "Regulatory Approval";

/// Stage names of the standard review pipeline, in evaluation order.
pub const APPROVAL_STAGES: [&str; 3] = [INITIAL_REVIEW, ENGINEERING_REVIEW, REGULATORY_APPROVAL];

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn user(id: &str, name: &str, email: &str, role: UserRole, image: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        profile_image: Some(format!(
            "https://images.unsplash.com/{image}?ixlib=rb-1.2.1&auto=format&fit=facearea&facepad=2&w=256&h=256&q=80"
        )),
    }
}

pub fn users() -> Vec<User> {
    vec![
        user(
            "1",
            "John Smith",
            "john@buildsmart.com",
            UserRole::ProjectManager,
            "photo-1472099645785-5658abf4ff4e",
        ),
        user(
            "2",
            "Emily Johnson",
            "emily@buildsmart.com",
            UserRole::Engineer,
            "photo-1494790108377-be9c29b29330",
        ),
        user(
            "3",
            "Michael Wilson",
            "michael@buildsmart.com",
            UserRole::Contractor,
            "photo-1500648767791-00dcc994a43e",
        ),
        user(
            "4",
            "Sarah Davis",
            "sarah@buildsmart.com",
            UserRole::Regulatory,
            "photo-1438761681033-6461ffad8d80",
        ),
    ]
}

/// The pipeline a seeded document went through to land on `outcome`.
fn approval_steps(users: &[User], document_id: &str, outcome: ApprovalStatus) -> Vec<ApprovalStep> {
    let initial = ApprovalStep {
        id: format!("{document_id}-step1"),
        name: INITIAL_REVIEW.to_string(),
        status: ApprovalStatus::Approved,
        approver: users.first().cloned(),
        date: Some(date(2023, 4, 15)),
        comments: Some("Looks good, proceeding to engineering review".to_string()),
    };

    let engineering_rejected = outcome == ApprovalStatus::Rejected;
    let engineering = ApprovalStep {
        id: format!("{document_id}-step2"),
        name: ENGINEERING_REVIEW.to_string(),
        status: if engineering_rejected {
            ApprovalStatus::Rejected
        } else {
            ApprovalStatus::Approved
        },
        approver: users.get(1).cloned(),
        date: Some(date(2023, 4, 18)),
        comments: Some(if engineering_rejected {
            "Structural calculations need revision".to_string()
        } else {
            "Engineering aspects meet requirements".to_string()
        }),
    };

    let regulatory = if outcome == ApprovalStatus::Approved {
        ApprovalStep {
            id: format!("{document_id}-step3"),
            name: REGULATORY_APPROVAL.to_string(),
            status: ApprovalStatus::Approved,
            approver: users.get(3).cloned(),
            date: Some(date(2023, 4, 25)),
            comments: Some("All regulatory requirements satisfied".to_string()),
        }
    } else {
        ApprovalStep::pending(format!("{document_id}-step3"), REGULATORY_APPROVAL)
    };

    vec![initial, engineering, regulatory]
}

fn documents(users: &[User], project_id: &str) -> Vec<Document> {
    let entries = [
        (
            "doc1",
            "Foundation Plans",
            ApprovalStatus::Approved,
            0,
            date(2023, 4, 10),
            "blueprint",
        ),
        (
            "doc2",
            "Electrical Schematics",
            ApprovalStatus::Pending,
            2,
            date(2023, 4, 12),
            "schematic",
        ),
        (
            "doc3",
            "Plumbing Layout",
            ApprovalStatus::Rejected,
            2,
            date(2023, 4, 14),
            "layout",
        ),
    ];

    entries
        .into_iter()
        .map(|(suffix, name, status, uploader, upload_date, doc_type)| {
            let id = format!("{project_id}-{suffix}");
            Document {
                approval_steps: approval_steps(users, &id, status),
                id,
                name: name.to_string(),
                project_id: project_id.to_string(),
                status,
                uploaded_by: users
                    .get(uploader)
                    .map(|user| user.id.clone())
                    .unwrap_or_default(),
                upload_date,
                doc_type: doc_type.to_string(),
            }
        })
        .collect()
}

pub fn projects() -> Vec<Project> {
    let users = users();
    let entries = [
        (
            "1",
            "Riverside Office Complex",
            "A modern office complex with 12 stories and underground parking",
            ProjectStatus::Active,
            45,
        ),
        (
            "2",
            "Highland Residential Towers",
            "Two residential towers with shared amenities",
            ProjectStatus::Active,
            30,
        ),
        (
            "3",
            "Greenfield Shopping Center",
            "A mixed-use shopping center with restaurants and entertainment",
            ProjectStatus::OnHold,
            15,
        ),
        (
            "4",
            "Harbor Bridge Renovation",
            "Structural renovation and expansion of the harbor bridge",
            ProjectStatus::Active,
            60,
        ),
    ];

    entries
        .into_iter()
        .map(|(id, name, description, status, progress)| Project {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            status,
            progress,
            documents: documents(&users, id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::validate_document;

    #[test]
    fn seeds_four_projects_with_three_documents_each() {
        let projects = projects();
        assert_eq!(projects.len(), 4);
        assert!(projects.iter().all(|p| p.documents.len() == 3));
        assert_eq!(projects[2].status, ProjectStatus::OnHold);
        assert_eq!(projects[3].progress, 60);
    }

    #[test]
    fn seeded_documents_satisfy_pipeline_invariants() {
        for project in projects() {
            for document in &project.documents {
                validate_document(document).unwrap();
                assert_eq!(document.project_id, project.id);
            }
        }
    }

    #[test]
    fn rejected_document_stops_at_engineering_review() {
        let projects = projects();
        let rejected = projects[0].document("1-doc3").unwrap();
        assert_eq!(rejected.approval_steps[1].status, ApprovalStatus::Rejected);
        assert_eq!(
            rejected.approval_steps[1].comments.as_deref(),
            Some("Structural calculations need revision")
        );
        assert_eq!(rejected.approval_steps[2].status, ApprovalStatus::Pending);
        assert!(rejected.approval_steps[2].approver.is_none());
    }
}
