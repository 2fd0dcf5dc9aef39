mod common;

use anyhow::Result;
use buildsmart::approval::{derive_status, pending_count, validate_document};
use buildsmart::models::{ApprovalStatus, ApprovalStep, User};
use buildsmart::seed;
use buildsmart::storage::ProjectQuery;
use buildsmart::workflow::{NewSubmission, StepDecision, Verdict};
use buildsmart::ErrorKind;
use chrono::NaiveDate;
use common::{fixture_project, TestApp};

fn decision(approver: &User, verdict: Verdict, comments: &str) -> StepDecision {
    StepDecision {
        approver: approver.clone(),
        verdict,
        comments: Some(comments.to_string()),
        date: None,
    }
}

#[tokio::test]
async fn seeded_documents_hold_every_pipeline_invariant() -> Result<()> {
    let app = TestApp::new();
    let projects = app.catalog.snapshot().await;

    for project in &projects {
        for document in &project.documents {
            validate_document(document)?;
            assert_eq!(document.status, derive_status(&document.approval_steps));

            if let Some(k) = document
                .approval_steps
                .iter()
                .position(|s| s.status == ApprovalStatus::Rejected)
            {
                for later in &document.approval_steps[k + 1..] {
                    assert_eq!(later.status, ApprovalStatus::Pending);
                    assert!(later.approver.is_none() && later.date.is_none());
                    assert!(later.comments.is_none());
                }
            }

            for step in &document.approval_steps {
                assert_eq!(
                    step.status != ApprovalStatus::Pending,
                    step.approver.is_some() && step.date.is_some()
                );
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn submission_advances_one_step_at_a_time() -> Result<()> {
    let app = TestApp::new();
    let users = seed::users();
    let workflow = &app.state.workflow;

    let submitted = workflow
        .submit_document(
            "3",
            NewSubmission {
                name: "Facade Elevations".into(),
                doc_type: "drawing".into(),
                uploaded_by: users[2].id.clone(),
            },
        )
        .await?;
    assert_eq!(submitted.upload_date, NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
    assert_eq!(
        pending_count(&app.state.query.get_project("3").await.unwrap()),
        2
    );

    let after_first = workflow
        .decide_step(
            "3",
            &submitted.id,
            decision(&users[0], Verdict::Approve, "Complete package"),
        )
        .await?;
    assert_eq!(after_first.status, ApprovalStatus::Pending);
    assert_eq!(after_first.approval_steps[0].status, ApprovalStatus::Approved);
    assert_eq!(after_first.approval_steps[1].status, ApprovalStatus::Pending);

    let after_second = workflow
        .decide_step(
            "3",
            &submitted.id,
            decision(&users[1], Verdict::Reject, "Load paths unclear"),
        )
        .await?;
    assert_eq!(after_second.status, ApprovalStatus::Rejected);
    validate_document(&after_second)?;

    let third = &after_second.approval_steps[2];
    assert_eq!(third.status, ApprovalStatus::Pending);
    assert!(third.approver.is_none() && third.date.is_none() && third.comments.is_none());

    let err = workflow
        .decide_step(
            "3",
            &submitted.id,
            decision(&users[3], Verdict::Approve, "Too late"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let project = app.state.query.get_project("3").await.unwrap();
    assert_eq!(project.documents.len(), 4, "rejected documents are retained");
    assert_eq!(pending_count(&project), 1);
    Ok(())
}

#[tokio::test]
async fn blank_comments_are_not_recorded() -> Result<()> {
    let app = TestApp::new();
    let users = seed::users();

    let document = app
        .state
        .workflow
        .decide_step(
            "4",
            "4-doc2",
            StepDecision {
                approver: users[3].clone(),
                verdict: Verdict::Reject,
                comments: Some("   ".into()),
                date: NaiveDate::from_ymd_opt(2023, 4, 30),
            },
        )
        .await?;

    let last = document.approval_steps.last().unwrap();
    assert_eq!(last.status, ApprovalStatus::Rejected);
    assert_eq!(last.comments, None);
    assert_eq!(last.date, NaiveDate::from_ymd_opt(2023, 4, 30));
    assert_eq!(document.status, ApprovalStatus::Rejected);
    Ok(())
}

#[tokio::test]
async fn empty_submission_name_is_a_validation_error() -> Result<()> {
    let app = TestApp::new();
    let err = app
        .state
        .workflow
        .submit_document(
            "1",
            NewSubmission {
                name: " ".into(),
                doc_type: "drawing".into(),
                uploaded_by: "1".into(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    Ok(())
}

#[tokio::test]
async fn decision_that_breaks_validation_leaves_document_untouched() -> Result<()> {
    let mut project = fixture_project("8", &[ApprovalStatus::Pending]);
    let document = &mut project.documents[0];
    let mut unsigned = ApprovalStep::pending("8-doc1-step2", seed::ENGINEERING_REVIEW);
    unsigned.status = ApprovalStatus::Approved;
    unsigned.date = NaiveDate::from_ymd_opt(2023, 4, 21);
    document.approval_steps.push(unsigned);
    let app = TestApp::with_projects(vec![project]);
    let before = app.catalog.snapshot().await;

    let err = app
        .state
        .workflow
        .decide_step(
            "8",
            "8-doc1",
            decision(&seed::users()[0], Verdict::Approve, "Looks fine"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    let after = app.catalog.snapshot().await;
    assert_eq!(after, before);
    let stored = after[0].document("8-doc1").unwrap();
    assert_eq!(stored.status, ApprovalStatus::Pending);
    assert_eq!(stored.approval_steps[0].status, ApprovalStatus::Pending);
    assert!(stored.approval_steps[0].approver.is_none());
    Ok(())
}
