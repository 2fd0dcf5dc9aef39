use std::env;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use bytes::Bytes;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use buildsmart::{
    auth::{Credentials, SignUpRequest},
    config::AppConfig,
    dashboard::DocumentDetail,
    events::AppEvent,
    models::UserRole,
    storage::ProjectQuery,
    upload::FileSelection,
    AppState,
};

const USAGE: &str = "Usage: buildsmart <projects | document <project-id> <document-id> | notifications | upload <name> <size-bytes> [project-id] | upload-file <path> [project-id] | signup <name> <email> <password> <role> | demo>";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "cli",
        list_delay_ms = config.list_delay.as_millis() as u64,
        upload_tick_ms = config.upload.tick_interval.as_millis() as u64,
        max_upload_bytes = config.upload.max_file_bytes,
        register_uploads = config.register_uploads,
        "loaded configuration"
    );
    let state = AppState::seeded(config);

    let args: Vec<String> = env::args().skip(1).collect();
    let command = async {
        match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["projects"] => print_projects(&state).await,
            ["document", project_id, document_id] => {
                print_document(&state, project_id, document_id).await
            }
            ["notifications"] => print_notifications(&state).await,
            ["upload", name, size] => run_upload(&state, simulated_file(name, size)?, "1").await,
            ["upload", name, size, project_id] => {
                run_upload(&state, simulated_file(name, size)?, project_id).await
            }
            ["upload-file", path] => run_upload(&state, read_file(path).await?, "1").await,
            ["upload-file", path, project_id] => {
                run_upload(&state, read_file(path).await?, project_id).await
            }
            ["signup", name, email, password, role] => {
                run_sign_up(&state, name, email, password, role).await
            }
            ["demo"] | [] => run_demo(&state).await,
            _ => {
                eprintln!("{USAGE}");
                std::process::exit(1);
            }
        }
    };

    tokio::select! {
        result = command => result?,
        _ = signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn print_projects(state: &AppState) -> Result<()> {
    let dashboard = state.dashboard().await;
    let output = serde_json::json!({
        "projects": dashboard.summaries(),
        "recent_documents": dashboard.recent_documents(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn print_document(state: &AppState, project_id: &str, document_id: &str) -> Result<()> {
    let Some(document) = state.query.get_document(project_id, document_id).await else {
        bail!("document {document_id} not found in project {project_id}");
    };
    let detail = DocumentDetail::from(&document);
    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(())
}

async fn print_notifications(state: &AppState) -> Result<()> {
    let dashboard = state.dashboard().await;
    let center = state.notification_center(&dashboard);
    println!("{}", serde_json::to_string_pretty(center.notifications())?);
    Ok(())
}

fn simulated_file(name: &str, size: &str) -> Result<FileSelection> {
    let size_bytes: u64 = size
        .parse()
        .with_context(|| format!("size must be a byte count, got {size}"))?;
    Ok(FileSelection::new(name, size_bytes))
}

async fn read_file(path: &str) -> Result<FileSelection> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    let file_name = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{path} does not name a file"))?;
    Ok(FileSelection::from_bytes(file_name, Bytes::from(data)))
}

async fn run_sign_up(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<()> {
    let Some(role) = UserRole::parse(role) else {
        let known: Vec<_> = UserRole::ALL.iter().map(UserRole::as_str).collect();
        bail!("unknown role {role}, expected one of {}", known.join(", "));
    };

    let mut events = state.events.subscribe();
    state
        .auth
        .sign_up(&SignUpRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Some(role),
        })
        .await?;
    if let Ok(event) = events.recv().await {
        print_event(&event);
    }
    Ok(())
}

async fn run_upload(state: &AppState, file: FileSelection, project_id: &str) -> Result<()> {
    let mut events = state.events.subscribe();
    let mut session = state.upload_session(project_id, "1");
    session.select_file(file)?;
    session.submit()?;

    let mut progress = session.subscribe();
    loop {
        let form = progress.borrow_and_update().clone();
        println!("Uploading... {}%", form.progress);
        if form.progress >= 100 {
            break;
        }
        progress
            .changed()
            .await
            .context("upload form dropped while uploading")?;
    }
    session.wait_until_complete().await?;

    if let Ok(event) = events.recv().await {
        print_event(&event);
    }
    Ok(())
}

async fn run_demo(state: &AppState) -> Result<()> {
    if !state.auth.is_authenticated() {
        state
            .auth
            .login(&Credentials {
                email: "john@buildsmart.com".to_string(),
                password: "demo".to_string(),
            })
            .await?;
    }

    let dashboard = state.dashboard().await;
    for summary in dashboard.summaries() {
        println!(
            "{} [{}] {}% - {} documents, {} pending",
            summary.name,
            summary.status_label,
            summary.progress,
            summary.total_documents,
            summary.pending_documents
        );
    }

    let mut center = state.notification_center(&dashboard);
    for notification in center.notifications() {
        println!("* {}", notification.message);
    }
    if let Some(first) = center.notifications().first().map(|n| n.id) {
        if let Some((project, document)) = center.resolve(first, dashboard.projects()) {
            println!("\n{} / {}", project.name, document.name);
            for entry in DocumentDetail::from(document).timeline {
                println!("  {}: {}", entry.name, entry.caption());
            }
        }
    }
    center.clear_all();
    Ok(())
}

fn print_event(event: &AppEvent) {
    println!("{}: {}", event.title(), event.description());
}
