use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::events::{AppEvent, EventBus};
use crate::scheduler::Scheduler;
use crate::workflow::{ApprovalWorkflow, NewSubmission};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(300);
pub const DEFAULT_PROGRESS_STEP: u8 = 10;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

const MISSING_INFORMATION: &str = "Please provide a document name and select a file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSettings {
    pub tick_interval: Duration,
    pub progress_step: u8,
    pub max_file_bytes: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            progress_step: DEFAULT_PROGRESS_STEP,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Complete,
}

/// A file picked for upload. Only its name and size matter to the
/// simulation; the bytes, when present, are never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSelection {
    pub file_name: String,
    pub size_bytes: u64,
    pub content_type: String,
    #[serde(skip)]
    data: Option<Bytes>,
}

impl FileSelection {
    pub fn new(file_name: impl Into<String>, size_bytes: u64) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            size_bytes,
            content_type,
            data: None,
        }
    }

    pub fn from_bytes(file_name: impl Into<String>, data: Bytes) -> Self {
        let mut selection = Self::new(file_name, data.len() as u64);
        selection.data = Some(data);
        selection
    }

    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    /// Filename without its final extension.
    pub fn stem(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name.clone())
    }

    /// Lower-cased extension, used as the document type of registered uploads.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadForm {
    pub name: String,
    pub description: String,
    pub file: Option<FileSelection>,
    pub phase: UploadPhase,
    pub progress: u8,
    pub error: Option<String>,
    #[serde(skip)]
    generation: u64,
}

/// Where a finished upload is registered as a new pending document.
#[derive(Clone)]
pub struct UploadTarget {
    pub workflow: ApprovalWorkflow,
    pub project_id: String,
    pub uploaded_by: String,
}

/// Upload form driving the simulated `Idle -> Uploading -> Complete` flow.
///
/// Progress advances on a background task that is aborted on `reset` and
/// when the session is dropped.
pub struct UploadSession {
    settings: UploadSettings,
    scheduler: Arc<dyn Scheduler>,
    events: EventBus,
    target: Option<UploadTarget>,
    form: Arc<watch::Sender<UploadForm>>,
    ticker: Option<JoinHandle<()>>,
}

impl UploadSession {
    pub fn new(settings: UploadSettings, scheduler: Arc<dyn Scheduler>, events: EventBus) -> Self {
        let (form, _) = watch::channel(UploadForm::default());
        Self {
            settings,
            scheduler,
            events,
            target: None,
            form: Arc::new(form),
            ticker: None,
        }
    }

    pub fn with_target(mut self, target: UploadTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn snapshot(&self) -> UploadForm {
        self.form.borrow().clone()
    }

    pub fn phase(&self) -> UploadPhase {
        self.form.borrow().phase
    }

    pub fn progress(&self) -> u8 {
        self.form.borrow().progress
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadForm> {
        self.form.subscribe()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> AppResult<()> {
        self.ensure_editable()?;
        let name = name.into();
        self.form.send_modify(|form| form.name = name);
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> AppResult<()> {
        self.ensure_editable()?;
        let description = description.into();
        self.form.send_modify(|form| form.description = description);
        Ok(())
    }

    /// Accepts a file unless it exceeds the size limit, in which case the
    /// previous selection is kept. Fills in an empty name from the filename.
    pub fn select_file(&mut self, file: FileSelection) -> AppResult<()> {
        self.ensure_editable()?;

        if file.size_bytes > self.settings.max_file_bytes {
            let err = AppError::file_too_large(self.settings.max_file_bytes);
            warn!(
                file_name = %file.file_name,
                size_bytes = file.size_bytes,
                limit_bytes = self.settings.max_file_bytes,
                "file selection rejected"
            );
            self.record_error(&err);
            return Err(err);
        }

        self.form.send_modify(|form| {
            if form.name.trim().is_empty() {
                form.name = file.stem();
            }
            form.error = None;
            form.file = Some(file);
        });
        Ok(())
    }

    pub fn clear_file(&mut self) -> AppResult<()> {
        self.ensure_editable()?;
        self.form.send_modify(|form| form.file = None);
        Ok(())
    }

    /// Validates the form and starts the progress ticker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self) -> AppResult<()> {
        let (name, file) = {
            let form = self.form.borrow();
            match form.phase {
                UploadPhase::Idle => {}
                UploadPhase::Uploading => {
                    return Err(AppError::conflict("an upload is already in progress"))
                }
                UploadPhase::Complete => {
                    return Err(AppError::conflict(
                        "reset the form before submitting another document",
                    ))
                }
            }
            (form.name.trim().to_string(), form.file.clone())
        };

        let file = match file {
            Some(file) if !name.is_empty() => file,
            _ => {
                let err = AppError::validation(MISSING_INFORMATION);
                warn!(has_name = !name.is_empty(), "upload rejected: missing information");
                self.record_error(&err);
                return Err(err);
            }
        };

        if file.size_bytes > self.settings.max_file_bytes {
            let err = AppError::file_too_large(self.settings.max_file_bytes);
            warn!(
                file_name = %file.file_name,
                size_bytes = file.size_bytes,
                "upload rejected: file too large"
            );
            self.record_error(&err);
            return Err(err);
        }

        self.cancel_ticker();
        let mut generation = 0;
        self.form.send_modify(|form| {
            form.generation += 1;
            form.phase = UploadPhase::Uploading;
            form.progress = 0;
            form.error = None;
            generation = form.generation;
        });

        info!(
            name = %name,
            file_name = %file.file_name,
            size_bytes = file.size_bytes,
            content_type = %file.content_type,
            buffered = file.data().is_some(),
            "upload started"
        );

        let ticker = Ticker {
            form: self.form.clone(),
            scheduler: self.scheduler.clone(),
            events: self.events.clone(),
            target: self.target.clone(),
            settings: self.settings,
            generation,
        };
        self.ticker = Some(tokio::spawn(ticker.run()));
        Ok(())
    }

    /// Waits until the current upload finishes and returns the final form.
    pub async fn wait_until_complete(&self) -> AppResult<UploadForm> {
        let mut rx = self.form.subscribe();
        let generation = {
            let form = rx.borrow_and_update();
            if form.phase == UploadPhase::Idle {
                return Err(AppError::conflict("no upload has been submitted"));
            }
            form.generation
        };

        let form = rx
            .wait_for(|form| form.generation != generation || form.phase != UploadPhase::Uploading)
            .await
            .map_err(AppError::internal)?
            .clone();

        if form.generation != generation || form.phase != UploadPhase::Complete {
            return Err(AppError::conflict("upload was reset before completing"));
        }
        Ok(form)
    }

    /// Clears every field and returns to `Idle`, stopping any running ticker.
    pub fn reset(&mut self) {
        self.cancel_ticker();
        self.form.send_modify(|form| {
            let generation = form.generation + 1;
            *form = UploadForm {
                generation,
                ..UploadForm::default()
            };
        });
        debug!("upload form reset");
    }

    fn ensure_editable(&self) -> AppResult<()> {
        if self.phase() == UploadPhase::Uploading {
            return Err(AppError::conflict("the form is locked while uploading"));
        }
        Ok(())
    }

    fn record_error(&self, err: &AppError) {
        let message = err.message().to_string();
        self.form.send_modify(|form| form.error = Some(message));
    }

    fn cancel_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

struct Ticker {
    form: Arc<watch::Sender<UploadForm>>,
    scheduler: Arc<dyn Scheduler>,
    events: EventBus,
    target: Option<UploadTarget>,
    settings: UploadSettings,
    generation: u64,
}

impl Ticker {
    async fn run(self) {
        let step = self.settings.progress_step.max(1);
        loop {
            self.scheduler.sleep(self.settings.tick_interval).await;

            let mut stale = false;
            let mut finished = None;
            self.form.send_if_modified(|form| {
                if form.generation != self.generation || form.phase != UploadPhase::Uploading {
                    stale = true;
                    return false;
                }
                form.progress = form.progress.saturating_add(step).min(100);
                if form.progress >= 100 {
                    finished = Some((form.name.trim().to_string(), form.file.clone()));
                }
                true
            });

            if stale {
                return;
            }
            if let Some((name, file)) = finished {
                self.complete(name, file).await;
                return;
            }
        }
    }

    /// Stays in `Uploading` until the document is registered and the
    /// acknowledgement is out, so observing `Complete` implies both.
    async fn complete(&self, name: String, file: Option<FileSelection>) {
        let document_id = self.register(&name, file.as_ref()).await;

        info!(name = %name, document_id = ?document_id, "upload complete");
        self.events.emit(AppEvent::UploadCompleted {
            document_name: name,
            document_id,
        });

        self.form.send_if_modified(|form| {
            if form.generation != self.generation {
                return false;
            }
            form.phase = UploadPhase::Complete;
            true
        });
    }

    async fn register(&self, name: &str, file: Option<&FileSelection>) -> Option<String> {
        let target = self.target.as_ref()?;
        let submission = NewSubmission {
            name: name.to_string(),
            doc_type: file
                .and_then(FileSelection::extension)
                .unwrap_or_else(|| "document".to_string()),
            uploaded_by: target.uploaded_by.clone(),
        };
        match target
            .workflow
            .submit_document(&target.project_id, submission)
            .await
        {
            Ok(document) => Some(document.id),
            Err(err) => {
                error!(project_id = %target.project_id, error = %err, "failed to register uploaded document");
                None
            }
        }
    }
}
