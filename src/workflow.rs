use std::path::PathBuf;

use tracing::debug;

use crate::gateway::AnalysisResult;

/// File types accepted for analysis, lower-cased and including the dot.
pub const ALLOWED_EXTENSIONS: [&str; 2] = [".pdf", ".docx"];

/// Inline notice shown when a file with a disallowed extension is offered.
pub const INVALID_FILE_MESSAGE: &str = "Please upload a PDF or DOCX file.";

/// Extension of `name`: the lower-cased substring from the final `.`,
/// including the dot. Filenames without a dot have none.
pub fn file_extension(name: &str) -> Option<String> {
    name.rfind('.').map(|idx| name[idx..].to_ascii_lowercase())
}

fn allowed_extension(name: &str) -> Option<String> {
    file_extension(name).filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// A file offered through the picker or a drop, before allowlist validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileOffer {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
}

/// One user-supplied file accepted for analysis.
///
/// Only ever constructed by the workflow from a validated [`FileOffer`], so
/// an `UploadCandidate` always carries an allowed extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadCandidate {
    pub path: PathBuf,
    pub name: String,
    /// Lower-cased, including the dot.
    pub extension: String,
    pub size_bytes: u64,
}

/// Mutually exclusive states of the upload workflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkflowStatus {
    #[default]
    Idle,
    DragActive,
    Ready,
    Submitting,
    Succeeded,
    Failed,
}

/// Events delivered to the workflow state machine.
///
/// The transition table is authoritative regardless of how the hosting
/// shell produces these events.
#[derive(Debug)]
pub enum WorkflowEvent {
    DragEnter,
    DragOver,
    DragLeave,
    Drop(FileOffer),
    FilePicked(FileOffer),
    Submit,
    SubmitSucceeded(AnalysisResult),
    SubmitFailed(String),
}

/// Side effect requested by a transition, executed by the hosting shell.
#[derive(Debug, PartialEq, Eq)]
pub enum WorkflowEffect {
    /// Dispatch the accepted candidate through the gateway.
    SubmitCandidate(UploadCandidate),
}

/// State machine owning file selection, validation, the submission
/// lifecycle, and the data the result area renders from.
///
/// At most one candidate is live at a time; any accepted pick or drop
/// replaces it wholesale and discards the previous verdict or error.
#[derive(Debug, Default)]
pub struct UploadWorkflow {
    status: WorkflowStatus,
    candidate: Option<UploadCandidate>,
    result: Option<AnalysisResult>,
    error: Option<String>,
}

impl UploadWorkflow {
    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn candidate(&self) -> Option<&UploadCandidate> {
        self.candidate.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Applies one event, returning any effect the host must execute.
    ///
    /// Events with no transition from the current state are ignored. While
    /// a submission is outstanding only the response events are honored, so
    /// re-entrant submission is structurally impossible.
    pub fn apply(&mut self, event: WorkflowEvent) -> Option<WorkflowEffect> {
        if self.status == WorkflowStatus::Submitting {
            match event {
                WorkflowEvent::SubmitSucceeded(result) => {
                    self.status = WorkflowStatus::Succeeded;
                    self.error = None;
                    self.result = Some(result);
                }
                WorkflowEvent::SubmitFailed(message) => {
                    self.status = WorkflowStatus::Failed;
                    self.result = None;
                    self.error = Some(message);
                }
                other => {
                    debug!(event = ?other, "event ignored while a submission is outstanding");
                }
            }
            return None;
        }

        match event {
            WorkflowEvent::DragEnter | WorkflowEvent::DragOver => {
                if self.status == WorkflowStatus::Idle {
                    self.status = WorkflowStatus::DragActive;
                }
                None
            }
            WorkflowEvent::DragLeave => {
                if self.status == WorkflowStatus::DragActive {
                    self.status = WorkflowStatus::Idle;
                }
                None
            }
            WorkflowEvent::Drop(offer) | WorkflowEvent::FilePicked(offer) => {
                self.accept_offer(offer);
                None
            }
            WorkflowEvent::Submit => {
                let Some(candidate) = self.candidate.clone() else {
                    debug!("submit ignored without an accepted candidate");
                    return None;
                };
                if self.status != WorkflowStatus::Ready {
                    debug!(status = ?self.status, "submit is only reachable from Ready");
                    return None;
                }
                self.status = WorkflowStatus::Submitting;
                self.error = None;
                Some(WorkflowEffect::SubmitCandidate(candidate))
            }
            WorkflowEvent::SubmitSucceeded(_) | WorkflowEvent::SubmitFailed(_) => {
                debug!(status = ?self.status, "stale submission response ignored");
                None
            }
        }
    }

    /// Validation applied identically for drop and pick: the extension must
    /// be on the allowlist or the offer is rejected before entering `Ready`.
    fn accept_offer(&mut self, offer: FileOffer) {
        match allowed_extension(&offer.name) {
            Some(extension) => {
                self.status = WorkflowStatus::Ready;
                self.candidate = Some(UploadCandidate {
                    path: offer.path,
                    name: offer.name,
                    extension,
                    size_bytes: offer.size_bytes,
                });
                self.result = None;
                self.error = None;
            }
            None => {
                debug!(name = %offer.name, "rejected file with disallowed extension");
                self.status = WorkflowStatus::Idle;
                self.candidate = None;
                self.result = None;
                self.error = Some(INVALID_FILE_MESSAGE.to_string());
            }
        }
    }
}
