use std::path::Path;

use anyhow::{Result, anyhow, bail};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    gateway::{AnalysisResult, AuthGatewayClient},
    routes::{self, Navigator, Route},
    session::{Session, SessionStore},
    ui,
    workflow::{
        FileOffer, INVALID_FILE_MESSAGE, UploadCandidate, UploadWorkflow, WorkflowEffect,
        WorkflowEvent,
    },
};

/// Events flowing into the interactive screens.
///
/// Stdin lines and submission outcomes arrive over one channel and are
/// applied in observation order, so the workflow never has to reconcile
/// out-of-order responses.
#[derive(Debug)]
enum ShellEvent {
    /// One line read from stdin.
    Input(String),
    /// Outcome of the spawned submission task; the message is user-facing.
    SubmissionFinished(Result<AnalysisResult, String>),
    /// Stdin reached end of file.
    InputClosed,
}

enum ScreenFlow {
    Stay,
    /// Leave the current screen and let the route decide the next one.
    Leave,
    Quit,
}

/// Wires the session store, navigator, and gateway together and hosts the
/// screens. The upload workflow itself is mounted per dashboard entry.
pub struct App {
    store: SessionStore,
    navigator: Navigator,
    gateway: AuthGatewayClient,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        let store = SessionStore::open(&config.session_file);
        // The unauthenticated default route is Dashboard; the guard decides
        // where the user actually lands.
        let navigator = Navigator::new(Route::Dashboard);
        let gateway =
            AuthGatewayClient::new(&config.api_base_url, store.clone(), navigator.clone());
        Self {
            store,
            navigator,
            gateway,
        }
    }

    pub fn run_login(&self, token: String, name: Option<String>) -> Result<()> {
        self.store.set(token, name)?;
        let greeting = self
            .store
            .get()
            .map(|session| session.display_name().to_string())
            .unwrap_or_default();
        println!("Signed in as {greeting}.");
        Ok(())
    }

    pub fn run_logout(&self) -> Result<()> {
        self.store.clear()?;
        println!("Signed out.");
        Ok(())
    }

    /// One-shot analysis: guard check, then pick and submit through the
    /// same workflow machine the dashboard uses.
    pub async fn run_analyze(&self, path: &Path) -> Result<()> {
        let session = routes::require_session(&self.store)
            .map_err(|_| anyhow!("not signed in; run `frauddetect login` first"))?;
        debug!(user = session.display_name(), "starting one-shot analysis");

        let mut workflow = UploadWorkflow::default();
        let offer = offer_from_path(path).map_err(|message| anyhow!(message))?;
        workflow.apply(WorkflowEvent::FilePicked(offer));

        let Some(WorkflowEffect::SubmitCandidate(candidate)) =
            workflow.apply(WorkflowEvent::Submit)
        else {
            bail!(
                workflow
                    .error_message()
                    .unwrap_or(INVALID_FILE_MESSAGE)
                    .to_string()
            );
        };

        match submit_candidate(&self.gateway, &candidate).await {
            Ok(result) => {
                workflow.apply(WorkflowEvent::SubmitSucceeded(result));
                println!("{}", ui::render_result_area(&workflow));
                Ok(())
            }
            Err(message) => {
                workflow.apply(WorkflowEvent::SubmitFailed(message.clone()));
                bail!(message)
            }
        }
    }

    /// Interactive shell: the route decides the screen on every turn, so a
    /// session cleared by the gateway mid-flight lands on the login screen
    /// at the next navigation.
    pub async fn run_interactive(&self) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(16);
        spawn_input_reader(tx.clone());

        loop {
            match self.navigator.current() {
                Route::Login => {
                    if !self.login_screen(&mut rx).await? {
                        return Ok(());
                    }
                }
                Route::Dashboard => match routes::require_session(&self.store) {
                    Ok(session) => {
                        if !self.dashboard_screen(&session, tx.clone(), &mut rx).await? {
                            return Ok(());
                        }
                    }
                    Err(route) => self.navigator.go_to(route),
                },
            }
        }
    }

    /// Returns false when the user asked to quit.
    async fn login_screen(&self, rx: &mut Receiver<ShellEvent>) -> Result<bool> {
        println!("{}", ui::render_login_screen());

        while let Some(event) = rx.recv().await {
            let line = match event {
                ShellEvent::Input(line) => line,
                // Outcome of a request abandoned on a previous screen.
                ShellEvent::SubmissionFinished(_) => continue,
                ShellEvent::InputClosed => return Ok(false),
            };
            let line = line.trim();

            match line.split_whitespace().next() {
                Some("login") => {
                    let rest = line.strip_prefix("login").unwrap_or_default().trim();
                    let mut parts = rest.splitn(2, char::is_whitespace);
                    let Some(token) = parts.next().filter(|token| !token.is_empty()) else {
                        println!("Usage: login <token> [display name]");
                        continue;
                    };
                    let name = parts
                        .next()
                        .map(|name| name.trim().to_string())
                        .filter(|name| !name.is_empty());
                    match self.store.set(token, name) {
                        Ok(()) => {
                            self.navigator.go_to(Route::Dashboard);
                            return Ok(true);
                        }
                        Err(err) => println!("Failed to persist session: {err:#}"),
                    }
                }
                Some("quit") | Some("exit") => return Ok(false),
                _ => println!("{}", ui::render_login_screen()),
            }
        }
        Ok(false)
    }

    /// Hosts the upload workflow; a fresh machine is mounted per entry.
    /// Returns false when the user asked to quit.
    async fn dashboard_screen(
        &self,
        session: &Session,
        tx: Sender<ShellEvent>,
        rx: &mut Receiver<ShellEvent>,
    ) -> Result<bool> {
        let mut workflow = UploadWorkflow::default();
        println!("{}", ui::render_dashboard(session.display_name(), &workflow));

        while let Some(event) = rx.recv().await {
            match event {
                ShellEvent::Input(line) => {
                    match self.handle_dashboard_line(line.trim(), &mut workflow, &tx) {
                        ScreenFlow::Stay => {}
                        ScreenFlow::Leave => return Ok(true),
                        ScreenFlow::Quit => return Ok(false),
                    }
                }
                ShellEvent::SubmissionFinished(outcome) => {
                    let event = match outcome {
                        Ok(result) => WorkflowEvent::SubmitSucceeded(result),
                        Err(message) => WorkflowEvent::SubmitFailed(message),
                    };
                    workflow.apply(event);
                }
                ShellEvent::InputClosed => return Ok(false),
            }

            // A 401 during the submission forces the route to login; honor
            // it before drawing the protected screen again.
            if self.navigator.current() != Route::Dashboard {
                return Ok(true);
            }
            println!("{}", ui::render_dashboard(session.display_name(), &workflow));
        }
        Ok(false)
    }

    fn handle_dashboard_line(
        &self,
        line: &str,
        workflow: &mut UploadWorkflow,
        tx: &Sender<ShellEvent>,
    ) -> ScreenFlow {
        let mut parts = line.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let argument = parts.next().map(str::trim).unwrap_or_default();

        match command {
            "" => {}
            "pick" | "drop" if argument.is_empty() => {
                println!("Usage: {command} <path>");
            }
            "pick" => self.offer_file(workflow, argument, false),
            "drop" => self.offer_file(workflow, argument, true),
            "submit" | "analyze" => {
                if let Some(WorkflowEffect::SubmitCandidate(candidate)) =
                    workflow.apply(WorkflowEvent::Submit)
                {
                    self.spawn_submission(candidate, tx.clone());
                }
            }
            "signout" | "logout" => {
                if let Err(err) = self.store.clear() {
                    warn!(%err, "failed to clear session on sign-out");
                }
                self.navigator.redirect_to_login();
                return ScreenFlow::Leave;
            }
            "quit" | "exit" => return ScreenFlow::Quit,
            // A bare path pasted by dropping a file onto the terminal.
            _ if Path::new(line).exists() => self.offer_file(workflow, line, true),
            other => println!("Unknown command: {other}"),
        }
        ScreenFlow::Stay
    }

    fn offer_file(&self, workflow: &mut UploadWorkflow, raw_path: &str, dropped: bool) {
        match offer_from_path(Path::new(raw_path)) {
            Ok(offer) => {
                if dropped {
                    workflow.apply(WorkflowEvent::DragEnter);
                    workflow.apply(WorkflowEvent::Drop(offer));
                } else {
                    workflow.apply(WorkflowEvent::FilePicked(offer));
                }
            }
            Err(message) => println!("{message}"),
        }
    }

    fn spawn_submission(&self, candidate: UploadCandidate, tx: Sender<ShellEvent>) {
        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            let outcome = submit_candidate(&gateway, &candidate).await;
            if tx
                .send(ShellEvent::SubmissionFinished(outcome))
                .await
                .is_err()
            {
                debug!("shell gone before the submission resolved");
            }
        });
    }
}

/// Reads the candidate bytes and sends them through the gateway, mapping
/// every failure to the message the error banner shows.
async fn submit_candidate(
    gateway: &AuthGatewayClient,
    candidate: &UploadCandidate,
) -> Result<AnalysisResult, String> {
    let bytes = tokio::fs::read(&candidate.path)
        .await
        .map_err(|err| format!("Failed to read {}: {err}", candidate.name))?;
    gateway
        .analyze_document(&candidate.name, bytes)
        .await
        .map_err(|err| err.user_message())
}

fn offer_from_path(path: &Path) -> Result<FileOffer, String> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("Not a file path: {}", path.display()))?;
    let metadata = std::fs::metadata(path)
        .map_err(|err| format!("Cannot read {}: {err}", path.display()))?;
    if !metadata.is_file() {
        return Err(format!("Not a file: {}", path.display()));
    }
    Ok(FileOffer {
        path: path.to_path_buf(),
        name,
        size_bytes: metadata.len(),
    })
}

fn spawn_input_reader(tx: Sender<ShellEvent>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => {
                    let _ = tx.blocking_send(ShellEvent::InputClosed);
                    break;
                }
                Ok(_) => {
                    if tx.blocking_send(ShellEvent::Input(line.clone())).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "failed to read stdin");
                    let _ = tx.blocking_send(ShellEvent::InputClosed);
                    break;
                }
            }
        }
    });
}
