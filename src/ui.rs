use crate::{
    gateway::AnalysisResult,
    workflow::{UploadWorkflow, WorkflowStatus},
};

const SCORE_BAR_WIDTH: usize = 20;

/// Login screen shown whenever no session is present.
pub fn render_login_screen() -> String {
    [
        "",
        "FraudDetect — Sign In",
        "=====================",
        "Paste the credential token issued by the authentication service.",
        "Commands: login <token> [display name] · quit",
        "",
    ]
    .join("\n")
}

/// Protected dashboard screen: greeting, drop zone, and exactly one of the
/// four result-area variants.
pub fn render_dashboard(display_name: &str, workflow: &UploadWorkflow) -> String {
    format!(
        "\nFraudDetect — Resume Analyzer\n\
         =============================\n\
         Hi, {display_name}\n\n\
         {drop_zone}\n\n\
         {result_area}\n\n\
         Commands: pick <path> · drop <path> · submit · signout · quit\n",
        drop_zone = render_drop_zone(workflow),
        result_area = render_result_area(workflow),
    )
}

fn render_drop_zone(workflow: &UploadWorkflow) -> String {
    let invitation = match (workflow.status(), workflow.candidate()) {
        (WorkflowStatus::DragActive, _) => "Release to drop the file here".to_string(),
        (_, Some(candidate)) => {
            format!("{} ({})", candidate.name, human_size(candidate.size_bytes))
        }
        (_, None) => "Choose a file or drag it here".to_string(),
    };

    format!(
        "+--------------------------------------------------+\n\
         | {invitation:<48} |\n\
         | {hint:<48} |\n\
         +--------------------------------------------------+",
        hint = "Supported formats: PDF, DOCX (Max 10MB)",
    )
}

/// Result area: pure function of workflow status plus auxiliary data.
/// Exactly one of placeholder, spinner, verdict panel, or error banner.
pub fn render_result_area(workflow: &UploadWorkflow) -> String {
    match workflow.status() {
        WorkflowStatus::Submitting => [
            "Analyzing...",
            "Running fraud detection algorithms",
        ]
        .join("\n"),
        WorkflowStatus::Succeeded => match workflow.result() {
            Some(result) => render_verdict(result),
            None => render_placeholder(),
        },
        _ => match workflow.error_message() {
            Some(message) => format!("! {message}"),
            None => render_placeholder(),
        },
    }
}

fn render_placeholder() -> String {
    [
        "Analysis Results",
        "Your analysis results will appear here after you upload and process a resume.",
    ]
    .join("\n")
}

fn render_verdict(result: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Fraud Score: {}%  [{}]\n",
        result.fraud_score,
        result.status_label.to_uppercase(),
    ));
    out.push_str(&format!(
        "{}\nLow Risk{:>width$}\n",
        render_score_bar(result.fraud_score),
        "High Risk",
        width = SCORE_BAR_WIDTH + 2 - "Low Risk".len(),
    ));

    out.push_str("\nDetected Findings\n");
    if result.reasons.is_empty() {
        out.push_str("No major fraud indicators detected.\n");
    } else {
        for (idx, reason) in result.reasons.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", idx + 1, reason));
        }
    }

    out.push_str("\nExtracted Content Preview\n");
    if result.extracted_text.is_empty() {
        out.push_str("No text extracted.\n");
    } else {
        out.push_str(result.extracted_text.trim_end());
        out.push('\n');
    }

    out.push_str(&format!(
        "\nCompleted at {}",
        result.completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
    ));

    out
}

fn render_score_bar(score: u8) -> String {
    let score = usize::from(score.min(100));
    let filled = score * SCORE_BAR_WIDTH / 100;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(SCORE_BAR_WIDTH - filled),
    )
}

fn human_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
