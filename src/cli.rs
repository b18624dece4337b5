use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Resume fraud-analysis client.
///
/// Without a subcommand the interactive shell starts on the dashboard (or
/// the sign-in screen when no session is stored).
#[derive(Debug, Parser)]
#[command(name = "frauddetect", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the credential issued by the authentication service.
    Login {
        /// Credential token.
        #[arg(long)]
        token: String,
        /// Display name shown in the dashboard greeting.
        #[arg(long)]
        name: Option<String>,
    },
    /// Clear the stored session.
    Logout,
    /// Analyze a single document and print the verdict.
    Analyze {
        /// Path to a PDF or DOCX file.
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_login_with_token_and_name() {
        let cli = Cli::parse_from(["frauddetect", "login", "--token", "tok-1", "--name", "Alice"]);
        match cli.command {
            Some(Command::Login { token, name }) => {
                assert_eq!(token, "tok-1");
                assert_eq!(name.as_deref(), Some("Alice"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_analyze_path() {
        let cli = Cli::parse_from(["frauddetect", "analyze", "resume.pdf"]);
        match cli.command {
            Some(Command::Analyze { path }) => assert_eq!(path, PathBuf::from("resume.pdf")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::parse_from(["frauddetect"]);
        assert!(cli.command.is_none());
    }
}
