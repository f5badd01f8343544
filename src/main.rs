use clap::{Parser, Subcommand};
use ragdocs::commands::{add_document, ask, delete_document, list_documents, show_status};
use ragdocs::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ragdocs")]
#[command(about = "A document ingestion and retrieval-augmented question answering tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and search settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Add a file to the document index
    Add {
        /// Path of the file to ingest
        path: PathBuf,
        /// Optional name for the document (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Ask a question against the indexed documents
    Ask {
        /// The question to answer
        query: String,
        /// Minimum similarity for a section to be used as context
        #[arg(long)]
        threshold: Option<f32>,
        /// Maximum number of sections used as context
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List all indexed documents
    List,
    /// Delete a document and its indexed sections
    Delete {
        /// Document ID or name to delete
        document: String,
    },
    /// Show connectivity and index health
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Add { path, name } => {
            add_document(&path, name).await?;
        }
        Commands::Ask {
            query,
            threshold,
            limit,
        } => {
            ask(query, threshold, limit).await?;
        }
        Commands::List => {
            list_documents().await?;
        }
        Commands::Delete { document } => {
            delete_document(document).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["ragdocs", "list"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::List);
        }
    }

    #[test]
    fn add_command_with_path() {
        let cli = Cli::try_parse_from(["ragdocs", "add", "notes.txt"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Add { path, name } = parsed.command {
                assert_eq!(path, PathBuf::from("notes.txt"));
                assert_eq!(name, None);
            }
        }
    }

    #[test]
    fn add_command_with_name() {
        let cli = Cli::try_parse_from(["ragdocs", "add", "notes.txt", "--name", "My Notes"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Add { path, name } = parsed.command {
                assert_eq!(path, PathBuf::from("notes.txt"));
                assert_eq!(name, Some("My Notes".to_string()));
            }
        }
    }

    #[test]
    fn ask_command_with_overrides() {
        let cli = Cli::try_parse_from([
            "ragdocs",
            "ask",
            "What is alpha?",
            "--threshold",
            "0.5",
            "--limit",
            "3",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask {
                query,
                threshold,
                limit,
            } = parsed.command
            {
                assert_eq!(query, "What is alpha?");
                assert_eq!(threshold, Some(0.5));
                assert_eq!(limit, Some(3));
            }
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["ragdocs", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["ragdocs", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["ragdocs", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
