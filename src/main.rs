//! gw - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use tracing_subscriber::EnvFilter;

use gw::message::{Analysis, TypeSet, Violation};
use gw::workflow::RefreshOutcome;
use gw::{GitCli, PendingDocument, Workspace};

/// Environment variable holding the log filter.
const LOG_ENV_VAR: &str = "GW_LOG";

/// Assemble conventional commits from a pending-changes document.
#[derive(Parser, Debug)]
#[command(name = "gw")]
#[command(about = "Assemble conventional commits from a pending-changes document")]
#[command(version)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "dir", default_value = ".", global = true)]
    dir: PathBuf,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the working tree and generate or refresh the pending document
    Prepare {
        /// Replace the draft commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Validate a commit message and store it as the draft
    Message {
        /// The commit message
        message: String,

        /// Store the message even if it is not a valid conventional commit
        #[arg(long)]
        force: bool,
    },

    /// Refresh the pending document and print it with the message check
    Review,

    /// Stage the listed files and commit them
    Commit {
        /// Use this message instead of the draft
        #[arg(short, long)]
        message: Option<String>,

        /// Amend the previous commit
        #[arg(long)]
        amend: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let workspace = Workspace::open(&cli.dir)
        .context("gw must be run inside a git working tree with git installed")?;

    match cli.command {
        Command::Prepare { message } => prepare(&workspace, message.as_deref()).await,
        Command::Message { message, force } => set_message(&workspace, &message, force).await,
        Command::Review => review(&workspace).await,
        Command::Commit {
            message,
            amend,
            yes,
        } => commit(&workspace, message.as_deref(), amend, yes).await,
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn prepare(workspace: &Workspace<GitCli>, message: Option<&str>) -> Result<()> {
    let outcome = workspace
        .refresh(message)
        .await
        .context("Failed to refresh the pending document")?;

    print_refresh(workspace, &outcome);
    Ok(())
}

async fn set_message(workspace: &Workspace<GitCli>, message: &str, force: bool) -> Result<()> {
    let validator = workspace.validator();
    let mut force = force;

    if let Err(violations) = validator.validate(message) {
        print_violations(&violations, validator.types());
        if !force {
            force = Confirm::new()
                .with_prompt("Use this message anyway?")
                .default(false)
                .interact()
                .context("Cancelled")?;
            if !force {
                bail!("Commit message not saved");
            }
        }
    }

    let outcome = workspace
        .set_message(message, force)
        .await
        .context("Failed to save the commit message")?;

    if let Ok(ref analysis) = outcome.validation {
        print_warnings(analysis);
    }
    print_refresh(workspace, &outcome.refresh);
    Ok(())
}

async fn review(workspace: &Workspace<GitCli>) -> Result<()> {
    let review = workspace
        .review()
        .await
        .context("Failed to refresh the pending document")?;

    if let Some(ref backup) = review.refresh.recovered_from {
        eprintln!(
            "Warning: the pending document was unreadable and has been rebuilt (previous version: {})",
            backup.display()
        );
    }

    println!("{}", review.text);

    match review.validation {
        None => println!("No commit message drafted yet."),
        Some(Ok(ref analysis)) => {
            println!("✓ Commit message is valid: {}", analysis.message.header());
            print_warnings(analysis);
        }
        Some(Err(ref violations)) => {
            print_violations(violations, workspace.validator().types());
        }
    }

    Ok(())
}

async fn commit(
    workspace: &Workspace<GitCli>,
    message: Option<&str>,
    amend: bool,
    yes: bool,
) -> Result<()> {
    let mut document = workspace
        .pending()
        .await
        .context("Failed to load the pending document")?;
    if let Some(message) = message {
        document.set_message(message);
    }

    let validator = workspace.validator();
    if let Some(ref raw) = document.message
        && let Err(violations) = validator.validate(raw)
    {
        print_violations(&violations, validator.types());
    }

    if !yes {
        print_commit_summary(&document, amend);
        let confirmed = Confirm::new()
            .with_prompt(if amend { "Amend commit?" } else { "Commit?" })
            .default(true)
            .interact()
            .context("Cancelled")?;
        if !confirmed {
            println!("Commit cancelled. The pending document was left as is.");
            return Ok(());
        }
    }

    let result = workspace
        .commit(message, amend)
        .await
        .context("Commit failed; the pending document was left as is")?;

    let verb = if result.amended { "Amended" } else { "Created" };
    println!("✓ {} commit {}: {}", verb, short_id(&result.commit_id), result.message.header());
    for path in &result.skipped {
        eprintln!("Warning: {} no longer has changes and was left out", path);
    }
    if !result.document_cleared {
        eprintln!(
            "Warning: could not remove {}",
            workspace.store().path().display()
        );
    }

    Ok(())
}

fn print_refresh(workspace: &Workspace<GitCli>, outcome: &RefreshOutcome) {
    if let Some(ref backup) = outcome.recovered_from {
        eprintln!(
            "Warning: the pending document was unreadable and has been rebuilt (previous version: {}). \
             File descriptions may need to be re-entered.",
            backup.display()
        );
    }

    if outcome.clean {
        println!("No changes detected.");
    } else {
        let doc = &outcome.document;
        println!(
            "{} files changed (+{} -{})",
            doc.records.len(),
            doc.total_added(),
            doc.total_removed()
        );
    }

    let path = workspace.store().path().display();
    if outcome.written {
        println!("✓ Updated {}", path);
    } else {
        println!("{} is up to date", path);
    }
}

fn print_violations(violations: &[Violation], types: &TypeSet) {
    eprintln!("Invalid commit message:");
    for violation in violations {
        eprintln!("  ✗ {}", violation);
        for line in violation.hint(types).lines() {
            eprintln!("    {}", line);
        }
    }
}

fn print_warnings(analysis: &Analysis) {
    for warning in &analysis.warnings {
        eprintln!("  ! {}", warning);
    }
}

fn print_commit_summary(document: &PendingDocument, amend: bool) {
    println!();
    println!("Summary:");
    match document.message {
        Some(ref message) => println!("  Message: {}", message.lines().next().unwrap_or_default()),
        None => println!("  Message: (none)"),
    }
    if amend {
        println!("  Mode:    amend previous commit");
    }
    println!("  Files:");
    if document.records.is_empty() {
        println!("    (none)");
    }
    for record in &document.records {
        match record.prior_path {
            Some(ref prior) => println!("    {} -> {}", prior, record.path),
            None => println!("    {}", record.path),
        }
    }
    println!();
}

fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}
