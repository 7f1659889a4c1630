use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Debug, Parser)]
#[command(
    name = "masto-archive",
    version,
    about = "Archive a Mastodon account's statuses, reply threads, and media to disk"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Walk the account's statuses from newest to oldest and archive them
    Sync,
    /// Check that every index entry points at an archived status record
    Verify,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Sync => commands::sync::run()?,
        Command::Verify => commands::verify::run()?,
    };

    for detail in &report.details {
        println!("{}: {detail}", report.command);
    }
    for issue in &report.issues {
        eprintln!("{}: {issue}", report.command);
    }

    if !report.ok {
        anyhow::bail!("{} found {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}
