//! Organization directory commands: add, list, import.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use helpdesk_core::chat::repository::OrganizationRepository;
use helpdesk_types::error::RepositoryError;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum OrgCommand {
    /// Add an organization.
    Add {
        /// Display name, shown to users and in the welcome message.
        name: String,
    },

    /// List organizations.
    #[command(alias = "ls")]
    List,

    /// Add every organization named in a file, one per line.
    ///
    /// Blank lines and lines starting with `#` are ignored. Names that
    /// already exist are skipped.
    Import {
        /// Path to the file.
        path: String,
    },
}

pub async fn handle(state: &AppState, action: OrgCommand, json: bool) -> Result<()> {
    match action {
        OrgCommand::Add { name } => add_org(state, &name, json).await,
        OrgCommand::List => list_orgs(state, json).await,
        OrgCommand::Import { path } => import_orgs(state, Path::new(&path), json).await,
    }
}

async fn add_org(state: &AppState, name: &str, json: bool) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Organization name must not be empty");
    }

    let org = match state.organizations.create(name).await {
        Ok(org) => org,
        Err(RepositoryError::Conflict(_)) => {
            anyhow::bail!("Organization '{name}' already exists")
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&org)?);
    } else {
        println!(
            "  {} Added organization {} (id {})",
            style("✓").green().bold(),
            style(&org.display_name).bold(),
            style(org.id).cyan()
        );
    }
    Ok(())
}

async fn list_orgs(state: &AppState, json: bool) -> Result<()> {
    let orgs = state.organizations.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&orgs)?);
        return Ok(());
    }

    if orgs.is_empty() {
        println!();
        println!(
            "  {} No organizations yet. Add one with: {}",
            style("i").blue().bold(),
            style("helpdesk org add \"Financial Aid\"").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Name").fg(Color::White),
    ]);
    for org in &orgs {
        table.add_row(vec![
            Cell::new(org.id).fg(Color::Cyan),
            Cell::new(&org.display_name),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} organization{}",
        style(orgs.len()).bold(),
        if orgs.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Names worth importing from a directory file.
fn parse_names(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

async fn import_orgs(state: &AppState, path: &Path, json: bool) -> Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut added = Vec::new();
    let mut skipped = Vec::new();
    for name in parse_names(&contents) {
        match state.organizations.create(name).await {
            Ok(org) => added.push(org),
            Err(RepositoryError::Conflict(_)) => {
                tracing::debug!(name, "Organization exists, skipping");
                skipped.push(name.to_string());
            }
            Err(e) => return Err(e.into()),
        }
    }

    if json {
        println!(
            "{}",
            serde_json::json!({"added": added, "skipped": skipped})
        );
    } else {
        println!(
            "  {} Imported {} organization{} ({} already present)",
            style("✓").green().bold(),
            style(added.len()).bold(),
            if added.len() == 1 { "" } else { "s" },
            skipped.len()
        );
    }
    Ok(())
}
