//! CLI command implementations
//!
//! Each command returns the text to print so the caller decides where it goes.

use anyhow::Result;
use colored::Colorize;
use itrack_core::{Config, Error, FileIssueStore, Issue, IssueService, Status};
use std::fmt::Write;
use std::path::PathBuf;

/// Settings shared by every command
pub struct Context {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub json: bool,
}

impl Context {
    /// Load config from `config_path`, falling back to defaults when there is none
    pub fn load(config_path: Option<PathBuf>, file: Option<PathBuf>, json: bool) -> Result<Self> {
        let config = match config_path {
            Some(ref path) => Config::load(path)?,
            None => Config::default(),
        };
        Ok(Self {
            config,
            config_path,
            file,
            json,
        })
    }

    /// Open the issues file and wrap it in a service
    fn service(&self) -> Result<IssueService> {
        let path = self.config.storage_path(self.file.as_deref());
        tracing::debug!(path = %path.display(), "opening issues file");
        let store = FileIssueStore::open(path)?;
        Ok(IssueService::new(store))
    }
}

pub fn create(ctx: &Context, description: &str, parent_id: Option<&str>) -> Result<String> {
    let service = ctx.service()?;
    let issue = service.create_issue(description, parent_id)?;

    if ctx.json {
        return Ok(serde_json::to_string(&issue)?);
    }
    Ok(format!("Created issue {}", issue.id))
}

pub fn update_status(ctx: &Context, id: &str, status: &str) -> Result<String> {
    let status: Status = status.parse()?;
    let service = ctx.service()?;
    let issue = service.update_status(id, status)?;

    if ctx.json {
        return Ok(serde_json::to_string(&issue)?);
    }
    Ok(format!("Updated issue status to {}", status))
}

pub fn list(ctx: &Context, status: &str) -> Result<String> {
    let status: Status = status.parse()?;
    let service = ctx.service()?;
    let mut issues = service.list_by_status(status);

    // Stored order is arbitrary; show oldest first
    issues.sort_by(|a, b| {
        a.created_date
            .cmp(&b.created_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    if ctx.json {
        return Ok(serde_json::to_string(&issues)?);
    }
    if issues.is_empty() {
        return Ok("No issues found".to_string());
    }

    let date_format = &ctx.config.display.date_format;
    let lines = issues
        .iter()
        .map(|issue| format_issue_line(issue, date_format))
        .collect::<Result<Vec<_>>>()?;
    Ok(lines.join("\n"))
}

fn format_issue_line(issue: &Issue, date_format: &str) -> Result<String> {
    let status = match issue.status {
        Status::Open => issue.status.as_str().white(),
        Status::InProgress => issue.status.as_str().yellow(),
        Status::Closed => issue.status.as_str().green(),
    };
    let mut line = format!("{} [{}] {}", issue.id.cyan(), status, issue.description);
    if let Some(ref parent) = issue.parent_id {
        line.push_str(&format!(" (parent: {})", parent));
    }

    // chrono reports a bad strftime spec as fmt::Error, which format! would turn into a panic
    let mut dates = String::new();
    write!(
        dates,
        "created {} updated {}",
        issue.created_date.format(date_format),
        issue.updated_date.format(date_format)
    )
    .map_err(|_| Error::Config(format!("invalid display.date_format '{}'", date_format)))?;

    Ok(format!("{} {}", line, dates.dimmed()))
}

pub fn config_show(ctx: &Context) -> Result<String> {
    if ctx.json {
        return Ok(serde_json::to_string_pretty(&ctx.config)?);
    }

    let source = match ctx.config_path {
        Some(ref path) if path.exists() => path.display().to_string(),
        _ => "defaults".to_string(),
    };
    let storage = ctx.config.storage_path(ctx.file.as_deref());

    let lines = [
        format!("{} ({})", "Current configuration:".bold(), source),
        String::new(),
        "[storage]".to_string(),
        format!("path = \"{}\"", storage.display()),
        String::new(),
        "[display]".to_string(),
        format!("colors = {}", ctx.config.display.colors),
        format!("date_format = \"{}\"", ctx.config.display.date_format),
    ];
    Ok(lines.join("\n"))
}

pub fn config_init(ctx: &Context) -> Result<String> {
    let path = ctx
        .config_path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory; pass --config"))?;

    if Config::init_file(path)? {
        Ok(format!("Wrote default config to {}", path.display()))
    } else {
        Ok(format!("Config already exists at {}", path.display()))
    }
}

pub fn config_path(ctx: &Context) -> Result<String> {
    ctx.config_path
        .as_ref()
        .map(|path| path.display().to_string())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory; pass --config"))
}

/// Message and process exit code for a failed command
///
/// 2: bad input, 3: unknown issue, 4: storage or config failure, 1: anything else.
pub fn render_error(err: &anyhow::Error) -> (String, u8) {
    let Some(known) = err.downcast_ref::<Error>() else {
        return (format!("Unexpected error: {:#}", err), 1);
    };

    let code = match known {
        Error::InvalidStatus { .. } | Error::InvalidDescription => 2,
        Error::IssueNotFound(_) => 3,
        Error::StorageInit { .. }
        | Error::StorageRead { .. }
        | Error::StorageWrite { .. }
        | Error::Config(_) => 4,
    };
    (known.to_string(), code)
}
