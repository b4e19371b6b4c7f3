//! Issue service: creation and status transitions on top of a repository
//!
//! Any status may move to any other status. Existence is the only rule
//! checked here; everything else is guaranteed by the model.

use crate::store::IssueRepository;
use crate::{Error, FileIssueStore, Issue, Result, Status};

pub struct IssueService<R = FileIssueStore> {
    repository: R,
}

impl<R: IssueRepository> IssueService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Access the underlying repository
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Create and persist a new open issue
    pub fn create_issue(&self, description: &str, parent_id: Option<&str>) -> Result<Issue> {
        let issue = Issue::create(description, parent_id.map(str::to_string))?;
        let issue = self.repository.save(issue)?;
        tracing::info!(id = %issue.id, parent = ?issue.parent_id, "created issue");
        Ok(issue)
    }

    /// Move an existing issue to `status`
    ///
    /// Setting the current status again still bumps `updated_date`.
    pub fn update_status(&self, issue_id: &str, status: Status) -> Result<Issue> {
        let issue = self
            .repository
            .find_by_id(issue_id)
            .ok_or_else(|| Error::IssueNotFound(issue_id.to_string()))?;

        let updated = issue.with_status(status);
        self.repository.update(updated.clone())?;
        tracing::info!(id = %updated.id, from = %issue.status, to = %status, "updated issue status");
        Ok(updated)
    }

    pub fn list_by_status(&self, status: Status) -> Vec<Issue> {
        self.repository.find_by_status(status)
    }

    pub fn find_issue(&self, issue_id: &str) -> Option<Issue> {
        self.repository.find_by_id(issue_id)
    }
}
