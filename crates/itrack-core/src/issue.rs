//! Issue data model for itrack
//!
//! An `Issue` is an immutable value: status changes produce a new value
//! through [`Issue::with_status`] instead of mutating in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl Status {
    /// Every status, in lifecycle order
    pub const ALL: [Status; 3] = [Status::Open, Status::InProgress, Status::Closed];

    /// Canonical token, as stored and displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::InProgress => "IN_PROGRESS",
            Status::Closed => "CLOSED",
        }
    }

    /// Comma separated list of the canonical tokens
    pub fn token_list() -> String {
        Self::ALL
            .iter()
            .map(Status::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::str::FromStr for Status {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Status::Open),
            "IN_PROGRESS" => Ok(Status::InProgress),
            "CLOSED" => Ok(Status::Closed),
            _ => Err(crate::Error::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tracked issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique identifier, assigned once at creation
    pub id: String,

    pub description: String,

    /// Another issue's ID; not checked against the store
    #[serde(default)]
    pub parent_id: Option<String>,

    pub status: Status,

    pub created_date: DateTime<Utc>,

    /// Bumped on every status change
    pub updated_date: DateTime<Utc>,
}

impl Issue {
    /// Create a new open issue with a fresh ID
    ///
    /// Both timestamps share the same instant.
    pub fn create(description: impl Into<String>, parent_id: Option<String>) -> crate::Result<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(crate::Error::InvalidDescription);
        }

        let now = Utc::now();
        Ok(Self {
            id: crate::id::generate_id(),
            description,
            parent_id,
            status: Status::Open,
            created_date: now,
            updated_date: now,
        })
    }

    /// Copy of this issue with a new status and a fresh `updated_date`
    ///
    /// The new timestamp never precedes the previous one, even if the
    /// wall clock stepped backwards.
    pub fn with_status(&self, status: Status) -> Self {
        Self {
            status,
            updated_date: Utc::now().max(self.updated_date),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.id, self.status, self.description)?;
        if let Some(ref parent) = self.parent_id {
            write!(f, " (parent: {})", parent)?;
        }
        Ok(())
    }
}
