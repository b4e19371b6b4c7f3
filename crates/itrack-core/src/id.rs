//! ID generation for itrack issues
//!
//! IDs are random UUID v4 strings; they are never derived from issue content.

use uuid::Uuid;

/// Generate a fresh issue ID
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
