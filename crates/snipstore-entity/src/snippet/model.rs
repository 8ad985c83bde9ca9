//! Snippet entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use snipstore_core::AppResult;

use crate::context::{Actor, SYSTEM_USERNAME};
use crate::schema;

use super::visibility::Visibility;

/// Snippet kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnippetType {
    /// A SQL query.
    #[serde(rename = "sql")]
    Sql,
}

/// Version tag of the `content` document. Fixed, not negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// `"1.0"`.
    #[default]
    #[serde(rename = "1.0")]
    V1,
}

impl SchemaVersion {
    /// Return the version tag as written in JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "1.0",
        }
    }
}

/// The structured payload of a snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetContent {
    /// SQL text.
    pub sql: String,
    /// Whether the owner starred it.
    pub favorite: bool,
    /// Identifier of the content body.
    pub content_id: String,
    /// Document version tag.
    pub schema_version: SchemaVersion,
}

/// Denormalized `{id, username}` display snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSnapshot {
    /// User id.
    pub id: i64,
    /// Display name at the time of the write.
    pub username: String,
}

impl OwnerSnapshot {
    /// The `{id: 1, username: "system"}` placeholder.
    pub fn system() -> Self {
        Self {
            id: 1,
            username: SYSTEM_USERNAME.to_string(),
        }
    }
}

impl Default for OwnerSnapshot {
    fn default() -> Self {
        Self::system()
    }
}

/// A stored snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Unique, immutable identifier; also the filesystem record key.
    pub id: String,
    /// When the record was (last) created.
    pub inserted_at: DateTime<Utc>,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
    /// Kind discriminator.
    #[serde(rename = "type")]
    pub snippet_type: SnippetType,
    /// Display label.
    pub name: String,
    /// Optional free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The query and its flags.
    pub content: SnippetContent,
    /// Sharing scope.
    pub visibility: Visibility,
    /// Project scope.
    pub project_id: i64,
    /// Containing folder; `None` for root-level snippets.
    pub folder_id: Option<String>,
    /// Numeric owner id.
    pub owner_id: i64,
    /// Owner display snapshot.
    pub owner: OwnerSnapshot,
    /// Display snapshot of the last writer.
    pub updated_by: OwnerSnapshot,
}

impl Snippet {
    /// Whether the snippet sits at the root (no folder).
    pub fn is_root_level(&self) -> bool {
        self.folder_id.is_none()
    }

    /// Apply a partial update to this record.
    ///
    /// Top-level fields of `patch` replace those of `self` (shallow merge),
    /// the merged document is re-validated, `inserted_at` is kept, and
    /// `updated_at` becomes `now` (never earlier than `inserted_at`).
    /// The stored `owner` snapshot survives unless the patch reassigns
    /// `owner_id`; `updated_by` always becomes `actor`.
    pub fn apply_patch(
        &self,
        patch: &Value,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> AppResult<Snippet> {
        let patch = schema::validate_patch(patch)?;
        let merged = schema::merge_patch(self, &patch)?;
        let validated = schema::validate_snippet(&merged)?;
        let project_id = validated.project_id;
        let updated_at = now.max(self.inserted_at);
        let mut updated = validated.into_snippet(actor, project_id, self.inserted_at, updated_at);
        if updated.owner_id == self.owner_id {
            updated.owner = self.owner.clone();
        }
        Ok(updated)
    }
}

/// A validated snippet payload, before server-assigned fields are stamped.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewSnippet {
    /// Record id.
    #[validate(length(min = 1, max = 128))]
    pub id: String,
    /// Kind discriminator.
    pub snippet_type: SnippetType,
    /// Display label.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Optional free text.
    pub description: Option<String>,
    /// The query and its flags.
    pub content: SnippetContent,
    /// Sharing scope.
    pub visibility: Visibility,
    /// Project scope (defaults to 1).
    pub project_id: i64,
    /// Containing folder (defaults to none).
    pub folder_id: Option<String>,
    /// Numeric owner id.
    pub owner_id: i64,
    /// Client-supplied owner snapshot; replaced on write.
    pub owner: OwnerSnapshot,
    /// Client-supplied last-writer snapshot; replaced on write.
    pub updated_by: OwnerSnapshot,
}

impl NewSnippet {
    /// Stamp server-assigned fields and produce the record to persist.
    ///
    /// `owner` and `updated_by` are always re-derived from `actor`; the
    /// client-supplied snapshots are discarded.
    pub fn into_snippet(
        self,
        actor: &Actor,
        project_id: i64,
        inserted_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Snippet {
        Snippet {
            owner: actor.owner_snapshot(self.owner_id),
            updated_by: actor.snapshot(),
            id: self.id,
            inserted_at,
            updated_at,
            snippet_type: self.snippet_type,
            name: self.name,
            description: self.description,
            content: self.content,
            visibility: self.visibility,
            project_id,
            folder_id: self.folder_id,
            owner_id: self.owner_id,
        }
    }
}
