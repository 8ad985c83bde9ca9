//! Folder entity model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::snippet::Snippet;

/// A folder organizing snippets. Folders form a forest via `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Server-generated identifier.
    pub id: String,
    /// Folder name.
    pub name: String,
    /// The folder owner.
    pub owner_id: i64,
    /// Parent folder ID (null for root folders).
    pub parent_id: Option<String>,
    /// Project scope.
    pub project_id: i64,
}

impl Folder {
    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new folder. The id is never client-supplied.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewFolder {
    /// Folder name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// The folder owner.
    pub owner_id: i64,
    /// Parent folder (None for root).
    pub parent_id: Option<String>,
    /// Project scope.
    pub project_id: i64,
}

impl NewFolder {
    /// Assign a freshly generated id.
    pub fn into_folder(self) -> Folder {
        Folder {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            owner_id: self.owner_id,
            parent_id: self.parent_id,
            project_id: self.project_id,
        }
    }
}

/// A position in the folder forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum FolderRef {
    /// Top level (no folder).
    Root,
    /// Inside the folder with this id.
    Folder(String),
}

impl FolderRef {
    /// `None` is the root, `Some(id)` a folder.
    pub fn from_option(id: Option<&str>) -> Self {
        id.map_or(Self::Root, |id| Self::Folder(id.to_string()))
    }

    /// The folder id, or `None` for the root.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Folder(id) => Some(id),
        }
    }

    /// Whether an item whose parent is `parent` lives directly here.
    pub fn contains(&self, parent: Option<&str>) -> bool {
        self.id() == parent
    }
}

/// Criteria for listing folders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderFilter {
    /// `None` lists every folder; otherwise only direct children of it.
    pub parent: Option<FolderRef>,
}

impl FolderFilter {
    /// Every folder.
    pub fn all() -> Self {
        Self::default()
    }

    /// Direct children of `parent`.
    pub fn children_of(parent: FolderRef) -> Self {
        Self {
            parent: Some(parent),
        }
    }

    /// Whether `folder` satisfies the filter.
    pub fn matches(&self, folder: &Folder) -> bool {
        self.parent
            .as_ref()
            .is_none_or(|p| p.contains(folder.parent_id.as_deref()))
    }
}

/// One level of the folder tree: child folders plus the snippets in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderContents {
    /// Direct child folders.
    pub folders: Vec<Folder>,
    /// Snippets directly inside.
    pub contents: Vec<Snippet>,
}
