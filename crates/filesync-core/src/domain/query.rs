//! Version listing queries
//!
//! A [`VersionQuery`] names every copy of one logical file inside one remote
//! folder. Listing it yields [`VersionPage`]s until the store stops returning
//! a continuation token.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{PageToken, RemoteId};
use super::version::{RemoteVersion, SIGNATURE_SUFFIX};

/// Selects remote objects by exact name within a parent folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionQuery {
    /// Exact object name
    pub name: String,
    /// Folder to search in
    pub parent_id: RemoteId,
}

impl VersionQuery {
    /// Creates a query for an explicit name
    pub fn new(name: impl Into<String>, parent_id: RemoteId) -> Self {
        Self {
            name: name.into(),
            parent_id,
        }
    }

    /// Creates a query for the copies of a local file, named by its base name
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidPath`] if the path has no UTF-8 file name
    pub fn for_file(path: &Path, parent_id: RemoteId) -> Result<Self, DomainError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DomainError::InvalidPath(path.display().to_string()))?;
        Ok(Self::new(name, parent_id))
    }

    /// Query over the detached signature objects of the same file
    pub fn signatures(&self) -> Self {
        Self {
            name: format!("{}{}", self.name, SIGNATURE_SUFFIX),
            parent_id: self.parent_id.clone(),
        }
    }
}

/// One page of a version listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPage {
    /// Versions on this page, in store order
    pub versions: Vec<RemoteVersion>,
    /// Token for the next page; `None` on the last page
    pub next_page_token: Option<PageToken>,
}

impl VersionPage {
    /// Creates a final page
    pub fn last(versions: Vec<RemoteVersion>) -> Self {
        Self {
            versions,
            next_page_token: None,
        }
    }

    /// Whether more pages follow
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn folder() -> RemoteId {
        RemoteId::new("folder-1".to_string()).unwrap()
    }

    #[test]
    fn for_file_uses_base_name() {
        let q = VersionQuery::for_file(&PathBuf::from("/home/u/docs/notes.txt"), folder()).unwrap();
        assert_eq!(q.name, "notes.txt");
        assert_eq!(q.parent_id.as_str(), "folder-1");
    }

    #[test]
    fn for_file_rejects_paths_without_name() {
        assert!(matches!(
            VersionQuery::for_file(&PathBuf::from("/"), folder()),
            Err(DomainError::InvalidPath(_))
        ));
    }

    #[test]
    fn signatures_append_suffix() {
        let q = VersionQuery::new("notes.txt", folder()).signatures();
        assert_eq!(q.name, "notes.txt.sig");
        assert_eq!(q.parent_id, folder());
    }

    #[test]
    fn last_page_has_no_more() {
        assert!(!VersionPage::last(vec![]).has_more());
        let page = VersionPage {
            versions: vec![],
            next_page_token: Some(PageToken::new("t".to_string()).unwrap()),
        };
        assert!(page.has_more());
    }
}
