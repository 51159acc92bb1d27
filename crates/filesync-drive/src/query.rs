//! Drive `files.list` query strings
//!
//! String literals in the Drive query language are single-quoted; `\` and `'`
//! inside them must be backslash-escaped.
//!
//! See <https://developers.google.com/drive/api/guides/search-files>.

use filesync_core::domain::VersionQuery;

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Escapes a value for use inside a single-quoted query literal
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Every non-trashed object with the query's exact name inside its parent
pub fn versions(query: &VersionQuery) -> String {
    format!(
        "name = '{}' and '{}' in parents and trashed = false",
        escape_literal(&query.name),
        escape_literal(query.parent_id.as_str())
    )
}

/// Every non-trashed folder with the given name
pub fn folder_by_name(name: &str) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escape_literal(name),
        FOLDER_MIME_TYPE
    )
}
