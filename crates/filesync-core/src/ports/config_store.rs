//! Config store port (driven/secondary port)
//!
//! String settings chosen by the operator (sync folder name, signing key)
//! that persist across runs next to the metadata cache.

/// Key under which the sync folder name is stored
pub const KEY_FOLDER: &str = "folder";

/// Key under which the signing key id is stored
pub const KEY_SIGNING_KEY: &str = "sign_key";

/// Port trait for persisted string settings
#[async_trait::async_trait]
pub trait IConfigStore: Send + Sync {
    /// Reads a value, `None` if the key was never written
    async fn read_string(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Writes a value, replacing any previous one
    async fn write_string(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Lists every stored key and value, ordered by key
    async fn list_strings(&self) -> anyhow::Result<Vec<(String, String)>>;
}
