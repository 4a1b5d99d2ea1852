//! Common types used across plugit modules.

/// Reserved plugin id used as the event routing wildcard.
pub const ANY_PLUGIN: &str = "any";

/// Default id of the orchestrator.
pub const DEFAULT_CORE_ID: &str = "corePlugin";

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Check that `id` may name a real plugin.
pub fn validate_plugin_id(id: &str) -> crate::core::Result<()> {
    if id.is_empty() {
        return Err(crate::core::Error::MissingId);
    }
    if id == ANY_PLUGIN {
        return Err(crate::core::Error::ReservedId(id.to_string()));
    }
    Ok(())
}
