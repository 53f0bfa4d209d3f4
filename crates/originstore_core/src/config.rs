//! Facade configuration.

/// Logical name of the shared database every bucket lives in.
///
/// Together with [`RECORD_KEY_FIELD`] this forms the persisted-schema
/// contract: changing either breaks compatibility with previously created
/// buckets.
pub const SHARED_DATABASE_NAME: &str = "originstore/shared";

/// Field name declared as each bucket's primary key.
pub const RECORD_KEY_FIELD: &str = "key";

/// Configuration for provisioning buckets.
///
/// The defaults are the persisted-schema contract; overriding them is
/// intended for tests and for embedders that accept the compatibility
/// break.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the shared database.
    pub database_name: String,
    /// Primary-key field name declared at bucket creation.
    pub key_field: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_name: SHARED_DATABASE_NAME.to_string(),
            key_field: RECORD_KEY_FIELD.to_string(),
        }
    }
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the shared database name.
    #[must_use]
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Sets the primary-key field name.
    #[must_use]
    pub fn key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = field.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_contract_constants() {
        let config = Config::default();
        assert_eq!(config.database_name, SHARED_DATABASE_NAME);
        assert_eq!(config.key_field, RECORD_KEY_FIELD);
    }

    #[test]
    fn builder_overrides() {
        let config = Config::new().database_name("test/db").key_field("id");
        assert_eq!(config.database_name, "test/db");
        assert_eq!(config.key_field, "id");
    }
}
