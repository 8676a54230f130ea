//! @ai:module:intent Configuration structs for the benchmark service
//! @ai:module:layer infrastructure
//! @ai:module:public_api ServiceConfig, ServerConfig, StorageConfig, PagingConfig
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// @ai:intent Main configuration for the benchmark service
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub paging: PagingConfig,
}

/// @ai:intent HTTP listener configuration
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// @ai:intent Persistence configuration
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

/// @ai:intent Page size defaults applied to query endpoints
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> PathBuf {
    PathBuf::from("benchmarks.db")
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    2000
}

impl ServerConfig {
    /// @ai:intent Address string suitable for binding a TCP listener
    /// @ai:effects pure
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl ServiceConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
[server]
port = 9090
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.storage.database_path, PathBuf::from("benchmarks.db"));
        assert_eq!(config.paging.default_page_size, 20);
        assert_eq!(config.paging.max_page_size, 2000);
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("benchmark-service.toml");

        let mut config = ServiceConfig::default();
        config.storage.database_path = temp.path().join("runs.db");
        config.paging.max_page_size = 100;
        config.save(&path).unwrap();

        let loaded = ServiceConfig::load(&path).unwrap();
        assert_eq!(loaded.storage.database_path, temp.path().join("runs.db"));
        assert_eq!(loaded.paging.max_page_size, 100);
        assert_eq!(loaded.server.listen_address(), "127.0.0.1:8080");
    }
}
