use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the stored CSV blobs, one file per registered name.
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Bound on a single blob-store write or delete; elapsed operations fail
    /// as retryable storage errors.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            timeout_secs: default_timeout_secs(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_max_bytes() -> u64 {
    16 * 1024 * 1024
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["csv".to_string()]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.upload.max_bytes == 0 {
        anyhow::bail!("upload.max_bytes must be > 0");
    }

    if config.upload.timeout_secs == 0 {
        anyhow::bail!("upload.timeout_secs must be > 0");
    }

    if config.upload.allowed_extensions.is_empty() {
        anyhow::bail!("upload.allowed_extensions must not be empty");
    }

    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("leads.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (tmp, path)
    }

    #[test]
    fn loads_minimal_config_with_defaults() {
        let (_tmp, path) = write_config(
            r#"[storage]
root = "./data/scrapes"

[server]
bind = "127.0.0.1:7410"
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.upload.max_bytes, 16 * 1024 * 1024);
        assert_eq!(cfg.upload.timeout_secs, 30);
        assert_eq!(cfg.upload.allowed_extensions, vec!["csv".to_string()]);
    }

    #[test]
    fn rejects_zero_max_bytes() {
        let (_tmp, path) = write_config(
            r#"[storage]
root = "./data"

[server]
bind = "127.0.0.1:7410"

[upload]
max_bytes = 0
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_empty_extension_list() {
        let (_tmp, path) = write_config(
            r#"[storage]
root = "./data"

[server]
bind = "127.0.0.1:7410"

[upload]
allowed_extensions = []
"#,
        );
        assert!(load_config(&path).is_err());
    }
}
