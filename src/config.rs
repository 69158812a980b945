use std::collections::HashMap;
use std::fs;
use std::path::Path;
use serde::Deserialize;
use crate::core::{ChunkedConfig, Result, UploadError, DEFAULT_CHUNK_SIZE};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// 接收端基础地址，分片提交到 `{server_url}upload`
    pub server_url: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// 每个请求附带的额外头部，例如 Authorization
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            headers: HashMap::new(),
            timeout_secs: None,
        }
    }

    pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .map_err(|err| UploadError::config(format!("Can't read {:?}: {}", path, err)))?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(config_str)
            .map_err(|err| UploadError::config(format!("Can't parse config: {}", err)))?;

        if config.chunk_size == 0 {
            return Err(UploadError::InvalidChunkSize(config.chunk_size));
        }

        Ok(config)
    }

    pub fn chunked_config(&self) -> ChunkedConfig {
        ChunkedConfig {
            chunk_size: self.chunk_size,
        }
    }
}
