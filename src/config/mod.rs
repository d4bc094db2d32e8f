use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(alias = "address", alias = "wallet")]
    pub owner: Option<String>,
    pub cluster: Option<String>,
    pub rpc_url: Option<String>,
    #[serde(alias = "per_page")]
    pub page_size: Option<usize>,
    pub timeout: Option<usize>,
    pub fallback_image: Option<String>,
    #[serde(alias = "format")]
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found '{}'", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write config '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config path '{}'", .path.display())]
    InvalidPath { path: PathBuf },
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".nftpager").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn parse_config(contents: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
    // an empty or comment-only file deserializes as null
    if contents.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with('#')
    }) {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn default_config_yaml() -> &'static str {
    r#"# nftpager config
#
# Location (default):
#   ~/.nftpager/config.yml

# Wallet whose NFTs are listed (base58)
# owner: Geh5Ss5knQGym81toYGXDbH3MFU2JCMK7E4QyeBHor1b

# Network: mainnet-beta, devnet or testnet
cluster: mainnet-beta
# A custom endpoint takes precedence over the cluster
# rpc_url: https://api.mainnet-beta.solana.com

# Paging
page_size: 1

# HTTP timeout in seconds (RPC and metadata)
timeout: 10

# Shown when an NFT has no image or its metadata could not be fetched
fallback_image: /fallbackImage.jpg

# Output: text or json
output_format: text
no_color: false
"#
}

/// Writes the commented default config unless a file already exists.
/// Returns whether a file was written.
pub fn ensure_default_config_file(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path.parent().ok_or_else(|| ConfigError::InvalidPath {
        path: path.to_path_buf(),
    })?;
    std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
        path: parent.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, default_config_yaml()).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let cfg = parse_config(default_config_yaml(), Path::new("default")).unwrap();
        assert_eq!(cfg.cluster.as_deref(), Some("mainnet-beta"));
        assert_eq!(cfg.page_size, Some(1));
        assert_eq!(cfg.timeout, Some(10));
        assert_eq!(cfg.owner, None);
        assert_eq!(cfg.no_color, Some(false));
    }

    #[test]
    fn aliases_are_accepted() {
        let cfg = parse_config("wallet: abc\nper_page: 4\nformat: json\n", Path::new("x")).unwrap();
        assert_eq!(cfg.owner.as_deref(), Some("abc"));
        assert_eq!(cfg.page_size, Some(4));
        assert_eq!(cfg.output_format.as_deref(), Some("json"));
    }

    #[test]
    fn comment_only_file_is_empty_config() {
        let cfg = parse_config("# nothing here\n\n", Path::new("x")).unwrap();
        assert_eq!(cfg, ConfigFile::default());
    }

    #[test]
    fn bad_yaml_is_reported() {
        assert!(matches!(
            parse_config("page_size: [1, 2", Path::new("x")),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_respects_allow_missing() {
        let path = std::env::temp_dir().join("nftpager-missing-config-test.yml");
        assert_eq!(load_config(&path, true).unwrap(), ConfigFile::default());
        assert!(matches!(
            load_config(&path, false),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn writes_default_config_once() {
        let dir = std::env::temp_dir().join(format!("nftpager-config-{}", std::process::id()));
        let path = dir.join("config.yml");
        let _ = std::fs::remove_dir_all(&dir);

        assert!(ensure_default_config_file(&path).unwrap());
        assert!(!ensure_default_config_file(&path).unwrap());
        assert_eq!(load_config(&path, false).unwrap().page_size, Some(1));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("./cfg.yml"), PathBuf::from("./cfg.yml"));
    }
}
