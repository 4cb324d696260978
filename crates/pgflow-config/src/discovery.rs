//! 設定ファイル発見ロジック
//!
//! pgflow.kdl を自動的に発見する。
//! 環境変数 → 上方向探索 → グローバル設定 の順。

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 設定ファイル名
pub const CONFIG_FILENAME: &str = "pgflow.kdl";

/// 設定ファイルパスの環境変数
pub const CONFIG_PATH_ENV: &str = "PGFLOW_CONFIG_PATH";

/// pgflowのグローバル設定ディレクトリ (~/.config/pgflow)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("pgflow"))
}

/// pgflow.kdl を探す
///
/// 検索順序:
/// 1. PGFLOW_CONFIG_PATH 環境変数
/// 2. カレントディレクトリから上方向探索
/// 3. ~/.config/pgflow/pgflow.kdl (グローバル設定)
#[tracing::instrument]
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数
    if let Ok(path_str) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(&path_str);
        debug!(env_path = %path_str, "Checking PGFLOW_CONFIG_PATH");
        if path.exists() {
            info!(config_path = %path.display(), "Found config from environment variable");
            return Ok(path);
        }
        warn!(env_path = %path_str, "PGFLOW_CONFIG_PATH is set but file does not exist");
    }

    // 2. カレントディレクトリから上に向かって探す
    let current_dir = std::env::current_dir()?;
    if let Some(path) = find_config_from(&current_dir) {
        return Ok(path);
    }

    // 3. グローバル設定
    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join(CONFIG_FILENAME);
        if global_config.exists() {
            info!(config_path = %global_config.display(), "Found global config");
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// 指定ディレクトリから上方向に pgflow.kdl を探す
pub fn find_config_from(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    debug!(start_dir = %start_dir.display(), "Searching for {}", CONFIG_FILENAME);

    loop {
        let config_file = current.join(CONFIG_FILENAME);
        if config_file.is_file() {
            info!(config_path = %config_file.display(), "Found config file");
            return Some(config_file);
        }

        if !current.pop() {
            break;
        }
    }

    debug!("Config file not found");
    None
}

/// 設定ファイルのパスからプロジェクトルート (.pgflow/ を置く場所) を取得
pub fn project_root(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_find_config_from_current() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), "// test").unwrap();

        let result = find_config_from(temp_dir.path()).unwrap();
        assert_eq!(result, temp_dir.path().join(CONFIG_FILENAME));
    }

    #[test]
    fn test_find_config_from_parent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), "// root").unwrap();

        let result = find_config_from(&nested).unwrap();
        assert_eq!(result, temp_dir.path().join(CONFIG_FILENAME));
    }

    #[test]
    fn test_nearest_config_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("service");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), "// root").unwrap();
        fs::write(nested.join(CONFIG_FILENAME), "// nested").unwrap();

        let result = find_config_from(&nested).unwrap();
        assert_eq!(result, nested.join(CONFIG_FILENAME));
    }

    #[test]
    fn test_directory_named_like_config_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("x");
        fs::create_dir_all(nested.join(CONFIG_FILENAME)).unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), "// root").unwrap();

        let result = find_config_from(&nested).unwrap();
        assert_eq!(result, temp_dir.path().join(CONFIG_FILENAME));
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.kdl");
        fs::write(&config_path, "// custom").unwrap();

        temp_env::with_var(CONFIG_PATH_ENV, Some(&config_path), || {
            let result = find_config_file().unwrap();
            assert_eq!(result, config_path);
        });
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), "// test").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();
        let result = temp_env::with_var_unset(CONFIG_PATH_ENV, find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with(CONFIG_FILENAME));
    }

    #[test]
    fn test_project_root() {
        assert_eq!(
            project_root(Path::new("/srv/app/pgflow.kdl")),
            Path::new("/srv/app")
        );
        assert_eq!(project_root(Path::new("pgflow.kdl")), Path::new("."));
    }
}
