//! 窗口位置设置：JSON 文件存于数据目录，启动时读取、拖拽结束时写回

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// 上次窗口左上角的桌面坐标（逻辑像素）
    pub window_pos: Option<(f32, f32)>,
}

pub fn settings_path() -> PathBuf {
    crate::db::data_dir().join(SETTINGS_FILENAME)
}

/// 读取设置，文件缺失或损坏时回落到默认值
pub fn load() -> Settings {
    load_from(&settings_path())
}

fn load_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
        Err(_) => Settings::default(),
    }
}

pub fn save(settings: &Settings) -> Result<(), SettingsError> {
    save_to(&settings_path(), settings)
}

fn save_to(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!("pmdr-settings-test-{}.json", std::process::id()));
        let settings = Settings { window_pos: Some((120.5, 64.0)) };
        save_to(&path, &settings).expect("save settings");
        assert_eq!(load_from(&path), settings);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_or_corrupt_file_falls_back_to_default() {
        let missing = std::env::temp_dir().join("pmdr-settings-does-not-exist.json");
        assert_eq!(load_from(&missing), Settings::default());

        let corrupt = std::env::temp_dir().join(format!("pmdr-settings-corrupt-{}.json", std::process::id()));
        std::fs::write(&corrupt, "{ not json").unwrap();
        assert_eq!(load_from(&corrupt), Settings::default());
        let _ = std::fs::remove_file(&corrupt);
    }
}
