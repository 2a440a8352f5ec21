//! Logo 存储服务 - 业务能力层
//!
//! 只负责"保存/读取/清除一个 logo 槽位"。存储介质通过 [`KeyValueStore`] 注入，
//! 渲染层只拿到解析后的 data URL。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::imageops::FilterType;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppResult, StorageError};
use crate::services::image_resolver::encode_png_data_url;

/// logo 所在的槽位名
pub const LOGO_KEY: &str = "soalgen.logo";

/// 简单的持久化 key-value 能力
pub trait KeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// 基于 JSON 文件的存储
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> AppResult<BTreeMap<String, String>> {
        let display = self.path.display().to_string();
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                StorageError::Corrupted {
                    path: display,
                    source,
                }
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StorageError::ReadFailed {
                path: display,
                source,
            }
            .into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        let display = self.path.display().to_string();
        let content = serde_json::to_string_pretty(entries).map_err(|source| {
            StorageError::Corrupted {
                path: display.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, content).map_err(|source| {
            StorageError::WriteFailed {
                path: display,
                source,
            }
            .into()
        })
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// 内存存储（测试与一次性会话）
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

/// Logo 存储
///
/// 上传时统一缩放到不超过 `max_height_px` 高并编码为 PNG data URL，
/// 超过 `max_bytes` 时拒绝保存。
pub struct LogoStore<S: KeyValueStore> {
    store: S,
    max_height_px: u32,
    max_bytes: usize,
}

impl LogoStore<FileKeyValueStore> {
    /// 使用配置中的文件路径创建
    pub fn from_config(config: &Config) -> Self {
        LogoStore::new(
            FileKeyValueStore::new(&config.store_path),
            config.logo_max_height_px,
            config.logo_max_bytes,
        )
    }
}

impl<S: KeyValueStore> LogoStore<S> {
    pub fn new(store: S, max_height_px: u32, max_bytes: usize) -> Self {
        Self {
            store,
            max_height_px,
            max_bytes,
        }
    }

    /// 读取当前 logo
    pub fn load(&self) -> AppResult<Option<String>> {
        self.store.get(LOGO_KEY)
    }

    /// 保存上传的图片字节，返回保存后的 data URL
    pub fn save(&self, image_bytes: &[u8]) -> AppResult<String> {
        let image = image::load_from_memory(image_bytes).map_err(StorageError::InvalidImage)?;
        debug!("上传 logo: {}x{}", image.width(), image.height());

        let image = if image.height() > self.max_height_px {
            let width = ((image.width() as u64 * self.max_height_px as u64)
                / image.height() as u64)
                .max(1) as u32;
            image.resize_exact(width, self.max_height_px, FilterType::Triangle)
        } else {
            image
        };

        let data_url = encode_png_data_url(&image)?;
        if data_url.len() > self.max_bytes {
            return Err(StorageError::QuotaExceeded {
                size: data_url.len(),
                limit: self.max_bytes,
            }
            .into());
        }

        self.store.set(LOGO_KEY, &data_url)?;
        info!("✓ logo 已保存 ({}x{})", image.width(), image.height());
        Ok(data_url)
    }

    /// 清除 logo
    pub fn clear(&self) -> AppResult<()> {
        self.store.remove(LOGO_KEY)?;
        info!("logo 已清除");
        Ok(())
    }
}
