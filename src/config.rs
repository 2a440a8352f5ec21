use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 程序配置
///
/// 优先级：环境变量 > 配置文件（`SOALGEN_CONFIG`） > 默认值
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    /// 导出文件存放目录
    pub output_dir: PathBuf,
    /// 本地 key-value 存储文件（保存 logo）
    pub store_path: PathBuf,
    /// logo 最大高度（像素）
    pub logo_max_height_px: u32,
    /// logo 编码后的最大字节数
    pub logo_max_bytes: usize,
    /// 远程图片下载超时（秒）
    pub image_fetch_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-3-flash-preview".to_string(),
            llm_temperature: 0.7,
            output_dir: PathBuf::from("."),
            store_path: PathBuf::from("soalgen_store.json"),
            logo_max_height_px: 150,
            logo_max_bytes: 2 * 1024 * 1024,
            image_fetch_timeout_secs: 20,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → 配置文件 → 环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("SOALGEN_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        base.with_env_overrides()
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, path: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            ConfigError::FileParseFailed {
                path: path.to_string(),
                source,
            }
            .into()
        })
    }

    /// 使用环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> AppResult<Self> {
        Ok(Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_temperature: parse_env("LLM_TEMPERATURE", "f32")?.unwrap_or(self.llm_temperature),
            output_dir: std::env::var("OUTPUT_DIR").map(PathBuf::from).unwrap_or(self.output_dir),
            store_path: std::env::var("STORE_PATH").map(PathBuf::from).unwrap_or(self.store_path),
            logo_max_height_px: self.logo_max_height_px,
            logo_max_bytes: self.logo_max_bytes,
            image_fetch_timeout_secs: parse_env("IMAGE_FETCH_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.image_fetch_timeout_secs),
            verbose_logging: parse_env("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
        })
    }

    /// 确认 LLM 调用所需的配置齐全
    pub fn require_api_key(&self) -> AppResult<()> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey.into());
        }
        Ok(())
    }
}

/// 读取并解析环境变量；未设置时返回 `None`，格式错误时报错
fn parse_env<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_only_given_fields() {
        let config = Config::from_toml_str(
            "llm_model_name = \"gemini-2.5-pro\"\nlogo_max_height_px = 120\n",
            "test.toml",
        )
        .unwrap();

        assert_eq!(config.llm_model_name, "gemini-2.5-pro");
        assert_eq!(config.logo_max_height_px, 120);
        assert_eq!(config.image_fetch_timeout_secs, 20);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = Config::from_toml_str("logo_max_height_px = \"tall\"", "bad.toml").unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let config = Config::default();
        assert!(config.require_api_key().is_err());
    }
}
