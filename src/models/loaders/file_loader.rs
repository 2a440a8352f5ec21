use std::path::Path;

use serde::de::DeserializeOwned;
use tokio::fs;

use crate::error::{AppResult, FileError};
use crate::models::{ExamConfig, GeneratedExam};
use crate::AppError;

/// 支持的文件格式（按扩展名判断）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Toml,
}

fn detect_format(path: &Path) -> AppResult<FileFormat> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => Ok(FileFormat::Json),
        Some("toml") => Ok(FileFormat::Toml),
        _ => Err(FileError::UnsupportedFormat {
            path: path.display().to_string(),
        }
        .into()),
    }
}

async fn load_from_file<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let format = detect_format(path)?;
    let path_text = path.display().to_string();

    if !path.exists() {
        return Err(FileError::NotFound { path: path_text }.into());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(&path_text, e))?;

    match format {
        FileFormat::Json => {
            serde_json::from_str(&content).map_err(|e| AppError::file_parse_failed(&path_text, e))
        }
        FileFormat::Toml => {
            toml::from_str(&content).map_err(|e| AppError::file_parse_failed(&path_text, e))
        }
    }
}

/// 从 JSON / TOML 文件加载出题配置
pub async fn load_exam_config(path: &Path) -> AppResult<ExamConfig> {
    let config: ExamConfig = load_from_file(path).await?;
    tracing::debug!("已加载出题配置: {} / {}", config.subject, config.topic);
    Ok(config)
}

/// 从 JSON / TOML 文件加载试卷
pub async fn load_exam(path: &Path) -> AppResult<GeneratedExam> {
    let exam: GeneratedExam = load_from_file(path).await?;
    tracing::info!(
        "正在加载: {} ({} 个题目)",
        path.file_name().unwrap_or_default().to_string_lossy(),
        exam.questions.len()
    );
    Ok(exam)
}

/// 将试卷保存为 JSON（TOML 扩展名时保存为 TOML）
pub async fn save_exam(path: &Path, exam: &GeneratedExam) -> AppResult<()> {
    let path_text = path.display().to_string();
    let content = match detect_format(path)? {
        FileFormat::Json => serde_json::to_string_pretty(exam)
            .map_err(|e| AppError::file_parse_failed(&path_text, e))?,
        FileFormat::Toml => {
            toml::to_string_pretty(exam).map_err(|e| AppError::file_parse_failed(&path_text, e))?
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
    }

    fs::write(path, content)
        .await
        .map_err(|e| AppError::file_write_failed(&path_text, e))?;
    tracing::debug!("试卷已保存: {}", path_text);
    Ok(())
}
