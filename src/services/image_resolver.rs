//! 图片解析服务 - 业务能力层
//!
//! 只负责"把题目配图变成可嵌入的位图"，不关心渲染。
//! 失败是正常情况：调用方拿到 `None` 后直接跳过图片。

use std::io::Cursor;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppResult, ExportError};
use crate::models::QuestionImage;

/// 解析 data URL，返回 (MIME 类型, 原始字节)
pub fn decode_data_url(data_url: &str) -> AppResult<(String, Vec<u8>)> {
    let rest = data_url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| ExportError::InvalidDataUrl("缺少 data: 前缀".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ExportError::InvalidDataUrl("缺少逗号分隔符".to_string()))?;

    let mut parts = meta.split(';');
    let mime = parts.next().unwrap_or_default().to_string();
    if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(ExportError::InvalidDataUrl("仅支持 base64 编码".to_string()).into());
    }

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| ExportError::InvalidDataUrl(e.to_string()))?;
    Ok((mime, bytes))
}

/// 把位图编码为 data URL（PNG）
pub fn encode_png_data_url(image: &DynamicImage) -> AppResult<String> {
    let png = encode_png(image)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// 编码为 PNG 字节
pub fn encode_png(image: &DynamicImage) -> AppResult<Vec<u8>> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// 解码内嵌 data URL 图片
pub fn decode_inline(data_url: &str) -> AppResult<DynamicImage> {
    let (mime, bytes) = decode_data_url(data_url)?;
    debug!("解码内嵌图片: {} ({} 字节)", mime, bytes.len());
    Ok(image::load_from_memory(&bytes)?)
}

/// 尝试解码内嵌图片，失败时返回 `None`
pub fn try_decode_inline(data_url: &str) -> Option<DynamicImage> {
    match decode_inline(data_url) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("⚠️ 内嵌图片无法解码，已跳过: {}", e);
            None
        }
    }
}

/// 图片解析服务
///
/// 内嵌图片直接解码；远程图片通过 HTTP 下载后解码。
pub struct ImageResolver {
    client: reqwest::Client,
}

impl ImageResolver {
    pub fn new(config: &Config) -> Self {
        Self::with_timeout(Duration::from_secs(config.image_fetch_timeout_secs))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("创建 HTTP 客户端失败，使用默认配置: {}", e);
                reqwest::Client::new()
            });
        Self { client }
    }

    /// 解析题目配图
    pub async fn resolve(&self, image: &QuestionImage) -> AppResult<DynamicImage> {
        match image {
            QuestionImage::Inline(data_url) => decode_inline(data_url),
            QuestionImage::Remote(url) => self.fetch(url).await,
        }
    }

    /// 解析题目配图，任何失败都返回 `None`
    pub async fn try_resolve(&self, image: &QuestionImage) -> Option<DynamicImage> {
        match self.resolve(image).await {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(
                    "⚠️ 图片不可用，已跳过: {} ({})",
                    crate::utils::truncate_text(image.as_str(), 80),
                    e
                );
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> AppResult<DynamicImage> {
        debug!("下载远程图片: {}", url);
        let fetch_err = |source| ExportError::ImageFetch {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_err)?;
        let bytes = response.bytes().await.map_err(fetch_err)?;

        debug!("下载完成: {} 字节", bytes.len());
        Ok(image::load_from_memory(&bytes)?)
    }
}
