//! 剪贴板服务 - 业务能力层
//!
//! 使用 `arboard` 访问系统剪贴板，只写不读。

use arboard::Clipboard;
use tracing::debug;

use crate::error::{AppResult, ClipboardError};

/// 纯文本剪贴板写入能力
pub trait ClipboardSink {
    fn write_text(&self, text: &str) -> AppResult<()>;
}

/// 系统剪贴板
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_text(&self, text: &str) -> AppResult<()> {
        let mut clipboard =
            Clipboard::new().map_err(|e| ClipboardError::InitializationFailed(e.to_string()))?;

        clipboard
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::CopyFailed(e.to_string()))?;

        debug!("已复制 {} 个字符到剪贴板", text.chars().count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "需要系统剪贴板，CI 环境中可能不可用"]
    fn system_clipboard_accepts_text() {
        SystemClipboard.write_text("SOAL BIOLOGI").unwrap();
    }
}
