//! 导出格式：纯文本、PDF、Word
//!
//! 各渲染器只接收完整的 [`GeneratedExam`](crate::models::GeneratedExam)，不修改它。

pub mod docx;
pub mod filename;
pub mod option_text;
pub mod pdf;
pub mod plain_text;

pub use docx::WordRenderer;
pub use filename::export_file_name;
pub use option_text::normalize_option;
pub use pdf::{preview_handle, render_pdf, PreviewHandle};
pub use plain_text::format_exam;
