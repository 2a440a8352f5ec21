//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 把业务能力层和导出层串成用户可见的操作。
//!
//! ## 模块划分
//!
//! ### `session` - 试卷会话
//! - 持有当前试卷
//! - 调用 [`QuestionGenerator`](crate::services::QuestionGenerator) 生成或追加题目
//! - 编辑、删除、复制、重置
//! - 记录可关闭的生成错误
//!
//! ### `export_menu` - 导出菜单
//! - 复制纯文本到剪贴板
//! - 预览 / 下载 PDF
//! - 下载 Word
//! - 所有边界失败都以 [`Notice`] 形式提示
//!
//! ## 层次关系
//!
//! ```text
//! session (生成 / 编辑 GeneratedExam)
//!     ↓
//! export_menu (GeneratedExam → 剪贴板 / 预览 / 文件)
//! ```

pub mod export_menu;
pub mod session;

pub use export_menu::{
    ExportOrchestrator, LogNotifier, Notice, NoticeKind, Notifier, PreviewSurface, SystemViewer,
};
pub use session::{with_stored_logo, ExamSession};
