//! # Soalgen
//!
//! 按出题配置调用 LLM 生成试卷，并导出为纯文本、PDF 和 Word。
//!
//! ## 架构设计
//!
//! ### ① 数据层（Models）
//! - `models/` - 出题配置、题目、试卷及其编辑操作
//! - `models/loaders` - JSON / TOML 文件读写
//!
//! ### ② 业务能力层（Services）
//! - `LlmService` - 生成题目能力（实现 `QuestionGenerator`）
//! - `ImageResolver` - 图片解码 / 下载能力
//! - `LogoStore` - 保存和读取学校 logo
//! - `SystemClipboard` - 写剪贴板能力
//!
//! ### ③ 导出层（Export）
//! - `export/plain_text` - 纯文本
//! - `export/pdf` - A4 PDF（预览与下载共用同一份字节）
//! - `export/docx` - Word 文档
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 试卷会话
//! - `orchestrator/export_menu` - 导出菜单与提示

pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{ExamConfig, GeneratedExam, Question};
pub use orchestrator::{ExamSession, ExportOrchestrator};
