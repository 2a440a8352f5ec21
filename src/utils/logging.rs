/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::GeneratedExam;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 debug / info 级别。
/// 重复调用是安全的（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(command: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 SOALGEN 启动 - {}", command);
    info!("{}", "=".repeat(60));
}

/// 记录试卷概要
pub fn log_exam_summary(exam: &GeneratedExam) {
    info!(
        "📄 试卷: {} / {} | 班级: {} | 题目数: {}",
        exam.config.subject,
        truncate_text(&exam.config.topic, 40),
        exam.config.grade,
        exam.questions.len()
    );
}

/// 记录导出完成信息
pub fn log_export_complete(format: &str, target: &str, bytes: usize) {
    info!("{}", "─".repeat(60));
    info!("✓ {} 导出完成: {} ({} 字节)", format, target, bytes);
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
