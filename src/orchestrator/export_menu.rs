//! 导出编排器 - 编排层
//!
//! ## 职责
//!
//! 接收一份完整的试卷和一个导出目标，调用对应的渲染能力并完成副作用：
//! 写剪贴板、保存文件、打开预览。
//!
//! ## 错误上报
//!
//! 所有边界失败（剪贴板、预览窗口、文件写入、渲染）都只走 [`Notifier`] 一个通道，
//! 操作本身返回 `Option`，失败时为 `None`。

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, PreviewError};
use crate::export::{self, PreviewHandle, WordRenderer};
use crate::models::GeneratedExam;
use crate::services::ClipboardSink;
use crate::utils::logging::log_export_complete;

/// 复制成功提示的显示时长
pub const COPY_NOTICE_TTL: Duration = Duration::from_secs(2);
const SAVE_NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

/// 给用户的一条提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// 自动消失时间，`None` 表示需要手动关闭
    pub ttl: Option<Duration>,
}

impl Notice {
    pub fn success(message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            ttl: Some(ttl),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
            ttl: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            ttl: None,
        }
    }
}

/// 提示通道
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// 把提示写进日志（命令行使用）
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => info!("✓ {}", notice.message),
            NoticeKind::Warning => warn!("⚠️ {}", notice.message),
            NoticeKind::Error => error!("❌ {}", notice.message),
        }
    }
}

/// 预览窗口
pub trait PreviewSurface: Send + Sync {
    fn open(&self, handle: &PreviewHandle) -> AppResult<()>;
}

/// 系统 PDF 查看器：写临时文件后调用平台默认程序打开
///
/// 设置 `SOALGEN_NO_SPAWN` 时只写文件不启动进程。
pub struct SystemViewer {
    dir: PathBuf,
}

impl SystemViewer {
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Default for SystemViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewSurface for SystemViewer {
    fn open(&self, handle: &PreviewHandle) -> AppResult<()> {
        let path = self.dir.join(format!(
            "soalgen-preview-{}.pdf",
            Utc::now().timestamp_millis()
        ));
        std::fs::write(&path, handle.bytes())
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        if std::env::var_os("SOALGEN_NO_SPAWN").is_some() {
            println!("preview:{}", path.display());
            return Ok(());
        }

        if cfg!(all(unix, not(target_os = "macos")))
            && std::env::var_os("DISPLAY").is_none()
            && std::env::var_os("WAYLAND_DISPLAY").is_none()
        {
            return Err(PreviewError::Blocked.into());
        }

        opener_command(&path)
            .spawn()
            .map_err(PreviewError::LaunchFailed)?;
        debug!("已打开预览: {}", path.display());
        Ok(())
    }
}

fn opener_command(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

/// 导出编排器
pub struct ExportOrchestrator {
    clipboard: Box<dyn ClipboardSink>,
    surface: Box<dyn PreviewSurface>,
    notifier: Box<dyn Notifier>,
    word: WordRenderer,
    output_dir: PathBuf,
}

impl ExportOrchestrator {
    pub fn new(
        config: &Config,
        clipboard: Box<dyn ClipboardSink>,
        surface: Box<dyn PreviewSurface>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            clipboard,
            surface,
            notifier,
            word: WordRenderer::new(config),
            output_dir: config.output_dir.clone(),
        }
    }

    /// 替换输出目录
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn report(&self, action: &str, err: &AppError) {
        error!("{} 失败: {}", action, err);
        self.notifier.notify(Notice::error(err.to_string()));
    }

    /// 复制纯文本到剪贴板
    pub fn copy(&self, exam: &GeneratedExam) -> Option<()> {
        let text = export::format_exam(exam);
        match self.clipboard.write_text(&text) {
            Ok(()) => {
                info!("已复制 {} 道题到剪贴板", exam.questions.len());
                self.notifier
                    .notify(Notice::success("Tersalin!", COPY_NOTICE_TTL));
                Some(())
            }
            Err(e) => {
                self.report("复制", &e);
                None
            }
        }
    }

    /// 生成 PDF 并在预览窗口打开
    pub fn preview(&self, exam: &GeneratedExam) -> Option<PreviewHandle> {
        let handle = match export::preview_handle(exam) {
            Ok(handle) => handle,
            Err(e) => {
                self.report("生成预览", &e);
                return None;
            }
        };

        match self.surface.open(&handle) {
            Ok(()) => {
                debug!("预览大小: {} 字节", handle.bytes().len());
                Some(handle)
            }
            Err(e) => {
                self.report("打开预览", &e);
                None
            }
        }
    }

    /// 下载 PDF（同步）
    pub fn download_pdf(&self, exam: &GeneratedExam) -> Option<PathBuf> {
        let result = export::render_pdf(exam).and_then(|bytes| {
            let path = self.target_path(exam, "pdf");
            write_file(&path, &bytes)?;
            log_export_complete("PDF", &path.display().to_string(), bytes.len());
            Ok(path)
        });
        self.finish_download("PDF", result)
    }

    /// 下载 Word（异步，等待图片下载）
    pub async fn download_word(&self, exam: &GeneratedExam) -> Option<PathBuf> {
        let result = match self.word.render(exam).await {
            Ok(bytes) => {
                let path = self.target_path(exam, "docx");
                write_file(&path, &bytes).map(|()| {
                    log_export_complete("DOCX", &path.display().to_string(), bytes.len());
                    path
                })
            }
            Err(e) => Err(e),
        };
        self.finish_download("Word", result)
    }

    fn target_path(&self, exam: &GeneratedExam, extension: &str) -> PathBuf {
        self.output_dir
            .join(export::export_file_name(exam, extension))
    }

    fn finish_download(&self, label: &str, result: AppResult<PathBuf>) -> Option<PathBuf> {
        match result {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.notifier.notify(Notice::success(
                    format!("{} tersimpan: {}", label, name),
                    SAVE_NOTICE_TTL,
                ));
                Some(path)
            }
            Err(e) => {
                self.report(&format!("导出 {}", label), &e);
                None
            }
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let display = path.display().to_string();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AppError::file_write_failed(&display, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| AppError::file_write_failed(display, e))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ClipboardError;
    use crate::models::exam::tests::sample_exam;
    use std::sync::{Arc, Mutex};

    /// 记录所有提示
    #[derive(Clone, Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) notices: Arc<Mutex<Vec<Notice>>>,
    }

    impl RecordingNotifier {
        pub(crate) fn taken(&self) -> Vec<Notice> {
            std::mem::take(&mut *self.notices.lock().unwrap())
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    #[derive(Clone, Default)]
    pub(crate) struct FakeClipboard {
        pub(crate) text: Arc<Mutex<Option<String>>>,
        pub(crate) fail: bool,
    }

    impl ClipboardSink for FakeClipboard {
        fn write_text(&self, text: &str) -> AppResult<()> {
            if self.fail {
                return Err(ClipboardError::CopyFailed("denied".into()).into());
            }
            *self.text.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    pub(crate) struct FakeSurface {
        pub(crate) opened: Arc<Mutex<Vec<String>>>,
        pub(crate) blocked: bool,
    }

    impl PreviewSurface for FakeSurface {
        fn open(&self, handle: &PreviewHandle) -> AppResult<()> {
            if self.blocked {
                return Err(PreviewError::Blocked.into());
            }
            self.opened.lock().unwrap().push(handle.url().to_string());
            Ok(())
        }
    }

    fn orchestrator(
        dir: &Path,
        clipboard: FakeClipboard,
        surface: FakeSurface,
        notifier: RecordingNotifier,
    ) -> ExportOrchestrator {
        let config = Config {
            image_fetch_timeout_secs: 2,
            ..Config::default()
        };
        ExportOrchestrator::new(
            &config,
            Box::new(clipboard),
            Box::new(surface),
            Box::new(notifier),
        )
        .with_output_dir(dir)
    }

    #[test]
    fn copy_writes_text_and_shows_transient_notice() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard::default();
        let notifier = RecordingNotifier::default();
        let menu = orchestrator(dir.path(), clipboard.clone(), FakeSurface::default(), notifier.clone());

        assert!(menu.copy(&sample_exam()).is_some());
        let copied = clipboard.text.lock().unwrap().clone().unwrap();
        assert!(copied.starts_with("SOAL BIOLOGI\n"));
        assert_eq!(
            notifier.taken(),
            vec![Notice::success("Tersalin!", COPY_NOTICE_TTL)]
        );
    }

    #[test]
    fn clipboard_failure_goes_to_notifier() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard {
            fail: true,
            ..Default::default()
        };
        let notifier = RecordingNotifier::default();
        let menu = orchestrator(dir.path(), clipboard, FakeSurface::default(), notifier.clone());

        assert!(menu.copy(&sample_exam()).is_none());
        let notices = notifier.taken();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Error);
    }

    #[test]
    fn blocked_preview_is_reported_not_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let surface = FakeSurface {
            blocked: true,
            ..Default::default()
        };
        let notifier = RecordingNotifier::default();
        let menu = orchestrator(dir.path(), FakeClipboard::default(), surface, notifier.clone());

        assert!(menu.preview(&sample_exam()).is_none());
        let notices = notifier.taken();
        assert_eq!(notices[0].kind, NoticeKind::Error);
        assert!(notices[0].message.contains("pop-up"));
    }

    #[test]
    fn preview_and_download_produce_identical_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let surface = FakeSurface::default();
        let menu = orchestrator(
            dir.path(),
            FakeClipboard::default(),
            surface.clone(),
            RecordingNotifier::default(),
        );
        let exam = sample_exam();

        let handle = menu.preview(&exam).unwrap();
        let path = menu.download_pdf(&exam).unwrap();

        assert_eq!(path, dir.path().join("Soal_Biologi_Ekosistem.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), handle.bytes());
        assert_eq!(surface.opened.lock().unwrap().as_slice(), &[handle.url().to_string()]);
    }

    #[tokio::test]
    async fn word_download_saves_docx() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = RecordingNotifier::default();
        let menu = orchestrator(
            dir.path(),
            FakeClipboard::default(),
            FakeSurface::default(),
            notifier.clone(),
        );

        let path = menu.download_word(&sample_exam()).await.unwrap();
        assert_eq!(path, dir.path().join("Soal_Biologi_Ekosistem.docx"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        assert_eq!(notifier.taken()[0].kind, NoticeKind::Success);
    }

    #[test]
    fn unwritable_output_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // 以普通文件占住目录位置
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"x").unwrap();

        let notifier = RecordingNotifier::default();
        let menu = orchestrator(
            &blocker,
            FakeClipboard::default(),
            FakeSurface::default(),
            notifier.clone(),
        );

        assert!(menu.download_pdf(&sample_exam()).is_none());
        assert_eq!(notifier.taken()[0].kind, NoticeKind::Error);
    }

    #[test]
    fn system_viewer_dry_run_writes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("SOALGEN_NO_SPAWN", "1");
        let viewer = SystemViewer::in_dir(dir.path());
        let handle = export::preview_handle(&sample_exam()).unwrap();

        viewer.open(&handle).unwrap();
        let written: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(written.len(), 1);
    }
}
