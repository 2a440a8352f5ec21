use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use soalgen::config::Config;
use soalgen::export::format_exam;
use soalgen::models::{load_exam, load_exam_config, save_exam, GeneratedExam, QuestionPatch};
use soalgen::orchestrator::{
    with_stored_logo, ExamSession, ExportOrchestrator, LogNotifier, SystemViewer,
};
use soalgen::services::{LlmService, LogoStore, SystemClipboard};
use soalgen::utils::logging::{log_exam_summary, log_startup};

#[derive(Debug, Parser)]
#[command(name = "soalgen")]
#[command(about = "Generator soal ujian berbasis AI")]
pub struct Cli {
    /// 输出 debug 日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 按出题配置生成试卷
    Generate {
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
        #[arg(long, default_value = "exam.json")]
        out: PathBuf,
    },
    /// 在试卷末尾追加一道题
    Add {
        #[arg(value_name = "EXAM")]
        exam: PathBuf,
        /// 让 AI 生成，而不是追加空白题目
        #[arg(long)]
        ai: bool,
    },
    /// 修改一道题
    Edit {
        #[arg(value_name = "EXAM")]
        exam: PathBuf,
        #[arg(value_name = "ID")]
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        answer: Option<String>,
        #[arg(long)]
        explanation: Option<String>,
        /// 可重复，按顺序替换全部选项
        #[arg(long = "option")]
        options: Vec<String>,
    },
    /// 删除一道题
    Delete {
        #[arg(value_name = "EXAM")]
        exam: PathBuf,
        #[arg(value_name = "ID")]
        id: String,
    },
    /// 复制一道题并插在它后面
    Duplicate {
        #[arg(value_name = "EXAM")]
        exam: PathBuf,
        #[arg(value_name = "ID")]
        id: String,
    },
    /// 导出试卷
    Export {
        #[arg(value_name = "EXAM")]
        exam: PathBuf,
        #[arg(long, value_enum)]
        format: ExportFormat,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// 管理保存的学校 logo
    Logo {
        #[command(subcommand)]
        action: LogoAction,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Text,
    Pdf,
    Docx,
    Preview,
}

#[derive(Debug, Subcommand)]
enum LogoAction {
    /// 保存图片为 logo
    Set {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
    /// 删除已保存的 logo
    Clear,
    /// 查看是否已保存 logo
    Show,
}

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 执行一条命令
    pub async fn run(&self, cli: Cli) -> Result<()> {
        match cli.command {
            Commands::Generate { config, out } => self.generate(&config, &out).await,
            Commands::Add { exam, ai } => self.add(&exam, ai).await,
            Commands::Edit {
                exam,
                id,
                text,
                answer,
                explanation,
                options,
            } => {
                let patch = QuestionPatch {
                    text,
                    correct_answer: answer,
                    explanation: explanation.map(Some),
                    options: (!options.is_empty()).then_some(options),
                    ..Default::default()
                };
                self.edit(&exam, |session| session.update_question(&id, patch))
                    .await
            }
            Commands::Delete { exam, id } => {
                self.edit(&exam, |session| session.delete_question(&id).map(|_| ()))
                    .await
            }
            Commands::Duplicate { exam, id } => {
                self.edit(&exam, |session| {
                    let copy = session.duplicate_question(&id)?;
                    println!("{}", copy);
                    Ok(())
                })
                .await
            }
            Commands::Export {
                exam,
                format,
                out_dir,
            } => self.export(&exam, format, out_dir).await,
            Commands::Logo { action } => self.logo(action),
        }
    }

    fn session(&self) -> Result<ExamSession<LlmService>> {
        self.config.require_api_key()?;
        Ok(ExamSession::new(LlmService::new(&self.config)))
    }

    async fn generate(&self, config_path: &Path, out: &Path) -> Result<()> {
        log_startup("generate");
        let exam_config = load_exam_config(config_path).await?;
        let exam_config = with_stored_logo(exam_config, &LogoStore::from_config(&self.config))?;

        let mut session = self.session()?;
        let exam = session.generate(exam_config).await?;
        save_exam(out, exam).await?;

        info!("✓ 试卷已保存: {}", out.display());
        println!("{}", out.display());
        Ok(())
    }

    async fn add(&self, exam_path: &Path, ai: bool) -> Result<()> {
        let exam = load_exam(exam_path).await?;
        let mut session = ExamSession::with_exam(LlmService::new(&self.config), exam);
        let id = if ai {
            self.config.require_api_key()?;
            session.add_ai_question().await?
        } else {
            session.add_blank_question()?
        };
        store(exam_path, session.into_exam()).await?;
        println!("{}", id);
        Ok(())
    }

    /// 读取试卷，执行一次编辑后写回
    async fn edit<F>(&self, exam_path: &Path, apply: F) -> Result<()>
    where
        F: FnOnce(&mut ExamSession<LlmService>) -> soalgen::AppResult<()>,
    {
        let exam = load_exam(exam_path).await?;
        let mut session = ExamSession::with_exam(LlmService::new(&self.config), exam);
        apply(&mut session)?;
        store(exam_path, session.into_exam()).await
    }

    async fn export(
        &self,
        exam_path: &Path,
        format: ExportFormat,
        out_dir: Option<PathBuf>,
    ) -> Result<()> {
        let exam = load_exam(exam_path).await?;
        log_exam_summary(&exam);

        let mut orchestrator = ExportOrchestrator::new(
            &self.config,
            Box::new(SystemClipboard),
            Box::new(SystemViewer::new()),
            Box::new(LogNotifier),
        );
        if let Some(dir) = out_dir {
            orchestrator = orchestrator.with_output_dir(dir);
        }

        match format {
            ExportFormat::Text => {
                println!("{}", format_exam(&exam));
                if orchestrator.copy(&exam).is_none() {
                    warn!("⚠️ 未能写入剪贴板，已输出到标准输出");
                }
            }
            ExportFormat::Pdf => {
                let path = orchestrator
                    .download_pdf(&exam)
                    .context("PDF 导出失败")?;
                println!("{}", path.display());
            }
            ExportFormat::Docx => {
                let path = orchestrator
                    .download_word(&exam)
                    .await
                    .context("Word 导出失败")?;
                println!("{}", path.display());
            }
            ExportFormat::Preview => {
                if orchestrator.preview(&exam).is_none() {
                    bail!("PDF 预览失败");
                }
            }
        }
        Ok(())
    }

    fn logo(&self, action: LogoAction) -> Result<()> {
        let store = LogoStore::from_config(&self.config);
        match action {
            LogoAction::Set { image } => {
                let bytes = std::fs::read(&image)
                    .with_context(|| format!("读取图片失败: {}", image.display()))?;
                let data_url = store.save(&bytes)?;
                println!("logo tersimpan ({} byte)", data_url.len());
            }
            LogoAction::Clear => {
                store.clear()?;
                println!("logo dihapus");
            }
            LogoAction::Show => match store.load()? {
                Some(data_url) => println!("logo tersimpan ({} byte)", data_url.len()),
                None => println!("belum ada logo"),
            },
        }
        Ok(())
    }
}

async fn store(exam_path: &Path, exam: Option<GeneratedExam>) -> Result<()> {
    match exam {
        Some(exam) => {
            save_exam(exam_path, &exam).await?;
            log_exam_summary(&exam);
            Ok(())
        }
        None => bail!("试卷为空: {}", exam_path.display()),
    }
}
