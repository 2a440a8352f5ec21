//! 试卷会话 - 编排层
//!
//! 持有当前试卷，负责生成、追加、编辑、删除、复制和重置。
//! AI 生成失败会写入可关闭的错误槽，已有试卷保持不变。

use tracing::{info, warn};

use crate::error::{AppResult, EditError};
use crate::models::{ExamConfig, GeneratedExam, Question, QuestionPatch};
use crate::services::logo_store::{KeyValueStore, LogoStore};
use crate::services::QuestionGenerator;
use crate::utils::logging::log_exam_summary;

/// 出题前注入已保存的 logo（配置中已有 logo 时保持不变）
pub fn with_stored_logo<S: KeyValueStore>(
    mut config: ExamConfig,
    store: &LogoStore<S>,
) -> AppResult<ExamConfig> {
    if config.logo_data().is_none() {
        config.logo = store.load()?;
    }
    Ok(config)
}

pub struct ExamSession<G: QuestionGenerator> {
    generator: G,
    exam: Option<GeneratedExam>,
    error: Option<String>,
}

impl<G: QuestionGenerator> ExamSession<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            exam: None,
            error: None,
        }
    }

    /// 从已保存的试卷继续编辑
    pub fn with_exam(generator: G, exam: GeneratedExam) -> Self {
        Self {
            generator,
            exam: Some(exam),
            error: None,
        }
    }

    pub fn exam(&self) -> Option<&GeneratedExam> {
        self.exam.as_ref()
    }

    pub fn into_exam(self) -> Option<GeneratedExam> {
        self.exam
    }

    /// 当前待显示的错误
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn exam_mut(&mut self) -> AppResult<&mut GeneratedExam> {
        self.exam.as_mut().ok_or_else(|| EditError::NoExam.into())
    }

    fn record<T>(&mut self, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = &result {
            warn!("⚠️ 生成失败: {}", e);
            self.error = Some(e.to_string());
        }
        result
    }

    /// 按配置生成新试卷，成功后替换当前试卷
    pub async fn generate(&mut self, config: ExamConfig) -> AppResult<&GeneratedExam> {
        self.error = None;
        let result = self.generator.generate_questions(&config).await;
        let questions = self.record(result)?;

        let exam = GeneratedExam::new(config, questions);
        log_exam_summary(&exam);
        Ok(self.exam.insert(exam))
    }

    /// 追加一道空白题目
    pub fn add_blank_question(&mut self) -> AppResult<String> {
        let id = self.exam_mut()?.append_blank_question();
        info!("已追加空白题目 {}", id);
        Ok(id)
    }

    /// 让 AI 按当前配置追加一道题目
    pub async fn add_ai_question(&mut self) -> AppResult<String> {
        let config = match &self.exam {
            Some(exam) => exam.config.clone(),
            None => return Err(EditError::NoExam.into()),
        };
        self.error = None;

        let result = self.generator.generate_additional_question(&config).await;
        let question = self.record(result)?;
        let id = self.exam_mut()?.append_question(question);
        info!("已追加 AI 题目 {}", id);
        Ok(id)
    }

    pub fn update_question(&mut self, id: &str, patch: QuestionPatch) -> AppResult<()> {
        self.exam_mut()?.update_question(id, patch)
    }

    pub fn delete_question(&mut self, id: &str) -> AppResult<Question> {
        self.exam_mut()?.delete_question(id)
    }

    pub fn duplicate_question(&mut self, id: &str) -> AppResult<String> {
        self.exam_mut()?.duplicate_question(id)
    }

    /// 丢弃整份试卷
    pub fn reset(&mut self) {
        self.exam = None;
        self.error = None;
        info!("试卷已重置");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::models::exam::tests::{mc_question, sample_config, sample_exam};
    use crate::services::logo_store::MemoryKeyValueStore;
    use crate::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// 按开关返回固定题目或限流错误
    #[derive(Default)]
    struct FakeGenerator {
        fail: AtomicBool,
    }

    #[async_trait]
    impl QuestionGenerator for FakeGenerator {
        async fn generate_questions(&self, config: &ExamConfig) -> AppResult<Vec<Question>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(GenerationError::RateLimited.into());
            }
            Ok((0..config.count)
                .map(|i| {
                    mc_question(
                        &format!("q-fake-{}", i),
                        &format!("Soal {}", i + 1),
                        &["A. satu", "b) dua"],
                        "satu",
                    )
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn generate_replaces_exam() {
        let mut session = ExamSession::new(FakeGenerator::default());
        let exam = session.generate(sample_config()).await.unwrap();
        assert_eq!(exam.questions.len(), 2);
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn failed_generation_keeps_existing_exam() {
        let generator = FakeGenerator::default();
        generator.fail.store(true, Ordering::SeqCst);
        let mut session = ExamSession::with_exam(generator, sample_exam());

        let err = session.generate(sample_config()).await.unwrap_err();
        assert!(err.is_generation());
        assert_eq!(session.exam().unwrap().questions[0].id, "q-1");
        assert!(session.error().unwrap().contains("Quota Exceeded"));

        session.dismiss_error();
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn ai_question_is_appended_at_the_end() {
        let mut session = ExamSession::with_exam(FakeGenerator::default(), sample_exam());
        let id = session.add_ai_question().await.unwrap();

        let exam = session.exam().unwrap();
        assert_eq!(exam.questions.len(), 3);
        assert_eq!(exam.questions[2].id, id);
        assert_eq!(exam.questions[2].text, "Soal 1");
        assert!(id.starts_with("q-ai-"));
    }

    #[test]
    fn editing_without_exam_fails() {
        let mut session = ExamSession::new(FakeGenerator::default());
        assert!(matches!(
            session.add_blank_question(),
            Err(AppError::Edit(EditError::NoExam))
        ));
        let result = tokio_test::block_on(session.add_ai_question());
        assert!(matches!(result, Err(AppError::Edit(EditError::NoExam))));
    }

    #[test]
    fn edit_operations_flow_through_session() {
        let mut session = ExamSession::with_exam(FakeGenerator::default(), sample_exam());

        let blank = session.add_blank_question().unwrap();
        let copy = session.duplicate_question("q-1").unwrap();
        session
            .update_question(
                &blank,
                QuestionPatch {
                    text: Some("Soal manual".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let removed = session.delete_question("q-2").unwrap();
        assert_eq!(removed.id, "q-2");

        let ids: Vec<&str> = session
            .exam()
            .unwrap()
            .questions
            .iter()
            .map(|q| q.id.as_str())
            .collect();
        assert_eq!(ids, vec!["q-1", copy.as_str(), blank.as_str()]);

        session.reset();
        assert!(session.exam().is_none());
    }

    #[test]
    fn stored_logo_is_injected_only_when_missing() {
        let store = LogoStore::new(MemoryKeyValueStore::default(), 150, usize::MAX);
        let png = crate::services::image_resolver::encode_png(&image::DynamicImage::new_rgb8(4, 4))
            .unwrap();
        store.save(&png).unwrap();

        let config = with_stored_logo(sample_config(), &store).unwrap();
        assert!(config.logo_data().unwrap().starts_with("data:image/png;base64,"));

        let mut own = sample_config();
        own.logo = Some("data:image/png;base64,AAAA".into());
        let kept = with_stored_logo(own, &store).unwrap();
        assert_eq!(kept.logo.as_deref(), Some("data:image/png;base64,AAAA"));
    }
}
