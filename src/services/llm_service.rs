//! LLM 出题服务 - 业务能力层
//!
//! 只负责"根据出题配置生成题目"能力，不关心试卷编辑和导出
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（Gemini OpenAI 兼容端点等）

use std::sync::OnceLock;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, GenerationError};
use crate::export::option_text::normalize_option;
use crate::models::{ExamConfig, Question, QuestionImage};

/// 出题能力
///
/// 会话层只依赖这个 trait，测试中可以替换为假实现。
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// 按配置生成一组题目
    async fn generate_questions(&self, config: &ExamConfig) -> AppResult<Vec<Question>>;

    /// 追加生成一道题目
    async fn generate_additional_question(&self, config: &ExamConfig) -> AppResult<Question> {
        let single = ExamConfig {
            count: 1,
            ..config.clone()
        };
        let mut question = self
            .generate_questions(&single)
            .await?
            .into_iter()
            .next()
            .ok_or(GenerationError::NoQuestions)?;
        question.id = format!("q-ai-{}", Utc::now().timestamp_millis());
        Ok(question)
    }
}

/// AI 返回的原始题目记录
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    text: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    correct_answer: String,
    #[serde(default)]
    specific_cognitive_tag: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

/// LLM 出题服务
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let build_err = |e: async_openai::error::OpenAIError| GenerationError::Other(e.to_string());

        let mut messages = Vec::new();
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(build_err)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(build_err)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(8192u32)
            .build()
            .map_err(build_err)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            error!("LLM API 调用失败: {}", e);
            classify_error(&e.to_string())
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl QuestionGenerator for LlmService {
    async fn generate_questions(&self, config: &ExamConfig) -> AppResult<Vec<Question>> {
        config.validate()?;
        info!(
            "🤖 正在生成 {} 道题目: {} / {} ({})",
            config.count, config.subject, config.topic, config.question_type
        );

        let prompt = build_prompt(config);
        let response = self.send_to_llm(&prompt, Some(SYSTEM_MESSAGE)).await?;
        let raw = parse_generation_response(&response)?;

        if raw.len() != config.count as usize {
            warn!("AI 返回 {} 道题，期望 {} 道", raw.len(), config.count);
        }

        let questions = map_raw_questions(config, raw, Utc::now().timestamp_millis());
        info!("✓ 生成完成，共 {} 道题目", questions.len());
        Ok(questions)
    }
}

const SYSTEM_MESSAGE: &str = "Anda adalah pembuat soal ujian profesional di Indonesia. \
Jawab HANYA dengan JSON valid tanpa teks tambahan.";

/// 构建出题提示词
pub fn build_prompt(config: &ExamConfig) -> String {
    let context = if config.context.trim().is_empty() {
        "Tidak ada"
    } else {
        config.context.trim()
    };

    let options_rule = match config.question_type {
        crate::models::QuestionType::MultipleChoice => {
            "Berikan 4 atau 5 opsi jawaban (A,B,C,D,E) pada field \"options\" tanpa huruf di depannya."
        }
        crate::models::QuestionType::TrueFalse => {
            "Field \"options\" harus berisi tepat [\"Benar\", \"Salah\"]."
        }
        _ => "Kosongkan field \"options\" (array kosong).",
    };

    format!(
        r#"Bertindaklah sebagai pembuat soal ujian profesional untuk tingkat {level}.
Buatlah {count} soal bertipe "{qtype}" untuk mata pelajaran "{subject}".

Topik Spesifik: {topic}
Kelas/Semester: {grade}
Tujuan: {purpose}
Level Kognitif Target: {cognitive}
Gaya Bahasa: {style}
Konteks Tambahan: {context}

Instruksi Khusus:
1. Soal harus edukatif, tidak ambigu, dan sesuai dengan kurikulum di Indonesia.
2. {options_rule}
3. Labeli setiap soal dengan level kognitif spesifik (Mengingat, Memahami, Menerapkan, Menganalisis, Mengevaluasi, atau Mencipta) yang sesuai dengan kategori {cognitive}.
4. Sertakan kunci jawaban dan penjelasan singkat.
5. Jika soal membutuhkan gambar, isi "imageUrl" dengan URL gambar publik yang relevan; jika tidak, hilangkan field tersebut.

Format keluaran: array JSON, setiap elemen berbentuk
{{"text": string, "options": [string], "correctAnswer": string, "specificCognitiveTag": string, "explanation": string, "imageUrl": string}}
Field wajib: text, correctAnswer, specificCognitiveTag."#,
        level = config.level.label(),
        count = config.count,
        qtype = config.question_type,
        subject = config.subject,
        topic = config.topic,
        grade = config.grade,
        purpose = config.purpose,
        cognitive = config.cognitive_level,
        style = config.style.label(),
        context = context,
        options_rule = options_rule,
    )
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```(?:json|JSON)?").expect("valid fence regex"))
}

/// 去掉 Markdown 代码块标记
pub fn clean_json_text(text: &str) -> String {
    fence_regex().replace_all(text, "").trim().to_string()
}

/// 解析 AI 返回的 JSON，接受顶层数组或 `{"questions": [...]}`
fn parse_generation_response(response: &str) -> AppResult<Vec<RawQuestion>> {
    let cleaned = clean_json_text(response);
    if cleaned.is_empty() {
        return Err(GenerationError::EmptyResponse.into());
    }

    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        error!(
            "JSON 解析失败: {} | 内容: {}",
            e,
            crate::utils::truncate_text(&cleaned, 200)
        );
        GenerationError::MalformedResponse { source: Some(e) }
    })?;

    let items = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove("questions") {
            Some(list @ Value::Array(_)) => list,
            _ => return Err(GenerationError::MalformedResponse { source: None }.into()),
        },
        _ => return Err(GenerationError::MalformedResponse { source: None }.into()),
    };

    let raw: Vec<RawQuestion> = serde_json::from_value(items)
        .map_err(|e| GenerationError::MalformedResponse { source: Some(e) })?;

    if raw.is_empty() {
        return Err(GenerationError::NoQuestions.into());
    }
    Ok(raw)
}

/// 原始记录 → 内部题目
fn map_raw_questions(config: &ExamConfig, raw: Vec<RawQuestion>, now_millis: i64) -> Vec<Question> {
    let question_type = config.question_type;

    raw.into_iter()
        .enumerate()
        .map(|(index, item)| {
            let options = if question_type.has_options() {
                let cleaned: Vec<String> = item
                    .options
                    .unwrap_or_default()
                    .iter()
                    .map(|opt| normalize_option(opt))
                    .collect();
                if cleaned.is_empty() {
                    question_type.default_options()
                } else {
                    Some(cleaned)
                }
            } else {
                None
            };

            Question {
                id: format!("q-{}-{}", now_millis, index),
                text: item.text,
                question_type,
                cognitive_level: config.cognitive_level,
                options,
                correct_answer: item.correct_answer,
                explanation: item.explanation.filter(|e| !e.trim().is_empty()),
                cognitive_tag: item.specific_cognitive_tag,
                image: item
                    .image_url
                    .filter(|url| !url.trim().is_empty())
                    .map(QuestionImage::parse),
            }
        })
        .collect()
}

/// 根据错误文本归类生成失败
pub fn classify_error(message: &str) -> GenerationError {
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("quota") || lower.contains("rate limit") {
        GenerationError::RateLimited
    } else if lower.contains("500") || lower.contains("503") || lower.contains("overloaded") {
        GenerationError::Overloaded
    } else if lower.contains("safety") || lower.contains("blocked") {
        GenerationError::SafetyBlocked
    } else {
        GenerationError::Other(message.to_string())
    }
}
