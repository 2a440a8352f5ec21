use std::fmt;

use serde::{Deserialize, Serialize};

use super::exam::{CognitiveLevel, QuestionType};

/// 题目配图
///
/// 序列化为单个字符串：`data:` 开头的是内嵌图片，其余视为远程 URL。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionImage {
    /// 内嵌的 data URL（`data:image/png;base64,...`）
    Inline(String),
    /// AI 找到的远程图片地址
    Remote(String),
}

impl QuestionImage {
    pub fn parse(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim_start().starts_with("data:") {
            QuestionImage::Inline(value)
        } else {
            QuestionImage::Remote(value)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            QuestionImage::Inline(s) | QuestionImage::Remote(s) => s,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, QuestionImage::Inline(_))
    }
}

impl From<String> for QuestionImage {
    fn from(value: String) -> Self {
        QuestionImage::parse(value)
    }
}

impl From<QuestionImage> for String {
    fn from(image: QuestionImage) -> Self {
        match image {
            QuestionImage::Inline(s) | QuestionImage::Remote(s) => s,
        }
    }
}

/// 单道题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    /// 题干，手动新增时可以为空
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub cognitive_level: CognitiveLevel,
    /// 选项，仅选择题/判断题存在
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// AI 返回的具体认知标签，例如 "C4 Menganalisis"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cognitive_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<QuestionImage>,
}

impl Question {
    /// 创建空白题目，选项按题型补齐
    pub fn blank(id: String, question_type: QuestionType, cognitive_level: CognitiveLevel) -> Self {
        Self {
            id,
            text: String::new(),
            question_type,
            cognitive_level,
            options: question_type.default_options(),
            correct_answer: String::new(),
            explanation: None,
            cognitive_tag: None,
            image: None,
        }
    }

    /// 导出时需要渲染的选项
    ///
    /// 只有选择题/判断题且确实带有选项时才返回。
    pub fn display_options(&self) -> Option<&[String]> {
        if self.question_type.has_options() {
            self.options.as_deref()
        } else {
            None
        }
    }

    /// 非空的解析文本
    pub fn explanation_text(&self) -> Option<&str> {
        self.explanation
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    /// 题型变化后重新满足"选项存在当且仅当题型需要"的约束
    pub(crate) fn normalize_options(&mut self) {
        if self.question_type.has_options() {
            if self.options.is_none() {
                self.options = self.question_type.default_options();
            }
        } else {
            self.options = None;
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview = crate::utils::truncate_text(&self.text, 60);
        write!(f, "[{}] {} ({})", self.id, preview, self.question_type)
    }
}

/// 对单道题目的局部修改，`None` 表示保持不变
#[derive(Debug, Clone, Default)]
pub struct QuestionPatch {
    pub text: Option<String>,
    pub question_type: Option<QuestionType>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub explanation: Option<Option<String>>,
    pub image: Option<Option<QuestionImage>>,
}

impl QuestionPatch {
    pub(crate) fn apply(self, question: &mut Question) {
        if let Some(text) = self.text {
            question.text = text;
        }
        if let Some(question_type) = self.question_type {
            question.question_type = question_type;
        }
        if let Some(options) = self.options {
            question.options = Some(options);
        }
        if let Some(answer) = self.correct_answer {
            question.correct_answer = answer;
        }
        if let Some(explanation) = self.explanation {
            question.explanation = explanation;
        }
        if let Some(image) = self.image {
            question.image = image;
        }
        question.normalize_options();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_string_roundtrip_keeps_kind() {
        let inline: QuestionImage = serde_json::from_str("\"data:image/png;base64,AAAA\"").unwrap();
        assert!(inline.is_inline());

        let remote: QuestionImage = serde_json::from_str("\"https://example.com/a.png\"").unwrap();
        assert_eq!(remote, QuestionImage::Remote("https://example.com/a.png".into()));
        assert_eq!(serde_json::to_string(&remote).unwrap(), "\"https://example.com/a.png\"");
    }

    #[test]
    fn essay_never_displays_options() {
        let mut q = Question::blank("q-1".into(), QuestionType::Essay, CognitiveLevel::Hots);
        q.options = Some(vec!["stale".into()]);
        assert!(q.display_options().is_none());
    }

    #[test]
    fn switching_type_restores_options_invariant() {
        let mut q = Question::blank("q-1".into(), QuestionType::Essay, CognitiveLevel::Lots);
        assert!(q.options.is_none());

        QuestionPatch {
            question_type: Some(QuestionType::TrueFalse),
            ..Default::default()
        }
        .apply(&mut q);
        assert_eq!(q.options, Some(vec!["Benar".to_string(), "Salah".to_string()]));

        QuestionPatch {
            question_type: Some(QuestionType::ShortAnswer),
            ..Default::default()
        }
        .apply(&mut q);
        assert!(q.options.is_none());
    }

    #[test]
    fn blank_explanation_is_treated_as_missing() {
        let mut q = Question::blank("q-1".into(), QuestionType::Essay, CognitiveLevel::Mots);
        q.explanation = Some("   ".into());
        assert!(q.explanation_text().is_none());
    }
}
