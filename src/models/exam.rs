use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::question::{Question, QuestionPatch};
use crate::error::{AppResult, GenerationError};
use crate::AppError;

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "Pilihan Ganda")]
    MultipleChoice,
    #[serde(rename = "Esai")]
    Essay,
    #[serde(rename = "Benar / Salah")]
    TrueFalse,
    #[serde(rename = "Isian Singkat")]
    ShortAnswer,
}

impl QuestionType {
    pub fn label(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Pilihan Ganda",
            QuestionType::Essay => "Esai",
            QuestionType::TrueFalse => "Benar / Salah",
            QuestionType::ShortAnswer => "Isian Singkat",
        }
    }

    /// 是否需要固定选项
    pub fn has_options(self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }

    /// 新建题目时的默认选项
    pub fn default_options(self) -> Option<Vec<String>> {
        match self {
            QuestionType::MultipleChoice => Some(vec![String::new(); 4]),
            QuestionType::TrueFalse => Some(vec!["Benar".to_string(), "Salah".to_string()]),
            QuestionType::Essay | QuestionType::ShortAnswer => None,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 认知层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CognitiveLevel {
    #[serde(rename = "LOTS (Mengingat & Memahami)", alias = "LOTS")]
    Lots,
    #[serde(rename = "MOTS (Menerapkan)", alias = "MOTS")]
    Mots,
    #[serde(rename = "HOTS (Menganalisis, Evaluasi, Mencipta)", alias = "HOTS")]
    Hots,
}

impl CognitiveLevel {
    pub fn label(self) -> &'static str {
        match self {
            CognitiveLevel::Lots => "LOTS (Mengingat & Memahami)",
            CognitiveLevel::Mots => "MOTS (Menerapkan)",
            CognitiveLevel::Hots => "HOTS (Menganalisis, Evaluasi, Mencipta)",
        }
    }

    /// 简短标签，例如 "HOTS"
    pub fn short_label(self) -> &'static str {
        match self {
            CognitiveLevel::Lots => "LOTS",
            CognitiveLevel::Mots => "MOTS",
            CognitiveLevel::Hots => "HOTS",
        }
    }
}

impl fmt::Display for CognitiveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 学段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "SD")]
    Elementary,
    #[serde(rename = "SMP")]
    Junior,
    #[serde(rename = "SMA/SMK")]
    Senior,
    #[serde(rename = "Perguruan Tinggi")]
    College,
    #[serde(rename = "Umum/Kursus")]
    General,
}

impl EducationLevel {
    pub fn label(self) -> &'static str {
        match self {
            EducationLevel::Elementary => "SD",
            EducationLevel::Junior => "SMP",
            EducationLevel::Senior => "SMA/SMK",
            EducationLevel::College => "Perguruan Tinggi",
            EducationLevel::General => "Umum/Kursus",
        }
    }
}

/// 出题用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearningPurpose {
    #[serde(rename = "Latihan Harian")]
    DailyPractice,
    #[serde(rename = "Ulangan Harian")]
    DailyExam,
    #[serde(rename = "Soal Evaluasi")]
    Evaluation,
    #[serde(rename = "Kuis")]
    Quiz,
    #[serde(rename = "Tugas Mandiri")]
    Homework,
}

impl LearningPurpose {
    pub fn label(self) -> &'static str {
        match self {
            LearningPurpose::DailyPractice => "Latihan Harian",
            LearningPurpose::DailyExam => "Ulangan Harian",
            LearningPurpose::Evaluation => "Soal Evaluasi",
            LearningPurpose::Quiz => "Kuis",
            LearningPurpose::Homework => "Tugas Mandiri",
        }
    }
}

impl fmt::Display for LearningPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 语言风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageStyle {
    Formal,
    #[serde(rename = "Semi-Formal")]
    SemiFormal,
    Santai,
}

impl LanguageStyle {
    pub fn label(self) -> &'static str {
        match self {
            LanguageStyle::Formal => "Formal",
            LanguageStyle::SemiFormal => "Semi-Formal",
            LanguageStyle::Santai => "Santai",
        }
    }
}

/// 教师证件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TeacherIdType {
    #[default]
    #[serde(rename = "NIP")]
    Nip,
    #[serde(rename = "NUPTK")]
    Nuptk,
    #[serde(rename = "NIK")]
    Nik,
}

impl TeacherIdType {
    pub fn label(self) -> &'static str {
        match self {
            TeacherIdType::Nip => "NIP",
            TeacherIdType::Nuptk => "NUPTK",
            TeacherIdType::Nik => "NIK",
        }
    }
}

/// 出题教师信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub identifier_type: TeacherIdType,
}

/// 出题配置（生成时冻结）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamConfig {
    pub subject: String,
    pub topic: String,
    /// 班级/学期
    pub grade: String,
    pub level: EducationLevel,
    pub purpose: LearningPurpose,
    pub question_type: QuestionType,
    pub cognitive_level: CognitiveLevel,
    pub count: u8,
    pub style: LanguageStyle,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<TeacherInfo>,
    /// 内嵌 logo（data URL），由 logo 存储解析后注入
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl ExamConfig {
    pub const MIN_COUNT: u8 = 1;
    pub const MAX_COUNT: u8 = 20;

    /// 校验题目数量
    pub fn validate(&self) -> AppResult<()> {
        if !(Self::MIN_COUNT..=Self::MAX_COUNT).contains(&self.count) {
            return Err(GenerationError::InvalidConfig(format!(
                "jumlah soal harus antara {} dan {} (diterima {})",
                Self::MIN_COUNT,
                Self::MAX_COUNT,
                self.count
            ))
            .into());
        }
        if self.subject.trim().is_empty() || self.topic.trim().is_empty() {
            return Err(GenerationError::InvalidConfig(
                "mata pelajaran dan topik wajib diisi".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// 非空的学校名称
    pub fn institution_name(&self) -> Option<&str> {
        non_blank(self.institution.as_deref())
    }

    /// 非空的教师姓名
    pub fn teacher_name(&self) -> Option<&str> {
        self.teacher.as_ref().and_then(|t| non_blank(Some(t.name.as_str())))
    }

    /// 教师证件号，例如 `("NIP", "1987...")`
    pub fn teacher_identifier(&self) -> Option<(&'static str, &str)> {
        let teacher = self.teacher.as_ref()?;
        self.teacher_name()?;
        non_blank(teacher.identifier.as_deref()).map(|id| (teacher.identifier_type.label(), id))
    }

    /// 非空的 logo data URL
    pub fn logo_data(&self) -> Option<&str> {
        non_blank(self.logo.as_deref())
    }

    /// 班级/教师行：`Kelas: X | Guru: Y | NIP: Z`
    pub fn grade_line(&self) -> String {
        let mut line = format!("Kelas: {}", self.grade);
        if let Some(name) = self.teacher_name() {
            line.push_str(&format!(" | Guru: {}", name));
            if let Some((kind, id)) = self.teacher_identifier() {
                line.push_str(&format!(" | {}: {}", kind, id));
            }
        }
        line
    }

    /// 用途/主题行：`Ulangan Harian - Ekosistem`
    pub fn purpose_line(&self) -> String {
        format!("{} - {}", self.purpose, self.topic)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// 生成的试卷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExam {
    pub config: ExamConfig,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedExam {
    pub fn new(config: ExamConfig, questions: Vec<Question>) -> Self {
        Self {
            config,
            questions,
            created_at: Utc::now(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    fn position(&self, id: &str) -> AppResult<usize> {
        self.questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| AppError::question_not_found(id))
    }

    /// 生成新的题目 ID：`q-{毫秒时间戳}-{用途}`，冲突时追加序号
    pub fn next_question_id(&self, purpose: &str) -> String {
        let base = format!("q-{}-{}", Utc::now().timestamp_millis(), purpose);
        if self.find(&base).is_none() {
            return base;
        }
        (2..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| self.find(candidate).is_none())
            .unwrap_or(base)
    }

    /// 局部更新题目
    pub fn update_question(&mut self, id: &str, patch: QuestionPatch) -> AppResult<()> {
        let index = self.position(id)?;
        patch.apply(&mut self.questions[index]);
        Ok(())
    }

    /// 删除题目并返回被删除的题目
    pub fn delete_question(&mut self, id: &str) -> AppResult<Question> {
        let index = self.position(id)?;
        Ok(self.questions.remove(index))
    }

    /// 复制题目并插入到原题之后，返回新题目 ID
    pub fn duplicate_question(&mut self, id: &str) -> AppResult<String> {
        let index = self.position(id)?;
        let mut copy = self.questions[index].clone();
        copy.id = self.next_question_id("dup");
        copy.text = format!("{} (Salinan)", copy.text);
        let new_id = copy.id.clone();
        self.questions.insert(index + 1, copy);
        Ok(new_id)
    }

    /// 追加一道空白题目（手动填写），返回新题目 ID
    pub fn append_blank_question(&mut self) -> String {
        let id = self.next_question_id("new");
        let question = Question::blank(
            id.clone(),
            self.config.question_type,
            self.config.cognitive_level,
        );
        self.questions.push(question);
        id
    }

    /// 追加一道已有题目；ID 冲突时重新分配
    pub fn append_question(&mut self, mut question: Question) -> String {
        if question.id.is_empty() || self.find(&question.id).is_some() {
            question.id = self.next_question_id("ai");
        }
        question.normalize_options();
        let id = question.id.clone();
        self.questions.push(question);
        id
    }
}
