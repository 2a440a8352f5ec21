//! 纯文本格式（用于复制到剪贴板）

use std::fmt::Write;

use super::option_text::lettered_options;
use crate::models::GeneratedExam;

const SEPARATOR_WIDTH: usize = 40;

/// 将试卷渲染为纯文本
///
/// 结构：标题行、主题/班级行、分隔线、逐题（含选项）、答案区。
pub fn format_exam(exam: &GeneratedExam) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut text = String::new();

    // String 的 fmt::Write 不会失败
    let _ = writeln!(text, "SOAL {}", exam.config.subject.to_uppercase());
    let _ = writeln!(text, "Topik: {} | Kelas: {}", exam.config.topic, exam.config.grade);
    let _ = writeln!(text, "{}", separator);

    for (i, question) in exam.questions.iter().enumerate() {
        let _ = writeln!(text, "{}. {}", i + 1, question.text);
        if let Some(options) = question.display_options() {
            for (letter, option) in lettered_options(options) {
                let _ = writeln!(text, "   {}. {}", letter, option);
            }
        }
        text.push('\n');
    }

    let _ = writeln!(text, "\nKUNCI JAWABAN");
    let _ = writeln!(text, "{}", separator);
    for (i, question) in exam.questions.iter().enumerate() {
        let _ = writeln!(text, "{}. {}", i + 1, question.correct_answer);
    }

    text
}
