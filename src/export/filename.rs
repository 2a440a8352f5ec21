//! 导出文件名：`Soal_{subject}_{topic}.{ext}`

use crate::models::GeneratedExam;

/// 文件系统不允许的字符
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// 清洗文件名片段
///
/// 非法字符与控制字符替换为 `_`，去掉首尾空白和末尾的点；清洗后为空时使用 `-`。
pub fn sanitize_component(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let cleaned = replaced.trim().trim_end_matches('.').trim_end();
    if cleaned.is_empty() {
        "-".to_string()
    } else {
        cleaned.to_string()
    }
}

/// 生成导出文件名
pub fn export_file_name(exam: &GeneratedExam, extension: &str) -> String {
    format!(
        "Soal_{}_{}.{}",
        sanitize_component(&exam.config.subject),
        sanitize_component(&exam.config.topic),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exam::tests::sample_exam;

    #[test]
    fn plain_names_are_kept_verbatim() {
        let exam = sample_exam();
        assert_eq!(export_file_name(&exam, "pdf"), "Soal_Biologi_Ekosistem.pdf");
        assert_eq!(export_file_name(&exam, "docx"), "Soal_Biologi_Ekosistem.docx");
    }

    #[test]
    fn illegal_characters_are_replaced() {
        let mut exam = sample_exam();
        exam.config.subject = "IPA/IPS".into();
        exam.config.topic = "Gaya: \"Newton\"?".into();
        assert_eq!(
            export_file_name(&exam, "pdf"),
            "Soal_IPA_IPS_Gaya_ _Newton__.pdf"
        );
    }

    #[test]
    fn empty_and_dotted_components() {
        assert_eq!(sanitize_component("   "), "-");
        assert_eq!(sanitize_component("Bab 1..."), "Bab 1");
        assert_eq!(sanitize_component("a\tb"), "a_b");
    }
}
