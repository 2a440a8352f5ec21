//! PDF 导出
//!
//! 下载与预览共用同一个排版函数，两者输出的字节完全一致。

pub mod canvas;
pub mod fonts;
mod renderer;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::AppResult;
use crate::models::GeneratedExam;
use renderer::ExamLayout;

/// 将试卷渲染为 PDF 字节
pub fn render_pdf(exam: &GeneratedExam) -> AppResult<Vec<u8>> {
    ExamLayout::new(exam).render()
}

/// 内存中的 PDF 预览句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    bytes: Vec<u8>,
    url: String,
}

impl PreviewHandle {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let url = format!("data:application/pdf;base64,{}", STANDARD.encode(&bytes));
        Self { bytes, url }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `data:application/pdf;base64,...`
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// 生成预览句柄
pub fn preview_handle(exam: &GeneratedExam) -> AppResult<PreviewHandle> {
    render_pdf(exam).map(PreviewHandle::from_bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::exam::tests::{mc_question, sample_exam};
    use crate::models::{QuestionImage, QuestionType, TeacherIdType, TeacherInfo};
    use crate::services::image_resolver::tests::png_data_url;
    use lopdf::content::Content;
    use lopdf::{Document, Object};

    /// 每页按绘制顺序收集 Tj 文本
    pub(crate) fn page_texts(bytes: &[u8]) -> Vec<Vec<String>> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
                content
                    .operations
                    .iter()
                    .filter(|op| op.operator == "Tj")
                    .filter_map(|op| op.operands.first())
                    .filter_map(|operand| operand.as_str().ok())
                    .map(|raw| String::from_utf8_lossy(raw).into_owned())
                    .collect()
            })
            .collect()
    }

    pub(crate) fn image_count(bytes: &[u8]) -> usize {
        let doc = Document::load_mem(bytes).unwrap();
        doc.objects
            .values()
            .filter(|object| match object {
                Object::Stream(stream) => stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .map(|name| name == b"Image")
                    .unwrap_or(false),
                _ => false,
            })
            .count()
    }

    #[test]
    fn scenario_renders_questions_then_answer_page() {
        let pages = page_texts(&render_pdf(&sample_exam()).unwrap());
        assert_eq!(pages.len(), 2);

        assert_eq!(
            pages[0],
            vec![
                "SOAL BIOLOGI",
                "Ulangan Harian - Ekosistem",
                "Kelas: X / Ganjil",
                "1. Siapa yang duduk paling depan?",
                "   A. Budi",
                "   B. Ani",
                "   C. Sinta",
                "   D. Dedi",
                "2. Matahari terbit dari timur.",
                "   A. Benar",
                "   B. Salah",
            ]
        );
        assert_eq!(pages[1], vec!["KUNCI JAWABAN", "1. Sinta", "2. Benar"]);
    }

    #[test]
    fn bare_config_has_no_header_extras() {
        let bytes = render_pdf(&sample_exam()).unwrap();
        assert_eq!(image_count(&bytes), 0);
        let first_page = &page_texts(&bytes)[0];
        assert_eq!(first_page[0], "SOAL BIOLOGI");
        assert!(!first_page.iter().any(|t| t.contains("Guru")));
    }

    #[test]
    fn full_header_shows_institution_teacher_and_logo() {
        let mut exam = sample_exam();
        exam.config.institution = Some("SMA Negeri 1 Bandung".into());
        exam.config.teacher = Some(TeacherInfo {
            name: "Rina".into(),
            identifier: Some("19870101".into()),
            identifier_type: TeacherIdType::Nip,
        });
        exam.config.logo = Some(png_data_url(30, 30));

        let bytes = render_pdf(&exam).unwrap();
        assert_eq!(image_count(&bytes), 1);
        let first_page = &page_texts(&bytes)[0];
        assert_eq!(first_page[0], "SMA Negeri 1 Bandung");
        assert_eq!(first_page[1], "SOAL BIOLOGI");
        assert!(first_page.contains(&"Kelas: X / Ganjil | Guru: Rina | NIP: 19870101".to_string()));
    }

    #[test]
    fn long_exam_paginates_and_answers_follow_all_questions() {
        let mut exam = sample_exam();
        exam.questions = (1..=25)
            .map(|i| {
                let answer = if i == 7 { "" } else { "Budi" };
                mc_question(
                    &format!("q-{}", i),
                    &format!("Pertanyaan nomor {} tentang rantai makanan di ekosistem sawah.", i),
                    &["Budi", "Ani", "Sinta", "Dedi"],
                    answer,
                )
            })
            .collect();

        let pages = page_texts(&render_pdf(&exam).unwrap());
        assert!(pages.len() > 3);

        let key_page = pages
            .iter()
            .position(|texts| texts.first().map(String::as_str) == Some("KUNCI JAWABAN"))
            .unwrap();
        assert_eq!(key_page, pages.len() - 1);

        let before: Vec<&String> = pages[..key_page].iter().flatten().collect();
        assert!(before.iter().any(|t| t.starts_with("25. Pertanyaan")));

        let answers: Vec<&String> = pages[key_page..].iter().flatten().skip(1).collect();
        assert_eq!(answers.len(), 25);
        assert_eq!(answers[0], "1. Budi");
        assert_eq!(answers[6], "7.");
        assert_eq!(answers[24], "25. Budi");
    }

    /// 所有 Td 操作的基线 y（pt，原点在左下）
    fn text_baselines(bytes: &[u8]) -> Vec<f32> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .flat_map(|&page_id| {
                let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
                content
                    .operations
                    .into_iter()
                    .filter(|op| op.operator == "Td")
                    .map(|op| op.operands[1].as_float().unwrap())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn long_blocks_break_pages_line_by_line() {
        let mut exam = sample_exam();
        let long_option = "rantai makanan ".repeat(90);
        exam.questions = vec![mc_question(
            "q-1",
            &"Produsen konsumen dekomposer ".repeat(120),
            &["Budi", long_option.as_str()],
            &"energi mengalir ".repeat(300),
        )];

        let bytes = render_pdf(&exam).unwrap();
        // 20 mm 下边距
        let bottom_margin_pt = 20.0 * 72.0 / 25.4;
        for y in text_baselines(&bytes) {
            assert!(y >= bottom_margin_pt, "baseline {} below bottom margin", y);
        }

        let pages = page_texts(&bytes);
        let key_page = pages
            .iter()
            .position(|texts| texts.first().map(String::as_str) == Some("KUNCI JAWABAN"))
            .unwrap();
        assert!(key_page >= 2);
        assert!(pages.len() > key_page + 1);

        let count = |range: &[Vec<String>], word: &str| {
            range
                .iter()
                .flatten()
                .map(|line| line.matches(word).count())
                .sum::<usize>()
        };
        assert_eq!(count(&pages[..key_page], "Produsen"), 120);
        assert_eq!(count(&pages[..key_page], "rantai"), 90);
        assert_eq!(count(&pages[key_page..], "energi"), 300);
    }

    #[test]
    fn remote_image_is_skipped_but_question_kept() {
        let mut exam = sample_exam();
        exam.questions[0].image = Some(QuestionImage::Remote("http://127.0.0.1:9/x.png".into()));

        let bytes = render_pdf(&exam).unwrap();
        assert_eq!(image_count(&bytes), 0);
        let first_page = &page_texts(&bytes)[0];
        assert!(first_page.contains(&"1. Siapa yang duduk paling depan?".to_string()));
        assert!(first_page.contains(&"   D. Dedi".to_string()));
    }

    #[test]
    fn inline_image_is_embedded() {
        let mut exam = sample_exam();
        exam.questions[1].image = Some(QuestionImage::parse(png_data_url(8, 6)));
        assert_eq!(image_count(&render_pdf(&exam).unwrap()), 1);
    }

    #[test]
    fn essay_questions_render_without_options() {
        let mut exam = sample_exam();
        exam.questions[0].question_type = QuestionType::Essay;
        exam.questions[0].options = None;
        let first_page = &page_texts(&render_pdf(&exam).unwrap())[0];
        assert!(!first_page.contains(&"   A. Budi".to_string()));
    }

    #[test]
    fn preview_matches_download_bytes() {
        let exam = sample_exam();
        let download = render_pdf(&exam).unwrap();
        let preview = preview_handle(&exam).unwrap();

        assert_eq!(preview.bytes(), download.as_slice());
        assert!(preview.url().starts_with("data:application/pdf;base64,"));
        let encoded = preview.url().trim_start_matches("data:application/pdf;base64,");
        assert_eq!(STANDARD.decode(encoded).unwrap(), download);
    }
}
