//! PDF 排版：页眉 → 逐题 → 答案页
//!
//! 纵向游标 `y` 以 mm 为单位，从页面顶部向下增长。

use tracing::debug;

use super::canvas::{PdfCanvas, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::fonts::{wrap_text, FontStyle};
use crate::error::AppResult;
use crate::export::option_text::lettered_options;
use crate::models::{GeneratedExam, Question, QuestionImage};
use crate::services::image_resolver::try_decode_inline;

const MARGIN: f32 = 20.0;
const TOP: f32 = 20.0;
const USABLE_WIDTH: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN;

const BODY_SIZE: f32 = 11.0;
const LINE_HEIGHT: f32 = 6.0;
const ANSWER_LINE_HEIGHT: f32 = 7.0;
const QUESTION_GAP: f32 = 5.0;

/// 题干、答案行的换页阈值
const QUESTION_BREAK_Y: f32 = 270.0;
/// 选项行的换页阈值
const OPTION_BREAK_Y: f32 = 275.0;

const LOGO_X: f32 = 20.0;
const LOGO_Y: f32 = 10.0;
const LOGO_SIZE: f32 = 25.0;

const IMAGE_WIDTH: f32 = 60.0;
const IMAGE_HEIGHT: f32 = 40.0;

pub(super) struct ExamLayout<'a> {
    exam: &'a GeneratedExam,
    canvas: PdfCanvas,
    y: f32,
}

impl<'a> ExamLayout<'a> {
    pub(super) fn new(exam: &'a GeneratedExam) -> Self {
        Self {
            exam,
            canvas: PdfCanvas::new(),
            y: TOP,
        }
    }

    /// 完整排版并输出 PDF 字节
    pub(super) fn render(mut self) -> AppResult<Vec<u8>> {
        let exam = self.exam;
        self.header()?;
        for (index, question) in exam.questions.iter().enumerate() {
            self.question(index + 1, question)?;
        }
        self.answer_key();

        debug!("PDF 排版完成: {} 页", self.canvas.page_count());
        let title = format!("Soal {} - {}", exam.config.subject, exam.config.topic);
        self.canvas.finish(&title, exam.created_at)
    }

    fn new_page(&mut self) {
        self.canvas.add_page();
        self.y = TOP;
    }

    fn break_if_past(&mut self, threshold: f32) {
        if self.y > threshold {
            self.new_page();
        }
    }

    fn header(&mut self) -> AppResult<()> {
        let exam = self.exam;
        let config = &exam.config;

        let logo = config.logo_data().and_then(try_decode_inline);
        if let Some(logo) = &logo {
            self.canvas.image(logo, LOGO_X, LOGO_Y, LOGO_SIZE, LOGO_SIZE)?;
        }

        if let Some(institution) = config.institution_name() {
            self.canvas
                .centered_text(institution, self.y, FontStyle::Bold, 16.0);
            self.y += 8.0;
        }

        let title = format!("SOAL {}", config.subject.to_uppercase());
        self.canvas.centered_text(&title, self.y, FontStyle::Bold, 14.0);
        self.y += 7.0;

        self.canvas
            .centered_text(&config.purpose_line(), self.y, FontStyle::Regular, BODY_SIZE);
        self.y += 6.0;
        self.canvas
            .centered_text(&config.grade_line(), self.y, FontStyle::Regular, BODY_SIZE);
        self.y += 4.0;

        if logo.is_some() {
            self.y = self.y.max(LOGO_Y + LOGO_SIZE + 2.0);
        }

        // 双线
        self.canvas.line(MARGIN, PAGE_WIDTH_MM - MARGIN, self.y, 0.6);
        self.canvas.line(MARGIN, PAGE_WIDTH_MM - MARGIN, self.y + 1.2, 0.2);
        self.y += 10.0;
        Ok(())
    }

    /// 逐行输出换行后的文本，每行开始前检查换页阈值
    fn wrapped_lines(&mut self, text: &str, threshold: f32, line_height: f32) {
        for line in wrap_text(text, FontStyle::Regular, BODY_SIZE, USABLE_WIDTH) {
            self.break_if_past(threshold);
            self.canvas
                .text(&line, MARGIN, self.y, FontStyle::Regular, BODY_SIZE);
            self.y += line_height;
        }
    }

    fn question(&mut self, number: usize, question: &Question) -> AppResult<()> {
        let text = format!("{}. {}", number, question.text);
        self.wrapped_lines(&text, QUESTION_BREAK_Y, LINE_HEIGHT);

        if let Some(image) = question.image.as_ref().and_then(decode_for_pdf) {
            if self.y + IMAGE_HEIGHT > PAGE_HEIGHT_MM - MARGIN {
                self.new_page();
            }
            self.canvas
                .image(&image, MARGIN, self.y, IMAGE_WIDTH, IMAGE_HEIGHT)?;
            self.y += IMAGE_HEIGHT + QUESTION_GAP;
        }

        if let Some(options) = question.display_options() {
            for (letter, option) in lettered_options(options) {
                let text = format!("   {}. {}", letter, option);
                self.wrapped_lines(&text, OPTION_BREAK_Y, LINE_HEIGHT);
            }
        }

        self.y += QUESTION_GAP;
        Ok(())
    }

    fn answer_key(&mut self) {
        self.new_page();
        self.canvas
            .centered_text("KUNCI JAWABAN", self.y, FontStyle::Bold, BODY_SIZE);
        self.y += 15.0;

        let exam = self.exam;
        for (index, question) in exam.questions.iter().enumerate() {
            let text = format!("{}. {}", index + 1, question.correct_answer);
            self.wrapped_lines(&text, QUESTION_BREAK_Y, ANSWER_LINE_HEIGHT);
        }
    }
}

/// PDF 是同步生成的，只能使用内嵌图片
fn decode_for_pdf(image: &QuestionImage) -> Option<image::DynamicImage> {
    match image {
        QuestionImage::Inline(data_url) => try_decode_inline(data_url),
        QuestionImage::Remote(url) => {
            debug!("PDF 跳过远程图片: {}", url);
            None
        }
    }
}
