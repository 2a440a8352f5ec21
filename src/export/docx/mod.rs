//! Word（DOCX）导出
//!
//! 页眉表格 → 逐题（可选配图、选项）→ 分页后的答案与解析。
//! 图片解析失败只会丢掉图片本身，题目文字照常输出。

pub mod document;
pub mod package;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::export::option_text::lettered_options;
use crate::models::{ExamConfig, GeneratedExam, Question};
use crate::services::image_resolver::{encode_png, try_decode_inline};
use crate::services::ImageResolver;
use document::{fit_emu, Block, Body, HeaderTable, InlineImage, Paragraph, Run, EMU_PER_INCH};
use package::DocxPackage;

/// 页眉 logo 最大尺寸
const LOGO_MAX_EMU: i64 = EMU_PER_INCH * 9 / 10;
/// 题目配图最大宽高
const IMAGE_MAX_WIDTH_EMU: i64 = EMU_PER_INCH * 3;
const IMAGE_MAX_HEIGHT_EMU: i64 = EMU_PER_INCH * 2;

/// Word 导出器
pub struct WordRenderer {
    resolver: ImageResolver,
}

impl WordRenderer {
    pub fn new(config: &Config) -> Self {
        Self::with_resolver(ImageResolver::new(config))
    }

    pub fn with_resolver(resolver: ImageResolver) -> Self {
        Self { resolver }
    }

    /// 渲染为 DOCX 字节
    ///
    /// 远程图片按顺序逐张下载。
    pub async fn render(&self, exam: &GeneratedExam) -> AppResult<Vec<u8>> {
        let mut builder = DocBuilder::new();

        builder.header(&exam.config);
        for (index, question) in exam.questions.iter().enumerate() {
            let image = match &question.image {
                Some(image) => self.resolver.try_resolve(image).await,
                None => None,
            };
            builder.question(index + 1, question, image.as_ref());
        }
        builder.answer_key(&exam.questions);

        let images = builder.package.media_count();
        let xml = builder.body.to_xml();
        let bytes = builder.package.finish(&xml)?;
        info!("✓ DOCX 生成完成: {} 道题, {} 张图片", exam.questions.len(), images);
        Ok(bytes)
    }
}

struct DocBuilder {
    body: Body,
    package: DocxPackage,
    next_doc_pr_id: u32,
}

impl DocBuilder {
    fn new() -> Self {
        Self {
            body: Body::new(),
            package: DocxPackage::new(),
            next_doc_pr_id: 1,
        }
    }

    fn embed(&mut self, image: &DynamicImage, max_width: i64, max_height: i64) -> AppResult<InlineImage> {
        let png = encode_png(image)?;
        let rel_id = self.package.add_png(png);
        let (width_emu, height_emu) = fit_emu(image.width(), image.height(), max_width, max_height);
        let doc_pr_id = self.next_doc_pr_id;
        self.next_doc_pr_id += 1;
        Ok(InlineImage {
            rel_id,
            doc_pr_id,
            width_emu,
            height_emu,
        })
    }

    /// 嵌入失败只跳过这张图片
    fn try_embed(
        &mut self,
        image: &DynamicImage,
        max_width: i64,
        max_height: i64,
    ) -> Option<InlineImage> {
        match self.embed(image, max_width, max_height) {
            Ok(inline) => Some(inline),
            Err(e) => {
                warn!("⚠️ 图片嵌入失败，已跳过: {}", e);
                None
            }
        }
    }

    fn header(&mut self, config: &ExamConfig) {
        // logo 只用内嵌数据，不走网络
        let logo = config
            .logo_data()
            .and_then(try_decode_inline)
            .and_then(|image| self.try_embed(&image, LOGO_MAX_EMU, LOGO_MAX_EMU));

        let mut lines = Vec::new();
        if let Some(institution) = config.institution_name() {
            lines.push(
                Paragraph::new()
                    .centered()
                    .run(Run::bold(institution).with_size(32)),
            );
        }
        lines.push(
            Paragraph::new()
                .centered()
                .run(Run::bold(format!("SOAL {}", config.subject.to_uppercase())).with_size(28)),
        );
        lines.push(Paragraph::new().centered().run(Run::text(config.purpose_line())));
        lines.push(
            Paragraph::new()
                .centered()
                .spacing(None, Some(120))
                .run(Run::text(config.grade_line())),
        );

        self.body.push(Block::HeaderTable(HeaderTable { logo, lines }));
    }

    fn question(
        &mut self,
        number: usize,
        question: &Question,
        image: Option<&DynamicImage>,
    ) {
        self.body.paragraph(
            Paragraph::new()
                .spacing(Some(200), Some(100))
                .run(Run::bold(format!("{}. ", number)))
                .run(Run::text(question.text.as_str())),
        );

        let inline =
            image.and_then(|image| self.try_embed(image, IMAGE_MAX_WIDTH_EMU, IMAGE_MAX_HEIGHT_EMU));
        if let Some(inline) = inline {
            debug!("第 {} 题嵌入图片 {}", number, inline.rel_id);
            self.body.paragraph(
                Paragraph::new()
                    .indent(360)
                    .spacing(None, Some(100))
                    .run(Run::Image(inline)),
            );
        }

        if let Some(options) = question.display_options() {
            for (letter, option) in lettered_options(options) {
                self.body.paragraph(
                    Paragraph::new()
                        .indent(360)
                        .spacing(None, Some(50))
                        .run(Run::text(format!("{}. {}", letter, option))),
                );
            }
        }
    }

    fn answer_key(&mut self, questions: &[Question]) {
        self.body.paragraph(
            Paragraph::new()
                .page_break_before()
                .centered()
                .spacing(None, Some(200))
                .run(Run::bold("KUNCI JAWABAN & PEMBAHASAN").with_size(28)),
        );

        for (index, question) in questions.iter().enumerate() {
            self.body.paragraph(
                Paragraph::new()
                    .run(Run::bold(format!("{}. {}", index + 1, question.correct_answer))),
            );
            if let Some(explanation) = question.explanation_text() {
                self.body.paragraph(
                    Paragraph::new()
                        .indent(300)
                        .spacing(None, Some(100))
                        .run(Run::text(format!("Pembahasan: {}", explanation))),
                );
            }
        }
    }
}
