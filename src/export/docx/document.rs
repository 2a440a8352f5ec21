//! WordprocessingML 文档模型与 `word/document.xml` 序列化
//!
//! 只覆盖试卷用到的元素：段落、文本 run、内嵌图片、页眉表格。

use quick_xml::escape::escape;

pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// A4，单位 twip
pub const PAGE_WIDTH_TWIPS: u32 = 11906;
pub const PAGE_HEIGHT_TWIPS: u32 = 16838;
/// 四边 1 英寸
pub const PAGE_MARGIN_TWIPS: u32 = 1440;

/// 1 英寸 = 914400 EMU
pub const EMU_PER_INCH: i64 = 914_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

/// 内嵌图片引用（图片本身已写入 `word/media`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub rel_id: String,
    /// 文档内唯一的 docPr id
    pub doc_pr_id: u32,
    pub width_emu: i64,
    pub height_emu: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    Text {
        text: String,
        bold: bool,
        /// 字号，单位半磅
        size: Option<u32>,
    },
    Image(InlineImage),
}

impl Run {
    pub fn text(text: impl Into<String>) -> Self {
        Run::Text {
            text: text.into(),
            bold: false,
            size: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Run::Text {
            text: text.into(),
            bold: true,
            size: None,
        }
    }

    pub fn with_size(self, half_points: u32) -> Self {
        match self {
            Run::Text { text, bold, .. } => Run::Text {
                text,
                bold,
                size: Some(half_points),
            },
            image => image,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub alignment: Alignment,
    pub page_break_before: bool,
    /// 左缩进（twip）
    pub indent_left: Option<u32>,
    pub spacing_before: Option<u32>,
    pub spacing_after: Option<u32>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub fn centered(mut self) -> Self {
        self.alignment = Alignment::Center;
        self
    }

    pub fn page_break_before(mut self) -> Self {
        self.page_break_before = true;
        self
    }

    pub fn indent(mut self, twips: u32) -> Self {
        self.indent_left = Some(twips);
        self
    }

    pub fn spacing(mut self, before: Option<u32>, after: Option<u32>) -> Self {
        self.spacing_before = before;
        self.spacing_after = after;
        self
    }

    fn write_xml(&self, xml: &mut String) {
        xml.push_str("<w:p>");

        let mut props = String::new();
        if self.page_break_before {
            props.push_str("<w:pageBreakBefore/>");
        }
        if self.spacing_before.is_some() || self.spacing_after.is_some() {
            props.push_str("<w:spacing");
            if let Some(before) = self.spacing_before {
                props.push_str(&format!(" w:before=\"{}\"", before));
            }
            if let Some(after) = self.spacing_after {
                props.push_str(&format!(" w:after=\"{}\"", after));
            }
            props.push_str("/>");
        }
        if let Some(left) = self.indent_left {
            props.push_str(&format!("<w:ind w:left=\"{}\"/>", left));
        }
        if self.alignment == Alignment::Center {
            props.push_str("<w:jc w:val=\"center\"/>");
        }
        if !props.is_empty() {
            xml.push_str("<w:pPr>");
            xml.push_str(&props);
            xml.push_str("</w:pPr>");
        }

        for run in &self.runs {
            write_run(run, xml);
        }
        xml.push_str("</w:p>");
    }
}

/// 页眉表格：可选 logo 单元格 + 居中文字单元格，底部双线
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    pub logo: Option<InlineImage>,
    pub lines: Vec<Paragraph>,
}

/// logo 单元格宽度（twip）
const LOGO_CELL_TWIPS: u32 = 1800;

impl HeaderTable {
    fn write_xml(&self, xml: &mut String) {
        let total = PAGE_WIDTH_TWIPS - 2 * PAGE_MARGIN_TWIPS;
        let text_width = if self.logo.is_some() {
            total - LOGO_CELL_TWIPS
        } else {
            total
        };

        xml.push_str("<w:tbl><w:tblPr>");
        xml.push_str(&format!("<w:tblW w:w=\"{}\" w:type=\"dxa\"/>", total));
        xml.push_str("<w:tblBorders>");
        for side in ["top", "left", "right", "insideH", "insideV"] {
            xml.push_str(&format!("<w:{} w:val=\"none\" w:sz=\"0\" w:space=\"0\" w:color=\"auto\"/>", side));
        }
        xml.push_str("<w:bottom w:val=\"double\" w:sz=\"6\" w:space=\"0\" w:color=\"000000\"/>");
        xml.push_str("</w:tblBorders><w:tblLayout w:type=\"fixed\"/></w:tblPr>");

        xml.push_str("<w:tblGrid>");
        if self.logo.is_some() {
            xml.push_str(&format!("<w:gridCol w:w=\"{}\"/>", LOGO_CELL_TWIPS));
        }
        xml.push_str(&format!("<w:gridCol w:w=\"{}\"/>", text_width));
        xml.push_str("</w:tblGrid><w:tr>");

        if let Some(logo) = &self.logo {
            xml.push_str(&format!(
                "<w:tc><w:tcPr><w:tcW w:w=\"{}\" w:type=\"dxa\"/><w:vAlign w:val=\"center\"/></w:tcPr>",
                LOGO_CELL_TWIPS
            ));
            Paragraph::new()
                .centered()
                .run(Run::Image(logo.clone()))
                .write_xml(xml);
            xml.push_str("</w:tc>");
        }

        xml.push_str(&format!(
            "<w:tc><w:tcPr><w:tcW w:w=\"{}\" w:type=\"dxa\"/><w:vAlign w:val=\"center\"/></w:tcPr>",
            text_width
        ));
        for line in &self.lines {
            line.write_xml(xml);
        }
        // 单元格至少需要一个段落
        if self.lines.is_empty() {
            Paragraph::new().write_xml(xml);
        }
        xml.push_str("</w:tc></w:tr></w:tbl>");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    HeaderTable(HeaderTable),
}

/// 文档正文
#[derive(Debug, Clone, Default)]
pub struct Body {
    blocks: Vec<Block>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// 生成完整的 `word/document.xml`
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(
            r#"<w:document xmlns:w="{}" xmlns:r="{}" xmlns:wp="{}" xmlns:a="{}" xmlns:pic="{}"><w:body>"#,
            NS_W, NS_R, NS_WP, NS_A, NS_PIC
        ));

        for block in &self.blocks {
            match block {
                Block::Paragraph(p) => p.write_xml(&mut xml),
                Block::HeaderTable(t) => t.write_xml(&mut xml),
            }
        }

        xml.push_str(&format!(
            "<w:sectPr><w:pgSz w:w=\"{}\" w:h=\"{}\"/><w:pgMar w:top=\"{m}\" w:right=\"{m}\" w:bottom=\"{m}\" w:left=\"{m}\" w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/></w:sectPr>",
            PAGE_WIDTH_TWIPS,
            PAGE_HEIGHT_TWIPS,
            m = PAGE_MARGIN_TWIPS
        ));
        xml.push_str("</w:body></w:document>");
        xml
    }
}

fn write_run(run: &Run, xml: &mut String) {
    match run {
        Run::Text { text, bold, size } => {
            xml.push_str("<w:r>");
            if *bold || size.is_some() {
                xml.push_str("<w:rPr>");
                if *bold {
                    xml.push_str("<w:b/>");
                }
                if let Some(size) = size {
                    xml.push_str(&format!("<w:sz w:val=\"{0}\"/><w:szCs w:val=\"{0}\"/>", size));
                }
                xml.push_str("</w:rPr>");
            }
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    xml.push_str("<w:br/>");
                }
                xml.push_str("<w:t xml:space=\"preserve\">");
                xml.push_str(&escape(&strip_invalid_xml_chars(line)));
                xml.push_str("</w:t>");
            }
            xml.push_str("</w:r>");
        }
        Run::Image(image) => {
            xml.push_str("<w:r>");
            write_drawing(image, xml);
            xml.push_str("</w:r>");
        }
    }
}

fn write_drawing(image: &InlineImage, xml: &mut String) {
    let name = format!("Gambar {}", image.doc_pr_id);
    xml.push_str(&format!(
        concat!(
            "<w:drawing><wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
            "<wp:effectExtent l=\"0\" t=\"0\" r=\"0\" b=\"0\"/>",
            "<wp:docPr id=\"{id}\" name=\"{name}\"/>",
            "<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect=\"1\"/></wp:cNvGraphicFramePr>",
            "<a:graphic><a:graphicData uri=\"{pic_ns}\"><pic:pic>",
            "<pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"{name}\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill><a:blip r:embed=\"{rel}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"
        ),
        cx = image.width_emu,
        cy = image.height_emu,
        id = image.doc_pr_id,
        name = name,
        pic_ns = NS_PIC,
        rel = image.rel_id,
    ));
}

/// XML 1.0 不允许的控制字符
fn strip_invalid_xml_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\t' || c == '\n' || c == '\r' || c >= ' ')
        .collect()
}

/// 按像素尺寸缩放到最大宽高（EMU），保持比例
pub fn fit_emu(width_px: u32, height_px: u32, max_width_emu: i64, max_height_emu: i64) -> (i64, i64) {
    // 96 DPI
    let emu_per_px = EMU_PER_INCH / 96;
    let width = (width_px.max(1) as i64) * emu_per_px;
    let height = (height_px.max(1) as i64) * emu_per_px;

    let scale = f64::min(
        1.0,
        f64::min(
            max_width_emu as f64 / width as f64,
            max_height_emu as f64 / height as f64,
        ),
    );
    (
        ((width as f64 * scale).round() as i64).max(1),
        ((height as f64 * scale).round() as i64).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_escaped_and_preserves_spaces() {
        let mut xml = String::new();
        Paragraph::new()
            .run(Run::bold("1. "))
            .run(Run::text("a < b & \"c\""))
            .write_xml(&mut xml);
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains("xml:space=\"preserve\">1. </w:t>"));
        assert!(xml.contains("a &lt; b &amp; &quot;c&quot;"));
    }

    #[test]
    fn paragraph_properties_are_written_only_when_set() {
        let mut plain = String::new();
        Paragraph::new().run(Run::text("x")).write_xml(&mut plain);
        assert!(!plain.contains("<w:pPr>"));

        let mut styled = String::new();
        Paragraph::new()
            .page_break_before()
            .centered()
            .indent(300)
            .write_xml(&mut styled);
        assert!(styled.contains("<w:pageBreakBefore/>"));
        assert!(styled.contains("<w:ind w:left=\"300\"/>"));
        assert!(styled.contains("<w:jc w:val=\"center\"/>"));
    }

    #[test]
    fn header_without_logo_has_single_cell() {
        let mut xml = String::new();
        HeaderTable {
            logo: None,
            lines: vec![Paragraph::new().run(Run::text("SOAL"))],
        }
        .write_xml(&mut xml);
        assert_eq!(xml.matches("<w:tc>").count(), 1);
        assert!(xml.contains("w:val=\"double\""));
    }

    #[test]
    fn newlines_become_breaks_and_control_chars_are_dropped() {
        let mut xml = String::new();
        write_run(&Run::text("baris 1\nbaris\u{1} 2"), &mut xml);
        assert!(xml.contains("<w:br/>"));
        assert!(xml.contains("baris 2"));
    }

    #[test]
    fn fit_keeps_aspect_ratio() {
        let (w, h) = fit_emu(400, 200, EMU_PER_INCH * 2, EMU_PER_INCH * 2);
        assert_eq!(w, EMU_PER_INCH * 2);
        assert_eq!(h, EMU_PER_INCH);

        // 小图不放大
        let (w, _) = fit_emu(48, 48, EMU_PER_INCH * 2, EMU_PER_INCH * 2);
        assert_eq!(w, 48 * (EMU_PER_INCH / 96));
    }

    #[test]
    fn document_has_a4_section_with_inch_margins() {
        let xml = Body::new().to_xml();
        assert!(xml.contains("w:pgSz w:w=\"11906\" w:h=\"16838\""));
        assert!(xml.contains("w:top=\"1440\" w:right=\"1440\" w:bottom=\"1440\" w:left=\"1440\""));
    }
}
