//! DOCX 打包：把正文、关系和媒体文件写进 ZIP

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::AppResult;

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CT: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

struct MediaPart {
    file_name: String,
    rel_id: String,
    bytes: Vec<u8>,
}

/// 待写出的 DOCX 包
///
/// `rId1` 固定给 styles.xml，图片从 `rId2` 开始编号。
pub struct DocxPackage {
    media: Vec<MediaPart>,
}

impl DocxPackage {
    pub fn new() -> Self {
        Self { media: Vec::new() }
    }

    /// 添加一张 PNG，返回关系 ID
    pub fn add_png(&mut self, bytes: Vec<u8>) -> String {
        let number = self.media.len() + 1;
        let rel_id = format!("rId{}", number + 1);
        self.media.push(MediaPart {
            file_name: format!("image{}.png", number),
            rel_id: rel_id.clone(),
            bytes,
        });
        rel_id
    }

    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    /// 写出 ZIP 字节
    pub fn finish(self, document_xml: &str) -> AppResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let xml_options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        // 图片已经压缩过
        let media_options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        zip.start_file("[Content_Types].xml", xml_options)?;
        zip.write_all(self.content_types_xml().as_bytes())?;

        zip.start_file("_rels/.rels", xml_options)?;
        zip.write_all(package_rels_xml().as_bytes())?;

        zip.start_file("word/document.xml", xml_options)?;
        zip.write_all(document_xml.as_bytes())?;

        zip.start_file("word/styles.xml", xml_options)?;
        zip.write_all(styles_xml().as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", xml_options)?;
        zip.write_all(self.document_rels_xml().as_bytes())?;

        for part in &self.media {
            zip.start_file(format!("word/media/{}", part.file_name), media_options)?;
            zip.write_all(&part.bytes)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<Types xmlns="{}">"#, NS_CT));
        xml.push_str(&format!(
            r#"<Default Extension="rels" ContentType="{}"/>"#,
            CT_RELATIONSHIPS
        ));
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        if !self.media.is_empty() {
            xml.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);
        }
        xml.push_str(&format!(
            r#"<Override PartName="/word/document.xml" ContentType="{}"/>"#,
            CT_DOCUMENT
        ));
        xml.push_str(&format!(
            r#"<Override PartName="/word/styles.xml" ContentType="{}"/>"#,
            CT_STYLES
        ));
        xml.push_str("</Types>");
        xml
    }

    fn document_rels_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, NS_PKG_REL));
        xml.push_str(&format!(
            r#"<Relationship Id="rId1" Type="{}" Target="styles.xml"/>"#,
            REL_STYLES
        ));
        for part in &self.media {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="media/{}"/>"#,
                part.rel_id, REL_IMAGE, part.file_name
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

fn package_rels_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="{}">"#,
            r#"<Relationship Id="rId1" Type="{}" Target="word/document.xml"/>"#,
            "</Relationships>"
        ),
        NS_PKG_REL, REL_OFFICE_DOCUMENT
    )
}

/// 默认字体 Calibri 11pt
fn styles_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:styles xmlns:w="{}">"#,
            "<w:docDefaults><w:rPrDefault><w:rPr>",
            r#"<w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/>"#,
            r#"<w:sz w:val="22"/><w:szCs w:val="22"/>"#,
            "</w:rPr></w:rPrDefault>",
            r#"<w:pPrDefault><w:pPr><w:spacing w:after="0" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault>"#,
            "</w:docDefaults>",
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#,
            "</w:styles>"
        ),
        super::document::NS_W
    )
}
