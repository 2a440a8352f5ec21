//! 分页画布：以 mm 为单位记录绘制指令，最后用 `lopdf` 组装为 PDF 文档

use std::io::Write;

use chrono::{DateTime, Utc};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::fonts::{encode_win_ansi, text_width_mm, FontStyle};
use crate::error::AppResult;

/// A4 纵向（mm）
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const MM_TO_PT: f32 = 72.0 / 25.4;

fn pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// 顶部 y（mm）→ PDF 坐标（pt，原点在左下）
fn pdf_y(y_mm: f32) -> f32 {
    pt(PAGE_HEIGHT_MM - y_mm)
}

/// 已压缩的 RGB 位图
struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    /// 透明像素与白底混合后压缩
    fn from_image(image: &DynamicImage) -> AppResult<Self> {
        let rgba = image.to_rgba8();
        let mut rgb = Vec::with_capacity(rgba.width() as usize * rgba.height() as usize * 3);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            let a = a as u16;
            for c in [r, g, b] {
                rgb.push(((c as u16 * a + 255 * (255 - a)) / 255) as u8);
            }
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&rgb)?;
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            data: encoder.finish()?,
        })
    }
}

#[derive(Default)]
struct Page {
    operations: Vec<Operation>,
    images: Vec<usize>,
}

/// PDF 画布
pub struct PdfCanvas {
    pages: Vec<Page>,
    images: Vec<RasterImage>,
}

impl PdfCanvas {
    /// 新建画布（带第一页）
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            images: Vec::new(),
        }
    }

    pub fn add_page(&mut self) {
        self.pages.push(Page::default());
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current(&mut self) -> &mut Page {
        // new() 保证至少有一页
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// 在 (x, 基线 y) 处写一行文本
    pub fn text(&mut self, text: &str, x_mm: f32, y_mm: f32, style: FontStyle, size_pt: f32) {
        let ops = [
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![style.resource_name().into(), size_pt.into()]),
            Operation::new("Td", vec![pt(x_mm).into(), pdf_y(y_mm).into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
            Operation::new("ET", vec![]),
        ];
        self.current().operations.extend(ops);
    }

    /// 水平居中的一行文本
    pub fn centered_text(&mut self, text: &str, y_mm: f32, style: FontStyle, size_pt: f32) {
        let width = text_width_mm(text, style, size_pt);
        let x = ((PAGE_WIDTH_MM - width) / 2.0).max(0.0);
        self.text(text, x, y_mm, style, size_pt);
    }

    /// 水平线
    pub fn line(&mut self, x1_mm: f32, x2_mm: f32, y_mm: f32, width_mm: f32) {
        let ops = [
            Operation::new("w", vec![pt(width_mm).into()]),
            Operation::new("m", vec![pt(x1_mm).into(), pdf_y(y_mm).into()]),
            Operation::new("l", vec![pt(x2_mm).into(), pdf_y(y_mm).into()]),
            Operation::new("S", vec![]),
        ];
        self.current().operations.extend(ops);
    }

    /// 以左上角 (x, y) 放置图片，拉伸到指定尺寸
    pub fn image(
        &mut self,
        image: &DynamicImage,
        x_mm: f32,
        y_mm: f32,
        width_mm: f32,
        height_mm: f32,
    ) -> AppResult<()> {
        let raster = RasterImage::from_image(image)?;
        let index = self.images.len();
        self.images.push(raster);

        let ops = [
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    pt(width_mm).into(),
                    0.into(),
                    0.into(),
                    pt(height_mm).into(),
                    pt(x_mm).into(),
                    pdf_y(y_mm + height_mm).into(),
                ],
            ),
            Operation::new("Do", vec![image_name(index).as_str().into()]),
            Operation::new("Q", vec![]),
        ];
        let page = self.current();
        page.operations.extend(ops);
        page.images.push(index);
        Ok(())
    }

    /// 组装并序列化 PDF
    ///
    /// 相同输入得到相同字节：对象编号按绘制顺序分配，创建时间取自试卷。
    pub fn finish(self, title: &str, created_at: DateTime<Utc>) -> AppResult<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font = |style: FontStyle| {
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => style.base_font(),
                "Encoding" => "WinAnsiEncoding",
            }
        };
        let regular_id = doc.add_object(font(FontStyle::Regular));
        let bold_id = doc.add_object(font(FontStyle::Bold));

        let image_ids: Vec<ObjectId> = self
            .images
            .into_iter()
            .map(|raster| {
                let dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => raster.width as i64,
                    "Height" => raster.height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                };
                doc.add_object(Stream::new(dict, raster.data))
            })
            .collect();

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for page in self.pages {
            let mut xobjects = Dictionary::new();
            for index in &page.images {
                xobjects.set(image_name(*index), image_ids[*index]);
            }

            let resources = dictionary! {
                "Font" => dictionary! {
                    FontStyle::Regular.resource_name() => regular_id,
                    FontStyle::Bold.resource_name() => bold_id,
                },
                "XObject" => xobjects,
            };

            let content = Content {
                operations: page.operations,
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                pt(PAGE_WIDTH_MM).into(),
                pt(PAGE_HEIGHT_MM).into(),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_win_ansi(title)),
            "Producer" => Object::string_literal("soalgen"),
            "CreationDate" => Object::string_literal(created_at.format("D:%Y%m%d%H%M%SZ").to_string()),
        });
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

fn image_name(index: usize) -> String {
    format!("Im{}", index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn transparent_pixels_blend_to_white() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let raster = RasterImage::from_image(&DynamicImage::ImageRgba8(img)).unwrap();

        let mut decoder = flate2::read::ZlibDecoder::new(raster.data.as_slice());
        let mut rgb = Vec::new();
        std::io::Read::read_to_end(&mut decoder, &mut rgb).unwrap();
        assert_eq!(rgb, vec![255, 255, 255]);
    }

    #[test]
    fn finished_document_reloads_with_all_pages() {
        let mut canvas = PdfCanvas::new();
        canvas.text("Halaman satu", 20.0, 20.0, FontStyle::Regular, 11.0);
        canvas.add_page();
        canvas.centered_text("Halaman dua", 20.0, FontStyle::Bold, 11.0);
        assert_eq!(canvas.page_count(), 2);

        let bytes = canvas.finish("Uji", Utc::now()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
