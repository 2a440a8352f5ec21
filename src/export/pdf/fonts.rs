//! 标准 Type1 字体（Helvetica）度量与 WinAnsi 编码
//!
//! 不嵌入字体，宽度表取自 Adobe Core14 AFM，只覆盖 ASCII 可见字符，
//! 其余字符按 556 估算。

/// 1 pt = 25.4 / 72 mm
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// 非 ASCII 字符的估算宽度
const FALLBACK_WIDTH: u16 = 556;

/// Helvetica, 字符 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold, 字符 32..=126
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // '{'..'~'
];

/// 字体样式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

impl FontStyle {
    /// 页面资源中的字体名
    pub fn resource_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
        }
    }

    /// PDF BaseFont 名称
    pub fn base_font(self) -> &'static str {
        match self {
            FontStyle::Regular => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            FontStyle::Regular => &HELVETICA_WIDTHS,
            FontStyle::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }
}

/// 单个字符宽度（千分之一字号）
pub fn char_width(style: FontStyle, c: char) -> u16 {
    match c as u32 {
        code @ 32..=126 => style.widths()[(code - 32) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// 文本宽度（mm）
pub fn text_width_mm(text: &str, style: FontStyle, size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(style, c) as u32).sum();
    units as f32 * size_pt / 1000.0 * PT_TO_MM
}

/// 按宽度折行
///
/// 保留段首缩进；单词本身超宽时按字符切开。显式换行符产生新行。
pub fn wrap_text(text: &str, style: FontStyle, size_pt: f32, max_width_mm: f32) -> Vec<String> {
    let fits = |s: &str| text_width_mm(s, style, size_pt) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let indent_len = paragraph.len() - paragraph.trim_start().len();
        let mut current = paragraph[..indent_len].replace('\t', " ");
        let mut has_word = false;

        for word in paragraph.split_whitespace() {
            let candidate = if has_word {
                format!("{} {}", current, word)
            } else {
                format!("{}{}", current, word)
            };
            if fits(&candidate) {
                current = candidate;
                has_word = true;
                continue;
            }

            if has_word {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
            has_word = true;
        }

        lines.push(current);
    }

    lines
}

/// 编码为 WinAnsi 字节，无法表示的字符写为 `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' | '\r' | '\n' => b' ',
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            '‰' => 0x89,
            'Š' => 0x8a,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            'š' => 0x9a,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_follow_afm_tables() {
        assert_eq!(char_width(FontStyle::Regular, 'i'), 222);
        assert_eq!(char_width(FontStyle::Bold, 'i'), 278);
        assert_eq!(char_width(FontStyle::Regular, 'W'), 944);
        assert_eq!(char_width(FontStyle::Regular, '~'), 584);
        assert_eq!(char_width(FontStyle::Regular, 'é'), FALLBACK_WIDTH);
    }

    #[test]
    fn width_scales_with_font_size() {
        let w11 = text_width_mm("Ekosistem", FontStyle::Regular, 11.0);
        let w22 = text_width_mm("Ekosistem", FontStyle::Regular, 22.0);
        assert!((w22 - 2.0 * w11).abs() < 1e-3);
    }

    #[test]
    fn short_text_stays_on_one_line() {
        let lines = wrap_text("1. Siapa?", FontStyle::Regular, 11.0, 170.0);
        assert_eq!(lines, vec!["1. Siapa?"]);
    }

    #[test]
    fn long_text_wraps_within_width() {
        let text = "Produsen ".repeat(60);
        let lines = wrap_text(text.trim(), FontStyle::Regular, 11.0, 170.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width_mm(line, FontStyle::Regular, 11.0) <= 170.0);
        }
        let rejoined = lines.join(" ");
        assert_eq!(rejoined.split_whitespace().count(), 60);
    }

    #[test]
    fn indent_is_kept_on_first_line() {
        let lines = wrap_text("   A. Budi", FontStyle::Regular, 11.0, 170.0);
        assert_eq!(lines, vec!["   A. Budi"]);
    }

    #[test]
    fn oversized_word_is_split_by_characters() {
        let word = "x".repeat(400);
        let lines = wrap_text(&word, FontStyle::Regular, 11.0, 50.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        assert_eq!(wrap_text("", FontStyle::Regular, 11.0, 100.0), vec![String::new()]);
    }

    #[test]
    fn win_ansi_maps_latin1_and_replaces_the_rest() {
        assert_eq!(encode_win_ansi("Aé–"), vec![b'A', 0xe9, 0x96]);
        assert_eq!(encode_win_ansi("日"), vec![b'?']);
    }
}
