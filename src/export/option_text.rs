//! 选项文本清洗
//!
//! AI 有时会在选项前自带 "A. " / "b) " 之类的编号，导出时统一去掉后重新编号。

use std::sync::OnceLock;

use regex::Regex;

fn prefix_regex() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^[A-Ea-e][.)]\s+").expect("valid option prefix regex"))
}

/// 去掉选项开头的字母编号并裁剪空白
pub fn normalize_option(option: &str) -> String {
    let trimmed = option.trim_start();
    prefix_regex().replace(trimmed, "").trim().to_string()
}

/// 按位置推导选项字母：0 → 'A'，1 → 'B' ...
pub fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// 按位置重新编号后的选项列表：`(字母, 清洗后的文本)`
pub fn lettered_options(options: &[String]) -> impl Iterator<Item = (char, String)> + '_ {
    options
        .iter()
        .enumerate()
        .map(|(i, opt)| (option_letter(i), normalize_option(opt)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_recognized_prefixes_in_any_case() {
        assert_eq!(normalize_option("A. Paris"), "Paris");
        assert_eq!(normalize_option("b) London"), "London");
        assert_eq!(normalize_option("E.   Jakarta  "), "Jakarta");
        assert_eq!(normalize_option("  c) Medan"), "Medan");
    }

    #[test]
    fn leaves_other_text_trimmed_but_intact() {
        assert_eq!(normalize_option("  Budi "), "Budi");
        assert_eq!(normalize_option("F. Bukan prefix"), "F. Bukan prefix");
        assert_eq!(normalize_option("A.tanpa spasi"), "A.tanpa spasi");
        assert_eq!(normalize_option("Ani"), "Ani");
        assert_eq!(normalize_option(""), "");
    }

    #[test]
    fn normalizing_twice_is_stable() {
        for s in ["A. Paris", "  b) London ", "Budi", " F) x", "d)\tTab", "Sinta  "] {
            let once = normalize_option(s);
            assert_eq!(normalize_option(&once), once, "input: {:?}", s);
        }
    }

    #[test]
    fn letters_follow_position_not_source() {
        let options = vec!["B. Paris".to_string(), "a) London".to_string()];
        let rendered: Vec<String> = lettered_options(&options)
            .map(|(letter, text)| format!("{}. {}", letter, text))
            .collect();
        assert_eq!(rendered, vec!["A. Paris", "B. London"]);
    }
}
