//! 行内单元标记提取
//!
//! PDF 提取出的整段文本里，`UNIT I LISTS 9 Abstract Data Types ...`
//! 这类标记不在行首。这里不要求标记独占一行，直接在全文里找
//! 标记，向前看到下一个标记或文本结尾切出跨度。

use std::sync::LazyLock;

use regex::Regex;

use super::normalize;
use super::roman::parse_roman;
use super::unit_matcher::RawUnitSpan;

/// 行内单元标记（不锚定行首）
static INLINE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:unit|chapter|module)\s+([ivxlcdm]+|\d+)\b")
        .expect("行内标记正则应该合法")
});

/// 标记后面的标题：字母开头，到学时数字为止
///
/// `UNIT I LISTS 9 ...` 里 "9" 是学时数，标题在它前面结束。
static INLINE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s:.\-–—]*([A-Za-z][A-Za-z\s&,]*?)\s+\d").expect("行内标题正则应该合法")
});

/// 从整段文本中按行内标记切出单元跨度
///
/// 少于两个标记时返回空，让级联落到下一个策略。
pub fn extract(text: &str) -> Vec<RawUnitSpan> {
    let markers: Vec<_> = INLINE_MARKER.find_iter(text).collect();
    if markers.len() < 2 {
        return Vec::new();
    }

    let mut spans = Vec::new();

    for (i, marker) in markers.iter().enumerate() {
        let number_raw = INLINE_MARKER
            .captures(&text[marker.start()..marker.end()])
            .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
            .unwrap_or_default();
        let number = number_raw
            .parse::<u32>()
            .ok()
            .or_else(|| parse_roman(&number_raw))
            .unwrap_or((i + 1) as u32);

        let body_start = marker.end();
        let body_end = markers
            .get(i + 1)
            .map(|next| next.start())
            .unwrap_or(text.len());
        let raw_body = text[body_start..body_end].trim();

        let (title, body) = split_title(raw_body);
        if title.len() < 3 || normalize::is_noise_line(&title) {
            continue;
        }

        spans.push(RawUnitSpan {
            number,
            title,
            body: body.to_string(),
        });
    }

    spans
}

/// 把跨度开头切成 (标题, 余下正文)
fn split_title(raw_body: &str) -> (String, &str) {
    if let Some(caps) = INLINE_TITLE.captures(raw_body) {
        let title = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        // 学时数字连同其后的空白一起跳过
        let rest = raw_body[caps.get(0).map(|m| m.end() - 1).unwrap_or(0)..]
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim_start();
        return (title.to_string(), rest);
    }

    // 没有学时数字：标题取到第一个破折号或前 60 个字符
    let cut = raw_body
        .find([':', '–', '—'])
        .or_else(|| raw_body.find(" - "))
        .unwrap_or_else(|| floor_char_boundary(raw_body, 60));

    let title = raw_body[..cut].trim().trim_end_matches(['-', '–', '—', ':']);
    (title.trim().to_string(), raw_body[cut..].trim_start_matches([':', '-', '–', '—', ' ']))
}

/// 不超过 max 的最近字符边界
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut i = max;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
