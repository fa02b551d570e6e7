//! 单元边界识别
//!
//! 按"特异性递减"的顺序对每一行套用边界模式：
//! 1. 关键词 + 数字/罗马数字（`Unit 3`、`UNIT III`、`Chapter 2`、`Module 1`），
//!    后面可跟冒号/破折号与自由标题
//! 2. 裸编号标题（`1. Title`），仅当全文没有任何关键词形式时才启用
//!
//! 边界行把文本切成若干单元跨度；参考书目/教学目标类噪声行会把
//! 当前跨度在该处截断，且不进入任何下游跨度。

use std::sync::LazyLock;

use regex::Regex;

use super::normalize;
use super::roman::parse_roman;

/// 一个未经知识点提取的原始单元跨度
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUnitSpan {
    /// 声明的单元序号（罗马数字已转为整数）
    pub number: u32,
    /// 声明的标题
    pub title: String,
    /// 跨度内的正文（到下一个边界或噪声截断点为止）
    pub body: String,
}

/// 关键词边界模式，特异性递减
static KEYWORD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^unit\s+(\d+)\s*:\s*(.+)",
        r"(?i)^unit\s+(\d+)\s+(.+)",
        r"(?i)^chapter\s+(\d+)\s*[:\-–—]?\s*(.+)",
        r"(?i)^module\s+(\d+)\s*[:\-–—]?\s*(.+)",
        r"(?i)^unit\s+([ivxlcdm]+)\b\s*[:\-–—]?\s*(.+)",
        r"(?i)^(?:unit|chapter|module)\s+(\d+|[ivxlcdm]+)\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("边界模式正则应该合法"))
    .collect()
});

/// 裸编号标题（`1. Introduction`）
static BARE_NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s*(.+)").expect("裸编号正则应该合法"));

/// 一条识别出的边界
struct Boundary {
    number: u32,
    title: String,
}

/// 尝试用关键词模式识别边界行
fn match_keyword_boundary(line: &str) -> Option<Boundary> {
    for re in KEYWORD_PATTERNS.iter() {
        if let Some(caps) = re.captures(line) {
            let number_raw = caps.get(1)?.as_str();
            let number = parse_number(number_raw)?;
            let title = caps
                .get(2)
                .map(|m| clean_title(m.as_str()))
                .unwrap_or_default();

            // 无标题形式用 "Unit N" 占位，标题由正文推不出来
            let title = if title.is_empty() {
                format!("Unit {}", number)
            } else {
                title
            };

            if title.len() < 3 || normalize::is_noise_line(&title) {
                return None;
            }

            return Some(Boundary { number, title });
        }
    }
    None
}

/// 尝试用裸编号模式识别边界行
fn match_bare_boundary(line: &str) -> Option<Boundary> {
    let caps = BARE_NUMBERED.captures(line)?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    let title = clean_title(caps.get(2)?.as_str());

    if title.len() < 3 || normalize::is_noise_line(&title) {
        return None;
    }

    Some(Boundary { number, title })
}

fn parse_number(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().or_else(|| parse_roman(raw))
}

/// 去掉标题尾部的标点
fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| matches!(c, ':' | '.' | '-' | '–' | '—') || c.is_whitespace())
        .to_string()
}

/// 把归一化文本按单元边界切分为原始跨度
///
/// 裸编号模式只在全文没有任何关键词边界时才参与匹配，
/// 否则普通编号列表会被误认成单元标题。
pub fn segment(text: &str) -> Vec<RawUnitSpan> {
    let mut spans = segment_with(text, match_keyword_boundary);
    if spans.is_empty() {
        spans = segment_with(text, match_bare_boundary);
    }
    spans
}

fn segment_with(text: &str, matcher: impl Fn(&str) -> Option<Boundary>) -> Vec<RawUnitSpan> {
    let mut spans: Vec<RawUnitSpan> = Vec::new();
    let mut current: Option<(Boundary, Vec<String>)> = None;
    // 噪声行之后、下一个边界之前的正文全部丢弃
    let mut truncated = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.len() < 3 {
            if let Some((_, body)) = current.as_mut() {
                if !truncated {
                    body.push(String::new());
                }
            }
            continue;
        }

        if normalize::is_noise_line(line) {
            truncated = true;
            continue;
        }

        if let Some(boundary) = matcher(line) {
            if let Some((done, body)) = current.take() {
                spans.push(finish_span(done, body));
            }
            current = Some((boundary, Vec::new()));
            truncated = false;
            continue;
        }

        if let Some((_, body)) = current.as_mut() {
            if !truncated {
                body.push(line.to_string());
            }
        }
    }

    if let Some((done, body)) = current.take() {
        spans.push(finish_span(done, body));
    }

    spans
}

fn finish_span(boundary: Boundary, body: Vec<String>) -> RawUnitSpan {
    RawUnitSpan {
        number: boundary.number,
        title: boundary.title,
        body: body.join("\n").trim().to_string(),
    }
}
