//! 知识点提取
//!
//! 在一个单元跨度内部，把正文切成有序的知识点列表。
//! 切分策略按优先级尝试：
//! 1. 行首列表符号（`-`、`•`、`*`）
//! 2. 没有列表符号时按空行分块
//! 3. 正文是单个长行（PDF 提取的常见形态）时按破折号切分，
//!    数字区间内的连字符不算分隔符

use std::sync::LazyLock;

use regex::Regex;

use super::normalize;

/// 知识点最短长度，低于它的候选丢弃
const MIN_TOPIC_LEN: usize = 5;
/// 知识点最大长度
const MAX_TOPIC_LEN: usize = 200;
/// 每个单元最多保留的知识点数
const MAX_TOPICS_PER_UNIT: usize = 15;

/// 行首列表符号与编号
static LEADING_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-\*•\d\.\)\s]+").expect("列表符号正则应该合法"));

/// 容易混进知识点列表的栏目头
static SECTION_HEADERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(topics?|syllabus|course|contents?|unit\s+[ivxlcdm]+|unit\s+\d+):?$")
        .expect("栏目头正则应该合法")
});

/// 提取一个单元的知识点
///
/// 提取结果为空时用单元标题兜底，保证下游分配器永远不会
/// 面对空知识点列表。
pub fn extract(body: &str, title: &str) -> Vec<String> {
    let mut candidates = from_bullets(body);

    if candidates.is_empty() {
        candidates = from_blocks(body);
    }

    if candidates.len() <= 1 {
        // 整个正文挤在一行里：按破折号切
        let line = body.trim();
        if !line.is_empty() && !line.contains('\n') {
            let dashed = split_on_dashes(line);
            if dashed.len() > candidates.len() {
                candidates = dashed;
            }
        }
    }

    let topics = tidy(candidates);
    if topics.is_empty() {
        vec![title.to_string()]
    } else {
        topics
    }
}

/// 策略 1：行首列表符号
fn from_bullets(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|l| l.starts_with('-') || l.starts_with('•') || l.starts_with('*'))
        .map(|l| l.trim_start_matches(['-', '•', '*', ' ']).to_string())
        .collect()
}

/// 策略 2：空行分块，每块合成一个候选
fn from_blocks(body: &str) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join(" "));
    }

    // 只有一块且原文多行时，退回逐行候选
    if blocks.len() <= 1 && body.lines().filter(|l| !l.trim().is_empty()).count() > 1 {
        return body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
    }

    blocks
}

/// 策略 3：破折号切分，跳过数字区间里的连字符
pub fn split_on_dashes(line: &str) -> Vec<String> {
    static DASH: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s[–—-]\s").expect("破折号正则应该合法"));

    let mut parts = Vec::new();
    let mut start = 0;

    for m in DASH.find_iter(line) {
        if is_numeric_range(line, m.start(), m.end()) {
            continue;
        }
        parts.push(line[start..m.start()].to_string());
        start = m.end();
    }
    parts.push(line[start..].to_string());
    parts
}

/// 判断破折号两侧紧邻的非空白字符是否都是数字（如 "pages 9 - 15"）
fn is_numeric_range(line: &str, dash_start: usize, dash_end: usize) -> bool {
    let before = line[..dash_start]
        .chars()
        .rev()
        .find(|c| !c.is_whitespace());
    let after = line[dash_end..].chars().find(|c| !c.is_whitespace());

    matches!((before, after), (Some(b), Some(a)) if b.is_ascii_digit() && a.is_ascii_digit())
}

/// 清洗候选：去编号、过滤噪声与过短项、限长、按大小写不敏感去重
fn tidy(candidates: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut topics: Vec<String> = Vec::new();

    for raw in candidates {
        let cleaned = LEADING_MARKERS.replace(raw.trim(), "").trim().to_string();

        if cleaned.len() < MIN_TOPIC_LEN {
            continue;
        }
        if SECTION_HEADERS.is_match(&cleaned) || normalize::is_noise_line(&cleaned) {
            continue;
        }

        let mut topic = cleaned;
        if topic.len() > MAX_TOPIC_LEN {
            let cut = topic
                .char_indices()
                .take_while(|(i, _)| *i < MAX_TOPIC_LEN)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(topic.len());
            topic.truncate(cut);
        }

        let key = topic.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        topics.push(topic);

        if topics.len() >= MAX_TOPICS_PER_UNIT {
            break;
        }
    }

    topics
}
