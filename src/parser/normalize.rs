//! 文本归一化
//!
//! 解析级联的第一步：清洗 PDF 提取产生的噪声（页码、水印、断行），
//! 并识别参考书目/教学目标等需要整体排除的噪声行。

use std::sync::LazyLock;

use phf::phf_set;
use regex::Regex;

/// 单词级噪声关键词
///
/// 行内任何一个词落在这个集合里，该行即视为参考/目标类噪声行。
static NOISE_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "reference",
    "references",
    "textbook",
    "textbooks",
    "bibliography",
    "objective",
    "objectives",
    "outcome",
    "outcomes",
    "edition",
    "publisher",
    "publication",
    "copyright",
    "pearson",
    "mcgraw",
    "wiley",
};

/// 多词噪声短语（无法用单词集合覆盖的写法）
static NOISE_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(text\s*book|suggested\s+reading|downloaded\s+from|course\s+(objectives?|outcomes?))")
        .expect("噪声短语正则应该合法")
});

/// 站点水印类 PDF 伪迹
static ARTIFACTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(downloaded\s+from\s+\S+|enggtree\.com)").expect("伪迹正则应该合法")
});

/// 独占一行的页码
static PAGE_NUMBER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\d{1,4}\s*\n").expect("页码正则应该合法"));

/// 新小节的行首标记（断行合并时不能跨过这些行）
static SECTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(unit|chapter|module)\b|^\d+\.").expect("小节标记正则应该合法")
});

/// 行首的列表符号（断行合并时保持条目独立）
fn starts_with_bullet(line: &str) -> bool {
    matches!(line.chars().next(), Some('-') | Some('•') | Some('*'))
}

/// 判断一行是否属于参考书目/教学目标类噪声
pub fn is_noise_line(line: &str) -> bool {
    if NOISE_PHRASES.is_match(line) {
        return true;
    }

    line.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|w| NOISE_KEYWORDS.contains(w.to_ascii_lowercase().as_str()))
}

/// 归一化原始大纲文本
///
/// 处理顺序：
/// 1. 去掉空字节和站点水印
/// 2. 去掉独占一行的页码
/// 3. 合并句中断行（行尾没有 `.` `:` `–` `-` `—` 且下一行
///    不是新小节时，与下一行拼接）
/// 4. 压缩连续空格
pub fn preprocess(text: &str) -> String {
    let text = text.replace('\u{0}', "");
    let text = ARTIFACTS.replace_all(&text, "");
    let text = PAGE_NUMBER_LINE.replace_all(&text, "\n");

    let lines: Vec<&str> = text.lines().collect();
    let mut fixed: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let mut line = lines[i].trim().to_string();
        if line.is_empty() {
            fixed.push(String::new());
            i += 1;
            continue;
        }

        // 单元标题行保持独立，不吸收后续内容；
        // 噪声行也不并入，留给分段器整行截断
        while i + 1 < lines.len()
            && !SECTION_START.is_match(&line)
            && !ends_with_break(&line)
            && !SECTION_START.is_match(lines[i + 1].trim())
            && !starts_with_bullet(lines[i + 1].trim())
            && !is_noise_line(lines[i + 1].trim())
        {
            let next = lines[i + 1].trim();
            if next.is_empty() {
                break;
            }
            line.push(' ');
            line.push_str(next);
            i += 1;
        }

        fixed.push(line);
        i += 1;
    }

    static MULTI_SPACE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r" +").expect("空格正则应该合法"));

    let joined = fixed.join("\n");
    MULTI_SPACE.replace_all(&joined, " ").into_owned()
}

fn ends_with_break(line: &str) -> bool {
    line.ends_with('.')
        || line.ends_with(':')
        || line.ends_with('–')
        || line.ends_with('-')
        || line.ends_with('—')
}
