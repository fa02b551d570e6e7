//! 段落兜底切分
//!
//! 全文找不到任何单元标记时的最后两级策略：
//! 1. 按空行把文本切成段落，每段合成一个单元，首个子句当标题
//! 2. 连段落都切不出来时，把所有非空行塞进一个单元

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Unit;

use super::topics;

/// 段落要有一定长度才值得当成单元
const MIN_SECTION_LEN: usize = 10;
/// 合成标题的最大长度
const MAX_TITLE_LEN: usize = 100;

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("空行正则应该合法"));

/// 按空行切分并合成单元
///
/// 对非空输入保证至少返回一个单元。
pub fn segment(text: &str) -> Vec<Unit> {
    let mut units = Vec::new();

    for section in BLANK_RUN.split(text) {
        let section = section.trim();
        if section.len() < MIN_SECTION_LEN {
            continue;
        }

        let order = (units.len() + 1) as u32;
        let (title, rest) = split_first_clause(section, order);
        let topics = topics::extract(rest, &title);

        units.push(Unit::new(order, title, topics));
    }

    if units.is_empty() {
        if let Some(unit) = last_resort_unit(text) {
            units.push(unit);
        }
    }

    units
}

/// 段首子句（到第一个标点/换行为止）作为合成标题
///
/// 子句太长或太短时退化为 "Section N"。
fn split_first_clause(section: &str, order: u32) -> (String, &str) {
    let cut = section
        .find(['.', ':', ';', '\n', '–', '—'])
        .unwrap_or(section.len());
    let clause = section[..cut].trim();

    if clause.len() >= 3 && clause.len() < MAX_TITLE_LEN {
        let rest = section[cut..].trim_start_matches(['.', ':', ';', '\n', '–', '—', ' ']);
        (clause.to_string(), rest)
    } else {
        (format!("Section {}", order), section)
    }
}

/// 兜底中的兜底：所有非空行 → 一个单元
fn last_resort_unit(text: &str) -> Option<Unit> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| l.len() > 3)
        .collect();

    let first = lines.first()?;
    let mut title = first.to_string();
    if title.len() > MAX_TITLE_LEN {
        let cut = title
            .char_indices()
            .take_while(|(i, _)| *i < MAX_TITLE_LEN)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(title.len());
        title.truncate(cut);
    }

    let rest = lines[1..].join("\n");
    let topics = topics::extract(&rest, &title);

    Some(Unit::new(1, title, topics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_paragraphs_become_two_units() {
        let text = "Relational databases: tables, keys and constraints explained in depth.\n\nTransaction management: ACID properties, locking and recovery.";
        let units = segment(text);

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].title, "Relational databases");
        assert!(!units[0].topics.is_empty());
        assert_eq!(units[1].title, "Transaction management");
    }

    #[test]
    fn test_short_sections_skipped() {
        let text = "ok\n\nIndexing structures: B-trees and hash indexes in storage engines.";
        let units = segment(text);

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].title, "Indexing structures");
    }

    #[test]
    fn test_lines_without_blank_separation() {
        let text = "Query optimization fundamentals\nCost models\nJoin ordering heuristics";
        let units = segment(text);

        // 没有空行也没有标记，全部进一个单元，首行当标题
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].title, "Query optimization fundamentals");
        assert_eq!(
            units[0].topics,
            vec!["Cost models".to_string(), "Join ordering heuristics".to_string()]
        );
    }

    #[test]
    fn test_last_resort_seeds_title_as_topic() {
        // 唯一一段太短不成段落，落到最后的兜底
        let units = segment("Hashing");

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].title, "Hashing");
        assert_eq!(units[0].topics, vec!["Hashing".to_string()]);
    }
}
