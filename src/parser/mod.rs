//! 大纲结构化引擎
//!
//! ## 职责
//!
//! 把自由格式的课程大纲文本解析成"单元 + 知识点"的结构化大纲。
//!
//! ## 策略级联
//!
//! 真实大纲的排版千差万别（规整的逐行排版、PDF 提取出的整段
//! 连排文本），单一正则覆盖不了，所以解析器组织成一条宽容度
//! 递增的策略链，前一级结果退化（≤1 个单元）时才动用下一级：
//!
//! ```text
//! 行首边界模式 (unit_matcher)
//!     ↓ ≤1 个单元
//! 行内标记提取 (inline_extractor)
//!     ↓ 0 个单元
//! 段落兜底切分 (paragraph)
//! ```
//!
//! 每一级都是纯函数，单独可测；同样的输入永远得到同样的大纲。

pub mod inline_extractor;
pub mod normalize;
pub mod paragraph;
pub mod roman;
pub mod topics;
pub mod unit_matcher;

use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, StructuralError};
use crate::models::{SyllabusOutline, Unit};

use unit_matcher::RawUnitSpan;

/// 单个单元正文的常规长度上限
///
/// 只匹配到一个边界、但正文远超这个长度时，大概率是整段连排
/// 文本里还藏着别的单元，值得再试一次行内提取。
const SINGLE_UNIT_BODY_NORM: usize = 600;

/// 大纲解析器
#[derive(Debug, Default)]
pub struct SyllabusParser;

impl SyllabusParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析大纲文本
    ///
    /// # 参数
    /// - `content`: 原始大纲文本
    ///
    /// # 返回
    /// 返回结构化大纲；空白输入返回结构错误
    pub fn parse(&self, content: &str) -> AppResult<SyllabusOutline> {
        if content.trim().is_empty() {
            return Err(AppError::Structural(StructuralError::EmptySyllabus));
        }

        let text = normalize::preprocess(content);
        debug!("归一化完成，{} 字符", text.len());

        // ========== 第一级：行首边界模式 ==========
        let mut spans = unit_matcher::segment(&text);

        // ========== 第二级：行内标记提取 ==========
        if spans.len() <= 1 && self.worth_inline_retry(&spans) {
            if spans.is_empty() {
                warn!("行首模式没有找到单元，尝试行内标记提取");
            } else {
                warn!("只找到一个单元但正文过长，尝试行内标记提取");
            }

            let inline = inline_extractor::extract(&text);
            if inline.len() > spans.len() {
                info!("行内提取找到 {} 个单元标记", inline.len());
                spans = inline;
            }
        }

        let mut units = spans_to_units(spans);

        // ========== 第三级：段落兜底切分 ==========
        if units.is_empty() {
            warn!("行内提取也没有结果，退回段落切分");
            units = paragraph::segment(&text);
        }

        let outline = SyllabusOutline::new(units);
        if outline.is_empty() {
            return Err(AppError::Structural(StructuralError::EmptySyllabus));
        }

        info!("✓ 成功解析出 {} 个单元", outline.len());
        for unit in &outline.units {
            info!("  - {}: {} 个知识点", unit.title, unit.topics.len());
        }

        Ok(outline)
    }

    fn worth_inline_retry(&self, spans: &[RawUnitSpan]) -> bool {
        match spans {
            [] => true,
            [only] => only.body.len() > SINGLE_UNIT_BODY_NORM,
            _ => false,
        }
    }
}

/// 跨度 → 单元：提取知识点，按声明序号升序排列
///
/// 知识点提取自带标题兜底，这里不会产出空知识点的单元。
fn spans_to_units(mut spans: Vec<RawUnitSpan>) -> Vec<Unit> {
    spans.sort_by_key(|s| s.number);

    spans
        .into_iter()
        .map(|span| {
            let topics = topics::extract(&span.body, &span.title);
            Unit::new(span.number, span.title, topics)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> SyllabusOutline {
        SyllabusParser::new().parse(text).expect("解析应该成功")
    }

    #[test]
    fn test_two_units_two_topics_each() {
        let outline =
            parse("Unit 1: Lists\n- Arrays\n- Linked Lists\n\nUnit 2: Trees\n- Binary Trees\n- AVL Trees");

        assert_eq!(outline.len(), 2);
        assert_eq!(outline.units[0].title, "Lists");
        assert_eq!(
            outline.units[0].topics,
            vec!["Arrays".to_string(), "Linked Lists".to_string()]
        );
        assert_eq!(outline.units[1].title, "Trees");
        assert_eq!(
            outline.units[1].topics,
            vec!["Binary Trees".to_string(), "AVL Trees".to_string()]
        );
    }

    #[test]
    fn test_marker_count_equals_unit_count() {
        let outline = parse(
            "Unit 1: Lists\nArrays and lists.\nUnit 2: Trees\nBinary trees.\nUnit 3: Graphs\nTraversals.",
        );

        assert_eq!(outline.len(), 3);
        let orders: Vec<u32> = outline.units.iter().map(|u| u.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_inline_fallback_for_runon_text() {
        let outline = parse(
            "CS8391 DATA STRUCTURES UNIT I LISTS 9 Abstract Data Types – Singly linked lists – Doubly linked lists UNIT II STACKS 9 Stack ADT – Evaluating expressions – Queue ADT",
        );

        assert_eq!(outline.len(), 2);
        assert_eq!(outline.units[0].title, "LISTS");
        assert!(outline.units[0].topics.len() >= 2);
    }

    #[test]
    fn test_paragraph_fallback_without_markers() {
        let outline = parse(
            "Relational model: tables, keys and integrity constraints.\n\nTransactions: ACID properties, concurrency control and recovery.",
        );

        assert_eq!(outline.len(), 2);
        assert_eq!(outline.units[0].title, "Relational model");
    }

    #[test]
    fn test_empty_input_is_structural_error() {
        let err = SyllabusParser::new().parse("   \n\n  ").unwrap_err();
        assert!(matches!(
            err,
            AppError::Structural(StructuralError::EmptySyllabus)
        ));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "Unit 1: Lists\n- Arrays\n- Linked Lists\n\nUnit 2: Trees\n- AVL Trees";
        let first = parse(text);
        let second = parse(text);

        assert_eq!(first, second);
    }

    #[test]
    fn test_reference_sections_excluded() {
        let outline = parse(
            "Unit 1: Lists\n- Arrays\n- Linked Lists\nTEXT BOOKS:\n1. Weiss, Data Structures, Pearson, 3rd Edition.\n\nUnit 2: Trees\n- AVL Trees",
        );

        assert_eq!(outline.len(), 2);
        for unit in &outline.units {
            for topic in &unit.topics {
                assert!(!topic.to_lowercase().contains("pearson"));
            }
        }
    }
}
