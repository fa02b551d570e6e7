//! 题目分配器
//!
//! ## 职责
//!
//! 给定大纲和题型规格，为每一道待生成的题目算出目标单元、
//! 类型、分值和难度，产出扁平有序的分配计划。
//!
//! ## 分配规则
//!
//! 每条规格独立地从第一个单元开始轮转（第 k 条规格的第 i 道题
//! 落在 `i mod N` 号单元），保证题量不大时每种题型也能铺满所有
//! 单元，而不是挤在前几个单元里。
//!
//! 计划是纯派生数据，只在一次生成运行内部存活；题目内容是否
//! 重复由编排层负责，这里允许同一单元被多次命中。

use std::collections::HashMap;

use tracing::debug;

use crate::error::{AppError, AppResult, StructuralError};
use crate::models::labels::difficulty_for_marks;
use crate::models::{CoverageMap, Difficulty, GenerationRules, QuestionType, SyllabusOutline, Unit};

/// 计划中的一条：一道待生成题目的全部参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub unit_id: String,
    pub question_type: QuestionType,
    pub marks: u32,
    pub difficulty: Difficulty,
    /// 此前已有多少条计划命中同一单元（兜底模板用它轮换知识点）
    pub unit_seq: usize,
}

/// 一次生成运行的完整分配计划
#[derive(Debug, Clone)]
pub struct AllocationPlan {
    pub entries: Vec<PlanEntry>,
    /// 单元 ID → 分到的题目数，供校验和试卷元数据使用
    pub coverage: CoverageMap,
}

impl AllocationPlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 按单元筛选条件取出参与分配的单元
///
/// `"all"`（或空串）表示全部；否则是逗号分隔的单元 ID 列表。
/// 筛选结果为空视为结构错误。
pub fn select_units<'a>(
    outline: &'a SyllabusOutline,
    selection: &str,
) -> AppResult<Vec<&'a Unit>> {
    let selection = selection.trim();
    if selection.is_empty() || selection.eq_ignore_ascii_case("all") {
        return Ok(outline.units.iter().collect());
    }

    let wanted: Vec<&str> = selection.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    let units: Vec<&Unit> = outline
        .units
        .iter()
        .filter(|u| wanted.iter().any(|w| *w == u.id))
        .collect();

    if units.is_empty() {
        return Err(AppError::Structural(StructuralError::UnknownUnitSelection {
            selection: selection.to_string(),
        }));
    }

    Ok(units)
}

/// 构建分配计划
///
/// # 参数
/// - `outline`: 结构化大纲（只读）
/// - `rules`: 调用方的生成规则
///
/// # 返回
/// 计划长度恒等于规格里 count 的总和；大纲为空或规格为空
/// 时立即返回结构错误
pub fn build_plan(outline: &SyllabusOutline, rules: &GenerationRules) -> AppResult<AllocationPlan> {
    if outline.is_empty() {
        return Err(AppError::Structural(StructuralError::EmptyOutline));
    }
    if rules.question_types.is_empty() {
        return Err(AppError::Structural(StructuralError::NoSpecItems));
    }

    let units = select_units(outline, &rules.unit_selection)?;
    let unit_count = units.len();

    let mut entries = Vec::with_capacity(rules.total_question_count() as usize);
    let mut coverage = CoverageMap::new();
    let mut per_unit_seq: HashMap<String, usize> = HashMap::new();

    for (item_index, item) in rules.question_types.iter().enumerate() {
        if item.marks == 0 || item.count == 0 {
            return Err(AppError::Structural(StructuralError::InvalidSpecItem {
                detail: format!(
                    "第 {} 条规格: marks={}, count={}",
                    item_index + 1,
                    item.marks,
                    item.count
                ),
            }));
        }

        let difficulty = item
            .difficulty
            .unwrap_or_else(|| difficulty_for_marks(item.marks));

        // 每条规格独立重启轮转
        for i in 0..item.count {
            let unit = units[(i as usize) % unit_count];
            let seq = per_unit_seq.entry(unit.id.clone()).or_insert(0);

            entries.push(PlanEntry {
                unit_id: unit.id.clone(),
                question_type: item.question_type,
                marks: item.marks,
                difficulty,
                unit_seq: *seq,
            });

            *seq += 1;
            *coverage.entry(unit.id.clone()).or_insert(0) += 1;
        }
    }

    debug!(
        "分配完成: {} 道题分布到 {} 个单元",
        entries.len(),
        coverage.len()
    );

    Ok(AllocationPlan { entries, coverage })
}
