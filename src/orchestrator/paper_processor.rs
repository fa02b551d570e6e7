//! 单张试卷处理器 - 编排层
//!
//! ## 职责
//!
//! 把"一份大纲 + 一份生成规则"变成"一份完整试卷"：
//!
//! 1. **分配**：调用分配器排出扁平计划
//! 2. **生成**：逐条驱动 QuestionFlow，题目级并发有上限；
//!    结果按计划序号回收，输出顺序永远等于计划顺序
//! 3. **汇总**：覆盖统计在全部条目完成后从结果合并得出，
//!    生成期间没有共享可变状态
//! 4. **校验**：总分与声明值比对、单元覆盖检查，结果只产生
//!    警告，不会让整卷失败
//! 5. **组装**：试卷 + 可选答案页；需要时在组装后打乱题序

use std::fmt;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    AnswerKey, CoverageMap, GeneratedQuestion, GenerationRules, Provenance, QuestionPaper,
    Syllabus, SyllabusOutline, Unit,
};
use crate::planner;
use crate::planner::PlanEntry;
use crate::services::GenerationProvider;
use crate::workflow::{QuestionCtx, QuestionFlow};

/// 生成后校验产出的警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// 实际总分与调用方声明的总分不一致
    TotalMarksMismatch { declared: u32, actual: u32 },
    /// 计划分到了题目的单元在结果里却没有覆盖
    UnitNotCovered { unit_id: String },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::TotalMarksMismatch { declared, actual } => {
                write!(f, "总分不一致: 声明 {} 分，实际 {} 分", declared, actual)
            }
            ValidationWarning::UnitNotCovered { unit_id } => {
                write!(f, "单元 {} 没有分到任何题目", unit_id)
            }
        }
    }
}

/// 一次生成运行的完整产出
#[derive(Debug, Clone)]
pub struct PaperOutcome {
    pub paper: QuestionPaper,
    pub answer_key: Option<AnswerKey>,
    pub warnings: Vec<ValidationWarning>,
}

/// 题目生成统计
#[derive(Debug, Default)]
struct GenerationStats {
    generated: usize,
    fallback: usize,
}

/// 为一份大纲生成一张试卷
///
/// # 参数
/// - `provider`: 出题能力
/// - `syllabus`: 已解析的大纲记录（只读）
/// - `rules`: 生成规则
/// - `paper_index`: 试卷索引（用于日志）
/// - `config`: 配置
///
/// # 返回
/// 计划有多少条，试卷就有多少道题；生成服务的失败全部被
/// 兜底吸收，只有结构性错误会让整卷失败
/// 为单条计划生成一道题
///
/// 作为具名 async fn 存在，使闭包返回的 future 借用得以被推断为
/// higher-ranked，绕开 rustc 对"闭包返回借用 async 块"的限制。
async fn run_one<P: GenerationProvider>(
    flow: &QuestionFlow<'_, P>,
    entry: &PlanEntry,
    unit: &Unit,
    ctx: QuestionCtx,
) -> GeneratedQuestion {
    flow.run(entry, unit, &ctx).await
}

pub async fn generate_paper<P: GenerationProvider>(
    provider: &P,
    syllabus: &Syllabus,
    rules: &GenerationRules,
    paper_index: usize,
    config: &Config,
) -> AppResult<PaperOutcome> {
    let outline = SyllabusOutline {
        units: syllabus.units.clone(),
    };

    // ========== 分配 ==========
    let plan = planner::build_plan(&outline, rules)?;
    let total = plan.len();

    log_plan_ready(paper_index, &syllabus.course_name, total, outline.len());

    // ========== 生成（顺序按计划序号回收）==========
    let flow = QuestionFlow::new(provider, config);
    let flow_ref = &flow;

    // 计划指向的单元先全部解出来，生成期间只读借用；
    // future 直接在循环里构造，避免闭包对借用 async 块的 higher-ranked 限制
    let mut tasks = Vec::with_capacity(total);
    for (i, entry) in plan.entries.iter().enumerate() {
        let unit = outline.unit_by_id(&entry.unit_id).ok_or_else(|| {
            AppError::Other(format!("计划指向未知单元: {}", entry.unit_id))
        })?;
        let ctx = QuestionCtx::new(paper_index, i + 1, total);
        tasks.push(run_one(flow_ref, entry, unit, ctx));
    }

    let questions: Vec<GeneratedQuestion> = stream::iter(tasks)
        .buffered(config.max_concurrent_questions.max(1))
        .collect()
        .await;

    // ========== 汇总 ==========
    let mut coverage = CoverageMap::new();
    let mut stats = GenerationStats::default();
    for question in &questions {
        *coverage.entry(question.unit_id.clone()).or_insert(0) += 1;
        match question.provenance {
            Provenance::Generated => stats.generated += 1,
            Provenance::Fallback => stats.fallback += 1,
        }
    }

    // ========== 校验 ==========
    let warnings = validate_run(rules, &plan.coverage, &coverage, &questions);
    for warning in &warnings {
        warn!("[试卷 {}] ⚠️ 校验警告: {}", paper_index, warning);
    }

    // ========== 组装 ==========
    let mut questions = questions;
    if rules.randomize_order {
        use rand::seq::SliceRandom;
        questions.shuffle(&mut rand::thread_rng());
    }

    let paper = QuestionPaper::new(
        syllabus.id.clone(),
        syllabus.course_name.clone(),
        questions,
        rules.clone(),
        coverage,
        warnings.iter().map(|w| w.to_string()).collect(),
    );

    let answer_key = rules.include_answer_key.then(|| AnswerKey::from_paper(&paper));

    log_paper_done(paper_index, &paper, &stats);

    Ok(PaperOutcome {
        paper,
        answer_key,
        warnings,
    })
}

/// 生成后校验
///
/// 兜底替换不会改变分值，总分不一致只可能来自调用方声明的
/// 总分本身，所以这里只报警告，不算失败。
fn validate_run(
    rules: &GenerationRules,
    planned_coverage: &CoverageMap,
    actual_coverage: &CoverageMap,
    questions: &[GeneratedQuestion],
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if let Some(declared) = rules.total_marks {
        let actual: u32 = questions.iter().map(|q| q.marks).sum();
        if actual != declared {
            warnings.push(ValidationWarning::TotalMarksMismatch { declared, actual });
        }
    }

    for unit_id in planned_coverage.keys() {
        if actual_coverage.get(unit_id).copied().unwrap_or(0) == 0 {
            warnings.push(ValidationWarning::UnitNotCovered {
                unit_id: unit_id.clone(),
            });
        }
    }

    warnings
}

// ========== 日志辅助函数 ==========

fn log_plan_ready(paper_index: usize, course_name: &str, total: usize, unit_count: usize) {
    info!(
        "[试卷 {}] 📋 课程 '{}' 分配完成: {} 道题 / {} 个单元",
        paper_index, course_name, total, unit_count
    );
}

fn log_paper_done(paper_index: usize, paper: &QuestionPaper, stats: &GenerationStats) {
    info!(
        "[试卷 {}] ✓ 组卷完成: {} 道题，共 {} 分 (生成 {} / 兜底 {})",
        paper_index, paper.total_questions, paper.total_marks, stats.generated, stats.fallback
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::models::{QuestionSpecItem, QuestionType};
    use crate::services::{GenerationRequest, ProviderQuestion};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 永远成功的假服务
    struct AlwaysSucceeds {
        calls: AtomicUsize,
    }

    impl GenerationProvider for AlwaysSucceeds {
        async fn generate(&self, req: &GenerationRequest) -> AppResult<ProviderQuestion> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProviderQuestion {
                question_text: format!("Describe topic #{} of unit {} in depth.", n, req.unit_title),
                options: req.question_type.requires_options().then(|| {
                    vec!["True".to_string(), "False".to_string()]
                }),
                correct_answer: Some(if req.question_type.requires_options() {
                    "True".to_string()
                } else {
                    "Key points as discussed in the unit.".to_string()
                }),
                explanation: None,
            })
        }
    }

    /// 永远失败的假服务
    struct AlwaysFails;

    impl GenerationProvider for AlwaysFails {
        async fn generate(&self, _req: &GenerationRequest) -> AppResult<ProviderQuestion> {
            Err(AppError::Provider(ProviderError::EmptyResponse {
                model: "fake".to_string(),
            }))
        }
    }

    fn syllabus() -> Syllabus {
        let outline = SyllabusOutline::new(vec![
            crate::models::Unit::new(1, "Lists", vec!["Arrays".to_string(), "Linked Lists".to_string()]),
            crate::models::Unit::new(2, "Trees", vec!["Binary Trees".to_string(), "AVL Trees".to_string()]),
        ]);
        Syllabus::new("Data Structures", "Unit 1: Lists\nUnit 2: Trees", &outline)
    }

    fn rules(total_marks: Option<u32>) -> GenerationRules {
        GenerationRules {
            question_types: vec![
                QuestionSpecItem {
                    marks: 1,
                    count: 4,
                    question_type: QuestionType::TrueFalse,
                    difficulty: None,
                },
                QuestionSpecItem {
                    marks: 5,
                    count: 2,
                    question_type: QuestionType::Descriptive,
                    difficulty: None,
                },
            ],
            total_marks,
            unit_selection: "all".to_string(),
            include_answer_key: true,
            randomize_order: false,
        }
    }

    #[tokio::test]
    async fn test_output_length_equals_plan_length() {
        let provider = AlwaysSucceeds {
            calls: AtomicUsize::new(0),
        };

        let outcome = generate_paper(&provider, &syllabus(), &rules(Some(14)), 1, &Config::default())
            .await
            .unwrap();

        assert_eq!(outcome.paper.total_questions, 6);
        assert_eq!(outcome.paper.total_marks, 14);
        assert!(outcome.warnings.is_empty());
        // 覆盖统计合计等于计划长度
        assert_eq!(outcome.paper.units_coverage.values().sum::<usize>(), 6);
    }

    #[tokio::test]
    async fn test_failing_provider_still_fills_every_entry() {
        let outcome = generate_paper(&AlwaysFails, &syllabus(), &rules(None), 1, &Config::default())
            .await
            .unwrap();

        assert_eq!(outcome.paper.total_questions, 6);
        assert!(outcome
            .paper
            .questions
            .iter()
            .all(|q| q.provenance == Provenance::Fallback));

        // 同一单元的兜底题文本互不相同
        for unit_id in ["unit_1", "unit_2"] {
            let texts: Vec<&str> = outcome
                .paper
                .questions
                .iter()
                .filter(|q| q.unit_id == unit_id)
                .map(|q| q.question_text.as_str())
                .collect();
            for i in 0..texts.len() {
                for j in (i + 1)..texts.len() {
                    assert_ne!(texts[i], texts[j]);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_output_order_matches_plan_order() {
        let provider = AlwaysSucceeds {
            calls: AtomicUsize::new(0),
        };

        let outcome = generate_paper(&provider, &syllabus(), &rules(None), 1, &Config::default())
            .await
            .unwrap();

        // 判断题规格: unit1, unit2, unit1, unit2；论述题规格重启轮转
        let targets: Vec<&str> = outcome
            .paper
            .questions
            .iter()
            .map(|q| q.unit_id.as_str())
            .collect();
        assert_eq!(
            targets,
            vec!["unit_1", "unit_2", "unit_1", "unit_2", "unit_1", "unit_2"]
        );
    }

    #[tokio::test]
    async fn test_total_marks_mismatch_is_warning_not_error() {
        let provider = AlwaysSucceeds {
            calls: AtomicUsize::new(0),
        };

        let outcome = generate_paper(&provider, &syllabus(), &rules(Some(99)), 1, &Config::default())
            .await
            .unwrap();

        assert_eq!(
            outcome.warnings,
            vec![ValidationWarning::TotalMarksMismatch {
                declared: 99,
                actual: 14
            }]
        );
        assert!(!outcome.paper.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_answer_key_follows_rules_flag() {
        let provider = AlwaysSucceeds {
            calls: AtomicUsize::new(0),
        };

        let mut r = rules(None);
        r.include_answer_key = false;

        let outcome = generate_paper(&provider, &syllabus(), &r, 1, &Config::default())
            .await
            .unwrap();
        assert!(outcome.answer_key.is_none());

        let r = rules(None);
        let provider = AlwaysSucceeds {
            calls: AtomicUsize::new(0),
        };
        let outcome = generate_paper(&provider, &syllabus(), &r, 1, &Config::default())
            .await
            .unwrap();
        let key = outcome.answer_key.expect("应该生成答案页");
        assert_eq!(key.answers.len(), 6);
        assert_eq!(key.paper_id, outcome.paper.id);
    }

    #[tokio::test]
    async fn test_empty_rules_is_structural_error() {
        let provider = AlwaysFails;
        let r = GenerationRules {
            question_types: vec![],
            total_marks: None,
            unit_selection: "all".to_string(),
            include_answer_key: true,
            randomize_order: false,
        };

        let err = generate_paper(&provider, &syllabus(), &r, 1, &Config::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Structural(_)));
    }
}
