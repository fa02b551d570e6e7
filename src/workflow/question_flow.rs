//! 题目生成流程 - 流程层
//!
//! 核心职责：把"一条分配计划"变成"一道题"，且永远成功返回。
//!
//! 每条计划走一个小状态机：
//!
//! ```text
//! ATTEMPT(n=1..3) ──成功且通过校验──→ SUCCESS (provenance = generated)
//!      │
//!      └─失败/超时/校验不过─→ RETRY ──3 次耗尽──→ EXHAUSTED → 模板兜底
//!                                                  (provenance = fallback)
//! ```
//!
//! 生成服务的一切失败都被吸收在这里，不会向上传播。

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ProviderError;
use crate::models::labels::co_bl_for_marks;
use crate::models::question::new_id;
use crate::models::{GeneratedQuestion, Provenance, QuestionType, Unit};
use crate::planner::PlanEntry;
use crate::services::{GenerationProvider, GenerationRequest, ProviderQuestion};
use crate::workflow::question_ctx::QuestionCtx;

/// 单条计划的最大尝试次数
pub const MAX_ATTEMPTS: usize = 3;

/// 单次尝试的结果
enum AttemptOutcome {
    /// 通过校验的题目载荷
    Accepted(ProviderQuestion),
    /// 需要重试（携带原因，仅用于日志）
    Retry(String),
}

/// 题目生成流程
///
/// - 不持有任何资源，只借用出题能力
/// - 只处理单条计划，不出现 Vec<PlanEntry>
/// - 不关心计划怎么排出来的
pub struct QuestionFlow<'a, P: GenerationProvider> {
    provider: &'a P,
    call_timeout: Duration,
}

impl<'a, P: GenerationProvider> QuestionFlow<'a, P> {
    /// 创建新的题目生成流程
    pub fn new(provider: &'a P, config: &Config) -> Self {
        Self {
            provider,
            call_timeout: Duration::from_secs(config.llm_timeout_secs),
        }
    }

    /// 为一条计划生成一道题
    ///
    /// # 参数
    /// - `entry`: 分配计划中的一条
    /// - `unit`: 计划指向的单元（只读）
    /// - `ctx`: 日志上下文
    ///
    /// # 返回
    /// 永远返回一道题：要么来自生成服务，要么来自兜底模板
    pub async fn run(&self, entry: &PlanEntry, unit: &Unit, ctx: &QuestionCtx) -> GeneratedQuestion {
        let request = GenerationRequest {
            unit_title: unit.title.clone(),
            topics: unit.topics.clone(),
            question_type: entry.question_type,
            marks: entry.marks,
            difficulty: entry.difficulty,
        };

        for attempt in 1..=MAX_ATTEMPTS {
            debug!(
                "[试卷 {}] 题目 {}/{} 第 {}/{} 次尝试",
                ctx.paper_index, ctx.question_index, ctx.total_questions, attempt, MAX_ATTEMPTS
            );

            match self.attempt(&request).await {
                AttemptOutcome::Accepted(payload) => {
                    info!(
                        "[试卷 {}] ✓ 题目 {}/{} 生成成功",
                        ctx.paper_index, ctx.question_index, ctx.total_questions
                    );
                    return build_question(entry, unit, payload);
                }
                AttemptOutcome::Retry(reason) => {
                    warn!(
                        "[试卷 {}] 题目 {} 第 {} 次尝试失败: {}",
                        ctx.paper_index, ctx.question_index, attempt, reason
                    );
                }
            }
        }

        // EXHAUSTED：模板兜底
        warn!(
            "[试卷 {}] ⚠️ 题目 {} 已尝试 {} 次，使用兜底模板",
            ctx.paper_index, ctx.question_index, MAX_ATTEMPTS
        );
        fallback_question(entry, unit)
    }

    /// 单次尝试：调用 + 超时 + 结构校验
    async fn attempt(&self, request: &GenerationRequest) -> AttemptOutcome {
        let result = timeout(self.call_timeout, self.provider.generate(request)).await;

        let payload = match result {
            Err(_) => {
                // 超时与服务失败同等对待
                let e = ProviderError::Timeout {
                    seconds: self.call_timeout.as_secs(),
                };
                return AttemptOutcome::Retry(e.to_string());
            }
            Ok(Err(e)) => return AttemptOutcome::Retry(e.to_string()),
            Ok(Ok(payload)) => payload,
        };

        match validate_payload(&payload, request.question_type) {
            Ok(()) => AttemptOutcome::Accepted(payload),
            Err(e) => AttemptOutcome::Retry(e.to_string()),
        }
    }
}

/// 校验生成服务返回的载荷
///
/// 题干太短、选择题/判断题缺选项、答案标记和选项对不上，
/// 都按失败处理（触发重试）。
fn validate_payload(
    payload: &ProviderQuestion,
    question_type: QuestionType,
) -> Result<(), ProviderError> {
    let text = payload.question_text.trim();
    if text.len() < 10 {
        return Err(ProviderError::MalformedPayload {
            detail: format!("题干过短 ({} 字符)", text.len()),
        });
    }

    if !question_type.requires_options() {
        return Ok(());
    }

    let options = match payload.options.as_deref() {
        Some(options) if !options.is_empty() => options,
        _ => {
            return Err(ProviderError::IncompleteOptions {
                detail: "缺少选项集".to_string(),
            })
        }
    };

    match question_type {
        QuestionType::TrueFalse if options.len() != 2 => {
            return Err(ProviderError::IncompleteOptions {
                detail: format!("判断题选项数应为 2，实际 {}", options.len()),
            });
        }
        QuestionType::MultipleChoice if options.len() < 2 => {
            return Err(ProviderError::IncompleteOptions {
                detail: format!("选择题选项数不足: {}", options.len()),
            });
        }
        _ => {}
    }

    let answer = match payload.correct_answer.as_deref().map(str::trim) {
        Some(answer) if !answer.is_empty() => answer,
        _ => {
            return Err(ProviderError::IncompleteOptions {
                detail: "缺少答案标记".to_string(),
            })
        }
    };

    if answer_matches_options(answer, options) {
        Ok(())
    } else {
        Err(ProviderError::IncompleteOptions {
            detail: format!("答案标记 '{}' 与选项集不一致", answer),
        })
    }
}

/// 答案标记与选项集的一致性
///
/// 接受三种写法：选项原文、`A`/`B` 等字母、判断题的 True/False。
fn answer_matches_options(answer: &str, options: &[String]) -> bool {
    // 选项原文（或去掉 "A) " 前缀后的原文）
    if options.iter().any(|o| {
        o.trim().eq_ignore_ascii_case(answer)
            || strip_letter_prefix(o).eq_ignore_ascii_case(answer)
    }) {
        return true;
    }

    // 单个字母标记
    if answer.len() == 1 {
        if let Some(c) = answer.chars().next() {
            if c.is_ascii_alphabetic() {
                let index = (c.to_ascii_uppercase() as u8 - b'A') as usize;
                return index < options.len();
            }
        }
    }

    false
}

fn strip_letter_prefix(option: &str) -> &str {
    let trimmed = option.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), Some(sep))
            if letter.is_ascii_alphabetic() && matches!(sep, ')' | '.' | ':') =>
        {
            chars.as_str().trim()
        }
        _ => trimmed,
    }
}

/// 从载荷组装最终题目
fn build_question(entry: &PlanEntry, unit: &Unit, payload: ProviderQuestion) -> GeneratedQuestion {
    let (co, bl) = co_bl_for_marks(entry.marks);

    GeneratedQuestion {
        id: new_id("q"),
        unit_id: unit.id.clone(),
        unit_title: unit.title.clone(),
        question_text: payload.question_text.trim().to_string(),
        marks: entry.marks,
        question_type: entry.question_type,
        difficulty: entry.difficulty,
        options: payload.options,
        correct_answer: payload.correct_answer,
        explanation: payload.explanation,
        course_outcome: Some(co.to_string()),
        blooms_level: Some(bl.to_string()),
        provenance: Provenance::Generated,
    }
}

/// 论述类兜底模板，按知识点轮换后再按模板轮换
const FALLBACK_TEMPLATES: [&str; 4] = [
    "Explain {topic} in detail.",
    "Discuss the role of {topic} in {unit}.",
    "Describe {topic} with suitable examples.",
    "Summarize the key ideas of {topic} and their significance in {unit}.",
];

/// 确定性兜底题目
///
/// 知识点下标取 `unit_seq % topics.len()`，同一单元的兜底题
/// 先把知识点轮一遍，轮完换下一个模板，保证文本互不相同。
pub fn fallback_question(entry: &PlanEntry, unit: &Unit) -> GeneratedQuestion {
    // 解析阶段保证 topics 非空，这里仍然兜一手标题
    let topics: &[String] = if unit.topics.is_empty() {
        std::slice::from_ref(&unit.title)
    } else {
        &unit.topics
    };

    let topic = &topics[entry.unit_seq % topics.len()];
    let round = entry.unit_seq / topics.len();

    let (question_text, options, correct_answer) = match entry.question_type {
        QuestionType::MultipleChoice => {
            let distractor = if topics.len() > 1 {
                topics[(entry.unit_seq + 1) % topics.len()].clone()
            } else {
                format!("Other aspects of {}", unit.title)
            };
            let text = format!(
                "Which of the following is most closely related to {} in the unit '{}'?",
                topic, unit.title
            );
            let options = vec![
                format!("A) {}", topic),
                format!("B) {}", distractor),
                "C) None of the above".to_string(),
                "D) All of the above".to_string(),
            ];
            (text, Some(options), Some("A".to_string()))
        }
        QuestionType::TrueFalse => {
            let text = format!(
                "The topic '{}' is covered under the unit '{}'.",
                topic, unit.title
            );
            let options = vec!["True".to_string(), "False".to_string()];
            (text, Some(options), Some("True".to_string()))
        }
        QuestionType::FillBlank => {
            let text = format!("Fill in the blank: {} is primarily studied as part of _____.", topic);
            (text, None, Some(unit.title.clone()))
        }
        _ => {
            let template = FALLBACK_TEMPLATES[round % FALLBACK_TEMPLATES.len()];
            let text = template
                .replace("{topic}", topic)
                .replace("{unit}", &unit.title);
            let answer = format!("Students should explain: {}", topic);
            (text, None, Some(answer))
        }
    };

    let (co, bl) = co_bl_for_marks(entry.marks);

    GeneratedQuestion {
        id: new_id("q"),
        unit_id: unit.id.clone(),
        unit_title: unit.title.clone(),
        question_text,
        marks: entry.marks,
        question_type: entry.question_type,
        difficulty: entry.difficulty,
        options,
        correct_answer,
        explanation: Some("Fallback question generated from the unit topic list.".to_string()),
        course_outcome: Some(co.to_string()),
        blooms_level: Some(bl.to_string()),
        provenance: Provenance::Fallback,
    }
}
