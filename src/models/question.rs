use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rules::{Difficulty, GenerationRules, QuestionType};

/// 单元 ID → 分到的题目数量
///
/// 用 BTreeMap 保证遍历与序列化顺序稳定。
pub type CoverageMap = BTreeMap<String, usize>;

/// 生成带前缀的 8 位十六进制 ID，如 "q_1f2e3d4c"
pub fn new_id(prefix: &str) -> String {
    format!("{}_{:08x}", prefix, rand::random::<u32>())
}

/// 题目来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// 外部生成服务产出
    Generated,
    /// 重试耗尽后由模板兜底产出
    Fallback,
}

/// 一道生成完成的题目
///
/// 由编排层产出后不再修改，归属于最终试卷。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub id: String,
    pub unit_id: String,
    pub unit_title: String,
    pub question_text: String,
    pub marks: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    /// 选择题/判断题的选项
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// 课程目标标签，如 "CO1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_outcome: Option<String>,
    /// Bloom 认知层级标签，如 "K1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blooms_level: Option<String>,
    pub provenance: Provenance,
}

/// 一份完整试卷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPaper {
    pub id: String,
    pub syllabus_id: String,
    pub course_name: String,
    pub generated_at: DateTime<Utc>,
    pub total_marks: u32,
    pub total_questions: usize,
    pub questions: Vec<GeneratedQuestion>,
    pub generation_rules: GenerationRules,
    /// 每个单元分到的题目数
    pub units_coverage: CoverageMap,
    /// 生成后校验产出的警告（不阻断组卷）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl QuestionPaper {
    pub fn new(
        syllabus_id: impl Into<String>,
        course_name: impl Into<String>,
        questions: Vec<GeneratedQuestion>,
        generation_rules: GenerationRules,
        units_coverage: CoverageMap,
        warnings: Vec<String>,
    ) -> Self {
        let total_marks = questions.iter().map(|q| q.marks).sum();
        Self {
            id: new_id("qp"),
            syllabus_id: syllabus_id.into(),
            course_name: course_name.into(),
            generated_at: Utc::now(),
            total_marks,
            total_questions: questions.len(),
            questions,
            generation_rules,
            units_coverage,
            warnings,
        }
    }
}

/// 答案页中的一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKeyItem {
    pub question_id: String,
    /// 题目在试卷中的序号（从 1 开始）
    pub question_number: usize,
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub marks: u32,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// 整卷答案页
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKey {
    pub paper_id: String,
    pub course_name: String,
    pub total_marks: u32,
    pub generated_at: DateTime<Utc>,
    pub answers: Vec<AnswerKeyItem>,
}

impl AnswerKey {
    /// 从已组好的试卷构建答案页
    ///
    /// 没有标准答案的题目（少数兜底论述题）不进入答案页，
    /// 题号仍按题目在试卷中的位置编排。
    pub fn from_paper(paper: &QuestionPaper) -> Self {
        let answers = paper
            .questions
            .iter()
            .enumerate()
            .filter_map(|(i, q)| {
                q.correct_answer.as_ref().map(|answer| AnswerKeyItem {
                    question_id: q.id.clone(),
                    question_number: i + 1,
                    question_text: q.question_text.clone(),
                    question_type: q.question_type,
                    marks: q.marks,
                    correct_answer: answer.clone(),
                    explanation: q.explanation.clone(),
                })
            })
            .collect();

        Self {
            paper_id: paper.id.clone(),
            course_name: paper.course_name.clone(),
            total_marks: paper.total_marks,
            generated_at: paper.generated_at,
            answers,
        }
    }
}
