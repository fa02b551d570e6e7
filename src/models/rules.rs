use serde::{Deserialize, Serialize};

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 选择题
    MultipleChoice,
    /// 简答题
    ShortAnswer,
    /// 论述题
    Descriptive,
    /// 作文题
    Essay,
    /// 判断题
    TrueFalse,
    /// 填空题
    FillBlank,
}

impl QuestionType {
    /// 获取试卷版面上使用的英文标准名称
    pub fn display_name(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Multiple Choice Questions",
            QuestionType::ShortAnswer => "Short Answer Questions",
            QuestionType::Descriptive => "Descriptive Questions",
            QuestionType::Essay => "Essay Questions",
            QuestionType::TrueFalse => "True/False Questions",
            QuestionType::FillBlank => "Fill in the Blanks",
        }
    }

    /// 是否需要完整选项集（选择题/判断题）
    pub fn requires_options(self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }
}

/// 难度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// 单条题型规格
///
/// 调用方声明"要 count 道 question_type 类型、每道 marks 分"的题目，
/// 难度可选，不填时按分值阈值表推导。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpecItem {
    /// 每道题的分值（正整数）
    pub marks: u32,
    /// 题目数量（正整数）
    pub count: u32,
    /// 题目类型
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// 期望难度（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// 试卷生成规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRules {
    /// 题型规格列表
    pub question_types: Vec<QuestionSpecItem>,
    /// 调用方声明的总分（可选，用于生成后校验）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_marks: Option<u32>,
    /// 单元筛选："all" 或逗号分隔的单元 ID 列表
    #[serde(default = "default_unit_selection")]
    pub unit_selection: String,
    /// 是否生成答案页
    #[serde(default = "default_true")]
    pub include_answer_key: bool,
    /// 是否在组卷后打乱题目顺序
    #[serde(default)]
    pub randomize_order: bool,
}

fn default_unit_selection() -> String {
    "all".to_string()
}

fn default_true() -> bool {
    true
}

impl GenerationRules {
    /// 规格中声明的题目总数
    pub fn total_question_count(&self) -> u32 {
        self.question_types.iter().map(|item| item.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_from_toml_with_defaults() {
        let rules: GenerationRules = toml::from_str(
            r#"
            total_marks = 20

            [[question_types]]
            marks = 1
            count = 10
            type = "multiple_choice"

            [[question_types]]
            marks = 5
            count = 2
            type = "descriptive"
            difficulty = "hard"
            "#,
        )
        .expect("规则 TOML 应该能解析");

        assert_eq!(rules.question_types.len(), 2);
        assert_eq!(rules.question_types[0].question_type, QuestionType::MultipleChoice);
        assert_eq!(rules.question_types[0].difficulty, None);
        assert_eq!(rules.question_types[1].difficulty, Some(Difficulty::Hard));
        assert_eq!(rules.unit_selection, "all");
        assert!(rules.include_answer_key);
        assert!(!rules.randomize_order);
        assert_eq!(rules.total_question_count(), 12);
    }

    #[test]
    fn test_question_type_serde_names() {
        let json = serde_json::to_string(&QuestionType::TrueFalse).unwrap();
        assert_eq!(json, "\"true_false\"");

        let parsed: QuestionType = serde_json::from_str("\"fill_blank\"").unwrap();
        assert_eq!(parsed, QuestionType::FillBlank);
    }
}
