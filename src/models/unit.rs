use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 教学大纲中的一个单元
///
/// 由解析流水线一次性构建，之后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Unit {
    /// 稳定的顺序 ID，形如 "unit_3"
    pub id: String,
    /// 单元标题
    pub title: String,
    /// 单元内按出现顺序排列的知识点
    pub topics: Vec<String>,
    /// 单元序号（从 1 开始连续）
    pub order: u32,
}

impl Unit {
    pub fn new(order: u32, title: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            id: format!("unit_{}", order),
            title: title.into(),
            topics,
            order,
        }
    }
}

/// 一次大纲提交解析出的完整单元列表
///
/// 不变量：`order` 从 1 开始连续且唯一。重新上传会产生新的大纲，
/// 已有大纲永远不做原地修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SyllabusOutline {
    pub units: Vec<Unit>,
}

impl SyllabusOutline {
    pub fn new(units: Vec<Unit>) -> Self {
        let mut outline = Self { units };
        outline.renumber();
        outline
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// 按 ID 查找单元
    pub fn unit_by_id(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// 重排序号，保证 order/id 从 1 开始连续
    ///
    /// 解析级联的各个策略可能丢弃无知识点的单元，丢弃之后必须调用。
    fn renumber(&mut self) {
        for (i, unit) in self.units.iter_mut().enumerate() {
            let order = (i + 1) as u32;
            unit.order = order;
            unit.id = format!("unit_{}", order);
        }
    }
}

/// 持久化的大纲记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Syllabus {
    pub id: String,
    /// 课程名称
    pub course_name: String,
    /// 原始大纲文本
    pub content: String,
    /// 解析结果
    pub units: Vec<Unit>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Syllabus {
    pub fn new(course_name: impl Into<String>, content: impl Into<String>, outline: &SyllabusOutline) -> Self {
        let now = Utc::now();
        Self {
            id: super::question::new_id("syl"),
            course_name: course_name.into(),
            content: content.into(),
            units: outline.units.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}
