//! 流程层（Workflow Layer）
//!
//! 定义"一道题"的完整生成流程：
//! 1. 构造出题请求（单元标题 + 知识点 + 题型/分值/难度）
//! 2. 最多 3 次尝试，单次带超时，结果必须通过结构校验
//! 3. 尝试耗尽后用确定性模板兜底，同一单元的兜底题按知识点
//!    轮换，不会出现两道一模一样的题
//!
//! 流程层不持有任何资源，只依赖出题能力（services）。

pub mod question_ctx;
pub mod question_flow;

pub use question_ctx::QuestionCtx;
pub use question_flow::QuestionFlow;
