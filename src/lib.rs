//! # Question Paper Gen
//!
//! 把自由格式的课程大纲变成结构化单元，再按调用方给定的
//! 题型/分值/难度分布批量生成试卷的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 纯逻辑层（Models / Parser / Planner）
//! - `models/` - 值对象：单元、大纲、规则、题目、试卷、标签表
//! - `parser/` - 大纲结构化引擎（归一化 → 边界识别 → 兜底级联）
//! - `planner/` - 题目分配器（轮转分配 + 覆盖统计）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个请求
//! - `LlmService` - LLM 出题能力
//! - `JsonStore` - 原子写 JSON 存储能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整生成流程
//! - `QuestionCtx` - 上下文封装（paper_index + question_index）
//! - `QuestionFlow` - 重试 → 校验 → 兜底的状态机
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量任务处理器，管理资源和并发
//! - `orchestrator/paper_processor` - 单张试卷处理器，驱动分配与生成
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod planner;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    AnswerKey, CoverageMap, Difficulty, GeneratedQuestion, GenerationRules, Provenance,
    QuestionPaper, QuestionSpecItem, QuestionType, Syllabus, SyllabusOutline, Unit,
};
pub use orchestrator::{generate_paper, App, PaperOutcome};
pub use parser::SyllabusParser;
pub use planner::{build_plan, AllocationPlan, PlanEntry};
pub use services::{GenerationProvider, GenerationRequest, JsonStore, LlmService, ProviderQuestion};
pub use workflow::{QuestionCtx, QuestionFlow};
