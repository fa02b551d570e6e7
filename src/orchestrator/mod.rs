//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量任务处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 批量加载生成任务（Vec<GenerationJob>）
//! - 控制并发数量（Semaphore）
//! - 持有存储和出题服务
//! - 输出全局统计信息
//!
//! ### `paper_processor` - 单张试卷处理器
//! - 构建分配计划并逐条生成题目
//! - 控制题目级并发（按计划序号回收结果，顺序与计划一致）
//! - 汇总覆盖统计、执行生成后校验
//! - 组装试卷与答案页
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<GenerationJob>)
//!     ↓
//! paper_processor (处理一份分配计划)
//!     ↓
//! workflow::QuestionFlow (处理单条计划)
//!     ↓
//! services (能力层：llm / storage)
//!     ↓
//! models / parser / planner (值对象与纯逻辑)
//! ```

pub mod batch_processor;
pub mod paper_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use paper_processor::{generate_paper, PaperOutcome, ValidationWarning};
