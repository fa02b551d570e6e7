//! 批量任务处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量生成任务的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：初始化日志文件、打开存储、创建出题服务
//! 2. **批量加载**：扫描并加载所有待处理的任务（`Vec<GenerationJob>`）
//! 3. **并发控制**：使用 Semaphore 限制并发数量
//! 4. **分批处理**：将任务分批次处理，每批完成后再开始下一批
//! 5. **持久化**：大纲记录先落库；试卷只有完整生成后才落库，
//!    中途失败不会留下半张试卷
//! 6. **全局统计**：汇总所有任务的处理结果

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::loaders::load_all_job_files;
use crate::models::{GenerationJob, Syllabus};
use crate::orchestrator::paper_processor;
use crate::parser::SyllabusParser;
use crate::services::{JsonStore, LlmService};

/// 大纲集合名
const SYLLABI_STORE: &str = "syllabi";
/// 试卷集合名
const QUESTION_PAPERS_STORE: &str = "question_papers";
/// 答案页集合名
const ANSWER_KEYS_STORE: &str = "answer_keys";

/// 应用主结构
pub struct App {
    config: Config,
    store: JsonStore,
    provider: Arc<LlmService>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let store = JsonStore::open(&config.storage_dir).await?;
        let provider = Arc::new(LlmService::new(&config));

        Ok(Self {
            config,
            store,
            provider,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        // 加载所有待处理的任务
        let all_jobs = self.load_jobs().await?;

        if all_jobs.is_empty() {
            warn!("⚠️ 没有找到待处理的任务文件，程序结束");
            return Ok(());
        }

        let total_jobs = all_jobs.len();
        log_jobs_loaded(total_jobs, self.config.max_concurrent_papers);

        // 处理所有任务
        let stats = self.process_all_jobs(all_jobs).await?;

        // 输出最终统计
        print_final_stats(&stats, &self.config);

        Ok(())
    }

    /// 加载任务
    async fn load_jobs(&self) -> Result<Vec<GenerationJob>> {
        info!("\n📁 正在扫描待处理的生成任务...");
        load_all_job_files(&self.config.jobs_folder).await
    }

    /// 处理所有任务
    async fn process_all_jobs(&self, all_jobs: Vec<GenerationJob>) -> Result<ProcessingStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_papers));
        let total_jobs = all_jobs.len();
        let mut stats = ProcessingStats {
            total: total_jobs,
            ..Default::default()
        };

        // 分批处理
        for batch_start in (0..total_jobs).step_by(self.config.max_concurrent_papers) {
            let batch_end = (batch_start + self.config.max_concurrent_papers).min(total_jobs);
            let batch_jobs = &all_jobs[batch_start..batch_end];
            let batch_num = (batch_start / self.config.max_concurrent_papers) + 1;
            let total_batches = (total_jobs + self.config.max_concurrent_papers - 1)
                / self.config.max_concurrent_papers;

            log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_end,
                total_jobs,
            );

            // 处理本批
            let batch_result = self
                .process_batch(batch_jobs, batch_start, semaphore.clone())
                .await?;

            stats.success += batch_result.success;
            stats.failed += batch_result.failed;

            log_batch_complete(batch_num, &batch_result);
        }

        Ok(stats)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch_jobs: &[GenerationJob],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut batch_handles = Vec::new();

        // 为本批创建并发任务
        for (idx, job) in batch_jobs.iter().enumerate() {
            let paper_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;

            let provider = self.provider.clone();
            let store = self.store.clone();
            let config = self.config.clone();
            let job = job.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match process_job(provider, store, &config, job, paper_index).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        error!("[试卷 {}] ❌ 处理过程中发生错误: {}", paper_index, e);
                        Err(e)
                    }
                }
            });
            batch_handles.push((paper_index, handle));
        }

        // 等待本批所有任务完成
        let mut result = BatchResult::default();

        for (paper_index, handle) in batch_handles {
            match handle.await {
                Ok(Ok(())) => {
                    result.success += 1;
                }
                Ok(Err(_)) => {
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[试卷 {}] 任务执行失败: {}", paper_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 处理单个生成任务：解析 → 落库大纲 → 生成 → 落库试卷
async fn process_job(
    provider: Arc<LlmService>,
    store: JsonStore,
    config: &Config,
    job: GenerationJob,
    paper_index: usize,
) -> Result<()> {
    info!("[试卷 {}] 🚩 开始处理课程 '{}'", paper_index, job.course_name);

    // 解析大纲
    let content = job.resolve_syllabus_text().await?;
    let outline = SyllabusParser::new()
        .parse(&content)
        .with_context(|| format!("解析课程 '{}' 的大纲失败", job.course_name))?;

    // 大纲记录先落库，重复生成可以复用
    let syllabus = Syllabus::new(&job.course_name, content, &outline);
    store.put(SYLLABI_STORE, &syllabus.id, &syllabus).await?;
    info!(
        "[试卷 {}] ✓ 大纲已保存 ({}，{} 个单元)",
        paper_index,
        syllabus.id,
        outline.len()
    );

    // 生成整卷；只有完整结果才会落库
    let outcome =
        paper_processor::generate_paper(provider.as_ref(), &syllabus, &job.rules, paper_index, config)
            .await
            .with_context(|| format!("课程 '{}' 组卷失败", job.course_name))?;

    store
        .put(QUESTION_PAPERS_STORE, &outcome.paper.id, &outcome.paper)
        .await?;

    if let Some(answer_key) = &outcome.answer_key {
        store
            .put(ANSWER_KEYS_STORE, &answer_key.paper_id, answer_key)
            .await?;
    }

    info!(
        "[试卷 {}] 💾 试卷 {} 已保存至持久化存储",
        paper_index, outcome.paper.id
    );

    Ok(())
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
}

// ========== 日志辅助函数 ==========

fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n试卷生成日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量试卷生成模式");
    info!("📊 最大并发数: {}", config.max_concurrent_papers);
    info!("🤖 出题模型: {}", config.llm_model_name);
    info!("{}", "=".repeat(60));
}

fn log_jobs_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待处理的生成任务", total);
    info!("📋 将以每批 {} 个的方式处理", max_concurrent);
    info!("💡 每批完成后再开始下一批\n");
}

fn log_batch_start(batch_num: usize, total_batches: usize, start: usize, end: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批任务: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(batch_num: usize, result: &BatchResult) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 第 {} 批完成: 成功 {}/{}",
        batch_num,
        result.success,
        result.success + result.failed
    );
    info!("{}", "─".repeat(60));
}

fn print_final_stats(stats: &ProcessingStats, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.success, stats.total);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
}
