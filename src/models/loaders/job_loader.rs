use crate::models::rules::GenerationRules;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 一个生成任务：课程名 + 大纲文本 + 生成规则
///
/// 任务以 TOML 文件的形式放在任务目录下，大纲文本可以内嵌
/// （`syllabus`），也可以指向一个外部文本文件（`syllabus_file`）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    pub course_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syllabus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syllabus_file: Option<String>,
    pub rules: GenerationRules,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

impl GenerationJob {
    /// 取出大纲文本，必要时读外部文件
    ///
    /// `syllabus` 与 `syllabus_file` 同时存在时内嵌文本优先。
    pub async fn resolve_syllabus_text(&self) -> Result<String> {
        if let Some(text) = &self.syllabus {
            return Ok(text.clone());
        }

        let path = self
            .syllabus_file
            .as_ref()
            .with_context(|| format!("任务 '{}' 既没有内嵌大纲也没有大纲文件", self.course_name))?;

        fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取大纲文件: {}", path))
    }
}

/// 从 TOML 文件加载一个生成任务
pub async fn load_job_file(job_file_path: &Path) -> Result<GenerationJob> {
    let content = fs::read_to_string(job_file_path)
        .await
        .with_context(|| format!("无法读取任务文件: {}", job_file_path.display()))?;

    let mut job: GenerationJob = toml::from_str(&content)
        .with_context(|| format!("无法解析任务文件: {}", job_file_path.display()))?;

    // 设置文件路径
    job.file_path = Some(job_file_path.to_string_lossy().to_string());

    Ok(job)
}

/// 从文件夹中加载所有 TOML 任务文件
pub async fn load_all_job_files(folder_path: &str) -> Result<Vec<GenerationJob>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("任务目录不存在: {}", folder_path);
    }

    let mut jobs = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取任务目录: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            tracing::info!(
                "正在加载: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );

            match load_job_file(&path).await {
                Ok(job) => {
                    tracing::info!(
                        "成功加载任务 '{}'（{} 条题型规格）",
                        job.course_name,
                        job.rules.question_types.len()
                    );
                    jobs.push(job);
                }
                Err(e) => {
                    tracing::warn!("加载任务失败 {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(jobs)
}
