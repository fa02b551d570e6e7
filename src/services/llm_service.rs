//! LLM 出题服务 - 业务能力层
//!
//! 只负责"生成一道题"能力，不关心重试和兜底（那是流程层的事）。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini 的 OpenAI 兼容端点）

use std::future::Future;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ProviderError};
use crate::models::{Difficulty, QuestionType};

/// 一次出题请求的字段契约
///
/// 对生成服务而言请求就是这几个字段，怎么写提示词是实现细节。
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub unit_title: String,
    pub topics: Vec<String>,
    pub question_type: QuestionType,
    pub marks: u32,
    pub difficulty: Difficulty,
}

/// 生成服务返回的原始题目载荷
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderQuestion {
    #[serde(rename = "question")]
    pub question_text: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// 出题能力抽象
///
/// 流程层只依赖这个 trait，测试时注入假服务即可覆盖
/// 重试/兜底状态机的每个分支。
pub trait GenerationProvider: Send + Sync {
    /// 生成一道题，失败时返回可恢复的生成服务错误
    fn generate(
        &self,
        req: &GenerationRequest,
    ) -> impl Future<Output = AppResult<ProviderQuestion>> + Send;
}

/// LLM 出题服务
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 出题服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 发送出题请求并解析返回的 JSON 载荷
    async fn request_question(&self, req: &GenerationRequest) -> AppResult<ProviderQuestion> {
        debug!(
            "调用 LLM API，模型: {}，单元: {}，题型: {:?}",
            self.model_name, req.unit_title, req.question_type
        );

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_MESSAGE)
            .build()
            .map_err(|e| AppError::provider_call_failed(&self.model_name, e))?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(build_prompt(req))
            .build()
            .map_err(|e| AppError::provider_call_failed(&self.model_name, e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.7)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| AppError::provider_call_failed(&self.model_name, e))?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::provider_call_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::Provider(ProviderError::EmptyResponse {
                    model: self.model_name.clone(),
                })
            })?;

        parse_payload(&content)
    }
}

impl GenerationProvider for LlmService {
    async fn generate(&self, req: &GenerationRequest) -> AppResult<ProviderQuestion> {
        self.request_question(req).await
    }
}

const SYSTEM_MESSAGE: &str = "You are an expert educator creating exam questions for a course. \
    Always return ONLY valid JSON in the exact format requested, with no extra text.";

/// 按题型构建提示词
fn build_prompt(req: &GenerationRequest) -> String {
    let topics_list = if req.topics.is_empty() {
        vec![req.unit_title.clone()]
    } else {
        req.topics.iter().take(5).cloned().collect()
    };
    let topics_str = topics_list.join("\n- ");

    let type_label = match req.question_type {
        QuestionType::MultipleChoice => "multiple choice",
        QuestionType::ShortAnswer => "short answer",
        QuestionType::Descriptive => "descriptive",
        QuestionType::Essay => "essay",
        QuestionType::TrueFalse => "true/false",
        QuestionType::FillBlank => "fill in the blank",
    };

    let mut prompt = format!(
        "UNIT: {unit}\nTOPICS TO COVER:\n- {topics}\n\n\
         TASK: Create ONE {difficulty} difficulty {kind} question worth {marks} marks.\n\n\
         REQUIREMENTS:\n\
         - Question MUST be specific to the topics listed above\n\
         - Use clear, unambiguous language\n\
         - Appropriate difficulty for {difficulty} level\n\
         - Test real understanding, not just recall\n",
        unit = req.unit_title,
        topics = topics_str,
        difficulty = req.difficulty.as_str(),
        kind = type_label,
        marks = req.marks,
    );

    let format_block = match req.question_type {
        QuestionType::MultipleChoice => {
            "\nCreate exactly 4 options (A, B, C, D). Only ONE option is correct, \
             all distractors plausible but clearly wrong.\n\n\
             Return ONLY valid JSON in this exact format:\n\
             {\n  \"question\": \"...\",\n  \"options\": [\"A) ...\", \"B) ...\", \"C) ...\", \"D) ...\"],\n  \"correct_answer\": \"A\",\n  \"explanation\": \"...\"\n}"
        }
        QuestionType::TrueFalse => {
            "\nCreate a clear statement that is unambiguously true OR false.\n\n\
             Return ONLY valid JSON in this exact format:\n\
             {\n  \"question\": \"...\",\n  \"options\": [\"True\", \"False\"],\n  \"correct_answer\": \"True\",\n  \"explanation\": \"...\"\n}"
        }
        QuestionType::ShortAnswer => {
            "\nThe answer should have 2-4 key points.\n\n\
             Return ONLY valid JSON in this exact format:\n\
             {\n  \"question\": \"...\",\n  \"correct_answer\": \"Key points: 1) ... 2) ...\",\n  \"explanation\": \"Marking scheme: 1 mark per key point\"\n}"
        }
        QuestionType::Descriptive => {
            "\nThe question needs a detailed explanation testing deep understanding.\n\n\
             Return ONLY valid JSON in this exact format:\n\
             {\n  \"question\": \"...\",\n  \"correct_answer\": \"Expected answer structure with key points\",\n  \"explanation\": \"Marking scheme: marks for each major point\"\n}"
        }
        QuestionType::Essay => {
            "\nThe question requires a comprehensive essay-type answer.\n\n\
             Return ONLY valid JSON in this exact format:\n\
             {\n  \"question\": \"...\",\n  \"correct_answer\": \"Structure: introduction, main points, examples, conclusion\",\n  \"explanation\": \"Marking scheme breakdown\"\n}"
        }
        QuestionType::FillBlank => {
            "\nReturn ONLY valid JSON in this exact format:\n\
             {\n  \"question\": \"Statement with _____ blank to fill\",\n  \"correct_answer\": \"word or phrase for blank\",\n  \"explanation\": \"...\"\n}"
        }
    };

    prompt.push_str(format_block);
    prompt
}

/// 从响应文本中抠出 JSON 并反序列化
///
/// 模型经常把 JSON 包在 markdown 代码块里，或者前后带说明文字，
/// 这里按 "```json 代码块 → 任意代码块 → 首个大括号配对" 的
/// 顺序尝试提取。
pub fn parse_payload(content: &str) -> AppResult<ProviderQuestion> {
    let json_str = extract_json(content).ok_or_else(|| {
        AppError::provider_malformed(format!("响应中没有 JSON 对象: {}", preview(content)))
    })?;

    let payload: ProviderQuestion = serde_json::from_str(&json_str)
        .map_err(|e| AppError::provider_malformed(format!("{} (响应: {})", e, preview(content))))?;

    if payload.question_text.trim().is_empty() {
        return Err(AppError::provider_malformed("question 字段为空"));
    }

    Ok(payload)
}

fn extract_json(content: &str) -> Option<String> {
    let trimmed = content.trim();

    // markdown 代码块
    if let Some(rest) = trimmed.split("```json").nth(1) {
        if let Some(block) = rest.split("```").next() {
            return Some(block.trim().to_string());
        }
    }
    if trimmed.contains("```") {
        for part in trimmed.split("```") {
            let part = part.trim();
            if part.starts_with('{') {
                return Some(part.to_string());
            }
        }
    }

    // 混在说明文字里的 JSON 对象
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end > start {
        Some(trimmed[start..=end].to_string())
    } else {
        None
    }
}

fn preview(content: &str) -> String {
    content.chars().take(120).collect()
}
