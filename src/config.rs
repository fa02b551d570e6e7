/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的试卷数量
    pub max_concurrent_papers: usize,
    /// 单张试卷内同时生成的题目数量
    pub max_concurrent_questions: usize,
    /// 生成任务 TOML 文件存放目录
    pub jobs_folder: String,
    /// 持久化存储目录
    pub storage_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次 LLM 调用超时（秒）
    pub llm_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_papers: 4,
            max_concurrent_questions: 5,
            jobs_folder: "jobs".to_string(),
            storage_dir: "storage".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-pro".to_string(),
            llm_timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_papers: std::env::var("MAX_CONCURRENT_PAPERS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_papers),
            max_concurrent_questions: std::env::var("MAX_CONCURRENT_QUESTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_questions),
            jobs_folder: std::env::var("JOBS_FOLDER").unwrap_or(default.jobs_folder),
            storage_dir: std::env::var("STORAGE_DIR").unwrap_or(default.storage_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_timeout_secs),
        }
    }
}
