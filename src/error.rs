use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 结构性错误（输入不满足前置条件，当前操作立即终止）
    Structural(StructuralError),
    /// 生成服务错误（可恢复，由重试/兜底状态机吸收）
    Provider(ProviderError),
    /// 存储错误
    Storage(StorageError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Structural(e) => write!(f, "结构错误: {}", e),
            AppError::Provider(e) => write!(f, "生成服务错误: {}", e),
            AppError::Storage(e) => write!(f, "存储错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Structural(e) => Some(e),
            AppError::Provider(e) => Some(e),
            AppError::Storage(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 结构性错误
///
/// 这类错误说明调用方给出的输入本身不完整，重试没有意义，
/// 必须带着"哪个阶段失败"的上下文直接返回给调用方。
#[derive(Debug)]
pub enum StructuralError {
    /// 教学大纲文本为空
    EmptySyllabus,
    /// 大纲中没有任何单元（分配器无法工作）
    EmptyOutline,
    /// 题型规格列表为空
    NoSpecItems,
    /// 题型规格本身不合法（分值或数量为零）
    InvalidSpecItem { detail: String },
    /// 单元筛选条件没有命中任何单元
    UnknownUnitSelection { selection: String },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::EmptySyllabus => write!(f, "教学大纲文本为空，无法解析"),
            StructuralError::EmptyOutline => {
                write!(f, "大纲中没有任何单元，无法分配题目")
            }
            StructuralError::NoSpecItems => write!(f, "题型规格列表为空，无法生成试卷"),
            StructuralError::InvalidSpecItem { detail } => {
                write!(f, "题型规格不合法: {}", detail)
            }
            StructuralError::UnknownUnitSelection { selection } => {
                write!(f, "单元筛选条件 '{}' 没有命中任何单元", selection)
            }
        }
    }
}

impl std::error::Error for StructuralError {}

/// 生成服务错误
#[derive(Debug)]
pub enum ProviderError {
    /// API 调用失败
    CallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回结果为空
    EmptyResponse { model: String },
    /// 返回内容无法解析为题目
    MalformedPayload { detail: String },
    /// 选项集不完整（选择题/判断题缺选项或答案标记不一致）
    IncompleteOptions { detail: String },
    /// 单次调用超时
    Timeout { seconds: u64 },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::CallFailed { model, source } => {
                write!(f, "LLM API 调用失败 (模型: {}): {}", model, source)
            }
            ProviderError::EmptyResponse { model } => {
                write!(f, "LLM 返回结果为空 (模型: {})", model)
            }
            ProviderError::MalformedPayload { detail } => {
                write!(f, "LLM 返回内容无法解析为题目: {}", detail)
            }
            ProviderError::IncompleteOptions { detail } => {
                write!(f, "题目选项集不完整: {}", detail)
            }
            ProviderError::Timeout { seconds } => {
                write!(f, "LLM 调用超时 (限时 {} 秒)", seconds)
            }
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::CallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 存储错误
#[derive(Debug)]
pub enum StorageError {
    /// 读取集合文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入集合文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 序列化记录失败
    SerializeFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 隔离损坏文件失败
    QuarantineFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ReadFailed { path, source } => {
                write!(f, "读取存储文件失败 ({}): {}", path, source)
            }
            StorageError::WriteFailed { path, source } => {
                write!(f, "写入存储文件失败 ({}): {}", path, source)
            }
            StorageError::SerializeFailed { source } => {
                write!(f, "序列化记录失败: {}", source)
            }
            StorageError::QuarantineFailed { path, source } => {
                write!(f, "隔离损坏文件失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::ReadFailed { source, .. }
            | StorageError::WriteFailed { source, .. }
            | StorageError::SerializeFailed { source }
            | StorageError::QuarantineFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(StorageError::SerializeFailed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(StorageError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建 LLM API 调用错误
    pub fn provider_call_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Provider(ProviderError::CallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建返回内容错误
    pub fn provider_malformed(detail: impl Into<String>) -> Self {
        AppError::Provider(ProviderError::MalformedPayload {
            detail: detail.into(),
        })
    }

    /// 创建存储读取错误
    pub fn storage_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Storage(StorageError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建存储写入错误
    pub fn storage_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Storage(StorageError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 判断是否属于可恢复的生成服务错误
    pub fn is_provider_error(&self) -> bool {
        matches!(self, AppError::Provider(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_check() {
        let provider = AppError::Provider(ProviderError::EmptyResponse {
            model: "gemini-pro".to_string(),
        });
        assert!(provider.is_provider_error());

        let structural = AppError::Structural(StructuralError::EmptyOutline);
        assert!(!structural.is_provider_error());
    }

    #[test]
    fn test_display_carries_context() {
        let err = AppError::Structural(StructuralError::UnknownUnitSelection {
            selection: "unit_9".to_string(),
        });
        assert!(err.to_string().contains("unit_9"));

        let err = AppError::Provider(ProviderError::Timeout { seconds: 60 });
        assert!(err.to_string().contains("60"));
    }

    #[test]
    fn test_source_chain_preserved() {
        use std::error::Error;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = AppError::storage_write_failed("storage/papers.json", io);

        assert!(err.source().is_some());
        assert!(err.to_string().contains("papers.json"));
    }
}
