//! 错误处理模块
//!
//! 定义应用程序的错误类型。挖掘过程本身不产生错误，只有输入边界校验
//! 和外部文本生成调用会返回错误。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 参数验证错误（公共契约被误用）
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 文本生成服务错误
    #[error("文本生成失败: {0}")]
    Generation(String),

    /// 文本生成服务返回了无法识别的结构
    #[error("生成结果格式错误: {0}")]
    MalformedResponse(String),

    /// 超时错误
    #[error("操作超时: {0}")]
    Timeout(String),

    /// HTTP 错误
    #[error("HTTP 错误: {0}")]
    Http(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout(e.to_string())
        } else {
            AppError::Http(e.to_string())
        }
    }
}

impl AppError {
    /// 错误代码（用于日志与回退原因记录）
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION",
            AppError::Config(_) => "CONFIG",
            AppError::Serialization(_) => "SERIALIZATION",
            AppError::Generation(_) => "GENERATION",
            AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Http(_) => "HTTP",
            AppError::Io(_) => "IO",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

/// 错误报告
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorReport {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
}

impl From<&AppError> for ErrorReport {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
