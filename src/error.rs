//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// 处理器的主要错误类型
#[derive(Error, Debug)]
pub enum HandlerError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 事件解析相关错误
    #[error("事件错误: {0}")]
    Event(#[from] EventError),

    /// 通知相关错误
    #[error("通知错误: {0}")]
    Notification(#[from] NotificationError),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 配置段不存在
    #[error("配置段不存在: {section}")]
    SectionNotFound { section: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 事件错误类型
#[derive(Error, Debug)]
pub enum EventError {
    /// 事件JSON无法解析
    #[error("事件解析失败: {0}")]
    ParseError(String),

    /// 缺少必需字段
    #[error("事件缺少字段: {field}")]
    MissingField { field: &'static str },
}

/// 通知错误类型
#[derive(Error, Debug)]
pub enum NotificationError {
    /// 请求发送失败（连接、TLS、代理等）
    #[error("通知发送失败: {0}")]
    SendError(#[from] reqwest::Error),

    /// webhook返回非成功状态码
    #[error("webhook返回错误状态 {status}: {body}")]
    Delivery { status: u16, body: String },

    /// 模板渲染错误
    #[error("模板渲染失败: {0}")]
    TemplateError(String),

    /// 配置错误
    #[error("通知配置错误: {0}")]
    ConfigError(String),

    /// 载荷序列化错误
    #[error("载荷序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 输出写入错误
    #[error("输出写入失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_carries_status_and_body() {
        let err: HandlerError = NotificationError::Delivery {
            status: 500,
            body: "upstream exploded".to_string(),
        }
        .into();

        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("upstream exploded"));
    }

    #[test]
    fn test_missing_field_message() {
        let err = EventError::MissingField { field: "client.name" };
        assert!(err.to_string().contains("client.name"));
    }
}
