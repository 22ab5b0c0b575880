//! 消息模板模块
//!
//! 提供基于Handlebars的模板渲染功能。模板只能访问 [`TemplateContext`]
//! 中列出的字段，不能访问原始事件。

use crate::config::HandlerConfig;
use crate::error::NotificationError;
use crate::event::Event;
use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// 注册模板时使用的名称
const TEMPLATE_NAME: &str = "template";

/// 默认的描述模板
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str =
    r#"{{check.output}} : {{client.address}} : {{join client.subscriptions ","}}"#;

handlebars_helper!(join: |items: array, sep: str| {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(sep)
});

handlebars_helper!(json: |value: Json| serde_json::to_string(value).unwrap_or_default());

/// 模板上下文数据
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    /// 客户端字段
    pub client: ClientContext,
    /// 检查字段
    pub check: CheckContext,
    /// 严重级别
    pub severity: SeverityContext,
    /// 事件标识
    pub incident_key: String,
    /// 检查执行时间
    pub timestamp: String,
    /// 可公开的配置项
    pub settings: SettingsContext,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientContext {
    pub name: String,
    pub address: String,
    pub subscriptions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckContext {
    pub name: String,
    pub status: Option<i64>,
    pub output: String,
    pub notification: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeverityContext {
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsContext {
    pub channel: Option<String>,
    pub dashboard: Option<String>,
    pub bot_name: Option<String>,
    pub message_prefix: Option<String>,
}

impl TemplateContext {
    /// 从事件和配置构建模板上下文
    ///
    /// # 参数
    /// * `event` - 事件
    /// * `config` - 处理器配置
    /// * `incident_key` - 事件标识
    pub fn new(event: &Event, config: &HandlerConfig, incident_key: &str) -> Self {
        let severity = event.severity();
        let timestamp = event
            .check
            .executed
            .unwrap_or_else(chrono::Utc::now)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        Self {
            client: ClientContext {
                name: event.client.name.clone(),
                address: event.client.address.clone(),
                subscriptions: event.client.subscriptions.clone(),
            },
            check: CheckContext {
                name: event.check.name.clone(),
                status: event.check.status,
                output: event.check.output.clone().unwrap_or_default(),
                notification: event.check.notification.clone(),
            },
            severity: SeverityContext {
                label: severity.label(),
                color: severity.color(),
            },
            incident_key: incident_key.to_string(),
            timestamp,
            settings: SettingsContext {
                channel: config.channel.clone(),
                dashboard: config.dashboard.clone(),
                bot_name: config.bot_name.clone(),
                message_prefix: config.message_prefix.clone(),
            },
        }
    }
}

/// 消息模板trait
pub trait MessageTemplate: Send + Sync {
    /// 渲染模板
    ///
    /// # 参数
    /// * `context` - 模板上下文
    ///
    /// # 返回
    /// * `Result<String, NotificationError>` - 渲染后的文本
    fn render(&self, context: &TemplateContext) -> Result<String, NotificationError>;
}

/// Handlebars模板
pub struct HandlebarsTemplate {
    registry: Handlebars<'static>,
}

impl HandlebarsTemplate {
    /// 编译模板
    ///
    /// 输出不做HTML转义；需要嵌入JSON字符串时使用 `{{json value}}`。
    ///
    /// # 参数
    /// * `template` - 模板字符串
    ///
    /// # 返回
    /// * `Result<Self, NotificationError>` - 语法错误时返回错误
    pub fn new(template: &str) -> Result<Self, NotificationError> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);
        registry.register_helper("join", Box::new(join));
        registry.register_helper("json", Box::new(json));
        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| NotificationError::TemplateError(e.to_string()))?;

        Ok(Self { registry })
    }

    /// 内置的描述模板
    pub fn default_description() -> Result<Self, NotificationError> {
        Self::new(DEFAULT_DESCRIPTION_TEMPLATE)
    }
}

impl MessageTemplate for HandlebarsTemplate {
    fn render(&self, context: &TemplateContext) -> Result<String, NotificationError> {
        self.registry
            .render(TEMPLATE_NAME, context)
            .map_err(|e| NotificationError::TemplateError(e.to_string()))
    }
}

/// 读取模板文件
///
/// 未配置或无法读取时返回 `None`，由调用方回退到默认行为。
pub async fn read_template_file(path: Option<&Path>) -> Option<String> {
    let path = path?;
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Some(content),
        Err(e) => {
            debug!("模板文件 {} 无法读取，使用默认模板: {}", path.display(), e);
            None
        }
    }
}
