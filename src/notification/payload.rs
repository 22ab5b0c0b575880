//! webhook载荷模块
//!
//! 构建MessageCard格式的JSON载荷

use crate::config::HandlerConfig;
use crate::event::Event;
use serde::Serialize;

/// 最终发送给webhook的请求体
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookBody {
    /// 程序构建的卡片
    Card(MessageCard),
    /// 完整载荷模板的原样输出
    Raw(String),
}

impl WebhookBody {
    /// 序列化为请求体字节
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            WebhookBody::Card(card) => serde_json::to_vec(card),
            WebhookBody::Raw(raw) => Ok(raw.clone().into_bytes()),
        }
    }
}

/// MessageCard 载荷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageCard {
    #[serde(rename = "themeColor")]
    pub theme_color: String,
    pub text: String,
    pub summary: String,
    pub sections: Vec<Section>,
    #[serde(rename = "potentialAction")]
    pub potential_action: Vec<PotentialAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_names: Option<bool>,
}

/// 卡片段落
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    #[serde(rename = "activityImage")]
    pub activity_image: String,
    pub text: String,
}

/// 卡片动作
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PotentialAction {
    #[serde(rename = "@type")]
    pub action_type: String,
    pub name: String,
    pub targets: Vec<ActionTarget>,
}

/// 动作目标
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionTarget {
    pub os: String,
    pub uri: String,
}

/// 生成事件标识
///
/// 未配置仪表盘时为 `client/check`，否则为指向仪表盘的URL。
pub fn incident_key(event: &Event, config: &HandlerConfig) -> String {
    match config.dashboard.as_deref() {
        Some(dashboard) => format!(
            "{}{}?check={}",
            dashboard, event.client.name, event.check.name
        ),
        None => format!("{}/{}", event.client.name, event.check.name),
    }
}

/// 选择频道：客户端 > 检查 > 配置
pub fn resolve_channel(event: &Event, config: &HandlerConfig) -> Option<String> {
    event
        .client
        .channel
        .clone()
        .or_else(|| event.check.channel.clone())
        .or_else(|| config.channel.clone())
}

/// 组装段落正文：可选前缀 + 包裹后的描述
fn section_text(config: &HandlerConfig, description: &str) -> String {
    let surround = config.surround.as_deref().unwrap_or_default();
    let body = format!("{surround}{description}{surround}");

    match config.message_prefix.as_deref() {
        Some(prefix) if !prefix.is_empty() => format!("{prefix} {body}"),
        _ => body,
    }
}

/// 构建卡片载荷
///
/// # 参数
/// * `event` - 事件
/// * `config` - 处理器配置
/// * `incident_key` - 事件标识
/// * `description` - 已渲染的描述
pub fn build_message_card(
    event: &Event,
    config: &HandlerConfig,
    incident_key: &str,
    description: &str,
) -> MessageCard {
    let severity = event.severity();

    MessageCard {
        theme_color: severity.color().to_string(),
        text: format!("{} - {}", event.client.address, severity.label()),
        summary: format!("{incident_key}: {description}"),
        sections: vec![Section {
            activity_image: config.icon_url().to_string(),
            text: section_text(config, description),
        }],
        potential_action: vec![PotentialAction {
            action_type: config.action_type().to_string(),
            name: config.action_name().to_string(),
            targets: vec![ActionTarget {
                os: "default".to_string(),
                uri: incident_key.to_string(),
            }],
        }],
        channel: resolve_channel(event, config),
        username: config.bot_name.clone(),
        icon_emoji: config.icon_emoji.clone(),
        link_names: config.link_names.then_some(true),
    }
}
