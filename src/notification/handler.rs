//! 事件处理流程
//!
//! 事件标识 → 描述渲染 → 载荷构建 → 投递，整个过程无状态

use crate::config::HandlerConfig;
use crate::error::{NotificationError, Result};
use crate::event::Event;
use crate::notification::payload::{build_message_card, incident_key, WebhookBody};
use crate::notification::sender::NotificationSender;
use crate::notification::teams::TeamsSender;
use crate::notification::template::{
    read_template_file, HandlebarsTemplate, MessageTemplate, TemplateContext,
};
use tracing::{debug, info};

/// 处理单个事件并投递到配置的webhook
///
/// # 参数
/// * `event` - 事件
/// * `config` - 处理器配置
///
/// # 返回
/// * `Result<()>` - 投递失败时返回错误，不做重试
pub async fn handle(event: &Event, config: &HandlerConfig) -> Result<()> {
    let sender = TeamsSender::from_config(config)?;
    handle_with(event, config, &sender).await
}

/// 使用指定发送器处理事件
pub async fn handle_with<S>(event: &Event, config: &HandlerConfig, sender: &S) -> Result<()>
where
    S: NotificationSender + ?Sized,
{
    let body = prepare(event, config).await?;
    sender.send(&body).await?;
    info!(
        "事件 {}/{} 已发送到 {}",
        event.client.name,
        event.check.name,
        sender.target()
    );
    Ok(())
}

/// 构建请求体
///
/// 配置了可读的完整载荷模板时直接返回其渲染结果，不再构建卡片。
pub async fn prepare(
    event: &Event,
    config: &HandlerConfig,
) -> std::result::Result<WebhookBody, NotificationError> {
    let key = incident_key(event, config);
    let context = TemplateContext::new(event, config, &key);
    debug!("事件标识: {}, 严重级别: {}", key, event.severity());

    if let Some(source) = read_template_file(config.payload_template.as_deref()).await {
        let rendered = HandlebarsTemplate::new(&source)?.render(&context)?;
        debug!("使用完整载荷模板");
        return Ok(WebhookBody::Raw(rendered));
    }

    let description = render_description(event, config, &context).await?;
    Ok(WebhookBody::Card(build_message_card(
        event,
        config,
        &key,
        &description,
    )))
}

/// 渲染描述
///
/// 顺序：事件自带的通知文本 → 自定义消息模板 → 内置默认模板。
pub async fn render_description(
    event: &Event,
    config: &HandlerConfig,
    context: &TemplateContext,
) -> std::result::Result<String, NotificationError> {
    if let Some(ref notification) = event.check.notification {
        return Ok(notification.clone());
    }

    let template = match read_template_file(config.template.as_deref()).await {
        Some(source) => HandlebarsTemplate::new(&source)?,
        None => HandlebarsTemplate::default_description()?,
    };

    template.render(context)
}
