//! Teams webhook发送器模块
//!
//! 实现webhook投递，支持HTTP(S)代理

use crate::config::HandlerConfig;
use crate::error::NotificationError;
use crate::notification::payload::WebhookBody;
use crate::notification::sender::NotificationSender;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::{debug, error, info};

/// Teams webhook发送器
pub struct TeamsSender {
    /// HTTP客户端
    client: Client,
    /// webhook URL
    webhook_url: String,
}

impl TeamsSender {
    /// 根据配置段创建发送器
    ///
    /// # 参数
    /// * `config` - 处理器配置
    ///
    /// # 返回
    /// * `Result<Self, NotificationError>` - 缺少 `webhook_url` 或代理地址无效时返回错误
    pub fn from_config(config: &HandlerConfig) -> Result<Self, NotificationError> {
        let webhook_url = config
            .webhook_url
            .clone()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| NotificationError::ConfigError("未配置 webhook_url".to_string()))?;

        Ok(Self {
            client: build_client(config)?,
            webhook_url,
        })
    }
}

/// 构建HTTP客户端
///
/// 配置了代理时所有请求经由代理；否则直连，忽略环境变量中的代理设置。
fn build_client(config: &HandlerConfig) -> Result<Client, NotificationError> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));

    if let Some(seconds) = config.request_timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }

    builder = match config.proxy_url() {
        Some(proxy_url) => {
            let mut proxy = Proxy::all(&proxy_url).map_err(|e| {
                NotificationError::ConfigError(format!("代理地址无效 {proxy_url}: {e}"))
            })?;

            if let Some(ref username) = config.proxy_username {
                proxy = proxy.basic_auth(username, config.proxy_password.as_deref().unwrap_or(""));
            }

            debug!("通过代理发送: {}", proxy_url);
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}

#[async_trait]
impl NotificationSender for TeamsSender {
    async fn send(&self, body: &WebhookBody) -> Result<(), NotificationError> {
        debug!("发送消息到webhook: {}", self.webhook_url);

        let response = self
            .client
            .post(&self.webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_bytes()?)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            info!("webhook消息发送成功: {}", status);
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            error!("webhook消息发送失败: {} - {}", status, text);
            Err(NotificationError::Delivery {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    fn target(&self) -> &str {
        &self.webhook_url
    }
}
