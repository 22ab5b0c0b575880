//! 通知发送器模块
//!
//! 定义通知发送的trait和基础实现

use crate::error::NotificationError;
use crate::notification::payload::WebhookBody;
use async_trait::async_trait;
use std::io::Write;

/// 通知发送器trait
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 发送请求体
    ///
    /// # 参数
    /// * `body` - 已构建好的请求体
    ///
    /// # 返回
    /// * `Result<(), NotificationError>` - 发送结果
    async fn send(&self, body: &WebhookBody) -> Result<(), NotificationError>;

    /// 发送目标的描述，用于日志
    fn target(&self) -> &str;
}

/// 只打印不发送的发送器（`--dry-run`）
pub struct DryRunSender;

#[async_trait]
impl NotificationSender for DryRunSender {
    async fn send(&self, body: &WebhookBody) -> Result<(), NotificationError> {
        let bytes = body.to_bytes()?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.write_all(b"\n")?;
        Ok(())
    }

    fn target(&self) -> &str {
        "stdout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_sender() {
        let sender = DryRunSender;
        let body = WebhookBody::Raw("{}".to_string());

        assert!(sender.send(&body).await.is_ok());
        assert_eq!(sender.target(), "stdout");
    }
}
