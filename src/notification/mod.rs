//! 通知模块
//!
//! 提供载荷构建、消息模板和webhook投递功能

pub mod handler;
pub mod payload;
pub mod sender;
pub mod teams;
pub mod template;

// 重新导出主要类型
pub use handler::{handle, handle_with, prepare};
pub use payload::{MessageCard, WebhookBody};
pub use sender::{DryRunSender, NotificationSender};
pub use teams::TeamsSender;
pub use template::{HandlebarsTemplate, MessageTemplate, TemplateContext};
