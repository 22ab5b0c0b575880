//! Sensu Teams Handler - 监控事件通知处理器
//!
//! 由监控系统按事件逐次调用的处理器：
//! - 解析两种形态的事件并统一
//! - 按退出码映射严重级别
//! - 渲染消息描述或完整载荷模板
//! - 通过可选代理投递到Teams webhook

pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod notification;

// 重新导出主要类型
pub use config::HandlerConfig;
pub use error::HandlerError;
pub use event::{Event, Severity};
pub use notification::{handle, prepare};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
