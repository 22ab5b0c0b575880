//! 事件模块
//!
//! 提供事件解析、形态统一和严重级别映射功能

pub mod model;
pub mod severity;

// 重新导出主要类型
pub use model::{Check, Client, Event};
pub use severity::Severity;
