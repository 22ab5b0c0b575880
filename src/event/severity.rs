//! 检查状态严重级别
//!
//! 将检查脚本的退出码映射为四个固定级别

use serde::{Deserialize, Serialize};

/// 严重级别枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// 退出码 0
    Ok,
    /// 退出码 1
    Warning,
    /// 退出码 2
    Critical,
    /// 退出码 3 以及其他所有无法识别的状态
    Unknown,
}

impl Severity {
    /// 根据原始退出码获取严重级别
    ///
    /// 0-3 以外的任何值（包括 126/127 这类 shell 执行失败的退出码），
    /// 以及缺失或非数字的状态，一律归入 `Unknown`。
    pub fn from_status(status: Option<i64>) -> Self {
        match status {
            Some(0) => Severity::Ok,
            Some(1) => Severity::Warning,
            Some(2) => Severity::Critical,
            _ => Severity::Unknown,
        }
    }

    /// 对应的标准退出码
    pub fn code(&self) -> i64 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }

    /// 显示标签
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }

    /// 卡片主题色
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Ok => "#36a64f",
            Severity::Warning => "#FFCC00",
            Severity::Critical => "#FF0000",
            Severity::Unknown => "#6600CC",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
