//! 命令行参数定义
//!
//! 使用clap定义处理器的命令行接口

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// 默认的配置段名称
pub const DEFAULT_SECTION: &str = "teams";

/// Sensu Teams Handler - 将监控事件发送到Teams webhook
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sensu-teams-handler",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（TOML，或扩展名为 .json 的JSON）",
        env = "SENSU_TEAMS_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 配置段名称
    #[arg(
        short = 'j',
        long,
        value_name = "NAME",
        default_value = DEFAULT_SECTION,
        help = "配置段名称"
    )]
    pub json_config: String,

    /// 事件文件路径，未指定时从标准输入读取
    #[arg(short, long, value_name = "FILE", help = "事件文件路径（默认读取标准输入）")]
    pub event: Option<PathBuf>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        help = "日志级别",
        env = "SENSU_TEAMS_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// 是否输出JSON格式日志
    #[arg(long, help = "输出JSON格式日志")]
    pub log_json: bool,

    /// 日志文件路径
    #[arg(long, value_name = "FILE", help = "日志文件路径（默认标准错误）")]
    pub log_file: Option<PathBuf>,

    /// 只打印请求体，不发送
    #[arg(long, help = "只打印请求体，不发送")]
    pub dry_run: bool,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl Args {
    /// 获取配置文件路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::get_default_config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["sensu-teams-handler"]).unwrap();

        assert_eq!(args.json_config, "teams");
        assert_eq!(args.log_level, LogLevel::Info);
        assert!(args.event.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_explicit_options() {
        let args = Args::try_parse_from([
            "sensu-teams-handler",
            "-c",
            "/etc/sensu/teams.json",
            "-j",
            "teams_ops",
            "--event",
            "event.json",
            "--log-level",
            "debug",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.get_config_path(), PathBuf::from("/etc/sensu/teams.json"));
        assert_eq!(args.json_config, "teams_ops");
        assert_eq!(args.event, Some(PathBuf::from("event.json")));
        assert_eq!(log::LevelFilter::from(args.log_level), log::LevelFilter::Debug);
        assert!(args.dry_run);
    }

    #[test]
    fn test_invalid_log_level() {
        let result = Args::try_parse_from(["sensu-teams-handler", "--log-level", "loud"]);
        assert!(result.is_err());
    }
}
