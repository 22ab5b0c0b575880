//! 配置数据结构定义
//!
//! 定义处理器配置段的结构体和验证逻辑

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// 配置文件整体：段名到处理器配置的映射
pub type Settings = HashMap<String, HandlerConfig>;

/// 默认的动作类型
pub const DEFAULT_ACTION_TYPE: &str = "OpenUri";

/// 默认的动作名称
pub const DEFAULT_ACTION_NAME: &str = "View in Sensu";

/// 默认的卡片图片
pub const DEFAULT_ICON_URL: &str =
    "https://raw.githubusercontent.com/sensu/sensu-logo/master/sensu1_flat%20white%20bg_png.png";

/// 单个处理器配置段
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HandlerConfig {
    /// webhook URL
    pub webhook_url: Option<String>,
    /// 完整载荷模板路径，设置后替代默认的JSON构建
    pub payload_template: Option<PathBuf>,
    /// 消息描述模板路径
    #[serde(alias = "message_template")]
    pub template: Option<PathBuf>,
    /// 表情图标
    pub icon_emoji: Option<String>,
    /// 卡片图片URL
    pub icon_url: Option<String>,
    /// 默认频道
    pub channel: Option<String>,
    /// 消息前缀
    pub message_prefix: Option<String>,
    /// 机器人名称
    pub bot_name: Option<String>,
    /// 包裹描述正文的字符串
    pub surround: Option<String>,
    /// 是否解析提及
    #[serde(default)]
    pub link_names: bool,
    /// 动作类型
    pub action_type: Option<String>,
    /// 动作名称
    pub action_name: Option<String>,
    /// 仪表盘URL
    pub dashboard: Option<String>,
    /// 代理地址
    pub proxy_address: Option<String>,
    /// 代理端口
    pub proxy_port: Option<u16>,
    /// 代理用户名
    pub proxy_username: Option<String>,
    /// 代理密码
    pub proxy_password: Option<String>,
    /// 请求超时时间（秒）
    pub request_timeout_seconds: Option<u64>,
}

impl HandlerConfig {
    /// 动作类型，未配置时为 `OpenUri`
    pub fn action_type(&self) -> &str {
        self.action_type.as_deref().unwrap_or(DEFAULT_ACTION_TYPE)
    }

    /// 动作名称，未配置时为 `View in Sensu`
    pub fn action_name(&self) -> &str {
        self.action_name.as_deref().unwrap_or(DEFAULT_ACTION_NAME)
    }

    /// 卡片图片，未配置时使用默认图片
    pub fn icon_url(&self) -> &str {
        self.icon_url.as_deref().unwrap_or(DEFAULT_ICON_URL)
    }

    /// 组装代理URL
    ///
    /// 地址不带协议时默认使用 `http://`，端口可选。地址本身已带端口时
    /// 不再追加 `proxy_port`。
    pub fn proxy_url(&self) -> Option<String> {
        let address = self.proxy_address.as_deref()?.trim();
        if address.is_empty() {
            return None;
        }

        let base = if address.contains("://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", address.trim_end_matches('/'))
        };

        Some(match self.proxy_port {
            Some(port) if !has_port(&base) => format!("{base}:{port}"),
            _ => base,
        })
    }
}

/// 判断地址的主机部分是否已带端口
fn has_port(address: &str) -> bool {
    let authority = address
        .split_once("://")
        .map_or(address, |(_, rest)| rest);
    let authority = authority.split('/').next().unwrap_or(authority);
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    match host_port.rsplit_once(':') {
        Some((host, port)) => {
            !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && ((host.starts_with('[') && host.ends_with(']')) || !host.contains(':'))
        }
        None => false,
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置段
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &HandlerConfig) -> Result<(), String> {
    if let Some(ref url) = config.webhook_url {
        if !is_http_url(url) {
            return Err(format!("webhook_url 格式无效: {url}"));
        }
    }

    if let Some(ref dashboard) = config.dashboard {
        if !is_http_url(dashboard) {
            return Err(format!("dashboard 格式无效: {dashboard}"));
        }
    }

    if config.proxy_port == Some(0) {
        return Err("代理端口不能为0".to_string());
    }

    if let (Some(address), Some(_)) = (&config.proxy_address, config.proxy_port) {
        if has_port(address.trim()) {
            return Err(format!(
                "proxy_address 已包含端口，不能同时设置 proxy_port: {address}"
            ));
        }
    }

    if config.proxy_password.is_some() && config.proxy_username.is_none() {
        return Err("设置了 proxy_password 但缺少 proxy_username".to_string());
    }

    if config.request_timeout_seconds == Some(0) {
        return Err("请求超时时间不能为0".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> HandlerConfig {
        HandlerConfig {
            webhook_url: Some("https://outlook.office.com/webhook/abc".to_string()),
            dashboard: Some("https://dash/".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(validate_config(&create_test_config()).is_ok());
        assert!(validate_config(&HandlerConfig::default()).is_ok());
    }

    #[test]
    fn test_config_validation_invalid_webhook() {
        let mut config = create_test_config();
        config.webhook_url = Some("outlook.office.com/webhook".to_string());

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("webhook_url"));
    }

    #[test]
    fn test_config_validation_invalid_dashboard() {
        let mut config = create_test_config();
        config.dashboard = Some("dash".to_string());

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("dashboard"));
    }

    #[test]
    fn test_config_validation_proxy_port() {
        let mut config = create_test_config();
        config.proxy_address = Some("proxy.local".to_string());
        config.proxy_port = Some(0);

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("代理端口"));
    }

    #[test]
    fn test_config_validation_password_without_username() {
        let mut config = create_test_config();
        config.proxy_password = Some("secret".to_string());

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("proxy_username"));
    }

    #[test]
    fn test_default_values() {
        let config = HandlerConfig::default();

        assert_eq!(config.action_type(), "OpenUri");
        assert_eq!(config.action_name(), "View in Sensu");
        assert_eq!(config.icon_url(), DEFAULT_ICON_URL);
        assert!(!config.link_names);
        assert!(config.proxy_url().is_none());
    }

    #[test]
    fn test_proxy_url() {
        let mut config = HandlerConfig {
            proxy_address: Some("proxy.local".to_string()),
            proxy_port: Some(3128),
            ..Default::default()
        };
        assert_eq!(config.proxy_url().as_deref(), Some("http://proxy.local:3128"));

        config.proxy_address = Some("https://proxy.local/".to_string());
        config.proxy_port = None;
        assert_eq!(config.proxy_url().as_deref(), Some("https://proxy.local"));

        config.proxy_address = Some("  ".to_string());
        assert!(config.proxy_url().is_none());
    }

    #[test]
    fn test_proxy_url_keeps_port_from_address() {
        let mut config = HandlerConfig {
            proxy_address: Some("proxy.local:8080".to_string()),
            ..Default::default()
        };
        assert_eq!(config.proxy_url().as_deref(), Some("http://proxy.local:8080"));

        config.proxy_port = Some(3128);
        assert_eq!(config.proxy_url().as_deref(), Some("http://proxy.local:8080"));

        config.proxy_address = Some("http://user@[::1]:8080/".to_string());
        assert_eq!(config.proxy_url().as_deref(), Some("http://user@[::1]:8080"));

        config.proxy_address = Some("[::1]".to_string());
        assert_eq!(config.proxy_url().as_deref(), Some("http://[::1]:3128"));
    }

    #[test]
    fn test_config_validation_port_in_address_and_proxy_port() {
        let mut config = create_test_config();
        config.proxy_address = Some("proxy.local:8080".to_string());
        assert!(validate_config(&config).is_ok());

        config.proxy_port = Some(3128);
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("proxy_port"));
    }

    #[test]
    fn test_message_template_alias() {
        let config: HandlerConfig = toml::from_str(
            r#"
webhook_url = "https://example.com/hook"
message_template = "/etc/sensu/teams.hbs"
"#,
        )
        .unwrap();

        assert_eq!(config.template, Some(PathBuf::from("/etc/sensu/teams.hbs")));
    }
}
