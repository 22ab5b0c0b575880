//! 配置加载器实现
//!
//! 提供TOML/JSON配置文件解析、环境变量替换和按段选择功能

use crate::config::types::{validate_config, HandlerConfig, Settings};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// TOML格式
    Toml,
    /// JSON格式
    Json,
}

impl SettingsFormat {
    /// 根据文件扩展名推断格式，默认TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SettingsFormat::Json,
            _ => SettingsFormat::Toml,
        }
    }
}

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait SettingsLoader: Send + Sync {
    /// 从文件加载全部配置段
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<Settings>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Settings>;

    /// 从字符串加载全部配置段
    ///
    /// # 参数
    /// * `content` - 配置文件内容
    /// * `format` - 内容格式
    ///
    /// # 返回
    /// * `Result<Settings>` - 加载的配置或错误
    async fn load_from_string(&self, content: &str, format: SettingsFormat) -> Result<Settings>;

    /// 验证单个配置段
    fn validate(&self, config: &HandlerConfig) -> Result<()>;

    /// 从文件加载并取出指定配置段
    ///
    /// 环境变量只在选中的配置段中替换，其他段缺少变量不影响加载。
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    /// * `section` - 配置段名称
    ///
    /// # 返回
    /// * `Result<HandlerConfig>` - 经过验证的配置段
    async fn load_section<P: AsRef<Path> + Send>(
        &self,
        path: P,
        section: &str,
    ) -> Result<HandlerConfig>;
}

/// 未做环境变量替换的配置段
type RawSettings = HashMap<String, Value>;

/// 文件配置加载器实现
#[derive(Debug, Clone)]
pub struct FileSettingsLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl FileSettingsLoader {
    /// 创建新的配置加载器
    ///
    /// # 参数
    /// * `enable_env_substitution` - 是否启用环境变量替换
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 读取配置文件内容
    async fn read_file(path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {}", e)))?;
        Ok(content)
    }

    /// 解析为原始配置段，不做环境变量替换
    fn parse_raw(&self, content: &str, format: SettingsFormat) -> Result<RawSettings> {
        let raw = match format {
            SettingsFormat::Toml => toml::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?,
            SettingsFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("JSON解析失败: {}", e)))?,
        };
        Ok(raw)
    }

    /// 对单个配置段做环境变量替换并转换为 [`HandlerConfig`]
    fn resolve_section(&self, name: &str, mut raw: Value) -> Result<HandlerConfig> {
        if self.enable_env_substitution {
            let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
                .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {}", e)))?;
            substitute_in_value(&env_var_regex, &mut raw)?;
        }

        let config = serde_json::from_value(raw)
            .map_err(|e| ConfigError::ParseError(format!("配置段 {} 无效: {}", name, e)))?;
        Ok(config)
    }

    /// 解析全部配置段
    fn parse(&self, content: &str, format: SettingsFormat) -> Result<Settings> {
        self.parse_raw(content, format)?
            .into_iter()
            .map(|(name, raw)| {
                let config = self.resolve_section(&name, raw)?;
                Ok((name, config))
            })
            .collect()
    }

    /// 只解析指定配置段
    fn parse_section(
        &self,
        content: &str,
        format: SettingsFormat,
        section: &str,
    ) -> Result<HandlerConfig> {
        let raw = self
            .parse_raw(content, format)?
            .remove(section)
            .ok_or_else(|| ConfigError::SectionNotFound {
                section: section.to_string(),
            })?;

        self.resolve_section(section, raw)
    }
}

/// 替换字符串中的 `${VAR}` 环境变量
fn substitute_env_vars(env_var_regex: &Regex, content: &str) -> Result<String> {
    let mut result = content.to_string();

    for captures in env_var_regex.captures_iter(content) {
        let full_match = &captures[0];
        let var_name = &captures[1];

        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(full_match, &value);
            }
            Err(_) => {
                return Err(ConfigError::EnvVarError {
                    var: var_name.to_string(),
                }
                .into());
            }
        }
    }

    Ok(result)
}

/// 递归替换配置值中所有字符串的环境变量
fn substitute_in_value(env_var_regex: &Regex, value: &mut Value) -> Result<()> {
    match value {
        Value::String(s) => *s = substitute_env_vars(env_var_regex, s)?,
        Value::Array(items) => {
            for item in items {
                substitute_in_value(env_var_regex, item)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                substitute_in_value(env_var_regex, item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

impl Default for FileSettingsLoader {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl SettingsLoader for FileSettingsLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Settings> {
        let path = path.as_ref();
        let content = Self::read_file(path).await?;
        let settings = self.parse(&content, SettingsFormat::from_path(path))?;

        log::info!("成功加载配置文件: {}", path.display());
        log::debug!("配置段: {:?}", settings.keys().collect::<Vec<_>>());

        Ok(settings)
    }

    async fn load_from_string(&self, content: &str, format: SettingsFormat) -> Result<Settings> {
        let settings = self.parse(content, format)?;
        log::debug!("成功解析配置字符串");
        Ok(settings)
    }

    fn validate(&self, config: &HandlerConfig) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }

    async fn load_section<P: AsRef<Path> + Send>(
        &self,
        path: P,
        section: &str,
    ) -> Result<HandlerConfig> {
        let path = path.as_ref();
        let content = Self::read_file(path).await?;
        let config = self.parse_section(&content, SettingsFormat::from_path(path), section)?;
        self.validate(&config)?;

        log::info!("成功加载配置段 {}: {}", section, path.display());
        Ok(config)
    }
}

/// 获取默认配置文件路径
///
/// 当前目录存在 `config.toml` 时优先使用，否则使用用户配置目录。
pub fn get_default_config_path() -> PathBuf {
    if Path::new("config.toml").exists() {
        return PathBuf::from("config.toml");
    }

    dirs::config_dir()
        .map(|config_dir| config_dir.join(crate::APP_NAME).join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    const TEST_SETTINGS_TOML: &str = r##"
[teams]
webhook_url = "https://outlook.office.com/webhook/abc"
bot_name = "sensu"
link_names = true
proxy_address = "proxy.local"
proxy_port = 3128

[teams_ops]
webhook_url = "https://outlook.office.com/webhook/ops"
channel = "#ops"
"##;

    #[tokio::test]
    async fn test_toml_parsing() {
        let loader = FileSettingsLoader::new(false);
        let settings = loader
            .load_from_string(TEST_SETTINGS_TOML, SettingsFormat::Toml)
            .await
            .unwrap();

        assert_eq!(settings.len(), 2);
        let teams = &settings["teams"];
        assert_eq!(teams.bot_name.as_deref(), Some("sensu"));
        assert!(teams.link_names);
        assert_eq!(teams.proxy_port, Some(3128));
        assert_eq!(settings["teams_ops"].channel.as_deref(), Some("#ops"));
    }

    #[tokio::test]
    async fn test_json_parsing() {
        let loader = FileSettingsLoader::new(false);
        let settings = loader
            .load_from_string(
                r#"{"teams": {"webhook_url": "https://example.com/hook", "action_name": "Open"}}"#,
                SettingsFormat::Json,
            )
            .await
            .unwrap();

        assert_eq!(settings["teams"].action_name(), "Open");
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution() {
        env::set_var("TEAMS_WEBHOOK_URL", "https://test.webhook.url/hook");

        let loader = FileSettingsLoader::new(true);
        let settings = loader
            .load_from_string(
                "[teams]\nwebhook_url = \"${TEAMS_WEBHOOK_URL}\"\n",
                SettingsFormat::Toml,
            )
            .await
            .unwrap();

        assert_eq!(
            settings["teams"].webhook_url.as_deref(),
            Some("https://test.webhook.url/hook")
        );

        env::remove_var("TEAMS_WEBHOOK_URL");
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution_missing_var() {
        env::remove_var("MISSING_TEAMS_VAR");

        let loader = FileSettingsLoader::new(true);
        let result = loader
            .load_from_string(
                "[teams]\nwebhook_url = \"${MISSING_TEAMS_VAR}\"\n",
                SettingsFormat::Toml,
            )
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("MISSING_TEAMS_VAR"));
    }

    #[tokio::test]
    #[serial]
    async fn test_substitution_disabled_keeps_placeholders() {
        env::remove_var("UNSET_TEAMS_VAR");

        let loader = FileSettingsLoader::new(false);
        let settings = loader
            .load_from_string(
                "[teams]\nbot_name = \"${UNSET_TEAMS_VAR}\"\n",
                SettingsFormat::Toml,
            )
            .await
            .unwrap();

        assert_eq!(settings["teams"].bot_name.as_deref(), Some("${UNSET_TEAMS_VAR}"));
    }

    #[tokio::test]
    #[serial]
    async fn test_unselected_section_may_reference_unset_var() {
        env::set_var("TEAMS_WEBHOOK_URL", "https://test.webhook.url/hook");
        env::remove_var("PROXY_PASSWORD");

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            br#"
[teams]
webhook_url = "${TEAMS_WEBHOOK_URL}"

[teams_behind_proxy]
webhook_url = "${TEAMS_WEBHOOK_URL}"
proxy_address = "proxy.internal"
proxy_username = "sensu"
proxy_password = "${PROXY_PASSWORD}"
"#,
        )
        .unwrap();

        let loader = FileSettingsLoader::default();
        let config = loader.load_section(file.path(), "teams").await.unwrap();
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://test.webhook.url/hook")
        );

        // 选中引用了缺失变量的段时仍然报错
        let result = loader.load_section(file.path(), "teams_behind_proxy").await;
        assert!(matches!(
            result,
            Err(HandlerError::Config(ConfigError::EnvVarError { ref var })) if var == "PROXY_PASSWORD"
        ));

        env::remove_var("TEAMS_WEBHOOK_URL");
    }

    #[tokio::test]
    #[serial]
    async fn test_example_config_loads_without_proxy_password() {
        env::set_var("TEAMS_WEBHOOK_URL", "https://test.webhook.url/hook");
        env::remove_var("PROXY_PASSWORD");

        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.toml");
        let config = FileSettingsLoader::default()
            .load_section(&path, "teams")
            .await
            .unwrap();
        assert_eq!(config.bot_name.as_deref(), Some("sensu"));

        env::remove_var("TEAMS_WEBHOOK_URL");
    }

    #[tokio::test]
    async fn test_load_section_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(TEST_SETTINGS_TOML.as_bytes()).unwrap();

        let loader = FileSettingsLoader::new(false);
        let config = loader.load_section(file.path(), "teams_ops").await.unwrap();
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://outlook.office.com/webhook/ops")
        );
    }

    #[tokio::test]
    async fn test_load_section_missing() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(TEST_SETTINGS_TOML.as_bytes()).unwrap();

        let loader = FileSettingsLoader::new(false);
        let result = loader.load_section(file.path(), "slack").await;
        assert!(matches!(
            result,
            Err(HandlerError::Config(ConfigError::SectionNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_load_section_validates() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"teams": {"webhook_url": "not-a-url"}}"#)
            .unwrap();

        let loader = FileSettingsLoader::new(false);
        let result = loader.load_section(file.path(), "teams").await;
        assert!(matches!(
            result,
            Err(HandlerError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let loader = FileSettingsLoader::new(false);
        let result = loader.load_from_file("/nonexistent/teams.toml").await;
        assert!(matches!(
            result,
            Err(HandlerError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SettingsFormat::from_path(Path::new("/etc/sensu/conf.d/teams.json")),
            SettingsFormat::Json
        );
        assert_eq!(
            SettingsFormat::from_path(Path::new("config.toml")),
            SettingsFormat::Toml
        );
    }

    #[test]
    fn test_get_default_config_path() {
        let path = get_default_config_path();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
