//! Sensu Teams Handler 主程序入口
//!
//! 从标准输入读取事件，按配置段投递到Teams webhook

use anyhow::{Context, Result};
use clap::Parser;
use sensu_teams_handler::cli::Args;
use sensu_teams_handler::config::{FileSettingsLoader, SettingsLoader};
use sensu_teams_handler::event::Event;
use sensu_teams_handler::logging::{LogConfig, LoggingSystem};
use sensu_teams_handler::notification::payload::incident_key;
use sensu_teams_handler::notification::{handle, handle_with, DryRunSender};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_config = LogConfig {
        level: args.log_level.clone().into(),
        file_path: args.log_file.clone(),
        json_format: args.log_json,
    };

    let logging = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    debug!("Sensu Teams Handler v{} 启动", sensu_teams_handler::VERSION);

    if let Err(e) = run(&args, &logging).await {
        error!("事件处理失败: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 加载配置、解析事件并投递
async fn run(args: &Args, logging: &LoggingSystem) -> Result<()> {
    let config_path = args.get_config_path();
    let config = FileSettingsLoader::default()
        .load_section(&config_path, &args.json_config)
        .await
        .with_context(|| {
            format!(
                "加载配置段 {} 失败 ({})",
                args.json_config,
                config_path.display()
            )
        })?;

    let raw_event = read_event(args.event.as_deref()).await?;
    let event = Event::from_json(&raw_event).context("解析事件失败")?;
    let key = incident_key(&event, &config);
    info!("处理事件: {} ({})", key, event.severity());

    let (result, recipient) = if args.dry_run {
        (handle_with(&event, &config, &DryRunSender).await, "stdout")
    } else {
        (
            handle(&event, &config).await,
            config.webhook_url.as_deref().unwrap_or("-"),
        )
    };

    match &result {
        Ok(()) => logging.notification_log(&key, recipient, true, None),
        Err(e) => logging.notification_log(&key, recipient, false, Some(&e.to_string())),
    }

    Ok(result?)
}

/// 读取事件内容：指定文件或标准输入
async fn read_event(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("读取事件文件失败: {}", path.display())),
        None => {
            let mut content = String::new();
            tokio::io::stdin()
                .read_to_string(&mut content)
                .await
                .context("从标准输入读取事件失败")?;
            Ok(content)
        }
    }
}
