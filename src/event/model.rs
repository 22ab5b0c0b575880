//! 事件数据结构
//!
//! 监控系统通过标准输入传入的事件有两种形态：
//! - 旧版形态：顶层为 `client` + `check`，可带 `v2_event_mapped_into_v1` 标记，
//!   此时名称位于 `metadata.name`
//! - 实体形态：顶层为 `entity` + `check`，名称均位于 `metadata.name`
//!
//! 两种形态在这里统一转换为 [`Event`]，后续逻辑不再区分来源。

use crate::error::EventError;
use crate::event::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// 实体形态中用于覆盖频道的标签名
const CHANNEL_LABEL: &str = "teams_channel";

/// 统一后的事件
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// 产生事件的客户端
    pub client: Client,
    /// 检查结果
    pub check: Check,
}

/// 客户端信息
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    /// 客户端名称
    pub name: String,
    /// 客户端地址
    pub address: String,
    /// 订阅列表
    pub subscriptions: Vec<String>,
    /// 客户端级别的频道覆盖
    pub channel: Option<String>,
}

/// 检查信息
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    /// 检查名称
    pub name: String,
    /// 原始退出码，缺失或无法解析时为 `None`
    pub status: Option<i64>,
    /// 检查输出
    pub output: Option<String>,
    /// 自定义通知文本
    pub notification: Option<String>,
    /// 检查级别的频道覆盖
    pub channel: Option<String>,
    /// 执行时间
    pub executed: Option<DateTime<Utc>>,
}

impl Event {
    /// 从JSON字符串解析事件
    ///
    /// # 参数
    /// * `content` - 事件JSON
    ///
    /// # 返回
    /// * `Result<Event, EventError>` - 统一后的事件
    pub fn from_json(content: &str) -> Result<Self, EventError> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| EventError::ParseError(e.to_string()))?;
        Self::from_value(value)
    }

    /// 从已解析的JSON值构建事件
    pub fn from_value(value: Value) -> Result<Self, EventError> {
        if value.get("entity").is_some() {
            let raw: EntityEvent =
                serde_json::from_value(value).map_err(|e| EventError::ParseError(e.to_string()))?;
            raw.normalize()
        } else {
            let raw: LegacyEvent =
                serde_json::from_value(value).map_err(|e| EventError::ParseError(e.to_string()))?;
            raw.normalize()
        }
    }

    /// 检查状态对应的严重级别
    pub fn severity(&self) -> Severity {
        Severity::from_status(self.check.status)
    }
}

/// 对象元数据
#[derive(Debug, Default, Deserialize)]
struct ObjectMeta {
    name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    labels: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LegacyEvent {
    client: LegacyClient,
    check: LegacyCheck,
    #[serde(default)]
    v2_event_mapped_into_v1: bool,
}

#[derive(Debug, Deserialize)]
struct LegacyClient {
    name: Option<String>,
    address: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    subscriptions: Vec<String>,
    metadata: Option<ObjectMeta>,
    #[serde(alias = "teams_channel")]
    channel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyCheck {
    name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_status")]
    status: Option<i64>,
    output: Option<String>,
    notification: Option<String>,
    metadata: Option<ObjectMeta>,
    #[serde(alias = "teams_channel")]
    channel: Option<String>,
    executed: Option<i64>,
}

impl LegacyEvent {
    fn normalize(self) -> Result<Event, EventError> {
        let LegacyEvent {
            client,
            check,
            v2_event_mapped_into_v1: mapped,
        } = self;

        let client_meta_name = client.metadata.and_then(|m| m.name);
        let check_meta_name = check.metadata.and_then(|m| m.name);

        let (client_name, check_name) = if mapped {
            (
                pick_name(client_meta_name, client.name, "client.metadata.name")?,
                pick_name(check_meta_name, check.name, "check.metadata.name")?,
            )
        } else {
            (
                pick_name(client.name, client_meta_name, "client.name")?,
                pick_name(check.name, check_meta_name, "check.name")?,
            )
        };

        Ok(Event {
            client: Client {
                address: client.address.unwrap_or_else(|| client_name.clone()),
                name: client_name,
                subscriptions: client.subscriptions,
                channel: client.channel,
            },
            check: Check {
                name: check_name,
                status: check.status,
                output: check.output,
                notification: check.notification,
                channel: check.channel,
                executed: check.executed.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct EntityEvent {
    entity: Entity,
    check: EntityCheck,
}

#[derive(Debug, Deserialize)]
struct Entity {
    #[serde(default, deserialize_with = "null_as_default")]
    metadata: ObjectMeta,
    system: Option<EntitySystem>,
    #[serde(default, deserialize_with = "null_as_default")]
    subscriptions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EntitySystem {
    hostname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntityCheck {
    #[serde(default, deserialize_with = "null_as_default")]
    metadata: ObjectMeta,
    #[serde(default, deserialize_with = "deserialize_status")]
    status: Option<i64>,
    output: Option<String>,
    executed: Option<i64>,
}

impl EntityEvent {
    fn normalize(self) -> Result<Event, EventError> {
        let EntityEvent { entity, check } = self;

        let client_name = pick_name(entity.metadata.name, None, "entity.metadata.name")?;
        let check_name = pick_name(check.metadata.name, None, "check.metadata.name")?;
        let address = entity
            .system
            .and_then(|s| s.hostname)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| client_name.clone());

        let mut entity_labels = entity.metadata.labels;
        let mut check_labels = check.metadata.labels;

        Ok(Event {
            client: Client {
                name: client_name,
                address,
                subscriptions: entity.subscriptions,
                channel: entity_labels.remove(CHANNEL_LABEL),
            },
            check: Check {
                name: check_name,
                status: check.status,
                output: check.output,
                notification: None,
                channel: check_labels.remove(CHANNEL_LABEL),
                executed: check.executed.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            },
        })
    }
}

/// 取第一个非空名称
fn pick_name(
    primary: Option<String>,
    fallback: Option<String>,
    field: &'static str,
) -> Result<String, EventError> {
    primary
        .filter(|n| !n.is_empty())
        .or_else(|| fallback.filter(|n| !n.is_empty()))
        .ok_or(EventError::MissingField { field })
}

/// 显式的 `null` 与缺失字段同样处理
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 状态字段宽松解析：整数、数字字符串均可，其余视为缺失
fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_status))
}

fn parse_status(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
