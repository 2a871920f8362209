// 该文件是 Archdet （架构识别） 项目的一部分。
// src/vision.rs - 视觉语言服务的原始回复
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::category::Category;

const DEFAULT_PROVIDER: &str = "generic";
const DEFAULT_BBOX_PERCENT: [f64; 4] = [50.0, 50.0, 10.0, 10.0];

/// 视觉服务给出的一个组件，边界框为图像尺寸的百分比
/// [x_center, y_center, width, height]。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawComponent {
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub label: String,
  #[serde(default = "default_bbox_percent", deserialize_with = "lenient_bbox")]
  pub bbox_percent: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawConnection {
  #[serde(default)]
  pub from_label: Option<String>,
  #[serde(default)]
  pub to_label: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct VisionReply {
  #[serde(default)]
  pub provider: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub components: Vec<RawComponent>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub connections: Vec<RawConnection>,
}

fn default_bbox_percent() -> [f64; 4] {
  DEFAULT_BBOX_PERCENT
}

// `null` 与缺失字段一样取默认值
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// 不是 4 个有限数值的边界框取默认值，不影响同一回复中的其他组件
fn lenient_bbox<'de, D>(deserializer: D) -> Result<[f64; 4], D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  let numbers: Option<Vec<f64>> = value
    .as_array()
    .and_then(|items| items.iter().map(Value::as_f64).collect());

  match numbers.as_deref() {
    Some(&[x, y, w, h]) if [x, y, w, h].iter().all(|v| v.is_finite()) => Ok([x, y, w, h]),
    _ => {
      debug!("无效的 bbox_percent {}, 使用默认值", value);
      Ok(DEFAULT_BBOX_PERCENT)
    }
  }
}

/// 发送给视觉服务的标注提示词
pub fn annotation_prompt() -> String {
  let categories = Category::ALL
    .iter()
    .map(|c| c.name())
    .collect::<Vec<_>>()
    .join(", ");

  format!(
    r#"Analyze this software architecture diagram and identify all components.

For each component you find, provide:
1. category: One of these exact values: {categories}
2. label: The text label shown in the diagram (e.g., "Amazon RDS", "API Gateway")
3. bbox_percent: Approximate bounding box as [x_center, y_center, width, height] where all values are percentages (0-100) of the image dimensions

Also identify connections between components:
- from_label: Source component label
- to_label: Target component label
- protocol: If visible (HTTP, HTTPS, TCP, etc.)

Return ONLY a valid JSON object with this structure:
{{
  "provider": "aws|azure|gcp|generic",
  "components": [
    {{
      "category": "database_sql",
      "label": "Amazon RDS",
      "bbox_percent": [50, 60, 10, 8]
    }}
  ],
  "connections": [
    {{
      "from_label": "API Gateway",
      "to_label": "Lambda",
      "protocol": "HTTPS"
    }}
  ]
}}

Be precise with bounding boxes - they should tightly fit each component icon/box."#
  )
}

/// 取出回复中的 JSON 文本，回复可能包在 markdown 代码块中。
pub fn extract_json_block(text: &str) -> &str {
  let fenced = if let Some((_, rest)) = text.split_once("```json") {
    Some(rest)
  } else {
    text.split_once("```").map(|(_, rest)| rest)
  };

  match fenced {
    Some(rest) => rest.split("```").next().unwrap_or(rest).trim(),
    None => text.trim(),
  }
}

/// 解析视觉服务的回复；无法解析时记录警告并返回空结果。
pub fn parse_reply(text: &str) -> VisionReply {
  match serde_json::from_str(extract_json_block(text)) {
    Ok(reply) => reply,
    Err(err) => {
      warn!("无法解析视觉服务回复的 JSON: {}", err);
      VisionReply {
        provider: Some(DEFAULT_PROVIDER.to_string()),
        ..Default::default()
      }
    }
  }
}
