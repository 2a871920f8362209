// 该文件是 Archdet （架构识别） 项目的一部分。
// src/convert.rs - 视觉服务结果转换为标注记录
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

use std::{collections::HashMap, path::Path};

use tracing::{debug, warn};

use crate::{
  annotation::{AnnotationMetadata, AnnotationRecord, Attributes, Connection, ImageAnnotation},
  bbox::{NormalizedBox, PixelBox},
  category::{Category, FALLBACK_CATEGORY},
  vision::{RawComponent, RawConnection, VisionReply},
};

/// 半自动标注统一使用的置信度
pub const AUTO_ANNOTATION_CONFIDENCE: f64 = 0.8;

/// 解析组件类别，缺失或未知时回退到 `external_service`。
pub fn resolve_category(category: Option<&str>) -> Category {
  match category {
    Some(name) => {
      let resolved = Category::resolve(name);
      if resolved == FALLBACK_CATEGORY && name != FALLBACK_CATEGORY.name() {
        debug!("未知类别 {:?}, 使用 {}", name, FALLBACK_CATEGORY);
      }
      resolved
    }
    None => FALLBACK_CATEGORY,
  }
}

/// 转换一个组件。像素坐标不做裁剪，越界框交给标注修复处理。
pub fn convert_component(
  id: u32,
  component: &RawComponent,
  width: u32,
  height: u32,
) -> AnnotationRecord {
  let category = resolve_category(component.category.as_deref());

  AnnotationRecord {
    id,
    category_id: category.id(),
    category_name: category.name().to_string(),
    bbox: NormalizedBox::from_percent(component.bbox_percent),
    bbox_pixels: PixelBox::from_percent(component.bbox_percent, width, height),
    confidence: AUTO_ANNOTATION_CONFIDENCE,
    attributes: Attributes {
      label: component.label.clone(),
      auto_annotated: true,
    },
  }
}

/// 组件编号从 1 开始
pub fn convert_components(
  components: &[RawComponent],
  width: u32,
  height: u32,
) -> Vec<AnnotationRecord> {
  components
    .iter()
    .zip(1..)
    .map(|(component, id)| convert_component(id, component, width, height))
    .collect()
}

/// 以标签解析连接的两端；任一端无法解析的连接被丢弃。
/// 多个组件同名时以最后一个为准。
pub fn resolve_connections(
  connections: &[RawConnection],
  records: &[AnnotationRecord],
) -> Vec<Connection> {
  let label_to_id: HashMap<&str, u32> = records
    .iter()
    .map(|r| (r.attributes.label.as_str(), r.id))
    .collect();

  let lookup = |label: &Option<String>| {
    label
      .as_deref()
      .and_then(|label| label_to_id.get(label).copied())
  };

  connections
    .iter()
    .filter_map(|conn| match (lookup(&conn.from_label), lookup(&conn.to_label)) {
      (Some(from_id), Some(to_id)) => Some(Connection {
        from_id,
        to_id,
        protocol: conn.protocol.clone(),
        bidirectional: false,
      }),
      _ => {
        debug!(
          "丢弃无法解析的连接: {:?} -> {:?}",
          conn.from_label, conn.to_label
        );
        None
      }
    })
    .collect()
}

/// 被标注图像的描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
  pub image_id: String,
  pub file_name: String,
  /// 图像所在目录名，通常是云厂商名
  pub provider_dir: String,
  pub width: u32,
  pub height: u32,
}

impl ImageInfo {
  pub fn from_path(path: &Path, width: u32, height: u32) -> Self {
    let name_of = |p: Option<&std::ffi::OsStr>| {
      p.map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
    };
    let image_id = name_of(path.file_stem());
    let file = name_of(path.file_name());
    let provider_dir = name_of(path.parent().and_then(Path::file_name));

    ImageInfo {
      image_id,
      file_name: format!("{}/{}", provider_dir, file),
      provider_dir,
      width,
      height,
    }
  }
}

/// 组装一张图像的完整标注。
pub fn build_image_annotation(
  image: &ImageInfo,
  reply: &VisionReply,
  model: &str,
) -> ImageAnnotation {
  let annotations = convert_components(&reply.components, image.width, image.height);
  let connections = resolve_connections(&reply.connections, &annotations);

  let dropped = reply.connections.len() - connections.len();
  if dropped > 0 {
    warn!("{}: 丢弃 {} 个无法解析的连接", image.image_id, dropped);
  }

  ImageAnnotation {
    image_id: image.image_id.clone(),
    file_name: image.file_name.clone(),
    width: image.width,
    height: image.height,
    provider: reply
      .provider
      .clone()
      .unwrap_or_else(|| image.provider_dir.clone()),
    annotations,
    connections,
    metadata: AnnotationMetadata {
      auto_annotated: true,
      model: model.to_string(),
      needs_review: true,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn component(category: &str, label: &str, bbox_percent: [f64; 4]) -> RawComponent {
    RawComponent {
      category: Some(category.to_string()),
      label: label.to_string(),
      bbox_percent,
    }
  }

  fn connection(from: &str, to: &str, protocol: &str) -> RawConnection {
    RawConnection {
      from_label: Some(from.to_string()),
      to_label: Some(to.to_string()),
      protocol: protocol.to_string(),
    }
  }

  #[test]
  fn converts_percent_bbox() {
    let record = convert_component(
      1,
      &component("database_sql", "Amazon RDS", [50.0, 50.0, 10.0, 8.0]),
      1000,
      800,
    );
    assert_eq!(record.category_id, 11);
    assert_eq!(record.category_name, "database_sql");
    assert_eq!(record.bbox.to_array(), [0.5, 0.5, 0.1, 0.08]);
    assert_eq!(record.bbox_pixels.to_array(), [450, 368, 550, 432]);
    assert_eq!(record.confidence, AUTO_ANNOTATION_CONFIDENCE);
    assert_eq!(record.attributes.label, "Amazon RDS");
    assert!(record.attributes.auto_annotated);
  }

  #[test]
  fn unknown_category_falls_back() {
    let record = convert_component(
      3,
      &component("unknown_service", "Stripe", [10.0, 10.0, 5.0, 5.0]),
      100,
      100,
    );
    assert_eq!(record.category_id, 27);
    assert_eq!(record.category_name, "external_service");

    assert_eq!(resolve_category(None), Category::ExternalService);
  }

  #[test]
  fn ids_start_at_one() {
    let records = convert_components(
      &[
        component("cache", "Redis", [20.0, 20.0, 10.0, 10.0]),
        component("queue", "SQS", [60.0, 20.0, 10.0, 10.0]),
      ],
      640,
      480,
    );
    let ids: Vec<u32> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2]);
  }

  #[test]
  fn dangling_connections_are_dropped() {
    let records = convert_components(
      &[
        component("api_gateway", "API Gateway", [20.0, 50.0, 10.0, 10.0]),
        component("lambda_function", "Lambda", [60.0, 50.0, 10.0, 10.0]),
      ],
      640,
      480,
    );
    let connections = resolve_connections(
      &[
        connection("API Gateway", "Lambda", "HTTPS"),
        connection("Lambda", "DynamoDB", "TCP"),
        RawConnection {
          from_label: None,
          to_label: Some("Lambda".to_string()),
          protocol: String::new(),
        },
      ],
      &records,
    );
    assert_eq!(
      connections,
      vec![Connection {
        from_id: 1,
        to_id: 2,
        protocol: "HTTPS".to_string(),
        bidirectional: false,
      }]
    );
  }

  #[test]
  fn duplicate_labels_resolve_to_last_record() {
    let records = convert_components(
      &[
        component("web_server", "Web", [20.0, 50.0, 10.0, 10.0]),
        component("web_server", "Web", [40.0, 50.0, 10.0, 10.0]),
        component("cache", "Cache", [60.0, 50.0, 10.0, 10.0]),
      ],
      640,
      480,
    );
    let connections = resolve_connections(&[connection("Web", "Cache", "")], &records);
    assert_eq!(connections[0].from_id, 2);
    assert_eq!(connections[0].to_id, 3);
  }

  #[test]
  fn image_info_from_path() {
    let info = ImageInfo::from_path(Path::new("images/aws/serverless.png"), 1024, 768);
    assert_eq!(info.image_id, "serverless");
    assert_eq!(info.file_name, "aws/serverless.png");
    assert_eq!(info.provider_dir, "aws");
  }

  #[test]
  fn provider_defaults_to_directory_name() {
    let info = ImageInfo::from_path(Path::new("images/azure/app.png"), 100, 100);
    let annotation = build_image_annotation(&info, &VisionReply::default(), "vision-model");
    assert_eq!(annotation.provider, "azure");
    assert_eq!(annotation.metadata.model, "vision-model");
    assert!(annotation.metadata.needs_review);
    assert!(annotation.annotations.is_empty());
  }
}
