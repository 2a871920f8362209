// 该文件是 Archdet （架构识别） 项目的一部分。
// src/annotation.rs - 图像标注记录
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

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
  bbox::{NormalizedBox, PixelBox},
  yolo::{self, YoloRecord},
};

#[derive(Error, Debug)]
pub enum AnnotationIoError {
  #[error("I/O 错误 {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("JSON 错误 {path}: {source}")]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
  /// 图中组件的原始文本标签
  pub label: String,
  pub auto_annotated: bool,
}

/// 一个检测到的组件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
  pub id: u32,
  pub category_id: u32,
  pub category_name: String,
  pub bbox: NormalizedBox,
  pub bbox_pixels: PixelBox,
  pub confidence: f64,
  pub attributes: Attributes,
}

impl AnnotationRecord {
  pub fn to_yolo(&self) -> YoloRecord {
    YoloRecord::new(self.category_id.to_string(), self.bbox)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
  pub from_id: u32,
  pub to_id: u32,
  pub protocol: String,
  pub bidirectional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationMetadata {
  pub auto_annotated: bool,
  pub model: String,
  pub needs_review: bool,
}

/// 单张图像的完整标注，以图像文件名主干为标识
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotation {
  pub image_id: String,
  pub file_name: String,
  pub width: u32,
  pub height: u32,
  pub provider: String,
  pub annotations: Vec<AnnotationRecord>,
  pub connections: Vec<Connection>,
  pub metadata: AnnotationMetadata,
}

impl ImageAnnotation {
  pub fn to_yolo_records(&self) -> Vec<YoloRecord> {
    self.annotations.iter().map(AnnotationRecord::to_yolo).collect()
  }

  pub fn load_json(path: &Path) -> Result<Self, AnnotationIoError> {
    let content = std::fs::read_to_string(path).map_err(|source| AnnotationIoError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| AnnotationIoError::Json {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn save_json(&self, path: &Path) -> Result<(), AnnotationIoError> {
    let content = serde_json::to_string_pretty(self).map_err(|source| AnnotationIoError::Json {
      path: path.to_path_buf(),
      source,
    })?;
    std::fs::write(path, content).map_err(|source| AnnotationIoError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    info!("保存标注: {}", path.display());
    Ok(())
  }

  pub fn save_yolo(&self, path: &Path) -> Result<(), AnnotationIoError> {
    yolo::write_records(path, &self.to_yolo_records()).map_err(|source| AnnotationIoError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    info!("保存 YOLO 标注: {}", path.display());
    Ok(())
  }
}
