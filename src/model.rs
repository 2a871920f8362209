// 该文件是 Archdet （架构识别） 项目的一部分。
// src/model.rs - 检测模型
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

use image::RgbImage;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  bbox::{NormalizedBox, PixelBox},
  yolo::YoloRecord,
};

/// 检测器。推理本身由外部检测库完成，这里只约定输入输出的形状；
/// 服务会在多个请求间共享同一个只读实例。
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Clone)]
pub struct DetectInput {
  pub image: RgbImage,
  /// 最低置信度阈值
  pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem {
  pub class_id: u32,
  pub score: f32,
  pub bbox: NormalizedBox,
  pub pixels: PixelBox,
}

impl DetectItem {
  /// 由归一化框推导像素框
  pub fn new(
    class_id: u32,
    score: f32,
    bbox: NormalizedBox,
    width: u32,
    height: u32,
  ) -> Self {
    Self {
      class_id,
      score,
      bbox,
      pixels: bbox.to_pixels(width, height),
    }
  }

  pub fn to_yolo(&self) -> YoloRecord {
    YoloRecord::new(self.class_id.to_string(), self.bbox)
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

impl From<Vec<DetectItem>> for DetectResult {
  fn from(items: Vec<DetectItem>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

#[derive(Error, Debug)]
pub enum WeightsError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("模型不存在: {primary} 以及 {fallback:?}")]
  NotFound {
    primary: PathBuf,
    fallback: Option<PathBuf>,
  },
}

/// 模型权重位置：优先使用主路径，不存在时尝试备用路径。
///
/// `yolo:///srv/model/best.pt?fallback=/data/runs/train/weights/best.pt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightsLocator {
  primary: PathBuf,
  fallback: Option<PathBuf>,
}

impl FromUrlWithScheme for WeightsLocator {
  const SCHEME: &'static str = "yolo";
}

impl FromUrl for WeightsLocator {
  type Error = WeightsError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(WeightsError::SchemeMismatch(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let fallback = url
      .query_pairs()
      .find(|(k, _)| k == "fallback")
      .map(|(_, v)| PathBuf::from(v.as_ref()));

    Ok(WeightsLocator {
      primary: PathBuf::from(url.path()),
      fallback,
    })
  }
}

impl WeightsLocator {
  pub fn new(primary: impl Into<PathBuf>) -> Self {
    Self {
      primary: primary.into(),
      fallback: None,
    }
  }

  pub fn with_fallback(mut self, fallback: impl Into<PathBuf>) -> Self {
    self.fallback = Some(fallback.into());
    self
  }

  pub fn primary(&self) -> &Path {
    &self.primary
  }

  /// 健康检查上报的路径：主路径存在时为主路径，否则为备用路径。
  pub fn preferred(&self) -> &Path {
    match &self.fallback {
      Some(fallback) if !self.primary.exists() => fallback,
      _ => &self.primary,
    }
  }

  pub fn resolve(&self) -> Result<&Path, WeightsError> {
    let path = self.preferred();
    if path.exists() {
      info!("使用模型权重: {}", path.display());
      Ok(path)
    } else {
      Err(WeightsError::NotFound {
        primary: self.primary.clone(),
        fallback: self.fallback.clone(),
      })
    }
  }
}
