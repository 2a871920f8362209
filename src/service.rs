// 该文件是 Archdet （架构识别） 项目的一部分。
// src/service.rs - 推理服务
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

//! 上传图像的推理请求处理。HTTP 路由不在此处，
//! [`ServiceError::status_code`] 给出路由层应返回的状态码。

use std::{fmt::Display, path::Path, time::Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
  category::{self, CATEGORY_COUNT},
  model::{DetectInput, DetectItem, DetectResult, Model, WeightsLocator},
};

pub const MODEL_NAME: &str = "architecture-detector-yolov8n-v2";
pub const DEFAULT_CONFIDENCE: f32 = 0.05;
pub const MIN_CONFIDENCE: f32 = 0.01;
pub const MAX_CONFIDENCE: f32 = 1.0;

#[derive(Error, Debug)]
pub enum ServiceError {
  #[error("模型未加载")]
  ModelNotLoaded,
  #[error("无效图像: {0}")]
  InvalidImage(#[from] image::ImageError),
  #[error("置信度阈值超出范围 [0.01, 1.0]: {0}")]
  InvalidConfidence(f32),
  #[error("推理失败: {0}")]
  Inference(String),
}

impl ServiceError {
  pub fn status_code(&self) -> u16 {
    match self {
      ServiceError::ModelNotLoaded => 503,
      ServiceError::InvalidImage(_) => 400,
      ServiceError::InvalidConfidence(_) => 422,
      ServiceError::Inference(_) => 500,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
  pub x_center: f64,
  pub y_center: f64,
  pub width: f64,
  pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundingBoxPixels {
  pub x1: i64,
  pub y1: i64,
  pub x2: i64,
  pub y2: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
  pub class_id: u32,
  pub class_name: String,
  pub backend_type: String,
  pub confidence: f64,
  pub bbox_normalized: BoundingBox,
  pub bbox_pixels: BoundingBoxPixels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
  pub width: u32,
  pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
  pub model: String,
  pub inference_time_ms: f64,
  pub image_size: ImageSize,
  pub detections: Vec<Detection>,
  pub total_detections: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
  pub status: String,
  pub model_loaded: bool,
  pub model_path: String,
  pub total_classes: usize,
}

fn round_to(value: f64, digits: i32) -> f64 {
  let scale = 10f64.powi(digits);
  (value * scale).round() / scale
}

impl From<&DetectItem> for Detection {
  fn from(item: &DetectItem) -> Self {
    Detection {
      class_id: item.class_id,
      class_name: category::class_name(item.class_id),
      backend_type: category::backend_type(item.class_id).to_string(),
      confidence: round_to(item.score as f64, 4),
      bbox_normalized: BoundingBox {
        x_center: round_to(item.bbox.x_center, 6),
        y_center: round_to(item.bbox.y_center, 6),
        width: round_to(item.bbox.width, 6),
        height: round_to(item.bbox.height, 6),
      },
      bbox_pixels: BoundingBoxPixels {
        x1: item.pixels.x_min,
        y1: item.pixels.y_min,
        x2: item.pixels.x_max,
        y2: item.pixels.y_max,
      },
    }
  }
}

/// 持有加载好的模型句柄。模型缺失时服务照常启动，推理请求返回
/// [`ServiceError::ModelNotLoaded`]，而不是空的检测结果。
pub struct PredictionService<M> {
  model: Option<M>,
  model_path: String,
}

impl<M, E> PredictionService<M>
where
  M: Model<Input = DetectInput, Output = DetectResult, Error = E>,
  E: Display,
{
  pub fn new(model: Option<M>, model_path: impl AsRef<Path>) -> Self {
    Self {
      model,
      model_path: model_path.as_ref().display().to_string(),
    }
  }

  /// 定位权重并调用 `loader` 加载模型，失败时记录错误并以未加载状态启动。
  pub fn load<F, LE>(locator: &WeightsLocator, loader: F) -> Self
  where
    F: FnOnce(&Path) -> Result<M, LE>,
    LE: Display,
  {
    let model = match locator.resolve() {
      Ok(path) => {
        info!("加载模型文件: {}", path.display());
        match loader(path) {
          Ok(model) => {
            info!("模型加载完成");
            Some(model)
          }
          Err(err) => {
            error!("模型加载失败: {}", err);
            None
          }
        }
      }
      Err(err) => {
        error!("{}", err);
        None
      }
    };

    Self::new(model, locator.preferred())
  }

  pub fn is_loaded(&self) -> bool {
    self.model.is_some()
  }

  pub fn health(&self) -> HealthResponse {
    let loaded = self.is_loaded();
    HealthResponse {
      status: if loaded { "healthy" } else { "model_not_loaded" }.to_string(),
      model_loaded: loaded,
      model_path: self.model_path.clone(),
      total_classes: CATEGORY_COUNT,
    }
  }

  /// 对上传的图像执行推理，检测结果按置信度从高到低排序。
  pub fn predict(
    &self,
    image_bytes: &[u8],
    confidence: f32,
  ) -> Result<PredictionResponse, ServiceError> {
    if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence) {
      return Err(ServiceError::InvalidConfidence(confidence));
    }
    let model = self.model.as_ref().ok_or(ServiceError::ModelNotLoaded)?;

    let image = image::load_from_memory(image_bytes)?.to_rgb8();
    let image_size = ImageSize {
      width: image.width(),
      height: image.height(),
    };

    let now = Instant::now();
    let result = model
      .infer(&DetectInput { image, confidence })
      .map_err(|err| {
        warn!("推理失败: {}", err);
        ServiceError::Inference(err.to_string())
      })?;
    let elapsed = now.elapsed();
    info!("推理完成，耗时: {:.2?}, 检测到 {} 个对象", elapsed, result.len());

    let mut detections: Vec<Detection> = result.items.iter().map(Detection::from).collect();
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    Ok(PredictionResponse {
      model: MODEL_NAME.to_string(),
      inference_time_ms: round_to(elapsed.as_secs_f64() * 1000.0, 2),
      image_size,
      total_detections: detections.len(),
      detections,
    })
  }
}
