// 该文件是 Archdet （架构识别） 项目的一部分。
// src/bbox.rs - 边界框表示
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

use serde::{Deserialize, Serialize};

/// 归一化的中心点/尺寸边界框，各分量为图像宽高的比例。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct NormalizedBox {
  pub x_center: f64,
  pub y_center: f64,
  pub width: f64,
  pub height: f64,
}

/// 像素坐标的角点边界框 [x_min, y_min, x_max, y_max]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 4]", into = "[i64; 4]")]
pub struct PixelBox {
  pub x_min: i64,
  pub y_min: i64,
  pub x_max: i64,
  pub y_max: i64,
}

impl NormalizedBox {
  pub fn new(x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
    Self {
      x_center,
      y_center,
      width,
      height,
    }
  }

  /// 百分比 (0-100) 转换为比例
  pub fn from_percent(percent: [f64; 4]) -> Self {
    Self::new(
      percent[0] / 100.0,
      percent[1] / 100.0,
      percent[2] / 100.0,
      percent[3] / 100.0,
    )
  }

  /// 归一化坐标下的 [left, top, right, bottom]
  pub fn edges(&self) -> [f64; 4] {
    let half_w = self.width / 2.0;
    let half_h = self.height / 2.0;
    [
      self.x_center - half_w,
      self.y_center - half_h,
      self.x_center + half_w,
      self.y_center + half_h,
    ]
  }

  /// 角点向零取整，不做裁剪。
  pub fn to_pixels(&self, width: u32, height: u32) -> PixelBox {
    let [left, top, right, bottom] = self.edges();
    PixelBox {
      x_min: (left * width as f64) as i64,
      y_min: (top * height as f64) as i64,
      x_max: (right * width as f64) as i64,
      y_max: (bottom * height as f64) as i64,
    }
  }

  /// 绘制用的像素框：先换算到像素尺寸再截断，并裁剪到 [0, W] x [0, H]。
  pub fn to_pixels_clamped(&self, width: u32, height: u32) -> PixelBox {
    let (w, h) = (width as f64, height as f64);
    let x_center = self.x_center * w;
    let y_center = self.y_center * h;
    let box_w = self.width * w;
    let box_h = self.height * h;

    PixelBox {
      x_min: ((x_center - box_w / 2.0) as i64).max(0),
      y_min: ((y_center - box_h / 2.0) as i64).max(0),
      x_max: ((x_center + box_w / 2.0) as i64).min(width as i64),
      y_max: ((y_center + box_h / 2.0) as i64).min(height as i64),
    }
  }

  pub fn to_array(self) -> [f64; 4] {
    [self.x_center, self.y_center, self.width, self.height]
  }
}

impl PixelBox {
  /// 由百分比中心点/尺寸直接计算角点，结果向零取整且不裁剪；
  /// 超出范围的百分比会得到图像之外的坐标。
  pub fn from_percent(percent: [f64; 4], width: u32, height: u32) -> Self {
    let [x_center, y_center, box_w, box_h] = percent;
    let (w, h) = (width as f64, height as f64);
    PixelBox {
      x_min: ((x_center - box_w / 2.0) / 100.0 * w) as i64,
      y_min: ((y_center - box_h / 2.0) / 100.0 * h) as i64,
      x_max: ((x_center + box_w / 2.0) / 100.0 * w) as i64,
      y_max: ((y_center + box_h / 2.0) / 100.0 * h) as i64,
    }
  }

  pub fn width(&self) -> i64 {
    self.x_max - self.x_min
  }

  pub fn height(&self) -> i64 {
    self.y_max - self.y_min
  }

  pub fn is_empty(&self) -> bool {
    self.width() <= 0 || self.height() <= 0
  }

  pub fn to_array(self) -> [i64; 4] {
    [self.x_min, self.y_min, self.x_max, self.y_max]
  }
}

impl From<[f64; 4]> for NormalizedBox {
  fn from(value: [f64; 4]) -> Self {
    Self::new(value[0], value[1], value[2], value[3])
  }
}

impl From<NormalizedBox> for [f64; 4] {
  fn from(value: NormalizedBox) -> Self {
    value.to_array()
  }
}

impl From<[i64; 4]> for PixelBox {
  fn from(value: [i64; 4]) -> Self {
    PixelBox {
      x_min: value[0],
      y_min: value[1],
      x_max: value[2],
      y_max: value[3],
    }
  }
}

impl From<PixelBox> for [i64; 4] {
  fn from(value: PixelBox) -> Self {
    value.to_array()
  }
}
