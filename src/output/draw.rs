// 该文件是 Archdet （架构识别） 项目的一部分。
// src/output/draw.rs - 标注结果可视化
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

use std::{convert::Infallible, path::Path};

use image::{ImageReader, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  category,
  output::Render,
  yolo::{self, YoloRecord},
};

// 边框宽度（像素）
const BOX_THICKNESS: i64 = 3;

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
}

pub struct Draw {
  thickness: i64,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      thickness: BOX_THICKNESS,
    }
  }
}

impl Draw {
  pub fn with_thickness(mut self, thickness: u32) -> Self {
    self.thickness = thickness.max(1) as i64;
    self
  }

  // 在图像上绘制一个向内加粗的矩形边框，返回是否绘制
  fn draw_bbox(&self, image: &mut RgbImage, record: &YoloRecord) -> bool {
    let pixels = record.bbox.to_pixels_clamped(image.width(), image.height());
    let color = record
      .class_index()
      .map(category::color)
      .unwrap_or(category::UNKNOWN_COLOR);

    if pixels.is_empty() {
      return false;
    }

    for t in 0..self.thickness {
      let width = pixels.width() - 2 * t;
      let height = pixels.height() - 2 * t;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at((pixels.x_min + t) as i32, (pixels.y_min + t) as i32)
        .of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, rect, Rgb(color));
    }
    true
  }

  /// 读取图像与 YOLO 标注文件，绘制后保存到 `output`，返回绘制的框数。
  pub fn draw_file(
    &self,
    image: &Path,
    labels: &Path,
    output: &Path,
  ) -> Result<usize, DrawError> {
    let mut frame = ImageReader::open(image)?.decode()?.to_rgb8();
    let records: Vec<YoloRecord> = yolo::read_lines(labels)?
      .iter()
      .filter_map(|line| match line.parse::<YoloRecord>() {
        Ok(record) => Some(record),
        Err(err) => {
          debug!("跳过无效标注 {:?}: {}", line, err);
          None
        }
      })
      .collect();

    let Ok(count) = self.render_result(&mut frame, records.as_slice());

    if let Some(parent) = output.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    frame.save(output)?;
    info!("保存图像到文件: {} ({} 个框)", output.display(), count);

    Ok(count)
  }
}

impl Render<RgbImage, [YoloRecord]> for Draw {
  type Error = Infallible;

  fn render_result(
    &self,
    frame: &mut RgbImage,
    result: &[YoloRecord],
  ) -> Result<usize, Self::Error> {
    Ok(
      result
        .iter()
        .filter(|record| self.draw_bbox(frame, record))
        .count(),
    )
  }
}
