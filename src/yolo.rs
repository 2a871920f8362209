// 该文件是 Archdet （架构识别） 项目的一部分。
// src/yolo.rs - YOLO 文本标注格式
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

//! 每行一个目标：`<class_id> <x_center> <y_center> <width> <height>`，
//! 空格分隔，数值保留 6 位小数，无表头。

use std::{fmt, path::Path, str::FromStr};

use thiserror::Error;

use crate::bbox::NormalizedBox;

const YOLO_FIELD_COUNT: usize = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum YoloParseError {
  #[error("字段数量错误: 期望 5, 实际 {0}")]
  FieldCount(usize),
  #[error("无法解析数值: {0:?}")]
  InvalidNumber(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct YoloRecord {
  /// 原样保留，不校验是否在类别表中
  pub class_id: String,
  pub bbox: NormalizedBox,
}

impl YoloRecord {
  pub fn new(class_id: impl Into<String>, bbox: NormalizedBox) -> Self {
    Self {
      class_id: class_id.into(),
      bbox,
    }
  }

  /// 数值形式的类别编号，非整数时返回 `None`
  pub fn class_index(&self) -> Option<u32> {
    self.class_id.parse().ok()
  }
}

fn parse_number(token: &str) -> Result<f64, YoloParseError> {
  token
    .parse::<f64>()
    .ok()
    .filter(|v| v.is_finite())
    .ok_or_else(|| YoloParseError::InvalidNumber(token.to_string()))
}

impl FromStr for YoloRecord {
  type Err = YoloParseError;

  fn from_str(line: &str) -> Result<Self, Self::Err> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != YOLO_FIELD_COUNT {
      return Err(YoloParseError::FieldCount(parts.len()));
    }

    Ok(YoloRecord {
      class_id: parts[0].to_string(),
      bbox: NormalizedBox::new(
        parse_number(parts[1])?,
        parse_number(parts[2])?,
        parse_number(parts[3])?,
        parse_number(parts[4])?,
      ),
    })
  }
}

impl fmt::Display for YoloRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {:.6} {:.6} {:.6} {:.6}",
      self.class_id, self.bbox.x_center, self.bbox.y_center, self.bbox.width, self.bbox.height
    )
  }
}

/// 按输出精度（6 位小数）取整，使内存中的值与重新读取文件得到的值一致。
pub fn quantize(value: f64) -> f64 {
  format!("{:.6}", value).parse().unwrap_or(value)
}

/// 读取文件中的非空行
pub fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
  let content = std::fs::read_to_string(path)?;
  Ok(
    content
      .lines()
      .filter(|line| !line.trim().is_empty())
      .map(str::to_string)
      .collect(),
  )
}

/// 整体重写标注文件，每条记录一行并以换行结尾。
pub fn write_records(path: &Path, records: &[YoloRecord]) -> std::io::Result<()> {
  let mut content = String::new();
  for record in records {
    content.push_str(&record.to_string());
    content.push('\n');
  }
  std::fs::write(path, content)
}
