// 该文件是 Archdet （架构识别） 项目的一部分。
// src/normalize.rs - YOLO 标注修复
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

//! 修复超出图像范围的 YOLO 标注。
//!
//! 每行独立处理：
//! 1. 字段不是 5 个或数值无法解析的行直接删除；
//! 2. 中心点超出 [-0.15, 1.15] 的行删除；
//! 3. 中心点裁剪到 [0, 1]；
//! 4. 依次检查左、右、上、下边界，越界则以中心点为锚收缩宽高。
//!    两条检查都基于原始宽高，同一轴两侧都越界时后一条覆盖前一条；
//! 5. 宽高限制在 [0.01, 1.0]。

use std::{
  ops::AddAssign,
  path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
  bbox::NormalizedBox,
  yolo::{self, YoloParseError, YoloRecord},
};

pub const CENTER_MIN: f64 = -0.15;
pub const CENTER_MAX: f64 = 1.15;
pub const MIN_BOX_SIZE: f64 = 0.01;
pub const MAX_BOX_SIZE: f64 = 1.0;

#[derive(Error, Debug)]
pub enum NormalizeError {
  #[error("读取标注文件失败 {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("写入标注文件失败 {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
  pub total: usize,
  pub fixed: usize,
  pub removed: usize,
  pub unchanged: usize,
}

impl NormalizeStats {
  pub fn has_issues(&self) -> bool {
    self.fixed > 0 || self.removed > 0
  }

  fn count(&mut self, outcome: &LineOutcome) {
    self.total += 1;
    match outcome {
      LineOutcome::Unchanged(_) => self.unchanged += 1,
      LineOutcome::Fixed(_) => self.fixed += 1,
      LineOutcome::Removed(_) => self.removed += 1,
    }
  }
}

impl AddAssign for NormalizeStats {
  fn add_assign(&mut self, rhs: Self) {
    self.total += rhs.total;
    self.fixed += rhs.fixed;
    self.removed += rhs.removed;
    self.unchanged += rhs.unchanged;
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoveReason {
  Malformed(YoloParseError),
  OffCanvas,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
  Unchanged(YoloRecord),
  Fixed(YoloRecord),
  Removed(RemoveReason),
}

impl LineOutcome {
  pub fn record(&self) -> Option<&YoloRecord> {
    match self {
      LineOutcome::Unchanged(record) | LineOutcome::Fixed(record) => Some(record),
      LineOutcome::Removed(_) => None,
    }
  }

  pub fn into_record(self) -> Option<YoloRecord> {
    match self {
      LineOutcome::Unchanged(record) | LineOutcome::Fixed(record) => Some(record),
      LineOutcome::Removed(_) => None,
    }
  }
}

fn center_in_range(value: f64) -> bool {
  (CENTER_MIN..=CENTER_MAX).contains(&value)
}

/// 修复单个边界框；中心点离画布太远时返回 `None`。
pub fn normalize_box(bbox: NormalizedBox) -> Option<NormalizedBox> {
  if !center_in_range(bbox.x_center) || !center_in_range(bbox.y_center) {
    return None;
  }

  let x_center = bbox.x_center.clamp(0.0, 1.0);
  let y_center = bbox.y_center.clamp(0.0, 1.0);
  let mut width = bbox.width;
  let mut height = bbox.height;

  let half_w = bbox.width / 2.0;
  let half_h = bbox.height / 2.0;

  if x_center - half_w < 0.0 {
    width = x_center * 2.0;
  }
  if x_center + half_w > 1.0 {
    width = (1.0 - x_center) * 2.0;
  }
  if y_center - half_h < 0.0 {
    height = y_center * 2.0;
  }
  if y_center + half_h > 1.0 {
    height = (1.0 - y_center) * 2.0;
  }

  Some(NormalizedBox {
    x_center,
    y_center,
    width: width.clamp(MIN_BOX_SIZE, MAX_BOX_SIZE),
    height: height.clamp(MIN_BOX_SIZE, MAX_BOX_SIZE),
  })
}

fn quantize_box(bbox: NormalizedBox) -> NormalizedBox {
  NormalizedBox {
    x_center: yolo::quantize(bbox.x_center),
    y_center: yolo::quantize(bbox.y_center),
    width: yolo::quantize(bbox.width),
    height: yolo::quantize(bbox.height),
  }
}

/// 输入先按输出精度量化再修复，保证输出再次修复时保持不变。
pub fn normalize_record(record: YoloRecord) -> LineOutcome {
  let input = quantize_box(record.bbox);
  let Some(normalized) = normalize_box(input) else {
    return LineOutcome::Removed(RemoveReason::OffCanvas);
  };

  let changed = normalized.to_array() != input.to_array();
  let output = YoloRecord {
    class_id: record.class_id,
    bbox: quantize_box(normalized),
  };

  if changed {
    LineOutcome::Fixed(output)
  } else {
    LineOutcome::Unchanged(output)
  }
}

pub fn normalize_line(line: &str) -> LineOutcome {
  match line.parse::<YoloRecord>() {
    Ok(record) => normalize_record(record),
    Err(err) => LineOutcome::Removed(RemoveReason::Malformed(err)),
  }
}

/// 处理一个图像的全部标注行，空行被忽略且不计数。
pub fn normalize_lines<I, S>(lines: I) -> (Vec<YoloRecord>, NormalizeStats)
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut stats = NormalizeStats::default();
  let mut records = Vec::new();

  for line in lines {
    let line = line.as_ref();
    if line.trim().is_empty() {
      continue;
    }

    let outcome = normalize_line(line);
    stats.count(&outcome);
    if let LineOutcome::Removed(reason) = &outcome {
      debug!("删除标注 {:?}: {:?}", line.trim(), reason);
    }
    if let Some(record) = outcome.into_record() {
      records.push(record);
    }
  }

  (records, stats)
}

/// 修复一个标注文件并整体重写。
pub fn normalize_file(path: &Path) -> Result<NormalizeStats, NormalizeError> {
  let lines = yolo::read_lines(path).map_err(|source| NormalizeError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let (records, stats) = normalize_lines(&lines);

  yolo::write_records(path, &records).map_err(|source| NormalizeError::Write {
    path: path.to_path_buf(),
    source,
  })?;

  Ok(stats)
}

#[derive(Debug, Clone)]
pub struct FileReport {
  pub path: PathBuf,
  pub stats: NormalizeStats,
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryReport {
  pub files: Vec<FileReport>,
  pub total: NormalizeStats,
}

impl DirectoryReport {
  pub fn files_with_issues(&self) -> usize {
    self.files.iter().filter(|f| f.stats.has_issues()).count()
  }
}

/// 按文件名顺序修复目录下所有 `*.txt` 标注文件。
pub fn normalize_directory(dir: &Path) -> Result<DirectoryReport, NormalizeError> {
  let read_err = |source| NormalizeError::Read {
    path: dir.to_path_buf(),
    source,
  };

  let mut paths = Vec::new();
  for entry in std::fs::read_dir(dir).map_err(read_err)? {
    let path = entry.map_err(read_err)?.path();
    if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
      paths.push(path);
    }
  }
  paths.sort();

  info!("处理 {} 个标注文件...", paths.len());

  let mut report = DirectoryReport::default();
  for path in paths {
    let stats = normalize_file(&path)?;
    if stats.has_issues() {
      info!(
        "  {}: 修复 {}, 删除 {} (共 {})",
        path.file_name().unwrap_or_default().to_string_lossy(),
        stats.fixed,
        stats.removed,
        stats.total
      );
    }
    report.total += stats;
    report.files.push(FileReport { path, stats });
  }

  Ok(report)
}
