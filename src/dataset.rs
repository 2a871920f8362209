// 该文件是 Archdet （架构识别） 项目的一部分。
// src/dataset.rs - 数据集划分与训练目录结构
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

//! 数据集目录约定：
//!
//! ```text
//! <base>/images/<provider>/<stem>.png   原始图像
//! <base>/annotations/<stem>.txt         YOLO 标注
//! <base>/splits/{train,val,test}.txt    划分结果（相对 <base> 的图像路径）
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::category::{CATEGORY_COUNT, Category};

pub const IMAGES_DIR: &str = "images";
pub const ANNOTATIONS_DIR: &str = "annotations";
pub const SPLITS_DIR: &str = "splits";

pub const DEFAULT_SEED: u64 = 42;
pub const TRAIN_RATIO: f64 = 0.70;
pub const VAL_RATIO: f64 = 0.20;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
const SVG_TEMP_MARKER: &str = "_svg_temp";

#[derive(Error, Debug)]
pub enum DatasetError {
  #[error("I/O 错误 {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("遍历目录失败: {0}")]
  Walk(#[from] walkdir::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DatasetError + '_ {
  move |source| DatasetError::Io {
    path: path.to_path_buf(),
    source,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
  Train,
  Val,
  Test,
}

impl Split {
  pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

  pub fn name(self) -> &'static str {
    match self {
      Split::Train => "train",
      Split::Val => "val",
      Split::Test => "test",
    }
  }
}

fn is_image(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// 查找已有 YOLO 标注的图像，返回相对 `base` 的路径，已排序去重。
pub fn find_annotated_images(base: &Path) -> Result<Vec<String>, DatasetError> {
  let annotations = base.join(ANNOTATIONS_DIR);
  let mut images = Vec::new();

  for entry in WalkDir::new(base.join(IMAGES_DIR)) {
    let entry = entry?;
    let path = entry.path();
    if !entry.file_type().is_file() || !is_image(path) {
      continue;
    }
    if path.to_string_lossy().contains(SVG_TEMP_MARKER) {
      continue;
    }
    let Some(stem) = path.file_stem() else {
      continue;
    };

    let mut label = stem.to_os_string();
    label.push(".txt");
    if annotations.join(label).exists()
      && let Ok(relative) = path.strip_prefix(base)
    {
      images.push(relative.to_string_lossy().replace('\\', "/"));
    }
  }

  images.sort();
  images.dedup();
  Ok(images)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSplits {
  pub train: Vec<String>,
  pub val: Vec<String>,
  pub test: Vec<String>,
}

impl DatasetSplits {
  /// 以固定种子打乱后按 70% / 20% / 剩余 划分，各部分互不重叠。
  pub fn shuffle(mut images: Vec<String>, seed: u64) -> Self {
    fastrand::Rng::with_seed(seed).shuffle(&mut images);

    let total = images.len();
    let train_size = (total as f64 * TRAIN_RATIO) as usize;
    let val_size = (total as f64 * VAL_RATIO) as usize;

    let test = images.split_off(train_size + val_size);
    let val = images.split_off(train_size);

    DatasetSplits {
      train: images,
      val,
      test,
    }
  }

  pub fn get(&self, split: Split) -> &[String] {
    match split {
      Split::Train => &self.train,
      Split::Val => &self.val,
      Split::Test => &self.test,
    }
  }

  pub fn len(&self) -> usize {
    self.train.len() + self.val.len() + self.test.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// 写出 `<split>.txt`，每行一个图像路径。
  pub fn write(&self, dir: &Path) -> Result<(), DatasetError> {
    std::fs::create_dir_all(dir).map_err(io_error(dir))?;
    for split in Split::ALL {
      let path = dir.join(format!("{}.txt", split.name()));
      std::fs::write(&path, self.get(split).join("\n")).map_err(io_error(&path))?;
      info!("保存划分 {}: {} 张图像", path.display(), self.get(split).len());
    }
    Ok(())
  }

  pub fn read(dir: &Path) -> Result<Self, DatasetError> {
    let read = |split: Split| -> Result<Vec<String>, DatasetError> {
      let path = dir.join(format!("{}.txt", split.name()));
      if !path.exists() {
        return Ok(Vec::new());
      }
      let content = std::fs::read_to_string(&path).map_err(io_error(&path))?;
      Ok(
        content
          .lines()
          .map(str::trim)
          .filter(|line| !line.is_empty())
          .map(str::to_string)
          .collect(),
      )
    };

    Ok(DatasetSplits {
      train: read(Split::Train)?,
      val: read(Split::Val)?,
      test: read(Split::Test)?,
    })
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutStats {
  pub images_copied: usize,
  pub labels_copied: usize,
  pub missing_images: usize,
}

fn copy_if_absent(from: &Path, to: &Path) -> Result<bool, DatasetError> {
  if to.exists() {
    return Ok(false);
  }
  std::fs::copy(from, to).map_err(io_error(from))?;
  Ok(true)
}

/// 按划分结果建立检测器训练所需的 `<split>/images` 与 `<split>/labels` 目录，
/// 已存在的文件不会覆盖。
pub fn prepare_layout(
  base: &Path,
  splits: &DatasetSplits,
  yolo_dir: &Path,
) -> Result<LayoutStats, DatasetError> {
  let annotations = base.join(ANNOTATIONS_DIR);
  let mut stats = LayoutStats::default();

  for split in Split::ALL {
    let images_dir = yolo_dir.join(split.name()).join("images");
    let labels_dir = yolo_dir.join(split.name()).join("labels");
    std::fs::create_dir_all(&images_dir).map_err(io_error(&images_dir))?;
    std::fs::create_dir_all(&labels_dir).map_err(io_error(&labels_dir))?;

    for relative in splits.get(split) {
      let image = base.join(relative);
      let (Some(name), Some(stem)) = (image.file_name(), image.file_stem()) else {
        continue;
      };
      if !image.exists() {
        warn!("图像不存在: {}", image.display());
        stats.missing_images += 1;
        continue;
      }

      if copy_if_absent(&image, &images_dir.join(name))? {
        stats.images_copied += 1;
      }

      let mut label_name = stem.to_os_string();
      label_name.push(".txt");
      let label = annotations.join(&label_name);
      if label.exists() && copy_if_absent(&label, &labels_dir.join(&label_name))? {
        stats.labels_copied += 1;
      }
    }
  }

  info!("训练数据集目录: {}", yolo_dir.display());
  Ok(stats)
}

/// 检测器使用的数据集描述文件内容
pub fn data_yaml(yolo_dir: &Path) -> String {
  let folders: String = Split::ALL
    .iter()
    .map(|split| format!("{0}: {0}/images\n", split.name()))
    .collect();
  let names: String = Category::ALL
    .iter()
    .map(|category| format!("  {}: {}\n", category.id(), category.name()))
    .collect();

  format!(
    "# Architecture Components Detection Dataset\n\
     path: {}\n\
     {folders}\n\
     # Classes\n\
     names:\n\
     {names}\n\
     nc: {CATEGORY_COUNT}\n",
    yolo_dir.display()
  )
}

pub fn write_data_yaml(yolo_dir: &Path) -> Result<PathBuf, DatasetError> {
  let absolute = std::path::absolute(yolo_dir).map_err(io_error(yolo_dir))?;
  let path = yolo_dir.join("data.yaml");
  std::fs::write(&path, data_yaml(&absolute)).map_err(io_error(&path))?;
  info!("生成数据集描述: {}", path.display());
  Ok(path)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("images/aws/{:03}.png", i)).collect()
  }

  #[test]
  fn split_sizes_follow_ratios() {
    let splits = DatasetSplits::shuffle(names(66), DEFAULT_SEED);
    assert_eq!(splits.train.len(), 46);
    assert_eq!(splits.val.len(), 13);
    assert_eq!(splits.test.len(), 7);
    assert_eq!(splits.len(), 66);
  }

  #[test]
  fn splits_are_disjoint_and_complete() {
    let splits = DatasetSplits::shuffle(names(25), 7);
    let mut all: Vec<String> = Split::ALL
      .iter()
      .flat_map(|s| splits.get(*s).to_vec())
      .collect();
    all.sort();
    assert_eq!(all, names(25));
  }

  #[test]
  fn same_seed_same_split() {
    assert_eq!(
      DatasetSplits::shuffle(names(30), DEFAULT_SEED),
      DatasetSplits::shuffle(names(30), DEFAULT_SEED)
    );
  }

  #[test]
  fn empty_dataset_gives_empty_splits() {
    let splits = DatasetSplits::shuffle(Vec::new(), DEFAULT_SEED);
    assert!(splits.is_empty());
  }

  #[test]
  fn yaml_lists_all_classes() {
    let yaml = data_yaml(Path::new("/data/yolo_dataset"));
    assert!(yaml.contains("path: /data/yolo_dataset\n"));
    assert!(yaml.contains("train: train/images\n"));
    assert!(yaml.contains("  0: user\n"));
    assert!(yaml.contains("  27: external_service\n"));
    assert!(yaml.contains("  29: email_service\n"));
    assert!(yaml.contains(
      "test: test/images\n\n# Classes\nnames:\n  0: user\n  1: web_browser\n"
    ));
    assert!(yaml.ends_with("  29: email_service\n\nnc: 30\n"));
  }
}
