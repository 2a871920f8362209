// 该文件是 Archdet （架构识别） 项目的一部分。
// tests/dataset.rs - 数据集划分测试
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

use std::path::Path;

use archdet::dataset::{self, DEFAULT_SEED, DatasetSplits, SPLITS_DIR, Split};
use tempfile::TempDir;

fn touch(path: &Path, content: &str) {
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(path, content).unwrap();
}

/// 建立 `count` 张 aws 图像与对应标注，外加若干干扰文件。
fn build_dataset(base: &Path, count: usize) {
  for i in 0..count {
    touch(&base.join(format!("images/aws/diagram_{:02}.png", i)), "png");
    touch(
      &base.join(format!("annotations/diagram_{:02}.txt", i)),
      "0 0.5 0.5 0.2 0.2\n",
    );
  }
  // 没有标注的图像
  touch(&base.join("images/gcp/unlabeled.png"), "png");
  // SVG 转换的临时文件
  touch(&base.join("images/aws_svg_temp/diagram_00.png"), "png");
  // 非图像文件
  touch(&base.join("images/aws/diagram_00.svg"), "svg");
}

#[test]
fn finds_only_annotated_images() {
  let dir = TempDir::new().unwrap();
  build_dataset(dir.path(), 5);

  let images = dataset::find_annotated_images(dir.path()).unwrap();
  assert_eq!(
    images,
    (0..5)
      .map(|i| format!("images/aws/diagram_{:02}.png", i))
      .collect::<Vec<_>>()
  );
}

#[test]
fn uppercase_extensions_are_images() {
  let dir = TempDir::new().unwrap();
  touch(&dir.path().join("images/azure/Front.JPG"), "jpg");
  touch(&dir.path().join("annotations/Front.txt"), "");

  let images = dataset::find_annotated_images(dir.path()).unwrap();
  assert_eq!(images, vec!["images/azure/Front.JPG".to_string()]);
}

#[test]
fn split_files_round_trip() {
  let dir = TempDir::new().unwrap();
  build_dataset(dir.path(), 20);

  let images = dataset::find_annotated_images(dir.path()).unwrap();
  let splits = DatasetSplits::shuffle(images, DEFAULT_SEED);
  assert_eq!(
    (splits.train.len(), splits.val.len(), splits.test.len()),
    (14, 4, 2)
  );

  let splits_dir = dir.path().join(SPLITS_DIR);
  splits.write(&splits_dir).unwrap();
  let train = std::fs::read_to_string(splits_dir.join("train.txt")).unwrap();
  assert_eq!(train.lines().count(), 14);
  assert_eq!(DatasetSplits::read(&splits_dir).unwrap(), splits);
}

#[test]
fn layout_copies_images_and_labels() {
  let dir = TempDir::new().unwrap();
  let base = dir.path().join("data");
  let yolo_dir = dir.path().join("yolo_dataset");
  build_dataset(&base, 10);

  let images = dataset::find_annotated_images(&base).unwrap();
  let mut splits = DatasetSplits::shuffle(images, DEFAULT_SEED);
  splits.test.push("images/aws/gone.png".to_string());

  let stats = dataset::prepare_layout(&base, &splits, &yolo_dir).unwrap();
  assert_eq!(stats.images_copied, 10);
  assert_eq!(stats.labels_copied, 10);
  assert_eq!(stats.missing_images, 1);

  let copied = |split: Split| {
    std::fs::read_dir(yolo_dir.join(split.name()).join("images"))
      .unwrap()
      .count()
  };
  assert_eq!(copied(Split::Train), 7);
  assert_eq!(copied(Split::Val), 2);
  assert_eq!(copied(Split::Test), 1);
  let first = Path::new(&splits.train[0]);
  let stem = first.file_stem().unwrap().to_string_lossy();
  assert!(
    yolo_dir
      .join("train/labels")
      .join(format!("{}.txt", stem))
      .exists()
  );

  // 再次执行不会重复复制
  let again = dataset::prepare_layout(&base, &splits, &yolo_dir).unwrap();
  assert_eq!(again.images_copied, 0);
  assert_eq!(again.labels_copied, 0);

  let yaml_path = dataset::write_data_yaml(&yolo_dir).unwrap();
  let yaml = std::fs::read_to_string(yaml_path).unwrap();
  assert!(yaml.contains("val: val/images\n"));
  assert!(yaml.contains("nc: 30"));
}

#[test]
fn empty_dataset_has_no_images() {
  let dir = TempDir::new().unwrap();
  std::fs::create_dir_all(dir.path().join("images")).unwrap();
  assert!(dataset::find_annotated_images(dir.path()).unwrap().is_empty());
}
