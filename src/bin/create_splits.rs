// 该文件是 Archdet （架构识别） 项目的一部分。
// src/bin/create_splits.rs - 划分训练/验证/测试集
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

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::{info, warn};

use archdet::dataset::{self, DEFAULT_SEED, DatasetSplits, SPLITS_DIR, Split};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 数据集根目录，包含 images/ 与 annotations/
  #[arg(long, value_name = "DIR", default_value = "data")]
  pub dataset: PathBuf,
  /// 打乱使用的随机种子
  #[arg(long, default_value_t = DEFAULT_SEED)]
  pub seed: u64,
  /// 同时生成训练目录结构与 data.yaml
  #[arg(long, value_name = "DIR")]
  pub layout: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("数据集目录: {}", args.dataset.display());
  let images = dataset::find_annotated_images(&args.dataset)?;
  if images.is_empty() {
    bail!("没有找到带标注的图像");
  }
  info!("找到 {} 张已标注图像", images.len());

  let splits = DatasetSplits::shuffle(images, args.seed);
  for split in Split::ALL {
    let count = splits.get(split).len();
    info!(
      "  {}: {} ({:.1}%)",
      split.name(),
      count,
      count as f64 * 100.0 / splits.len() as f64
    );
  }
  splits.write(&args.dataset.join(SPLITS_DIR))?;

  if let Some(layout) = args.layout {
    let stats = dataset::prepare_layout(&args.dataset, &splits, &layout)?;
    if stats.missing_images > 0 {
      warn!("{} 张图像缺失", stats.missing_images);
    }
    info!(
      "复制 {} 张图像, {} 个标注",
      stats.images_copied, stats.labels_copied
    );
    dataset::write_data_yaml(&layout)?;
  }

  Ok(())
}
