// 该文件是 Archdet （架构识别） 项目的一部分。
// src/bin/draw_annotations.rs - 标注可视化
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

use anyhow::Result;
use clap::Parser;
use tracing::info;

use archdet::output::Draw;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图像
  #[arg(long, value_name = "IMAGE")]
  pub image: PathBuf,
  /// YOLO 标注文件
  #[arg(long, value_name = "TXT")]
  pub labels: PathBuf,
  /// 输出图像
  #[arg(long, value_name = "OUTPUT")]
  pub output: PathBuf,
  /// 边框宽度
  #[arg(long, default_value_t = 3)]
  pub thickness: u32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入图像: {}", args.image.display());
  info!("标注文件: {}", args.labels.display());

  let draw = Draw::default().with_thickness(args.thickness);
  let count = draw.draw_file(&args.image, &args.labels, &args.output)?;
  info!("绘制 {} 个框", count);

  Ok(())
}
