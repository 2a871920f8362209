// 该文件是 Archdet （架构识别） 项目的一部分。
// src/bin/convert_annotation.rs - 将视觉模型回复转换为标注
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

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use archdet::{
  convert::{ImageInfo, build_image_annotation},
  vision,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 被标注的图像
  #[arg(long, value_name = "IMAGE", required_unless_present = "print_prompt")]
  pub image: Option<PathBuf>,
  /// 视觉模型的原始回复文本
  #[arg(long, value_name = "FILE", required_unless_present = "print_prompt")]
  pub reply: Option<PathBuf>,
  /// 输出目录，写出 `<stem>.json` 与 `<stem>.txt`
  #[arg(long, value_name = "DIR", default_value = "data/annotations")]
  pub output: PathBuf,
  /// 记录在标注元数据中的模型名
  #[arg(long, default_value = "vision")]
  pub model: String,
  /// 覆盖已存在的标注
  #[arg(long)]
  pub force: bool,
  /// 打印标注提示词后退出
  #[arg(long)]
  pub print_prompt: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  if args.print_prompt {
    println!("{}", vision::annotation_prompt());
    return Ok(());
  }

  let (Some(image_path), Some(reply)) = (args.image, args.reply) else {
    anyhow::bail!("需要同时提供 --image 与 --reply");
  };

  let stem = image_path
    .file_stem()
    .context("图像路径缺少文件名")?
    .to_string_lossy()
    .into_owned();
  let json_path = args.output.join(format!("{}.json", stem));
  let yolo_path = args.output.join(format!("{}.txt", stem));

  if json_path.exists() && !args.force {
    info!("跳过已存在的标注: {}", json_path.display());
    return Ok(());
  }

  let (width, height) = image::image_dimensions(&image_path)
    .with_context(|| format!("无法读取图像尺寸: {}", image_path.display()))?;
  info!("图像: {} ({}x{})", image_path.display(), width, height);

  let text = std::fs::read_to_string(&reply)
    .with_context(|| format!("无法读取回复: {}", reply.display()))?;
  let parsed = vision::parse_reply(&text);

  let info = ImageInfo::from_path(&image_path, width, height);
  let annotation = build_image_annotation(&info, &parsed, &args.model);

  std::fs::create_dir_all(&args.output)?;
  annotation.save_json(&json_path)?;
  annotation.save_yolo(&yolo_path)?;

  info!(
    "完成: {} 个组件, {} 个连接",
    annotation.annotations.len(),
    annotation.connections.len()
  );

  Ok(())
}
