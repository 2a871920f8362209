// 该文件是 Archdet （架构识别） 项目的一部分。
// src/bin/fix_annotations.rs - 修复越界的 YOLO 标注
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
use tracing::info;

use archdet::normalize;

/// 原地修复目录下所有 YOLO 标注文件
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 标注文件目录
  #[arg(long, value_name = "DIR", default_value = "data/annotations")]
  pub annotations: PathBuf,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  if !args.annotations.is_dir() {
    bail!("标注目录不存在: {}", args.annotations.display());
  }
  info!("标注目录: {}", args.annotations.display());

  let report = normalize::normalize_directory(&args.annotations)?;
  let total = report.total;

  info!("修复完成");
  info!("  标注总数: {}", total.total);
  info!("  未改动:   {}", total.unchanged);
  info!("  已修复:   {}", total.fixed);
  info!("  已删除:   {}", total.removed);
  info!("  受影响文件: {}/{}", report.files_with_issues(), report.files.len());

  Ok(())
}
