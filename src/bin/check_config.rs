// 该文件是 Keras Detector 项目的一部分。
// src/bin/check_config.rs - 配置检查工具
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Wareless Group

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::info;

use keras_detector::{Attributes, DetectorConfig, KerasDetector, model::KerasArchive};

/// 检查视觉服务属性配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 属性配置 JSON 文件
  #[arg(long, value_name = "FILE")]
  pub config: PathBuf,
  /// 同时检查 model_path 指向的模型文件
  #[arg(long, default_value_t = false)]
  pub inspect: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  info!("服务模型: {}", KerasDetector::MODEL);
  info!("配置文件: {}", args.config.display());

  let text = std::fs::read_to_string(&args.config)
    .with_context(|| format!("无法读取配置文件: {}", args.config.display()))?;
  let attributes: Attributes = serde_json::from_str(&text).context("配置文件不是 JSON 对象")?;

  let config = DetectorConfig::from_attributes(&attributes)?;
  let (required, optional) = config.dependencies();

  if args.inspect {
    let archive = KerasArchive::open(Path::new(&config.model_path))?;
    info!(
      "模型文件检查通过: {} ({} 字节)",
      archive.path().display(),
      archive.len()
    );
  }

  let report = json!({
    "config": config,
    "required_dependencies": required,
    "optional_dependencies": optional,
  });
  println!("{}", serde_json::to_string_pretty(&report)?);

  Ok(())
}
