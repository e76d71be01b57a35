// 该文件是 Keras Detector 项目的一部分。
// src/error.rs - 视觉服务错误定义
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

use thiserror::Error;

use crate::{input::CameraError, model::ModelError, resource::ResourceName};

#[derive(Error, Debug)]
pub enum VisionError {
  #[error("{0}")]
  InvalidConfig(String),
  #[error("依赖未找到: {0}")]
  DependencyNotFound(ResourceName),
  #[error("模型加载错误: {0}")]
  ModelLoad(ModelError),
  #[error("Camera {requested} is not the configured camera {configured}")]
  CameraMismatch {
    requested: String,
    configured: String,
  },
  #[error("`{0}` is not implemented")]
  NotSupported(&'static str),
  #[error("服务尚未配置")]
  NotConfigured,
  #[error("相机错误: {0}")]
  Camera(#[from] CameraError),
  #[error("图像解码错误: {0}")]
  Decode(#[from] image::ImageError),
  #[error("推理错误: {0}")]
  Inference(ModelError),
  #[error("后台任务失败: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl VisionError {
  pub fn invalid_config(msg: &str) -> Self {
    VisionError::InvalidConfig(msg.to_string())
  }

  pub fn camera_mismatch(requested: &str, configured: &str) -> Self {
    VisionError::CameraMismatch {
      requested: requested.to_string(),
      configured: configured.to_string(),
    }
  }
}
