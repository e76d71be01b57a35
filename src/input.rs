// 该文件是 Keras Detector 项目的一部分。
// src/input.rs - 相机图像输入
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

use std::io::Cursor;

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMimeType {
  Jpeg,
  Png,
}

impl CameraMimeType {
  pub fn as_str(&self) -> &'static str {
    match self {
      CameraMimeType::Jpeg => "image/jpeg",
      CameraMimeType::Png => "image/png",
    }
  }

  fn image_format(&self) -> ImageFormat {
    match self {
      CameraMimeType::Jpeg => ImageFormat::Jpeg,
      CameraMimeType::Png => ImageFormat::Png,
    }
  }
}

/// 相机返回的编码图像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViamImage {
  data: Vec<u8>,
  mime_type: CameraMimeType,
}

impl ViamImage {
  pub fn new(data: Vec<u8>, mime_type: CameraMimeType) -> Self {
    Self { data, mime_type }
  }

  /// 将 RGB 图像编码为指定格式
  pub fn encode(image: &RgbImage, mime_type: CameraMimeType) -> Result<Self, image::ImageError> {
    let mut data = Vec::new();
    image.write_to(&mut Cursor::new(&mut data), mime_type.image_format())?;
    Ok(Self { data, mime_type })
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn mime_type(&self) -> CameraMimeType {
    self.mime_type
  }

  pub fn decode(&self) -> Result<RgbImage, image::ImageError> {
    let image = image::load_from_memory_with_format(&self.data, self.mime_type.image_format())?;
    debug!(
      "解码 {} 图像: {}x{}",
      self.mime_type.as_str(),
      image.width(),
      image.height()
    );
    Ok(image.to_rgb8())
  }
}

#[derive(Error, Debug)]
pub enum CameraError {
  #[error("相机不可用: {0}")]
  Unavailable(String),
  #[error("图像编码错误: {0}")]
  Encode(#[from] image::ImageError),
}

/// 宿主提供的相机资源
#[async_trait]
pub trait Camera: Send + Sync {
  fn name(&self) -> &str;

  async fn get_image(&self, mime_type: CameraMimeType) -> Result<ViamImage, CameraError>;
}
