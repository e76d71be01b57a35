// 该文件是 Keras Detector 项目的一部分。
// src/frame.rs - NHWC 输入张量定义
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

use image::{RgbImage, imageops::FilterType};
use tracing::debug;

const RGB_CHANNELS: usize = 3;
const BATCH_SIZE: usize = 1;
const PIXEL_SCALE: f32 = 1.0 / 255.0;

/// 模型输入：宽 180、高 320，即 Keras 形状 (320, 180, 3)
pub type KerasInput = RgbNhwcTensor<180, 320>;

/// 带批次维度的 `[1, H, W, 3]` 浮点张量，像素值归一化到 [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct RgbNhwcTensor<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> Default for RgbNhwcTensor<W, H> {
  fn default() -> Self {
    let size = BATCH_SIZE * RGB_CHANNELS * (W as usize) * (H as usize);
    let data = vec![0f32; size].into_boxed_slice();
    Self { data }
  }
}

impl<const W: u32, const H: u32> RgbNhwcTensor<W, H> {
  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn shape(&self) -> [usize; 4] {
    [BATCH_SIZE, H as usize, W as usize, RGB_CHANNELS]
  }

  pub fn as_nhwc(&self) -> &[f32] {
    &self.data
  }

  pub fn get(&self, y: usize, x: usize, c: usize) -> f32 {
    self.data[(y * W as usize + x) * RGB_CHANNELS + c]
  }
}

impl<const W: u32, const H: u32> From<&RgbImage> for RgbNhwcTensor<W, H> {
  fn from(image: &RgbImage) -> Self {
    // 双线性插值缩放，不保持宽高比
    let resized;
    let source = if image.dimensions() == (W, H) {
      image
    } else {
      debug!(
        "缩放图像: {}x{} -> {}x{}",
        image.width(),
        image.height(),
        W,
        H
      );
      resized = image::imageops::resize(image, W, H, FilterType::Triangle);
      &resized
    };

    let mut frame = Self::default();
    for (dst, &value) in frame.data.iter_mut().zip(source.as_raw().iter()) {
      *dst = value as f32 * PIXEL_SCALE;
    }
    frame
  }
}
