// 该文件是 Keras Detector 项目的一部分。
// src/model.rs - 模型
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

use std::{path::Path, sync::Arc};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::frame::KerasInput;

/// 模型没有分类头，类别和置信度均为固定值
pub const DETECTION_CLASS_NAME: &str = "object";
pub const DETECTION_CONFIDENCE: f64 = 0.5;

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("模型文件读取错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("模型文件无效: {0}")]
  InvalidArtifact(String),
  #[error("推理引擎错误: {0}")]
  Engine(String),
}

/// 已加载的模型，一次前向推理返回若干输出行
pub trait Model: Send + Sync {
  fn predict(&self, input: &KerasInput) -> Result<Vec<Vec<f32>>, ModelError>;
}

pub trait ModelLoader: Send + Sync {
  fn load(&self, path: &Path) -> Result<Arc<dyn Model>, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
  pub x_min: i64,
  pub y_min: i64,
  pub x_max: i64,
  pub y_max: i64,
  pub class_name: String,
  pub confidence: f64,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DetectionRowError {
  #[error("检测行字段不足: 期望至少 4 个, 实际 {len} 个")]
  Malformed { len: usize },
  #[error("检测行第 {idx} 个字段不是有限数值")]
  NonFinite { idx: usize },
}

/// 坐标取整后截断到 0，框不会越过图像左上角
fn round_coord(value: f32) -> i64 {
  (value.round_ties_even() as i64).max(0)
}

impl TryFrom<&[f32]> for Detection {
  type Error = DetectionRowError;

  fn try_from(row: &[f32]) -> Result<Self, Self::Error> {
    let fields = match row {
      [x0, y0, x1, y1, ..] => [*x0, *y0, *x1, *y1],
      _ => return Err(DetectionRowError::Malformed { len: row.len() }),
    };
    if let Some(idx) = fields.iter().position(|v| !v.is_finite()) {
      return Err(DetectionRowError::NonFinite { idx });
    }
    let [x0, y0, x1, y1] = fields.map(round_coord);

    Ok(Detection {
      x_min: x0.min(x1),
      y_min: y0.min(y1),
      x_max: x0.max(x1),
      y_max: y0.max(y1),
      class_name: DETECTION_CLASS_NAME.to_string(),
      confidence: DETECTION_CONFIDENCE,
    })
  }
}

/// 将模型输出行转换为检测框，无效的行记录警告后跳过
pub fn postprocess(rows: &[Vec<f32>]) -> Vec<Detection> {
  debug!("后处理模型输出: {} 行", rows.len());
  let detections: Vec<Detection> = rows
    .iter()
    .enumerate()
    .filter_map(|(idx, row)| match Detection::try_from(row.as_slice()) {
      Ok(det) => Some(det),
      Err(e) => {
        warn!("第 {} 行不是有效的检测结果, 跳过: {}", idx, e);
        None
      }
    })
    .collect();
  debug!("检测结果: {:?}", detections);
  detections
}

mod keras;
pub use self::keras::{InferenceEngine, KerasArchive, KerasModelLoader};

#[cfg(test)]
mod tests {
  use super::*;

  fn row(values: &[f32]) -> Result<Detection, DetectionRowError> {
    Detection::try_from(values)
  }

  #[test]
  fn row_maps_to_fixed_label_box() {
    let det = row(&[10.0, 20.0, 30.0, 40.0]).unwrap();
    assert_eq!(
      det,
      Detection {
        x_min: 10,
        y_min: 20,
        x_max: 30,
        y_max: 40,
        class_name: "object".to_string(),
        confidence: 0.5,
      }
    );
  }

  #[test]
  fn swapped_corners_are_ordered() {
    let det = row(&[30.4, 40.6, 10.2, 19.5, 0.9]).unwrap();
    assert_eq!((det.x_min, det.x_max), (10, 30));
    assert_eq!((det.y_min, det.y_max), (20, 41));
  }

  #[test]
  fn ties_round_to_even() {
    let det = row(&[0.5, 1.5, 2.5, 3.5]).unwrap();
    assert_eq!((det.x_min, det.y_min, det.x_max, det.y_max), (0, 2, 2, 4));
  }

  #[test]
  fn short_row_is_malformed() {
    assert_eq!(
      row(&[1.0, 2.0, 3.0]),
      Err(DetectionRowError::Malformed { len: 3 })
    );
  }

  #[test]
  fn postprocess_skips_short_rows() {
    let rows = vec![
      vec![1.0, 2.0],
      vec![10.0, 20.0, 30.0, 40.0],
      vec![],
      vec![5.0, 5.0, 1.0, 1.0],
    ];
    let detections = postprocess(&rows);
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].x_min, 10);
    assert_eq!((detections[1].x_min, detections[1].x_max), (1, 5));
  }

  #[test]
  fn negative_coords_clamp_to_zero() {
    let det = row(&[-5.0, -3.0, 10.0, 20.0]).unwrap();
    assert_eq!((det.x_min, det.y_min, det.x_max, det.y_max), (0, 0, 10, 20));

    let det = row(&[-7.0, 4.0, -2.0, -1.0]).unwrap();
    assert_eq!((det.x_min, det.y_min, det.x_max, det.y_max), (0, 0, 0, 4));
  }

  #[test]
  fn non_finite_fields_are_rejected() {
    assert_eq!(
      row(&[f32::NAN, 1.0, 2.0, 3.0]),
      Err(DetectionRowError::NonFinite { idx: 0 })
    );
    assert_eq!(
      row(&[1.0, 2.0, f32::INFINITY, 3.0]),
      Err(DetectionRowError::NonFinite { idx: 2 })
    );
    assert_eq!(
      row(&[1.0, 2.0, 3.0, f32::NEG_INFINITY]),
      Err(DetectionRowError::NonFinite { idx: 3 })
    );
    // 第五个字段不参与坐标
    assert!(row(&[1.0, 2.0, 3.0, 4.0, f32::NAN]).is_ok());
  }

  #[test]
  fn postprocess_skips_non_finite_rows() {
    let rows = vec![vec![f32::NAN, 1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0, 40.0]];
    let detections = postprocess(&rows);
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].x_min, 10);
  }

  #[test]
  fn postprocess_of_nothing_is_empty() {
    assert!(postprocess(&[]).is_empty());
  }
}
