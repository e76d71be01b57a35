// 该文件是 Keras Detector 项目的一部分。
// src/config.rs - 服务配置校验
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

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::VisionError;

/// 宿主下发的扁平属性表
pub type Attributes = Map<String, Value>;

pub const MODEL_PATH_KEY: &str = "model_path";
pub const CAMERA_NAME_KEY: &str = "camera_name";
pub const MODEL_EXTENSION: &str = "keras";

pub const MODEL_PATH_ERR: &str =
  "model_path must be a location (string) to a Keras model file ending in .keras";
pub const CAMERA_NAME_ERR: &str = "camera_name must be a non-empty string";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectorConfig {
  pub model_path: String,
  pub camera_name: String,
}

/// 非字符串或缺失的属性都按空字符串处理
fn string_attr<'a>(attributes: &'a Attributes, key: &str) -> &'a str {
  attributes.get(key).and_then(Value::as_str).unwrap_or("")
}

/// 以路径分隔符结尾的是目录，没有扩展名
fn has_model_extension(path: &str) -> bool {
  if path.ends_with(std::path::is_separator) {
    return false;
  }
  Path::new(path)
    .extension()
    .map(|ext| ext == MODEL_EXTENSION)
    .unwrap_or(false)
}

impl DetectorConfig {
  pub fn from_attributes(attributes: &Attributes) -> Result<Self, VisionError> {
    let model_path = string_attr(attributes, MODEL_PATH_KEY);
    if model_path.is_empty() || !has_model_extension(model_path) {
      error!("模型路径无效: '{}'", model_path);
      return Err(VisionError::invalid_config(MODEL_PATH_ERR));
    }

    let camera_name = string_attr(attributes, CAMERA_NAME_KEY);
    if camera_name.is_empty() {
      error!("相机名称为空");
      return Err(VisionError::invalid_config(CAMERA_NAME_ERR));
    }

    debug!("配置校验通过: 模型 {}, 相机 {}", model_path, camera_name);
    Ok(Self {
      model_path: model_path.to_string(),
      camera_name: camera_name.to_string(),
    })
  }

  /// 返回 (必需依赖, 可选依赖)
  pub fn dependencies(&self) -> (Vec<String>, Vec<String>) {
    (vec![self.camera_name.clone()], Vec::new())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn attrs(value: Value) -> Attributes {
    match value {
      Value::Object(map) => map,
      _ => panic!("属性必须是对象"),
    }
  }

  fn invalid_message(result: Result<DetectorConfig, VisionError>) -> String {
    match result {
      Err(VisionError::InvalidConfig(msg)) => msg,
      other => panic!("期望 InvalidConfig, 实际 {:?}", other),
    }
  }

  #[test]
  fn empty_config_fails_on_model_path() {
    let result = DetectorConfig::from_attributes(&attrs(json!({})));
    assert_eq!(invalid_message(result), MODEL_PATH_ERR);
  }

  #[test]
  fn missing_model_path_fails_even_with_camera() {
    let result = DetectorConfig::from_attributes(&attrs(json!({ "camera_name": "cam" })));
    assert_eq!(invalid_message(result), MODEL_PATH_ERR);
  }

  #[test]
  fn wrong_extension_fails_on_model_path() {
    for path in [
      "model.h5",
      "model.keras.bak",
      "model",
      "keras",
      "/models/.keras",
      "model.KERAS",
      "model.keras/",
      "/opt/models/detector.keras/",
    ] {
      let result = DetectorConfig::from_attributes(&attrs(json!({
        "model_path": path,
        "camera_name": "cam",
      })));
      assert_eq!(invalid_message(result), MODEL_PATH_ERR, "path {}", path);
    }
  }

  #[test]
  fn non_string_model_path_is_rejected() {
    let result = DetectorConfig::from_attributes(&attrs(json!({
      "model_path": 42,
      "camera_name": "cam",
    })));
    assert_eq!(invalid_message(result), MODEL_PATH_ERR);
  }

  #[test]
  fn missing_camera_fails_on_camera_name() {
    let result =
      DetectorConfig::from_attributes(&attrs(json!({ "model_path": "BlahBlahModel.keras" })));
    assert_eq!(invalid_message(result), CAMERA_NAME_ERR);

    let result = DetectorConfig::from_attributes(&attrs(json!({
      "model_path": "BlahBlahModel.keras",
      "camera_name": "",
    })));
    assert_eq!(invalid_message(result), CAMERA_NAME_ERR);
  }

  #[test]
  fn valid_config_requires_only_the_camera() {
    let config = DetectorConfig::from_attributes(&attrs(json!({
      "model_path": "/opt/models/detector.keras",
      "camera_name": "front",
    })))
    .unwrap();
    assert_eq!(config.model_path, "/opt/models/detector.keras");
    let (required, optional) = config.dependencies();
    assert_eq!(required, vec!["front".to_string()]);
    assert!(optional.is_empty());
  }
}
