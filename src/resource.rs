// 该文件是 Keras Detector 项目的一部分。
// src/resource.rs - 资源与模型名称
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

use std::fmt;

const RDK_NAMESPACE: &str = "rdk";

/// 宿主运行时中的资源全名，例如 `rdk:component:camera/front`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName {
  pub namespace: String,
  pub kind: String,
  pub subtype: String,
  pub name: String,
}

impl ResourceName {
  pub fn component(subtype: &str, name: &str) -> Self {
    Self {
      namespace: RDK_NAMESPACE.to_string(),
      kind: "component".to_string(),
      subtype: subtype.to_string(),
      name: name.to_string(),
    }
  }

  pub fn service(subtype: &str, name: &str) -> Self {
    Self {
      namespace: RDK_NAMESPACE.to_string(),
      kind: "service".to_string(),
      subtype: subtype.to_string(),
      name: name.to_string(),
    }
  }

  pub fn camera(name: &str) -> Self {
    Self::component("camera", name)
  }
}

impl fmt::Display for ResourceName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}:{}:{}/{}",
      self.namespace, self.kind, self.subtype, self.name
    )
  }
}

/// 模型三元组 `namespace:family:name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelTriple {
  pub namespace: &'static str,
  pub family: &'static str,
  pub name: &'static str,
}

impl fmt::Display for ModelTriple {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.namespace, self.family, self.name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn camera_name_formats_as_component() {
    let name = ResourceName::camera("front");
    assert_eq!(name.to_string(), "rdk:component:camera/front");
    assert_eq!(name, ResourceName::component("camera", "front"));
  }

  #[test]
  fn model_triple_formats_with_colons() {
    let triple = ModelTriple {
      namespace: "viam",
      family: "vision",
      name: "keras-detector",
    };
    assert_eq!(triple.to_string(), "viam:vision:keras-detector");
  }
}
