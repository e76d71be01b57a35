// 该文件是 Keras Detector 项目的一部分。
// src/model/keras.rs - Keras 模型文件加载
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

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use tracing::{debug, error, info};

use crate::model::{Model, ModelError, ModelLoader};

// .keras 文件是 zip 容器
const KERAS_ARCHIVE_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// 已读入内存并通过基本检查的 .keras 模型文件
#[derive(Debug, Clone)]
pub struct KerasArchive {
  path: PathBuf,
  data: Vec<u8>,
}

impl KerasArchive {
  pub fn open(path: &Path) -> Result<Self, ModelError> {
    info!("加载模型文件: {}", path.display());
    let data = std::fs::read(path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      data.len() as f64 / (1024.0 * 1024.0)
    );

    if data.is_empty() {
      error!("模型文件为空: {}", path.display());
      return Err(ModelError::InvalidArtifact(format!(
        "{} 是空文件",
        path.display()
      )));
    }

    if !data.starts_with(&KERAS_ARCHIVE_MAGIC) {
      error!("模型文件不是 Keras 归档: {}", path.display());
      return Err(ModelError::InvalidArtifact(format!(
        "{} 不是 Keras 归档文件",
        path.display()
      )));
    }

    Ok(Self {
      path: path.to_path_buf(),
      data,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }
}

/// 负责把 Keras 归档编译成可执行模型的推理引擎
pub trait InferenceEngine: Send + Sync {
  fn build(&self, archive: &KerasArchive) -> Result<Arc<dyn Model>, ModelError>;
}

pub struct KerasModelLoader<E> {
  engine: E,
}

impl<E: InferenceEngine> KerasModelLoader<E> {
  pub fn new(engine: E) -> Self {
    Self { engine }
  }
}

impl<E: InferenceEngine> ModelLoader for KerasModelLoader<E> {
  fn load(&self, path: &Path) -> Result<Arc<dyn Model>, ModelError> {
    let archive = KerasArchive::open(path)?;
    info!("构建推理模型");
    let model = self.engine.build(&archive).inspect_err(|e| {
      error!("推理引擎拒绝模型 {}: {}", archive.path().display(), e);
    })?;
    info!("模型加载完成");
    Ok(model)
  }
}
