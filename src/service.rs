// 该文件是 Keras Detector 项目的一部分。
// src/service.rs - 视觉服务
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

use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Instant};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, error, info, warn};

use crate::{
  config::{Attributes, DetectorConfig},
  error::VisionError,
  frame::KerasInput,
  input::{Camera, CameraMimeType, ViamImage},
  model::{Detection, Model, ModelLoader, postprocess},
  resource::{ModelTriple, ResourceName},
};

/// 宿主解析出的依赖资源
pub type Dependencies = HashMap<ResourceName, Arc<dyn Camera>>;

pub type CommandMap = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Properties {
  pub detections_supported: bool,
  pub classifications_supported: bool,
  pub object_point_clouds_supported: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
  pub class_name: String,
  pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointCloudObject {
  pub point_cloud: Vec<u8>,
  pub mime_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureOptions {
  pub return_image: bool,
  pub return_classifications: bool,
  pub return_detections: bool,
  pub return_object_point_clouds: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureAllResult {
  pub image: Option<ViamImage>,
  pub classifications: Option<Vec<Classification>>,
  pub detections: Option<Vec<Detection>>,
  pub objects: Option<Vec<PointCloudObject>>,
}

/// 视觉服务对宿主暴露的接口
#[async_trait]
pub trait VisionService: Send + Sync {
  async fn reconfigure(
    &self,
    attributes: &Attributes,
    dependencies: &Dependencies,
  ) -> Result<(), VisionError>;

  async fn capture_all_from_camera(
    &self,
    camera_name: &str,
    options: CaptureOptions,
  ) -> Result<CaptureAllResult, VisionError>;

  async fn get_detections_from_camera(
    &self,
    camera_name: &str,
  ) -> Result<Vec<Detection>, VisionError>;

  async fn get_detections(&self, image: &ViamImage) -> Result<Vec<Detection>, VisionError>;

  async fn get_classifications_from_camera(
    &self,
    camera_name: &str,
    count: usize,
  ) -> Result<Vec<Classification>, VisionError>;

  async fn get_classifications(
    &self,
    image: &ViamImage,
    count: usize,
  ) -> Result<Vec<Classification>, VisionError>;

  async fn get_object_point_clouds(
    &self,
    camera_name: &str,
  ) -> Result<Vec<PointCloudObject>, VisionError>;

  async fn get_properties(&self) -> Result<Properties, VisionError>;

  async fn do_command(&self, command: &CommandMap) -> Result<CommandMap, VisionError>;
}

struct Bindings {
  config: DetectorConfig,
  model: Arc<dyn Model>,
  camera: Arc<dyn Camera>,
}

pub struct KerasDetector {
  name: String,
  loader: Arc<dyn ModelLoader>,
  bindings: RwLock<Option<Bindings>>,
}

impl KerasDetector {
  pub const MODEL: ModelTriple = ModelTriple {
    namespace: "viam",
    family: "vision",
    name: "keras-detector",
  };

  pub const PROPERTIES: Properties = Properties {
    detections_supported: true,
    classifications_supported: false,
    object_point_clouds_supported: false,
  };

  /// 创建未配置的服务，调用 `reconfigure` 之前只能查询属性
  pub fn new(name: &str, loader: Arc<dyn ModelLoader>) -> Self {
    Self {
      name: name.to_string(),
      loader,
      bindings: RwLock::new(None),
    }
  }

  pub async fn with_config(
    name: &str,
    loader: Arc<dyn ModelLoader>,
    attributes: &Attributes,
    dependencies: &Dependencies,
  ) -> Result<Self, VisionError> {
    let detector = Self::new(name, loader);
    detector.reconfigure(attributes, dependencies).await?;
    Ok(detector)
  }

  /// 返回 (必需依赖, 可选依赖)
  pub fn validate_config(
    attributes: &Attributes,
  ) -> Result<(Vec<String>, Vec<String>), VisionError> {
    Ok(DetectorConfig::from_attributes(attributes)?.dependencies())
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn resource_name(&self) -> ResourceName {
    ResourceName::service("vision", &self.name)
  }

  pub async fn configured_camera(&self) -> Option<String> {
    self
      .bindings
      .read()
      .await
      .as_ref()
      .map(|b| b.config.camera_name.clone())
  }

  async fn bind(
    &self,
    attributes: &Attributes,
    dependencies: &Dependencies,
  ) -> Result<Bindings, VisionError> {
    let config = DetectorConfig::from_attributes(attributes)?;

    // 模型文件读取和编译在阻塞线程池中进行
    let loader = Arc::clone(&self.loader);
    let model_path = PathBuf::from(&config.model_path);
    let model = tokio::task::spawn_blocking(move || loader.load(&model_path))
      .await?
      .map_err(|e| {
        error!("模型加载失败: {}", e);
        VisionError::ModelLoad(e)
      })?;

    let camera_key = ResourceName::camera(&config.camera_name);
    let camera = match dependencies.get(&camera_key) {
      Some(camera) => Arc::clone(camera),
      None => {
        error!("依赖中没有相机 {}", camera_key);
        return Err(VisionError::DependencyNotFound(camera_key));
      }
    };

    Ok(Bindings {
      config,
      model,
      camera,
    })
  }

  async fn bindings(&self) -> Result<RwLockReadGuard<'_, Bindings>, VisionError> {
    RwLockReadGuard::try_map(self.bindings.read().await, |b| b.as_ref()).map_err(|_| {
      error!("服务 {} 尚未配置", self.name);
      VisionError::NotConfigured
    })
  }

  fn not_supported<T>(&self, method: &'static str) -> Result<T, VisionError> {
    error!("`{}` is not implemented", method);
    Err(VisionError::NotSupported(method))
  }
}

/// 解码、缩放和推理都在阻塞线程池中执行，不占用异步工作线程
async fn detect(model: Arc<dyn Model>, image: ViamImage) -> Result<Vec<Detection>, VisionError> {
  tokio::task::spawn_blocking(move || {
    let rgb = image.decode()?;
    let input = KerasInput::from(&rgb);

    debug!("执行模型推理");
    let now = Instant::now();
    let rows = model.predict(&input).map_err(VisionError::Inference)?;
    debug!("推理完成，耗时: {:.2?}", now.elapsed());

    Ok(postprocess(&rows))
  })
  .await?
}

#[async_trait]
impl VisionService for KerasDetector {
  async fn reconfigure(
    &self,
    attributes: &Attributes,
    dependencies: &Dependencies,
  ) -> Result<(), VisionError> {
    info!("重新配置服务 {}", self.name);
    let bindings = self.bind(attributes, dependencies).await?;
    let camera_name = bindings.camera.name().to_string();

    // 等待进行中的请求结束后整体替换
    *self.bindings.write().await = Some(bindings);
    info!("服务 {} 配置完成, 相机: {}", self.name, camera_name);
    Ok(())
  }

  async fn capture_all_from_camera(
    &self,
    camera_name: &str,
    options: CaptureOptions,
  ) -> Result<CaptureAllResult, VisionError> {
    let bindings = self.bindings().await?;
    if !camera_name.is_empty() && camera_name != bindings.config.camera_name {
      warn!(
        "请求的相机 {} 不是配置的相机 {}",
        camera_name, bindings.config.camera_name
      );
      return Err(VisionError::camera_mismatch(
        camera_name,
        &bindings.config.camera_name,
      ));
    }

    let image = bindings.camera.get_image(CameraMimeType::Jpeg).await?;

    let mut out = CaptureAllResult::default();
    if options.return_detections {
      out.detections = Some(detect(Arc::clone(&bindings.model), image.clone()).await?);
    }
    if options.return_image {
      out.image = Some(image);
    }
    Ok(out)
  }

  async fn get_detections_from_camera(
    &self,
    camera_name: &str,
  ) -> Result<Vec<Detection>, VisionError> {
    let bindings = self.bindings().await?;
    if camera_name != bindings.config.camera_name {
      warn!(
        "请求的相机 {} 不是配置的相机 {}",
        camera_name, bindings.config.camera_name
      );
      return Err(VisionError::camera_mismatch(
        camera_name,
        &bindings.config.camera_name,
      ));
    }

    let image = bindings.camera.get_image(CameraMimeType::Jpeg).await?;
    detect(Arc::clone(&bindings.model), image).await
  }

  async fn get_detections(&self, image: &ViamImage) -> Result<Vec<Detection>, VisionError> {
    let bindings = self.bindings().await?;
    detect(Arc::clone(&bindings.model), image.clone()).await
  }

  async fn get_classifications_from_camera(
    &self,
    _camera_name: &str,
    _count: usize,
  ) -> Result<Vec<Classification>, VisionError> {
    self.not_supported("get_classifications_from_camera")
  }

  async fn get_classifications(
    &self,
    _image: &ViamImage,
    _count: usize,
  ) -> Result<Vec<Classification>, VisionError> {
    self.not_supported("get_classifications")
  }

  async fn get_object_point_clouds(
    &self,
    _camera_name: &str,
  ) -> Result<Vec<PointCloudObject>, VisionError> {
    self.not_supported("get_object_point_clouds")
  }

  async fn get_properties(&self) -> Result<Properties, VisionError> {
    Ok(Self::PROPERTIES)
  }

  async fn do_command(&self, _command: &CommandMap) -> Result<CommandMap, VisionError> {
    self.not_supported("do_command")
  }
}
