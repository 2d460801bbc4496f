//! # 地图视图模块
//!
//! ## 设计思路
//!
//! `MapView` 是嵌入方直接持有的门面：底图加载决定视图的初始就绪状态，
//! 就绪后构建对齐底图尺寸的叠加层控制器，并把选择变化转发给它。
//!
//! 底图不绘制在合成表面上，由嵌入方作为背景层单独渲染；
//! 表面上只有叠加图层。底图加载失败是视图级错误，不触碰叠加层。
//!
//! ## 实现思路
//!
//! - 视图未就绪前，所有叠加层操作返回 `AppError::ViewNotReady`。
//! - 选择变化的转发走"签发票据 → 解析 → 提交"的完整周期；
//!   加载失败以 `Err` 上报调用方（表面保留上一次成功内容），
//!   过期结果被静默丢弃，不视为错误。

use std::sync::Arc;

use crate::error::AppError;
use crate::overlay::{
    CommitOutcome, CompositeSurface, ControllerState, ElementalRatio, FilterSelection,
    ImageLoader, OverlayController, OverlayEntry, RasterImage, ViewerConfig,
};

/// 地图视图。
///
/// 生命周期：`new` → `load_base_map`（就绪）→ 选择变化驱动叠加层。
pub struct MapView {
    config: ViewerConfig,
    loader: Arc<ImageLoader>,
    base_map: Option<RasterImage>,
    controller: Option<OverlayController>,
}

impl MapView {
    /// 按配置创建视图（尚未加载底图）。
    pub fn new(config: ViewerConfig) -> Result<Self, AppError> {
        let loader = Arc::new(ImageLoader::new(config.loader.clone())?);

        Ok(Self {
            config,
            loader,
            base_map: None,
            controller: None,
        })
    }

    /// 加载底图并构建叠加层控制器。
    ///
    /// 失败时视图保持未就绪，可重新调用重试。
    pub async fn load_base_map(&mut self) -> Result<(), AppError> {
        let source = self.config.asset_base.resolve(&self.config.base_map_path);
        let base_map = self.loader.load(&source).await?;

        log::info!(
            "🗺️ 底图加载完成 - 尺寸: {}x{}",
            base_map.width(),
            base_map.height()
        );

        self.controller = Some(OverlayController::new(
            Arc::clone(&self.loader),
            self.config.asset_base.clone(),
            self.config.key_color,
            base_map.width(),
            base_map.height(),
        ));
        self.base_map = Some(base_map);

        Ok(())
    }

    /// 视图是否就绪（底图已加载）。
    pub fn is_ready(&self) -> bool {
        self.base_map.is_some()
    }

    /// 只读访问底图。
    pub fn base_map(&self) -> Option<&RasterImage> {
        self.base_map.as_ref()
    }

    /// 只读访问合成表面。
    pub fn surface(&self) -> Result<&CompositeSurface, AppError> {
        Ok(self.controller()?.surface())
    }

    /// 叠加层当前状态。
    pub fn overlay_state(&self) -> Result<ControllerState, AppError> {
        Ok(self.controller()?.state())
    }

    /// 应用筛选条件并走完整个加载周期。
    ///
    /// 条件不完整时不发起加载，直接返回当前状态（通常为 `Idle`）。
    pub async fn apply_filter(
        &mut self,
        selection: FilterSelection,
    ) -> Result<ControllerState, AppError> {
        let controller = self.controller_mut()?;
        let ticket = controller.set_selection(selection);
        Self::drive(controller, ticket).await
    }

    /// 切换比值选择并走完整个加载周期。
    pub async fn select_ratio(
        &mut self,
        ratio: Option<ElementalRatio>,
    ) -> Result<ControllerState, AppError> {
        let controller = self.controller_mut()?;
        let ticket = controller.set_ratio(ratio);
        Self::drive(controller, ticket).await
    }

    /// 注入上传处理得到的条目集并走完整个加载周期。
    pub async fn set_entries(
        &mut self,
        entries: Vec<OverlayEntry>,
    ) -> Result<ControllerState, AppError> {
        let controller = self.controller_mut()?;
        let ticket = controller.set_entries(entries);
        Self::drive(controller, ticket).await
    }

    async fn drive(
        controller: &mut OverlayController,
        ticket: Option<crate::overlay::LoadTicket>,
    ) -> Result<ControllerState, AppError> {
        if let Some(ticket) = ticket {
            match controller.run(ticket).await {
                CommitOutcome::Failed(error) => return Err(error.into()),
                CommitOutcome::Drawn | CommitOutcome::Stale => {}
            }
        }

        Ok(controller.state())
    }

    fn controller(&self) -> Result<&OverlayController, AppError> {
        self.controller
            .as_ref()
            .ok_or_else(|| AppError::ViewNotReady("底图尚未加载".to_string()))
    }

    fn controller_mut(&mut self) -> Result<&mut OverlayController, AppError> {
        self.controller
            .as_mut()
            .ok_or_else(|| AppError::ViewNotReady("底图尚未加载".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::AssetBase;
    use std::path::PathBuf;

    #[test]
    fn view_starts_not_ready() {
        let view = MapView::new(ViewerConfig::default()).expect("view init failed");

        assert!(!view.is_ready());
        assert!(view.base_map().is_none());
        assert!(matches!(view.surface(), Err(AppError::ViewNotReady(_))));
    }

    #[tokio::test]
    async fn missing_base_map_is_a_view_level_error() {
        let mut view = MapView::new(ViewerConfig {
            asset_base: AssetBase::Dir(PathBuf::from("/definitely/not/here")),
            ..ViewerConfig::default()
        })
        .expect("view init failed");

        let result = view.load_base_map().await;

        assert!(matches!(result, Err(AppError::Overlay(_))));
        assert!(!view.is_ready());
    }

    #[tokio::test]
    async fn overlay_operations_require_loaded_base_map() {
        let mut view = MapView::new(ViewerConfig::default()).expect("view init failed");

        let result = view
            .apply_filter(FilterSelection {
                year: Some(2022),
                month: None,
                elemental_ratio: None,
                is_overlapping: false,
            })
            .await;

        assert!(matches!(result, Err(AppError::ViewNotReady(_))));
    }
}
