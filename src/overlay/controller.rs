//! # 叠加层控制器模块
//!
//! ## 设计思路
//!
//! `OverlayController` 只负责流程编排与状态维护，不直接执行像素操作。
//! 单个选择周期的链路固定为：
//! 1. 选择变化时派生目标来源，签发带标签的加载票据
//! 2. 解析阶段（纯读）：加载 + 抠色，全部在表面之外完成
//! 3. 提交阶段：重新派生并比对标签，仍然最新才允许触碰表面
//!
//! ## 实现思路
//!
//! - 表面上有两个图层槽位：周期叠加图（年/月/比值/叠加）与比值叠加图。
//!   每个槽位最多持有一个已绘制图层；任何一次重绘都从清空的表面开始，
//!   先画周期层、再画比值层，不会残留上一周期的像素。
//! - 竞态处理不依赖加载器取消：票据在签发时记录派生结果，
//!   提交时与"当前派生结果"比对，不一致即静默丢弃（记 debug 日志）。
//!   每个周期只有一条提交链能触碰表面，被淘汰的链在触碰前就被丢弃。
//! - 加载失败时表面保持不动，上一次成功的叠加图继续可见。
//! - 解析阶段取 `&self`、提交阶段取 `&mut self`，便于在测试中
//!   以任意顺序交错多个在途周期，精确复现竞态时序。

use std::sync::Arc;

use image::Rgb;

use super::chroma::apply_chroma_key;
use super::compositor::CompositeSurface;
use super::config::AssetBase;
use super::entries::{find_entry_source, OverlayEntry};
use super::loader::ImageLoader;
use super::selection::{ElementalRatio, FilterSelection};
use super::source::{ImageSource, RasterImage};
use super::OverlayError;

/// 控制器状态。
///
/// 状态迁移见模块文档；`Error` 状态下表面仍保留上一次成功的内容。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// 无选择或选择不完整，表面上没有任何图层。
    Idle,
    /// 已派生来源，加载在途。
    Loading,
    /// 表面内容与当前选择一致。
    Ready,
    /// 当前选择的加载或解码失败，表面保留上一次成功内容。
    Error,
}

/// 图层槽位。
///
/// 表面持有的两类叠加图分别占用一个槽位，互不覆盖对方的生命周期。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSlot {
    /// 周期叠加图（年 + 月 + 比值 + 是否叠加）。
    Filter,
    /// 比值叠加图（仅比值，内联条目优先）。
    Ratio,
}

/// 一次派生的加载请求：槽位 + 具体来源。
///
/// 作为票据标签参与过期判断，派生结果相同即视为同一请求。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayRequest {
    slot: LayerSlot,
    source: ImageSource,
}

/// 加载票据。
///
/// 在选择变化时签发，记录签发时刻的派生结果；
/// 提交时若派生结果已变化，该票据作废。
#[derive(Debug, Clone)]
pub struct LoadTicket {
    request: OverlayRequest,
}

impl LoadTicket {
    /// 票据对应的槽位。
    pub fn slot(&self) -> LayerSlot {
        self.request.slot
    }

    /// 票据对应的图片来源。
    pub fn source(&self) -> &ImageSource {
        &self.request.source
    }
}

/// 提交结果。
#[derive(Debug)]
pub enum CommitOutcome {
    /// 结果仍然最新，已绘制到表面。
    Drawn,
    /// 票据已过期，结果被静默丢弃，表面与状态均未变化。
    Stale,
    /// 结果仍然最新但加载失败，表面未被触碰。
    Failed(OverlayError),
}

struct DrawnLayer {
    request: OverlayRequest,
    raster: RasterImage,
}

/// 叠加层选择控制器。
///
/// 持有合成表面与两个图层槽位，响应筛选条件、比值选择与条目集变化，
/// 驱动 加载 → 抠色 → 合成 流水线。
pub struct OverlayController {
    loader: Arc<ImageLoader>,
    asset_base: AssetBase,
    key_color: Rgb<u8>,
    base_size: (u32, u32),
    surface: CompositeSurface,
    selection: FilterSelection,
    ratio: Option<ElementalRatio>,
    entries: Vec<OverlayEntry>,
    filter_layer: Option<DrawnLayer>,
    ratio_layer: Option<DrawnLayer>,
    state: ControllerState,
}

impl OverlayController {
    /// 创建控制器，表面立即对齐底图尺寸。
    pub fn new(
        loader: Arc<ImageLoader>,
        asset_base: AssetBase,
        key_color: Rgb<u8>,
        base_width: u32,
        base_height: u32,
    ) -> Self {
        let mut surface = CompositeSurface::new();
        surface.reset(base_width, base_height);

        Self {
            loader,
            asset_base,
            key_color,
            base_size: (base_width, base_height),
            surface,
            selection: FilterSelection {
                year: None,
                month: None,
                elemental_ratio: None,
                is_overlapping: false,
            },
            ratio: None,
            entries: Vec::new(),
            filter_layer: None,
            ratio_layer: None,
            state: ControllerState::Idle,
        }
    }

    /// 当前状态。
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// 只读访问合成表面。
    pub fn surface(&self) -> &CompositeSurface {
        &self.surface
    }

    /// 当前筛选条件。
    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    /// 当前比值选择。
    pub fn ratio(&self) -> Option<ElementalRatio> {
        self.ratio
    }

    /// 更新筛选条件，必要时签发周期叠加图的加载票据。
    ///
    /// 条件不完整时返回 `None`：周期图层被移除并重绘，
    /// 若两个槽位都为空则转入 `Idle`。
    pub fn set_selection(&mut self, selection: FilterSelection) -> Option<LoadTicket> {
        self.selection = selection;
        self.reissue(LayerSlot::Filter)
    }

    /// 更新比值选择，必要时签发比值叠加图的加载票据。
    pub fn set_ratio(&mut self, ratio: Option<ElementalRatio>) -> Option<LoadTicket> {
        self.ratio = ratio;
        self.reissue(LayerSlot::Ratio)
    }

    /// 整体替换条目集。
    ///
    /// 条目变化可能改变比值槽位的来源（内联条目优先于路径），
    /// 因此按比值槽位重新派生。
    pub fn set_entries(&mut self, entries: Vec<OverlayEntry>) -> Option<LoadTicket> {
        self.entries = entries;
        self.reissue(LayerSlot::Ratio)
    }

    /// 解析票据：加载来源并抠色，产出待提交的位图。
    ///
    /// 该阶段不读写任何控制器状态，多个在途票据可任意交错。
    pub async fn resolve(&self, ticket: &LoadTicket) -> Result<RasterImage, OverlayError> {
        let raster = self.loader.load(&ticket.request.source).await?;
        Ok(apply_chroma_key(&raster, self.key_color))
    }

    /// 提交解析结果。
    ///
    /// 先重新派生票据槽位的当前请求并与票据标签比对；
    /// 不一致说明选择在加载期间又变化了，结果被静默丢弃。
    /// 比对通过后：成功则清空重绘（先周期层、后比值层），
    /// 失败则保持表面不动并转入 `Error`。
    pub fn commit(
        &mut self,
        ticket: LoadTicket,
        result: Result<RasterImage, OverlayError>,
    ) -> CommitOutcome {
        let current = self.derive_request(ticket.request.slot);
        if current.as_ref() != Some(&ticket.request) {
            log::debug!(
                "🗑️ 丢弃过期加载结果 - 槽位: {:?} 来源: {:?}",
                ticket.request.slot,
                ticket.request.source
            );
            return CommitOutcome::Stale;
        }

        match result {
            Ok(raster) => {
                let slot = ticket.request.slot;
                *self.layer_mut(slot) = Some(DrawnLayer {
                    request: ticket.request,
                    raster,
                });
                self.redraw();
                self.state = ControllerState::Ready;

                log::info!("✅ 叠加图已提交 - 槽位: {:?}", slot);
                CommitOutcome::Drawn
            }
            Err(error) => {
                log::warn!(
                    "⚠️ 叠加图加载失败，保留上一次成功内容 - 槽位: {:?} 原因: {}",
                    ticket.request.slot,
                    error
                );
                self.state = ControllerState::Error;
                CommitOutcome::Failed(error)
            }
        }
    }

    /// 解析并提交票据的便捷入口。
    pub async fn run(&mut self, ticket: LoadTicket) -> CommitOutcome {
        let result = self.resolve(&ticket).await;
        self.commit(ticket, result)
    }

    /// 按槽位重新派生请求，决定签发票据还是移除该槽位图层。
    fn reissue(&mut self, slot: LayerSlot) -> Option<LoadTicket> {
        match self.derive_request(slot) {
            Some(request) => {
                self.state = ControllerState::Loading;
                Some(LoadTicket { request })
            }
            None => {
                if self.layer_mut(slot).take().is_some() {
                    self.redraw();
                }
                self.state = if self.filter_layer.is_some() || self.ratio_layer.is_some() {
                    ControllerState::Ready
                } else {
                    ControllerState::Idle
                };
                None
            }
        }
    }

    /// 派生槽位的当前请求。
    ///
    /// - 周期槽位：筛选条件完整时由路径规则派生，否则无请求。
    /// - 比值槽位：有内联条目则优先使用（首个命中生效），
    ///   否则回退到比值路径；未选比值则无请求。
    fn derive_request(&self, slot: LayerSlot) -> Option<OverlayRequest> {
        match slot {
            LayerSlot::Filter => {
                let path = self.selection.overlay_path()?;
                Some(OverlayRequest {
                    slot,
                    source: self.asset_base.resolve(&path),
                })
            }
            LayerSlot::Ratio => {
                let ratio = self.ratio?;
                let source = match find_entry_source(&self.entries, ratio.entry_key()) {
                    Some(inline) => ImageSource::from_inline(inline),
                    None => self.asset_base.resolve(&ratio.overlay_path()),
                };
                Some(OverlayRequest { slot, source })
            }
        }
    }

    fn layer_mut(&mut self, slot: LayerSlot) -> &mut Option<DrawnLayer> {
        match slot {
            LayerSlot::Filter => &mut self.filter_layer,
            LayerSlot::Ratio => &mut self.ratio_layer,
        }
    }

    /// 清空表面并按槽位顺序重绘仍然有效的图层。
    ///
    /// 每个周期最多一次 `reset`，且总在绘制之前。
    fn redraw(&mut self) {
        let (width, height) = self.base_size;
        self.surface.reset(width, height);

        if let Some(layer) = &self.filter_layer {
            self.surface.draw_layer(&layer.raster, 0, 0);
        }
        if let Some(layer) = &self.ratio_layer {
            self.surface.draw_layer(&layer.raster, 0, 0);
        }
    }
}
