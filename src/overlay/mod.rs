//! # 叠加层流水线模块（overlay）
//!
//! ## 设计思路
//!
//! 该模块将“筛选条件派生 → 来源解析 → 加载校验 → 解码 → 抠色 → 合成”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `selection`：筛选条件与资源路径派生（纯函数）
//! - `entries`：上传结果条目（比值键 → 内联图源）与查找规则
//! - `config`：资源基址与加载阈值配置
//! - `loader`：负责 URL/Base64/文件加载与安全校验、解码为 RGBA
//! - `chroma`：抠色（键色像素置全透明）
//! - `compositor`：合成表面（清空 + source-over 绘制）
//! - `controller`：编排整条流水线并处理过期加载竞态
//! - `error/source`：错误与中间数据模型
//!
//! ## 实现思路
//!
//! 对外仅暴露必要类型，内部细节保持 `mod` 私有。
//! 嵌入方通常不直接使用本模块，而是通过 `map_view::MapView` 驱动。
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! 筛选条件 / 比值选择变化
//!    ↓
//! controller.rs（派生目标来源 + 签发加载票据）
//!    ├─ selection.rs（路径派生规则）
//!    ├─ entries.rs（内联条目优先查找）
//!    ↓
//! loader.rs（来源加载 + 体积/签名校验 + 解码）
//!    ↓
//! chroma.rs（键色抠除，白色 → 全透明）
//!    ↓
//! controller.rs（提交：票据仍然最新才允许触碰表面）
//!    ↓
//! compositor.rs（清空表面 + 按槽位顺序绘制）
//! ```
//!
//! ## 分层职责建议
//!
//! - 路径规则变更优先改 `selection.rs`
//! - 配置与阈值变更优先改 `config.rs`
//! - 状态机与竞态语义变更优先改 `controller.rs`
//! - 单阶段行为优化分别改 `loader/chroma/compositor`

mod chroma;
mod compositor;
mod config;
mod controller;
mod entries;
mod error;
mod loader;
mod selection;
mod source;

pub use chroma::{apply_chroma_key, DEFAULT_KEY_COLOR};
pub use compositor::CompositeSurface;
pub use config::{AssetBase, LoaderConfig, ViewerConfig};
pub use controller::{CommitOutcome, ControllerState, LayerSlot, LoadTicket, OverlayController};
pub use entries::{find_entry_source, OverlayEntry};
pub use error::OverlayError;
pub use loader::ImageLoader;
pub use selection::{ElementalRatio, FilterSelection, Month, OVERLAY_IMAGE_EXT};
pub use source::{ImageSource, RasterImage};
