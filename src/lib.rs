//! # 月面元素浓度热图查看器核心 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  嵌入方 UI（外部协作者）                   │
//! │                                                          │
//! │  底图背景层 ── 筛选表单 ── 上传表单 ── 元素列表            │
//! │       ↕            ↕           ↕          ↕              │
//! └───────┼────────────┼───────────┼──────────┼──────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            查看器核心 (Rust)                      │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ map_view ─── 底图加载门禁 + 选择变化转发               │
//! │  │                                                       │
//! │  ├─ overlay ──── 派生·加载·抠色·合成 + 竞态丢弃            │
//! │  │   ├─ selection   路径派生规则（纯函数）                 │
//! │  │   ├─ loader      URL/Base64/文件加载与校验              │
//! │  │   ├─ chroma      白色键色 → 全透明                     │
//! │  │   ├─ compositor  清空 + source-over 合成表面            │
//! │  │   └─ controller  状态机 + 过期票据丢弃                  │
//! │  │                                                       │
//! │  ├─ upload ───── FITS multipart 提交 + 响应转换            │
//! │  └─ catalog ──── 元素记录集合（内置 + 上传追加）            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，视图层对外操作的返回类型 |
//! | [`map_view`] | 视图门面：底图加载决定就绪状态，转发选择变化 |
//! | [`overlay`] | 叠加层流水线：派生 → 加载 → 抠色 → 合成，含竞态丢弃 |
//! | [`upload`] | 上传服务客户端：multipart 提交、响应解析与转换 |
//! | [`catalog`] | 元素热图记录集合，内置演示记录 + 上传追加记录 |

pub mod catalog;
pub mod error;
pub mod map_view;
pub mod overlay;
pub mod upload;
