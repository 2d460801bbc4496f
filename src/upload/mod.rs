//! # 上传客户端模块（upload）
//!
//! ## 设计思路
//!
//! 远端处理服务接收 FITS 仪器文件并生成热图，本模块只实现它的客户端：
//! multipart 提交、响应解析、以及把响应转换为叠加条目与元素目录记录。
//!
//! - `client`：multipart 提交与 HTTP 错误映射
//! - `response`：响应数据模型与两类转换（叠加条目 / 目录记录）
//! - `error`：上传链路错误分类
//!
//! ## 实现思路
//!
//! 上传与叠加层选择是两条相互独立的流水线：上传失败只上报调用方，
//! 不触碰控制器的任何状态；上传成功后的条目由嵌入方通过
//! `OverlayController::set_entries` 注入。

mod client;
mod error;
mod response;

pub use client::{FitsFile, UploadClient, UploadConfig};
pub use error::UploadError;
pub use response::UploadResponse;
