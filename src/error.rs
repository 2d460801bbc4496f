//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，替代各模块中分散的
//! `.map_err(|e| e.to_string())`、`format!(...)`、`expect()` 等不一致模式。
//!
//! 视图层对外的操作统一返回 `Result<T, AppError>`，
//! 嵌入方通过 `Serialize` 获得结构化的错误信息。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `OverlayError` 与 `UploadError` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于跨边界透传给嵌入 UI。

use serde::Serialize;

use crate::overlay::OverlayError;
use crate::upload::UploadError;

/// 应用级统一错误类型
///
/// 视图层所有对外操作均返回此类型，确保嵌入方收到一致的错误格式。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 叠加层流水线错误（加载 / 解码 / 合成）
    #[error("{0}")]
    Overlay(#[from] OverlayError),

    /// 上传链路错误（提交 / 服务端拒绝 / 响应解析）
    #[error("{0}")]
    Upload(#[from] UploadError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 底图尚未加载完成，视图未就绪
    #[error("视图未就绪: {0}")]
    ViewNotReady(String),
}

/// 将错误序列化为人类可读的字符串，便于嵌入方直接展示。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
