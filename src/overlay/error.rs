//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载叠加层链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 加载类错误（网络、文件、超时、资源限制、格式）与解码类错误分开建模：
//! 前者表示"字节没拿到或不可信"，后者表示"字节拿到了但不是合法图片"。

/// 叠加层流水线统一错误类型。
///
/// 该类型会在视图层被上转为 `AppError`，最终透传给嵌入方。
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}

impl From<OverlayError> for String {
    /// 兼容部分仍使用字符串错误的调用点。
    fn from(error: OverlayError) -> Self {
        error.to_string()
    }
}
