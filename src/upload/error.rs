//! # 上传错误模块
//!
//! ## 设计思路
//!
//! 区分"请求没发出去 / 没收到响应"（网络、超时、文件）与
//! "服务端明确拒绝"（非成功状态码 + 错误文案）两类失败，
//! 调用侧可按分支决定是提示重试还是展示服务端消息。

/// 上传链路统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("上传超时：{0}")]
    Timeout(String),

    #[error("服务端错误（HTTP {status}）：{message}")]
    Service { status: u16, message: String },

    #[error("响应解析失败：{0}")]
    Parse(String),

    #[error("未选择任何 FITS 文件")]
    EmptySubmission,

    #[error("文件错误：{0}")]
    FileSystem(String),
}

impl From<UploadError> for String {
    fn from(error: UploadError) -> Self {
        error.to_string()
    }
}
