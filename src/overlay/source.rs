//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将"外部输入类型"和"流水线中间结果"解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageBytes` 表示已加载但未解码的字节
//! - `RasterImage` 表示解码完成、可参与抠色与合成的 RGBA 位图

use std::path::PathBuf;

use image::RgbaImage;

/// 图片输入来源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// 网络地址来源。
    Url(String),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 本地文件路径来源。
    FilePath(PathBuf),
}

impl ImageSource {
    /// 识别内联图源字符串。
    ///
    /// 上传服务返回的条目既可能是 Data URL，也可能是可直接抓取的网络地址，
    /// 这里按前缀归类，其余一律按 Base64 处理。
    pub fn from_inline(payload: &str) -> Self {
        let trimmed = payload.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Self::Url(trimmed.to_string());
        }

        Self::Base64(trimmed.to_string())
    }

    /// 来源标识，用于日志与诊断。
    pub(crate) fn hint(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Base64(_) => "base64",
            Self::FilePath(_) => "file",
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageBytes {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 解码阶段输出：RGBA 位图及其来源标签。
///
/// 解码完成后内容不再变化；抠色阶段总是产出新的 `RasterImage`，
/// 不会原地修改输入。
#[derive(Debug, Clone)]
pub struct RasterImage {
    label: String,
    data: RgbaImage,
}

impl RasterImage {
    pub(crate) fn new(label: String, data: RgbaImage) -> Self {
        Self { label, data }
    }

    /// 图像宽度（像素）。
    pub fn width(&self) -> u32 {
        self.data.width()
    }

    /// 图像高度（像素）。
    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// 来源标签（脱敏后的 URL、文件路径或 `base64`）。
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 只读访问底层 RGBA 数据。
    pub fn as_rgba8(&self) -> &RgbaImage {
        &self.data
    }

    /// 取出底层 RGBA 数据。
    pub fn into_rgba8(self) -> RgbaImage {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_classifier_recognizes_http_url() {
        let source = ImageSource::from_inline("  https://example.com/Mg_Si.png ");

        assert!(matches!(source, ImageSource::Url(url) if url == "https://example.com/Mg_Si.png"));
    }

    #[test]
    fn inline_classifier_defaults_to_base64() {
        let source = ImageSource::from_inline("data:image/png;base64,QUJD");

        assert!(matches!(source, ImageSource::Base64(_)));
    }
}
