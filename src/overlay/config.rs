//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有"可调策略"集中到 `ViewerConfig`，保证运行时行为可观测、可调整、可测试。
//! 资源定位（HTTP 服务 / 本地目录）作为高层语义放在 `AssetBase`，
//! 加载阶段的体积与超时阈值集中在 `LoaderConfig`。
//!
//! ## 实现思路
//!
//! - `Default` 提供可直接使用的保守配置（本地目录 + 常规限额）。
//! - `AssetBase::resolve` 把派生出的相对资源路径翻译成可加载的 `ImageSource`。
//! - `LoaderConfig::validate` 在构建加载器时一次性拒绝无效阈值。

use std::path::PathBuf;

use image::Rgb;

use super::chroma::DEFAULT_KEY_COLOR;
use super::source::ImageSource;
use super::OverlayError;

/// 资源基址：派生路径最终从哪里加载。
///
/// 叠加图与底图都以 `/2022/mar/Mg_Si_overlapped.png` 这类相对路径描述，
/// 由资源基址决定走网络还是本地文件系统。
#[derive(Debug, Clone)]
pub enum AssetBase {
    /// 静态资源服务地址，如 `http://localhost:3000`。
    Http(String),
    /// 本地资源目录。
    Dir(PathBuf),
}

impl AssetBase {
    /// 将相对资源路径解析为具体图片来源。
    ///
    /// # 示例
    /// ```rust
    /// use lunar_heatmap::overlay::{AssetBase, ImageSource};
    ///
    /// let base = AssetBase::Http("http://localhost:3000".to_string());
    /// let source = base.resolve("/lunarMap.png");
    /// assert!(matches!(source, ImageSource::Url(url) if url == "http://localhost:3000/lunarMap.png"));
    /// ```
    pub fn resolve(&self, asset_path: &str) -> ImageSource {
        match self {
            AssetBase::Http(base) => ImageSource::Url(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                asset_path.trim_start_matches('/')
            )),
            AssetBase::Dir(dir) => {
                ImageSource::FilePath(dir.join(asset_path.trim_start_matches('/')))
            }
        }
    }
}

/// 图片加载配置。
///
/// 字段覆盖了下载、解码与缓存三个阶段。
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// 下载/读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 网络下载超时时间（秒）。
    pub download_timeout: u64,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout: u64,
    /// 下载首包超时时间（毫秒）。
    pub stream_first_byte_timeout_ms: u64,
    /// 下载分块读取超时时间（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 下载字节缓存条目上限。
    pub cache_max_entries: usize,
    /// 下载字节缓存存活时间（秒）。
    pub cache_ttl_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            stream_first_byte_timeout_ms: 10_000,
            stream_chunk_timeout_ms: 15_000,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            cache_max_entries: 24,
            cache_ttl_secs: 25,
        }
    }
}

impl LoaderConfig {
    /// 校验阈值组合是否可用。
    ///
    /// 在加载器构建时调用一次，避免运行中才暴露配置错误。
    pub(crate) fn validate(&self) -> Result<(), OverlayError> {
        if self.max_file_size == 0 {
            return Err(OverlayError::InvalidFormat(
                "max_file_size 不能为 0".to_string(),
            ));
        }
        if !(1..=120).contains(&self.download_timeout) {
            return Err(OverlayError::InvalidFormat(
                "download_timeout 必须在 1~120 秒之间".to_string(),
            ));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(OverlayError::InvalidFormat(
                "connect_timeout 必须在 1~120 秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_first_byte_timeout_ms) {
            return Err(OverlayError::InvalidFormat(
                "stream_first_byte_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_chunk_timeout_ms) {
            return Err(OverlayError::InvalidFormat(
                "stream_chunk_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if self.max_decoded_pixels == 0 || self.max_decoded_bytes == 0 {
            return Err(OverlayError::InvalidFormat(
                "解码像素与内存上限不能为 0".to_string(),
            ));
        }
        if self.cache_max_entries == 0 {
            return Err(OverlayError::InvalidFormat(
                "cache_max_entries 至少为 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// 视图整体配置。
///
/// `MapView` 与 `OverlayController` 均从这里读取策略。
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// 资源基址。
    pub asset_base: AssetBase,
    /// 底图相对路径。
    pub base_map_path: String,
    /// 抠色键色（命中的像素被置为全透明）。
    pub key_color: Rgb<u8>,
    /// 加载阶段配置。
    pub loader: LoaderConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_base: AssetBase::Dir(PathBuf::from("assets")),
            base_map_path: "/lunarMap.png".to_string(),
            key_color: DEFAULT_KEY_COLOR,
            loader: LoaderConfig::default(),
        }
    }
}
