//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（URL / Base64 / 本地文件）的原始字节加载，并在"尽可能早"的阶段执行输入校验。
//! 目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! 单次加载只尝试一次，失败立即上报调用方；是否因选择已变更而丢弃结果，
//! 由控制器在提交阶段判断，加载器本身不做取消与重试。
//!
//! ## 实现思路
//!
//! - URL：协议校验 + 内容类型 + 体积校验 + 流式下载 + 签名探测。
//! - Base64：格式解析 + 解码前后体积限制。
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - 解码：先读 header 尺寸做像素/内存限制，再完整解码为 RGBA。
//! - 重复的 URL 抓取走 LRU 字节缓存（带 TTL），不改变首次加载的成败语义。

use std::io::Cursor;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose, Engine as _};
use image::{GenericImageView, ImageReader};
use lru::LruCache;

use super::config::LoaderConfig;
use super::source::{ImageSource, RasterImage, RawImageBytes};
use super::OverlayError;

const STREAM_SIGNATURE_PROBE_BYTES: usize = 4096;
const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

/// 图片加载器。
///
/// 封装 HTTP 客户端、加载配置与下载缓存；无内部可变状态跨请求泄漏，
/// 同一实例可被多个在途加载并发使用。
pub struct ImageLoader {
    config: LoaderConfig,
    client: reqwest::Client,
    download_cache: Mutex<LruCache<String, CachedDownload>>,
}

struct CachedDownload {
    created_at: Instant,
    bytes: Vec<u8>,
}

impl ImageLoader {
    /// 根据配置创建加载器。
    ///
    /// 这里同时构建复用型 HTTP 客户端，减少每次请求的初始化开销。
    pub fn new(config: LoaderConfig) -> Result<Self, OverlayError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .map_err(|e| OverlayError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

        let capacity = NonZeroUsize::new(config.cache_max_entries).ok_or_else(|| {
            OverlayError::InvalidFormat("cache_max_entries 至少为 1".to_string())
        })?;

        Ok(Self {
            config,
            client,
            download_cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// 加载并解码任意来源的图片。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use lunar_heatmap::overlay::{ImageLoader, ImageSource, LoaderConfig};
    ///
    /// # async fn demo() -> Result<(), lunar_heatmap::overlay::OverlayError> {
    /// let loader = ImageLoader::new(LoaderConfig::default())?;
    /// let raster = loader
    ///     .load(&ImageSource::FilePath("assets/lunarMap.png".into()))
    ///     .await?;
    /// assert!(raster.width() > 0);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load(&self, source: &ImageSource) -> Result<RasterImage, OverlayError> {
        let label = Self::source_label(source);

        let raw = match source {
            ImageSource::Url(url) => self.load_from_url(url).await?,
            ImageSource::Base64(data) => self.load_from_base64(data)?,
            ImageSource::FilePath(path) => self.load_from_file(path)?,
        };

        self.decode_raster(raw, label)
    }

    /// 从 URL 加载图片原始字节。
    async fn load_from_url(&self, url: &str) -> Result<RawImageBytes, OverlayError> {
        log::info!("🌐 开始下载图片 - URL: {}", Self::redact_url_for_log(url));

        let bytes = self.download_with_validation(url).await?;

        Ok(RawImageBytes {
            bytes,
            source_hint: "url",
        })
    }

    /// 从 Base64 字符串加载图片原始字节。
    fn load_from_base64(&self, data: &str) -> Result<RawImageBytes, OverlayError> {
        log::info!("📝 开始处理 base64 图片");

        let bytes = Self::parse_base64_with_limit(data, self.config.max_file_size)?;

        if bytes.len() as u64 > self.config.max_file_size {
            return Err(OverlayError::ResourceLimit(format!(
                "Base64 解码后体积过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                self.config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageBytes {
            bytes,
            source_hint: "base64",
        })
    }

    /// 从本地路径加载图片原始字节。
    fn load_from_file(&self, path: &Path) -> Result<RawImageBytes, OverlayError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(OverlayError::FileSystem(format!(
                "文件不存在：{}",
                path.display()
            )));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| OverlayError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if metadata.len() > self.config.max_file_size {
            return Err(OverlayError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                self.config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| OverlayError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageBytes {
            bytes,
            source_hint: "file",
        })
    }

    /// 执行带校验的网络下载。
    ///
    /// 使用流式读取，避免一次性读入导致内存峰值过高。
    async fn download_with_validation(&self, url: &str) -> Result<Vec<u8>, OverlayError> {
        let parsed = Self::validate_url_scheme(url)?;
        let normalized = parsed.to_string();

        if let Some(cached) = self.get_cached_download(&normalized) {
            log::debug!(
                "♻️ 命中下载缓存 - URL: {}",
                Self::redact_url_for_log(&normalized)
            );
            return Ok(cached);
        }

        log::debug!("📡 发送 HTTP 请求...");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e, &normalized))?;

        if !response.status().is_success() {
            return Err(OverlayError::Network(format!(
                "HTTP {}: {}",
                response.status().as_u16(),
                Self::status_message(response.status().as_u16())
            )));
        }

        if let Some(ct) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            if let Ok(ct_str) = ct.to_str() {
                if !Self::is_image_content_type(ct_str) {
                    return Err(OverlayError::InvalidFormat(format!(
                        "不是图片类型：{}",
                        ct_str
                    )));
                }
            }
        }

        let total_len = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|cl| cl.to_str().ok())
            .and_then(|cl| cl.parse::<u64>().ok());

        if let Some(size) = total_len {
            if size > self.config.max_file_size {
                return Err(OverlayError::ResourceLimit(format!(
                    "文件过大：{:.2} MB（限制：{:.2} MB）",
                    size as f64 / 1024.0 / 1024.0,
                    self.config.max_file_size as f64 / 1024.0 / 1024.0
                )));
            }
        }

        let initial_capacity = total_len
            .map(|len| len.min(self.config.max_file_size).min(usize::MAX as u64) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);
        let mut total: u64 = 0;
        let mut response = response;
        let mut signature_validated = false;
        let mut received_first_chunk = false;

        loop {
            let read_timeout = if received_first_chunk {
                Duration::from_millis(self.config.stream_chunk_timeout_ms)
            } else {
                Duration::from_millis(self.config.stream_first_byte_timeout_ms)
            };

            let next_chunk_result = tokio::time::timeout(read_timeout, response.chunk())
                .await
                .map_err(|_| {
                    if received_first_chunk {
                        OverlayError::Timeout("下载数据流读取超时".to_string())
                    } else {
                        OverlayError::Timeout("下载首包超时".to_string())
                    }
                })?;

            let Some(chunk) = next_chunk_result
                .map_err(|e| OverlayError::Network(format!("下载失败：{}", e)))?
            else {
                break;
            };

            received_first_chunk = true;

            total = total.saturating_add(chunk.len() as u64);
            if total > self.config.max_file_size {
                return Err(OverlayError::ResourceLimit(
                    "下载后文件超过大小限制".to_string(),
                ));
            }
            buffer.extend_from_slice(&chunk);

            if !signature_validated {
                signature_validated =
                    Self::validate_stream_signature_probe(&buffer, STREAM_SIGNATURE_PROBE_BYTES)?;
            }
        }

        if !signature_validated {
            Self::validate_image_signature(&buffer)?;
        }

        log::debug!("✅ 下载完成 - {} bytes", total);

        self.store_download_cache(&normalized, &buffer);
        Ok(buffer)
    }

    /// 将原始字节解码为 RGBA 位图。
    ///
    /// 优先通过 header 尺寸做限制检查，再进行完整解码，
    /// 降低恶意输入触发高内存开销的风险。
    fn decode_raster(
        &self,
        raw: RawImageBytes,
        label: String,
    ) -> Result<RasterImage, OverlayError> {
        image::guess_format(&raw.bytes)
            .map_err(|e| OverlayError::InvalidFormat(format!("不支持的图片格式：{}", e)))?;

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        self.validate_pixel_limits(header_width, header_height)?;
        self.validate_decoded_memory_limits(header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| OverlayError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        self.validate_pixel_limits(width, height)?;
        self.validate_decoded_memory_limits(width, height)?;

        let rgba = decoded.to_rgba8();

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| {
                OverlayError::ResourceLimit("图片尺寸导致内存溢出风险".to_string())
            })?;

        if rgba.as_raw().len() != expected_len {
            return Err(OverlayError::Decode("解码后像素数据长度异常".to_string()));
        }

        log::info!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
            raw.source_hint,
            width,
            height
        );

        Ok(RasterImage::new(label, rgba))
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), OverlayError> {
        let cursor = Cursor::new(bytes);
        let reader = ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| OverlayError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| OverlayError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(&self, width: u32, height: u32) -> Result<(), OverlayError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| OverlayError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > self.config.max_decoded_pixels {
            return Err(OverlayError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(&self, width: u32, height: u32) -> Result<(), OverlayError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| OverlayError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > self.config.max_decoded_bytes {
            return Err(OverlayError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                self.config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    fn source_label(source: &ImageSource) -> String {
        match source {
            ImageSource::Url(url) => Self::redact_url_for_log(url),
            ImageSource::Base64(_) => "base64".to_string(),
            ImageSource::FilePath(path) => path.display().to_string(),
        }
    }

    fn validate_url_scheme(url: &str) -> Result<reqwest::Url, OverlayError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| OverlayError::InvalidFormat(format!("URL 格式错误：{}", e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(OverlayError::InvalidFormat("仅支持 HTTP/HTTPS".to_string()));
        }

        Ok(parsed)
    }

    fn is_image_content_type(content_type: &str) -> bool {
        content_type
            .split(';')
            .next()
            .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }

    fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = parsed.path();

        format!("{}://{}{}{}", parsed.scheme(), host, port, path)
    }

    fn get_cached_download(&self, url: &str) -> Option<Vec<u8>> {
        let mut cache = self.download_cache.lock().ok()?;
        let ttl = Duration::from_secs(self.config.cache_ttl_secs);

        let expired = match cache.get(url) {
            Some(item) => {
                if item.created_at.elapsed() <= ttl {
                    return Some(item.bytes.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            cache.pop(url);
        }

        None
    }

    fn store_download_cache(&self, url: &str, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let Ok(mut cache) = self.download_cache.lock() else {
            return;
        };

        cache.put(
            url.to_string(),
            CachedDownload {
                created_at: Instant::now(),
                bytes: bytes.to_vec(),
            },
        );
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, OverlayError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| OverlayError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| OverlayError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    /// 解析 Base64 输入（支持 Data URL / 纯 Base64），解码前按估算体积拦截超限输入。
    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, OverlayError> {
        let normalized = data.trim();

        if normalized.starts_with("data:image/") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| OverlayError::InvalidFormat("缺少 base64 标记".to_string()))?;
            let base64_data = &normalized[base64_start + 8..];
            let estimated_len = Self::estimate_base64_decoded_upper_bound_len(base64_data)?;

            if estimated_len > max_file_size {
                return Err(OverlayError::ResourceLimit(format!(
                    "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                    estimated_len as f64 / 1024.0 / 1024.0,
                    max_file_size as f64 / 1024.0 / 1024.0
                )));
            }

            return general_purpose::STANDARD
                .decode(base64_data)
                .map_err(|e| OverlayError::Decode(format!("Base64 解码失败：{}", e)));
        }

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(normalized)?;
        if estimated_len > max_file_size {
            return Err(OverlayError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(normalized)
            .map_err(|e| OverlayError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 统一映射 reqwest 错误到业务错误。
    fn map_reqwest_error(&self, e: reqwest::Error, url: &str) -> OverlayError {
        let err_msg = Self::sanitize_error_message_with_redacted_url(&e.to_string(), url);

        if e.is_timeout() {
            OverlayError::Timeout(format!("下载超时（{}秒）", self.config.download_timeout))
        } else if e.is_connect() {
            OverlayError::Network(format!("无法连接：{}", err_msg))
        } else {
            OverlayError::Network(format!("请求失败：{}", err_msg))
        }
    }

    fn sanitize_error_message_with_redacted_url(error_msg: &str, url: &str) -> String {
        let redacted = Self::redact_url_for_log(url);
        error_msg.replace(url, &redacted)
    }

    /// 常见 HTTP 状态码本地化文案。
    fn status_message(code: u16) -> &'static str {
        match code {
            404 => "未找到",
            403 => "访问被拒绝",
            500..=599 => "服务器错误",
            _ => "请求失败",
        }
    }

    /// 通过文件签名（magic bytes）校验输入是否为图片。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), OverlayError> {
        if bytes.is_empty() {
            return Err(OverlayError::InvalidFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| OverlayError::InvalidFormat("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(OverlayError::InvalidFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }

    /// 流式下载阶段的签名探测：尽早识别并拒绝非图片内容。
    ///
    /// 返回值：
    /// - `Ok(true)`：已识别为图片，可视为完成签名校验
    /// - `Ok(false)`：当前字节不足以判断，继续下载
    /// - `Err(...)`：已识别为非图片，或达到探测上限仍无法识别
    fn validate_stream_signature_probe(
        bytes: &[u8],
        probe_limit: usize,
    ) -> Result<bool, OverlayError> {
        if bytes.is_empty() {
            return Ok(false);
        }

        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(OverlayError::InvalidFormat(format!(
                    "下载内容不是图片类型：{}",
                    kind.mime_type()
                )));
            }
            return Ok(true);
        }

        if bytes.len() >= probe_limit {
            return Err(OverlayError::InvalidFormat(format!(
                "下载前 {} 字节内无法识别图片类型",
                probe_limit
            )));
        }

        Ok(false)
    }
}
