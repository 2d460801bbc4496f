//! # 上传客户端模块
//!
//! ## 设计思路
//!
//! 以 multipart 形式向处理服务提交一批 FITS 文件与可选的背景文件：
//! 主文件重复使用 `files` 字段，背景文件使用 `backgroundFile` 字段。
//! 空的主文件集在发起任何网络请求之前就被拒绝。
//!
//! ## 实现思路
//!
//! - 复用型 HTTP 客户端在构建时创建一次，带连接与整体请求超时。
//! - 非成功状态码优先解析服务端的 `{"error": "..."}` 文案，
//!   解析不出来时回退为原始响应体。
//! - FITS 内容按不透明二进制处理，不做任何格式解析。

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use super::response::UploadResponse;
use super::UploadError;

/// 一个待上传的 FITS 文件：文件名 + 不透明字节。
#[derive(Debug, Clone)]
pub struct FitsFile {
    pub name: String,
    pub bytes: Bytes,
}

impl FitsFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// 从本地路径读取文件内容。
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                UploadError::FileSystem(format!("路径缺少文件名：{}", path.display()))
            })?;

        let bytes = std::fs::read(path)
            .map_err(|e| UploadError::FileSystem(format!("无法读取 FITS 文件：{}", e)))?;

        Ok(Self::new(name, bytes))
    }
}

/// 上传客户端配置。
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// 单次上传整体超时时间（秒）。
    pub request_timeout: u64,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            request_timeout: 120,
            connect_timeout: 8,
        }
    }
}

/// 上传服务客户端。
pub struct UploadClient {
    base_url: String,
    client: reqwest::Client,
}

impl UploadClient {
    /// 创建客户端。
    ///
    /// `base_url` 形如 `http://localhost:5000`，上传端点固定为 `/upload`。
    pub fn new(base_url: impl Into<String>, config: UploadConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .map_err(|e| UploadError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// 提交一批 FITS 文件与可选背景文件，返回解析后的响应。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use lunar_heatmap::upload::{FitsFile, UploadClient, UploadConfig};
    ///
    /// # async fn demo() -> Result<(), lunar_heatmap::upload::UploadError> {
    /// let client = UploadClient::new("http://localhost:5000", UploadConfig::default())?;
    /// let response = client
    ///     .upload(&[FitsFile::new("ch2_cla_l1.fits", vec![0u8; 16])], None)
    ///     .await?;
    /// let entries = response.overlay_entries();
    /// # let _ = entries;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn upload(
        &self,
        files: &[FitsFile],
        background: Option<&FitsFile>,
    ) -> Result<UploadResponse, UploadError> {
        if files.is_empty() {
            return Err(UploadError::EmptySubmission);
        }

        let mut form = Form::new();
        for file in files {
            form = form.part("files", Self::file_part(file));
        }
        if let Some(file) = background {
            form = form.part("backgroundFile", Self::file_part(file));
        }

        let url = format!("{}/upload", self.base_url);
        log::info!(
            "📤 开始上传 FITS 文件 - 数量: {} 背景文件: {}",
            files.len(),
            background.is_some()
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Service {
                status: status.as_u16(),
                message: Self::extract_service_message(&body),
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Parse(format!("响应不是预期的 JSON 结构：{}", e)))?;

        log::info!(
            "✅ 上传完成 - 热图条目: {} 文件路径: {}",
            parsed.overlay_entries().len(),
            parsed.file_paths.len()
        );

        Ok(parsed)
    }

    /// 以确定长度的 part 构造文件分片，保证请求带 Content-Length。
    fn file_part(file: &FitsFile) -> Part {
        Part::bytes(file.bytes.to_vec()).file_name(file.name.clone())
    }

    /// 非成功响应优先取服务端的 `error` 字段文案。
    fn extract_service_message(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("error")
                    .and_then(|error| error.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    "服务端未返回错误详情".to_string()
                } else {
                    trimmed.to_string()
                }
            })
    }

    fn map_reqwest_error(e: reqwest::Error) -> UploadError {
        if e.is_timeout() {
            UploadError::Timeout(e.to_string())
        } else if e.is_connect() {
            UploadError::Network(format!("无法连接上传服务：{}", e))
        } else {
            UploadError::Network(format!("上传请求失败：{}", e))
        }
    }
}
