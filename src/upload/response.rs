//! # 上传响应模型模块
//!
//! ## 设计思路
//!
//! 服务端成功响应形如：
//!
//! ```json
//! {
//!   "message": "Success",
//!   "heatmap_images": [ { "Mg/Si": "<base64 png>" } ],
//!   "filePaths": [ "uploads/a.fits" ]
//! }
//! ```
//!
//! `filePaths` 在部分服务端版本中缺失，按空列表容忍。
//! 响应向下游提供两类转换：
//! - `overlay_entries`：内联图源条目，注入叠加层控制器
//! - `processed_records`：每个已上传文件对应一条元素目录记录

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::ElementRecord;
use crate::overlay::OverlayEntry;

/// 上传服务的成功响应。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// 服务端提示文案。
    #[serde(default)]
    pub message: String,
    /// 比值键 → Base64 PNG 载荷的有序序列。
    #[serde(default)]
    pub heatmap_images: Vec<BTreeMap<String, String>>,
    /// 已上传文件在服务端的落盘路径（可缺失）。
    #[serde(rename = "filePaths", default)]
    pub file_paths: Vec<String>,
}

impl UploadResponse {
    /// 把热图载荷展平为叠加条目序列。
    ///
    /// 序列顺序保持数组顺序，单个对象内的键按映射迭代顺序展开；
    /// 每个载荷统一补上内联图片声明前缀，供加载器直接识别。
    pub fn overlay_entries(&self) -> Vec<OverlayEntry> {
        self.heatmap_images
            .iter()
            .flat_map(|images| images.iter())
            .map(|(key, payload)| {
                OverlayEntry::new(key.clone(), format!("data:image/png;base64,{}", payload))
            })
            .collect()
    }

    /// 为每个已上传文件生成元素目录记录。
    ///
    /// `source_names` 是提交时的原始文件名，按下标与 `filePaths` 对应；
    /// 浓度统计服务端暂不回传，这里按文件路径确定性合成占位值。
    pub fn processed_records(&self, source_names: &[&str]) -> Vec<ElementRecord> {
        let timestamp = chrono::Utc::now().to_rfc3339();

        self.file_paths
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let source = source_names.get(index).copied().unwrap_or(path.as_str());

                ElementRecord {
                    element: format!("Element_{}", index + 1),
                    name: format!("Element_{}", index + 1),
                    description: format!("Processed from {}", source),
                    url: path.clone(),
                    max_concentration: pseudo_stat(path, 1) * 100.0,
                    min_concentration: pseudo_stat(path, 2) * 50.0,
                    average_concentration: pseudo_stat(path, 3) * 75.0,
                    timestamp: timestamp.clone(),
                }
            })
            .collect()
    }
}

/// 由种子字符串合成 `[0, 1)` 区间的确定性占位数值。
fn pseudo_stat(seed: &str, salt: u64) -> f64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325 ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    for byte in seed.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash % 1000) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> UploadResponse {
        serde_json::from_str(
            r#"{
                "message": "Success",
                "heatmap_images": [ { "Mg/Si": "QUJD", "Al/Si": "REVG" } ],
                "filePaths": ["uploads/a.fits", "uploads/b.fits"]
            }"#,
        )
        .expect("sample response should deserialize")
    }

    #[test]
    fn response_without_file_paths_still_parses() {
        let response: UploadResponse = serde_json::from_str(
            r#"{"message":"Success","heatmap_images":[{"Mg/Si":"QUJD"}]}"#,
        )
        .expect("response without filePaths should deserialize");

        assert_eq!(response.message, "Success");
        assert!(response.file_paths.is_empty());
        assert_eq!(response.overlay_entries().len(), 1);
    }

    #[test]
    fn overlay_entries_carry_inline_image_prefix() {
        let entries = sample_response().overlay_entries();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|entry| entry.key == "Mg/Si"
            && entry.source == "data:image/png;base64,QUJD"));
        assert!(entries.iter().any(|entry| entry.key == "Al/Si"
            && entry.source == "data:image/png;base64,REVG"));
    }

    #[test]
    fn processed_records_follow_file_paths_order() {
        let records = sample_response().processed_records(&["a.fits", "b.fits"]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].element, "Element_1");
        assert_eq!(records[0].description, "Processed from a.fits");
        assert_eq!(records[0].url, "uploads/a.fits");
        assert_eq!(records[1].element, "Element_2");
        assert_eq!(records[1].description, "Processed from b.fits");
    }

    #[test]
    fn processed_records_fall_back_to_path_without_source_name() {
        let records = sample_response().processed_records(&["a.fits"]);

        assert_eq!(records[1].description, "Processed from uploads/b.fits");
    }

    #[test]
    fn pseudo_stats_are_deterministic_and_bounded() {
        let records = sample_response().processed_records(&["a.fits", "b.fits"]);
        let again = sample_response().processed_records(&["a.fits", "b.fits"]);

        for (record, repeat) in records.iter().zip(&again) {
            assert_eq!(record.max_concentration, repeat.max_concentration);
            assert!((0.0..100.0).contains(&record.max_concentration));
            assert!((0.0..50.0).contains(&record.min_concentration));
            assert!((0.0..75.0).contains(&record.average_concentration));
        }
    }
}
