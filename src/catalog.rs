//! # 元素目录模块
//!
//! ## 设计思路
//!
//! "选择元素"列表背后的数据集合：内置三条演示记录（铁、钛、氧），
//! 上传处理成功后追加的自定义记录排在其后。
//! 集合由嵌入方显式持有并传递，不依赖任何全局可变状态。
//!
//! 按元素名查找失败时回退到第一条记录，与查询参数缺失时
//! 展示默认热图的行为保持一致。

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// 一条元素热图记录。
///
/// 字段名按 camelCase 序列化，与既有数据格式互换。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    /// 元素标识，也是查找键。
    pub element: String,
    /// 展示名称。
    pub name: String,
    /// 描述文案。
    pub description: String,
    /// 热图图片地址。
    #[serde(alias = "heatmapUrl")]
    pub url: String,
    /// 最大浓度（百分比）。
    pub max_concentration: f64,
    /// 最小浓度（百分比）。
    pub min_concentration: f64,
    /// 平均浓度（百分比）。
    pub average_concentration: f64,
    /// 记录生成时间（RFC 3339 字符串）。
    pub timestamp: String,
}

/// 内置演示记录。
static BUILTIN_RECORDS: Lazy<Vec<ElementRecord>> = Lazy::new(|| {
    vec![
        ElementRecord {
            element: "Iron".to_string(),
            name: "Iron Distribution on Lunar Surface".to_string(),
            description: "This heatmap shows the distribution of iron across the lunar surface."
                .to_string(),
            url: "/placeholder.svg?height=400&width=600".to_string(),
            max_concentration: 15.5,
            min_concentration: 2.1,
            average_concentration: 8.7,
            timestamp: "2023-06-15T10:30:00Z".to_string(),
        },
        ElementRecord {
            element: "Titanium".to_string(),
            name: "Titanium Concentration Map".to_string(),
            description: "A detailed map of titanium concentrations on the Moon.".to_string(),
            url: "/placeholder.svg?height=400&width=600".to_string(),
            max_concentration: 5.2,
            min_concentration: 0.5,
            average_concentration: 2.8,
            timestamp: "2023-06-14T14:45:00Z".to_string(),
        },
        ElementRecord {
            element: "Oxygen".to_string(),
            name: "Lunar Oxygen Abundance".to_string(),
            description: "This map illustrates the abundance of oxygen in lunar regolith."
                .to_string(),
            url: "/placeholder.svg?height=400&width=600".to_string(),
            max_concentration: 45.0,
            min_concentration: 35.7,
            average_concentration: 41.3,
            timestamp: "2023-06-13T09:15:00Z".to_string(),
        },
    ]
});

/// 元素目录。
///
/// 内置记录在前、自定义记录在后，顺序即展示顺序。
#[derive(Debug, Clone)]
pub struct ElementCatalog {
    records: Vec<ElementRecord>,
}

impl Default for ElementCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementCatalog {
    /// 以内置演示记录创建目录。
    pub fn new() -> Self {
        Self {
            records: BUILTIN_RECORDS.clone(),
        }
    }

    /// 创建空目录（仅用于完全自定义的数据源）。
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// 追加一条记录（通常来自上传处理结果）。
    pub fn add_record(&mut self, record: ElementRecord) {
        self.records.push(record);
    }

    /// 批量追加记录。
    pub fn extend(&mut self, records: impl IntoIterator<Item = ElementRecord>) {
        self.records.extend(records);
    }

    /// 按元素名精确查找。
    pub fn get(&self, element: &str) -> Option<&ElementRecord> {
        self.records.iter().find(|record| record.element == element)
    }

    /// 按元素名查找，未命中时回退到第一条记录。
    ///
    /// 目录为空时返回 `None`。
    pub fn get_or_first(&self, element: &str) -> Option<&ElementRecord> {
        self.get(element).or_else(|| self.records.first())
    }

    /// 所有元素名，按展示顺序。
    pub fn elements(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|record| record.element.as_str())
            .collect()
    }

    /// 只读访问全部记录。
    pub fn records(&self) -> &[ElementRecord] {
        &self.records
    }
}
