//! 筛选条件与资源路径派生模块
//!
//! 该模块实现"筛选条件 → 叠加图资源路径"的核心规则，全部为纯函数：
//!
//! 1. **周期叠加图**（年 + 月 + 元素比值 + 是否叠加）：
//!    `/{年}/{月}/{比值下划线形式}_{overlapped|unoverlapped}.png`
//! 2. **比值叠加图**（仅元素比值）：
//!    `/{比值下划线形式}.png`
//!
//! 同一个比值在不同场合使用三种书写形式：
//!
//! | 形式 | 示例 | 用途 |
//! |------|------|------|
//! | 展示形式 | `Mg:Si` | 界面展示、序列化 |
//! | 路径形式 | `Mg_Si` | 资源路径拼接 |
//! | 条目键形式 | `Mg/Si` | 上传结果条目查找 |
//!
//! # 设计思路
//!
//! - 月份与比值用枚举收紧取值空间，解析失败在进入流水线前暴露。
//! - 筛选条件字段全部可缺省；不完整的条件不派生路径，也不视为错误。
//! - 派生规则纯函数化：输入相同则输出相同，便于穷举测试。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OverlayError;

/// 叠加图资源的固定扩展名。
pub const OVERLAY_IMAGE_EXT: &str = "png";

/// 月份（三字母小写代号）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    /// 全部月份，按年历顺序排列。
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// 资源路径中使用的三字母代号。
    pub fn as_code(self) -> &'static str {
        match self {
            Month::Jan => "jan",
            Month::Feb => "feb",
            Month::Mar => "mar",
            Month::Apr => "apr",
            Month::May => "may",
            Month::Jun => "jun",
            Month::Jul => "jul",
            Month::Aug => "aug",
            Month::Sep => "sep",
            Month::Oct => "oct",
            Month::Nov => "nov",
            Month::Dec => "dec",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for Month {
    type Err = OverlayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "jan" => Ok(Month::Jan),
            "feb" => Ok(Month::Feb),
            "mar" => Ok(Month::Mar),
            "apr" => Ok(Month::Apr),
            "may" => Ok(Month::May),
            "jun" => Ok(Month::Jun),
            "jul" => Ok(Month::Jul),
            "aug" => Ok(Month::Aug),
            "sep" => Ok(Month::Sep),
            "oct" => Ok(Month::Oct),
            "nov" => Ok(Month::Nov),
            "dec" => Ok(Month::Dec),
            other => Err(OverlayError::InvalidFormat(format!(
                "未知月份代号：{}（可选：jan ~ dec）",
                other
            ))),
        }
    }
}

/// 元素浓度比值（固定取值集合）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementalRatio {
    #[serde(rename = "Mg:Si")]
    MgSi,
    #[serde(rename = "Al:Si")]
    AlSi,
    #[serde(rename = "Ca:Si")]
    CaSi,
    #[serde(rename = "Na:Si")]
    NaSi,
}

impl ElementalRatio {
    /// 全部支持的比值。
    pub const ALL: [ElementalRatio; 4] = [
        ElementalRatio::MgSi,
        ElementalRatio::AlSi,
        ElementalRatio::CaSi,
        ElementalRatio::NaSi,
    ];

    /// 展示形式，如 `Mg:Si`。
    pub fn as_str(self) -> &'static str {
        match self {
            ElementalRatio::MgSi => "Mg:Si",
            ElementalRatio::AlSi => "Al:Si",
            ElementalRatio::CaSi => "Ca:Si",
            ElementalRatio::NaSi => "Na:Si",
        }
    }

    /// 路径形式（冒号替换为下划线），如 `Mg_Si`。
    pub fn path_key(self) -> &'static str {
        match self {
            ElementalRatio::MgSi => "Mg_Si",
            ElementalRatio::AlSi => "Al_Si",
            ElementalRatio::CaSi => "Ca_Si",
            ElementalRatio::NaSi => "Na_Si",
        }
    }

    /// 条目键形式（冒号替换为斜杠），如 `Mg/Si`。
    ///
    /// 上传服务返回的热图条目以该形式作为键。
    pub fn entry_key(self) -> &'static str {
        match self {
            ElementalRatio::MgSi => "Mg/Si",
            ElementalRatio::AlSi => "Al/Si",
            ElementalRatio::CaSi => "Ca/Si",
            ElementalRatio::NaSi => "Na/Si",
        }
    }

    /// 比值叠加图的相对资源路径（与年月无关）。
    ///
    /// # 示例
    /// ```rust
    /// use lunar_heatmap::overlay::ElementalRatio;
    ///
    /// assert_eq!(ElementalRatio::MgSi.overlay_path(), "/Mg_Si.png");
    /// ```
    pub fn overlay_path(self) -> String {
        format!("/{}.{}", self.path_key(), OVERLAY_IMAGE_EXT)
    }
}

impl fmt::Display for ElementalRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementalRatio {
    type Err = OverlayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "mg:si" => Ok(ElementalRatio::MgSi),
            "al:si" => Ok(ElementalRatio::AlSi),
            "ca:si" => Ok(ElementalRatio::CaSi),
            "na:si" => Ok(ElementalRatio::NaSi),
            other => Err(OverlayError::InvalidFormat(format!(
                "未知元素比值：{}（可选：Mg:Si / Al:Si / Ca:Si / Na:Si）",
                other
            ))),
        }
    }
}

/// 筛选条件。
///
/// 由嵌入方持有并整体传入，流水线内部不修改它。
/// 年、月、比值三个字段齐备时条件才算完整；不完整的条件不派生路径。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    /// 年份。
    pub year: Option<i32>,
    /// 月份。
    pub month: Option<Month>,
    /// 元素比值。
    pub elemental_ratio: Option<ElementalRatio>,
    /// 是否使用叠加版本的热图。
    #[serde(default)]
    pub is_overlapping: bool,
}

impl FilterSelection {
    /// 判断条件是否完整。
    pub fn is_complete(&self) -> bool {
        self.year.is_some() && self.month.is_some() && self.elemental_ratio.is_some()
    }

    /// 派生周期叠加图的相对资源路径。
    ///
    /// 条件不完整时返回 `None`，由上层转入空闲状态而非报错。
    ///
    /// # 示例
    /// ```rust
    /// use lunar_heatmap::overlay::{ElementalRatio, FilterSelection, Month};
    ///
    /// let selection = FilterSelection {
    ///     year: Some(2022),
    ///     month: Some(Month::Mar),
    ///     elemental_ratio: Some(ElementalRatio::MgSi),
    ///     is_overlapping: true,
    /// };
    /// assert_eq!(
    ///     selection.overlay_path().as_deref(),
    ///     Some("/2022/mar/Mg_Si_overlapped.png")
    /// );
    /// ```
    pub fn overlay_path(&self) -> Option<String> {
        let (Some(year), Some(month), Some(ratio)) =
            (self.year, self.month, self.elemental_ratio)
        else {
            return None;
        };

        let variant = if self.is_overlapping {
            "overlapped"
        } else {
            "unoverlapped"
        };

        Some(format!(
            "/{}/{}/{}_{}.{}",
            year,
            month.as_code(),
            ratio.path_key(),
            variant,
            OVERLAY_IMAGE_EXT
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_selection() -> FilterSelection {
        FilterSelection {
            year: Some(2022),
            month: Some(Month::Mar),
            elemental_ratio: Some(ElementalRatio::MgSi),
            is_overlapping: true,
        }
    }

    #[test]
    fn overlapping_selection_derives_overlapped_path() {
        assert_eq!(
            complete_selection().overlay_path().as_deref(),
            Some("/2022/mar/Mg_Si_overlapped.png")
        );
    }

    #[test]
    fn non_overlapping_selection_derives_unoverlapped_path() {
        let mut selection = complete_selection();
        selection.is_overlapping = false;

        assert_eq!(
            selection.overlay_path().as_deref(),
            Some("/2022/mar/Mg_Si_unoverlapped.png")
        );
    }

    #[test]
    fn incomplete_selection_derives_no_path() {
        let mut selection = complete_selection();
        selection.month = None;

        assert!(!selection.is_complete());
        assert_eq!(selection.overlay_path(), None);

        let mut selection = complete_selection();
        selection.year = None;
        assert_eq!(selection.overlay_path(), None);

        let mut selection = complete_selection();
        selection.elemental_ratio = None;
        assert_eq!(selection.overlay_path(), None);
    }

    #[test]
    fn ratio_forms_are_consistent() {
        for ratio in ElementalRatio::ALL {
            assert_eq!(ratio.path_key(), ratio.as_str().replace(':', "_"));
            assert_eq!(ratio.entry_key(), ratio.as_str().replace(':', "/"));
        }
    }

    #[test]
    fn ratio_only_path_skips_year_and_month() {
        assert_eq!(ElementalRatio::CaSi.overlay_path(), "/Ca_Si.png");
    }

    #[test]
    fn month_codes_parse_round_trip() {
        for month in Month::ALL {
            let parsed: Month = month.as_code().parse().expect("month code should parse");
            assert_eq!(parsed, month);
        }

        assert!(matches!(
            " MAR ".parse::<Month>(),
            Ok(Month::Mar)
        ));
        assert!(matches!(
            "march".parse::<Month>(),
            Err(OverlayError::InvalidFormat(_))
        ));
    }

    #[test]
    fn ratio_parse_accepts_mixed_case() {
        assert!(matches!(
            "mg:si".parse::<ElementalRatio>(),
            Ok(ElementalRatio::MgSi)
        ));
        assert!(matches!(
            "NA:SI".parse::<ElementalRatio>(),
            Ok(ElementalRatio::NaSi)
        ));
        assert!(matches!(
            "Fe:Si".parse::<ElementalRatio>(),
            Err(OverlayError::InvalidFormat(_))
        ));
    }

    #[test]
    fn selection_deserializes_from_camel_case_json() {
        let selection: FilterSelection = serde_json::from_str(
            r#"{"year":2022,"month":"mar","elementalRatio":"Mg:Si","isOverlapping":true}"#,
        )
        .expect("camelCase selection should deserialize");

        assert_eq!(selection, complete_selection());
    }

    #[test]
    fn selection_tolerates_missing_fields() {
        let selection: FilterSelection =
            serde_json::from_str(r#"{"year":null,"month":null,"elementalRatio":null}"#)
                .expect("empty selection should deserialize");

        assert!(!selection.is_complete());
        assert!(!selection.is_overlapping);
    }
}
