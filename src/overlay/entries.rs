//! 叠加图条目模块
//!
//! 上传服务处理 FITS 文件后返回一组"比值键 → 内联图源"的条目。
//! 条目作为有序序列由嵌入方整体传入控制器；查找按键精确匹配，
//! 命中多个时取序列中的第一个。

/// 一条叠加图条目。
///
/// `key` 是比值的条目键形式（如 `Mg/Si`），`source` 是 Data URL
/// 或可抓取的网络地址。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEntry {
    pub key: String,
    pub source: String,
}

impl OverlayEntry {
    pub fn new(key: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
        }
    }
}

/// 在条目序列中按键查找图源。
///
/// 精确匹配，首个命中生效；未命中返回 `None`，由调用方回退到路径加载。
pub fn find_entry_source<'a>(entries: &'a [OverlayEntry], key: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|entry| entry.key == key)
        .map(|entry| entry.source.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact_match_only() {
        let entries = vec![OverlayEntry::new("Mg/Si", "data:image/png;base64,AAAA")];

        assert_eq!(
            find_entry_source(&entries, "Mg/Si"),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(find_entry_source(&entries, "Mg_Si"), None);
        assert_eq!(find_entry_source(&entries, "mg/si"), None);
        assert_eq!(find_entry_source(&entries, "Mg/S"), None);
    }

    #[test]
    fn first_match_wins_for_duplicate_keys() {
        let entries = vec![
            OverlayEntry::new("Al/Si", "first"),
            OverlayEntry::new("Al/Si", "second"),
        ];

        assert_eq!(find_entry_source(&entries, "Al/Si"), Some("first"));
    }

    #[test]
    fn empty_sequence_yields_no_match() {
        assert_eq!(find_entry_source(&[], "Mg/Si"), None);
    }
}
