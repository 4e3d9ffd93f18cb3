//! 名称数据模型的性质测试（proptest 影子模型）。
//!
//! # 教案级导览
//!
//! - **Why**：名称是树操作的坐标系，前缀/末段/拼接之间的代数关系一旦破坏，
//!   导航错误前缀与修剪键都会随之失真；用随机段序列做影子模型验证；
//! - **What**：覆盖显示/解析往返、前缀与剩余后缀的重组、末段与段数的一致
//!   性、空段拒绝。

use atlas_naming::Name;
use proptest::prelude::*;

fn segments_strategy() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z][a-z0-9_.-]{0,7}", 0..6)
}

proptest! {
    /// 显示后的文本按 `/` 重新解析应得到原名称（空名称对应空文本）。
    #[test]
    fn display_parse_roundtrip(segments in segments_strategy()) {
        let name = Name::from_segments(&segments).expect("非空段序列应可构造");
        let text = name.to_string();
        let reparsed = Name::parse(&text).expect("显示文本应可解析");
        prop_assert_eq!(reparsed, name);
    }

    /// 任意切分点上，前缀拼接剩余后缀应重组出原名称。
    #[test]
    fn prefix_join_reconstructs(segments in segments_strategy(), cut in 0_usize..8) {
        let name = Name::from_segments(&segments).expect("非空段序列应可构造");
        let cut = cut.min(name.len());
        let prefix = name.prefix(cut);
        let suffix = Name::from_segments(&segments[cut..]).expect("后缀段应可构造");
        prop_assert_eq!(prefix.join(&suffix), name);
    }

    /// 末段与段数和影子向量保持一致。
    #[test]
    fn last_and_len_match_shadow(segments in segments_strategy()) {
        let name = Name::from_segments(&segments).expect("非空段序列应可构造");
        prop_assert_eq!(name.len(), segments.len());
        prop_assert_eq!(
            name.last().map(|segment| segment.as_ref().to_owned()),
            segments.last().cloned()
        );
    }

    /// 含空段的序列必须被拒绝。
    #[test]
    fn empty_segment_is_rejected(
        head in segments_strategy(),
        tail in segments_strategy(),
    ) {
        let mut segments = head;
        segments.push(String::new());
        segments.extend(tail);
        prop_assert!(Name::from_segments(&segments).is_err());
    }

    /// `plus` 追加的段必须出现在末尾，且不改变既有前缀。
    #[test]
    fn plus_appends_segment(
        segments in segments_strategy(),
        extra in "[a-z][a-z0-9_.-]{0,7}",
    ) {
        let name = Name::from_segments(&segments).expect("非空段序列应可构造");
        let grown = name.plus(&extra).expect("非空段应可追加");
        prop_assert_eq!(grown.len(), name.len() + 1);
        prop_assert_eq!(grown.prefix(name.len()), name);
        prop_assert_eq!(grown.last().map(|segment| segment.as_ref().to_owned()), Some(extra));
    }
}
