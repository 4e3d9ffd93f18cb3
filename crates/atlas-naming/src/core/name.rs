//! # 结构化名称（Name）
//!
//! ## 核心意图（Why）
//! - 命名空间中的一切操作都以“有序的非空段序列”为坐标；本模块将该坐标建模为
//!   值类型 [`Name`]，并对段内容做入口校验，使树操作无需再防御空段；
//! - 名称语法（转义、分隔符方言等）由外部解析协作方负责，这里仅提供一个以 `/`
//!   切分的最小便捷入口，保证测试与日志可用。
//!
//! ## 架构定位（Where）
//! - 隶属 `atlas_naming::core`，在 `alloc` 特性下即可编译，供无 `std` 的受限
//!   运行时复用数据模型；
//! - 树节点（`core::node`）以 `Arc<str>` 段为并发映射键，与本类型共享段存储。
//!
//! ## 契约说明（What）
//! - 名称按段序列判等；空名称合法，表示“当前节点自身”；
//! - 支持取末段、取前缀、追加段/名称、求长度等操作；
//! - 任何构造路径都不会产出空段，违例以 [`NamingError::InvalidName`] 拒绝。

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::error::NamingError;

/// 有序段序列构成的结构化名称。
///
/// # 教案式说明
/// - **意图 (Why)**：以值语义承载命名坐标，段存储使用 `Arc<str>`，使前缀、子名
///   等派生名称可以零拷贝共享段内容；
/// - **契约 (What)**：
///   - 所有段均非空；按段序列判等与哈希；
///   - 空名称（零段）表示“此节点”，`last()` 返回 `None`；
/// - **风险 (Trade-offs)**：未承载语法层信息（转义、复合命名方言），调用方若
///   需要完整语法，应在外部解析后经 [`Name::from_segments`] 进入。
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Name {
    segments: Vec<Arc<str>>,
}

impl Name {
    /// 构造空名称，指代“当前节点自身”。
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// 由段序列构造名称，拒绝空段。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：输入迭代器中的每个段必须非空，否则返回
    ///   [`NamingError::InvalidName`]；空迭代器产出空名称；
    /// - **执行 (How)**：逐段校验并转为共享的 `Arc<str>` 存储。
    pub fn from_segments<I, S>(segments: I) -> Result<Self, NamingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() {
                return Err(NamingError::InvalidName {
                    detail: "name segment must not be empty".to_owned(),
                });
            }
            out.push(Arc::from(segment));
        }
        Ok(Self { segments: out })
    }

    /// 以 `/` 切分文本的最小解析便捷入口。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：完整的名称语法与转义属于外部解析协作方；本入口只服务
    ///   注册表名称属性、测试与示例这类“朴素路径”场景；
    /// - **契约 (What)**：空串解析为为空名称；出现空段（如首尾或连续 `/`）返回
    ///   [`NamingError::InvalidName`]。
    pub fn parse(text: &str) -> Result<Self, NamingError> {
        if text.is_empty() {
            return Ok(Self::empty());
        }
        Self::from_segments(text.split('/'))
    }

    /// 段数量。
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// 是否为空名称。
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// 末段；空名称返回 `None`。
    #[must_use]
    pub fn last(&self) -> Option<&Arc<str>> {
        self.segments.last()
    }

    /// 段序列的只读视图。
    #[must_use]
    pub fn segments(&self) -> &[Arc<str>] {
        &self.segments
    }

    /// 取前 `count` 段构成的前缀名称；`count` 超出长度时按全长截断。
    #[must_use]
    pub fn prefix(&self, count: usize) -> Self {
        let end = count.min(self.segments.len());
        Self {
            segments: self.segments[..end].to_vec(),
        }
    }

    /// 追加一个段，得到新名称；段必须非空。
    pub fn plus(&self, segment: &str) -> Result<Self, NamingError> {
        if segment.is_empty() {
            return Err(NamingError::InvalidName {
                detail: "name segment must not be empty".to_owned(),
            });
        }
        Ok(self.child(&Arc::from(segment)))
    }

    /// 拼接另一个名称（后缀串接）。
    #[must_use]
    pub fn join(&self, suffix: &Name) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(suffix.segments.iter().cloned());
        Self { segments }
    }

    /// 追加一个已校验的共享段；供树内部构造错误前缀与子名使用。
    pub(crate) fn child(&self, segment: &Arc<str>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Arc::clone(segment));
        Self { segments }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        use alloc::string::ToString;
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_denotes_self() {
        let name = Name::empty();
        assert!(name.is_empty());
        assert_eq!(name.last(), None);
        assert_eq!(name.prefix(3), Name::empty());
    }

    #[test]
    fn from_segments_rejects_empty_segment() {
        let err = Name::from_segments(["a", "", "c"]).expect_err("空段必须被拒绝");
        assert!(matches!(err, NamingError::InvalidName { .. }));
    }

    #[test]
    fn parse_splits_on_slash() {
        let name = Name::parse("jdbc/apps/ds").expect("朴素路径应可解析");
        assert_eq!(name.len(), 3);
        assert_eq!(name.last().map(AsRef::as_ref), Some("ds"));
        assert!(Name::parse("/jdbc").is_err(), "首部空段应被拒绝");
        assert!(Name::parse("jdbc//ds").is_err(), "连续分隔符应被拒绝");
    }

    #[test]
    fn prefix_plus_last_reconstructs() {
        let name = Name::parse("a/b/c").expect("应可解析");
        let parent = name.prefix(name.len() - 1);
        let rebuilt = parent
            .plus(name.last().expect("非空名称必有末段"))
            .expect("末段非空");
        assert_eq!(rebuilt, name);
    }

    #[test]
    fn join_concatenates_segments() {
        let left = Name::parse("a/b").expect("应可解析");
        let right = Name::parse("c/d").expect("应可解析");
        assert_eq!(left.join(&right), Name::parse("a/b/c/d").expect("应可解析"));
        assert_eq!(Name::empty().join(&right), right);
    }
}
