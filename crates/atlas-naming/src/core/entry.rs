//! # 子条目模型：资源句柄与带标签联合
//!
//! ## 核心意图（Why）
//! - 树节点的子映射中可能出现三类值：子上下文节点、聚合器、普通资源句柄；
//!   以带标签的联合类型 [`NodeEntry`] 建模并在每个访问点穷尽匹配，而不是
//!   依赖类型转换失败来探测“不是节点”；
//! - 资源句柄对核心保持不透明：树只关心“是什么类别”以及身份/相等判定，
//!   从不解释载荷内容。
//!
//! ## 契约说明（What）
//! - [`ResourceHandle`] 的逻辑身份：注册表句柄按 [`ResourceId`] 判等（同一
//!   注册项的新实例视为同一身份），本地句柄按实例指针判等；
//! - [`ResourceHandle::same_instance`] 是条件替换/条件移除所需的实例级判定，
//!   与逻辑身份判定严格区分；
//! - [`NodeEntry::same_entry`] 按变体做实例级比较，供 compare-and-swap 风格
//!   的映射操作使用。

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::core::group::BindingGroup;
use crate::core::node::NamespaceNode;
use crate::registry::ResourceId;

/// 绑定在名称上的不透明资源句柄。
///
/// # 教案式说明
/// - **意图 (Why)**：统一承载“调用方直接绑定的本地值”与“由注册表变更流索引
///   进来的条目”，使树的绑定协议无需分裂成两套；
/// - **契约 (What)**：
///   - 克隆是浅拷贝（共享内部 `Arc`），可廉价跨线程传递；
///   - [`same_identity`](ResourceHandle::same_identity) 用于碰撞与移除判定；
///     [`same_instance`](ResourceHandle::same_instance) 用于条件映射操作；
/// - **风险 (Trade-offs)**：本地句柄的身份即实例指针，调用方重复绑定同一值的
///   两次包装会被视作两个贡献者，这与“不透明句柄”的定位一致。
#[derive(Clone)]
pub struct ResourceHandle {
    inner: Arc<HandleShape>,
}

enum HandleShape {
    /// 调用方经门面直接绑定的本地值。
    Local { value: Arc<dyn Any + Send + Sync> },
    /// 由外部注册表索引而来的条目，查找时延迟解析。
    Registry { id: ResourceId },
}

impl ResourceHandle {
    /// 包装一个调用方本地值。
    #[must_use]
    pub fn local(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            inner: Arc::new(HandleShape::Local { value }),
        }
    }

    /// 包装一个注册表条目身份。
    #[must_use]
    pub fn registry(id: ResourceId) -> Self {
        Self {
            inner: Arc::new(HandleShape::Registry { id }),
        }
    }

    /// 注册表身份；本地句柄返回 `None`。
    #[must_use]
    pub fn registry_id(&self) -> Option<ResourceId> {
        match &*self.inner {
            HandleShape::Registry { id } => Some(*id),
            HandleShape::Local { .. } => None,
        }
    }

    /// 本地载荷；注册表句柄返回 `None`。
    #[must_use]
    pub fn local_value(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        match &*self.inner {
            HandleShape::Local { value } => Some(Arc::clone(value)),
            HandleShape::Registry { .. } => None,
        }
    }

    /// 逻辑身份判定：注册表句柄比较 [`ResourceId`]，本地句柄比较实例。
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        match (&*self.inner, &*other.inner) {
            (HandleShape::Registry { id: left }, HandleShape::Registry { id: right }) => {
                left == right
            }
            _ => Arc::ptr_eq(&self.inner, &other.inner),
        }
    }

    /// 实例判定：仅当两个句柄共享同一内部实例时为真。
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner {
            HandleShape::Local { .. } => f.write_str("ResourceHandle::Local"),
            HandleShape::Registry { id } => write!(f, "ResourceHandle::Registry({id})"),
        }
    }
}

/// 子映射中的条目：子上下文、聚合器或资源句柄。
#[derive(Clone, Debug)]
pub enum NodeEntry {
    /// 子上下文节点。
    Context(Arc<NamespaceNode>),
    /// 碰撞容忍聚合器。
    Group(Arc<BindingGroup>),
    /// 普通资源句柄。
    Leaf(ResourceHandle),
}

impl NodeEntry {
    /// 实例级同一性：供条件替换/条件移除的守卫判定使用。
    #[must_use]
    pub fn same_entry(&self, other: &NodeEntry) -> bool {
        match (self, other) {
            (NodeEntry::Context(left), NodeEntry::Context(right)) => Arc::ptr_eq(left, right),
            (NodeEntry::Group(left), NodeEntry::Group(right)) => Arc::ptr_eq(left, right),
            (NodeEntry::Leaf(left), NodeEntry::Leaf(right)) => left.same_instance(right),
            _ => false,
        }
    }

    /// 条目类别，供目录列举展示。
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        match self {
            NodeEntry::Context(_) => EntryKind::Context,
            NodeEntry::Group(_) => EntryKind::Group,
            NodeEntry::Leaf(_) => EntryKind::Leaf,
        }
    }
}

/// [`NodeEntry`] 的类别标签。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    /// 子上下文节点。
    Context,
    /// 聚合器（一名多绑）。
    Group,
    /// 普通资源句柄。
    Leaf,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EntryKind::Context => "context",
            EntryKind::Group => "group",
            EntryKind::Leaf => "leaf",
        };
        f.write_str(text)
    }
}
