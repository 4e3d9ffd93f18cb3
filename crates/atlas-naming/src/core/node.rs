//! # 并发命名树节点（NamespaceNode）
//!
//! ## 核心意图（Why）
//! - 将“名称前缀 → 子条目”的层级关系建模为一棵可并发修改的树：读取无锁，
//!   写入只依赖子映射的分片内部同步与聚合器的实例互斥，两者之外不再引入
//!   任何阻塞点；
//! - 自动绑定路径上的中间节点按需惰性创建、清空即删，且删除绝不能吞掉与之
//!   竞争的新绑定。
//!
//! ## 并发协议（How）
//! - 子映射使用 `DashMap`，三类条件原语均依托其分片原子性：
//!   insert-if-absent（`entry` 的 Vacant 分支）、replace-if-still-equal 与
//!   remove-if-still-equal（`remove_if` + 实例同一性判定）；
//! - 锁序纪律：持有分片守卫期间绝不触碰聚合器互斥锁——条目先克隆出守卫再
//!   加锁；反向（聚合器锁内做分片条件移除）只出现在
//!   [`ensure_not_bound`](NamespaceNode::ensure_not_bound) 一个方向，不构成环；
//! - 自动绑定对聚合器的加入遵循“加入后确认仍挂载，否则对新占用者重试”的
//!   无界重试环；绑定完成后再沿路径复验一次，被修剪掉的路径通过整体重试
//!   恢复；
//! - 自动删除（修剪）在摘除成功后复查子映射：若有并发写入抢先落入本节点，
//!   立即按 insert-if-absent 回挂，保住新绑定。
//!
//! ## 契约说明（What）
//! - 导航失败报告“失败点的完全限定前缀”，而非完整目标名；
//! - `auto_delete` 节点清空后不得继续从父节点可达；摘除与新绑定的竞争一律
//!   由新绑定胜出；
//! - 尽力而为操作（修剪、[`ensure_not_bound`](NamespaceNode::ensure_not_bound)）
//!   从不向调用方抛错。

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::core::entry::{NodeEntry, ResourceHandle};
use crate::core::group::BindingGroup;
use crate::core::name::Name;
use crate::error::NamingError;

/// 命名树中代表一个名称前缀的节点。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - `full_name` 构造后不可变；根节点的 `parent` 为空；
///   - `auto_delete` 标记自动绑定路径上惰性创建的过渡节点；
///   - 子映射键为单个路径段，值为 [`NodeEntry`] 三类变体之一；
/// - **所有权 (Where)**：根 `Arc` 由调和器/门面的构造方显式持有，节点间的
///   父向引用为 `Weak`，树内不形成引用环；
/// - **风险 (Trade-offs)**：对同一段的条件写入在分片上短暂串行，这是换取
///   无全局锁的既定代价。
#[derive(Debug)]
pub struct NamespaceNode {
    parent: Weak<NamespaceNode>,
    full_name: Name,
    auto_delete: bool,
    children: DashMap<Arc<str>, NodeEntry>,
}

/// 普通查找的命中结果：子上下文或（聚合器当前值/普通）句柄。
#[derive(Clone, Debug)]
pub enum Resolved {
    /// 命中子上下文节点。
    Context(Arc<NamespaceNode>),
    /// 命中资源句柄（聚合器场景下为其当前值）。
    Handle(ResourceHandle),
}

/// 子树清理报告：移除与跳过（外部所有）的条目数。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScrubReport {
    /// 已移除的条目数。
    pub removed: usize,
    /// 因外部所有（聚合器背书）而保留的条目数。
    pub skipped: usize,
}

impl ScrubReport {
    fn absorb(&mut self, other: ScrubReport) {
        self.removed += other.removed;
        self.skipped += other.skipped;
    }
}

/// 自动绑定完成后的路径复验结论。
enum BindProbe {
    /// 绑定可达，或已被显式后写者合法覆盖。
    Settled,
    /// 路径或聚合器成员在确认前丢失，需要整体重试。
    Retry,
}

impl NamespaceNode {
    /// 创建树根。根节点既不自动删除，也没有父节点。
    #[must_use]
    pub fn new_root() -> Arc<Self> {
        Arc::new(Self {
            parent: Weak::new(),
            full_name: Name::empty(),
            auto_delete: false,
            children: DashMap::new(),
        })
    }

    fn new_child(self: &Arc<Self>, segment: &Arc<str>, auto_delete: bool) -> Arc<Self> {
        Arc::new(Self {
            parent: Arc::downgrade(self),
            full_name: self.full_name.child(segment),
            auto_delete,
            children: DashMap::new(),
        })
    }

    /// 本节点的绝对名称。
    #[must_use]
    pub fn full_name(&self) -> &Name {
        &self.full_name
    }

    /// 是否为自动绑定路径上的过渡节点。
    #[must_use]
    pub fn is_auto_delete(&self) -> bool {
        self.auto_delete
    }

    /// 是否没有任何子条目。
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// 沿除末段外的全部段向下导航；中间段缺失报 `NameNotFound`，命中非节点
    /// 条目报 `NotContext`，两者都携带失败点前缀。
    fn navigate_to_parent(self: &Arc<Self>, name: &Name) -> Result<Arc<Self>, NamingError> {
        let mut cursor = Arc::clone(self);
        for segment in &name.segments()[..name.len().saturating_sub(1)] {
            let next = match cursor.children.get(segment.as_ref()) {
                Some(entry) => match entry.value() {
                    NodeEntry::Context(node) => Arc::clone(node),
                    _ => {
                        return Err(NamingError::NotContext {
                            name: cursor.full_name.child(segment),
                        });
                    }
                },
                None => {
                    return Err(NamingError::NameNotFound {
                        name: cursor.full_name.child(segment),
                    });
                }
            };
            cursor = next;
        }
        Ok(cursor)
    }

    /// 创建显式子上下文（非自动删除），冲突时严格保留既有条目。
    pub fn create_subcontext(self: &Arc<Self>, name: &Name) -> Result<Arc<Self>, NamingError> {
        let Some(segment) = name.last() else {
            return Err(NamingError::InvalidName {
                detail: "cannot create a subcontext at the empty name".to_owned(),
            });
        };
        let parent = self.navigate_to_parent(name)?;
        match parent.children.entry(Arc::clone(segment)) {
            Entry::Occupied(_) => Err(NamingError::NameAlreadyBound {
                name: parent.full_name.child(segment),
            }),
            Entry::Vacant(vacant) => {
                let child = parent.new_child(segment, false);
                vacant.insert(NodeEntry::Context(Arc::clone(&child)));
                Ok(child)
            }
        }
    }

    /// 以 insert-if-absent 语义绑定句柄，冲突报 `NameAlreadyBound`。
    pub fn bind(self: &Arc<Self>, name: &Name, handle: ResourceHandle) -> Result<(), NamingError> {
        let Some(segment) = name.last() else {
            return Err(NamingError::InvalidName {
                detail: "cannot bind the empty name".to_owned(),
            });
        };
        let parent = self.navigate_to_parent(name)?;
        match parent.children.entry(Arc::clone(segment)) {
            Entry::Occupied(_) => Err(NamingError::NameAlreadyBound {
                name: parent.full_name.child(segment),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(NodeEntry::Leaf(handle));
                Ok(())
            }
        }
    }

    /// 自动绑定：按需创建中间过渡节点，末段汇入聚合器。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：末段空缺时播种单值聚合器；已有聚合器时在其实例
    ///   临界区内加入并确认仍挂载；占用者为其他类别时报 `NameAlreadyBound`；
    /// - **执行 (How)**：加入确认失败（聚合器在确认前被并发清空摘除）与路径
    ///   复验失败（中间节点被修剪）都会触发对新占用者/新路径的整体重试；
    ///   重试无上界，竞争窗口只有几次分片操作宽；
    /// - **风险 (Trade-offs)**：与针对同一句柄身份的并发解除绑定存在线性化
    ///   灰区——重试可能让绑定最终胜出，调用方（调和器）依赖后续事件收敛。
    pub fn auto_bind(
        self: &Arc<Self>,
        name: &Name,
        handle: ResourceHandle,
    ) -> Result<(), NamingError> {
        let Some(segment) = name.last() else {
            return Err(NamingError::InvalidName {
                detail: "cannot bind the empty name".to_owned(),
            });
        };
        loop {
            let parent = self.auto_navigate(name)?;
            parent.join_group(segment, &handle)?;
            match self.probe_binding(name, &handle) {
                BindProbe::Settled => return Ok(()),
                BindProbe::Retry => {
                    debug!(name = %name, "自动绑定路径在确认前被修剪，整体重试");
                }
            }
        }
    }

    /// 沿除末段外的段向下走，缺失的中间段惰性创建自动删除节点；竞争失败方
    /// 采纳胜出方的节点，占用者非节点时报 `NotContext`。
    fn auto_navigate(self: &Arc<Self>, name: &Name) -> Result<Arc<Self>, NamingError> {
        let mut cursor = Arc::clone(self);
        for segment in &name.segments()[..name.len().saturating_sub(1)] {
            let next = match cursor.children.entry(Arc::clone(segment)) {
                Entry::Occupied(occupied) => match occupied.get() {
                    NodeEntry::Context(node) => Arc::clone(node),
                    _ => {
                        return Err(NamingError::NotContext {
                            name: cursor.full_name.child(segment),
                        });
                    }
                },
                Entry::Vacant(vacant) => {
                    let child = cursor.new_child(segment, true);
                    vacant.insert(NodeEntry::Context(Arc::clone(&child)));
                    child
                }
            };
            cursor = next;
        }
        Ok(cursor)
    }

    /// 在本节点的 `segment` 上加入聚合器贡献者（必要时播种）。
    ///
    /// 守卫纪律：占用条目先克隆出分片守卫，再触碰聚合器互斥锁；加入后以
    /// “仍挂载同一实例”的确认代替显式 compare-and-swap，失败即对新占用者
    /// 重试。
    fn join_group(
        self: &Arc<Self>,
        segment: &Arc<str>,
        handle: &ResourceHandle,
    ) -> Result<Arc<BindingGroup>, NamingError> {
        loop {
            let existing = self
                .children
                .get(segment.as_ref())
                .map(|entry| entry.value().clone());
            match existing {
                None => match self.children.entry(Arc::clone(segment)) {
                    Entry::Vacant(vacant) => {
                        let group = BindingGroup::seeded(handle.clone());
                        vacant.insert(NodeEntry::Group(Arc::clone(&group)));
                        return Ok(group);
                    }
                    // 播种竞争失败，对新占用者重试。
                    Entry::Occupied(_) => {}
                },
                Some(NodeEntry::Group(group)) => {
                    group.add_last(handle.clone());
                    let still_mapped = self.children.get(segment.as_ref()).is_some_and(|entry| {
                        matches!(entry.value(), NodeEntry::Group(candidate) if Arc::ptr_eq(candidate, &group))
                    });
                    if still_mapped {
                        return Ok(group);
                    }
                    debug!(
                        segment = segment.as_ref(),
                        "聚合器在加入确认前被并发摘除，对新占用者重试"
                    );
                }
                Some(_) => {
                    return Err(NamingError::NameAlreadyBound {
                        name: self.full_name.child(segment),
                    });
                }
            }
        }
    }

    /// 自动绑定完成后的路径复验：判定绑定是否仍可达。
    fn probe_binding(self: &Arc<Self>, name: &Name, handle: &ResourceHandle) -> BindProbe {
        let mut cursor = Arc::clone(self);
        for segment in &name.segments()[..name.len().saturating_sub(1)] {
            let next = match cursor.children.get(segment.as_ref()) {
                Some(entry) => match entry.value() {
                    NodeEntry::Context(node) => Arc::clone(node),
                    // 中间段被显式重绑覆盖，尊重后写者。
                    _ => return BindProbe::Settled,
                },
                None => return BindProbe::Retry,
            };
            cursor = next;
        }
        let Some(segment) = name.last() else {
            return BindProbe::Settled;
        };
        // 条目先克隆出分片守卫再触碰聚合器互斥锁（锁序纪律）。
        let occupant = cursor
            .children
            .get(segment.as_ref())
            .map(|entry| entry.value().clone());
        match occupant {
            Some(NodeEntry::Group(group)) => {
                if group.contains(handle) {
                    BindProbe::Settled
                } else {
                    BindProbe::Retry
                }
            }
            // 显式重绑已覆盖末段，尊重后写者。
            Some(_) => BindProbe::Settled,
            None => BindProbe::Retry,
        }
    }

    /// 普通查找：空名称返回自身；聚合器返回其当前值，瞬时空窗等同未绑定。
    pub fn lookup(self: &Arc<Self>, name: &Name) -> Result<Resolved, NamingError> {
        match self.resolve_entry(name)? {
            NodeEntry::Context(node) => Ok(Resolved::Context(node)),
            NodeEntry::Leaf(handle) => Ok(Resolved::Handle(handle)),
            NodeEntry::Group(group) => {
                group
                    .last_entry()
                    .map(Resolved::Handle)
                    .ok_or_else(|| NamingError::NameNotFound {
                        // 聚合器被并发清空：按“从未绑定”报告。
                        name: self.full_name.join(name),
                    })
            }
        }
    }

    /// 解析名称指向的原始条目；空名称解析为本节点自身。
    pub fn resolve_entry(self: &Arc<Self>, name: &Name) -> Result<NodeEntry, NamingError> {
        if name.is_empty() {
            return Ok(NodeEntry::Context(Arc::clone(self)));
        }
        let parent = self.navigate_to_parent(name)?;
        let segment = name.last().expect("非空名称必有末段");
        parent
            .children
            .get(segment.as_ref())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| NamingError::NameNotFound {
                name: parent.full_name.child(segment),
            })
    }

    /// 无条件替换绑定，返回被置换的旧条目。
    pub fn rebind(
        self: &Arc<Self>,
        name: &Name,
        handle: ResourceHandle,
    ) -> Result<Option<NodeEntry>, NamingError> {
        let Some(segment) = name.last() else {
            return Err(NamingError::InvalidName {
                detail: "cannot rebind the empty name".to_owned(),
            });
        };
        let parent = self.navigate_to_parent(name)?;
        Ok(parent
            .children
            .insert(Arc::clone(segment), NodeEntry::Leaf(handle)))
    }

    /// 销毁空的子上下文。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：目标必须是子映射为空的节点，否则分别报
    ///   `ContextNotEmpty` / `NotContext`；目标缺失报 `NameNotFound`；
    /// - **执行 (How)**：移除以“仍是同一节点实例”为条件；条件失败说明并发
    ///   销毁或重绑已处理该段，按已移除的无操作返回。
    pub fn destroy_subcontext(self: &Arc<Self>, name: &Name) -> Result<(), NamingError> {
        let Some(segment) = name.last() else {
            return Err(NamingError::InvalidName {
                detail: "cannot destroy the empty name".to_owned(),
            });
        };
        let parent = self.navigate_to_parent(name)?;
        let target = parent
            .children
            .get(segment.as_ref())
            .map(|entry| entry.value().clone());
        match target {
            None => Err(NamingError::NameNotFound {
                name: parent.full_name.child(segment),
            }),
            Some(NodeEntry::Context(node)) => {
                if !node.children.is_empty() {
                    return Err(NamingError::ContextNotEmpty {
                        name: node.full_name.clone(),
                    });
                }
                let removed = parent
                    .children
                    .remove_if(segment.as_ref(), |_, value| {
                        matches!(value, NodeEntry::Context(candidate) if Arc::ptr_eq(candidate, &node))
                    })
                    .is_some();
                if removed {
                    parent.prune();
                }
                Ok(())
            }
            Some(_) => Err(NamingError::NotContext {
                name: parent.full_name.child(segment),
            }),
        }
    }

    /// 尽力而为的解除绑定：外部事件宣告某句柄已消失时调用。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：先按 `(段, 句柄)` 精确条件移除叶子；未命中则在占用
    ///   聚合器的实例临界区内移除该身份，清空时于同一临界区内条件摘除聚合器；
    ///   任何失败都被吞掉——本操作是建议性清理，竞态属预期；
    /// - **风险 (Trade-offs)**：与同名自动绑定并发时由绑定方的确认重试兜底，
    ///   这里不做任何等待。
    pub fn ensure_not_bound(self: &Arc<Self>, name: &Name, handle: &ResourceHandle) {
        let Some(segment) = name.last() else {
            return;
        };
        let Ok(parent) = self.navigate_to_parent(name) else {
            return;
        };
        let removed_leaf = parent
            .children
            .remove_if(segment.as_ref(), |_, value| {
                matches!(value, NodeEntry::Leaf(leaf) if leaf.same_identity(handle))
            })
            .is_some();
        if removed_leaf {
            parent.prune();
            return;
        }
        let group = match parent
            .children
            .get(segment.as_ref())
            .map(|entry| entry.value().clone())
        {
            Some(NodeEntry::Group(group)) => group,
            _ => return,
        };
        let emptied = group.remove_entry(handle, || {
            parent.children.remove_if(segment.as_ref(), |_, value| {
                matches!(value, NodeEntry::Group(candidate) if Arc::ptr_eq(candidate, &group))
            });
        });
        if emptied {
            parent.prune();
        }
    }

    /// 解除单个名称的绑定，沿用“跳过聚合器”的外部所有权策略。
    ///
    /// - 叶子：条件移除；目标缺失视作已解除；
    /// - 聚合器：外部所有，报 `PartialResult`；
    /// - 子上下文：递归清理后若已空则摘除，否则报 `PartialResult`。
    pub fn unbind(self: &Arc<Self>, name: &Name) -> Result<(), NamingError> {
        let Some(segment) = name.last() else {
            return Err(NamingError::InvalidName {
                detail: "cannot unbind the empty name".to_owned(),
            });
        };
        let parent = self.navigate_to_parent(name)?;
        let target = parent
            .children
            .get(segment.as_ref())
            .map(|entry| entry.value().clone());
        match target {
            None => Ok(()),
            Some(NodeEntry::Leaf(handle)) => {
                let removed = parent
                    .children
                    .remove_if(segment.as_ref(), |_, value| {
                        matches!(value, NodeEntry::Leaf(leaf) if leaf.same_instance(&handle))
                    })
                    .is_some();
                if removed {
                    parent.prune();
                }
                Ok(())
            }
            Some(NodeEntry::Group(_)) => Err(NamingError::PartialResult {
                name: parent.full_name.child(segment),
                detail: "externally owned aggregator binding was left in place".to_owned(),
            }),
            Some(NodeEntry::Context(node)) => {
                let report = node.scrub();
                if node.children.is_empty() {
                    let removed = parent
                        .children
                        .remove_if(segment.as_ref(), |_, value| {
                            matches!(value, NodeEntry::Context(candidate) if Arc::ptr_eq(candidate, &node))
                        })
                        .is_some();
                    if removed {
                        parent.prune();
                    }
                    Ok(())
                } else {
                    Err(NamingError::PartialResult {
                        name: node.full_name.clone(),
                        detail: format!(
                            "{} externally owned entries were left in place",
                            report.skipped
                        ),
                    })
                }
            }
        }
    }

    /// 递归清理子树：移除叶子与清空后的子上下文，保留聚合器背书的条目。
    ///
    /// 供单名解除与停机整树回收共用；不触发修剪级联，自上而下的清理自身
    /// 即是回收路径。
    pub fn scrub(self: &Arc<Self>) -> ScrubReport {
        let mut report = ScrubReport::default();
        let snapshot: Vec<(Arc<str>, NodeEntry)> = self
            .children
            .iter()
            .map(|entry| (Arc::clone(entry.key()), entry.value().clone()))
            .collect();
        for (segment, entry) in snapshot {
            match entry {
                NodeEntry::Leaf(handle) => {
                    let removed = self
                        .children
                        .remove_if(segment.as_ref(), |_, value| {
                            matches!(value, NodeEntry::Leaf(leaf) if leaf.same_instance(&handle))
                        })
                        .is_some();
                    if removed {
                        report.removed += 1;
                    }
                }
                NodeEntry::Group(_) => report.skipped += 1,
                NodeEntry::Context(node) => {
                    report.absorb(node.scrub());
                    if node.children.is_empty() {
                        let removed = self
                            .children
                            .remove_if(segment.as_ref(), |_, value| {
                                matches!(value, NodeEntry::Context(candidate) if Arc::ptr_eq(candidate, &node))
                            })
                            .is_some();
                        if removed {
                            report.removed += 1;
                        }
                    } else {
                        report.skipped += 1;
                    }
                }
            }
        }
        report
    }

    /// 目标节点子映射的只读快照。
    pub fn children_snapshot(
        self: &Arc<Self>,
        name: &Name,
    ) -> Result<Vec<(Arc<str>, NodeEntry)>, NamingError> {
        match self.resolve_entry(name)? {
            NodeEntry::Context(node) => Ok(node
                .children
                .iter()
                .map(|entry| (Arc::clone(entry.key()), entry.value().clone()))
                .collect()),
            _ => Err(NamingError::NotContext {
                name: self.full_name.join(name),
            }),
        }
    }

    /// 自动删除（修剪）：本节点有子条目被移除后调用。
    ///
    /// # 教案式说明
    /// - **执行 (How)**：仅当本节点带 `auto_delete` 标记且已空时，以“仍是
    ///   同一实例”为条件从父节点摘除；摘除成功后复查——若并发写入已抢先
    ///   落入本节点，立即按 insert-if-absent 回挂，保住新绑定；彻底摘除后
    ///   向父节点级联；
    /// - **契约 (What)**：所有竞态都静默化解，绝不向调用方抛错。
    fn prune(self: &Arc<Self>) {
        if !self.auto_delete || !self.children.is_empty() {
            return;
        }
        let Some(parent) = self.parent.upgrade() else {
            return;
        };
        let Some(segment) = self.full_name.last() else {
            return;
        };
        let detached = parent
            .children
            .remove_if(segment.as_ref(), |_, value| {
                matches!(value, NodeEntry::Context(candidate) if Arc::ptr_eq(candidate, self))
            })
            .is_some();
        if !detached {
            // 该段已被新条目抢占，摘除让位。
            return;
        }
        if !self.children.is_empty() {
            match parent.children.entry(Arc::clone(segment)) {
                Entry::Vacant(vacant) => {
                    vacant.insert(NodeEntry::Context(Arc::clone(self)));
                    debug!(node = %self.full_name, "修剪与并发绑定竞争，节点已回挂");
                }
                Entry::Occupied(_) => {
                    debug!(
                        node = %self.full_name,
                        "修剪后该段已被新条目占用，滞留子树交由绑定方重试恢复"
                    );
                }
            }
            return;
        }
        parent.prune();
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;

    fn handle_of(value: u32) -> ResourceHandle {
        let value: Arc<dyn Any + Send + Sync> = Arc::new(value);
        ResourceHandle::local(value)
    }

    #[test]
    fn navigation_reports_failure_prefix() {
        let root = NamespaceNode::new_root();
        let name = Name::parse("a/b/c").expect("应可解析");
        let err = root.bind(&name, handle_of(1)).expect_err("中间段缺失应失败");
        assert_eq!(
            err,
            NamingError::NameNotFound {
                name: Name::parse("a").expect("应可解析"),
            },
            "错误应携带失败点前缀而非完整目标名"
        );
    }

    #[test]
    fn bind_conflicts_preserve_existing_entry() {
        let root = NamespaceNode::new_root();
        let name = Name::parse("x").expect("应可解析");
        let first = handle_of(1);
        root.bind(&name, first.clone()).expect("首次绑定应成功");
        let err = root
            .bind(&name, handle_of(2))
            .expect_err("重复绑定应报冲突");
        assert_eq!(err.code(), crate::error::codes::NAME_BOUND);
        match root.lookup(&name).expect("查找应命中") {
            Resolved::Handle(found) => assert!(found.same_instance(&first)),
            Resolved::Context(_) => panic!("不应命中上下文"),
        }
    }

    #[test]
    fn auto_bind_creates_transient_path_and_prune_cascades() {
        let root = NamespaceNode::new_root();
        let name = Name::parse("a/b/c").expect("应可解析");
        let handle = handle_of(7);
        root.auto_bind(&name, handle.clone()).expect("自动绑定应成功");

        let a = match root.resolve_entry(&Name::parse("a").expect("应可解析")) {
            Ok(NodeEntry::Context(node)) => node,
            other => panic!("a 应是上下文节点，实际为 {other:?}"),
        };
        assert!(a.is_auto_delete(), "中间节点应带自动删除标记");

        root.ensure_not_bound(&name, &handle);
        assert!(root.is_empty(), "级联修剪后根节点不应再有子条目");
    }

    #[test]
    fn lookup_of_emptied_group_reports_not_found() {
        let root = NamespaceNode::new_root();
        let name = Name::parse("svc").expect("应可解析");
        let handle = handle_of(3);
        root.auto_bind(&name, handle.clone()).expect("自动绑定应成功");
        root.ensure_not_bound(&name, &handle);
        let err = root.lookup(&name).expect_err("清空后的查找应未命中");
        assert_eq!(err.code(), crate::error::codes::NAME_NOT_FOUND);
    }

    #[test]
    fn destroy_rejects_non_empty_then_succeeds() {
        let root = NamespaceNode::new_root();
        let sub = Name::parse("apps").expect("应可解析");
        root.create_subcontext(&sub).expect("创建子上下文应成功");
        let inner = Name::parse("apps/ds").expect("应可解析");
        root.bind(&inner, handle_of(5)).expect("绑定应成功");

        let err = root
            .destroy_subcontext(&sub)
            .expect_err("非空上下文不可销毁");
        assert_eq!(err.code(), crate::error::codes::CONTEXT_NOT_EMPTY);

        root.unbind(&inner).expect("解除绑定应成功");
        root.destroy_subcontext(&sub).expect("清空后销毁应成功");
        assert!(root.is_empty());
    }

    #[test]
    fn rebind_replaces_and_returns_prior() {
        let root = NamespaceNode::new_root();
        let name = Name::parse("x").expect("应可解析");
        let first = handle_of(1);
        root.bind(&name, first.clone()).expect("绑定应成功");
        let prior = root
            .rebind(&name, handle_of(2))
            .expect("重绑应成功")
            .expect("应返回被置换的旧条目");
        assert!(prior.same_entry(&NodeEntry::Leaf(first)));
    }
}
