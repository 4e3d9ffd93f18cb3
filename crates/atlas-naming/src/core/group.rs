//! # 碰撞容忍聚合器（BindingGroup）
//!
//! ## 核心意图（Why）
//! - 当多个彼此独立的发布方将不同资源发布到同一名称时，绑定不应互相覆盖丢失：
//!   聚合器记录全部贡献者，普通查找返回“最近加入”的当前值，移除任一贡献者都
//!   能正确收敛或清空绑定；
//! - 单贡献者是绝对主流场景，表示法在单值与多值之间按需升降级，避免为常见
//!   情形付出集合开销。
//!
//! ## 并发契约（What）
//! - 同一实例上的加入/移除互斥（实例级 `parking_lot::Mutex`），不同实例之间
//!   互不阻塞；
//! - “当前值”经 `arc-swap` 槽位暴露，读取无锁，可能短暂为空——调用方必须把
//!   这种瞬时空窗与“从未绑定”同等对待；
//! - 加入与既有贡献者同身份的句柄时，贡献者集合不变，但“当前值”更新为新
//!   提供的实例。
//!
//! ## 生命周期约束
//! - 聚合器从父节点可达期间不得为空；移除最后一个贡献者会向调用方报告
//!   “已清空”，由调用方在同一互斥区内完成条件摘除。

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::core::entry::ResourceHandle;

/// 发布到同一名称下的 1..N 个资源句柄。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - [`add_last`](BindingGroup::add_last) / [`remove_entry`](BindingGroup::remove_entry)
///     在单个实例上串行执行；
///   - [`last_entry`](BindingGroup::last_entry) 无锁读取当前值；
/// - **执行 (How)**：内部表示在 `Single` 与 `Many`（保持加入顺序的向量）之间
///   升降级，第二个不同身份的句柄触发升级，回落到一个贡献者时降级；
/// - **风险 (Trade-offs)**：`Many` 的成员判定是线性扫描；同名贡献者规模在
///   真实部署中是个位数，线性代价可忽略。
#[derive(Debug)]
pub struct BindingGroup {
    entries: Mutex<GroupEntries>,
    current: ArcSwapOption<ResourceHandle>,
}

#[derive(Debug)]
enum GroupEntries {
    Empty,
    Single(ResourceHandle),
    Many(Vec<ResourceHandle>),
}

impl BindingGroup {
    /// 以首个贡献者构造单值聚合器。
    #[must_use]
    pub fn seeded(handle: ResourceHandle) -> Arc<Self> {
        Arc::new(Self {
            current: ArcSwapOption::from_pointee(handle.clone()),
            entries: Mutex::new(GroupEntries::Single(handle)),
        })
    }

    /// 加入一个贡献者，并将其设为当前值。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：与既有贡献者同身份时集合不变，仅刷新当前值为新实例；
    ///   否则按加入顺序追加，必要时由单值升级为多值表示；
    /// - **执行 (How)**：整个变更在实例互斥区内完成，当前值槽位在持锁期间
    ///   更新，保证与集合内容一致。
    pub fn add_last(&self, handle: ResourceHandle) {
        let mut entries = self.entries.lock();
        let next = match std::mem::replace(&mut *entries, GroupEntries::Empty) {
            GroupEntries::Empty => GroupEntries::Single(handle.clone()),
            GroupEntries::Single(existing) if existing.same_identity(&handle) => {
                GroupEntries::Single(handle.clone())
            }
            GroupEntries::Single(existing) => GroupEntries::Many(vec![existing, handle.clone()]),
            GroupEntries::Many(members) => {
                let mut members = members;
                if !members.iter().any(|member| member.same_identity(&handle)) {
                    members.push(handle.clone());
                }
                GroupEntries::Many(members)
            }
        };
        *entries = next;
        self.current.store(Some(Arc::new(handle)));
    }

    /// 移除一个贡献者；返回值表示聚合器是否已清空。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：
    ///   - 身份未命中时集合不变，返回当前是否为空；
    ///   - 被移除者恰为当前值时，当前值回退到集合的新末元素（或空）；
    ///   - 集合回落到一个成员时降级为单值表示；
    /// - **执行 (How)**：`when_empty` 在集合清空时于互斥区内回调，调用方借此
    ///   在同一临界区完成对父映射的条件摘除，堵住“清空后、摘除前”再次加入
    ///   的窗口——加入方的确认重试会覆盖残余情形。
    pub fn remove_entry<F>(&self, handle: &ResourceHandle, when_empty: F) -> bool
    where
        F: FnOnce(),
    {
        let mut entries = self.entries.lock();
        let (next, emptied) = match std::mem::replace(&mut *entries, GroupEntries::Empty) {
            GroupEntries::Empty => (GroupEntries::Empty, true),
            GroupEntries::Single(existing) => {
                if existing.same_identity(handle) {
                    (GroupEntries::Empty, true)
                } else {
                    (GroupEntries::Single(existing), false)
                }
            }
            GroupEntries::Many(members) => {
                let mut members = members;
                members.retain(|member| !member.same_identity(handle));
                let current_removed = self
                    .current
                    .load()
                    .as_ref()
                    .is_none_or(|current| current.same_identity(handle));
                if current_removed {
                    self.current
                        .store(members.last().cloned().map(Arc::new));
                }
                match members.len() {
                    0 => (GroupEntries::Empty, true),
                    1 => {
                        let only = members.pop().expect("非空向量必有末元素");
                        (GroupEntries::Single(only), false)
                    }
                    _ => (GroupEntries::Many(members), false),
                }
            }
        };
        let was_single_cleared = matches!(next, GroupEntries::Empty) && emptied;
        *entries = next;
        if was_single_cleared {
            self.current.store(None);
        }
        if emptied {
            when_empty();
        }
        emptied
    }

    /// 当前值（最近加入的贡献者）；可能瞬时为空。
    #[must_use]
    pub fn last_entry(&self) -> Option<ResourceHandle> {
        self.current.load_full().map(|current| (*current).clone())
    }

    /// 按逻辑身份判断某句柄是否仍是贡献者。
    #[must_use]
    pub fn contains(&self, handle: &ResourceHandle) -> bool {
        match &*self.entries.lock() {
            GroupEntries::Empty => false,
            GroupEntries::Single(existing) => existing.same_identity(handle),
            GroupEntries::Many(members) => {
                members.iter().any(|member| member.same_identity(handle))
            }
        }
    }

    /// 贡献者数量快照。
    #[must_use]
    pub fn contributor_count(&self) -> usize {
        match &*self.entries.lock() {
            GroupEntries::Empty => 0,
            GroupEntries::Single(_) => 1,
            GroupEntries::Many(members) => members.len(),
        }
    }
}
