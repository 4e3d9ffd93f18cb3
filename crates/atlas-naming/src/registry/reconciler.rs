//! # 注册表调和器（RegistryReconciler）
//!
//! ## 核心意图（Why）
//! - 订阅注册表变更流，把注册/属性更新/注销事件转译为对树根的自动绑定、
//!   搬移与解除调用，使树始终收敛到注册表声明的命名状态；
//! - 维护“条目身份 → 最近一次绑定名称”的旁路索引，让改名与注销总能定位
//!   到正确的旧绑定。
//!
//! ## 架构定位（Where）
//! - 树根 `Arc` 在构造时显式传入并由调和器持有，不存在进程级全局状态；
//! - 事件在注册表的回调线程上逐个到达，与门面调用方线程并发执行，全部
//!   修改都走树的条件原语。
//!
//! ## 契约说明（What）
//! - 名称属性无法解析或为空时告警并跳过该条目——注册表内容不可信是常态；
//! - [`publish`](RegistryReconciler::publish) 注册的条目与外部条目走同一条
//!   事件路径入树；其注销租约被记录在案，停机时恰好一次地释放，聚合器上
//!   仍有其他贡献者的条目视为外部所有而跳过；
//! - [`shutdown`](RegistryReconciler::shutdown) 幂等：取消订阅、释放租约、
//!   回收本地绑定，重复调用为无操作。

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::core::entry::{NodeEntry, ResourceHandle};
use crate::core::name::Name;
use crate::core::node::NamespaceNode;
use crate::registry::{
    RegistrationLease, RegistryEvent, RegistryObserver, ResourceId, ResourceRegistry,
    SubscriptionId,
};

/// 将注册表变更流调和进命名树的组件。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - 生命周期与树根一致：[`start`](RegistryReconciler::start) 订阅一次，
///     [`shutdown`](RegistryReconciler::shutdown) 取消订阅并执行释放走查；
///   - 事件处理幂等：同一事件重放不会破坏树的一致性；
/// - **风险 (Trade-offs)**：与针对同一身份的在途绑定存在线性化灰区（见
///   树的自动绑定契约），依赖后续事件收敛，不做阻塞等待。
pub struct RegistryReconciler {
    root: Arc<NamespaceNode>,
    registry: Arc<dyn ResourceRegistry>,
    bound: DashMap<ResourceId, Name>,
    published: DashMap<ResourceId, Arc<RegistrationLease>>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl RegistryReconciler {
    /// 订阅注册表并开始调和；订阅回放会立刻重建既有注册项的绑定。
    #[must_use]
    pub fn start(root: Arc<NamespaceNode>, registry: Arc<dyn ResourceRegistry>) -> Arc<Self> {
        let reconciler = Arc::new(Self {
            root,
            registry,
            bound: DashMap::new(),
            published: DashMap::new(),
            subscription: Mutex::new(None),
        });
        let observer: Arc<dyn RegistryObserver> = Arc::clone(&reconciler) as _;
        let subscription = reconciler.registry.subscribe(observer);
        *reconciler.subscription.lock() = Some(subscription);
        info!("注册表调和器已订阅变更流");
        reconciler
    }

    /// 调和器驱动的树根。
    #[must_use]
    pub fn root(&self) -> &Arc<NamespaceNode> {
        &self.root
    }

    /// 以命名核心自身的名义向注册表发布一个值。
    ///
    /// 绑定本身经由随后的注册事件入树；这里只记录注销租约，供停机时恰好
    /// 一次地释放。
    pub fn publish(&self, name: &str, value: Arc<dyn Any + Send + Sync>) -> ResourceId {
        let (id, lease) = self.registry.register(name, value);
        self.published.insert(id, Arc::new(lease));
        id
    }

    /// 某条目身份当前是否由核心发布且仍未释放。
    #[must_use]
    pub fn is_published(&self, id: ResourceId) -> bool {
        self.published
            .get(&id)
            .is_some_and(|lease| !lease.is_released())
    }

    /// 取消订阅并执行停机清理。
    ///
    /// # 教案式说明
    /// - **执行 (How)**：
    ///   1. 取消订阅，停止接收新事件；
    ///   2. 走查核心发布的租约：绑定仍被多贡献者聚合器背书的条目视为外部
    ///      所有而跳过，其余恰好一次地注销；
    ///   3. 对树执行“跳过聚合器”的整树回收，清掉调用方的本地绑定。
    /// - **契约 (What)**：幂等；与并发注销事件竞争时租约的原子核销保证不会
    ///   重复注销。
    pub fn shutdown(&self) {
        let subscription = self.subscription.lock().take();
        let Some(subscription) = subscription else {
            return;
        };
        self.registry.unsubscribe(subscription);

        for item in self.published.iter() {
            let id = *item.key();
            let lease = Arc::clone(item.value());
            if self.externally_shared(id) {
                debug!(%id, "条目仍由多贡献者聚合器背书，按外部所有跳过释放");
                continue;
            }
            if lease.release(self.registry.as_ref()) {
                debug!(%id, "已释放核心发布的注册项");
            }
        }

        let report = self.root.scrub();
        info!(
            removed = report.removed,
            skipped = report.skipped,
            "注册表调和器已停机，整树回收完成"
        );
    }

    /// 条目的当前绑定是否由仍有其他贡献者的聚合器背书。
    fn externally_shared(&self, id: ResourceId) -> bool {
        let Some(name) = self.bound.get(&id).map(|entry| entry.value().clone()) else {
            return false;
        };
        match self.root.resolve_entry(&name) {
            Ok(NodeEntry::Group(group)) => group.contributor_count() > 1,
            _ => false,
        }
    }

    /// 解析名称属性并把条目绑定到树上；身份索引随之更新。
    fn apply_declared_name(&self, id: ResourceId, declared: &str) {
        let name = match Name::parse(declared) {
            Ok(name) if !name.is_empty() => name,
            Ok(_) => {
                warn!(%id, declared, "名称属性为空，跳过该注册项");
                return;
            }
            Err(error) => {
                warn!(%id, declared, code = error.code(), "名称属性无法解析，跳过该注册项");
                return;
            }
        };
        match self.root.auto_bind(&name, ResourceHandle::registry(id)) {
            Ok(()) => {
                debug!(%id, name = %name, "注册项已绑定");
                self.bound.insert(id, name);
            }
            Err(error) => {
                warn!(
                    %id,
                    name = %name,
                    code = error.code(),
                    "自动绑定失败，名称已被其他类别条目占用"
                );
            }
        }
    }

    fn retract(&self, id: ResourceId) {
        if let Some((_, name)) = self.bound.remove(&id) {
            self.root.ensure_not_bound(&name, &ResourceHandle::registry(id));
            debug!(%id, name = %name, "注册项绑定已解除");
        }
    }
}

impl RegistryObserver for RegistryReconciler {
    fn on_event(&self, event: &RegistryEvent) {
        match event {
            RegistryEvent::Registered { id, name } => {
                self.apply_declared_name(*id, name);
            }
            RegistryEvent::Updated { id, name } => {
                let previous = self.bound.get(id).map(|entry| entry.value().clone());
                let declared = Name::parse(name).ok().filter(|name| !name.is_empty());
                if declared.is_some() && declared.as_ref() == previous.as_ref() {
                    // 名称未变的属性更新无需搬移。
                    return;
                }
                self.retract(*id);
                self.apply_declared_name(*id, name);
            }
            RegistryEvent::Unregistered { id } => {
                self.retract(*id);
                if let Some((_, lease)) = self.published.remove(id) {
                    // 外部已完成注销，只做账面核销，防止停机时二次注销。
                    lease.mark_released();
                }
            }
        }
    }
}
