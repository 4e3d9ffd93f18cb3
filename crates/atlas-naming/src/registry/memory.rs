//! # 进程内注册表实现（MemoryRegistry）
//!
//! ## 设计定位（Why）
//! - 调和器与门面的契约测试、示例与纯本地部署都需要一个行为完整的注册表；
//!   与其在各测试文件中重复手写桩对象，不如在 crate 内集中提供一份可复用
//!   实现，接口演进时获得单点编译错误提示；
//! - 实现刻意最小：无持久化、无过滤器语法，只忠实呈现契约要求的事件顺序
//!   与回放语义。
//!
//! ## 契约细节（What）
//! - 事件派发经内部互斥串行化：同一时刻至多一个事件在途，顺序即注册表
//!   交付顺序；
//! - [`subscribe`](MemoryRegistry::subscribe) 在同一串行区内登记观察方并
//!   回放全部既有条目的合成注册事件；
//! - 观察方回调内不得再调用注册/注销接口（与派发互斥冲突，见契约文档）。

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::registry::{
    RegistrationLease, RegistryEvent, RegistryObserver, ResourceId, ResourceRegistry,
    SubscriptionId,
};

struct RegistryRecord {
    name: String,
    value: Arc<dyn Any + Send + Sync>,
}

/// 进程内的发布/订阅注册表。
///
/// # 教案式说明
/// - **契约 (What)**：完整实现 [`ResourceRegistry`]，含订阅回放与按序派发；
/// - **执行 (How)**：条目存于 `DashMap`，观察方列表与派发串行区各用一把
///   `parking_lot::Mutex`；身份与订阅凭据由原子计数器单调分配；
/// - **风险 (Trade-offs)**：派发在调用方线程上同步执行，慢观察方会拖慢
///   注册/注销调用——测试与本地部署可接受。
#[derive(Default)]
pub struct MemoryRegistry {
    entries: DashMap<ResourceId, RegistryRecord>,
    observers: Mutex<Vec<(SubscriptionId, Arc<dyn RegistryObserver>)>>,
    dispatch: Mutex<()>,
    next_resource: AtomicU64,
    next_subscription: AtomicU64,
}

impl MemoryRegistry {
    /// 构造空注册表。
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 更新条目的名称属性并派发属性更新事件；条目不存在时返回 `false`。
    pub fn update_name(&self, id: ResourceId, name: &str) -> bool {
        let updated = match self.entries.get_mut(&id) {
            Some(mut record) => {
                record.name = name.to_owned();
                true
            }
            None => false,
        };
        if updated {
            self.emit(&RegistryEvent::Updated {
                id,
                name: name.to_owned(),
            });
        }
        updated
    }

    /// 当前注册条目数。
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 注册表是否为空。
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn emit(&self, event: &RegistryEvent) {
        let _serial = self.dispatch.lock();
        let observers: Vec<Arc<dyn RegistryObserver>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer.on_event(event);
        }
    }
}

impl ResourceRegistry for MemoryRegistry {
    fn register(
        &self,
        name: &str,
        value: Arc<dyn Any + Send + Sync>,
    ) -> (ResourceId, RegistrationLease) {
        let id = ResourceId::new(self.next_resource.fetch_add(1, Ordering::Relaxed) + 1);
        self.entries.insert(
            id,
            RegistryRecord {
                name: name.to_owned(),
                value,
            },
        );
        self.emit(&RegistryEvent::Registered {
            id,
            name: name.to_owned(),
        });
        (id, RegistrationLease::new(id))
    }

    fn unregister(&self, id: ResourceId) -> bool {
        if self.entries.remove(&id).is_none() {
            return false;
        }
        self.emit(&RegistryEvent::Unregistered { id });
        true
    }

    fn resolve_value(&self, id: ResourceId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries.get(&id).map(|record| Arc::clone(&record.value))
    }

    fn subscribe(&self, observer: Arc<dyn RegistryObserver>) -> SubscriptionId {
        let subscription =
            SubscriptionId::new(self.next_subscription.fetch_add(1, Ordering::Relaxed) + 1);
        let _serial = self.dispatch.lock();
        self.observers
            .lock()
            .push((subscription, Arc::clone(&observer)));
        // 回放既有条目,使订阅方从注册表状态重建视图。
        for entry in self.entries.iter() {
            observer.on_event(&RegistryEvent::Registered {
                id: *entry.key(),
                name: entry.value().name.clone(),
            });
        }
        subscription
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.observers
            .lock()
            .retain(|(existing, _)| *existing != subscription);
    }
}
