//! # 资源注册表协作方契约
//!
//! ## 角色定位（Why）
//! - 命名核心不拥有资源目录本身：发布/订阅式的注册表是外部协作方，这里只
//!   规定其接口边界——变更事件流、按身份解析存活值、注册/注销；
//! - 调和器（[`reconciler::RegistryReconciler`]）订阅变更流并驱动树的绑定、
//!   搬移与移除；门面的解析步骤经由 [`ResourceRegistry::resolve_value`]
//!   反引用索引句柄。
//!
//! ## 契约说明（What）
//! - 事件按注册表交付顺序逐个派发（同一时刻至多一个事件在途），但与调用方
//!   线程并发；
//! - [`ResourceRegistry::subscribe`] 必须对既有注册项回放合成的注册事件，
//!   重启后的树即由此自注册表状态重建；
//! - [`RegistrationLease`] 封装“恰好一次”的注销副作用：无论停机清理与
//!   注销事件如何竞争，外部注销至多执行一次。

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod memory;
pub mod reconciler;

pub use reconciler::RegistryReconciler;

/// 注册表条目的稳定身份。
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResourceId(u64);

impl ResourceId {
    /// 由原始数值构造身份。
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// 原始数值表示。
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 订阅凭据，用于取消订阅。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// 由原始数值构造凭据。
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// 注册表变更事件；每个事件携带条目身份及其声明的名称属性。
#[derive(Clone, Debug)]
pub enum RegistryEvent {
    /// 新条目注册。
    Registered {
        /// 条目身份。
        id: ResourceId,
        /// 声明的名称属性（未经解析的原始文本）。
        name: String,
    },
    /// 既有条目的属性更新（名称可能变化，也可能不变）。
    Updated {
        /// 条目身份。
        id: ResourceId,
        /// 更新后的名称属性。
        name: String,
    },
    /// 条目注销。
    Unregistered {
        /// 条目身份。
        id: ResourceId,
    },
}

/// 变更流的观察方。
pub trait RegistryObserver: Send + Sync {
    /// 处理一个按序交付的变更事件。
    ///
    /// 实现不得在回调内再调用注册表的注册/注销接口，否则与事件派发的
    /// 串行化互斥冲突。
    fn on_event(&self, event: &RegistryEvent);
}

/// 资源注册表的接口边界。
pub trait ResourceRegistry: Send + Sync {
    /// 以给定名称属性注册一个值，返回条目身份与注销租约。
    fn register(
        &self,
        name: &str,
        value: Arc<dyn Any + Send + Sync>,
    ) -> (ResourceId, RegistrationLease);

    /// 注销条目；条目不存在时返回 `false`。
    fn unregister(&self, id: ResourceId) -> bool;

    /// 解析条目的当下存活值；已撤回的条目返回 `None`。
    fn resolve_value(&self, id: ResourceId) -> Option<Arc<dyn Any + Send + Sync>>;

    /// 订阅变更流；实现必须对既有注册项回放合成的 [`RegistryEvent::Registered`]。
    fn subscribe(&self, observer: Arc<dyn RegistryObserver>) -> SubscriptionId;

    /// 取消订阅。
    fn unsubscribe(&self, subscription: SubscriptionId);
}

/// 注销租约：对外部注册项的“恰好一次”释放凭据。
///
/// # 教案式说明
/// - **意图 (Why)**：停机清理与外部注销事件可能竞争同一条目，释放副作用
///   必须恰好执行一次；
/// - **执行 (How)**：原子布尔 swap 判定首个释放者；
///   [`release`](RegistrationLease::release) 由胜出方执行真正的注销调用，
///   [`mark_released`](RegistrationLease::mark_released) 供“外部已先注销”
///   的路径只做账面核销；
/// - **契约 (What)**：两个入口都幂等，重复调用返回 `false` 且无副作用。
#[derive(Debug)]
pub struct RegistrationLease {
    id: ResourceId,
    released: AtomicBool,
}

impl RegistrationLease {
    /// 为条目身份构造未释放的租约。
    #[must_use]
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            released: AtomicBool::new(false),
        }
    }

    /// 租约对应的条目身份。
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// 是否已释放（或已核销）。
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// 执行释放：首个调用者向注册表发起注销，后续调用为无操作。
    pub fn release(&self, registry: &dyn ResourceRegistry) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        registry.unregister(self.id);
        true
    }

    /// 账面核销：外部已完成注销时调用，不触发任何副作用。
    pub fn mark_released(&self) -> bool {
        !self.released.swap(true, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingRegistry {
        unregistered: std::sync::atomic::AtomicUsize,
    }

    impl ResourceRegistry for CountingRegistry {
        fn register(
            &self,
            _name: &str,
            _value: Arc<dyn Any + Send + Sync>,
        ) -> (ResourceId, RegistrationLease) {
            unimplemented!("本测试只关心注销计数")
        }

        fn unregister(&self, _id: ResourceId) -> bool {
            self.unregistered
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            true
        }

        fn resolve_value(&self, _id: ResourceId) -> Option<Arc<dyn Any + Send + Sync>> {
            None
        }

        fn subscribe(&self, _observer: Arc<dyn RegistryObserver>) -> SubscriptionId {
            SubscriptionId::new(0)
        }

        fn unsubscribe(&self, _subscription: SubscriptionId) {}
    }

    #[test]
    fn lease_releases_exactly_once() {
        let registry = CountingRegistry {
            unregistered: std::sync::atomic::AtomicUsize::new(0),
        };
        let lease = RegistrationLease::new(ResourceId::new(1));
        assert!(lease.release(&registry), "首次释放应生效");
        assert!(!lease.release(&registry), "重复释放应为无操作");
        assert_eq!(
            registry
                .unregistered
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[test]
    fn mark_released_preempts_release() {
        let registry = CountingRegistry {
            unregistered: std::sync::atomic::AtomicUsize::new(0),
        };
        let lease = RegistrationLease::new(ResourceId::new(2));
        assert!(lease.mark_released(), "首次核销应生效");
        assert!(!lease.release(&registry), "核销后的释放不得再注销");
        assert_eq!(
            registry
                .unregistered
                .load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }
}
