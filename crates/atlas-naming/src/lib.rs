#![cfg_attr(not(feature = "std"), no_std)]

//! # atlas-naming
//!
//! ## 定位与职责（Why）
//! - 实现一棵可并发修改的分层命名树，将结构化名称映射到资源；在常规名称树
//!   之上叠加两项特殊行为：自动绑定路径上的中间段按需创建、清空即删，以及
//!   同名多资源发布时的碰撞容忍聚合（查找返回最近注册者，移除任一贡献者都
//!   正确收敛绑定）；
//! - 树在内存中常驻、进程内唯一权威，重启后由注册表状态经订阅回放重建。
//!
//! ## 架构嵌入（Where）
//! - `core` 模块承载名称模型与树的绑定/查找/移除协议；
//! - `facade` 模块是调用方入口，处理查找结果的多态归一与外部解析步骤；
//! - `registry` 模块规定注册表协作方契约，并提供把变更流调和进树的调和器；
//! - `error` 模块集中定义错误分类与稳定错误码。
//!
//! ## Feature 策略（Trade-offs）
//! - `std`（默认）启用并发树、门面与调和器，依赖 `dashmap`、`parking_lot`、
//!   `arc-swap` 等线程安全组件；
//! - `alloc` 仅保留名称与错误契约，便于受限运行时复用数据模型层。

extern crate alloc;

/// 名称模型与并发命名树协议的核心入口。
///
/// - **意图说明 (Why)**：集中树节点、聚合器与子条目联合类型，绑定协议的全部
///   条件原语都在这里实现；
/// - **契约定位 (What)**：读取无锁；两处互斥区分别是聚合器实例与子映射分片。
pub mod core;

/// 错误类型与稳定错误码集中声明处。
///
/// - **意图说明 (Why)**：统一描述名称非法、未命中、冲突、类别不符等失败面；
/// - **契约定位 (What)**：`std` 下以 `thiserror::Error` 派生，错误码见
///   [`error::codes`]。
pub mod error;

/// 调用方门面：目录服务风格的外部操作面。
///
/// - **意图说明 (Why)**：翻译名称级操作为节点操作，归一节点/聚合器/句柄三类
///   命中结果，并经外部解析步骤产出返回值；
/// - **契约定位 (What)**：重命名与子树清理遵循“跳过聚合器”的外部所有权策略。
#[cfg(feature = "std")]
pub mod facade;

/// 注册表协作方契约与变更流调和器。
///
/// - **意图说明 (Why)**：注册表是外部协作方，这里仅规定接口边界并实现事件到
///   树操作的转译；
/// - **契约定位 (What)**：订阅回放重建、旁路身份索引、停机时恰好一次的释放。
#[cfg(feature = "std")]
pub mod registry;

pub use crate::core::name::Name;
pub use crate::error::NamingError;

#[cfg(feature = "std")]
pub use crate::core::entry::{EntryKind, NodeEntry, ResourceHandle};
#[cfg(feature = "std")]
pub use crate::core::group::BindingGroup;
#[cfg(feature = "std")]
pub use crate::core::node::{NamespaceNode, Resolved, ScrubReport};
#[cfg(feature = "std")]
pub use crate::facade::{
    LookupOutcome, NamingFacade, ObjectResolver, PassthroughResolver, RegistryResolver,
};
#[cfg(feature = "std")]
pub use crate::registry::{
    RegistryEvent, RegistryReconciler, ResourceId, ResourceRegistry,
};
