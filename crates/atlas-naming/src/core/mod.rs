//! # 命名树核心
//!
//! - [`name`] 在 `alloc` 下即可用，承载结构化名称的数据模型；
//! - [`entry`]、[`group`]、[`node`] 依赖 `std` 特性：并发子映射、聚合器与
//!   树节点协议都建立在线程安全组件之上。

pub mod name;

#[cfg(feature = "std")]
pub mod entry;

#[cfg(feature = "std")]
pub mod group;

#[cfg(feature = "std")]
pub mod node;
