//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义命名空间对外暴露的错误语义：名称非法、未命中、冲突、类别不符、
//!   上下文非空、部分完成与解析失败；
//! - 错误码保持稳定字符串形式，便于日志检索、告警聚合与跨组件关联。
//!
//! ## 设计要求（What）
//! - `std` 特性下派生 `thiserror::Error` 以兼容 `std::error::Error` 生态；
//!   `alloc` 构建提供手写 `Display`，保证受限运行时同样可读；
//! - 导航类失败必须携带“失败点的完全限定前缀”，而非调用方传入的完整目标名，
//!   使调用方能够定位断链位置；
//! - 尽力而为的清理路径（自动删除、解除绑定）不得抛出本模块错误，竞态一律
//!   以重试或忽略化解。

#[cfg(not(feature = "std"))]
use core::fmt;

use alloc::string::String;

#[cfg(feature = "std")]
use thiserror::Error;

use crate::core::name::Name;

/// 命名空间核心错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：以细粒度枚举覆盖绑定协议的全部失败面，让调用方能够区分
///   “重试无益”（如 [`NameAlreadyBound`](NamingError::NameAlreadyBound)）与
///   “按未绑定处理”（如并发清空聚合器导致的
///   [`NameNotFound`](NamingError::NameNotFound)）；
/// - **契约 (What)**：
///   - 所有变体满足 `Send + Sync + 'static`，可安全跨线程传播；
///   - 携带 [`Name`] 的变体，其名称为失败点的完全限定前缀；
///   - [`code`](NamingError::code) 返回稳定错误码，取值见 [`codes`]；
/// - **风险 (Trade-offs)**：上下文字段使用堆分配字符串，牺牲少量分配换取可读
///   诊断信息；热路径上错误本身即属罕见事件，代价可接受。
#[cfg_attr(feature = "std", derive(Error))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NamingError {
    /// 名称格式非法，例如出现空段。
    #[cfg_attr(feature = "std", error("invalid name: {detail}"))]
    InvalidName { detail: String },

    /// 名称未绑定；也涵盖聚合器被并发清空的瞬时窗口。
    ///
    /// - **契约 (What)**：调用方必须将并发清空与“从未绑定”视为同一结果，
    ///   不得据此推断绑定曾经存在。
    #[cfg_attr(feature = "std", error("name `{name}` is not bound"))]
    NameNotFound { name: Name },

    /// insert-if-absent 语义下的占用冲突，既有条目被严格保留。
    #[cfg_attr(feature = "std", error("name `{name}` is already bound"))]
    NameAlreadyBound { name: Name },

    /// 期望一个上下文节点，实际命中了资源句柄或聚合器（或反之）。
    #[cfg_attr(feature = "std", error("name `{name}` does not refer to a context"))]
    NotContext { name: Name },

    /// 对仍有子条目的上下文执行销毁。
    #[cfg_attr(feature = "std", error("context `{name}` is not empty"))]
    ContextNotEmpty { name: Name },

    /// 重命名或子树清理因外部所有的聚合器条目而只完成了可迁移部分。
    #[cfg_attr(
        feature = "std",
        error("operation on `{name}` completed partially: {detail}")
    )]
    PartialResult { name: Name, detail: String },

    /// 门面解析步骤失败（解析协作方拒绝或资源已被撤回）。
    #[cfg_attr(feature = "std", error("failed to resolve `{name}`: {detail}"))]
    Resolution { name: Name, detail: String },
}

impl NamingError {
    /// 返回稳定错误码，供日志与告警聚合使用。
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            NamingError::InvalidName { .. } => codes::NAME_INVALID,
            NamingError::NameNotFound { .. } => codes::NAME_NOT_FOUND,
            NamingError::NameAlreadyBound { .. } => codes::NAME_BOUND,
            NamingError::NotContext { .. } => codes::CONTEXT_EXPECTED,
            NamingError::ContextNotEmpty { .. } => codes::CONTEXT_NOT_EMPTY,
            NamingError::PartialResult { .. } => codes::OP_PARTIAL,
            NamingError::Resolution { .. } => codes::RESOLVE_FAILURE,
        }
    }
}

#[cfg(not(feature = "std"))]
impl fmt::Display for NamingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingError::InvalidName { detail } => write!(f, "invalid name: {detail}"),
            NamingError::NameNotFound { name } => write!(f, "name `{name}` is not bound"),
            NamingError::NameAlreadyBound { name } => {
                write!(f, "name `{name}` is already bound")
            }
            NamingError::NotContext { name } => {
                write!(f, "name `{name}` does not refer to a context")
            }
            NamingError::ContextNotEmpty { name } => write!(f, "context `{name}` is not empty"),
            NamingError::PartialResult { name, detail } => {
                write!(f, "operation on `{name}` completed partially: {detail}")
            }
            NamingError::Resolution { name, detail } => {
                write!(f, "failed to resolve `{name}`: {detail}")
            }
        }
    }
}

/// 命名域的稳定错误码常量集合。
///
/// # 设计背景（Why）
/// - 错误码遵循 `<领域>.<语义>` 命名约定，与观测系统的检索习惯对齐；
/// - 枚举变体可随迭代调整字段，错误码字符串保持兼容，避免破坏下游告警规则。
pub mod codes {
    /// 名称格式非法。
    pub const NAME_INVALID: &str = "naming.name.invalid";
    /// 名称未绑定（含聚合器并发清空）。
    pub const NAME_NOT_FOUND: &str = "naming.name.not_found";
    /// insert-if-absent 冲突。
    pub const NAME_BOUND: &str = "naming.name.bound";
    /// 期望上下文节点而未命中。
    pub const CONTEXT_EXPECTED: &str = "naming.context.expected";
    /// 销毁目标上下文非空。
    pub const CONTEXT_NOT_EMPTY: &str = "naming.context.not_empty";
    /// 操作仅部分完成。
    pub const OP_PARTIAL: &str = "naming.op.partial";
    /// 解析步骤失败。
    pub const RESOLVE_FAILURE: &str = "naming.resolve.failure";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        let err = NamingError::NameNotFound { name: Name::empty() };
        assert_eq!(err.code(), codes::NAME_NOT_FOUND);
        let err = NamingError::PartialResult {
            name: Name::empty(),
            detail: String::from("x"),
        };
        assert_eq!(err.code(), codes::OP_PARTIAL);
    }

    #[cfg(feature = "std")]
    #[test]
    fn display_carries_failure_prefix() {
        let name = Name::parse("a/b").expect("应可解析");
        let err = NamingError::NotContext { name };
        assert_eq!(
            alloc::string::ToString::to_string(&err),
            "name `a/b` does not refer to a context"
        );
    }
}
