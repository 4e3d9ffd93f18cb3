//! # 命名门面（NamingFacade）
//!
//! ## 核心意图（Why）
//! - 为应用代码提供目录服务风格的调用面：`bind`/`rebind`/`unbind`/`lookup`/
//!   `list`/`list_bindings`/`create_subcontext`/`destroy_subcontext`/`rename`，
//!   将名称级外部操作翻译为树节点操作；
//! - 查找结果的多态归一：命中子节点时包装为限定在该节点之下的新门面，命中
//!   句柄（含聚合器当前值）时先经外部解析步骤再返回。
//!
//! ## 架构定位（Where）
//! - 每个调用方持有自己的门面实例与互不解释的环境键值配置；所有门面共享
//!   同一棵树，互操作完全经由节点的条件原语；
//! - 解析步骤是协作方接口 [`ObjectResolver`]，默认实现
//!   [`RegistryResolver`] 会将注册表索引句柄反引用为当下存活值。
//!
//! ## 契约说明（What）
//! - 解析协作方的失败以 [`NamingError::Resolution`] 携带名称向上传播；
//! - `rename` 与子树清理遵循“跳过聚合器条目”的外部所有权策略：可迁移部分
//!   成功后，若仍有外部所有条目滞留，以
//!   [`NamingError::PartialResult`] 报告部分完成。

use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::core::entry::{EntryKind, NodeEntry, ResourceHandle};
use crate::core::name::Name;
use crate::core::node::{NamespaceNode, Resolved};
use crate::error::NamingError;
use crate::registry::ResourceRegistry;

/// 解析协作方返回的失败。
pub type ResolveError = Box<dyn Error + Send + Sync + 'static>;

/// 外部解析步骤：在句柄返回给调用方前，按名称将其转换为更丰富的值。
///
/// # 教案式说明
/// - **意图 (Why)**：注册表索引句柄只携带条目身份，真正的存活值必须在查找
///   时刻反引用；本地句柄通常原样透传；
/// - **契约 (What)**：失败（包括资源已被撤回）由门面包装为
///   [`NamingError::Resolution`]；实现必须可跨线程共享。
pub trait ObjectResolver: Send + Sync {
    /// 将命中的句柄解析为返回值。
    fn resolve(
        &self,
        handle: &ResourceHandle,
        name: &Name,
    ) -> Result<Arc<dyn Any + Send + Sync>, ResolveError>;
}

/// 仅透传本地载荷的解析器；注册表句柄一律拒绝。
///
/// 适用于纯本地命名（不接注册表）的部署与测试。
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughResolver;

impl ObjectResolver for PassthroughResolver {
    fn resolve(
        &self,
        handle: &ResourceHandle,
        _name: &Name,
    ) -> Result<Arc<dyn Any + Send + Sync>, ResolveError> {
        handle
            .local_value()
            .ok_or_else(|| "registry-indexed handle requires a registry-backed resolver".into())
    }
}

/// 经注册表反引用索引句柄的默认解析器。
pub struct RegistryResolver {
    registry: Arc<dyn ResourceRegistry>,
}

impl RegistryResolver {
    /// 以注册表协作方构造解析器。
    #[must_use]
    pub fn new(registry: Arc<dyn ResourceRegistry>) -> Self {
        Self { registry }
    }
}

impl ObjectResolver for RegistryResolver {
    fn resolve(
        &self,
        handle: &ResourceHandle,
        _name: &Name,
    ) -> Result<Arc<dyn Any + Send + Sync>, ResolveError> {
        if let Some(value) = handle.local_value() {
            return Ok(value);
        }
        let id = handle
            .registry_id()
            .ok_or("handle carries neither a local payload nor a registry identity")?;
        self.registry
            .resolve_value(id)
            .ok_or_else(|| format!("resource {id} has been withdrawn").into())
    }
}

/// 查找命中的调用方视角结果。
pub enum LookupOutcome {
    /// 命中子上下文：限定在该节点之下的新门面。
    Context(NamingFacade),
    /// 命中资源：解析步骤产出的值。
    Value(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(_) => f.write_str("LookupOutcome::Context"),
            Self::Value(_) => f.write_str("LookupOutcome::Value"),
        }
    }
}

/// 单个调用方基于某节点的命名视图。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - 门面仅能看见其作用域节点之下的条目；嵌套查找产出的门面继承环境与
///     解析器；
///   - 环境为任意键值配置，核心不做解释；
/// - **风险 (Trade-offs)**：门面自身不做缓存，每次操作都走树的实时状态，
///   以一致性换取少量重复导航。
#[derive(Clone)]
pub struct NamingFacade {
    node: Arc<NamespaceNode>,
    environment: HashMap<String, String>,
    resolver: Arc<dyn ObjectResolver>,
}

impl NamingFacade {
    /// 以作用域节点与解析器构造门面。
    #[must_use]
    pub fn new(node: Arc<NamespaceNode>, resolver: Arc<dyn ObjectResolver>) -> Self {
        Self {
            node,
            environment: HashMap::new(),
            resolver,
        }
    }

    /// 附带初始环境的构造入口。
    #[must_use]
    pub fn with_environment(
        node: Arc<NamespaceNode>,
        resolver: Arc<dyn ObjectResolver>,
        environment: HashMap<String, String>,
    ) -> Self {
        Self {
            node,
            environment,
            resolver,
        }
    }

    /// 作用域节点。
    #[must_use]
    pub fn scope(&self) -> &Arc<NamespaceNode> {
        &self.node
    }

    /// 调用方环境（核心不解释其内容）。
    #[must_use]
    pub fn environment(&self) -> &HashMap<String, String> {
        &self.environment
    }

    /// 可变访问调用方环境。
    pub fn environment_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.environment
    }

    fn child_facade(&self, node: Arc<NamespaceNode>) -> NamingFacade {
        NamingFacade {
            node,
            environment: self.environment.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }

    fn resolve_handle(
        &self,
        handle: &ResourceHandle,
        name: &Name,
    ) -> Result<Arc<dyn Any + Send + Sync>, NamingError> {
        self.resolver
            .resolve(handle, name)
            .map_err(|cause| NamingError::Resolution {
                name: name.clone(),
                detail: cause.to_string(),
            })
    }

    /// 查找：子节点包装为新门面，句柄经解析步骤返回。
    pub fn lookup(&self, name: &Name) -> Result<LookupOutcome, NamingError> {
        match self.node.lookup(name)? {
            Resolved::Context(node) => Ok(LookupOutcome::Context(self.child_facade(node))),
            Resolved::Handle(handle) => self
                .resolve_handle(&handle, name)
                .map(LookupOutcome::Value),
        }
    }

    /// 以 insert-if-absent 语义绑定本地值。
    pub fn bind(&self, name: &Name, value: Arc<dyn Any + Send + Sync>) -> Result<(), NamingError> {
        self.node.bind(name, ResourceHandle::local(value))
    }

    /// 无条件替换绑定为给定本地值。
    pub fn rebind(
        &self,
        name: &Name,
        value: Arc<dyn Any + Send + Sync>,
    ) -> Result<(), NamingError> {
        self.node.rebind(name, ResourceHandle::local(value))?;
        Ok(())
    }

    /// 解除绑定；聚合器背书的条目按外部所有跳过并报部分完成。
    pub fn unbind(&self, name: &Name) -> Result<(), NamingError> {
        self.node.unbind(name)
    }

    /// 列举目标上下文的段名与条目类别。
    pub fn list(&self, name: &Name) -> Result<Vec<(String, EntryKind)>, NamingError> {
        Ok(self
            .node
            .children_snapshot(name)?
            .into_iter()
            .map(|(segment, entry)| (segment.as_ref().to_owned(), entry.kind()))
            .collect())
    }

    /// 列举目标上下文的段名与解析后的值。
    ///
    /// 聚合器恰处于并发清空窗口时，该条目按未绑定跳过。
    pub fn list_bindings(
        &self,
        name: &Name,
    ) -> Result<Vec<(String, LookupOutcome)>, NamingError> {
        let mut bindings = Vec::new();
        for (segment, entry) in self.node.children_snapshot(name)? {
            let child_name = name.child(&segment);
            let outcome = match entry {
                NodeEntry::Context(node) => LookupOutcome::Context(self.child_facade(node)),
                NodeEntry::Leaf(handle) => {
                    LookupOutcome::Value(self.resolve_handle(&handle, &child_name)?)
                }
                NodeEntry::Group(group) => match group.last_entry() {
                    Some(handle) => {
                        LookupOutcome::Value(self.resolve_handle(&handle, &child_name)?)
                    }
                    None => continue,
                },
            };
            bindings.push((segment.as_ref().to_owned(), outcome));
        }
        Ok(bindings)
    }

    /// 创建显式子上下文并返回限定其下的门面。
    pub fn create_subcontext(&self, name: &Name) -> Result<NamingFacade, NamingError> {
        let node = self.node.create_subcontext(name)?;
        Ok(self.child_facade(node))
    }

    /// 销毁空的子上下文。
    pub fn destroy_subcontext(&self, name: &Name) -> Result<(), NamingError> {
        self.node.destroy_subcontext(name)
    }

    /// 重命名：句柄改绑至新名称；子树递归搬迁，聚合器条目按外部所有滞留。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：
    ///   - 旧名指向句柄：先在新名 insert-if-absent，再条件移除旧绑定；
    ///   - 旧名指向节点：在新名创建子上下文并递归搬迁内容；聚合器背书的
    ///     条目无法迁移，可迁移部分完成后若有滞留，报
    ///     [`NamingError::PartialResult`]；
    ///   - 旧名直接命中聚合器：整体外部所有，报 `PartialResult` 且不迁移；
    /// - **执行 (How)**：搬迁自上而下逐段进行，源侧移除均为条件操作，与
    ///   并发修改的竞争按已处理忽略。
    pub fn rename(&self, old: &Name, new: &Name) -> Result<(), NamingError> {
        match self.node.resolve_entry(old)? {
            NodeEntry::Leaf(handle) => {
                self.node.bind(new, handle.clone())?;
                self.node.ensure_not_bound(old, &handle);
                Ok(())
            }
            NodeEntry::Group(_) => Err(NamingError::PartialResult {
                name: old.clone(),
                detail: "externally owned aggregator binding cannot be migrated".to_owned(),
            }),
            NodeEntry::Context(source) => {
                let destination = self.node.create_subcontext(new)?;
                let clean = Self::migrate_contents(&source, &destination)?;
                if clean && source.is_empty() {
                    // 源子树已空：条件销毁,竞态按已移除忽略。
                    let _ = self.node.destroy_subcontext(old);
                    Ok(())
                } else {
                    warn!(old = %old, new = %new, "重命名仅部分完成，外部所有条目滞留原处");
                    Err(NamingError::PartialResult {
                        name: old.clone(),
                        detail: "externally owned entries were left under the old name"
                            .to_owned(),
                    })
                }
            }
        }
    }

    /// 递归搬迁 `source` 的内容到 `destination`；返回源侧是否完全清空。
    fn migrate_contents(
        source: &Arc<NamespaceNode>,
        destination: &Arc<NamespaceNode>,
    ) -> Result<bool, NamingError> {
        let mut clean = true;
        for (segment, entry) in source.children_snapshot(&Name::empty())? {
            let local = Name::empty().child(&segment);
            match entry {
                NodeEntry::Leaf(handle) => {
                    destination.bind(&local, handle.clone())?;
                    source.ensure_not_bound(&local, &handle);
                }
                NodeEntry::Group(_) => {
                    clean = false;
                }
                NodeEntry::Context(nested) => {
                    let target = destination.create_subcontext(&local)?;
                    let nested_clean = Self::migrate_contents(&nested, &target)?;
                    if nested_clean && nested.is_empty() {
                        let _ = source.destroy_subcontext(&local);
                    } else {
                        clean = false;
                    }
                }
            }
        }
        Ok(clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facade() -> NamingFacade {
        NamingFacade::new(NamespaceNode::new_root(), Arc::new(PassthroughResolver))
    }

    fn value_of(text: &str) -> Arc<dyn Any + Send + Sync> {
        Arc::new(text.to_owned())
    }

    #[test]
    fn bind_lookup_roundtrip_resolves_value() {
        let facade = facade();
        let name = Name::parse("cfg/endpoint").expect("应可解析");
        facade
            .create_subcontext(&Name::parse("cfg").expect("应可解析"))
            .expect("创建子上下文应成功");
        facade.bind(&name, value_of("dts")).expect("绑定应成功");

        match facade.lookup(&name).expect("查找应命中") {
            LookupOutcome::Value(value) => {
                let text = value.downcast_ref::<String>().expect("载荷应为字符串");
                assert_eq!(text, "dts");
            }
            LookupOutcome::Context(_) => panic!("不应命中上下文"),
        }
    }

    #[test]
    fn nested_lookup_yields_scoped_facade() {
        let facade = facade();
        let sub = Name::parse("apps").expect("应可解析");
        facade.create_subcontext(&sub).expect("创建子上下文应成功");
        facade
            .bind(&Name::parse("apps/ds").expect("应可解析"), value_of("v"))
            .expect("绑定应成功");

        let scoped = match facade.lookup(&sub).expect("查找应命中") {
            LookupOutcome::Context(scoped) => scoped,
            LookupOutcome::Value(_) => panic!("应命中上下文"),
        };
        match scoped
            .lookup(&Name::parse("ds").expect("应可解析"))
            .expect("作用域内查找应命中")
        {
            LookupOutcome::Value(_) => {}
            LookupOutcome::Context(_) => panic!("不应命中上下文"),
        }
    }

    #[test]
    fn list_reports_entry_kinds() {
        let facade = facade();
        facade
            .create_subcontext(&Name::parse("sub").expect("应可解析"))
            .expect("创建子上下文应成功");
        facade
            .bind(&Name::parse("leaf").expect("应可解析"), value_of("v"))
            .expect("绑定应成功");

        let mut listing = facade.list(&Name::empty()).expect("列举应成功");
        listing.sort_by(|left, right| left.0.cmp(&right.0));
        assert_eq!(
            listing,
            vec![
                ("leaf".to_owned(), EntryKind::Leaf),
                ("sub".to_owned(), EntryKind::Context),
            ]
        );
    }
}
