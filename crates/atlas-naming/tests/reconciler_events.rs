//! 注册表调和器的事件流契约测试。
//!
//! # 教案级导览
//!
//! - **Why**：调和器是树与外部注册表之间唯一的状态桥梁——订阅回放重建、
//!   改名搬移、注销清理与停机时恰好一次的释放都在这里闭环；
//! - **How**：以 crate 内置的进程内注册表驱动真实事件流，在主线程断言树
//!   与注册表的终态；
//! - **What**：覆盖回放重建、注册/改名/注销的树收敛、经注册表解析器的
//!   查找、发布条目的恰好一次释放与外部所有跳过。

use std::any::Any;
use std::sync::Arc;

use atlas_naming::error::codes;
use atlas_naming::registry::memory::MemoryRegistry;
use atlas_naming::registry::{RegistryReconciler, ResourceRegistry};
use atlas_naming::{LookupOutcome, Name, NamespaceNode, NamingFacade, RegistryResolver};

fn name(text: &str) -> Name {
    Name::parse(text).expect("测试名称应可解析")
}

fn value_of(text: &str) -> Arc<dyn Any + Send + Sync> {
    Arc::new(text.to_owned())
}

fn registry_facade(
    root: &Arc<NamespaceNode>,
    registry: &Arc<MemoryRegistry>,
) -> NamingFacade {
    let registry: Arc<dyn ResourceRegistry> = Arc::clone(registry) as _;
    NamingFacade::new(Arc::clone(root), Arc::new(RegistryResolver::new(registry)))
}

fn expect_string(outcome: LookupOutcome) -> String {
    match outcome {
        LookupOutcome::Value(value) => value
            .downcast_ref::<String>()
            .expect("载荷应为字符串")
            .clone(),
        LookupOutcome::Context(_) => panic!("不应命中上下文"),
    }
}

/// ## 订阅回放重建与注册事件收敛
///
/// - **契约 (What)**：启动前已存在的注册项经回放入树；启动后的注册事件
///   实时入树；查找经注册表解析器命中当下存活值。
#[test]
fn replay_and_live_registrations_converge() {
    let registry = MemoryRegistry::new();
    let (_early, _early_lease) = registry.register("infra/db", value_of("db"));

    let root = NamespaceNode::new_root();
    let reconciler = RegistryReconciler::start(
        Arc::clone(&root),
        Arc::clone(&registry) as Arc<dyn ResourceRegistry>,
    );
    let facade = registry_facade(&root, &registry);

    assert_eq!(
        expect_string(facade.lookup(&name("infra/db")).expect("回放条目应已入树")),
        "db"
    );

    let (_mail, _mail_lease) = registry.register("apps/mail", value_of("mail"));
    assert_eq!(
        expect_string(facade.lookup(&name("apps/mail")).expect("实时注册应入树")),
        "mail"
    );

    reconciler.shutdown();
}

/// ## 名称属性变更驱动搬移
///
/// - **契约 (What)**：改名事件把绑定从旧名称搬到新名称，旧路径的过渡节点
///   被修剪；名称未变的属性更新不产生可见变化。
#[test]
fn updated_name_property_moves_binding() {
    let registry = MemoryRegistry::new();
    let root = NamespaceNode::new_root();
    let reconciler = RegistryReconciler::start(
        Arc::clone(&root),
        Arc::clone(&registry) as Arc<dyn ResourceRegistry>,
    );
    let facade = registry_facade(&root, &registry);

    let (id, _lease) = registry.register("apps/mail", value_of("mail"));
    assert!(registry.update_name(id, "apps/post"), "改名应被接受");

    assert_eq!(
        facade
            .lookup(&name("apps/mail"))
            .expect_err("旧名称应未命中")
            .code(),
        codes::NAME_NOT_FOUND
    );
    assert_eq!(
        expect_string(facade.lookup(&name("apps/post")).expect("新名称应命中")),
        "mail"
    );

    assert!(registry.update_name(id, "apps/post"), "原名更新应被接受");
    assert_eq!(
        expect_string(facade.lookup(&name("apps/post")).expect("原名更新后绑定不变")),
        "mail"
    );

    reconciler.shutdown();
}

/// ## 注销事件清理绑定并级联修剪
///
/// - **契约 (What)**：注销后旧名称未命中，自动创建的过渡节点整链回收。
#[test]
fn unregistration_retracts_binding_and_prunes() {
    let registry = MemoryRegistry::new();
    let root = NamespaceNode::new_root();
    let reconciler = RegistryReconciler::start(
        Arc::clone(&root),
        Arc::clone(&registry) as Arc<dyn ResourceRegistry>,
    );
    let facade = registry_facade(&root, &registry);

    let (id, _lease) = registry.register("deep/path/svc", value_of("svc"));
    assert!(registry.unregister(id));

    assert_eq!(
        facade
            .lookup(&name("deep/path/svc"))
            .expect_err("注销后应未命中")
            .code(),
        codes::NAME_NOT_FOUND
    );
    assert!(root.is_empty(), "过渡节点应被级联修剪");

    reconciler.shutdown();
}

/// ## 停机释放恰好一次
///
/// - **意图 (Why)**：核心自行发布的注册项必须在停机时注销，且无论停机与
///   外部注销如何竞争都不得重复注销；
/// - **契约 (What)**：停机后发布条目从注册表消失；重复停机为无操作；外部
///   已抢先注销的条目只做账面核销。
#[test]
fn shutdown_releases_published_entries_exactly_once() {
    let registry = MemoryRegistry::new();
    let root = NamespaceNode::new_root();
    let reconciler = RegistryReconciler::start(
        Arc::clone(&root),
        Arc::clone(&registry) as Arc<dyn ResourceRegistry>,
    );

    let own = reconciler.publish("pub/svc", value_of("owned"));
    assert!(reconciler.is_published(own));
    let preempted = reconciler.publish("pub/other", value_of("preempted"));
    assert!(registry.unregister(preempted), "外部抢先注销应成功");

    reconciler.shutdown();
    assert!(
        registry.resolve_value(own).is_none(),
        "停机必须注销核心发布的条目"
    );
    assert!(registry.is_empty(), "两个发布条目都不应残留");
    assert!(!registry.unregister(own), "停机后的再注销应为无操作");

    reconciler.shutdown();
    assert!(registry.is_empty(), "重复停机必须是无操作");
}

/// ## 多贡献者聚合器在停机时按外部所有跳过
///
/// - **契约 (What)**：发布条目的名称同时被外部发布方占用（聚合器有两个
///   贡献者）时，停机不注销该条目，注册表中予以保留。
#[test]
fn shutdown_skips_externally_shared_published_entry() {
    let registry = MemoryRegistry::new();
    let root = NamespaceNode::new_root();
    let reconciler = RegistryReconciler::start(
        Arc::clone(&root),
        Arc::clone(&registry) as Arc<dyn ResourceRegistry>,
    );

    let (external, _external_lease) = registry.register("shared/svc", value_of("theirs"));
    let own = reconciler.publish("shared/svc", value_of("ours"));

    reconciler.shutdown();
    assert!(
        registry.resolve_value(own).is_some(),
        "仍被外部贡献者背书的发布条目不得注销"
    );
    assert!(
        registry.resolve_value(external).is_some(),
        "外部条目自然保留"
    );
}
