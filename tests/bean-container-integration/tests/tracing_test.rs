//! 事务标记的端到端测试

mod common;

use bean_container::{
    BeanCatalog, BeanError, ClassDef, Container, FieldSlot, InvocationHandler, JoinPoint, Scope, SelfRef,
};
use bean_tracing::{Configurator, ConfiguratorRef, SpanHub, SpanOptions, SpanStatus, Transaction, TransactionWrapper};
use common::container_with;
use std::any::Any;
use std::sync::Arc;

trait OrderDesk: Send + Sync {
    fn place(&self, sku: &'static str) -> Result<usize, BeanError>;
    fn reserve(&self, sku: &'static str) -> Result<usize, BeanError>;
    fn cancel(&self, sku: &'static str) -> Result<usize, BeanError>;
    fn audit(&self) -> Result<usize, BeanError>;
}

#[derive(Default)]
struct Desk {
    me: SelfRef<dyn OrderDesk>,
}

impl OrderDesk for Desk {
    fn place(&self, sku: &'static str) -> Result<usize, BeanError> {
        self.me.get()?.reserve(sku)
    }

    fn reserve(&self, sku: &'static str) -> Result<usize, BeanError> {
        Ok(sku.len())
    }

    fn cancel(&self, sku: &'static str) -> Result<usize, BeanError> {
        Err(BeanError::config(format!("订单 {sku} 已发货")))
    }

    fn audit(&self) -> Result<usize, BeanError> {
        Ok(0)
    }
}

struct DeskProxy {
    target: Arc<Desk>,
    handler: Arc<dyn InvocationHandler>,
}

impl OrderDesk for DeskProxy {
    fn place(&self, sku: &'static str) -> Result<usize, BeanError> {
        self.handler
            .invoke(self, "place", &[&sku as &dyn Any], || self.target.place(sku))
    }

    fn reserve(&self, sku: &'static str) -> Result<usize, BeanError> {
        self.handler
            .invoke(self, "reserve", &[&sku as &dyn Any], || self.target.reserve(sku))
    }

    fn cancel(&self, sku: &'static str) -> Result<usize, BeanError> {
        self.handler
            .invoke(self, "cancel", &[&sku as &dyn Any], || self.target.cancel(sku))
    }

    fn audit(&self) -> Result<usize, BeanError> {
        self.handler.invoke(self, "audit", &[], || self.target.audit())
    }
}

/// 把第一个参数写入跨度标签
#[derive(Default)]
struct SkuTagger;

impl Configurator for SkuTagger {
    fn configure(&self, marker: &Transaction, options: &mut SpanOptions, point: &JoinPoint<'_>) {
        if let Some(sku) = point.arg::<&'static str>(0) {
            options.set_tag("sku", *sku);
        }
        options.description = Some(format!("{} ({})", point.method, marker.operation));
    }
}

fn desk_container(hub: &Arc<SpanHub>) -> Container {
    let desk = ClassDef::builder::<Desk>()
        .bean()
        .implements::<dyn OrderDesk>(|desk| desk as Arc<dyn OrderDesk>)
        .default_constructor()
        .field("me", |desk| FieldSlot::self_ref(&desk.me))
        .methods(["place", "reserve", "cancel", "audit"])
        .marker(Transaction::new().operation("order"))
        .method_marker(
            "place",
            Transaction::new()
                .named("place-order")
                .operation("order")
                .configurator(ConfiguratorRef::of::<SkuTagger>()),
        )
        .method_marker("reserve", Transaction::new().operation("db").unbound())
        .method_marker("audit", Transaction::new().operation("audit").only_span())
        .proxy::<dyn OrderDesk>(|desk, handler| Arc::new(DeskProxy { target: desk, handler }) as Arc<dyn OrderDesk>)
        .build();

    let mut container = container_with(BeanCatalog::new("orders").with("app::orders", desk));
    container.add_method_wrapper(TransactionWrapper::new(Arc::clone(hub)));
    container.scan(&Scope::new("app")).unwrap();
    container
}

#[test]
fn test_nested_calls_produce_a_span_tree() {
    let hub = Arc::new(SpanHub::new());
    let container = desk_container(&hub);
    let desk = container.inject::<dyn OrderDesk>().unwrap();

    assert_eq!(desk.place("book").unwrap(), 4);
    assert_eq!(hub.depth(), 0);

    let spans = hub.take_finished();
    assert_eq!(spans.len(), 2);
    let (reserve, place) = (&spans[0], &spans[1]);

    assert_eq!(place.name(), "place-order");
    assert!(place.is_transaction());
    assert_eq!(place.tag("sku"), Some("book"));
    assert_eq!(place.description(), Some("place (order)"));
    assert_eq!(place.status(), Some(SpanStatus::Ok));

    assert_eq!(reserve.name(), "Desk#reserve()");
    assert_eq!(reserve.operation(), "db");
    assert_eq!(reserve.parent_id(), Some(place.id()));
    assert_eq!(reserve.trace_id(), place.trace_id());
}

#[test]
fn test_failure_is_recorded_on_span() {
    let hub = Arc::new(SpanHub::new());
    let container = desk_container(&hub);
    let desk = container.inject::<dyn OrderDesk>().unwrap();

    let error = desk.cancel("lamp").unwrap_err();
    assert!(matches!(error, BeanError::Config { .. }));

    let spans = hub.take_finished();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name(), "Desk#cancel()");
    assert_eq!(spans[0].operation(), "order");
    assert_eq!(spans[0].status(), Some(SpanStatus::InternalError));
    assert!(spans[0].failure().unwrap().contains("订单 lamp 已发货"));
}

#[test]
fn test_only_span_requires_active_parent() {
    let hub = Arc::new(SpanHub::new());
    let container = desk_container(&hub);
    let desk = container.inject::<dyn OrderDesk>().unwrap();

    desk.audit().unwrap();
    assert!(hub.take_finished().is_empty());

    let request = hub.start_transaction("request", "http", &SpanOptions::default());
    hub.bind(Arc::clone(&request));
    desk.audit().unwrap();
    let parent = hub.pop_bound().unwrap();
    hub.finish(&parent, SpanStatus::Ok);

    let spans = hub.take_finished();
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].name(), "Desk#audit()");
    assert_eq!(spans[0].parent_id(), Some(request.id()));
}
