//! 扩展管线的集成测试

mod common;

use bean_container::{
    BeanCatalog, BeanResolver, ClassDef, CollectionSlot, ContainerHandle, Definition, FieldSlot, Inject,
    Parameter, Scope, TypeInfo, TypedCollection,
};
use common::container_with;
use std::sync::Arc;

trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;
}

macro_rules! notifier {
    ($name:ident, $channel:literal) => {
        #[derive(Default)]
        struct $name;

        impl Notifier for $name {
            fn channel(&self) -> &'static str {
                $channel
            }
        }
    };
}

notifier!(EmailNotifier, "email");
notifier!(SmsNotifier, "sms");
notifier!(PushNotifier, "push");

#[derive(Default)]
struct AuditTrail;

struct Dispatcher {
    notifiers: TypedCollection<dyn Notifier>,
    audit: Inject<AuditTrail>,
}

/// 构造时一次性拿到全部通知器
struct Broadcaster {
    notifiers: Vec<Arc<dyn Notifier>>,
}

fn notifier_definitions() -> Vec<Definition> {
    vec![
        ClassDef::builder::<EmailNotifier>()
            .bean()
            .implements::<dyn Notifier>(|n| n as Arc<dyn Notifier>)
            .default_constructor()
            .build()
            .into(),
        ClassDef::builder::<SmsNotifier>()
            .bean()
            .implements::<dyn Notifier>(|n| n as Arc<dyn Notifier>)
            .default_constructor()
            .build()
            .into(),
        ClassDef::builder::<PushNotifier>()
            .bean()
            .implements::<dyn Notifier>(|n| n as Arc<dyn Notifier>)
            .default_constructor()
            .build()
            .into(),
        ClassDef::builder::<AuditTrail>().bean().default_constructor().build().into(),
        ClassDef::builder::<Dispatcher>()
            .bean()
            .constructor([], |_| {
                Ok(Dispatcher {
                    notifiers: TypedCollection::new(),
                    audit: Inject::new(),
                })
            })
            .field("notifiers", |d| FieldSlot::collection(&d.notifiers))
            .field("audit", |d| FieldSlot::single(&d.audit))
            .build()
            .into(),
        ClassDef::builder::<Broadcaster>()
            .bean()
            .constructor([Parameter::collection::<dyn Notifier>()], |args| {
                Ok(Broadcaster {
                    notifiers: args.next_all()?,
                })
            })
            .build()
            .into(),
    ]
}

fn catalog_of(definitions: Vec<Definition>) -> BeanCatalog {
    let mut catalog = BeanCatalog::new("notifiers");
    catalog.extend("app::notify", definitions);
    catalog
}

fn channels(notifiers: &[Arc<dyn Notifier>]) -> Vec<&'static str> {
    let mut channels: Vec<_> = notifiers.iter().map(|n| n.channel()).collect();
    channels.sort_unstable();
    channels
}

#[test]
fn test_typed_collection_contains_every_implementation() {
    for reversed in [false, true] {
        let mut definitions = notifier_definitions();
        if reversed {
            definitions.reverse();
        }
        let mut container = container_with(catalog_of(definitions));
        container.scan(&Scope::new("app")).unwrap();

        let dispatcher = container.inject::<Dispatcher>().unwrap();
        assert_eq!(dispatcher.notifiers.len(), 3);
        assert_eq!(channels(&dispatcher.notifiers.snapshot()), vec!["email", "push", "sms"]);
        assert!(dispatcher.audit.get().is_ok());

        let broadcaster = container.inject::<Broadcaster>().unwrap();
        assert_eq!(channels(&broadcaster.notifiers), vec!["email", "push", "sms"]);
        assert_eq!(channels(&container.inject_all::<dyn Notifier>().unwrap()), vec!["email", "push", "sms"]);
    }
}

#[test]
fn test_collection_shares_registered_singletons() {
    let mut container = container_with(catalog_of(notifier_definitions()));
    container.scan(&Scope::new("app")).unwrap();

    let dispatcher = container.inject::<Dispatcher>().unwrap();
    let email: Arc<dyn Notifier> = container
        .inject::<EmailNotifier>()
        .map(|email| email as Arc<dyn Notifier>)
        .unwrap();
    let registered = container
        .inject_all::<dyn Notifier>()
        .unwrap()
        .into_iter()
        .find(|n| n.channel() == "email")
        .unwrap();

    assert!(dispatcher.notifiers.contains(&registered));
    assert_eq!(email.channel(), registered.channel());
}

/// 持有容器句柄，在运行期查找 Bean
struct Locator {
    handle: Arc<ContainerHandle>,
    resolver: Arc<dyn BeanResolver>,
}

#[test]
fn test_container_handle_is_injectable() {
    let catalog = catalog_of(notifier_definitions()).with(
        "app::locator",
        ClassDef::builder::<Locator>()
            .bean()
            .constructor(
                [Parameter::of::<ContainerHandle>(), Parameter::of::<dyn BeanResolver>()],
                |args| {
                    Ok(Locator {
                        handle: args.next()?,
                        resolver: args.next()?,
                    })
                },
            )
            .build(),
    );

    let mut container = container_with(catalog);
    container.scan(&Scope::new("app")).unwrap();

    let locator = container.inject::<Locator>().unwrap();
    assert_eq!(locator.handle.inject::<SmsNotifier>().unwrap().channel(), "sms");
    assert_eq!(locator.resolver.resolve_all(TypeInfo::of::<dyn Notifier>()).len(), 3);

    drop(container);
    assert!(!locator.handle.is_alive());
}
