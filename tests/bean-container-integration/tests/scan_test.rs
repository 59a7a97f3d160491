//! 扫描、评分排序与注册的集成测试

mod common;

use bean_container::{BeanCatalog, BeanError, ClassDef, Definition, FactoryMethod, Parameter, Scope};
use common::container_with;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 日志配置（由工厂方法生产）
#[derive(Debug)]
struct LoggingConfiguration {
    level: &'static str,
}

#[derive(Default)]
struct LoggingConfigurations;

fn logging_definitions() -> Vec<Definition> {
    let host = ClassDef::builder::<LoggingConfigurations>()
        .default_constructor()
        .build();
    vec![
        FactoryMethod::builder(&host, "default_logging", |_: &LoggingConfigurations| {
            Ok(LoggingConfiguration { level: "info" })
        })
        .build()
        .into(),
        FactoryMethod::builder(&host, "error_logging", |_: &LoggingConfigurations| {
            Ok(LoggingConfiguration { level: "error" })
        })
        .named("errorLogging")
        .build()
        .into(),
        FactoryMethod::builder(&host, "debug_logging", |_: &LoggingConfigurations| {
            Ok(LoggingConfiguration { level: "debug" })
        })
        .named("debugLogging")
        .build()
        .into(),
    ]
}

struct AccessLog {
    config: Arc<LoggingConfiguration>,
}

struct ErrorReporter {
    config: Arc<LoggingConfiguration>,
}

fn logging_catalog() -> BeanCatalog {
    let mut catalog = BeanCatalog::new("logging");
    catalog.extend("app::logging", logging_definitions());
    catalog
        .with(
            "app::web",
            ClassDef::builder::<AccessLog>()
                .bean()
                .constructor([Parameter::of::<LoggingConfiguration>()], |args| {
                    Ok(AccessLog { config: args.next()? })
                })
                .build(),
        )
        .with(
            "app::web",
            ClassDef::builder::<ErrorReporter>()
                .bean()
                .constructor(
                    [Parameter::named::<LoggingConfiguration>("errorLogging")],
                    |args| Ok(ErrorReporter { config: args.next()? }),
                )
                .build(),
        )
}

#[test]
fn test_unnamed_parameter_receives_default_bean() {
    let mut container = container_with(logging_catalog());
    container.scan(&Scope::new("app")).unwrap();

    assert_eq!(container.inject::<AccessLog>().unwrap().config.level, "info");
    assert_eq!(container.inject::<LoggingConfiguration>().unwrap().level, "info");
}

#[test]
fn test_named_parameter_receives_named_bean() {
    let mut container = container_with(logging_catalog());
    container.scan(&Scope::new("app")).unwrap();

    assert_eq!(container.inject::<ErrorReporter>().unwrap().config.level, "error");
    assert_eq!(
        container
            .inject_named::<LoggingConfiguration>("debugLogging")
            .unwrap()
            .level,
        "debug"
    );
    assert!(container.is_registered::<LoggingConfiguration>(Some("errorLogging")));
    assert!(!container.is_registered::<LoggingConfiguration>(Some("traceLogging")));
}

#[test]
fn test_unmatched_name_fails() {
    struct TraceLog {
        _config: Arc<LoggingConfiguration>,
    }

    let mut catalog = BeanCatalog::new("logging");
    catalog.extend("app::logging", logging_definitions());
    let catalog = catalog.with(
        "app::trace",
        ClassDef::builder::<TraceLog>()
            .bean()
            .constructor(
                [Parameter::named::<LoggingConfiguration>("traceLogging")],
                |args| Ok(TraceLog { _config: args.next()? }),
            )
            .build(),
    );

    let mut container = container_with(catalog);
    let error = container.scan(&Scope::new("app")).unwrap_err();
    assert!(matches!(error, BeanError::MissingDependency { .. }));
    assert!(error.to_string().contains("traceLogging"));
    assert!(matches!(
        container.inject_named::<LoggingConfiguration>("traceLogging"),
        Err(BeanError::MissingBean { .. })
    ));
}

struct CycleA {
    _b: Arc<CycleB>,
}

struct CycleB {
    _a: Arc<CycleA>,
}

#[test]
fn test_circular_dependency_names_the_chain() {
    let catalog = BeanCatalog::new("cycle")
        .with(
            "app::cycle",
            ClassDef::builder::<CycleA>()
                .bean()
                .constructor([Parameter::of::<CycleB>()], |args| Ok(CycleA { _b: args.next()? }))
                .build(),
        )
        .with(
            "app::cycle",
            ClassDef::builder::<CycleB>()
                .bean()
                .constructor([Parameter::of::<CycleA>()], |args| Ok(CycleB { _a: args.next()? }))
                .build(),
        );

    let mut container = container_with(catalog);
    let error = container.scan(&Scope::new("app")).unwrap_err();
    assert!(error.is_graph_error());
    match error {
        BeanError::CircularDependency { chain } => assert_eq!(chain, "CycleA -> CycleB -> CycleA"),
        other => panic!("期望循环依赖错误, 实际: {other}"),
    }
}

struct Settings {
    url: String,
}

#[derive(Default)]
struct SettingsFactory;

struct Connection {
    url: String,
}

/// 不是 Bean 的宿主，构造时依赖另一个工厂的产物
struct ConnectionFactory {
    settings: Arc<Settings>,
}

struct Repository {
    connection: Arc<Connection>,
}

fn chain_definitions() -> Vec<(&'static str, Definition)> {
    let settings_host = ClassDef::builder::<SettingsFactory>().default_constructor().build();
    let connection_host = ClassDef::builder::<ConnectionFactory>()
        .constructor([Parameter::of::<Settings>()], |args| {
            Ok(ConnectionFactory {
                settings: args.next()?,
            })
        })
        .build();

    vec![
        (
            "app::data",
            ClassDef::builder::<Repository>()
                .bean()
                .constructor([Parameter::of::<Connection>()], |args| {
                    Ok(Repository {
                        connection: args.next()?,
                    })
                })
                .build()
                .into(),
        ),
        (
            "app::data",
            FactoryMethod::builder(&connection_host, "connection", |host: &ConnectionFactory| {
                Ok(Connection {
                    url: format!("{}/orders", host.settings.url),
                })
            })
            .build()
            .into(),
        ),
        (
            "app::config",
            FactoryMethod::builder(&settings_host, "settings", |_: &SettingsFactory| {
                Ok(Settings {
                    url: "db://primary".to_string(),
                })
            })
            .build()
            .into(),
        ),
        (
            "app::config",
            FactoryMethod::builder(&settings_host, "fallback_settings", |_: &SettingsFactory| {
                Ok(Settings {
                    url: "db://fallback".to_string(),
                })
            })
            .named("fallback")
            .build()
            .into(),
        ),
    ]
}

fn catalog_of(definitions: Vec<(&'static str, Definition)>) -> BeanCatalog {
    let mut catalog = BeanCatalog::new("chain");
    for (namespace, definition) in definitions {
        catalog.add(namespace, definition);
    }
    catalog
}

#[test]
fn test_factory_host_chain_is_ordered_by_score() {
    let mut container = container_with(catalog_of(chain_definitions()));
    let report = container.scan(&Scope::new("app")).unwrap();

    assert_eq!(report.class_count, 1);
    assert_eq!(report.factory_count, 3);
    let position = |name: &str| {
        report
            .registered
            .iter()
            .position(|registered| registered.contains(name))
            .unwrap()
    };
    assert!(position("Settings") < position("Connection"));
    assert!(position("Connection") < position("Repository"));

    let repository = container.inject::<Repository>().unwrap();
    assert_eq!(repository.connection.url, "db://primary/orders");
    assert_eq!(
        container.inject_named::<Settings>("fallback").unwrap().url,
        "db://fallback"
    );
    assert!(!container.is_registered::<ConnectionFactory>(None));
}

static COUNTING_HOSTS: AtomicUsize = AtomicUsize::new(0);

struct CountingHost;

impl Default for CountingHost {
    fn default() -> Self {
        COUNTING_HOSTS.fetch_add(1, Ordering::SeqCst);
        Self
    }
}

#[test]
fn test_factory_host_is_created_once_per_class() {
    let host = ClassDef::builder::<CountingHost>().default_constructor().build();
    let catalog = BeanCatalog::new("hosts")
        .with(
            "app::hosts",
            FactoryMethod::builder(&host, "primary", |_: &CountingHost| {
                Ok(Settings {
                    url: "db://primary".to_string(),
                })
            })
            .build(),
        )
        .with(
            "app::hosts",
            FactoryMethod::builder(&host, "replica", |_: &CountingHost| {
                Ok(Settings {
                    url: "db://replica".to_string(),
                })
            })
            .named("replica")
            .build(),
        );

    let mut container = container_with(catalog);
    container.scan(&Scope::new("app")).unwrap();

    assert_eq!(COUNTING_HOSTS.load(Ordering::SeqCst), 1);
    assert_eq!(container.inject_named::<Settings>("replica").unwrap().url, "db://replica");
}

#[test]
fn test_scan_is_deterministic() {
    let mut first = container_with(catalog_of(chain_definitions()));
    let mut second = container_with(catalog_of(chain_definitions()));
    let first_report = first.scan(&Scope::new("app")).unwrap();
    let second_report = second.scan(&Scope::new("app")).unwrap();
    assert_eq!(first_report, second_report);

    let mut reversed_definitions = chain_definitions();
    reversed_definitions.reverse();
    let mut reversed = container_with(catalog_of(reversed_definitions));
    let reversed_report = reversed.scan(&Scope::new("app")).unwrap();

    let mut expected = first_report.registered.clone();
    let mut actual = reversed_report.registered.clone();
    expected.sort();
    actual.sort();
    assert_eq!(expected, actual);
    assert_eq!(
        first.inject::<Repository>().unwrap().connection.url,
        reversed.inject::<Repository>().unwrap().connection.url
    );
}

#[derive(Debug, Default)]
struct Clock {
    zone: &'static str,
}

/// 可以当作 `Clock` 使用的更具体的时钟
struct UtcClock {
    base: Arc<Clock>,
}

impl Default for UtcClock {
    fn default() -> Self {
        Self {
            base: Arc::new(Clock { zone: "UTC" }),
        }
    }
}

fn clock_class() -> Arc<ClassDef> {
    ClassDef::builder::<Clock>().bean().default_constructor().build()
}

fn utc_clock_class() -> Arc<ClassDef> {
    ClassDef::builder::<UtcClock>()
        .bean()
        .implements::<Clock>(|utc| Arc::clone(&utc.base))
        .default_constructor()
        .build()
}

#[test]
fn test_narrower_bean_may_follow_broader_bean() {
    let catalog = BeanCatalog::new("clocks")
        .with("app::time", clock_class())
        .with("app::time", utc_clock_class());

    let mut container = container_with(catalog);
    container.scan(&Scope::new("app")).unwrap();

    assert_eq!(container.inject::<Clock>().unwrap().zone, "");
    assert_eq!(container.inject::<UtcClock>().unwrap().base.zone, "UTC");
    assert_eq!(container.inject_all::<Clock>().unwrap().len(), 2);
}

#[test]
fn test_broader_bean_after_narrower_bean_is_duplicate() {
    let catalog = BeanCatalog::new("clocks")
        .with("app::time", utc_clock_class())
        .with("app::time", clock_class());

    let mut container = container_with(catalog);
    let error = container.scan(&Scope::new("app")).unwrap_err();
    assert!(matches!(error, BeanError::DuplicateBean { .. }));
}

#[test]
fn test_exact_duplicate_is_rejected() {
    let host = ClassDef::builder::<LoggingConfigurations>().default_constructor().build();
    let catalog = BeanCatalog::new("clocks")
        .with("app::time", clock_class())
        .with(
            "app::time",
            FactoryMethod::builder(&host, "clock", |_: &LoggingConfigurations| Ok(Clock { zone: "local" })).build(),
        );

    let mut container = container_with(catalog);
    let error = container.scan(&Scope::new("app")).unwrap_err();
    match error {
        BeanError::DuplicateBean { existing, .. } => assert!(existing.contains("Clock")),
        other => panic!("期望重复注册错误, 实际: {other}"),
    }
}

#[test]
fn test_named_bean_coexists_until_name_repeats() {
    let host = ClassDef::builder::<LoggingConfigurations>().default_constructor().build();
    let catalog = BeanCatalog::new("clocks")
        .with("app::time", clock_class())
        .with(
            "app::time",
            FactoryMethod::builder(&host, "local_clock", |_: &LoggingConfigurations| {
                Ok(Clock { zone: "local" })
            })
            .named("local")
            .build(),
        )
        .with(
            "app::time",
            FactoryMethod::builder(&host, "local_clock_again", |_: &LoggingConfigurations| {
                Ok(Clock { zone: "local" })
            })
            .named("local")
            .build(),
        );

    let mut container = container_with(catalog);
    let error = container.scan(&Scope::new("app")).unwrap_err();
    assert!(matches!(error, BeanError::DuplicateBean { ref name, .. } if name == "local"));
    // 失败之前注册的 Bean 仍然可以查找
    assert_eq!(container.inject::<Clock>().unwrap().zone, "");
    assert_eq!(container.inject_named::<Clock>("local").unwrap().zone, "local");
}

#[test]
fn test_invalid_factory_returns() {
    let host = ClassDef::builder::<LoggingConfigurations>().default_constructor().build();

    let primitive = BeanCatalog::new("factories").with(
        "app::bad",
        FactoryMethod::builder(&host, "port", |_: &LoggingConfigurations| Ok(8080_u16)).build(),
    );
    let error = container_with(primitive).scan(&Scope::new("app")).unwrap_err();
    assert!(matches!(error, BeanError::InvalidFactoryReturn { ref method, .. } if method == "LoggingConfigurations#port()"));

    let unit = BeanCatalog::new("factories").with(
        "app::bad",
        FactoryMethod::builder(&host, "nothing", |_: &LoggingConfigurations| Ok(())).build(),
    );
    let error = container_with(unit).scan(&Scope::new("app")).unwrap_err();
    assert!(matches!(error, BeanError::InvalidFactoryReturn { .. }));

    let null = BeanCatalog::new("factories").with(
        "app::bad",
        FactoryMethod::optional_builder(&host, "maybe_clock", |_: &LoggingConfigurations| {
            Ok(None::<Clock>)
        })
        .build(),
    );
    let error = container_with(null).scan(&Scope::new("app")).unwrap_err();
    assert!(matches!(error, BeanError::NullProduct { ref method } if method == "LoggingConfigurations#maybe_clock()"));
}

#[test]
fn test_constructor_rules_and_failures() {
    let two_constructors = BeanCatalog::new("ctors").with(
        "app::ctors",
        ClassDef::builder::<Clock>()
            .bean()
            .default_constructor()
            .constructor([], |_| Ok(Clock { zone: "second" }))
            .build(),
    );
    let error = container_with(two_constructors)
        .scan(&Scope::new("app"))
        .unwrap_err();
    assert!(matches!(error, BeanError::MultipleConstructors { count: 2, .. }));

    let failing = BeanCatalog::new("ctors").with(
        "app::ctors",
        ClassDef::builder::<Clock>()
            .bean()
            .constructor([], |_| Err(anyhow::anyhow!("时区数据缺失")))
            .build(),
    );
    let error = container_with(failing).scan(&Scope::new("app")).unwrap_err();
    assert!(matches!(error, BeanError::Instantiation { .. }));
    assert!(error.to_string().contains("时区数据缺失"));
}

#[test]
fn test_scope_limits_scan() {
    let mut container = container_with(logging_catalog());
    let report = container.scan(&Scope::new("app::logging")).unwrap();

    assert_eq!(report.class_count, 0);
    assert_eq!(report.factory_count, 3);
    assert!(!container.is_registered::<AccessLog>(None));
    // 容器句柄 + 三个日志配置
    assert_eq!(container.bean_count(), 4);
}
