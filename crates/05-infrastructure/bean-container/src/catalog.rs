//! Bean 目录
//!
//! 代替类路径扫描的显式声明表。每条声明挂在一个模块命名空间下，扫描作用域按命名空间前缀过滤，
//! 返回顺序与登记顺序一致。

use bean_abstractions::{ClassDef, Definition, FactoryMethod, ScanOracle, Scope};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// 进程级全局目录，由 `#[bean_definitions]` 生成的启动代码填充
static GLOBAL_CATALOG: Lazy<RwLock<BeanCatalog>> = Lazy::new(|| RwLock::new(BeanCatalog::new("global")));

/// 向全局目录登记声明
pub fn register_global(namespace: &str, definitions: impl IntoIterator<Item = Definition>) {
    let mut catalog = GLOBAL_CATALOG.write();
    let before = catalog.len();
    catalog.extend(namespace, definitions);
    debug!("全局目录登记 {} 条声明, 命名空间: {}", catalog.len() - before, namespace);
}

/// 显式 Bean 目录
#[derive(Debug, Clone)]
pub struct BeanCatalog {
    name: String,
    entries: Vec<(String, Definition)>,
}

impl BeanCatalog {
    /// 创建空目录
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// 登记一条声明
    pub fn add(&mut self, namespace: &str, definition: impl Into<Definition>) {
        self.entries
            .push((namespace.trim_end_matches("::").to_string(), definition.into()));
    }

    /// 登记一条声明（链式）
    #[must_use]
    pub fn with(mut self, namespace: &str, definition: impl Into<Definition>) -> Self {
        self.add(namespace, definition);
        self
    }

    /// 登记多条声明
    pub fn extend(&mut self, namespace: &str, definitions: impl IntoIterator<Item = Definition>) {
        for definition in definitions {
            self.add(namespace, definition);
        }
    }

    /// 声明条数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn in_scope<'a>(&'a self, scope: &'a Scope) -> impl Iterator<Item = &'a Definition> + 'a {
        self.entries
            .iter()
            .filter(move |(namespace, _)| scope.contains(namespace))
            .map(|(_, definition)| definition)
    }
}

impl ScanOracle for BeanCatalog {
    fn classes(&self, scope: &Scope) -> Vec<Arc<ClassDef>> {
        self.in_scope(scope)
            .filter_map(|definition| match definition {
                Definition::Class(class) => Some(Arc::clone(class)),
                Definition::Factory(_) => None,
            })
            .collect()
    }

    fn factory_methods(&self, scope: &Scope) -> Vec<Arc<FactoryMethod>> {
        self.in_scope(scope)
            .filter_map(|definition| match definition {
                Definition::Factory(method) => Some(Arc::clone(method)),
                Definition::Class(_) => None,
            })
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 读取全局目录的扫描器
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalCatalog;

impl ScanOracle for GlobalCatalog {
    fn classes(&self, scope: &Scope) -> Vec<Arc<ClassDef>> {
        GLOBAL_CATALOG.read().classes(scope)
    }

    fn factory_methods(&self, scope: &Scope) -> Vec<Arc<FactoryMethod>> {
        GLOBAL_CATALOG.read().factory_methods(scope)
    }

    fn name(&self) -> &str {
        "global"
    }
}
