//! 事务标记

use crate::configurator::{Configurator, NoopConfigurator};
use bean_abstractions::Marker;
use bean_common::TypeInfo;
use std::fmt;
use std::sync::Arc;

type CreateFn = dyn Fn() -> anyhow::Result<Arc<dyn Configurator>> + Send + Sync;

/// 配置器类型引用
///
/// 标记只记录配置器的类型和创建方式，实例由 [`TransactionWrapper`](crate::TransactionWrapper)
/// 在第一次使用时创建并缓存。
#[derive(Clone)]
pub struct ConfiguratorRef {
    info: TypeInfo,
    create: Arc<CreateFn>,
}

impl ConfiguratorRef {
    /// 通过 `Default` 创建的配置器
    pub fn of<C: Configurator + Default>() -> Self {
        Self {
            info: TypeInfo::of::<C>(),
            create: Arc::new(|| Ok(Arc::new(C::default()) as Arc<dyn Configurator>)),
        }
    }

    /// 通过可能失败的工厂函数创建的配置器
    pub fn with_factory<C, F>(create: F) -> Self
    where
        C: Configurator,
        F: Fn() -> anyhow::Result<C> + Send + Sync + 'static,
    {
        Self {
            info: TypeInfo::of::<C>(),
            create: Arc::new(move || create().map(|c| Arc::new(c) as Arc<dyn Configurator>)),
        }
    }

    /// 配置器类型
    pub const fn info(&self) -> TypeInfo {
        self.info
    }

    /// 创建配置器实例
    pub fn create(&self) -> anyhow::Result<Arc<dyn Configurator>> {
        (self.create)()
    }
}

impl fmt::Debug for ConfiguratorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info.short_name())
    }
}

impl Default for ConfiguratorRef {
    fn default() -> Self {
        Self::of::<NoopConfigurator>()
    }
}

/// 事务/跨度标记
///
/// 放在类上时作用于全部声明的方法，放在方法上时覆盖类级设置。
#[derive(Debug, Clone)]
pub struct Transaction {
    /// 跨度名称，缺省为 `Type#method()`
    pub name: Option<String>,
    /// 操作类型
    pub operation: String,
    /// 是否绑定到当前线程的作用域
    pub bind_to_scope: bool,
    /// 只在已有当前跨度时创建子跨度
    pub only_span: bool,
    /// 是否把失败记录到跨度上
    pub capture_failures: bool,
    /// 配置器
    pub configurator: ConfiguratorRef,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            name: None,
            operation: String::new(),
            bind_to_scope: true,
            only_span: false,
            capture_failures: true,
            configurator: ConfiguratorRef::default(),
        }
    }
}

impl Transaction {
    /// 使用默认设置的标记
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定跨度名称
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 指定操作类型
    #[must_use]
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// 不绑定到作用域，跨度随钩子状态传递
    #[must_use]
    pub fn unbound(mut self) -> Self {
        self.bind_to_scope = false;
        self
    }

    /// 只在已有当前跨度时创建子跨度
    #[must_use]
    pub fn only_span(mut self) -> Self {
        self.only_span = true;
        self
    }

    /// 不记录失败信息
    #[must_use]
    pub fn ignore_failures(mut self) -> Self {
        self.capture_failures = false;
        self
    }

    /// 使用指定的配置器
    #[must_use]
    pub fn configurator(mut self, configurator: ConfiguratorRef) -> Self {
        self.configurator = configurator;
        self
    }
}

impl Marker for Transaction {}
