//! 工厂方法
//!
//! 宿主类上声明的、返回值即为 Bean 的方法。宿主实例由容器提供（已注册的 Bean、无参构造或注入构造）。

use crate::definition::{BeanType, ClassDef};
use crate::instance::ViewHandle;
use crate::key::BeanKey;
use bean_common::{BeanError, BeanResult, TypeInfo};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type InvokeFn = dyn Fn(&ViewHandle) -> BeanResult<Option<ViewHandle>> + Send + Sync;

/// 工厂方法
#[derive(Clone)]
pub struct FactoryMethod {
    host: Arc<ClassDef>,
    name: &'static str,
    bean_name: Option<String>,
    product: BeanType,
    invoke: Arc<InvokeFn>,
}

impl FactoryMethod {
    /// 声明总是返回实例的工厂方法
    pub fn builder<H, T, F>(host: &Arc<ClassDef>, name: &'static str, build: F) -> FactoryBuilder<T>
    where
        H: Send + Sync + 'static,
        T: Send + Sync + 'static,
        F: Fn(&H) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::optional_builder(host, name, move |host: &H| build(host).map(Some))
    }

    /// 声明可能不返回实例的工厂方法（返回 `None` 时注册失败）
    pub fn optional_builder<H, T, F>(host: &Arc<ClassDef>, name: &'static str, build: F) -> FactoryBuilder<T>
    where
        H: Send + Sync + 'static,
        T: Send + Sync + 'static,
        F: Fn(&H) -> anyhow::Result<Option<T>> + Send + Sync + 'static,
    {
        let qualified = format!("{}#{}()", host.type_info().short_name(), name);
        let invoke = move |handle: &ViewHandle| -> BeanResult<Option<ViewHandle>> {
            let host = handle
                .downcast_ref::<Arc<H>>()
                .ok_or_else(|| BeanError::TypeMismatch {
                    expected: TypeInfo::of::<H>().short_name(),
                    actual: format!("{qualified} 的宿主实例"),
                })?;
            let product = build(&**host).map_err(|e| BeanError::instantiation(qualified.clone(), e))?;
            Ok(product.map(|value| Arc::new(Arc::new(value)) as ViewHandle))
        };

        FactoryBuilder {
            method: Self {
                host: Arc::clone(host),
                name,
                bean_name: None,
                product: BeanType::of::<T>(),
                invoke: Arc::new(invoke),
            },
            _marker: PhantomData,
        }
    }

    /// 宿主类
    pub fn host(&self) -> &Arc<ClassDef> {
        &self.host
    }

    /// 方法名
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Bean 名称
    pub fn bean_name(&self) -> Option<&str> {
        self.bean_name.as_deref()
    }

    /// 产物类型
    pub const fn product(&self) -> &BeanType {
        &self.product
    }

    /// 查找标识
    pub fn key(&self) -> BeanKey {
        BeanKey::new(self.product.info(), self.bean_name.clone())
    }

    /// `Host#method()` 形式的名称
    pub fn qualified_name(&self) -> String {
        format!("{}#{}()", self.host.type_info().short_name(), self.name)
    }

    /// 在宿主实例上调用，返回产物的具体类型句柄
    pub fn invoke(&self, host: &ViewHandle) -> BeanResult<Option<ViewHandle>> {
        (self.invoke)(host)
    }
}

impl fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethod")
            .field("method", &self.qualified_name())
            .field("bean_name", &self.bean_name)
            .field("product", &self.product)
            .finish()
    }
}

/// 工厂方法构建器
pub struct FactoryBuilder<T> {
    method: FactoryMethod,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> FactoryBuilder<T> {
    /// 指定 Bean 名称
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.method.bean_name = (!name.is_empty()).then_some(name);
        self
    }

    /// 声明产物可以当作 `X` 使用
    #[must_use]
    pub fn implements<X: ?Sized + Send + Sync + 'static>(mut self, cast: fn(Arc<T>) -> Arc<X>) -> Self {
        self.method.product = self.method.product.implements(cast);
        self
    }

    /// 完成构建
    pub fn build(self) -> Arc<FactoryMethod> {
        Arc::new(self.method)
    }
}

/// 扫描器可以返回的声明
#[derive(Debug, Clone)]
pub enum Definition {
    /// 类
    Class(Arc<ClassDef>),
    /// 工厂方法
    Factory(Arc<FactoryMethod>),
}

impl From<Arc<ClassDef>> for Definition {
    fn from(def: Arc<ClassDef>) -> Self {
        Self::Class(def)
    }
}

impl From<Arc<FactoryMethod>> for Definition {
    fn from(method: Arc<FactoryMethod>) -> Self {
        Self::Factory(method)
    }
}
