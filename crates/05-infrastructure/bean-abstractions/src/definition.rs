//! 类定义
//!
//! 显式描述一个类：可被当作哪些 trait 对象、唯一的构造函数、需要注入的字段、声明的方法、
//! 类级与方法级拦截标记，以及每个 trait 视图的代理工厂。扫描器返回的就是这些定义。

use crate::injection::FieldSlot;
use crate::instance::{BeanInstance, View, ViewHandle};
use crate::interception::{InvocationHandler, Marker};
use crate::key::BeanKey;
use bean_common::{BeanError, BeanResult, TypeInfo};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

type CastFn = dyn Fn(&ViewHandle) -> Option<ViewHandle> + Send + Sync;
type BuildFn = dyn Fn(&mut Args) -> anyhow::Result<ViewHandle> + Send + Sync;
type ProxyFn = dyn Fn(&ViewHandle, Arc<dyn InvocationHandler>) -> Option<ViewHandle> + Send + Sync;

/// 具体类型到 trait 对象的转换
#[derive(Clone)]
pub struct Upcast {
    target: TypeInfo,
    cast: Arc<CastFn>,
}

impl Upcast {
    /// 创建转换
    pub fn new<T, X>(cast: fn(Arc<T>) -> Arc<X>) -> Self
    where
        T: Send + Sync + 'static,
        X: ?Sized + Send + Sync + 'static,
    {
        Self {
            target: TypeInfo::of::<X>(),
            cast: Arc::new(move |handle: &ViewHandle| {
                handle
                    .downcast_ref::<Arc<T>>()
                    .map(|value| Arc::new(cast(Arc::clone(value))) as ViewHandle)
            }),
        }
    }

    /// 目标类型
    pub const fn target(&self) -> TypeInfo {
        self.target
    }

    /// 把具体类型句柄转换为目标视图
    pub fn apply(&self, handle: &ViewHandle) -> Option<View> {
        (self.cast)(handle).map(|converted| View::new(self.target, converted))
    }
}

/// 可生产的具体类型，以及它能被当作的 trait 对象
#[derive(Clone)]
pub struct BeanType {
    info: TypeInfo,
    upcasts: Vec<Upcast>,
}

impl BeanType {
    /// 创建类型
    pub fn of<T: 'static>() -> Self {
        Self {
            info: TypeInfo::of::<T>(),
            upcasts: Vec::new(),
        }
    }

    /// 声明可以当作 `X` 使用
    #[must_use]
    pub fn implements<T, X>(mut self, cast: fn(Arc<T>) -> Arc<X>) -> Self
    where
        T: Send + Sync + 'static,
        X: ?Sized + Send + Sync + 'static,
    {
        if TypeInfo::of::<T>() == self.info {
            self.upcasts.push(Upcast::new(cast));
        } else {
            warn!(
                "忽略类型转换: {} 不是 {}",
                TypeInfo::of::<T>(),
                self.info
            );
        }
        self
    }

    /// 类型信息
    pub const fn info(&self) -> TypeInfo {
        self.info
    }

    /// 是否可以当作指定类型使用
    pub fn is_assignable_to(&self, id: TypeId) -> bool {
        self.info.id() == id || self.upcasts.iter().any(|upcast| upcast.target.id() == id)
    }

    /// 全部可用类型（自身在前）
    pub fn assignable_types(&self) -> impl Iterator<Item = TypeInfo> + '_ {
        std::iter::once(self.info).chain(self.upcasts.iter().map(Upcast::target))
    }

    /// 由具体类型句柄生成实例（含全部视图）
    pub fn instantiate(&self, handle: ViewHandle) -> BeanInstance {
        let mut views = Vec::with_capacity(self.upcasts.len() + 1);
        views.extend(self.upcasts.iter().filter_map(|upcast| upcast.apply(&handle)));
        views.insert(0, View::new(self.info, handle));
        BeanInstance::from_views(self.info, views)
    }
}

impl fmt::Debug for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanType")
            .field("info", &self.info.short_name())
            .field(
                "implements",
                &self
                    .upcasts
                    .iter()
                    .map(|upcast| upcast.target.short_name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// 参数种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// 单个 Bean
    Single(TypeInfo),
    /// 所有可赋值给元素类型的 Bean
    Collection(TypeInfo),
}

/// 构造参数
#[derive(Debug, Clone)]
pub struct Parameter {
    bean_name: Option<String>,
    kind: ParamKind,
}

impl Parameter {
    /// 按类型注入的参数
    pub fn of<X: ?Sized + 'static>() -> Self {
        Self {
            bean_name: None,
            kind: ParamKind::Single(TypeInfo::of::<X>()),
        }
    }

    /// 按名称注入的参数
    pub fn named<X: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            bean_name: Some(name.into()),
            kind: ParamKind::Single(TypeInfo::of::<X>()),
        }
    }

    /// 集合参数
    pub fn collection<X: ?Sized + 'static>() -> Self {
        Self {
            bean_name: None,
            kind: ParamKind::Collection(TypeInfo::of::<X>()),
        }
    }

    /// 指定的 Bean 名称
    pub fn bean_name(&self) -> Option<&str> {
        self.bean_name.as_deref()
    }

    /// 参数种类
    pub const fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// 参数类型（集合参数为元素类型）
    pub const fn type_info(&self) -> TypeInfo {
        match self.kind {
            ParamKind::Single(info) | ParamKind::Collection(info) => info,
        }
    }

    /// 是否为集合参数
    pub const fn is_collection(&self) -> bool {
        matches!(self.kind, ParamKind::Collection(_))
    }

    /// 查找标识
    pub fn key(&self) -> BeanKey {
        BeanKey::new(self.type_info(), self.bean_name.clone())
    }
}

/// 解析完成的构造实参
#[derive(Debug, Clone)]
pub enum Argument {
    /// 单个 Bean
    Single(BeanInstance),
    /// 集合参数
    Many(Vec<BeanInstance>),
}

/// 构造实参游标，按声明顺序取出
pub struct Args {
    owner: TypeInfo,
    values: std::vec::IntoIter<Argument>,
    position: usize,
}

impl Args {
    /// 创建实参游标
    pub fn new(owner: TypeInfo, values: Vec<Argument>) -> Self {
        Self {
            owner,
            values: values.into_iter(),
            position: 0,
        }
    }

    /// 取出下一个单 Bean 参数
    pub fn next<X: ?Sized + Send + Sync + 'static>(&mut self) -> BeanResult<Arc<X>> {
        match self.take()? {
            Argument::Single(instance) => instance.view_as::<X>(),
            Argument::Many(_) => Err(self.kind_mismatch::<X>("Vec")),
        }
    }

    /// 取出下一个集合参数
    pub fn next_all<X: ?Sized + Send + Sync + 'static>(&mut self) -> BeanResult<Vec<Arc<X>>> {
        match self.take()? {
            Argument::Many(instances) => instances
                .iter()
                .map(BeanInstance::view_as::<X>)
                .collect(),
            Argument::Single(_) => Err(self.kind_mismatch::<X>("Bean")),
        }
    }

    /// 剩余参数个数
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    fn take(&mut self) -> BeanResult<Argument> {
        self.position += 1;
        self.values.next().ok_or_else(|| {
            BeanError::config(format!(
                "{} 的构造参数不足: 第 {} 个参数不存在",
                self.owner, self.position
            ))
        })
    }

    fn kind_mismatch<X: ?Sized + 'static>(&self, actual: &str) -> BeanError {
        BeanError::TypeMismatch {
            expected: format!("{} 的第 {} 个参数 {}", self.owner, self.position, TypeInfo::of::<X>()),
            actual: actual.to_string(),
        }
    }
}

/// 构造函数
#[derive(Clone)]
pub struct Constructor {
    params: Vec<Parameter>,
    build: Arc<BuildFn>,
}

impl Constructor {
    fn new<T, F>(params: Vec<Parameter>, build: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Args) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            params,
            build: Arc::new(move |args: &mut Args| {
                build(args).map(|value| Arc::new(Arc::new(value)) as ViewHandle)
            }),
        }
    }

    /// 参数列表
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// 是否无参
    pub fn is_zero_arg(&self) -> bool {
        self.params.is_empty()
    }

    /// 调用构造函数，返回具体类型句柄
    pub fn invoke(&self, args: &mut Args) -> anyhow::Result<ViewHandle> {
        (self.build)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// 字段访问器
pub trait FieldAccess: Send + Sync {
    /// 从实例句柄中取出字段槽
    fn slot<'a>(&self, instance: &'a ViewHandle) -> Option<FieldSlot<'a>>;
}

struct TypedFieldAccess<T> {
    accessor: for<'a> fn(&'a T) -> FieldSlot<'a>,
}

impl<T: Send + Sync + 'static> FieldAccess for TypedFieldAccess<T> {
    fn slot<'a>(&self, instance: &'a ViewHandle) -> Option<FieldSlot<'a>> {
        instance
            .downcast_ref::<Arc<T>>()
            .map(|value| (self.accessor)(&**value))
    }
}

/// 需要注入的字段
#[derive(Clone)]
pub struct FieldDef {
    name: &'static str,
    bean_name: Option<String>,
    access: Arc<dyn FieldAccess>,
}

impl FieldDef {
    /// 字段名
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// 指定的 Bean 名称
    pub fn bean_name(&self) -> Option<&str> {
        self.bean_name.as_deref()
    }

    /// 取出字段槽
    pub fn slot<'a>(&self, instance: &'a ViewHandle) -> Option<FieldSlot<'a>> {
        self.access.slot(instance)
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("bean_name", &self.bean_name)
            .finish_non_exhaustive()
    }
}

/// 拦截标记值
#[derive(Clone)]
pub struct MarkerValue {
    info: TypeInfo,
    value: Arc<dyn Any + Send + Sync>,
    description: String,
}

impl MarkerValue {
    /// 包装标记
    pub fn new<M: Marker>(marker: M) -> Self {
        Self {
            info: TypeInfo::of::<M>(),
            description: format!("{marker:?}"),
            value: Arc::new(marker),
        }
    }

    /// 标记类型
    pub const fn info(&self) -> TypeInfo {
        self.info
    }

    /// 标记值
    pub fn value(&self) -> &(dyn Any + Send + Sync) {
        &*self.value
    }

    /// 转换为具体标记
    pub fn downcast_ref<M: Marker>(&self) -> Option<&M> {
        self.value.downcast_ref::<M>()
    }
}

impl fmt::Debug for MarkerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// 代理工厂：把原始实例包装成实现同一 trait 的装饰器
#[derive(Clone)]
pub struct ProxyDef {
    view: TypeInfo,
    build: Arc<ProxyFn>,
}

impl ProxyDef {
    fn new<T, X>(build: fn(Arc<T>, Arc<dyn InvocationHandler>) -> Arc<X>) -> Self
    where
        T: Send + Sync + 'static,
        X: ?Sized + Send + Sync + 'static,
    {
        Self {
            view: TypeInfo::of::<X>(),
            build: Arc::new(
                move |original: &ViewHandle, handler: Arc<dyn InvocationHandler>| {
                    original
                        .downcast_ref::<Arc<T>>()
                        .map(|target| Arc::new(build(Arc::clone(target), handler)) as ViewHandle)
                },
            ),
        }
    }

    /// 代理的视图类型
    pub const fn view(&self) -> TypeInfo {
        self.view
    }

    /// 创建代理视图
    pub fn create(&self, original: &ViewHandle, handler: Arc<dyn InvocationHandler>) -> Option<View> {
        (self.build)(original, handler).map(|proxy| View::new(self.view, proxy))
    }
}

/// 类定义
pub struct ClassDef {
    bean_type: BeanType,
    bean: bool,
    bean_name: Option<String>,
    constructors: Vec<Constructor>,
    fields: Vec<FieldDef>,
    methods: Vec<&'static str>,
    class_markers: Vec<MarkerValue>,
    method_markers: Vec<(&'static str, MarkerValue)>,
    proxies: Vec<ProxyDef>,
}

impl ClassDef {
    /// 创建类定义构建器
    pub fn builder<T: Send + Sync + 'static>() -> ClassBuilder<T> {
        ClassBuilder {
            def: Self {
                bean_type: BeanType::of::<T>(),
                bean: false,
                bean_name: None,
                constructors: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                class_markers: Vec::new(),
                method_markers: Vec::new(),
                proxies: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// 类型信息
    pub const fn type_info(&self) -> TypeInfo {
        self.bean_type.info()
    }

    /// 可生产类型
    pub const fn bean_type(&self) -> &BeanType {
        &self.bean_type
    }

    /// 是否带有 Bean 标记
    pub const fn is_bean(&self) -> bool {
        self.bean
    }

    /// Bean 名称
    pub fn bean_name(&self) -> Option<&str> {
        self.bean_name.as_deref()
    }

    /// 查找标识
    pub fn key(&self) -> BeanKey {
        BeanKey::new(self.type_info(), self.bean_name.clone())
    }

    /// 全部构造函数
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// 唯一的构造函数
    pub fn single_constructor(&self) -> BeanResult<&Constructor> {
        match self.constructors.as_slice() {
            [single] => Ok(single),
            [] => Err(BeanError::MissingConstructor {
                type_name: self.type_info().short_name(),
            }),
            many => Err(BeanError::MultipleConstructors {
                type_name: self.type_info().short_name(),
                count: many.len(),
            }),
        }
    }

    /// 校验构造函数不超过一个
    pub fn check_constructor_count(&self) -> BeanResult<()> {
        if self.constructors.len() > 1 {
            return Err(BeanError::MultipleConstructors {
                type_name: self.type_info().short_name(),
                count: self.constructors.len(),
            });
        }
        Ok(())
    }

    /// 需要注入的字段
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// 声明的方法
    pub fn methods(&self) -> &[&'static str] {
        &self.methods
    }

    /// 类级拦截标记
    pub fn class_markers(&self) -> &[MarkerValue] {
        &self.class_markers
    }

    /// 方法级拦截标记
    pub fn method_markers(&self) -> &[(&'static str, MarkerValue)] {
        &self.method_markers
    }

    /// 是否带有任何拦截标记
    pub fn has_markers(&self) -> bool {
        !self.class_markers.is_empty() || !self.method_markers.is_empty()
    }

    /// 代理工厂
    pub fn proxies(&self) -> &[ProxyDef] {
        &self.proxies
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("type", &self.bean_type)
            .field("bean", &self.bean)
            .field("bean_name", &self.bean_name)
            .field("constructors", &self.constructors)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("class_markers", &self.class_markers)
            .field("method_markers", &self.method_markers)
            .finish_non_exhaustive()
    }
}

/// 类定义构建器
pub struct ClassBuilder<T> {
    def: ClassDef,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ClassBuilder<T> {
    /// 标记为 Bean
    #[must_use]
    pub fn bean(mut self) -> Self {
        self.def.bean = true;
        self
    }

    /// 标记为命名 Bean
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.def.bean = true;
        self.def.bean_name = (!name.is_empty()).then_some(name);
        self
    }

    /// 声明可以当作 `X` 使用
    #[must_use]
    pub fn implements<X: ?Sized + Send + Sync + 'static>(mut self, cast: fn(Arc<T>) -> Arc<X>) -> Self {
        self.def.bean_type = self.def.bean_type.implements(cast);
        self
    }

    /// 声明构造函数
    #[must_use]
    pub fn constructor<F>(mut self, params: impl IntoIterator<Item = Parameter>, build: F) -> Self
    where
        F: Fn(&mut Args) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.def
            .constructors
            .push(Constructor::new(params.into_iter().collect(), build));
        self
    }

    /// 声明基于 `Default` 的无参构造函数
    #[must_use]
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor([], |_| Ok(T::default()))
    }

    /// 声明按类型注入的字段
    #[must_use]
    pub fn field(mut self, name: &'static str, accessor: for<'a> fn(&'a T) -> FieldSlot<'a>) -> Self {
        self.def.fields.push(FieldDef {
            name,
            bean_name: None,
            access: Arc::new(TypedFieldAccess { accessor }),
        });
        self
    }

    /// 声明按名称注入的字段
    #[must_use]
    pub fn named_field(
        mut self,
        name: &'static str,
        bean_name: impl Into<String>,
        accessor: for<'a> fn(&'a T) -> FieldSlot<'a>,
    ) -> Self {
        let bean_name = bean_name.into();
        self.def.fields.push(FieldDef {
            name,
            bean_name: (!bean_name.is_empty()).then_some(bean_name),
            access: Arc::new(TypedFieldAccess { accessor }),
        });
        self
    }

    /// 声明方法
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = &'static str>) -> Self {
        for method in methods {
            if !self.def.methods.contains(&method) {
                self.def.methods.push(method);
            }
        }
        self
    }

    /// 类级拦截标记，作用于全部声明的方法
    #[must_use]
    pub fn marker<M: Marker>(mut self, marker: M) -> Self {
        self.def.class_markers.push(MarkerValue::new(marker));
        self
    }

    /// 方法级拦截标记
    #[must_use]
    pub fn method_marker<M: Marker>(mut self, method: &'static str, marker: M) -> Self {
        self = self.methods([method]);
        self.def.method_markers.push((method, MarkerValue::new(marker)));
        self
    }

    /// 为 trait 视图 `X` 声明代理工厂
    #[must_use]
    pub fn proxy<X: ?Sized + Send + Sync + 'static>(
        mut self,
        build: fn(Arc<T>, Arc<dyn InvocationHandler>) -> Arc<X>,
    ) -> Self {
        self.def.proxies.push(ProxyDef::new(build));
        self
    }

    /// 完成构建
    pub fn build(self) -> Arc<ClassDef> {
        Arc::new(self.def)
    }
}
