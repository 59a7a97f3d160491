//! 注入槽
//!
//! 构造完成后才能填充的字段：单个 Bean、自引用、类型化集合以及延迟访问器。
//! 槽都使用内部可变性，容器在注册完成后通过共享引用写入。

use crate::instance::BeanInstance;
use crate::key::BeanKey;
use crate::resolver::BeanResolver;
use bean_common::{BeanError, BeanResult, TypeInfo, TypeKind};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

/// 字段槽
pub enum FieldSlot<'a> {
    /// 单个 Bean
    Single(&'a dyn InjectSlot),
    /// 指向 Bean 自身（最终注册的实例，可能是代理）
    SelfRef(&'a dyn InjectSlot),
    /// 延迟访问器；`None` 表示字段本身未初始化
    Accessor(Option<&'a dyn AccessorSlot>),
    /// 集合；`None` 表示字段不是可识别的类型化集合
    Collection(Option<&'a dyn CollectionSlot>),
}

impl<'a> FieldSlot<'a> {
    /// 单 Bean 字段
    pub fn single<X: ?Sized + Send + Sync + 'static>(slot: &'a Inject<X>) -> Self {
        Self::Single(slot)
    }

    /// 自引用字段
    pub fn self_ref<X: ?Sized + Send + Sync + 'static>(slot: &'a SelfRef<X>) -> Self {
        Self::SelfRef(slot)
    }

    /// 延迟访问器字段
    pub fn accessor<X: ?Sized + Send + Sync + 'static>(slot: &'a Option<BeanAccessor<X>>) -> Self {
        Self::Accessor(slot.as_ref().map(|accessor| accessor as &dyn AccessorSlot))
    }

    /// 类型化集合字段
    pub fn collection<X: ?Sized + Send + Sync + 'static>(slot: &'a TypedCollection<X>) -> Self {
        Self::Collection(Some(slot))
    }

    /// 普通集合字段（无法注入）
    pub const fn untyped_collection() -> Self {
        Self::Collection(None)
    }
}

/// 单值注入槽
pub trait InjectSlot: Send + Sync {
    /// 声明类型
    fn declared_type(&self) -> TypeInfo;

    /// 写入实例
    fn fill(&self, instance: &BeanInstance) -> BeanResult<()>;

    /// 是否已写入
    fn is_filled(&self) -> bool;
}

/// 集合注入槽
pub trait CollectionSlot: Send + Sync {
    /// 元素类型
    fn element_type(&self) -> Option<TypeInfo>;

    /// 插入实例，已存在时返回 `false`
    fn insert(&self, instance: &BeanInstance) -> BeanResult<bool>;

    /// 当前元素个数
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 延迟访问器槽
pub trait AccessorSlot: Send + Sync {
    /// 查找标识
    fn key(&self) -> BeanKey;

    /// 绑定解析器
    fn bind(&self, resolver: Weak<dyn BeanResolver>);

    /// 是否已绑定
    fn is_bound(&self) -> bool;
}

/// 单 Bean 字段
pub struct Inject<X: ?Sized> {
    cell: OnceCell<Arc<X>>,
}

impl<X: ?Sized + Send + Sync + 'static> Inject<X> {
    /// 创建空槽
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// 取出注入的 Bean
    pub fn get(&self) -> BeanResult<Arc<X>> {
        self.cell.get().cloned().ok_or_else(|| BeanError::NotInjected {
            type_name: TypeInfo::of::<X>().short_name(),
        })
    }

    /// 取出注入的 Bean（未注入时为 `None`）
    pub fn try_get(&self) -> Option<&Arc<X>> {
        self.cell.get()
    }
}

impl<X: ?Sized + Send + Sync + 'static> Default for Inject<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X: ?Sized + Send + Sync + 'static> InjectSlot for Inject<X> {
    fn declared_type(&self) -> TypeInfo {
        TypeInfo::of::<X>()
    }

    fn fill(&self, instance: &BeanInstance) -> BeanResult<()> {
        let value = instance.view_as::<X>()?;
        // 重复扫描时保留第一次注入的实例
        let _ = self.cell.set(value);
        Ok(())
    }

    fn is_filled(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<X: ?Sized> fmt::Debug for Inject<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("filled", &self.cell.get().is_some())
            .finish()
    }
}

/// 自引用字段
///
/// 注入的是 Bean 最终注册的实例；Bean 被代理时即为代理，内部自调用因此也会经过拦截。
/// 只保存弱引用，Bean 与自身（或代理）之间不形成引用环；注册表释放后 [`get`](Self::get)
/// 返回 [`BeanError::ContainerDropped`]。
pub struct SelfRef<X: ?Sized> {
    cell: OnceCell<Weak<X>>,
}

impl<X: ?Sized + Send + Sync + 'static> SelfRef<X> {
    /// 创建空槽
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// 取出自身引用
    pub fn get(&self) -> BeanResult<Arc<X>> {
        let type_name = || TypeInfo::of::<X>().short_name();
        let weak = self.cell.get().ok_or_else(|| BeanError::NotInjected {
            type_name: type_name(),
        })?;
        weak.upgrade().ok_or_else(|| BeanError::ContainerDropped {
            type_name: type_name(),
        })
    }
}

impl<X: ?Sized + Send + Sync + 'static> Default for SelfRef<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X: ?Sized + Send + Sync + 'static> InjectSlot for SelfRef<X> {
    fn declared_type(&self) -> TypeInfo {
        TypeInfo::of::<X>()
    }

    fn fill(&self, instance: &BeanInstance) -> BeanResult<()> {
        let value = instance.view_as::<X>()?;
        let _ = self.cell.set(Arc::downgrade(&value));
        Ok(())
    }

    fn is_filled(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<X: ?Sized> fmt::Debug for SelfRef<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfRef")
            .field("filled", &self.cell.get().is_some())
            .finish()
    }
}

/// 类型化集合
///
/// 对外暴露元素类型，容器据此收集所有可赋值的 Bean。按插入顺序保存，按对象身份去重。
pub struct TypedCollection<X: ?Sized> {
    items: RwLock<Vec<Arc<X>>>,
}

impl<X: ?Sized + Send + Sync + 'static> TypedCollection<X> {
    /// 创建空集合
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// 当前元素快照
    pub fn snapshot(&self) -> Vec<Arc<X>> {
        self.items.read().clone()
    }

    /// 是否包含同一个对象
    pub fn contains(&self, item: &Arc<X>) -> bool {
        self.items.read().iter().any(|existing| Arc::ptr_eq(existing, item))
    }

    /// 手动加入元素
    pub fn push(&self, item: Arc<X>) -> bool {
        let mut items = self.items.write();
        if items.iter().any(|existing| Arc::ptr_eq(existing, &item)) {
            return false;
        }
        items.push(item);
        true
    }
}

impl<X: ?Sized + Send + Sync + 'static> Default for TypedCollection<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X: ?Sized + Send + Sync + 'static> CollectionSlot for TypedCollection<X> {
    fn element_type(&self) -> Option<TypeInfo> {
        let info = TypeInfo::of::<X>();
        if is_typed_collection(info.name()) {
            Some(info.with_kind(TypeKind::TypedCollection))
        } else {
            Some(info)
        }
    }

    fn insert(&self, instance: &BeanInstance) -> BeanResult<bool> {
        Ok(self.push(instance.view_as::<X>()?))
    }

    fn len(&self) -> usize {
        self.items.read().len()
    }
}

impl<X: ?Sized> fmt::Debug for TypedCollection<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedCollection")
            .field("len", &self.items.read().len())
            .finish()
    }
}

fn is_typed_collection(type_name: &str) -> bool {
    let own = std::any::type_name::<TypedCollection<()>>();
    let prefix = own.split('<').next().unwrap_or(own);
    type_name.starts_with(prefix) && type_name[prefix.len()..].starts_with('<')
}

/// 延迟访问器
///
/// 持有请求的类型与名称；容器在注册完成后绑定解析器，之后每次 [`get`](Self::get) 都会执行查找。
pub struct BeanAccessor<X: ?Sized> {
    key: BeanKey,
    resolver: OnceCell<Weak<dyn BeanResolver>>,
    _marker: PhantomData<fn() -> Arc<X>>,
}

impl<X: ?Sized + Send + Sync + 'static> BeanAccessor<X> {
    /// 按类型查找
    pub fn new() -> Self {
        Self {
            key: BeanKey::of::<X>(),
            resolver: OnceCell::new(),
            _marker: PhantomData,
        }
    }

    /// 按名称查找
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            key: BeanKey::named::<X>(name),
            resolver: OnceCell::new(),
            _marker: PhantomData,
        }
    }

    /// 查找 Bean
    pub fn get(&self) -> BeanResult<Arc<X>> {
        let resolver = self.resolver.get().ok_or_else(|| BeanError::AccessorNotBound {
            type_name: self.key.declared().short_name(),
            name: self.key.name().unwrap_or_default().to_string(),
        })?;
        let resolver = resolver.upgrade().ok_or_else(|| BeanError::ContainerDropped {
            type_name: self.key.declared().short_name(),
        })?;
        resolver.resolve(&self.key)?.view_as::<X>()
    }
}

impl<X: ?Sized + Send + Sync + 'static> Default for BeanAccessor<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X: ?Sized + Send + Sync + 'static> AccessorSlot for BeanAccessor<X> {
    fn key(&self) -> BeanKey {
        self.key.clone()
    }

    fn bind(&self, resolver: Weak<dyn BeanResolver>) {
        let _ = self.resolver.set(resolver);
    }

    fn is_bound(&self) -> bool {
        self.resolver.get().is_some()
    }
}

impl<X: ?Sized> fmt::Debug for BeanAccessor<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanAccessor")
            .field("key", &self.key)
            .field("bound", &self.resolver.get().is_some())
            .finish()
    }
}
