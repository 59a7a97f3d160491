//! Bean 实例
//!
//! 一个实例由若干“视图”组成：第一个视图是具体类型本身，其余视图是它可以被当作的 trait 对象。
//! 每个视图句柄都是一个 `Arc<dyn Any + Send + Sync>`，内部装着对应视图类型 `X` 的 `Arc<X>`。

use bean_common::{BeanError, BeanResult, TypeInfo};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// 视图句柄，内部为 `Arc<X>`
pub type ViewHandle = Arc<dyn Any + Send + Sync>;

/// 实例的一个类型视图
#[derive(Clone)]
pub struct View {
    info: TypeInfo,
    handle: ViewHandle,
}

impl View {
    /// 创建视图
    pub fn new(info: TypeInfo, handle: ViewHandle) -> Self {
        Self { info, handle }
    }

    /// 从具体值创建视图
    pub fn of<X: ?Sized + Send + Sync + 'static>(value: Arc<X>) -> Self {
        Self {
            info: TypeInfo::of::<X>(),
            handle: Arc::new(value),
        }
    }

    /// 视图类型
    pub const fn info(&self) -> TypeInfo {
        self.info
    }

    /// 视图句柄
    pub const fn handle(&self) -> &ViewHandle {
        &self.handle
    }
}

/// 已实例化的 Bean
#[derive(Clone)]
pub struct BeanInstance {
    concrete: TypeInfo,
    views: Arc<[View]>,
}

impl BeanInstance {
    /// 用具体值创建只有一个视图的实例
    pub fn new<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            concrete: TypeInfo::of::<T>(),
            views: Arc::from(vec![View::of(value)]),
        }
    }

    /// 由视图列表创建实例，第一个视图必须是具体类型
    pub fn from_views(concrete: TypeInfo, views: Vec<View>) -> Self {
        Self {
            concrete,
            views: Arc::from(views),
        }
    }

    /// 具体类型
    pub const fn concrete_type(&self) -> TypeInfo {
        self.concrete
    }

    /// 具体类型的句柄
    pub fn concrete_handle(&self) -> Option<&ViewHandle> {
        self.view(self.concrete.id())
    }

    /// 按类型查找视图句柄
    pub fn view(&self, id: TypeId) -> Option<&ViewHandle> {
        self.views
            .iter()
            .find(|view| view.info.id() == id)
            .map(|view| &view.handle)
    }

    /// 全部视图
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.iter()
    }

    /// 是否可以当作指定类型使用
    pub fn is_assignable_to(&self, id: TypeId) -> bool {
        self.view(id).is_some()
    }

    /// 取出指定类型的视图
    pub fn get<X: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<X>> {
        self.view(TypeId::of::<X>())?
            .downcast_ref::<Arc<X>>()
            .cloned()
    }

    /// 取出指定类型的视图，失败时返回类型不匹配错误
    pub fn view_as<X: ?Sized + Send + Sync + 'static>(&self) -> BeanResult<Arc<X>> {
        self.get::<X>().ok_or_else(|| BeanError::TypeMismatch {
            expected: TypeInfo::of::<X>().short_name(),
            actual: self.concrete.short_name(),
        })
    }

    /// 替换（或追加）一个视图，返回新实例
    #[must_use]
    pub fn with_view(&self, view: View) -> Self {
        let mut views: Vec<View> = self.views.to_vec();
        match views.iter_mut().find(|existing| existing.info == view.info) {
            Some(existing) => *existing = view,
            None => views.push(view),
        }
        Self::from_views(self.concrete, views)
    }

    /// 两个实例是否指向同一个对象（比较指定视图）
    pub fn same_view(&self, other: &Self, id: TypeId) -> bool {
        match (self.view(id), other.view(id)) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }

    /// 两个实例的具体对象是否相同
    pub fn same_bean(&self, other: &Self) -> bool {
        self.concrete == other.concrete && self.same_view(other, self.concrete.id())
    }
}

impl fmt::Debug for BeanInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanInstance")
            .field("concrete", &self.concrete.short_name())
            .field(
                "views",
                &self
                    .views
                    .iter()
                    .map(|view| view.info.short_name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
