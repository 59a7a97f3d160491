//! Bean 解析器抽象接口

use crate::instance::BeanInstance;
use crate::key::BeanKey;
use bean_common::{BeanResult, TypeInfo};
use std::sync::Arc;

/// Bean 解析器
///
/// 扫描完成后的只读查找入口，延迟访问器和容器句柄都通过它查找 Bean。
pub trait BeanResolver: Send + Sync {
    /// 按标识解析已注册的 Bean
    fn resolve(&self, key: &BeanKey) -> BeanResult<BeanInstance>;

    /// 解析所有可以当作指定类型使用的 Bean（按注册顺序）
    fn resolve_all(&self, declared: TypeInfo) -> Vec<BeanInstance>;

    /// 检查是否可以解析
    fn can_resolve(&self, key: &BeanKey) -> bool;
}

impl dyn BeanResolver {
    /// 按类型解析
    pub fn get<X: ?Sized + Send + Sync + 'static>(&self) -> BeanResult<Arc<X>> {
        self.resolve(&BeanKey::of::<X>())?.view_as::<X>()
    }

    /// 按名称解析
    pub fn get_named<X: ?Sized + Send + Sync + 'static>(&self, name: &str) -> BeanResult<Arc<X>> {
        self.resolve(&BeanKey::named::<X>(name))?.view_as::<X>()
    }

    /// 解析所有可以当作 `X` 使用的 Bean
    pub fn get_all<X: ?Sized + Send + Sync + 'static>(&self) -> BeanResult<Vec<Arc<X>>> {
        self.resolve_all(TypeInfo::of::<X>())
            .iter()
            .map(BeanInstance::view_as::<X>)
            .collect()
    }
}
