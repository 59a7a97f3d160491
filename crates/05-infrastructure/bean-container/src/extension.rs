//! 扩展管线
//!
//! 扩展在两个时机介入扫描：每个类 Bean 实例化之后、注册之前（[`Extension::process_created`]），
//! 以及全部 Bean 注册完成之后（[`Extension::process_beans`]）。两者都按优先级升序执行。

use crate::container::Container;
use crate::descriptor::BeanDescriptor;
use bean_abstractions::BeanInstance;
use bean_common::{BeanResult, TypeInfo};
use std::any::TypeId;

/// 容器扩展
pub trait Extension: Send + Sync + 'static {
    /// 扩展名称，用于日志与错误信息
    fn name(&self) -> String {
        TypeInfo::of::<Self>().short_name()
    }

    /// 优先级，越小越先执行
    fn priority(&self) -> i32;

    /// 全部 Bean 注册完成后调用
    fn process_beans(&self, container: &Container) -> BeanResult<()>;

    /// 类 Bean 实例化之后、注册之前调用
    ///
    /// 返回的实例替换原实例继续交给下一个扩展；返回 `None` 会使扫描失败。
    fn process_created(
        &self,
        instance: BeanInstance,
        _descriptor: &BeanDescriptor,
        _container: &mut Container,
    ) -> BeanResult<Option<BeanInstance>> {
        Ok(Some(instance))
    }

    /// 扩展的具体类型，同一类型只能添加一次
    fn extension_type(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}
