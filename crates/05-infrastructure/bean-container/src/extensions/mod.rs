//! 内置扩展

mod aop;
mod inject_bean;
mod self_injection;
mod typed_collection;

pub use aop::AopExtension;
pub use inject_bean::InjectBeanExtension;
pub use self_injection::SelfInjectionExtension;
pub use typed_collection::TypedCollectionExtension;

use crate::container::Container;
use crate::registry::RegisteredBean;
use bean_abstractions::{FieldDef, FieldSlot};
use bean_common::BeanResult;

/// 依次访问每个已注册 Bean 声明的注入字段
///
/// 被代理的 Bean 访问原始实例；没有类定义或没有声明字段的 Bean 会被跳过。
fn visit_fields<F>(container: &Container, mut visit: F) -> BeanResult<()>
where
    F: FnMut(&RegisteredBean, &FieldDef, FieldSlot<'_>) -> BeanResult<()>,
{
    let registry = container.registry();
    for bean in registry.entries() {
        let Some(class) = bean.class().cloned() else {
            continue;
        };
        if class.fields().is_empty() {
            continue;
        }

        let original = registry.original_or_registered(&bean);
        let Some(handle) = original.concrete_handle() else {
            continue;
        };
        for field in class.fields() {
            if let Some(slot) = field.slot(handle) {
                visit(&bean, field, slot)?;
            }
        }
    }
    Ok(())
}
