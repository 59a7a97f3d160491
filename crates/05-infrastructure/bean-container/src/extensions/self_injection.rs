//! 自引用注入

use super::visit_fields;
use crate::container::Container;
use crate::extension::Extension;
use bean_abstractions::FieldSlot;
use bean_common::{BeanError, BeanResult, DEFAULT_SELF_INJECTION_PRIORITY};
use tracing::debug;

/// 向 [`SelfRef`](bean_abstractions::SelfRef) 字段写入 Bean 最终注册的实例
///
/// 被代理的 Bean 由此拿到自己的代理视图，从内部发起的调用同样会被拦截。
#[derive(Debug)]
pub struct SelfInjectionExtension {
    priority: i32,
}

impl SelfInjectionExtension {
    /// 创建扩展
    pub const fn new(priority: i32) -> Self {
        Self { priority }
    }
}

impl Default for SelfInjectionExtension {
    fn default() -> Self {
        Self::new(DEFAULT_SELF_INJECTION_PRIORITY)
    }
}

impl Extension for SelfInjectionExtension {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn process_beans(&self, container: &Container) -> BeanResult<()> {
        debug!("注入自引用字段");
        visit_fields(container, |bean, field, slot| {
            let FieldSlot::SelfRef(slot) = slot else {
                return Ok(());
            };

            let declared = slot.declared_type();
            if !bean.instance().is_assignable_to(declared.id()) {
                return Err(BeanError::SelfReferenceMismatch {
                    owner: bean.instance().concrete_type().short_name(),
                    field: field.name().to_string(),
                    expected: declared.short_name(),
                });
            }
            slot.fill(bean.instance())
        })
    }
}
