//! 单 Bean 字段与延迟访问器注入

use super::visit_fields;
use crate::container::Container;
use crate::extension::Extension;
use bean_abstractions::{BeanKey, FieldSlot};
use bean_common::{BeanError, BeanResult, DEFAULT_INJECT_BEAN_PRIORITY};
use tracing::debug;

/// 填充 [`Inject`](bean_abstractions::Inject) 字段并绑定 [`BeanAccessor`](bean_abstractions::BeanAccessor)
#[derive(Debug)]
pub struct InjectBeanExtension {
    priority: i32,
}

impl InjectBeanExtension {
    /// 创建扩展
    pub const fn new(priority: i32) -> Self {
        Self { priority }
    }
}

impl Default for InjectBeanExtension {
    fn default() -> Self {
        Self::new(DEFAULT_INJECT_BEAN_PRIORITY)
    }
}

impl Extension for InjectBeanExtension {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn process_beans(&self, container: &Container) -> BeanResult<()> {
        debug!("向 Bean 字段注入依赖");
        visit_fields(container, |bean, field, slot| match slot {
            FieldSlot::Single(slot) => {
                if slot.is_filled() {
                    return Ok(());
                }
                let key = BeanKey::new(slot.declared_type(), field.bean_name().map(str::to_string));
                debug!(
                    "注入字段 {}.{} <- {}",
                    bean.instance().concrete_type().short_name(),
                    field.name(),
                    key
                );
                let dependency = container.inject_key(&key)?;
                slot.fill(&dependency)
            }
            FieldSlot::Accessor(None) => Err(BeanError::AccessorFieldUnset {
                owner: bean.instance().concrete_type().short_name(),
                field: field.name().to_string(),
            }),
            FieldSlot::Accessor(Some(accessor)) => {
                debug!(
                    "绑定访问器 {}.{} -> {}",
                    bean.instance().concrete_type().short_name(),
                    field.name(),
                    accessor.key()
                );
                accessor.bind(container.resolver());
                Ok(())
            }
            FieldSlot::SelfRef(_) | FieldSlot::Collection(_) => Ok(()),
        })
    }
}
