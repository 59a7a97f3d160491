//! 类型化集合注入

use super::visit_fields;
use crate::container::Container;
use crate::extension::Extension;
use bean_abstractions::FieldSlot;
use bean_common::{BeanError, BeanResult, TypeKind, DEFAULT_TYPED_COLLECTION_PRIORITY};
use tracing::{debug, warn};

/// 向 [`TypedCollection`](bean_abstractions::TypedCollection) 字段写入所有兼容的 Bean
#[derive(Debug)]
pub struct TypedCollectionExtension {
    priority: i32,
}

impl TypedCollectionExtension {
    /// 创建扩展
    pub const fn new(priority: i32) -> Self {
        Self { priority }
    }
}

impl Default for TypedCollectionExtension {
    fn default() -> Self {
        Self::new(DEFAULT_TYPED_COLLECTION_PRIORITY)
    }
}

impl Extension for TypedCollectionExtension {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn process_beans(&self, container: &Container) -> BeanResult<()> {
        debug!("向类型化集合字段注入 Bean");
        let registry = container.registry();
        visit_fields(container, |bean, field, slot| {
            let FieldSlot::Collection(slot) = slot else {
                return Ok(());
            };
            let owner = bean.instance().concrete_type().short_name();

            let Some(slot) = slot else {
                warn!("字段 {}.{} 是普通集合而不是类型化集合, 已忽略", owner, field.name());
                return Ok(());
            };
            let element = slot.element_type().ok_or_else(|| BeanError::UntypedCollection {
                owner: owner.clone(),
                field: field.name().to_string(),
            })?;
            if element.kind() == TypeKind::TypedCollection {
                return Err(BeanError::NestedTypedCollection {
                    owner,
                    field: field.name().to_string(),
                });
            }

            let candidates = registry.assignable(element);
            debug!(
                "向 {}.{} 注入 {} 个 {}",
                owner,
                field.name(),
                candidates.len(),
                element
            );
            for candidate in &candidates {
                slot.insert(candidate)?;
            }
            Ok(())
        })
    }
}
