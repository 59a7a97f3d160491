//! 代理生成

use crate::container::Container;
use crate::descriptor::BeanDescriptor;
use crate::extension::Extension;
use crate::interceptor::Interceptor;
use bean_abstractions::{BeanInstance, ErasedWrapper, InvocationHandler, MethodWrapper};
use bean_common::{BeanError, BeanResult, DEFAULT_AOP_PRIORITY};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 为带拦截标记的 Bean 创建代理视图
///
/// 每种标记类型只对应一个包装器，后添加的同类型包装器会替换先前的，但保留原来的执行位置。
pub struct AopExtension {
    priority: i32,
    wrappers: RwLock<Vec<Arc<dyn ErasedWrapper>>>,
}

impl AopExtension {
    /// 创建扩展
    pub fn new(priority: i32) -> Self {
        Self {
            priority,
            wrappers: RwLock::new(Vec::new()),
        }
    }

    /// 添加方法包装器
    pub fn add_wrapper<W: MethodWrapper>(&self, wrapper: W) {
        self.add_erased(Arc::new(wrapper));
    }

    /// 添加已擦除类型的方法包装器
    pub fn add_erased(&self, wrapper: Arc<dyn ErasedWrapper>) {
        let mut wrappers = self.wrappers.write();
        let marker_type = wrapper.marker_type();
        debug!("添加方法包装器 {}, 标记: {}", wrapper.wrapper_name(), marker_type);
        match wrappers
            .iter_mut()
            .find(|existing| existing.marker_type() == marker_type)
        {
            Some(existing) => *existing = wrapper,
            None => wrappers.push(wrapper),
        }
    }

    /// 已添加的包装器个数
    pub fn wrapper_count(&self) -> usize {
        self.wrappers.read().len()
    }
}

impl Default for AopExtension {
    fn default() -> Self {
        Self::new(DEFAULT_AOP_PRIORITY)
    }
}

impl fmt::Debug for AopExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AopExtension")
            .field("priority", &self.priority)
            .field(
                "wrappers",
                &self
                    .wrappers
                    .read()
                    .iter()
                    .map(|wrapper| wrapper.wrapper_name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Extension for AopExtension {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn process_beans(&self, _container: &Container) -> BeanResult<()> {
        Ok(())
    }

    fn process_created(
        &self,
        instance: BeanInstance,
        descriptor: &BeanDescriptor,
        container: &mut Container,
    ) -> BeanResult<Option<BeanInstance>> {
        let class = descriptor.class();
        if !class.has_markers() {
            return Ok(Some(instance));
        }

        let table = container.marker_table(class);
        let wrappers: Vec<Arc<dyn ErasedWrapper>> = self
            .wrappers
            .read()
            .iter()
            .filter(|wrapper| table.contains_type(wrapper.marker_type()))
            .cloned()
            .collect();
        if wrappers.is_empty() {
            return Ok(Some(instance));
        }

        if class.proxies().is_empty() {
            return Err(BeanError::NotInterceptable {
                type_name: class.type_info().short_name(),
            });
        }

        let target = instance
            .concrete_handle()
            .cloned()
            .ok_or_else(|| BeanError::TypeMismatch {
                expected: class.type_info().short_name(),
                actual: instance.concrete_type().short_name(),
            })?;
        container
            .registry()
            .record_original(descriptor.key().clone(), instance.clone());

        let wrapper_count = wrappers.len();
        let handler: Arc<dyn InvocationHandler> = Arc::new(Interceptor::new(
            Arc::clone(&target),
            class.type_info(),
            wrappers,
            table,
        ));

        let mut proxied = instance;
        for proxy in class.proxies() {
            let view = proxy
                .create(&target, Arc::clone(&handler))
                .ok_or_else(|| BeanError::TypeMismatch {
                    expected: class.type_info().short_name(),
                    actual: proxied.concrete_type().short_name(),
                })?;
            proxied = proxied.with_view(view);
        }

        info!(
            "为 Bean {} 创建代理, 视图: {}, 包装器: {}",
            descriptor,
            class
                .proxies()
                .iter()
                .map(|proxy| proxy.view().short_name())
                .collect::<Vec<_>>()
                .join(", "),
            wrapper_count
        );
        Ok(Some(proxied))
    }
}
