//! 方法拦截
//!
//! [`MarkerTable`] 记录一个类每个方法上生效的拦截标记：类级标记作用于全部声明的方法，
//! 方法级标记覆盖同类型的类级标记。[`Interceptor`] 是容器为每个被代理 Bean 创建的
//! [`InvocationHandler`]。

use bean_abstractions::{
    ActiveHooks, Call, ClassDef, ErasedWrapper, InvocationHandler, JoinPoint, MarkerValue, Outcome,
    ViewHandle,
};
use bean_common::{BeanError, BeanResult, TypeInfo};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 单个类的方法标记表
#[derive(Debug, Default)]
pub struct MarkerTable {
    methods: HashMap<&'static str, Vec<MarkerValue>>,
}

impl MarkerTable {
    /// 从类定义构建
    pub fn from_class(class: &ClassDef) -> Self {
        let mut methods: HashMap<&'static str, Vec<MarkerValue>> = HashMap::new();
        for &method in class.methods() {
            methods.insert(method, class.class_markers().to_vec());
        }

        for (method, marker) in class.method_markers() {
            let markers = methods.entry(*method).or_default();
            match markers.iter_mut().find(|existing| existing.info() == marker.info()) {
                Some(existing) => *existing = marker.clone(),
                None => markers.push(marker.clone()),
            }
        }

        methods.retain(|_, markers| !markers.is_empty());
        Self { methods }
    }

    /// 方法上的全部标记
    pub fn markers(&self, method: &str) -> &[MarkerValue] {
        self.methods.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 方法上指定类型的标记
    pub fn marker(&self, method: &str, marker_type: TypeInfo) -> Option<&MarkerValue> {
        self.markers(method)
            .iter()
            .find(|marker| marker.info() == marker_type)
    }

    /// 任一方法是否带有指定类型的标记
    pub fn contains_type(&self, marker_type: TypeInfo) -> bool {
        self.methods
            .values()
            .flatten()
            .any(|marker| marker.info() == marker_type)
    }

    /// 带标记的方法个数
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// 是否没有任何标记
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// 标记表缓存，每个类只构建一次
#[derive(Debug, Default)]
pub struct MarkerCache {
    tables: HashMap<TypeId, Arc<MarkerTable>>,
}

impl MarkerCache {
    /// 取出（或构建）类的标记表
    pub fn table(&mut self, class: &ClassDef) -> Arc<MarkerTable> {
        Arc::clone(
            self.tables
                .entry(class.type_info().id())
                .or_insert_with(|| Arc::new(MarkerTable::from_class(class))),
        )
    }

    /// 已缓存的类个数
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// 被代理 Bean 的调用处理器
pub struct Interceptor {
    target: ViewHandle,
    target_type: TypeInfo,
    wrappers: Vec<Arc<dyn ErasedWrapper>>,
    table: Arc<MarkerTable>,
}

impl Interceptor {
    /// 创建处理器，`wrappers` 的顺序即钩子执行顺序
    pub fn new(
        target: ViewHandle,
        target_type: TypeInfo,
        wrappers: Vec<Arc<dyn ErasedWrapper>>,
        table: Arc<MarkerTable>,
    ) -> Self {
        Self {
            target,
            target_type,
            wrappers,
            table,
        }
    }

    fn join_point<'a>(&'a self, call: &Call<'a>) -> JoinPoint<'a> {
        JoinPoint {
            target: &self.target,
            target_type: self.target_type,
            method: call.method,
            args: call.args,
            proxy: call.proxy,
        }
    }

    /// before 中途失败：已执行 before 的钩子按相反顺序收到失败结果
    fn unwind(&self, point: &JoinPoint<'_>, hooks: ActiveHooks, error: &BeanError) {
        let outcome = Outcome::failed(error);
        for (index, state) in hooks.into_iter().rev() {
            let Some(wrapper) = self.wrappers.get(index) else {
                continue;
            };
            let Some(marker) = self.table.marker(point.method, wrapper.marker_type()) else {
                continue;
            };
            if let Err(hook_error) = wrapper.after(point, marker, &outcome, state) {
                warn!("after 钩子 {} 执行失败: {}", wrapper.wrapper_name(), hook_error);
            }
        }
    }
}

impl InvocationHandler for Interceptor {
    fn target_type(&self) -> TypeInfo {
        self.target_type
    }

    fn before(&self, call: &Call<'_>) -> BeanResult<ActiveHooks> {
        let mut hooks = ActiveHooks::new();
        if self.table.markers(call.method).is_empty() {
            return Ok(hooks);
        }

        let point = self.join_point(call);
        for (index, wrapper) in self.wrappers.iter().enumerate() {
            if let Some(marker) = self.table.marker(call.method, wrapper.marker_type()) {
                debug!("执行 before 钩子 {} -> {}", wrapper.wrapper_name(), point.qualified_name());
                match wrapper.before(&point, marker) {
                    Ok(state) => hooks.push(index, state),
                    Err(error) => {
                        self.unwind(&point, hooks, &error);
                        return Err(error);
                    }
                }
            }
        }
        Ok(hooks)
    }

    fn after(&self, call: &Call<'_>, hooks: ActiveHooks, outcome: &Outcome<'_>) -> BeanResult<()> {
        let point = self.join_point(call);
        let mut first_error = None;
        for (index, state) in hooks {
            let Some(wrapper) = self.wrappers.get(index) else {
                continue;
            };
            let Some(marker) = self.table.marker(call.method, wrapper.marker_type()) else {
                continue;
            };

            debug!("执行 after 钩子 {} -> {}", wrapper.wrapper_name(), point.qualified_name());
            if let Err(error) = wrapper.after(&point, marker, outcome, state) {
                warn!("after 钩子 {} 执行失败: {}", wrapper.wrapper_name(), error);
                first_error.get_or_insert(error);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
