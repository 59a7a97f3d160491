//! 事务方法钩子

use crate::configurator::{Configurator, SpanOptions};
use crate::marker::Transaction;
use crate::span::{Span, SpanHub, SpanStatus};
use bean_abstractions::{HookState, JoinPoint, MethodWrapper, Outcome};
use bean_common::{BeanError, BeanResult};
use dashmap::DashMap;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// 为带 [`Transaction`] 标记的方法开始、结束跨度
///
/// 已有当前跨度时开始子跨度，否则开始新事务。绑定到作用域的跨度在 after 中从作用域栈弹出；
/// 未绑定的跨度通过 [`HookState`] 交给 after。
pub struct TransactionWrapper {
    hub: Arc<SpanHub>,
    configurators: DashMap<TypeId, Arc<dyn Configurator>>,
}

impl TransactionWrapper {
    /// 使用指定跨度中心创建钩子
    pub fn new(hub: Arc<SpanHub>) -> Self {
        Self {
            hub,
            configurators: DashMap::new(),
        }
    }

    /// 跨度中心
    pub fn hub(&self) -> &Arc<SpanHub> {
        &self.hub
    }

    fn configurator(&self, marker: &Transaction) -> BeanResult<Arc<dyn Configurator>> {
        let info = marker.configurator.info();
        if let Some(cached) = self.configurators.get(&info.id()) {
            return Ok(Arc::clone(cached.value()));
        }

        let created = marker
            .configurator
            .create()
            .map_err(|source| BeanError::ConfiguratorInstantiation {
                configurator: info.short_name(),
                source: source.into(),
            })?;
        Ok(Arc::clone(
            self.configurators.entry(info.id()).or_insert(created).value(),
        ))
    }
}

impl Default for TransactionWrapper {
    fn default() -> Self {
        Self::new(Arc::new(SpanHub::new()))
    }
}

impl fmt::Debug for TransactionWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionWrapper")
            .field("configurators", &self.configurators.len())
            .finish_non_exhaustive()
    }
}

impl MethodWrapper for TransactionWrapper {
    type Marker = Transaction;

    fn before(&self, point: &JoinPoint<'_>, marker: &Transaction) -> BeanResult<Option<HookState>> {
        let current = self.hub.current();
        if marker.only_span && current.is_none() {
            return Ok(None);
        }

        let mut options = SpanOptions::default();
        self.configurator(marker)?
            .configure(marker, &mut options, point);

        let name = marker
            .name
            .clone()
            .unwrap_or_else(|| point.qualified_name());
        let span = match current {
            Some(parent) => parent.start_child(name, marker.operation.as_str(), &options),
            None => self
                .hub
                .start_transaction(name, marker.operation.as_str(), &options),
        };
        debug!("开始跨度 {} ({})", span.name(), span.operation());

        if marker.bind_to_scope {
            self.hub.bind(span);
            Ok(None)
        } else {
            Ok(Some(HookState::new(span)))
        }
    }

    fn after(
        &self,
        point: &JoinPoint<'_>,
        marker: &Transaction,
        outcome: &Outcome<'_>,
        state: Option<HookState>,
    ) -> BeanResult<()> {
        if marker.only_span && state.is_none() && self.hub.current().is_none() {
            // before 没有开始跨度
            return Ok(());
        }

        let span = if marker.bind_to_scope {
            self.hub.pop_bound()
        } else {
            state.and_then(|state| state.downcast::<Arc<Span>>().ok())
        };
        let Some(span) = span else {
            warn!("方法 {} 结束时找不到对应的跨度", point.qualified_name());
            return Ok(());
        };

        if marker.capture_failures {
            if let Some(failure) = outcome.failure() {
                span.set_failure(failure.to_string());
            }
        }
        let status = if outcome.is_success() {
            SpanStatus::Ok
        } else {
            SpanStatus::InternalError
        };
        self.hub.finish(&span, status);
        Ok(())
    }
}
