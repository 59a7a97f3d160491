//! 跨度配置器

use crate::marker::Transaction;
use bean_abstractions::JoinPoint;
use std::collections::BTreeMap;

/// 跨度选项，由配置器在跨度开始前调整
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanOptions {
    /// 描述
    pub description: Option<String>,
    /// 标签
    pub tags: BTreeMap<String, String>,
}

impl SpanOptions {
    /// 设置标签
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }
}

/// 跨度配置器
///
/// 每个配置器类型只实例化一次并被缓存，所以实现不应保存单次调用的状态。
pub trait Configurator: Send + Sync + 'static {
    /// 在跨度开始前调整选项
    fn configure(&self, marker: &Transaction, options: &mut SpanOptions, point: &JoinPoint<'_>);
}

/// 不做任何调整的默认配置器
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopConfigurator;

impl Configurator for NoopConfigurator {
    fn configure(&self, _marker: &Transaction, _options: &mut SpanOptions, _point: &JoinPoint<'_>) {}
}
