//! Bean 描述符

use bean_abstractions::{Argument, BeanKey, BeanType, ClassDef, FactoryMethod};
use std::fmt;
use std::sync::Arc;

/// 一次扫描中的 Bean 描述符
///
/// 带工厂方法的是工厂 Bean（方法返回值即产物），否则是类 Bean（通过唯一构造函数实例化）。
/// 评分与构造实参只在扫描期间有效。
#[derive(Debug, Clone)]
pub struct BeanDescriptor {
    key: BeanKey,
    class: Arc<ClassDef>,
    method: Option<Arc<FactoryMethod>>,
    score: Option<u64>,
    constructor_args: Vec<Argument>,
}

impl BeanDescriptor {
    /// 类 Bean
    pub fn for_class(class: Arc<ClassDef>) -> Self {
        Self {
            key: class.key(),
            class,
            method: None,
            score: None,
            constructor_args: Vec::new(),
        }
    }

    /// 工厂 Bean
    pub fn for_method(method: Arc<FactoryMethod>) -> Self {
        Self {
            key: method.key(),
            class: Arc::clone(method.host()),
            method: Some(method),
            score: None,
            constructor_args: Vec::new(),
        }
    }

    /// 查找标识
    pub const fn key(&self) -> &BeanKey {
        &self.key
    }

    /// 类 Bean 的类，或工厂 Bean 的宿主类
    pub const fn class(&self) -> &Arc<ClassDef> {
        &self.class
    }

    /// 工厂方法
    pub const fn method(&self) -> Option<&Arc<FactoryMethod>> {
        self.method.as_ref()
    }

    /// 是否为工厂 Bean
    pub const fn is_factory(&self) -> bool {
        self.method.is_some()
    }

    /// 产物类型
    pub fn product(&self) -> &BeanType {
        match &self.method {
            Some(method) => method.product(),
            None => self.class.bean_type(),
        }
    }

    /// 评分（未计算时为 `None`）
    pub const fn score(&self) -> Option<u64> {
        self.score
    }

    pub(crate) fn set_score(&mut self, score: u64) {
        self.score = Some(score);
    }

    /// 实例化时使用的构造实参
    pub fn constructor_args(&self) -> &[Argument] {
        &self.constructor_args
    }

    pub(crate) fn set_constructor_args(&mut self, args: Vec<Argument>) {
        self.constructor_args = args;
    }

    pub(crate) fn clear_constructor_args(&mut self) {
        self.constructor_args.clear();
    }
}

impl fmt::Display for BeanDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{} <- {}", self.key, method.qualified_name()),
            None => write!(f, "{}", self.key),
        }
    }
}
