//! Bean 扫描器抽象接口
//!
//! 容器不做反射，扫描器只是一个“给定作用域，返回其中声明的类与工厂方法”的黑盒。

use crate::definition::ClassDef;
use crate::factory::FactoryMethod;
use std::fmt;
use std::sync::Arc;

/// 扫描作用域（模块路径前缀，空字符串表示全部）
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    namespace: String,
}

impl Scope {
    /// 创建作用域
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into().trim_end_matches("::").to_string(),
        }
    }

    /// 匹配全部声明的作用域
    pub fn all() -> Self {
        Self::default()
    }

    /// 命名空间
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// 是否包含指定命名空间（自身或其子模块）
    pub fn contains(&self, namespace: &str) -> bool {
        if self.namespace.is_empty() {
            return true;
        }
        namespace == self.namespace
            || namespace
                .strip_prefix(self.namespace.as_str())
                .is_some_and(|rest| rest.starts_with("::"))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str("<全部>")
        } else {
            f.write_str(&self.namespace)
        }
    }
}

impl From<&str> for Scope {
    fn from(namespace: &str) -> Self {
        Self::new(namespace)
    }
}

/// 扫描器
///
/// 返回顺序不影响最终结果，容器会按评分排序；同一声明重复返回只算一次。
pub trait ScanOracle: Send + Sync {
    /// 作用域内声明的类
    fn classes(&self, scope: &Scope) -> Vec<Arc<ClassDef>>;

    /// 作用域内声明的工厂方法
    fn factory_methods(&self, scope: &Scope) -> Vec<Arc<FactoryMethod>>;

    /// 扫描器名称
    fn name(&self) -> &str;
}
