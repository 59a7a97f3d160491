//! Bean 标识

use crate::definition::BeanType;
use bean_common::TypeInfo;
use std::fmt;

/// Bean 查找标识：可选名称 + 声明类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BeanKey {
    name: Option<String>,
    declared: TypeInfo,
}

impl BeanKey {
    /// 创建标识，空字符串名称视为未命名
    pub fn new(declared: TypeInfo, name: Option<String>) -> Self {
        Self {
            name: name.filter(|name| !name.is_empty()),
            declared,
        }
    }

    /// 未命名标识
    pub fn unnamed(declared: TypeInfo) -> Self {
        Self::new(declared, None)
    }

    /// 指定类型的未命名标识
    pub fn of<X: ?Sized + 'static>() -> Self {
        Self::unnamed(TypeInfo::of::<X>())
    }

    /// 指定类型和名称的标识
    pub fn named<X: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(TypeInfo::of::<X>(), Some(name.into()))
    }

    /// 名称
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 是否命名
    pub const fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// 声明类型
    pub const fn declared(&self) -> TypeInfo {
        self.declared
    }

    /// 判断候选 Bean 是否满足本标识
    ///
    /// - 精确模式：名称必须相同（都未命名也算相同）
    /// - 宽松模式：任一方未命名，或名称相同
    ///
    /// 类型方面，候选类型等于声明类型，或可以被当作声明类型使用。
    pub fn matches(&self, candidate_name: Option<&str>, candidate: &BeanType, exact: bool) -> bool {
        let names_match = if exact {
            self.name() == candidate_name
        } else {
            self.name.is_none() || candidate_name.is_none() || self.name() == candidate_name
        };

        names_match && candidate.is_assignable_to(self.declared.id())
    }
}

impl fmt::Display for BeanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} '{}'", self.declared, name),
            None => write!(f, "{}", self.declared),
        }
    }
}
