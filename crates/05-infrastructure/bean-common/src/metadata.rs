//! 元数据定义
//!
//! 在没有运行时反射的前提下，描述容器需要知道的类型信息

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 具体类型
    Concrete,
    /// trait 对象（抽象类型）
    Abstract,
    /// 基本类型（整数、浮点数、bool、char）
    Primitive,
    /// 单元类型 `()`
    Unit,
    /// 类型化集合
    TypedCollection,
}

/// 类型信息
///
/// 相等性与哈希只取决于 [`TypeId`]，名称仅用于日志与错误信息。
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        let name = std::any::type_name::<T>();
        let id = TypeId::of::<T>();
        let kind = if id == TypeId::of::<()>() {
            TypeKind::Unit
        } else if is_primitive(id) {
            TypeKind::Primitive
        } else if name.starts_with("dyn ") {
            TypeKind::Abstract
        } else {
            TypeKind::Concrete
        };

        Self { id, name, kind }
    }

    /// 覆盖类型种类
    #[must_use]
    pub fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// 类型ID
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称（包含模块路径）
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// 类型种类
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// 是否为 trait 对象
    pub fn is_abstract(&self) -> bool {
        self.kind == TypeKind::Abstract
    }

    /// 获取简短的类型名称（去掉每一段路径的模块前缀）
    pub fn short_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut segment = String::new();
        for ch in self.name.chars() {
            if ch.is_alphanumeric() || ch == '_' || ch == ':' {
                segment.push(ch);
            } else {
                out.push_str(last_segment(&segment));
                segment.clear();
                out.push(ch);
            }
        }
        out.push_str(last_segment(&segment));
        out
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

fn is_primitive(id: TypeId) -> bool {
    [
        TypeId::of::<bool>(),
        TypeId::of::<char>(),
        TypeId::of::<i8>(),
        TypeId::of::<i16>(),
        TypeId::of::<i32>(),
        TypeId::of::<i64>(),
        TypeId::of::<i128>(),
        TypeId::of::<isize>(),
        TypeId::of::<u8>(),
        TypeId::of::<u16>(),
        TypeId::of::<u32>(),
        TypeId::of::<u64>(),
        TypeId::of::<u128>(),
        TypeId::of::<usize>(),
        TypeId::of::<f32>(),
        TypeId::of::<f64>(),
    ]
    .contains(&id)
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}
