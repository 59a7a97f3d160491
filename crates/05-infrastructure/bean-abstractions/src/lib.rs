//! # Bean Abstractions
//!
//! Bean 容器的抽象层，定义容器与使用方之间的全部契约。
//!
//! ## 核心组件
//!
//! - [`ClassDef`] / [`FactoryMethod`] - 代替反射的类与工厂方法声明
//! - [`BeanKey`] - 名称 + 声明类型的查找标识
//! - [`BeanInstance`] - 具体对象及其 trait 视图
//! - [`Inject`] / [`SelfRef`] / [`TypedCollection`] / [`BeanAccessor`] - 构造后注入的字段槽
//! - [`ScanOracle`] - 扫描器
//! - [`BeanResolver`] - 扫描完成后的查找入口
//! - [`MethodWrapper`] / [`InvocationHandler`] - 方法拦截契约
//!
//! ## 设计原则
//!
//! - 类型信息全部显式声明，不依赖运行时反射
//! - 拦截通过实现同一 trait 的装饰器完成

pub mod definition;
pub mod factory;
pub mod injection;
pub mod instance;
pub mod interception;
pub mod key;
pub mod resolver;
pub mod scanner;

pub use definition::*;
pub use factory::*;
pub use injection::*;
pub use instance::*;
pub use interception::*;
pub use key::*;
pub use resolver::*;
pub use scanner::*;

pub use bean_common::{BeanError, BeanResult, TypeInfo, TypeKind};
