//! # Bean 容器实现
//!
//! 把扫描到的类与工厂方法组织成对象图：评分排序、按依赖顺序实例化、按名称与多态类型解析，
//! 并通过扩展管线完成字段注入与方法拦截。
//!
//! ## 核心组件
//!
//! - [`Container`] - 扫描、注册与查找入口
//! - [`ScoreEvaluator`] - 决定实例化顺序的评分与循环检测
//! - [`BeanRegistry`] - 单例与原始实例的存储
//! - [`Extension`] - 扩展管线，内置类型化集合、字段、自引用注入与代理生成
//! - [`BeanCatalog`] / [`GlobalCatalog`] - 显式声明表
//!
//! ## 使用示例
//!
//! ```rust
//! use bean_container::{BeanCatalog, ClassDef, Container, Scope};
//!
//! #[derive(Default)]
//! struct Clock;
//!
//! let catalog = BeanCatalog::new("app")
//!     .with("app::time", ClassDef::builder::<Clock>().bean().default_constructor().build());
//! let mut container = Container::builder().oracle(catalog).build()?;
//! container.scan(&Scope::new("app"))?;
//! let _clock = container.inject::<Clock>()?;
//! # Ok::<(), bean_container::BeanError>(())
//! ```

pub mod catalog;
pub mod container;
pub mod descriptor;
pub mod extension;
pub mod extensions;
pub mod interceptor;
pub mod registry;
pub mod score;

pub use catalog::*;
pub use container::*;
pub use descriptor::*;
pub use extension::*;
pub use extensions::*;
pub use interceptor::*;
pub use registry::*;
pub use score::*;

pub use bean_abstractions::*;
pub use bean_common::{BeanError, BeanResult, ContainerOptions, LoggingConfig, TypeInfo, TypeKind};
