//! # Bean Common
//!
//! Bean 容器各 crate 共享的基础类型。
//!
//! ## 核心组件
//!
//! - [`TypeInfo`] / [`TypeKind`] - 替代运行时反射的类型元数据
//! - [`BeanError`] - 统一的错误体系
//! - [`ContainerOptions`] - 容器配置（内置扩展优先级、自注册开关）
//! - [`LoggingConfig`] - 基于 `tracing-subscriber` 的日志初始化
//!
//! ## 设计原则
//!
//! - 所有错误同步抛出，不做静默降级
//! - 配置可从 TOML / JSON 加载，缺省项使用默认值

pub mod configuration;
pub mod errors;
pub mod logging;
pub mod metadata;

pub use configuration::*;
pub use errors::*;
pub use logging::*;
pub use metadata::*;
