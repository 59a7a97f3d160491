//! 容器配置
//!
//! 内置扩展的优先级以及容器自注册开关，支持从 TOML / JSON 文本或文件加载。

use crate::errors::{BeanError, BeanResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// 类型化集合注入扩展的默认优先级
pub const DEFAULT_TYPED_COLLECTION_PRIORITY: i32 = 1000;
/// 单 Bean 字段注入扩展的默认优先级
pub const DEFAULT_INJECT_BEAN_PRIORITY: i32 = 500;
/// 自引用注入扩展的默认优先级
pub const DEFAULT_SELF_INJECTION_PRIORITY: i32 = 600;
/// 拦截扩展的默认优先级
pub const DEFAULT_AOP_PRIORITY: i32 = 1;

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// 类型化集合注入扩展优先级（越小越先执行）
    pub typed_collection_priority: i32,
    /// 单 Bean 字段注入扩展优先级
    pub inject_bean_priority: i32,
    /// 自引用注入扩展优先级
    pub self_injection_priority: i32,
    /// 拦截扩展优先级
    pub aop_priority: i32,
    /// 是否把容器自身注册为 Bean
    pub register_itself_as_bean: bool,
    /// 未指定作用域时使用的默认扫描作用域
    pub default_scope: Option<String>,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerOptions {
    /// 创建默认配置
    pub const fn new() -> Self {
        Self {
            typed_collection_priority: DEFAULT_TYPED_COLLECTION_PRIORITY,
            inject_bean_priority: DEFAULT_INJECT_BEAN_PRIORITY,
            self_injection_priority: DEFAULT_SELF_INJECTION_PRIORITY,
            aop_priority: DEFAULT_AOP_PRIORITY,
            register_itself_as_bean: true,
            default_scope: None,
        }
    }

    /// 设置类型化集合注入优先级
    #[must_use]
    pub fn with_typed_collection_priority(mut self, priority: i32) -> Self {
        self.typed_collection_priority = priority;
        self
    }

    /// 设置单 Bean 字段注入优先级
    #[must_use]
    pub fn with_inject_bean_priority(mut self, priority: i32) -> Self {
        self.inject_bean_priority = priority;
        self
    }

    /// 设置自引用注入优先级
    #[must_use]
    pub fn with_self_injection_priority(mut self, priority: i32) -> Self {
        self.self_injection_priority = priority;
        self
    }

    /// 设置拦截扩展优先级
    #[must_use]
    pub fn with_aop_priority(mut self, priority: i32) -> Self {
        self.aop_priority = priority;
        self
    }

    /// 设置是否自注册
    #[must_use]
    pub fn with_register_itself_as_bean(mut self, enabled: bool) -> Self {
        self.register_itself_as_bean = enabled;
        self
    }

    /// 设置默认扫描作用域
    #[must_use]
    pub fn with_default_scope(mut self, scope: impl Into<String>) -> Self {
        self.default_scope = Some(scope.into());
        self
    }

    /// 从 TOML 文本加载
    pub fn from_toml_str(content: &str) -> BeanResult<Self> {
        let options: Self = toml::from_str(content).map_err(|e| BeanError::ConfigParse {
            message: format!("TOML: {e}"),
        })?;
        options.validate()?;
        Ok(options)
    }

    /// 从 JSON 文本加载
    pub fn from_json_str(content: &str) -> BeanResult<Self> {
        let options: Self = serde_json::from_str(content).map_err(|e| BeanError::ConfigParse {
            message: format!("JSON: {e}"),
        })?;
        options.validate()?;
        Ok(options)
    }

    /// 从文件加载，按扩展名选择格式
    pub fn from_file<P: AsRef<Path>>(path: P) -> BeanResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| BeanError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;

        debug!("加载容器配置文件: {}", path.display());
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(BeanError::ConfigParse {
                message: format!("不支持的配置文件格式: {}", other.unwrap_or("<无扩展名>")),
            }),
        }
    }

    /// 验证配置
    ///
    /// 内置扩展的优先级必须互不相同，否则它们的执行顺序取决于添加顺序。
    pub fn validate(&self) -> BeanResult<()> {
        if let Some(scope) = &self.default_scope {
            if scope.trim().is_empty() {
                return Err(BeanError::config("default_scope 不能为空字符串"));
            }
        }

        let priorities = [
            ("typed_collection_priority", self.typed_collection_priority),
            ("inject_bean_priority", self.inject_bean_priority),
            ("self_injection_priority", self.self_injection_priority),
            ("aop_priority", self.aop_priority),
        ];
        for (index, (name, priority)) in priorities.iter().enumerate() {
            if let Some((other, _)) = priorities[..index].iter().find(|(_, p)| p == priority) {
                return Err(BeanError::config(format!(
                    "内置扩展优先级重复: {other} 与 {name} 都为 {priority}"
                )));
            }
        }
        Ok(())
    }
}
