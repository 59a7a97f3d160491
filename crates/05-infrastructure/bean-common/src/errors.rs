//! 错误类型定义

use thiserror::Error;

/// 容器错误类型
///
/// 所有错误都是同步且致命的：配置错误在扫描或注入时立即抛出，不做重试，也不会降级为默认值。
#[derive(Error, Debug)]
pub enum BeanError {
    #[error("类 {type_name} 必须恰好声明一个构造函数, 实际声明了 {count} 个")]
    MultipleConstructors { type_name: String, count: usize },

    #[error("类 {type_name} 没有声明构造函数")]
    MissingConstructor { type_name: String },

    #[error("工厂方法 {method} 的返回类型 {return_type} 无效: 不能是单元类型或基本类型")]
    InvalidFactoryReturn { method: String, return_type: String },

    #[error("工厂方法 {method} 没有返回实例")]
    NullProduct { method: String },

    #[error("未找到 Bean: {type_name}, 名称: '{name}'")]
    MissingBean { type_name: String, name: String },

    #[error("未找到 {required_by} 所需的 Bean: {type_name}, 名称: '{name}'")]
    MissingDependency {
        type_name: String,
        name: String,
        required_by: String,
    },

    #[error("Bean 重复注册: {type_name}, 名称: '{name}', 已存在: {existing}")]
    DuplicateBean {
        type_name: String,
        name: String,
        existing: String,
    },

    #[error("类型化集合不能嵌套: {owner}.{field}")]
    NestedTypedCollection { owner: String, field: String },

    #[error("类型化集合没有声明元素类型: {owner}.{field}")]
    UntypedCollection { owner: String, field: String },

    #[error("扩展 {extension} 在处理 {type_name} 时丢弃了实例")]
    ExtensionDroppedInstance { extension: String, type_name: String },

    #[error("扩展已注册: {extension}")]
    DuplicateExtension { extension: String },

    #[error("计算 Bean 评分时检测到循环依赖: {chain}")]
    CircularDependency { chain: String },

    #[error("实例化 {type_name} 失败: {source}")]
    Instantiation {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Bug! 注册表中的实例无法转换为 {expected}, 实际类型: {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Bean 提供者尚未设置: {type_name}, 名称: '{name}'")]
    AccessorNotBound { type_name: String, name: String },

    #[error("BeanAccessor 字段未初始化: {owner}.{field}")]
    AccessorFieldUnset { owner: String, field: String },

    #[error("字段尚未注入: {type_name}")]
    NotInjected { type_name: String },

    #[error("自引用字段 {owner}.{field} 的类型 {expected} 与 Bean 自身不兼容")]
    SelfReferenceMismatch {
        owner: String,
        field: String,
        expected: String,
    },

    #[error("类 {type_name} 声明了拦截标记, 但没有提供任何代理工厂")]
    NotInterceptable { type_name: String },

    #[error("拦截标记类型不匹配: 期望 {expected}, 实际 {actual}")]
    MarkerMismatch { expected: String, actual: String },

    #[error("实例化配置器 {configurator} 失败 (缺少无参构造?): {source}")]
    ConfiguratorInstantiation {
        configurator: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("容器已释放, 无法解析: {type_name}")]
    ContainerDropped { type_name: String },

    #[error("配置文件读取失败: {path}, 原因: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("配置解析失败: {message}")]
    ConfigParse { message: String },

    #[error("配置错误: {message}")]
    Config { message: String },
}

impl BeanError {
    /// 创建未找到 Bean 错误
    pub fn missing_bean(type_name: impl Into<String>, name: Option<&str>) -> Self {
        Self::MissingBean {
            type_name: type_name.into(),
            name: name.unwrap_or_default().to_string(),
        }
    }

    /// 创建缺少依赖错误
    pub fn missing_dependency(
        type_name: impl Into<String>,
        name: Option<&str>,
        required_by: impl Into<String>,
    ) -> Self {
        Self::MissingDependency {
            type_name: type_name.into(),
            name: name.unwrap_or_default().to_string(),
            required_by: required_by.into(),
        }
    }

    /// 创建实例化错误
    pub fn instantiation(type_name: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Instantiation {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 是否为图结构错误（循环依赖）
    pub const fn is_graph_error(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }

    /// 是否为运行期查找错误
    pub const fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::MissingBean { .. }
                | Self::AccessorNotBound { .. }
                | Self::NotInjected { .. }
                | Self::ContainerDropped { .. }
        )
    }
}

/// 结果类型别名
pub type BeanResult<T> = Result<T, BeanError>;
