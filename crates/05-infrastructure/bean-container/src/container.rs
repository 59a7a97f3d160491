//! Bean 容器
//!
//! [`Container::scan`] 是唯一会修改注册表结构的入口：查询扫描器、构建描述符、评分排序、
//! 按顺序实例化并注册，最后执行扩展管线。扫描结束后的查找都只读注册表。

use crate::catalog::GlobalCatalog;
use crate::descriptor::BeanDescriptor;
use crate::extension::Extension;
use crate::extensions::{AopExtension, InjectBeanExtension, SelfInjectionExtension, TypedCollectionExtension};
use crate::interceptor::{MarkerCache, MarkerTable};
use crate::registry::BeanRegistry;
use crate::score::ScoreEvaluator;
use bean_abstractions::{
    Args, BeanInstance, BeanKey, BeanResolver, BeanType, ClassDef, MethodWrapper, ScanOracle, Scope,
    ViewHandle,
};
use bean_common::{BeanError, BeanResult, ContainerOptions, TypeInfo, TypeKind};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// 一次扫描的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// 扫描作用域
    pub scope: Scope,
    /// 扫描到的 Bean 类个数
    pub class_count: usize,
    /// 扫描到的工厂方法个数
    pub factory_count: usize,
    /// 本次注册的 Bean（按注册顺序）
    pub registered: Vec<String>,
    /// 扫描结束后注册表中的 Bean 总数
    pub bean_count: usize,
}

/// 容器句柄
///
/// 只持有注册表的弱引用，可以作为 Bean 注入到其他 Bean 中执行运行期查找。
#[derive(Clone)]
pub struct ContainerHandle {
    registry: Weak<BeanRegistry>,
}

impl ContainerHandle {
    fn upgrade(&self, declared: TypeInfo) -> BeanResult<Arc<BeanRegistry>> {
        self.registry.upgrade().ok_or_else(|| BeanError::ContainerDropped {
            type_name: declared.short_name(),
        })
    }

    /// 按类型查找
    pub fn inject<X: ?Sized + Send + Sync + 'static>(&self) -> BeanResult<Arc<X>> {
        self.resolve(&BeanKey::of::<X>())?.view_as::<X>()
    }

    /// 按名称查找
    pub fn inject_named<X: ?Sized + Send + Sync + 'static>(&self, name: &str) -> BeanResult<Arc<X>> {
        self.resolve(&BeanKey::named::<X>(name))?.view_as::<X>()
    }

    /// 容器是否仍然存在
    pub fn is_alive(&self) -> bool {
        self.registry.strong_count() > 0
    }
}

impl BeanResolver for ContainerHandle {
    fn resolve(&self, key: &BeanKey) -> BeanResult<BeanInstance> {
        self.upgrade(key.declared())?.resolve(key)
    }

    fn resolve_all(&self, declared: TypeInfo) -> Vec<BeanInstance> {
        self.registry
            .upgrade()
            .map(|registry| registry.assignable(declared))
            .unwrap_or_default()
    }

    fn can_resolve(&self, key: &BeanKey) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.can_resolve(key))
    }
}

impl fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Bean 容器
pub struct Container {
    options: ContainerOptions,
    registry: Arc<BeanRegistry>,
    oracle: Arc<dyn ScanOracle>,
    extensions: Vec<Arc<dyn Extension>>,
    aop: Arc<AopExtension>,
    markers: MarkerCache,
    hosts: HashMap<TypeId, ViewHandle>,
}

impl Container {
    /// 使用默认配置与全局目录创建容器
    pub fn new() -> BeanResult<Self> {
        Self::builder().build()
    }

    /// 创建容器构建器
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    fn with_parts(options: ContainerOptions, oracle: Arc<dyn ScanOracle>) -> BeanResult<Self> {
        options.validate()?;

        let aop = Arc::new(AopExtension::new(options.aop_priority));
        let mut container = Self {
            registry: Arc::new(BeanRegistry::new()),
            oracle,
            extensions: Vec::new(),
            aop: Arc::clone(&aop),
            markers: MarkerCache::default(),
            hosts: HashMap::new(),
            options,
        };

        container.add_extension(Arc::new(TypedCollectionExtension::new(
            container.options.typed_collection_priority,
        )))?;
        container.add_extension(Arc::new(InjectBeanExtension::new(
            container.options.inject_bean_priority,
        )))?;
        container.add_extension(Arc::new(SelfInjectionExtension::new(
            container.options.self_injection_priority,
        )))?;
        container.add_extension(aop)?;

        if container.options.register_itself_as_bean {
            debug!("将容器句柄注册为 Bean");
            let bean_type = BeanType::of::<ContainerHandle>()
                .implements(|handle: Arc<ContainerHandle>| handle as Arc<dyn BeanResolver>);
            let instance = bean_type.instantiate(Arc::new(Arc::new(container.handle())));
            container
                .registry
                .register(BeanKey::of::<ContainerHandle>(), bean_type, None, instance)?;
        }

        info!(
            "容器创建完成, 扫描器: {}, 扩展: [{}]",
            container.oracle.name(),
            container.extension_names().join(", ")
        );
        Ok(container)
    }

    /// 容器配置
    pub const fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// 注册表
    pub const fn registry(&self) -> &Arc<BeanRegistry> {
        &self.registry
    }

    /// 容器句柄
    pub fn handle(&self) -> ContainerHandle {
        ContainerHandle {
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// 指向注册表的弱引用解析器，供延迟访问器使用
    pub fn resolver(&self) -> Weak<dyn BeanResolver> {
        let registry: Weak<BeanRegistry> = Arc::downgrade(&self.registry);
        registry
    }

    /// 添加扩展，同一类型的扩展只能添加一次
    pub fn add_extension(&mut self, extension: Arc<dyn Extension>) -> BeanResult<()> {
        let extension_type = extension.extension_type();
        if self
            .extensions
            .iter()
            .any(|existing| existing.extension_type() == extension_type)
        {
            return Err(BeanError::DuplicateExtension {
                extension: extension.name(),
            });
        }

        debug!("添加扩展 {}, 优先级: {}", extension.name(), extension.priority());
        self.extensions.push(extension);
        self.extensions.sort_by_key(|extension| extension.priority());
        Ok(())
    }

    /// 按优先级排列的扩展名称
    pub fn extension_names(&self) -> Vec<String> {
        self.extensions.iter().map(|extension| extension.name()).collect()
    }

    /// 拦截扩展
    pub const fn aop(&self) -> &Arc<AopExtension> {
        &self.aop
    }

    /// 添加方法包装器
    pub fn add_method_wrapper<W: MethodWrapper>(&self, wrapper: W) {
        self.aop.add_wrapper(wrapper);
    }

    /// 扫描配置的默认作用域（未配置时扫描全部）
    pub fn scan_default(&mut self) -> BeanResult<ScanReport> {
        let scope = self
            .options
            .default_scope
            .as_deref()
            .map(Scope::new)
            .unwrap_or_default();
        self.scan(&scope)
    }

    /// 扫描作用域并注册其中声明的全部 Bean
    pub fn scan(&mut self, scope: &Scope) -> BeanResult<ScanReport> {
        info!("开始扫描作用域 '{}', 扫描器: {}", scope, self.oracle.name());
        let classes = self.oracle.classes(scope);
        let methods = self.oracle.factory_methods(scope);

        for class in &classes {
            self.registry.remember_class(class);
        }
        for method in &methods {
            self.registry.remember_class(method.host());
        }

        let mut descriptors = Vec::with_capacity(classes.len() + methods.len());
        let mut seen_classes = HashSet::new();
        for class in classes.into_iter().filter(|class| class.is_bean()) {
            if seen_classes.insert(class.type_info().id()) {
                descriptors.push(BeanDescriptor::for_class(class));
            }
        }
        let class_count = descriptors.len();

        let mut seen_methods = HashSet::new();
        for method in methods {
            if seen_methods.insert((method.host().type_info().id(), method.name())) {
                descriptors.push(BeanDescriptor::for_method(method));
            }
        }
        let factory_count = descriptors.len() - class_count;
        info!("扫描到 {} 个 Bean 类, {} 个工厂方法", class_count, factory_count);

        for descriptor in descriptors.iter().filter(|descriptor| !descriptor.is_factory()) {
            descriptor.class().check_constructor_count()?;
        }

        debug!("计算 Bean 评分并排序");
        let scores = ScoreEvaluator::new(&descriptors)
            .with_registry(&self.registry)
            .score_all()?;
        for (descriptor, score) in descriptors.iter_mut().zip(scores) {
            descriptor.set_score(score);
        }
        descriptors.sort_by_key(|descriptor| descriptor.score().unwrap_or_default());

        let mut registered = Vec::with_capacity(descriptors.len());
        for descriptor in &mut descriptors {
            debug!(
                "注册 Bean {} (评分: {})",
                descriptor,
                descriptor.score().unwrap_or_default()
            );
            if descriptor.is_factory() {
                self.register_factory_bean(descriptor)?;
            } else {
                self.register_class_bean(descriptor)?;
            }
            registered.push(descriptor.key().to_string());
        }

        debug!("执行扩展");
        for extension in self.extensions.clone() {
            debug!("执行扩展 {}, 优先级: {}", extension.name(), extension.priority());
            extension.process_beans(self)?;
        }

        for descriptor in &mut descriptors {
            descriptor.clear_constructor_args();
        }

        let bean_count = self.registry.len();
        info!("作用域 '{}' 扫描完成, 单例 Bean 个数: {}", scope, bean_count);
        Ok(ScanReport {
            scope: scope.clone(),
            class_count,
            factory_count,
            registered,
            bean_count,
        })
    }

    fn register_factory_bean(&mut self, descriptor: &BeanDescriptor) -> BeanResult<()> {
        let Some(method) = descriptor.method() else {
            return Err(BeanError::config(format!("{descriptor} 不是工厂 Bean")));
        };
        let product = method.product();
        if matches!(product.info().kind(), TypeKind::Unit | TypeKind::Primitive) {
            return Err(BeanError::InvalidFactoryReturn {
                method: method.qualified_name(),
                return_type: product.info().short_name(),
            });
        }

        let key = descriptor.key();
        if let Some(existing) = self.registry.find(key, true) {
            return Err(BeanError::DuplicateBean {
                type_name: product.info().short_name(),
                name: key.name().unwrap_or_default().to_string(),
                existing: existing.key().to_string(),
            });
        }

        let host = self.factory_host(method.host())?;
        let handle = method
            .invoke(&host)?
            .ok_or_else(|| BeanError::NullProduct {
                method: method.qualified_name(),
            })?;

        let instance = product.instantiate(handle);
        let class = self.registry.class(product.info().id());
        self.registry
            .register(key.clone(), product.clone(), class, instance)
    }

    /// 工厂方法的宿主实例：已注册的 Bean，否则用已注册的 Bean 作为实参新建（每个类只建一次）
    fn factory_host(&mut self, host: &Arc<ClassDef>) -> BeanResult<ViewHandle> {
        let info = host.type_info();
        if let Some(handle) = self.hosts.get(&info.id()) {
            return Ok(Arc::clone(handle));
        }

        let instance = match self.registry.find(&BeanKey::unnamed(info), false) {
            Some(bean) => self.registry.original_or_registered(&bean),
            None => {
                debug!("为工厂方法新建宿主实例 {}", info);
                self.registry.construct(host)?
            }
        };
        let handle = instance
            .concrete_handle()
            .cloned()
            .ok_or_else(|| BeanError::TypeMismatch {
                expected: info.short_name(),
                actual: instance.concrete_type().short_name(),
            })?;
        self.hosts.insert(info.id(), Arc::clone(&handle));
        Ok(handle)
    }

    fn register_class_bean(&mut self, descriptor: &mut BeanDescriptor) -> BeanResult<()> {
        let class = Arc::clone(descriptor.class());
        let owner = class.type_info();
        let constructor = class.single_constructor()?;
        let values = constructor
            .params()
            .iter()
            .map(|param| self.registry.resolve_argument(param, owner))
            .collect::<BeanResult<Vec<_>>>()?;
        descriptor.set_constructor_args(values.clone());

        let mut args = Args::new(owner, values);
        let handle = constructor
            .invoke(&mut args)
            .map_err(|e| BeanError::instantiation(owner.short_name(), e))?;
        let mut instance = class.bean_type().instantiate(handle);

        let extensions = self.extensions.clone();
        for extension in extensions {
            instance = extension
                .process_created(instance, descriptor, self)?
                .ok_or_else(|| BeanError::ExtensionDroppedInstance {
                    extension: extension.name(),
                    type_name: owner.short_name(),
                })?;
        }

        self.registry.register(
            descriptor.key().clone(),
            class.bean_type().clone(),
            Some(class),
            instance,
        )
    }

    /// 按标识查找；未注册但类定义已知时，用已注册的 Bean 作为实参新建一个实例
    pub fn inject_key(&self, key: &BeanKey) -> BeanResult<BeanInstance> {
        self.registry.resolve(key)
    }

    /// 按类型查找
    pub fn inject<X: ?Sized + Send + Sync + 'static>(&self) -> BeanResult<Arc<X>> {
        self.inject_key(&BeanKey::of::<X>())?.view_as::<X>()
    }

    /// 按名称查找
    pub fn inject_named<X: ?Sized + Send + Sync + 'static>(&self, name: &str) -> BeanResult<Arc<X>> {
        self.inject_key(&BeanKey::named::<X>(name))?.view_as::<X>()
    }

    /// 所有可以当作 `X` 使用的 Bean（按注册顺序）
    pub fn inject_all<X: ?Sized + Send + Sync + 'static>(&self) -> BeanResult<Vec<Arc<X>>> {
        self.registry
            .assignable(TypeInfo::of::<X>())
            .iter()
            .map(BeanInstance::view_as::<X>)
            .collect()
    }

    /// 被代理 Bean 的原始实例；没有被代理时与 [`inject`](Self::inject) 相同
    pub fn original<X: ?Sized + Send + Sync + 'static>(&self, name: Option<&str>) -> BeanResult<Arc<X>> {
        let key = BeanKey::new(TypeInfo::of::<X>(), name.map(str::to_string));
        let bean = self
            .registry
            .find(&key, true)
            .ok_or_else(|| BeanError::missing_bean(key.declared().short_name(), key.name()))?;
        self.registry.original_or_registered(&bean).view_as::<X>()
    }

    /// 是否已注册：指定名称时要求名称相同，否则任意名称的兼容 Bean 都算
    pub fn is_registered<X: ?Sized + 'static>(&self, name: Option<&str>) -> bool {
        self.registry
            .contains(&BeanKey::new(TypeInfo::of::<X>(), name.map(str::to_string)))
    }

    /// 已注册的 Bean 个数
    pub fn bean_count(&self) -> usize {
        self.registry.len()
    }

    /// 直接注册一个已创建的实例
    pub fn register_bean(&self, key: BeanKey, bean_type: BeanType, instance: BeanInstance) -> BeanResult<()> {
        let class = self.registry.class(bean_type.info().id());
        self.registry.register(key, bean_type, class, instance)
    }

    pub(crate) fn marker_table(&mut self, class: &ClassDef) -> Arc<MarkerTable> {
        self.markers.table(class)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("options", &self.options)
            .field("oracle", &self.oracle.name())
            .field("extensions", &self.extension_names())
            .field("registry", &self.registry)
            .finish()
    }
}

/// 容器构建器
pub struct ContainerBuilder {
    options: ContainerOptions,
    oracle: Arc<dyn ScanOracle>,
    extensions: Vec<Arc<dyn Extension>>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self {
            options: ContainerOptions::default(),
            oracle: Arc::new(GlobalCatalog),
            extensions: Vec::new(),
        }
    }
}

impl ContainerBuilder {
    /// 设置容器配置
    #[must_use]
    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// 设置扫描器
    #[must_use]
    pub fn oracle(mut self, oracle: impl ScanOracle + 'static) -> Self {
        self.oracle = Arc::new(oracle);
        self
    }

    /// 追加扩展
    #[must_use]
    pub fn extension(mut self, extension: impl Extension) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    /// 构建容器
    pub fn build(self) -> BeanResult<Container> {
        let mut container = Container::with_parts(self.options, self.oracle)?;
        for extension in self.extensions {
            container.add_extension(extension)?;
        }
        Ok(container)
    }
}
