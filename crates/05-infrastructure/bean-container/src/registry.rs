//! Bean 注册表
//!
//! 保存单例 Bean、被代理 Bean 的原始实例，以及扫描到的全部类定义。注册表通过 `Arc` 共享，
//! 延迟访问器和容器句柄只持有它的弱引用。

use bean_abstractions::{
    Argument, Args, BeanInstance, BeanKey, BeanResolver, BeanType, ClassDef, ParamKind, Parameter,
};
use bean_common::{BeanError, BeanResult, TypeInfo};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 已注册的 Bean
#[derive(Clone)]
pub struct RegisteredBean {
    key: BeanKey,
    bean_type: BeanType,
    class: Option<Arc<ClassDef>>,
    instance: BeanInstance,
}

impl RegisteredBean {
    /// 查找标识
    pub const fn key(&self) -> &BeanKey {
        &self.key
    }

    /// 可生产类型
    pub const fn bean_type(&self) -> &BeanType {
        &self.bean_type
    }

    /// 描述实例字段的类定义；工厂产物的类型没有被扫描到时为 `None`
    pub fn class(&self) -> Option<&Arc<ClassDef>> {
        self.class.as_ref()
    }

    /// 最终注册的实例（可能带有代理视图）
    pub const fn instance(&self) -> &BeanInstance {
        &self.instance
    }
}

impl fmt::Debug for RegisteredBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredBean")
            .field("key", &self.key.to_string())
            .field("instance", &self.instance)
            .finish()
    }
}

/// Bean 注册表
#[derive(Default)]
pub struct BeanRegistry {
    beans: RwLock<Vec<RegisteredBean>>,
    originals: RwLock<HashMap<BeanKey, BeanInstance>>,
    classes: RwLock<HashMap<TypeId, Arc<ClassDef>>>,
}

impl BeanRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 Bean
    ///
    /// 已存在与 `key` 精确匹配的 Bean 时返回重复注册错误。
    pub fn register(
        &self,
        key: BeanKey,
        bean_type: BeanType,
        class: Option<Arc<ClassDef>>,
        instance: BeanInstance,
    ) -> BeanResult<()> {
        let mut beans = self.beans.write();
        if let Some(existing) = beans
            .iter()
            .find(|bean| key.matches(bean.key.name(), &bean.bean_type, true))
        {
            return Err(BeanError::DuplicateBean {
                type_name: instance.concrete_type().short_name(),
                name: key.name().unwrap_or_default().to_string(),
                existing: existing.key.to_string(),
            });
        }

        debug!("注册 Bean '{}', 类型: {}", key, instance.concrete_type());
        beans.push(RegisteredBean {
            key,
            bean_type,
            class,
            instance,
        });
        Ok(())
    }

    /// 查找匹配的 Bean
    pub fn find(&self, key: &BeanKey, exact: bool) -> Option<RegisteredBean> {
        self.beans
            .read()
            .iter()
            .find(|bean| key.matches(bean.key.name(), &bean.bean_type, exact))
            .cloned()
    }

    /// 是否已注册：命名标识要求名称相同，未命名标识也接受命名 Bean
    pub fn contains(&self, key: &BeanKey) -> bool {
        self.find(key, key.has_name()).is_some()
    }

    /// 取出精确匹配的 Bean
    pub fn get(&self, key: &BeanKey) -> BeanResult<BeanInstance> {
        self.find(key, true)
            .map(|bean| bean.instance)
            .ok_or_else(|| BeanError::missing_bean(key.declared().short_name(), key.name()))
    }

    /// 所有可以当作指定类型使用的 Bean（按注册顺序）
    pub fn assignable(&self, declared: TypeInfo) -> Vec<BeanInstance> {
        self.beans
            .read()
            .iter()
            .filter(|bean| bean.bean_type.is_assignable_to(declared.id()))
            .map(|bean| bean.instance.clone())
            .collect()
    }

    /// 全部已注册的 Bean（按注册顺序）
    pub fn entries(&self) -> Vec<RegisteredBean> {
        self.beans.read().clone()
    }

    /// 已注册的 Bean 个数
    pub fn len(&self) -> usize {
        self.beans.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.beans.read().is_empty()
    }

    /// 记录被代理 Bean 的原始实例
    pub fn record_original(&self, key: BeanKey, original: BeanInstance) {
        self.originals.write().insert(key, original);
    }

    /// 被代理 Bean 的原始实例
    pub fn original(&self, key: &BeanKey) -> Option<BeanInstance> {
        self.originals.read().get(key).cloned()
    }

    /// 原始实例，没有被代理时为注册的实例
    pub fn original_or_registered(&self, bean: &RegisteredBean) -> BeanInstance {
        self.original(&bean.key)
            .unwrap_or_else(|| bean.instance.clone())
    }

    /// 记住类定义，同一类型只保留第一次出现的定义
    pub fn remember_class(&self, class: &Arc<ClassDef>) {
        self.classes
            .write()
            .entry(class.type_info().id())
            .or_insert_with(|| Arc::clone(class));
    }

    /// 按类型查找类定义
    pub fn class(&self, id: TypeId) -> Option<Arc<ClassDef>> {
        self.classes.read().get(&id).cloned()
    }

    /// 解析一个构造参数
    pub fn resolve_argument(&self, param: &Parameter, owner: TypeInfo) -> BeanResult<Argument> {
        match param.kind() {
            ParamKind::Collection(element) => Ok(Argument::Many(self.assignable(*element))),
            ParamKind::Single(declared) => {
                let key = param.key();
                let missing = || BeanError::missing_dependency(declared.short_name(), param.bean_name(), owner.short_name());
                if !self.contains(&key) {
                    return Err(missing());
                }
                self.find(&key, true)
                    .map(|bean| Argument::Single(bean.instance))
                    .ok_or_else(missing)
            }
        }
    }

    /// 用已注册的 Bean 作为实参，新建一个类实例（不注册）
    pub fn construct(&self, class: &ClassDef) -> BeanResult<BeanInstance> {
        let owner = class.type_info();
        let constructor = class.single_constructor()?;
        let values = constructor
            .params()
            .iter()
            .map(|param| self.resolve_argument(param, owner))
            .collect::<BeanResult<Vec<_>>>()?;

        debug!("新建 {} 实例, 参数个数: {}", owner, values.len());
        let mut args = Args::new(owner, values);
        let handle = constructor
            .invoke(&mut args)
            .map_err(|e| BeanError::instantiation(owner.short_name(), e))?;
        Ok(class.bean_type().instantiate(handle))
    }
}

impl BeanResolver for BeanRegistry {
    fn resolve(&self, key: &BeanKey) -> BeanResult<BeanInstance> {
        if self.contains(key) {
            return self.get(key);
        }

        match self.class(key.declared().id()) {
            Some(class) => self.construct(&class),
            None => Err(BeanError::missing_bean(key.declared().short_name(), key.name())),
        }
    }

    fn resolve_all(&self, declared: TypeInfo) -> Vec<BeanInstance> {
        self.assignable(declared)
    }

    fn can_resolve(&self, key: &BeanKey) -> bool {
        self.contains(key) || self.class(key.declared().id()).is_some()
    }
}

impl fmt::Debug for BeanRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanRegistry")
            .field("beans", &self.beans.read().len())
            .field("originals", &self.originals.read().len())
            .field("classes", &self.classes.read().len())
            .finish()
    }
}
