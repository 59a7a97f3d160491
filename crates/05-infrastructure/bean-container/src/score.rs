//! Bean 评分
//!
//! 评分近似于“创建该 Bean 之前需要先解析多少个 Bean”。实例化严格按评分升序进行，
//! 引用尚未注册的 Bean 会立即失败而不是重试，所以抽象类型参数和非 Bean 参数会被加上
//! 一个很大的惩罚值，让具体的直接依赖排在前面。

use crate::descriptor::BeanDescriptor;
use crate::registry::BeanRegistry;
use bean_abstractions::{BeanKey, ClassDef, Parameter};
use bean_common::{BeanError, BeanResult, TypeInfo};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 抽象类型参数、非 Bean 参数的惩罚值
pub const BEAN_SCORE_PENALTY: u64 = 100_000;

/// 评分计算器
///
/// 每个实例只服务于一次扫描的描述符集合；循环检测链由每次顶层调用单独持有。
/// 关联注册表后，之前扫描中已知的 Bean 类同样按依赖递归评分。
pub struct ScoreEvaluator<'a> {
    descriptors: &'a [BeanDescriptor],
    registry: Option<&'a BeanRegistry>,
    class_scores: HashMap<TypeId, u64>,
    descriptor_scores: HashMap<usize, u64>,
}

impl<'a> ScoreEvaluator<'a> {
    /// 创建计算器
    pub fn new(descriptors: &'a [BeanDescriptor]) -> Self {
        Self {
            descriptors,
            registry: None,
            class_scores: HashMap::new(),
            descriptor_scores: HashMap::new(),
        }
    }

    /// 关联注册表，用于查找本次扫描之外的类定义
    #[must_use]
    pub fn with_registry(mut self, registry: &'a BeanRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 计算指定描述符的评分
    pub fn score(&mut self, index: usize) -> BeanResult<u64> {
        let mut chain = Vec::new();
        self.descriptor_score(index, &mut chain)
    }

    /// 计算全部描述符的评分（按描述符顺序）
    pub fn score_all(&mut self) -> BeanResult<Vec<u64>> {
        (0..self.descriptors.len()).map(|index| self.score(index)).collect()
    }

    fn descriptor_score(&mut self, index: usize, chain: &mut Vec<TypeInfo>) -> BeanResult<u64> {
        if let Some(score) = self.descriptor_scores.get(&index) {
            return Ok(*score);
        }

        // 工厂 Bean 使用宿主类的评分
        let class = Arc::clone(self.descriptors[index].class());
        let score = self.class_score(&class, chain)?;
        debug!("Bean {} 的评分: {}", self.descriptors[index], score);
        self.descriptor_scores.insert(index, score);
        Ok(score)
    }

    fn class_score(&mut self, class: &ClassDef, chain: &mut Vec<TypeInfo>) -> BeanResult<u64> {
        let info = class.type_info();
        if let Some(score) = self.class_scores.get(&info.id()) {
            return Ok(*score);
        }

        if chain.contains(&info) {
            let dependencies = chain
                .iter()
                .chain(std::iter::once(&info))
                .map(TypeInfo::short_name)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(BeanError::CircularDependency {
                chain: dependencies,
            });
        }

        class.check_constructor_count()?;
        let params = match class.constructors().first() {
            Some(constructor) if !constructor.is_zero_arg() => constructor.params(),
            _ => {
                self.class_scores.insert(info.id(), 0);
                return Ok(0);
            }
        };

        chain.push(info);
        let result = self.parameters_score(params, chain);
        chain.pop();

        let score = result?;
        self.class_scores.insert(info.id(), score);
        Ok(score)
    }

    fn parameters_score(&mut self, params: &[Parameter], chain: &mut Vec<TypeInfo>) -> BeanResult<u64> {
        let mut score = 0_u64;
        for param in params {
            let info = param.type_info();
            score = score.saturating_add(1);
            if info.is_abstract() {
                score = score.saturating_add(BEAN_SCORE_PENALTY);
            }

            let dependency = if param.is_collection() {
                self.related_score(info, chain)?
            } else if let Some(class) = self.class_bean_of(info) {
                self.class_score(&class, chain)?
            } else {
                BEAN_SCORE_PENALTY.saturating_add(self.related_score(info, chain)?)
            };
            score = score.saturating_add(dependency);
        }
        Ok(score)
    }

    /// 类型恰好为 `info` 的 Bean 类：本次扫描的类描述符，其次是注册表已知的类定义
    fn class_bean_of(&self, info: TypeInfo) -> Option<Arc<ClassDef>> {
        self.descriptors
            .iter()
            .find(|descriptor| !descriptor.is_factory() && descriptor.class().type_info() == info)
            .map(|descriptor| Arc::clone(descriptor.class()))
            .or_else(|| {
                self.registry
                    .and_then(|registry| registry.class(info.id()))
                    .filter(|class| class.is_bean())
            })
    }

    /// 所有与 `info` 兼容的未命名 Bean 的评分之和
    fn related_score(&mut self, info: TypeInfo, chain: &mut Vec<TypeInfo>) -> BeanResult<u64> {
        let key = BeanKey::unnamed(info);
        let related: Vec<usize> = self
            .descriptors
            .iter()
            .enumerate()
            .filter(|(_, descriptor)| key.matches(descriptor.key().name(), descriptor.product(), true))
            .map(|(index, _)| index)
            .collect();

        let mut sum = 0_u64;
        for index in related {
            sum = sum.saturating_add(self.descriptor_score(index, chain)?);
        }
        Ok(sum)
    }
}
