// ==========================================
// 加密货币行情数据质量校验系统 - 规则引擎
// ==========================================
// 职责: 按顺序执行质量规则，把标记列写入批次侧表，最后打时间戳
// 输入: 已通过结构闸门的批次（由调用方持有，引擎原地追加标记）
// 输出: 每条规则的三态结果（未执行/通过/失败行数）
// 红线:
// - 引擎只持有静态配置，可跨线程共享
// - 规则之间互不依赖，不因单条规则的结果短路
// - validated_at 最后写入，且无条件写入
// ==========================================

use crate::config::validation_config::ValidationConfig;
use crate::domain::record::RecordBatch;
use crate::domain::types::{QualityRule, RuleOutcome};
use crate::engine::rules::{build_rule, FlagRule};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use tracing::{debug, info, warn};

// ==========================================
// MetadataStamp - 校验时间戳
// ==========================================
// 一次运行只取一次时间，全部记录共用
#[derive(Debug, Clone, Copy)]
pub struct MetadataStamp {
    timezone: FixedOffset,
}

impl MetadataStamp {
    pub fn new(timezone: FixedOffset) -> Self {
        Self { timezone }
    }

    /// ISO-8601（含时区偏移，微秒精度）
    pub fn format(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.timezone)
            .to_rfc3339_opts(SecondsFormat::Micros, false)
    }

    pub fn stamp(&self, batch: &mut RecordBatch, now: DateTime<Utc>) {
        batch.set_validated_at(self.format(now));
    }
}

// ==========================================
// RuleRunSummary - 单次规则执行汇总
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRunSummary {
    pub outcomes: Vec<(QualityRule, RuleOutcome)>,
    pub validated_at: String,
}

impl RuleRunSummary {
    pub fn outcome(&self, rule: QualityRule) -> RuleOutcome {
        self.outcomes
            .iter()
            .find(|(r, _)| *r == rule)
            .map(|(_, outcome)| *outcome)
            .unwrap_or(RuleOutcome::NotRun)
    }

    pub fn failed_rules(&self) -> Vec<QualityRule> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, RuleOutcome::Failed(_)))
            .map(|(rule, _)| *rule)
            .collect()
    }
}

// ==========================================
// RuleEngine - 规则引擎
// ==========================================
pub struct RuleEngine {
    config: ValidationConfig,
    rules: Vec<Box<dyn FlagRule>>,
    stamp: MetadataStamp,
}

impl RuleEngine {
    /// 使用全部五条规则创建引擎
    pub fn new(config: ValidationConfig) -> Self {
        Self::with_rules(config, &QualityRule::ALL)
    }

    /// 只启用指定规则（未启用的规则在报告中为 skipped）
    pub fn with_rules(config: ValidationConfig, enabled: &[QualityRule]) -> Self {
        let rules = QualityRule::ALL
            .into_iter()
            .filter(|rule| enabled.contains(rule))
            .map(|rule| build_rule(rule, &config))
            .collect();
        let stamp = MetadataStamp::new(config.timezone());

        Self {
            config,
            rules,
            stamp,
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn enabled_rules(&self) -> Vec<QualityRule> {
        self.rules.iter().map(|rule| rule.rule()).collect()
    }

    /// 执行规则并打时间戳（取当前时间）
    pub fn apply(&self, batch: &mut RecordBatch) -> RuleRunSummary {
        self.apply_at(batch, Utc::now())
    }

    /// 执行规则并打时间戳（指定时间）
    ///
    /// # 逻辑
    /// 1. 逐条规则求值，写入标记列
    /// 2. 失败行数 > 0 时记录警告
    /// 3. 最后写入 validated_at
    pub fn apply_at(&self, batch: &mut RecordBatch, now: DateTime<Utc>) -> RuleRunSummary {
        let total_rows = batch.len();
        info!(total_rows, rules = self.rules.len(), "开始执行质量规则");

        let mut outcomes = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let flags = rule.evaluate(batch);
            let failed_count = flags.iter().filter(|flag| **flag).count();
            let outcome = if batch.set_flags(rule.rule(), flags) {
                RuleOutcome::from_failed_count(failed_count)
            } else {
                // 标记列长度与行数不一致，视为未执行
                warn!(rule = %rule.rule(), "标记列长度与批次行数不一致，规则结果丢弃");
                RuleOutcome::NotRun
            };

            match outcome {
                RuleOutcome::Failed(count) => {
                    warn!(rule = %rule.rule(), failed = count, total_rows, "发现异常记录");
                }
                RuleOutcome::Passed => debug!(rule = %rule.rule(), "规则通过"),
                RuleOutcome::NotRun => {}
            }
            outcomes.push((rule.rule(), outcome));
        }

        self.stamp.stamp(batch, now);
        let validated_at = batch.validated_at().unwrap_or_default().to_string();

        info!(
            total_rows,
            failed_rules = outcomes
                .iter()
                .filter(|(_, o)| matches!(o, RuleOutcome::Failed(_)))
                .count(),
            validated_at = %validated_at,
            "质量规则执行完成"
        );

        RuleRunSummary {
            outcomes,
            validated_at,
        }
    }
}
