//! 可观测性模块
//!
//! 提供挖掘指标和结构化日志初始化。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::LoggingConfig;
use crate::error::{AppError, Result};

// ===== Mining Metrics =====

/// 挖掘指标
///
/// 克隆共享同一组计数器；每个 `KnowledgeMiner` 持有自己的实例。
#[derive(Clone, Default)]
pub struct MiningMetrics {
    pub passes_total: Arc<AtomicU64>,
    pub patterns_emitted_total: Arc<AtomicU64>,
    pub training_patterns_total: Arc<AtomicU64>,
    pub generator_success_total: Arc<AtomicU64>,
    pub generator_failures_total: Arc<AtomicU64>,
    pub fallback_total: Arc<AtomicU64>,
    pub pass_duration_ms_sum: Arc<AtomicU64>,
}

impl MiningMetrics {
    /// 记录一次确定性挖掘
    pub fn record_pass(&self, structural: usize, training: usize, duration_ms: u64) {
        self.passes_total.fetch_add(1, Ordering::SeqCst);
        self.patterns_emitted_total
            .fetch_add(structural as u64, Ordering::SeqCst);
        self.training_patterns_total
            .fetch_add(training as u64, Ordering::SeqCst);
        self.pass_duration_ms_sum
            .fetch_add(duration_ms, Ordering::SeqCst);
    }

    /// 记录生成服务成功
    pub fn record_generator_success(&self) {
        self.generator_success_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录生成服务失败
    pub fn record_generator_failure(&self) {
        self.generator_failures_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录回退
    pub fn record_fallback(&self) {
        self.fallback_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        format!(
            r#"# HELP mining_passes_total Total mining passes
# TYPE mining_passes_total counter
mining_passes_total {}
# HELP mining_pass_duration_seconds Mining pass duration in seconds
# TYPE mining_pass_duration_seconds histogram
mining_pass_duration_seconds_sum {}
mining_pass_duration_seconds_count {}
# HELP structural_patterns_total Structural patterns emitted
# TYPE structural_patterns_total counter
structural_patterns_total {}
# HELP training_patterns_total Training patterns emitted
# TYPE training_patterns_total counter
training_patterns_total {}
# HELP insight_generator_success_total Successful generator calls
# TYPE insight_generator_success_total counter
insight_generator_success_total {}
# HELP insight_generator_failures_total Failed generator calls
# TYPE insight_generator_failures_total counter
insight_generator_failures_total {}
# HELP insight_fallback_total Insight syntheses served by the fallback
# TYPE insight_fallback_total counter
insight_fallback_total {}
"#,
            self.passes_total.load(Ordering::SeqCst),
            self.pass_duration_ms_sum.load(Ordering::SeqCst) as f64 / 1000.0,
            self.passes_total.load(Ordering::SeqCst),
            self.patterns_emitted_total.load(Ordering::SeqCst),
            self.training_patterns_total.load(Ordering::SeqCst),
            self.generator_success_total.load(Ordering::SeqCst),
            self.generator_failures_total.load(Ordering::SeqCst),
            self.fallback_total.load(Ordering::SeqCst),
        )
    }
}

// ===== Structured Logging =====

/// 初始化结构化日志
///
/// `RUST_LOG` 优先于配置的级别。配置了 `log_dir` 时按天滚动写入文件，
/// 返回的 guard 需在进程退出前保持存活。
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (writer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tradegraph.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_line_number(true);

    let installed = if config.structured {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AppError::Config(format!("tracing subscriber: {}", e)))?;

    Ok(guard)
}
