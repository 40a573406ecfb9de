//! 交易元数据访问器
//!
//! 实体元数据是开放的键值映射。挖掘算法不直接解析映射，而是通过这里的
//! 访问器读取宿主应用约定的字段路径。

use serde_json::Value;
use std::collections::HashMap;

/// 交易结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOutcome {
    /// 盈利
    Win,
    /// 亏损
    Loss,
}

/// 交易元数据只读视图
#[derive(Debug, Clone, Copy)]
pub struct TradeMetadata<'a> {
    inner: &'a HashMap<String, Value>,
}

impl<'a> TradeMetadata<'a> {
    /// 包装元数据映射
    pub fn new(inner: &'a HashMap<String, Value>) -> Self {
        Self { inner }
    }

    /// 按路径读取嵌套值，例如 `["execution", "result"]`
    pub fn get(&self, path: &[&str]) -> Option<&'a Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.inner.get(*first)?;
        for key in rest {
            current = current.get(*key)?;
        }
        Some(current)
    }

    /// 读取非空字符串
    pub fn str_at(&self, path: &[&str]) -> Option<&'a str> {
        self.get(path)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// 读取数值
    pub fn f64_at(&self, path: &[&str]) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    /// 宿主约定的交易结果标记
    ///
    /// 依次检查 `meta.example_type`、`result`、`execution.result`。
    pub fn outcome(&self) -> Option<TradeOutcome> {
        match self.str_at(&["meta", "example_type"]) {
            Some("positive") => return Some(TradeOutcome::Win),
            Some("negative") => return Some(TradeOutcome::Loss),
            _ => {}
        }
        for path in [&["result"][..], &["execution", "result"][..]] {
            match self.str_at(path).map(str::to_ascii_lowercase).as_deref() {
                Some("win") => return Some(TradeOutcome::Win),
                Some("loss") => return Some(TradeOutcome::Loss),
                _ => {}
            }
        }
        None
    }

    /// 交易时段
    pub fn session(&self) -> Option<&'a str> {
        self.str_at(&["time", "session"])
            .or_else(|| self.str_at(&["setup", "session"]))
            .or_else(|| self.str_at(&["context", "session"]))
    }

    /// 杀伤区（killzone）
    pub fn killzone(&self) -> Option<&'a str> {
        self.str_at(&["time", "killzone"])
            .or_else(|| self.str_at(&["context", "killzone"]))
    }

    /// 交易品种
    pub fn instrument(&self) -> Option<&'a str> {
        self.str_at(&["market", "pair"])
    }

    /// 设置质量评分
    pub fn quality_grade(&self) -> Option<f64> {
        self.f64_at(&["grading", "total_score"])
    }

    /// 失败根因
    ///
    /// 存在失败分析但未写根因时归为 "Unknown"。
    pub fn root_cause(&self) -> Option<&'a str> {
        let analysis = self.get(&["failure_analysis"])?;
        if analysis.is_null() {
            return None;
        }
        Some(
            analysis
                .get("root_cause")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or("Unknown"),
        )
    }

    /// 交易使用的模型名称
    pub fn model_name(&self) -> Option<&'a str> {
        self.str_at(&["setup", "model"])
    }
}
