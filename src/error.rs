//! 错误类型定义
//!
//! 流水线中所有致命错误统一为 `PipelineError`，文档读取错误为 `LoadError`。
//! 空时间步不是错误，见 `derivation::StepOutcome::Empty`。

use thiserror::Error;

/// 流水线结果类型别名
pub type PipelineResult<T> = Result<T, PipelineError>;

/// 流水线致命错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// 必需字段缺失、类型错误或为空
    #[error("结构错误: 字段 '{field}' {reason}")]
    Structural { field: String, reason: String },

    /// 声明的网格尺寸与节点/数组数量不一致
    #[error("维度不匹配: 字段 '{field}' 期望 {expected}, 实际 {actual}")]
    DimensionMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// 不支持的热力学模型、非正物理常数或非正参考压力
    #[error("热力学模型错误: {reason}")]
    ThermodynamicModel { reason: String },

    /// 单个时间步的重塑或计算失败，整个流水线中止
    #[error("时间步 {index} 计算失败: {reason}")]
    StepComputation { index: usize, reason: String },

    /// 输入声明了时间步但没有生成任何输出
    #[error("未生成有效输出: 输入声明了 {declared} 个时间步")]
    NoOutput { declared: usize },
}

impl PipelineError {
    pub fn structural(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Structural {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn thermodynamic(reason: impl Into<String>) -> Self {
        Self::ThermodynamicModel {
            reason: reason.into(),
        }
    }

    pub fn step(index: usize, reason: impl Into<String>) -> Self {
        Self::StepComputation {
            index,
            reason: reason.into(),
        }
    }

    /// 错误类别标识，用于 HTTP 响应中的 `kind` 字段
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Structural { .. } => "structural",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::ThermodynamicModel { .. } => "thermodynamic_model",
            Self::StepComputation { .. } => "step_computation",
            Self::NoOutput { .. } => "no_output",
        }
    }
}

/// 输入文档读取错误
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO 错误: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON 解析错误: {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("不支持的文件格式: {path} (支持: {supported:?})")]
    UnsupportedFormat {
        path: String,
        supported: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_field() {
        let err = PipelineError::structural("mesh_info.dx", "必须为正数");
        assert!(err.to_string().contains("mesh_info.dx"));

        let err = PipelineError::DimensionMismatch {
            field: "mesh_info.nodes_coords".into(),
            expected: 10,
            actual: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains("nodes_coords"));
        assert!(msg.contains("10"));
        assert!(msg.contains('9'));
    }

    #[test]
    fn test_step_error_names_index() {
        let err = PipelineError::step(7, "重塑失败");
        assert!(err.to_string().contains('7'));
        assert_eq!(err.kind(), "step_computation");
    }
}
