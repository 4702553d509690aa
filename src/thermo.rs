//! 热力学封闭模型求解
//!
//! 根据初始条件文档选择封闭模型，并计算该模型需要的派生常数。
//! 模型只在流水线开始时求解一次，之后各时间步只读共享。

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::dataset::require;
use crate::error::{PipelineError, PipelineResult};

pub const IDEAL_GAS: &str = "ideal_gas";
pub const INCOMPRESSIBLE: &str = "incompressible";

/// 热力学封闭模型
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ThermodynamicModel {
    /// 理想气体绝热关系 p = C * rho^gamma
    IdealGas {
        /// 比气体常数 R, J/(kg·K)
        gas_constant: f64,
        /// 绝热指数 gamma
        gamma: f64,
        /// 参考常数 C = mean(p0) / rho0^gamma
        reference_constant: f64,
    },
    /// 不可压缩流体，密度恒定，不计算温度
    Incompressible { reference_density: f64 },
}

impl ThermodynamicModel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::IdealGas { .. } => IDEAL_GAS,
            Self::Incompressible { .. } => INCOMPRESSIBLE,
        }
    }
}

impl fmt::Display for ThermodynamicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdealGas {
                gas_constant,
                gamma,
                reference_constant,
            } => write!(
                f,
                "ideal_gas (R={}, gamma={}, C={:.2})",
                gas_constant, gamma, reference_constant
            ),
            Self::Incompressible { reference_density } => {
                write!(f, "incompressible (rho={})", reference_density)
            }
        }
    }
}

/// 从初始条件文档与首个时间步压力求解封闭模型
///
/// `pressure_history` 只使用第 0 个时间步。理想气体的参考常数取整个区域
/// 初始压力的平均值，而不是逐节点计算。
pub fn resolve_model(
    initial_data: &Value,
    pressure_history: &[Vec<f64>],
) -> PipelineResult<ThermodynamicModel> {
    let root = initial_data
        .as_object()
        .ok_or_else(|| PipelineError::structural("<root>", "必须是对象"))?;
    let fluid_properties = require(root, "fluid_properties", "fluid_properties")?
        .as_object()
        .ok_or_else(|| PipelineError::structural("fluid_properties", "必须是对象"))?;

    let density_value = require(fluid_properties, "density", "fluid_properties.density")?;
    let initial_density = density_value.as_f64().ok_or_else(|| {
        PipelineError::structural("fluid_properties.density", "必须是数值")
    })?;
    if initial_density <= 0.0 {
        return Err(PipelineError::thermodynamic(format!(
            "初始密度无效: {}，必须为正数",
            initial_density
        )));
    }

    let empty = Map::new();
    let thermodynamics = match fluid_properties.get("thermodynamics") {
        None => &empty,
        Some(value) => value.as_object().ok_or_else(|| {
            PipelineError::structural("fluid_properties.thermodynamics", "必须是对象")
        })?,
    };
    let model = thermodynamics
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match model.as_str() {
        IDEAL_GAS => resolve_ideal_gas(thermodynamics, initial_density, pressure_history),
        INCOMPRESSIBLE => Ok(ThermodynamicModel::Incompressible {
            reference_density: initial_density,
        }),
        other => Err(PipelineError::thermodynamic(format!(
            "不支持的热力学模型 '{}'，仅支持 '{}' 和 '{}'",
            other, IDEAL_GAS, INCOMPRESSIBLE
        ))),
    }
}

fn resolve_ideal_gas(
    thermodynamics: &Map<String, Value>,
    initial_density: f64,
    pressure_history: &[Vec<f64>],
) -> PipelineResult<ThermodynamicModel> {
    let gas_constant = positive_constant(thermodynamics, "specific_gas_constant_J_per_kgK")?;
    let gamma = positive_constant(thermodynamics, "adiabatic_index_gamma")?;

    let first_step = match pressure_history.first() {
        Some(step) if !step.is_empty() => step,
        _ => {
            return Err(PipelineError::thermodynamic(
                "首个时间步压力为空，无法计算参考常数 (cannot calculate reference constant)",
            ));
        }
    };
    let mean_pressure = first_step.iter().sum::<f64>() / first_step.len() as f64;
    if !mean_pressure.is_finite() || mean_pressure <= 0.0 {
        return Err(PipelineError::thermodynamic(format!(
            "平均初始压力 ({}) 不是有限正数，无法计算参考常数",
            mean_pressure
        )));
    }
    let reference_constant = mean_pressure / initial_density.powf(gamma);
    if !reference_constant.is_finite() || reference_constant <= 0.0 {
        return Err(PipelineError::thermodynamic(format!(
            "参考常数 C = {} 无效 (rho0 = {}, gamma = {})",
            reference_constant, initial_density, gamma
        )));
    }

    Ok(ThermodynamicModel::IdealGas {
        gas_constant,
        gamma,
        reference_constant,
    })
}

fn positive_constant(thermodynamics: &Map<String, Value>, key: &str) -> PipelineResult<f64> {
    let value = thermodynamics.get(key).ok_or_else(|| {
        PipelineError::thermodynamic(format!("理想气体模型缺少 'thermodynamics.{}'", key))
    })?;
    match value.as_f64() {
        Some(v) if v > 0.0 => Ok(v),
        _ => Err(PipelineError::thermodynamic(format!(
            "'thermodynamics.{}' 无效: {}，必须为正数",
            key, value
        ))),
    }
}
