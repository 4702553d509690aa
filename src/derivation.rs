//! 单个时间步的场量派生
//!
//! 将展平的节点速度/压力数组重塑为 (nz, ny, nx) 体素布局，按封闭模型
//! 计算密度与温度，再按原节点顺序展平输出。

use serde::{Deserialize, Serialize};

use crate::dataset::GridShape;
use crate::error::{PipelineError, PipelineResult};
use crate::thermo::ThermodynamicModel;
use crate::utils::voxel_grid::VoxelGrid;

/// 压力下限，避免零压或负压进入幂运算
pub const PRESSURE_FLOOR: f64 = 1e-9;
/// 密度低于该值时温度记为 0
pub const DENSITY_EPSILON: f64 = 1e-9;

/// 单个时间步的派生结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedTimeStep {
    pub time: f64,
    #[serde(rename = "frame")]
    pub frame_index: usize,
    #[serde(rename = "density_data")]
    pub density: Vec<f64>,
    #[serde(rename = "velocity_data")]
    pub velocity: Vec<[f64; 3]>,
    #[serde(rename = "temperature_data")]
    pub temperature: Vec<f64>,
}

impl DerivedTimeStep {
    /// 空记录：保留时间步位置，但不含场数据
    pub fn empty(frame_index: usize, time: f64) -> Self {
        Self {
            time,
            frame_index,
            density: Vec::new(),
            velocity: Vec::new(),
            temperature: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.density.is_empty() && self.velocity.is_empty() && self.temperature.is_empty()
    }
}

/// 派生结果：正常数据或空时间步警告
///
/// 空时间步可以恢复，数据损坏则以 `PipelineError::StepComputation` 返回。
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Derived(DerivedTimeStep),
    Empty(DerivedTimeStep),
}

impl StepOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    pub fn into_record(self) -> DerivedTimeStep {
        match self {
            Self::Derived(record) | Self::Empty(record) => record,
        }
    }
}

/// 将 NaN、无穷大与负值统一替换为 0.0
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

/// 派生一个时间步
///
/// ## 参数
/// - `index`: 时间步索引，同时作为输出帧号
/// - `time`: 该时间步的模拟时间
/// - `velocity`: 展平的节点速度，每行 3 个分量
/// - `pressure`: 展平的节点压力
/// - `grid`: 网格形状
/// - `model`: 已求解的封闭模型
///
/// ## 返回
/// - `Ok(StepOutcome::Empty)`: 速度或压力为空，跳过物理计算
/// - `Ok(StepOutcome::Derived)`: 正常派生结果
/// - `Err(StepComputation)`: 数据长度与网格不符或模型参数无效
pub fn derive_time_step(
    index: usize,
    time: f64,
    velocity: &[Vec<f64>],
    pressure: &[f64],
    grid: GridShape,
    model: &ThermodynamicModel,
) -> PipelineResult<StepOutcome> {
    // 所有速度行都为空（包括没有行）时视为无数据
    if velocity.iter().all(|row| row.is_empty()) || pressure.is_empty() {
        return Ok(StepOutcome::Empty(DerivedTimeStep::empty(index, time)));
    }

    let shape = grid.zyx();
    let pressure_grid = VoxelGrid::new(shape, pressure.to_vec())
        .map_err(|e| PipelineError::step(index, format!("压力数组无法重塑: {}", e)))?;

    let rows = velocity
        .iter()
        .enumerate()
        .map(|(i, row)| match row.as_slice() {
            &[vx, vy, vz] => Ok([vx, vy, vz]),
            _ => Err(PipelineError::step(
                index,
                format!(
                    "速度数组无法重塑为 {:?}x3: 第 {} 行有 {} 个分量",
                    shape,
                    i,
                    row.len()
                ),
            )),
        })
        .collect::<PipelineResult<Vec<[f64; 3]>>>()?;
    let velocity_grid = VoxelGrid::new(shape, rows)
        .map_err(|e| PipelineError::step(index, format!("速度数组无法重塑: {}", e)))?;

    let (density_grid, temperature_grid) = apply_closure(index, &pressure_grid, model)?;

    Ok(StepOutcome::Derived(DerivedTimeStep {
        time,
        frame_index: index,
        density: density_grid.into_data(),
        velocity: velocity_grid.into_data(),
        temperature: temperature_grid.into_data(),
    }))
}

fn apply_closure(
    index: usize,
    pressure: &VoxelGrid<f64>,
    model: &ThermodynamicModel,
) -> PipelineResult<(VoxelGrid<f64>, VoxelGrid<f64>)> {
    match *model {
        ThermodynamicModel::IdealGas {
            gas_constant,
            gamma,
            reference_constant,
        } => {
            if !(reference_constant.is_finite() && reference_constant > 0.0) {
                return Err(PipelineError::step(
                    index,
                    format!("参考常数 C 无效: {}", reference_constant),
                ));
            }
            if gamma <= 0.0 || gas_constant <= 0.0 {
                return Err(PipelineError::step(
                    index,
                    format!("gamma ({}) 或 R ({}) 无效", gamma, gas_constant),
                ));
            }

            let clamped = pressure.map(|&p| p.max(PRESSURE_FLOOR));
            let density = clamped.map(|&p| sanitize((p / reference_constant).powf(1.0 / gamma)));
            let temperature = clamped
                .zip_map(&density, |&p, &rho| {
                    if rho > DENSITY_EPSILON {
                        sanitize(p / (rho * gas_constant))
                    } else {
                        0.0
                    }
                })
                .map_err(|e| PipelineError::step(index, e))?;
            Ok((density, temperature))
        }
        ThermodynamicModel::Incompressible { reference_density } => Ok((
            pressure.map(|_| reference_density),
            pressure.map(|_| 0.0),
        )),
    }
}
