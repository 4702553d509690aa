//! 模拟结果文档校验
//!
//! 对原始 Navier-Stokes 结果文档做结构与语义校验，成功时返回强类型的
//! `SimulationDataset`。校验按固定顺序进行，遇到第一个错误即返回。

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{PipelineError, PipelineResult};

/// 网格形状，输入文档中按 `[z, y, x]` 顺序给出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridShape {
    pub num_z: usize,
    pub num_y: usize,
    pub num_x: usize,
}

impl GridShape {
    pub fn new(num_z: usize, num_y: usize, num_x: usize) -> Self {
        Self {
            num_z,
            num_y,
            num_x,
        }
    }

    /// 节点总数 num_x * num_y * num_z，溢出时为 None
    pub fn node_count(&self) -> Option<usize> {
        self.num_x
            .checked_mul(self.num_y)?
            .checked_mul(self.num_z)
    }

    /// 体素布局 [nz, ny, nx]，z 最慢、x 最快
    pub fn zyx(&self) -> [usize; 3] {
        [self.num_z, self.num_y, self.num_x]
    }

    /// 输出文档中的维度顺序 [x, y, z]
    pub fn dimensions_xyz(&self) -> [usize; 3] {
        [self.num_x, self.num_y, self.num_z]
    }
}

/// 校验通过的模拟数据集，构造后只读
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationDataset {
    pub time_points: Vec<f64>,
    pub grid_shape: GridShape,
    /// [dx, dy, dz]
    pub voxel_size: [f64; 3],
    /// 按 z 最外层、x 最内层的顺序展平
    pub node_coords: Vec<[f64; 3]>,
    /// velocity_history[t][i] 为第 i 个节点的速度分量（行宽在派生阶段检查）
    pub velocity_history: Vec<Vec<Vec<f64>>>,
    pub pressure_history: Vec<Vec<f64>>,
}

impl SimulationDataset {
    pub fn step_count(&self) -> usize {
        self.time_points.len()
    }

    /// 网格原点，取第一个节点坐标
    pub fn origin(&self) -> [f64; 3] {
        self.node_coords.first().copied().unwrap_or([0.0; 3])
    }

    /// 检查第一行节点的 x 坐标是否严格递增
    ///
    /// 节点展平顺序（z 外层、x 内层）是输入格式的约定，这里只做廉价的抽查。
    pub fn x_axis_is_monotonic(&self) -> bool {
        let row_len = self.grid_shape.num_x.min(self.node_coords.len());
        self.node_coords[..row_len]
            .windows(2)
            .all(|pair| pair[1][0] > pair[0][0])
    }
}

/// 校验模拟结果文档
pub fn validate_simulation(document: &Value) -> PipelineResult<SimulationDataset> {
    let root = document
        .as_object()
        .ok_or_else(|| PipelineError::structural("<root>", "必须是对象"))?;

    // 1. time_points
    let time_values = require_list(root, "time_points", "time_points")?;
    if time_values.is_empty() {
        return Err(PipelineError::structural("time_points", "不能为空"));
    }
    let time_points = time_values
        .iter()
        .enumerate()
        .map(|(i, v)| number_at(v, || format!("time_points[{}]", i)))
        .collect::<PipelineResult<Vec<f64>>>()?;

    // 2. mesh_info
    let mesh_info = require(root, "mesh_info", "mesh_info")?
        .as_object()
        .ok_or_else(|| PipelineError::structural("mesh_info", "必须是对象"))?;
    for key in ["nodes_coords", "grid_shape", "dx", "dy", "dz"] {
        require(mesh_info, key, &format!("mesh_info.{}", key))?;
    }
    let coord_rows = require_list(mesh_info, "nodes_coords", "mesh_info.nodes_coords")?;
    let grid_shape = parse_grid_shape(require_list(
        mesh_info,
        "grid_shape",
        "mesh_info.grid_shape",
    )?)?;
    let dx = positive_number(mesh_info, "dx")?;
    let dy = positive_number(mesh_info, "dy")?;
    let dz = positive_number(mesh_info, "dz")?;

    // 3. 历史数组
    let velocity_steps = require_list(root, "velocity_history", "velocity_history")?;
    let pressure_steps = require_list(root, "pressure_history", "pressure_history")?;

    // 4. 长度一致
    if velocity_steps.len() != time_points.len() {
        return Err(PipelineError::DimensionMismatch {
            field: "velocity_history".into(),
            expected: time_points.len(),
            actual: velocity_steps.len(),
        });
    }
    if pressure_steps.len() != time_points.len() {
        return Err(PipelineError::DimensionMismatch {
            field: "pressure_history".into(),
            expected: time_points.len(),
            actual: pressure_steps.len(),
        });
    }

    // 5. 首个时间步必须是非空列表，热力学求解也依赖它
    for (field, steps) in [
        ("velocity_history", velocity_steps),
        ("pressure_history", pressure_steps),
    ] {
        match steps[0].as_array() {
            Some(first) if !first.is_empty() => {}
            _ => {
                return Err(PipelineError::structural(
                    format!("{}[0]", field),
                    "首个时间步为空或格式错误",
                ));
            }
        }
    }

    // 6. 节点坐标数量与列数
    let expected_nodes = grid_shape.node_count().ok_or_else(|| {
        PipelineError::structural("mesh_info.grid_shape", "节点总数超出可表示范围")
    })?;
    if coord_rows.len() != expected_nodes {
        return Err(PipelineError::DimensionMismatch {
            field: "mesh_info.nodes_coords".into(),
            expected: expected_nodes,
            actual: coord_rows.len(),
        });
    }
    let node_coords = coord_rows
        .iter()
        .enumerate()
        .map(|(i, row)| parse_coord_row(row, i))
        .collect::<PipelineResult<Vec<[f64; 3]>>>()?;

    let velocity_history = velocity_steps
        .iter()
        .enumerate()
        .map(|(t, step)| parse_velocity_step(step, t))
        .collect::<PipelineResult<Vec<_>>>()?;
    let pressure_history = pressure_steps
        .iter()
        .enumerate()
        .map(|(t, step)| parse_pressure_step(step, t))
        .collect::<PipelineResult<Vec<_>>>()?;

    Ok(SimulationDataset {
        time_points,
        grid_shape,
        voxel_size: [dx, dy, dz],
        node_coords,
        velocity_history,
        pressure_history,
    })
}

pub(crate) fn require<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> PipelineResult<&'a Value> {
    object
        .get(key)
        .ok_or_else(|| PipelineError::structural(path, "缺失"))
}

fn require_list<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> PipelineResult<&'a Vec<Value>> {
    require(object, key, path)?
        .as_array()
        .ok_or_else(|| PipelineError::structural(path, "必须是列表"))
}

fn number_at(value: &Value, path: impl FnOnce() -> String) -> PipelineResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| PipelineError::structural(path(), "必须是数值"))
}

fn positive_number(mesh_info: &Map<String, Value>, key: &str) -> PipelineResult<f64> {
    let path = format!("mesh_info.{}", key);
    match mesh_info.get(key).and_then(Value::as_f64) {
        Some(v) if v > 0.0 => Ok(v),
        _ => Err(PipelineError::structural(
            path,
            "体素尺寸无效，必须为正数",
        )),
    }
}

fn parse_grid_shape(values: &[Value]) -> PipelineResult<GridShape> {
    let dims: Option<Vec<usize>> = values
        .iter()
        .map(|v| {
            v.as_u64()
                .filter(|&d| d > 0)
                .and_then(|d| usize::try_from(d).ok())
        })
        .collect();
    match dims.as_deref() {
        Some(&[z, y, x]) => Ok(GridShape::new(z, y, x)),
        _ => Err(PipelineError::structural(
            "mesh_info.grid_shape",
            format!("必须是 3 个正整数，实际为 {:?}", values),
        )),
    }
}

fn parse_coord_row(row: &Value, index: usize) -> PipelineResult<[f64; 3]> {
    let field = format!("mesh_info.nodes_coords[{}]", index);
    let columns = row
        .as_array()
        .ok_or_else(|| PipelineError::structural(field.clone(), "必须是列表"))?;
    if columns.len() != 3 {
        return Err(PipelineError::DimensionMismatch {
            field,
            expected: 3,
            actual: columns.len(),
        });
    }
    let mut coord = [0.0; 3];
    for (axis, value) in columns.iter().enumerate() {
        coord[axis] = number_at(value, || format!("{}[{}]", field, axis))?;
    }
    Ok(coord)
}

fn parse_velocity_step(step: &Value, t: usize) -> PipelineResult<Vec<Vec<f64>>> {
    let rows = step.as_array().ok_or_else(|| {
        PipelineError::structural(format!("velocity_history[{}]", t), "必须是列表")
    })?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let components = row.as_array().ok_or_else(|| {
                PipelineError::structural(format!("velocity_history[{}][{}]", t, i), "必须是列表")
            })?;
            components
                .iter()
                .map(|c| number_at(c, || format!("velocity_history[{}][{}]", t, i)))
                .collect()
        })
        .collect()
}

fn parse_pressure_step(step: &Value, t: usize) -> PipelineResult<Vec<f64>> {
    let values = step.as_array().ok_or_else(|| {
        PipelineError::structural(format!("pressure_history[{}]", t), "必须是列表")
    })?;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| number_at(v, || format!("pressure_history[{}][{}]", t, i)))
        .collect()
}
