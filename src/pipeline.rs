//! 流水线编排
//!
//! 校验 → 求解热力学模型 → 逐时间步派生 → 组装体数据文档。
//! 任何致命错误立即中止并丢弃已累积的时间步；空时间步只记录警告。

use std::time::Instant;

use chrono::{Local, Utc};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::{SimulationDataset, validate_simulation};
use crate::derivation::{DerivedTimeStep, StepOutcome, derive_time_step};
use crate::error::{PipelineError, PipelineResult};
use crate::thermo::{ThermodynamicModel, resolve_model};

pub const DEFAULT_VOLUME_NAME: &str = "FluidVolume";

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validating,
    ResolvingThermodynamics,
    DerivingSteps,
    Assembling,
    Done,
    Aborted,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::ResolvingThermodynamics => "resolving_thermodynamics",
            Self::DerivingSteps => "deriving_steps",
            Self::Assembling => "assembling",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

/// 网格元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridInfo {
    /// [x, y, z]
    pub dimensions: [usize; 3],
    /// [dx, dy, dz]
    pub voxel_size: [f64; 3],
    /// 第一个节点坐标
    pub origin: [f64; 3],
}

/// 来源与生成时间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeMetadata {
    pub source_navier_stokes: String,
    pub source_initial_data: String,
    pub generated_timestamp: String,
}

/// 最终输出的体数据文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumetricDocument {
    pub volume_name: String,
    pub metadata: VolumeMetadata,
    pub grid_info: GridInfo,
    pub time_steps: Vec<DerivedTimeStep>,
}

/// 输入文档的来源标识，写入 metadata
#[derive(Debug, Clone, Default)]
pub struct SourceNames {
    pub simulation: String,
    pub initial_data: String,
}

impl SourceNames {
    pub fn new(simulation: impl Into<String>, initial_data: impl Into<String>) -> Self {
        Self {
            simulation: simulation.into(),
            initial_data: initial_data.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub volume_name: String,
    /// 是否用 rayon 并行派生各时间步
    pub parallel: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            volume_name: DEFAULT_VOLUME_NAME.into(),
            parallel: true,
        }
    }
}

/// 阶段耗时 (Unix 时间戳，毫秒)
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub start_time: u64,
    pub end_time: u64,
}

/// 一次运行的过程记录
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub timings: Vec<StageTiming>,
    /// 速度或压力为空的时间步索引
    pub empty_steps: Vec<usize>,
    pub model: Option<ThermodynamicModel>,
}

pub struct Pipeline {
    options: PipelineOptions,
    stage: PipelineStage,
    report: PipelineReport,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            stage: PipelineStage::Validating,
            report: PipelineReport::default(),
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn report(&self) -> &PipelineReport {
        &self.report
    }

    pub fn into_report(self) -> PipelineReport {
        self.report
    }

    /// 运行完整流水线
    ///
    /// 失败时阶段置为 `Aborted`，不返回任何部分结果。
    pub fn run(
        &mut self,
        simulation: &Value,
        initial_data: &Value,
        sources: &SourceNames,
    ) -> PipelineResult<VolumetricDocument> {
        self.stage = PipelineStage::Validating;
        self.report = PipelineReport::default();

        match self.execute(simulation, initial_data, sources) {
            Ok(document) => {
                self.stage = PipelineStage::Done;
                info!(
                    "体数据生成完成: {} 个时间步 ({} 个为空)",
                    document.time_steps.len(),
                    self.report.empty_steps.len()
                );
                Ok(document)
            }
            Err(e) => {
                error!("流水线在阶段 {} 中止: {}", self.stage.as_str(), e);
                self.stage = PipelineStage::Aborted;
                Err(e)
            }
        }
    }

    fn execute(
        &mut self,
        simulation: &Value,
        initial_data: &Value,
        sources: &SourceNames,
    ) -> PipelineResult<VolumetricDocument> {
        let dataset = self.timed(PipelineStage::Validating, || {
            validate_simulation(simulation)
        })?;
        if !dataset.x_axis_is_monotonic() {
            warn!("nodes_coords 第一行的 x 坐标不是严格递增，节点顺序可能不是 z 外层、x 内层");
        }

        let model = self.timed(PipelineStage::ResolvingThermodynamics, || {
            resolve_model(initial_data, &dataset.pressure_history)
        })?;
        info!("热力学模型: {}", model);
        self.report.model = Some(model);

        let parallel = self.options.parallel;
        let outcomes = self.timed(PipelineStage::DerivingSteps, || {
            derive_all_steps(&dataset, &model, parallel)
        })?;

        let declared = dataset.step_count();
        let mut time_steps = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if outcome.is_empty() {
                let record = outcome.into_record();
                warn!("时间步 {} 的速度或压力数据为空，跳过物理计算", record.frame_index);
                self.report.empty_steps.push(record.frame_index);
                time_steps.push(record);
            } else {
                time_steps.push(outcome.into_record());
            }
        }
        if time_steps.is_empty() && declared > 0 {
            return Err(PipelineError::NoOutput { declared });
        }

        let volume_name = self.options.volume_name.clone();
        Ok(self.timed(PipelineStage::Assembling, || {
            assemble(volume_name, &dataset, sources, time_steps)
        }))
    }

    fn timed<R>(&mut self, stage: PipelineStage, f: impl FnOnce() -> R) -> R {
        self.stage = stage;
        debug!("进入阶段: {}", stage.as_str());
        let start_time = unix_timestamp_ms();
        let started = Instant::now();
        let result = f();
        self.report.timings.push(StageTiming {
            stage,
            start_time,
            end_time: start_time + started.elapsed().as_millis() as u64,
        });
        result
    }
}

/// 以默认选项运行流水线
pub fn process_fluid_data(
    simulation: &Value,
    initial_data: &Value,
    sources: &SourceNames,
) -> PipelineResult<VolumetricDocument> {
    Pipeline::new(PipelineOptions::default()).run(simulation, initial_data, sources)
}

/// 派生全部时间步，结果按索引排列；任一步出错则整体失败，
/// 多步出错时返回索引最小的错误
fn derive_all_steps(
    dataset: &SimulationDataset,
    model: &ThermodynamicModel,
    parallel: bool,
) -> PipelineResult<Vec<StepOutcome>> {
    let derive = |t: usize| {
        derive_time_step(
            t,
            dataset.time_points[t],
            &dataset.velocity_history[t],
            &dataset.pressure_history[t],
            dataset.grid_shape,
            model,
        )
    };

    let steps = 0..dataset.step_count();
    let results: Vec<PipelineResult<StepOutcome>> = if parallel {
        steps.into_par_iter().map(derive).collect()
    } else {
        steps.map(derive).collect()
    };
    results.into_iter().collect()
}

fn assemble(
    volume_name: String,
    dataset: &SimulationDataset,
    sources: &SourceNames,
    time_steps: Vec<DerivedTimeStep>,
) -> VolumetricDocument {
    VolumetricDocument {
        volume_name,
        metadata: VolumeMetadata {
            source_navier_stokes: sources.simulation.clone(),
            source_initial_data: sources.initial_data.clone(),
            generated_timestamp: Local::now().to_rfc3339(),
        },
        grid_info: GridInfo {
            dimensions: dataset.grid_shape.dimensions_xyz(),
            voxel_size: dataset.voxel_size,
            origin: dataset.origin(),
        },
        time_steps,
    }
}

fn unix_timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
