//! CFD 结果后处理：将节点速度/压力时间序列转换为体数据文档
//! （每个体素每个时间步的密度、速度、温度），并通过 HTTP 服务提供。

pub mod app_state;
pub mod config;
pub mod dataset;
pub mod derivation;
pub mod error;
pub mod handlers;
pub mod logger;
pub mod performance;
pub mod pipeline;
pub mod readers;
pub mod routes;
pub mod task;
pub mod thermo;
pub mod utils;

pub use dataset::{GridShape, SimulationDataset, validate_simulation};
pub use derivation::{DerivedTimeStep, StepOutcome, derive_time_step};
pub use error::{LoadError, PipelineError, PipelineResult};
pub use pipeline::{
    Pipeline, PipelineOptions, PipelineStage, SourceNames, VolumetricDocument, process_fluid_data,
};
pub use thermo::{ThermodynamicModel, resolve_model};
