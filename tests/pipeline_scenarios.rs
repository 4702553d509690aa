// tests/pipeline_scenarios.rs
//!
//! 端到端流水线场景测试

use fluid_volume_backend::{
    Pipeline, PipelineError, PipelineOptions, PipelineStage, SourceNames, ThermodynamicModel,
    process_fluid_data, resolve_model,
};
use serde_json::{Value, json};

const GAMMA: f64 = 1.4;
const R: f64 = 287.0;
const RHO0: f64 = 1.225;

/// 沿 x 排列的一维网格，grid_shape = [1, 1, n]
fn line_simulation(pressure_history: Vec<Vec<f64>>) -> Value {
    let n = pressure_history[0].len();
    let coords: Vec<Value> = (0..n).map(|i| json!([i as f64, 0.0, 0.0])).collect();
    let velocity: Vec<Value> = pressure_history
        .iter()
        .enumerate()
        .map(|(t, _)| {
            let rows: Vec<Value> = (0..n).map(|i| json!([t as f64, i as f64, -1.0])).collect();
            Value::Array(rows)
        })
        .collect();
    let time_points: Vec<f64> = (0..pressure_history.len()).map(|t| t as f64 * 0.01).collect();
    json!({
        "time_points": time_points,
        "mesh_info": {
            "nodes": n,
            "nodes_coords": coords,
            "grid_shape": [1, 1, n],
            "dx": 1.0, "dy": 1.0, "dz": 1.0
        },
        "velocity_history": velocity,
        "pressure_history": pressure_history
    })
}

fn ideal_gas_initial() -> Value {
    json!({
        "fluid_properties": {
            "density": RHO0,
            "viscosity": 1.81e-5,
            "thermodynamics": {
                "model": "ideal_gas",
                "specific_gas_constant_J_per_kgK": R,
                "adiabatic_index_gamma": GAMMA
            }
        },
        "boundary_conditions": {},
        "simulation_parameters": {"time_step": 0.01, "total_time": 1.0, "solver": "explicit"}
    })
}

fn incompressible_initial(density: f64) -> Value {
    json!({"fluid_properties": {"density": density, "thermodynamics": {"model": "incompressible"}}})
}

fn sources() -> SourceNames {
    SourceNames::new("navier_stokes_results.json", "initial_data.json")
}

fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-5 * expected.abs().max(1e-12);
    assert!(
        (actual - expected).abs() <= tolerance,
        "actual {actual} expected {expected}"
    );
}

#[test]
fn scenario_a_ideal_gas_matches_closed_form() {
    let pressures = vec![101325.0, 202650.0, 405300.0];
    let document = process_fluid_data(
        &line_simulation(vec![pressures.clone()]),
        &ideal_gas_initial(),
        &sources(),
    )
    .unwrap();

    let mean = pressures.iter().sum::<f64>() / 3.0;
    let c = mean / RHO0.powf(GAMMA);
    let step = &document.time_steps[0];
    for (i, p) in pressures.iter().enumerate() {
        let rho = (p / c).powf(1.0 / GAMMA);
        assert_close(step.density[i], rho);
        assert_close(step.temperature[i], p / (rho * R));
    }
    assert_eq!(document.grid_info.dimensions, [3, 1, 1]);
    assert_eq!(document.grid_info.voxel_size, [1.0, 1.0, 1.0]);
    assert_eq!(document.grid_info.origin, [0.0, 0.0, 0.0]);
}

#[test]
fn scenario_b_node_count_mismatch_produces_nothing() {
    let mut simulation = line_simulation(vec![vec![1.0; 10]]);
    simulation["mesh_info"]["grid_shape"] = json!([1, 2, 5]);
    simulation["mesh_info"]["nodes_coords"]
        .as_array_mut()
        .unwrap()
        .pop();

    let mut pipeline = Pipeline::new(PipelineOptions::default());
    let err = pipeline
        .run(&simulation, &ideal_gas_initial(), &sources())
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::DimensionMismatch {
            field: "mesh_info.nodes_coords".into(),
            expected: 10,
            actual: 9,
        }
    );
    assert_eq!(pipeline.stage(), PipelineStage::Aborted);
}

#[test]
fn scenario_c_empty_initial_pressure_cannot_resolve_reference_constant() {
    let err = resolve_model(&ideal_gas_initial(), &[vec![], vec![1.0, 2.0]]).unwrap_err();
    match err {
        PipelineError::ThermodynamicModel { reason } => {
            assert!(reason.contains("cannot calculate reference constant"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // 完整流水线中首个空时间步在校验阶段即被拒绝，不会进入派生
    let mut simulation = line_simulation(vec![vec![1.0, 2.0], vec![1.0, 2.0]]);
    simulation["pressure_history"][0] = json!([]);
    let mut pipeline = Pipeline::new(PipelineOptions::default());
    assert!(pipeline.run(&simulation, &ideal_gas_initial(), &sources()).is_err());
    assert!(
        pipeline
            .report()
            .timings
            .iter()
            .all(|t| t.stage != PipelineStage::DerivingSteps)
    );
}

#[test]
fn scenario_d_unsupported_model_aborts_before_derivation() {
    let mut initial = ideal_gas_initial();
    initial["fluid_properties"]["thermodynamics"]["model"] = json!("compressible_liquid");

    let mut pipeline = Pipeline::new(PipelineOptions::default());
    let err = pipeline
        .run(&line_simulation(vec![vec![1.0, 2.0]]), &initial, &sources())
        .unwrap_err();
    assert_eq!(err.kind(), "thermodynamic_model");
    assert!(err.to_string().contains("compressible_liquid"));
    assert_eq!(pipeline.stage(), PipelineStage::Aborted);
    assert!(pipeline.report().model.is_none());
}

#[test]
fn scenario_e_empty_step_keeps_its_slot() {
    let mut simulation = line_simulation(vec![vec![1.0e5; 3]; 4]);
    simulation["velocity_history"][2] = json!([]);

    let mut pipeline = Pipeline::new(PipelineOptions::default());
    let document = pipeline
        .run(&simulation, &ideal_gas_initial(), &sources())
        .unwrap();
    assert_eq!(document.time_steps.len(), 4);
    for (t, step) in document.time_steps.iter().enumerate() {
        assert_eq!(step.frame_index, t);
        assert_eq!(step.is_empty(), t == 2);
    }
    assert_eq!(pipeline.report().empty_steps, vec![2]);
    assert_eq!(pipeline.stage(), PipelineStage::Done);
}

#[test]
fn incompressible_density_is_constant_everywhere() {
    let simulation = line_simulation(vec![vec![5.0, -3.0, 0.0], vec![1.0e6, 2.0, 3.0]]);
    let document = process_fluid_data(&simulation, &incompressible_initial(998.2), &sources())
        .unwrap();
    for step in &document.time_steps {
        assert!(step.density.iter().all(|&rho| rho == 998.2));
        assert!(step.temperature.iter().all(|&t| t == 0.0));
    }
}

#[test]
fn every_step_has_one_value_per_node() {
    let simulation = line_simulation(vec![vec![1.0e5, 2.0e5, 3.0e5, 4.0e5]; 3]);
    let document = process_fluid_data(&simulation, &ideal_gas_initial(), &sources()).unwrap();
    assert_eq!(document.time_steps.len(), 3);
    for step in &document.time_steps {
        assert_eq!(step.density.len(), 4);
        assert_eq!(step.velocity.len(), 4);
        assert_eq!(step.temperature.len(), 4);
    }
    assert_eq!(document.time_steps[1].velocity[3], [1.0, 3.0, -1.0]);
}

#[test]
fn noisy_pressure_never_emits_nan_or_negative() {
    let simulation = line_simulation(vec![
        vec![1.0e5, 1.0e5, 1.0e5],
        vec![-250.0, 0.0, 1.0e-12],
    ]);
    let document = process_fluid_data(&simulation, &ideal_gas_initial(), &sources()).unwrap();
    for step in &document.time_steps {
        for value in step.density.iter().chain(&step.temperature) {
            assert!(value.is_finite() && *value >= 0.0);
        }
    }
}

#[test]
fn reshape_failure_aborts_whole_pipeline() {
    let mut simulation = line_simulation(vec![vec![1.0e5; 3]; 3]);
    simulation["pressure_history"][1] = json!([1.0e5, 1.0e5]);

    for parallel in [false, true] {
        let mut pipeline = Pipeline::new(PipelineOptions {
            parallel,
            ..Default::default()
        });
        let err = pipeline
            .run(&simulation, &ideal_gas_initial(), &sources())
            .unwrap_err();
        assert!(matches!(err, PipelineError::StepComputation { index: 1, .. }));
        assert_eq!(pipeline.stage(), PipelineStage::Aborted);
    }
}

#[test]
fn rerun_is_idempotent() {
    let simulation = line_simulation(vec![vec![1.0e5, 1.1e5, 1.2e5], vec![0.9e5, 1.0e5, 1.3e5]]);
    let first = process_fluid_data(&simulation, &ideal_gas_initial(), &sources()).unwrap();
    let second = process_fluid_data(&simulation, &ideal_gas_initial(), &sources()).unwrap();
    assert_eq!(first.time_steps, second.time_steps);
    assert_eq!(first.grid_info, second.grid_info);
}

#[test]
fn output_serializes_with_document_keys() {
    let document = process_fluid_data(
        &line_simulation(vec![vec![1.0e5; 2]]),
        &ideal_gas_initial(),
        &sources(),
    )
    .unwrap();
    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(value["volume_name"], "FluidVolume");
    assert_eq!(value["metadata"]["source_navier_stokes"], "navier_stokes_results.json");
    assert_eq!(value["metadata"]["source_initial_data"], "initial_data.json");
    assert!(value["metadata"]["generated_timestamp"].is_string());
    let step = &value["time_steps"][0];
    for key in ["time", "frame", "density_data", "velocity_data", "temperature_data"] {
        assert!(step.get(key).is_some(), "missing {key}");
    }
    assert_eq!(step["velocity_data"][1], json!([0.0, 1.0, -1.0]));
}

#[test]
fn resolved_model_is_reported() {
    let mut pipeline = Pipeline::new(PipelineOptions::default());
    pipeline
        .run(
            &line_simulation(vec![vec![2.0e5, 4.0e5]]),
            &ideal_gas_initial(),
            &sources(),
        )
        .unwrap();
    match pipeline.report().model {
        Some(ThermodynamicModel::IdealGas {
            reference_constant, ..
        }) => assert_close(reference_constant, 3.0e5 / RHO0.powf(GAMMA)),
        other => panic!("unexpected model: {other:?}"),
    }
}

#[test]
fn zero_width_velocity_rows_keep_the_step_slot() {
    let mut simulation = line_simulation(vec![vec![1.0e5; 2]; 2]);
    simulation["velocity_history"][1] = json!([[], []]);

    let mut pipeline = Pipeline::new(PipelineOptions::default());
    let document = pipeline
        .run(&simulation, &ideal_gas_initial(), &sources())
        .unwrap();
    assert_eq!(document.time_steps.len(), 2);
    assert!(!document.time_steps[0].is_empty());
    assert!(document.time_steps[1].is_empty());
    assert_eq!(pipeline.report().empty_steps, vec![1]);
}
