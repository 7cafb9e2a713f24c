use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

const SCENARIOS: [&str; 5] = [
    "scenarios/01_seir_baseline.yaml",
    "scenarios/02_lockdown.yaml",
    "scenarios/03_mitigation.yaml",
    "scenarios/04_sirf_phases.yaml",
    "scenarios/05_sewirf_piecewise.yaml",
];

#[test]
fn scenarios_validate() {
    let root = workspace_root();
    for rel in SCENARIOS {
        let path = root.join(rel);
        let result = ef_project::load_yaml(&path);
        assert!(
            result.is_ok(),
            "scenario failed validation: {} => {:?}",
            path.display(),
            result.err()
        );
    }
}

#[test]
fn scenarios_build_plans() {
    let root = workspace_root();
    for rel in SCENARIOS {
        let scenario = ef_project::load_yaml(&root.join(rel)).unwrap();
        let plan = ef_project::build_plan(&scenario);
        assert!(plan.is_ok(), "{rel}: {:?}", plan.err());
        let plan = plan.unwrap();
        assert_eq!(plan.end(), scenario.grid.end, "{rel}");
        let sweeps = ef_project::sweep_plans(&scenario, &plan).unwrap();
        assert_eq!(
            sweeps.len(),
            scenario.sweep.as_ref().map_or(0, |s| s.values().len()),
            "{rel}"
        );
    }
}

#[test]
fn lockdown_scenario_phases() {
    let scenario = ef_project::load_yaml(&workspace_root().join(SCENARIOS[1])).unwrap();
    let plan = ef_project::build_plan(&scenario).unwrap();
    let phases = plan.phases();
    assert_eq!(phases.len(), 2);
    assert_eq!(phases[0].name, "lockdown");
    assert_eq!((phases[0].start, phases[0].end), (0.0, 30.0));
    assert_eq!(phases[1].parameters.get("r0"), Some(2.0));
}
