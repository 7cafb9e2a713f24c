//! Schema migration framework.

use crate::ProjectError;
use crate::schema::ScenarioDef;

pub const LATEST_VERSION: u32 = 2;

pub fn migrate_to_latest(mut scenario: ScenarioDef) -> Result<ScenarioDef, ProjectError> {
    while scenario.version < LATEST_VERSION {
        scenario = migrate_one_version(scenario)?;
    }
    Ok(scenario)
}

fn migrate_one_version(scenario: ScenarioDef) -> Result<ScenarioDef, ProjectError> {
    match scenario.version {
        0 => migrate_v0_to_v1(scenario),
        1 => migrate_v1_to_v2(scenario),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

fn migrate_v0_to_v1(mut scenario: ScenarioDef) -> Result<ScenarioDef, ProjectError> {
    scenario.version = 1;
    Ok(scenario)
}

/// Version 1 files used `SIR` for the exposed/infected model driven by
/// `r0`. From version 2 on that model is `SEIR` and `SIR` is the
/// two-compartment variant.
fn migrate_v1_to_v2(mut scenario: ScenarioDef) -> Result<ScenarioDef, ProjectError> {
    let label: String = scenario
        .model
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase();
    if label == "SIR" {
        let has_exposed = scenario
            .initial
            .values
            .keys()
            .any(|k| k.eq_ignore_ascii_case("exposed"));
        let uses_r0 = scenario.parameters.contains_key("r0")
            || scenario.phases.iter().any(|p| p.parameters.contains_key("r0"));
        if has_exposed || uses_r0 {
            scenario.model = "SEIR".to_string();
        }
    }
    scenario.version = 2;
    Ok(scenario)
}
