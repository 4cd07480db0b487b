use jsonschema::validator_for;
use test_support::{fixture_path, report_cmd, tempdir};

fn read_schema(name: &str) -> serde_json::Value {
  let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
  let path = manifest_dir.join("tests").join("schemas").join(name);
  let data = std::fs::read(&path).expect("schema file");
  serde_json::from_slice(&data).expect("valid schema JSON")
}

fn compile_schema(name: &str) -> jsonschema::Validator {
  let schema = read_schema(name);
  validator_for(&schema).expect("compile schema")
}

#[test]
fn run_manifest_conforms_to_schema() {
  let td = tempdir();
  let out = report_cmd()
    .args([
      "--config",
      &fixture_path("config.json"),
      "--issues-file",
      &fixture_path("issues.json"),
      "--out",
      &td.path().to_string_lossy(),
    ])
    .output()
    .unwrap();
  assert!(out.status.success());

  let data = std::fs::read(td.path().join("manifest.json")).unwrap();
  let v: serde_json::Value = serde_json::from_slice(&data).unwrap();

  let compiled = compile_schema("run-manifest.schema.json");
  compiled.validate(&v).expect("schema validation failed for run manifest");
}

#[test]
fn dry_run_plan_conforms_to_schema() {
  let out = report_cmd()
    .args([
      "--config",
      &fixture_path("config_last_week.json"),
      "--dry-run",
      "--now-override",
      "2025-11-12T09:00:00Z",
    ])
    .output()
    .unwrap();
  assert!(out.status.success());

  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  let compiled = compile_schema("run-manifest.schema.json");
  compiled.validate(&v).expect("schema validation failed for dry-run plan");
}
