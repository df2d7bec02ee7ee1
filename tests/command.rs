use {super::*, pretty_assertions::assert_eq, std::process::Command};

fn doge20(args: &[&str]) -> std::process::Output {
  Command::new(env!("CARGO_BIN_EXE_doge20"))
    .args(args)
    .env_remove("DOGE20_EXPLORER_URL")
    .output()
    .unwrap()
}

#[test]
fn version_flag_prints_version() {
  let output = doge20(&["--version"]);
  assert!(output.status.success());
  assert!(String::from_utf8(output.stdout).unwrap().starts_with("doge20 "));
}

#[test]
fn status_prints_checkpoints() {
  let tempdir = tempfile::tempdir().unwrap();

  let output = doge20(&[
    "--regtest",
    "--data-dir",
    tempdir.path().to_str().unwrap(),
    "--format",
    "minify",
    "status",
  ]);

  assert!(output.status.success());

  let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

  assert_eq!(status["chain"], "dogecoin-regtest");
  assert_eq!(
    status["checkpoints"],
    serde_json::json!({
      "drc20": null,
      "fetch-blocks": null,
      "inscription-transfers": null,
      "startup": null,
    })
  );
}

#[test]
fn index_requires_explorer() {
  let tempdir = tempfile::tempdir().unwrap();

  let output = doge20(&[
    "--regtest",
    "--data-dir",
    tempdir.path().to_str().unwrap(),
    "--end-block",
    "1",
    "--provider-retries",
    "1",
    "--failure-wait-ms",
    "0",
    "index",
    "--stage",
    "fetch-blocks",
  ]);

  assert!(!output.status.success());
  assert!(
    String::from_utf8(output.stderr)
      .unwrap()
      .contains("explorer")
  );
}
