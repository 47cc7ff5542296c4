use std::io::Write;
use std::process::Command;

fn run_agentmap(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_agentmap"))
        .args(args)
        .output()
        .expect("failed to run agentmap binary")
}

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f
}

const HEADER: &str =
    "GraphName,Node,AgentType,Input_Fields,Output_Field,Edge,Success_Next,Failure_Next,Prompt,Description,Context\n";

#[test]
fn cli_help_succeeds() {
    let out = run_agentmap(&["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("AgentMap"));
}

#[test]
fn validate_csv_accepts_a_well_formed_graph() {
    let csv = format!(
        "{HEADER}flow,A,Echo,msg,msg,B,,,,,\nflow,B,Default,msg,out,,,,,,\n"
    );
    let f = write_csv(&csv);
    let out = run_agentmap(&["validate-csv", "--csv", f.path().to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("graph 'flow'"));
}

#[test]
fn validate_csv_rejects_an_unknown_edge_target() {
    let csv = format!("{HEADER}flow,A,Echo,,,,Ghost,,,,\n");
    let f = write_csv(&csv);
    let out = run_agentmap(&["validate-csv", "--csv", f.path().to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(!String::from_utf8_lossy(&out.stderr).is_empty());
}

#[test]
fn run_executes_a_linear_graph_and_prints_json_state() {
    let csv = format!(
        "{HEADER}flow,A,Echo,msg,msg,B,,,,,\nflow,B,Echo,msg,out,,,,,,\n"
    );
    let f = write_csv(&csv);
    let out = run_agentmap(&[
        "run",
        "--csv",
        f.path().to_str().unwrap(),
        "--state",
        "{\"msg\": \"hi\"}",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("\"state\""));
    assert!(stdout.contains("\"summary\""));
}

#[test]
fn compile_writes_a_bundle_and_a_src_sidecar() {
    let csv = format!("{HEADER}flow,A,Echo,,,,,,,,\n");
    let f = write_csv(&csv);
    let out_dir = tempfile::tempdir().unwrap();
    let bundle_path = out_dir.path().join("flow.bundle.json");
    let out = run_agentmap(&[
        "compile",
        "--csv",
        f.path().to_str().unwrap(),
        "--out",
        bundle_path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(bundle_path.exists());
    assert!(bundle_path.with_extension("src").exists());
}

#[test]
fn scaffold_writes_a_runnable_starter_csv() {
    let out_dir = tempfile::tempdir().unwrap();
    let csv_path = out_dir.path().join("starter.csv");
    let out = run_agentmap(&["scaffold", "--out", csv_path.to_str().unwrap(), "--graph", "demo"]);
    assert!(out.status.success());
    assert!(csv_path.exists());

    let validate = run_agentmap(&["validate-csv", "--csv", csv_path.to_str().unwrap()]);
    assert!(validate.status.success(), "stderr: {}", String::from_utf8_lossy(&validate.stderr));
}

#[test]
fn validate_csv_requires_an_explicit_graph_choice_when_ambiguous() {
    let csv = format!("{HEADER}a,X,Echo,,,,,,,,\nb,Y,Echo,,,,,,,,\n");
    let f = write_csv(&csv);
    let out = run_agentmap(&["validate-csv", "--csv", f.path().to_str().unwrap()]);
    // validate-csv checks every graph in the file regardless of ambiguity,
    // unlike run/compile which need a single selected graph.
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("graph 'a'"));
    assert!(stdout.contains("graph 'b'"));
}

#[test]
fn config_prints_effective_defaults_as_json() {
    let out = run_agentmap(&["config"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("output_validation"));
    assert!(stdout.contains("success_policy"));
}
