use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ripp(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ripp").unwrap();
    cmd.current_dir(dir.path()).env("RIPP_ROOT", dir.path());
    cmd
}

fn init_project(dir: &TempDir) {
    ripp(dir).arg("init").assert().success();
}

/// Small express-style tree with enough signals for every evidence category.
fn seed_source_tree(dir: &TempDir) {
    std::fs::write(
        dir.path().join("package.json"),
        concat!(
            "{\n",
            "  \"name\": \"demo\",\n",
            "  \"dependencies\": {\n",
            "    \"express\": \"^4.18.2\"\n",
            "  }\n",
            "}\n"
        ),
    )
    .unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(
        dir.path().join("src/routes.js"),
        "app.get('/users', listUsers);\napp.post('/sessions', createSession);\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("src/auth.js"),
        "const token = jwt.sign(payload, secret);\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("src/jobs.js"),
        "queue.push(job);\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("schema.sql"),
        "CREATE TABLE users (id SERIAL PRIMARY KEY);\n",
    )
    .unwrap();
}

fn accept_all_checklist_boxes(dir: &TempDir) {
    let path = dir.path().join(".ripp/checklist.md");
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replace("- [ ]", "- [x]")).unwrap();
}

// ---------------------------------------------------------------------------
// ripp init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_directory_tree() {
    let dir = TempDir::new().unwrap();
    ripp(&dir).arg("init").assert().success();

    assert!(dir.path().join(".ripp").is_dir());
    assert!(dir.path().join(".ripp/evidence").is_dir());
    assert!(dir.path().join(".ripp/packets").is_dir());
    assert!(dir.path().join(".ripp/config.yaml").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    ripp(&dir).arg("init").assert().success();
    ripp(&dir).arg("init").assert().success();
}

// ---------------------------------------------------------------------------
// ripp evidence
// ---------------------------------------------------------------------------

#[test]
fn evidence_build_requires_init() {
    let dir = TempDir::new().unwrap();
    ripp(&dir)
        .args(["evidence", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn evidence_build_writes_pack_and_index() {
    let dir = TempDir::new().unwrap();
    seed_source_tree(&dir);
    init_project(&dir);

    ripp(&dir)
        .args(["evidence", "build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Evidence pack written"));

    assert!(dir.path().join(".ripp/evidence/pack.yaml").exists());
    assert!(dir.path().join(".ripp/evidence/index.yaml").exists());

    ripp(&dir)
        .args(["evidence", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Content hash"));
}

#[test]
fn evidence_build_json_output() {
    let dir = TempDir::new().unwrap();
    seed_source_tree(&dir);
    init_project(&dir);

    let output = ripp(&dir)
        .args(["--json", "evidence", "build"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(parsed["counts"]["routes"].as_u64().unwrap() >= 2);
    assert!(parsed["counts"]["dependencies"].as_u64().unwrap() >= 1);
}

// ---------------------------------------------------------------------------
// ripp discover
// ---------------------------------------------------------------------------

#[test]
fn discover_requires_evidence_pack() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    ripp(&dir)
        .arg("discover")
        .assert()
        .failure()
        .stderr(predicate::str::contains("evidence"));
}

#[test]
fn discover_writes_candidates_and_checklist() {
    let dir = TempDir::new().unwrap();
    seed_source_tree(&dir);
    init_project(&dir);
    ripp(&dir).args(["evidence", "build"]).assert().success();

    ripp(&dir)
        .arg("discover")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checklist written"));

    assert!(dir.path().join(".ripp/candidates.yaml").exists());
    let checklist = std::fs::read_to_string(dir.path().join(".ripp/checklist.md")).unwrap();
    assert!(checklist.contains("# RIPP Discovery Checklist"));
    assert!(checklist.contains("api_contracts"));
    assert!(checklist.contains("permissions"));
    assert!(checklist.contains("- [ ] Accept?"));
}

#[test]
fn discover_rejects_bad_level() {
    let dir = TempDir::new().unwrap();
    seed_source_tree(&dir);
    init_project(&dir);
    ripp(&dir).args(["evidence", "build"]).assert().success();

    ripp(&dir)
        .args(["discover", "--level", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("target level"));
}

// ---------------------------------------------------------------------------
// ripp checklist
// ---------------------------------------------------------------------------

#[test]
fn checklist_parse_skips_unchecked_blocks() {
    let dir = TempDir::new().unwrap();
    seed_source_tree(&dir);
    init_project(&dir);
    ripp(&dir).args(["evidence", "build"]).assert().success();
    ripp(&dir).arg("discover").assert().success();

    // Nothing checked yet
    ripp(&dir)
        .args(["checklist", "parse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Accepted 0 block(s)"));

    ripp(&dir)
        .args(["checklist", "parse", "--write"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no accepted blocks"));
}

#[test]
fn checklist_parse_write_persists_confirmed_artifact() {
    let dir = TempDir::new().unwrap();
    seed_source_tree(&dir);
    init_project(&dir);
    ripp(&dir).args(["evidence", "build"]).assert().success();
    ripp(&dir).arg("discover").assert().success();
    accept_all_checklist_boxes(&dir);

    ripp(&dir)
        .args(["checklist", "parse", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Confirmed artifact written"));
    assert!(dir.path().join(".ripp/confirmed.yaml").exists());
}

// ---------------------------------------------------------------------------
// ripp build / validate (full pipeline)
// ---------------------------------------------------------------------------

#[test]
fn full_pipeline_produces_valid_level2_packet() {
    let dir = TempDir::new().unwrap();
    seed_source_tree(&dir);
    init_project(&dir);
    ripp(&dir).args(["evidence", "build"]).assert().success();
    ripp(&dir).arg("discover").assert().success();
    accept_all_checklist_boxes(&dir);

    ripp(&dir)
        .args(["build", "user-directory", "--from-checklist"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Level: 2"));

    let packet = dir.path().join(".ripp/packets/user-directory.ripp.yaml");
    assert!(packet.exists());
    assert!(dir
        .path()
        .join(".ripp/packets/user-directory.ripp.md")
        .exists());

    ripp(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn build_rejects_invalid_packet_id() {
    let dir = TempDir::new().unwrap();
    seed_source_tree(&dir);
    init_project(&dir);

    ripp(&dir)
        .args(["build", "Bad_Id", "--from-checklist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid packet id"));
}

#[test]
fn build_without_accepted_blocks_writes_nothing() {
    let dir = TempDir::new().unwrap();
    seed_source_tree(&dir);
    init_project(&dir);
    ripp(&dir).args(["evidence", "build"]).assert().success();
    ripp(&dir).arg("discover").assert().success();
    // Checklist left unchecked

    ripp(&dir)
        .args(["build", "user-directory", "--from-checklist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to compile"));
    assert!(!dir
        .path()
        .join(".ripp/packets/user-directory.ripp.yaml")
        .exists());
}

#[test]
fn validate_flags_broken_packet() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    // Missing required fields (purpose among them)
    std::fs::write(
        dir.path().join(".ripp/packets/broken.ripp.yaml"),
        "ripp_version: '1.0'\npacket_id: broken\ntitle: Broken\nlevel: 1\nstatus: draft\n",
    )
    .unwrap();

    ripp(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed validation"));
}

#[test]
fn validate_with_no_packets_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    ripp(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no packet files"));
}
