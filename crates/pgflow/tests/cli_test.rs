#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use pgflow_mock::{MockApiServer, TEST_TOKEN};
use predicates::prelude::*;
use std::path::Path;

const CONFIG: &str = r#"
project "app" { name "my-project"; }
database "prod" {
    project "app"
    name "production"
}
connection "api" {
    database "prod"
    name "api-key"
}
"#;

fn write_config(dir: &Path, content: &str) {
    std::fs::write(dir.join("pgflow.kdl"), content).unwrap();
}

/// 環境の影響を受けない pgflow コマンド
fn pgflow(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pgflow").unwrap();
    cmd.current_dir(dir)
        .env_remove("PGFLOW_CONFIG_PATH")
        .env_remove("PRISMA_SERVICE_TOKEN")
        .env_remove("PRISMA_API_BASE_URL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd
}

/// モックAPIに向けた pgflow コマンド
fn pgflow_against(dir: &Path, server: &MockApiServer) -> Command {
    let mut cmd = pgflow(dir);
    cmd.args(["--service-token", TEST_TOKEN, "--base-url", server.url()]);
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    pgflow(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Prisma Postgres"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("import"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    pgflow(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pgflow"));
}

#[test]
fn test_invalid_command() {
    let dir = tempfile::tempdir().unwrap();
    pgflow(dir.path()).arg("frobnicate").assert().failure();
}

/// applyコマンドのヘルプに --yes があることを確認
#[test]
fn test_apply_help() {
    let dir = tempfile::tempdir().unwrap();
    pgflow(dir.path())
        .args(["apply", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
}

#[test]
fn test_validate_ok() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), CONFIG);

    pgflow(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("設定ファイルは正常です"))
        .stdout(predicate::str::contains("prod"));
}

#[test]
fn test_validate_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), r#"connection "api" { database "nope"; name "k"; }"#);

    pgflow(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("未宣言の database"));
}

#[test]
fn test_explicit_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("infra");
    std::fs::create_dir_all(&nested).unwrap();
    write_config(&nested, CONFIG);

    pgflow(dir.path())
        .args(["--config", "infra/pgflow.kdl", "validate"])
        .assert()
        .success();
}

#[test]
fn test_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    pgflow(dir.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("設定ファイルが見つかりません"));
}

#[test]
fn test_plan_requires_token() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), CONFIG);

    pgflow(dir.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PRISMA_SERVICE_TOKEN"));
}

#[test]
fn test_state_list_empty() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), CONFIG);

    pgflow(dir.path())
        .args(["state", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("state は空です"));
}

#[test]
fn test_apply_lifecycle_against_mock() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(MockApiServer::start());
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), CONFIG);

    pgflow_against(dir.path(), &server)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 to create"));

    // --yes なしでは何もしない
    pgflow_against(dir.path(), &server)
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
    assert_eq!(server.project_count(), 0);

    pgflow_against(dir.path(), &server)
        .args(["apply", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("適用が完了しました"));
    assert_eq!(server.project_count(), 1);
    assert_eq!(server.database_count(), 1);
    assert_eq!(server.connection_count(), 1);
    assert!(dir.path().join(".pgflow/state.json").exists());

    pgflow_against(dir.path(), &server)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("変更はありません"));

    pgflow(dir.path())
        .args(["state", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("database.prod"))
        .stdout(predicate::str::contains("connection.api"));

    // 機密値は既定で伏せる
    pgflow(dir.path())
        .args(["state", "show", "database.prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(sensitive)"))
        .stdout(predicate::str::contains("db_test1_password").not());

    pgflow(dir.path())
        .args(["state", "show", "database.prod", "--show-sensitive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("db_test1_password"));

    pgflow_against(dir.path(), &server)
        .args(["destroy", "--yes"])
        .assert()
        .success();
    assert_eq!(server.project_count(), 0);

    pgflow(dir.path())
        .args(["state", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("state は空です"));
}

#[test]
fn test_apply_recreates_resources_deleted_remotely() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(MockApiServer::start());
    server.queue_id("project", "proj_gone");
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), CONFIG);

    pgflow_against(dir.path(), &server)
        .args(["apply", "--yes"])
        .assert()
        .success();
    assert_eq!(server.project_count(), 1);

    // コンソールから削除された (子リソースも一緒に消える)
    server.remove_project("proj_gone");
    assert_eq!(server.database_count(), 0);

    // --no-refresh では state を信じるので差分は出ない
    pgflow_against(dir.path(), &server)
        .args(["plan", "--no-refresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("変更はありません"));

    pgflow_against(dir.path(), &server)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("リモートに存在しません"))
        .stdout(predicate::str::contains("3 to create"));

    pgflow_against(dir.path(), &server)
        .args(["apply", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("project:app"))
        .stdout(predicate::str::contains("適用が完了しました"));
    assert_eq!(server.project_count(), 1);
    assert_eq!(server.database_count(), 1);
    assert_eq!(server.connection_count(), 1);

    pgflow(dir.path())
        .args(["state", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("proj_gone").not());
}

#[test]
fn test_apply_without_yes_still_forgets_deleted_resources() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(MockApiServer::start());
    server.queue_id("connection", "conn_gone");
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), CONFIG);

    pgflow_against(dir.path(), &server)
        .args(["apply", "--yes"])
        .assert()
        .success();
    server.remove_connection("conn_gone");

    pgflow_against(dir.path(), &server)
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
    assert_eq!(server.connection_count(), 0);

    pgflow(dir.path())
        .args(["state", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("database.prod"))
        .stdout(predicate::str::contains("connection.api").not());
}

#[test]
fn test_apply_rejects_wrong_token() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(MockApiServer::start_with_token("another-token"));
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), CONFIG);

    pgflow_against(dir.path(), &server)
        .args(["apply", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("認証に失敗しました"));
    assert_eq!(server.project_count(), 0);
    assert!(!dir.path().join(".pgflow/state.json").exists());
}

#[test]
fn test_destroy_single_target() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(MockApiServer::start());
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), CONFIG);

    pgflow_against(dir.path(), &server)
        .args(["apply", "--yes"])
        .assert()
        .success();

    // --yes なしでは対象を表示するだけ
    pgflow_against(dir.path(), &server)
        .args(["destroy", "--target", "connection.api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("connection:api"))
        .stdout(predicate::str::contains("database:prod").not());
    assert_eq!(server.connection_count(), 1);

    pgflow_against(dir.path(), &server)
        .args(["destroy", "--target", "connection.api", "--yes"])
        .assert()
        .success();
    assert_eq!(server.connection_count(), 0);
    assert_eq!(server.database_count(), 1);
    assert_eq!(server.project_count(), 1);

    pgflow(dir.path())
        .args(["state", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("database.prod"))
        .stdout(predicate::str::contains("connection.api").not());

    pgflow_against(dir.path(), &server)
        .args(["destroy", "--target", "connection.api", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("connection.api"));
}

#[test]
fn test_apply_failure_exits_nonzero() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(MockApiServer::start());
    server.respond_with("POST", "/v1/projects", 500, r#"{"error":"boom"}"#);
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), CONFIG);

    pgflow_against(dir.path(), &server)
        .args(["apply", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("3件のアクションが失敗しました"));
}

#[test]
fn test_import_and_state_rm() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(MockApiServer::start());
    server.queue_id("project", "proj_existing");
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), CONFIG);

    // 既存プロジェクトを作っておく
    pgflow_against(dir.path(), &server)
        .args(["apply", "--yes"])
        .assert()
        .success();
    pgflow(dir.path())
        .args(["state", "rm", "project.app"])
        .assert()
        .success();

    pgflow_against(dir.path(), &server)
        .args(["import", "project", "app", "proj_existing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("proj_existing"));

    pgflow_against(dir.path(), &server)
        .args(["import", "project", "app", "proj_existing"])
        .assert()
        .failure();

    pgflow(dir.path())
        .args(["state", "rm", "project.nope"])
        .assert()
        .failure();
}

#[test]
fn test_regions_without_config() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(MockApiServer::start());
    let dir = tempfile::tempdir().unwrap();

    pgflow_against(dir.path(), &server)
        .arg("regions")
        .assert()
        .success()
        .stdout(predicate::str::contains("us-east-1"))
        .stdout(predicate::str::contains("eu-west-3"));
}
