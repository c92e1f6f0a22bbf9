//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use quire::domain::{Component, Issue, Project, Release};
use quire_record::FieldValues;
use std::path::Path;
use std::process::{Command, Output};

/// Actor used throughout the tests.
pub const WHO: &str = "Ann <ann@example.com>";

/// Run the quire binary in the specified directory, without colors.
pub fn run_quire_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_quire"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("QUIRE_USER")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute quire binary")
}

/// Run quire and assert success, returning stdout.
pub fn quire_ok(dir: &Path, args: &[&str]) -> String {
    let output = run_quire_in_dir(dir, args);
    assert!(
        output.status.success(),
        "quire {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Run quire and assert failure, returning stderr.
pub fn quire_err(dir: &Path, args: &[&str]) -> String {
    let output = run_quire_in_dir(dir, args);
    assert!(
        !output.status.success(),
        "quire {args:?} unexpectedly succeeded: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Initialize a repository for project "demo" with component "core".
pub fn init_repo(dir: &Path) {
    quire_ok(
        dir,
        &[
            "init",
            "--project",
            "demo",
            "--components",
            "core",
            "--name",
            "Ann",
            "--email",
            "ann@example.com",
            "--quiet",
        ],
    );
}

/// Project "demo" with the given components.
pub fn project_with(components: &[&str]) -> Project {
    let mut project = Project::new("demo").unwrap();
    for name in components {
        project.add_component(Component::new(name).unwrap()).unwrap();
    }
    project
}

/// Add a release to `project`.
pub fn add_release(project: &mut Project, name: &str) {
    project
        .add_release(Release::new(name, WHO, None).unwrap())
        .unwrap();
}

/// Create an issue in `component` and add it to `project`, returning its id.
pub fn add_issue(project: &mut Project, component: &str, title: &str, kind: &str) -> String {
    let context = project.issue_context(WHO);
    let issue = Issue::create(
        &FieldValues::new()
            .with("title", title)
            .with("desc", "")
            .with("type", kind)
            .with("component", component),
        &context,
        None,
    )
    .unwrap();
    project.add_issue(issue).unwrap().id().to_string()
}
