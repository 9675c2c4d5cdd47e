// tests/file_actions.rs

mod common;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sitepipe::actions::{ConcatAction, CopyAction, IncludeAction, IncludeExpander, build_action};
use sitepipe::config::{ActionSpec, ConfigFile};
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::fs::{FileSystem, RealFileSystem};
use sitepipe::task::TaskRegistry;
use sitepipe::watch::{SourceGlob, collect_matching_files, glob_base};

use crate::common::{EventLog, init_tracing, runner_for};

type TestResult = Result<(), Box<dyn Error>>;

fn patterns(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn glob_base_is_the_literal_prefix() {
    assert_eq!(glob_base("src/img/**/*.png"), PathBuf::from("src/img"));
    assert_eq!(glob_base("src/js/main/*.js"), PathBuf::from("src/js/main"));
    assert_eq!(glob_base("src/yml/_config.yml"), PathBuf::from("src/yml"));
    assert_eq!(glob_base("*.html"), PathBuf::from(""));
    assert_eq!(glob_base("./pages/*"), PathBuf::from("pages"));
}

#[test]
fn single_star_stays_inside_one_directory() -> TestResult {
    let glob = SourceGlob::new("_includes/*.html")?;
    assert!(glob.matches("_includes/head.html"));
    assert!(!glob.matches("_includes/partials/head.html"));

    let deep = SourceGlob::new("src/img/**/*")?;
    assert!(deep.matches("src/img/a.png"));
    assert!(deep.matches("src/img/icons/b.svg"));
    Ok(())
}

#[test]
fn collect_walks_only_the_glob_base() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./index.html", "home");
    fs.add_file("./about.html", "about");
    fs.add_file("./_layouts/post.html", "layout");
    fs.add_file("./src/img/a.png", "png");

    let globs = vec![SourceGlob::new("*.html")?];
    let files = collect_matching_files(&fs, Path::new("."), &globs)?;

    let found: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(
        found,
        vec![PathBuf::from("./about.html"), PathBuf::from("./index.html")]
    );
    Ok(())
}

#[test]
fn copy_keeps_paths_relative_to_the_glob_base() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./src/img/a.png", "A");
    fs.add_file("./src/img/icons/b.svg", "B");
    fs.add_file("./src/img/notes.txt", "not an image");

    let action = CopyAction::new(
        ".",
        &patterns(&["src/img/**/*.{jpg,png,gif,svg}"]),
        &["assets/img"],
        Arc::new(fs.clone()),
    )?;

    assert_eq!(action.copy_files()?, 2);
    assert_eq!(fs.read_to_string(Path::new("./assets/img/a.png"))?, "A");
    assert_eq!(fs.read_to_string(Path::new("./assets/img/icons/b.svg"))?, "B");
    assert!(!fs.exists(Path::new("./assets/img/notes.txt")));
    Ok(())
}

#[test]
fn concat_joins_matches_in_path_order() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./src/js/main/b.js", "var b;");
    fs.add_file("./src/js/main/a.js", "var a;");
    fs.add_file("./src/js/main/vendor/c.js", "var c;");
    fs.add_file("./src/js/preview/p.js", "var p;");

    let action = ConcatAction::new(
        ".",
        &patterns(&["src/js/main/**/*.js"]),
        &["assets/js/scripts.min.js"],
        Arc::new(fs.clone()),
    )?;

    assert_eq!(action.concat_files()?, 3);
    assert_eq!(
        fs.read_to_string(Path::new("./assets/js/scripts.min.js"))?,
        "var a;\nvar b;\nvar c;"
    );
    Ok(())
}

#[test]
fn copy_and_concat_write_every_destination() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./src/img/a.png", "A");
    fs.add_file("./src/js/main/a.js", "var a;");

    let copy = CopyAction::new(
        ".",
        &patterns(&["src/img/**/*"]),
        &["assets/img", "_site/assets/img"],
        Arc::new(fs.clone()),
    )?;
    assert_eq!(copy.copy_files()?, 1);
    assert_eq!(fs.read_to_string(Path::new("./assets/img/a.png"))?, "A");
    assert_eq!(fs.read_to_string(Path::new("./_site/assets/img/a.png"))?, "A");

    let concat = ConcatAction::new(
        ".",
        &patterns(&["src/js/main/**/*.js"]),
        &["a.js", "b/a.js"],
        Arc::new(fs.clone()),
    )?;
    assert_eq!(concat.concat_files()?, 1);
    assert_eq!(fs.read_to_string(Path::new("./a.js"))?, "var a;");
    assert_eq!(fs.read_to_string(Path::new("./b/a.js"))?, "var a;");

    let none: [&str; 0] = [];
    assert!(CopyAction::new(".", &patterns(&["*"]), &none, Arc::new(fs)).is_err());
    Ok(())
}

#[tokio::test]
async fn default_main_assets_also_update_the_served_site() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    std::fs::create_dir_all(root.join("src/js/main"))?;
    std::fs::write(root.join("src/js/main/a.js"), "var a;")?;
    std::fs::write(root.join("src/js/main/b.js"), "var b;")?;

    let cfg = ConfigFile::default();
    let spec = cfg.task("mainAssets").ok_or("mainAssets missing")?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let log = EventLog::new();
    let mut registry = TaskRegistry::new();
    let main = registry.register("mainAssets", build_action(&spec.action, root, fs)?)?;
    runner_for(registry, &log).run(main).await?;

    for out in ["assets/js/scripts.min.js", "_site/assets/js/scripts.min.js"] {
        assert_eq!(std::fs::read_to_string(root.join(out))?, "var a;\nvar b;", "{out}");
    }
    Ok(())
}

#[test]
fn concat_without_matches_writes_nothing() -> TestResult {
    let fs = MockFileSystem::new();
    let action = ConcatAction::new(".", &patterns(&["src/js/main/**/*.js"]), &["out.js"], Arc::new(fs.clone()))?;

    assert_eq!(action.concat_files()?, 0);
    assert!(fs.files().is_empty());
    Ok(())
}

#[test]
fn include_expands_nested_directives_with_indentation() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file(
        "./src/yml/_config.yml",
        "title: Blog\nnavigation:\n  #= include parts/nav.yml\nauthor: me\n",
    );
    fs.add_file(
        "./src/yml/parts/nav.yml",
        "- home\n- about\n//= require \"extra.yml\"\n",
    );
    fs.add_file("./src/yml/parts/extra.yml", "- contact\n");

    let action = IncludeAction::new(
        Path::new("."),
        "src/yml/_config.yml",
        "_config.yml",
        Arc::new(fs.clone()),
    )?;
    action.build()?;

    assert_eq!(
        fs.read_to_string(Path::new("./_config.yml"))?,
        "title: Blog\nnavigation:\n  - home\n  - about\n  - contact\nauthor: me\n"
    );
    Ok(())
}

#[test]
fn require_inserts_a_file_only_once() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file(
        "./main.yml",
        "#= require common.yml\n#= require common.yml\n#= include common.yml\n",
    );
    fs.add_file("./common.yml", "shared: true\n");

    let expanded = IncludeExpander::new(Arc::new(fs))?.expand(Path::new("./main.yml"))?;
    assert_eq!(expanded, "shared: true\nshared: true\n");
    Ok(())
}

#[test]
fn include_cycles_and_missing_files_are_errors() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./a.yml", "#= include b.yml\n");
    fs.add_file("./b.yml", "#= include a.yml\n");
    fs.add_file("./c.yml", "#= include missing.yml\n");
    let expander = IncludeExpander::new(Arc::new(fs))?;

    let err = expander.expand(Path::new("./a.yml")).unwrap_err();
    assert!(format!("{err:#}").contains("include cycle"), "{err:#}");

    let err = expander.expand(Path::new("./c.yml")).unwrap_err();
    assert!(format!("{err:#}").contains("missing.yml"), "{err:#}");
    Ok(())
}

#[tokio::test]
async fn configured_actions_run_on_the_real_filesystem() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    std::fs::create_dir_all(root.join("src/js/preview/lib"))?;
    std::fs::write(root.join("src/js/preview/lib/p.js"), "preview()")?;
    std::fs::write(root.join("src/js/preview/readme"), "no extension")?;

    let spec = ActionSpec::Copy {
        src: patterns(&["src/js/preview/**/*.*"]),
        dest: patterns(&["assets/js"]),
    };
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let log = EventLog::new();
    let mut registry = TaskRegistry::new();
    let copy = registry.register("previewAssets", build_action(&spec, root, fs)?)?;
    runner_for(registry, &log).run(copy).await?;

    assert_eq!(
        std::fs::read_to_string(root.join("assets/js/lib/p.js"))?,
        "preview()"
    );
    assert!(!root.join("assets/js/readme").exists());
    Ok(())
}

#[tokio::test]
async fn failing_command_reports_the_leaf() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let log = EventLog::new();
    let mut registry = TaskRegistry::new();
    let ok = registry.register(
        "ok",
        build_action(&ActionSpec::Command { cmd: "echo built".to_string() }, dir.path(), fs.clone())?,
    )?;
    let broken = registry.register(
        "generateSite",
        build_action(&ActionSpec::Command { cmd: "exit 3".to_string() }, dir.path(), fs)?,
    )?;
    let runner = runner_for(registry, &log);

    runner.run(ok).await?;
    let err = runner.run(broken).await.unwrap_err();
    assert_eq!(err.failed_task(), Some("generateSite"));
    assert!(err.to_string().contains("status 3"), "{err}");
    Ok(())
}

#[tokio::test]
async fn failing_command_error_carries_the_end_of_stderr() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cmd = "for i in 1 2 3 4 5 6 7 8 9 10 11 12; do echo \"line $i\" >&2; done; \
               echo 'Liquid Exception: bad tag' >&2; exit 1";

    let log = EventLog::new();
    let mut registry = TaskRegistry::new();
    let site = registry.register(
        "generateSite",
        build_action(&ActionSpec::Command { cmd: cmd.to_string() }, dir.path(), fs)?,
    )?;

    let err = runner_for(registry, &log).run(site).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("status 1"), "{message}");
    assert!(message.contains("Liquid Exception: bad tag"), "{message}");
    assert!(message.contains("line 12"), "{message}");
    // Only the tail is kept.
    assert!(!message.contains("line 3\n"), "{message}");
    Ok(())
}
