// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use sitepipe::config::{
    ActionSpec, ConfigFile, default_config_path, load_and_validate, load_or_default,
};
use sitepipe::errors::SitepipeError;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<(tempfile::TempDir, PathBuf), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Sitepipe.toml");
    fs::write(&path, contents)?;
    Ok((dir, path))
}

fn config_error(contents: &str) -> String {
    let (_dir, path) = write_config(contents).expect("temp config");
    match load_and_validate(&path) {
        Err(SitepipeError::ConfigError(msg)) => msg,
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn defaults_describe_the_stock_pipeline() {
    let cfg = ConfigFile::default();

    assert_eq!(cfg.server.address(), "127.0.0.1:3000");
    assert_eq!(cfg.server.root, PathBuf::from("_site"));
    assert_eq!(cfg.watch.debounce_ms, 50);
    assert_eq!(cfg.watch.images, vec!["src/img/**/*"]);
    assert_eq!(cfg.watch.content.len(), 7);

    assert_eq!(
        cfg.task("generateSite").map(|t| &t.action),
        Some(&ActionSpec::Command {
            cmd: "bundle exec jekyll build".to_string()
        })
    );
    assert_eq!(
        cfg.task("config").map(|t| &t.action),
        Some(&ActionSpec::Include {
            src: "src/yml/_config.yml".to_string(),
            dest: "_config.yml".to_string(),
        })
    );
    assert_eq!(
        cfg.task("mainAssets").and_then(|t| t.message.as_deref()),
        Some("Building JS files...")
    );
    assert_eq!(
        cfg.task("mainAssets").map(|t| &t.action),
        Some(&ActionSpec::Concat {
            src: vec!["src/js/main/**/*.js".to_string()],
            dest: vec![
                "assets/js/scripts.min.js".to_string(),
                "_site/assets/js/scripts.min.js".to_string(),
            ],
        })
    );
    assert_eq!(cfg.tasks().count(), 5);
}

#[test]
fn bundled_script_follows_the_served_root() -> TestResult {
    let (_dir, path) = write_config("[server]\nroot = \"public\"\n")?;
    let cfg = load_and_validate(&path)?;

    let Some(ActionSpec::Concat { dest, .. }) = cfg.task("mainAssets").map(|t| &t.action) else {
        panic!("mainAssets should concat");
    };
    assert_eq!(dest, &vec![
        "assets/js/scripts.min.js".to_string(),
        "public/assets/js/scripts.min.js".to_string(),
    ]);
    Ok(())
}

#[test]
fn dest_accepts_a_list_for_copy_and_concat() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[task.previewAssets]
action = "copy"
src = ["src/js/preview/**/*.js"]
dest = ["assets/js", "_site/assets/js"]
"#,
    )?;
    let cfg = load_and_validate(&path)?;
    assert_eq!(
        cfg.task("previewAssets").map(|t| &t.action),
        Some(&ActionSpec::Copy {
            src: vec!["src/js/preview/**/*.js".to_string()],
            dest: vec!["assets/js".to_string(), "_site/assets/js".to_string()],
        })
    );
    Ok(())
}

#[test]
fn empty_file_is_the_default_configuration() -> TestResult {
    let (_dir, path) = write_config("")?;
    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.server.port, 3000);
    assert_eq!(cfg.task("images"), ConfigFile::default().task("images"));
    Ok(())
}

#[test]
fn sections_override_defaults() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[server]
port = 4000
root = "public"

[watch]
debounce_ms = 120
content = ["*.md"]

[task.generateSite]
cmd = "hugo"
message = "Building Hugo..."

[task.images]
action = "copy"
src = ["media/**/*.webp"]
dest = "static/media"
"#,
    )?;
    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.server.address(), "127.0.0.1:4000");
    assert_eq!(cfg.server.root, PathBuf::from("public"));
    assert_eq!(cfg.watch.debounce_ms, 120);
    assert_eq!(cfg.watch.content, vec!["*.md"]);
    assert_eq!(cfg.watch.styles, vec!["_sass/**/*.scss"]);

    let site = cfg.task("generateSite").ok_or("generateSite missing")?;
    assert_eq!(site.action, ActionSpec::Command { cmd: "hugo".to_string() });
    assert_eq!(site.message.as_deref(), Some("Building Hugo..."));

    let images = cfg.task("images").ok_or("images missing")?;
    assert_eq!(
        images.action,
        ActionSpec::Copy {
            src: vec!["media/**/*.webp".to_string()],
            dest: vec!["static/media".to_string()],
        }
    );
    assert_eq!(images.message, None);

    // Untouched leaves keep their defaults.
    assert_eq!(cfg.task("config"), ConfigFile::default().task("config"));
    Ok(())
}

#[test]
fn invalid_sections_are_rejected() {
    assert!(config_error("[task.deploy]\ncmd = \"rsync\"\n").contains("deploy"));
    assert!(config_error("[task.images]\naction = \"copy\"\ndest = \"x\"\n").contains("src"));
    assert!(config_error("[task.images]\naction = \"copy\"\nsrc = [\"a/*\"]\n").contains("dest"));
    assert!(config_error("[task.generateSite]\naction = \"command\"\n").contains("cmd"));
    assert!(config_error("[task.config]\nmessage = \"hi\"\n").contains("action"));
    assert!(
        config_error("[task.config]\naction = \"include\"\nsrc = [\"a\", \"b\"]\ndest = \"c\"\n")
            .contains("exactly one")
    );
    assert!(config_error("[task.images]\naction = \"copy\"\nsrc = [\"a/*\"]\ndest = []\n").contains("dest"));
    assert!(
        config_error("[task.config]\naction = \"include\"\nsrc = [\"a\"]\ndest = [\"b\", \"c\"]\n")
            .contains("exactly one `dest`")
    );
    assert!(config_error("[watch]\ndebounce_ms = 0\n").contains("debounce_ms"));
    assert!(config_error("[watch]\nstyles = []\n").contains("styles"));
    assert!(config_error("[watch]\nimages = [\"src/[\"]\n").contains("images"));
    assert!(config_error("[task.mainAssets]\naction = \"concat\"\nsrc = [\"{a\"]\ndest = \"b\"\n")
        .contains("mainAssets"));
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    let (_dir, path) = write_config("[server\nport = 1")?;
    assert!(matches!(
        load_and_validate(&path),
        Err(SitepipeError::TomlError(_))
    ));

    let (_dir, path) = write_config("[task.images]\naction = \"resize\"\n")?;
    assert!(matches!(
        load_and_validate(&path),
        Err(SitepipeError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn missing_file_falls_back_to_defaults_unless_explicit() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Sitepipe.toml");

    let cfg = load_or_default(&path, false)?;
    assert_eq!(cfg.server.port, 3000);

    assert!(matches!(
        load_or_default(&path, true),
        Err(SitepipeError::ConfigError(_))
    ));

    fs::write(&path, "[server]\nport = 8080\n")?;
    assert_eq!(load_or_default(&path, true)?.server.port, 8080);
    assert_eq!(default_config_path(), PathBuf::from("Sitepipe.toml"));
    Ok(())
}
