use picom::config::Config;
use std::path::Path;
use tempfile::TempDir;

const BASE: &str = r#"
[service]
name = "picom"

[service.http]
bind = "127.0.0.1"
port = 8080

[session]
server = "localhost"
username = "picom"
"#;

fn write_config(dir: &Path, extra: &str) -> String {
    let path = dir.join("picom.toml");
    std::fs::write(&path, format!("{}\n{}", BASE, extra)).unwrap();
    path.display().to_string()
}

#[test]
fn test_defaults_load() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = Config::load(&write_config(dir.path(), ""))?;

    assert_eq!(config.service.status_poll_ms, 1000);
    assert_eq!(config.audio.frame_duration_ms, 20);
    assert_eq!(config.session.port, 4222);
    assert_eq!(config.session.join_attempts, 1000);
    Ok(())
}

#[test]
fn test_zero_status_poll_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_config(dir.path(), "");
    let contents = std::fs::read_to_string(&path)?.replace(
        "name = \"picom\"",
        "name = \"picom\"\nstatus_poll_ms = 0",
    );
    std::fs::write(&path, contents)?;

    let err = Config::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("status_poll_ms"));
    Ok(())
}

#[test]
fn test_zero_frame_duration_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_config(dir.path(), "[audio]\nframe_duration_ms = 0\n");

    let err = Config::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("frame_duration_ms"));
    Ok(())
}
