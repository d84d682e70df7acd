use super::*;

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/__selina_config__.toml").unwrap();
    assert_eq!(cfg.bot.prefix, ".");
    assert_eq!(cfg.api.port, 3000);
    assert_eq!(cfg.limits.max_bots_per_user, 50);
    assert_eq!(cfg.limits.bot_lifetime_days, 30);
    assert_eq!(cfg.bot.broadcast_delay_secs, 3);
    assert!(!cfg.bot.resume_on_start);
    assert!(!cfg.admin.is_configured());
}

#[test]
fn test_partial_toml_keeps_section_defaults() {
    let toml_str = r#"
        [api]
        port = 8080

        [bot]
        prefix = "!"
        owner_name = "Ada"

        [services]
        ai_budget_secs = 5
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.api.port, 8080);
    assert_eq!(cfg.api.host, "0.0.0.0");
    assert_eq!(cfg.bot.prefix, "!");
    assert_eq!(cfg.bot.owner_name, "Ada");
    assert_eq!(cfg.bot.version, "4.0.0");
    assert_eq!(cfg.services.ai_budget_secs, 5);
    assert_eq!(cfg.services.media_timeout_secs, 60);
    assert_eq!(cfg.services.weather_url, "https://wttr.in");
    assert_eq!(cfg.selina.data_dir, "~/.selina");
}

#[test]
fn test_load_rejects_empty_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[bot]\nprefix = \"\"\n").unwrap();
    let err = load(path.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("prefix"));
}

#[test]
fn test_load_rejects_out_of_range_bot_lifetime() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    for days in ["0", "-3", "9223372036854775807"] {
        std::fs::write(&path, format!("[limits]\nbot_lifetime_days = {days}\n")).unwrap();
        let err = load(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("bot_lifetime_days"));
    }

    std::fs::write(&path, "[limits]\nbot_lifetime_days = 365\n").unwrap();
    assert_eq!(load(path.to_str().unwrap()).unwrap().limits.bot_lifetime_days, 365);
}

#[test]
fn test_load_rejects_malformed_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[api\nport = ").unwrap();
    assert!(matches!(
        load(path.to_str().unwrap()),
        Err(SelinaError::Config(_))
    ));
}

#[test]
fn test_setup_url_uses_public_url_when_set() {
    let mut api = ApiConfig::default();
    assert_eq!(api.setup_url("b1"), "http://localhost:3000/setup/b1");
    api.public_url = "https://bots.example.com/".into();
    assert_eq!(api.setup_url("b1"), "https://bots.example.com/setup/b1");
}

#[test]
fn test_data_dirs_are_under_data_dir() {
    let sc = SelinaConfig {
        data_dir: "/srv/selina".into(),
        ..Default::default()
    };
    assert_eq!(sc.records_dir(), std::path::PathBuf::from("/srv/selina/data"));
    assert_eq!(
        sc.sessions_dir(),
        std::path::PathBuf::from("/srv/selina/sessions")
    );
    assert_eq!(sc.logs_dir(), std::path::PathBuf::from("/srv/selina/logs"));
}

#[test]
fn test_shellexpand_leaves_absolute_paths() {
    assert_eq!(shellexpand("/tmp/x"), "/tmp/x");
    if std::env::var_os("HOME").is_some() {
        assert!(!shellexpand("~/x").starts_with('~'));
    }
}
