use super::*;

#[test]
fn empty_toml_gives_defaults() {
    let cfg = EngineConfig::from_toml("").unwrap();
    assert_eq!(cfg, EngineConfig::default());
    assert_eq!(cfg.canvas, Canvas::PORTRAIT_1080);
    assert_eq!(cfg.fps, 30);
    assert_eq!(cfg.languages.len(), 7);
    assert_eq!(cfg.narration.min_bytes, 1000);
    assert_eq!(cfg.narration.command[0], "edge-tts");
    assert_eq!(cfg.render.caption_mode, CaptionMode::Words);
}

#[test]
fn partial_tables_override_only_named_fields() {
    let cfg = EngineConfig::from_toml(
        r#"
fps = 24

[paths]
videos = "in"

[render]
zoom = true

[render.caption_mode]
mode = "watermark"
text = "@channel"

[languages.Italian]
code = "it"
voice = "it-IT-DiegoNeural"
"#,
    )
    .unwrap();
    assert_eq!(cfg.fps, 24);
    assert_eq!(cfg.paths.videos, PathBuf::from("in"));
    assert_eq!(cfg.paths.result, PathBuf::from("result"));
    assert!(cfg.render.zoom);
    assert!(cfg.render.pop_in);
    assert_eq!(
        cfg.render.caption_mode,
        CaptionMode::Watermark {
            text: "@channel".to_string()
        }
    );
    assert!(!cfg.render.caption_mode.needs_narration());
    assert_eq!(cfg.languages.len(), 1);
    assert_eq!(cfg.languages.find("it").unwrap().0, "Italian");
}

#[test]
fn invalid_values_are_rejected() {
    assert!(EngineConfig::from_toml("fps = 0").is_err());
    assert!(EngineConfig::from_toml("[canvas]\nwidth = 1081\nheight = 1920").is_err());
    assert!(EngineConfig::from_toml("[normalize]\noverscale = 0.5").is_err());
    assert!(EngineConfig::from_toml("[normalize]\ntail_trim_s = 0.5").is_err());
    assert!(
        EngineConfig::from_toml("[render.caption_mode]\nmode = \"watermark\"\ntext = \" \"")
            .is_err()
    );
    assert!(EngineConfig::from_toml("[languages.Bad]\ncode = \"1\"\nvoice = \"x\"").is_err());
}

#[test]
fn missing_file_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg, EngineConfig::default());

    let path = dir.path().join("reelsmith.toml");
    std::fs::write(&path, "system_fonts = false\n[encoder]\npreset = \"fast\"\n").unwrap();
    let cfg = EngineConfig::load(&path).unwrap();
    assert!(!cfg.system_fonts);
    assert_eq!(cfg.encoder.preset, "fast");
    assert_eq!(cfg.encoder.watermark_preset, "ultrafast");
}

#[test]
fn curves_follow_toggles() {
    let opts = RenderOptions {
        zoom: false,
        pop_in: true,
        caption_mode: CaptionMode::Off,
    };
    assert_eq!(opts.zoom_curve(), ScaleCurve::Constant);
    assert_eq!(opts.pop_in_curve(), ScaleCurve::POP_IN);
    assert!(!CaptionMode::Off.needs_captions());
}
