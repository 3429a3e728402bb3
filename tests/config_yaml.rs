//! Building generator trees from YAML scenario files

use anyhow::{Context, Result};
use std::fs;
use syncodecs::{FrameRecord, Generator, GeneratorConfig, Syncodecs, SyncodecError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn shaped_trace_codec_from_a_scenario_file() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let traces = dir.path().join("traces");
    fs::create_dir(&traces)?;
    // Two-column traces: frame type, then size
    fs::write(traces.join("clip_360p_400.txt"), "I 2500\nP 700\nP 650\n")?;

    let scenario = dir.path().join("scenario.yaml");
    fs::write(
        &scenario,
        format!(
            r#"
kind: shaped
max_payload_size: 1000
inner:
  kind: trace
  directory: {}
  prefix: clip
  size_column: 1
  initial_rate_bps: 400000
  fixed_mode: true
"#,
            traces.display()
        ),
    )?;

    let mut codec = Syncodecs::from_config_file(&scenario)?;
    let sizes: Vec<usize> = (0..5)
        .map(|_| {
            let size = codec.current().map(FrameRecord::size);
            codec.advance();
            size
        })
        .collect::<Option<_>>()
        .context("codec turned invalid")?;
    assert_eq!(sizes, vec![1000, 1000, 500, 700, 650]);
    Ok(())
}

#[test]
fn invalid_scenarios_are_reported() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let scenario = dir.path().join("scenario.yaml");

    fs::write(&scenario, "kind: simple_fps\nfps: -25\n")?;
    let err = Syncodecs::from_config_file(&scenario).err().context("negative fps accepted")?;
    assert!(matches!(err, SyncodecError::InvalidConfig { .. }));

    let err = Syncodecs::from_config_file(dir.path().join("missing.yaml"))
        .err()
        .context("missing file accepted")?;
    assert!(matches!(err, SyncodecError::File { .. }));
    assert!(!err.recovery_suggestions().is_empty());
    Ok(())
}

#[test]
fn statistics_scenario_is_reproducible_with_a_seed() -> Result<()> {
    init_tracing();
    let config = GeneratorConfig::from_yaml_str("kind: statistics\nseed: 42\nnoise_max_ratio: 0.2\n")?;
    config.validate()?;

    let run = |config: &GeneratorConfig| -> Vec<usize> {
        let mut codec = config.build();
        (0..20)
            .filter_map(|_| {
                let size = codec.current().map(FrameRecord::size);
                codec.advance();
                size
            })
            .collect()
    };
    let first = run(&config);
    assert_eq!(first.len(), 20);
    assert_eq!(first, run(&config));
    Ok(())
}
