//! Trace codecs driven from an on-disk trace directory

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use syncodecs::{
    Generator, GeneratorExt, InterpolatingTraceGenerator, N_FRAMES_EXCLUDED, Resolution,
    ResolutionControl, Syncodecs, TraceCodecConfig, TraceMatchingGenerator,
};
use tempfile::TempDir;

const FRAMES: usize = 60;
const I_FRAME_SIZE: usize = 50_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Frame `i > 0` of a trace at `kbps` is `kbps * 5 + i` bytes; frame 0 is an I-frame
fn write_trace(dir: &Path, resolution: Resolution, kbps: u32) -> Result<()> {
    let mut contents = String::from("# frame size in bytes\n");
    contents.push_str(&format!("{I_FRAME_SIZE}\n"));
    for i in 1..FRAMES {
        contents.push_str(&format!("{}\n", kbps as usize * 5 + i));
    }
    let name = format!("clip_{}_{}.txt", resolution.label(), kbps);
    fs::write(dir.join(name), contents)?;
    Ok(())
}

fn trace_dir(resolutions: &[Resolution], bitrates: &[u32]) -> Result<TempDir> {
    let dir = tempfile::tempdir()?;
    for resolution in resolutions {
        for kbps in bitrates {
            write_trace(dir.path(), *resolution, *kbps)?;
        }
    }
    fs::write(dir.path().join("README.md"), "not a trace")?;
    Ok(dir)
}

fn fixed(resolution: Resolution, rate_bps: f64) -> TraceCodecConfig {
    TraceCodecConfig {
        initial_rate_bps: rate_bps,
        fixed_mode: true,
        fixed_resolution: Some(resolution),
        ..TraceCodecConfig::default()
    }
}

#[test]
fn matching_codec_replays_from_disk_and_skips_the_i_frame_on_wrap() -> Result<()> {
    init_tracing();
    let dir = trace_dir(&[Resolution::P360], &[400, 800])?;
    let traces = Syncodecs::load_traces(dir.path(), "clip")?;
    let mut codec = TraceMatchingGenerator::new(traces, fixed(Resolution::P360, 600_000.0));

    assert_eq!(codec.matched_bitrate_kbps(), Some(400));
    let frames: Vec<usize> = (&mut codec).records().take(3 * FRAMES).map(|r| r.size()).collect();
    assert_eq!(frames[0], I_FRAME_SIZE);
    assert_eq!(frames[1], 2001);
    assert!(frames[1..].iter().all(|size| *size != I_FRAME_SIZE));
    // After the first pass the cursor restarts at the excluded-frame count
    assert_eq!(frames[FRAMES], 2000 + N_FRAMES_EXCLUDED);
    Ok(())
}

#[test]
fn matching_codec_follows_rate_changes_without_losing_its_place() -> Result<()> {
    init_tracing();
    let dir = trace_dir(&[Resolution::P360], &[400, 800])?;
    let mut codec =
        TraceMatchingGenerator::open(dir.path(), "clip", fixed(Resolution::P360, 500_000.0));

    for _ in 0..9 {
        codec.advance();
    }
    codec.set_target_rate(900_000.0);
    assert_eq!(codec.matched_bitrate_kbps(), Some(800));
    codec.advance();
    let record = codec.current().context("codec turned invalid")?;
    assert_eq!(record.size(), 800 * 5 + 10);

    codec.set_target_rate(50_000.0);
    assert_eq!(codec.matched_bitrate_kbps(), Some(400), "lowest trace is the best effort");
    Ok(())
}

#[test]
fn resolution_adapts_to_bits_per_pixel() -> Result<()> {
    init_tracing();
    let resolutions = [
        Resolution::P240,
        Resolution::P360,
        Resolution::P480,
        Resolution::P540,
        Resolution::P720,
    ];
    let dir = trace_dir(&resolutions, &[200, 6000])?;
    let traces = Syncodecs::load_traces(dir.path(), "clip")?;

    // 200 kbps on 360p at 25 fps is far below 0.7 bpp
    let mut codec =
        TraceMatchingGenerator::new(Arc::clone(&traces), fixed(Resolution::P360, 200_000.0));
    codec.set_fixed_mode(false);
    codec.advance();
    assert_eq!(codec.current_resolution(), Some(Resolution::P480));

    // 6 Mbps on 720p at 5 fps is far above 1.5 bpp
    let config = TraceCodecConfig { fps: 5.0, ..fixed(Resolution::P720, 6_000_000.0) };
    let mut codec = TraceMatchingGenerator::new(traces, config);
    codec.set_fixed_mode(false);
    codec.advance();
    assert_eq!(codec.current_resolution(), Some(Resolution::P540));
    Ok(())
}

#[test]
fn interpolating_codec_blends_the_bracketing_traces() -> Result<()> {
    init_tracing();
    let dir = trace_dir(&[Resolution::P360], &[400, 800])?;
    let mut codec =
        InterpolatingTraceGenerator::open(dir.path(), "clip", fixed(Resolution::P360, 600_000.0));
    assert_eq!(codec.bitrate_bounds_kbps(), Some((400, 800)));

    codec.advance();
    // Frame 1: 2001 bytes at 400 kbps, 4001 at 800 kbps
    let record = codec.current().context("codec turned invalid")?;
    assert_eq!(record.size(), 3001);

    codec.set_target_rate(800_000.0);
    codec.advance();
    assert_eq!(codec.current().map(|r| r.size()), Some(4002));

    codec.set_target_rate(1_600_000.0);
    codec.advance();
    assert_eq!(codec.current().map(|r| r.size()), Some(2 * 4003));
    Ok(())
}

#[test]
fn unknown_fixed_resolution_is_refused() -> Result<()> {
    init_tracing();
    let dir = trace_dir(&[Resolution::P240, Resolution::P360, Resolution::P480], &[300])?;
    let mut codec = TraceMatchingGenerator::open(dir.path(), "clip", TraceCodecConfig::default());

    codec.set_fixed_mode(true);
    assert_eq!(codec.current_resolution(), Some(Resolution::P360));
    assert!(!codec.set_resolution_for_fixed_mode(Resolution::P1080));
    assert_eq!(codec.current_resolution(), Some(Resolution::P360));
    assert!(codec.set_resolution_for_fixed_mode("240p".parse::<Resolution>()?));
    assert_eq!(codec.current_resolution(), Some(Resolution::P240));
    Ok(())
}

#[test]
fn empty_directories_produce_invalid_codecs() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    assert!(Syncodecs::load_traces(dir.path(), "clip").is_err());

    let codec = TraceMatchingGenerator::open(dir.path(), "clip", TraceCodecConfig::default());
    assert!(!codec.is_valid());
    let codec = InterpolatingTraceGenerator::open(dir.path(), "clip", TraceCodecConfig::default());
    assert!(!codec.is_valid());
    Ok(())
}
