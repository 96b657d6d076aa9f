use super::*;
use crate::foundation::core::Canvas;
use crate::encode::sink::AudioInputConfig;

fn cfg(audio: bool) -> SinkConfig {
    SinkConfig {
        canvas: Canvas {
            width: 64,
            height: 112,
        },
        fps: Fps::integer(30).unwrap(),
        total_frames: 3,
        audio: audio.then(|| AudioInputConfig {
            path: PathBuf::from("temp/job/audio.f32le"),
            sample_rate: 48_000,
            channels: 2,
        }),
    }
}

fn args_of(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &[0u8; 4], [0, 0, 0, 255]).is_err());
}

#[test]
fn command_with_audio_muxes_aac_and_stops_at_shortest() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("out/Output_Spanish.mp4"));
    let args = args_of(&sink.build_command(&cfg(true)).unwrap());
    let joined = args.join(" ");
    assert!(joined.contains("-s 64x112"));
    assert!(joined.contains("-f f32le -ar 48000 -ac 2 -i temp/job/audio.f32le"));
    assert!(joined.contains("-c:v libx264"));
    assert!(joined.contains("-pix_fmt yuv420p"));
    assert!(joined.contains("-c:a aac -shortest"));
    assert_eq!(args.last().map(String::as_str), Some("out/Output_Spanish.mp4"));
}

#[test]
fn command_without_audio_disables_audio() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("out/x.mp4"));
    let args = args_of(&sink.build_command(&cfg(false)).unwrap());
    assert!(args.iter().any(|a| a == "-an"));
    assert!(!args.iter().any(|a| a == "aac"));
}

#[test]
fn zero_sample_rate_is_rejected() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("out/x.mp4"));
    let mut c = cfg(true);
    if let Some(a) = c.audio.as_mut() {
        a.sample_rate = 0;
    }
    assert!(sink.build_command(&c).is_err());
}

#[test]
fn push_before_begin_is_an_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("out/x.mp4"));
    let frame = FrameRGBA::transparent(Canvas {
        width: 2,
        height: 2,
    });
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
}

#[test]
fn abort_removes_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("partial.mp4");
    std::fs::write(&out, b"partial").unwrap();
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.abort();
    assert!(!out.exists());
}
