use super::*;

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
}

#[test]
fn fps_ceil_covers_partial_frames_only() {
    let fps = Fps::integer(30).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(10.0), 300);
    assert_eq!(fps.secs_to_frames_ceil(10.01), 301);
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
}

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn canvas_validation() {
    assert!(Canvas::PORTRAIT_1080.validate().is_ok());
    assert!(
        Canvas {
            width: 1081,
            height: 1920
        }
        .validate()
        .is_err()
    );
    assert!(
        Canvas {
            width: 0,
            height: 2
        }
        .validate()
        .is_err()
    );
    assert_eq!(Canvas::PORTRAIT_1080.frame_len(), 1080 * 1920 * 4);
    assert_eq!(Canvas::PORTRAIT_1080.center(), (540.0, 960.0));
}

#[test]
fn hex_colors_parse() {
    assert_eq!(Rgba8::from_hex("#FFD700").unwrap(), Rgba8::rgb(255, 215, 0));
    assert_eq!(
        Rgba8::from_hex("ffffff8c").unwrap(),
        Rgba8::rgba(255, 255, 255, 140)
    );
    assert!(Rgba8::from_hex("#12345").is_err());
    assert!(Rgba8::from_hex("#zzzzzz").is_err());
}
