use super::*;

#[test]
fn transparent_frame_matches_canvas() {
    let canvas = Canvas {
        width: 4,
        height: 6,
    };
    let f = FrameRGBA::transparent(canvas);
    assert_eq!(f.data.len(), 4 * 6 * 4);
    assert!(f.data.iter().all(|b| *b == 0));
    assert!(f.premultiplied);
}

#[test]
fn pixmap_rejects_length_mismatch() {
    let err = premul_bytes_to_pixmap(&[0u8; 12], 2, 2).unwrap_err();
    assert!(err.to_string().contains("does not match"));
}

#[test]
fn pixmap_round_trips_bytes() {
    let bytes = vec![10u8, 20, 30, 255, 0, 0, 0, 0];
    let pixmap = premul_bytes_to_pixmap(&bytes, 2, 1).unwrap();
    assert_eq!(pixmap.width(), 2);
    assert_eq!(pixmap.height(), 1);
    assert_eq!(pixmap.data_as_u8_slice(), bytes.as_slice());
}

#[test]
fn premultiply_decoded_only_touches_translucent_frames() {
    let mut opaque = vec![200u8, 100, 50, 255];
    premultiply_decoded(&mut opaque);
    assert_eq!(opaque, vec![200, 100, 50, 255]);

    let mut half = vec![255u8, 255, 255, 128];
    premultiply_decoded(&mut half);
    assert_eq!(half, vec![128, 128, 128, 128]);
}
