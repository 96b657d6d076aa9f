/// Frame assembly and encode driving.
pub mod compositor;
pub(crate) mod frame;
/// Scale-over-time curves for zoom and pop-in.
pub mod motion;
