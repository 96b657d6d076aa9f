/// Scale factor as a function of local time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleCurve {
    /// Always 1.
    Constant,
    /// `base + rate * t`, optionally capped at `max`.
    Linear {
        /// Factor at `t = 0`.
        base: f64,
        /// Change per second.
        rate: f64,
        /// Upper bound.
        max: Option<f64>,
    },
}

impl ScaleCurve {
    /// Slow continuous push-in on background clips.
    pub const ZOOM: Self = Self::Linear {
        base: 1.0,
        rate: 0.03,
        max: None,
    };

    /// Caption words grow from 90% and settle at 120%.
    pub const POP_IN: Self = Self::Linear {
        base: 0.9,
        rate: 0.3,
        max: Some(1.2),
    };

    /// Scale factor at local time `t` (negative times are treated as 0).
    pub fn factor(self, t: f64) -> f64 {
        match self {
            ScaleCurve::Constant => 1.0,
            ScaleCurve::Linear { base, rate, max } => {
                let v = base + rate * t.max(0.0);
                match max {
                    Some(m) => v.min(m),
                    None => v,
                }
            }
        }
    }

    /// `ZOOM` when enabled, `Constant` otherwise.
    pub fn zoom_if(enabled: bool) -> Self {
        if enabled { Self::ZOOM } else { Self::Constant }
    }

    /// `POP_IN` when enabled, `Constant` otherwise.
    pub fn pop_in_if(enabled: bool) -> Self {
        if enabled { Self::POP_IN } else { Self::Constant }
    }
}

/// Scale by `s` about `(cx, cy)`.
pub(crate) fn scale_about(s: f64, cx: f64, cy: f64) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::translate((cx, cy))
        * vello_cpu::kurbo::Affine::scale(s)
        * vello_cpu::kurbo::Affine::translate((-cx, -cy))
}
