use crate::key::{BlendFactor, PixelKey};

/// Summary of a key's blend configuration, used to pick which
/// instructions the blend stage emits. Recomputed per compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlendAnalysis {
    /// The equation scales source and destination by factors.
    pub uses_factors: bool,
    /// A factor reads the destination alpha.
    pub uses_dst_alpha: bool,
    /// The destination factor is `255 - source factor`.
    pub dst_factor_is_inverse: bool,
    /// The source color feeds a factor and must be in 11.4 form.
    pub src_color_as_factor: bool,
    /// The destination color feeds a factor and must be in 11.4 form.
    pub dst_color_as_factor: bool,
    /// The source color is multiplied (its factor is not 0 or 1).
    pub multiply_src: bool,
    /// The destination color is multiplied.
    pub multiply_dst: bool,
}

impl BlendAnalysis {
    pub fn new(key: &PixelKey) -> Self {
        let mut a = Self::default();
        if !key.alpha_blend() || !key.blend_eq().uses_factors() {
            return a;
        }
        a.uses_factors = true;

        let src = key.blend_src();
        let dst = key.blend_dst();
        a.multiply_src = !src.is_trivial();
        a.multiply_dst = !dst.is_trivial();

        match src {
            BlendFactor::DstAlpha
            | BlendFactor::InvDstAlpha
            | BlendFactor::DoubleDstAlpha
            | BlendFactor::DoubleInvDstAlpha => a.uses_dst_alpha = true,
            BlendFactor::OtherColor | BlendFactor::InvOtherColor => a.dst_color_as_factor = true,
            BlendFactor::SrcAlpha
            | BlendFactor::InvSrcAlpha
            | BlendFactor::DoubleSrcAlpha
            | BlendFactor::DoubleInvSrcAlpha => a.src_color_as_factor = true,
            _ => {}
        }

        match dst {
            BlendFactor::InvSrcAlpha => {
                a.dst_factor_is_inverse = src == BlendFactor::SrcAlpha;
                a.src_color_as_factor = true;
            }
            BlendFactor::DoubleInvSrcAlpha => {
                a.dst_factor_is_inverse = src == BlendFactor::DoubleSrcAlpha;
                a.src_color_as_factor = true;
            }
            BlendFactor::InvDstAlpha => {
                a.dst_factor_is_inverse = src == BlendFactor::DstAlpha;
                a.uses_dst_alpha = true;
            }
            BlendFactor::DoubleInvDstAlpha => {
                a.dst_factor_is_inverse = src == BlendFactor::DoubleDstAlpha;
                a.uses_dst_alpha = true;
            }
            BlendFactor::DstAlpha | BlendFactor::DoubleDstAlpha => a.uses_dst_alpha = true,
            BlendFactor::OtherColor
            | BlendFactor::InvOtherColor
            | BlendFactor::SrcAlpha
            | BlendFactor::DoubleSrcAlpha => a.src_color_as_factor = true,
            _ => {}
        }

        a.dst_color_as_factor |= a.uses_dst_alpha;
        a
    }
}
