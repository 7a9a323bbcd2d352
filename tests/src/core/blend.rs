use pixjit_core::*;

fn analyze(eq: BlendEq, src: BlendFactor, dst: BlendFactor) -> BlendAnalysis {
    let state = GpuState {
        blend_fix_a: 0x0040_4040,
        blend_fix_b: 0x0040_4040,
        ..GpuState::default()
    };
    let config = PipelineConfig {
        blend: Some(Blend { eq, src, dst }),
        ..PipelineConfig::default()
    };
    BlendAnalysis::new(&PixelKey::new(&config, &state))
}

#[test]
fn no_blend() {
    let key = PixelKey::new(&PipelineConfig::default(), &GpuState::default());
    assert_eq!(BlendAnalysis::new(&key), BlendAnalysis::default());
}

#[test]
fn src_alpha_inverse() {
    let a = analyze(BlendEq::Add, BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha);
    assert!(a.uses_factors);
    assert!(a.multiply_src && a.multiply_dst);
    assert!(a.dst_factor_is_inverse);
    assert!(a.src_color_as_factor);
    assert!(!a.dst_color_as_factor);
    assert!(!a.uses_dst_alpha);
}

#[test]
fn double_inverse_pairs() {
    let a = analyze(
        BlendEq::Add,
        BlendFactor::DoubleSrcAlpha,
        BlendFactor::DoubleInvSrcAlpha,
    );
    assert!(a.dst_factor_is_inverse);

    let a = analyze(BlendEq::Add, BlendFactor::SrcAlpha, BlendFactor::DoubleInvSrcAlpha);
    assert!(!a.dst_factor_is_inverse);
}

#[test]
fn dst_alpha_needs_dst_color() {
    let a = analyze(BlendEq::Subtract, BlendFactor::DstAlpha, BlendFactor::InvDstAlpha);
    assert!(a.uses_dst_alpha);
    assert!(a.dst_color_as_factor);
    assert!(a.dst_factor_is_inverse);
    assert!(!a.src_color_as_factor);
}

#[test]
fn other_color() {
    let a = analyze(BlendEq::Add, BlendFactor::OtherColor, BlendFactor::OtherColor);
    assert!(a.src_color_as_factor);
    assert!(a.dst_color_as_factor);
    assert!(!a.uses_dst_alpha);
}

#[test]
fn trivial_factors_skip_multiply() {
    let a = analyze(BlendEq::Add, BlendFactor::Fix, BlendFactor::Fix);
    assert!(a.multiply_src && a.multiply_dst);

    let state = GpuState {
        blend_fix_a: 0x00FF_FFFF,
        blend_fix_b: 0,
        ..GpuState::default()
    };
    let config = PipelineConfig {
        blend: Some(Blend {
            eq: BlendEq::Add,
            src: BlendFactor::Fix,
            dst: BlendFactor::Fix,
        }),
        ..PipelineConfig::default()
    };
    let a = BlendAnalysis::new(&PixelKey::new(&config, &state));
    assert!(a.uses_factors);
    assert!(!a.multiply_src && !a.multiply_dst);
}

#[test]
fn factorless_equations() {
    for eq in [BlendEq::Min, BlendEq::Max, BlendEq::AbsDiff] {
        let a = analyze(eq, BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha);
        assert_eq!(a, BlendAnalysis::default(), "{:?}", eq);
    }
}
