use pixjit_core::*;

fn key(config: &PipelineConfig) -> PixelKey {
    PixelKey::new(config, &GpuState::default())
}

#[test]
fn default_config() {
    let k = key(&PipelineConfig::default());
    assert_eq!(k.fb_format(), FbFormat::Rgba8888);
    assert_eq!(k.alpha_test_func(), CompareFunc::Always);
    assert_eq!(k.depth_test_func(), CompareFunc::Always);
    assert_eq!(k.stencil_test_func(), CompareFunc::Always);
    assert!(!k.clear_mode());
    assert!(!k.stencil_test());
    assert!(!k.alpha_blend());
    assert!(!k.depth_write());
    assert!(k.use_standard_stride());
    assert!(!k.apply_color_write_mask());
    assert!(!k.needs_key_constants());
    assert_eq!(k.describe(), "8888");
}

#[test]
fn describe_matches_display() {
    let config = PipelineConfig {
        alpha_test: Some(AlphaTest {
            func: CompareFunc::Equal,
            reference: 0x80,
        }),
        depth_test: Some(CompareFunc::LessEqual),
        depth_write: true,
        blend: Some(Blend {
            eq: BlendEq::Add,
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::InvSrcAlpha,
        }),
        ..PipelineConfig::default()
    };
    let k = key(&config);
    assert_eq!(k.describe(), "8888:AT=EQ80:ZT=LE:ZW:BLEND(ADD,SA,ISA)");
    assert_eq!(k.to_string(), k.describe());
}

#[test]
fn disabled_alpha_test_ignores_reference() {
    let off = key(&PipelineConfig::default());
    let always = key(&PipelineConfig {
        alpha_test: Some(AlphaTest {
            func: CompareFunc::Always,
            reference: 0x55,
        }),
        ..PipelineConfig::default()
    });
    assert_eq!(off, always);
    assert_eq!(always.alpha_test_ref(), 0);
}

#[test]
fn alpha_reference_is_premasked() {
    let state = GpuState {
        alpha_test_mask: 0xF0,
        ..GpuState::default()
    };
    let config = PipelineConfig {
        alpha_test: Some(AlphaTest {
            func: CompareFunc::Greater,
            reference: 0x8F,
        }),
        ..PipelineConfig::default()
    };
    let k = PixelKey::new(&config, &state);
    assert_eq!(k.alpha_test_ref(), 0x80);
    assert!(k.has_alpha_test_mask());

    let unmasked = key(&config);
    assert_eq!(unmasked.alpha_test_ref(), 0x8F);
    assert!(!unmasked.has_alpha_test_mask());
}

#[test]
fn clear_mode_disables_tests() {
    let config = PipelineConfig {
        clear: Some(ClearFlags {
            color: true,
            stencil: false,
            depth: true,
        }),
        alpha_test: Some(AlphaTest {
            func: CompareFunc::Less,
            reference: 3,
        }),
        depth_test: Some(CompareFunc::Greater),
        color_test: true,
        fog: true,
        dither: true,
        logic_op: true,
        blend: Some(Blend {
            eq: BlendEq::Add,
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::InvSrcAlpha,
        }),
        ..PipelineConfig::default()
    };
    let k = key(&config);
    assert!(k.clear_mode());
    assert!(k.color_clear());
    assert!(!k.stencil_clear());
    assert!(k.depth_clear());
    assert!(k.depth_write());
    assert!(!k.color_test());
    assert!(!k.stencil_test());
    assert!(!k.apply_fog());
    assert!(!k.dithering());
    assert!(!k.apply_logic_op());
    assert!(!k.alpha_blend());
    assert_eq!(k.alpha_test_func(), CompareFunc::Always);
    assert_eq!(k.depth_test_func(), CompareFunc::Always);
    assert_eq!(k.describe(), "8888:CLEARCZ");
}

#[test]
fn stencil_on_565_keeps_ops() {
    let test = StencilTest {
        func: CompareFunc::Equal,
        reference: 0x40,
        fail: StencilOp::Zero,
        depth_fail: StencilOp::Invert,
        depth_pass: StencilOp::Replace,
    };
    let k = key(&PipelineConfig {
        fb_format: FbFormat::Rgb565,
        stencil_test: Some(test),
        ..PipelineConfig::default()
    });
    assert!(k.stencil_test());
    assert_eq!(k.stencil_test_func(), CompareFunc::Equal);
    assert_eq!(k.stencil_test_ref(), 0x40);
    assert_eq!(k.stencil_fail_op(), StencilOp::Keep);
    assert_eq!(k.depth_fail_op(), StencilOp::Keep);
    assert_eq!(k.depth_pass_op(), StencilOp::Keep);

    let k = key(&PipelineConfig {
        fb_format: FbFormat::Rgba4444,
        stencil_test: Some(test),
        ..PipelineConfig::default()
    });
    assert_eq!(k.stencil_fail_op(), StencilOp::Zero);
    assert_eq!(k.depth_fail_op(), StencilOp::Invert);
    assert_eq!(k.depth_pass_op(), StencilOp::Replace);
    assert_eq!(k.describe(), "4444:ST=EQ40(0,I,R)");
}

#[test]
fn fixed_blend_colors_fold() {
    let config = PipelineConfig {
        blend: Some(Blend {
            eq: BlendEq::Add,
            src: BlendFactor::Fix,
            dst: BlendFactor::Fix,
        }),
        ..PipelineConfig::default()
    };
    let state = GpuState {
        blend_fix_a: 0xFF00_0000,
        blend_fix_b: 0x00FF_FFFF,
        ..GpuState::default()
    };
    let k = PixelKey::new(&config, &state);
    assert_eq!(k.blend_src(), BlendFactor::Zero);
    assert_eq!(k.blend_dst(), BlendFactor::One);

    let state = GpuState {
        blend_fix_a: 0x0080_8080,
        blend_fix_b: 0x0000_0001,
        ..GpuState::default()
    };
    let k = PixelKey::new(&config, &state);
    assert_eq!(k.blend_src(), BlendFactor::Fix);
    assert_eq!(k.blend_dst(), BlendFactor::Fix);
}

#[test]
fn factorless_equations_share_a_key() {
    let with = |src, dst| {
        key(&PipelineConfig {
            blend: Some(Blend {
                eq: BlendEq::Max,
                src,
                dst,
            }),
            ..PipelineConfig::default()
        })
    };
    let a = with(BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha);
    let b = with(BlendFactor::Fix, BlendFactor::DstAlpha);
    assert_eq!(a, b);
    assert_eq!(a.describe(), "8888:BLEND(MAX)");
}

#[test]
fn stride_flag() {
    let state = GpuState {
        fb_stride: 480,
        ..GpuState::default()
    };
    let k = PixelKey::new(&PipelineConfig::default(), &state);
    assert!(!k.use_standard_stride());
    assert_eq!(k.describe(), "8888:STRIDE");
}

#[test]
fn write_mask_includes_fixed_alpha() {
    let state = GpuState {
        color_write_mask: 0x0000_00FF,
        ..GpuState::default()
    };
    let k = PixelKey::new(&PipelineConfig::default(), &state);
    assert!(k.apply_color_write_mask());
    assert!(k.needs_key_constants());
    assert_eq!(k.constants().write_mask, 0xFF00_00FF);

    let k = PixelKey::new(
        &PipelineConfig {
            fb_format: FbFormat::Rgb565,
            ..PipelineConfig::default()
        },
        &state,
    );
    assert_eq!(k.constants().write_mask, 0x001F);
}

#[test]
fn alpha_write_mask_alone_is_not_a_user_mask() {
    // The alpha byte is never written without stencil, so masking it
    // changes nothing.
    let state = GpuState {
        alpha_write_mask: 0xFF,
        ..GpuState::default()
    };
    let k = PixelKey::new(&PipelineConfig::default(), &state);
    assert!(!k.apply_color_write_mask());
    assert_eq!(k.constants().write_mask, 0);
}

#[test]
fn dither_constants_follow_the_flag() {
    let state = GpuState::default();
    let plain = PixelKey::new(&PipelineConfig::default(), &state);
    assert_eq!(plain.constants().dither, [0; 16]);

    let dithered = PixelKey::new(
        &PipelineConfig {
            dither: true,
            ..PipelineConfig::default()
        },
        &state,
    );
    assert!(dithered.needs_key_constants());
    assert_eq!(dithered.constants().dither, STANDARD_DITHER);
}

#[test]
fn equality_ignores_constants() {
    let config = PipelineConfig {
        dither: true,
        ..PipelineConfig::default()
    };
    let a = PixelKey::new(&config, &GpuState::default());
    let b = PixelKey::new(
        &config,
        &GpuState {
            dither_matrix: [1; 16],
            ..GpuState::default()
        },
    );
    assert_eq!(a, b);
    assert_eq!(a.bits(), b.bits());
    assert_ne!(a.constants(), b.constants());
}

#[test]
fn reserved_encodings_decode() {
    assert_eq!(BlendEq::from_bits(6), BlendEq::Add);
    assert_eq!(BlendEq::from_bits(7), BlendEq::Add);
    assert_eq!(BlendFactor::from_bits(13), BlendFactor::Zero);
    assert_eq!(BlendFactor::from_bits(15), BlendFactor::Zero);
    assert_eq!(StencilOp::from_bits(6), StencilOp::Keep);
    assert_eq!(LogicOp::from_bits(0x1F), LogicOp::Set);
    for func in CompareFunc::ALL {
        assert_eq!(CompareFunc::from_bits(func as u8), func);
    }
    for format in FbFormat::ALL {
        assert_eq!(FbFormat::from_bits(format as u8), format);
    }
}

#[test]
fn compare_func_passes() {
    let cases = [
        (CompareFunc::Never, [false, false, false]),
        (CompareFunc::Always, [true, true, true]),
        (CompareFunc::Equal, [false, true, false]),
        (CompareFunc::NotEqual, [true, false, true]),
        (CompareFunc::Less, [true, false, false]),
        (CompareFunc::LessEqual, [true, true, false]),
        (CompareFunc::Greater, [false, false, true]),
        (CompareFunc::GreaterEqual, [false, true, true]),
    ];
    for (func, expected) in cases {
        assert_eq!(func.passes(1, 2), expected[0], "{:?} 1 2", func);
        assert_eq!(func.passes(2, 2), expected[1], "{:?} 2 2", func);
        assert_eq!(func.passes(3, 2), expected[2], "{:?} 3 2", func);
    }
}

#[test]
fn stencil_op_apply() {
    let f = FbFormat::Rgba8888;
    assert_eq!(StencilOp::Keep.apply(f, 7, 9), 7);
    assert_eq!(StencilOp::Zero.apply(f, 7, 9), 0);
    assert_eq!(StencilOp::Replace.apply(f, 7, 9), 9);
    assert_eq!(StencilOp::Invert.apply(f, 0x0F, 9), 0xF0);
    assert_eq!(StencilOp::Incr.apply(f, 0xFF, 0), 0xFF);
    assert_eq!(StencilOp::Incr.apply(f, 0x10, 0), 0x11);
    assert_eq!(StencilOp::Decr.apply(f, 0, 0), 0);

    let f = FbFormat::Rgba4444;
    assert_eq!(StencilOp::Incr.apply(f, 0x22, 0), 0x33);
    assert_eq!(StencilOp::Incr.apply(f, 0xFF, 0), 0xFF);
    assert_eq!(StencilOp::Decr.apply(f, 0x11, 0), 0x00);
    assert_eq!(StencilOp::Decr.apply(f, 0x00, 0), 0x00);

    let f = FbFormat::Rgba5551;
    assert_eq!(StencilOp::Incr.apply(f, 0, 0), 0xFF);
    assert_eq!(StencilOp::Decr.apply(f, 0xFF, 0), 0);
}

#[test]
fn logic_op_truth_table() {
    let (s, d) = (0b1100u32, 0b1010u32);
    let low = |v: u32| v & 0xF;
    let expected = [
        0b0000, 0b1000, 0b0100, 0b1100, 0b0010, 0b1010, 0b0110, 0b1110, 0b0001, 0b1001, 0b0101,
        0b1101, 0b0011, 0b1011, 0b0111, 0b1111,
    ];
    for (op, want) in LogicOp::ALL.into_iter().zip(expected) {
        assert_eq!(low(op.apply(s, d)), want, "{:?}", op);
        assert_eq!(LogicOp::from_bits(op as u8), op);
    }
}
