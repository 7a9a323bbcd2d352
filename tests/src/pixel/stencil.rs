use pixjit_core::color::{stencil_bits_for, stencil_of};
use pixjit_core::{CompareFunc, FbFormat, PipelineConfig, StencilOp, StencilTest};

use super::{config, Target};

fn stencil_config(
    format: FbFormat,
    func: CompareFunc,
    reference: u8,
    ops: [StencilOp; 3],
) -> PipelineConfig {
    PipelineConfig {
        stencil_test: Some(StencilTest {
            func,
            reference,
            fail: ops[0],
            depth_fail: ops[1],
            depth_pass: ops[2],
        }),
        ..config(format)
    }
}

#[test]
fn every_function_8888() {
    let mut target = Target::new(FbFormat::Rgba8888);
    let ops = [StencilOp::Zero, StencilOp::Keep, StencilOp::Incr];
    for func in CompareFunc::ALL {
        for reference in [0x00, 0x40, 0xFF] {
            target.state().stencil_ref = reference;
            let config = stencil_config(FbFormat::Rgba8888, func, reference, ops);
            for stored in [0x00u8, 0x3F, 0x40, 0x41, 0xFF] {
                let old = (stored as u32) << 24 | 0x0010_2030;
                target.set_pixel(0, 4, old);
                target.draw(&config, 0, 4, 0, 0, 0x8055_6677);

                let want = if func.passes(reference as u32, stored as u32) {
                    0x0055_6677 | (stored.saturating_add(1) as u32) << 24
                } else {
                    0x0010_2030
                };
                assert_eq!(
                    target.pixel(0, 4),
                    want,
                    "{:?} ref {:#x} stored {:#x}",
                    func,
                    reference,
                    stored
                );
            }
        }
    }
}

#[test]
fn replace_under_write_mask_4444() {
    let mut target = Target::new(FbFormat::Rgba4444);
    target.state().stencil_ref = 0xFF;
    // Protect red.
    target.state().color_write_mask = 0x0000_00FF;
    let config = stencil_config(
        FbFormat::Rgba4444,
        CompareFunc::Always,
        0xFF,
        [StencilOp::Keep, StencilOp::Keep, StencilOp::Replace],
    );
    let key = target.key(&config);
    assert!(key.apply_color_write_mask());
    assert_eq!(key.constants().write_mask, 0x000F);

    target.set_pixel(6, 1, 0x123A);
    target.draw(&config, 6, 1, 0, 0, 0x0088_6644);
    assert_eq!(target.pixel(6, 1), 0xF86A);
}

#[test]
fn depth_fail_updates_stencil_only() {
    let mut target = Target::new(FbFormat::Rgba8888);
    let config = PipelineConfig {
        depth_test: Some(CompareFunc::Less),
        ..stencil_config(
            FbFormat::Rgba8888,
            CompareFunc::Always,
            0,
            [StencilOp::Keep, StencilOp::Invert, StencilOp::Keep],
        )
    };
    target.set_depth(7, 7, 10);
    target.set_pixel(7, 7, 0x0F44_5566);

    target.draw(&config, 7, 7, 20, 0, 0xFF00_0000);
    assert_eq!(target.pixel(7, 7), 0xF044_5566);
    assert_eq!(target.depth(7, 7), 10);

    // Passing depth keeps the stencil and writes the color.
    target.draw(&config, 7, 7, 5, 0, 0x0011_2233);
    assert_eq!(target.pixel(7, 7), 0xF011_2233);
}

#[test]
fn ops_on_every_stencil_format() {
    for format in [FbFormat::Rgba5551, FbFormat::Rgba4444, FbFormat::Rgba8888] {
        let mut target = Target::new(format);
        for op in StencilOp::ALL {
            target.state().stencil_ref = 0xA7;
            // A stencil test that never passes applies the fail op.
            let config = stencil_config(
                format,
                CompareFunc::Never,
                0xA7,
                [op, StencilOp::Keep, StencilOp::Keep],
            );
            for stored in [0x00u8, 0x11, 0x77, 0xEE, 0xFF] {
                let color_bits = format.pixel_bits() & !format.stencil_bits();
                let old = stencil_bits_for(format, stored) | (0x0123_4567 & color_bits);
                target.set_pixel(1, 1, old);
                target.draw(&config, 1, 1, 0, 0, 0xFFFF_FFFF);

                let before = stencil_of(format, old);
                let after = op.apply(format, before, 0xA7);
                let want = (old & !format.stencil_bits()) | stencil_bits_for(format, after);
                assert_eq!(
                    target.pixel(1, 1),
                    want,
                    "{} {:?} stored {:#x}",
                    format.name(),
                    op,
                    stored
                );
            }
        }
    }
}

#[test]
fn masked_compare_replaces_with_full_reference() {
    let mut target = Target::new(FbFormat::Rgba8888);
    target.state().stencil_mask = 0x0F;
    target.state().stencil_ref = 0x35;
    let config = stencil_config(
        FbFormat::Rgba8888,
        CompareFunc::Equal,
        0x35,
        [StencilOp::Keep, StencilOp::Keep, StencilOp::Replace],
    );
    assert!(target.key(&config).has_stencil_test_mask());

    target.set_pixel(0, 0, 0xA500_0000);
    target.draw(&config, 0, 0, 0, 0, 0x0000_00FF);
    assert_eq!(target.pixel(0, 0), 0x3500_00FF);

    target.set_pixel(0, 0, 0xA600_0000);
    target.draw(&config, 0, 0, 0, 0, 0x0000_00FF);
    assert_eq!(target.pixel(0, 0), 0xA600_0000);
}

#[test]
fn formats_without_stencil_compare_against_zero() {
    let mut target = Target::new(FbFormat::Rgb565);
    let ops = [StencilOp::Replace; 3];
    let cases = [
        (CompareFunc::Equal, 0, true),
        (CompareFunc::NotEqual, 0, false),
        (CompareFunc::Equal, 5, false),
        (CompareFunc::Greater, 5, true),
    ];
    for (func, reference, writes) in cases {
        let config = stencil_config(FbFormat::Rgb565, func, reference, ops);
        // Ops are dropped from the key when there is nowhere to store.
        assert_eq!(target.key(&config).depth_pass_op(), StencilOp::Keep);

        target.set_pixel(2, 2, 0);
        target.draw(&config, 2, 2, 0, 0, 0x00FF_FFFF);
        assert_eq!(target.pixel(2, 2) == 0xFFFF, writes, "{:?} {}", func, reference);
    }
}
