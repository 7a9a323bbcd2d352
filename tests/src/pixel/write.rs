use pixjit_core::color::from_rgba8888;
use pixjit_core::{CompareFunc, FbFormat, PipelineConfig};

use super::{config, samples, Target};

#[test]
fn plain_write_every_format() {
    for format in FbFormat::ALL {
        let mut target = Target::new(format);
        let cfg = config(format);
        let alpha = format.stencil_bits();
        for (i, color) in samples(format as u32, 32).enumerate() {
            let (x, y) = (i * 7 % 512, i % 16);
            let old = 0xFFFF_FFFF & format.pixel_bits();
            target.set_pixel(x, y, old);
            target.draw(&cfg, x, y, 0, 0, color);
            // Without stencil the alpha bits are left as they were.
            let want = (from_rgba8888(format, color) & !alpha) | (old & alpha);
            assert_eq!(target.pixel(x, y), want, "{} {:#x}", format.name(), color);
        }
    }
}

#[test]
fn neighbours_untouched() {
    for format in FbFormat::ALL {
        let mut target = Target::new(format);
        let fill = 0xA5A5_A5A5 & format.pixel_bits();
        for x in 0..4 {
            target.set_pixel(x, 0, fill);
        }
        target.draw(&config(format), 1, 0, 0, 0, 0);
        assert_eq!(target.pixel(0, 0), fill);
        assert_ne!(target.pixel(1, 0), fill);
        assert_eq!(target.pixel(2, 0), fill);
    }
}

#[test]
fn write_mask_protects_bits() {
    for format in FbFormat::ALL {
        let mut target = Target::new(format);
        target.state().color_write_mask = 0x00FF_00F0;
        target.state().alpha_write_mask = 0xFF;
        let cfg = config(format);
        let key = target.key(&cfg);
        assert!(key.apply_color_write_mask(), "{}", format.name());
        let mask = key.constants().write_mask;

        for (color, old) in samples(1, 16).zip(samples(2, 16)) {
            let old = old & format.pixel_bits();
            target.set_pixel(2, 5, old);
            target.draw(&cfg, 2, 5, 0, 0, color);
            let new = from_rgba8888(format, color);
            let want = ((old & mask) | (new & !mask)) & format.pixel_bits();
            assert_eq!(target.pixel(2, 5), want, "{} {:#x}", format.name(), color);
        }
    }
}

#[test]
fn alpha_mask_alone_keeps_fast_store() {
    let mut target = Target::new(FbFormat::Rgba8888);
    target.state().alpha_write_mask = 0xFF;
    let cfg = config(FbFormat::Rgba8888);
    // Alpha is never written here anyway.
    assert!(!target.key(&cfg).apply_color_write_mask());
    target.set_pixel(0, 0, 0x1200_0000);
    target.draw(&cfg, 0, 0, 0, 0, 0xFFAB_CDEF);
    assert_eq!(target.pixel(0, 0), 0x12AB_CDEF);
}

#[test]
fn non_standard_stride() {
    for format in FbFormat::ALL {
        let mut target = Target::with_stride(format, 100);
        let cfg = PipelineConfig {
            depth_test: Some(CompareFunc::Always),
            depth_write: true,
            ..config(format)
        };
        assert!(!target.key(&cfg).use_standard_stride());

        target.draw(&cfg, 37, 6, 0x0606, 0, 0x00FF_FFFF);
        let white = from_rgba8888(format, 0x00FF_FFFF);
        assert_eq!(target.pixel(37, 6), white, "{}", format.name());
        assert_eq!(target.depth(37, 6), 0x0606);
        assert_eq!(target.pixel(36, 6), 0);
        assert_eq!(target.pixel(37, 5), 0);
    }
}

#[test]
fn standard_stride_fast_path() {
    let mut target = Target::new(FbFormat::Rgba5551);
    let cfg = PipelineConfig {
        depth_test: Some(CompareFunc::GreaterEqual),
        depth_write: true,
        ..config(FbFormat::Rgba5551)
    };
    assert!(target.key(&cfg).use_standard_stride());
    for y in 0..16 {
        let x = 511 - y * 31;
        target.set_depth(x, y, 0x100);
        target.draw(&cfg, x, y, 0x200, 0, 0x00F8_0000);
        assert_eq!(target.pixel(x, y), 0x7C00);
        assert_eq!(target.depth(x, y), 0x200);
    }
}
