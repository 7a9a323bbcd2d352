use pixjit_core::color::from_rgba8888;
use pixjit_core::{AlphaTest, ClearFlags, CompareFunc, FbFormat, PipelineConfig};

use super::{config, Target};

fn clear_config(format: FbFormat, color: bool, stencil: bool, depth: bool) -> PipelineConfig {
    PipelineConfig {
        clear: Some(ClearFlags {
            color,
            stencil,
            depth,
        }),
        ..config(format)
    }
}

#[test]
fn color_and_depth_ignore_tests() {
    let mut target = Target::new(FbFormat::Rgba8888);
    let config = PipelineConfig {
        alpha_test: Some(AlphaTest {
            func: CompareFunc::Never,
            reference: 0,
        }),
        depth_test: Some(CompareFunc::Never),
        ..clear_config(FbFormat::Rgba8888, true, false, true)
    };
    target.set_pixel(4, 4, 0x7700_0000);
    target.set_depth(4, 4, 0xFFFF);
    target.draw(&config, 4, 4, 0x0042, 0, 0xFF11_2233);
    // Alpha is stencil, which this clear leaves alone.
    assert_eq!(target.pixel(4, 4), 0x7711_2233);
    assert_eq!(target.depth(4, 4), 0x0042);
}

#[test]
fn color_with_stencil_writes_alpha() {
    for format in FbFormat::ALL {
        let mut target = Target::new(format);
        let config = clear_config(format, true, true, false);
        target.set_pixel(0, 1, 0);
        target.draw(&config, 0, 1, 0, 0, 0xF0C0_8040);
        assert_eq!(
            target.pixel(0, 1),
            from_rgba8888(format, 0xF0C0_8040),
            "{}",
            format.name()
        );
        assert_eq!(target.depth(0, 1), 0);
    }
}

#[test]
fn stencil_only_keeps_color() {
    let cases = [
        (FbFormat::Rgba8888, 0x0012_3456, 0xA012_3456),
        (FbFormat::Rgba5551, 0x1234, 0x9234),
        (FbFormat::Rgba4444, 0x1234, 0xA234),
        (FbFormat::Rgb565, 0x1234, 0x1234),
    ];
    for (format, old, want) in cases {
        let mut target = Target::new(format);
        let config = clear_config(format, false, true, false);
        target.set_pixel(9, 9, old);
        target.draw(&config, 9, 9, 0, 0, 0xA0FF_FFFF);
        assert_eq!(target.pixel(9, 9), want, "{}", format.name());
    }
}

#[test]
fn depth_only() {
    let mut target = Target::new(FbFormat::Rgb565);
    let config = clear_config(FbFormat::Rgb565, false, false, true);
    target.set_pixel(1, 2, 0xBEEF);
    target.draw(&config, 1, 2, 0x1357, 0, 0x00FF_FFFF);
    assert_eq!(target.pixel(1, 2), 0xBEEF);
    assert_eq!(target.depth(1, 2), 0x1357);
}

#[test]
fn nothing_selected_writes_nothing() {
    let mut target = Target::new(FbFormat::Rgba8888);
    let config = clear_config(FbFormat::Rgba8888, false, false, false);
    target.set_pixel(0, 0, 0x0102_0304);
    target.set_depth(0, 0, 7);
    target.draw(&config, 0, 0, 99, 0, 0xFFFF_FFFF);
    assert_eq!(target.pixel(0, 0), 0x0102_0304);
    assert_eq!(target.depth(0, 0), 7);
}
