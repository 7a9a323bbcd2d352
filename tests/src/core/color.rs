use pixjit_core::color::*;
use pixjit_core::{pack_color, FbFormat};

#[test]
fn narrow_keeps_top_bits() {
    // R=0xFF G=0x80 B=0x08 A=0x80
    let c = 0x8008_80FF;
    assert_eq!(rgba8888_to_rgb565(c), 0x0C1F);
    assert_eq!(rgba8888_to_rgba5551(c), 0x861F);
    assert_eq!(rgba8888_to_rgba4444(c), 0x808F);
}

#[test]
fn widen_replicates_bits() {
    assert_eq!(rgb565_to_rgba8888(0xFFFF), 0x00FF_FFFF);
    assert_eq!(rgb565_to_rgba8888(0x0000), 0);
    // 5-bit 0b10000 expands to 0b10000100.
    assert_eq!(rgb565_to_rgba8888(0x0010), 0x0000_0084);
    assert_eq!(rgba5551_to_rgba8888(0x8000, true), 0xFF00_0000);
    assert_eq!(rgba5551_to_rgba8888(0x8000, false), 0);
    assert_eq!(rgba4444_to_rgba8888(0xA123, true), 0xAA11_2233);
    assert_eq!(rgba4444_to_rgba8888(0xA123, false), 0x0011_2233);
}

#[test]
fn round_trip_through_16_bit() {
    for p in 0..=0xFFFFu32 {
        let p16 = p as u16;
        assert_eq!(rgba8888_to_rgb565(rgb565_to_rgba8888(p16)), p16);
        assert_eq!(rgba8888_to_rgba5551(rgba5551_to_rgba8888(p16, true)), p16);
        assert_eq!(rgba8888_to_rgba4444(rgba4444_to_rgba8888(p16, true)), p16);
    }
}

#[test]
fn dispatch_by_format() {
    let c = 0x1234_5678;
    for format in FbFormat::ALL {
        let stored = from_rgba8888(format, c);
        assert_eq!(stored & !format.pixel_bits(), 0, "{:?}", format);
    }
    assert_eq!(from_rgba8888(FbFormat::Rgba8888, c), c);
    assert_eq!(to_rgba8888(FbFormat::Rgba8888, c, false), 0x0034_5678);
    assert_eq!(to_rgba8888(FbFormat::Rgba8888, c, true), c);
}

#[test]
fn stencil_bits() {
    assert_eq!(stencil_of(FbFormat::Rgba8888, 0xAB00_0000), 0xAB);
    assert_eq!(stencil_of(FbFormat::Rgba4444, 0xA000), 0xAA);
    assert_eq!(stencil_of(FbFormat::Rgba5551, 0x8000), 0xFF);
    assert_eq!(stencil_of(FbFormat::Rgb565, 0xFFFF), 0);

    assert_eq!(stencil_bits_for(FbFormat::Rgba8888, 0xAB), 0xAB00_0000);
    assert_eq!(stencil_bits_for(FbFormat::Rgba4444, 0xAB), 0xA000);
    assert_eq!(stencil_bits_for(FbFormat::Rgba5551, 0x80), 0x8000);
    assert_eq!(stencil_bits_for(FbFormat::Rgba5551, 0x7F), 0);
    assert_eq!(stencil_bits_for(FbFormat::Rgb565, 0xFF), 0);
}

#[test]
fn pack_color_saturates() {
    assert_eq!(pack_color([0x12, 0x34, 0x56, 0x78]), 0x7856_3412);
    assert_eq!(pack_color([-5, 300, 255, 0]), 0x00FF_FF00);
}
