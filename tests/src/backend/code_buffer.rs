use pixjit_backend::code_buffer::CodeBuffer;

#[test]
fn test_emit_and_read() {
    let mut buf = CodeBuffer::new(4096).unwrap();
    buf.emit_u8(0x90); // NOP
    buf.emit_u32(0xDEADBEEF);
    buf.emit_u64(0x0123_4567_89AB_CDEF);
    assert_eq!(buf.offset(), 13);
    assert_eq!(buf.as_slice()[0], 0x90);
    assert_eq!(buf.read_u32(1), 0xDEADBEEF);
    assert_eq!(buf.read_u64(5), 0x0123_4567_89AB_CDEF);
}

#[test]
fn test_patch() {
    let mut buf = CodeBuffer::new(4096).unwrap();
    buf.emit_u32(0);
    buf.patch_u32(0, 0x12345678);
    assert_eq!(buf.read_u32(0), 0x12345678);
}

#[test]
fn test_size_rounds_to_pages() {
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    let buf = CodeBuffer::new(1).unwrap();
    assert_eq!(buf.capacity(), page);
    assert_eq!(buf.remaining(), page);
}

#[test]
fn test_rewind() {
    let mut buf = CodeBuffer::new(4096).unwrap();
    buf.emit_u32(1);
    buf.emit_u32(2);
    buf.set_offset(4);
    assert_eq!(buf.offset(), 4);
    assert_eq!(buf.remaining(), buf.capacity() - 4);
    buf.emit_u32(3);
    assert_eq!(buf.read_u32(4), 3);
}

#[test]
fn test_pointer_offsets() {
    let mut buf = CodeBuffer::new(4096).unwrap();
    buf.emit_u32(0);
    let p = buf.ptr_at(2);
    assert_eq!(p as usize, buf.base_ptr() as usize + 2);
    assert_eq!(buf.offset_of(p), Some(2));
    let outside = buf.base_ptr().wrapping_add(buf.capacity());
    assert_eq!(buf.offset_of(outside), None);
}

#[test]
fn test_execute() {
    let mut buf = CodeBuffer::new(4096).unwrap();
    // mov eax, 42; ret
    buf.emit_u8(0xB8);
    buf.emit_u32(42);
    buf.emit_u8(0xC3);
    let f: extern "C" fn() -> u32 = unsafe { std::mem::transmute(buf.base_ptr()) };
    assert_eq!(f(), 42);
}
