use crate::code_buffer::CodeBuffer;
use crate::x86_64::emitter::{emit_opc, X86Cond, OPC_JCC_long, OPC_JMP_long};

/// A branch target within one compiled function.
///
/// Branches can reference a label before it is bound; their rel32
/// displacements are back-patched by [`Label::bind`]. Branches emitted
/// after binding are resolved immediately.
#[derive(Debug, Clone, Default)]
pub struct Label {
    value: Option<usize>,
    /// Offsets of rel32 fields waiting for the label to be bound.
    uses: Vec<usize>,
}

impl Label {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound offset, if any.
    pub fn value(&self) -> Option<usize> {
        self.value
    }

    /// Whether forward references are still waiting to be patched.
    pub fn has_pending_uses(&self) -> bool {
        !self.uses.is_empty()
    }

    /// Place the label at the current offset and patch pending uses.
    pub fn bind(&mut self, buf: &mut CodeBuffer) {
        let target = buf.offset();
        self.value = Some(target);
        for patch in self.uses.drain(..) {
            patch_rel32(buf, patch, target);
        }
    }

    fn reference(&mut self, buf: &mut CodeBuffer) {
        let patch = buf.offset();
        buf.emit_u32(0);
        match self.value {
            Some(target) => patch_rel32(buf, patch, target),
            None => self.uses.push(patch),
        }
    }
}

/// Point the rel32 field at `patch` to `target`.
pub fn patch_rel32(buf: &mut CodeBuffer, patch: usize, target: usize) {
    let disp = target as i64 - (patch as i64 + 4);
    buf.patch_u32(patch, disp as i32 as u32);
}

/// Emit Jcc rel32 to a label.
pub fn emit_jcc_label(buf: &mut CodeBuffer, cond: X86Cond, label: &mut Label) {
    emit_opc(buf, OPC_JCC_long + (cond as u32), 0, 0);
    label.reference(buf);
}

/// Emit JMP rel32 to a label.
pub fn emit_jmp_label(buf: &mut CodeBuffer, label: &mut Label) {
    buf.emit_u8(OPC_JMP_long as u8);
    label.reference(buf);
}
