//! Hardware-stacked exception frame
//!
//! On exception entry a Cortex-M core pushes eight words onto whichever stack
//! was active (MSP or PSP) before vectoring to the handler. The frame base is
//! the value of that stack pointer on handler entry:
//!
//! | Offset | Word | Register |
//! |--------|------|----------|
//! | 0x00   | 0    | R0       |
//! | 0x04   | 1    | R1       |
//! | 0x08   | 2    | R2       |
//! | 0x0C   | 3    | R3       |
//! | 0x10   | 4    | R12      |
//! | 0x14   | 5    | LR       |
//! | 0x18   | 6    | PC       |
//! | 0x1C   | 7    | xPSR     |
//!
//! An extended frame (FPU context active, EXC_RETURN bit 4 clear) appends
//! S0-S15 and FPSCR after these eight words; the layout of the first eight is
//! unchanged, so this type reads both.

use crate::exc_return::ExcReturn;

/// Number of words in the basic exception frame.
pub const FRAME_WORDS: usize = 8;

/// Register names in stack order, as printed in the report.
pub const FRAME_LABELS: [&str; FRAME_WORDS] = ["R0", "R1", "R2", "R3", "R12", "LR", "PC", "PSR"];

/// The eight words pushed by hardware on exception entry.
///
/// `#[repr(C)]` pins the field order to the stacking order so the struct can
/// be read directly from the frame base.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExceptionFrame {
    /// R0 (first argument register)
    pub r0: u32,
    /// R1
    pub r1: u32,
    /// R2
    pub r2: u32,
    /// R3
    pub r3: u32,
    /// R12 (intra-procedure scratch)
    pub r12: u32,
    /// Link register of the interrupted code
    pub lr: u32,
    /// Program counter at the fault point
    pub pc: u32,
    /// Program status register
    pub xpsr: u32,
}

impl ExceptionFrame {
    /// Build a frame from eight words in stack order.
    pub const fn from_words(words: [u32; FRAME_WORDS]) -> Self {
        let [r0, r1, r2, r3, r12, lr, pc, xpsr] = words;
        Self {
            r0,
            r1,
            r2,
            r3,
            r12,
            lr,
            pc,
            xpsr,
        }
    }

    /// The frame as eight words in stack order.
    pub const fn to_words(&self) -> [u32; FRAME_WORDS] {
        [
            self.r0, self.r1, self.r2, self.r3, self.r12, self.lr, self.pc, self.xpsr,
        ]
    }

    /// Copy the frame out of memory at `base`.
    ///
    /// Every word is read volatile: the frame lives on a stack that the
    /// handler itself is about to grow into, so the compiler must not defer
    /// or elide these loads.
    ///
    /// # Safety
    ///
    /// `base` must be non-null, 4-byte aligned and point to at least
    /// [`FRAME_WORDS`] readable words. On hardware this is the stack pointer
    /// selected by EXC_RETURN bit 2 at handler entry.
    pub unsafe fn read(base: *const u32) -> Self {
        let mut words = [0u32; FRAME_WORDS];
        for (offset, word) in words.iter_mut().enumerate() {
            // SAFETY: the caller guarantees FRAME_WORDS readable words at base,
            // and offset < FRAME_WORDS.
            *word = unsafe { base.add(offset).read_volatile() };
        }
        Self::from_words(words)
    }

    /// Read the frame from whichever stack `exc_return` names.
    ///
    /// Mirrors the trap entry shim: bit 2 picks `msp` or `psp`, never both.
    ///
    /// # Safety
    ///
    /// The selected pointer must satisfy the contract of [`read`](Self::read).
    pub unsafe fn capture(exc_return: ExcReturn, msp: *const u32, psp: *const u32) -> Self {
        // SAFETY: forwarded to the caller.
        unsafe { Self::read(exc_return.select(msp, psp)) }
    }

    /// `(label, value)` pairs in stack order.
    pub fn labelled(&self) -> impl Iterator<Item = (&'static str, u32)> {
        FRAME_LABELS.into_iter().zip(self.to_words())
    }

    /// Whether the stacked PSR has the Thumb bit set.
    ///
    /// A clear T bit at the fault point is what INVSTATE reports.
    pub fn thumb_state(&self) -> bool {
        self.xpsr & XPSR_T != 0
    }

    /// Exception number field of the stacked PSR (0 means thread mode).
    #[allow(clippy::cast_possible_truncation)] // masked to 9 bits
    pub fn exception_number(&self) -> u16 {
        (self.xpsr & XPSR_EXCEPTION_MASK) as u16
    }
}

/// xPSR Thumb state bit (EPSR.T).
pub const XPSR_T: u32 = 0x0100_0000;

/// xPSR exception number field (IPSR).
pub const XPSR_EXCEPTION_MASK: u32 = 0x0000_01FF;

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn words_follow_stacking_order() {
        let frame = ExceptionFrame::from_words([10, 11, 12, 13, 14, 15, 16, 17]);
        assert_eq!(frame.r0, 10);
        assert_eq!(frame.r12, 14);
        assert_eq!(frame.lr, 15);
        assert_eq!(frame.pc, 16);
        assert_eq!(frame.xpsr, 17);
        assert_eq!(frame.to_words(), [10, 11, 12, 13, 14, 15, 16, 17]);
    }

    #[test]
    fn repr_c_layout_is_eight_packed_words() {
        assert_eq!(core::mem::size_of::<ExceptionFrame>(), FRAME_WORDS * 4);
        assert_eq!(core::mem::align_of::<ExceptionFrame>(), 4);
    }

    #[test]
    fn read_copies_from_memory_in_order() {
        let stack: [u32; 10] = [
            0xDEAD_0000,
            0xDEAD_0001,
            0xDEAD_0002,
            0xDEAD_0003,
            0xDEAD_000C,
            0x0800_1235,
            0x0800_1234,
            0x2100_0000,
            0xFFFF_FFFF,
            0xFFFF_FFFF,
        ];
        // SAFETY: `stack` holds more than FRAME_WORDS aligned words.
        let frame = unsafe { ExceptionFrame::read(stack.as_ptr()) };
        assert_eq!(frame.r0, 0xDEAD_0000);
        assert_eq!(frame.r3, 0xDEAD_0003);
        assert_eq!(frame.pc, 0x0800_1234);
        assert_eq!(frame.xpsr, 0x2100_0000);
    }

    #[test]
    fn labels_pair_with_values() {
        let frame = ExceptionFrame::from_words([0, 1, 2, 3, 4, 5, 6, 7]);
        let pairs: Vec<_> = frame.labelled().collect();
        assert_eq!(pairs.first(), Some(&("R0", 0)));
        assert_eq!(pairs.get(4), Some(&("R12", 4)));
        assert_eq!(pairs.last(), Some(&("PSR", 7)));
    }

    #[test]
    fn psr_fields() {
        let frame = ExceptionFrame::from_words([0, 0, 0, 0, 0, 0, 0, 0x0100_0003]);
        assert!(frame.thumb_state());
        assert_eq!(frame.exception_number(), 3);

        let arm_state = ExceptionFrame::from_words([0; FRAME_WORDS]);
        assert!(!arm_state.thumb_state());
        assert_eq!(arm_state.exception_number(), 0);
    }
}
