//! EXC_RETURN decoding
//!
//! During exception entry the core loads LR with a magic value whose low
//! bits describe how to return (ARMv7-M ARM §B1.5.8):
//!
//! | Bit | Clear                    | Set                   |
//! |-----|--------------------------|-----------------------|
//! | 2   | frame on MSP             | frame on PSP          |
//! | 3   | return to Handler mode   | return to Thread mode |
//! | 4   | extended frame (FP state)| basic frame           |
//!
//! Bits 31:5 are all ones for every valid encoding.

use thiserror_no_std::Error;

/// Bit 2: stack that holds the exception frame.
pub const SPSEL: u32 = 0x0000_0004;
/// Bit 3: mode to return to.
pub const MODE: u32 = 0x0000_0008;
/// Bit 4: basic (set) or extended (clear) frame.
pub const FTYPE: u32 = 0x0000_0010;
/// Bits 31:5, all ones in every EXC_RETURN value.
pub const PREFIX_MASK: u32 = 0xFFFF_FFE0;

/// Stack pointer in use by the interrupted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveStack {
    /// Main stack pointer (MSP)
    Main,
    /// Process stack pointer (PSP)
    Process,
}

impl ActiveStack {
    /// Register mnemonic.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Main => "MSP",
            Self::Process => "PSP",
        }
    }
}

/// Processor mode restored on exception return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReturnMode {
    /// The fault interrupted another exception handler
    Handler,
    /// The fault interrupted thread-mode code
    Thread,
}

/// Layout of the stacked frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameKind {
    /// Eight words: R0-R3, R12, LR, PC, xPSR
    Basic,
    /// Basic frame followed by S0-S15, FPSCR and a reserved word
    Extended,
}

/// Rejected EXC_RETURN construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExcReturnError {
    /// Bits 31:5 are not all ones, so the value is an ordinary address.
    #[error("0x{0:08X} is not an EXC_RETURN value")]
    NotExcReturn(u32),
}

/// Link-register value captured on HardFault entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExcReturn(u32);

impl ExcReturn {
    /// Thread mode, main stack, basic frame.
    pub const THREAD_MSP: Self = Self(0xFFFF_FFF9);
    /// Thread mode, process stack, basic frame.
    pub const THREAD_PSP: Self = Self(0xFFFF_FFFD);
    /// Handler mode, main stack, basic frame.
    pub const HANDLER_MSP: Self = Self(0xFFFF_FFF1);

    /// Wrap a raw LR value without validation.
    ///
    /// Trap entry has no way to reject what the hardware hands it, so the
    /// reporter takes the word verbatim.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether bits 31:5 carry the EXC_RETURN prefix.
    pub const fn is_exc_return(self) -> bool {
        self.0 & PREFIX_MASK == PREFIX_MASK
    }

    /// Stack holding the exception frame (bit 2).
    pub const fn stack(self) -> ActiveStack {
        if self.0 & SPSEL == 0 {
            ActiveStack::Main
        } else {
            ActiveStack::Process
        }
    }

    /// Mode restored on return (bit 3).
    pub const fn mode(self) -> ReturnMode {
        if self.0 & MODE == 0 {
            ReturnMode::Handler
        } else {
            ReturnMode::Thread
        }
    }

    /// Frame layout (bit 4).
    pub const fn frame_kind(self) -> FrameKind {
        if self.0 & FTYPE == 0 {
            FrameKind::Extended
        } else {
            FrameKind::Basic
        }
    }

    /// Pick the value belonging to the active stack.
    ///
    /// This is the selection the trap entry shim performs with `TST LR, #4`
    /// and an `ITE` block; given the two stack pointers it returns the frame
    /// base. There is no third outcome.
    pub fn select<T>(self, main: T, process: T) -> T {
        match self.stack() {
            ActiveStack::Main => main,
            ActiveStack::Process => process,
        }
    }
}

impl TryFrom<u32> for ExcReturn {
    type Error = ExcReturnError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        let value = Self(bits);
        if value.is_exc_return() {
            Ok(value)
        } else {
            Err(ExcReturnError::NotExcReturn(bits))
        }
    }
}

impl From<ExcReturn> for u32 {
    fn from(value: ExcReturn) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_two_selects_stack() {
        assert_eq!(ExcReturn::THREAD_MSP.stack(), ActiveStack::Main);
        assert_eq!(ExcReturn::HANDLER_MSP.stack(), ActiveStack::Main);
        assert_eq!(ExcReturn::THREAD_PSP.stack(), ActiveStack::Process);
        // Only bit 2 matters, whatever the rest of the word holds.
        assert_eq!(ExcReturn::from_bits(0x0000_0004).stack(), ActiveStack::Process);
        assert_eq!(ExcReturn::from_bits(0xFFFF_FFFB).stack(), ActiveStack::Main);
    }

    #[test]
    fn mode_and_frame_kind() {
        assert_eq!(ExcReturn::THREAD_MSP.mode(), ReturnMode::Thread);
        assert_eq!(ExcReturn::HANDLER_MSP.mode(), ReturnMode::Handler);
        assert_eq!(ExcReturn::THREAD_PSP.frame_kind(), FrameKind::Basic);
        assert_eq!(ExcReturn::from_bits(0xFFFF_FFED).frame_kind(), FrameKind::Extended);
        assert_eq!(ExcReturn::from_bits(0xFFFF_FFED).stack(), ActiveStack::Process);
    }

    #[test]
    fn select_follows_stack() {
        assert_eq!(ExcReturn::THREAD_MSP.select("msp", "psp"), "msp");
        assert_eq!(ExcReturn::THREAD_PSP.select("msp", "psp"), "psp");
    }

    #[test]
    fn checked_construction_rejects_addresses() {
        assert_eq!(ExcReturn::try_from(0xFFFF_FFF9), Ok(ExcReturn::THREAD_MSP));
        assert_eq!(
            ExcReturn::try_from(0x0800_1235),
            Err(ExcReturnError::NotExcReturn(0x0800_1235))
        );
    }

    #[test]
    fn error_message_names_value() {
        let err = ExcReturnError::NotExcReturn(0x0800_0000);
        assert_eq!(err.to_string(), "0x08000000 is not an EXC_RETURN value");
    }

    #[test]
    fn stack_names() {
        assert_eq!(ActiveStack::Main.name(), "MSP");
        assert_eq!(ActiveStack::Process.name(), "PSP");
    }
}
