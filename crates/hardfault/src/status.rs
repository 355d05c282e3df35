//! Fault status registers (System Control Block)
//!
//! # Register map (ARMv7-M, ARM DDI0403E §B3.2)
//!
//! | Register | Address     | Contents                                         |
//! |----------|-------------|--------------------------------------------------|
//! | CFSR     | 0xE000_ED28 | MMFSR [7:0], BFSR [15:8], UFSR [31:16]           |
//! | HFSR     | 0xE000_ED2C | Escalation / vector-table / debug-event flags    |
//! | MMFAR    | 0xE000_ED34 | MemManage fault address (valid iff MMARVALID)    |
//! | BFAR     | 0xE000_ED38 | Bus fault address (valid iff BFARVALID)          |
//! | AFSR     | 0xE000_ED3C | Implementation-defined auxiliary flags           |
//!
//! Every flag is independent: several may be set at once, and none of them
//! implies another. The address registers are the exception: their contents
//! are meaningless unless the matching *ARVALID bit in CFSR is set, so the
//! accessors on [`FaultStatus`] return `Option<u32>`.

/// HFSR bits.
pub mod hfsr {
    /// Bus fault on a vector table read during exception processing
    pub const VECTTBL: u32 = 0x0000_0002;
    /// A configurable fault was escalated to HardFault
    pub const FORCED: u32 = 0x4000_0000;
    /// Debug event while halting debug is disabled
    pub const DEBUGEVT: u32 = 0x8000_0000;
}

/// MemManage Fault Status bits (CFSR [7:0]).
pub mod mmfsr {
    /// Instruction access violation
    pub const IACCVIOL: u32 = 0x0000_0001;
    /// Data access violation
    pub const DACCVIOL: u32 = 0x0000_0002;
    /// MemManage fault on unstacking for an exception return
    pub const MUNSTKERR: u32 = 0x0000_0008;
    /// MemManage fault on stacking for exception entry
    pub const MSTKERR: u32 = 0x0000_0010;
    /// MemManage fault during lazy floating-point state preservation
    pub const MLSPERR: u32 = 0x0000_0020;
    /// MMFAR holds a valid fault address
    pub const MMARVALID: u32 = 0x0000_0080;
    /// Whole sub-register
    pub const MASK: u32 = 0x0000_00FF;
}

/// BusFault Status bits (CFSR [15:8]).
pub mod bfsr {
    /// Instruction bus error
    pub const IBUSERR: u32 = 0x0000_0100;
    /// Precise data bus error
    pub const PRECISERR: u32 = 0x0000_0200;
    /// Imprecise data bus error
    pub const IMPRECISERR: u32 = 0x0000_0400;
    /// BusFault on unstacking for an exception return
    pub const UNSTKERR: u32 = 0x0000_0800;
    /// BusFault on stacking for exception entry
    pub const STKERR: u32 = 0x0000_1000;
    /// BusFault during lazy floating-point state preservation
    pub const LSPERR: u32 = 0x0000_2000;
    /// BFAR holds a valid fault address
    pub const BFARVALID: u32 = 0x0000_8000;
    /// Whole sub-register
    pub const MASK: u32 = 0x0000_FF00;
}

/// UsageFault Status bits (CFSR [31:16]).
pub mod ufsr {
    /// Undefined instruction
    pub const UNDEFINSTR: u32 = 0x0001_0000;
    /// Invalid state: EPSR.T or EPSR.IT misuse
    pub const INVSTATE: u32 = 0x0002_0000;
    /// Invalid EXC_RETURN loaded into PC
    pub const INVPC: u32 = 0x0004_0000;
    /// Coprocessor access while disabled or absent
    pub const NOCP: u32 = 0x0008_0000;
    /// Unaligned access (always for LDM/STM/LDRD; others only with CCR.UNALIGN_TRP)
    pub const UNALIGNED: u32 = 0x0100_0000;
    /// Integer division by zero (only with CCR.DIV_0_TRP)
    pub const DIVBYZERO: u32 = 0x0200_0000;
    /// Whole sub-register
    pub const MASK: u32 = 0xFFFF_0000;
}

/// The five fault status registers, captured together at report time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultStatus {
    /// HardFault Status Register
    pub hfsr: u32,
    /// Configurable Fault Status Register (MMFSR | BFSR | UFSR)
    pub cfsr: u32,
    /// MemManage Fault Address Register, raw
    pub mmfar: u32,
    /// BusFault Address Register, raw
    pub bfar: u32,
    /// Auxiliary Fault Status Register
    pub afsr: u32,
}

impl FaultStatus {
    /// Snapshot the live registers.
    #[cfg(feature = "hardware")]
    pub fn read() -> Self {
        // SAFETY: SCB::PTR is the architecturally fixed SCB register block.
        // The fault status registers are read-only from the reporter's side;
        // reading them has no side effects.
        let scb = unsafe { &*cortex_m::peripheral::SCB::PTR };
        Self {
            hfsr: scb.hfsr.read(),
            cfsr: scb.cfsr.read(),
            mmfar: scb.mmfar.read(),
            bfar: scb.bfar.read(),
            afsr: scb.afsr.read(),
        }
    }

    /// `(label, value)` pairs in report order.
    pub fn labelled(&self) -> [(&'static str, u32); 5] {
        [
            ("HFSR", self.hfsr),
            ("CFSR", self.cfsr),
            ("MMAR", self.mmfar),
            ("BFAR", self.bfar),
            ("AFSR", self.afsr),
        ]
    }

    /// MemManage Fault Status sub-register.
    #[allow(clippy::cast_possible_truncation)] // masked to 8 bits
    pub const fn mmfsr(&self) -> u8 {
        (self.cfsr & mmfsr::MASK) as u8
    }

    /// BusFault Status sub-register.
    #[allow(clippy::cast_possible_truncation)] // masked and shifted to 8 bits
    pub const fn bfsr(&self) -> u8 {
        (self.cfsr & bfsr::MASK).wrapping_shr(8) as u8
    }

    /// UsageFault Status sub-register.
    #[allow(clippy::cast_possible_truncation)] // shifted to 16 bits
    pub const fn ufsr(&self) -> u16 {
        self.cfsr.wrapping_shr(16) as u16
    }

    /// MemManage fault address, if MMARVALID is set.
    pub const fn mem_manage_address(&self) -> Option<u32> {
        if self.cfsr & mmfsr::MMARVALID != 0 {
            Some(self.mmfar)
        } else {
            None
        }
    }

    /// Bus fault address, if BFARVALID is set.
    pub const fn bus_fault_address(&self) -> Option<u32> {
        if self.cfsr & bfsr::BFARVALID != 0 {
            Some(self.bfar)
        } else {
            None
        }
    }

    /// Whether the HardFault is an escalated configurable fault.
    pub const fn is_forced(&self) -> bool {
        self.hfsr & hfsr::FORCED != 0
    }
}
