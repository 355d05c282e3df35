//! Fault-status bit decoding table
//!
//! [`DETAILS`] is the single source of truth for which status bits the report
//! explains, in which order, and with which words. The report walks the table
//! once per [`Group`]; nothing else tests status bits for output.
//!
//! Two kinds of entry exist:
//!
//! - [`Check::Flag`]: one line if the bit is set, nothing otherwise.
//! - [`Check::AddressValid`]: always exactly one outcome. Set yields the
//!   "valid" statement together with the address register's value; clear
//!   yields the "invalid" statement and the address is never shown. The
//!   address register is only consulted through this entry, so printing an
//!   unchecked address is not expressible.

use core::fmt;

use crate::report::EOL;
use crate::status::{bfsr, hfsr, mmfsr, ufsr, FaultStatus};

use AddressRegister::{Bfar, Mmar};
use Group::{BusFault, HardFault, MemManage, UsageFault};
use Register::{Cfsr, Hfsr};

/// Report section an entry belongs to, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Group {
    /// HFSR flags
    HardFault,
    /// CFSR [7:0]
    MemManage,
    /// CFSR [15:8]
    BusFault,
    /// CFSR [31:16]
    UsageFault,
}

impl Group {
    /// All groups in report order.
    pub const ALL: [Group; 4] = [
        Group::HardFault,
        Group::MemManage,
        Group::BusFault,
        Group::UsageFault,
    ];

    /// Section heading.
    pub const fn heading(self) -> &'static str {
        match self {
            Group::HardFault => "Hard fault status:",
            Group::MemManage => "MemManage fault status:",
            Group::BusFault => "Bus fault status:",
            Group::UsageFault => "Usage fault status:",
        }
    }

    /// Table entries of this group, in table order.
    pub fn details(self) -> impl Iterator<Item = &'static Detail> {
        DETAILS.iter().filter(move |detail| detail.group == self)
    }

    /// Findings of this group for `status`, in table order.
    pub fn findings(self, status: &FaultStatus) -> impl Iterator<Item = Finding> + '_ {
        self.details().filter_map(move |detail| detail.evaluate(status))
    }
}

/// Status register an entry tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// HardFault Status Register
    Hfsr,
    /// Configurable Fault Status Register
    Cfsr,
}

impl Register {
    /// Current value of this register in `status`.
    pub const fn value(self, status: &FaultStatus) -> u32 {
        match self {
            Register::Hfsr => status.hfsr,
            Register::Cfsr => status.cfsr,
        }
    }
}

/// Fault address register guarded by a validity bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressRegister {
    /// MemManage Fault Address Register
    Mmar,
    /// BusFault Address Register
    Bfar,
}

impl AddressRegister {
    /// Register name as printed.
    pub const fn name(self) -> &'static str {
        match self {
            AddressRegister::Mmar => "MMAR",
            AddressRegister::Bfar => "BFAR",
        }
    }

    /// Raw register contents. Only [`Detail::evaluate`] calls this, after
    /// testing the validity bit.
    const fn raw(self, status: &FaultStatus) -> u32 {
        match self {
            AddressRegister::Mmar => status.mmfar,
            AddressRegister::Bfar => status.bfar,
        }
    }
}

/// What an entry does with its bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Emit the message when the bit is set.
    Flag(&'static str),
    /// Emit exactly one of valid (with address) / invalid.
    AddressValid(AddressRegister),
}

/// One row of the decoding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detail {
    /// Report section
    pub group: Group,
    /// Register tested
    pub register: Register,
    /// Single-bit mask within `register`
    pub mask: u32,
    /// Outcome
    pub check: Check,
}

impl Detail {
    const fn flag(group: Group, register: Register, mask: u32, message: &'static str) -> Self {
        Self {
            group,
            register,
            mask,
            check: Check::Flag(message),
        }
    }

    const fn address_valid(group: Group, mask: u32, address: AddressRegister) -> Self {
        Self {
            group,
            register: Register::Cfsr,
            mask,
            check: Check::AddressValid(address),
        }
    }

    /// Whether this entry's bit is set in `status`.
    pub const fn is_set(&self, status: &FaultStatus) -> bool {
        self.register.value(status) & self.mask != 0
    }

    /// Outcome of this entry for `status`, if it produces one.
    pub fn evaluate(&self, status: &FaultStatus) -> Option<Finding> {
        let set = self.is_set(status);
        match self.check {
            Check::Flag(message) => set.then_some(Finding::Flag(message)),
            Check::AddressValid(register) if set => Some(Finding::AddressValid {
                register,
                address: register.raw(status),
            }),
            Check::AddressValid(register) => Some(Finding::AddressInvalid(register)),
        }
    }
}

/// A decoded statement about the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Finding {
    /// A set status flag and its meaning
    Flag(&'static str),
    /// The address register holds the faulting address
    AddressValid {
        /// Which register
        register: AddressRegister,
        /// Its contents
        address: u32,
    },
    /// The address register holds nothing meaningful
    AddressInvalid(AddressRegister),
}

impl Finding {
    /// Whether this finding names a fault cause (as opposed to an
    /// address-validity statement).
    pub const fn is_cause(&self) -> bool {
        matches!(self, Finding::Flag(_))
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Flag(message) => write!(f, " - {message}"),
            Finding::AddressValid { register, address } => write!(
                f,
                " - {name} holds a valid address.{EOL} - {name} value: 0x{address:08X}",
                name = register.name()
            ),
            Finding::AddressInvalid(register) => {
                write!(f, " - {} holds an invalid address.", register.name())
            }
        }
    }
}

/// The decoding table, in report order.
///
/// Within each group the address-validity entry comes first.
pub static DETAILS: [Detail; 22] = [
    // HFSR
    Detail::flag(HardFault, Hfsr, hfsr::FORCED, "Forced Hard fault."),
    Detail::flag(HardFault, Hfsr, hfsr::VECTTBL, "Bus fault on vector table read."),
    Detail::flag(HardFault, Hfsr, hfsr::DEBUGEVT, "Debug event has occurred."),
    // MMFSR
    Detail::address_valid(MemManage, mmfsr::MMARVALID, Mmar),
    Detail::flag(
        MemManage,
        Cfsr,
        mmfsr::MLSPERR,
        "Fault occurred during floating-point lazy state preservation.",
    ),
    Detail::flag(
        MemManage,
        Cfsr,
        mmfsr::MSTKERR,
        "Stacking has caused an access violation.",
    ),
    Detail::flag(
        MemManage,
        Cfsr,
        mmfsr::MUNSTKERR,
        "Unstacking has caused an access violation.",
    ),
    Detail::flag(
        MemManage,
        Cfsr,
        mmfsr::DACCVIOL,
        "Load or store at a location that does not permit the operation.",
    ),
    Detail::flag(
        MemManage,
        Cfsr,
        mmfsr::IACCVIOL,
        "Instruction fetch from a location that does not permit execution.",
    ),
    // BFSR
    Detail::address_valid(BusFault, bfsr::BFARVALID, Bfar),
    Detail::flag(
        BusFault,
        Cfsr,
        bfsr::LSPERR,
        "Fault occurred during floating-point lazy state preservation.",
    ),
    Detail::flag(BusFault, Cfsr, bfsr::STKERR, "Stacking has caused a Bus fault."),
    Detail::flag(BusFault, Cfsr, bfsr::UNSTKERR, "Unstacking has caused a Bus fault."),
    Detail::flag(
        BusFault,
        Cfsr,
        bfsr::IMPRECISERR,
        "Data bus error has occurred, but the return address in the stack is not related to the fault.",
    ),
    Detail::flag(
        BusFault,
        Cfsr,
        bfsr::PRECISERR,
        "Data bus error has occurred, and the return address points to the instruction that caused the fault.",
    ),
    Detail::flag(BusFault, Cfsr, bfsr::IBUSERR, "Instruction bus error."),
    // UFSR
    Detail::flag(
        UsageFault,
        Cfsr,
        ufsr::DIVBYZERO,
        "The processor has executed an SDIV or UDIV instruction with a divisor of 0.",
    ),
    Detail::flag(
        UsageFault,
        Cfsr,
        ufsr::UNALIGNED,
        "The processor has made an unaligned memory access.",
    ),
    Detail::flag(UsageFault, Cfsr, ufsr::NOCP, "Attempted to access a coprocessor."),
    Detail::flag(
        UsageFault,
        Cfsr,
        ufsr::INVPC,
        "Illegal attempt to load of EXC_RETURN to the PC.",
    ),
    Detail::flag(
        UsageFault,
        Cfsr,
        ufsr::INVSTATE,
        "Attempted to execute an instruction that makes illegal use of the EPSR.",
    ),
    Detail::flag(
        UsageFault,
        Cfsr,
        ufsr::UNDEFINSTR,
        "The processor has attempted to execute an undefined instruction.",
    ),
];
