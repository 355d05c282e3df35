//! HardFault trap entry (hardware target only)
//!
//! # Entry sequence
//!
//! On a fault the core stacks R0-R3, R12, LR, PC and xPSR onto the active
//! stack, loads LR with EXC_RETURN and jumps to the `HardFault` vector. The
//! shim below runs with no prologue, so nothing has touched either stack
//! pointer yet:
//!
//! ```text
//! TST   LR, #4          ; EXC_RETURN bit 2: 0 = MSP, 1 = PSP
//! ITE   EQ
//! MRSEQ R0, MSP         ; frame base  (first argument)
//! MRSNE R0, PSP
//! MOV   R1, LR          ; EXC_RETURN  (second argument)
//! B     report_hard_fault
//! ```
//!
//! The bit test and the register read sit in one IT block, so both outcomes
//! of the test map to exactly one stack pointer. The final `B` (not `BL`)
//! keeps LR intact and means the reporter is entered as an ordinary AAPCS
//! call with two arguments that never returns.
//!
//! This overrides cortex-m-rt's default `HardFault` symbol. Whether
//! cortex-m-rt's own trampoline runs first or not, LR and both stack pointers
//! are unchanged on arrival here, so the selection above is always made from
//! the live values.

use core::sync::atomic::{compiler_fence, Ordering};

use crate::exc_return::ExcReturn;
use crate::frame::ExceptionFrame;
use crate::report::write_report;
use crate::sink;
use crate::status::FaultStatus;

core::arch::global_asm!(
    ".section .HardFault.user, \"ax\"",
    ".global HardFault",
    ".type HardFault, %function",
    ".thumb_func",
    "HardFault:",
    "    tst   lr, #4",
    "    ite   eq",
    "    mrseq r0, msp",
    "    mrsne r0, psp",
    "    mov   r1, lr",
    "    b     {report}",
    ".size HardFault, . - HardFault",
    report = sym report_hard_fault,
);

/// Reporter entry, branched to from the `HardFault` shim.
///
/// Copies the frame first (it lives on a stack this function is about to
/// grow), snapshots the status registers, logs a one-line summary over defmt
/// when enabled, streams the full report to the installed sink and halts.
///
/// # Safety
///
/// Only the `HardFault` shim may call this: `frame` must be the stack pointer
/// selected by bit 2 of `exc_return` at exception entry.
#[no_mangle]
pub unsafe extern "C" fn report_hard_fault(frame: *const u32, exc_return: u32) -> ! {
    // SAFETY: the shim passes the base of the hardware-stacked frame, which
    // holds at least FRAME_WORDS words.
    let frame = unsafe { ExceptionFrame::read(frame) };
    let exc_return = ExcReturn::from_bits(exc_return);
    let status = FaultStatus::read();

    #[cfg(feature = "defmt")]
    defmt::error!(
        "HardFault: PC={=u32:#010x} LR={=u32:#010x} HFSR={=u32:#010x} CFSR={=u32:#010x} stack={=str}",
        frame.pc,
        frame.lr,
        status.hfsr,
        status.cfsr,
        exc_return.stack().name()
    );

    sink::with_installed(|sink| write_report(sink, &frame, exc_return, &status));

    halt()
}

/// Terminal state: breakpoint for an attached debugger, then spin forever.
///
/// With no debugger attached the BKPT locks the core up instead; either way
/// execution never continues past this point.
pub fn halt() -> ! {
    cortex_m::asm::bkpt();
    loop {
        compiler_fence(Ordering::SeqCst);
    }
}
