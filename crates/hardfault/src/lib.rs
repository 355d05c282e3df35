//! HardFault capture and report for Cortex-M
//!
//! When the processor raises a HardFault this crate captures the stacked
//! exception frame, decodes the System Control Block fault-status registers
//! and prints a structured, human-readable report before halting the core in
//! a debugger-friendly state.
//!
//! # Architecture
//!
//! ```text
//! HardFault vector
//!         ↓
//! Trap entry (trap module: global_asm shim, selects MSP/PSP from EXC_RETURN)
//!         ↓
//! Reporter (report_hard_fault: frame + status snapshot → report → sink)
//!         ↓
//! halt() (BKPT, then idle loop)
//! ```
//!
//! Everything below the shim is ordinary Rust and runs on the host: build an
//! [`ExceptionFrame`] and a [`FaultStatus`] by hand, wrap them in a
//! [`HardFaultReport`] and format it.
//!
//! # Features
//!
//! - `hardware` - Cortex-M target: trap entry, SCB reads, ITM sink, halt
//! - `defmt` - `defmt::Format` derives and a one-line fault summary over RTT
//! - `std` - host tooling (offline decoding in `xtask`)
//!
//! # Example
//!
//! ```
//! use hardfault::{ExcReturn, ExceptionFrame, FaultStatus, HardFaultReport};
//!
//! let frame = ExceptionFrame::from_words([0, 1, 2, 3, 12, 0x0800_0101, 0x0800_0200, 0x2100_0000]);
//! let status = FaultStatus {
//!     hfsr: 0x4000_0000,
//!     cfsr: 0x0000_0082,
//!     mmfar: 0xAAAA_AAAA,
//!     bfar: 0,
//!     afsr: 0,
//! };
//! let report = HardFaultReport::new(&frame, ExcReturn::from_bits(0xFFFF_FFF9), &status);
//! let text = report.to_string();
//! assert!(text.contains(" - MMAR holds a valid address."));
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in the fault path
#![deny(clippy::expect_used)] // no .expect() in the fault path
#![deny(clippy::panic)] // a panic inside the HardFault handler locks up the core
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // the report goes to a ByteSink, never stdout
// Pedantic lints suppressed for this register-level crate:
#![allow(clippy::doc_markdown)] // register names (HFSR, CFSR, EXC_RETURN) in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod decode;
pub mod exc_return;
pub mod frame;
pub mod report;
pub mod sink;
pub mod status;

#[cfg(feature = "hardware")]
pub mod trap;

pub use decode::{AddressRegister, Check, Detail, Finding, Group, Register, DETAILS};
pub use exc_return::{ActiveStack, ExcReturn, ExcReturnError, FrameKind, ReturnMode};
pub use frame::ExceptionFrame;
pub use report::{write_report, HardFaultReport};
pub use sink::{ByteSink, IoSink, NullSink, SinkWriter};
pub use status::FaultStatus;
