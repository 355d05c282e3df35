//! HardFault report demo firmware
//!
//! Boots an STM32H743ZI, hands USART1 to the HardFault reporter and then
//! stores to an unmapped address so the report can be read on a serial
//! terminal.
//!
//! # Architecture
//!
//! ```text
//! main.rs (embassy entry)
//!         ↓
//! boot (UART config, fault trigger)
//!         ↓
//! report_uart (UartSink: blocking USART1 writes)
//!         ↓
//! hardfault::sink::install → HardFault trap → report on USART1
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for STM32H7 target (embassy, cortex-m-rt, trap shim)
//!
//! Without `hardware` only the host-testable constants in [`boot`] build.
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo run --release --target thumbv7em-none-eabihf -p firmware --features hardware
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod boot;

#[cfg(feature = "hardware")]
pub mod report_uart;

#[cfg(feature = "hardware")]
pub use report_uart::UartSink;
