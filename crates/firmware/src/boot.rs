//! Demo boot sequence.
//!
//! Order matters: the report sink must be installed before anything can
//! fault, otherwise the report is discarded and only the defmt summary
//! reaches the probe.
//!
//!   1. embassy_stm32::init (clocks, time driver)
//!   2. USART1 TX on PA9 at [`REPORT_BAUD_RATE`]
//!   3. `hardfault::sink::install`
//!   4. Store to [`FAULT_TRIGGER_ADDRESS`]

/// Ordered boot steps, asserted by the source-structure tests.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. embassy_stm32::init: clocks and time driver",
    "2. USART1 TX (PA9) at REPORT_BAUD_RATE, 8N1, blocking",
    "3. hardfault::sink::install: USART1 owned by the fault path",
    "4. Store to FAULT_TRIGGER_ADDRESS: unmapped, raises a forced HardFault",
];

/// Baud rate of the report UART (8 data bits, no parity, 1 stop bit).
pub const REPORT_BAUD_RATE: u32 = 115_200;

/// Address the demo stores to.
///
/// Nothing is mapped at 0xAAAA_AAAA on the STM32H743, so the store raises a
/// bus or MemManage fault that escalates to a forced HardFault. The address
/// is not word aligned; `hardware::trigger_fault` issues the store as a raw
/// `STR`.
pub const FAULT_TRIGGER_ADDRESS: usize = 0xAAAA_AAAA;

/// Value stored at [`FAULT_TRIGGER_ADDRESS`]. It lands in R0 or R1 of the
/// stacked frame, which makes the report easy to recognise.
pub const FAULT_TRIGGER_VALUE: u32 = 0x0123_4567;

/// Hardware-only boot helpers.
#[cfg(feature = "hardware")]
pub mod hardware {
    use embassy_stm32::usart::{Config, DataBits, Parity, StopBits};

    use super::{FAULT_TRIGGER_ADDRESS, FAULT_TRIGGER_VALUE, REPORT_BAUD_RATE};

    /// USART1 configuration for the report transport.
    pub fn report_uart_config() -> Config {
        let mut config = Config::default();
        config.baudrate = REPORT_BAUD_RATE;
        config.data_bits = DataBits::DataBits8;
        config.parity = Parity::ParityNone;
        config.stop_bits = StopBits::STOP1;
        config
    }

    /// Store to an unmapped address. Never returns: the store faults and the
    /// HardFault reporter halts the core.
    ///
    /// The address is only halfword aligned, so the store is a raw `STR`
    /// rather than a `*mut u32` write: Rust requires word alignment for the
    /// latter and checks it in debug builds before the store is issued.
    pub fn trigger_fault() -> ! {
        // SAFETY: deliberately invalid. The store is meant to fault; no Rust
        // object lives at this address and no Rust pointer is formed to it.
        unsafe {
            core::arch::asm!(
                "str {value}, [{address}]",
                address = in(reg) FAULT_TRIGGER_ADDRESS,
                value = in(reg) FAULT_TRIGGER_VALUE,
                options(nostack, preserves_flags),
            );
        }
        hardfault::trap::halt()
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn trigger_address_is_outside_every_memory_region() {
        // FLASH, DTCM, AXI SRAM, SRAM1-4, peripherals, FMC/QSPI windows
        let mapped: &[(usize, usize)] = &[
            (0x0800_0000, 0x0820_0000),
            (0x2000_0000, 0x2002_0000),
            (0x2400_0000, 0x2408_0000),
            (0x3000_0000, 0x3800_FFFF),
            (0x4000_0000, 0x6000_0000),
            (0x6000_0000, 0xA000_0000),
            (0xC000_0000, 0xE000_0000),
        ];
        for (start, end) in mapped {
            assert!(
                !(*start..*end).contains(&FAULT_TRIGGER_ADDRESS),
                "trigger address falls inside {start:#x}..{end:#x}"
            );
        }
    }

    #[test]
    fn trigger_address_needs_a_raw_store() {
        // A `*mut u32` here would be misaligned, which is why the store is
        // issued with `STR` instead of `write_volatile`.
        assert_ne!(FAULT_TRIGGER_ADDRESS % core::mem::align_of::<u32>(), 0);
        // `STR` takes a 32-bit address register.
        assert!(u32::try_from(FAULT_TRIGGER_ADDRESS).is_ok());
    }

    #[test]
    fn report_uart_runs_at_115200() {
        assert_eq!(REPORT_BAUD_RATE, 115_200);
    }

    #[test]
    fn sink_is_installed_before_the_fault() {
        let install = BOOT_SEQUENCE_STEPS
            .iter()
            .position(|s| s.contains("sink::install"));
        let trigger = BOOT_SEQUENCE_STEPS
            .iter()
            .position(|s| s.contains("FAULT_TRIGGER_ADDRESS"));
        assert!(install < trigger);
        assert!(install.is_some());
    }
}
