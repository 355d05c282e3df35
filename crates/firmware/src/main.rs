//! HardFault report demo - Main Entry Point
//!
//! Hardware-only entry point for STM32H743ZI.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_stm32::dma::NoDma;
use embassy_stm32::usart::UartTx;
use embassy_time::Timer;
use static_cell::StaticCell;

use firmware::boot::{self, hardware};
use firmware::UartSink;
use hardfault::sink::ItmSink;

// Logging transport and panic handler
use defmt_rtt as _;
use panic_probe as _;

/// USART1 transmitter, owned by the fault path once installed.
static REPORT_SINK: StaticCell<UartSink> = StaticCell::new();

/// SWO fallback when USART1 cannot be configured.
static ITM_SINK: StaticCell<ItmSink> = StaticCell::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    defmt::info!("HardFault report demo v{=str}", env!("CARGO_PKG_VERSION"));
    for step in boot::BOOT_SEQUENCE_STEPS {
        defmt::debug!("boot: {=str}", step);
    }

    // Step 1: clocks and time driver
    let p = embassy_stm32::init(embassy_stm32::Config::default());

    // Step 2 + 3: USART1 TX on PA9, handed to the fault path
    match UartTx::new(p.USART1, p.PA9, NoDma, hardware::report_uart_config()) {
        Ok(tx) => {
            let sink = REPORT_SINK.init(UartSink::new(tx));
            let _ = hardfault::sink::install(sink);
            defmt::info!(
                "report sink installed: USART1 @ {=u32} baud",
                boot::REPORT_BAUD_RATE
            );
        }
        Err(e) => {
            defmt::error!("USART1 config rejected: {}", e);
            let _ = hardfault::sink::install(ITM_SINK.init(ItmSink));
            defmt::warn!("report sink installed: ITM stimulus port 0 (SWO)");
        }
    }

    // Let the probe drain RTT before the core halts.
    Timer::after_millis(100).await;

    // Step 4: fault on purpose
    defmt::warn!(
        "storing {=u32:#010x} to {=usize:#010x}",
        boot::FAULT_TRIGGER_VALUE,
        boot::FAULT_TRIGGER_ADDRESS
    );
    hardware::trigger_fault();
}
