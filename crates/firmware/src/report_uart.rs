//! USART1 as the HardFault report transport.

use embassy_stm32::dma::NoDma;
use embassy_stm32::peripherals::USART1;
use embassy_stm32::usart::UartTx;
use hardfault::ByteSink;

/// Blocking, DMA-free USART1 transmitter.
///
/// Blocking writes are the only kind that work from the HardFault handler:
/// interrupts at lower priority never run again once the core has faulted.
pub struct UartSink {
    tx: UartTx<'static, USART1, NoDma>,
}

impl UartSink {
    /// Take ownership of the configured transmitter.
    pub fn new(tx: UartTx<'static, USART1, NoDma>) -> Self {
        Self { tx }
    }
}

impl ByteSink for UartSink {
    fn transmit(&mut self, bytes: &[u8]) {
        if let Err(e) = self.tx.blocking_write(bytes) {
            defmt::warn!("report UART write failed: {}", e);
            return;
        }
        let _ = self.tx.blocking_flush();
    }
}
