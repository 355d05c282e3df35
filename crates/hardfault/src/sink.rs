//! Byte sink for the report text
//!
//! The reporter needs exactly one capability from its environment: push bytes
//! out. [`ByteSink::transmit`] has no return value because nothing useful can
//! be done with a transport error while the core is faulted; a sink either
//! absorbs bytes or blocks until they are sent.
//!
//! # Installing the transport
//!
//! The HardFault vector cannot take arguments, so the application hands its
//! transport over once at boot:
//!
//! ```ignore
//! static REPORT_SINK: StaticCell<IoSink<Uart>> = StaticCell::new();
//! hardfault::sink::install(REPORT_SINK.init(IoSink::new(uart)));
//! ```
//!
//! From then on the sink belongs to the fault path. If nothing was installed
//! the report is discarded (the defmt summary, when enabled, still goes out
//! over RTT).

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;

/// Destination for report bytes.
pub trait ByteSink {
    /// Send `bytes` in order.
    fn transmit(&mut self, bytes: &[u8]);
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn transmit(&mut self, bytes: &[u8]) {
        (**self).transmit(bytes);
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ByteSink for NullSink {
    fn transmit(&mut self, _bytes: &[u8]) {}
}

/// Bounded capture buffer; bytes past capacity are dropped.
impl<const N: usize> ByteSink for heapless::Vec<u8, N> {
    fn transmit(&mut self, bytes: &[u8]) {
        let room = N.saturating_sub(self.len());
        let take = bytes.len().min(room);
        if let Some(head) = bytes.get(..take) {
            // Cannot fail: `take` fits in the remaining capacity.
            let _ = self.extend_from_slice(head);
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl ByteSink for std::vec::Vec<u8> {
    fn transmit(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Adapts any blocking [`embedded_io::Write`] transport (UART, USB CDC, ...).
///
/// Write errors are dropped: there is no retry policy in a fault state.
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: embedded_io::Write> IoSink<W> {
    /// Wrap a writer.
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Give the writer back.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: embedded_io::Write> ByteSink for IoSink<W> {
    fn transmit(&mut self, bytes: &[u8]) {
        if self.inner.write_all(bytes).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("report transport rejected {=usize} bytes", bytes.len());
            return;
        }
        let _ = self.inner.flush();
    }
}

/// ITM stimulus port 0, for probes that capture SWO.
#[cfg(feature = "hardware")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ItmSink;

#[cfg(feature = "hardware")]
impl ByteSink for ItmSink {
    fn transmit(&mut self, bytes: &[u8]) {
        // SAFETY: ITM::PTR is the architecturally fixed ITM register block.
        // Only the fault path writes stimulus port 0 once the core has faulted.
        let itm = unsafe { &mut *cortex_m::peripheral::ITM::PTR.cast_mut() };
        if let Some(port) = itm.stim.first_mut() {
            cortex_m::itm::write_all(port, bytes);
        }
    }
}

/// [`core::fmt::Write`] over a [`ByteSink`], so the report can be streamed with
/// `write!` without an intermediate buffer.
pub struct SinkWriter<'a, S: ByteSink + ?Sized> {
    sink: &'a mut S,
}

impl<'a, S: ByteSink + ?Sized> SinkWriter<'a, S> {
    /// Borrow `sink` for formatting.
    pub fn new(sink: &'a mut S) -> Self {
        Self { sink }
    }
}

impl<S: ByteSink + ?Sized> fmt::Write for SinkWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.sink.transmit(s.as_bytes());
        Ok(())
    }
}

static INSTALLED: Mutex<RefCell<Option<&'static mut (dyn ByteSink + Send)>>> =
    Mutex::new(RefCell::new(None));

/// Hand `sink` to the fault path. Returns the previously installed sink.
pub fn install(
    sink: &'static mut (dyn ByteSink + Send),
) -> Option<&'static mut (dyn ByteSink + Send)> {
    critical_section::with(|cs| INSTALLED.borrow(cs).replace(Some(sink)))
}

/// Take the installed sink back out of the fault path.
pub fn uninstall() -> Option<&'static mut (dyn ByteSink + Send)> {
    critical_section::with(|cs| INSTALLED.borrow(cs).take())
}

/// Whether a sink is installed.
pub fn is_installed() -> bool {
    critical_section::with(|cs| {
        INSTALLED
            .borrow(cs)
            .try_borrow()
            .is_ok_and(|slot| slot.is_some())
    })
}

/// Run `f` with the installed sink, or with [`NullSink`] if there is none.
///
/// A slot that is already borrowed (the fault hit inside [`install`]) is
/// treated as empty rather than panicking.
pub fn with_installed<R>(f: impl FnOnce(&mut dyn ByteSink) -> R) -> R {
    critical_section::with(|cs| match INSTALLED.borrow(cs).try_borrow_mut() {
        Ok(mut slot) => match slot.as_deref_mut() {
            Some(sink) => f(sink),
            None => f(&mut NullSink),
        },
        Err(_) => f(&mut NullSink),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn heapless_sink_truncates_at_capacity() {
        let mut sink: heapless::Vec<u8, 8> = heapless::Vec::new();
        sink.transmit(b"0123");
        sink.transmit(b"456789");
        assert_eq!(sink.as_slice(), b"01234567");
        sink.transmit(b"more");
        assert_eq!(sink.len(), 8);
    }

    #[test]
    fn writer_streams_formatted_text() {
        let mut sink: Vec<u8> = Vec::new();
        let mut writer = SinkWriter::new(&mut sink);
        write!(writer, "0x{:08X}", 0x1234_u32).unwrap();
        assert_eq!(sink, b"0x00001234");
    }

    #[test]
    fn mut_ref_forwards() {
        let mut sink: Vec<u8> = Vec::new();
        {
            let mut by_ref = &mut sink;
            by_ref.transmit(b"abc");
        }
        assert_eq!(sink, b"abc");
    }

    struct Recorder {
        written: Vec<u8>,
        fail: bool,
    }

    impl embedded_io::ErrorType for Recorder {
        type Error = embedded_io::ErrorKind;
    }

    impl embedded_io::Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if self.fail {
                return Err(embedded_io::ErrorKind::Other);
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn io_sink_writes_everything() {
        let mut sink = IoSink::new(Recorder {
            written: Vec::new(),
            fail: false,
        });
        sink.transmit(b"report");
        assert_eq!(sink.into_inner().written, b"report");
    }

    #[test]
    fn io_sink_swallows_errors() {
        let mut sink = IoSink::new(Recorder {
            written: Vec::new(),
            fail: true,
        });
        sink.transmit(b"report");
        assert!(sink.into_inner().written.is_empty());
    }

    static COUNTED: AtomicUsize = AtomicUsize::new(0);

    struct Counting;

    impl ByteSink for Counting {
        fn transmit(&mut self, bytes: &[u8]) {
            COUNTED.fetch_add(bytes.len(), Ordering::SeqCst);
        }
    }

    // The slot is process-wide, so every assertion about it lives in this one test.
    #[test]
    fn install_routes_fault_output() {
        assert!(!is_installed());
        with_installed(|sink| sink.transmit(b"dropped"));
        assert_eq!(COUNTED.load(Ordering::SeqCst), 0);

        let previous = install(Box::leak(Box::new(Counting)));
        assert!(previous.is_none());
        assert!(is_installed());

        with_installed(|sink| sink.transmit(b"12345"));
        assert_eq!(COUNTED.load(Ordering::SeqCst), 5);

        assert!(uninstall().is_some());
        assert!(!is_installed());
        with_installed(|sink| sink.transmit(b"dropped"));
        assert_eq!(COUNTED.load(Ordering::SeqCst), 5);
    }
}
