//! Diagnostic report rendering
//!
//! The report is plain text for a human on a serial terminal. Its layout is
//! fixed so that logs from different boards diff cleanly:
//!
//! ```text
//!
//! !!!Hard Fault detected!!!
//!
//! Stack frame:
//! R0 :        0x00000000
//! ...
//! PSR:        0x21000000
//!
//! Fault status:
//! HFSR:       0x40000000
//! ...
//! AFSR:       0x00000000
//!
//! Other:
//! EXC_RETURN: 0xFFFFFFF9
//!
//! Details of the fault status:
//! Hard fault status:
//!  - Forced Hard fault.
//! MemManage fault status:
//!  - MMAR holds a valid address.
//!  - MMAR value: 0xAAAAAAAA
//!  - Load or store at a location that does not permit the operation.
//! Bus fault status:
//!  - BFAR holds an invalid address.
//! Usage fault status:
//! ```
//!
//! Every register value is `0x` plus eight upper-case hex digits. Lines end
//! with LF CR (`"\n\r"`), byte for byte what older firmware printed, so logs
//! captured from either diff cleanly.

use core::fmt::{self, Write as _};

use crate::decode::{Finding, Group};
use crate::exc_return::ExcReturn;
use crate::frame::ExceptionFrame;
use crate::sink::{ByteSink, SinkWriter};
use crate::status::FaultStatus;

/// Line terminator (LF then CR).
pub const EOL: &str = "\n\r";

/// Banner line.
pub const BANNER: &str = "!!!Hard Fault detected!!!";

/// Column at which register values start.
const VALUE_COLUMN: usize = 12;

/// Everything the report shows, borrowed for the duration of rendering.
#[derive(Debug, Clone, Copy)]
pub struct HardFaultReport<'a> {
    frame: &'a ExceptionFrame,
    exc_return: ExcReturn,
    status: &'a FaultStatus,
}

impl<'a> HardFaultReport<'a> {
    /// Assemble a report.
    pub const fn new(
        frame: &'a ExceptionFrame,
        exc_return: ExcReturn,
        status: &'a FaultStatus,
    ) -> Self {
        Self {
            frame,
            exc_return,
            status,
        }
    }

    /// Stacked registers.
    pub const fn frame(&self) -> &ExceptionFrame {
        self.frame
    }

    /// EXC_RETURN captured on entry.
    pub const fn exc_return(&self) -> ExcReturn {
        self.exc_return
    }

    /// Status register snapshot.
    pub const fn status(&self) -> &FaultStatus {
        self.status
    }

    /// Every finding, grouped and ordered as printed.
    pub fn findings(&self) -> impl Iterator<Item = (Group, Finding)> + '_ {
        Group::ALL
            .into_iter()
            .flat_map(move |group| group.findings(self.status).map(move |f| (group, f)))
    }

    /// Number of fault causes the status registers explain.
    pub fn cause_count(&self) -> usize {
        self.findings().filter(|(_, f)| f.is_cause()).count()
    }
}

/// One `LABEL:    0xXXXXXXXX` line.
fn register_line(f: &mut fmt::Formatter<'_>, name: &str, value: u32) -> fmt::Result {
    let label_len = name.len().max(3).saturating_add(1);
    let pad = VALUE_COLUMN.saturating_sub(label_len);
    write!(f, "{name:<3}:{:pad$}0x{value:08X}{EOL}", "")
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    write!(f, "{EOL}{title}{EOL}")
}

impl fmt::Display for HardFaultReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, BANNER)?;

        heading(f, "Stack frame:")?;
        for (name, value) in self.frame.labelled() {
            register_line(f, name, value)?;
        }

        heading(f, "Fault status:")?;
        for (name, value) in self.status.labelled() {
            register_line(f, name, value)?;
        }

        heading(f, "Other:")?;
        register_line(f, "EXC_RETURN", self.exc_return.bits())?;

        heading(f, "Details of the fault status:")?;
        for group in Group::ALL {
            write!(f, "{}{EOL}", group.heading())?;
            for finding in group.findings(self.status) {
                write!(f, "{finding}{EOL}")?;
            }
        }
        Ok(())
    }
}

/// Stream the report for one fault into `sink`.
///
/// Output is a pure function of the arguments: the same frame, EXC_RETURN and
/// snapshot always produce the same bytes.
pub fn write_report<S: ByteSink + ?Sized>(
    sink: &mut S,
    frame: &ExceptionFrame,
    exc_return: ExcReturn,
    status: &FaultStatus,
) {
    let report = HardFaultReport::new(frame, exc_return, status);
    // SinkWriter never fails and the Display impl only propagates its errors.
    let _ = write!(SinkWriter::new(sink), "{report}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ExceptionFrame, FaultStatus) {
        (
            ExceptionFrame::from_words([
                0x0000_0001,
                0x0000_0002,
                0x0000_0003,
                0x0000_0004,
                0x0000_000C,
                0x0800_0ABD,
                0x0800_0AC4,
                0x2100_0000,
            ]),
            FaultStatus {
                hfsr: 0x4000_0000,
                cfsr: 0x0000_0082,
                mmfar: 0xAAAA_AAAA,
                bfar: 0xAAAA_AAAA,
                afsr: 0,
            },
        )
    }

    #[test]
    fn register_lines_align_values() {
        let (frame, status) = sample();
        let text = HardFaultReport::new(&frame, ExcReturn::THREAD_MSP, &status).to_string();
        assert!(text.contains("R0 :        0x00000001\n\r"));
        assert!(text.contains("R12:        0x0000000C\n\r"));
        assert!(text.contains("PSR:        0x21000000\n\r"));
        assert!(text.contains("HFSR:       0x40000000\n\r"));
        assert!(text.contains("MMAR:       0xAAAAAAAA\n\r"));
        assert!(text.contains("EXC_RETURN: 0xFFFFFFF9\n\r"));
    }

    #[test]
    fn full_text_for_forced_data_access_violation() {
        let (frame, status) = sample();
        let text = HardFaultReport::new(&frame, ExcReturn::THREAD_MSP, &status).to_string();
        let expected = "\n\r!!!Hard Fault detected!!!\n\r\
            \n\rStack frame:\n\r\
            R0 :        0x00000001\n\r\
            R1 :        0x00000002\n\r\
            R2 :        0x00000003\n\r\
            R3 :        0x00000004\n\r\
            R12:        0x0000000C\n\r\
            LR :        0x08000ABD\n\r\
            PC :        0x08000AC4\n\r\
            PSR:        0x21000000\n\r\
            \n\rFault status:\n\r\
            HFSR:       0x40000000\n\r\
            CFSR:       0x00000082\n\r\
            MMAR:       0xAAAAAAAA\n\r\
            BFAR:       0xAAAAAAAA\n\r\
            AFSR:       0x00000000\n\r\
            \n\rOther:\n\r\
            EXC_RETURN: 0xFFFFFFF9\n\r\
            \n\rDetails of the fault status:\n\r\
            Hard fault status:\n\r\
            \x20- Forced Hard fault.\n\r\
            MemManage fault status:\n\r\
            \x20- MMAR holds a valid address.\n\r\
            \x20- MMAR value: 0xAAAAAAAA\n\r\
            \x20- Load or store at a location that does not permit the operation.\n\r\
            Bus fault status:\n\r\
            \x20- BFAR holds an invalid address.\n\r\
            Usage fault status:\n\r";
        assert_eq!(text, expected);
    }

    #[test]
    fn lines_end_with_lf_cr() {
        let (frame, status) = sample();
        let text = HardFaultReport::new(&frame, ExcReturn::THREAD_MSP, &status).to_string();
        assert!(text.starts_with("\n\r!!!Hard Fault detected!!!\n\r\n\rStack frame:\n\r"));
        assert!(text.ends_with("Usage fault status:\n\r"));
        // Every line feed is followed by a carriage return, never preceded by one.
        assert_eq!(text.matches('\n').count(), text.matches("\n\r").count());
        assert!(!text.contains("\r\nR0"));
    }

    #[test]
    fn sink_output_matches_display() {
        let (frame, status) = sample();
        let mut sink: Vec<u8> = Vec::new();
        write_report(&mut sink, &frame, ExcReturn::THREAD_PSP, &status);
        let shown = HardFaultReport::new(&frame, ExcReturn::THREAD_PSP, &status).to_string();
        assert_eq!(sink, shown.as_bytes());
    }

    #[test]
    fn cause_count_ignores_validity_statements() {
        let (frame, status) = sample();
        let report = HardFaultReport::new(&frame, ExcReturn::THREAD_MSP, &status);
        assert_eq!(report.cause_count(), 2);

        let quiet = FaultStatus::default();
        let report = HardFaultReport::new(&frame, ExcReturn::THREAD_MSP, &quiet);
        assert_eq!(report.cause_count(), 0);
        assert_eq!(report.findings().count(), 2);
    }
}
