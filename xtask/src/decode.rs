//! Offline decoding: the same report the target prints, from register values
//! read out of a halted core (probe-rs, gdb) or copied from a log.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use hardfault::{ExcReturn, ExceptionFrame, FaultStatus, FrameKind, HardFaultReport, ReturnMode};

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// HardFault Status Register (0xE000ED2C)
    #[arg(long, value_parser = parse_word, default_value = "0")]
    pub hfsr: u32,
    /// Configurable Fault Status Register (0xE000ED28)
    #[arg(long, value_parser = parse_word, default_value = "0")]
    pub cfsr: u32,
    /// MemManage Fault Address Register (0xE000ED34)
    #[arg(long, value_parser = parse_word, default_value = "0")]
    pub mmfar: u32,
    /// BusFault Address Register (0xE000ED38)
    #[arg(long, value_parser = parse_word, default_value = "0")]
    pub bfar: u32,
    /// Auxiliary Fault Status Register (0xE000ED3C)
    #[arg(long, value_parser = parse_word, default_value = "0")]
    pub afsr: u32,
    /// LR on handler entry
    #[arg(long = "exc-return", value_parser = parse_word, default_value = "0xFFFFFFF9")]
    pub exc_return: u32,
    /// Stacked R0,R1,R2,R3,R12,LR,PC,xPSR (comma separated)
    #[arg(long, value_parser = parse_word, value_delimiter = ',', num_args = 8)]
    pub frame: Vec<u32>,
}

/// Parse `0x`-prefixed hex, bare hex containing A-F, or decimal. `_` is
/// accepted as a digit separator.
pub fn parse_word(input: &str) -> Result<u32, String> {
    let cleaned: String = input.trim().chars().filter(|c| *c != '_').collect();
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None if cleaned.chars().any(|c| c.is_ascii_alphabetic()) => {
            u32::from_str_radix(&cleaned, 16)
        }
        None => cleaned.parse(),
    };
    parsed.map_err(|e| format!("'{input}' is not a 32-bit register value: {e}"))
}

fn frame_from(words: &[u32]) -> Result<ExceptionFrame> {
    if words.is_empty() {
        return Ok(ExceptionFrame::default());
    }
    let words: [u32; 8] = words
        .try_into()
        .context("--frame takes exactly 8 words: R0,R1,R2,R3,R12,LR,PC,xPSR")?;
    Ok(ExceptionFrame::from_words(words))
}

pub fn run(args: &DecodeArgs) -> Result<()> {
    let frame = frame_from(&args.frame)?;
    let status = FaultStatus {
        hfsr: args.hfsr,
        cfsr: args.cfsr,
        mmfar: args.mmfar,
        bfar: args.bfar,
        afsr: args.afsr,
    };

    let exc_return = match ExcReturn::try_from(args.exc_return) {
        Ok(exc_return) => exc_return,
        Err(e) => {
            eprintln!("{}", format!("⚠ {e}; decoding it anyway").yellow());
            ExcReturn::from_bits(args.exc_return)
        }
    };

    let report = HardFaultReport::new(&frame, exc_return, &status);
    print!("{report}");
    println!();

    let frame_kind = match exc_return.frame_kind() {
        FrameKind::Basic => "basic",
        FrameKind::Extended => "extended (FPU)",
    };
    let mode = match exc_return.mode() {
        ReturnMode::Handler => "handler",
        ReturnMode::Thread => "thread",
    };
    println!(
        "{}",
        format!(
            "🔍 {mode} mode, frame on {}, {frame_kind} frame",
            exc_return.stack().name()
        )
        .cyan()
    );
    println!(
        "   {}",
        format!(
            "MMFSR=0x{:02X} BFSR=0x{:02X} UFSR=0x{:04X}",
            status.mmfsr(),
            status.bfsr(),
            status.ufsr()
        )
        .dimmed()
    );
    if let Some(address) = status.mem_manage_address() {
        println!("   {}", format!("MemManage fault at 0x{address:08X}").yellow());
    }
    if let Some(address) = status.bus_fault_address() {
        println!("   {}", format!("Bus fault at 0x{address:08X}").yellow());
    }
    if !args.frame.is_empty() {
        match frame.exception_number() {
            0 => println!("   {}", "interrupted code ran in thread mode".dimmed()),
            n => println!("   {}", format!("interrupted exception #{n}").dimmed()),
        }
        if !frame.thumb_state() {
            println!("{}", "   stacked xPSR has T=0 (ARM state)".yellow());
        }
    }

    match report.cause_count() {
        0 => println!("{}", "✓ no fault cause bits set".green()),
        n => println!("{}", format!("✗ {n} fault cause(s) decoded").red().bold()),
    }
    if status.is_forced() {
        println!(
            "   {}",
            "forced: a configurable fault escalated, see the groups below HFSR".dimmed()
        );
    }

    Ok(())
}
