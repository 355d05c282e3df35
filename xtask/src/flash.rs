use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

const TARGET: &str = "thumbv7em-none-eabihf";
const CHIP: &str = "STM32H743ZITx";

fn elf_path(release: bool) -> String {
    let profile = if release { "release" } else { "debug" };
    format!("target/{TARGET}/{profile}/firmware")
}

pub fn run(release: bool) -> Result<()> {
    let mode = if release { "release" } else { "debug" };

    println!();
    println!(
        "{}",
        format!("🔨 Building demo firmware ({mode} mode)...").cyan().bold()
    );

    let build_start = Instant::now();
    let mut build_cmd = Command::new("cargo");
    build_cmd.args(["build", "-p", "firmware", "--target", TARGET, "--features", "hardware"]);
    if release {
        build_cmd.arg("--release");
    }

    let build_output = build_cmd.output().context("Failed to run cargo build")?;
    if !build_output.status.success() {
        eprintln!("{}", "✗ Build failed".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&build_output.stderr));
        anyhow::bail!("Build failed");
    }
    println!(
        "{}",
        format!(
            "✓ Build successful in {:.2}s",
            build_start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();

    println!("{}", format!("📡 Flashing to {CHIP}...").cyan().bold());
    println!(
        "   {}",
        "Open a serial terminal on USART1 (PA9) at 115200 8N1 for the report".dimmed()
    );
    println!(
        "   {}",
        "The demo faults on purpose; RTT shows the one-line summary".dimmed()
    );
    println!();

    // `probe-rs run` flashes, then stays attached and streams defmt until the
    // core halts on the report's breakpoint.
    let status = Command::new("probe-rs")
        .args(["run", "--chip", CHIP])
        .arg(elf_path(release))
        .status()
        .context("Failed to run probe-rs. Is probe-rs installed? (cargo install probe-rs-tools)")?;

    if !status.success() {
        anyhow::bail!("probe-rs exited with {status} - check that the probe is connected and the board is powered");
    }

    Ok(())
}
