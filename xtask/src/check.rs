use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// One `cargo` invocation that must succeed.
struct Gate {
    label: &'static str,
    args: &'static [&'static str],
}

const GATES: &[Gate] = &[
    Gate {
        label: "hardfault on host (std)",
        args: &["check", "-p", "hardfault", "--features", "std"],
    },
    Gate {
        label: "hardfault on target (no_std, hardware + defmt)",
        args: &[
            "check",
            "-p",
            "hardfault",
            "--target",
            "thumbv7em-none-eabihf",
            "--features",
            "hardware,defmt",
        ],
    },
    Gate {
        label: "demo firmware (STM32H743)",
        args: &[
            "check",
            "-p",
            "firmware",
            "--target",
            "thumbv7em-none-eabihf",
            "--features",
            "hardware",
        ],
    },
];

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    for gate in GATES {
        println!("{}", format!("  Checking {}...", gate.label).cyan());
        let start = Instant::now();
        let output = Command::new("cargo")
            .args(gate.args)
            .output()
            .with_context(|| format!("Failed to check {}", gate.label))?;

        if !output.status.success() {
            eprintln!("{}", format!("  ✗ {} failed", gate.label).red().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            anyhow::bail!("Check failed: {}", gate.label);
        }
        println!(
            "{}",
            format!("  ✓ passed in {:.2}s", start.elapsed().as_secs_f64()).green()
        );
        println!();
    }

    println!("{}", "  Running clippy lints...".cyan());
    let clippy_start = Instant::now();
    let clippy_output = Command::new("cargo")
        .args(["clippy", "-p", "hardfault", "-p", "xtask", "--all-targets", "--features", "hardfault/std", "--", "-D", "warnings"])
        .output()
        .context("Failed to run clippy")?;

    if clippy_output.status.success() {
        println!(
            "{}",
            format!(
                "  ✓ Clippy passed in {:.2}s",
                clippy_start.elapsed().as_secs_f64()
            )
            .green()
        );
    } else {
        eprintln!("{}", "  ⚠ Clippy warnings found".yellow().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&clippy_output.stderr));
        // Don't fail on clippy warnings, just show them
    }
    println!();

    println!("{}", "  Checking code formatting...".cyan());
    let fmt_output = Command::new("cargo")
        .args(["fmt", "--all", "--check"])
        .output()
        .context("Failed to run cargo fmt")?;

    if fmt_output.status.success() {
        println!("{}", "  ✓ Formatting check passed".green());
    } else {
        eprintln!("{}", "  ⚠ Formatting issues found".yellow().bold());
        eprintln!("     Run 'cargo fmt --all' to fix");
    }
    println!();

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
