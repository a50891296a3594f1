use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Cortex-M4F/M7 target: the widest ARMv7-M target with an FPU.
const TARGET: &str = "thumbv7em-none-eabihf";

/// One `cargo check` invocation of the build matrix.
struct BuildCheck {
    label: &'static str,
    args: &'static [&'static str],
}

const BUILDS: &[BuildCheck] = &[
    BuildCheck {
        label: "hardware target",
        args: &["-p", "armv7m-monitor", "--target", TARGET, "--features", "hardware"],
    },
    BuildCheck {
        label: "hardware target + fpu",
        args: &["-p", "armv7m-monitor", "--target", TARGET, "--features", "hardware,fpu"],
    },
    BuildCheck {
        label: "hardware target + task-aware",
        args: &["-p", "armv7m-monitor", "--target", TARGET, "--features", "hardware,task-aware"],
    },
    BuildCheck {
        label: "debug-hal (no_std)",
        args: &["-p", "debug-hal", "--target", TARGET, "--no-default-features"],
    },
    BuildCheck {
        label: "host (std)",
        args: &["--workspace", "--features", "armv7m-monitor/std"],
    },
];

fn check_build(build: &BuildCheck) -> Result<()> {
    println!("{}", format!("  Checking {}...", build.label).cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .arg("check")
        .args(build.args)
        .output()
        .with_context(|| format!("Failed to check {}", build.label))?;

    if !output.status.success() {
        eprintln!("{}", format!("  ✗ {} check failed", build.label).red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("{} check failed", build.label);
    }

    println!(
        "{}",
        format!(
            "  ✓ {} passed in {:.2}s",
            build.label,
            start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
    Ok(())
}

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking monitor builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    for build in BUILDS {
        check_build(build)?;
    }

    // Clippy lints
    println!("{}", "  Running clippy lints...".cyan());
    let clippy_start = Instant::now();

    let clippy_output = Command::new("cargo")
        .args(["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
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
    }
    println!();

    // Format check
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
