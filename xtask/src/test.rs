use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Feature sets whose register layout differs from the default build.
const FEATURE_MATRIX: &[&str] = &["fpu", "task-aware", "fpu,task-aware"];

/// Run `cargo test` with `args`, printing a one-line summary.
fn cargo_test(label: &str, args: &[&str]) -> Result<()> {
    println!("{}", format!("  Running {label}...").cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .arg("test")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run {label}"))?;

    if !output.status.success() {
        eprintln!("{}", format!("  ✗ {label} failed").red().bold());
        eprintln!();
        let output_str = String::from_utf8_lossy(&output.stdout);
        for line in output_str.lines() {
            eprintln!("  {line}");
        }
        anyhow::bail!("{label} failed");
    }

    let output_str = String::from_utf8_lossy(&output.stdout);
    let summary = extract_test_summary(&output_str);

    println!(
        "{}",
        format!(
            "  ✓ {label} passed {summary} in {:.2}s",
            start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
    Ok(())
}

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running tests...".cyan().bold());
    println!();

    let total_start = Instant::now();

    let run_unit = !integration_only;
    let run_integration = !unit_only;

    if run_unit {
        cargo_test("unit tests", &["--lib", "--workspace"])?;
    }

    if run_integration {
        cargo_test("integration tests", &["--tests", "-p", "armv7m-monitor", "-p", "debug-hal"])?;
    }

    // Each layout-changing feature gets the full monitor suite.
    if run_unit && run_integration {
        for features in FEATURE_MATRIX {
            cargo_test(
                &format!("monitor tests [{features}]"),
                &["-p", "armv7m-monitor", "--features", features],
            )?;
        }
    }

    // Doc tests
    println!("{}", "  Running doc tests...".cyan());
    let doc_output = Command::new("cargo")
        .args(["test", "--doc", "--workspace"])
        .output()
        .context("Failed to run doc tests")?;

    if doc_output.status.success() {
        let output_str = String::from_utf8_lossy(&doc_output.stdout);
        println!(
            "{}",
            format!("  ✓ Doc tests passed {}", extract_test_summary(&output_str)).green()
        );
    } else {
        eprintln!("{}", "  ⚠ Doc tests failed".yellow().bold());
    }
    println!();

    println!(
        "{}",
        format!(
            "✓ All tests completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

fn extract_test_summary(output: &str) -> String {
    // "test result: ok. 5 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out"
    output
        .lines()
        .filter_map(|line| line.split("test result:").nth(1))
        .map(str::trim)
        .last()
        .map_or_else(|| "(summary not available)".to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_taken_from_last_result_line() {
        let output = "test result: ok. 1 passed; 0 failed\n\
                      running 3 tests\n\
                      test result: ok. 3 passed; 0 failed\n";
        assert_eq!(extract_test_summary(output), "ok. 3 passed; 0 failed");
        assert_eq!(extract_test_summary(""), "(summary not available)");
    }
}
