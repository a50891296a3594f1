use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

/// One documented configuration of `armv7m-monitor`.
///
/// The register context, the target description and the `hardware` module
/// are feature-gated, so each configuration gets its own rustdoc output
/// under `target/doc-<name>/`.
struct DocVariant {
    name: &'static str,
    features: &'static str,
    target: Option<&'static str>,
}

const DOC_VARIANTS: &[DocVariant] = &[
    DocVariant {
        name: "host",
        features: "armv7m-monitor/std",
        target: None,
    },
    DocVariant {
        name: "fpu",
        features: "armv7m-monitor/std,armv7m-monitor/fpu",
        target: None,
    },
    DocVariant {
        name: "task-aware",
        features: "armv7m-monitor/std,armv7m-monitor/task-aware",
        target: None,
    },
    DocVariant {
        name: "hardware",
        features: "armv7m-monitor/hardware,armv7m-monitor/fpu",
        target: Some("thumbv7em-none-eabihf"),
    },
];

impl DocVariant {
    fn target_dir(&self) -> PathBuf {
        PathBuf::from("target").join(format!("doc-{}", self.name))
    }

    fn index(&self) -> PathBuf {
        let mut path = self.target_dir();
        if let Some(target) = self.target {
            path.push(target);
        }
        path.join("doc").join("armv7m_monitor").join("index.html")
    }
}

fn build_variant(variant: &DocVariant, open: bool) -> Result<()> {
    println!(
        "{}",
        format!("  Documenting {}...", variant.name).cyan()
    );
    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.args(["doc", "--no-deps", "--document-private-items"])
        .args(["-p", "armv7m-monitor", "-p", "debug-hal"])
        .args(["--features", variant.features])
        .arg("--target-dir")
        .arg(variant.target_dir());
    if let Some(target) = variant.target {
        cmd.args(["--target", target]);
    }
    if open {
        cmd.arg("--open");
    }

    let output = cmd
        .output()
        .with_context(|| format!("Failed to document {}", variant.name))?;

    if !output.status.success() {
        eprintln!("{}", format!("  ✗ {} failed", variant.name).red().bold());
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("Documentation build failed for {}", variant.name);
    }

    println!(
        "{}",
        format!(
            "  ✓ {} ({:.2}s) → {}",
            variant.name,
            start.elapsed().as_secs_f64(),
            variant.index().display()
        )
        .green()
    );
    Ok(())
}

/// Document every configuration; `--open` opens the host variant only.
pub fn run(open: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building documentation...".cyan().bold());
    println!();

    for (i, variant) in DOC_VARIANTS.iter().enumerate() {
        build_variant(variant, open && i == 0)?;
    }

    println!();
    Ok(())
}
