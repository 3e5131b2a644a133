//! Test runner implementation
//!
//! Runs scenarios one after another through the bootstrap and prints a
//! colored report. The output folder is closed out once all tests are done.

use std::path::PathBuf;

use colored::Colorize;

use crate::common::Result;

use super::bootstrap::{Failure, Scenario, TestCore, TestResult};

/// Outcome of a whole run
#[derive(Debug)]
pub struct RunSummary {
    pub results: Vec<TestResult>,
    /// Output folder, if it was kept
    pub output: Option<PathBuf>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}

/// Run every scenario in order, then close out the output folder
pub async fn run_all(
    core: TestCore,
    scenarios: &[Box<dyn Scenario>],
    verbose: bool,
) -> Result<RunSummary> {
    println!(
        "{} {} test(s) on {}",
        "Running".blue().bold(),
        scenarios.len(),
        core.target().white().bold()
    );
    if verbose {
        println!("  Output: {}", core.output().path().display().to_string().dimmed());
    }

    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        println!(
            "\n{} {}",
            "Running Test:".blue().bold(),
            scenario.name().white().bold()
        );
        if let Some(desc) = scenario.description() {
            println!("  {}", desc.dimmed());
        }

        let result = core.run_test(scenario.as_ref()).await;
        print_result(&result);
        results.push(result);
    }

    let passed = results.iter().all(|r| r.passed);
    let output = core.finish(passed)?;
    let summary = RunSummary { results, output };
    print_summary(&summary);

    Ok(summary)
}

fn print_result(result: &TestResult) {
    let elapsed = format!("({:.1}s)", result.duration.as_secs_f64());

    match &result.error {
        None => println!("  {} Passed {}", "✓".green(), elapsed.dimmed()),
        Some(Failure::Verdict(reason)) => {
            println!("  {} Failed {}: {}", "✗".red(), elapsed.dimmed(), reason)
        }
        Some(Failure::Error(e)) => {
            println!("  {} Error {}: {}", "✗".red(), elapsed.dimmed(), e)
        }
    }

    if let Some(path) = &result.screenshot {
        println!("    Screenshot: {}", path.display().to_string().dimmed());
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    if summary.all_passed() {
        println!(
            "{} {}",
            "✓".green().bold(),
            format!("{} passed", summary.passed()).green().bold()
        );
    } else {
        println!(
            "{} {}, {}",
            "✗".red().bold(),
            format!("{} failed", summary.failed()).red().bold(),
            format!("{} passed", summary.passed()).green()
        );
        for result in summary.results.iter().filter(|r| !r.passed) {
            println!("  - {}", result.name);
        }
    }

    if let Some(path) = &summary.output {
        println!("Output kept at {}", path.display());
    }
}
