use actiongraph_core::analyzer::report::{AuditReport, CheckError, ScanResult, Verdict};
use actiongraph_core::parser::manifest::Action;
use actiongraph_core::resolver::{ResolvedStep, ResolvedWorkflow};
use colored::*;

/// Print each job's steps with their dependency trees.
pub fn print_dependencies(resolved: &ResolvedWorkflow) {
    println!();
    println!(
        "{}",
        format!(
            " actiongraph v{} - Dependencies of {}",
            env!("CARGO_PKG_VERSION"),
            resolved.source_file
        )
        .bold()
    );
    println!();

    for job in &resolved.jobs {
        println!(" {}", format!("Dependencies for {}", job.name).bold().underline());
        for step in &job.steps {
            print_step(step);
        }
        println!();
    }

    println!(
        " {} {} jobs, {} actions",
        "|-".dimmed(),
        resolved.jobs.len(),
        resolved.action_count()
    );
    println!();
}

fn print_step(step: &ResolvedStep) {
    println!(" {} {}", "|-".dimmed(), step.label.cyan());
    match (&step.reference, &step.action) {
        (None, _) => println!("    {}", "inline code step".dimmed()),
        (Some(reference), None) => {
            println!("    {}", format!("{} is not resolved remotely", reference).dimmed())
        }
        (Some(_), Some(action)) if action.dependents.is_empty() => {
            println!("    {}", "no dependencies".dimmed())
        }
        (Some(_), Some(action)) => print_tree(action, 1),
    }
}

fn print_tree(action: &Action, depth: usize) {
    println!("{}{}", "    ".repeat(depth), action.label());
    for dependent in &action.dependents {
        print_tree(dependent, depth + 1);
    }
}

/// One line per workflow before its actions are checked.
pub fn print_scan_progress(resolved: &ResolvedWorkflow) {
    eprintln!(
        " {} Scanning {} actions in {}",
        "..".dimmed(),
        resolved.action_count(),
        resolved.source_file
    );
}

/// Print a scan report grouped by job.
pub fn print_scan_report(report: &AuditReport) {
    println!();
    println!(
        "{}",
        format!(
            " actiongraph v{} - Scan of {}",
            env!("CARGO_PKG_VERSION"),
            report.source_file
        )
        .bold()
    );
    println!();

    for job in &report.jobs {
        println!(" {}", format!("Results for {} job", job.job).bold().underline());
        if job.results.is_empty() {
            println!("   {}", "no actions used".dimmed());
        }
        for result in &job.results {
            print_result(result);
        }
        println!();
    }

    println!(" {}", "=".repeat(60).dimmed());
    println!();
    println!(" {}", "Summary".bold().underline());
    println!(" {} Actions scanned:            {}", "|-".dimmed(), report.action_count());
    println!(
        " {} EOL Node.js runtimes:       {}",
        "|-".dimmed(),
        highlight(report.eol_count())
    );
    println!(
        " {} Repo jacking possible:      {}",
        "|-".dimmed(),
        highlight(report.repo_jacking_count())
    );
    println!(
        " {} Behind latest release:      {}",
        "|-".dimmed(),
        highlight(report.outdated_count())
    );
    if !report.errors.is_empty() {
        println!(
            " {} Checks that failed:         {}",
            "|-".dimmed(),
            report.errors.len().to_string().yellow().bold()
        );
        println!();
        println!(" {}", "Failed Checks".bold().underline());
        for error in &report.errors {
            println!(" {} {}", "|-".dimmed(), check_error_line(error).yellow());
        }
    }
    println!();

    if !report.has_findings() && report.errors.is_empty() {
        println!(" {} No issues found.", "OK".green().bold());
        println!();
    }
}

fn print_result(result: &ScanResult) {
    let indent = "  ".repeat(result.depth);
    println!(" {}{} {}", indent, "|-".dimmed(), result.action.cyan());
    let detail = format!("{}     ", indent);

    println!("{}Node Version EOL: {}", detail, verdict(result.node_version_eol, true));
    println!(
        "{}Repo Jacking Possible: {}",
        detail,
        verdict(result.repo_jacking_possible, true)
    );
    if let Some(comment) = &result.repo_jacking_comment {
        println!("{}  {}", detail, comment.dimmed());
    }
    println!(
        "{}Is Referencing Latest Tag: {}",
        detail,
        verdict(result.latest_release, false)
    );
    if let Some(tag) = &result.latest_release_tag {
        println!("{}  The latest tag for {} is {}", detail, result.action, tag.bold());
    }
    if let Some(error) = &result.latest_release_error {
        println!("{}  {}", detail, format!("Error getting latest tag: {}", error).dimmed());
    }
}

/// Colour a verdict; `true_is_bad` flips which answer is the finding.
fn verdict(value: Verdict, true_is_bad: bool) -> ColoredString {
    match value {
        Verdict::Yes if true_is_bad => value.as_str().red().bold(),
        Verdict::No if !true_is_bad => value.as_str().red().bold(),
        Verdict::Yes | Verdict::No => value.as_str().green(),
        Verdict::Unknown => value.as_str().yellow(),
        Verdict::NotApplicable | Verdict::NotScanned => value.as_str().dimmed(),
    }
}

fn check_error_line(error: &CheckError) -> String {
    format!("{} [{}]: {}", error.action, error.check.label(), error.message)
}

fn highlight(count: usize) -> String {
    if count > 0 {
        count.to_string().red().bold().to_string()
    } else {
        "0".to_string()
    }
}
