//! Subcommand output

use addon_core::{Addon, ErrorKind, ErrorReport, Project};
use std::sync::Arc;

const KINDS: [ErrorKind; 6] = [
    ErrorKind::PackageDirectoryMissing,
    ErrorKind::ManifestMissing,
    ErrorKind::ManifestParseError,
    ErrorKind::AddonMainMissing,
    ErrorKind::DependenciesMissing,
    ErrorKind::DependencyDirectoryUnreadable,
];

/// Top-level addons in load order
pub fn list(project: &Project) {
    let addons = project.addons();
    if addons.is_empty() {
        println!("No addons found for {}.", project.name());
        return;
    }

    println!("\n{} ({} addons)\n", project.name(), addons.len());
    println!("{:<4} {:<32} {:<8} {}", "#", "NAME", "KIND", "ROOT");
    println!("{}", "-".repeat(72));

    for (i, addon) in addons.iter().enumerate() {
        println!(
            "{:<4} {:<32} {:<8} {}",
            i + 1,
            addon.name(),
            kind(addon.as_ref()),
            addon.root().display()
        );
    }
    println!();
}

/// Whole addon tree, proxies marked
pub fn tree(project: &Project, max_depth: Option<usize>) {
    println!("{}", project.name());
    let addons = project.addons();
    print_children(&addons, "", 0, max_depth);

    let stats = project.cache_stats();
    println!(
        "\n{} instances, {} proxies (instance caching {})",
        stats.instances,
        stats.proxies,
        if project.settings().instance_caching { "on" } else { "off" }
    );
}

fn print_children(addons: &[Arc<dyn Addon>], prefix: &str, depth: usize, max_depth: Option<usize>) {
    if max_depth.is_some_and(|max| depth >= max) {
        return;
    }

    for (i, addon) in addons.iter().enumerate() {
        let last = i + 1 == addons.len();
        let branch = if last { "└── " } else { "├── " };
        let marker = match kind(addon.as_ref()) {
            "addon" => String::new(),
            other => format!(" [{}]", other),
        };
        println!("{}{}{}{}", prefix, branch, addon.name(), marker);

        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        print_children(&addon.addons(), &child_prefix, depth + 1, max_depth);
    }
}

/// Discovery error report
pub fn errors(report: &ErrorReport) {
    if report.is_empty() {
        println!("No package errors.");
        return;
    }

    print!("{}", report);
    println!("\n{} error(s)", report.error_count());
    for kind in KINDS {
        let count = report.count(kind);
        if count > 0 {
            println!("  {:<32} {}", kind.as_str(), count);
        }
    }
}

fn kind(addon: &dyn Addon) -> &'static str {
    match (addon.is_proxy(), addon.is_lazy_engine()) {
        (true, _) => "proxy",
        (false, true) => "engine",
        (false, false) => "addon",
    }
}
