use std::io::{IsTerminal, stdout};

use anyhow::{Result, anyhow};
use crossterm::style::Stylize;
use git_fixtures::{HarnessConfig, TreeDifference, TreeMismatch, fixture_compare};

use crate::cli::CompareArgs;
use crate::views::{CompareView, print_json};

pub fn run(cfg: &HarnessConfig, args: &CompareArgs, porcelain: bool) -> Result<()> {
    let differences = match fixture_compare(cfg, &args.actual, &args.expected) {
        Ok(()) => Vec::new(),
        Err(err) => match err.downcast::<TreeMismatch>() {
            Ok(mismatch) => mismatch.differences,
            Err(other) => return Err(other),
        },
    };
    let count = differences.len();

    if porcelain {
        print_json(&CompareView {
            equal: differences.is_empty(),
            differences,
        })?;
    } else if differences.is_empty() {
        println!("trees match");
    } else {
        let use_color = stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        for difference in &differences {
            println!("{}", render(difference, use_color));
        }
    }

    if count > 0 {
        return Err(anyhow!("{count} difference(s) between trees"));
    }
    Ok(())
}

fn render(difference: &TreeDifference, use_color: bool) -> String {
    let (label, path) = match difference {
        TreeDifference::Missing { path } => ("missing", path),
        TreeDifference::Unexpected { path } => ("unexpected", path),
        TreeDifference::KindMismatch { path } => ("kind", path),
        TreeDifference::ContentMismatch { path, .. } => ("content", path),
    };
    if !use_color {
        return format!("- {label}: {path}");
    }
    let label = match difference {
        TreeDifference::Missing { .. } => label.red().bold().to_string(),
        TreeDifference::Unexpected { .. } => label.yellow().bold().to_string(),
        _ => label.cyan().to_string(),
    };
    format!("- {}: {}", label, path.as_str().green())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rendering_names_kind_and_path() {
        let d = TreeDifference::ContentMismatch {
            path: "a/b.txt".to_string(),
            expected: "1".to_string(),
            actual: "2".to_string(),
        };
        assert_eq!(render(&d, false), "- content: a/b.txt");
    }
}
