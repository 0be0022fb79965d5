use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::HarnessConfig;
use crate::error::TreeMismatch;

pub type FixtureTree = BTreeMap<String, FixtureNode>;

/// One entry of a [`FixtureTree`]: file text or a nested directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FixtureNode {
    File(String),
    Dir(FixtureTree),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeDifference {
    /// In the expected tree but not the actual one.
    Missing { path: String },
    /// In the actual tree but not the expected one.
    Unexpected { path: String },
    /// A file on one side, a directory on the other.
    KindMismatch { path: String },
    ContentMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for TreeDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { path } => write!(f, "missing: {path}"),
            Self::Unexpected { path } => write!(f, "unexpected: {path}"),
            Self::KindMismatch { path } => write!(f, "file/directory mismatch: {path}"),
            Self::ContentMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "content differs: {path}\n--- expected\n{expected}\n+++ actual\n{actual}"
            ),
        }
    }
}

// Trailing conflict markers name the incoming commit by its abbreviated hash,
// which changes every run. Older git prints `<hash>... <label>`, newer
// `<hash> (<label>)`.
static MARKER_WITH_ELLIPSIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)^>>>>>>> [0-9a-f]{7,40}\.\.\. (.*)$").expect("valid marker regex")
});
static MARKER_WITH_PARENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)^>>>>>>> [0-9a-f]{7,40} \((.*)\)$").expect("valid marker regex")
});

const CANONICAL_MARKER: &str = ">>>>>>> fffffff (${1})";

/// Reads a directory into a tree. Empty directories are kept as empty
/// subtrees; file contents are decoded lossily.
pub fn read_tree(root: &Path) -> Result<FixtureTree> {
    read_tree_skipping(root, &[])
}

/// Like [`read_tree`], but never descends into the top-level entries named in
/// `skipped` (`.git`, dependency directories).
///
/// Symbolic links are not followed. A link is read as a file whose content is
/// the link target, the way git stores it, so dangling links and cycles are
/// harmless.
pub fn read_tree_skipping(root: &Path, skipped: &[String]) -> Result<FixtureTree> {
    let mut tree = FixtureTree::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() != 1
                || !skipped
                    .iter()
                    .any(|name| entry.file_name() == OsStr::new(name))
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("failed walking {}", root.display()))?;
        let path = entry.path();
        let file_type = entry.file_type();
        let node = if file_type.is_dir() {
            FixtureNode::Dir(FixtureTree::new())
        } else if file_type.is_symlink() {
            let target =
                fs::read_link(path).with_context(|| format!("failed reading link {}", path.display()))?;
            FixtureNode::File(target.to_string_lossy().into_owned())
        } else {
            let bytes = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
            FixtureNode::File(String::from_utf8_lossy(&bytes).into_owned())
        };
        let relative = path
            .strip_prefix(root)
            .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
        insert_at(&mut tree, relative, node)?;
    }
    Ok(tree)
}

// The walk yields a directory before its contents, so every parent exists.
fn insert_at(tree: &mut FixtureTree, relative: &Path, node: FixtureNode) -> Result<()> {
    let mut names: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let Some(leaf) = names.pop() else {
        bail!("empty path under tree root");
    };
    let mut current = tree;
    for name in names {
        let Some(FixtureNode::Dir(children)) = current.get_mut(&name) else {
            bail!("parent {name:?} of {} is not a directory", relative.display());
        };
        current = children;
    }
    current.insert(leaf, node);
    Ok(())
}

/// Rewrites both conflict-marker formats to `>>>>>>> fffffff (<label>)`.
pub fn normalize_text(text: &str) -> String {
    let once = MARKER_WITH_ELLIPSIS.replace_all(text, CANONICAL_MARKER);
    MARKER_WITH_PARENS
        .replace_all(&once, CANONICAL_MARKER)
        .into_owned()
}

pub fn normalize_tree(tree: &mut FixtureTree) {
    for node in tree.values_mut() {
        match node {
            FixtureNode::File(text) => *text = normalize_text(text),
            FixtureNode::Dir(children) => normalize_tree(children),
        }
    }
}

pub fn diff_trees(actual: &FixtureTree, expected: &FixtureTree) -> Vec<TreeDifference> {
    let mut out = Vec::new();
    diff_into(actual, expected, "", &mut out);
    out
}

fn diff_into(
    actual: &FixtureTree,
    expected: &FixtureTree,
    prefix: &str,
    out: &mut Vec<TreeDifference>,
) {
    for (name, expected_node) in expected {
        let path = format!("{prefix}{name}");
        match (actual.get(name), expected_node) {
            (None, _) => out.push(TreeDifference::Missing { path }),
            (Some(FixtureNode::File(a)), FixtureNode::File(e)) => {
                if a != e {
                    out.push(TreeDifference::ContentMismatch {
                        path,
                        expected: e.clone(),
                        actual: a.clone(),
                    });
                }
            }
            (Some(FixtureNode::Dir(a)), FixtureNode::Dir(e)) => {
                diff_into(a, e, &format!("{path}/"), out)
            }
            (Some(_), _) => out.push(TreeDifference::KindMismatch { path }),
        }
    }
    for name in actual.keys() {
        if !expected.contains_key(name) {
            out.push(TreeDifference::Unexpected {
                path: format!("{prefix}{name}"),
            });
        }
    }
}

/// Reads `actual` (skipping the ignored entries) and `expected`, normalizes conflict markers on both and requires them to be equal.
pub fn fixture_compare(cfg: &HarnessConfig, actual: &Path, expected: &Path) -> Result<()> {
    let mut actual_tree = read_tree_skipping(actual, &cfg.ignored_entries)?;
    let mut expected_tree = read_tree(expected)?;
    normalize_tree(&mut actual_tree);
    normalize_tree(&mut expected_tree);

    let differences = diff_trees(&actual_tree, &expected_tree);
    debug!(
        actual = %actual.display(),
        expected = %expected.display(),
        differences = differences.len(),
        "compared fixture trees"
    );
    if differences.is_empty() {
        return Ok(());
    }
    Err(TreeMismatch { differences }.into())
}
