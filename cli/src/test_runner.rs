use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use gcode::{ParseError, Parser};

const FIXTURE_SUFFIX: &str = ".test.gcode";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedError {
    /// Substring that must appear in the error message.
    pub contains: String,

    /// If set, the error must be reported on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    #[serde(default)]
    pub description: Option<String>,

    /// If true, at least one line must fail to parse.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Exact list of expected line errors, in source order.
    #[serde(default)]
    pub expect_errors: Option<Vec<ExpectedError>>,

    /// Number of non-blank blocks the file must contain.
    #[serde(default)]
    pub expect_blocks: Option<usize>,

    /// Expected normalized program text (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,
}

/// Split a fixture into its TOML frontmatter and G-code body.
fn split_fixture(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let rest = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let rest = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))
        .unwrap_or(rest);

    let (header, body) = match rest.strip_prefix("---") {
        Some(body) => ("", body),
        None => {
            let close = rest
                .find("\n---")
                .ok_or("missing closing --- frontmatter delimiter")?;
            (rest[..close].trim_end_matches('\r'), &rest[close + 4..])
        }
    };
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);

    let config = toml::from_str(header).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, body))
}

/// Returns `Some(reason)` when the fixture's expectations are not met.
fn check_fixture(config: &FixtureConfig, source: &str) -> Option<String> {
    let (program, errors) = Parser::new(source.to_string(), 0).parse_lossy();

    if config.expect_parse_error && errors.is_empty() {
        return Some("expected a parse error, but every line parsed".into());
    }

    match &config.expect_errors {
        Some(expected) => {
            if let Some(reason) = check_errors(&errors, expected) {
                return Some(reason);
            }
        }
        None if !config.expect_parse_error && !errors.is_empty() => {
            let msgs: Vec<String> = errors
                .iter()
                .map(|e| format!("line {}: {}", e.line, e.message))
                .collect();
            return Some(format!("unexpected parse error: {}", msgs.join("; ")));
        }
        None => {}
    }

    if let Some(expected) = config.expect_blocks {
        let actual = program.block_count();
        if actual != expected {
            return Some(format!("expected {} block(s), got {}", expected, actual));
        }
    }

    if let Some(expected) = &config.expect_output {
        let actual = program.normalized();
        if actual.trim() != expected.trim() {
            return Some(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected.trim(),
                actual.trim()
            ));
        }
    }

    None
}

fn check_errors(actual: &[ParseError], expected: &[ExpectedError]) -> Option<String> {
    if actual.len() != expected.len() {
        let listed: Vec<String> = actual
            .iter()
            .map(|e| format!("    - line {}: {}", e.line, e.message))
            .collect();
        return Some(format!(
            "expected {} error(s), got {}\n  actual errors:\n{}",
            expected.len(),
            actual.len(),
            if listed.is_empty() {
                "    (none)".to_string()
            } else {
                listed.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "error[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }
        if let Some(line) = expected.line {
            if actual.line != line {
                return Some(format!(
                    "error[{}]: expected on line {}, but reported on line {}",
                    i, line, actual.line
                ));
            }
        }
    }
    None
}

pub enum Outcome {
    Pass,
    Fail(String),
}

pub struct FixtureResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: Outcome,
}

impl FixtureResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .map_or("?", |s| s.trim_end_matches(FIXTURE_SUFFIX))
        })
    }
}

fn run_fixture(path: &Path) -> FixtureResult {
    let failed = |reason: String| FixtureResult {
        path: path.to_path_buf(),
        description: None,
        outcome: Outcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return failed(format!("cannot read file: {}", e)),
    };
    let (config, source) = match split_fixture(&content) {
        Ok(pair) => pair,
        Err(e) => return failed(format!("frontmatter error: {}", e)),
    };

    let outcome = match check_fixture(&config, source) {
        None => Outcome::Pass,
        Some(reason) => Outcome::Fail(reason),
    };
    log::debug!("fixture {} done", path.display());
    FixtureResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

/// Fixtures grouped by category (subfolder relative to `root`, "" for the
/// root itself). A single file is its own uncategorized group.
fn discover(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    if root.is_file() {
        categories.insert(String::new(), vec![root.to_path_buf()]);
        return categories;
    }
    collect(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(FIXTURE_SUFFIX))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("PASS", "32")
    }

    fn fail(&self) -> String {
        self.paint("FAIL", "31")
    }
}

/// Run all fixtures under `path` (or the single fixture `path`).
/// If `categories` is non-empty, only matching subfolders run.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { color: !no_color };
    let all = discover(path);
    if all.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return 1;
    }

    let selected: Vec<(&String, &Vec<PathBuf>)> = if categories.is_empty() {
        all.iter().collect()
    } else {
        let wanted: Vec<&str> = categories.iter().map(|c| c.trim_matches('/')).collect();
        for req in &wanted {
            if !all.keys().any(|cat| in_category(cat, req)) {
                eprintln!("warning: category '{}' not found", req);
            }
        }
        all.iter()
            .filter(|(cat, _)| wanted.iter().any(|req| in_category(cat, req)))
            .collect()
    };
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures = Vec::new();
    for (category, files) in selected {
        eprintln!();
        eprintln!("{}", style.paint(category_label(category), "1"));
        for file in files {
            let result = run_fixture(file);
            match result.outcome {
                Outcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", style.pass(), result.label());
                }
                Outcome::Fail(_) => {
                    eprintln!("  {}  {}", style.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let Outcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", style.paint("ok", "32"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("FAILED", "31"),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}

fn in_category(category: &str, requested: &str) -> bool {
    category == requested || category.starts_with(&format!("{}/", requested))
}

/// Print the available categories for `path`.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} fixtures)", category_label(category), files.len());
    }
}
