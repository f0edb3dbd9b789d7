use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use compiler::{CompileOptions, CompileWarning, Compiler, Theme};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Text arena size for this document. Defaults to the compiler default.
    #[serde(default)]
    pub arena_bytes: Option<usize>,

    /// Number ordered lists from their written start.
    #[serde(default)]
    pub honor_list_start: bool,

    /// Expected command outline (trimmed comparison).
    #[serde(default)]
    pub expect_outline: Option<String>,

    /// Expected contents of every text command, in order.
    #[serde(default)]
    pub expect_texts: Option<Vec<String>>,

    /// If true, the test expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

impl TestConfig {
    fn compile_options(&self) -> CompileOptions {
        let defaults = CompileOptions::default();
        CompileOptions {
            arena_capacity: self.arena_bytes.unwrap_or(defaults.arena_capacity),
            honor_list_start: self.honor_list_start,
        }
    }
}

/// Split a `.test.md` file into its TOML config and markdown body.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let body = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, body))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let (description, outcome) = match check_file(path) {
        Ok(description) => (description, TestOutcome::Pass),
        Err((description, reason)) => (description, TestOutcome::Fail(reason)),
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Run one fixture. Returns its description, or the description and the
/// failure reason.
fn check_file(path: &Path) -> Result<Option<String>, (Option<String>, String)> {
    let content =
        std::fs::read_to_string(path).map_err(|e| (None, format!("cannot read file: {}", e)))?;
    let (config, body) =
        parse_test_file(&content).map_err(|e| (None, format!("frontmatter error: {}", e)))?;
    let description = config.description.clone();
    let fail = |reason: String| (description.clone(), reason);

    let parser = mdview::parser::Parser::new(body.to_string(), 0);
    let parse_result = parser.parse();

    if config.expect_parse_error {
        return match parse_result {
            Err(_) => Ok(description),
            Ok(_) => Err(fail("expected parse error, but parsing succeeded".into())),
        };
    }

    let document = parse_result.map_err(|errs| {
        let msgs: Vec<String> = errs.iter().map(|e| e.to_string()).collect();
        fail(format!("unexpected parse error: {}", msgs.join("; ")))
    })?;

    let mut compiler = Compiler::new(Theme::default(), config.compile_options());
    let compiled = compiler.compile(document);

    if let Some(expected) = &config.expect_outline {
        let actual = compiled.outline();
        if actual.trim() != expected.trim() {
            return Err(fail(format!(
                "outline mismatch\n  expected:\n{}\n  actual:\n{}",
                indent(expected.trim()),
                indent(actual.trim())
            )));
        }
    }

    if let Some(expected) = &config.expect_texts {
        let actual = compiled.texts();
        if actual != *expected {
            return Err(fail(format!(
                "text mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            )));
        }
    }

    if let Some(expected) = &config.expect_warnings {
        if let Some(reason) = check_warnings(body, compiled.warnings(), expected) {
            return Err(fail(reason));
        }
    }

    Ok(description)
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    source: &str,
    warnings: &[CompileWarning],
    expected: &[ExpectedWarning],
) -> Option<String> {
    if warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = warnings.iter().map(|w| format!("  - {}", w)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in warnings.iter().zip(expected).enumerate() {
        let msg = actual.to_string();
        if !msg.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.md"))
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

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(cat), files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Select the test files to run, honoring the category filter.
fn select_tests(path: &Path, categories: &[String]) -> BTreeMap<String, Vec<PathBuf>> {
    if path.is_file() {
        return BTreeMap::from([(String::new(), vec![path.to_path_buf()])]);
    }

    let all = discover_categorized(path);
    if categories.is_empty() {
        return all;
    }

    let mut selected = BTreeMap::new();
    for requested in categories {
        let req = requested.trim_matches('/');
        let prefix = format!("{}/", req);
        let before = selected.len();
        for (cat, files) in &all {
            if cat == req || cat.starts_with(&prefix) {
                selected.insert(cat.clone(), files.clone());
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let selected = select_tests(path, categories);
    if selected.values().all(|files| files.is_empty()) {
        eprintln!("no matching .test.md files found in {}", path.display());
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &selected {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", paint(category_label(cat), "1", no_color));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
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
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontmatter_is_split_from_body() {
        let (config, body) =
            parse_test_file("---\ndescription = \"x\"\narena_bytes = 8\n---\n# Title\n").unwrap();
        assert_eq!(config.description.as_deref(), Some("x"));
        assert_eq!(config.compile_options().arena_capacity, 8);
        assert_eq!(body, "# Title\n");
    }

    #[test]
    fn missing_frontmatter_is_reported() {
        assert!(parse_test_file("# no config\n").is_err());
        assert!(parse_test_file("---\ndescription = \"x\"\n").is_err());
    }

    #[test]
    fn offsets_map_to_lines() {
        let source = "a\nbb\nccc";
        assert_eq!(byte_offset_to_line(source, 0), 1);
        assert_eq!(byte_offset_to_line(source, 2), 2);
        assert_eq!(byte_offset_to_line(source, 5), 3);
    }
}
