use crate::constants::limits::{SHORT_EVALSCRIPT_CHARS, VERSION_MARKER_SCAN_LINES};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static SETUP_FN: Lazy<Regex> = Lazy::new(|| function_pattern("setup"));
static EVALUATE_PIXEL_FN: Lazy<Regex> = Lazy::new(|| function_pattern("evaluatePixel"));
static VERSION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*//\s*VERSION\s*=\s*(\d+)").expect("version regex"));
static RETURN_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\breturn\b").expect("return regex"));
static BAND_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bB(0[1-9]|1[0-2]|8A)\b").expect("band regex"));
static SPECTRAL_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(ndvi|ndwi|ndbi|ndsi|evi|savi)").expect("index regex"));

/// `function name(`, `name = function(` or `name = (...) =>`.
fn function_pattern(name: &str) -> Regex {
    let pattern = format!(
        r"\bfunction\s+{name}\s*\(|\b{name}\s*=\s*function\s*\(|\b{name}\s*=\s*(?:async\s*)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>",
        name = name
    );
    Regex::new(&pattern).expect("function regex")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptChecks {
    pub length: usize,
    pub line_count: usize,
    pub has_return: bool,
    pub version: Option<u32>,
    pub uses_bands: bool,
    pub uses_index: bool,
    pub uses_sample: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<ScriptChecks>,
    pub recommendations: Vec<String>,
}

/// Textual sanity checks on an evalscript. Nothing here executes or parses
/// the script; semantic errors only surface on the remote side.
pub fn validate(script: &str) -> ValidationReport {
    if script.trim().is_empty() {
        return ValidationReport {
            valid: false,
            issues: vec!["evalscript is empty".to_string()],
            checks: None,
            recommendations: Vec::new(),
        };
    }

    let mut issues = Vec::new();
    if !SETUP_FN.is_match(script) {
        issues.push("missing setup function".to_string());
    }
    if !EVALUATE_PIXEL_FN.is_match(script) {
        issues.push("missing evaluatePixel function".to_string());
    }
    let version = version_marker(script);
    if version.is_none() {
        issues.push("missing version marker".to_string());
    }
    if !braces_balanced(script) {
        issues.push("unbalanced braces".to_string());
    }

    let checks = ScriptChecks {
        length: script.chars().count(),
        line_count: script.lines().count(),
        has_return: RETURN_KEYWORD.is_match(script),
        version,
        uses_bands: BAND_NAME.is_match(script),
        uses_index: SPECTRAL_INDEX.is_match(script),
        uses_sample: script.to_lowercase().contains("sample"),
    };

    let mut recommendations = Vec::new();
    if !checks.has_return {
        recommendations.push("evaluatePixel should return the output values".to_string());
    }
    if checks.length < SHORT_EVALSCRIPT_CHARS {
        recommendations
            .push("evalscript is very short; make sure it contains the processing logic".to_string());
    }
    if !checks.uses_bands {
        recommendations.push("no band names (e.g. B04) referenced in the script".to_string());
    }

    ValidationReport {
        valid: issues.is_empty(),
        issues,
        checks: Some(checks),
        recommendations,
    }
}

fn version_marker(script: &str) -> Option<u32> {
    script
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(VERSION_MARKER_SCAN_LINES)
        .find_map(|line| VERSION_MARKER.captures(line))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn braces_balanced(script: &str) -> bool {
    let mut depth: i64 = 0;
    for ch in script.chars() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
