use std::fmt::Write;

use bumpcheck_core::{BumpcheckError, FileDiff, PullRequestSummary};
use bumpcheck_difflens::collect::truncate_chars;

/// Revision of [`ANALYSIS_TEMPLATE`]. Bump on any change to its headings.
pub const TEMPLATE_VERSION: u32 = 1;

/// Maximum characters of the PR description included in the prompt.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Appended to a description cut at [`MAX_DESCRIPTION_CHARS`].
pub const DESCRIPTION_TRUNCATION_MARKER: &str = "...";

const PREAMBLE: &str = "\
You are an expert software engineer specializing in dependency management and \
breaking change analysis. Your responses must be clear, actionable, and structured \
according to the format provided.";

/// Instruction template. Placeholders: `{pr_title}`, `{pr_description}`,
/// `{diff_summary}`. Downstream consumers key off the numbered headings.
pub const ANALYSIS_TEMPLATE: &str = r#"You are an expert software engineer specializing in dependency management and breaking change analysis. Your task is to provide clear, actionable insights that help developers make informed decisions about dependency updates.

## Context

**PR Title:** {pr_title}

**PR Description:** {pr_description}

**Code Changes (Diffs):**
{diff_summary}

## Analysis Requirements

Analyze the provided diffs and provide a comprehensive, structured analysis. Follow this exact format:

### 📦 1. Dependency Changes Summary

List ALL dependency changes found in the diffs. For each change, specify:
- **Package/Image Name**: Exact name from the diff
- **Version Change**: Old version → New version (e.g., "1.2.3 → 2.0.0")
- **Update Type**: Major / Minor / Patch / Docker image tag
- **File Location**: Which file(s) contain this change

Supported formats:
- Node.js: package.json, package-lock.json, yarn.lock, pnpm-lock.yaml
- Python: requirements.txt, Pipfile, poetry.lock, pyproject.toml
- Go: go.mod, go.sum
- Rust: Cargo.toml, Cargo.lock
- Java: pom.xml, build.gradle
- .NET: *.csproj, *.sln, packages.config
- Ruby: Gemfile, Gemfile.lock
- PHP: composer.json, composer.lock
- Docker/Kubernetes: Look for "image:" lines or "repository:" + "tag:" pairs in YAML files

### ⚠️ 2. Breaking Changes Risk Assessment

For EACH dependency change, assess breaking change risk:

**Risk Level**: 🔴 HIGH / 🟡 MEDIUM / 🟢 LOW

**Reasoning**:
- Semantic versioning analysis (major bumps = HIGH risk)
- Known breaking changes in changelogs/release notes
- Deprecation warnings or removed features
- API/interface changes detected

**Specific Breaking Changes** (if any):
- List concrete breaking changes (e.g., "API method X removed", "Configuration format changed")
- Reference specific versions or changelog entries if known

### 📊 3. Impact Analysis

Assess the potential impact on the codebase:

**Affected Areas**:
- List specific files, modules, or components that might be affected
- Identify services or features that depend on these changes
- Note any transitive dependencies that might be impacted

**Potential Issues**:
- Runtime errors or exceptions that might occur
- Build/compilation issues
- Performance implications
- Security considerations

**Severity**: 🔴 Critical / 🟡 Moderate / 🟢 Low

### 🔄 4. Migration Requirements

Provide actionable migration steps if needed:

**Required Actions** (if breaking changes detected):
1. [Specific step 1 with code examples if applicable]
2. [Specific step 2]
3. [Continue as needed]

**Code Changes Needed**:
- List specific code locations that need updates
- Provide code examples or patterns if helpful
- Note any configuration file changes

**Estimated Effort**: [X hours/days] or "No changes required"

### 🧪 5. Testing Recommendations

Provide specific, actionable testing guidance:

**Critical Test Areas**:
- [Specific feature/component to test]
- [Specific functionality to verify]
- [Specific integration to check]

**Test Types**:
- **Unit Tests**: [Specific test files or functions to update/run]
- **Integration Tests**: [Specific integration scenarios to verify]
- **Manual Testing**: [Specific user flows or features to manually test]

**Regression Risks**:
- List specific areas where regressions are most likely
- Suggest test cases to add if missing

### 🎯 6. Confidence Level & Recommendation

**Confidence Level**: 
- 🔴 **LOW**: Significant uncertainty, requires thorough review
- 🟡 **MEDIUM**: Some uncertainty, review recommended
- 🟢 **HIGH**: High confidence, likely safe

**Reasoning**: [Explain why you assigned this confidence level]

**Recommendation**: 
- ✅ **MERGE**: Safe to merge, no action needed
- ⚠️ **REVIEW REQUIRED**: Requires human review before merging
- ❌ **DO NOT MERGE**: Contains breaking changes that need migration first

**Next Steps** (if not MERGE):
1. [Specific action item 1]
2. [Specific action item 2]
3. [Continue as needed]

## Output Format Guidelines

- Use clear markdown formatting with headers, lists, and code blocks
- Be specific and concrete - avoid vague statements
- Provide actionable guidance - tell developers exactly what to do
- Use emojis for visual clarity (as shown in the format above)
- If no issues found, clearly state "No breaking changes detected" and recommend merge
- If issues found, prioritize them by severity and provide clear remediation steps

## Important Notes

- Base your analysis ONLY on the diffs provided - do not make assumptions
- For Docker images, check both formats:
  - Direct: image: registry/image:tag
  - Structured: repository: "image" with tag: "version"
- When in doubt about breaking changes, err on the side of caution
- Provide specific file paths, function names, or code locations when possible
- If you cannot determine something from the diffs, state "Cannot determine from provided diffs" rather than guessing"#;

/// Build the full analysis request for a pull request.
///
/// Deterministic: identical inputs give byte-identical output. Diffs are
/// rendered in the given order and are expected to be bounded already.
///
/// # Errors
///
/// Returns [`BumpcheckError::Prompt`] only if [`ANALYSIS_TEMPLATE`] is
/// malformed.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::{FileDiff, PullRequestSummary};
/// use bumpcheck_review::prompt::assemble;
///
/// let summary = PullRequestSummary {
///     title: Some("chore(deps): update module foo to v2".into()),
///     description: None,
/// };
/// let diffs = vec![FileDiff {
///     file_name: "go.mod".into(),
///     diff_text: "-foo v1.2.0\n+foo v2.0.0".into(),
/// }];
/// let prompt = assemble(&summary, &diffs).unwrap();
/// assert!(prompt.contains("update module foo to v2"));
/// assert!(prompt.contains("**File: go.mod**"));
/// ```
pub fn assemble(
    summary: &PullRequestSummary,
    diffs: &[FileDiff],
) -> Result<String, BumpcheckError> {
    let title = summary.title.as_deref().unwrap_or_default();
    let description = summary
        .description
        .as_deref()
        .map(bound_description)
        .unwrap_or_default();
    let diff_summary = build_diff_summary(diffs);

    let body = render_template(
        ANALYSIS_TEMPLATE,
        &[
            ("pr_title", title),
            ("pr_description", description.as_str()),
            ("diff_summary", diff_summary.as_str()),
        ],
    )?;

    Ok(format!("{PREAMBLE}\n\n{body}"))
}

/// Render each diff as a labelled fenced block, in order.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::FileDiff;
/// use bumpcheck_review::prompt::build_diff_summary;
///
/// let text = build_diff_summary(&[FileDiff {
///     file_name: "Cargo.toml".into(),
///     diff_text: "+serde = \"1\"".into(),
/// }]);
/// assert_eq!(text, "\n**File: Cargo.toml**\n```diff\n+serde = \"1\"\n```\n");
/// ```
pub fn build_diff_summary(diffs: &[FileDiff]) -> String {
    let mut out = String::new();
    for diff in diffs {
        let _ = write!(
            out,
            "\n**File: {}**\n```diff\n{}\n```\n",
            diff.file_name, diff.diff_text
        );
    }
    out
}

fn bound_description(description: &str) -> String {
    match truncate_chars(description, MAX_DESCRIPTION_CHARS) {
        Some(head) => format!("{head}{DESCRIPTION_TRUNCATION_MARKER}"),
        None => description.to_string(),
    }
}

/// Substitute `{name}` placeholders in a single left-to-right pass.
///
/// Substituted values are copied verbatim, so braces inside them are never
/// treated as placeholders.
///
/// # Errors
///
/// Returns [`BumpcheckError::Prompt`] for an unterminated placeholder or a
/// name with no value.
///
/// # Examples
///
/// ```
/// use bumpcheck_review::prompt::render_template;
///
/// let out = render_template("Hi {who}!", &[("who", "{there}")]).unwrap();
/// assert_eq!(out, "Hi {there}!");
/// assert!(render_template("Hi {who", &[("who", "x")]).is_err());
/// assert!(render_template("Hi {nobody}", &[("who", "x")]).is_err());
/// ```
pub fn render_template(
    template: &str,
    values: &[(&str, &str)],
) -> Result<String, BumpcheckError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            BumpcheckError::Prompt(format!(
                "unterminated placeholder in template v{TEMPLATE_VERSION}"
            ))
        })?;
        let name = &after[..close];
        let value = values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                BumpcheckError::Prompt(format!(
                    "unknown placeholder '{{{name}}}' in template v{TEMPLATE_VERSION}"
                ))
            })?;
        out.push_str(value);
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn go_mod_diff() -> FileDiff {
        FileDiff {
            file_name: "go.mod".into(),
            diff_text: "-v1.2.0\n+v2.0.0".into(),
        }
    }

    #[test]
    fn template_renders_with_known_placeholders() {
        let prompt = assemble(&PullRequestSummary::default(), &[go_mod_diff()]);
        assert!(prompt.is_ok());
    }

    #[test]
    fn prompt_contains_structured_sections() {
        let prompt = assemble(&PullRequestSummary::default(), &[]).unwrap();
        for heading in [
            "### 📦 1. Dependency Changes Summary",
            "### ⚠️ 2. Breaking Changes Risk Assessment",
            "### 📊 3. Impact Analysis",
            "### 🔄 4. Migration Requirements",
            "### 🧪 5. Testing Recommendations",
            "### 🎯 6. Confidence Level & Recommendation",
        ] {
            assert!(prompt.contains(heading), "missing {heading}");
        }
        assert!(prompt.contains("🔴 HIGH / 🟡 MEDIUM / 🟢 LOW"));
        assert!(prompt.contains("**DO NOT MERGE**"));
    }

    #[test]
    fn template_keeps_instruction_wording() {
        for line in [
            "List ALL dependency changes found in the diffs. For each change, specify:",
            "Provide actionable migration steps if needed:",
            "**Required Actions** (if breaking changes detected):",
            "- Use emojis for visual clarity (as shown in the format above)",
            "- Base your analysis ONLY on the diffs provided - do not make assumptions",
            "  - Structured: repository: \"image\" with tag: \"version\"",
        ] {
            assert!(ANALYSIS_TEMPLATE.contains(line), "missing {line}");
        }
    }

    #[test]
    fn prompt_starts_with_preamble() {
        let prompt = assemble(&PullRequestSummary::default(), &[]).unwrap();
        assert!(prompt.starts_with(PREAMBLE));
    }

    #[test]
    fn absent_title_and_description_render_empty() {
        let prompt = assemble(&PullRequestSummary::default(), &[]).unwrap();
        assert!(prompt.contains("**PR Title:** \n"));
        assert!(prompt.contains("**PR Description:** \n"));
        assert!(!prompt.contains("{pr_title}"));
    }

    #[test]
    fn prompt_contains_literal_diff() {
        let summary = PullRequestSummary {
            title: Some("Update go deps".into()),
            description: Some("Bumps module".into()),
        };
        let prompt = assemble(&summary, &[go_mod_diff()]).unwrap();
        assert!(prompt.contains("**PR Title:** Update go deps"));
        assert!(prompt.contains("**PR Description:** Bumps module"));
        assert!(prompt.contains("```diff\n-v1.2.0\n+v2.0.0\n```"));
    }

    #[test]
    fn long_description_is_truncated() {
        let summary = PullRequestSummary {
            title: None,
            description: Some("d".repeat(MAX_DESCRIPTION_CHARS + 50)),
        };
        let prompt = assemble(&summary, &[]).unwrap();
        let expected = format!("{}...\n", "d".repeat(MAX_DESCRIPTION_CHARS));
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&"d".repeat(MAX_DESCRIPTION_CHARS + 1)));
    }

    #[test]
    fn description_at_limit_is_untouched() {
        let description = "e".repeat(MAX_DESCRIPTION_CHARS);
        assert_eq!(bound_description(&description), description);
    }

    #[test]
    fn diffs_keep_input_order() {
        let diffs = vec![
            FileDiff {
                file_name: "z/package.json".into(),
                diff_text: "+a".into(),
            },
            FileDiff {
                file_name: "a/go.mod".into(),
                diff_text: "+b".into(),
            },
        ];
        let text = build_diff_summary(&diffs);
        let z = text.find("z/package.json").unwrap();
        let a = text.find("a/go.mod").unwrap();
        assert!(z < a);
    }

    #[test]
    fn assembly_is_deterministic() {
        let summary = PullRequestSummary {
            title: Some("t".into()),
            description: Some("d".into()),
        };
        let diffs = vec![go_mod_diff()];
        assert_eq!(
            assemble(&summary, &diffs).unwrap(),
            assemble(&summary, &diffs).unwrap()
        );
    }

    #[test]
    fn braces_in_values_are_not_reinterpreted() {
        let summary = PullRequestSummary {
            title: Some("{diff_summary}".into()),
            description: Some("{unknown}".into()),
        };
        let prompt = assemble(&summary, &[]).unwrap();
        assert!(prompt.contains("**PR Title:** {diff_summary}"));
        assert!(prompt.contains("**PR Description:** {unknown}"));
    }

    #[test]
    fn render_rejects_malformed_templates() {
        let err = render_template("{open", &[]).unwrap_err();
        assert!(matches!(err, BumpcheckError::Prompt(_)));
        let err = render_template("{missing}", &[("other", "x")]).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
