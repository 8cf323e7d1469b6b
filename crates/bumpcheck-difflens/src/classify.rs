//! Path-based detection of dependency manifests and deployment image files.
//!
//! Classification is a table of string rules evaluated against the
//! lowercased path. Matching is deliberately permissive: a false positive
//! costs a few prompt tokens, a missed manifest costs the whole analysis.

/// What kind of dependency information a file is expected to carry.
///
/// # Examples
///
/// ```
/// use bumpcheck_difflens::classify::{classify, FileKind};
///
/// assert_eq!(classify("go.mod"), Some(FileKind::Manifest));
/// assert_eq!(classify("deploy/helm/values.yaml"), Some(FileKind::DeploymentYaml));
/// assert_eq!(classify("build/Dockerfile.prod"), Some(FileKind::Dockerfile));
/// assert_eq!(classify("src/main.rs"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Package-manager manifest or lock file.
    Manifest,
    /// Compose, Kubernetes or Helm YAML that may pin image tags.
    DeploymentYaml,
    /// Container build file.
    Dockerfile,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Manifest => write!(f, "manifest"),
            FileKind::DeploymentYaml => write!(f, "deployment yaml"),
            FileKind::Dockerfile => write!(f, "dockerfile"),
        }
    }
}

/// How a rule's needle is compared to the lowercased path.
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// Path contains the needle, or ends with it.
    ContainsOrSuffix(&'static str),
    /// Path ends in `.yml`/`.yaml` and contains the needle.
    YamlContaining(&'static str),
    /// Path contains the needle anywhere.
    Contains(&'static str),
}

impl Matcher {
    fn matches(self, path: &str) -> bool {
        match self {
            Matcher::ContainsOrSuffix(needle) => path.contains(needle) || path.ends_with(needle),
            Matcher::YamlContaining(marker) => is_yaml(path) && path.contains(marker),
            Matcher::Contains(needle) => path.contains(needle),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    matcher: Matcher,
    kind: FileKind,
}

const fn manifest(name: &'static str) -> Rule {
    Rule {
        matcher: Matcher::ContainsOrSuffix(name),
        kind: FileKind::Manifest,
    }
}

const fn deployment(marker: &'static str) -> Rule {
    Rule {
        matcher: Matcher::YamlContaining(marker),
        kind: FileKind::DeploymentYaml,
    }
}

// Needles are lowercase. The `*.csproj` and `*.sln` entries are literal
// substrings, not globs.
const RULES: &[Rule] = &[
    // Node.js
    manifest("package.json"),
    manifest("package-lock.json"),
    manifest("yarn.lock"),
    manifest("pnpm-lock.yaml"),
    // Python
    manifest("requirements.txt"),
    manifest("pipfile"),
    manifest("poetry.lock"),
    manifest("pyproject.toml"),
    // Go
    manifest("go.mod"),
    manifest("go.sum"),
    // Rust
    manifest("cargo.toml"),
    manifest("cargo.lock"),
    // JVM
    manifest("pom.xml"),
    manifest("build.gradle"),
    manifest("gradle.properties"),
    // .NET
    manifest("*.csproj"),
    manifest("*.sln"),
    manifest("packages.config"),
    // Ruby
    manifest("gemfile"),
    manifest("gemfile.lock"),
    // PHP
    manifest("composer.json"),
    manifest("composer.lock"),
    // Dart
    manifest("pubspec.yaml"),
    // Elixir
    manifest("mix.exs"),
    manifest("mix.lock"),
    // CocoaPods
    manifest("podfile"),
    manifest("podfile.lock"),
    // Deployment YAML
    deployment("docker-compose"),
    deployment("kubernetes"),
    deployment("k8s"),
    deployment("values.yaml"),
    deployment("chart"),
    deployment("helm"),
    // Container builds
    Rule {
        matcher: Matcher::Contains("dockerfile"),
        kind: FileKind::Dockerfile,
    },
];

fn is_yaml(path: &str) -> bool {
    path.ends_with(".yml") || path.ends_with(".yaml")
}

/// Classify a path, returning the kind of the first matching rule.
///
/// Case-insensitive and total. A YAML file whose path carries none of the
/// deployment markers is not classified, even if it pins image tags.
pub fn classify(path: &str) -> Option<FileKind> {
    let path = path.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matcher.matches(&path))
        .map(|rule| rule.kind)
}

/// Whether a changed file is worth sending for dependency analysis.
///
/// # Examples
///
/// ```
/// use bumpcheck_difflens::classify::is_dependency_file;
///
/// assert!(is_dependency_file("GO.MOD"));
/// assert!(is_dependency_file("package-lock.json"));
/// assert!(!is_dependency_file("README.md"));
/// ```
pub fn is_dependency_file(path: &str) -> bool {
    classify(path).is_some()
}
