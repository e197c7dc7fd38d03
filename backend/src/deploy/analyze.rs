//! Project analysis
//!
//! Inspects a cloned repository to detect the framework and the files that
//! matter to the rest of the pipeline.

use std::path::Path;

/// Detected application framework
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    Node,
    Python,
    Go,
    Rust,
    Java,
    Unknown,
}

impl Framework {
    pub fn name(&self) -> &'static str {
        match self {
            Framework::Node => "Node.js",
            Framework::Python => "Python",
            Framework::Go => "Go",
            Framework::Rust => "Rust",
            Framework::Java => "Java",
            Framework::Unknown => "unknown",
        }
    }
}

/// What the analysis found in the repository
#[derive(Debug, Clone)]
pub struct ProjectProfile {
    pub framework: Framework,
    pub has_dockerfile: bool,
}

/// Detect the project framework from marker files
pub fn analyze_project(dir: &Path) -> ProjectProfile {
    let framework = if dir.join("package.json").exists() {
        Framework::Node
    } else if dir.join("requirements.txt").exists() || dir.join("pyproject.toml").exists() {
        Framework::Python
    } else if dir.join("go.mod").exists() {
        Framework::Go
    } else if dir.join("Cargo.toml").exists() {
        Framework::Rust
    } else if dir.join("pom.xml").exists() || dir.join("build.gradle").exists() {
        Framework::Java
    } else {
        Framework::Unknown
    };

    ProjectProfile {
        framework,
        has_dockerfile: dir.join("Dockerfile").exists(),
    }
}

/// Scan for files that should not be baked into a container image
pub fn scan_for_secrets(dir: &Path) -> Vec<String> {
    const SENSITIVE: &[&str] = &[".env", "id_rsa", "credentials.json", ".npmrc"];

    SENSITIVE
        .iter()
        .filter(|name| dir.join(name).exists())
        .map(|name| format!("sensitive file present: {}", name))
        .collect()
}
