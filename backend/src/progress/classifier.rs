//! Progress line classifier
//!
//! Turns free-text pipeline output into structured stage updates. Rules are
//! an ordered table evaluated first-match-wins: completion phrases rank
//! above entry phrases, build percentages above the bare "building" cue,
//! and a narrow labeled-error fallback comes last so lines like
//! "Build complete, 0 errors found" resolve as successes.

use crate::models::deployment::StageStatus;
use crate::progress::stages::{scale_build_percent, StageId};

/// Structured result of classifying one output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedUpdate {
    /// Target stage. `None` means "whichever stage is currently active",
    /// used by the error fallback.
    pub stage: Option<StageId>,
    pub status: StageStatus,
    pub details: Vec<String>,
    pub progress: Option<u8>,
}

enum Matcher {
    /// Case-insensitive: line contains any of these phrases
    Any(&'static [&'static str]),
    /// Case-insensitive: line contains all of these phrases
    All(&'static [&'static str]),
    /// Line mentions a build and carries an explicit percentage
    BuildPercent,
    /// Line starts with an error label ("Error:", "Failed:") or carries
    /// an "[ERROR]" marker. Never matches a bare "error" substring.
    ErrorLabel,
}

struct Rule {
    matcher: Matcher,
    stage: Option<StageId>,
    status: StageStatus,
    progress: Option<u8>,
}

const RULES: &[Rule] = &[
    // Stage completions, checked before entry cues so that a completion
    // line mentioning the stage verb still resolves as done.
    Rule {
        matcher: Matcher::Any(&["repository cloned", "cloned successfully", "clone complete"]),
        stage: Some(StageId::RepoAccess),
        status: StageStatus::Success,
        progress: Some(StageId::RepoAccess.done_progress()),
    },
    Rule {
        matcher: Matcher::Any(&["analysis complete", "analysis finished"]),
        stage: Some(StageId::CodeAnalysis),
        status: StageStatus::Success,
        progress: Some(StageId::CodeAnalysis.done_progress()),
    },
    Rule {
        matcher: Matcher::Any(&["dockerfile generated", "dockerfile created", "dockerfile ready"]),
        stage: Some(StageId::DockerfileGeneration),
        status: StageStatus::Success,
        progress: Some(StageId::DockerfileGeneration.done_progress()),
    },
    Rule {
        matcher: Matcher::Any(&["scan complete", "no vulnerabilities found"]),
        stage: Some(StageId::SecurityScan),
        status: StageStatus::Success,
        progress: Some(StageId::SecurityScan.done_progress()),
    },
    Rule {
        matcher: Matcher::Any(&[
            "build complete",
            "build succeeded",
            "image built",
            "successfully built",
        ]),
        stage: Some(StageId::ContainerBuild),
        status: StageStatus::Success,
        progress: Some(StageId::ContainerBuild.done_progress()),
    },
    Rule {
        matcher: Matcher::Any(&[
            "deployment successful",
            "deployed successfully",
            "service deployed",
            "deployment complete",
        ]),
        stage: Some(StageId::CloudDeployment),
        status: StageStatus::Success,
        progress: Some(StageId::CloudDeployment.done_progress()),
    },
    // Stage entries
    Rule {
        matcher: Matcher::Any(&["cloning"]),
        stage: Some(StageId::RepoAccess),
        status: StageStatus::InProgress,
        progress: Some(StageId::RepoAccess.entry_progress()),
    },
    Rule {
        matcher: Matcher::Any(&["analyzing"]),
        stage: Some(StageId::CodeAnalysis),
        status: StageStatus::InProgress,
        progress: Some(StageId::CodeAnalysis.entry_progress()),
    },
    Rule {
        matcher: Matcher::All(&["generating", "dockerfile"]),
        stage: Some(StageId::DockerfileGeneration),
        status: StageStatus::InProgress,
        progress: Some(StageId::DockerfileGeneration.entry_progress()),
    },
    Rule {
        matcher: Matcher::Any(&["security scan", "scanning"]),
        stage: Some(StageId::SecurityScan),
        status: StageStatus::InProgress,
        progress: Some(StageId::SecurityScan.entry_progress()),
    },
    // Percentage before the bare "building" cue, so "Building... 50%"
    // lands inside the build band instead of at its start.
    Rule {
        matcher: Matcher::BuildPercent,
        stage: Some(StageId::ContainerBuild),
        status: StageStatus::InProgress,
        progress: None,
    },
    Rule {
        matcher: Matcher::Any(&["building"]),
        stage: Some(StageId::ContainerBuild),
        status: StageStatus::InProgress,
        progress: Some(StageId::ContainerBuild.entry_progress()),
    },
    Rule {
        matcher: Matcher::Any(&["deploying"]),
        stage: Some(StageId::CloudDeployment),
        status: StageStatus::InProgress,
        progress: Some(StageId::CloudDeployment.entry_progress()),
    },
    // Last resort: labeled errors only
    Rule {
        matcher: Matcher::ErrorLabel,
        stage: None,
        status: StageStatus::Error,
        progress: None,
    },
];

/// Classify one line of pipeline output.
///
/// Returns `None` when the line carries no recognizable progress signal.
/// Total over all inputs, never panics.
pub fn classify(line: &str) -> Option<ClassifiedUpdate> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();

    for rule in RULES {
        let matched = match &rule.matcher {
            Matcher::Any(phrases) => phrases.iter().any(|p| lowered.contains(p)),
            Matcher::All(phrases) => phrases.iter().all(|p| lowered.contains(p)),
            Matcher::BuildPercent => {
                lowered.contains("build") && extract_percent(trimmed).is_some()
            }
            Matcher::ErrorLabel => is_error_line(trimmed),
        };
        if matched {
            let progress = match rule.matcher {
                Matcher::BuildPercent => extract_percent(trimmed).map(scale_build_percent),
                _ => rule.progress,
            };
            return Some(ClassifiedUpdate {
                stage: rule.stage,
                status: rule.status,
                details: vec![trimmed.to_string()],
                progress,
            });
        }
    }

    None
}

fn is_error_line(line: &str) -> bool {
    line.starts_with("Error:") || line.starts_with("Failed:") || line.contains("[ERROR]")
}

/// Extract the number immediately preceding the first '%' sign, capped at 100
fn extract_percent(line: &str) -> Option<u8> {
    let bytes = line.as_bytes();
    let percent_pos = line.find('%')?;
    let digits_end = percent_pos;
    let mut digits_start = digits_end;
    while digits_start > 0 && bytes[digits_start - 1].is_ascii_digit() {
        digits_start -= 1;
    }
    if digits_start == digits_end {
        return None;
    }
    let value: u32 = line[digits_start..digits_end].parse().ok()?;
    Some(value.min(100) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_percent_beats_building_cue() {
        let update = classify("Building... 50%").unwrap();
        assert_eq!(update.stage, Some(StageId::ContainerBuild));
        assert_eq!(update.status, StageStatus::InProgress);
        assert_eq!(update.progress, Some(72));
    }

    #[test]
    fn test_build_success_beats_error_fallback() {
        let update = classify("Build complete, 0 errors found").unwrap();
        assert_eq!(update.stage, Some(StageId::ContainerBuild));
        assert_eq!(update.status, StageStatus::Success);
    }

    #[test]
    fn test_bare_error_substring_not_matched() {
        assert_eq!(classify("error budget remaining: 42"), None);
    }

    #[test]
    fn test_extract_percent() {
        assert_eq!(extract_percent("Step 3: 75% done"), Some(75));
        assert_eq!(extract_percent("at 100%"), Some(100));
        assert_eq!(extract_percent("999% over"), Some(100));
        assert_eq!(extract_percent("no digits %"), None);
        assert_eq!(extract_percent("nothing here"), None);
    }
}
