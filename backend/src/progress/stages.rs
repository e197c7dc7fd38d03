//! Deployment pipeline stage table
//!
//! The pipeline runs a fixed sequence of stages. Each stage owns a band of
//! the overall progress percentage: entering a stage moves overall progress
//! to the band start, completing it moves progress to the band end.

use serde::{Deserialize, Serialize};

/// Identifier for a pipeline stage, in pipeline order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    RepoAccess,
    CodeAnalysis,
    DockerfileGeneration,
    SecurityScan,
    ContainerBuild,
    CloudDeployment,
}

/// Start of the container-build progress band
pub const BUILD_BAND_START: u8 = 65;

/// End of the container-build progress band
pub const BUILD_BAND_END: u8 = 80;

impl StageId {
    /// All stages in pipeline order
    pub const ALL: [StageId; 6] = [
        StageId::RepoAccess,
        StageId::CodeAnalysis,
        StageId::DockerfileGeneration,
        StageId::SecurityScan,
        StageId::ContainerBuild,
        StageId::CloudDeployment,
    ];

    /// Stable string key, matching the serde representation
    pub const fn key(self) -> &'static str {
        match self {
            StageId::RepoAccess => "repo_access",
            StageId::CodeAnalysis => "code_analysis",
            StageId::DockerfileGeneration => "dockerfile_generation",
            StageId::SecurityScan => "security_scan",
            StageId::ContainerBuild => "container_build",
            StageId::CloudDeployment => "cloud_deployment",
        }
    }

    /// Human-readable label
    pub const fn label(self) -> &'static str {
        match self {
            StageId::RepoAccess => "Repository Access",
            StageId::CodeAnalysis => "Code Analysis",
            StageId::DockerfileGeneration => "Dockerfile Generation",
            StageId::SecurityScan => "Security Scan",
            StageId::ContainerBuild => "Container Build",
            StageId::CloudDeployment => "Cloud Deployment",
        }
    }

    /// Overall progress checkpoint when the stage starts
    pub const fn entry_progress(self) -> u8 {
        match self {
            StageId::RepoAccess => 5,
            StageId::CodeAnalysis => 20,
            StageId::DockerfileGeneration => 40,
            StageId::SecurityScan => 55,
            StageId::ContainerBuild => BUILD_BAND_START,
            StageId::CloudDeployment => 85,
        }
    }

    /// Overall progress checkpoint when the stage completes
    pub const fn done_progress(self) -> u8 {
        match self {
            StageId::RepoAccess => 15,
            StageId::CodeAnalysis => 35,
            StageId::DockerfileGeneration => 50,
            StageId::SecurityScan => 60,
            StageId::ContainerBuild => BUILD_BAND_END,
            StageId::CloudDeployment => 100,
        }
    }

    /// Look up a stage by its stable string key
    pub fn from_key(key: &str) -> Option<StageId> {
        StageId::ALL.iter().copied().find(|s| s.key() == key)
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Map a container build percentage onto the overall progress band.
///
/// A reported build percentage p lands at `65 + p * 15 / 100`, truncating.
/// Inputs above 100 are clamped.
pub fn scale_build_percent(percent: u8) -> u8 {
    let p = percent.min(100) as u16;
    let span = (BUILD_BAND_END - BUILD_BAND_START) as u16;
    (BUILD_BAND_START as u16 + p * span / 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_round_trip() {
        for stage in StageId::ALL {
            assert_eq!(StageId::from_key(stage.key()), Some(stage));
        }
        assert_eq!(StageId::from_key("warp_drive"), None);
    }

    #[test]
    fn test_checkpoints_are_ordered() {
        for window in StageId::ALL.windows(2) {
            assert!(window[0].done_progress() < window[1].entry_progress());
        }
        for stage in StageId::ALL {
            assert!(stage.entry_progress() < stage.done_progress());
        }
    }

    #[test]
    fn test_scale_build_percent() {
        assert_eq!(scale_build_percent(0), 65);
        assert_eq!(scale_build_percent(50), 72);
        assert_eq!(scale_build_percent(100), 80);
        assert_eq!(scale_build_percent(255), 80);
    }

    #[test]
    fn test_serde_key_matches() {
        let json = serde_json::to_string(&StageId::ContainerBuild).unwrap();
        assert_eq!(json, "\"container_build\"");
        let parsed: StageId = serde_json::from_str("\"repo_access\"").unwrap();
        assert_eq!(parsed, StageId::RepoAccess);
    }
}
