//! Tests for the progress line classifier

use servergem::models::deployment::StageStatus;
use servergem::progress::classifier::classify;
use servergem::progress::stages::StageId;

#[test]
fn test_stage_entry_lines() {
    let cases = [
        ("Cloning repository from https://github.com/acme/demo...", StageId::RepoAccess, 5),
        ("Analyzing project structure", StageId::CodeAnalysis, 20),
        ("Generating Dockerfile for Node.js...", StageId::DockerfileGeneration, 40),
        ("Running security scan...", StageId::SecurityScan, 55),
        ("Building container image...", StageId::ContainerBuild, 65),
        ("Deploying demo to us-central1...", StageId::CloudDeployment, 85),
    ];

    for (line, stage, progress) in cases {
        let update = classify(line).unwrap_or_else(|| panic!("no match for: {}", line));
        assert_eq!(update.stage, Some(stage), "line: {}", line);
        assert_eq!(update.status, StageStatus::InProgress, "line: {}", line);
        assert_eq!(update.progress, Some(progress), "line: {}", line);
        assert_eq!(update.details, vec![line.to_string()]);
    }
}

#[test]
fn test_stage_completion_lines() {
    let cases = [
        ("Repository cloned", StageId::RepoAccess, 15),
        ("Analysis complete: Node.js project detected", StageId::CodeAnalysis, 35),
        ("Dockerfile generated with multi-stage build", StageId::DockerfileGeneration, 50),
        ("Scan complete: 0 findings", StageId::SecurityScan, 60),
        ("Build complete", StageId::ContainerBuild, 80),
        ("Deployment successful", StageId::CloudDeployment, 100),
    ];

    for (line, stage, progress) in cases {
        let update = classify(line).unwrap_or_else(|| panic!("no match for: {}", line));
        assert_eq!(update.stage, Some(stage), "line: {}", line);
        assert_eq!(update.status, StageStatus::Success, "line: {}", line);
        assert_eq!(update.progress, Some(progress), "line: {}", line);
    }
}

#[test]
fn test_completion_beats_entry_cue() {
    // "cloned" completion outranks the "cloning" entry verb
    let update = classify("Cloning done: repository cloned successfully").unwrap();
    assert_eq!(update.stage, Some(StageId::RepoAccess));
    assert_eq!(update.status, StageStatus::Success);
}

#[test]
fn test_build_percent_rescaled_into_band() {
    let cases = [
        ("Building... 0%", 65),
        ("Building... 50%", 72),
        ("Building layer 7: 80% complete", 77),
        ("Build step finished, 100% done", 80),
    ];

    for (line, expected) in cases {
        let update = classify(line).unwrap_or_else(|| panic!("no match for: {}", line));
        assert_eq!(update.stage, Some(StageId::ContainerBuild), "line: {}", line);
        assert_eq!(update.status, StageStatus::InProgress, "line: {}", line);
        assert_eq!(update.progress, Some(expected), "line: {}", line);
    }
}

#[test]
fn test_labeled_errors_match() {
    let cases = [
        "Error: quota exceeded",
        "Failed: build step 3",
        "[ERROR] container_build: out of memory",
    ];

    for line in cases {
        let update = classify(line).unwrap_or_else(|| panic!("no match for: {}", line));
        assert_eq!(update.stage, None, "line: {}", line);
        assert_eq!(update.status, StageStatus::Error, "line: {}", line);
        assert_eq!(update.progress, None, "line: {}", line);
    }
}

#[test]
fn test_bare_error_mentions_do_not_match() {
    assert_eq!(classify("error budget remaining: 42"), None);
    assert_eq!(classify("0 errors, 2 warnings"), None);
    // Lowercase labels are not the pipeline's error format
    assert_eq!(classify("error: lowercase label"), None);
}

#[test]
fn test_success_phrase_beats_error_fallback() {
    let update = classify("Build complete, 0 errors found").unwrap();
    assert_eq!(update.stage, Some(StageId::ContainerBuild));
    assert_eq!(update.status, StageStatus::Success);
}

#[test]
fn test_unrecognized_lines_yield_none() {
    assert_eq!(classify(""), None);
    assert_eq!(classify("   \t  \n"), None);
    assert_eq!(classify("lorem ipsum dolor sit amet"), None);
    assert_eq!(classify("Step 4/9 : COPY . ."), None);
    assert_eq!(classify("\u{1f600}\u{1f680}"), None);
}

#[test]
fn test_case_insensitive_matching() {
    let update = classify("DEPLOYMENT SUCCESSFUL").unwrap();
    assert_eq!(update.stage, Some(StageId::CloudDeployment));
    assert_eq!(update.status, StageStatus::Success);
}

/// Deterministic xorshift generator, good enough for fuzz input assembly
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

#[test]
fn test_classifier_is_total_over_random_input() {
    const FRAGMENTS: &[&str] = &[
        "Error:", "Failed:", "[ERROR]", "Building", "%", "cloned", "Cloning", "Analyzing",
        "Analysis complete", "Dockerfile", "Deploying", "Deployment successful", "scan", "50",
        "100000", "\u{1f600}", "\n", "\t", " ", "xyz", "\"", "{",
    ];

    let mut rng = XorShift(0x5eed_cafe_f00d_0001);
    for _ in 0..10_000 {
        let parts = (rng.next() % 13) as usize;
        let mut line = String::new();
        for _ in 0..parts {
            line.push_str(FRAGMENTS[(rng.next() as usize) % FRAGMENTS.len()]);
        }

        // Must never panic, and any classification must be well-formed
        if let Some(update) = classify(&line) {
            if let Some(progress) = update.progress {
                assert!(progress <= 100, "line: {:?}", line);
            }
            assert!(
                update.stage.is_some() || update.status == StageStatus::Error,
                "stageless non-error classification for line: {:?}",
                line
            );
            assert!(!update.details.is_empty(), "line: {:?}", line);
        }
    }

    // One pathological long input
    let long_line = "Building 99% ".repeat(10_000);
    let update = classify(&long_line).unwrap();
    assert!(update.progress.unwrap() <= 100);
}
