//! End-to-end tests running the compiled `vmeta` binary.
//!
//! Tests the full pipeline: load documents → normalize → seek or merge → output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn vmeta_binary() -> String {
    env!("CARGO_BIN_EXE_vmeta").to_string()
}

/// Runs `vmeta` isolated from the user's config and environment.
fn vmeta(home: &Path, args: &[&str]) -> Output {
    Command::new(vmeta_binary())
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("VMETA_PRECISION")
        .env_remove("VMETA_FRAME_RATE")
        .env_remove("VMETA_DEDUP")
        .env_remove("VMETA_MAPPING_PATH")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run vmeta")
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "vmeta should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

/// Writes a description, an annotation and an inference document sharing one video.
fn fixtures(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let vd = write(
        dir,
        "vd.json",
        r##"{
            "metadata_files": {"serie_collection_name": "demo", "serie_name": "Walks", "serie_episode_number": 2},
            "actors": [{"name": "Ann"}],
            "augmented_vd_metadata": [
                {"start": "T00:00:00", "end": "T00:00:01", "vd": "Ann walks in.", "actor": {"$ref": "#/actors/0"}},
                {"start": "T00:00:01", "end": "T00:00:02.5", "vd": "Ann sits.", "actor": {"$ref": "#/actors/0"}}
            ]
        }"##,
    );
    let ta = write(
        dir,
        "ta.yaml",
        r"
data:
  - start_ms: 0
    end_ms: 1000
    annotations:
      - sentence: Ann walks in.
        tokens:
          - {pos: VERB, lemma: walk, type: action}
",
    );
    let vi = write(
        dir,
        "vi.json",
        r#"{"model": "slowfast", "predictions": [
            {"start": 0.5, "end": 3.0, "classes": ["sit", "walk"], "scores": [0.6, 0.3]}
        ]}"#,
    );
    (vd, ta, vi)
}

#[test]
fn test_inspect_at_time() {
    let temp = TempDir::new().unwrap();
    let (vd, ta, vi) = fixtures(temp.path());

    let output = vmeta(
        temp.path(),
        &[
            "inspect",
            "--at",
            "1200",
            "--vd",
            vd.to_str().unwrap(),
            "--ta",
            ta.to_str().unwrap(),
            "--vi",
            vi.to_str().unwrap(),
        ],
    );
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "[demo] Walks - Episode 2");
    assert_eq!(lines[1], "T00:00:01.200000");
    assert_eq!(
        lines[2],
        "  video_description: [T00:00:01.000000 - T00:00:02.500000] Ann sits."
    );
    assert_eq!(lines[3], "  text_annotation: (metadata exhausted)");
    assert_eq!(
        lines[4],
        "  video_inference_1: [T00:00:00.500000 - T00:00:03.000000] sit, walk"
    );
}

#[test]
fn test_merge_inline_and_deduplicated() {
    let temp = TempDir::new().unwrap();
    let (vd, ta, vi) = fixtures(temp.path());
    let inline_path = temp.path().join("merged.json");
    let dedup_path = temp.path().join("merged_dedup.json");

    for (path, extra) in [(&inline_path, None), (&dedup_path, Some("--dedup"))] {
        let mut args = vec![
            "merge",
            "--vd",
            vd.to_str().unwrap(),
            "--ta",
            ta.to_str().unwrap(),
            "--vi",
            vi.to_str().unwrap(),
            "--output",
            path.to_str().unwrap(),
        ];
        args.extend(extra);
        stdout(&vmeta(temp.path(), &args));
    }

    let inline: Value =
        serde_json::from_str(&std::fs::read_to_string(&inline_path).unwrap()).unwrap();
    let merged = inline["merged"].as_array().unwrap();
    assert_eq!(merged.len(), 4);
    assert_eq!(inline["details"]["total_merged"], 4);
    assert_eq!(inline["details"]["end_ms"], 3000.0);
    assert_eq!(merged[0]["video_description"]["actor"]["name"], "Ann");
    assert_eq!(merged[0]["video_inference"][0], Value::Null);
    assert_eq!(
        merged[1]["text_annotation"]["annotations"][0]["tokens"][0]["lemma"],
        "walk"
    );
    assert_eq!(merged[1]["text_annotation"]["start_ms"], 0.0);
    assert_eq!(merged[1]["text_annotation"]["end_ms"], 1000.0);
    assert!(inline.get("references").is_none());

    let dedup: Value =
        serde_json::from_str(&std::fs::read_to_string(&dedup_path).unwrap()).unwrap();
    let references = &dedup["references"];
    assert_eq!(references["video_description"].as_object().unwrap().len(), 2);
    // both descriptions link the same actor record
    assert_eq!(references["actors"].as_object().unwrap().len(), 1);
    assert_eq!(
        references["video_description"]["vd-2"]["actor"]["$ref"],
        "#/references/actors/actors-1"
    );
}

#[test]
fn test_merge_with_mapping_from_config() {
    let temp = TempDir::new().unwrap();
    let (_, _, vi) = fixtures(temp.path());
    let mapping = write(temp.path(), "mapping.yaml", "sit: rest\n'w.*': move\n");
    let config = write(
        temp.path(),
        "vmeta.toml",
        &format!("mapping_path = {:?}\n", mapping.to_str().unwrap()),
    );
    let out = temp.path().join("merged.yaml");

    stdout(&vmeta(
        temp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "merge",
            "--vi",
            vi.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ],
    ));

    let document: Value = serde_yaml::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(
        document["merged"][0]["video_inference"][0]["classes"],
        serde_json::json!(["rest", "move"])
    );
    assert_eq!(document["mapping"]["sit"], "rest");
}

#[test]
fn test_invalid_source_is_skipped() {
    let temp = TempDir::new().unwrap();
    let (vd, _, _) = fixtures(temp.path());
    let broken = write(temp.path(), "broken.json", r#"{"predictions": [{"end": 1}]}"#);

    let output = vmeta(
        temp.path(),
        &[
            "inspect",
            "--at",
            "500",
            "--vd",
            vd.to_str().unwrap(),
            "--vi",
            broken.to_str().unwrap(),
        ],
    );
    let text = stdout(&output);
    assert!(text.contains("video_inference_1: <no-metadata>"), "{text}");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("skipping invalid metadata source"), "{stderr}");
}

#[test]
fn test_merge_without_data_fails() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("merged.json");
    let output = vmeta(temp.path(), &["merge", "-o", out.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no metadata provided"), "{stderr}");
}

#[test]
fn test_trace_reports_changes() {
    let temp = TempDir::new().unwrap();
    let (vd, _, _) = fixtures(temp.path());

    let output = vmeta(
        temp.path(),
        &["trace", "--fps", "2", "--vd", vd.to_str().unwrap()],
    );
    let text = stdout(&output);
    let headers: Vec<&str> = text.lines().filter(|l| !l.starts_with(' ')).collect();
    assert_eq!(
        headers,
        [
            "T00:00:00.000000 (frame 0)",
            "T00:00:01.000000 (frame 2)",
            "T00:00:03.000000 (frame 6)",
        ]
    );
}
