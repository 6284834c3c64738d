use std::{fs, path::PathBuf};

use tempfile::tempdir;

use meridian::{ErrorCode, MeridianError, parse_entities};
use meridian_cli::{Args, Command, run};

const BROKEN: &str = r#"[
  {
    "path": "model::Firm",
    "classifierPath": "meta::pure::metamodel::type::Class",
    "content": {
      "_type": "class",
      "name": "Firm",
      "package": "model",
      "superTypes": ["model::LegalEntity"]
    }
  }
]"#;

/// Entity fixtures shared with the library crates.
fn fixtures() -> Vec<PathBuf> {
    let crates = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf();
    vec![
        crates.join("meridian-protocol/tests/fixtures/model.json"),
        crates.join("meridian/tests/fixtures/extensions.json"),
    ]
}

fn args(command: Command) -> Args {
    Args {
        command,
        config: None,
        log_level: "off".to_string(),
    }
}

fn path_string(path: &std::path::Path) -> String {
    path.to_string_lossy().to_string()
}

fn build_codes(result: Result<(), MeridianError>) -> Vec<ErrorCode> {
    match result {
        Err(MeridianError::Build { err, .. }) => {
            err.diagnostics().iter().filter_map(|d| d.code()).collect()
        }
        other => panic!("Expected a build error, got {other:?}"),
    }
}

#[test]
fn e2e_smoke_test_fixtures() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let mut failed = Vec::new();
    for fixture in fixtures() {
        let input = path_string(&fixture);
        let stem = fixture.file_stem().unwrap().to_string_lossy().to_string();
        let hashes = temp_dir.path().join(format!("{stem}.hashes.json"));
        let written = temp_dir.path().join(format!("{stem}.written.json"));

        let commands = [
            Command::Check {
                input: input.clone(),
            },
            Command::Hash {
                input: input.clone(),
                output: Some(path_string(&hashes)),
            },
            Command::Roundtrip {
                input: input.clone(),
                output: Some(path_string(&written)),
            },
            Command::Diff {
                before: input.clone(),
                after: input.clone(),
            },
        ];
        for command in commands {
            let label = format!("{command:?}");
            if let Err(e) = run(&args(command)) {
                failed.push(format!("{label}: {e}"));
            }
        }
    }

    assert!(failed.is_empty(), "Commands failed unexpectedly: {failed:#?}");
}

#[test]
fn e2e_roundtrip_output_is_an_entity_collection() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let fixture = &fixtures()[0];
    let written = temp_dir.path().join("written.json");

    run(&args(Command::Roundtrip {
        input: path_string(fixture),
        output: Some(path_string(&written)),
    }))
    .expect("Round trip failed");

    let original = parse_entities(&fs::read_to_string(fixture).unwrap()).unwrap();
    let output = parse_entities(&fs::read_to_string(&written).unwrap()).unwrap();
    assert_eq!(output.len(), original.len());
}

#[test]
fn e2e_hash_output_lists_every_element() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let fixture = &fixtures()[1];
    let hashes = temp_dir.path().join("hashes.json");

    run(&args(Command::Hash {
        input: path_string(fixture),
        output: Some(path_string(&hashes)),
    }))
    .expect("Hash failed");

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&hashes).unwrap()).unwrap();
    let entries = report.as_array().expect("hash report is an array");
    let readme = entries
        .iter()
        .find(|entry| entry["path"] == "docs::README")
        .expect("README hash");
    assert!(readme["hash"].as_str().unwrap().starts_with("sha256:"));
}

#[test]
fn e2e_unresolved_reference_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("broken.json");
    fs::write(&input, BROKEN).unwrap();

    let codes = build_codes(run(&args(Command::Check {
        input: path_string(&input),
    })));

    assert_eq!(codes, vec![ErrorCode::E200]);
}

#[test]
fn e2e_config_disables_presets() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "[extensions]\nenabled = [\"text\"]\n").unwrap();

    let result = run(&Args {
        command: Command::Check {
            input: path_string(&fixtures()[1]),
        },
        config: Some(path_string(&config)),
        log_level: "off".to_string(),
    });

    assert!(build_codes(result).iter().all(|code| *code == ErrorCode::E005));
}

#[test]
fn e2e_missing_input_is_an_io_error() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("absent.json");

    let result = run(&args(Command::Check {
        input: path_string(&input),
    }));

    assert!(matches!(result, Err(MeridianError::Io(_))));
}
