//! Golden fixtures: `<case>.catalog.json` (+ optional `<case>.options.json`) must build
//! into exactly `<case>.schema.json`. The first catalog entry is the root.
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use colored::Colorize;
use schema_synth::{DescriptorSet, SchemaOptions, build_schema};
use serde_json::Value;

const CATALOG_SUFFIX: &str = ".catalog.json";

fn main() -> anyhow::Result<()> {
    let fixtures_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures"));
    let pattern = fixtures_dir.join(format!("*{CATALOG_SUFFIX}"));

    let mut passed = 0usize;
    let mut failed = 0usize;
    for entry in glob::glob(&pattern.to_string_lossy())? {
        let catalog_path = entry?;
        let case = case_name(&catalog_path);
        match run_case(&catalog_path) {
            Ok(()) => {
                passed += 1;
                eprintln!("✅ {}", case.green());
            }
            Err(error) => {
                failed += 1;
                eprintln!("❌ {}: {error:#}", case.red());
            }
        }
    }

    eprintln!("{passed} passed, {failed} failed");
    if passed + failed == 0 {
        bail!("no fixtures found under {}", fixtures_dir.display());
    }
    if failed > 0 {
        bail!("{failed} fixture(s) failed");
    }
    Ok(())
}

fn case_name(catalog_path: &Path) -> String {
    let file_name = catalog_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name.trim_end_matches(CATALOG_SUFFIX).to_owned()
}

fn sibling(catalog_path: &Path, suffix: &str) -> PathBuf {
    catalog_path.with_file_name(format!("{}{suffix}", case_name(catalog_path)))
}

fn run_case(catalog_path: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(catalog_path)
        .with_context(|| format!("failed to read {}", catalog_path.display()))?;
    let catalog = DescriptorSet::from_json_str(&source)?;
    let root = catalog
        .iter()
        .next()
        .map(|descriptor| descriptor.name.clone())
        .context("catalog is empty")?;

    let options_path = sibling(catalog_path, ".options.json");
    let options = if options_path.exists() {
        SchemaOptions::from_json_str(&std::fs::read_to_string(&options_path)?)?
    } else {
        SchemaOptions::default()
    };

    let expected_path = sibling(catalog_path, ".schema.json");
    let expected_src = std::fs::read_to_string(&expected_path)
        .with_context(|| format!("failed to read {}", expected_path.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&expected_src);
    let expected: Value = serde_path_to_error::deserialize(de)
        .with_context(|| format!("invalid JSON in {}", expected_path.display()))?;

    let actual = build_schema(&catalog, &root, &options)?;
    if actual != expected {
        bail!(
            "schema mismatch for `{root}`\n--- expected\n{}\n--- actual\n{}",
            serde_json::to_string_pretty(&expected)?,
            serde_json::to_string_pretty(&actual)?,
        );
    }
    Ok(())
}
