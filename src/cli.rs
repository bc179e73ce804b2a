//! CLI: descriptor catalogs → (schema | list)
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::catalog::DescriptorSet;
use crate::document::encode_to_schema;
use crate::options::{DefinitionPolicy, EncodeOptions, SchemaOptions};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// derive draft-07 JSON Schema documents from descriptor catalogs
#[derive(Parser, Debug)]
#[command(name = "schema-synth", version)]
pub struct CommandLineInterface {
    /// only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// report registry and build diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// build schema documents for one or more catalog types
    Schema(SchemaOut),
    /// print the types a catalog defines
    List(ListOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more catalog files (JSON arrays of descriptors). May be literal paths or
    /// quoted glob patterns; later files override earlier types of the same name.
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// catalog type(s) to build a document for
    #[arg(long, short, num_args = 1.., required = true)]
    root: Vec<String>,

    /// output .json file, or a directory receiving `<root>.schema.json` files (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// which occurrences become shared definitions
    #[arg(long, value_enum)]
    definitions: Option<DefinitionPolicy>,

    /// emit `additionalProperties: false` on records
    #[arg(long)]
    deny_additional_properties: bool,

    /// single-line output
    #[arg(long)]
    compact: bool,

    /// JSON file with build options; flags given here win over it
    #[arg(long)]
    config: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ListOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_catalog(&self) -> anyhow::Result<DescriptorSet> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut catalog = DescriptorSet::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read catalog file {}", source_path.display()))?;
            let part = DescriptorSet::from_json_str(&source)
                .with_context(|| format!("failed to parse catalog file {}", source_path.display()))?;
            debug!(path = %source_path.display(), types = part.len(), "loaded catalog");
            catalog.extend(part.iter().cloned());
        }
        Ok(catalog)
    }
}

impl SchemaOut {
    fn options(&self) -> anyhow::Result<SchemaOptions> {
        let mut options = match self.config.as_ref() {
            Some(path) => {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                SchemaOptions::from_json_str(&source)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            None => SchemaOptions::default(),
        };
        if let Some(policy) = self.definitions {
            options.definitions = policy;
        }
        if self.deny_additional_properties {
            options.deny_additional_properties = true;
        }
        Ok(options)
    }

    fn encode_options(&self) -> EncodeOptions {
        if self.compact { EncodeOptions::compact() } else { EncodeOptions::default() }
    }

    fn run(&self) -> anyhow::Result<()> {
        let catalog = self.input_settings.load_catalog()?;
        let options = self.options()?;
        let encode = self.encode_options();

        // one registry per root; roots share nothing but the catalog
        let rendered = self
            .root
            .par_iter()
            .map(|root| {
                let schema_src = encode_to_schema(&catalog, root, &options, &encode)
                    .with_context(|| format!("failed to build schema for `{root}`"))?;
                Ok((root.as_str(), schema_src))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        match self.out.as_ref() {
            None => {
                for (_, schema_src) in &rendered {
                    println!("{schema_src}");
                }
            }
            Some(out) if rendered.len() > 1 || out.is_dir() => {
                std::fs::create_dir_all(out)
                    .with_context(|| format!("failed to create output directory {}", out.display()))?;
                for (root, schema_src) in &rendered {
                    write_output(&out.join(format!("{root}.schema.json")), schema_src)?;
                }
            }
            Some(out) => {
                if let Some((_, schema_src)) = rendered.first() {
                    write_output(out, schema_src)?;
                }
            }
        }
        Ok(())
    }
}

impl ListOut {
    fn run(&self) -> anyhow::Result<()> {
        let catalog = self.input_settings.load_catalog()?;
        for descriptor in catalog.iter() {
            let nullable = if descriptor.nullable { "?" } else { "" };
            println!("{}\t{}{nullable}", descriptor.name, descriptor.kind.label());
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.run()
            }
            Command::List(target) => target.run(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote schema");
    Ok(())
}

pub fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
