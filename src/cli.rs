//! Minimal CLI: list samples → emit their schemas (optionally checked against a pinned fixture)
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indexmap::IndexMap;
use rayon::prelude::*;

use json_reflect_schema::samples::{self, Sample};
use json_reflect_schema::{Document, Reflector, ReflectorConfig};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// reflect the built-in sample types into JSON Schema documents
#[derive(Parser, Debug)]
#[command(name = "json-reflect-schema", version)]
pub struct CommandLineInterface {
    /// log reflection progress at debug level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// list the sample types
    List,
    /// reflect samples and print their schema documents
    Emit(EmitOut),
}

#[derive(Args, Debug, Clone)]
struct ReflectSettings {
    /// only an explicit `required` annotation makes a field required
    #[arg(long, default_value_t = false)]
    required_from_annotations: bool,

    /// emit `additionalProperties: true` on records
    #[arg(long, default_value_t = false)]
    allow_additional_properties: bool,

    /// put the root record inline instead of behind a `$ref`
    #[arg(long, default_value_t = false)]
    expanded: bool,
}

#[derive(clap::Parser, Debug)]
struct EmitOut {
    #[command(flatten)]
    settings: ReflectSettings,

    /// sample names (see `list`)
    #[arg(required_unless_present = "all")]
    samples: Vec<String>,

    /// every sample, reflected in parallel
    #[arg(long, conflicts_with = "samples")]
    all: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// compare against a pinned document instead of printing; needs exactly one sample
    #[arg(long, conflicts_with = "out")]
    check: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ReflectSettings {
    fn reflector(&self) -> Reflector {
        Reflector::with_config(ReflectorConfig {
            required_from_annotation_only: self.required_from_annotations,
            allow_additional_properties: self.allow_additional_properties,
            expand_root_inline: self.expanded,
            ..ReflectorConfig::default()
        })
    }
}

impl EmitOut {
    fn selected(&self) -> anyhow::Result<Vec<Sample>> {
        if self.all {
            return Ok(samples::catalog());
        }
        self.samples
            .iter()
            .map(|name| {
                samples::find(name).with_context(|| format!("unknown sample `{name}` (try `list`)"))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns false when a `--check` comparison failed.
    pub fn run(&self) -> anyhow::Result<bool> {
        match &self.cmd {
            Command::List => {
                for sample in samples::catalog() {
                    println!("{:<14} {}", sample.name.bold(), sample.about);
                }
                Ok(true)
            }
            Command::Emit(target) => {
                let selected = target.selected()?;
                let reflector = target.settings.reflector();

                // 1) reflect; one shared reflector, one registry per call
                let documents = selected
                    .par_iter()
                    .map(|sample| reflect_sample(&reflector, sample).map(|doc| (sample.name, doc)))
                    .collect::<anyhow::Result<Vec<_>>>()?;

                // 2) check against a pinned fixture
                if let Some(fixture) = target.check.as_ref() {
                    let [(name, actual)] = documents.as_slice() else {
                        bail!("--check needs exactly one sample, got {}", documents.len());
                    };
                    return check_fixture(name, actual, fixture);
                }

                // 3) print or write
                let schema_src = match documents.as_slice() {
                    [(_, doc)] => serde_json::to_string_pretty(doc)?,
                    _ => serde_json::to_string_pretty(&documents.iter().cloned().collect::<IndexMap<_, _>>())?,
                };
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(out, &schema_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{schema_src}");
                }
                Ok(true)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn reflect_sample(reflector: &Reflector, sample: &Sample) -> anyhow::Result<Document> {
    let reflector = match sample.mapper {
        Some(mapper) => reflector.clone().type_mapper(mapper),
        None => reflector.clone(),
    };
    reflector
        .reflect_desc(&sample.root.get())
        .with_context(|| format!("failed to reflect sample `{}`", sample.name))
}

fn check_fixture(name: &str, actual: &Document, fixture: &Path) -> anyhow::Result<bool> {
    let source = std::fs::read_to_string(fixture)
        .with_context(|| format!("failed to read fixture {}", fixture.display()))?;
    let expected = Document::from_json_str(&source)
        .with_context(|| format!("failed to parse fixture {}", fixture.display()))?;

    if &expected == actual {
        eprintln!("{} {name} matches {}", "ok".green(), fixture.display());
        return Ok(true);
    }

    eprintln!("{} {name} differs from {}", "mismatch".red().bold(), fixture.display());
    if expected.root != actual.root {
        eprintln!("  root");
    }
    let names = expected.definitions.keys().chain(actual.definitions.keys());
    let mut reported = Vec::new();
    for def in names {
        if reported.contains(&def) {
            continue;
        }
        reported.push(def);
        if expected.definitions.get(def) != actual.definitions.get(def) {
            eprintln!("  definitions.{def}");
        }
    }
    Ok(false)
}
