use std::fs;
use std::path::Path;
use std::sync::Arc;

use impress_citation::{parse_ref_list, JatsLocationExtractor, Normalizer};
use impress_entities::{
    table_of_contents, validate_all, EntityGraph, SchemaConfig, SchemaOverrides, SchemaRegistry,
    StandaloneDatabase,
};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    Config(#[from] impress_entities::ConfigError),

    #[error("{0}")]
    Registry(#[from] impress_entities::RegistryError),

    #[error("{0}")]
    Graph(#[from] impress_entities::GraphError),

    #[error("{0}")]
    Parse(#[from] impress_citation::ParseError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn write_or_print(output: Option<&Path>, text: &str) -> Result<(), CliError> {
    match output {
        Some(path) => fs::write(path, text).map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        }),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

pub fn load_config(schema: Option<&Path>, overrides: Option<&Path>) -> Result<SchemaConfig, CliError> {
    let mut config = match schema {
        Some(path) => {
            let text = read(path)?;
            if path.extension().is_some_and(|e| e == "json") {
                SchemaConfig::from_json(&text)?
            } else {
                SchemaConfig::from_toml(&text)?
            }
        }
        None => SchemaConfig::default(),
    };
    if let Some(path) = overrides {
        let overrides = SchemaOverrides::from_toml(&read(path)?)?;
        config.apply_overrides(&overrides)?;
        tracing::info!(path = %path.display(), "applied schema overrides");
    }
    Ok(config)
}

fn load_document(config: SchemaConfig, path: &Path) -> Result<EntityGraph, CliError> {
    let registry = Arc::new(SchemaRegistry::new(config)?);
    Ok(EntityGraph::from_json(registry, &read(path)?)?)
}

/// Print open issues and return how many there are.
pub fn validate(config: SchemaConfig, document: &Path, json: bool) -> Result<usize, CliError> {
    let graph = load_document(config, document)?;
    let issues = validate_all(&graph);
    let total = issues.values().map(Vec::len).sum();

    if json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else if total == 0 {
        println!("No issues");
    } else {
        for issue in issues.values().flatten() {
            println!("{} {}: {}", issue.entity_type, issue.entity, issue.message);
        }
        println!("{} issue(s)", total);
    }
    Ok(total)
}

pub fn import(
    config: SchemaConfig,
    references: &Path,
    into: Option<&Path>,
    output: Option<&Path>,
    locations: bool,
) -> Result<(), CliError> {
    let mut graph = match into {
        Some(path) => load_document(config, path)?,
        None => EntityGraph::new(Arc::new(SchemaRegistry::new(config)?))?,
    };
    let trees = parse_ref_list(&read(references)?)?;

    let normalizer = if locations {
        Normalizer::new().with_location_extractor(JatsLocationExtractor)
    } else {
        Normalizer::new()
    };
    let report = normalizer.import_references(&mut graph, &trees);
    for (index, warning) in &report.warnings {
        eprintln!("reference {}: {}", index + 1, warning);
    }
    for (index, error) in &report.failures {
        eprintln!("reference {} skipped: {}", index + 1, error);
    }
    eprintln!("imported {} of {} references", report.imported.len(), trees.len());

    write_or_print(output, &graph.to_json()?)
}

pub fn toc(config: SchemaConfig, document: &Path) -> Result<(), CliError> {
    let graph = load_document(config, document)?;
    for entry in table_of_contents(&graph) {
        println!("{}", entry);
    }
    Ok(())
}

pub fn schema(config: &SchemaConfig, json: bool) -> Result<(), CliError> {
    config.validate()?;
    let text = if json { config.to_json()? } else { config.to_toml()? };
    println!("{}", text);
    Ok(())
}

pub fn export(config: SchemaConfig, document: &Path, output: Option<&Path>) -> Result<(), CliError> {
    let graph = load_document(config, document)?;
    write_or_print(output, &StandaloneDatabase::from_graph(&graph).to_json()?)
}
