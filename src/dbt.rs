// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Export of virtual datasets as a dbt project.
//!
//! Every virtual dataset in a [`CatalogTree`] becomes a model whose SQL is
//! the dataset's query. Table references after `FROM` and `JOIN` are
//! rewritten: a reference to another exported dataset becomes
//! `{{ ref('...') }}`, any other qualified reference becomes
//! `{{ source('...', '...') }}` and is listed in `models/sources/schema.yml`.
//! Models are materialized as views.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::catalog::{Catalog, CatalogTree};
use crate::error::{Error, Result};
use crate::models::{CatalogKind, DatasetType};
use crate::path::{CatalogPath, CatalogRef};

/// Directory under the project root that holds the models.
pub const MODELS_DIR: &str = "models";

/// Folder under [`MODELS_DIR`] for the sources file.
pub const SOURCES_DIR: &str = "sources";

/// One dbt model, generated from a virtual dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DbtModel {
    /// Model name, unique within the project; also the file stem.
    pub name: String,
    /// Name of the dataset, used as the relation alias.
    pub alias: String,
    /// Catalog path of the dataset.
    pub path: CatalogPath,
    /// Query with references rewritten to `ref` and `source` calls.
    pub sql: String,
}

impl DbtModel {
    /// First path segment: the space or source holding the dataset.
    pub fn database(&self) -> &str {
        &self.path.segments()[0]
    }

    /// Dotted folders between the database and the dataset, if any.
    pub fn schema(&self) -> Option<String> {
        schema_of(self.path.segments())
    }

    /// Contents of the model file.
    pub fn render(&self) -> String {
        let mut config = format!("alias='{}'", self.alias);
        if let Some(schema) = self.schema() {
            config.push_str(&format!(", schema='{schema}'"));
        }
        config.push_str(&format!(", database='{}'", self.database()));
        format!("{{{{ config({config}) }}}}\n\n{}", self.sql)
    }

    fn folder(&self) -> PathBuf {
        let segments = self.path.segments();
        segments[..segments.len() - 1]
            .iter()
            .map(|segment| file_name(segment))
            .collect()
    }
}

/// Tables outside the export that models read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbtSource {
    pub name: String,
    pub database: String,
    pub schema: Option<String>,
    pub tables: BTreeSet<String>,
}

/// A dbt project built from a catalog subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct DbtProject {
    pub name: String,
    pub models: Vec<DbtModel>,
    /// Sources by name.
    pub sources: BTreeMap<String, DbtSource>,
}

impl DbtProject {
    /// Collects the virtual datasets of `tree` as models, in pre-order.
    ///
    /// Datasets sharing a name get numbered model names (`v`, `v_1`, ...);
    /// the alias stays the dataset name.
    pub fn from_tree(name: &str, tree: &CatalogTree) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "dbt project name is empty".to_string(),
            ));
        }

        let mut used = HashSet::new();
        let mut by_path = HashMap::new();
        let mut datasets = Vec::new();
        for object in tree.iter() {
            if object.kind() != CatalogKind::Dataset(DatasetType::Virtual) {
                continue;
            }
            let Some(sql) = object.sql.as_deref() else {
                continue;
            };
            let alias = object.name().to_string();
            let mut model_name = alias.clone();
            let mut suffix = 1;
            while !used.insert(model_name.clone()) {
                model_name = format!("{alias}_{suffix}");
                suffix += 1;
            }
            by_path.insert(object.path().segments().to_vec(), model_name.clone());
            datasets.push((model_name, alias, object.path().clone(), sql));
        }

        let mut sources = BTreeMap::new();
        let models = datasets
            .into_iter()
            .map(|(name, alias, path, sql)| {
                let sql = rewrite_references(&sql.replace("\r\n", "\n"), &by_path, &mut sources)?;
                Ok(DbtModel {
                    name,
                    alias,
                    path,
                    sql,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            models,
            sources,
        })
    }

    /// Writes `dbt_project.yml` into `project_root`, and the model files,
    /// one `schema.yml` per model folder and the sources file under
    /// `models/`. Existing files are overwritten.
    ///
    /// Returns the written files.
    #[instrument(skip(self, project_root), fields(project = %self.name))]
    pub fn write(&self, project_root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let root = project_root.as_ref();
        let models_dir = root.join(MODELS_DIR);
        fs::create_dir_all(&models_dir)?;
        let mut written = Vec::new();

        let project_file = root.join("dbt_project.yml");
        fs::write(&project_file, serde_yaml::to_string(&self.project_file())?)?;
        written.push(project_file);

        let mut folders: BTreeMap<PathBuf, Vec<ModelEntry<'_>>> = BTreeMap::new();
        for model in &self.models {
            let folder = models_dir.join(model.folder());
            fs::create_dir_all(&folder)?;
            let file = folder.join(format!("{}.sql", file_name(&model.name)));
            fs::write(&file, model.render())?;
            debug!(model = %model.name, file = %file.display(), "model written");
            written.push(file);
            folders.entry(folder).or_default().push(ModelEntry {
                name: &model.name,
            });
        }

        for (folder, models) in folders {
            let file = folder.join("schema.yml");
            let schema = SchemaFile {
                version: 2,
                models,
                sources: Vec::new(),
            };
            fs::write(&file, serde_yaml::to_string(&schema)?)?;
            written.push(file);
        }

        if !self.sources.is_empty() {
            let folder = models_dir.join(SOURCES_DIR);
            fs::create_dir_all(&folder)?;
            let file = folder.join("schema.yml");
            let schema = SchemaFile {
                version: 2,
                models: Vec::new(),
                sources: self.sources.values().map(SourceEntry::from).collect(),
            };
            fs::write(&file, serde_yaml::to_string(&schema)?)?;
            written.push(file);
            for source in self.sources.values() {
                info!(source = %source.name, tables = source.tables.len(), "external source");
            }
        }

        info!(
            models = self.models.len(),
            sources = self.sources.len(),
            root = %root.display(),
            "dbt project written"
        );
        Ok(written)
    }

    fn project_file(&self) -> ProjectFile<'_> {
        ProjectFile {
            name: &self.name,
            version: "1.0.0",
            config_version: 2,
            profile: &self.name,
            model_paths: vec![MODELS_DIR],
            models: BTreeMap::from([(
                self.name.as_str(),
                Materialization {
                    materialized: "view",
                },
            )]),
        }
    }
}

impl Catalog {
    /// Reads the subtree at `reference` and turns its virtual datasets into
    /// a dbt project named `project_name`.
    #[instrument(skip(self, reference), fields(reference = %reference))]
    pub fn export_dbt(&self, reference: &CatalogRef, project_name: &str) -> Result<DbtProject> {
        let tree = self.get_catalog_tree(reference)?;
        DbtProject::from_tree(project_name, &tree)
    }
}

#[derive(Serialize)]
struct ProjectFile<'a> {
    name: &'a str,
    version: &'a str,
    #[serde(rename = "config-version")]
    config_version: u32,
    profile: &'a str,
    #[serde(rename = "model-paths")]
    model_paths: Vec<&'a str>,
    models: BTreeMap<&'a str, Materialization>,
}

#[derive(Serialize)]
struct Materialization {
    #[serde(rename = "+materialized")]
    materialized: &'static str,
}

#[derive(Serialize)]
struct SchemaFile<'a> {
    version: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    models: Vec<ModelEntry<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources: Vec<SourceEntry<'a>>,
}

#[derive(Serialize)]
struct ModelEntry<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct SourceEntry<'a> {
    name: &'a str,
    database: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a str>,
    tables: Vec<ModelEntry<'a>>,
}

impl<'a> From<&'a DbtSource> for SourceEntry<'a> {
    fn from(source: &'a DbtSource) -> Self {
        Self {
            name: &source.name,
            database: &source.database,
            schema: source.schema.as_deref(),
            tables: source
                .tables
                .iter()
                .map(|table| ModelEntry { name: table })
                .collect(),
        }
    }
}

fn reference_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?i)\b((?:FROM|JOIN)\s+)([A-Za-z0-9_".']+)"#))
        .as_ref()
        .map_err(|e| Error::InvalidArgument(format!("reference pattern: {e}")))
}

/// Rewrites the table references of `sql`. Qualified references that are
/// not exported datasets are added to `sources`; single identifiers are
/// left alone, as they name CTEs or resolve against the query context.
fn rewrite_references(
    sql: &str,
    by_path: &HashMap<Vec<String>, String>,
    sources: &mut BTreeMap<String, DbtSource>,
) -> Result<String> {
    let pattern = reference_pattern()?;
    let rewritten = pattern.replace_all(sql, |caps: &Captures<'_>| {
        let keyword = &caps[1];
        let segments: Vec<String> = caps[2]
            .split('.')
            .map(|segment| segment.trim_matches(|c| c == '"' || c == '\'').to_string())
            .collect();
        if let Some(model) = by_path.get(&segments) {
            return format!("{keyword}{{{{ ref('{model}') }}}}");
        }
        if segments.len() < 2 || segments.iter().any(String::is_empty) {
            return caps[0].to_string();
        }

        let name = source_name(&segments);
        let table = segments[segments.len() - 1].clone();
        let source = sources.entry(name.clone()).or_insert_with(|| DbtSource {
            name: name.clone(),
            database: segments[0].clone(),
            schema: schema_of(&segments),
            tables: BTreeSet::new(),
        });
        source.tables.insert(table.clone());
        format!("{keyword}{{{{ source('{name}', '{table}') }}}}")
    });
    Ok(rewritten.into_owned())
}

/// `database_schema` with dots replaced; `database_default` without a schema.
fn source_name(segments: &[String]) -> String {
    let schema = schema_of(segments).unwrap_or_else(|| "default".to_string());
    format!("{}_{schema}", segments[0]).replace('.', "_")
}

fn schema_of(segments: &[String]) -> Option<String> {
    (segments.len() > 2).then(|| segments[1..segments.len() - 1].join("."))
}

fn file_name(segment: &str) -> String {
    match segment {
        "." | ".." => "_".to_string(),
        other => other.replace(['/', '\\'], "_"),
    }
}
