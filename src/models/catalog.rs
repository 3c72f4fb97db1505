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

//! Catalog entities.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::path::{CatalogPath, IntoCatalogPath};

const PHYSICAL_DATASET: &str = "PHYSICAL_DATASET";
const VIRTUAL_DATASET: &str = "VIRTUAL_DATASET";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetType {
    Physical,
    Virtual,
}

/// What a catalog object is. Fixed when the object is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Dataset(DatasetType),
    Folder,
    Space,
    Source,
    Home,
    /// A file inside a source that has not been promoted to a dataset.
    File,
}

impl CatalogKind {
    fn entity_type(&self) -> &'static str {
        match self {
            CatalogKind::Dataset(_) => "dataset",
            CatalogKind::Folder => "folder",
            CatalogKind::Space => "space",
            CatalogKind::Source => "source",
            CatalogKind::Home => "home",
            CatalogKind::File => "file",
        }
    }

    /// Whether objects of this kind can hold children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            CatalogKind::Folder | CatalogKind::Space | CatalogKind::Source | CatalogKind::Home
        )
    }

    /// Top-level containers are addressed by name rather than by path.
    fn is_root_container(&self) -> bool {
        matches!(
            self,
            CatalogKind::Space | CatalogKind::Source | CatalogKind::Home
        )
    }
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Dataset(DatasetType::Physical) => f.write_str("physical dataset"),
            CatalogKind::Dataset(DatasetType::Virtual) => f.write_str("virtual dataset"),
            other => f.write_str(other.entity_type()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChildType {
    Container,
    Dataset,
    File,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    Folder,
    Space,
    Source,
    Home,
    #[serde(other)]
    Other,
}

/// Summary of a child as listed by its parent container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogChild {
    pub id: String,
    pub path: CatalogPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(rename = "type")]
    pub child_type: ChildType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_type: Option<ContainerType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_type: Option<String>,
}

impl CatalogChild {
    /// Kind of the child, when the listing says enough to tell.
    pub fn kind(&self) -> Option<CatalogKind> {
        match (self.child_type, self.container_type, self.dataset_type.as_deref()) {
            (ChildType::Container, Some(ContainerType::Folder), _) => Some(CatalogKind::Folder),
            (ChildType::Container, Some(ContainerType::Space), _) => Some(CatalogKind::Space),
            (ChildType::Container, Some(ContainerType::Source), _) => Some(CatalogKind::Source),
            (ChildType::Container, Some(ContainerType::Home), _) => Some(CatalogKind::Home),
            (ChildType::Dataset, _, Some("VIRTUAL")) => {
                Some(CatalogKind::Dataset(DatasetType::Virtual))
            }
            (ChildType::Dataset, _, Some(_)) => Some(CatalogKind::Dataset(DatasetType::Physical)),
            (ChildType::File, _, _) => Some(CatalogKind::File),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.child_type == ChildType::Container
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
}

/// A dataset column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: FieldType,
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match (self.precision, self.scale) {
            (Some(precision), Some(scale)) => write!(f, "({precision},{scale})"),
            (Some(precision), None) => write!(f, "({precision})"),
            _ => Ok(()),
        }
    }
}

/// Renders as `name TYPE`.
impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Grants for users, groups and roles.
///
/// Each principal appears at most once per list; [`grant_user`] and friends
/// merge permissions into an existing entry. Lists received from elsewhere
/// are checked with [`validate`] before they are sent.
///
/// [`grant_user`]: AccessControlList::grant_user
/// [`validate`]: AccessControlList::validate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlList {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<AccessControlEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<AccessControlEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<AccessControlEntry>,
}

impl AccessControlList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_user<I, S>(&mut self, id: impl Into<String>, permissions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        grant(&mut self.users, id.into(), permissions);
        self
    }

    pub fn grant_group<I, S>(&mut self, id: impl Into<String>, permissions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        grant(&mut self.groups, id.into(), permissions);
        self
    }

    pub fn grant_role<I, S>(&mut self, id: impl Into<String>, permissions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        grant(&mut self.roles, id.into(), permissions);
        self
    }

    /// Removes a user entry. Returns whether one existed.
    pub fn revoke_user(&mut self, id: &str) -> bool {
        let before = self.users.len();
        self.users.retain(|entry| entry.id != id);
        self.users.len() != before
    }

    pub fn user_permissions(&self, id: &str) -> Option<&[String]> {
        self.users
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.permissions.as_slice())
    }

    pub fn group_permissions(&self, id: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.permissions.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty() && self.roles.is_empty()
    }

    /// Fails if a principal is listed more than once.
    pub fn validate(&self) -> Result<()> {
        for (kind, entries) in [
            ("user", &self.users),
            ("group", &self.groups),
            ("role", &self.roles),
        ] {
            let mut seen = std::collections::HashSet::new();
            for entry in entries {
                if !seen.insert(entry.id.as_str()) {
                    return Err(Error::InvalidArgument(format!(
                        "{kind} {} appears more than once in the access control list",
                        entry.id
                    )));
                }
            }
        }
        Ok(())
    }
}

fn grant<I, S>(entries: &mut Vec<AccessControlEntry>, id: String, permissions: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let index = match entries.iter().position(|entry| entry.id == id) {
        Some(index) => index,
        None => {
            entries.push(AccessControlEntry {
                id,
                permissions: Vec::new(),
            });
            entries.len() - 1
        }
    };
    let entry = &mut entries[index];
    for permission in permissions {
        let permission = permission.into();
        if !entry.permissions.contains(&permission) {
            entry.permissions.push(permission);
        }
    }
}

/// Wire form of a catalog entity. Fields we do not model (source config,
/// dataset format, timestamps, ...) are kept in `extra`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntity {
    entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sql_context: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<CatalogChild>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_control_list: Option<AccessControlList>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Snapshot of a catalog object.
///
/// The id and kind never change. The path can be changed with
/// [`CatalogObject::rename`] before an update, and the version tag is the
/// one observed when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogEntity", into = "CatalogEntity")]
pub struct CatalogObject {
    id: String,
    kind: CatalogKind,
    path: CatalogPath,
    tag: Option<String>,
    /// Query of a virtual dataset.
    pub sql: Option<String>,
    /// Default schema the query of a virtual dataset runs in.
    pub sql_context: Option<Vec<String>>,
    pub children: Vec<CatalogChild>,
    pub fields: Vec<Field>,
    pub access_control_list: Option<AccessControlList>,
    /// Remaining wire fields, sent back unchanged on update.
    pub extra: Map<String, Value>,
}

impl CatalogObject {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn path(&self) -> &CatalogPath {
        &self.path
    }

    /// The version tag, used for optimistic concurrency on update/delete.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn is_dataset(&self) -> bool {
        matches!(self.kind, CatalogKind::Dataset(_))
    }

    /// Moves the object to a new path; takes effect on the next update.
    pub fn rename(&mut self, path: impl IntoCatalogPath) -> Result<()> {
        self.path = path.into_catalog_path()?;
        Ok(())
    }

    /// Request body for an update: the full entity without read-only
    /// listings.
    pub(crate) fn to_update_body(&self) -> Result<Value> {
        let mut body = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut body {
            map.remove("children");
            map.remove("fields");
        }
        Ok(body)
    }
}

impl TryFrom<CatalogEntity> for CatalogObject {
    type Error = Error;

    fn try_from(entity: CatalogEntity) -> Result<Self> {
        let mut extra = entity.extra;
        let kind = match entity.entity_type.as_str() {
            "dataset" => match entity.type_name.as_deref() {
                Some(PHYSICAL_DATASET) => CatalogKind::Dataset(DatasetType::Physical),
                Some(VIRTUAL_DATASET) => CatalogKind::Dataset(DatasetType::Virtual),
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "unknown dataset type {other:?}"
                    )))
                }
            },
            "folder" => CatalogKind::Folder,
            "space" => CatalogKind::Space,
            "source" => CatalogKind::Source,
            "home" => CatalogKind::Home,
            "file" => CatalogKind::File,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unknown catalog entity type {other:?}"
                )))
            }
        };
        // a source's type is its connector (S3, NAS, ...), not a kind marker
        if !matches!(kind, CatalogKind::Dataset(_)) {
            if let Some(type_name) = entity.type_name {
                extra.insert("type".to_string(), Value::String(type_name));
            }
        }
        let path = match (entity.path, entity.name) {
            (Some(path), _) => CatalogPath::from_segments(path)?,
            (None, Some(name)) => CatalogPath::from_segments([name])?,
            (None, None) => {
                return Err(Error::InvalidPath(format!(
                    "{kind} entity has neither path nor name"
                )))
            }
        };
        let id = entity
            .id
            .ok_or_else(|| Error::InvalidArgument(format!("{kind} {path} has no id")))?;

        Ok(Self {
            id,
            kind,
            path,
            tag: entity.tag,
            sql: entity.sql,
            sql_context: entity.sql_context,
            children: entity.children,
            fields: entity.fields,
            access_control_list: entity.access_control_list,
            extra,
        })
    }
}

impl From<CatalogObject> for CatalogEntity {
    fn from(object: CatalogObject) -> Self {
        let mut extra = object.extra;
        let type_name = match object.kind {
            CatalogKind::Dataset(DatasetType::Physical) => Some(PHYSICAL_DATASET.to_string()),
            CatalogKind::Dataset(DatasetType::Virtual) => Some(VIRTUAL_DATASET.to_string()),
            _ => extra
                .remove("type")
                .and_then(|value| value.as_str().map(str::to_string)),
        };
        let (path, name) = if object.kind.is_root_container() {
            (None, Some(object.path.name().to_string()))
        } else {
            (Some(object.path.into()), None)
        };
        Self {
            entity_type: object.kind.entity_type().to_string(),
            id: Some(object.id),
            path,
            name,
            tag: object.tag,
            type_name,
            sql: object.sql,
            sql_context: object.sql_context,
            children: object.children,
            fields: object.fields,
            access_control_list: object.access_control_list,
            extra,
        }
    }
}

/// What to create.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSpec {
    Folder,
    Space,
    VirtualDataset {
        sql: String,
        sql_context: Option<CatalogPath>,
    },
}

/// Description of a catalog object to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCatalogItem {
    pub path: CatalogPath,
    pub spec: ItemSpec,
    pub access_control_list: Option<AccessControlList>,
}

impl NewCatalogItem {
    /// A folder inside a space, source or home.
    pub fn folder(path: impl IntoCatalogPath) -> Result<Self> {
        Self::nested(path.into_catalog_path()?, ItemSpec::Folder)
    }

    /// A top-level space.
    pub fn space(name: &str) -> Result<Self> {
        Ok(Self {
            path: CatalogPath::from_segments([name])?,
            spec: ItemSpec::Space,
            access_control_list: None,
        })
    }

    /// A virtual dataset (saved query).
    pub fn virtual_dataset(path: impl IntoCatalogPath, sql: impl Into<String>) -> Result<Self> {
        let sql = sql.into();
        if sql.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "virtual dataset SQL is empty".to_string(),
            ));
        }
        Self::nested(
            path.into_catalog_path()?,
            ItemSpec::VirtualDataset {
                sql,
                sql_context: None,
            },
        )
    }

    fn nested(path: CatalogPath, spec: ItemSpec) -> Result<Self> {
        if path.len() < 2 {
            return Err(Error::InvalidPath(format!(
                "{path} must be inside a space, source or home"
            )));
        }
        Ok(Self {
            path,
            spec,
            access_control_list: None,
        })
    }

    /// Sets the default schema of a virtual dataset; ignored for containers.
    pub fn with_sql_context(mut self, context: CatalogPath) -> Self {
        if let ItemSpec::VirtualDataset { sql_context, .. } = &mut self.spec {
            *sql_context = Some(context);
        }
        self
    }

    pub fn with_access_control(mut self, acl: AccessControlList) -> Self {
        self.access_control_list = Some(acl);
        self
    }

    pub(crate) fn to_body(&self) -> Result<Value> {
        if let Some(acl) = &self.access_control_list {
            acl.validate()?;
        }
        let mut body = match &self.spec {
            ItemSpec::Folder => json!({ "entityType": "folder", "path": self.path }),
            ItemSpec::Space => json!({ "entityType": "space", "name": self.path.name() }),
            ItemSpec::VirtualDataset { sql, sql_context } => {
                let mut body = json!({
                    "entityType": "dataset",
                    "type": VIRTUAL_DATASET,
                    "path": self.path,
                    "sql": sql,
                });
                if let Some(context) = sql_context {
                    body["sqlContext"] = serde_json::to_value(context)?;
                }
                body
            }
        };
        if let Some(acl) = &self.access_control_list {
            body["accessControlList"] = serde_json::to_value(acl)?;
        }
        Ok(body)
    }
}
