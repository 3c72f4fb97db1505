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

//! Catalog changes: create, update, delete, copy and reference, plus the
//! wiki and tag metadata attached to objects.
//!
//! Multi-object operations (recursive delete, folder copy and reference)
//! are sequences of single-object calls. They are not atomic: a failure
//! part way leaves the objects already handled in place.

use tracing::{debug, info, instrument};

use super::{Catalog, CATALOG};
use crate::client::{ApiRequest, Method};
use crate::error::{Error, Result};
use crate::models::{
    AccessControlList, CatalogChild, CatalogKind, CatalogObject, ChildType, DatasetType,
    NewCatalogItem, Tags, Wiki,
};
use crate::path::{CatalogPath, CatalogRef, IntoCatalogPath};

/// Options for [`Catalog::copy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOptions {
    /// Point SQL and SQL context that refer into the copied subtree at the
    /// new subtree instead.
    pub relative_references: bool,
    /// Give copies the access control list of their originals.
    pub assume_privileges: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            relative_references: false,
            assume_privileges: true,
        }
    }
}

/// Options for [`Catalog::reference`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceOptions {
    pub assume_privileges: bool,
}

impl Default for ReferenceOptions {
    fn default() -> Self {
        Self {
            assume_privileges: true,
        }
    }
}

/// Source and target roots of a recursive copy.
struct CopyScope<'a> {
    from: &'a CatalogPath,
    to: &'a CatalogPath,
    options: &'a CopyOptions,
}

impl Catalog {
    /// Creates a folder, space or virtual dataset.
    #[instrument(skip(self, item), fields(path = %item.path))]
    pub fn create(&self, item: &NewCatalogItem) -> Result<CatalogObject> {
        let body = item.to_body()?;
        let created: CatalogObject = self
            .rest
            .send_json(ApiRequest::post(CATALOG).with_body(body))?;
        info!(id = created.id(), kind = %created.kind(), "catalog object created");
        Ok(created)
    }

    /// Saves changes to an object.
    ///
    /// The object must carry the version tag it was fetched with. If the
    /// object changed remotely since, the update fails with
    /// [`Error::ConcurrentModification`]; fetch it again and reapply.
    #[instrument(skip(self, object), fields(id = object.id(), path = %object.path()))]
    pub fn update(&self, object: &CatalogObject) -> Result<CatalogObject> {
        if object.tag().is_none() {
            return Err(Error::InvalidArgument(format!(
                "{} has no version tag; fetch it before updating",
                object.path()
            )));
        }
        if let Some(acl) = &object.access_control_list {
            acl.validate()?;
        }
        let body = object.to_update_body()?;
        self.rest
            .send_json(
                ApiRequest::put(CATALOG)
                    .with_segments([object.id()])
                    .with_body(body),
            )
            .map_err(Error::into_concurrent_modification)
    }

    /// Deletes an object without a version check.
    ///
    /// A path is resolved to an id first, which costs one extra request.
    #[instrument(skip(self, reference), fields(reference = %reference))]
    pub fn delete(&self, reference: &CatalogRef) -> Result<()> {
        let id = match reference {
            CatalogRef::ById(id) => id.clone(),
            CatalogRef::ByPath(_) => self.get(reference)?.id().to_string(),
        };
        self.delete_by_id(&id, None)
    }

    /// Deletes an object if it still has the version tag of this snapshot.
    pub fn delete_object(&self, object: &CatalogObject) -> Result<()> {
        self.delete_by_id(object.id(), object.tag())
    }

    fn delete_by_id(&self, id: &str, tag: Option<&str>) -> Result<()> {
        let mut request = ApiRequest::delete(CATALOG).with_segments([id]);
        if let Some(tag) = tag {
            request = request.with_query("tag", tag);
        }
        self.rest
            .send(request)
            .map_err(Error::into_concurrent_modification)?;
        debug!(id, "catalog object deleted");
        Ok(())
    }

    /// Deletes a folder (or space).
    ///
    /// Without `recursive` the folder must be empty. With it, descendants are
    /// deleted children first, then the folder itself. The first failure
    /// stops the walk and is reported as [`Error::PartialDelete`] listing
    /// what was already removed; those deletions are not undone.
    ///
    /// Returns the deleted paths in deletion order.
    #[instrument(skip(self, path))]
    pub fn delete_folder(
        &self,
        path: impl IntoCatalogPath,
        recursive: bool,
    ) -> Result<Vec<CatalogPath>> {
        let path = path.into_catalog_path()?;
        let folder = self.get_by_path(&path)?;
        if !matches!(folder.kind(), CatalogKind::Folder | CatalogKind::Space) {
            return Err(Error::InvalidArgument(format!(
                "{path} is a {}, not a folder",
                folder.kind()
            )));
        }
        if !recursive && !folder.children.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "{path} is not empty; delete it recursively"
            )));
        }

        let mut deleted = Vec::new();
        match self.delete_tree(&folder, &mut deleted) {
            Ok(()) => Ok(deleted),
            Err((_, source)) if deleted.is_empty() => Err(source),
            Err((failed, source)) => Err(Error::PartialDelete {
                deleted,
                failed,
                source: Box::new(source),
            }),
        }
    }

    fn delete_tree(
        &self,
        object: &CatalogObject,
        deleted: &mut Vec<CatalogPath>,
    ) -> std::result::Result<(), (CatalogPath, Error)> {
        for child in &object.children {
            if child.is_container() {
                let nested = self
                    .get_by_id(&child.id)
                    .map_err(|e| (child.path.clone(), e))?;
                self.delete_tree(&nested, deleted)?;
            } else {
                self.delete_by_id(&child.id, None)
                    .map_err(|e| (child.path.clone(), e))?;
                deleted.push(child.path.clone());
            }
        }
        self.delete_by_id(object.id(), None)
            .map_err(|e| (object.path().clone(), e))?;
        deleted.push(object.path().clone());
        Ok(())
    }

    /// Duplicates a virtual dataset, or a folder with everything below it.
    ///
    /// Physical datasets hold data the REST API cannot duplicate, so copying
    /// one fails with [`Error::Unsupported`]; so does copying a folder that
    /// contains one, after the objects before it were copied.
    #[instrument(skip(self, source, target, options))]
    pub fn copy(
        &self,
        source: impl IntoCatalogPath,
        target: impl IntoCatalogPath,
        options: &CopyOptions,
    ) -> Result<CatalogObject> {
        let source = source.into_catalog_path()?;
        let target = target.into_catalog_path()?;
        if target.starts_with(&source) {
            return Err(Error::InvalidArgument(format!(
                "cannot copy {source} into itself ({target})"
            )));
        }
        let object = self.get_by_path(&source)?;
        let scope = CopyScope {
            from: &source,
            to: &target,
            options,
        };
        self.copy_object(object, &target, &scope)
    }

    fn copy_object(
        &self,
        object: CatalogObject,
        target: &CatalogPath,
        scope: &CopyScope<'_>,
    ) -> Result<CatalogObject> {
        let acl = if scope.options.assume_privileges {
            object.access_control_list.clone()
        } else {
            None
        };
        match object.kind() {
            CatalogKind::Dataset(DatasetType::Virtual) => {
                let sql = object.sql.clone().ok_or_else(|| {
                    Error::InvalidArgument(format!("{} has no SQL", object.path()))
                })?;
                let context = object
                    .sql_context
                    .clone()
                    .map(CatalogPath::from_segments)
                    .transpose()?;
                let (sql, context) = if scope.options.relative_references {
                    (
                        rewrite_sql_references(&sql, scope.from, scope.to),
                        context.map(|c| c.rebase(scope.from, scope.to).unwrap_or(c)),
                    )
                } else {
                    (sql, context)
                };

                let mut item = NewCatalogItem::virtual_dataset(target, sql)?;
                if let Some(context) = context {
                    item = item.with_sql_context(context);
                }
                self.create(&with_acl(item, acl))
            }
            CatalogKind::Folder | CatalogKind::Space => {
                let created = self.create_container(target, acl)?;
                for child in &object.children {
                    let child_target = rebase_child(child, object.path(), target)?;
                    let child_object = self.get_by_id(&child.id)?;
                    self.copy_object(child_object, &child_target, scope)?;
                }
                Ok(created)
            }
            kind => Err(Error::Unsupported(format!(
                "cannot copy {} ({kind})",
                object.path()
            ))),
        }
    }

    /// Creates virtual datasets at `target` that select from `source`.
    ///
    /// For a dataset this is a single `SELECT * FROM <source>` view. For a
    /// folder the folder structure is recreated with one such view per
    /// dataset found below it.
    #[instrument(skip(self, source, target, options))]
    pub fn reference(
        &self,
        source: impl IntoCatalogPath,
        target: impl IntoCatalogPath,
        options: &ReferenceOptions,
    ) -> Result<CatalogObject> {
        let source = source.into_catalog_path()?;
        let target = target.into_catalog_path()?;
        if target.starts_with(&source) {
            return Err(Error::InvalidArgument(format!(
                "cannot reference {source} from inside itself ({target})"
            )));
        }
        let object = self.get_by_path(&source)?;
        self.reference_object(object, &target, options)
    }

    fn reference_object(
        &self,
        object: CatalogObject,
        target: &CatalogPath,
        options: &ReferenceOptions,
    ) -> Result<CatalogObject> {
        let acl = if options.assume_privileges {
            object.access_control_list.clone()
        } else {
            None
        };
        match object.kind() {
            CatalogKind::Dataset(_) => {
                let sql = format!("SELECT * FROM {}", object.path().to_sql());
                let item = NewCatalogItem::virtual_dataset(target, sql)?;
                self.create(&with_acl(item, acl))
            }
            CatalogKind::Folder | CatalogKind::Space => {
                let created = self.create_container(target, acl)?;
                for child in &object.children {
                    if !matches!(child.child_type, ChildType::Container | ChildType::Dataset) {
                        debug!(path = %child.path, "skipping non-dataset child");
                        continue;
                    }
                    let child_target = rebase_child(child, object.path(), target)?;
                    let child_object = self.get_by_id(&child.id)?;
                    self.reference_object(child_object, &child_target, options)?;
                }
                Ok(created)
            }
            kind => Err(Error::Unsupported(format!(
                "cannot reference {} ({kind})",
                object.path()
            ))),
        }
    }

    fn create_container(
        &self,
        target: &CatalogPath,
        acl: Option<AccessControlList>,
    ) -> Result<CatalogObject> {
        let item = if target.len() == 1 {
            NewCatalogItem::space(target.name())?
        } else {
            NewCatalogItem::folder(target)?
        };
        self.create(&with_acl(item, acl))
    }

    /// The wiki of an object, or `None` if it has none.
    pub fn get_wiki(&self, id: &str) -> Result<Option<Wiki>> {
        not_found_as_none(self.rest.send_json(collaboration(id, "wiki", Method::Get)))
    }

    /// Replaces the wiki of an object.
    ///
    /// Replacing an existing wiki requires its current `version`.
    pub fn set_wiki(&self, id: &str, wiki: &Wiki) -> Result<Wiki> {
        let body = serde_json::to_value(wiki)?;
        self.rest
            .send_json(collaboration(id, "wiki", Method::Post).with_body(body))
            .map_err(Error::into_concurrent_modification)
    }

    /// The tags of an object, or `None` if it has none.
    pub fn get_tags(&self, id: &str) -> Result<Option<Tags>> {
        not_found_as_none(self.rest.send_json(collaboration(id, "tag", Method::Get)))
    }

    /// Replaces the tags of an object.
    pub fn set_tags(&self, id: &str, tags: &Tags) -> Result<Tags> {
        let body = serde_json::to_value(tags)?;
        self.rest
            .send_json(collaboration(id, "tag", Method::Post).with_body(body))
            .map_err(Error::into_concurrent_modification)
    }

    /// Re-reads the metadata of a physical dataset from its source.
    #[instrument(skip(self))]
    pub fn refresh(&self, id: &str) -> Result<()> {
        self.rest
            .send(ApiRequest::post(CATALOG).with_segments([id, "refresh"]))?;
        Ok(())
    }
}

fn with_acl(item: NewCatalogItem, acl: Option<AccessControlList>) -> NewCatalogItem {
    match acl {
        Some(acl) => item.with_access_control(acl),
        None => item,
    }
}

fn collaboration(id: &str, resource: &str, method: Method) -> ApiRequest {
    ApiRequest::new(method, CATALOG).with_segments([id, "collaboration", resource])
}

fn not_found_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn rebase_child(
    child: &CatalogChild,
    parent: &CatalogPath,
    target: &CatalogPath,
) -> Result<CatalogPath> {
    child.path.rebase(parent, target).ok_or_else(|| {
        Error::InvalidArgument(format!("child {} is not inside {parent}", child.path))
    })
}

/// Rewrites references to datasets below `from` so they point below `to`.
///
/// Matches the fully quoted form (`"a"."b".`) and the plain dotted form
/// (`a.b.`), ignoring ASCII case. Mixed quoting is left alone.
pub(crate) fn rewrite_sql_references(sql: &str, from: &CatalogPath, to: &CatalogPath) -> String {
    let replacement = format!("{}.", to.to_sql());
    let quoted = format!("{}.", from.to_sql());
    let plain = format!("{}.", from.segments().join("."));
    let sql = replace_prefix(sql, &quoted, &replacement);
    replace_prefix(&sql, &plain, &replacement)
}

fn replace_prefix(haystack: &str, needle: &str, replacement: &str) -> String {
    let lower_haystack = haystack.to_ascii_lowercase();
    let lower_needle = needle.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (start, _) in lower_haystack.match_indices(&lower_needle) {
        if start < last {
            continue;
        }
        let preceded_by_identifier = haystack[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '"' || c == '.');
        if preceded_by_identifier {
            continue;
        }
        out.push_str(&haystack[last..start]);
        out.push_str(replacement);
        last = start + needle.len();
    }
    out.push_str(&haystack[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::ScriptedTransport;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn catalog(transport: ScriptedTransport) -> (Catalog, Arc<ScriptedTransport>) {
        let (client, transport) = transport.into_client();
        (Catalog::new(client), transport)
    }

    fn vds(id: &str, path: &[&str], tag: &str) -> Value {
        json!({
            "entityType": "dataset",
            "type": "VIRTUAL_DATASET",
            "id": id,
            "path": path,
            "tag": tag,
            "sql": "SELECT 1"
        })
    }

    fn path(p: &str) -> CatalogPath {
        CatalogPath::parse(p).unwrap()
    }

    #[test]
    fn test_create_conflict() {
        let (catalog, transport) = catalog(
            ScriptedTransport::new().respond(409, json!({"errorMessage": "exists"})),
        );
        let item = NewCatalogItem::folder("space/f").unwrap();
        assert!(matches!(catalog.create(&item), Err(Error::Conflict(_))));
        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path(), "api/v3/catalog");
    }

    #[test]
    fn test_update_requires_tag() {
        let (catalog, transport) = catalog(ScriptedTransport::new());
        let mut value = vds("v", &["s", "v"], "1");
        value.as_object_mut().unwrap().remove("tag");
        let object: CatalogObject = serde_json::from_value(value).unwrap();
        assert!(matches!(
            catalog.update(&object),
            Err(Error::InvalidArgument(_))
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_update_stale_tag() {
        let (catalog, transport) = catalog(
            ScriptedTransport::new().respond(409, json!({"errorMessage": "tag mismatch"})),
        );
        let mut object: CatalogObject =
            serde_json::from_value(vds("v", &["s", "v"], "1")).unwrap();
        object.sql = Some("SELECT 2".to_string());
        assert!(matches!(
            catalog.update(&object),
            Err(Error::ConcurrentModification(_))
        ));
        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path(), "api/v3/catalog/v");
        assert_eq!(request.body.as_ref().unwrap()["tag"], json!("1"));
        assert_eq!(request.body.as_ref().unwrap()["sql"], json!("SELECT 2"));
    }

    #[test]
    fn test_delete_by_path_resolves_first() {
        let (catalog, transport) = catalog(
            ScriptedTransport::new()
                .respond(200, vds("v", &["s", "v"], "3"))
                .respond(204, Value::Null),
        );
        catalog.delete(&CatalogRef::path("s/v").unwrap()).unwrap();
        let requests = transport.requests();
        assert_eq!(requests[1].method, Method::Delete);
        assert_eq!(requests[1].path(), "api/v3/catalog/v");
        assert_eq!(requests[1].query_param("tag"), None);
    }

    #[test]
    fn test_delete_object_sends_tag() {
        let (catalog, transport) = catalog(
            ScriptedTransport::new().respond(409, json!({"errorMessage": "changed"})),
        );
        let object: CatalogObject = serde_json::from_value(vds("v", &["s", "v"], "3")).unwrap();
        assert!(matches!(
            catalog.delete_object(&object),
            Err(Error::ConcurrentModification(_))
        ));
        assert_eq!(transport.requests()[0].query_param("tag"), Some("3"));
    }

    fn folder_with(children: Value) -> Value {
        json!({"entityType": "folder", "id": "f", "path": ["s", "f"], "tag": "0", "children": children})
    }

    #[test]
    fn test_delete_folder_post_order() {
        let (catalog, transport) = catalog(
            ScriptedTransport::new()
                .respond(
                    200,
                    folder_with(json!([
                        {"id": "g", "path": ["s", "f", "g"], "type": "CONTAINER", "containerType": "FOLDER"},
                        {"id": "v", "path": ["s", "f", "v"], "type": "DATASET", "datasetType": "VIRTUAL"}
                    ])),
                )
                .respond(
                    200,
                    json!({"entityType": "folder", "id": "g", "path": ["s", "f", "g"], "children": [
                        {"id": "w", "path": ["s", "f", "g", "w"], "type": "DATASET", "datasetType": "VIRTUAL"}
                    ]}),
                )
                .respond(204, Value::Null)
                .respond(204, Value::Null)
                .respond(204, Value::Null)
                .respond(204, Value::Null),
        );
        let deleted = catalog.delete_folder("s/f", true).unwrap();
        assert_eq!(
            deleted,
            [path("s/f/g/w"), path("s/f/g"), path("s/f/v"), path("s/f")]
        );
        let deletes: Vec<String> = transport
            .requests()
            .iter()
            .filter(|r| r.method == Method::Delete)
            .map(|r| r.path())
            .collect();
        assert_eq!(
            deletes,
            [
                "api/v3/catalog/w",
                "api/v3/catalog/g",
                "api/v3/catalog/v",
                "api/v3/catalog/f"
            ]
        );
    }

    #[test]
    fn test_delete_folder_partial_failure() {
        let (catalog, transport) = catalog(
            ScriptedTransport::new()
                .respond(
                    200,
                    folder_with(json!([
                        {"id": "a", "path": ["s", "f", "a"], "type": "DATASET", "datasetType": "VIRTUAL"},
                        {"id": "b", "path": ["s", "f", "b"], "type": "DATASET", "datasetType": "VIRTUAL"},
                        {"id": "c", "path": ["s", "f", "c"], "type": "DATASET", "datasetType": "VIRTUAL"}
                    ])),
                )
                .respond(204, Value::Null)
                .respond(403, json!({"errorMessage": "no"})),
        );
        match catalog.delete_folder("s/f", true) {
            Err(Error::PartialDelete {
                deleted,
                failed,
                source,
            }) => {
                assert_eq!(deleted, [path("s/f/a")]);
                assert_eq!(failed, path("s/f/b"));
                assert!(matches!(*source, Error::PermissionDenied(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn test_delete_folder_non_recursive_requires_empty() {
        let (catalog, transport) = catalog(
            ScriptedTransport::new()
                .respond(
                    200,
                    folder_with(json!([
                        {"id": "a", "path": ["s", "f", "a"], "type": "DATASET", "datasetType": "VIRTUAL"}
                    ])),
                )
                .respond(200, folder_with(json!([])))
                .respond(204, Value::Null),
        );
        assert!(matches!(
            catalog.delete_folder("s/f", false),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(catalog.delete_folder("s/f", false).unwrap(), [path("s/f")]);
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn test_copy_virtual_dataset_with_privileges() {
        let mut source = vds("v", &["s", "v"], "1");
        source["sqlContext"] = json!(["s"]);
        source["accessControlList"] = json!({"users": [{"id": "u", "permissions": ["SELECT"]}]});
        let (catalog, transport) = catalog(
            ScriptedTransport::new()
                .respond(200, source)
                .respond(200, vds("v2", &["t", "v"], "0")),
        );
        let copy = catalog
            .copy("s/v", "t/v", &CopyOptions::default())
            .unwrap();
        assert_eq!(copy.id(), "v2");
        let body = transport.requests()[1].body.clone().unwrap();
        assert_eq!(body["path"], json!(["t", "v"]));
        assert_eq!(body["sql"], json!("SELECT 1"));
        assert_eq!(body["sqlContext"], json!(["s"]));
        assert_eq!(body["accessControlList"]["users"][0]["id"], json!("u"));
    }

    #[test]
    fn test_copy_physical_dataset_unsupported() {
        let (catalog, transport) = catalog(ScriptedTransport::new().respond(
            200,
            json!({"entityType": "dataset", "type": "PHYSICAL_DATASET", "id": "p", "path": ["src", "t"]}),
        ));
        assert!(matches!(
            catalog.copy("src/t", "s/t", &CopyOptions::default()),
            Err(Error::Unsupported(_))
        ));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_copy_folder_rewrites_relative_references() {
        let mut inner = vds("v", &["s", "f", "v"], "1");
        inner["sql"] = json!("SELECT * FROM s.f.base JOIN \"s\".\"f\".other USING (id)");
        inner["sqlContext"] = json!(["s", "f"]);
        let (catalog, transport) = catalog(
            ScriptedTransport::new()
                .respond(
                    200,
                    folder_with(json!([
                        {"id": "v", "path": ["s", "f", "v"], "type": "DATASET", "datasetType": "VIRTUAL"}
                    ])),
                )
                .respond(
                    200,
                    json!({"entityType": "folder", "id": "t", "path": ["s", "g"]}),
                )
                .respond(200, inner)
                .respond(200, vds("v2", &["s", "g", "v"], "0")),
        );
        let options = CopyOptions {
            relative_references: true,
            assume_privileges: false,
        };
        let created = catalog.copy("s/f", "s/g", &options).unwrap();
        assert_eq!(created.path(), &path("s/g"));

        let requests = transport.requests();
        assert_eq!(
            requests[1].body,
            Some(json!({"entityType": "folder", "path": ["s", "g"]}))
        );
        let body = requests[3].body.clone().unwrap();
        assert_eq!(body["path"], json!(["s", "g", "v"]));
        assert_eq!(
            body["sql"],
            json!("SELECT * FROM \"s\".\"g\".base JOIN \"s\".\"g\".other USING (id)")
        );
        assert_eq!(body["sqlContext"], json!(["s", "g"]));
    }

    #[test]
    fn test_copy_into_itself_rejected() {
        let (catalog, transport) = catalog(ScriptedTransport::new());
        assert!(matches!(
            catalog.copy("s/f", "s/f/sub", &CopyOptions::default()),
            Err(Error::InvalidArgument(_))
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_reference_dataset() {
        let (catalog, transport) = catalog(
            ScriptedTransport::new()
                .respond(
                    200,
                    json!({"entityType": "dataset", "type": "PHYSICAL_DATASET", "id": "p",
                           "path": ["lake", "raw", "my table"]}),
                )
                .respond(200, vds("r", &["s", "r"], "0")),
        );
        catalog
            .reference("lake/raw/my table", "s/r", &ReferenceOptions::default())
            .unwrap();
        let body = transport.requests()[1].body.clone().unwrap();
        assert_eq!(
            body["sql"],
            json!("SELECT * FROM \"lake\".\"raw\".\"my table\"")
        );
        assert!(body.get("accessControlList").is_none());
    }

    #[test]
    fn test_wiki_and_tags() {
        let (catalog, transport) = catalog(
            ScriptedTransport::new()
                .respond(404, json!({"errorMessage": "no wiki"}))
                .respond(200, json!({"text": "# Sales", "version": 0}))
                .respond(200, json!({"tags": ["gold"], "version": "a"}))
                .respond(409, json!({"errorMessage": "version"})),
        );
        assert_eq!(catalog.get_wiki("x").unwrap(), None);
        let wiki = catalog
            .set_wiki(
                "x",
                &Wiki {
                    text: "# Sales".into(),
                    version: None,
                },
            )
            .unwrap();
        assert_eq!(wiki.version, Some(0));
        let tags = catalog.get_tags("x").unwrap().unwrap();
        assert_eq!(tags.tags, ["gold"]);
        assert!(matches!(
            catalog.set_tags("x", &tags),
            Err(Error::ConcurrentModification(_))
        ));

        let requests = transport.requests();
        assert_eq!(requests[0].path(), "api/v3/catalog/x/collaboration/wiki");
        assert_eq!(requests[2].path(), "api/v3/catalog/x/collaboration/tag");
    }

    #[test]
    fn test_refresh() {
        let (catalog, transport) = catalog(ScriptedTransport::new().respond(204, Value::Null));
        catalog.refresh("p").unwrap();
        assert_eq!(transport.requests()[0].path(), "api/v3/catalog/p/refresh");
    }

    #[test]
    fn test_rewrite_respects_identifier_boundaries() {
        let from = path("s/f");
        let to = path("t");
        assert_eq!(
            rewrite_sql_references("SELECT * FROM S.F.x, ss.f.y, s.fx.z", &from, &to),
            "SELECT * FROM \"t\".x, ss.f.y, s.fx.z"
        );
    }
}
