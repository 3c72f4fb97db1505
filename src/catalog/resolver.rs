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

//! Catalog lookups.

use std::collections::{HashMap, VecDeque};

use serde::Deserialize;
use tracing::{debug, instrument};

use super::{Catalog, CATALOG};
use crate::client::ApiRequest;
use crate::error::{Error, Result};
use crate::models::{CatalogChild, CatalogObject};
use crate::path::{CatalogPath, CatalogRef, IntoCatalogPath};

#[derive(Deserialize)]
struct Listing {
    #[serde(default)]
    data: Vec<CatalogChild>,
}

/// A catalog object together with all of its descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTree {
    pub object: CatalogObject,
    pub children: Vec<CatalogTree>,
}

impl CatalogTree {
    /// Number of objects in the tree, the root included.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(CatalogTree::len).sum::<usize>()
    }

    /// Always false; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Objects in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogObject> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(&node.object)
        })
    }

    pub fn find(&self, path: &CatalogPath) -> Option<&CatalogObject> {
        self.iter().find(|object| object.path() == path)
    }
}

impl Catalog {
    /// Looks up one object. Exactly one request is sent.
    #[instrument(skip(self, reference), fields(reference = %reference))]
    pub fn get(&self, reference: &CatalogRef) -> Result<CatalogObject> {
        let request = match reference {
            CatalogRef::ById(id) => {
                if id.trim().is_empty() {
                    return Err(Error::InvalidArgument("catalog id is empty".to_string()));
                }
                ApiRequest::get(CATALOG).with_segments([id])
            }
            CatalogRef::ByPath(path) => ApiRequest::get(CATALOG)
                .with_segments(["by-path"])
                .with_segments(path.segments()),
        };
        self.rest.send_json(request)
    }

    pub fn get_by_path(&self, path: impl IntoCatalogPath) -> Result<CatalogObject> {
        self.get(&CatalogRef::path(path)?)
    }

    pub fn get_by_id(&self, id: &str) -> Result<CatalogObject> {
        self.get(&CatalogRef::id(id))
    }

    /// Whether the object exists. Errors other than "not found" are returned.
    pub fn exists(&self, reference: &CatalogRef) -> Result<bool> {
        match self.get(reference) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Spaces, sources and the home space at the top of the catalog.
    #[instrument(skip(self))]
    pub fn list_root(&self) -> Result<Vec<CatalogChild>> {
        let listing: Listing = self.rest.send_json(ApiRequest::get(CATALOG))?;
        Ok(listing.data)
    }

    /// Fetches an object and every descendant, breadth first: all objects
    /// of one level are fetched before any object of the next.
    ///
    /// Each descendant costs one request and there is no depth limit, so a
    /// large subtree means a long series of calls.
    #[instrument(skip(self, reference), fields(reference = %reference))]
    pub fn get_catalog_tree(&self, reference: &CatalogRef) -> Result<CatalogTree> {
        let root = self.get(reference)?;
        let mut queue: VecDeque<CatalogChild> = root.children.iter().cloned().collect();
        let mut fetched = HashMap::new();
        while let Some(child) = queue.pop_front() {
            debug!(path = %child.path, "fetching catalog node");
            let object = self.get_by_id(&child.id)?;
            queue.extend(object.children.iter().cloned());
            fetched.insert(child.id, object);
        }
        Ok(assemble(root, &mut fetched))
    }
}

fn assemble(object: CatalogObject, fetched: &mut HashMap<String, CatalogObject>) -> CatalogTree {
    let mut children = Vec::with_capacity(object.children.len());
    for child in &object.children {
        if let Some(descendant) = fetched.remove(&child.id) {
            children.push(assemble(descendant, fetched));
        }
    }
    CatalogTree { object, children }
}
