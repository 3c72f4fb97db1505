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

//! Catalog access.
//!
//! Lookups live in [`resolver`], changes in [`mutator`]. Both operate on the
//! same [`Catalog`] handle.

pub mod mutator;
pub mod resolver;

pub use mutator::{CopyOptions, ReferenceOptions};
pub use resolver::CatalogTree;

use crate::client::RestClient;

/// Path of the catalog resource.
const CATALOG: [&str; 3] = ["api", "v3", "catalog"];

/// Handle on the catalog API.
#[derive(Debug, Clone)]
pub struct Catalog {
    rest: RestClient,
}

impl Catalog {
    pub(crate) fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}
