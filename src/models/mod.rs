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

//! Typed request and response objects of the REST API.

pub mod catalog;
pub mod collaboration;
pub mod jobs;
pub mod users;

pub use catalog::{
    AccessControlEntry, AccessControlList, CatalogChild, CatalogKind, CatalogObject, ChildType,
    ContainerType, DatasetType, Field, FieldType, ItemSpec, NewCatalogItem,
};
pub use collaboration::{Tags, Wiki};
pub use jobs::{Job, JobState, ResultPage, SchemaField, SqlRequest};
pub use users::{NewUser, User};
