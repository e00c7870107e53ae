// Copyright 2025 eraflo
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

//! The GPU program constant model.

pub mod definition;
pub mod logical;
pub mod named;
pub mod types;

pub use self::definition::{GpuConstantDefinition, UNASSIGNED_PHYSICAL_INDEX};
pub use self::logical::{GpuLogicalBufferStruct, GpuLogicalIndexUse};
pub use self::named::GpuNamedConstants;
pub use self::types::{BaseConstantType, GpuConstantType, UnknownConstantCode};
