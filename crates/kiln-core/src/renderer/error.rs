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

//! Defines the hierarchy of error types for the rendering contracts.

use crate::renderer::api::buffer::{BufferType, MappingState};
use std::fmt;

/// An error reported by a backend while servicing a resource request.
#[derive(Debug)]
pub enum ResourceError {
    /// The backend ran out of memory of the requested kind.
    OutOfMemory,
    /// A byte range fell outside the backing storage.
    RangeOutOfBounds {
        /// First byte of the requested range.
        offset: usize,
        /// Length of the requested range.
        len: usize,
        /// Size of the backing storage.
        size: usize,
    },
    /// The backing storage is not mapped.
    NotMapped,
    /// A backend-specific error occurred.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::OutOfMemory => write!(f, "Out of memory"),
            ResourceError::RangeOutOfBounds { offset, len, size } => write!(
                f,
                "Byte range {offset}..{} exceeds storage size {size}",
                offset + len
            ),
            ResourceError::NotMapped => write!(f, "Backing storage is not mapped"),
            ResourceError::BackendError(msg) => write!(f, "Backend error: {msg}"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// A violation of the packed buffer usage contract.
///
/// These are programmer errors. They are never downgraded to a silent no-op.
#[derive(Debug)]
pub enum BufferError {
    /// An immutable buffer was created without initial data.
    ImmutableWithoutData {
        /// The buffer label.
        label: String,
    },
    /// A dynamic buffer was created with a shadow copy.
    DynamicWithShadowCopy {
        /// The buffer label.
        label: String,
    },
    /// Initial or uploaded data does not match the addressed byte count.
    DataSizeMismatch {
        /// The buffer label.
        label: String,
        /// Expected number of bytes.
        expected: usize,
        /// Provided number of bytes.
        actual: usize,
    },
    /// An element range exceeds the buffer.
    OutOfBounds {
        /// The buffer label.
        label: String,
        /// First element of the range.
        element_start: usize,
        /// Number of elements in the range.
        element_count: usize,
        /// Number of elements in the buffer.
        num_elements: usize,
    },
    /// `upload` was called on an immutable buffer.
    UploadToImmutable {
        /// The buffer label.
        label: String,
    },
    /// `upload` was called while the buffer is mapped.
    UploadWhileMapped {
        /// The buffer label.
        label: String,
        /// The active mapping state.
        state: MappingState,
    },
    /// `map` was called on a buffer that is not dynamic.
    MapNonDynamic {
        /// The buffer label.
        label: String,
        /// The buffer's usage class.
        buffer_type: BufferType,
    },
    /// `map` was asked to transition to the unmapped state.
    InvalidPersistenceFlag {
        /// The buffer label.
        label: String,
    },
    /// `map` was called again with a different persistence flag.
    MappingMismatch {
        /// The buffer label.
        label: String,
        /// The active mapping state.
        current: MappingState,
        /// The requested mapping state.
        requested: MappingState,
    },
    /// A persistent re-map requested a region outside the mapped one.
    SubRegionOutsideMapping {
        /// The buffer label.
        label: String,
        /// First requested element.
        element_start: usize,
        /// Number of requested elements.
        element_count: usize,
        /// First element of the active mapping.
        mapped_start: usize,
        /// Number of elements in the active mapping.
        mapped_count: usize,
    },
    /// `unmap` was called on an unmapped buffer.
    NotMapped {
        /// The buffer label.
        label: String,
    },
    /// The buffer interface failed.
    Interface(ResourceError),
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::ImmutableWithoutData { label } => {
                write!(f, "Immutable buffer '{label}' requires initial data")
            }
            BufferError::DynamicWithShadowCopy { label } => {
                write!(f, "Dynamic buffer '{label}' cannot keep a shadow copy")
            }
            BufferError::DataSizeMismatch {
                label,
                expected,
                actual,
            } => write!(
                f,
                "Buffer '{label}' expected {expected} bytes of data, got {actual}"
            ),
            BufferError::OutOfBounds {
                label,
                element_start,
                element_count,
                num_elements,
            } => write!(
                f,
                "Elements {element_start}..{} are out of bounds for buffer '{label}' ({num_elements} elements)",
                element_start + element_count
            ),
            BufferError::UploadToImmutable { label } => {
                write!(f, "Cannot upload to immutable buffer '{label}'")
            }
            BufferError::UploadWhileMapped { label, state } => {
                write!(f, "Cannot upload to buffer '{label}' while it is {state}")
            }
            BufferError::MapNonDynamic { label, buffer_type } => write!(
                f,
                "Only dynamic buffers can be mapped; '{label}' is {buffer_type:?}"
            ),
            BufferError::InvalidPersistenceFlag { label } => {
                write!(f, "Buffer '{label}' cannot be mapped as unmapped")
            }
            BufferError::MappingMismatch {
                label,
                current,
                requested,
            } => write!(
                f,
                "Buffer '{label}' is already {current}; cannot map it again as {requested}"
            ),
            BufferError::SubRegionOutsideMapping {
                label,
                element_start,
                element_count,
                mapped_start,
                mapped_count,
            } => write!(
                f,
                "Requested elements {element_start}..{} of buffer '{label}' are outside the persistent mapping {mapped_start}..{}",
                element_start + element_count,
                mapped_start + mapped_count
            ),
            BufferError::NotMapped { label } => {
                write!(f, "Buffer '{label}' is not mapped")
            }
            BufferError::Interface(err) => write!(f, "Buffer interface error: {err}"),
        }
    }
}

impl std::error::Error for BufferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BufferError::Interface(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for BufferError {
    fn from(err: ResourceError) -> Self {
        BufferError::Interface(err)
    }
}

/// An error raised while compiling, linking or generating a GPU program.
#[derive(Debug)]
pub enum ProgramError {
    /// The driver rejected the program source.
    CompilationFailed {
        /// A descriptive label for the program.
        label: String,
        /// Diagnostic text from the compiler.
        details: String,
    },
    /// The driver failed to link the program stages.
    LinkFailed {
        /// A descriptive label for the program.
        label: String,
        /// Diagnostic text from the linker.
        details: String,
    },
    /// None of the candidate profiles is supported by the device.
    NoSupportedProfile {
        /// The candidate profiles that were tried.
        candidates: Vec<String>,
    },
    /// A program component could not be generated.
    GenerationFailed(String),
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::CompilationFailed { label, details } => {
                write!(f, "Program compilation failed for '{label}': {details}")
            }
            ProgramError::LinkFailed { label, details } => {
                write!(f, "Program link failed for '{label}': {details}")
            }
            ProgramError::NoSupportedProfile { candidates } => write!(
                f,
                "No supported profile among: {}",
                candidates.join(", ")
            ),
            ProgramError::GenerationFailed(msg) => {
                write!(f, "Program generation failed: {msg}")
            }
        }
    }
}

impl std::error::Error for ProgramError {}
