// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `quadkit`.
//
// `quadkit` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `quadkit` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `quadkit`. If not, see <https://www.gnu.org/licenses/>.

//! Contains all errors that may occur while loading shaders or creating GPU resources.

use crate::gpu_backend::Stage;

use std::io;
use std::path::PathBuf;

/// A specialized result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Set of possible errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file could not be read.
    #[error("failed to read {}: {}", path.display(), source)]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A shader file has code before its first `#shader` directive.
    #[error("line {line}: shader code appears before any `#shader` directive")]
    ContentBeforeDirective {
        /// The offending line, starting from 1.
        line: usize,
    },

    /// A `#shader` directive names neither `vertex` nor `fragment`.
    #[error("line {line}: `{directive}` does not name a vertex or fragment stage")]
    UnknownStage {
        /// The offending line, starting from 1.
        line: usize,
        /// The directive as written.
        directive: String,
    },

    /// Compilation of a shader stage has failed.
    #[error("failed to compile {stage} shader: {log}")]
    Compile {
        /// The stage that failed.
        stage: Stage,
        /// The driver's diagnostic message.
        log: String,
    },

    /// Linking a program has failed.
    #[error("failed to link shader program: {log}")]
    Link {
        /// The driver's diagnostic message.
        log: String,
    },

    /// A linked program failed validation.
    #[error("shader program failed validation: {log}")]
    Validate {
        /// The driver's diagnostic message.
        log: String,
    },

    /// An image could not be loaded.
    #[error("failed to load image {}: {}", path.display(), source)]
    Image {
        /// The image that was being loaded.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: image::ImageError,
    },

    /// No scene is registered under this name.
    #[error("no scene named `{0}`")]
    UnknownScene(String),

    /// The GPU backend failed to create an object.
    #[error("gpu backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn backend(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(error))
    }
}
