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

//! A small toolkit for drawing textured quads with OpenGL-style APIs.
//!
//! The centerpiece of this crate is the [`Program`] type, which is built from a single
//! dual-section shader file (see [`ShaderSource`]) and caches the locations of its uniforms.
//! Around it sit thin RAII wrappers for buffers, vertex arrays and textures, a [`Renderer`]
//! and a [`SceneMenu`] for switching between small demos.
//!
//! This crate never talks to a driver directly. Every call goes through the [`GpuContext`]
//! trait, which is implemented for raw OpenGL by the `quadkit-gl` crate.
//!
//! ```text
//! #shader vertex
//! #version 330 core
//! void main() { ... }
//!
//! #shader fragment
//! #version 330 core
//! void main() { ... }
//! ```

#![forbid(unsafe_code)]

mod error;
mod gpu_backend;
mod renderer;
mod resources;
mod scene;
mod shader;
mod source;

pub use error::{Error, Result};
pub use gpu_backend::{
    AttributeKind, BufferType, DriverError, GpuContext, LayoutElement, Stage, TextureWrite,
    UniformValue, VertexAttribute,
};
pub use renderer::{clear_errors, log_errors, Renderer};
pub use resources::{
    IndexBuffer, LayoutType, Texture, VertexArray, VertexBuffer, VertexBufferLayout,
};
pub use scene::{ClearColor, Direction, Scene, SceneMenu, TexturedQuads};
pub use shader::{CompiledStage, Program};
pub use source::ShaderSource;

/// Run a driver call, logging any errors it left in the driver's error queue.
///
/// The queue is drained before the call so that only errors caused by `$call` are reported.
/// In debug builds a dirty queue afterwards is an assertion failure.
#[macro_export]
macro_rules! gl_call {
    ($context:expr, $call:expr) => {{
        $crate::clear_errors(&*$context);
        let result = $call;
        let clean = $crate::log_errors(&*$context, stringify!($call), file!(), line!());
        debug_assert!(clean, "driver error after `{}`", stringify!($call));
        result
    }};
}
