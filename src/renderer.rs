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

//! The renderer and driver error checking.

use crate::gpu_backend::GpuContext;
use crate::resources::{IndexBuffer, VertexArray};
use crate::shader::Program;

use std::fmt;
use std::rc::Rc;

// A lost context can report the same error forever.
const MAX_QUEUED_ERRORS: usize = 64;

/// Draws indexed geometry.
pub struct Renderer<C: GpuContext + ?Sized> {
    context: Rc<C>,
}

impl<C: GpuContext + ?Sized> fmt::Debug for Renderer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}

impl<C: GpuContext + ?Sized> Renderer<C> {
    /// Create a renderer for a context.
    pub fn new(context: Rc<C>) -> Self {
        Self { context }
    }

    /// The context this renderer draws with.
    pub fn context(&self) -> &Rc<C> {
        &self.context
    }

    /// Set the color that [`clear`](Self::clear) fills the screen with.
    pub fn set_clear_color(&self, color: [f32; 4]) {
        crate::gl_call!(self.context, self.context.set_clear_color(color));
    }

    /// Clear the screen.
    pub fn clear(&self) {
        crate::gl_call!(self.context, self.context.clear());
    }

    /// Blend drawn geometry over the framebuffer using its alpha.
    pub fn enable_blending(&self) {
        crate::gl_call!(self.context, self.context.enable_blending());
    }

    /// Set the viewport to the size of the surface.
    pub fn set_viewport(&self, width: u32, height: u32) {
        crate::gl_call!(self.context, self.context.viewport(width, height));
    }

    /// Draw every index of `indices` as triangles.
    pub fn draw(&self, vertices: &VertexArray<C>, indices: &IndexBuffer<C>, program: &Program<C>) {
        program.bind();
        vertices.bind();
        indices.bind();

        crate::gl_call!(self.context, self.context.draw_indexed(indices.count()));
    }
}

/// Discard every error in the driver's error queue.
pub fn clear_errors<C: GpuContext + ?Sized>(context: &C) {
    for _ in 0..MAX_QUEUED_ERRORS {
        if context.pop_error().is_none() {
            break;
        }
    }
}

/// Log every error in the driver's error queue.
///
/// `call`, `file` and `line` describe the call that is being checked. Returns `true` if the
/// queue was empty.
pub fn log_errors<C: GpuContext + ?Sized>(context: &C, call: &str, file: &str, line: u32) -> bool {
    let mut clean = true;

    for _ in 0..MAX_QUEUED_ERRORS {
        match context.pop_error() {
            Some(error) => {
                tracing::error!("driver error {error} after `{call}` at {file}:{line}");
                clean = false;
            }
            None => break,
        }
    }

    clean
}
