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

use super::Scene;
use crate::error::Result;
use crate::gpu_backend::GpuContext;
use crate::renderer::Renderer;

/// Fills the screen with one color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    color: [f32; 4],
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::new([0.2, 0.3, 0.8, 1.0])
    }
}

impl ClearColor {
    /// Create a scene that clears to `color`.
    pub fn new(color: [f32; 4]) -> Self {
        Self { color }
    }

    /// The color being drawn.
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Change the color being drawn.
    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
    }
}

impl<C: GpuContext + ?Sized> Scene<C> for ClearColor {
    fn on_render(&mut self, renderer: &Renderer<C>) -> Result<()> {
        renderer.set_clear_color(self.color);
        renderer.clear();
        Ok(())
    }
}
