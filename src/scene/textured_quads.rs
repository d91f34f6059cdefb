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

use super::{Direction, Scene};
use crate::error::Result;
use crate::gpu_backend::GpuContext;
use crate::renderer::Renderer;
use crate::resources::{IndexBuffer, Texture, VertexArray, VertexBuffer, VertexBufferLayout};
use crate::shader::Program;
use crate::source::ShaderSource;

use glam::{Mat4, Vec3};
use image::{Rgba, RgbaImage};

use std::fmt;
use std::rc::Rc;

const SHADER: &str = include_str!("../shaders/textured_quad.shader");

/// The size of the orthographic projection.
const VIEW_WIDTH: f32 = 960.0;
const VIEW_HEIGHT: f32 = 540.0;

/// Half of the side length of a quad.
const HALF_EXTENT: f32 = 50.0;

/// How far an arrow key moves the first quad.
const STEP: f32 = 10.0;

/// How fast the red channel of the tint changes, per second.
const PULSE_RATE: f32 = 0.6;

const CHECKER_SIZE: u32 = 64;
const CHECKER_CELL: u32 = 8;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        pos: [-HALF_EXTENT, -HALF_EXTENT],
        uv: [0.0, 0.0],
    },
    QuadVertex {
        pos: [HALF_EXTENT, -HALF_EXTENT],
        uv: [1.0, 0.0],
    },
    QuadVertex {
        pos: [HALF_EXTENT, HALF_EXTENT],
        uv: [1.0, 1.0],
    },
    QuadVertex {
        pos: [-HALF_EXTENT, HALF_EXTENT],
        uv: [0.0, 1.0],
    },
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Two textured quads drawn with the same geometry at different positions.
pub struct TexturedQuads<C: GpuContext + ?Sized> {
    vertex_array: VertexArray<C>,
    // Only kept alive for the vertex array.
    _vertex_buffer: VertexBuffer<C>,
    index_buffer: IndexBuffer<C>,
    program: Program<C>,
    texture: Texture<C>,
    projection: Mat4,
    view: Mat4,
    translations: [Vec3; 2],
    red: f32,
    pulse: f32,
}

impl<C: GpuContext + ?Sized> fmt::Debug for TexturedQuads<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TexturedQuads")
            .field("program", &self.program)
            .field("texture", &self.texture)
            .field("translations", &self.translations)
            .finish_non_exhaustive()
    }
}

impl<C: GpuContext + ?Sized> TexturedQuads<C> {
    /// Build the geometry, the program and the texture.
    pub fn new(context: &Rc<C>) -> Result<Self> {
        Self::with_source(context, &ShaderSource::parse(SHADER)?)
    }

    /// Like [`new`](Self::new), but draws with another shader.
    ///
    /// The shader sees the same inputs: `position` and `texCoord` attributes and the `u_MVP`,
    /// `u_Color` and `u_Texture` uniforms, any of which it may leave out.
    pub fn with_source(context: &Rc<C>, source: &ShaderSource) -> Result<Self> {
        let vertex_array = VertexArray::new(context)?;
        let vertex_buffer = VertexBuffer::new(context, &QUAD_VERTICES)?;

        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2).push::<f32>(2);
        vertex_array.add_buffer(&vertex_buffer, &layout);

        let index_buffer = IndexBuffer::new(context, &QUAD_INDICES)?;

        let mut program = Program::from_source(context, source)?;
        program.set_uniform_4f("u_Color", 1.0, 1.0, 1.0, 1.0);
        program.set_uniform_1i("u_Texture", 0);

        let texture = Texture::from_image(context, &checkerboard())?;

        vertex_array.unbind();
        vertex_buffer.unbind();
        index_buffer.unbind();
        program.unbind();

        Ok(Self {
            vertex_array,
            _vertex_buffer: vertex_buffer,
            index_buffer,
            program,
            texture,
            projection: Mat4::orthographic_rh_gl(0.0, VIEW_WIDTH, 0.0, VIEW_HEIGHT, -1.0, 1.0),
            view: Mat4::IDENTITY,
            translations: [Vec3::new(200.0, 200.0, 0.0), Vec3::new(400.0, 200.0, 0.0)],
            red: 1.0,
            pulse: -PULSE_RATE,
        })
    }

    /// Where the two quads are centered.
    pub fn translations(&self) -> [Vec3; 2] {
        self.translations
    }

    /// Move the two quads.
    pub fn set_translations(&mut self, translations: [Vec3; 2]) {
        self.translations = translations;
    }

    /// The tint multiplied into the texture. Its red channel swings between zero and one.
    pub fn color(&self) -> [f32; 4] {
        [self.red, 1.0, 1.0, 1.0]
    }

    /// The model-view-projection matrix of a quad centered at `translation`.
    pub fn mvp(&self, translation: Vec3) -> Mat4 {
        self.projection * self.view * Mat4::from_translation(translation)
    }
}

impl<C: GpuContext + ?Sized> Scene<C> for TexturedQuads<C> {
    fn on_update(&mut self, delta: f32) {
        self.red += self.pulse * delta;

        if self.red >= 1.0 {
            self.red = 1.0;
            self.pulse = -PULSE_RATE;
        } else if self.red <= 0.0 {
            self.red = 0.0;
            self.pulse = PULSE_RATE;
        }
    }

    fn on_render(&mut self, renderer: &Renderer<C>) -> Result<()> {
        renderer.set_clear_color([0.0, 0.0, 0.0, 1.0]);
        renderer.clear();

        self.texture.bind(0);

        let [r, g, b, a] = self.color();
        self.program.set_uniform_4f("u_Color", r, g, b, a);

        for translation in self.translations {
            let mvp = self.mvp(translation);
            self.program.set_uniform_mat4f("u_MVP", &mvp);
            renderer.draw(&self.vertex_array, &self.index_buffer, &self.program);
        }

        Ok(())
    }

    fn on_direction(&mut self, direction: Direction) {
        let (x, y) = direction.offset();
        self.translations[0] += Vec3::new(x, y, 0.0) * STEP;
    }
}

fn checkerboard() -> RgbaImage {
    RgbaImage::from_fn(CHECKER_SIZE, CHECKER_SIZE, |x, y| {
        if (x / CHECKER_CELL + y / CHECKER_CELL) % 2 == 0 {
            Rgba([0xf0, 0x90, 0x28, 0xff])
        } else {
            Rgba([0x28, 0x28, 0x28, 0xff])
        }
    })
}
