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

//! Defines the GPU backend for quadkit.

use std::error::Error;
use std::fmt;

/// The backend that every driver call goes through.
///
/// All handle types are plain identifiers; ownership of the objects behind them is tracked by
/// the wrappers in this crate, which call the matching `delete_*` method exactly once.
///
/// Methods take `&self` so that one context can be shared through an [`Rc`] between all of
/// the objects created from it. Implementations that need to mutate state should use interior
/// mutability.
///
/// [`Rc`]: std::rc::Rc
pub trait GpuContext {
    /// A compiled (or failed) shader stage.
    type Shader: Copy + fmt::Debug;

    /// A shader program.
    type Program: Copy + PartialEq + fmt::Debug;

    /// The location of a uniform inside of a linked program.
    type UniformLocation: Clone + fmt::Debug;

    /// A buffer holding either vertices or indices.
    type Buffer: Copy + fmt::Debug;

    /// A vertex array object, which records the vertex layout.
    type VertexArray: Copy + fmt::Debug;

    /// A two-dimensional texture.
    type Texture: Copy + fmt::Debug;

    /// The error type associated with this GPU context.
    type Error: Error + Send + Sync + 'static;

    /// Create a new, empty shader object for the given stage.
    fn create_shader(&self, stage: Stage) -> Result<Self::Shader, Self::Error>;

    /// Replace the source code of a shader.
    fn shader_source(&self, shader: Self::Shader, source: &str);

    /// Compile a shader.
    fn compile_shader(&self, shader: Self::Shader);

    /// Whether the last compilation of this shader succeeded.
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;

    /// Get the diagnostic log of the last compilation.
    fn shader_info_log(&self, shader: Self::Shader) -> String;

    /// Delete a shader object.
    fn delete_shader(&self, shader: Self::Shader);

    /// Create a new, empty program object.
    fn create_program(&self) -> Result<Self::Program, Self::Error>;

    /// Attach a shader to a program.
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Detach a shader from a program.
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Link a program from its attached shaders.
    fn link_program(&self, program: Self::Program);

    /// Whether the last link of this program succeeded.
    fn program_link_status(&self, program: Self::Program) -> bool;

    /// Check whether the program can execute in the current driver state.
    fn validate_program(&self, program: Self::Program);

    /// Whether the last validation of this program succeeded.
    fn program_validate_status(&self, program: Self::Program) -> bool;

    /// Get the diagnostic log of the last link or validation.
    fn program_info_log(&self, program: Self::Program) -> String;

    /// Delete a program object.
    fn delete_program(&self, program: Self::Program);

    /// Make a program current, or unbind the current one with `None`.
    fn use_program(&self, program: Option<Self::Program>);

    /// Get the program that is currently in use.
    fn current_program(&self) -> Option<Self::Program>;

    /// Look up the location of a uniform.
    ///
    /// Returns `None` if the program has no active uniform with this name.
    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;

    /// Set a uniform of the current program.
    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue);

    /// Create a new buffer.
    fn create_buffer(&self) -> Result<Self::Buffer, Self::Error>;

    /// Bind a buffer to a target, or unbind the target with `None`.
    fn bind_buffer(&self, target: BufferType, buffer: Option<Self::Buffer>);

    /// Upload static data into the buffer bound to `target`.
    fn buffer_data(&self, target: BufferType, data: &[u8]);

    /// Delete a buffer.
    fn delete_buffer(&self, buffer: Self::Buffer);

    /// Create a new vertex array.
    fn create_vertex_array(&self) -> Result<Self::VertexArray, Self::Error>;

    /// Bind a vertex array, or unbind the current one with `None`.
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);

    /// Enable and describe a vertex attribute of the bound vertex array.
    ///
    /// The data is read from the buffer currently bound to [`BufferType::Vertex`].
    fn vertex_attribute(&self, attribute: VertexAttribute);

    /// Delete a vertex array.
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    /// Create a new texture.
    fn create_texture(&self) -> Result<Self::Texture, Self::Error>;

    /// Upload RGBA8 pixels into a texture.
    ///
    /// The texture uses linear filtering and clamps to its edges. Rows are given bottom first.
    fn write_texture(&self, texture_write: TextureWrite<'_, Self>);

    /// Bind a texture to a texture unit, or unbind the unit with `None`.
    fn bind_texture(&self, slot: u32, texture: Option<Self::Texture>);

    /// Delete a texture.
    fn delete_texture(&self, texture: Self::Texture);

    /// Set the color used by [`clear`](GpuContext::clear).
    fn set_clear_color(&self, color: [f32; 4]);

    /// Clear the color buffer.
    fn clear(&self);

    /// Enable blending with `(source alpha, one minus source alpha)`.
    fn enable_blending(&self);

    /// Set the viewport to cover `(0, 0)` to `(width, height)`.
    fn viewport(&self, width: u32, height: u32);

    /// Draw `count` indices from the bound index buffer as triangles.
    fn draw_indexed(&self, count: usize);

    /// Pop the oldest error from the driver's error queue.
    fn pop_error(&self) -> Option<DriverError>;
}

/// The data necessary to write an image into a texture.
pub struct TextureWrite<'a, C: GpuContext + ?Sized> {
    /// The texture to write into.
    pub texture: C::Texture,

    /// The size of the image.
    pub size: (u32, u32),

    /// The pixels, four bytes each.
    pub data: &'a [u8],
}

/// One of the two stages of a program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The vertex shader.
    Vertex,

    /// The fragment shader.
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        })
    }
}

/// A value that can be written into a uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    /// An `int` or a `sampler2D` texture unit.
    Int(i32),

    /// A `float`.
    Float(f32),

    /// A `vec2`.
    Vec2([f32; 2]),

    /// A `vec3`.
    Vec3([f32; 3]),

    /// A `vec4`.
    Vec4([f32; 4]),

    /// A `mat4`, in column-major order.
    Mat4([f32; 16]),
}

/// The type of the buffer to use.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BufferType {
    /// The buffer is used for vertices.
    Vertex,

    /// The buffer is used for indices.
    Index,
}

/// The component type of a vertex attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// 32-bit float.
    Float,

    /// 32-bit unsigned integer.
    UnsignedInt,

    /// 8-bit unsigned integer.
    UnsignedByte,
}

impl AttributeKind {
    /// The size of one component, in bytes.
    pub fn size(self) -> usize {
        match self {
            AttributeKind::Float | AttributeKind::UnsignedInt => 4,
            AttributeKind::UnsignedByte => 1,
        }
    }

    /// Whether the shader sees the component scaled into `0.0..=1.0`.
    pub fn normalized(self) -> bool {
        matches!(self, AttributeKind::UnsignedByte)
    }
}

/// One element of a vertex layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayoutElement {
    /// The component type.
    pub kind: AttributeKind,

    /// The number of components.
    pub count: u32,

    /// Whether the components are normalized.
    pub normalized: bool,
}

impl LayoutElement {
    /// The size of the whole element, in bytes.
    pub fn size(&self) -> usize {
        self.kind.size() * self.count as usize
    }
}

/// A vertex attribute, as passed to [`GpuContext::vertex_attribute`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// The attribute index (`layout(location = N)`).
    pub index: u32,

    /// The element being described.
    pub element: LayoutElement,

    /// The distance between two vertices, in bytes.
    pub stride: usize,

    /// The offset of this element inside of a vertex, in bytes.
    pub offset: usize,
}

/// An error flag reported by the driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DriverError {
    /// `GL_INVALID_ENUM`
    InvalidEnum,

    /// `GL_INVALID_VALUE`
    InvalidValue,

    /// `GL_INVALID_OPERATION`
    InvalidOperation,

    /// `GL_STACK_OVERFLOW`
    StackOverflow,

    /// `GL_STACK_UNDERFLOW`
    StackUnderflow,

    /// `GL_OUT_OF_MEMORY`
    OutOfMemory,

    /// `GL_INVALID_FRAMEBUFFER_OPERATION`
    InvalidFramebufferOperation,

    /// `GL_CONTEXT_LOST`
    ContextLost,

    /// Any other error code.
    Unknown(u32),
}

impl DriverError {
    /// Convert an OpenGL error code.
    ///
    /// Returns `None` for `GL_NO_ERROR`.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => return None,
            0x0500 => DriverError::InvalidEnum,
            0x0501 => DriverError::InvalidValue,
            0x0502 => DriverError::InvalidOperation,
            0x0503 => DriverError::StackOverflow,
            0x0504 => DriverError::StackUnderflow,
            0x0505 => DriverError::OutOfMemory,
            0x0506 => DriverError::InvalidFramebufferOperation,
            0x0507 => DriverError::ContextLost,
            code => DriverError::Unknown(code),
        })
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverError::InvalidEnum => "GL_INVALID_ENUM",
            DriverError::InvalidValue => "GL_INVALID_VALUE",
            DriverError::InvalidOperation => "GL_INVALID_OPERATION",
            DriverError::StackOverflow => "GL_STACK_OVERFLOW",
            DriverError::StackUnderflow => "GL_STACK_UNDERFLOW",
            DriverError::OutOfMemory => "GL_OUT_OF_MEMORY",
            DriverError::InvalidFramebufferOperation => "GL_INVALID_FRAMEBUFFER_OPERATION",
            DriverError::ContextLost => "GL_CONTEXT_LOST",
            DriverError::Unknown(code) => return write!(f, "unknown error 0x{code:04x}"),
        };

        f.write_str(name)
    }
}
