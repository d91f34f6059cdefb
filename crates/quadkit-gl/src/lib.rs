// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `quadkit-gl`.
//
// `quadkit-gl` is free software: you can redistribute it and/or modify it under the terms of
// either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
// version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `quadkit-gl` is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Lesser General Public License or the Mozilla Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `quadkit-gl`. If not, see <https://www.gnu.org/licenses/> or
// <https://www.mozilla.org/en-US/MPL/2.0/>.

//! An OpenGL 3.3 backend for [`quadkit`] that uses the [`gl`] crate.
//!
//! [`gl`]: https://crates.io/crates/gl

use gl::types::{GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};
use quadkit::{
    AttributeKind, BufferType, DriverError, GpuContext, Stage, TextureWrite, UniformValue,
    VertexAttribute,
};

use std::cell::Cell;
use std::ffi::{c_void, CString};
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

/// A [`GpuContext`] that forwards every call to the current OpenGL context.
///
/// The function pointers loaded by [`GlContext::load_with`] are global, so only one of these
/// should exist at a time.
pub struct GlContext {
    /// Whether the GL context is current.
    has_context: Cell<bool>,

    /// GL contexts are bound to one thread.
    _not_send: PhantomData<*const ()>,
}

impl fmt::Debug for GlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlContext")
            .field("has_context", &self.has_context.get())
            .finish()
    }
}

/// An error from the OpenGL backend.
#[derive(Debug)]
pub struct GlError(String);

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GL error: {}", self.0)
    }
}

impl std::error::Error for GlError {}

impl GlContext {
    /// Load the OpenGL function pointers and check the driver version.
    ///
    /// # Safety
    ///
    /// The context must be current, and `loader` must return the address of the named function
    /// for that context, or null.
    pub unsafe fn load_with(
        loader: impl FnMut(&'static str) -> *const c_void,
    ) -> Result<Self, GlError> {
        gl::load_with(loader);

        let (mut major, mut minor) = (0, 0);
        gl::GetIntegerv(gl::MAJOR_VERSION, &mut major);
        gl::GetIntegerv(gl::MINOR_VERSION, &mut minor);

        if (major, minor) < (3, 3) {
            return Err(GlError(format!(
                "OpenGL 3.3 or higher is required, found {major}.{minor}"
            )));
        }

        tracing::debug!("loaded OpenGL {major}.{minor}");

        Ok(Self {
            has_context: Cell::new(true),
            _not_send: PhantomData,
        })
    }

    /// Route driver debug messages to `tracing`, if the driver supports `KHR_debug`.
    ///
    /// Returns `false` if it does not.
    pub fn enable_debug_output(&self) -> bool {
        self.assert_context();

        if !gl::DebugMessageCallback::is_loaded() {
            return false;
        }

        unsafe {
            gl::Enable(gl::DEBUG_OUTPUT);
            gl::DebugMessageCallback(Some(debug_callback), ptr::null());
        }

        true
    }

    /// Mark the context as no longer current.
    pub fn unset_context(&self) {
        self.has_context.set(false);
    }

    /// Mark the context as current again.
    ///
    /// # Safety
    ///
    /// The context these functions were loaded for must be current.
    pub unsafe fn set_context(&self) {
        self.has_context.set(true);
    }

    fn assert_context(&self) {
        if !self.has_context.get() {
            panic!("No GL context installed");
        }
    }
}

impl GpuContext for GlContext {
    type Shader = GLuint;
    type Program = GLuint;
    type UniformLocation = GLint;
    type Buffer = GLuint;
    type VertexArray = GLuint;
    type Texture = GLuint;
    type Error = GlError;

    fn create_shader(&self, stage: Stage) -> Result<GLuint, GlError> {
        self.assert_context();

        let shader_type = match stage {
            Stage::Vertex => gl::VERTEX_SHADER,
            Stage::Fragment => gl::FRAGMENT_SHADER,
        };

        match unsafe { gl::CreateShader(shader_type) } {
            0 => Err(GlError(format!("failed to create {stage} shader"))),
            shader => Ok(shader),
        }
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        self.assert_context();

        // Passing the length means the source does not need a trailing NUL.
        let pointer = source.as_ptr() as *const GLchar;
        let length = source.len() as GLint;

        unsafe {
            gl::ShaderSource(shader, 1, &pointer, &length);
        }
    }

    fn compile_shader(&self, shader: GLuint) {
        self.assert_context();

        unsafe {
            gl::CompileShader(shader);
        }
    }

    fn shader_compile_status(&self, shader: GLuint) -> bool {
        self.assert_context();

        let mut status = gl::FALSE as GLint;
        unsafe {
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
        }

        status != gl::FALSE as GLint
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        self.assert_context();

        let mut len = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        }

        read_info_log(len, |capacity, written, buffer| unsafe {
            gl::GetShaderInfoLog(shader, capacity, written, buffer);
        })
    }

    fn delete_shader(&self, shader: GLuint) {
        self.assert_context();

        unsafe {
            gl::DeleteShader(shader);
        }
    }

    fn create_program(&self) -> Result<GLuint, GlError> {
        self.assert_context();

        match unsafe { gl::CreateProgram() } {
            0 => Err(GlError("failed to create program".into())),
            program => Ok(program),
        }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        self.assert_context();

        unsafe {
            gl::AttachShader(program, shader);
        }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        self.assert_context();

        unsafe {
            gl::DetachShader(program, shader);
        }
    }

    fn link_program(&self, program: GLuint) {
        self.assert_context();

        unsafe {
            gl::LinkProgram(program);
        }
    }

    fn program_link_status(&self, program: GLuint) -> bool {
        self.program_flag(program, gl::LINK_STATUS)
    }

    fn validate_program(&self, program: GLuint) {
        self.assert_context();

        unsafe {
            gl::ValidateProgram(program);
        }
    }

    fn program_validate_status(&self, program: GLuint) -> bool {
        self.program_flag(program, gl::VALIDATE_STATUS)
    }

    fn program_info_log(&self, program: GLuint) -> String {
        self.assert_context();

        let mut len = 0;
        unsafe {
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
        }

        read_info_log(len, |capacity, written, buffer| unsafe {
            gl::GetProgramInfoLog(program, capacity, written, buffer);
        })
    }

    fn delete_program(&self, program: GLuint) {
        self.assert_context();

        unsafe {
            gl::DeleteProgram(program);
        }
    }

    fn use_program(&self, program: Option<GLuint>) {
        self.assert_context();

        unsafe {
            gl::UseProgram(program.unwrap_or(0));
        }
    }

    fn current_program(&self) -> Option<GLuint> {
        self.assert_context();

        let mut program = 0;
        unsafe {
            gl::GetIntegerv(gl::CURRENT_PROGRAM, &mut program);
        }

        match program {
            0 => None,
            program => Some(program as GLuint),
        }
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> Option<GLint> {
        self.assert_context();

        // A name with a NUL in it can't be a GLSL identifier.
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetUniformLocation(program, name.as_ptr()) };

        (location != -1).then_some(location)
    }

    fn set_uniform(&self, location: &GLint, value: UniformValue) {
        self.assert_context();
        let location = *location;

        unsafe {
            match value {
                UniformValue::Int(x) => gl::Uniform1i(location, x),
                UniformValue::Float(x) => gl::Uniform1f(location, x),
                UniformValue::Vec2([x, y]) => gl::Uniform2f(location, x, y),
                UniformValue::Vec3([x, y, z]) => gl::Uniform3f(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => gl::Uniform4f(location, x, y, z, w),
                UniformValue::Mat4(columns) => {
                    gl::UniformMatrix4fv(location, 1, gl::FALSE, columns.as_ptr())
                }
            }
        }
    }

    fn create_buffer(&self) -> Result<GLuint, GlError> {
        self.assert_context();

        let mut buffer = 0;
        unsafe {
            gl::GenBuffers(1, &mut buffer);
        }

        match buffer {
            0 => Err(GlError("failed to create buffer".into())),
            buffer => Ok(buffer),
        }
    }

    fn bind_buffer(&self, target: BufferType, buffer: Option<GLuint>) {
        self.assert_context();

        unsafe {
            gl::BindBuffer(buffer_target(target), buffer.unwrap_or(0));
        }
    }

    fn buffer_data(&self, target: BufferType, data: &[u8]) {
        self.assert_context();

        unsafe {
            gl::BufferData(
                buffer_target(target),
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            );
        }
    }

    fn delete_buffer(&self, buffer: GLuint) {
        self.assert_context();

        unsafe {
            gl::DeleteBuffers(1, &buffer);
        }
    }

    fn create_vertex_array(&self) -> Result<GLuint, GlError> {
        self.assert_context();

        let mut vertex_array = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vertex_array);
        }

        match vertex_array {
            0 => Err(GlError("failed to create vertex array".into())),
            vertex_array => Ok(vertex_array),
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<GLuint>) {
        self.assert_context();

        unsafe {
            gl::BindVertexArray(vertex_array.unwrap_or(0));
        }
    }

    fn vertex_attribute(&self, attribute: VertexAttribute) {
        self.assert_context();

        let VertexAttribute {
            index,
            element,
            stride,
            offset,
        } = attribute;

        let ty = match element.kind {
            AttributeKind::Float => gl::FLOAT,
            AttributeKind::UnsignedInt => gl::UNSIGNED_INT,
            AttributeKind::UnsignedByte => gl::UNSIGNED_BYTE,
        };
        let normalized = if element.normalized {
            gl::TRUE
        } else {
            gl::FALSE
        };

        unsafe {
            gl::EnableVertexAttribArray(index);
            gl::VertexAttribPointer(
                index,
                element.count as GLint,
                ty,
                normalized,
                stride as GLsizei,
                offset as *const c_void,
            );
        }
    }

    fn delete_vertex_array(&self, vertex_array: GLuint) {
        self.assert_context();

        unsafe {
            gl::DeleteVertexArrays(1, &vertex_array);
        }
    }

    fn create_texture(&self) -> Result<GLuint, GlError> {
        self.assert_context();

        let mut texture = 0;
        unsafe {
            gl::GenTextures(1, &mut texture);
        }

        match texture {
            0 => Err(GlError("failed to create texture".into())),
            texture => Ok(texture),
        }
    }

    fn write_texture(&self, texture_write: TextureWrite<'_, Self>) {
        self.assert_context();

        let TextureWrite {
            texture,
            size: (width, height),
            data,
        } = texture_write;
        assert_eq!(data.len(), width as usize * height as usize * 4);

        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, texture);

            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as _);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as _);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as _);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as _);

            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA8 as _,
                width as _,
                height as _,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                data.as_ptr() as *const c_void,
            );

            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
    }

    fn bind_texture(&self, slot: u32, texture: Option<GLuint>) {
        self.assert_context();

        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + slot);
            gl::BindTexture(gl::TEXTURE_2D, texture.unwrap_or(0));
        }
    }

    fn delete_texture(&self, texture: GLuint) {
        self.assert_context();

        unsafe {
            gl::DeleteTextures(1, &texture);
        }
    }

    fn set_clear_color(&self, [r, g, b, a]: [f32; 4]) {
        self.assert_context();

        unsafe {
            gl::ClearColor(r, g, b, a);
        }
    }

    fn clear(&self) {
        self.assert_context();

        unsafe {
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    fn enable_blending(&self) {
        self.assert_context();

        unsafe {
            gl::Enable(gl::BLEND);
            gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
        }
    }

    fn viewport(&self, width: u32, height: u32) {
        self.assert_context();

        unsafe {
            gl::Viewport(0, 0, width as GLsizei, height as GLsizei);
        }
    }

    fn draw_indexed(&self, count: usize) {
        self.assert_context();

        unsafe {
            gl::DrawElements(
                gl::TRIANGLES,
                count as GLsizei,
                gl::UNSIGNED_INT,
                ptr::null(),
            );
        }
    }

    fn pop_error(&self) -> Option<DriverError> {
        self.assert_context();

        DriverError::from_code(unsafe { gl::GetError() })
    }
}

impl GlContext {
    fn program_flag(&self, program: GLuint, flag: GLenum) -> bool {
        self.assert_context();

        let mut status = gl::FALSE as GLint;
        unsafe {
            gl::GetProgramiv(program, flag, &mut status);
        }

        status != gl::FALSE as GLint
    }
}

fn buffer_target(target: BufferType) -> GLenum {
    match target {
        BufferType::Vertex => gl::ARRAY_BUFFER,
        BufferType::Index => gl::ELEMENT_ARRAY_BUFFER,
    }
}

/// Read an info log of `len` bytes, including the NUL terminator.
fn read_info_log(len: GLint, read: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar)) -> String {
    if len <= 0 {
        return String::new();
    }

    let mut buffer = vec![0u8; len as usize];
    let mut written = 0;
    read(len, &mut written, buffer.as_mut_ptr() as *mut GLchar);
    buffer.truncate(written.max(0) as usize);

    String::from_utf8_lossy(&buffer).into_owned()
}

extern "system" fn debug_callback(
    source: GLenum,
    ty: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    _user_param: *mut c_void,
) {
    let source = match source {
        gl::DEBUG_SOURCE_API => "API",
        gl::DEBUG_SOURCE_WINDOW_SYSTEM => "Window System",
        gl::DEBUG_SOURCE_SHADER_COMPILER => "Shader Compiler",
        gl::DEBUG_SOURCE_THIRD_PARTY => "Third Party",
        gl::DEBUG_SOURCE_APPLICATION => "Application",
        gl::DEBUG_SOURCE_OTHER => "Other",
        _ => "Unknown",
    };

    let ty = match ty {
        gl::DEBUG_TYPE_ERROR => "Error",
        gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "Deprecated Behavior",
        gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "Undefined Behavior",
        gl::DEBUG_TYPE_PORTABILITY => "Portability",
        gl::DEBUG_TYPE_PERFORMANCE => "Performance",
        gl::DEBUG_TYPE_MARKER => "Marker",
        gl::DEBUG_TYPE_OTHER => "Other",
        _ => "Unknown",
    };

    let message = if message.is_null() || length <= 0 {
        "".into()
    } else {
        // SAFETY: The driver passes `length` valid bytes.
        let slice = unsafe { std::slice::from_raw_parts(message as *const u8, length as usize) };
        String::from_utf8_lossy(slice)
    };

    match severity {
        gl::DEBUG_SEVERITY_HIGH => {
            tracing::error!("{ty}-{id} ({source}): {message}");
        }
        gl::DEBUG_SEVERITY_MEDIUM => {
            tracing::warn!("{ty}-{id} ({source}): {message}");
        }
        gl::DEBUG_SEVERITY_LOW => {
            tracing::info!("{ty}-{id} ({source}): {message}");
        }
        gl::DEBUG_SEVERITY_NOTIFICATION => {
            tracing::debug!("{ty}-{id} ({source}): {message}");
        }
        _ => (),
    };
}
