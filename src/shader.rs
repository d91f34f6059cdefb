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

//! Compiling stages and linking them into programs.

use crate::error::{Error, Result};
use crate::gpu_backend::{GpuContext, Stage, UniformValue};
use crate::source::ShaderSource;

use glam::Mat4;
use hashbrown::HashMap;

use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// A shader stage that compiled successfully.
///
/// The shader object is deleted when this is dropped. Drivers keep the code alive for as long
/// as a program it was linked into exists, so this can be dropped right after linking.
pub struct CompiledStage<C: GpuContext + ?Sized> {
    context: Rc<C>,
    shader: C::Shader,
    stage: Stage,
}

impl<C: GpuContext + ?Sized> fmt::Debug for CompiledStage<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledStage")
            .field("shader", &self.shader)
            .field("stage", &self.stage)
            .finish()
    }
}

impl<C: GpuContext + ?Sized> CompiledStage<C> {
    /// Compile one stage from its source code.
    ///
    /// On failure the driver's log is reported through `tracing` and returned in
    /// [`Error::Compile`].
    pub fn compile(context: &Rc<C>, stage: Stage, source: &str) -> Result<Self> {
        let shader = context.create_shader(stage).map_err(Error::backend)?;

        // Own the shader right away so that it is deleted on failure.
        let compiled = Self {
            context: context.clone(),
            shader,
            stage,
        };

        context.shader_source(shader, source);
        context.compile_shader(shader);

        if !context.shader_compile_status(shader) {
            let log = context.shader_info_log(shader);
            tracing::error!("failed to compile {stage} shader: {log}");
            return Err(Error::Compile { stage, log });
        }

        tracing::trace!("compiled {stage} shader {shader:?}");
        Ok(compiled)
    }

    /// The stage this shader implements.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The underlying shader handle.
    pub fn handle(&self) -> C::Shader {
        self.shader
    }
}

impl<C: GpuContext + ?Sized> Drop for CompiledStage<C> {
    fn drop(&mut self) {
        self.context.delete_shader(self.shader);
    }
}

/// A linked shader program.
///
/// The program remembers the location of every uniform it was asked about, including the ones
/// that do not exist, so each name reaches the driver at most once.
pub struct Program<C: GpuContext + ?Sized> {
    context: Rc<C>,
    program: C::Program,
    uniforms: HashMap<String, Option<C::UniformLocation>, ahash::RandomState>,
}

impl<C: GpuContext + ?Sized> fmt::Debug for Program<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("program", &self.program)
            .field("cached_uniforms", &self.uniforms.len())
            .finish()
    }
}

impl<C: GpuContext + ?Sized> Program<C> {
    /// Read a dual-section shader file and link it.
    pub fn from_path(context: &Rc<C>, path: impl AsRef<Path>) -> Result<Self> {
        Self::from_source(context, &ShaderSource::from_path(path)?)
    }

    /// Link the two stages of a [`ShaderSource`].
    pub fn from_source(context: &Rc<C>, source: &ShaderSource) -> Result<Self> {
        Self::link(context, source.vertex(), source.fragment())
    }

    /// Compile both stages, link them and validate the result.
    pub fn link(context: &Rc<C>, vertex: &str, fragment: &str) -> Result<Self> {
        let vertex = CompiledStage::compile(context, Stage::Vertex, vertex)?;
        let fragment = CompiledStage::compile(context, Stage::Fragment, fragment)?;

        let program = Self {
            program: context.create_program().map_err(Error::backend)?,
            context: context.clone(),
            uniforms: HashMap::with_hasher(ahash::RandomState::new()),
        };
        let handle = program.program;

        context.attach_shader(handle, vertex.shader);
        context.attach_shader(handle, fragment.shader);
        let _detach_shaders = CallOnDrop(|| {
            context.detach_shader(handle, vertex.shader);
            context.detach_shader(handle, fragment.shader);
        });

        context.link_program(handle);
        if !context.program_link_status(handle) {
            let log = context.program_info_log(handle);
            tracing::error!("failed to link shader program: {log}");
            return Err(Error::Link { log });
        }

        context.validate_program(handle);
        if !context.program_validate_status(handle) {
            let log = context.program_info_log(handle);
            tracing::error!("shader program failed validation: {log}");
            return Err(Error::Validate { log });
        }

        tracing::debug!("linked shader program {handle:?}");
        Ok(program)
    }

    /// The underlying program handle.
    pub fn handle(&self) -> C::Program {
        self.program
    }

    /// Make this the current program.
    pub fn bind(&self) {
        self.context.use_program(Some(self.program));
    }

    /// Unbind whatever program is current.
    pub fn unbind(&self) {
        self.context.use_program(None);
    }

    /// Get the location of a uniform.
    ///
    /// Returns `None` if the program has no uniform with this name. Uniforms that are never
    /// used by the shader code are usually removed by the driver and are missing as well.
    pub fn uniform_location(&mut self, name: &str) -> Option<C::UniformLocation> {
        if let Some(location) = self.uniforms.get(name) {
            return location.clone();
        }

        let location = self.context.uniform_location(self.program, name);
        if location.is_none() {
            tracing::warn!("uniform `{name}` does not exist in program {:?}", self.program);
        }

        self.uniforms.insert(name.to_owned(), location.clone());
        location
    }

    /// Bind this program and write a value into one of its uniforms.
    ///
    /// Writes to missing uniforms are dropped.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.bind();

        if let Some(location) = self.uniform_location(name) {
            self.context.set_uniform(&location, value);
        }
    }

    /// Set an `int` or `sampler2D` uniform.
    pub fn set_uniform_1i(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    /// Set a `float` uniform.
    pub fn set_uniform_1f(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    /// Set a `vec4` uniform.
    pub fn set_uniform_4f(&mut self, name: &str, v0: f32, v1: f32, v2: f32, v3: f32) {
        self.set_uniform(name, UniformValue::Vec4([v0, v1, v2, v3]));
    }

    /// Set a `mat4` uniform.
    pub fn set_uniform_mat4f(&mut self, name: &str, matrix: &Mat4) {
        self.set_uniform(name, UniformValue::Mat4(matrix.to_cols_array()));
    }
}

impl<C: GpuContext + ?Sized> Drop for Program<C> {
    fn drop(&mut self) {
        self.context.delete_program(self.program);
    }
}

struct CallOnDrop<F: FnMut()>(F);

impl<F: FnMut()> Drop for CallOnDrop<F> {
    fn drop(&mut self) {
        (self.0)();
    }
}
