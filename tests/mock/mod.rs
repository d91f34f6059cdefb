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

//! An in-memory `GpuContext` that records what it is asked to do.
//!
//! Shaders "compile" when their source contains a `main` function, and a linked program's
//! uniforms are the `uniform` declarations of its stages.

#![allow(dead_code)]

use quadkit::{
    BufferType, DriverError, GpuContext, Stage, TextureWrite, UniformValue, VertexAttribute,
};

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

pub const COMPILE_LOG: &str = "0:1(1): error: syntax error, unexpected end of file";
pub const LINK_LOG: &str = "error: vertex output `v_TexCoord` is not read by the fragment stage";
pub const VALIDATE_LOG: &str = "error: sampler uniforms point at different texture types";

#[derive(Debug)]
pub struct MockError(pub &'static str);

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for MockError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MockLocation {
    pub program: u32,
    pub index: usize,
}

#[derive(Debug)]
pub struct MockShader {
    pub stage: Stage,
    pub source: String,
    pub compiled: bool,
}

#[derive(Debug, Default)]
pub struct MockProgram {
    pub attached: Vec<u32>,
    pub linked: bool,
    pub validated: bool,
    pub uniforms: Vec<String>,
}

#[derive(Debug)]
pub struct UniformWrite {
    pub current_program: Option<u32>,
    pub name: String,
    pub value: UniformValue,
}

#[derive(Debug)]
pub struct Draw {
    pub program: Option<u32>,
    pub vertex_array: Option<u32>,
    pub index_buffer: Option<u32>,
    pub count: usize,
    pub textures: HashMap<u32, u32>,
}

#[derive(Debug, Default)]
pub struct State {
    next_handle: u32,

    pub shaders: HashMap<u32, MockShader>,
    pub programs: HashMap<u32, MockProgram>,
    pub buffers: HashMap<u32, Vec<u8>>,
    pub vertex_arrays: HashMap<u32, Vec<VertexAttribute>>,
    pub textures: HashMap<u32, ((u32, u32), Vec<u8>)>,

    pub bound_buffers: HashMap<BufferType, u32>,
    pub bound_vertex_array: Option<u32>,
    pub bound_textures: HashMap<u32, u32>,
    pub current_program: Option<u32>,

    pub uniform_queries: Vec<(u32, String)>,
    pub uniform_writes: Vec<UniformWrite>,
    pub draws: Vec<Draw>,
    pub clear_color: [f32; 4],
    pub clears: usize,
    pub blending: bool,
    pub viewport: (u32, u32),
    pub errors: VecDeque<DriverError>,

    pub fail_link: bool,
    pub fail_validate: bool,
    pub fail_create: bool,
}

impl State {
    fn next_handle(&mut self) -> Result<u32, MockError> {
        if self.fail_create {
            return Err(MockError("out of handles"));
        }

        self.next_handle += 1;
        Ok(self.next_handle)
    }

    /// Number of driver objects that have been created and not deleted yet.
    pub fn live_objects(&self) -> usize {
        self.shaders.len()
            + self.programs.len()
            + self.buffers.len()
            + self.vertex_arrays.len()
            + self.textures.len()
    }

    pub fn queries_for(&self, name: &str) -> usize {
        self.uniform_queries.iter().filter(|(_, n)| n == name).count()
    }
}

#[derive(Debug, Default)]
pub struct MockContext {
    state: RefCell<State>,
}

impl MockContext {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn state(&self) -> Ref<'_, State> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, State> {
        self.state.borrow_mut()
    }

    pub fn push_error(&self, error: DriverError) {
        self.state_mut().errors.push_back(error);
    }
}

fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("uniform "))
        .filter_map(|line| line.split_whitespace().last())
        .map(|name| name.trim_end_matches(';').to_owned())
}

impl GpuContext for MockContext {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = MockLocation;
    type Buffer = u32;
    type VertexArray = u32;
    type Texture = u32;
    type Error = MockError;

    fn create_shader(&self, stage: Stage) -> Result<u32, MockError> {
        let mut state = self.state_mut();
        let handle = state.next_handle()?;
        state.shaders.insert(
            handle,
            MockShader {
                stage,
                source: String::new(),
                compiled: false,
            },
        );
        Ok(handle)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.state_mut().shaders.get_mut(&shader).unwrap().source = source.to_owned();
    }

    fn compile_shader(&self, shader: u32) {
        let mut state = self.state_mut();
        let shader = state.shaders.get_mut(&shader).unwrap();
        shader.compiled = shader.source.contains("void main()");
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state().shaders[&shader].compiled
    }

    fn shader_info_log(&self, shader: u32) -> String {
        if self.shader_compile_status(shader) {
            String::new()
        } else {
            COMPILE_LOG.to_owned()
        }
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state_mut();
        assert!(
            state.programs.values().all(|p| !p.attached.contains(&shader)),
            "shader {shader} deleted while still attached"
        );
        state
            .shaders
            .remove(&shader)
            .unwrap_or_else(|| panic!("deleted unknown shader {shader}"));
    }

    fn create_program(&self) -> Result<u32, MockError> {
        let mut state = self.state_mut();
        let handle = state.next_handle()?;
        state.programs.insert(handle, MockProgram::default());
        Ok(handle)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state_mut();
        assert!(state.shaders.contains_key(&shader));
        state.programs.get_mut(&program).unwrap().attached.push(shader);
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state_mut();
        let program = state.programs.get_mut(&program).unwrap();
        program.attached.retain(|&s| s != shader);
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state_mut();
        let state = &mut *state;
        let entry = state.programs.get_mut(&program).unwrap();

        let stages = entry
            .attached
            .iter()
            .map(|s| &state.shaders[s])
            .collect::<Vec<_>>();
        let complete = stages.len() == 2
            && stages.iter().all(|s| s.compiled)
            && stages.iter().any(|s| s.stage == Stage::Vertex)
            && stages.iter().any(|s| s.stage == Stage::Fragment);

        entry.linked = complete && !state.fail_link;
        entry.uniforms = if entry.linked {
            stages
                .iter()
                .flat_map(|s| declared_uniforms(&s.source))
                .collect()
        } else {
            Vec::new()
        };
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state().programs[&program].linked
    }

    fn validate_program(&self, program: u32) {
        let mut state = self.state_mut();
        let fail = state.fail_validate;
        let program = state.programs.get_mut(&program).unwrap();
        program.validated = program.linked && !fail;
    }

    fn program_validate_status(&self, program: u32) -> bool {
        self.state().programs[&program].validated
    }

    fn program_info_log(&self, program: u32) -> String {
        let state = self.state();
        let program = &state.programs[&program];
        if !program.linked {
            LINK_LOG.to_owned()
        } else if !program.validated {
            VALIDATE_LOG.to_owned()
        } else {
            String::new()
        }
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state_mut();
        state
            .programs
            .remove(&program)
            .unwrap_or_else(|| panic!("deleted unknown program {program}"));
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<u32>) {
        let mut state = self.state_mut();
        if let Some(program) = program {
            assert!(state.programs[&program].linked, "used an unlinked program");
        }
        state.current_program = program;
    }

    fn current_program(&self) -> Option<u32> {
        self.state().current_program
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<MockLocation> {
        let mut state = self.state_mut();
        state.uniform_queries.push((program, name.to_owned()));
        let index = state.programs[&program]
            .uniforms
            .iter()
            .position(|uniform| uniform == name);
        index.map(|index| MockLocation { program, index })
    }

    fn set_uniform(&self, location: &MockLocation, value: UniformValue) {
        let mut state = self.state_mut();
        let name = state.programs[&location.program].uniforms[location.index].clone();
        let current_program = state.current_program;
        state.uniform_writes.push(UniformWrite {
            current_program,
            name,
            value,
        });
    }

    fn create_buffer(&self) -> Result<u32, MockError> {
        let mut state = self.state_mut();
        let handle = state.next_handle()?;
        state.buffers.insert(handle, Vec::new());
        Ok(handle)
    }

    fn bind_buffer(&self, target: BufferType, buffer: Option<u32>) {
        let mut state = self.state_mut();
        match buffer {
            Some(buffer) => state.bound_buffers.insert(target, buffer),
            None => state.bound_buffers.remove(&target),
        };
    }

    fn buffer_data(&self, target: BufferType, data: &[u8]) {
        let mut state = self.state_mut();
        let buffer = state.bound_buffers[&target];
        state.buffers.insert(buffer, data.to_vec());
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state_mut();
        state
            .buffers
            .remove(&buffer)
            .unwrap_or_else(|| panic!("deleted unknown buffer {buffer}"));
        state.bound_buffers.retain(|_, bound| *bound != buffer);
    }

    fn create_vertex_array(&self) -> Result<u32, MockError> {
        let mut state = self.state_mut();
        let handle = state.next_handle()?;
        state.vertex_arrays.insert(handle, Vec::new());
        Ok(handle)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.state_mut().bound_vertex_array = vertex_array;
    }

    fn vertex_attribute(&self, attribute: VertexAttribute) {
        let mut state = self.state_mut();
        let vertex_array = state.bound_vertex_array.expect("no vertex array bound");
        assert!(state.bound_buffers.contains_key(&BufferType::Vertex));
        state
            .vertex_arrays
            .get_mut(&vertex_array)
            .unwrap()
            .push(attribute);
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state_mut();
        state
            .vertex_arrays
            .remove(&vertex_array)
            .unwrap_or_else(|| panic!("deleted unknown vertex array {vertex_array}"));
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
    }

    fn create_texture(&self) -> Result<u32, MockError> {
        let mut state = self.state_mut();
        let handle = state.next_handle()?;
        state.textures.insert(handle, ((0, 0), Vec::new()));
        Ok(handle)
    }

    fn write_texture(&self, texture_write: TextureWrite<'_, Self>) {
        let TextureWrite {
            texture,
            size,
            data,
        } = texture_write;
        assert_eq!(data.len(), (size.0 * size.1 * 4) as usize);
        self.state_mut()
            .textures
            .insert(texture, (size, data.to_vec()));
    }

    fn bind_texture(&self, slot: u32, texture: Option<u32>) {
        let mut state = self.state_mut();
        match texture {
            Some(texture) => state.bound_textures.insert(slot, texture),
            None => state.bound_textures.remove(&slot),
        };
    }

    fn delete_texture(&self, texture: u32) {
        let mut state = self.state_mut();
        state
            .textures
            .remove(&texture)
            .unwrap_or_else(|| panic!("deleted unknown texture {texture}"));
        state.bound_textures.retain(|_, bound| *bound != texture);
    }

    fn set_clear_color(&self, color: [f32; 4]) {
        self.state_mut().clear_color = color;
    }

    fn clear(&self) {
        self.state_mut().clears += 1;
    }

    fn enable_blending(&self) {
        self.state_mut().blending = true;
    }

    fn viewport(&self, width: u32, height: u32) {
        self.state_mut().viewport = (width, height);
    }

    fn draw_indexed(&self, count: usize) {
        let mut state = self.state_mut();
        let draw = Draw {
            program: state.current_program,
            vertex_array: state.bound_vertex_array,
            index_buffer: state.bound_buffers.get(&BufferType::Index).copied(),
            count,
            textures: state.bound_textures.clone(),
        };
        state.draws.push(draw);
    }

    fn pop_error(&self) -> Option<DriverError> {
        self.state_mut().errors.pop_front()
    }
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` and collect everything it logs.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    (result, logs)
}
