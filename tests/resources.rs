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


//! Buffers, vertex arrays, textures and the renderer.

mod mock;

use mock::{capture_logs, MockContext};
use quadkit::{
    clear_errors, log_errors, AttributeKind, BufferType, DriverError, Error, IndexBuffer,
    LayoutElement, Program, Renderer, Texture, VertexArray, VertexAttribute, VertexBuffer,
    VertexBufferLayout,
};

use image::{Rgba, RgbaImage};

const VERTEX: &str = "#version 330 core
layout(location = 0) in vec4 position;
void main() {
    gl_Position = position;
}
";

const FRAGMENT: &str = "#version 330 core
layout(location = 0) out vec4 color;
void main() {
    color = vec4(1.0);
}
";

#[test]
fn vertex_buffer_uploads_its_vertices() {
    let context = MockContext::new();
    let vertices = [[1.0f32, 2.0], [3.0, 4.0]];

    let buffer = VertexBuffer::new(&context, &vertices).unwrap();

    let state = context.state();
    assert_eq!(
        state.buffers[&buffer.resource()],
        bytemuck::cast_slice::<[f32; 2], u8>(&vertices)
    );
    assert_eq!(state.bound_buffers[&BufferType::Vertex], buffer.resource());
}

#[test]
fn index_buffer_counts_its_indices() {
    let context = MockContext::new();

    let buffer = IndexBuffer::new(&context, &[0, 1, 2, 2, 3, 0]).unwrap();

    assert_eq!(buffer.count(), 6);
    assert_eq!(context.state().buffers[&buffer.resource()].len(), 6 * 4);

    buffer.unbind();
    assert!(!context
        .state()
        .bound_buffers
        .contains_key(&BufferType::Index));
}

#[test]
fn vertex_array_records_the_layout() {
    let context = MockContext::new();
    let vertex_array = VertexArray::new(&context).unwrap();
    let buffer = VertexBuffer::new(&context, &[0.0f32; 16]).unwrap();

    let mut layout = VertexBufferLayout::new();
    layout.push::<f32>(2).push::<f32>(2);
    vertex_array.add_buffer(&buffer, &layout);

    let element = LayoutElement {
        kind: AttributeKind::Float,
        count: 2,
        normalized: false,
    };
    assert_eq!(
        context.state().vertex_arrays[&vertex_array.resource()],
        [
            VertexAttribute {
                index: 0,
                element,
                stride: 16,
                offset: 0,
            },
            VertexAttribute {
                index: 1,
                element,
                stride: 16,
                offset: 8,
            },
        ]
    );
}

#[test]
fn textures_are_uploaded_bottom_row_first() {
    let context = MockContext::new();
    let red = Rgba([0xff, 0, 0, 0xff]);
    let blue = Rgba([0, 0, 0xff, 0xff]);
    let image = RgbaImage::from_fn(3, 2, |_, y| if y == 0 { red } else { blue });

    let texture = Texture::from_image(&context, &image).unwrap();

    assert_eq!((texture.width(), texture.height()), (3, 2));

    let state = context.state();
    let (size, data) = &state.textures[&texture.resource()];
    assert_eq!(*size, (3, 2));
    assert_eq!(data[..4], blue.0);
    assert_eq!(data[data.len() - 4..], red.0);
}

#[test]
fn textures_bind_to_a_slot() {
    let context = MockContext::new();
    let texture = Texture::from_image(&context, &RgbaImage::new(1, 1)).unwrap();

    texture.bind(3);
    assert_eq!(context.state().bound_textures[&3], texture.resource());

    drop(texture);
    assert!(context.state().bound_textures.is_empty());
}

#[test]
fn unbinding_a_texture_clears_its_own_slot() {
    let context = MockContext::new();
    let texture = Texture::from_image(&context, &RgbaImage::new(1, 1)).unwrap();
    let other = Texture::from_image(&context, &RgbaImage::new(1, 1)).unwrap();

    other.bind(0);
    texture.bind(3);
    texture.unbind();

    let state = context.state();
    assert!(!state.bound_textures.contains_key(&3));
    assert_eq!(state.bound_textures[&0], other.resource());
}

#[test]
fn texture_from_png_file() {
    let context = MockContext::new();
    let path = std::env::temp_dir().join(format!("quadkit-{}-texture.png", std::process::id()));
    RgbaImage::from_pixel(4, 2, Rgba([0x10, 0x20, 0x30, 0xff]))
        .save(&path)
        .unwrap();

    let result = Texture::from_path(&context, &path);
    std::fs::remove_file(&path).unwrap();

    let texture = result.unwrap();
    assert_eq!((texture.width(), texture.height()), (4, 2));
}

#[test]
fn missing_texture_file_is_an_error() {
    let context = MockContext::new();
    let path = std::env::temp_dir().join("quadkit-does-not-exist.png");

    let error = Texture::from_path(&context, &path).unwrap_err();

    assert!(matches!(error, Error::Image { .. }));
    assert_eq!(context.state().live_objects(), 0);
}

#[test]
fn resources_are_released_on_drop() {
    let context = MockContext::new();

    {
        let _vertex_array = VertexArray::new(&context).unwrap();
        let _vertices = VertexBuffer::new(&context, &[0u8; 4]).unwrap();
        let _indices = IndexBuffer::new(&context, &[0]).unwrap();
        let _texture = Texture::from_image(&context, &RgbaImage::new(2, 2)).unwrap();
        assert_eq!(context.state().live_objects(), 4);
    }

    assert_eq!(context.state().live_objects(), 0);
}

#[test]
fn draw_binds_everything_it_needs() {
    let context = MockContext::new();
    let renderer = Renderer::new(context.clone());

    let vertex_array = VertexArray::new(&context).unwrap();
    let vertices = VertexBuffer::new(&context, &[0.0f32; 12]).unwrap();
    let mut layout = VertexBufferLayout::new();
    layout.push::<f32>(3);
    vertex_array.add_buffer(&vertices, &layout);
    let indices = IndexBuffer::new(&context, &[0, 1, 2, 2, 3, 0]).unwrap();
    let program = Program::link(&context, VERTEX, FRAGMENT).unwrap();

    vertex_array.unbind();
    indices.unbind();
    program.unbind();

    renderer.draw(&vertex_array, &indices, &program);

    let state = context.state();
    assert_eq!(state.draws.len(), 1);
    let draw = &state.draws[0];
    assert_eq!(draw.program, Some(program.handle()));
    assert_eq!(draw.vertex_array, Some(vertex_array.resource()));
    assert_eq!(draw.index_buffer, Some(indices.resource()));
    assert_eq!(draw.count, 6);
}

#[test]
fn renderer_forwards_frame_state() {
    let context = MockContext::new();
    let renderer = Renderer::new(context.clone());

    renderer.set_clear_color([0.1, 0.2, 0.3, 1.0]);
    renderer.clear();
    renderer.enable_blending();
    renderer.set_viewport(960, 540);

    let state = context.state();
    assert_eq!(state.clear_color, [0.1, 0.2, 0.3, 1.0]);
    assert_eq!(state.clears, 1);
    assert!(state.blending);
    assert_eq!(state.viewport, (960, 540));
}

#[test]
fn stale_errors_are_cleared_before_a_call() {
    let context = MockContext::new();
    let renderer = Renderer::new(context.clone());
    context.push_error(DriverError::InvalidValue);

    let ((), logs) = capture_logs(|| renderer.clear());

    assert!(context.state().errors.is_empty());
    assert!(!logs.contains("GL_INVALID_VALUE"), "logs: {logs}");
}

#[test]
fn errors_are_logged_with_their_call_site() {
    let context = MockContext::new();
    context.push_error(DriverError::InvalidEnum);
    context.push_error(DriverError::OutOfMemory);

    let (clean, logs) = capture_logs(|| log_errors(&*context, "glClear(0)", "frame.rs", 12));

    assert!(!clean);
    assert!(context.state().errors.is_empty());
    assert!(logs.contains("GL_INVALID_ENUM"), "logs: {logs}");
    assert!(logs.contains("GL_OUT_OF_MEMORY"), "logs: {logs}");
    assert!(logs.contains("`glClear(0)` at frame.rs:12"), "logs: {logs}");
}

#[test]
fn an_empty_queue_is_clean() {
    let context = MockContext::new();

    let (clean, logs) = capture_logs(|| log_errors(&*context, "glClear(0)", "frame.rs", 12));

    assert!(clean);
    assert!(logs.is_empty(), "logs: {logs}");
}

#[test]
fn clearing_gives_up_on_an_endless_queue() {
    let context = MockContext::new();
    for _ in 0..100 {
        context.push_error(DriverError::ContextLost);
    }

    clear_errors(&*context);

    assert_eq!(context.state().errors.len(), 36);
}

#[test]
fn gl_call_returns_the_value_of_the_call() {
    let context = MockContext::new();
    let program = Program::link(&context, VERTEX, FRAGMENT).unwrap();
    program.bind();

    let current = quadkit::gl_call!(context, quadkit::GpuContext::current_program(&*context));

    assert_eq!(current, Some(program.handle()));
}
