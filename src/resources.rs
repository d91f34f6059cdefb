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

//! Defines useful resource wrappers.

use crate::error::{Error, Result};
use crate::gpu_backend::{
    AttributeKind, BufferType, GpuContext, LayoutElement, TextureWrite, VertexAttribute,
};

use arrayvec::ArrayVec;
use image::RgbaImage;

use std::cell::Cell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// The most attributes a vertex layout can have.
const MAX_ATTRIBUTES: usize = 16;

macro_rules! define_resource_wrappers {
    ($($(#[$meta:meta])* $name:ident($res:ident, $delete:ident)),* $(,)?) => {
        $(
            $(#[$meta])*
            pub struct $name<C: GpuContext + ?Sized> {
                context: Rc<C>,
                resource: C::$res,
            }

            impl<C: GpuContext + ?Sized> $name<C> {
                /// The underlying handle.
                pub fn resource(&self) -> C::$res {
                    self.resource
                }
            }

            impl<C: GpuContext + ?Sized> Drop for $name<C> {
                fn drop(&mut self) {
                    tracing::trace!("deleting {} {:?}", stringify!($name), self.resource);
                    self.context.$delete(self.resource);
                }
            }
        )*
    };
}

define_resource_wrappers! {
    /// A buffer of vertex data.
    VertexBuffer(Buffer, delete_buffer),

    /// A vertex array, which ties vertex buffers to a layout.
    VertexArray(VertexArray, delete_vertex_array),
}

impl<C: GpuContext + ?Sized> fmt::Debug for VertexBuffer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

impl<C: GpuContext + ?Sized> VertexBuffer<C> {
    /// Create a buffer holding `vertices`.
    ///
    /// The buffer is left bound.
    pub fn new<T: bytemuck::Pod>(context: &Rc<C>, vertices: &[T]) -> Result<Self> {
        let resource = context.create_buffer().map_err(Error::backend)?;
        let buffer = Self {
            context: context.clone(),
            resource,
        };

        buffer.bind();
        context.buffer_data(BufferType::Vertex, bytemuck::cast_slice(vertices));

        Ok(buffer)
    }

    /// Bind this buffer as the vertex buffer.
    pub fn bind(&self) {
        self.context
            .bind_buffer(BufferType::Vertex, Some(self.resource));
    }

    /// Unbind the vertex buffer.
    pub fn unbind(&self) {
        self.context.bind_buffer(BufferType::Vertex, None);
    }
}

/// A buffer of `u32` indices into a vertex buffer.
pub struct IndexBuffer<C: GpuContext + ?Sized> {
    context: Rc<C>,
    resource: C::Buffer,
    count: usize,
}

impl<C: GpuContext + ?Sized> fmt::Debug for IndexBuffer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBuffer")
            .field("resource", &self.resource)
            .field("count", &self.count)
            .finish()
    }
}

impl<C: GpuContext + ?Sized> IndexBuffer<C> {
    /// Create a buffer holding `indices`.
    ///
    /// The buffer is left bound.
    pub fn new(context: &Rc<C>, indices: &[u32]) -> Result<Self> {
        let resource = context.create_buffer().map_err(Error::backend)?;
        let buffer = Self {
            context: context.clone(),
            resource,
            count: indices.len(),
        };

        buffer.bind();
        context.buffer_data(BufferType::Index, bytemuck::cast_slice(indices));

        Ok(buffer)
    }

    /// Bind this buffer as the index buffer.
    pub fn bind(&self) {
        self.context.bind_buffer(BufferType::Index, Some(self.resource));
    }

    /// Unbind the index buffer.
    pub fn unbind(&self) {
        self.context.bind_buffer(BufferType::Index, None);
    }

    /// The number of indices in this buffer.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The underlying handle.
    pub fn resource(&self) -> C::Buffer {
        self.resource
    }
}

impl<C: GpuContext + ?Sized> Drop for IndexBuffer<C> {
    fn drop(&mut self) {
        self.context.delete_buffer(self.resource);
    }
}

/// A Rust type that can be used as a vertex attribute component.
pub trait LayoutType: bytemuck::Pod {
    /// The matching attribute kind.
    const KIND: AttributeKind;
}

impl LayoutType for f32 {
    const KIND: AttributeKind = AttributeKind::Float;
}

impl LayoutType for u32 {
    const KIND: AttributeKind = AttributeKind::UnsignedInt;
}

impl LayoutType for u8 {
    const KIND: AttributeKind = AttributeKind::UnsignedByte;
}

/// The layout of one vertex inside of a vertex buffer.
///
/// Elements are numbered in the order they are pushed, which is the order of the
/// `layout(location = N)` inputs of the vertex shader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexBufferLayout {
    elements: ArrayVec<LayoutElement, MAX_ATTRIBUTES>,
    stride: usize,
}

impl VertexBufferLayout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `count` components of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if the layout already has sixteen elements.
    pub fn push<T: LayoutType>(&mut self, count: u32) -> &mut Self {
        let element = LayoutElement {
            kind: T::KIND,
            count,
            normalized: T::KIND.normalized(),
        };

        self.elements.push(element);
        self.stride += element.size();
        self
    }

    /// The elements of this layout.
    pub fn elements(&self) -> &[LayoutElement] {
        &self.elements
    }

    /// The size of one vertex, in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Iterate over the attributes this layout describes.
    pub fn attributes(&self) -> impl Iterator<Item = VertexAttribute> + '_ {
        let stride = self.stride;

        self.elements
            .iter()
            .enumerate()
            .scan(0, move |offset, (index, element)| {
                let attribute = VertexAttribute {
                    index: index as u32,
                    element: *element,
                    stride,
                    offset: *offset,
                };

                *offset += element.size();
                Some(attribute)
            })
    }
}

impl<C: GpuContext + ?Sized> fmt::Debug for VertexArray<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexArray")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

impl<C: GpuContext + ?Sized> VertexArray<C> {
    /// Create an empty vertex array.
    pub fn new(context: &Rc<C>) -> Result<Self> {
        let resource = context.create_vertex_array().map_err(Error::backend)?;
        Ok(Self {
            context: context.clone(),
            resource,
        })
    }

    /// Read the attributes described by `layout` from `buffer`.
    ///
    /// Leaves this array and `buffer` bound.
    pub fn add_buffer(&self, buffer: &VertexBuffer<C>, layout: &VertexBufferLayout) {
        self.bind();
        buffer.bind();

        for attribute in layout.attributes() {
            self.context.vertex_attribute(attribute);
        }
    }

    /// Make this the current vertex array.
    pub fn bind(&self) {
        self.context.bind_vertex_array(Some(self.resource));
    }

    /// Unbind the current vertex array.
    pub fn unbind(&self) {
        self.context.bind_vertex_array(None);
    }
}

/// A two-dimensional RGBA texture.
pub struct Texture<C: GpuContext + ?Sized> {
    context: Rc<C>,
    resource: C::Texture,
    size: (u32, u32),

    /// The unit this texture was last bound to.
    slot: Cell<Option<u32>>,
}

impl<C: GpuContext + ?Sized> fmt::Debug for Texture<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("resource", &self.resource)
            .field("size", &self.size)
            .finish()
    }
}

impl<C: GpuContext + ?Sized> Texture<C> {
    /// Load an image file into a new texture.
    pub fn from_path(context: &Rc<C>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| Error::Image {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgba8();

        tracing::debug!(
            "loaded {}x{} image from {}",
            image.width(),
            image.height(),
            path.display()
        );
        Self::from_image(context, &image)
    }

    /// Upload an image into a new texture.
    ///
    /// Images store their top row first while texture coordinates start at the bottom, so the
    /// rows are flipped on the way.
    pub fn from_image(context: &Rc<C>, image: &RgbaImage) -> Result<Self> {
        let resource = context.create_texture().map_err(Error::backend)?;
        let texture = Self {
            context: context.clone(),
            resource,
            size: image.dimensions(),
            slot: Cell::new(None),
        };

        let flipped = image::imageops::flip_vertical(image);
        context.write_texture(TextureWrite {
            texture: resource,
            size: texture.size,
            data: flipped.as_raw(),
        });

        Ok(texture)
    }

    /// Bind this texture to a texture unit.
    pub fn bind(&self, slot: u32) {
        self.context.bind_texture(slot, Some(self.resource));
        self.slot.set(Some(slot));
    }

    /// Unbind the unit this texture was last bound to.
    pub fn unbind(&self) {
        if let Some(slot) = self.slot.take() {
            self.context.bind_texture(slot, None);
        }
    }

    /// The width, in pixels.
    pub fn width(&self) -> u32 {
        self.size.0
    }

    /// The height, in pixels.
    pub fn height(&self) -> u32 {
        self.size.1
    }

    /// The underlying handle.
    pub fn resource(&self) -> C::Texture {
        self.resource
    }
}

impl<C: GpuContext + ?Sized> Drop for Texture<C> {
    fn drop(&mut self) {
        self.context.delete_texture(self.resource);
    }
}
