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

//! Small self-contained demos and a menu to switch between them.

mod clear_color;
mod textured_quads;

pub use clear_color::ClearColor;
pub use textured_quads::TexturedQuads;

use crate::error::{Error, Result};
use crate::gpu_backend::GpuContext;
use crate::renderer::Renderer;

use std::fmt;
use std::rc::Rc;

/// A demo that is updated and drawn once per frame.
pub trait Scene<C: GpuContext + ?Sized> {
    /// Advance the scene by `delta` seconds.
    fn on_update(&mut self, _delta: f32) {}

    /// Draw the scene.
    fn on_render(&mut self, renderer: &Renderer<C>) -> Result<()>;

    /// React to an arrow key.
    fn on_direction(&mut self, _direction: Direction) {}
}

/// One of the four arrow keys.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards negative x.
    Left,

    /// Towards positive x.
    Right,

    /// Towards positive y.
    Up,

    /// Towards negative y.
    Down,
}

impl Direction {
    /// The unit step in this direction, with y pointing up.
    pub fn offset(self) -> (f32, f32) {
        match self {
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
            Direction::Up => (0.0, 1.0),
            Direction::Down => (0.0, -1.0),
        }
    }
}

type Factory<C> = Box<dyn Fn(&Rc<C>) -> Result<Box<dyn Scene<C>>>>;

/// A list of named scenes, at most one of which is running.
///
/// Scenes are created when they are selected and dropped, along with all of their GPU
/// resources, when another one is selected or the menu is reopened.
pub struct SceneMenu<C: GpuContext + ?Sized + 'static> {
    context: Rc<C>,
    entries: Vec<(String, Factory<C>)>,
    current: Option<(usize, Box<dyn Scene<C>>)>,
}

impl<C: GpuContext + ?Sized + 'static> fmt::Debug for SceneMenu<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneMenu")
            .field("scenes", &self.names().collect::<Vec<_>>())
            .field("current", &self.current_name())
            .finish()
    }
}

impl<C: GpuContext + ?Sized + 'static> SceneMenu<C> {
    /// Create an empty menu.
    pub fn new(context: Rc<C>) -> Self {
        Self {
            context,
            entries: Vec::new(),
            current: None,
        }
    }

    /// Add a scene to the menu.
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register<S, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        S: Scene<C> + 'static,
        F: Fn(&Rc<C>) -> Result<S> + 'static,
    {
        let name = name.into();
        let factory: Factory<C> =
            Box::new(move |context| Ok(Box::new(factory(context)?) as Box<dyn Scene<C>>));

        match self.entries.iter_mut().find(|(entry, _)| *entry == name) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((name, factory)),
        }

        self
    }

    /// The names of all registered scenes, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Start the scene registered under `name`.
    ///
    /// If the scene fails to build, the running scene is kept.
    pub fn select(&mut self, name: &str) -> Result<()> {
        let index = self
            .entries
            .iter()
            .position(|(entry, _)| entry == name)
            .ok_or_else(|| Error::UnknownScene(name.to_owned()))?;

        let scene = (self.entries[index].1)(&self.context)?;
        tracing::info!("switched to scene `{name}`");
        self.current = Some((index, scene));
        Ok(())
    }

    /// Stop the running scene and return to the menu.
    pub fn back(&mut self) {
        if let Some(name) = self.current_name() {
            tracing::info!("leaving scene `{name}`");
        }

        self.current = None;
    }

    /// The name of the running scene.
    pub fn current_name(&self) -> Option<&str> {
        self.current
            .as_ref()
            .map(|(index, _)| self.entries[*index].0.as_str())
    }

    /// Advance the running scene.
    pub fn update(&mut self, delta: f32) {
        if let Some((_, scene)) = &mut self.current {
            scene.on_update(delta);
        }
    }

    /// Forward an arrow key to the running scene.
    pub fn direction(&mut self, direction: Direction) {
        if let Some((_, scene)) = &mut self.current {
            scene.on_direction(direction);
        }
    }

    /// Draw the running scene, or a black screen while in the menu.
    pub fn render(&mut self, renderer: &Renderer<C>) -> Result<()> {
        match &mut self.current {
            Some((_, scene)) => scene.on_render(renderer),
            None => {
                renderer.set_clear_color([0.0, 0.0, 0.0, 1.0]);
                renderer.clear();
                Ok(())
            }
        }
    }
}
