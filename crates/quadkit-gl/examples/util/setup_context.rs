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

// Window and context setup for the examples.

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SwapInterval, WindowSurface};

use glutin_winit::{DisplayBuilder, GlWindow};

use raw_window_handle::HasRawWindowHandle;

use tracing_subscriber::EnvFilter;

use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoopWindowTarget;
use winit::window::{Window, WindowBuilder};

use std::error::Error;
use std::ffi::{c_void, CString};
use std::mem;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Install the log subscriber. `RUST_LOG` overrides the default `info` level.
pub(crate) fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Settings for the demo window.
#[derive(Debug, Clone)]
pub(crate) struct DemoConfig {
    pub(crate) title: String,
    pub(crate) size: PhysicalSize<u32>,
    pub(crate) vsync: bool,

    /// Draw the quads with this shader file instead of the built-in one.
    pub(crate) shader: Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "quadkit sandbox".into(),
            size: PhysicalSize::new(960, 540),
            vsync: true,
            shader: None,
        }
    }
}

impl DemoConfig {
    /// The defaults, with the shader path taken from the first argument.
    pub(crate) fn from_args() -> Self {
        Self {
            shader: std::env::args_os().nth(1).map(PathBuf::from),
            ..Self::default()
        }
    }

    fn window_builder(&self) -> WindowBuilder {
        WindowBuilder::new()
            .with_title(&self.title)
            .with_inner_size(self.size)
    }
}

pub(crate) struct GlutinSetup {
    demo: DemoConfig,
    config: Config,
    window: Option<Window>,
    context: ContextType,
}

enum ContextType {
    NotCurrent(NotCurrentContext),
    Current {
        context: PossiblyCurrentContext,
        window: Window,
        surface: Surface<WindowSurface>,
    },
    Hole,
}

impl Default for ContextType {
    fn default() -> Self {
        Self::Hole
    }
}

impl GlutinSetup {
    pub(crate) fn new<T>(
        event_loop: &EventLoopWindowTarget<T>,
        demo: DemoConfig,
    ) -> Result<Self, Box<dyn Error>> {
        // Windows needs the window before the config.
        let window = if cfg!(windows) {
            Some(demo.window_builder())
        } else {
            None
        };

        let (window, config) = DisplayBuilder::new().with_window_builder(window).build(
            event_loop,
            ConfigTemplateBuilder::new(),
            |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    .unwrap()
            },
        )?;

        tracing::debug!("picked config {config:?}");

        let window_handle = window.as_ref().map(|w| w.raw_window_handle());
        let contexts = [
            ContextAttributesBuilder::new()
                .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
                .with_profile(GlProfile::Core)
                .build(window_handle),
            ContextAttributesBuilder::new()
                .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
                .build(window_handle),
        ];

        let display = config.display();
        let context = contexts
            .iter()
            .find_map(|attributes| unsafe { display.create_context(&config, attributes) }.ok())
            .ok_or("could not create an OpenGL 3.3 context")?;

        Ok(Self {
            demo,
            config,
            window,
            context: ContextType::NotCurrent(context),
        })
    }

    /// Create the window surface and make the context current on it.
    pub(crate) fn resume<T>(
        &mut self,
        target: &EventLoopWindowTarget<T>,
    ) -> Result<(), Box<dyn Error>> {
        let window = match self.window.take() {
            Some(window) => window,
            None => {
                glutin_winit::finalize_window(target, self.demo.window_builder(), &self.config)?
            }
        };

        let attributes = window.build_surface_attributes(Default::default());
        let surface = unsafe {
            self.config
                .display()
                .create_window_surface(&self.config, &attributes)?
        };

        let context = match mem::take(&mut self.context) {
            ContextType::NotCurrent(context) => context.make_current(&surface)?,
            _ => return Err("the context is already current".into()),
        };

        let interval = if self.demo.vsync {
            SwapInterval::Wait(NonZeroU32::new(1).unwrap())
        } else {
            SwapInterval::DontWait
        };
        if let Err(err) = surface.set_swap_interval(&context, interval) {
            tracing::warn!("failed to set the swap interval: {err}");
        }

        self.context = ContextType::Current {
            context,
            window,
            surface,
        };
        Ok(())
    }

    /// Release the surface, keeping the context for the next resume.
    pub(crate) fn suspend(&mut self) -> Result<(), Box<dyn Error>> {
        self.context = match mem::take(&mut self.context) {
            ContextType::Current { context, .. } => {
                ContextType::NotCurrent(context.make_not_current()?)
            }
            other => other,
        };
        Ok(())
    }

    pub(crate) fn is_current(&self) -> bool {
        matches!(self.context, ContextType::Current { .. })
    }

    pub(crate) fn get_proc_address(&self, symbol: &str) -> *const c_void {
        let symbol = CString::new(symbol).unwrap();
        self.config.display().get_proc_address(symbol.as_c_str())
    }

    /// The size of the window, if there is one.
    pub(crate) fn size(&self) -> Option<PhysicalSize<u32>> {
        match &self.context {
            ContextType::Current { window, .. } => Some(window.inner_size()),
            _ => None,
        }
    }

    /// Resize the surface. Returns `false` if there is nothing to resize.
    pub(crate) fn resize(&self, size: PhysicalSize<u32>) -> bool {
        let (width, height) = match (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            (Some(width), Some(height)) => (width, height),
            _ => return false,
        };

        match &self.context {
            ContextType::Current {
                context, surface, ..
            } => {
                surface.resize(context, width, height);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn swap_buffers(&self) -> Result<(), Box<dyn Error>> {
        if let ContextType::Current {
            context, surface, ..
        } = &self.context
        {
            surface.swap_buffers(context)?;
        }

        Ok(())
    }
}
