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

//! A window with a menu of small scenes.
//!
//! Press `1` for a plain clear color and `2` for two textured quads, which the arrow keys move
//! around. `Escape` or `Backspace` goes back to the menu. Pass a dual-section shader file as
//! the first argument to draw the quads with it.

#[path = "util/setup_context.rs"]
mod util;

use quadkit::{ClearColor, Direction, Renderer, SceneMenu, ShaderSource, TexturedQuads};
use quadkit_gl::GlContext;

use util::{DemoConfig, GlutinSetup};

use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::event_loop::EventLoop;

use std::rc::Rc;
use std::time::{Duration, Instant};

const CLEAR_COLOR: &str = "clear-color";
const TEXTURED_QUADS: &str = "textured-quads";

/// How often the frame time is logged.
const REPORT_INTERVAL: Duration = Duration::from_secs(2);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    util::init();

    let config = DemoConfig::from_args();
    let event_loop = EventLoop::new();
    let mut setup = GlutinSetup::new(&event_loop, config.clone())?;

    let framerate = Duration::from_millis(16);
    let mut next_frame = Instant::now() + framerate;
    let mut timer = FrameTimer::new();
    let mut sandbox: Option<Sandbox> = None;

    event_loop.run(move |event, target, control_flow| {
        control_flow.set_wait_until(next_frame);

        match event {
            Event::Resumed => {
                if let Err(err) = setup.resume(target) {
                    tracing::error!("failed to create the window surface: {err}");
                    control_flow.set_exit();
                    return;
                }

                match &sandbox {
                    // SAFETY: The context was just made current.
                    Some(sandbox) => unsafe { sandbox.context.set_context() },
                    None => {
                        // SAFETY: The context was just made current.
                        let loaded = unsafe {
                            GlContext::load_with(|symbol| setup.get_proc_address(symbol))
                        };

                        match loaded {
                            Ok(context) => {
                                if !context.enable_debug_output() {
                                    tracing::debug!("KHR_debug is not available");
                                }

                                sandbox = Some(Sandbox::new(Rc::new(context), &config));
                            }
                            Err(err) => {
                                tracing::error!("{err}");
                                control_flow.set_exit();
                                return;
                            }
                        }
                    }
                }

                if let (Some(sandbox), Some(size)) = (&sandbox, setup.size()) {
                    sandbox.renderer.set_viewport(size.width, size.height);
                }
            }

            Event::Suspended => {
                if let Some(sandbox) = &sandbox {
                    sandbox.context.unset_context();
                }

                if let Err(err) = setup.suspend() {
                    tracing::error!("failed to release the context: {err}");
                }
            }

            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => control_flow.set_exit(),
                WindowEvent::Resized(size) => {
                    if let (true, Some(sandbox)) = (setup.resize(size), &sandbox) {
                        sandbox.renderer.set_viewport(size.width, size.height);
                    }
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => {
                    if let Some(sandbox) = &mut sandbox {
                        sandbox.key(key);
                    }
                }
                _ => {}
            },

            Event::RedrawEventsCleared => {
                if let (true, Some(sandbox)) = (setup.is_current(), &mut sandbox) {
                    sandbox.frame(timer.tick());

                    if let Err(err) = setup.swap_buffers() {
                        tracing::error!("failed to swap buffers: {err}");
                    }
                }

                next_frame += framerate;
            }

            Event::LoopDestroyed => {
                // The scenes delete their objects, which needs the context.
                if setup.is_current() {
                    sandbox = None;
                }
            }

            _ => {}
        }
    })
}

struct Sandbox {
    context: Rc<GlContext>,
    renderer: Renderer<GlContext>,
    menu: SceneMenu<GlContext>,
}

impl Sandbox {
    fn new(context: Rc<GlContext>, config: &DemoConfig) -> Self {
        let renderer = Renderer::new(context.clone());
        renderer.enable_blending();

        let mut menu = SceneMenu::new(context.clone());
        menu.register(CLEAR_COLOR, |_| Ok(ClearColor::default()));

        match config.shader.clone() {
            Some(path) => menu.register(TEXTURED_QUADS, move |context| {
                TexturedQuads::with_source(context, &ShaderSource::from_path(&path)?)
            }),
            None => menu.register(TEXTURED_QUADS, TexturedQuads::new),
        };

        tracing::info!(
            "scenes: {}; press a number to start one, Escape to go back",
            menu.names()
                .enumerate()
                .map(|(i, name)| format!("{} = {name}", i + 1))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Self {
            context,
            renderer,
            menu,
        }
    }

    fn key(&mut self, key: VirtualKeyCode) {
        let direction = match key {
            VirtualKeyCode::Key1 => return self.select(CLEAR_COLOR),
            VirtualKeyCode::Key2 => return self.select(TEXTURED_QUADS),
            VirtualKeyCode::Escape | VirtualKeyCode::Back => return self.menu.back(),
            VirtualKeyCode::Left => Direction::Left,
            VirtualKeyCode::Right => Direction::Right,
            VirtualKeyCode::Up => Direction::Up,
            VirtualKeyCode::Down => Direction::Down,
            _ => return,
        };

        self.menu.direction(direction);
    }

    fn select(&mut self, name: &str) {
        if let Err(err) = self.menu.select(name) {
            tracing::error!("failed to start `{name}`: {err}");
        }
    }

    fn frame(&mut self, delta: f32) {
        self.menu.update(delta);

        if let Err(err) = self.menu.render(&self.renderer) {
            tracing::error!("scene failed to render, returning to the menu: {err}");
            self.menu.back();
        }
    }
}

/// Measures frame times and logs their average now and then.
struct FrameTimer {
    last_frame: Instant,
    last_report: Instant,
    frames: u32,
}

impl FrameTimer {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            last_report: now,
            frames: 0,
        }
    }

    /// Start a new frame, returning the seconds since the last one.
    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.frames += 1;

        let elapsed = now - self.last_report;
        if elapsed >= REPORT_INTERVAL {
            let frame_time = elapsed.as_secs_f64() * 1000.0 / f64::from(self.frames);
            tracing::info!(
                "{frame_time:.3} ms/frame ({:.1} FPS)",
                1000.0 / frame_time
            );

            self.last_report = now;
            self.frames = 0;
        }

        delta.as_secs_f32()
    }
}
