//! Window creation, input dispatch and the main render loop.

use std::{iter, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window},
};

use crate::{
    camera::ProjectionMode, context::Context, data_structures::model::DrawScene,
    resources::primitives::Shape, scene::Scene,
};

/// GPU context plus the scene, everything the loop mutates per frame.
struct AppState {
    ctx: Context,
    scene: Scene,
}

impl AppState {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let scene = Scene::new(&ctx)?;
        Ok(Self { ctx, scene })
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.ctx.pipelines.surface);
            for batch in &self.scene.batches {
                if batch.instances.is_empty() {
                    log::warn!("batch {} has zero instances", batch.material.name);
                    continue;
                }
                render_pass.set_vertex_buffer(1, batch.instance_buffer.slice(..));
                render_pass.draw_mesh_instanced(
                    self.scene.primitives.mesh(batch.shape),
                    &batch.material,
                    0..batch.instances.len() as u32,
                    &self.ctx.camera.bind_group,
                    &self.ctx.lights.bind_group,
                );
            }

            render_pass.set_pipeline(&self.ctx.pipelines.lamp);
            render_pass.set_vertex_buffer(1, self.scene.lamp_buffer.slice(..));
            render_pass.draw_lamp_instanced(
                self.scene.primitives.mesh(Shape::Pyramid),
                0..self.scene.lamp_instances.len() as u32,
                &self.ctx.camera.bind_group,
            );
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    state: Option<AppState>,
    last_time: Instant,
}

impl App {
    fn new(async_runtime: tokio::runtime::Runtime) -> Self {
        Self {
            async_runtime,
            state: None,
            last_time: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = Window::default_attributes()
            .with_title("Tabletop")
            .with_inner_size(winit::dpi::LogicalSize::new(800, 600));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => panic!("Cannot create the main window: {}", e),
        };

        // First-person mouse look wants a captured, hidden cursor. Locked
        // grabbing is not available everywhere, so fall back to confining.
        if window.set_cursor_grab(CursorGrabMode::Locked).is_err() {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::Confined) {
                log::warn!("cursor grab unavailable: {}", e);
            }
        }
        window.set_cursor_visible(false);

        let state = match self.async_runtime.block_on(AppState::new(window)) {
            Ok(state) => state,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };
        self.state = Some(state);
        self.last_time = Instant::now();
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            state.ctx.camera.controller.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        ..
                    },
                ..
            } if key_state.is_pressed() => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyP => state.ctx.projection.set_mode(ProjectionMode::Perspective),
                KeyCode::KeyO => state.ctx.projection.set_mode(ProjectionMode::Orthographic),
                _ => {}
            },
            WindowEvent::Resized(size) => state.ctx.resize(size.width, size.height),
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                log::info!("{:?} mouse button {:?}", button, button_state);
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                state.scene.update(dt, &state.ctx);
                state.ctx.camera.controller.update(
                    &mut state.ctx.camera.camera,
                    &mut state.ctx.projection,
                    dt,
                );
                state
                    .ctx
                    .camera
                    .uniform
                    .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                state.ctx.queue.write_buffer(
                    &state.ctx.camera.buffer,
                    0,
                    bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                );

                match state.render() {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.ctx.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let async_runtime = tokio::runtime::Runtime::new()?;
    let event_loop = EventLoop::new()?;
    let mut app = App::new(async_runtime);
    event_loop.run_app(&mut app)?;

    Ok(())
}
