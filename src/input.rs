// input.rs: map winit events into viewer controller operations

use glam::Vec2;
use panorama_tour::coords::Viewport;
use panorama_tour::loader::PanoramaSource;
use panorama_tour::viewer::{KeyRotation, ViewerController};
use std::time::{Duration, Instant};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, VirtualKeyCode, WindowEvent};

const MIN_FOV: f32 = 30.0;
const MAX_FOV: f32 = 100.0;

/// Things the controller cannot do by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequest {
    OpenTour,
    ToggleFullscreen,
}

#[derive(Debug, Default)]
pub struct InputOutcome {
    pub request: Option<HostRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Click(Vec2),
    DoubleClick(Vec2),
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Vec2,
    last: Vec2,
    dragging: bool,
}

/// Pointer bookkeeping shared by mouse and touch. Pixels, origin top-left.
#[derive(Debug)]
pub struct InputState {
    cursor: Vec2,
    press: Option<Press>,
    touch_id: Option<u64>,
    last_click: Option<(Instant, Vec2)>,
    double_click: Duration,
    slop: f32,
}

impl InputState {
    pub fn new(double_click_ms: u64, slop_px: f32) -> Self {
        Self {
            cursor: Vec2::ZERO,
            press: None,
            touch_id: None,
            last_click: None,
            double_click: Duration::from_millis(double_click_ms),
            slop: slop_px,
        }
    }

    pub fn pointer_pressed(&mut self, pos: Vec2) {
        self.cursor = pos;
        self.press = Some(Press {
            origin: pos,
            last: pos,
            dragging: false,
        });
    }

    /// Drag delta since the previous move, once the pointer left the click slop.
    pub fn pointer_moved(&mut self, pos: Vec2) -> Option<Vec2> {
        self.cursor = pos;
        let press = self.press.as_mut()?;
        if !press.dragging && press.origin.distance(pos) > self.slop {
            press.dragging = true;
        }
        let delta = pos - press.last;
        press.last = pos;
        press.dragging.then_some(delta)
    }

    pub fn pointer_released(&mut self, pos: Vec2, now: Instant) -> Option<Gesture> {
        self.cursor = pos;
        let press = self.press.take()?;
        if press.dragging {
            return None;
        }

        let is_double = self.last_click.is_some_and(|(at, where_)| {
            now.saturating_duration_since(at) <= self.double_click && where_.distance(pos) <= self.slop
        });
        if is_double {
            self.last_click = None;
            Some(Gesture::DoubleClick(pos))
        } else {
            self.last_click = Some((now, pos));
            Some(Gesture::Click(pos))
        }
    }

    fn pointer_cancelled(&mut self) {
        self.press = None;
        self.touch_id = None;
    }
}

pub fn apply_gesture<S: PanoramaSource>(gesture: Gesture, controller: &mut ViewerController<S>, viewport: Viewport) {
    match gesture {
        Gesture::Click(pos) => {
            let Some(id) = controller.hit_test(pos).map(|m| m.point_id.clone()) else {
                return;
            };
            // failures already went to the navigation-failed callback
            if let Err(e) = controller.select_info_point(&id) {
                log::debug!("selecting {id}: {e}");
            }
        }
        Gesture::DoubleClick(pos) => {
            if controller.placement_enabled() && controller.hit_test(pos).is_none() {
                controller.place_info_point(pos, viewport);
            }
        }
    }
}

pub fn handle_window_event<S: PanoramaSource>(
    event: &WindowEvent,
    input: &mut InputState,
    controller: &mut ViewerController<S>,
    viewport: Viewport,
) -> InputOutcome {
    let mut out = InputOutcome::default();
    match event {
        WindowEvent::MouseInput {
            state,
            button: MouseButton::Left,
            ..
        } => match state {
            ElementState::Pressed => input.pointer_pressed(input.cursor),
            ElementState::Released => {
                if let Some(gesture) = input.pointer_released(input.cursor, Instant::now()) {
                    apply_gesture(gesture, controller, viewport);
                }
            }
        },
        WindowEvent::CursorMoved { position, .. } => {
            let pos = Vec2::new(position.x as f32, position.y as f32);
            if let Some(delta) = input.pointer_moved(pos) {
                controller.drag(delta.x, delta.y, viewport);
            }
        }
        WindowEvent::CursorLeft { .. } => input.press = None,
        WindowEvent::Touch(touch) => {
            let pos = Vec2::new(touch.location.x as f32, touch.location.y as f32);
            match touch.phase {
                TouchPhase::Started if input.touch_id.is_none() => {
                    input.touch_id = Some(touch.id);
                    input.pointer_pressed(pos);
                }
                TouchPhase::Moved if input.touch_id == Some(touch.id) => {
                    if let Some(delta) = input.pointer_moved(pos) {
                        controller.drag(delta.x, delta.y, viewport);
                    }
                }
                TouchPhase::Ended if input.touch_id == Some(touch.id) => {
                    input.touch_id = None;
                    if let Some(gesture) = input.pointer_released(pos, Instant::now()) {
                        apply_gesture(gesture, controller, viewport);
                    }
                }
                TouchPhase::Cancelled => input.pointer_cancelled(),
                _ => {}
            }
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let scroll = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
            };
            let view = controller.view_mut();
            view.fov = (view.fov - scroll * 2.5).clamp(MIN_FOV, MAX_FOV);
        }
        WindowEvent::KeyboardInput { input: key, .. } if key.state == ElementState::Pressed => {
            match key.virtual_keycode {
                Some(VirtualKeyCode::Left) => controller.key_rotate(KeyRotation::Left),
                Some(VirtualKeyCode::Right) => controller.key_rotate(KeyRotation::Right),
                Some(VirtualKeyCode::Up) => controller.key_rotate(KeyRotation::Up),
                Some(VirtualKeyCode::Down) => controller.key_rotate(KeyRotation::Down),
                Some(VirtualKeyCode::Escape) => controller.close_details(),
                Some(VirtualKeyCode::R) => controller.reset_view(),
                Some(VirtualKeyCode::O) => out.request = Some(HostRequest::OpenTour),
                Some(VirtualKeyCode::F11) => out.request = Some(HostRequest::ToggleFullscreen),
                _ => {}
            }
        }
        _ => {}
    }
    out
}
