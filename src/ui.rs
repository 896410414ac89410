// ui.rs: egui panels around the panorama: menus, status bar, markers,
// detail window, scene picker and the point and scene forms.

use egui::{Align2, Color32, FontId, LayerId, Pos2, Rect, RichText, Stroke};
use glam::Vec2;
use panorama_tour::coords::Spherical;
use panorama_tour::i18n::{self, tr, tr_with};
use panorama_tour::loader::PanoramaSource;
use panorama_tour::tour::{Icon, InfoPoint, InfoPointKind, Scene};
use panorama_tour::viewer::{Marker, Placement, ViewerController, ViewerState};
use std::time::{Duration, Instant};

const MESSAGE_TTL: Duration = Duration::from_secs(4);

/// Requests the UI hands back to the host after the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    OpenTour,
    ReloadTour,
    Exit,
    ToggleFullscreen,
    SetLanguage(String),
    /// New point when `point_id` is empty, otherwise an edit.
    SavePoint(PointDraft),
    SaveScene(SceneDraft),
    DeletePoint { scene_id: String, point_id: String },
}

/// Form contents of the point dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct PointDraft {
    pub scene_id: String,
    /// Set when editing an existing point.
    pub point_id: Option<String>,
    pub position: Spherical,
    pub title: String,
    pub description: String,
    pub details: String,
    pub icon: Icon,
    pub scene_link: bool,
    pub link_to: String,
}

impl PointDraft {
    pub fn new(placement: Placement) -> Self {
        Self {
            scene_id: placement.scene_id,
            point_id: None,
            position: placement.position,
            title: String::new(),
            description: String::new(),
            details: String::new(),
            icon: Icon::Generic,
            scene_link: false,
            link_to: String::new(),
        }
    }

    pub fn from_point(scene_id: String, point: &InfoPoint) -> Self {
        Self {
            scene_id,
            point_id: Some(point.id.clone()),
            position: point.position,
            title: point.title.clone(),
            description: point.description.clone(),
            details: point.details.clone(),
            icon: point.icon_kind(),
            scene_link: point.link_target().is_some(),
            link_to: point.link_target().unwrap_or_default().to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && (!self.scene_link || !self.link_to.is_empty())
    }

    /// Writes the form back onto the point it was opened from. Position, id,
    /// unknown fields and an icon name the form cannot show stay as stored.
    pub fn apply_to(self, point: &mut InfoPoint) {
        if point.icon_kind() != self.icon {
            point.icon = self.icon.name().to_string();
        }
        point.kind = if self.scene_link && !self.link_to.is_empty() {
            InfoPointKind::SceneLink { link_to: self.link_to }
        } else {
            InfoPointKind::Info
        };
        point.title = self.title.trim().to_string();
        point.description = self.description;
        point.details = self.details;
    }

    pub fn into_info_point(self, id: String) -> InfoPoint {
        let kind = if self.scene_link && !self.link_to.is_empty() {
            InfoPointKind::SceneLink { link_to: self.link_to }
        } else {
            InfoPointKind::Info
        };
        InfoPoint {
            id,
            position: self.position,
            title: self.title.trim().to_string(),
            description: self.description,
            details: self.details,
            icon: self.icon.name().to_string(),
            kind,
            extra: Default::default(),
        }
    }
}

/// Form contents of the scene details window.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDraft {
    pub scene_id: String,
    pub name: String,
    pub description: String,
}

impl SceneDraft {
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            scene_id: scene.id.clone(),
            name: scene.name.clone(),
            description: scene.description.clone(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

struct Message {
    text: String,
    is_error: bool,
    until: Instant,
}

pub struct UiState {
    pub show_fps: bool,
    pub show_scene_picker: bool,
    pub edit_mode: bool,
    pub fps: f32,
    pub current_lang: String,
    pub draft: Option<PointDraft>,
    pub scene_draft: Option<SceneDraft>,
    message: Option<Message>,
}

impl UiState {
    pub fn new(edit_mode: bool, current_lang: String) -> Self {
        Self {
            show_fps: false,
            show_scene_picker: true,
            edit_mode,
            fps: 0.0,
            current_lang,
            draft: None,
            scene_draft: None,
            message: None,
        }
    }

    pub fn show_message(&mut self, text: String) {
        self.set_message(text, false);
    }

    pub fn show_error(&mut self, text: String) {
        self.set_message(text, true);
    }

    fn set_message(&mut self, text: String, is_error: bool) {
        self.message = Some(Message {
            text,
            is_error,
            until: Instant::now() + MESSAGE_TTL,
        });
    }
}

fn icon_glyph(marker: &Marker) -> &'static str {
    if marker.scene_link {
        return "➡";
    }
    match marker.icon {
        Icon::Building => "🏠",
        Icon::Mountain => "⛰",
        Icon::Store => "🛒",
        Icon::Generic => "ℹ",
    }
}

fn icon_label(icon: Icon) -> String {
    tr(&format!("icon.{}", icon.name()))
}

pub fn draw_ui<S: PanoramaSource>(
    ctx: &egui::Context,
    controller: &mut ViewerController<S>,
    state: &mut UiState,
) -> Vec<UiAction> {
    let mut actions = Vec::new();

    draw_menu_bar(ctx, controller, state, &mut actions);
    draw_status_bar(ctx, controller, state);
    if state.show_scene_picker {
        draw_scene_picker(ctx, controller);
    }
    draw_markers(ctx, controller);
    draw_transition_overlay(ctx, controller.state());
    draw_details(ctx, controller, state, &mut actions);
    draw_point_dialog(ctx, controller, state, &mut actions);
    draw_scene_form(ctx, state, &mut actions);

    actions
}

fn draw_menu_bar<S: PanoramaSource>(
    ctx: &egui::Context,
    controller: &mut ViewerController<S>,
    state: &mut UiState,
    actions: &mut Vec<UiAction>,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(tr("menu.file"), |ui| {
                if ui.button(tr("menu.open_tour")).clicked() {
                    actions.push(UiAction::OpenTour);
                    ui.close_menu();
                }
                if ui.button(tr("menu.reload_tour")).clicked() {
                    actions.push(UiAction::ReloadTour);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button(tr("menu.exit")).clicked() {
                    actions.push(UiAction::Exit);
                }
            });

            ui.menu_button(tr("menu.view"), |ui| {
                if ui.button(tr("view.reset")).clicked() {
                    controller.reset_view();
                    ui.close_menu();
                }
                let fullscreen_label = if controller.view().is_fullscreen {
                    tr("view.fullscreen.exit")
                } else {
                    tr("view.fullscreen.enter")
                };
                if ui.button(fullscreen_label).clicked() {
                    actions.push(UiAction::ToggleFullscreen);
                    ui.close_menu();
                }

                ui.separator();
                ui.checkbox(&mut state.show_scene_picker, tr("view.scene_list"));
                ui.menu_button(tr("view.input_sensitivity"), |ui| {
                    let view = controller.view_mut();
                    ui.add(egui::Slider::new(&mut view.sensitivity_scale, 0.1..=5.0).text(tr("view.multiplier")));
                    if ui.button(tr("view.reset_1_0")).clicked() {
                        view.sensitivity_scale = 1.0;
                    }
                });
                ui.separator();
                if ui.checkbox(&mut state.show_fps, tr("view.show_fps")).clicked() {
                    ui.close_menu();
                }
            });

            if state.edit_mode {
                ui.menu_button(tr("menu.edit"), |ui| {
                    let scene_id = controller.current_scene().map(|s| s.id.clone());
                    let selected = controller.selected_info_point().cloned().zip(scene_id);

                    let edit = ui.add_enabled(selected.is_some(), egui::Button::new(tr("edit.edit_point")));
                    if edit.clicked() {
                        if let Some((point, scene_id)) = &selected {
                            state.draft = Some(PointDraft::from_point(scene_id.clone(), point));
                        }
                        ui.close_menu();
                    }
                    let delete = ui.add_enabled(selected.is_some(), egui::Button::new(tr("edit.delete_point")));
                    if delete.clicked() {
                        if let Some((point, scene_id)) = selected {
                            actions.push(UiAction::DeletePoint {
                                scene_id,
                                point_id: point.id,
                            });
                        }
                        ui.close_menu();
                    }

                    ui.separator();
                    let scene = controller.current_scene();
                    let points = scene.map(|s| s.info_points.as_slice()).unwrap_or_default();
                    ui.add_enabled_ui(!points.is_empty(), |ui| {
                        ui.menu_button(tr("edit.points"), |ui| {
                            for point in points {
                                let label = if point.title.is_empty() { &point.id } else { &point.title };
                                if ui.button(label.as_str()).clicked() {
                                    if let Some(scene) = scene {
                                        state.draft = Some(PointDraft::from_point(scene.id.clone(), point));
                                    }
                                    ui.close_menu();
                                }
                            }
                        });
                    });
                    if ui
                        .add_enabled(scene.is_some(), egui::Button::new(tr("edit.edit_scene")))
                        .clicked()
                    {
                        state.scene_draft = scene.map(SceneDraft::from_scene);
                        ui.close_menu();
                    }
                });
            }

            ui.menu_button(tr("menu.language"), |ui| {
                for (code, name) in i18n::LANGUAGES {
                    if ui.radio(state.current_lang == code, name).clicked() {
                        actions.push(UiAction::SetLanguage(code.to_string()));
                        ui.close_menu();
                    }
                }
            });
        });
    });
}

fn draw_status_bar<S: PanoramaSource>(ctx: &egui::Context, controller: &ViewerController<S>, state: &mut UiState) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            match controller.state() {
                ViewerState::Loading => {
                    ui.label(RichText::new(tr("status.loading")).color(Color32::YELLOW));
                }
                ViewerState::Transitioning => {
                    ui.label(RichText::new(tr("status.transitioning")).color(Color32::YELLOW));
                }
                ViewerState::Ready => {
                    ui.label(tr("status.ready"));
                }
            }
            ui.label("|");

            let scene_name = controller
                .current_scene()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| tr("status.no_scene"));
            ui.label(format!("{} {scene_name}", tr("status.scene_prefix")));
            ui.label("|");

            let orientation = controller.orientation();
            ui.label(format!("{} {}°", tr("status.heading_prefix"), orientation.compass_heading()));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", orientation.yaw));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", orientation.pitch));
            ui.label("|");
            ui.label(format!("FOV: {:.1}°", controller.view().fov));

            if state.show_fps {
                ui.label("|");
                ui.label(RichText::new(format!("FPS: {:.1}", state.fps)).color(Color32::GREEN));
            }

            if state.edit_mode && controller.placement_enabled() {
                ui.label("|");
                ui.label(RichText::new(tr("edit.hint")).italics());
            }

            if state.message.as_ref().is_some_and(|m| Instant::now() >= m.until) {
                state.message = None;
            }
            if let Some(message) = &state.message {
                ui.label("|");
                let color = if message.is_error {
                    Color32::LIGHT_RED
                } else {
                    Color32::LIGHT_GREEN
                };
                ui.label(RichText::new(message.text.as_str()).color(color));
            }
        });
    });
}

fn draw_scene_picker<S: PanoramaSource>(ctx: &egui::Context, controller: &mut ViewerController<S>) {
    let mut target = None;
    egui::SidePanel::left("scene_picker")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading(tr("scene_picker.title"));
            ui.separator();
            if controller.scenes().is_empty() {
                ui.label(tr("scene_picker.empty"));
                return;
            }
            let current = controller.current_scene().map(|s| s.id.clone());
            egui::ScrollArea::vertical().show(ui, |ui| {
                for scene in controller.scenes() {
                    let is_current = current.as_deref() == Some(scene.id.as_str());
                    let label = if scene.name.is_empty() { &scene.id } else { &scene.name };
                    let mut response = ui.selectable_label(is_current, label.as_str());
                    let points = tr_with("scene_picker.points", &[("count", scene.info_points.len().to_string())]);
                    response = if scene.description.is_empty() {
                        response.on_hover_text(points)
                    } else {
                        response.on_hover_text(format!("{}\n{points}", scene.description))
                    };
                    if response.clicked() {
                        target = Some(scene.id.clone());
                    }
                }
            });
        });

    if let Some(id) = target {
        if let Err(e) = controller.navigate_to(&id) {
            log::debug!("scene picker: {e}");
        }
    }
}

/// Markers whose center lies in `area`, with that center in points.
fn markers_in_area(markers: &[Marker], area: Rect, ppp: f32) -> impl Iterator<Item = (&Marker, Pos2)> {
    markers.iter().filter_map(move |marker| {
        let center = egui::pos2(marker.position.x / ppp, marker.position.y / ppp);
        area.contains(center).then_some((marker, center))
    })
}

fn draw_markers<S: PanoramaSource>(ctx: &egui::Context, controller: &ViewerController<S>) {
    let ppp = ctx.pixels_per_point();
    // the area left after the side and top/bottom panels
    let area = ctx.available_rect();
    let painter = ctx.layer_painter(LayerId::background()).with_clip_rect(area);
    let radius_px = controller.settings().marker_radius_px;

    let hovered = ctx
        .input(|i| i.pointer.hover_pos())
        .filter(|p| area.contains(*p) && !ctx.is_pointer_over_area())
        .and_then(|p| controller.hit_test(Vec2::new(p.x * ppp, p.y * ppp)))
        .map(|m| m.point_id.clone());

    for (marker, center) in markers_in_area(controller.markers(), area, ppp) {
        let radius = radius_px * marker.scale / ppp;
        let fill = if marker.scene_link {
            Color32::from_rgba_unmultiplied(40, 120, 220, 220)
        } else {
            Color32::from_rgba_unmultiplied(235, 140, 30, 220)
        };
        let is_hovered = hovered.as_deref() == Some(marker.point_id.as_str());
        let stroke = if is_hovered {
            Stroke::new(3.0, Color32::WHITE)
        } else {
            Stroke::new(1.5, Color32::from_white_alpha(200))
        };

        painter.circle(center, radius, fill, stroke);
        painter.text(
            center,
            Align2::CENTER_CENTER,
            icon_glyph(marker),
            FontId::proportional(radius * 1.1),
            Color32::WHITE,
        );
        if is_hovered {
            let galley = painter.layout_no_wrap(marker.title.clone(), FontId::proportional(15.0), Color32::WHITE);
            let anchor = center - egui::vec2(0.0, radius + 6.0);
            let rect = Align2::CENTER_BOTTOM.anchor_rect(egui::Rect::from_min_size(anchor, galley.size()));
            painter.rect_filled(rect.expand(4.0), 4.0, Color32::from_black_alpha(170));
            painter.galley(rect.min, galley);
        }
    }
}

fn draw_transition_overlay(ctx: &egui::Context, state: ViewerState) {
    let text = match state {
        ViewerState::Ready => return,
        ViewerState::Loading => tr("status.loading"),
        ViewerState::Transitioning => tr("status.transitioning"),
    };
    egui::Area::new("transition_overlay")
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(RichText::new(text).size(18.0));
                });
            });
        });
}

fn draw_details<S: PanoramaSource>(
    ctx: &egui::Context,
    controller: &mut ViewerController<S>,
    state: &mut UiState,
    actions: &mut Vec<UiAction>,
) {
    let Some(point) = controller.selected_info_point().cloned() else {
        return;
    };
    let scene_id = controller.current_scene().map(|s| s.id.clone()).unwrap_or_default();

    let mut open = true;
    let mut close = false;
    egui::Window::new(tr("detail.title"))
        .id(egui::Id::new("info_point_details"))
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .default_width(320.0)
        .anchor(Align2::RIGHT_TOP, [-16.0, 16.0])
        .show(ctx, |ui| {
            ui.heading(format!("{} {}", icon_label(point.icon_kind()), point.title));
            if !point.description.is_empty() {
                ui.label(point.description.as_str());
            }
            if !point.details.is_empty() {
                ui.separator();
                ui.label(RichText::new(tr("detail.more")).strong());
                egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                    ui.label(point.details.as_str());
                });
            }
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button(tr("detail.close")).clicked() {
                    close = true;
                }
                if state.edit_mode && ui.button(tr("edit.edit_point")).clicked() {
                    state.draft = Some(PointDraft::from_point(scene_id.clone(), &point));
                }
                if state.edit_mode && ui.button(tr("edit.delete_point")).clicked() {
                    actions.push(UiAction::DeletePoint {
                        scene_id: scene_id.clone(),
                        point_id: point.id.clone(),
                    });
                    close = true;
                }
            });
        });

    if close || !open {
        controller.close_details();
    }
}

fn draw_point_dialog<S: PanoramaSource>(
    ctx: &egui::Context,
    controller: &ViewerController<S>,
    state: &mut UiState,
    actions: &mut Vec<UiAction>,
) {
    let Some(draft) = state.draft.as_mut() else {
        return;
    };

    let mut keep_open = true;
    let mut submit = false;
    let title = if draft.point_id.is_some() {
        tr("edit_point.title")
    } else {
        tr("new_point.title")
    };
    egui::Window::new(title)
        .id(egui::Id::new("info_point_form"))
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(
                RichText::new(tr_with(
                    "new_point.position",
                    &[
                        ("yaw", format!("{:.1}", draft.position.yaw)),
                        ("pitch", format!("{:.1}", draft.position.pitch)),
                    ],
                ))
                .weak(),
            );
            ui.separator();

            egui::Grid::new("new_point_grid").num_columns(2).spacing([8.0, 6.0]).show(ui, |ui| {
                ui.label(tr("new_point.field_title"));
                ui.text_edit_singleline(&mut draft.title);
                ui.end_row();

                ui.label(tr("new_point.field_description"));
                ui.text_edit_multiline(&mut draft.description);
                ui.end_row();

                ui.label(tr("new_point.field_details"));
                ui.text_edit_multiline(&mut draft.details);
                ui.end_row();

                ui.label(tr("new_point.field_icon"));
                egui::ComboBox::from_id_source("new_point_icon")
                    .selected_text(icon_label(draft.icon))
                    .show_ui(ui, |ui| {
                        for icon in Icon::ALL {
                            ui.selectable_value(&mut draft.icon, icon, icon_label(icon));
                        }
                    });
                ui.end_row();

                ui.label(tr("new_point.field_kind"));
                ui.horizontal(|ui| {
                    ui.radio_value(&mut draft.scene_link, false, tr("kind.info"));
                    ui.radio_value(&mut draft.scene_link, true, tr("kind.scene"));
                });
                ui.end_row();

                if draft.scene_link {
                    ui.label(tr("new_point.field_link_to"));
                    let selected = controller
                        .scenes()
                        .iter()
                        .find(|s| s.id == draft.link_to)
                        .map(|s| s.name.clone())
                        .unwrap_or_default();
                    egui::ComboBox::from_id_source("new_point_link_to")
                        .selected_text(selected)
                        .show_ui(ui, |ui| {
                            for scene in controller.scenes().iter().filter(|s| s.id != draft.scene_id) {
                                ui.selectable_value(&mut draft.link_to, scene.id.clone(), scene.name.as_str());
                            }
                        });
                    ui.end_row();
                }
            });

            if draft.title.trim().is_empty() {
                ui.label(RichText::new(tr("new_point.title_required")).color(Color32::LIGHT_RED));
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(draft.is_valid(), egui::Button::new(tr("new_point.save")))
                    .clicked()
                {
                    submit = true;
                }
                if ui.button(tr("new_point.cancel")).clicked() {
                    keep_open = false;
                }
            });
        });

    if submit {
        if let Some(draft) = state.draft.take() {
            actions.push(UiAction::SavePoint(draft));
        }
    } else if !keep_open {
        state.draft = None;
    }
}

fn draw_scene_form(ctx: &egui::Context, state: &mut UiState, actions: &mut Vec<UiAction>) {
    let Some(draft) = state.scene_draft.as_mut() else {
        return;
    };

    let mut keep_open = true;
    let mut submit = false;
    egui::Window::new(tr("scene_form.title"))
        .id(egui::Id::new("scene_form"))
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(RichText::new(draft.scene_id.as_str()).weak());
            egui::Grid::new("scene_form_grid").num_columns(2).spacing([8.0, 6.0]).show(ui, |ui| {
                ui.label(tr("scene_form.name"));
                ui.text_edit_singleline(&mut draft.name);
                ui.end_row();

                ui.label(tr("scene_form.description"));
                ui.text_edit_multiline(&mut draft.description);
                ui.end_row();
            });
            if !draft.is_valid() {
                ui.label(RichText::new(tr("scene_form.name_required")).color(Color32::LIGHT_RED));
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(draft.is_valid(), egui::Button::new(tr("new_point.save")))
                    .clicked()
                {
                    submit = true;
                }
                if ui.button(tr("new_point.cancel")).clicked() {
                    keep_open = false;
                }
            });
        });

    if submit {
        if let Some(draft) = state.scene_draft.take() {
            actions.push(UiAction::SaveScene(draft));
        }
    } else if !keep_open {
        state.scene_draft = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> PointDraft {
        PointDraft::new(Placement {
            scene_id: "plaza".into(),
            position: Spherical::new(12.0, -4.0, 400.0),
        })
    }

    #[test]
    fn draft_needs_title_and_link_target() {
        let mut d = draft();
        assert!(!d.is_valid());
        d.title = "  Clock tower ".into();
        assert!(d.is_valid());
        d.scene_link = true;
        assert!(!d.is_valid());
        d.link_to = "hill".into();
        assert!(d.is_valid());
    }

    #[test]
    fn draft_becomes_info_point() {
        let mut d = draft();
        d.title = " Market ".into();
        d.icon = Icon::Store;
        let point = d.into_info_point("point-3".into());
        assert_eq!(point.id, "point-3");
        assert_eq!(point.title, "Market");
        assert_eq!(point.icon, "store");
        assert_eq!(point.kind, InfoPointKind::Info);
        assert_eq!(point.position, Spherical::new(12.0, -4.0, 400.0));
    }

    #[test]
    fn edit_draft_round_trips_onto_point() {
        let mut stored = draft().into_info_point("point-2".into());
        stored.icon = "arrow".into();
        stored.extra.insert("color".into(), serde_json::Value::from("red"));

        let mut d = PointDraft::from_point("plaza".into(), &stored);
        assert_eq!(d.point_id.as_deref(), Some("point-2"));
        assert_eq!(d.icon, Icon::Generic);
        d.title = "Fountain ".into();
        d.scene_link = true;
        d.link_to = "hill".into();
        d.apply_to(&mut stored);

        assert_eq!(stored.id, "point-2");
        assert_eq!(stored.title, "Fountain");
        assert_eq!(stored.icon, "arrow");
        assert_eq!(stored.link_target(), Some("hill"));
        assert_eq!(stored.position, Spherical::new(12.0, -4.0, 400.0));
        assert_eq!(stored.extra["color"], "red");

        let mut d = PointDraft::from_point("plaza".into(), &stored);
        d.icon = Icon::Mountain;
        d.scene_link = false;
        d.apply_to(&mut stored);
        assert_eq!(stored.icon, "mountain");
        assert_eq!(stored.kind, InfoPointKind::Info);
    }

    #[test]
    fn scene_draft_needs_a_name() {
        let scene = Scene {
            id: "plaza".into(),
            name: "Plaza".into(),
            ..Scene::default()
        };
        let mut d = SceneDraft::from_scene(&scene);
        assert!(d.is_valid());
        d.name = "  ".into();
        assert!(!d.is_valid());
    }

    #[test]
    fn markers_under_panels_are_skipped() {
        let marker = |id: &str, x: f32, y: f32| Marker {
            point_id: id.into(),
            title: id.into(),
            icon: Icon::Generic,
            scene_link: false,
            position: Vec2::new(x, y),
            scale: 1.0,
        };
        let markers = [
            marker("picker", 100.0, 300.0),
            marker("menu", 700.0, 10.0),
            marker("open", 700.0, 300.0),
        ];
        // 200pt side panel, 24pt menu bar, 2 physical pixels per point
        let area = Rect::from_min_max(egui::pos2(200.0, 24.0), egui::pos2(640.0, 360.0));
        let kept: Vec<_> = markers_in_area(&markers, area, 2.0).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0.point_id, "open");
        assert_eq!(kept[0].1, egui::pos2(350.0, 150.0));
    }

    #[test]
    fn linked_draft_becomes_scene_link() {
        let mut d = draft();
        d.title = "To the hill".into();
        d.scene_link = true;
        d.link_to = "hill".into();
        let point = d.into_info_point("point-1".into());
        assert_eq!(point.link_target(), Some("hill"));
    }
}
