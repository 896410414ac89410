// main.rs: desktop host (window, event loop, tour editing)

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod fonts;
mod input;
mod renderer;
mod ui;

use clap::Parser;
use input::{HostRequest, InputState};
use panorama_tour::coords::Viewport;
use panorama_tour::error::{TourError, ViewerError};
use panorama_tour::i18n::{self, tr, tr_with};
use panorama_tour::loader::ThreadedLoader;
use panorama_tour::settings::ViewerSettings;
use panorama_tour::tour::{Tour, TourStore};
use panorama_tour::viewer::{Placement, ViewerController};
use renderer::Renderer;
use ui::{PointDraft, SceneDraft, UiAction, UiState};

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowBuilder},
};

type Controller = ViewerController<ThreadedLoader>;

#[derive(Parser, Debug)]
#[command(name = "panorama_tour", version, about = "Virtual tour viewer for 360° panoramas")]
struct Cli {
    /// Tour data file; created empty if missing
    #[arg(long, default_value = "data/tour-data.json")]
    tour: PathBuf,

    /// Scene to open first
    #[arg(long)]
    scene: Option<String>,

    /// UI language (en, th)
    #[arg(long)]
    lang: Option<String>,

    /// Double-click the panorama to add info points
    #[arg(long)]
    edit: bool,

    /// Base directory for scene image paths [default: directory of the tour file]
    #[arg(long)]
    assets: Option<PathBuf>,
}

/// Controller callbacks, forwarded to the event loop.
#[derive(Debug)]
enum HostEvent {
    Placed(Placement),
    Selected(String),
    Navigating(String),
    NavigationFailed(ViewerError),
    SceneLoaded(String),
}

struct Session {
    store: TourStore,
    controller: Controller,
    events: Receiver<HostEvent>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut settings = ViewerSettings::load();
    let lang = i18n::resolve_lang(cli.lang.as_deref(), &settings.language);
    i18n::init(lang.clone());

    let mut session = match open_session(&cli.tour, cli.assets.as_deref(), cli.scene.as_deref(), &settings, cli.edit) {
        Ok(session) => session,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{}", tr_with("error.open_tour", &[("err", e.to_string())]));
            std::process::exit(1);
        }
    };

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(tr("app.title"))
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(e) => {
            log::error!("cannot create window: {e}");
            std::process::exit(1);
        }
    };

    // no surface means no ticks: the controller stays Loading until we exit
    let mut renderer = match pollster::block_on(Renderer::new(window.clone())) {
        Ok(renderer) => renderer,
        Err(e) => {
            log::error!("renderer initialisation failed: {e}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut input_state = InputState::new(settings.double_click_ms, settings.click_slop_px);
    let mut ui_state = UiState::new(cli.edit, lang);

    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                    WindowEvent::Resized(new_size) => renderer.resize(new_size),
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => renderer.resize(*new_inner_size),
                    WindowEvent::DroppedFile(path) => {
                        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
                            switch_tour(&mut session, &path, cli.assets.as_deref(), None, &settings, cli.edit, &mut ui_state);
                        } else {
                            log::warn!("ignoring dropped file {}", path.display());
                        }
                    }
                    other => {
                        let viewport = viewport_of(&renderer);
                        let outcome = input::handle_window_event(&other, &mut input_state, &mut session.controller, viewport);
                        match outcome.request {
                            Some(HostRequest::OpenTour) => {
                                if let Some(path) = pick_tour_file() {
                                    switch_tour(&mut session, &path, cli.assets.as_deref(), None, &settings, cli.edit, &mut ui_state);
                                }
                            }
                            Some(HostRequest::ToggleFullscreen) => toggle_fullscreen(&window, &mut session.controller),
                            None => {}
                        }
                    }
                }
            }

            Event::RedrawRequested(_) => {
                frame_count += 1;
                let now = Instant::now();
                let elapsed = now.duration_since(last_frame_time).as_secs_f32();
                if elapsed >= 1.0 {
                    ui_state.fps = frame_count as f32 / elapsed;
                    frame_count = 0;
                    last_frame_time = now;
                }

                let viewport = viewport_of(&renderer);
                if let Some(image) = session.controller.tick(viewport) {
                    renderer.load_panorama(image);
                }
                drain_host_events(&session, &window, &mut ui_state);

                renderer.update_camera(&session.controller.camera(viewport));

                let mut actions = Vec::new();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    actions = ui::draw_ui(ctx, &mut session.controller, &mut ui_state);
                });

                for action in actions {
                    match action {
                        UiAction::OpenTour => {
                            if let Some(path) = pick_tour_file() {
                                switch_tour(&mut session, &path, cli.assets.as_deref(), None, &settings, cli.edit, &mut ui_state);
                            }
                        }
                        UiAction::ReloadTour => {
                            let path = session.store.path().to_path_buf();
                            let scene = session.controller.current_scene().map(|s| s.id.clone());
                            switch_tour(&mut session, &path, cli.assets.as_deref(), scene.as_deref(), &settings, cli.edit, &mut ui_state);
                        }
                        UiAction::Exit => *control_flow = ControlFlow::Exit,
                        UiAction::ToggleFullscreen => toggle_fullscreen(&window, &mut session.controller),
                        UiAction::SetLanguage(code) => {
                            i18n::init(code.clone());
                            window.set_title(&window_title(&session.controller));
                            ui_state.current_lang = code;
                        }
                        UiAction::SavePoint(draft) => {
                            let (saved, message) = if draft.point_id.is_some() {
                                (update_point(&mut session.store, draft), "message.point_updated")
                            } else {
                                (add_point(&mut session.store, draft), "message.point_added")
                            };
                            match saved {
                                Ok(title) => {
                                    session.controller.set_scenes(session.store.tour.scenes.clone());
                                    ui_state.show_message(tr_with(message, &[("title", title)]));
                                }
                                Err(e) => {
                                    log::error!("{e}");
                                    ui_state.show_error(tr_with("error.save_failed", &[("err", e.to_string())]));
                                }
                            }
                        }
                        UiAction::SaveScene(draft) => match update_scene(&mut session.store, draft) {
                            Ok(name) => {
                                session.controller.set_scenes(session.store.tour.scenes.clone());
                                window.set_title(&window_title(&session.controller));
                                ui_state.show_message(tr_with("message.scene_updated", &[("name", name)]));
                            }
                            Err(e) => {
                                log::error!("{e}");
                                ui_state.show_error(tr_with("error.save_failed", &[("err", e.to_string())]));
                            }
                        },
                        UiAction::DeletePoint { scene_id, point_id } => {
                            match delete_point(&mut session.store, &scene_id, &point_id) {
                                Ok(title) => {
                                    session.controller.set_scenes(session.store.tour.scenes.clone());
                                    ui_state.show_message(tr_with("message.point_deleted", &[("title", title)]));
                                }
                                Err(e) => {
                                    log::error!("{e}");
                                    ui_state.show_error(tr_with("error.save_failed", &[("err", e.to_string())]));
                                }
                            }
                        }
                    }
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => window.request_redraw(),

            Event::LoopDestroyed => {
                settings.sensitivity_scale = session.controller.view().sensitivity_scale;
                settings.language = ui_state.current_lang.clone();
                settings.save();
            }

            _ => {}
        }
    });
}

/// Opens a tour file and builds a controller wired to a fresh event channel.
fn open_session(
    tour_path: &Path,
    assets: Option<&Path>,
    scene: Option<&str>,
    settings: &ViewerSettings,
    edit: bool,
) -> Result<Session, TourError> {
    let store = TourStore::open(tour_path)?;
    let base_dir = assets.map(Path::to_path_buf).unwrap_or_else(|| {
        tour_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    log::info!("resolving scene images under {}", base_dir.display());

    let (tx, rx) = channel();
    let mut controller = ViewerController::new(
        settings.clone(),
        store.tour.scenes.clone(),
        scene,
        ThreadedLoader::new(base_dir),
    );
    register_callbacks(&mut controller, &tx, edit);

    Ok(Session {
        store,
        controller,
        events: rx,
    })
}

fn register_callbacks(controller: &mut Controller, tx: &Sender<HostEvent>, edit: bool) {
    // sends only fail once the session is gone, and then nobody is listening
    let t = tx.clone();
    controller.on_info_point_selected(move |id| {
        let _ = t.send(HostEvent::Selected(id.to_string()));
    });
    let t = tx.clone();
    controller.on_scene_navigation_requested(move |id| {
        let _ = t.send(HostEvent::Navigating(id.to_string()));
    });
    let t = tx.clone();
    controller.on_navigation_failed(move |err| {
        let _ = t.send(HostEvent::NavigationFailed(err.clone()));
    });
    let t = tx.clone();
    controller.on_scene_loaded(move |id| {
        let _ = t.send(HostEvent::SceneLoaded(id.to_string()));
    });
    if edit {
        let t = tx.clone();
        controller.on_info_point_placed(move |placement| {
            let _ = t.send(HostEvent::Placed(placement));
        });
    }
}

fn switch_tour(
    session: &mut Session,
    path: &Path,
    assets: Option<&Path>,
    scene: Option<&str>,
    settings: &ViewerSettings,
    edit: bool,
    ui_state: &mut UiState,
) {
    let mut settings = settings.clone();
    settings.sensitivity_scale = session.controller.view().sensitivity_scale;
    match open_session(path, assets, scene, &settings, edit) {
        Ok(next) => {
            *session = next;
            ui_state.draft = None;
            ui_state.scene_draft = None;
        }
        Err(e) => {
            log::error!("{e}");
            ui_state.show_error(tr_with("error.open_tour", &[("err", e.to_string())]));
        }
    }
}

fn drain_host_events(session: &Session, window: &Window, ui_state: &mut UiState) {
    while let Ok(event) = session.events.try_recv() {
        match event {
            HostEvent::Placed(placement) => ui_state.draft = Some(PointDraft::new(placement)),
            HostEvent::Selected(id) => log::debug!("info point {id} selected"),
            HostEvent::Navigating(id) => log::debug!("host notified of navigation to {id}"),
            HostEvent::NavigationFailed(err) => {
                let text = match &err {
                    ViewerError::UnknownScene(id) => tr_with("error.scene_missing", &[("id", id.clone())]),
                    other => other.to_string(),
                };
                ui_state.show_error(text);
            }
            HostEvent::SceneLoaded(_) => window.set_title(&window_title(&session.controller)),
        }
    }
}

fn add_point(store: &mut TourStore, draft: PointDraft) -> Result<String, TourError> {
    let scene_id = draft.scene_id.clone();
    let id = store
        .tour
        .scene(&scene_id)
        .ok_or_else(|| TourError::UnknownScene(scene_id.clone()))?
        .next_point_id();
    let point = draft.into_info_point(id.clone());
    let title = point.title.clone();

    edit_and_save(store, |tour| tour.add_info_point(&scene_id, point))?;
    log::info!("added info point {id} to scene {scene_id}");
    Ok(title)
}

fn update_point(store: &mut TourStore, draft: PointDraft) -> Result<String, TourError> {
    let scene_id = draft.scene_id.clone();
    let point_id = draft.point_id.clone().unwrap_or_default();
    let mut point = store
        .tour
        .scene(&scene_id)
        .and_then(|scene| scene.info_point(&point_id))
        .cloned()
        .ok_or_else(|| TourError::UnknownInfoPoint {
            scene: scene_id.clone(),
            point: point_id.clone(),
        })?;
    draft.apply_to(&mut point);
    let title = point.title.clone();

    edit_and_save(store, |tour| tour.update_info_point(&scene_id, point))?;
    log::info!("updated info point {point_id} in scene {scene_id}");
    Ok(title)
}

fn update_scene(store: &mut TourStore, draft: SceneDraft) -> Result<String, TourError> {
    edit_and_save(store, |tour| {
        tour.update_scene_text(&draft.scene_id, &draft.name, &draft.description)
    })?;
    log::info!("updated details of scene {}", draft.scene_id);
    Ok(draft.name.trim().to_string())
}

fn delete_point(store: &mut TourStore, scene_id: &str, point_id: &str) -> Result<String, TourError> {
    let removed = edit_and_save(store, |tour| tour.remove_info_point(scene_id, point_id))?;
    log::info!("removed info point {point_id} from scene {scene_id}");
    Ok(removed.title)
}

/// Applies an edit and writes the file; memory is rolled back if either fails.
fn edit_and_save<T>(
    store: &mut TourStore,
    edit: impl FnOnce(&mut Tour) -> Result<T, TourError>,
) -> Result<T, TourError> {
    let backup = store.tour.clone();
    let result = edit(&mut store.tour).and_then(|value| store.save().map(|()| value));
    if result.is_err() {
        store.tour = backup;
    }
    result
}

fn pick_tour_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(&tr("file.filter.tour"), &["json"])
        .pick_file()
}

fn toggle_fullscreen(window: &Window, controller: &mut Controller) {
    let view = controller.view_mut();
    view.is_fullscreen = !view.is_fullscreen;
    if view.is_fullscreen {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        window.set_fullscreen(None);
    }
}

fn window_title(controller: &Controller) -> String {
    match controller.current_scene() {
        Some(scene) if !scene.name.is_empty() => format!("{} - {}", tr("app.title"), scene.name),
        _ => tr("app.title"),
    }
}

fn viewport_of(renderer: &Renderer) -> Viewport {
    Viewport::new(renderer.size.width as f32, renderer.size.height as f32)
}
