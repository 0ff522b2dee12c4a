use std::{mem, sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender, unbounded};
use gpui::prelude::FluentBuilder;
use gpui::{
    AnyElement, App, AppContext, Context, Hsla, InteractiveElement, IntoElement, ObjectFit,
    ParentElement, Render, RenderImage, SharedString, Styled, StyledImage, TitlebarOptions,
    Window, WindowControlArea, WindowDecorations, WindowOptions, div, img, px,
};
use gpui_component::{
    ActiveTheme, Root, StyledExt,
    button::{Button, ButtonVariants},
    h_flex,
    tag::Tag,
    v_flex,
};
use image::{Frame as ImageFrame, ImageBuffer, Rgba};

use crate::{
    clip_download::{ClipDownloadEvent, default_pack_dir, ensure_clip_pack_available_with_callback},
    display::{CharacterDisplay, DisplayHooks},
    services::{BUILTIN_CHARACTER, ServiceRegistry, ServiceToken, VideoCatalog,
        VideoCharacterService},
    types::Emotion,
};

mod assets_view;
mod main_view;
mod render_util;
mod titlebar;

use titlebar::TitlebarStatus;

const CHARACTER_CARD_WIDTH: f32 = 480.0;
const CHARACTER_MIN_HEIGHT: f32 = 180.0;
const CHARACTER_MAX_HEIGHT: f32 = 540.0;
const DEFAULT_CLIP_RATIO: f32 = 16.0 / 9.0;

pub fn launch_ui(app: &mut App, registry: ServiceRegistry) -> gpui::Result<()> {
    let window_options = WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some("Ann AI".into()),
            appears_transparent: true,
            traffic_light_position: None,
        }),
        window_decorations: Some(WindowDecorations::Client),
        ..Default::default()
    };

    app.open_window(window_options, move |window, app| {
        let view = app.new(|_| AppView::new(registry));
        app.new(|cx| Root::new(view, window, cx))
    })?;

    Ok(())
}

pub(crate) struct AppView {
    registry: ServiceRegistry,
    screen: Screen,
    display: Option<CharacterDisplay>,
    selected_emotion: Option<Emotion>,
    is_playing: bool,
    latest_image: Option<Arc<RenderImage>>,
    frame_dims: Option<(u32, u32)>,
    fatal_error: Option<String>,
    provision_rx: Receiver<ProvisionMessage>,
    _provision_handle: thread::JoinHandle<()>,
}

enum Screen {
    Assets(AssetState),
    Main,
}

struct AssetState {
    downloaded: u64,
    message: String,
    error: Option<String>,
    finished: bool,
}

impl AssetState {
    fn new() -> AssetState {
        AssetState {
            downloaded: 0,
            message: "Checking character clips...".to_string(),
            error: None,
            finished: false,
        }
    }
}

enum ProvisionMessage {
    Event(ClipDownloadEvent),
    Error(String),
}

impl AppView {
    fn new(registry: ServiceRegistry) -> AppView {
        let (provision_tx, provision_rx) = unbounded();
        let provision_handle = assets_view::spawn_clip_provisioning(provision_tx);

        AppView {
            registry,
            screen: Screen::Assets(AssetState::new()),
            display: None,
            selected_emotion: Some(Emotion::Neutral),
            is_playing: true,
            latest_image: None,
            frame_dims: None,
            fatal_error: None,
            provision_rx,
            _provision_handle: provision_handle,
        }
    }

    fn mount_display(&mut self) {
        let catalog = match self.registry.get::<VideoCatalog>(ServiceToken::CharacterService) {
            Ok(catalog) => catalog,
            Err(err) => {
                log::error!("failed to resolve character service: {err}");
                self.fatal_error = Some(err.to_string());
                return;
            }
        };
        let service: Arc<dyn VideoCharacterService> = catalog;

        let hooks = DisplayHooks {
            on_performance_metrics: Some(Box::new(|metrics| {
                log::info!(
                    "clip loaded in {:?} ({} px, {} quality)",
                    metrics.load_time,
                    metrics.video_size,
                    metrics.playback_quality.label()
                );
            })),
            on_memory_usage: Some(Box::new(|usage| {
                log::debug!("process memory: {} KB", usage / 1024);
            })),
            on_video_change: Some(Box::new(|path| {
                log::info!("video changed to {}", path.display());
            })),
            on_error: Some(Box::new(|message| {
                log::error!("video error: {message}");
            })),
        };

        self.display = Some(CharacterDisplay::new(
            service,
            BUILTIN_CHARACTER,
            self.selected_emotion,
            true,
            hooks,
        ));
    }
}

impl Render for AppView {
    fn render(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> impl gpui::IntoElement {
        cx.defer_in(window, |_, _, cx| {
            cx.notify();
        });

        let mut screen = mem::replace(&mut self.screen, Screen::Main);
        let view = match screen {
            Screen::Assets(mut state) => {
                self.poll_provision_events(&mut state);
                let should_switch = state.finished && state.error.is_none();
                let view = self.render_assets_view(&state, cx);
                if should_switch {
                    self.mount_display();
                    screen = Screen::Main;
                } else {
                    screen = Screen::Assets(state);
                }
                view
            }
            Screen::Main => {
                screen = Screen::Main;
                self.render_main(window, cx)
            }
        };
        self.screen = screen;
        view
    }
}
