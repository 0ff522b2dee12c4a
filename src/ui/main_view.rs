use super::render_util::frame_to_image;
use super::{
    ActiveTheme, AnyElement, AppView, Button, ButtonVariants, CHARACTER_CARD_WIDTH,
    CHARACTER_MAX_HEIGHT, CHARACTER_MIN_HEIGHT, Context, DEFAULT_CLIP_RATIO, Emotion,
    FluentBuilder, IntoElement, ObjectFit, ParentElement, RenderImage, SharedString, Styled,
    StyledExt, StyledImage, TitlebarStatus, Window, h_flex, v_flex,
};
use std::sync::Arc;

impl AppView {
    pub(super) fn render_main(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        let Some(mut display) = self.display.take() else {
            return self.render_fatal(cx);
        };

        display.pump();
        if let Some(frame) = display.take_latest_frame() {
            self.frame_dims = Some((frame.width, frame.height));
            if let Some(image) = frame_to_image(&frame) {
                self.replace_latest_image(image, window, cx);
            }
        }

        let state = display.state().clone();
        let metrics = display.last_metrics().cloned();
        let memory = display.memory_usage();
        self.display = Some(display);

        let theme = cx.theme();

        let (character_icon, character_text, character_color) = if state.has_error {
            ("✗", "Character error", theme.accent)
        } else if state.is_loading {
            ("⟳", "Loading character", theme.muted_foreground)
        } else {
            ("●", "Character ready", theme.success)
        };

        let (playback_icon, playback_text, playback_color) = if self.is_playing {
            ("▶", "Playing", theme.success)
        } else {
            ("⏸", "Paused", theme.muted_foreground)
        };

        let status = TitlebarStatus {
            character_color,
            character_icon,
            character_text,
            playback_color,
            playback_icon,
            playback_text,
        };

        let mut emotion_row = h_flex().gap_2().justify_center();
        for emotion in Emotion::ALL {
            let selected = self.selected_emotion == Some(emotion);
            emotion_row = emotion_row.child(
                Button::new(SharedString::from(emotion.label()))
                    .label(emotion.display_name())
                    .when(selected, |b| b.primary())
                    .when(!selected, |b| b.outline())
                    .on_click(cx.listener(move |this, _, _, cx| {
                        this.select_emotion(emotion);
                        cx.notify();
                    })),
            );
        }
        emotion_row = emotion_row.child(
            Button::new(SharedString::from("playback-toggle"))
                .ghost()
                .label(if self.is_playing { "⏸ Pause" } else { "▶ Play" })
                .on_click(cx.listener(|this, _, _, cx| {
                    this.toggle_playing();
                    cx.notify();
                })),
        );

        let ratio = self.clip_aspect_ratio();
        let card_height =
            (CHARACTER_CARD_WIDTH / ratio).clamp(CHARACTER_MIN_HEIGHT, CHARACTER_MAX_HEIGHT);

        let frame_view: AnyElement = if let Some(image) = &self.latest_image {
            super::img(image.clone())
                .size_full()
                .object_fit(ObjectFit::Contain)
                .rounded_t_lg()
                .into_any_element()
        } else {
            super::div()
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .text_sm()
                .text_color(gpui::rgb(0x8b95a5))
                .rounded_t_lg()
                .child("Waiting for character...")
                .into_any_element()
        };

        let mut character_shell = super::div()
            .relative()
            .w(super::px(CHARACTER_CARD_WIDTH))
            .h(super::px(card_height))
            .overflow_hidden()
            .rounded_t_lg()
            .bg(gpui::rgb(0x000000))
            .child(frame_view);

        if state.is_loading {
            character_shell = character_shell.child(
                super::div()
                    .absolute()
                    .inset_0()
                    .flex()
                    .items_center()
                    .justify_center()
                    .bg(gpui::rgba(0x00000080))
                    .child(
                        v_flex()
                            .gap_2()
                            .items_center()
                            .child(
                                super::div()
                                    .text_lg()
                                    .text_color(gpui::rgb(0xffffff))
                                    .child("⟳"),
                            )
                            .child(
                                super::div()
                                    .text_sm()
                                    .text_color(gpui::rgb(0xffffff))
                                    .child("Loading character..."),
                            ),
                    ),
            );
        }

        if state.has_error {
            character_shell = character_shell.child(
                super::div()
                    .absolute()
                    .inset_0()
                    .flex()
                    .items_center()
                    .justify_center()
                    .bg(gpui::rgba(0x7f1d1d80))
                    .child(
                        v_flex()
                            .gap_3()
                            .items_center()
                            .p_4()
                            .child(
                                super::div()
                                    .text_sm()
                                    .text_color(gpui::rgb(0xfca5a5))
                                    .child(state.error_message.clone()),
                            )
                            .child(
                                Button::new(SharedString::from("video-retry"))
                                    .primary()
                                    .label("Retry")
                                    .on_click(cx.listener(|this, _, _, cx| {
                                        this.retry_load();
                                        cx.notify();
                                    })),
                            ),
                    ),
            );
        }

        if state.is_transitioning {
            character_shell = character_shell.child(
                super::div()
                    .absolute()
                    .top(super::px(12.0))
                    .right(super::px(12.0))
                    .px_2()
                    .py_1()
                    .rounded_md()
                    .bg(gpui::rgba(0x00000080))
                    .text_xs()
                    .text_color(gpui::rgb(0xffffff))
                    .child("Switching..."),
            );
        }

        let clip_label = state
            .current_video_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "none".to_string());

        let character_card = super::div().w(super::px(CHARACTER_CARD_WIDTH)).child(
            v_flex()
                .w_full()
                .rounded_lg()
                .overflow_hidden()
                .bg(gpui::rgb(0x0f1419))
                .child(character_shell)
                .child(
                    v_flex().gap_1().p_3().child(
                        super::div()
                            .text_xs()
                            .text_color(gpui::rgb(0x8b95a5))
                            .overflow_hidden()
                            .text_ellipsis()
                            .whitespace_nowrap()
                            .child(format!(
                                "Emotion: {} | Clip: {clip_label}",
                                self.selected_emotion
                                    .map(|e| e.label())
                                    .unwrap_or("random")
                            )),
                    ),
                ),
        );

        let mut metrics_rows = v_flex().gap_1().child(
            super::div()
                .text_sm()
                .font_semibold()
                .text_color(gpui::rgb(0xe2e8f0))
                .child("Performance"),
        );
        match metrics {
            Some(metrics) => {
                metrics_rows = metrics_rows
                    .child(metric_row(format!(
                        "Load time: {} ms",
                        metrics.load_time.as_millis()
                    )))
                    .child(metric_row(format!("Video size: {} pixels", metrics.video_size)))
                    .child(metric_row(format!(
                        "Quality: {}",
                        metrics.playback_quality.label()
                    )));
            }
            None => {
                metrics_rows = metrics_rows.child(metric_row("No clip loaded yet".to_string()));
            }
        }
        if let Some(memory) = memory {
            metrics_rows =
                metrics_rows.child(metric_row(format!("Memory: {} MB", memory / (1024 * 1024))));
        }

        let metrics_panel = super::div()
            .w(super::px(CHARACTER_CARD_WIDTH))
            .p_3()
            .rounded_lg()
            .bg(gpui::rgb(0x0f1419))
            .child(metrics_rows);

        let footer = super::div()
            .text_xs()
            .text_color(gpui::rgb(0x4a5568))
            .child(format!(
                "Ann AI v{} · {}",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ));

        let titlebar = self.render_titlebar(&status, window, cx);

        v_flex()
            .size_full()
            .bg(gpui::rgb(0x1a2332))
            .child(titlebar)
            .child(
                v_flex()
                    .flex_1()
                    .gap_3()
                    .p_4()
                    .items_center()
                    .child(emotion_row)
                    .child(character_card)
                    .child(metrics_panel)
                    .child(super::div().flex_1())
                    .child(footer),
            )
            .into_any_element()
    }

    fn render_fatal(&self, cx: &mut Context<'_, Self>) -> AnyElement {
        let theme = cx.theme();
        let message = self
            .fatal_error
            .clone()
            .unwrap_or_else(|| "service wiring failed".to_string());

        v_flex()
            .size_full()
            .items_center()
            .justify_center()
            .bg(theme.background)
            .child(
                v_flex()
                    .gap_2()
                    .p_6()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.group_box)
                    .child(
                        super::div()
                            .text_sm()
                            .font_semibold()
                            .text_color(theme.accent)
                            .child("⚠ Ann AI could not start"),
                    )
                    .child(super::div().text_color(theme.foreground).child(message)),
            )
            .into_any_element()
    }

    fn clip_aspect_ratio(&self) -> f32 {
        if let Some((width, height)) = self.frame_dims {
            if height > 0 {
                return width as f32 / height as f32;
            }
        }
        DEFAULT_CLIP_RATIO
    }

    fn select_emotion(&mut self, emotion: Emotion) {
        self.selected_emotion = Some(emotion);
        if let Some(display) = self.display.as_mut() {
            display.set_emotion(Some(emotion));
        }
    }

    fn toggle_playing(&mut self) {
        self.is_playing = !self.is_playing;
        if let Some(display) = self.display.as_mut() {
            display.set_playing(self.is_playing);
        }
    }

    fn retry_load(&mut self) {
        if let Some(display) = self.display.as_mut() {
            display.retry();
        }
    }

    fn replace_latest_image(
        &mut self,
        new_image: Arc<RenderImage>,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        if let Some(old_image) = self.latest_image.replace(new_image) {
            // Explicitly drop the previous GPU texture; otherwise the sprite
            // atlas keeps every frame and memory climbs while a clip plays.
            cx.drop_image(old_image, Some(window));
        }
    }
}

fn metric_row(text: String) -> gpui::Div {
    super::div()
        .text_xs()
        .text_color(gpui::rgb(0xa0aab8))
        .child(text)
}
