use super::{
    ActiveTheme, AnyElement, AppView, AssetState, ClipDownloadEvent, Context, IntoElement,
    ParentElement, ProvisionMessage, Sender, Styled, StyledExt, Tag, default_pack_dir, div,
    ensure_clip_pack_available_with_callback, h_flex, thread, v_flex,
};

impl AppView {
    pub(super) fn poll_provision_events(&mut self, state: &mut AssetState) {
        while let Ok(msg) = self.provision_rx.try_recv() {
            match msg {
                ProvisionMessage::Event(ClipDownloadEvent::AlreadyPresent) => {
                    state.message = "Clip pack already present, launching app...".to_string();
                }
                ProvisionMessage::Event(ClipDownloadEvent::Started { .. }) => {
                    state.message = "Downloading character clips...".to_string();
                }
                ProvisionMessage::Event(ClipDownloadEvent::Progress { downloaded, .. }) => {
                    state.downloaded = downloaded;
                    state.message = "Downloading character clips...".to_string();
                }
                ProvisionMessage::Event(ClipDownloadEvent::Finished) => {
                    state.finished = true;
                    state.message = "Clips ready, starting app...".to_string();
                }
                ProvisionMessage::Error(err) => {
                    state.error = Some(err);
                    state.finished = false;
                    state.message = "Clip download failed".to_string();
                }
            }
        }
    }

    pub(super) fn render_assets_view(
        &self,
        state: &AssetState,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        let theme = cx.theme();
        let bar = progress_bar_string(state.downloaded);
        let detail = if state.finished {
            "Done".to_string()
        } else {
            format!("Downloaded {} KB", state.downloaded / 1024)
        };

        let (status_icon, status_text, status_color) = if state.finished && state.error.is_none() {
            ("✓", "Clips ready", theme.success)
        } else if state.error.is_some() {
            ("✗", "Clip download failed", theme.accent)
        } else {
            ("⟳", "Fetching clips", theme.foreground)
        };

        let mut container = v_flex()
            .gap_3()
            .p_6()
            .rounded_lg()
            .border_1()
            .border_color(theme.border)
            .bg(theme.group_box)
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(
                        div()
                            .text_color(status_color)
                            .font_semibold()
                            .child(format!("{} {}", status_icon, status_text)),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child("Preparing the character clip pack"),
                    ),
            )
            .child(
                div()
                    .px_3()
                    .py_2()
                    .rounded_md()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.muted)
                    .font_family(theme.mono_font_family.clone())
                    .text_color(theme.foreground)
                    .child(bar),
            )
            .child(
                div()
                    .text_sm()
                    .text_color(theme.muted_foreground)
                    .child(detail),
            )
            .child(
                div()
                    .text_color(theme.foreground)
                    .child(state.message.clone()),
            );

        if let Some(err) = &state.error {
            container = container.child(Tag::danger().rounded_full().child(format!("Error: {err}")));
        }

        v_flex()
            .size_full()
            .items_center()
            .justify_center()
            .bg(theme.background)
            .child(container)
            .into_any_element()
    }
}

pub(super) fn spawn_clip_provisioning(tx: Sender<ProvisionMessage>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let pack_dir = default_pack_dir();
        let result = ensure_clip_pack_available_with_callback(&pack_dir, |event| {
            let _ = tx.send(ProvisionMessage::Event(event));
        });

        if let Err(err) = result {
            log::error!("failed to provision clip pack: {err:?}");
            let _ = tx.send(ProvisionMessage::Error(format!("{err:#}")));
        }
    })
}

fn progress_bar_string(downloaded: u64) -> String {
    const BAR_LEN: usize = 30;
    let spinner_width = ((downloaded / 64) as usize % BAR_LEN) + 1;
    format!("[{:-<width$}]", ">", width = spinner_width.min(BAR_LEN))
}
