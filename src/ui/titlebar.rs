use super::{
    AnyElement, AppView, Context, Hsla, InteractiveElement, IntoElement, ParentElement, Styled,
    StyledExt, Window, WindowControlArea, div, h_flex, px,
};

#[cfg(target_os = "windows")]
use super::SharedString;

/// Tag contents for the two titlebar status pills.
pub(super) struct TitlebarStatus {
    pub character_color: Hsla,
    pub character_icon: &'static str,
    pub character_text: &'static str,
    pub playback_color: Hsla,
    pub playback_icon: &'static str,
    pub playback_text: &'static str,
}

impl AppView {
    pub(super) fn render_titlebar(
        &self,
        status: &TitlebarStatus,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        let titlebar_height = px(32.0);
        let titlebar_bg = gpui::rgb(0x1a2332);

        #[cfg(target_os = "windows")]
        let controls = self.render_windows_controls(window, cx);

        #[cfg(target_os = "macos")]
        let controls = self.render_macos_controls(window, cx);

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let controls = self.render_linux_controls(window, cx);

        let status_pill = |color: Hsla, icon: &'static str, text: &'static str| {
            div()
                .px_2()
                .py_0p5()
                .rounded_md()
                .bg(gpui::rgba(0x00000033))
                .text_xs()
                .text_color(color)
                .child(format!("{icon} {text}"))
        };

        h_flex()
            .window_control_area(WindowControlArea::Drag)
            .h(titlebar_height)
            .w_full()
            .items_center()
            .justify_between()
            .bg(titlebar_bg)
            .child(
                h_flex()
                    .gap_3()
                    .pl(px(80.0))
                    .pr_3()
                    .h_full()
                    .items_center()
                    .child(
                        div()
                            .text_sm()
                            .font_semibold()
                            .text_color(gpui::rgb(0xe2e8f0))
                            .child("Ann AI"),
                    )
                    .child(status_pill(
                        status.character_color,
                        status.character_icon,
                        status.character_text,
                    ))
                    .child(status_pill(
                        status.playback_color,
                        status.playback_icon,
                        status.playback_text,
                    )),
            )
            .child(controls)
            .into_any_element()
    }

    #[cfg(target_os = "windows")]
    fn render_windows_controls(
        &self,
        window: &mut Window,
        _cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        let button_height = px(32.0);
        let close_hover = gpui::rgb(0xe81123);
        let hover = gpui::rgb(0x404040);
        let font_family: SharedString = "Segoe Fluent Icons".into();

        let control = |id: &'static str,
                       area: WindowControlArea,
                       glyph: &'static str,
                       hover_bg: gpui::Rgba| {
            div()
                .id(id)
                .flex()
                .flex_row()
                .items_center()
                .justify_center()
                .occlude()
                .w(px(46.0))
                .h_full()
                .text_size(px(10.0))
                .hover(move |s| s.bg(hover_bg))
                .window_control_area(area)
                .child(glyph)
        };

        div()
            .id("windows-window-controls")
            .font_family(font_family)
            .flex()
            .flex_row()
            .justify_center()
            .content_stretch()
            .max_h(button_height)
            .min_h(button_height)
            .child(control(
                "minimize",
                WindowControlArea::Min,
                "\u{e921}",
                hover,
            ))
            .child(control(
                "maximize-or-restore",
                WindowControlArea::Max,
                if window.is_maximized() {
                    "\u{e923}"
                } else {
                    "\u{e922}"
                },
                hover,
            ))
            .child(control(
                "close",
                WindowControlArea::Close,
                "\u{e8bb}",
                close_hover,
            ))
            .into_any_element()
    }

    #[cfg(target_os = "macos")]
    fn render_macos_controls(
        &self,
        _window: &mut Window,
        _cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        // Traffic lights are drawn by the system.
        div().into_any_element()
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    fn render_linux_controls(
        &self,
        _window: &mut Window,
        _cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        let button_size = px(28.0);
        let icon_size = px(16.0);
        let icon_color = gpui::rgb(0xc9d1d9);
        let hover_bg = gpui::rgb(0x1f2428);
        let close_hover_bg = gpui::rgb(0xe81123);

        let control = |id: &'static str,
                       area: WindowControlArea,
                       svg_path: &'static str,
                       hover: gpui::Rgba| {
            div()
                .id(id)
                .size(button_size)
                .flex()
                .items_center()
                .justify_center()
                .rounded_md()
                .cursor_pointer()
                .window_control_area(area)
                .hover(move |s| s.bg(hover))
                .child(gpui::svg().size(icon_size).path(svg_path).text_color(icon_color))
        };

        h_flex()
            .gap_1()
            .px_2()
            .child(control(
                "linux-minimize",
                WindowControlArea::Min,
                "M 4,8 H 12",
                hover_bg,
            ))
            .child(control(
                "linux-maximize",
                WindowControlArea::Max,
                "M 4,4 H 12 V 12 H 4 Z",
                hover_bg,
            ))
            .child(control(
                "linux-close",
                WindowControlArea::Close,
                "M 4,4 L 12,12 M 12,4 L 4,12",
                close_hover_bg,
            ))
            .into_any_element()
    }
}
