//! egui 主界面：自绘标题栏 + 时长输入 + 倒计时显示与开始/停止

use chrono::{DateTime, Utc};
use eframe::egui;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::countdown::{self, Countdown};
use crate::db;
use crate::settings::{self, Settings};
use crate::titlebar::{IconSet, TitleBar, TitleBarOptions, WindowCommand};

/// 深色背景与文字配色
mod theme {
    pub const BG_RGB: (u8, u8, u8) = (24, 24, 30);
    pub const TEXT_WHITE: (u8, u8, u8) = (255, 255, 255);
    pub const TEXT_DIM: (u8, u8, u8) = (200, 200, 210);
    pub const ERROR_RGB: (u8, u8, u8) = (230, 80, 80);
    /// 开始/停止按钮的绿色
    pub const START_RGB: (u8, u8, u8) = (0, 128, 0);
}

/// 时长解析失败的提示停留时间
const ERROR_DISPLAY_SECS: i64 = 3;

pub struct PmdrApp {
    titlebar: TitleBar,
    icons: IconSet,
    countdown: Countdown,
    /// 下一次开始用的时长，默认 15 分钟
    duration: Duration,
    duration_input: String,
    /// 瞬态错误：文案 + 自动消失时刻
    transient_error: Option<(String, DateTime<Utc>)>,
    /// 累计完成次数，完成回调在后台线程上累加
    completed_total: Arc<AtomicU64>,
    /// 最近写盘的窗口位置，拖拽结束后变化才写
    saved_pos: egui::Pos2,
}

impl PmdrApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_pos: egui::Pos2, window_size: egui::Vec2) -> Self {
        let titlebar = TitleBar::new(
            TitleBarOptions::default().with_title("PMDR"),
            window_size,
            initial_pos,
        );
        let icons = IconSet::load(&cc.egui_ctx, titlebar.style());

        let completed_total = Arc::new(AtomicU64::new(match db::open_and_init() {
            Ok(conn) => db::completed_count(&conn).unwrap_or(0),
            Err(err) => {
                log::warn!("history database unavailable: {err}");
                0
            }
        }));

        let completed_cb = Arc::clone(&completed_total);
        let countdown = Countdown::new(Arc::new(move |duration: Duration| {
            play_done_sound();
            completed_cb.fetch_add(1, Ordering::Relaxed);
            if let Err(err) = db::record_completion(duration) {
                log::warn!("failed to record completion: {err}");
            }
        }));

        Self {
            titlebar,
            icons,
            countdown,
            duration: Duration::from_secs(15 * 60),
            duration_input: String::new(),
            transient_error: None,
            completed_total,
            saved_pos: initial_pos,
        }
    }

    fn commit_duration_input(&mut self) {
        match committed_duration(&self.duration_input) {
            None => {}
            Some(Ok(duration)) => self.duration = duration,
            Some(Err(err)) => {
                log::debug!("duration parse failed: {err}");
                let until = Utc::now() + chrono::Duration::seconds(ERROR_DISPLAY_SECS);
                self.transient_error = Some(("invalid duration".to_owned(), until));
            }
        }
    }

    fn apply_window_commands(&mut self, ctx: &egui::Context, commands: Vec<WindowCommand>) {
        use egui::ViewportCommand;
        for command in commands {
            match command {
                WindowCommand::Move(pos) => ctx.send_viewport_cmd(ViewportCommand::OuterPosition(pos)),
                WindowCommand::Maximize => ctx.send_viewport_cmd(ViewportCommand::Maximized(true)),
                WindowCommand::Restore(geometry) => {
                    ctx.send_viewport_cmd(ViewportCommand::Maximized(false));
                    ctx.send_viewport_cmd(ViewportCommand::OuterPosition(geometry.outer_pos));
                    ctx.send_viewport_cmd(ViewportCommand::InnerSize(geometry.inner_size));
                }
                WindowCommand::Minimize => ctx.send_viewport_cmd(ViewportCommand::Minimized(true)),
                WindowCommand::Quit => ctx.send_viewport_cmd(ViewportCommand::Close),
            }
        }
    }

    /// 拖拽结束后位置有变化就写盘，失败只记日志
    fn persist_position_if_moved(&mut self) {
        if self.titlebar.dragging() {
            return;
        }
        let pos = self.titlebar.desktop_position();
        if pos != self.saved_pos {
            let settings = Settings { window_pos: Some((pos.x, pos.y)) };
            if let Err(err) = settings::save(&settings) {
                log::warn!("failed to save window position: {err}");
            }
            self.saved_pos = pos;
        }
    }
}

impl eframe::App for PmdrApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let cursor = cursor_in_window(frame, ctx);
        let commands = self.titlebar.show(ctx, &self.icons, cursor);
        self.apply_window_commands(ctx, commands);
        self.persist_position_if_moved();

        let running = self.countdown.is_running();

        if let Some((_, until)) = &self.transient_error {
            if Utc::now() >= *until {
                self.transient_error = None;
            }
        }

        let (bg_r, bg_g, bg_b) = theme::BG_RGB;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::from_rgb(bg_r, bg_g, bg_b)))
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.add_space(10.0);
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.duration_input)
                            .hint_text("duration")
                            .desired_width(80.0),
                    );
                    // 回车或点到别处都算提交
                    if response.lost_focus() {
                        self.commit_duration_input();
                    }
                });
                ui.add_space(6.0);

                ui.horizontal(|ui| {
                    ui.add_space(10.0);
                    let (w_r, w_g, w_b) = theme::TEXT_WHITE;
                    ui.label(
                        egui::RichText::new(countdown::format_remaining(self.countdown.remaining_secs()))
                            .color(egui::Color32::from_rgb(w_r, w_g, w_b))
                            .size(28.0)
                            .monospace(),
                    );
                    ui.add_space(12.0);

                    let label = if running { "Stop" } else { "Start" };
                    let (s_r, s_g, s_b) = theme::START_RGB;
                    if centered_button(ui, label, egui::vec2(52.0, 22.0), egui::Color32::from_rgb(s_r, s_g, s_b))
                        .clicked()
                    {
                        self.countdown.toggle(self.duration);
                    }
                });
                ui.add_space(4.0);

                ui.horizontal(|ui| {
                    ui.add_space(10.0);
                    if let Some((message, _)) = &self.transient_error {
                        let (e_r, e_g, e_b) = theme::ERROR_RGB;
                        ui.label(
                            egui::RichText::new(message)
                                .color(egui::Color32::from_rgb(e_r, e_g, e_b))
                                .size(12.0),
                        );
                    } else {
                        let (d_r, d_g, d_b) = theme::TEXT_DIM;
                        ui.label(
                            egui::RichText::new(format!(
                                "done: {}",
                                self.completed_total.load(Ordering::Relaxed)
                            ))
                                .color(egui::Color32::from_rgb(d_r, d_g, d_b))
                                .size(12.0),
                        );
                    }
                });
            });

        // 拖拽位移与后台递减都要靠持续重绘
        ctx.request_repaint();
    }
}

/// 输入框提交：空白当作没改动，其余交给时长解析
fn committed_duration(input: &str) -> Option<Result<Duration, countdown::ParseDurationError>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(countdown::parse_duration(trimmed))
}

/// 带文字居中显示的按钮，可指定填充色
fn centered_button(
    ui: &mut egui::Ui,
    text: impl Into<egui::WidgetText>,
    size: egui::Vec2,
    fill: egui::Color32,
) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
    let visuals = ui.style().interact(&response);
    let expanded = rect.expand(visuals.expansion);
    ui.painter().rect_filled(expanded, visuals.corner_radius, fill);
    ui.painter().rect_stroke(
        expanded,
        visuals.corner_radius,
        visuals.bg_stroke,
        egui::StrokeKind::Outside,
    );
    let widget_text: egui::WidgetText = text.into();
    let galley = widget_text.into_galley(ui, None, rect.width() - 4.0, egui::TextStyle::Button);
    let pos = rect.center() - galley.size() / 2.0;
    ui.painter().galley(pos, galley, ui.visuals().text_color());
    response
}

/// 倒计时结束的提示音。派生子进程播放，不等待结果。
fn play_done_sound() {
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        let _ = std::process::Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", "[Console]::Beep(110, 2000)"])
            .creation_flags(CREATE_NO_WINDOW)
            .spawn();
    }
    #[cfg(not(windows))]
    {
        let _ = std::process::Command::new("echo").arg("\x07").status();
    }
}

/// 窗口本地的指针位置。Windows 下走全局查询再换算，
/// 指针移出窗口时仍然可用（往上拖窗口时很容易出界）。
#[cfg(windows)]
fn cursor_in_window(frame: &eframe::Frame, ctx: &egui::Context) -> Option<egui::Pos2> {
    use raw_window_handle::{HasWindowHandle, RawWindowHandle};
    use std::ffi::c_void;
    use windows_sys::Win32::Foundation::POINT;
    use windows_sys::Win32::Graphics::Gdi::ScreenToClient;
    use windows_sys::Win32::UI::WindowsAndMessaging::GetCursorPos;

    let opt = frame.window_handle().ok();
    let handle = match opt.as_ref() {
        Some(h) => h.as_ref(),
        None => return None,
    };
    let hwnd: isize = match handle {
        RawWindowHandle::Win32(w) => w.hwnd.get(),
        _ => return None,
    };
    if hwnd == 0 {
        return None;
    }
    let mut point = POINT { x: 0, y: 0 };
    if unsafe { GetCursorPos(&mut point) } == 0 {
        return None;
    }
    if unsafe { ScreenToClient(hwnd as *mut c_void, &mut point) } == 0 {
        return None;
    }
    let scale = ctx.pixels_per_point();
    Some(egui::pos2(point.x as f32 / scale, point.y as f32 / scale))
}

#[cfg(not(windows))]
fn cursor_in_window(_frame: &eframe::Frame, ctx: &egui::Context) -> Option<egui::Pos2> {
    ctx.input(|i| i.pointer.latest_pos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_commits_nothing() {
        assert_eq!(committed_duration(""), None);
        assert_eq!(committed_duration("   "), None);
    }

    #[test]
    fn nonblank_input_parses_or_reports() {
        assert_eq!(
            committed_duration("20m"),
            Some(Ok(Duration::from_secs(1200)))
        );
        assert!(matches!(committed_duration("abc"), Some(Err(_))));
    }
}
