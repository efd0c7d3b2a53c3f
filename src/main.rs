//! PMDR — 无边框番茄倒计时（Rust + egui，自绘标题栏）

mod app;
mod countdown;
mod db;
mod icon;
mod settings;
mod titlebar;

/// 默认窗口尺寸（逻辑像素）
const WINDOW_SIZE: (f32, f32) = (240.0, 150.0);

fn main() -> eframe::Result<()> {
    env_logger::init();

    let saved = settings::load();
    let initial_pos = saved
        .window_pos
        .map(|(x, y)| egui::pos2(x, y))
        .unwrap_or(egui::pos2(100.0, 100.0));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_SIZE.0, WINDOW_SIZE.1])
            .with_position(initial_pos)
            .with_decorations(false) // 系统标题栏关掉，窗口 chrome 全部自绘
            .with_window_level(egui::viewport::WindowLevel::AlwaysOnTop)
            .with_title("PMDR")
            .with_icon(egui::IconData::default()),
        ..Default::default()
    };
    eframe::run_native(
        "PMDR",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::PmdrApp::new(
                cc,
                initial_pos,
                egui::vec2(WINDOW_SIZE.0, WINDOW_SIZE.1),
            )))
        }),
    )
}
