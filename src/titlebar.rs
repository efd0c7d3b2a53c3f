//! 自绘标题栏：无边框窗口的拖拽移动、双击最大化与最小化/最大化/关闭按钮
//!
//! 交互逻辑全部收在 [`TitleBar`] 控制器里，通过 [`TitleBarEvent`] 驱动、
//! 产出 [`WindowCommand`]，不直接触碰窗口系统——egui 胶水层（[`TitleBar::show`]）
//! 负责把指针输入翻译成事件、把命令翻译成 `ViewportCommand`。
//! 这样拖拽/双击/最大化的全部状态机都能脱离窗口做单元测试。

use std::collections::HashMap;
use std::time::{Duration, Instant};

use egui::{pos2, vec2, Align2, Color32, CornerRadius, FontId, Pos2, Rect, Sense, TextureHandle, Vec2};

use crate::icon::{self, ShapeFn};

/// 标题栏按钮，既是布局顺序里的元素，也是行为选择子
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Minimize,
    Maximize,
    Close,
}

impl Button {
    /// 常规图标形状
    fn shape(self) -> ShapeFn {
        match self {
            Button::Minimize => icon::minimize_shape,
            Button::Maximize => icon::maximize_shape,
            Button::Close => icon::close_shape,
        }
    }

    /// 最大化按钮在已最大化时换用的「还原」形状
    fn restore_shape(self) -> Option<ShapeFn> {
        match self {
            Button::Maximize => Some(icon::restore_shape),
            _ => None,
        }
    }
}

/// 按钮的视觉状态，随 hover / 按下切换贴图
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ButtonVisual {
    #[default]
    Idle,
    Hover,
    Pressed,
}

/// 构造期配置。链式 setter 覆盖默认值，同一字段后写的生效。
#[derive(Clone, Debug)]
pub struct TitleBarOptions {
    color: Color32,
    /// 未设置时取基色提亮 10%
    highlight_color: Option<Color32>,
    /// 未设置时取基色提亮 20%
    press_color: Option<Color32>,
    height: f32,
    title: String,
    title_font_size: f32,
    title_x_offset: f32,
    title_text_color: Color32,
    buttons: Vec<Button>,
    button_width: f32,
    double_click_threshold: Duration,
}

impl Default for TitleBarOptions {
    fn default() -> Self {
        Self {
            color: Color32::from_rgb(128, 128, 128),
            highlight_color: None,
            press_color: None,
            height: 32.0,
            title: String::new(),
            title_font_size: 17.0,
            title_x_offset: 10.0,
            title_text_color: Color32::WHITE,
            buttons: vec![Button::Minimize, Button::Maximize, Button::Close],
            button_width: 32.0,
            double_click_threshold: Duration::from_millis(200),
        }
    }
}

impl TitleBarOptions {
    pub fn with_color(mut self, color: Color32) -> Self {
        self.color = color;
        self
    }

    pub fn with_highlight_color(mut self, color: Color32) -> Self {
        self.highlight_color = Some(color);
        self
    }

    pub fn with_press_color(mut self, color: Color32) -> Self {
        self.press_color = Some(color);
        self
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_title_font_size(mut self, size: f32) -> Self {
        self.title_font_size = size;
        self
    }

    pub fn with_title_x_offset(mut self, offset: f32) -> Self {
        self.title_x_offset = offset;
        self
    }

    pub fn with_title_text_color(mut self, color: Color32) -> Self {
        self.title_text_color = color;
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_button_width(mut self, width: f32) -> Self {
        self.button_width = width;
        self
    }

    pub fn with_double_click_threshold(mut self, threshold: Duration) -> Self {
        self.double_click_threshold = threshold;
        self
    }

    /// 补全未设置的派生色，得到最终样式
    pub fn resolve(self) -> TitleBarStyle {
        debug_assert!(self.height > 0.0 && self.button_width > 0.0, "title bar dimensions must be positive");
        let highlight_color = self.highlight_color.unwrap_or_else(|| lighten(self.color, 0.10));
        let press_color = self.press_color.unwrap_or_else(|| lighten(self.color, 0.20));
        TitleBarStyle {
            color: self.color,
            highlight_color,
            press_color,
            height: self.height,
            title: self.title,
            title_font_size: self.title_font_size,
            title_x_offset: self.title_x_offset,
            title_text_color: self.title_text_color,
            buttons: self.buttons,
            button_width: self.button_width,
            double_click_threshold: self.double_click_threshold,
        }
    }
}

/// 解析后的样式：highlight/press 一定有值
#[derive(Clone, Debug)]
pub struct TitleBarStyle {
    pub color: Color32,
    pub highlight_color: Color32,
    pub press_color: Color32,
    pub height: f32,
    pub title: String,
    pub title_font_size: f32,
    pub title_x_offset: f32,
    pub title_text_color: Color32,
    pub buttons: Vec<Button>,
    pub button_width: f32,
    pub double_click_threshold: Duration,
}

/// 每个通道向白色插值 `frac`，向上取整保证结果严格更亮
pub fn lighten(color: Color32, frac: f32) -> Color32 {
    let ch = |c: u8| ((c as f32 + (255.0 - c as f32) * frac).ceil().min(255.0)) as u8;
    Color32::from_rgb(ch(color.r()), ch(color.g()), ch(color.b()))
}

/// 还原最大化时要回到的几何：最大化前一刻记下的外框位置 + 内容尺寸
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowGeometry {
    pub outer_pos: Pos2,
    pub inner_size: Vec2,
}

/// 控制器产出的窗口操作，由胶水层转成 `ViewportCommand`
#[derive(Clone, Debug, PartialEq)]
pub enum WindowCommand {
    Move(Pos2),
    Maximize,
    Restore(WindowGeometry),
    Minimize,
    Quit,
}

/// 输入事件。坐标一律是窗口本地逻辑坐标。
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TitleBarEvent {
    HoverStart(Button),
    HoverStop(Button),
    Press(Button),
    Release(Button),
    Click(Button),
    /// 拖拽区按下，携带当时的指针位置
    BarPress { cursor: Pos2 },
    BarRelease,
    /// 每帧一次，拖拽时据此计算位移
    FrameTick { cursor: Pos2 },
    ViewportResized { width: f32, height: f32 },
}

/// 标题栏控制器。单线程事件驱动，所有字段只被自己的事件处理改写。
pub struct TitleBar {
    style: TitleBarStyle,
    window_size: Vec2,
    last_press_at: Option<Instant>,
    drag_origin: Pos2,
    dragging: bool,
    maximized: bool,
    restore_geometry: Option<WindowGeometry>,
    /// 窗口在桌面上的坐标，独立于窗口系统自己的记录，用于拖拽位移累加。
    /// 嵌入方启动时写入初始位置，之后由拖拽更新。
    desktop_position: Pos2,
    visuals: HashMap<Button, ButtonVisual>,
}

impl TitleBar {
    pub fn new(options: TitleBarOptions, window_size: Vec2, desktop_position: Pos2) -> Self {
        let style = options.resolve();
        let visuals = style.buttons.iter().map(|&b| (b, ButtonVisual::Idle)).collect();
        Self {
            style,
            window_size,
            last_press_at: None,
            drag_origin: Pos2::ZERO,
            dragging: false,
            maximized: false,
            restore_geometry: None,
            desktop_position,
            visuals,
        }
    }

    pub fn style(&self) -> &TitleBarStyle {
        &self.style
    }

    pub fn desktop_position(&self) -> Pos2 {
        self.desktop_position
    }

    pub fn dragging(&self) -> bool {
        self.dragging
    }

    /// 最大化按钮当前贴图变体的后缀，始终与 `maximized` 一致
    pub fn icon_suffix(&self) -> &'static str {
        if self.maximized {
            "-revert"
        } else {
            ""
        }
    }

    fn visual(&self, button: Button) -> ButtonVisual {
        self.visuals.get(&button).copied().unwrap_or_default()
    }

    fn total_button_width(&self) -> f32 {
        self.style.button_width * self.style.buttons.len() as f32
    }

    /// 拖拽区宽度 = 窗口宽 − 按钮占用的总宽
    pub fn drag_bar_width(&self) -> f32 {
        self.window_size.x - self.total_button_width()
    }

    /// 第 i 个按钮的矩形，靠右依次排列
    pub fn button_rect(&self, index: usize) -> Rect {
        let x = self.window_size.x - self.total_button_width() + index as f32 * self.style.button_width;
        Rect::from_min_size(pos2(x, 0.0), vec2(self.style.button_width, self.style.height))
    }

    /// 处理一条事件，返回要对窗口执行的操作
    pub fn handle(&mut self, event: TitleBarEvent, now: Instant) -> Vec<WindowCommand> {
        let mut commands = Vec::new();
        match event {
            TitleBarEvent::HoverStart(button) => {
                if self.visual(button) == ButtonVisual::Idle {
                    self.visuals.insert(button, ButtonVisual::Hover);
                }
            }
            TitleBarEvent::HoverStop(button) => {
                self.visuals.insert(button, ButtonVisual::Idle);
            }
            TitleBarEvent::Press(button) => {
                self.visuals.insert(button, ButtonVisual::Pressed);
            }
            TitleBarEvent::Release(button) => {
                if self.visual(button) == ButtonVisual::Pressed {
                    self.visuals.insert(button, ButtonVisual::Hover);
                }
            }
            TitleBarEvent::Click(button) => {
                self.visuals.insert(button, ButtonVisual::Hover);
                commands.extend(self.click_command(button));
            }
            TitleBarEvent::BarPress { cursor } => {
                let double_click = self
                    .last_press_at
                    .is_some_and(|t| now.saturating_duration_since(t) < self.style.double_click_threshold);
                if double_click {
                    if self.style.buttons.contains(&Button::Maximize) {
                        commands.extend(self.toggle_maximize());
                    }
                    // 不清掉的话窗口缩回后拖拽会残留
                    self.dragging = false;
                } else {
                    self.last_press_at = Some(now);
                    self.dragging = true;
                    self.drag_origin = cursor;
                }
            }
            TitleBarEvent::BarRelease => {
                self.dragging = false;
            }
            TitleBarEvent::FrameTick { cursor } => {
                if self.dragging {
                    let delta = cursor - self.drag_origin;
                    if delta != Vec2::ZERO {
                        self.desktop_position += delta;
                        if self.maximized {
                            commands.extend(self.toggle_maximize());
                        }
                        commands.push(WindowCommand::Move(self.desktop_position));
                        // 拖拽起点跑出窗口本地范围后重新锚定，避免位移失控
                        let bounds = Rect::from_min_size(Pos2::ZERO, self.window_size);
                        if !bounds.contains(self.drag_origin) {
                            self.drag_origin = pos2(self.window_size.x / 2.0, 16.0);
                        }
                    }
                }
            }
            TitleBarEvent::ViewportResized { width, height } => {
                self.window_size = vec2(width, height);
            }
        }
        commands
    }

    /// 按钮 → 点击行为对照表
    fn click_command(&mut self, button: Button) -> Vec<WindowCommand> {
        match button {
            Button::Minimize => vec![WindowCommand::Minimize],
            Button::Close => vec![WindowCommand::Quit],
            Button::Maximize => self.toggle_maximize(),
        }
    }

    /// 最大化 ↔ 还原。最大化时记下当前几何，还原时原样回放。
    fn toggle_maximize(&mut self) -> Vec<WindowCommand> {
        if self.maximized {
            self.maximized = false;
            match self.restore_geometry.take() {
                Some(geometry) => vec![WindowCommand::Restore(geometry)],
                None => Vec::new(),
            }
        } else {
            self.maximized = true;
            self.restore_geometry = Some(WindowGeometry {
                outer_pos: self.desktop_position,
                inner_size: self.window_size,
            });
            vec![WindowCommand::Maximize]
        }
    }

    /// egui 胶水：画出标题栏、把指针输入翻译成事件并处理。
    /// `cursor` 是窗口本地指针位置（Windows 下来自全局查询，
    /// 指针移出窗口时仍然有效——拖拽往上甩时常见）。
    pub fn show(&mut self, ctx: &egui::Context, icons: &IconSet, cursor: Option<Pos2>) -> Vec<WindowCommand> {
        let now = Instant::now();
        let mut commands = Vec::new();

        let screen = ctx.screen_rect();
        if screen.size() != self.window_size {
            commands.extend(self.handle(
                TitleBarEvent::ViewportResized {
                    width: screen.width(),
                    height: screen.height(),
                },
                now,
            ));
        }

        let mut events = Vec::new();
        egui::TopBottomPanel::top("titlebar")
            .exact_height(self.style.height)
            .frame(egui::Frame::NONE)
            .show_separator_line(false)
            .show(ctx, |ui| {
                self.collect_events(ui, icons, cursor, &mut events);
            });
        for event in events {
            commands.extend(self.handle(event, now));
        }

        if let Some(cursor) = cursor {
            commands.extend(self.handle(TitleBarEvent::FrameTick { cursor }, now));
        }
        commands
    }

    fn collect_events(
        &mut self,
        ui: &mut egui::Ui,
        icons: &IconSet,
        cursor: Option<Pos2>,
        events: &mut Vec<TitleBarEvent>,
    ) {
        let painter = ui.painter().clone();

        // 拖拽区背景 + 标题
        let bar_rect = Rect::from_min_size(Pos2::ZERO, vec2(self.drag_bar_width(), self.style.height));
        painter.rect_filled(bar_rect, CornerRadius::ZERO, self.style.color);
        painter.text(
            pos2(self.style.title_x_offset, self.style.height / 2.0),
            Align2::LEFT_CENTER,
            &self.style.title,
            FontId::proportional(self.style.title_font_size),
            self.style.title_text_color,
        );

        let bar_response = ui.interact(bar_rect, ui.id().with("drag-bar"), Sense::click_and_drag());
        let (pressed_now, released_now, interact_pos) = ui.input(|i| {
            (i.pointer.primary_pressed(), i.pointer.primary_released(), i.pointer.interact_pos())
        });
        if pressed_now && bar_response.is_pointer_button_down_on() {
            if let Some(cursor) = cursor.or(interact_pos) {
                events.push(TitleBarEvent::BarPress { cursor });
            }
        }
        if released_now {
            events.push(TitleBarEvent::BarRelease);
        }

        for (index, &button) in self.style.buttons.iter().enumerate() {
            let rect = self.button_rect(index);
            let response = ui.interact(rect, ui.id().with(("titlebar-button", index)), Sense::click());
            let hovering = response.contains_pointer();
            let down = response.is_pointer_button_down_on();
            let visual = self.visual(button);

            match visual {
                ButtonVisual::Idle if hovering => events.push(TitleBarEvent::HoverStart(button)),
                ButtonVisual::Hover | ButtonVisual::Pressed if !hovering => {
                    events.push(TitleBarEvent::HoverStop(button))
                }
                _ => {}
            }
            if down && visual != ButtonVisual::Pressed {
                events.push(TitleBarEvent::Press(button));
            } else if !down && visual == ButtonVisual::Pressed && hovering {
                events.push(TitleBarEvent::Release(button));
            }
            if response.clicked() {
                events.push(TitleBarEvent::Click(button));
            }

            let revert = button == Button::Maximize && !self.icon_suffix().is_empty();
            if let Some(texture) = icons.texture(button, visual, revert) {
                painter.image(
                    texture.id(),
                    rect,
                    Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                    Color32::WHITE,
                );
            }
        }
    }
}

/// 每个按钮各视觉状态的贴图，构造时一次性光栅化并上传
pub struct IconSet {
    textures: HashMap<(Button, ButtonVisual, bool), TextureHandle>,
}

impl IconSet {
    pub fn load(ctx: &egui::Context, style: &TitleBarStyle) -> Self {
        const FG: Color32 = Color32::WHITE;
        let width = style.button_width as usize;
        let height = style.height as usize;
        let mut textures = HashMap::new();
        for &button in &style.buttons {
            for (visual, bg) in [
                (ButtonVisual::Idle, style.color),
                (ButtonVisual::Hover, style.highlight_color),
                (ButtonVisual::Pressed, style.press_color),
            ] {
                let image = icon::render_icon(button.shape(), width, height, FG, bg);
                textures.insert(
                    (button, visual, false),
                    ctx.load_texture(texture_name(button, visual, false), image, egui::TextureOptions::NEAREST),
                );
                if let Some(shape) = button.restore_shape() {
                    let image = icon::render_icon(shape, width, height, FG, bg);
                    textures.insert(
                        (button, visual, true),
                        ctx.load_texture(texture_name(button, visual, true), image, egui::TextureOptions::NEAREST),
                    );
                }
            }
        }
        Self { textures }
    }

    pub fn texture(&self, button: Button, visual: ButtonVisual, revert: bool) -> Option<&TextureHandle> {
        self.textures.get(&(button, visual, revert))
    }
}

fn texture_name(button: Button, visual: ButtonVisual, revert: bool) -> String {
    format!(
        "titlebar-{:?}-{:?}{}",
        button,
        visual,
        if revert { "-revert" } else { "" }
    )
}
