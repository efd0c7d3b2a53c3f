//! 标题栏按钮图标的程序化绘制：布尔形状谓词 → 双色位图
//!
//! 不依赖任何图片资源，每个图标由一个 `(x, y, size) -> bool` 谓词描述，
//! 为真的像素填前景色，其余填背景色。纯函数、无状态。

use egui::{Color32, ColorImage};

/// 形状谓词：`(x, y, size)` 为真表示该像素属于图标前景。
/// `size` 取图标宽度（按钮为正方形时宽高一致）。
pub type ShapeFn = fn(usize, usize, usize) -> bool;

/// x 是否落在 `[size*lo, size*hi]` 水平带内
fn x_band(x: usize, size: usize, lo: f32, hi: f32) -> bool {
    let s = size as f32;
    x >= (s * lo) as usize && x <= (s * hi) as usize
}

/// 最小化：水平短横线，位于垂直中点，横向只取中央 30%
pub fn minimize_shape(x: usize, y: usize, size: usize) -> bool {
    x_band(x, size, 0.35, 0.65) && y == size / 2
}

/// 关闭：中央 30% 方形区域内的两条对角线
pub fn close_shape(x: usize, y: usize, size: usize) -> bool {
    x_band(x, size, 0.35, 0.65) && (x == y || y == size - x)
}

/// 方框描边：边界落在 `size*lo` 与 `size*hi` 上的空心正方形。
/// 包围带在低端放宽 3%，与描边像素的取整误差对齐。
fn square_outline(x: usize, y: usize, size: usize, lo: f32, hi: f32) -> bool {
    let s = size as f32;
    let (y_lo, y_hi) = (s * (lo - 0.03), s * hi);
    let edge_lo = (s * lo) as usize;
    let edge_hi = (s * hi) as usize;
    x_band(x, size, lo - 0.03, hi)
        && (y as f32) >= y_lo
        && (y as f32) <= y_hi
        && (x == edge_lo || x == edge_hi || y == edge_lo || y == edge_hi)
}

/// 最大化：35%–65% 的空心正方形
pub fn maximize_shape(x: usize, y: usize, size: usize) -> bool {
    square_outline(x, y, size, 0.35, 0.65)
}

/// 还原（最大化后的变体）：两个叠加的空心正方形
pub fn restore_shape(x: usize, y: usize, size: usize) -> bool {
    square_outline(x, y, size, 0.35, 0.65) || square_outline(x, y, size, 0.45, 0.55)
}

/// 按谓词光栅化为双色位图。对每个像素求值一次，确定性输出。
pub fn render_icon(shape: ShapeFn, width: usize, height: usize, fg: Color32, bg: Color32) -> ColorImage {
    debug_assert!(width > 0 && height > 0, "icon dimensions must be positive");
    let mut image = ColorImage::filled([width, height], bg);
    for y in 0..height {
        for x in 0..width {
            if shape(x, y, width) {
                image[(x, y)] = fg;
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: usize = 32;
    const FG: Color32 = Color32::WHITE;
    const BG: Color32 = Color32::from_rgb(128, 128, 128);

    #[test]
    fn render_is_deterministic() {
        let a = render_icon(close_shape, SIZE, SIZE, FG, BG);
        let b = render_icon(close_shape, SIZE, SIZE, FG, BG);
        assert_eq!(a.pixels, b.pixels);
    }

    #[test]
    fn close_icon_symmetric_under_xy_swap() {
        // 对角线图形在遮罩带内关于 x/y 交换对称
        let img = render_icon(close_shape, SIZE, SIZE, FG, BG);
        for y in 0..SIZE {
            for x in 0..SIZE {
                if x_band(x, SIZE, 0.35, 0.65) && x_band(y, SIZE, 0.35, 0.65) {
                    assert_eq!(img[(x, y)], img[(y, x)], "asymmetry at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn minimize_icon_is_single_midline_row() {
        let img = render_icon(minimize_shape, SIZE, SIZE, FG, BG);
        for y in 0..SIZE {
            for x in 0..SIZE {
                let expected = y == SIZE / 2 && x_band(x, SIZE, 0.35, 0.65);
                assert_eq!(img[(x, y)] == FG, expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn maximize_icon_is_hollow() {
        let img = render_icon(maximize_shape, SIZE, SIZE, FG, BG);
        let lo = (SIZE as f32 * 0.35) as usize;
        let hi = (SIZE as f32 * 0.65) as usize;
        // 四角在描边上
        assert_eq!(img[(lo, lo)], FG);
        assert_eq!(img[(hi, hi)], FG);
        assert_eq!(img[(lo, hi)], FG);
        assert_eq!(img[(hi, lo)], FG);
        // 中心为空
        assert_eq!(img[(SIZE / 2, SIZE / 2)], BG);
    }

    #[test]
    fn restore_icon_adds_inner_square() {
        let outer = render_icon(maximize_shape, SIZE, SIZE, FG, BG);
        let both = render_icon(restore_shape, SIZE, SIZE, FG, BG);
        let inner_lo = (SIZE as f32 * 0.45) as usize;
        // 外框仍在
        for (a, b) in outer.pixels.iter().zip(both.pixels.iter()) {
            if *a == FG {
                assert_eq!(*b, FG);
            }
        }
        // 内框角是还原图标新增的
        assert_eq!(both[(inner_lo, inner_lo)], FG);
        assert_eq!(outer[(inner_lo, inner_lo)], BG);
    }
}
