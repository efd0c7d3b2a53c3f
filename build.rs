//! 构建时生成应用图标 icon.ico 并嵌入 Windows 可执行文件

/// 番茄红表盘
#[cfg(windows)]
const DIAL: (u8, u8, u8) = (217, 17, 83);
/// 白色指针
#[cfg(windows)]
const HAND: (u8, u8, u8) = (255, 255, 255);

/// 画一个小表盘：实心圆 + 指向 12 点的指针
#[cfg(windows)]
fn make_rgba_dial(size: u32) -> Vec<u8> {
    let center = (size as f32) * 0.5;
    let radius = (size as f32) * 0.44;
    let hand_width = ((size as f32) * 0.06).max(1.0);
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32) + 0.5 - center;
            let dy = (y as f32) + 0.5 - center;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > radius {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            } else if dx.abs() <= hand_width && dy <= 0.0 && dist >= (size as f32) * 0.1 {
                rgba.extend_from_slice(&[HAND.0, HAND.1, HAND.2, 255]);
            } else {
                rgba.extend_from_slice(&[DIAL.0, DIAL.1, DIAL.2, 255]);
            }
        }
    }
    rgba
}

fn main() {
    #[cfg(windows)]
    {
        let manifest_dir = std::path::PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap());
        let icon_path = manifest_dir.join("icon.ico");

        let mut icon_dir = ico::IconDir::new(ico::ResourceType::Icon);
        for &size in &[16u32, 32u32, 48u32] {
            let rgba = make_rgba_dial(size);
            let image = ico::IconImage::from_rgba_data(size, size, rgba);
            let entry = ico::IconDirEntry::encode(&image).expect("encode icon entry");
            icon_dir.add_entry(entry);
        }

        let mut file = std::fs::File::create(&icon_path).expect("create icon.ico");
        icon_dir.write(&mut file).expect("write icon.ico");

        let mut res = winres::WindowsResource::new();
        res.set_icon("icon.ico");
        if let Err(e) = res.compile() {
            eprintln!("winres: {} (若未装 Windows SDK/rc.exe，可忽略，图标将不嵌入 exe)", e);
        }
    }
}
