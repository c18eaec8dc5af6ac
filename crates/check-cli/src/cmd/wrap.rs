use anyhow::{bail, Result};
use check_template::LayoutConfig;

/// Print the one or two lines an amount in words is laid out on
pub fn cmd_wrap(layout: &LayoutConfig, text: &str, width: u32, font_size: u32) -> Result<()> {
    if width == 0 || font_size == 0 {
        bail!("width and font size must be positive");
    }

    let (line1, line2) = layout.measure().split_amount_in_words(text, width, font_size);
    println!("{line1}");
    if !line2.is_empty() {
        println!("{line2}");
    }
    Ok(())
}
