use indicatif::{ProgressBar, ProgressStyle};

/// Byte progress bar for one transfer; `total` may be zero when the size is unknown.
pub fn transfer_bar(total: u64, label: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "{msg:>11} [{bar:40.cyan/blue}] {bytes}/{total_bytes} @ {bytes_per_sec} ({eta})",
    ) {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar.set_message(label.to_string());
    bar
}
