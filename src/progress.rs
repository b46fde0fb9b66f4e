use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICKS: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Yellow braille spinner with the elapsed time and current message.
fn running_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg} \x1b[2m{elapsed}\x1b[0m")
        .unwrap()
        .tick_strings(TICKS)
}

/// Start a steadily ticking spinner on stderr.
pub fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(running_style());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message(msg);
    pb
}

/// Finish `pb` with a green check mark.
pub fn finish_ok(pb: &ProgressBar, msg: String) {
    pb.set_style(ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}").unwrap());
    pb.finish_with_message(msg);
}

/// Finish `pb` with a red cross.
pub fn finish_err(pb: &ProgressBar, msg: String) {
    pb.set_style(ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}").unwrap());
    pb.finish_with_message(msg);
}
