use std::io::{self, Write};

const BAR_WIDTH: usize = 60;

/// Progress callback drawing a bar on stdout
pub(crate) fn progress_bar(label: &'static str) -> impl FnMut(f32) {
    move |fraction| {
        let fraction = fraction.clamp(0.0, 1.0);
        let filled = (BAR_WIDTH as f32 * fraction) as usize;
        print!(
            "\r  {} {:3}% [{}]",
            label,
            (100.0 * fraction) as u32,
            "#".repeat(filled) + &" ".repeat(BAR_WIDTH - filled)
        );
        let _ = io::stdout().flush();
    }
}
