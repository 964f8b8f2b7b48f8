//! Terminal progress indicator shown while a request is in flight.

use std::io::{self, Write};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame interval.
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Renders `⠋ <caption>` on stderr from a background task until
/// stopped, then clears the line. Stderr so it never mixes with the
/// response text on stdout.
pub struct Spinner {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Spinner {
    /// Start spinning with the given caption (e.g. `"Thinking..."`).
    pub fn start(caption: &str) -> Self {
        let (cancel, mut cancelled) = oneshot::channel::<()>();
        let caption = caption.to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FRAME_INTERVAL);
            let mut frame = 0usize;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // \r returns to column 0, \x1b[2K clears the line
                        eprint!("\x1b[2K\r{} {caption}", FRAMES[frame % FRAMES.len()]);
                        let _ = io::stderr().flush();
                        frame += 1;
                    }
                    _ = &mut cancelled => break,
                }
            }
            eprint!("\x1b[2K\r");
            let _ = io::stderr().flush();
        });

        Self { cancel, handle }
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(self) {
        let _ = self.cancel.send(());
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_single_chars() {
        for frame in FRAMES {
            assert_eq!(frame.chars().count(), 1);
        }
    }

    #[tokio::test]
    async fn runs_and_stops_cleanly() {
        let spinner = Spinner::start("testing");
        tokio::time::sleep(Duration::from_millis(200)).await;
        spinner.stop().await;
    }

    #[tokio::test]
    async fn stop_before_first_frame() {
        let spinner = Spinner::start("quick");
        spinner.stop().await;
    }
}
