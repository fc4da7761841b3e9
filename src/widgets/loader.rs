//! Spinner widget.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::component::Component;
use crate::core::text::utils::fit_to_width;
use crate::runtime::tui::RenderHandle;

type RenderRequester = Arc<dyn Fn() + Send + Sync>;
pub type ColorFn = Box<dyn Fn(&str) -> String>;

pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// One-line spinner plus message. A ticker thread advances the frame every
/// [`FRAME_INTERVAL`] and asks the runtime for a render.
pub struct Loader {
    spinner_color_fn: ColorFn,
    message_color_fn: ColorFn,
    message: String,
    render_requester: Option<RenderRequester>,
    current_frame: Arc<AtomicUsize>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Loader {
    pub fn new(
        render_handle: RenderHandle,
        spinner_color_fn: ColorFn,
        message_color_fn: ColorFn,
        message: impl Into<String>,
    ) -> Self {
        let requester = Arc::new(move || render_handle.request_render());
        Self::with_requester(Some(requester), spinner_color_fn, message_color_fn, message)
    }

    pub(crate) fn with_requester(
        render_requester: Option<RenderRequester>,
        spinner_color_fn: ColorFn,
        message_color_fn: ColorFn,
        message: impl Into<String>,
    ) -> Self {
        Self {
            spinner_color_fn,
            message_color_fn,
            message: message.into(),
            render_requester,
            current_frame: Arc::new(AtomicUsize::new(0)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    pub fn start(&mut self) {
        if self.thread.is_some() {
            return;
        }

        self.stop_flag.store(false, Ordering::SeqCst);
        self.request_render();

        let stop_flag = Arc::clone(&self.stop_flag);
        let current_frame = Arc::clone(&self.current_frame);
        let render_requester = self.render_requester.clone();

        self.thread = Some(thread::spawn(move || {
            while !stop_flag.load(Ordering::SeqCst) {
                thread::sleep(FRAME_INTERVAL);
                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }
                current_frame.fetch_add(1, Ordering::SeqCst);
                if let Some(request) = render_requester.as_ref() {
                    request();
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.request_render();
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn request_render(&self) {
        if let Some(requester) = self.render_requester.as_ref() {
            requester();
        }
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Component for Loader {
    fn render(&mut self, width: usize) -> Vec<String> {
        let idx = self.current_frame.load(Ordering::SeqCst) % SPINNER_FRAMES.len();
        let spinner = (self.spinner_color_fn)(SPINNER_FRAMES[idx]);
        let message = (self.message_color_fn)(&self.message);
        vec![fit_to_width(&format!("{spinner} {message}"), width)]
    }
}
