//! Minimal chat loop: type a message, press Enter, get an echo back.
//!
//! Run with `cargo run --example chat`. Press Ctrl-C twice to quit.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use sanbot_tui::{
    component_rc, logging, Container, Divider, Editor, Loader, ProcessTerminal, Spacer, Text, TUI,
};

const THINK_TIME: Duration = Duration::from_millis(600);

fn main() -> sanbot_tui::Result<()> {
    logging::init_from_env()?;

    let root = Rc::new(RefCell::new(Container::new()));
    let history = Rc::new(RefCell::new(Container::new()));
    let editor = Rc::new(RefCell::new(Editor::default()));
    let submitted = Rc::new(RefCell::new(Vec::new()));

    editor.borrow_mut().set_on_submit(Some(Box::new({
        let submitted = Rc::clone(&submitted);
        move |text| submitted.borrow_mut().push(text)
    })));

    {
        let mut root = root.borrow_mut();
        root.add_child(component_rc(Text::with_padding(
            "\x1b[1msanbot\x1b[22m  type a message, Ctrl-C twice to quit",
            1,
            0,
        )));
        root.add_child(component_rc(Divider::new()));
        root.add_child(history.clone());
        root.add_child(component_rc(Spacer::with_lines(1)));
        root.add_child(editor.clone());
    }

    let mut tui = TUI::new(ProcessTerminal::new(), root.clone());
    tui.set_focus(editor.clone());
    tui.start()?;

    let mut pending: Option<(String, Instant, Rc<RefCell<Loader>>)> = None;

    while !tui.exit_requested() && tui.is_running() {
        tui.run_blocking_once();

        for text in submitted.borrow_mut().drain(..) {
            history.borrow_mut().add_child(component_rc(Text::with_padding(
                format!("\x1b[36myou\x1b[39m  {text}"),
                1,
                0,
            )));
            if pending.is_none() {
                let loader = Rc::new(RefCell::new(Loader::new(
                    tui.render_handle(),
                    Box::new(|s| format!("\x1b[36m{s}\x1b[39m")),
                    Box::new(|s| format!("\x1b[2m{s}\x1b[22m")),
                    "thinking",
                )));
                loader.borrow_mut().start();
                history.borrow_mut().add_child(loader.clone());
                pending = Some((text, Instant::now(), loader));
            }
            tui.request_render();
        }

        let ready = pending
            .as_ref()
            .is_some_and(|(_, since, _)| since.elapsed() >= THINK_TIME);
        if ready {
            if let Some((text, _, loader)) = pending.take() {
                loader.borrow_mut().stop();
                let loader: sanbot_tui::ComponentRc = loader;
                let mut history = history.borrow_mut();
                history.remove_child(&loader);
                history.add_child(component_rc(Text::with_padding(
                    format!("\x1b[35mbot\x1b[39m  you said: {text}"),
                    1,
                    0,
                )));
            }
            tui.request_render();
        }
    }

    tui.stop()?;
    Ok(())
}
