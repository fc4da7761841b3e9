mod support;

use sanbot_tui::core::output::encode_all;
use sanbot_tui::DiffRenderer;
use support::screen::{plain, Screen};
use support::to_lines;

const WIDTH: usize = 20;
const HEIGHT: usize = 6;

fn render(renderer: &mut DiffRenderer, lines: &[&str]) -> String {
    encode_all(&renderer.render(to_lines(lines).into(), WIDTH, HEIGHT, false))
}

#[test]
fn unchanged_frame_writes_nothing() {
    let mut renderer = DiffRenderer::new();
    render(&mut renderer, &["a", "b"]);
    assert_eq!(render(&mut renderer, &["a", "b"]), "");
}

#[test]
fn single_line_change_rewrites_only_that_line() {
    let mut renderer = DiffRenderer::new();
    render(&mut renderer, &["one", "two", "three"]);

    let output = render(&mut renderer, &["one", "TWO", "three"]);
    assert!(output.contains("TWO"));
    assert!(!output.contains("one"));
    assert!(output.contains("three"));
    assert!(!output.contains("\x1b[2J"));
    assert_eq!(renderer.hardware_cursor_row(), 2);
}

#[test]
fn shrinking_blanks_removed_rows_without_rewriting_kept_ones() {
    let mut renderer = DiffRenderer::new();
    let mut screen = Screen::new(WIDTH, HEIGHT);
    screen.feed(&render(&mut renderer, &["l0", "l1", "l2", "l3", "l4"]));

    let output = render(&mut renderer, &["l0", "l1", "l2"]);
    screen.feed(&output);

    for kept in ["l0", "l1", "l2"] {
        assert!(!output.contains(kept), "{kept} was rewritten: {output:?}");
    }
    assert_eq!(screen.rows(), vec!["l0", "l1", "l2", "", "", ""]);
    assert_eq!(renderer.hardware_cursor_row(), 4);
}

#[test]
fn appended_lines_scroll_into_view() {
    let mut renderer = DiffRenderer::new();
    let mut screen = Screen::new(WIDTH, 3);
    screen.feed(&encode_all(&renderer.render(to_lines(&["a", "b"]).into(), WIDTH, 3, false)));
    screen.feed(&encode_all(&renderer.render(
        to_lines(&["a", "b", "c", "d"]).into(),
        WIDTH,
        3,
        false,
    )));
    assert_eq!(screen.rows(), vec!["b", "c", "d"]);
}

#[test]
fn change_above_viewport_falls_back_to_full_render() {
    let mut renderer = DiffRenderer::new();
    let all: Vec<String> = (0..10).map(|i| format!("row {i}")).collect();
    renderer.render(all.clone().into(), WIDTH, HEIGHT, false);

    let mut changed = all;
    changed[0] = "edited".to_string();
    let output = encode_all(&renderer.render(changed.into(), WIDTH, HEIGHT, false));
    assert!(output.contains("\x1b[2J"));
}

#[test]
fn full_render_after_resize_matches_first_render() {
    let frame = to_lines(&["hello", "world"]);

    let mut fresh = DiffRenderer::new();
    let first = encode_all(&fresh.render(frame.clone().into(), 30, HEIGHT, false));

    let mut resized = DiffRenderer::new();
    resized.render(frame.clone().into(), 20, HEIGHT, false);
    let after = encode_all(&resized.render(frame.into(), 30, HEIGHT, false));

    assert_eq!(after, first);
}

#[test]
fn clear_on_shrink_forces_full_render() {
    let mut renderer = DiffRenderer::new();
    renderer.render(to_lines(&["a", "b", "c"]).into(), WIDTH, HEIGHT, true);
    let output = encode_all(&renderer.render(to_lines(&["a"]).into(), WIDTH, HEIGHT, true));
    assert!(output.contains("\x1b[2J"));
}

#[test]
fn over_wide_lines_are_clamped_not_wrapped() {
    let mut renderer = DiffRenderer::new();
    let mut screen = Screen::new(8, HEIGHT);
    let output = encode_all(&renderer.render(
        to_lines(&["abcdefghijkl", "next"]).into(),
        8,
        HEIGHT,
        false,
    ));
    screen.feed(&output);
    assert_eq!(&screen.rows()[..2], &["abcdefgh".to_string(), "next".to_string()]);
}

#[test]
fn screen_tracks_a_sequence_of_edits() {
    let mut renderer = DiffRenderer::new();
    let mut screen = Screen::new(WIDTH, HEIGHT);
    let frames: [&[&str]; 5] = [
        &["header", "> "],
        &["header", "> h"],
        &["header", "> hi", "thinking"],
        &["header", "you: hi"],
        &["header", "you: hi", "bot: hello", "> "],
    ];
    for frame in frames {
        screen.feed(&render(&mut renderer, frame));
        let mut expected: Vec<String> = frame.iter().map(|line| plain(line)).collect();
        expected.resize(HEIGHT, String::new());
        assert_eq!(screen.rows(), expected);
    }
}
