//! Raw input decoding: chunk tokenization and key naming.

use crate::core::text::ansi::escape_at;

pub const PASTE_START: &str = "\x1b[200~";
pub const PASTE_END: &str = "\x1b[201~";

/// A named key decoded from one input token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    /// Shift+Enter or Alt+Enter.
    NewLine,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    F(u8),
    /// Ctrl plus a lowercase letter.
    Ctrl(char),
    /// Alt plus a printable character.
    Alt(char),
}

/// One unit of a raw input chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A run of printable text.
    Text(&'a str),
    /// A bracketed paste, including its start and end brackets.
    Paste(&'a str),
    /// A control byte or a complete escape sequence with a known meaning.
    Key(&'a str),
    /// A sequence nothing understands. Dropped by the runtime.
    Unknown(&'a str),
}

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &'a str {
        match *self {
            Token::Text(s) | Token::Paste(s) | Token::Key(s) | Token::Unknown(s) => s,
        }
    }
}

/// Names a single input token, or `None` when it is plain text or unrecognized.
pub fn parse_key(data: &str) -> Option<Key> {
    let key = match data {
        "\r" | "\n" | "\x1bOM" => Key::Enter,
        "\x1b\r" | "\x1b\n" | "\x1b[13;2u" | "\x1b[13;3u" | "\x1b[27;2;13~" => Key::NewLine,
        "\t" => Key::Tab,
        "\x1b[Z" => Key::BackTab,
        "\x7f" | "\x08" => Key::Backspace,
        "\x1b[3~" => Key::Delete,
        "\x1b" => Key::Escape,
        "\x1b[A" | "\x1bOA" => Key::Up,
        "\x1b[B" | "\x1bOB" => Key::Down,
        "\x1b[C" | "\x1bOC" => Key::Right,
        "\x1b[D" | "\x1bOD" => Key::Left,
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => Key::Home,
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => Key::End,
        "\x1b[5~" => Key::PageUp,
        "\x1b[6~" => Key::PageDown,
        "\x1b[2~" => Key::Insert,
        "\x1bOP" | "\x1b[11~" => Key::F(1),
        "\x1bOQ" | "\x1b[12~" => Key::F(2),
        "\x1bOR" | "\x1b[13~" => Key::F(3),
        "\x1bOS" | "\x1b[14~" => Key::F(4),
        "\x1b[15~" => Key::F(5),
        "\x1b[17~" => Key::F(6),
        "\x1b[18~" => Key::F(7),
        "\x1b[19~" => Key::F(8),
        "\x1b[20~" => Key::F(9),
        "\x1b[21~" => Key::F(10),
        "\x1b[23~" => Key::F(11),
        "\x1b[24~" => Key::F(12),
        _ => return parse_structured(data),
    };
    Some(key)
}

fn parse_structured(data: &str) -> Option<Key> {
    let bytes = data.as_bytes();
    if bytes.len() == 1 && (1..=26).contains(&bytes[0]) {
        return Some(Key::Ctrl((bytes[0] + b'a' - 1) as char));
    }
    if let Some(rest) = data.strip_prefix('\x1b') {
        let mut chars = rest.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if !ch.is_control() {
                return Some(Key::Alt(ch));
            }
        }
    }
    // xterm modified cursor keys, `ESC [ 1 ; <mods> <final>`. Modifiers are ignored.
    if let Some(params) = data.strip_prefix("\x1b[1;") {
        let final_byte = params.chars().last()?;
        if params[..params.len() - final_byte.len_utf8()]
            .chars()
            .all(|ch| ch.is_ascii_digit())
        {
            return match final_byte {
                'A' => Some(Key::Up),
                'B' => Some(Key::Down),
                'C' => Some(Key::Right),
                'D' => Some(Key::Left),
                'H' => Some(Key::Home),
                'F' => Some(Key::End),
                _ => None,
            };
        }
    }
    None
}

/// Splits a raw chunk into tokens.
///
/// Control bytes and escape sequences become one token each; printable runs stay
/// together; a bracketed paste is kept whole (an unterminated paste runs to the end
/// of the chunk). A trailing bare ESC is the Escape key. Incomplete sequences and
/// string-type sequences (OSC, APC, DCS) come back as [`Token::Unknown`].
pub fn split_input(data: &str) -> Vec<Token<'_>> {
    let bytes = data.as_bytes();
    let mut tokens = Vec::new();
    let mut idx = 0;

    while idx < bytes.len() {
        let rest = &data[idx..];

        if rest.starts_with(PASTE_START) {
            let end = rest[PASTE_START.len()..]
                .find(PASTE_END)
                .map(|offset| PASTE_START.len() + offset + PASTE_END.len())
                .unwrap_or(rest.len());
            tokens.push(Token::Paste(&rest[..end]));
            idx += end;
            continue;
        }

        let byte = bytes[idx];
        if byte == 0x1b {
            let len = escape_token_len(data, idx);
            let sequence = &data[idx..idx + len];
            if parse_key(sequence).is_some() {
                tokens.push(Token::Key(sequence));
            } else {
                tokens.push(Token::Unknown(sequence));
            }
            idx += len;
            continue;
        }

        if byte < 0x20 || byte == 0x7f {
            tokens.push(Token::Key(&data[idx..idx + 1]));
            idx += 1;
            continue;
        }

        let end = rest
            .char_indices()
            .find(|(_, ch)| *ch < ' ' || *ch == '\x7f')
            .map(|(offset, _)| idx + offset)
            .unwrap_or(data.len());
        tokens.push(Token::Text(&data[idx..end]));
        idx = end;
    }

    tokens
}

/// Byte length of the escape-initiated token at `idx`.
fn escape_token_len(data: &str, idx: usize) -> usize {
    if let Some(escape) = escape_at(data, idx) {
        return escape.len;
    }
    let rest = &data[idx + 1..];
    match rest.chars().next() {
        None | Some('\x1b') => 1,
        // Incomplete CSI/SS3/string sequence: swallow the rest of the chunk.
        Some('[' | ']' | '_' | 'P' | 'O') => data.len() - idx,
        Some(ch) => 1 + ch.len_utf8(),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_key, split_input, Key, Token};

    #[test]
    fn c1_controls_stay_inside_text_runs() {
        assert_eq!(split_input("a\u{85}b"), vec![Token::Text("a\u{85}b")]);
        assert_eq!(
            split_input("\u{9b}x\r"),
            vec![Token::Text("\u{9b}x"), Token::Key("\r")]
        );
    }

    #[test]
    fn legacy_sequences_name_keys() {
        assert_eq!(parse_key("\x1bOA"), Some(Key::Up));
        assert_eq!(parse_key("\x1b[D"), Some(Key::Left));
        assert_eq!(parse_key("\x1b[2~"), Some(Key::Insert));
        assert_eq!(parse_key("\x1bOP"), Some(Key::F(1)));
        assert_eq!(parse_key("\x1b[5~"), Some(Key::PageUp));
        assert_eq!(parse_key("\x1b[1~"), Some(Key::Home));
        assert_eq!(parse_key("\x1bOF"), Some(Key::End));
        assert_eq!(parse_key("\x1b[3~"), Some(Key::Delete));
        assert_eq!(parse_key("\x1b[1;5C"), Some(Key::Right));
    }

    #[test]
    fn control_bytes_name_keys() {
        assert_eq!(parse_key("\r"), Some(Key::Enter));
        assert_eq!(parse_key("\x1b\r"), Some(Key::NewLine));
        assert_eq!(parse_key("\x1b[13;2u"), Some(Key::NewLine));
        assert_eq!(parse_key("\x7f"), Some(Key::Backspace));
        assert_eq!(parse_key("\x08"), Some(Key::Backspace));
        assert_eq!(parse_key("\x01"), Some(Key::Ctrl('a')));
        assert_eq!(parse_key("\x03"), Some(Key::Ctrl('c')));
        assert_eq!(parse_key("\x1b"), Some(Key::Escape));
        assert_eq!(parse_key("\x1bb"), Some(Key::Alt('b')));
        assert_eq!(parse_key("a"), None);
    }

    #[test]
    fn splits_mixed_chunk() {
        let tokens = split_input("ab\x1b[Dc\r");
        assert_eq!(
            tokens,
            vec![
                Token::Text("ab"),
                Token::Key("\x1b[D"),
                Token::Text("c"),
                Token::Key("\r"),
            ]
        );
    }

    #[test]
    fn keeps_bracketed_paste_whole() {
        let tokens = split_input("x\x1b[200~line1\nline2\x1b[201~y");
        assert_eq!(
            tokens,
            vec![
                Token::Text("x"),
                Token::Paste("\x1b[200~line1\nline2\x1b[201~"),
                Token::Text("y"),
            ]
        );
    }

    #[test]
    fn lone_and_doubled_escape() {
        assert_eq!(split_input("\x1b"), vec![Token::Key("\x1b")]);
        assert_eq!(
            split_input("\x1b\x1b"),
            vec![Token::Key("\x1b"), Token::Key("\x1b")]
        );
    }

    #[test]
    fn unknown_and_incomplete_sequences_are_flagged() {
        assert_eq!(split_input("\x1b[I"), vec![Token::Unknown("\x1b[I")]);
        assert_eq!(split_input("\x1b[12"), vec![Token::Unknown("\x1b[12")]);
        assert_eq!(
            split_input("\x1b]0;title\x07a"),
            vec![Token::Unknown("\x1b]0;title\x07"), Token::Text("a")]
        );
    }

    #[test]
    fn wide_text_stays_in_one_run() {
        assert_eq!(split_input("你好"), vec![Token::Text("你好")]);
    }
}
