//! Escape sequence scanning and SGR state tracking.

/// Family of a recognized escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    Csi,
    Osc,
    Apc,
    Dcs,
    Ss3,
}

/// A complete escape sequence found at some byte offset of a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escape {
    pub len: usize,
    pub kind: EscapeKind,
}

/// Recognizes the escape sequence starting at byte `pos`, if any.
///
/// CSI runs to its final byte (`0x40..=0x7e`); OSC, APC and DCS run to BEL or ST;
/// SS3 is always three bytes. Unterminated sequences are not recognized.
pub fn escape_at(input: &str, pos: usize) -> Option<Escape> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&0x1b) {
        return None;
    }
    let kind = match bytes.get(pos + 1)? {
        b'[' => EscapeKind::Csi,
        b']' => EscapeKind::Osc,
        b'_' => EscapeKind::Apc,
        b'P' => EscapeKind::Dcs,
        b'O' => EscapeKind::Ss3,
        _ => return None,
    };

    let end = match kind {
        EscapeKind::Csi => bytes[pos + 2..]
            .iter()
            .position(|b| (0x40..=0x7e).contains(b))
            .map(|offset| pos + 2 + offset + 1)?,
        EscapeKind::Ss3 => {
            if pos + 2 >= bytes.len() {
                return None;
            }
            // The third byte may start a multi-byte char; keep the slice on a boundary.
            let ch = input[pos + 2..].chars().next()?;
            pos + 2 + ch.len_utf8()
        }
        EscapeKind::Osc | EscapeKind::Apc | EscapeKind::Dcs => string_terminator_end(bytes, pos + 2)?,
    };

    Some(Escape {
        len: end - pos,
        kind,
    })
}

fn string_terminator_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut idx = from;
    while idx < bytes.len() {
        match bytes[idx] {
            0x07 => return Some(idx + 1),
            0x1b if bytes.get(idx + 1) == Some(&b'\\') => return Some(idx + 2),
            _ => idx += 1,
        }
    }
    None
}

/// Byte offset of the next escape sequence at or after `idx`, or the end of `input`.
pub(crate) fn next_escape_or_end(input: &str, idx: usize) -> usize {
    input[idx..]
        .char_indices()
        .map(|(offset, _)| idx + offset)
        .find(|&pos| escape_at(input, pos).is_some())
        .unwrap_or(input.len())
}

/// Removes every recognized control sequence, returning the plain text.
pub fn strip_control(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(escape) = escape_at(input, idx) {
            idx += escape.len;
            continue;
        }
        let end = next_escape_or_end(input, idx);
        out.push_str(&input[idx..end]);
        idx = end;
    }
    out
}

const BOLD: u16 = 1 << 0;
const DIM: u16 = 1 << 1;
const ITALIC: u16 = 1 << 2;
const UNDERLINE: u16 = 1 << 3;
const BLINK: u16 = 1 << 4;
const INVERSE: u16 = 1 << 5;
const HIDDEN: u16 = 1 << 6;
const STRIKE: u16 = 1 << 7;

const ATTR_CODES: [(u16, &str); 8] = [
    (BOLD, "1"),
    (DIM, "2"),
    (ITALIC, "3"),
    (UNDERLINE, "4"),
    (BLINK, "5"),
    (INVERSE, "7"),
    (HIDDEN, "8"),
    (STRIKE, "9"),
];

/// Running SGR state, used to re-open styles on a continuation line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SgrState {
    attrs: u16,
    fg: Option<String>,
    bg: Option<String>,
}

impl SgrState {
    pub fn is_plain(&self) -> bool {
        self.attrs == 0 && self.fg.is_none() && self.bg.is_none()
    }

    /// Folds one escape sequence into the state. Non-SGR sequences are ignored.
    pub fn apply(&mut self, sequence: &str) {
        let Some(params) = sequence
            .strip_prefix("\x1b[")
            .and_then(|rest| rest.strip_suffix('m'))
        else {
            return;
        };
        if params.is_empty() {
            *self = Self::default();
            return;
        }

        let parts: Vec<&str> = params.split(';').collect();
        let mut idx = 0;
        while idx < parts.len() {
            let code = parts[idx].parse::<u16>().unwrap_or(0);
            if code == 38 || code == 48 {
                let span = match parts.get(idx + 1) {
                    Some(&"5") => 3,
                    Some(&"2") => 5,
                    _ => 1,
                };
                if span > 1 && idx + span <= parts.len() {
                    let color = parts[idx..idx + span].join(";");
                    if code == 38 {
                        self.fg = Some(color);
                    } else {
                        self.bg = Some(color);
                    }
                    idx += span;
                    continue;
                }
            }

            match code {
                0 => *self = Self::default(),
                1 => self.attrs |= BOLD,
                2 => self.attrs |= DIM,
                3 => self.attrs |= ITALIC,
                4 => self.attrs |= UNDERLINE,
                5 => self.attrs |= BLINK,
                7 => self.attrs |= INVERSE,
                8 => self.attrs |= HIDDEN,
                9 => self.attrs |= STRIKE,
                21 => self.attrs &= !BOLD,
                22 => self.attrs &= !(BOLD | DIM),
                23 => self.attrs &= !ITALIC,
                24 => self.attrs &= !UNDERLINE,
                25 => self.attrs &= !BLINK,
                27 => self.attrs &= !INVERSE,
                28 => self.attrs &= !HIDDEN,
                29 => self.attrs &= !STRIKE,
                39 => self.fg = None,
                49 => self.bg = None,
                30..=37 | 90..=97 => self.fg = Some(code.to_string()),
                40..=47 | 100..=107 => self.bg = Some(code.to_string()),
                _ => {}
            }
            idx += 1;
        }
    }

    /// Folds every escape sequence found in `text`.
    pub fn apply_all(&mut self, text: &str) {
        let mut idx = 0;
        while idx < text.len() {
            if let Some(escape) = escape_at(text, idx) {
                self.apply(&text[idx..idx + escape.len]);
                idx += escape.len;
            } else {
                idx = next_escape_or_end(text, idx);
            }
        }
    }

    /// A single SGR sequence that re-establishes this state, or empty when plain.
    pub fn reopen(&self) -> String {
        let mut codes: Vec<&str> = ATTR_CODES
            .iter()
            .filter(|(bit, _)| self.attrs & bit != 0)
            .map(|(_, code)| *code)
            .collect();
        if let Some(fg) = self.fg.as_deref() {
            codes.push(fg);
        }
        if let Some(bg) = self.bg.as_deref() {
            codes.push(bg);
        }
        if codes.is_empty() {
            return String::new();
        }
        format!("\x1b[{}m", codes.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_at, strip_control, EscapeKind, SgrState};

    #[test]
    fn recognizes_each_sequence_family() {
        assert_eq!(escape_at("\x1b[31mx", 0).map(|e| e.len), Some(5));
        assert_eq!(escape_at("\x1b]8;;url\x07", 0).map(|e| e.kind), Some(EscapeKind::Osc));
        assert_eq!(
            escape_at("\x1b_sanbot:cursor\x07", 0).map(|e| e.kind),
            Some(EscapeKind::Apc)
        );
        assert_eq!(escape_at("\x1bPq\x1b\\", 0).map(|e| e.len), Some(5));
        assert_eq!(escape_at("\x1bOA", 0).map(|e| e.kind), Some(EscapeKind::Ss3));
    }

    #[test]
    fn unterminated_sequences_are_not_recognized() {
        assert_eq!(escape_at("\x1b[31", 0), None);
        assert_eq!(escape_at("\x1b]8;;", 0), None);
        assert_eq!(escape_at("\x1b", 0), None);
        assert_eq!(escape_at("abc", 0), None);
    }

    #[test]
    fn strip_control_keeps_text_only() {
        let input = "\x1b[1mbold\x1b[22m \x1b]8;;https://x\x07link\x1b]8;;\x07\x1b_sanbot:cursor\x07!";
        assert_eq!(strip_control(input), "bold link!");
    }

    #[test]
    fn sgr_state_reopens_active_styles() {
        let mut state = SgrState::default();
        state.apply_all("\x1b[1;31mred\x1b[4m");
        assert_eq!(state.reopen(), "\x1b[1;4;31m");
        state.apply("\x1b[0m");
        assert!(state.is_plain());
        assert_eq!(state.reopen(), "");
    }

    #[test]
    fn sgr_state_tracks_extended_colors() {
        let mut state = SgrState::default();
        state.apply("\x1b[38;5;208m");
        state.apply("\x1b[48;2;1;2;3m");
        assert_eq!(state.reopen(), "\x1b[38;5;208;48;2;1;2;3m");
        state.apply("\x1b[39;49m");
        assert!(state.is_plain());
    }
}
