//! Hardware cursor placement for IME candidate windows.

use crate::core::cursor::CursorPos;
use crate::core::output::TerminalCmd;

/// Moves the hardware cursor from `hardware_cursor_row` to `cursor_pos` with one
/// relative row motion and one absolute column move, then shows or hides it.
///
/// Returns the new hardware row and the commands to emit. Without a position (or
/// with an empty frame) the cursor is only hidden and stays where it is.
pub fn position_hardware_cursor(
    cursor_pos: Option<CursorPos>,
    total_lines: usize,
    hardware_cursor_row: usize,
    show_hardware_cursor: bool,
) -> (usize, Vec<TerminalCmd>) {
    let Some(cursor_pos) = cursor_pos.filter(|_| total_lines > 0) else {
        return (hardware_cursor_row, vec![TerminalCmd::HideCursor]);
    };

    let mut cmds = Vec::new();
    let target_row = cursor_pos.row.min(total_lines - 1);
    if target_row > hardware_cursor_row {
        cmds.push(TerminalCmd::MoveDown(target_row - hardware_cursor_row));
    } else if target_row < hardware_cursor_row {
        cmds.push(TerminalCmd::MoveUp(hardware_cursor_row - target_row));
    }
    cmds.push(TerminalCmd::ColumnAbs(cursor_pos.col + 1));
    cmds.push(if show_hardware_cursor {
        TerminalCmd::ShowCursor
    } else {
        TerminalCmd::HideCursor
    });

    (target_row, cmds)
}
