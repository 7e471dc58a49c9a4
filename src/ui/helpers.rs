use std::error::Error;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// One-line message for the footer: the error itself plus its innermost cause
/// when there is one.
pub(crate) fn surface_error(err: &(dyn Error + 'static)) -> String {
    let mut root = err.source();
    while let Some(cause) = root.and_then(|e| e.source()) {
        root = Some(cause);
    }
    match root {
        Some(cause) => format!("{err}: {cause}"),
        None => err.to_string(),
    }
}
