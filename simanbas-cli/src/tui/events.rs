use crate::tui::app::{App, Focus, View};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('?') => {
            app.view = if app.view == View::Help { View::Dashboard } else { View::Help };
            return;
        }
        KeyCode::Esc if app.view == View::Help => {
            app.view = View::Dashboard;
            return;
        }
        KeyCode::Tab => {
            app.cycle_focus();
            return;
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            app.more_bins();
            return;
        }
        KeyCode::Char('-') => {
            app.fewer_bins();
            return;
        }
        _ => {}
    }
    if app.focus == Focus::Table {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.table_down(),
            KeyCode::Char('k') | KeyCode::Up => app.table_up(),
            KeyCode::PageDown => {
                for _ in 0..10 {
                    app.table_down();
                }
            }
            KeyCode::PageUp => {
                for _ in 0..10 {
                    app.table_up();
                }
            }
            KeyCode::Enter => {
                if let Some(r) = app.selected() {
                    app.status_msg = format!("question {}", r.question_id);
                }
            }
            _ => {}
        }
    }
}
