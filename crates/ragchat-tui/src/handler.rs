use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ragchat_core::PendingAction;

use crate::app::{App, Field};
use crate::tui::AppEvent;

/// Returns the request to spawn, if the event started one.
pub fn handle_event(app: &mut App, event: AppEvent) -> Option<PendingAction> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => None,
        AppEvent::Tick => {
            app.tick_animation();
            None
        }
        AppEvent::Completed(completion) => {
            app.apply_completion(completion);
            None
        }
    }
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> Option<PendingAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any mode
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        app.should_quit = true;
        return None;
    }

    // A notice behaves like a modal alert
    if app.view.notice.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.view.notice = None;
        }
        return None;
    }

    if ctrl {
        return match key.code {
            KeyCode::Char('r') => {
                app.toggle_rag();
                None
            }
            KeyCode::Char('k') => {
                app.toggle_rerank();
                None
            }
            KeyCode::Char('t') => {
                app.cycle_model_type();
                None
            }
            KeyCode::Char('e') => app.build_embeddings(),
            KeyCode::Char('x') => app.rebuild_index(),
            KeyCode::Char('u') => app.upload_document(),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Enter => match app.view.focus {
            Field::UserInput => app.send_message(),
            Field::ModelType | Field::ModelName => app.update_config(),
            Field::DocumentFile => app.upload_document(),
        },
        KeyCode::Tab => {
            app.view.focus = app.view.focus.next();
            None
        }
        KeyCode::BackTab => {
            app.view.focus = app.view.focus.prev();
            None
        }
        KeyCode::PageUp => {
            let page = app.view.history_height.max(1);
            app.view.scroll_history_up(page);
            None
        }
        KeyCode::PageDown => {
            let page = app.view.history_height.max(1);
            app.view.scroll_history_down(page);
            None
        }
        KeyCode::Backspace => {
            app.view.focused_input().backspace();
            None
        }
        KeyCode::Delete => {
            app.view.focused_input().delete();
            None
        }
        KeyCode::Left => {
            app.view.focused_input().left();
            None
        }
        KeyCode::Right => {
            app.view.focused_input().right();
            None
        }
        KeyCode::Home => {
            app.view.focused_input().home();
            None
        }
        KeyCode::End => {
            app.view.focused_input().end();
            None
        }
        KeyCode::Char(c) => {
            app.view.focused_input().insert(c);
            None
        }
        _ => None,
    }
}
