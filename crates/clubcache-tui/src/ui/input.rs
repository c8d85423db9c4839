//! Keyboard input handling for the TUI.
//!
//! Translates key events into navigation events and app actions.

use crossterm::event::{KeyCode, KeyEvent};

use clubcache_core::navigation::{Modal, NavEvent, Page};

use crate::app::{App, AppState, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            false
        }
        AppState::ConfirmingQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                true
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
                false
            }
            _ => false,
        },
        AppState::ConfirmingClearCache => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Normal;
                    app.clear_cache();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            false
        }
        AppState::Quitting => true,
        AppState::Normal => {
            handle_normal_input(app, key);
            false
        }
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    let in_gallery_modal = matches!(app.nav.modal, Some(Modal::Gallery(_)));

    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,

        // Pages
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            app.dispatch(NavEvent::Navigate(Page::ALL[index]));
        }
        KeyCode::Tab => app.dispatch(NavEvent::Navigate(app.nav.page.next())),
        KeyCode::BackTab => app.dispatch(NavEvent::Navigate(app.nav.page.prev())),
        KeyCode::Left | KeyCode::Char('h') if in_gallery_modal => app.move_selection(-1),
        KeyCode::Right | KeyCode::Char('l') if in_gallery_modal => app.move_selection(1),
        KeyCode::Left => app.dispatch(NavEvent::Navigate(app.nav.page.prev())),
        KeyCode::Right => app.dispatch(NavEvent::Navigate(app.nav.page.next())),

        // History
        KeyCode::Backspace | KeyCode::Char('[') => {
            app.go_back();
        }
        KeyCode::Char(']') => {
            app.go_forward();
        }

        // Lists
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Esc => {
            if app.nav.modal.is_some() {
                app.dispatch(NavEvent::Escape);
            } else if app.content.error.is_some() {
                app.dismiss_error();
            }
        }

        // Actions
        KeyCode::Char('u') => app.refresh(),
        KeyCode::Char('C') => app.state = AppState::ConfirmingClearCache,
        KeyCode::Char('d') => app.dismiss_error(),
        KeyCode::Char('x') => app.report_image_failure(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubcache_core::navigation::Location;
    use clubcache_core::ContentError;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let error = ContentError::ConfigurationMissing("CLUBCACHE_API_KEY".to_string());
        App::new(Err(error), Location::default()).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_number_keys_switch_pages() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.nav.page, Page::Gallery);
        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.nav.page, Page::Events);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.nav.page, Page::Home);
    }

    #[test]
    fn test_enter_and_escape_toggle_modal() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.nav.modal, Some(Modal::Gallery(_))));

        // Arrows browse images instead of pages while the modal is open.
        press(&mut app, KeyCode::Right);
        assert_eq!(app.nav.page, Page::Gallery);

        press(&mut app, KeyCode::Esc);
        assert!(app.nav.modal.is_none());

        // A second escape dismisses the error notice.
        assert!(app.content.error.is_some());
        press(&mut app, KeyCode::Esc);
        assert!(app.content.error.is_none());
    }

    #[test]
    fn test_backspace_goes_back() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.nav.page, Page::Home);
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.nav.page, Page::History);
    }

    #[test]
    fn test_quit_requires_confirmation() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!press(&mut app, KeyCode::Char('n')));
        assert_eq!(app.state, AppState::Normal);

        press(&mut app, KeyCode::Char('q'));
        assert!(press(&mut app, KeyCode::Char('y')));
        assert_eq!(app.state, AppState::Quitting);
    }
}
