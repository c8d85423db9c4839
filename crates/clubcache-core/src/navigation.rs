//! Page and modal navigation as a pure reducer.
//!
//! A `Location` is the addressable part of the UI state and round-trips
//! through a fragment such as `#gallery?event=1AbC` or
//! `#home?officer=Jane%20Doe`. Front ends feed `NavEvent`s through `reduce`
//! and apply the returned `HistoryEffect` to whatever history they keep.

use std::fmt;

use url::form_urlencoded;

const OFFICER_PARAM: &str = "officer";
const GALLERY_PARAM: &str = "event";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Home,
    History,
    Gallery,
    Events,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::History, Page::Gallery, Page::Events];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::History => "History",
            Page::Gallery => "Gallery",
            Page::Events => "Events",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::History => "history",
            Page::Gallery => "gallery",
            Page::Events => "events",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|p| p.slug().eq_ignore_ascii_case(slug))
    }

    pub fn index(&self) -> usize {
        Page::ALL.iter().position(|p| p == self).unwrap_or(0)
    }

    pub fn next(&self) -> Page {
        Page::ALL[(self.index() + 1) % Page::ALL.len()]
    }

    pub fn prev(&self) -> Page {
        Page::ALL[(self.index() + Page::ALL.len() - 1) % Page::ALL.len()]
    }
}

/// A modal is keyed by the natural key of the entity it shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Modal {
    /// Officer name.
    Officer(String),
    /// Gallery folder id.
    Gallery(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub page: Page,
    pub modal: Option<Modal>,
}

impl Location {
    pub fn page(page: Page) -> Self {
        Self { page, modal: None }
    }

    /// Lenient parse: unknown pages fall back to home, unknown params are ignored.
    pub fn parse(fragment: &str) -> Self {
        let fragment = fragment.trim();
        let fragment = fragment
            .rsplit_once('#')
            .map(|(_, tail)| tail)
            .unwrap_or(fragment);
        let (path, query) = fragment.split_once('?').unwrap_or((fragment, ""));
        let page = Page::from_slug(path.trim_matches('/')).unwrap_or_default();

        let modal = form_urlencoded::parse(query.as_bytes())
            .filter(|(_, value)| !value.is_empty())
            .find_map(|(key, value)| match key.as_ref() {
                OFFICER_PARAM => Some(Modal::Officer(value.into_owned())),
                GALLERY_PARAM => Some(Modal::Gallery(value.into_owned())),
                _ => None,
            });

        Self { page, modal }
    }

    pub fn to_fragment(&self) -> String {
        let mut fragment = format!("#{}", self.page.slug());
        if let Some(modal) = &self.modal {
            let (key, value) = match modal {
                Modal::Officer(name) => (OFFICER_PARAM, name),
                Modal::Gallery(id) => (GALLERY_PARAM, id),
            };
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair(key, value)
                .finish();
            fragment.push('?');
            fragment.push_str(&query);
        }
        fragment
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fragment())
    }
}

/// What the UI currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavState {
    pub page: Page,
    pub modal: Option<Modal>,
}

impl NavState {
    pub fn location(&self) -> Location {
        Location {
            page: self.page,
            modal: self.modal.clone(),
        }
    }
}

impl From<Location> for NavState {
    fn from(location: Location) -> Self {
        Self {
            page: location.page,
            modal: location.modal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    Navigate(Page),
    OpenModal(Modal),
    CloseModal,
    /// Escape key: closes a modal, otherwise does nothing.
    Escape,
    /// The history moved (back/forward) to this location.
    PopState(Location),
}

/// How the caller's history should change after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEffect {
    Push(Location),
    Replace(Location),
    None,
}

/// Compute the next navigation state.
///
/// Opening a modal or switching pages pushes an entry so back closes or
/// returns. Closing a modal replaces the current entry. `PopState` adopts
/// the location as-is and never touches history.
pub fn reduce(state: &NavState, event: NavEvent) -> (NavState, HistoryEffect) {
    match event {
        NavEvent::Navigate(page) => {
            if state.page == page && state.modal.is_none() {
                return (state.clone(), HistoryEffect::None);
            }
            let next = NavState { page, modal: None };
            let effect = HistoryEffect::Push(next.location());
            (next, effect)
        }
        NavEvent::OpenModal(modal) => {
            if state.modal.as_ref() == Some(&modal) {
                return (state.clone(), HistoryEffect::None);
            }
            let next = NavState {
                page: state.page,
                modal: Some(modal),
            };
            let effect = HistoryEffect::Push(next.location());
            (next, effect)
        }
        NavEvent::CloseModal | NavEvent::Escape => {
            if state.modal.is_none() {
                return (state.clone(), HistoryEffect::None);
            }
            let next = NavState {
                page: state.page,
                modal: None,
            };
            let effect = HistoryEffect::Replace(next.location());
            (next, effect)
        }
        NavEvent::PopState(location) => (location.into(), HistoryEffect::None),
    }
}
