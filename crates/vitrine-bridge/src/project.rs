//! Result projection onto the host page.
//!
//! - **List mode**: the filtered items are handed to a render callback that
//!   owns the markup.
//! - **Visibility mode**: nodes rendered by the host are shown or hidden by
//!   item id. Pagination is expanded while filters are active and restored
//!   exactly once they are all cleared.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;
use vitrine_seeker::Facetable;

/// Callback that re-renders a client-owned list.
pub trait ListRenderer<T> {
    fn render(&mut self, items: &[&T]);
}

impl<T, F> ListRenderer<T> for F
where
    F: FnMut(&[&T]),
{
    fn render(&mut self, items: &[&T]) {
        self(items)
    }
}

/// Port to nodes rendered by the host page.
pub trait VisibilityHost {
    /// Shows or hides the node of an item. Returns `false` if no node exists.
    fn set_visible(&mut self, id: &str, visible: bool) -> bool;

    /// Renders every page so all items have a node.
    fn expand_all(&mut self);

    /// Returns pagination and node visibility to the host's own state.
    fn restore_pagination(&mut self);

    fn set_load_more_visible(&mut self, visible: bool);

    /// Locks the host's own filter controls while the engine drives them.
    fn set_host_filters_locked(&mut self, locked: bool);
}

/// Outcome of one projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Projection {
    pub visible: usize,
    pub hidden: usize,
    /// Items with no node on the page; diagnostic only.
    pub missing: usize,
    pub total: usize,
}

/// Visibility-mode projector. Remembers whether it overrode pagination.
pub struct VisibilityProjector {
    host: Box<dyn VisibilityHost>,
    expanded: bool,
}

impl VisibilityProjector {
    pub fn new(host: Box<dyn VisibilityHost>) -> Self {
        VisibilityProjector {
            host,
            expanded: false,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    fn apply<T: Facetable>(&mut self, items: &[T], filtered: &[&T], active: bool) -> Projection {
        if !active {
            self.release();
            return Projection {
                visible: items.len(),
                hidden: 0,
                missing: 0,
                total: items.len(),
            };
        }
        if !self.expanded {
            self.host.expand_all();
            self.host.set_load_more_visible(false);
            self.host.set_host_filters_locked(true);
            self.expanded = true;
        }
        let matched: HashSet<String> = filtered
            .iter()
            .map(|item| item.facet_id().into_owned())
            .collect();
        let mut projection = Projection {
            total: items.len(),
            ..Projection::default()
        };
        for item in items {
            let id = item.facet_id();
            let visible = matched.contains(id.as_ref());
            if !self.host.set_visible(&id, visible) {
                projection.missing += 1;
            } else if visible {
                projection.visible += 1;
            } else {
                projection.hidden += 1;
            }
        }
        projection
    }

    /// Undoes the pagination override, if any.
    pub fn release(&mut self) {
        if self.expanded {
            self.host.restore_pagination();
            self.host.set_load_more_visible(true);
            self.host.set_host_filters_locked(false);
            self.expanded = false;
        }
    }
}

/// Where filtered results go.
pub enum Projector<T> {
    List(Box<dyn ListRenderer<T>>),
    Visibility(VisibilityProjector),
}

impl<T: Facetable> Projector<T> {
    pub fn list<R>(renderer: R) -> Self
    where
        R: ListRenderer<T> + 'static,
    {
        Projector::List(Box::new(renderer))
    }

    pub fn visibility<H>(host: H) -> Self
    where
        H: VisibilityHost + 'static,
    {
        Projector::Visibility(VisibilityProjector::new(Box::new(host)))
    }

    /// Projects the filtered subset of `items`.
    pub fn apply(&mut self, items: &[T], filtered: &[&T], active: bool) -> Projection {
        let projection = match self {
            Projector::List(renderer) => {
                renderer.render(filtered);
                Projection {
                    visible: filtered.len(),
                    hidden: items.len().saturating_sub(filtered.len()),
                    missing: 0,
                    total: items.len(),
                }
            }
            Projector::Visibility(projector) => projector.apply(items, filtered, active),
        };
        debug!(
            visible = projection.visible,
            hidden = projection.hidden,
            missing = projection.missing,
            "projected results"
        );
        projection
    }

    /// Restores host state ahead of teardown.
    pub fn release(&mut self) {
        if let Projector::Visibility(projector) = self {
            projector.release();
        }
    }
}

impl<T> fmt::Debug for Projector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projector::List(_) => f.write_str("Projector::List"),
            Projector::Visibility(p) => f
                .debug_struct("Projector::Visibility")
                .field("expanded", &p.expanded)
                .finish(),
        }
    }
}

// === Mock implementations for testing ===

#[derive(Debug, Default)]
struct MockPage {
    ids: Vec<String>,
    page_size: usize,
    expanded: bool,
    hidden: BTreeSet<String>,
    load_more_visible: bool,
    filters_locked: bool,
    log: Vec<String>,
}

impl MockPage {
    fn rendered(&self, id: &str) -> bool {
        match self.ids.iter().position(|i| i == id) {
            Some(pos) => self.expanded || pos < self.page_size,
            None => false,
        }
    }
}

/// Paginated page: only the first `page_size` items have nodes until
/// `expand_all`. Clones share state.
#[derive(Debug, Clone)]
pub struct MockVisibilityHost {
    page: Rc<RefCell<MockPage>>,
}

impl MockVisibilityHost {
    pub fn paginated<I, S>(ids: I, page_size: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            page: Rc::new(RefCell::new(MockPage {
                ids: ids.into_iter().map(Into::into).collect(),
                page_size,
                load_more_visible: true,
                ..MockPage::default()
            })),
        }
    }

    /// Visibility of an item's node, `None` if it has none.
    pub fn is_visible(&self, id: &str) -> Option<bool> {
        let page = self.page.borrow();
        page.rendered(id).then(|| !page.hidden.contains(id))
    }

    pub fn is_expanded(&self) -> bool {
        self.page.borrow().expanded
    }

    pub fn load_more_visible(&self) -> bool {
        self.page.borrow().load_more_visible
    }

    pub fn filters_locked(&self) -> bool {
        self.page.borrow().filters_locked
    }

    /// Pagination calls received, in order.
    pub fn log(&self) -> Vec<String> {
        self.page.borrow().log.clone()
    }

    pub fn visible_ids(&self) -> Vec<String> {
        let page = self.page.borrow();
        page.ids
            .iter()
            .filter(|id| page.rendered(id) && !page.hidden.contains(*id))
            .cloned()
            .collect()
    }
}

impl VisibilityHost for MockVisibilityHost {
    fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        let mut page = self.page.borrow_mut();
        if !page.rendered(id) {
            return false;
        }
        if visible {
            page.hidden.remove(id);
        } else {
            page.hidden.insert(id.to_string());
        }
        true
    }

    fn expand_all(&mut self) {
        let mut page = self.page.borrow_mut();
        page.expanded = true;
        page.log.push("expand_all".into());
    }

    fn restore_pagination(&mut self) {
        let mut page = self.page.borrow_mut();
        page.expanded = false;
        page.hidden.clear();
        page.log.push("restore_pagination".into());
    }

    fn set_load_more_visible(&mut self, visible: bool) {
        self.page.borrow_mut().load_more_visible = visible;
    }

    fn set_host_filters_locked(&mut self, locked: bool) {
        self.page.borrow_mut().filters_locked = locked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_seeker::Record;

    fn items() -> Vec<Record> {
        ["a", "b", "c", "d"].into_iter().map(Record::new).collect()
    }

    #[test]
    fn list_mode_hands_filtered_items_to_renderer() {
        let rendered = Rc::new(RefCell::new(Vec::new()));
        let sink = rendered.clone();
        let mut projector = Projector::list(move |items: &[&Record]| {
            *sink.borrow_mut() = items.iter().map(|r| r.id().to_string()).collect();
        });

        let items = items();
        let filtered: Vec<&Record> = items.iter().filter(|r| r.id() != "b").collect();
        let projection = projector.apply(&items, &filtered, true);
        assert_eq!(*rendered.borrow(), vec!["a", "c", "d"]);
        assert_eq!(projection.hidden, 1);
    }

    #[test]
    fn visibility_mode_expands_then_restores() {
        let host = MockVisibilityHost::paginated(["a", "b", "c", "d"], 2);
        let mut projector = Projector::visibility(host.clone());
        let items = items();

        let filtered: Vec<&Record> = items.iter().filter(|r| r.id() == "d").collect();
        let projection = projector.apply(&items, &filtered, true);
        assert_eq!(
            projection,
            Projection {
                visible: 1,
                hidden: 3,
                missing: 0,
                total: 4
            }
        );
        assert_eq!(host.visible_ids(), vec!["d"]);
        assert!(!host.load_more_visible());
        assert!(host.filters_locked());

        let all: Vec<&Record> = items.iter().collect();
        projector.apply(&items, &all, false);
        assert_eq!(host.visible_ids(), vec!["a", "b"]);
        assert!(host.load_more_visible());
        assert!(!host.filters_locked());
        assert_eq!(host.log(), vec!["expand_all", "restore_pagination"]);
    }

    #[test]
    fn items_without_nodes_are_counted_missing() {
        let host = MockVisibilityHost::paginated(["a", "b"], 10);
        let mut projector = Projector::visibility(host);
        let items = items();
        let filtered: Vec<&Record> = items.iter().collect();
        let projection = projector.apply(&items, &filtered, true);
        assert_eq!(projection.missing, 2);
        assert_eq!(projection.visible, 2);
    }

    #[test]
    fn repeated_projection_expands_once() {
        let host = MockVisibilityHost::paginated(["a", "b", "c", "d"], 2);
        let mut projector = Projector::visibility(host.clone());
        let items = items();
        let filtered: Vec<&Record> = items.iter().take(1).collect();
        projector.apply(&items, &filtered, true);
        projector.apply(&items, &filtered, true);
        projector.release();
        projector.release();
        assert_eq!(host.log(), vec!["expand_all", "restore_pagination"]);
    }
}
