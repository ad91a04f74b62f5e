//! Fragment routing: a static route table, view construction, and the
//! content-surface class delta applied on every matched transition.

use crate::events::{EventBus, Notification};

/// A view the dispatcher can construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Login,
    /// A portal module addressed by the trailing fragment path.
    Module { path: String },
}

impl View {
    /// View name used for content classes and route notifications.
    pub fn name(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Login => "login",
            View::Module { .. } => "module",
        }
    }
}

/// Seam to the presentation layer. The dispatcher hands constructed views to
/// `show` and keeps the content surface's class list in sync.
pub trait ViewManager {
    fn show(&mut self, view: View);
    fn add_class(&mut self, class: &str);
    fn remove_class(&mut self, class: &str);
}

/// How a fragment is matched against a rule.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    /// The whole fragment equals the pattern.
    Exact(&'static str),
    /// The fragment starts with the pattern; the remainder is captured.
    Prefix(&'static str),
}

#[derive(Debug, Clone, Copy)]
enum Handler {
    Dashboard,
    Login,
    Module,
}

impl Handler {
    fn build(self, captured: &str) -> View {
        match self {
            Handler::Dashboard => View::Dashboard,
            Handler::Login => View::Login,
            Handler::Module => View::Module {
                path: captured.to_string(),
            },
        }
    }
}

/// The route table. Fixed at compile time; first match wins.
const ROUTES: &[(Pattern, Handler)] = &[
    (Pattern::Exact(""), Handler::Dashboard),
    (Pattern::Exact("login"), Handler::Login),
    (Pattern::Prefix("modules/"), Handler::Module),
];

/// Resolve a fragment against the route table.
pub fn resolve(fragment: &str) -> Option<View> {
    for (pattern, handler) in ROUTES {
        match pattern {
            Pattern::Exact(p) if fragment == *p => return Some(handler.build("")),
            Pattern::Prefix(p) => {
                if let Some(rest) = fragment.strip_prefix(p) {
                    return Some(handler.build(rest));
                }
            }
            _ => {}
        }
    }
    None
}

/// Fragment dispatcher. Owns the view manager, the current content class,
/// and the notification channel.
pub struct Router<M> {
    view_manager: M,
    current_view_class: Option<String>,
    events: EventBus,
}

impl<M: ViewManager> Router<M> {
    pub fn new(view_manager: M, events: EventBus) -> Self {
        Self {
            view_manager,
            current_view_class: None,
            events,
        }
    }

    /// Dispatch a fragment change. On a match the bound view is constructed
    /// and shown, the content class is updated, and a route-changed
    /// notification goes out. An unmatched fragment invokes nothing.
    pub fn dispatch(&mut self, fragment: &str) -> Option<&'static str> {
        let view = resolve(fragment)?;
        let name = view.name();
        tracing::debug!(fragment = %fragment, view = %name, "dispatching route");

        self.view_manager.show(view);
        self.apply_view_class(name);
        self.events.publish(Notification::RouteChanged {
            name: name.to_string(),
        });
        Some(name)
    }

    /// Remove the previously recorded class when it differs from the new
    /// one, then add the new class and record it.
    fn apply_view_class(&mut self, name: &str) {
        let class = format!("um-{name}");
        if let Some(previous) = self.current_view_class.take() {
            if previous != class {
                self.view_manager.remove_class(&previous);
            }
        }
        self.view_manager.add_class(&class);
        self.current_view_class = Some(class);
    }

    pub fn view_manager(&self) -> &M {
        &self.view_manager
    }
}
