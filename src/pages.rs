use crate::error::ApiError;
use crate::session::Session;
use crate::smarthub::RestResource;

/// State behind a list/detail/create/edit page of one resource.
///
/// Every action runs the same cycle: role gate → local form check → one backend call →
/// refetch. Failures land in the inline error banner and never escape the page.
#[derive(Debug, Clone)]
pub struct ResourcePage<R: RestResource> {
    items: Vec<R>,
    error: Option<String>,
}

impl<R: RestResource> Default for ResourcePage<R> {
    fn default() -> Self {
        ResourcePage {
            items: Vec::new(),
            error: None,
        }
    }
}

impl<R: RestResource> ResourcePage<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn find(&self, id: u64) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Whether the session may see create/edit/delete controls.
    pub fn can_edit(session: &Session) -> bool {
        session.require_role(R::WRITE_ROLES).is_ok()
    }

    /// Reloads the list. Returns `true` on success.
    pub fn refresh(&mut self, session: &Session) -> bool {
        match session.api().list::<R>() {
            Ok(items) => {
                self.items = items;
                self.error = None;
                true
            }
            Err(e) => self.fail("load", e),
        }
    }

    pub fn create(&mut self, session: &Session, form: &R::Form) -> bool {
        let result = session
            .require_role(R::WRITE_ROLES)
            .and_then(|_| session.api().create::<R>(form));
        match result {
            Ok(_) => self.refresh(session),
            Err(e) => self.fail("create", e),
        }
    }

    pub fn update(&mut self, session: &Session, id: u64, form: &R::Form) -> bool {
        let result = session
            .require_role(R::WRITE_ROLES)
            .and_then(|_| session.api().update::<R>(id, form));
        match result {
            Ok(_) => self.refresh(session),
            Err(e) => self.fail("update", e),
        }
    }

    pub fn delete(&mut self, session: &Session, id: u64) -> bool {
        let result = session
            .require_role(R::WRITE_ROLES)
            .and_then(|_| session.api().remove::<R>(id));
        match result {
            Ok(()) => self.refresh(session),
            Err(e) => self.fail("delete", e),
        }
    }

    fn fail(&mut self, action: &str, err: ApiError) -> bool {
        log::warn!("Failed to {} {}: {}", action, R::LABEL, err);
        self.error = Some(err.user_message());
        false
    }
}
