//! Process-wide map of identity to session
//!
//! The registry is the only place sessions are created, replaced and dropped.
//! Lookups take a read lock on the map and never wait on lifecycle work;
//! create/replace/remove are serialized by a separate lifecycle mutex so an
//! identity always maps to exactly one session.

use super::error::RegistryError;
use super::services::DisplayServices;
use super::session::UserSession;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tickhud_core::{PersistenceStore, UserHandle};
use tickhud_types::DisplayFlags;
use uuid::Uuid;

pub struct SessionRegistry {
    services: Arc<DisplayServices>,
    store: Arc<dyn PersistenceStore>,
    sessions: RwLock<HashMap<Uuid, Arc<UserSession>>>,
    lifecycle: Mutex<()>,
}

impl SessionRegistry {
    pub fn new(services: Arc<DisplayServices>, store: Arc<dyn PersistenceStore>) -> Self {
        Self {
            services,
            store,
            sessions: RwLock::new(HashMap::new()),
            lifecycle: Mutex::new(()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Arc<UserSession>>> {
        self.sessions.read().unwrap_or_else(|poisoned| {
            warn!("Session map lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Arc<UserSession>>> {
        self.sessions.write().unwrap_or_else(|poisoned| {
            warn!("Session map lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lifecycle(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().unwrap_or_else(|poisoned| {
            warn!("Session lifecycle mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn publish_count(&self, sessions: &HashMap<Uuid, Arc<UserSession>>) {
        self.services.telemetry.set_online_users(sessions.len());
    }

    fn load_flags(&self, identity: Uuid) -> DisplayFlags {
        match self.store.load(identity) {
            Ok(Some(flags)) => flags,
            Ok(None) => DisplayFlags::default(),
            Err(e) => {
                warn!("Failed to load display settings for {}, using defaults: {:#}", identity, e);
                DisplayFlags::default()
            }
        }
    }

    fn persist(&self, session: &UserSession) {
        if !session.is_dirty() {
            return;
        }
        let identity = session.identity();
        match self.store.save(identity, &session.flags()) {
            Ok(()) => {
                session.set_dirty(false);
                debug!("Saved display settings for {}", identity);
            }
            Err(e) => warn!("Failed to save display settings for {}: {:#}", identity, e),
        }
    }

    /// Existing session for this user, or a new one restored from storage
    pub fn get(&self, user: Arc<dyn UserHandle>) -> Arc<UserSession> {
        let identity = user.identity();
        if let Some(session) = self.read().get(&identity) {
            return Arc::clone(session);
        }

        let _lifecycle = self.lifecycle();
        // Double-check after acquiring the lifecycle lock
        if let Some(session) = self.read().get(&identity) {
            return Arc::clone(session);
        }

        let flags = self.load_flags(identity);
        let session = Arc::new(UserSession::new(user, Arc::clone(&self.services), flags));

        let mut sessions = self.write();
        sessions.insert(identity, Arc::clone(&session));
        self.publish_count(&sessions);
        debug!("Created session for {} ({} total)", identity, sessions.len());
        session
    }

    pub fn lookup(&self, identity: Uuid) -> Option<Arc<UserSession>> {
        self.read().get(&identity).cloned()
    }

    /// Rebind a session to a new entity handle for the same identity
    ///
    /// The old session's jobs are stopped, its flags and dirty bit move to a
    /// fresh session bound to `user`, and enabled surfaces restart there.
    pub fn replace(&self, user: Arc<dyn UserHandle>) -> Result<Arc<UserSession>, RegistryError> {
        let identity = user.identity();
        let _lifecycle = self.lifecycle();

        let old = self
            .lookup(identity)
            .ok_or(RegistryError::NotRegistered(identity))?;
        old.stop_all();

        let session = Arc::new(UserSession::new(
            user,
            Arc::clone(&self.services),
            old.flags(),
        ));
        session.set_dirty(old.is_dirty());
        session.start_enabled();

        self.write().insert(identity, Arc::clone(&session));
        debug!("Replaced session for {}", identity);
        Ok(session)
    }

    /// Stop, persist and forget a session
    pub fn remove(&self, identity: Uuid) -> Result<(), RegistryError> {
        let _lifecycle = self.lifecycle();

        let Some(session) = self.lookup(identity) else {
            error!("Tried to remove session for {} but none is registered", identity);
            return Err(RegistryError::NotRegistered(identity));
        };
        session.stop_all();
        self.persist(&session);

        let mut sessions = self.write();
        sessions.remove(&identity);
        self.publish_count(&sessions);
        debug!("Removed session for {}", identity);
        Ok(())
    }

    /// Stop and persist every session, leaving the registry empty
    pub fn flush_all(&self) {
        let _lifecycle = self.lifecycle();

        let drained: Vec<Arc<UserSession>> = {
            let mut sessions = self.write();
            let drained = sessions.drain().map(|(_, session)| session).collect();
            self.publish_count(&sessions);
            drained
        };
        for session in &drained {
            session.stop_all();
            self.persist(session);
        }
        info!("Flushed {} sessions", drained.len());
    }

    /// Join hook: bind the session to `user`, apply join defaults, start displays
    pub fn handle_join(&self, user: Arc<dyn UserHandle>) -> Arc<UserSession> {
        let identity = user.identity();
        let session = match self.lookup(identity) {
            Some(_) => self
                .replace(Arc::clone(&user))
                .unwrap_or_else(|_| self.get(user)),
            None => self.get(user),
        };

        if let Some(config) = self.services.resolver.config_for(identity) {
            session.apply_join_defaults(&config);
        }
        session.start_enabled();
        session
    }

    pub fn handle_quit(&self, identity: Uuid) -> Result<(), RegistryError> {
        self.remove(identity)
    }

    /// Persist everything, then rebuild sessions for users still online
    pub fn reload(&self, users: &[Arc<dyn UserHandle>]) {
        self.flush_all();
        for user in users.iter().filter(|user| user.is_online()) {
            self.get(Arc::clone(user)).start_enabled();
        }
        info!("Reloaded display sessions for {} users", self.len());
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
