//! Per-session state and the registry that owns it
//!
//! A `SessionContext` holds the login flags and the session's own in-memory
//! database. Dropping the context (logout does not, ending the session does)
//! destroys every account and stock it held. A session nobody has touched for
//! longer than the registry's idle timeout is ended the same way.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::auth;
use crate::csv_import;
use crate::dashboard::StockView;
use crate::db::Database;
use crate::error::{DashboardError, Result};
use crate::models::{ImportResult, StockSummary, UserAccount};

pub struct SessionContext {
    db: Database,
    authenticated: bool,
    current_user: Option<String>,
    last_seen: Instant,
}

/// Login state as shown to the client
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub user: Option<UserAccount>,
}

impl SessionContext {
    /// New session with the seed stocks loaded and nobody logged in
    pub fn new() -> Result<Self> {
        Ok(Self {
            db: Database::with_seed_data()?,
            authenticated: false,
            current_user: None,
            last_seen: Instant::now(),
        })
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn status(&self) -> Result<SessionStatus> {
        let user = match &self.current_user {
            Some(email) => self.db.get_user(email)?,
            None => None,
        };
        Ok(SessionStatus {
            authenticated: self.authenticated,
            user,
        })
    }

    pub fn register(&self, email: &str, name: &str, password: &str) -> Result<UserAccount> {
        auth::register(&self.db, email, name, password)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<UserAccount> {
        let user = auth::login(&self.db, email, password)?;
        self.authenticated = true;
        self.current_user = Some(user.email.clone());
        log::info!("{} logged in", user.email);
        Ok(user)
    }

    pub fn logout(&mut self) {
        if let Some(email) = self.current_user.take() {
            log::info!("{} logged out", email);
        }
        self.authenticated = false;
    }

    fn require_auth(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(DashboardError::NotAuthenticated)
        }
    }

    pub fn list_stocks(&self) -> Result<Vec<StockSummary>> {
        self.require_auth()?;
        let stocks = self.db.get_stocks()?;
        Ok(stocks.iter().map(StockSummary::from).collect())
    }

    pub fn stock_view(&self, symbol: &str) -> Result<StockView> {
        self.require_auth()?;
        let symbol = symbol.trim().to_uppercase();
        self.db
            .get_stock(&symbol)?
            .map(|record| StockView::from_record(&record))
            .ok_or(DashboardError::NotFound(symbol))
    }

    pub fn import_csv(&mut self, csv_content: &str) -> Result<ImportResult> {
        self.require_auth()?;
        csv_import::import_csv(&mut self.db, csv_content)
    }

    pub fn export_csv(&self) -> Result<String> {
        self.require_auth()?;
        csv_import::export_csv(&self.db.get_stocks()?)
    }
}

/// Sessions idle longer than this are dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// All live sessions keyed by id
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionContext>>,
    idle_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Start a session and return its id. Idle sessions are evicted first.
    pub fn create(&self) -> Result<String> {
        let context = SessionContext::new()?;
        let id = Uuid::new_v4().to_string();

        let mut sessions = self.lock()?;
        let evicted = evict_idle(&mut sessions, Instant::now(), self.idle_timeout);
        if evicted > 0 {
            log::info!("Evicted {} idle session(s)", evicted);
        }
        sessions.insert(id.clone(), context);
        log::debug!("Session {} started", id);
        Ok(id)
    }

    /// Drop every session idle longer than the timeout. Returns how many went.
    pub fn evict_idle(&self) -> Result<usize> {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> Result<usize> {
        let mut sessions = self.lock()?;
        Ok(evict_idle(&mut sessions, now, self.idle_timeout))
    }

    /// End a session, dropping its database. Returns false for unknown ids.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let removed = self.lock()?.remove(id).is_some();
        if removed {
            log::debug!("Session {} ended", id);
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against the session's context while holding the registry lock.
    /// An expired session is dropped here rather than revived.
    pub fn with_session<T, F>(&self, id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut SessionContext) -> Result<T>,
    {
        let mut sessions = self.lock()?;
        let expired = sessions
            .get(id)
            .is_some_and(|c| c.idle_for(Instant::now()) > self.idle_timeout);
        if expired {
            sessions.remove(id);
            log::debug!("Session {} expired", id);
        }

        let context = sessions
            .get_mut(id)
            .ok_or_else(|| DashboardError::NotFound(format!("session {}", id)))?;
        context.touch();
        f(context)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionContext>>> {
        self.sessions
            .lock()
            .map_err(|e| DashboardError::Internal(format!("session registry poisoned: {}", e)))
    }
}

fn evict_idle(
    sessions: &mut HashMap<String, SessionContext>,
    now: Instant,
    idle_timeout: Duration,
) -> usize {
    let before = sessions.len();
    sessions.retain(|id, context| {
        let keep = context.idle_for(now) <= idle_timeout;
        if !keep {
            log::debug!("Session {} expired", id);
        }
        keep
    });
    before - sessions.len()
}
