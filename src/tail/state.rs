// Server state machine module
// Holds the live view derived from log events and fires the registered hooks

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use super::classify::ClassifiedEvent;

type PlayerHook = Box<dyn Fn(&str, NaiveDateTime) + Send + Sync>;
type StartHook = Box<dyn Fn(Option<&str>, NaiveDateTime) + Send + Sync>;

/// Optional callbacks invoked by [`ServerStateMachine::apply`].
///
/// Every hook defaults to a no-op; set the ones you need at construction:
///
/// ```ignore
/// let events = LogEvents::new().on_login(|player, at| println!("{player} joined at {at}"));
/// ```
#[derive(Default)]
pub struct LogEvents {
    login: Option<PlayerHook>,
    logout: Option<PlayerHook>,
    start: Option<StartHook>,
}

impl LogEvents {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_login(mut self, hook: impl Fn(&str, NaiveDateTime) + Send + Sync + 'static) -> Self {
        self.login = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_logout(mut self, hook: impl Fn(&str, NaiveDateTime) + Send + Sync + 'static) -> Self {
        self.logout = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_start(
        mut self,
        hook: impl Fn(Option<&str>, NaiveDateTime) + Send + Sync + 'static,
    ) -> Self {
        self.start = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for LogEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEvents")
            .field("login", &self.login.is_some())
            .field("logout", &self.logout.is_some())
            .field("start", &self.start.is_some())
            .finish()
    }
}

/// Connected players, running version and last start time.
#[derive(Debug, Default)]
pub struct ServerStateMachine {
    players: BTreeMap<String, NaiveDateTime>,
    version: Option<String>,
    last_start: Option<NaiveDateTime>,
    events: LogEvents,
}

impl ServerStateMachine {
    pub fn new(events: LogEvents) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, event: ClassifiedEvent) {
        match event {
            ClassifiedEvent::Login { player, at } => {
                self.players.insert(player.clone(), at);
                if let Some(hook) = &self.events.login {
                    hook(&player, at);
                }
            }
            ClassifiedEvent::Logout { player, at } => {
                if self.players.remove(&player).is_some() {
                    if let Some(hook) = &self.events.logout {
                        hook(&player, at);
                    }
                }
            }
            ClassifiedEvent::ServerStart { version, at } => {
                // Nobody can be connected to a server that is just starting
                self.players.clear();
                self.version = version;
                self.last_start = Some(at);
                if let Some(hook) = &self.events.start {
                    hook(self.version.as_deref(), at);
                }
            }
            ClassifiedEvent::Ignored => {}
        }
    }

    /// Player name to login time, sorted by name.
    pub const fn players(&self) -> &BTreeMap<String, NaiveDateTime> {
        &self.players
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub const fn last_start(&self) -> Option<NaiveDateTime> {
        self.last_start
    }

    /// Forget everything learned so far; hooks stay registered.
    pub fn clear(&mut self) {
        self.players.clear();
        self.version = None;
        self.last_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2010, 11, 30)
            .unwrap()
            .and_hms_opt(20, minute, 0)
            .unwrap()
    }

    fn login(player: &str, minute: u32) -> ClassifiedEvent {
        ClassifiedEvent::Login {
            player: player.to_string(),
            at: ts(minute),
        }
    }

    fn logout(player: &str, minute: u32) -> ClassifiedEvent {
        ClassifiedEvent::Logout {
            player: player.to_string(),
            at: ts(minute),
        }
    }

    fn recording_events(log: &Arc<Mutex<Vec<String>>>) -> LogEvents {
        let on_in = Arc::clone(log);
        let on_out = Arc::clone(log);
        let on_start = Arc::clone(log);
        LogEvents::new()
            .on_login(move |p, _| on_in.lock().unwrap().push(format!("in:{p}")))
            .on_logout(move |p, _| on_out.lock().unwrap().push(format!("out:{p}")))
            .on_start(move |v, _| {
                on_start
                    .lock()
                    .unwrap()
                    .push(format!("start:{}", v.unwrap_or("-")));
            })
    }

    #[test]
    fn test_login_then_logout_removes_player() {
        let mut sm = ServerStateMachine::default();
        sm.apply(login("alice", 1));
        sm.apply(login("bob", 2));
        sm.apply(logout("alice", 3));
        assert_eq!(sm.players().keys().collect::<Vec<_>>(), vec!["bob"]);
    }

    #[test]
    fn test_relogin_overwrites_timestamp() {
        let mut sm = ServerStateMachine::default();
        sm.apply(login("alice", 1));
        sm.apply(login("alice", 5));
        assert_eq!(sm.players().len(), 1);
        assert_eq!(sm.players()["alice"], ts(5));
    }

    #[test]
    fn test_unknown_logout_is_noop_without_hook() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut sm = ServerStateMachine::new(recording_events(&log));
        sm.apply(login("alice", 1));
        sm.apply(logout("ghost", 2));

        assert_eq!(sm.players().keys().collect::<Vec<_>>(), vec!["alice"]);
        assert_eq!(*log.lock().unwrap(), vec!["in:alice"]);
    }

    #[test]
    fn test_start_clears_players_and_sets_version() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut sm = ServerStateMachine::new(recording_events(&log));
        sm.apply(login("alice", 1));
        sm.apply(ClassifiedEvent::ServerStart {
            version: Some("1.2".to_string()),
            at: ts(9),
        });

        assert!(sm.players().is_empty());
        assert_eq!(sm.version(), Some("1.2"));
        assert_eq!(sm.last_start(), Some(ts(9)));
        assert_eq!(*log.lock().unwrap(), vec!["in:alice", "start:1.2"]);
    }

    #[test]
    fn test_start_without_version_clears_previous_version() {
        let mut sm = ServerStateMachine::default();
        sm.apply(ClassifiedEvent::ServerStart {
            version: Some("1.2".to_string()),
            at: ts(1),
        });
        sm.apply(ClassifiedEvent::ServerStart {
            version: None,
            at: ts(2),
        });
        assert_eq!(sm.version(), None);
        assert_eq!(sm.last_start(), Some(ts(2)));
    }

    #[test]
    fn test_ignored_has_no_effect() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut sm = ServerStateMachine::new(recording_events(&log));
        sm.apply(ClassifiedEvent::Ignored);
        assert!(sm.players().is_empty());
        assert!(sm.version().is_none());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_keeps_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut sm = ServerStateMachine::new(recording_events(&log));
        sm.apply(login("alice", 1));
        sm.clear();
        assert!(sm.players().is_empty());
        sm.apply(login("bob", 2));
        assert_eq!(*log.lock().unwrap(), vec!["in:alice", "in:bob"]);
    }
}
