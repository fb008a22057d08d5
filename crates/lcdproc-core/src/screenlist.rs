//! Screen scheduler.
//!
//! The [`ScreenList`] owns every screen in the system, client and server
//! alike, and decides which one is current. It is re-evaluated once per
//! render tick by [`ScreenList::process`]:
//!
//! 1. Stable-sort by descending priority.
//! 2. No current screen: take the first one.
//! 3. Count down the current screen's timeout; an expired screen is removed
//!    and the pass ends.
//! 4. A higher priority class preempts the current screen.
//! 5. With autorotation on, INFO and FOREGROUND screens give way to the next
//!    screen once they have been shown for `duration` ticks.
//!
//! Switching never talks to clients directly. It reports a [`Transition`]
//! and the caller sends `ignore`/`listen` to the owners involved.

use crate::{client::ClientId, screen::Priority, screen::Screen};

/// Stable handle of a screen in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScreenKey(pub u64);

/// Identity of a screen involved in a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenRef {
    /// Handle
    pub key: ScreenKey,
    /// Owning client, `None` for server screens
    pub owner: Option<ClientId>,
    /// Screen id as the owner knows it
    pub id: String,
}

/// A change of the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Screen that stopped being shown
    pub from: Option<ScreenRef>,
    /// Screen now shown
    pub to: ScreenRef,
}

/// Result of one scheduler pass.
#[derive(Debug, Default)]
pub struct ProcessOutcome {
    /// Current screen changed
    pub transition: Option<Transition>,
    /// Screen removed because its timeout ran out
    pub expired: Option<Screen>,
}

/// Every screen, sorted by priority, plus the rotation state.
#[derive(Debug, Clone)]
pub struct ScreenList {
    screens: Vec<(ScreenKey, Screen)>,
    next_key: u64,
    current: Option<ScreenKey>,
    current_start: u64,
    /// Rotate INFO and FOREGROUND screens automatically
    pub autorotate: bool,
}

impl Default for ScreenList {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenList {
    /// Empty list with autorotation on.
    pub fn new() -> Self {
        Self { screens: Vec::new(), next_key: 0, current: None, current_start: 0, autorotate: true }
    }

    /// Add a screen. It takes part in scheduling from the next pass on.
    pub fn add(&mut self, screen: Screen) -> ScreenKey {
        let key = ScreenKey(self.next_key);
        self.next_key += 1;
        self.screens.push((key, screen));
        key
    }

    /// Look up a screen.
    pub fn get(&self, key: ScreenKey) -> Option<&Screen> {
        self.screens.iter().find(|(k, _)| *k == key).map(|(_, s)| s)
    }

    /// Look up a screen for modification.
    pub fn get_mut(&mut self, key: ScreenKey) -> Option<&mut Screen> {
        self.screens.iter_mut().find(|(k, _)| *k == key).map(|(_, s)| s)
    }

    /// Find a screen by owner and id.
    pub fn find(&self, owner: Option<ClientId>, id: &str) -> Option<ScreenKey> {
        self.screens.iter().find(|(_, s)| s.owner == owner && s.id == id).map(|(k, _)| *k)
    }

    /// Handles of every screen owned by `owner`, in list order.
    pub fn owned_by(&self, owner: ClientId) -> Vec<ScreenKey> {
        self.screens.iter().filter(|(_, s)| s.owner == Some(owner)).map(|(k, _)| *k).collect()
    }

    /// Number of screens.
    pub fn len(&self) -> usize {
        self.screens.len()
    }

    /// True when there are no screens.
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Screens in scheduling order (as of the last sort).
    pub fn iter(&self) -> impl Iterator<Item = (ScreenKey, &Screen)> {
        self.screens.iter().map(|(k, s)| (*k, s))
    }

    /// Handle of the current screen.
    pub fn current(&self) -> Option<ScreenKey> {
        self.current
    }

    /// The current screen.
    pub fn current_screen(&self) -> Option<&Screen> {
        self.current.and_then(|key| self.get(key))
    }

    /// The current screen, mutably.
    pub fn current_screen_mut(&mut self) -> Option<&mut Screen> {
        let key = self.current?;
        self.get_mut(key)
    }

    /// Tick at which the current screen was switched to.
    pub fn current_start(&self) -> u64 {
        self.current_start
    }

    fn position(&self, key: ScreenKey) -> Option<usize> {
        self.screens.iter().position(|(k, _)| *k == key)
    }

    fn screen_ref(&self, key: ScreenKey) -> Option<ScreenRef> {
        self.get(key).map(|s| ScreenRef { key, owner: s.owner, id: s.id.clone() })
    }

    /// Make `key` the current screen.
    ///
    /// Returns `None` when it already is current or does not exist.
    pub fn switch(&mut self, key: ScreenKey, timer: u64) -> Option<Transition> {
        if self.current == Some(key) {
            return None;
        }
        let to = self.screen_ref(key)?;
        let from = self.current.and_then(|k| self.screen_ref(k));
        self.current = Some(key);
        self.current_start = timer;
        Some(Transition { from, to })
    }

    /// Move to the following screen, wrapping to the first one when the end
    /// of the current priority class is reached.
    pub fn goto_next(&mut self, timer: u64) -> Option<Transition> {
        let current = self.current?;
        let index = self.position(current)?;
        let priority = self.screens.get(index)?.1.priority;
        let target = match self.screens.get(index + 1) {
            Some((key, s)) if s.priority >= priority => *key,
            _ => self.screens.first()?.0,
        };
        self.switch(target, timer)
    }

    /// Move to the preceding screen, wrapping to the last screen of the top
    /// priority class at the start of the list.
    pub fn goto_prev(&mut self, timer: u64) -> Option<Transition> {
        let current = self.current?;
        let index = self.position(current)?;
        let target = if index > 0 {
            self.screens.get(index - 1)?.0
        } else {
            let top = self.screens.first()?.1.priority;
            self.screens.iter().take_while(|(_, s)| s.priority == top).last()?.0
        };
        self.switch(target, timer)
    }

    /// Remove a screen. Removing the current screen moves on to the next one
    /// first, or to the top of the list when it was alone in its class.
    pub fn remove(&mut self, key: ScreenKey, timer: u64) -> Option<(Screen, Option<Transition>)> {
        let mut transition = None;
        if self.current == Some(key) {
            transition = self.goto_next(timer);
        }
        let index = self.position(key)?;
        let (_, screen) = self.screens.remove(index);

        if self.current == Some(key) {
            let from = ScreenRef { key, owner: screen.owner, id: screen.id.clone() };
            self.current = None;
            if let Some(first) = self.screens.first().map(|(k, _)| *k) {
                transition = self.switch(first, timer).map(|t| Transition { from: Some(from), ..t });
            }
        }
        Some((screen, transition))
    }

    /// One scheduler pass at tick `timer`.
    pub fn process(&mut self, timer: u64) -> ProcessOutcome {
        self.screens.sort_by(|(_, a), (_, b)| b.priority.cmp(&a.priority));

        let Some((first, first_priority)) = self.screens.first().map(|(k, s)| (*k, s.priority))
        else {
            return ProcessOutcome::default();
        };

        let Some(current) = self.current else {
            return ProcessOutcome { transition: self.switch(first, timer), expired: None };
        };

        let Some(screen) = self.get_mut(current) else {
            self.current = None;
            return ProcessOutcome { transition: self.switch(first, timer), expired: None };
        };

        let (priority, duration) = (screen.priority, screen.duration);

        if screen.timeout != -1 {
            screen.timeout -= 1;
            if screen.timeout <= 0 {
                return match self.remove(current, timer) {
                    Some((screen, transition)) => {
                        ProcessOutcome { transition, expired: Some(screen) }
                    },
                    None => ProcessOutcome::default(),
                };
            }
        }

        if first_priority > priority {
            return ProcessOutcome { transition: self.switch(first, timer), expired: None };
        }

        let shown = timer.saturating_sub(self.current_start);
        if self.autorotate
            && shown >= u64::try_from(duration).unwrap_or(0)
            && priority > Priority::Background
            && priority <= Priority::Foreground
        {
            return ProcessOutcome { transition: self.goto_next(timer), expired: None };
        }

        ProcessOutcome::default()
    }
}
