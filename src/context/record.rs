use std::cell::RefCell;
use crate::core::{Result, Value, validate_value};
use crate::env::{Settings, SettingsUpdate};

#[derive(Debug, Default)]
struct RecordState {
    fetched: Option<Settings>,
    /// Writes made through this instance before the first fetch
    written: SettingsUpdate,
}

/// Instance-scoped cache over one remote record.
///
/// The record is fetched at most once. Writes land in the cache right
/// away, so a key written through this instance reads back without a
/// fetch even if the record was never loaded.
#[derive(Debug, Default)]
pub(crate) struct LazyRecord {
    state: RefCell<RecordState>,
}

impl LazyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.borrow().fetched.is_some()
    }

    pub fn get<F>(&self, key: &str, fetch: F) -> Result<Option<String>>
    where
        F: FnOnce() -> Result<Settings>,
    {
        if let Some(value) = self.state.borrow().written.get(key) {
            return Ok(value.clone());
        }
        self.with_loaded(fetch, |data| data.get(key).cloned())
    }

    /// Run `f` over the full record, fetching it first if needed
    pub fn with_loaded<F, R>(&self, fetch: F, f: impl FnOnce(&Settings) -> R) -> Result<R>
    where
        F: FnOnce() -> Result<Settings>,
    {
        let mut state = self.state.borrow_mut();
        if state.fetched.is_none() {
            let mut data = fetch()?;
            for (key, value) in std::mem::take(&mut state.written) {
                apply(&mut data, key, value);
            }
            state.fetched = Some(data);
        }
        let data = state.fetched.get_or_insert_with(Settings::new);
        Ok(f(data))
    }

    pub fn record_write(&self, key: &str, value: Option<String>) {
        let mut state = self.state.borrow_mut();
        match state.fetched.as_mut() {
            Some(data) => apply(data, key.to_string(), value),
            None => {
                state.written.insert(key.to_string(), value);
            }
        }
    }
}

fn apply(data: &mut Settings, key: String, value: Option<String>) {
    match value {
        Some(value) => {
            data.insert(key, value);
        }
        None => {
            data.remove(&key);
        }
    }
}

/// Validate `value`, run `authorize`, push a single-key update and mirror
/// it into `cache`.
///
/// Nothing reaches the environment unless the value is text or null, and
/// the cache only changes after `push` succeeds.
pub(crate) fn write_through<A, P>(
    cache: &LazyRecord,
    key: &str,
    value: Value,
    authorize: A,
    push: P,
) -> Result<()>
where
    A: FnOnce() -> Result<()>,
    P: FnOnce(&SettingsUpdate) -> Result<()>,
{
    let value = validate_value(key, value)?;
    authorize()?;
    let mut update = SettingsUpdate::new();
    update.insert(key.to_string(), value.clone());
    push(&update)?;
    cache.record_write(key, value);
    Ok(())
}
