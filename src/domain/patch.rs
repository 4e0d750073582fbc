/// One field of a partial update.
///
/// `Absent` means the key was not sent, `Null` means it was sent as JSON
/// `null`, `Present` carries the new value. Only `Absent` leaves the stored
/// value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Present(T),
}

impl<T> Patch<T> {
    pub fn is_touched(&self) -> bool {
        !matches!(self, Patch::Absent)
    }
}

impl<T: Clone> Patch<T> {
    /// Resolve against an optional stored value: `Null` clears it.
    pub fn merge_optional(&self, current: &Option<T>) -> Option<T> {
        match self {
            Patch::Absent => current.clone(),
            Patch::Null => None,
            Patch::Present(value) => Some(value.clone()),
        }
    }

    /// Resolve against a required stored value: `Null` falls back to `default`.
    pub fn merge_required(&self, current: &T, default: impl FnOnce() -> T) -> T {
        match self {
            Patch::Absent => current.clone(),
            Patch::Null => default(),
            Patch::Present(value) => value.clone(),
        }
    }
}
