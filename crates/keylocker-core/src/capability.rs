/// Whether a host facility (key store, crypto provider) is usable.
///
/// Absence is an ordinary value: callers branch on it instead of catching errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Capability<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Capability::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    pub fn as_available(&self) -> Option<&T> {
        match self {
            Capability::Available(inner) => Some(inner),
            Capability::Unavailable { .. } => None,
        }
    }

    /// Reason the capability is missing, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Capability::Available(_) => None,
            Capability::Unavailable { reason } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Capability<U> {
        match self {
            Capability::Available(inner) => Capability::Available(f(inner)),
            Capability::Unavailable { reason } => Capability::Unavailable { reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_carries_reason() {
        let cap: Capability<u8> = Capability::unavailable("no keychain");
        assert!(!cap.is_available());
        assert_eq!(cap.as_available(), None);
        assert_eq!(cap.unavailable_reason(), Some("no keychain"));
    }

    #[test]
    fn map_preserves_variant() {
        assert_eq!(Capability::Available(2).map(|v| v * 2), Capability::Available(4));
        let missing: Capability<u8> = Capability::unavailable("gone");
        assert_eq!(missing.map(|v| v * 2), Capability::unavailable("gone"));
    }
}
