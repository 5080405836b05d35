use serde::{Deserialize, Deserializer};
use std::fmt;

/// Keeps secrets out of `Debug` / `Display` output, and therefore out of logs.
#[derive(Clone, Eq, PartialEq)]
pub struct Sensitive<T>(pub T);

impl<T> Sensitive<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Sensitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_redact() {
        let s = Sensitive("xtract1234".to_string());
        assert!(!format!("{s:?}").contains("xtract1234"));
        assert!(!format!("{s}").contains("xtract1234"));
        assert_eq!(s.expose(), "xtract1234");
    }
}
