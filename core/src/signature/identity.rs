//! signature/identity.rs
//! Signer-identity helpers used by hosts that show who signed a document.

use crate::headers::SignerInfo;

impl SignerInfo {
    /// A record counts as a real identity once it carries a name.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn clear(&mut self) {
        *self = SignerInfo::default();
    }

    /// Short human label, e.g. `Ada <ada@example.org>`.
    pub fn display_label(&self) -> String {
        if self.email.is_empty() {
            self.name.clone()
        } else {
            format!("{} <{}>", self.name, self.email)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_invalidates() {
        let mut info = SignerInfo { name: "Ada".into(), email: "ada@example.org".into(), ..Default::default() };
        assert!(info.is_valid());
        assert_eq!(info.display_label(), "Ada <ada@example.org>");
        info.clear();
        assert!(!info.is_valid());
        assert_eq!(info, SignerInfo::default());
    }

    #[test]
    fn whitespace_name_is_not_an_identity() {
        let info = SignerInfo { name: "   ".into(), ..Default::default() };
        assert!(!info.is_valid());
    }
}
