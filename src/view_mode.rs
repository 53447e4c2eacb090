use std::fmt;
use std::str::FromStr;

/// The two ways the map can be framed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// Whole world with the cable overlay
    #[default]
    GrandScheme,
    /// Zoomed onto the Nigeria boundary, locked to its box
    NigeriaFocus,
}

impl ViewMode {
    pub const ALL: [ViewMode; 2] = [ViewMode::GrandScheme, ViewMode::NigeriaFocus];

    /// Name as written to the state file and shown on the footer buttons
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::GrandScheme => "Grand Scheme",
            ViewMode::NigeriaFocus => "Nigeria Focus",
        }
    }

    /// Resolve a stored value; anything unrecognized is GrandScheme
    pub fn from_persisted(value: Option<&str>) -> Self {
        match value {
            Some("Nigeria Focus") => ViewMode::NigeriaFocus,
            Some("Grand Scheme") => ViewMode::GrandScheme,
            Some(other) => {
                tracing::debug!(value = other, "unrecognized stored view mode, using Grand Scheme");
                ViewMode::GrandScheme
            }
            None => ViewMode::GrandScheme,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::GrandScheme => ViewMode::NigeriaFocus,
            ViewMode::NigeriaFocus => ViewMode::GrandScheme,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    /// Lenient parse for command-line use
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "grandscheme" | "grand" | "global" | "world" => Ok(ViewMode::GrandScheme),
            "nigeriafocus" | "nigeria" | "focus" => Ok(ViewMode::NigeriaFocus),
            _ => Err(format!(
                "unknown view mode '{}' (expected 'grand-scheme' or 'nigeria-focus')",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_names_round_trip() {
        for mode in ViewMode::ALL {
            assert_eq!(ViewMode::from_persisted(Some(mode.label())), mode);
        }
    }

    #[test]
    fn bogus_or_missing_is_grand_scheme() {
        assert_eq!(ViewMode::from_persisted(Some("bogus")), ViewMode::GrandScheme);
        assert_eq!(ViewMode::from_persisted(Some("nigeria focus")), ViewMode::GrandScheme);
        assert_eq!(ViewMode::from_persisted(None), ViewMode::GrandScheme);
    }

    #[test]
    fn cli_spellings() {
        assert_eq!("nigeria-focus".parse(), Ok(ViewMode::NigeriaFocus));
        assert_eq!("Grand Scheme".parse(), Ok(ViewMode::GrandScheme));
        assert_eq!("focus".parse(), Ok(ViewMode::NigeriaFocus));
        assert!("atlantis".parse::<ViewMode>().is_err());
    }

    #[test]
    fn toggle_flips() {
        assert_eq!(ViewMode::GrandScheme.toggled(), ViewMode::NigeriaFocus);
        assert_eq!(ViewMode::NigeriaFocus.toggled(), ViewMode::GrandScheme);
    }
}
