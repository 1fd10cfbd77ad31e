const DOCUMENTATION: &str = r#"# Stratum settings. You may edit this file, but be aware that formatting and comments will not
# be preserved, and all keys are case sensitive.

# A manifest's own [settings] table takes precedence over anything here.

# strict_opacity: refuse layers with opacity outside 0..=1 instead of clamping them.

"#;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Stored {
    pub strict_opacity: bool,
}
impl Default for Stored {
    fn default() -> Self {
        let settings = stratum_core::Settings::default();
        Self {
            strict_opacity: settings.strict_opacity,
        }
    }
}
impl From<Stored> for stratum_core::Settings {
    fn from(value: Stored) -> Self {
        Self {
            strict_opacity: value.strict_opacity,
        }
    }
}

/// Where the current preferences came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    File,
    /// No preference dir on this system.
    NoPath,
    /// The file doesn't exist yet.
    Missing,
    /// The file exists but couldn't be read or parsed. It is left alone.
    Invalid,
}

pub struct Preferences {
    origin: Origin,
    pub stored: Stored,
}
impl Preferences {
    const FILENAME: &'static str = "settings.toml";
    /// Shared global preferences, saved and loaded from the user's preference dir.
    /// (Or defaulted, if unavailable for some reason)
    #[must_use]
    pub fn get() -> &'static Self {
        static GLOBAL_PREFERENCES: std::sync::OnceLock<Preferences> = std::sync::OnceLock::new();

        GLOBAL_PREFERENCES.get_or_init(|| {
            let mut dir = preferences_dir();
            match dir.as_mut() {
                None => Self::no_path(),
                Some(dir) => {
                    dir.push(Self::FILENAME);
                    Self::load_or_default(dir)
                }
            }
        })
    }
    #[must_use]
    pub fn no_path() -> Self {
        log::warn!("Settings weren't available, defaulting.");
        Self::defaulted(Origin::NoPath)
    }
    fn defaulted(origin: Origin) -> Self {
        Self {
            origin,
            stored: Stored::default(),
        }
    }
    #[must_use]
    fn load_or_default(path: &std::path::Path) -> Self {
        let stored: anyhow::Result<Stored> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let stored : Stored = toml::from_str(&string)?;

            Ok(stored)
        };

        match stored {
            Ok(stored) => Self {
                origin: Origin::File,
                stored,
            },
            Err(e) => {
                let missing = e
                    .downcast_ref::<std::io::Error>()
                    .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound);
                if missing {
                    log::info!("No settings at {path:?}, defaulting.");
                    Self::defaulted(Origin::Missing)
                } else {
                    log::error!("Ignoring unusable settings at {path:?}, defaulting: {e:#}");
                    Self::defaulted(Origin::Invalid)
                }
            }
        }
    }
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }
    /// Return true if loading user's settings failed, in which case they're defaulted.
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.origin != Origin::File
    }
    /// Whether [`Self::save`] may write defaults without clobbering anything the user wrote.
    #[must_use]
    pub fn should_write_defaults(&self) -> bool {
        self.origin == Origin::Missing
    }
    #[must_use]
    pub fn settings(&self) -> stratum_core::Settings {
        self.stored.into()
    }
    pub fn save(&self) -> anyhow::Result<()> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        std::fs::write(preferences, Self::serialize(&self.stored)?)?;
        Ok(())
    }
    fn serialize(stored: &Stored) -> anyhow::Result<String> {
        let string = toml::ser::to_string_pretty(stored)?;
        Ok(DOCUMENTATION.to_owned() + &string)
    }
}
