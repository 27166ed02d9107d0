use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ScreenLoopResult;

/// Screen rectangle of a registered control, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn center(&self) -> (i32, i32) {
        (
            (self.x + self.width / 2) as i32,
            (self.y + self.height / 2) as i32,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Button {
    pub name: String,
    pub bounds: BoundingBox,
    #[serde(default)]
    pub description: String,
}

/// Registry of clickable controls, keyed by a stable short id.
/// Read-only from the scheduler's perspective; edited through settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ButtonRegistry {
    buttons: BTreeMap<String, Button>,
}

impl ButtonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shipped on first run: the four canonical table actions.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let defaults = [
            ("fold", "Fold", 1400, 800, "Discard the hand"),
            ("call", "Call", 1550, 800, "Match the current bet"),
            ("raise", "Raise", 1700, 800, "Increase the bet"),
            ("check", "Check", 1400, 750, "Pass the action"),
        ];
        for (id, name, x, y, description) in defaults {
            registry.insert(
                id,
                Button {
                    name: name.to_string(),
                    bounds: BoundingBox {
                        x,
                        y,
                        width: 110,
                        height: 55,
                    },
                    description: description.to_string(),
                },
            );
        }
        registry
    }

    pub fn insert(&mut self, id: &str, button: Button) {
        self.buttons.insert(id.to_string(), button);
    }

    pub fn remove(&mut self, id: &str) -> Option<Button> {
        self.buttons.remove(id)
    }

    pub fn resolve(&self, id: &str) -> Option<&Button> {
        self.buttons.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.buttons.contains_key(id)
    }

    pub fn center_of(&self, id: &str) -> Option<(i32, i32)> {
        self.buttons.get(id).map(|b| b.bounds.center())
    }

    pub fn available_ids(&self) -> Vec<String> {
        self.buttons.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Loads the registry from `path`, creating the file with the default
    /// button set when it does not exist yet.
    pub fn load_or_default(path: &Path) -> ScreenLoopResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let registry: Self = serde_json::from_str(&content)?;
            tracing::info!(
                path = %path.display(),
                buttons = registry.buttons.len(),
                "button registry loaded"
            );
            Ok(registry)
        } else {
            let registry = Self::with_defaults();
            registry.save(path)?;
            tracing::info!(path = %path.display(), "created default button registry");
            Ok(registry)
        }
    }

    pub fn save(&self, path: &Path) -> ScreenLoopResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "button registry saved");
        Ok(())
    }
}

/// Default registry location under the per-user data directory.
pub fn default_registry_path() -> PathBuf {
    crate::transcript::data_dir_or_cwd().join("buttons.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_midpoint_of_bounds() {
        let bounds = BoundingBox {
            x: 1400,
            y: 800,
            width: 110,
            height: 55,
        };
        assert_eq!(bounds.center(), (1455, 827));
    }

    #[test]
    fn defaults_register_the_four_table_actions() {
        let registry = ButtonRegistry::with_defaults();
        assert_eq!(
            registry.available_ids(),
            vec!["call", "check", "fold", "raise"]
        );
        assert!(registry.resolve("fold").is_some());
        assert!(registry.resolve("all_in").is_none());
    }

    #[test]
    fn removed_button_no_longer_resolves() {
        let mut registry = ButtonRegistry::with_defaults();
        registry.remove("call");
        assert!(!registry.contains("call"));
        assert!(registry.center_of("call").is_none());
    }

    #[test]
    fn load_creates_defaults_then_round_trips() {
        let dir = std::env::temp_dir().join(format!("screenloop-{}", uuid::Uuid::new_v4()));
        let path = dir.join("buttons.json");

        let registry = ButtonRegistry::load_or_default(&path).unwrap();
        assert!(path.exists());
        assert_eq!(registry.available_ids().len(), 4);

        let mut edited = registry.clone();
        edited.insert(
            "all_in",
            Button {
                name: "All in".into(),
                bounds: BoundingBox {
                    x: 10,
                    y: 20,
                    width: 30,
                    height: 40,
                },
                description: String::new(),
            },
        );
        edited.save(&path).unwrap();

        let reloaded = ButtonRegistry::load_or_default(&path).unwrap();
        assert!(reloaded.contains("all_in"));
        assert_eq!(reloaded.center_of("all_in"), Some((25, 40)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
