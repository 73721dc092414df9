use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A single card definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    pub id: String,
    pub name: String,
    pub elixir: u32,
}

/// Raw cards.json file format
#[derive(Debug, Deserialize)]
struct CardsFile {
    #[allow(dead_code)]
    version: String,
    cards: Vec<CardData>,
}

/// Built-in costs used when no cards.json is available.
const BUILTIN_CARDS: &[(&str, u32)] = &[
    ("Archers", 3),
    ("Arrows", 3),
    ("Baby Dragon", 4),
    ("Balloon", 5),
    ("Bandit", 3),
    ("Bats", 2),
    ("Cannon", 3),
    ("Electro Wizard", 4),
    ("Elixir Golem", 3),
    ("Fireball", 4),
    ("Giant", 5),
    ("Goblin Barrel", 3),
    ("Goblin Gang", 3),
    ("Goblins", 2),
    ("Golem", 8),
    ("Hog Rider", 4),
    ("Ice Golem", 2),
    ("Ice Spirit", 1),
    ("Inferno Tower", 5),
    ("Knight", 3),
    ("Lava Hound", 7),
    ("Lightning", 6),
    ("Lumberjack", 4),
    ("Mega Knight", 7),
    ("Miner", 3),
    ("Mini P.E.K.K.A", 4),
    ("Minions", 3),
    ("Musketeer", 4),
    ("P.E.K.K.A", 7),
    ("Poison", 4),
    ("Prince", 5),
    ("Rocket", 6),
    ("Royal Giant", 6),
    ("Skeleton Army", 3),
    ("Skeletons", 1),
    ("Sparky", 6),
    ("Spear Goblins", 2),
    ("Tesla", 4),
    ("The Log", 2),
    ("Three Musketeers", 9),
    ("Tornado", 3),
    ("Valkyrie", 4),
    ("Witch", 5),
    ("Wizard", 5),
    ("X-Bow", 6),
    ("Zap", 2),
];

/// Card registry keyed by normalized name
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: HashMap<String, CardData>,
}

impl CardCatalog {
    /// Catalog populated from the built-in cost table
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for &(name, elixir) in BUILTIN_CARDS {
            catalog.insert(CardData {
                id: normalize_card_name(name),
                name: name.to_string(),
                elixir,
            });
        }
        catalog
    }

    /// Load card data from `data_dir/cards.json`, falling back to the
    /// built-in table when the file is absent.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let cards_path = data_dir.join("cards.json");
        if !cards_path.exists() {
            tracing::warn!(
                "No cards.json found at {}. Using built-in card costs",
                cards_path.display()
            );
            return Ok(Self::builtin());
        }

        let content =
            std::fs::read_to_string(&cards_path).context("Failed to read cards.json")?;
        let file: CardsFile =
            serde_json::from_str(&content).context("Failed to parse cards.json")?;

        let mut catalog = Self::default();
        for card in file.cards {
            catalog.insert(card);
        }

        tracing::info!("Loaded {} cards", catalog.len());
        Ok(catalog)
    }

    pub fn insert(&mut self, card: CardData) {
        self.cards.insert(normalize_card_name(&card.name), card);
    }

    /// Look up a card by detector label or display name
    pub fn get(&self, name: &str) -> Option<&CardData> {
        self.cards.get(&normalize_card_name(name))
    }

    /// Elixir cost for a label, if the card is known
    pub fn cost_of(&self, name: &str) -> Option<u32> {
        self.get(name).map(|c| c.elixir)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Lowercase a label and strip everything but letters and digits, so
/// "Mini P.E.K.K.A", "mini-pekka" and "MiniPekka" share one key.
pub fn normalize_card_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
