//! Emoji catalog and the saved avatar preference

use crate::types::EmojiId;
use rand::Rng;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key the avatar is stored under in the preferences file
pub const AVATAR_KEY: &str = "icontale_user_emoji";

/// Every emoji a player can get as avatar, with its display name
pub const AVATARS: &[(&str, &str)] = &[
    ("😀", "smile"),
    ("😂", "joy"),
    ("😍", "love"),
    ("😎", "cool"),
    ("🤔", "thinking"),
    ("😱", "shock"),
    ("🥳", "party"),
    ("😡", "angry"),
    ("😭", "cry"),
    ("😴", "sleep"),
    ("👻", "ghost"),
    ("🤖", "robot"),
    ("🐶", "dog"),
    ("🐱", "cat"),
    ("🦄", "unicorn"),
    ("🐉", "dragon"),
    ("🍕", "pizza"),
    ("🍔", "burger"),
    ("🍟", "fries"),
    ("🍎", "apple"),
    ("🍌", "banana"),
    ("🍉", "watermelon"),
    ("⚽", "football"),
    ("🏀", "basketball"),
    ("🏈", "rugby"),
    ("🚗", "car"),
    ("✈️", "plane"),
    ("🚀", "rocket"),
    ("🌈", "rainbow"),
    ("🔥", "fire"),
    ("⭐", "star"),
    ("🎲", "dice"),
    ("🎸", "guitar"),
    ("🎮", "gamepad"),
    ("🎤", "mic"),
    ("🎧", "headphones"),
    ("📚", "books"),
    ("🧩", "puzzle"),
    ("🖌️", "brush"),
    ("🎨", "palette"),
    ("🏆", "trophy"),
    ("🥇", "gold"),
    ("🥈", "silver"),
    ("🥉", "bronze"),
    ("🎯", "target"),
    ("🎳", "bowling"),
    ("🕹️", "joystick"),
    ("🧸", "teddy"),
    ("🎁", "gift"),
    ("🎂", "cake"),
    ("🍰", "pie"),
    ("🍩", "donut"),
    ("🍪", "cookie"),
    ("🍫", "choco"),
    ("🍿", "popcorn"),
    ("🍦", "ice cream"),
    ("🍭", "lollipop"),
    ("🍺", "beer"),
    ("🍻", "cheers"),
    ("🥤", "soda"),
    ("☕", "coffee"),
    ("🍵", "tea"),
    ("🧃", "juice"),
    ("🧊", "ice"),
    ("🥪", "sandwich"),
    ("🥗", "salad"),
    ("🍲", "soup"),
    ("🍜", "ramen"),
    ("🍣", "sushi"),
    ("🍙", "onigiri"),
    ("🥠", "fortune"),
    ("🦐", "shrimp"),
    ("🦞", "lobster"),
    ("🦀", "crab"),
    ("🐟", "fish"),
    ("🐬", "dolphin"),
    ("🐋", "whale"),
    ("🦈", "shark"),
    ("🐊", "croc"),
    ("🐢", "turtle"),
    ("🐍", "snake"),
    ("🦎", "lizard"),
    ("🦖", "dino"),
    ("🐅", "tiger"),
    ("🐆", "leopard"),
    ("🦓", "zebra"),
    ("🦍", "gorilla"),
    ("🐘", "elephant"),
    ("🦛", "hippo"),
    ("🦏", "rhino"),
    ("🐪", "camel"),
    ("🦒", "giraffe"),
    ("🦘", "kangaroo"),
    ("🦥", "sloth"),
    ("🦦", "otter"),
    ("🦨", "skunk"),
    ("🦡", "badger"),
    ("🐁", "mouse"),
    ("🐀", "rat"),
    ("🐇", "rabbit"),
    ("🐿️", "chipmunk"),
    ("🦔", "hedgehog"),
];

/// Display name for a catalog emoji
pub fn emoji_name(emoji: &str) -> Option<&'static str> {
    AVATARS
        .iter()
        .find(|(e, _)| *e == emoji)
        .map(|(_, name)| *name)
}

pub fn random_avatar<R: Rng>(rng: &mut R) -> EmojiId {
    AVATARS[rng.random_range(0..AVATARS.len())].0.to_string()
}

/// Pick a random avatar that differs from `current`
pub fn pick_different<R: Rng>(current: &str, rng: &mut R) -> EmojiId {
    let candidates: Vec<&str> = AVATARS
        .iter()
        .map(|(e, _)| *e)
        .filter(|e| *e != current)
        .collect();
    candidates[rng.random_range(0..candidates.len())].to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("failed to access preferences: {0}")]
    Io(#[from] std::io::Error),

    #[error("preferences file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Small JSON key/value file holding client preferences
#[derive(Debug, Clone)]
pub struct AvatarStore {
    path: PathBuf,
}

impl AvatarStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, PrefsError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => match serde_json::from_str(&text)? {
                Value::Object(map) => Ok(map),
                _ => Ok(Map::new()),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Saved avatar, if any
    pub fn load(&self) -> Result<Option<EmojiId>, PrefsError> {
        let map = self.read_map()?;
        Ok(map
            .get(AVATAR_KEY)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    /// Save the avatar, keeping any other keys in the file
    pub fn save(&self, avatar: &str) -> Result<(), PrefsError> {
        let mut map = self.read_map().unwrap_or_else(|e| {
            tracing::warn!("Overwriting unreadable preferences at {:?}: {}", self.path, e);
            Map::new()
        });
        map.insert(AVATAR_KEY.to_string(), Value::String(avatar.to_string()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&map)?)?;
        tracing::debug!("Saved avatar {} to {:?}", avatar, self.path);
        Ok(())
    }

    /// Saved avatar, or a freshly picked one that is saved right away
    pub fn load_or_pick(&self) -> EmojiId {
        match self.load() {
            Ok(Some(avatar)) => return avatar,
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not read avatar preference: {}", e),
        }

        let avatar = random_avatar(&mut rand::rng());
        if let Err(e) = self.save(&avatar) {
            tracing::warn!("Could not save avatar preference: {}", e);
        }
        avatar
    }
}
