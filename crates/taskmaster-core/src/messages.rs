//! AI persona messages.
//!
//! Nine message pools, one per (tier, personality) pair. The built-in pools
//! are static data checked for non-emptiness at compile time; an override
//! catalog can be loaded from TOML once at startup and is validated then.
//! Selection draws uniformly with replacement from an injected RNG, so a
//! seeded selector is fully deterministic.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, ValidationError};
use crate::respect::{classify_tier, RespectLevel, Tier};

/// Tone the AI uses when talking to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// Always encouraging and positive
    Supportive,
    /// Positive when you do well, stern when you don't
    #[default]
    Balanced,
    /// Extra harsh criticism, extra sarcastic
    Savage,
}

impl Personality {
    pub const ALL: [Personality; 3] = [
        Personality::Supportive,
        Personality::Balanced,
        Personality::Savage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Supportive => "supportive",
            Personality::Balanced => "balanced",
            Personality::Savage => "savage",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Personality::Supportive => "Always encouraging and positive",
            Personality::Balanced => "Positive when you do well, stern when you don't",
            Personality::Savage => "Extra harsh criticism, extra sarcastic",
        }
    }

    fn index(self) -> usize {
        match self {
            Personality::Supportive => 0,
            Personality::Balanced => 1,
            Personality::Savage => 2,
        }
    }
}

impl FromStr for Personality {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supportive" => Ok(Personality::Supportive),
            "balanced" => Ok(Personality::Balanced),
            "savage" => Ok(Personality::Savage),
            other => Err(ValidationError::invalid(
                "ai_personality",
                format!("'{other}' is not one of supportive, balanced, savage"),
            )),
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn tier_index(tier: Tier) -> usize {
    match tier {
        Tier::High => 0,
        Tier::Medium => 1,
        Tier::Low => 2,
    }
}

const SUPPORTIVE_HIGH: &[&str] = &[
    "You're crushing it! I'm so impressed with your dedication!",
    "Amazing work! You're my favorite human right now!",
    "I knew you could do it! Keep this momentum going!",
    "Wow, look at you being all productive! I'm proud of you!",
    "You're absolutely killing it! You're an inspiration!",
    "Keep up the fantastic work! You're doing great!",
    "Your consistency is admirable! You're a star!",
    "I'm honored to be your task manager! You're awesome!",
    "You're the definition of productivity! Simply amazing!",
    "Such dedication! You're making incredible progress!",
];

const BALANCED_HIGH: &[&str] = &[
    "You're doing a great job! Keep it up!",
    "Nice work completing your tasks! I'm impressed.",
    "You're on a roll! This is excellent progress.",
    "I'm happy to see you staying on top of things!",
    "Your dedication is paying off. Well done!",
    "This is the kind of consistency I like to see!",
    "You've earned my respect with your productivity.",
    "Impressive task management. Keep going!",
    "You're proving to be quite reliable. I like that!",
    "Great job! Your productivity is admirable.",
];

const SAVAGE_HIGH: &[&str] = &[
    "OK fine, I'll admit it - you're not completely useless.",
    "Surprisingly, you're actually getting stuff done. Who knew?",
    "Not bad for someone who I had low expectations for.",
    "I'm shocked you're keeping up with this. Almost impressed.",
    "Well, well, well... look who can be productive when they try.",
    "I guess miracles do happen - you're actually completing tasks.",
    "I'd insult you, but you're doing too well right now.",
    "Are you feeling OK? You're being suspiciously productive.",
    "Who are you and what have you done with the usual slacker?",
    "I'd say I'm impressed, but that might go to your head.",
];

const SUPPORTIVE_MEDIUM: &[&str] = &[
    "You're making progress! That's what counts!",
    "Keep going! Every completed task is a win!",
    "You're doing okay! Let's keep the momentum going!",
    "I believe you can do more! You've got this!",
    "There's potential here! Let's keep pushing forward!",
    "You're on the right track! Keep it up!",
    "Progress is progress! I'm here to support you!",
    "You're getting there! Stay positive!",
    "Every step counts! You're making improvements!",
    "I see your effort! Let's keep going!",
];

const BALANCED_MEDIUM: &[&str] = &[
    "You're doing okay. Keep it up, I guess.",
    "Not bad. You could do better, but not bad.",
    "Making some progress. That's... acceptable.",
    "You're getting things done. Neat.",
    "Pretty average performance. Let's see more.",
    "You're neither impressing nor disappointing me.",
    "This is fine. Could be better, could be worse.",
    "Middle of the road productivity. Meh.",
    "You're treading water. Try to swim forward.",
    "I've seen better, I've seen worse.",
];

const SAVAGE_MEDIUM: &[&str] = &[
    "Mediocrity is your comfort zone, isn't it?",
    "Just doing the bare minimum to get by, as usual.",
    "I'd say aim higher, but that might strain something.",
    "Average work from an average person. How fitting.",
    "Neither impressive nor terrible. Just... forgettable.",
    "Is 'barely adequate' your life motto?",
    "You're like room temperature water. Not hot, not cold, just... there.",
    "This level of effort wouldn't even get you a participation trophy.",
    "If 'meh' was a person, it would be you right now.",
    "Your performance is as exciting as watching paint dry.",
];

const SUPPORTIVE_LOW: &[&str] = &[
    "Let's turn things around! I know you can do it!",
    "Everyone has off days! Tomorrow is a new opportunity!",
    "I still believe in you! Let's get back on track!",
    "Don't be discouraged! Small steps lead to big results!",
    "It's never too late to start fresh! You've got this!",
    "Looking forward to seeing you bounce back!",
    "Challenges help us grow! Let's overcome this together!",
    "I'm here for you even when things are tough!",
    "Your potential is still there! Let's unlock it!",
    "Tomorrow is another chance to shine!",
];

const BALANCED_LOW: &[&str] = &[
    "You're really falling behind. Time to step it up.",
    "Your task completion rate is concerning.",
    "You need to make a serious effort to improve.",
    "This level of productivity isn't going to cut it.",
    "I expected more from you. Let's see some improvement.",
    "You're better than this. Show me with your actions.",
    "Your current performance is disappointing.",
    "This isn't working. You need to make changes.",
    "You're capable of more than this. Prove it.",
    "Let's be honest - you're underperforming.",
];

const SAVAGE_LOW: &[&str] = &[
    "Do you even know what a task list is for?",
    "Wow, you're really terrible at this, aren't you?",
    "I've seen potatoes accomplish more than you.",
    "Are you even TRYING to complete anything?",
    "This is sad. Like, really sad. Do better.",
    "I'd ask if you're even trying, but the answer is obvious.",
    "Your productivity is a joke, but no one's laughing.",
    "If laziness was an Olympic sport, you'd finally win gold.",
    "I've seen more productivity from a sleeping sloth.",
    "Congratulations! You've set a new record for uselessness!",
];

/// Built-in pools indexed by `[tier][personality]`.
const BUILTIN: [[&[&str]; 3]; 3] = [
    [SUPPORTIVE_HIGH, BALANCED_HIGH, SAVAGE_HIGH],
    [SUPPORTIVE_MEDIUM, BALANCED_MEDIUM, SAVAGE_MEDIUM],
    [SUPPORTIVE_LOW, BALANCED_LOW, SAVAGE_LOW],
];

const fn all_pools_populated(pools: &[[&[&str]; 3]; 3]) -> bool {
    let mut t = 0;
    while t < 3 {
        let mut p = 0;
        while p < 3 {
            if pools[t][p].is_empty() {
                return false;
            }
            p += 1;
        }
        t += 1;
    }
    true
}

const _: () = assert!(all_pools_populated(&BUILTIN), "every message pool needs at least one entry");

/// On-disk shape of an override catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    high: TierPools,
    medium: TierPools,
    low: TierPools,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TierPools {
    supportive: Vec<String>,
    balanced: Vec<String>,
    savage: Vec<String>,
}

impl TierPools {
    fn into_array(self) -> [Vec<String>; 3] {
        [self.supportive, self.balanced, self.savage]
    }
}

/// Immutable set of nine non-empty message pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    pools: [[Vec<String>; 3]; 3],
}

impl MessageCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        let pools = BUILTIN.map(|row| {
            row.map(|pool| pool.iter().map(|s| s.to_string()).collect::<Vec<String>>())
        });
        Self { pools }
    }

    /// Parse and validate a TOML catalog with `[high]`, `[medium]` and
    /// `[low]` tables, each listing `supportive`, `balanced` and `savage`.
    ///
    /// # Errors
    /// Returns a parse error for malformed TOML or a missing table, and
    /// [`ValidationError::EmptyCollection`] for any empty pool.
    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let pools = [
            file.high.into_array(),
            file.medium.into_array(),
            file.low.into_array(),
        ];
        let catalog = Self { pools };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file from disk.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for tier in Tier::ALL {
            for personality in Personality::ALL {
                let pool = self.pool(tier, personality);
                if pool.is_empty() {
                    return Err(ValidationError::EmptyCollection(format!(
                        "message pool {tier}/{personality}"
                    )));
                }
                if pool.iter().any(|m| m.trim().is_empty()) {
                    return Err(ValidationError::invalid(
                        "messages",
                        format!("blank entry in pool {tier}/{personality}"),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn pool(&self, tier: Tier, personality: Personality) -> &[String] {
        &self.pools[tier_index(tier)][personality.index()]
    }

    pub fn contains(&self, tier: Tier, personality: Personality, message: &str) -> bool {
        self.pool(tier, personality).iter().any(|m| m == message)
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Pick a message for `level` and `personality` using the caller's RNG.
pub fn select_message<'a, R: Rng + ?Sized>(
    catalog: &'a MessageCatalog,
    level: RespectLevel,
    personality: Personality,
    rng: &mut R,
) -> &'a str {
    let pool = catalog.pool(classify_tier(level), personality);
    // Pools are validated non-empty when the catalog is built.
    &pool[rng.gen_range(0..pool.len())]
}

/// A catalog paired with its own random source.
pub struct MessageSelector<R = Mcg128Xsl64> {
    catalog: MessageCatalog,
    rng: R,
}

impl MessageSelector<Mcg128Xsl64> {
    /// Deterministic selector for a given seed.
    pub fn seeded(catalog: MessageCatalog, seed: u64) -> Self {
        Self::with_rng(catalog, Mcg128Xsl64::seed_from_u64(seed))
    }

    pub fn from_entropy(catalog: MessageCatalog) -> Self {
        Self::with_rng(catalog, Mcg128Xsl64::from_entropy())
    }

    /// Seeded when `seed` is set, otherwise seeded from entropy.
    pub fn from_seed_option(catalog: MessageCatalog, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(catalog, seed),
            None => Self::from_entropy(catalog),
        }
    }
}

impl<R: Rng> MessageSelector<R> {
    pub fn with_rng(catalog: MessageCatalog, rng: R) -> Self {
        Self { catalog, rng }
    }

    pub fn select(&mut self, level: RespectLevel, personality: Personality) -> &str {
        select_message(&self.catalog, level, personality, &mut self.rng)
    }

    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }
}
