//! Static resource catalogue: what each salvage kind is worth and how rare it is.
//!
//! | Kind          | Rarity   | Base value |
//! |---------------|----------|-----------:|
//! | minerals      | common   | 10 |
//! | elements      | uncommon | 25 |
//! | crystals      | rare     | 50 |
//! | shield_parts  | uncommon | 30 |
//! | weapon_parts  | rare     | 45 |
//!
//! The visual tag and glow values are pass-through data for the rendering
//! host; nothing in the simulation reads them.

use serde::Deserialize;

/// Rarity tier a resource kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
}

impl Rarity {
    /// Every tier, in weight-table order.
    pub const ALL: [Rarity; 3] = [Rarity::Common, Rarity::Uncommon, Rarity::Rare];

    /// All resource kinds belonging to this tier, in catalogue order.
    pub fn kinds(self) -> impl Iterator<Item = ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(move |kind| kind.spec().rarity == self)
    }
}

/// A collectable resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Minerals,
    Elements,
    Crystals,
    ShieldParts,
    WeaponParts,
}

/// Catalogue row for one [`ResourceKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub rarity: Rarity,
    /// Value carried by a single pickup of this kind.
    pub base_value: u32,
    /// Texture / sprite key for the rendering host.
    pub visual_tag: &'static str,
    /// `0xRRGGBB` glow tint.
    pub glow_color: u32,
    pub glow_alpha: f32,
}

const CATALOG: [ResourceSpec; 5] = [
    ResourceSpec {
        kind: ResourceKind::Minerals,
        rarity: Rarity::Common,
        base_value: 10,
        visual_tag: "minerals",
        glow_color: 0x66ff66,
        glow_alpha: 0.4,
    },
    ResourceSpec {
        kind: ResourceKind::Elements,
        rarity: Rarity::Uncommon,
        base_value: 25,
        visual_tag: "elements",
        glow_color: 0x66ffff,
        glow_alpha: 0.6,
    },
    ResourceSpec {
        kind: ResourceKind::Crystals,
        rarity: Rarity::Rare,
        base_value: 50,
        visual_tag: "crystals",
        glow_color: 0xff66ff,
        glow_alpha: 0.8,
    },
    ResourceSpec {
        kind: ResourceKind::ShieldParts,
        rarity: Rarity::Uncommon,
        base_value: 30,
        visual_tag: "shield_parts",
        glow_color: 0x6666ff,
        glow_alpha: 0.6,
    },
    ResourceSpec {
        kind: ResourceKind::WeaponParts,
        rarity: Rarity::Rare,
        base_value: 45,
        visual_tag: "weapon_parts",
        glow_color: 0xff6666,
        glow_alpha: 0.8,
    },
];

impl ResourceKind {
    /// Every kind, in catalogue order.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Minerals,
        ResourceKind::Elements,
        ResourceKind::Crystals,
        ResourceKind::ShieldParts,
        ResourceKind::WeaponParts,
    ];

    #[inline]
    pub fn spec(self) -> &'static ResourceSpec {
        match self {
            ResourceKind::Minerals => &CATALOG[0],
            ResourceKind::Elements => &CATALOG[1],
            ResourceKind::Crystals => &CATALOG[2],
            ResourceKind::ShieldParts => &CATALOG[3],
            ResourceKind::WeaponParts => &CATALOG[4],
        }
    }

    #[inline]
    pub fn base_value(self) -> u32 {
        self.spec().base_value
    }
}
