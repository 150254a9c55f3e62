use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier of a category document (e.g., `bedding_sleep`).
///
/// Matches the file stem the document is published under, so consumers can
/// derive the fetch path from the id alone.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

/// Identifier of an item, unique within its category document.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        CategoryId(value.to_string())
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId(value.to_string())
    }
}

/// Retailer offering a link.
///
/// Known retailers keep serialization consistent; `Other` preserves whatever
/// the document carries so new retailers never break parsing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Retailer {
    Amazon,
    Walmart,
    Target,
    Other(String),
}

/// Promotional label shown next to a link.
///
/// The known set is the normalized vocabulary the converter produces;
/// `Other` carries labels authored by hand.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Badge {
    BestSeller,
    AmazonsChoice,
    BudgetPick,
    DormBundle,
    Premium,
    MultipleOptions,
    HeavyDuty,
    Adjustable,
    Popular,
    Comfort,
    TopRated,
    AllergyFriendly,
    ValuePack,
    InStore,
    LargeCapacity,
    Other(String),
}

impl Serialize for Retailer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Retailer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_label(&value))
    }
}

impl Retailer {
    pub fn as_str(&self) -> &str {
        match self {
            Retailer::Amazon => "amazon",
            Retailer::Walmart => "walmart",
            Retailer::Target => "target",
            Retailer::Other(value) => value.as_str(),
        }
    }

    pub fn from_label(value: &str) -> Self {
        match value {
            "amazon" => Retailer::Amazon,
            "walmart" => Retailer::Walmart,
            "target" => Retailer::Target,
            other => Retailer::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Retailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Badge {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Badge {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_label(&value))
    }
}

impl Badge {
    pub fn as_str(&self) -> &str {
        match self {
            Badge::BestSeller => "best_seller",
            Badge::AmazonsChoice => "amazons_choice",
            Badge::BudgetPick => "budget_pick",
            Badge::DormBundle => "dorm_bundle",
            Badge::Premium => "premium",
            Badge::MultipleOptions => "multiple_options",
            Badge::HeavyDuty => "heavy_duty",
            Badge::Adjustable => "adjustable",
            Badge::Popular => "popular",
            Badge::Comfort => "comfort",
            Badge::TopRated => "top_rated",
            Badge::AllergyFriendly => "allergy_friendly",
            Badge::ValuePack => "value_pack",
            Badge::InStore => "in_store",
            Badge::LargeCapacity => "large_capacity",
            Badge::Other(value) => value.as_str(),
        }
    }

    pub fn from_label(value: &str) -> Self {
        match value {
            "best_seller" => Badge::BestSeller,
            "amazons_choice" => Badge::AmazonsChoice,
            "budget_pick" => Badge::BudgetPick,
            "dorm_bundle" => Badge::DormBundle,
            "premium" => Badge::Premium,
            "multiple_options" => Badge::MultipleOptions,
            "heavy_duty" => Badge::HeavyDuty,
            "adjustable" => Badge::Adjustable,
            "popular" => Badge::Popular,
            "comfort" => Badge::Comfort,
            "top_rated" => Badge::TopRated,
            "allergy_friendly" => Badge::AllergyFriendly,
            "value_pack" => Badge::ValuePack,
            "in_store" => Badge::InStore,
            "large_capacity" => Badge::LargeCapacity,
            other => Badge::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
