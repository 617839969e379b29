//! Canonical generation resource vocabulary
//!
//! All three providers name technologies differently. Tables produced by this
//! crate always use the ENTSO-E style names below, e.g. `"Fossil Gas"` or
//! `"Hydro Pumped Storage"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Generation resource type (canonical vocabulary)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ResourceType {
    Biomass,
    FossilBrownCoalLignite,
    FossilGas,
    FossilHardCoal,
    FossilOil,
    Geothermal,
    HydroPumpedStorage,
    HydroRunOfRiver,
    HydroWaterReservoir,
    Hydro,
    Nuclear,
    Other,
    OtherRenewable,
    Solar,
    Waste,
    WindOffshore,
    WindOnshore,
    BatteryStorage,
    /// Known provider category without a generation counterpart (SMARD "Wärme")
    Unknown,
    /// Provider term missing from the translation table, kept verbatim
    Unmapped(String),
}

/// Canonical names of the known resource types
static CANONICAL_NAMES: [(ResourceType, &str); 19] = [
    (ResourceType::Biomass, "Biomass"),
    (ResourceType::FossilBrownCoalLignite, "Fossil Brown coal/Lignite"),
    (ResourceType::FossilGas, "Fossil Gas"),
    (ResourceType::FossilHardCoal, "Fossil Hard coal"),
    (ResourceType::FossilOil, "Fossil Oil"),
    (ResourceType::Geothermal, "Geothermal"),
    (ResourceType::HydroPumpedStorage, "Hydro Pumped Storage"),
    (ResourceType::HydroRunOfRiver, "Hydro Run-of-river and poundage"),
    (ResourceType::HydroWaterReservoir, "Hydro Water Reservoir"),
    (ResourceType::Hydro, "Hydro"),
    (ResourceType::Nuclear, "Nuclear"),
    (ResourceType::Other, "Other"),
    (ResourceType::OtherRenewable, "Other renewable"),
    (ResourceType::Solar, "Solar"),
    (ResourceType::Waste, "Waste"),
    (ResourceType::WindOffshore, "Wind Offshore"),
    (ResourceType::WindOnshore, "Wind Onshore"),
    (ResourceType::BatteryStorage, "Battery Storage"),
    (ResourceType::Unknown, "unknown"),
];

/// SMARD power plant metadata vocabulary (`plant.resource`)
static SMARD_RESOURCE_MAPPINGS: [(&str, ResourceType); 17] = [
    ("KW-Energieträger.Wind (Onshore)", ResourceType::WindOnshore),
    ("KW-Energieträger.Steinkohle", ResourceType::FossilHardCoal),
    ("KW-Energieträger.Erdgas", ResourceType::FossilGas),
    ("KW-Energieträger.Pumpspeicher", ResourceType::HydroPumpedStorage),
    (
        "KW-Energieträger.Sonstige konventionelle Energieträger",
        ResourceType::Other,
    ),
    ("KW-Energieträger.Photovoltaik", ResourceType::Solar),
    ("KW-Energieträger.Wind (Offshore)", ResourceType::WindOffshore),
    ("KW-Energieträger.Laufwasser", ResourceType::HydroRunOfRiver),
    ("KW-Energieträger.Mineralölprodukte", ResourceType::FossilOil),
    ("KW-Energieträger.Abfall", ResourceType::Waste),
    ("KW-Energieträger.Kernenergie", ResourceType::Nuclear),
    ("KW-Energieträger.Braunkohle", ResourceType::FossilBrownCoalLignite),
    (
        "KW-Energieträger.Speicherwasser (ohne Pumpspeicher)",
        ResourceType::HydroWaterReservoir,
    ),
    ("KW-Energieträger.Batteriespeicher", ResourceType::BatteryStorage),
    ("KW-Energieträger.Biomasse", ResourceType::Biomass),
    ("KW-Energieträger.Wärme", ResourceType::Unknown),
    ("KW-Energieträger.Wasserkraft", ResourceType::Hydro),
];

impl ResourceType {
    /// Canonical display name
    pub fn name(&self) -> &str {
        if let ResourceType::Unmapped(raw) = self {
            return raw;
        }
        CANONICAL_NAMES
            .iter()
            .find(|(rt, _)| rt == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }

    /// Translate a SMARD power plant resource term
    ///
    /// Terms missing from the translation table are kept as
    /// [`ResourceType::Unmapped`] and logged, so new provider categories show
    /// up in the output instead of disappearing.
    ///
    /// # Examples
    ///
    /// ```
    /// # use grid_market_data::ResourceType;
    /// assert_eq!(
    ///     ResourceType::from_smard("KW-Energieträger.Braunkohle"),
    ///     ResourceType::FossilBrownCoalLignite
    /// );
    /// assert_eq!(
    ///     ResourceType::from_smard("KW-Energieträger.Wasserstoff"),
    ///     ResourceType::Unmapped("KW-Energieträger.Wasserstoff".to_string())
    /// );
    /// ```
    pub fn from_smard(term: &str) -> Self {
        match SMARD_RESOURCE_MAPPINGS.iter().find(|(t, _)| *t == term) {
            Some((_, rt)) => rt.clone(),
            None => {
                warn!("Unmapped SMARD resource type: '{}'", term);
                ResourceType::Unmapped(term.to_string())
            }
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceType {
    type Err = std::convert::Infallible;

    /// Parse a canonical name; anything else becomes [`ResourceType::Unmapped`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CANONICAL_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(rt, _)| rt.clone())
            .unwrap_or_else(|| ResourceType::Unmapped(s.to_string())))
    }
}

impl From<String> for ResourceType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(rt) => rt,
            Err(never) => match never {},
        }
    }
}

impl From<ResourceType> for String {
    fn from(rt: ResourceType) -> Self {
        rt.name().to_string()
    }
}
