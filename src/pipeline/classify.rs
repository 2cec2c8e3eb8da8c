use serde::Serialize;

/// Compact stellar remnants that act as gravity sources on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GravKind {
    #[serde(rename = "BH")]
    BlackHole,
    #[serde(rename = "NS")]
    NeutronStar,
    #[serde(rename = "WD")]
    WhiteDwarf,
    #[serde(rename = "OTHER")]
    Other,
}

impl GravKind {
    /// Classify a body sub-type such as `"White Dwarf (DA) Star"`
    pub fn classify(sub_type: &str) -> GravKind {
        let sub_type = sub_type.trim();
        if sub_type == "Black Hole" {
            GravKind::BlackHole
        } else if sub_type == "Neutron Star" {
            GravKind::NeutronStar
        } else if sub_type.starts_with("White Dwarf") {
            GravKind::WhiteDwarf
        } else {
            GravKind::Other
        }
    }

    pub fn is_interesting(self) -> bool {
        self != GravKind::Other
    }

    /// Rendering weight; visual only, not physical
    pub fn weight(self) -> f64 {
        match self {
            GravKind::BlackHole => 1.0,
            GravKind::NeutronStar => 0.85,
            GravKind::WhiteDwarf => 0.5,
            GravKind::Other => 0.35,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            GravKind::BlackHole => "BH",
            GravKind::NeutronStar => "NS",
            GravKind::WhiteDwarf => "WD",
            GravKind::Other => "OTHER",
        }
    }
}
