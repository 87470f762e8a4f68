// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial structure node types
//!
//! Recognised from the declared entity type; anything else is a plain element.

use serde::{Deserialize, Serialize};

/// Type of spatial structure node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpatialNodeType {
    /// IfcProject - root of the hierarchy
    Project,
    /// IfcSite - geographic site
    Site,
    /// IfcBuilding - a building structure
    Building,
    /// IfcBuildingStorey - a floor/level
    Storey,
    /// IfcSpace - a room or area
    Space,
    /// Building element (wall, door, etc.)
    Element,
    /// IFC4x3 Facility (road, bridge, etc.)
    Facility,
    /// IFC4x3 Facility part
    FacilityPart,
}

impl SpatialNodeType {
    /// Label used for structure groups that carry no name
    pub fn display_name(&self) -> &'static str {
        match self {
            SpatialNodeType::Project => "Project",
            SpatialNodeType::Site => "Site",
            SpatialNodeType::Building => "Building",
            SpatialNodeType::Storey => "Storey",
            SpatialNodeType::Space => "Space",
            SpatialNodeType::Element => "Element",
            SpatialNodeType::Facility => "Facility",
            SpatialNodeType::FacilityPart => "Facility Part",
        }
    }

    /// Determine node type from an entity type name (case-insensitive)
    pub fn from_entity_type(entity_type: &str) -> Self {
        match entity_type.to_ascii_uppercase().as_str() {
            "IFCPROJECT" => SpatialNodeType::Project,
            "IFCSITE" => SpatialNodeType::Site,
            "IFCBUILDING" => SpatialNodeType::Building,
            "IFCBUILDINGSTOREY" => SpatialNodeType::Storey,
            "IFCSPACE" => SpatialNodeType::Space,
            "IFCFACILITY" | "IFCROAD" | "IFCBRIDGE" | "IFCRAILWAY" => SpatialNodeType::Facility,
            "IFCFACILITYPART" | "IFCROADPART" | "IFCBRIDGEPART" | "IFCRAILWAYPART" => {
                SpatialNodeType::FacilityPart
            }
            _ => SpatialNodeType::Element,
        }
    }

    /// Whether this node is part of the spatial structure (not a plain element)
    pub fn is_structure(&self) -> bool {
        *self != SpatialNodeType::Element
    }
}
