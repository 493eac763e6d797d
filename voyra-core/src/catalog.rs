use crate::provider::{
    BoardTypeDto, CurrencyDto, FacilityDto, HotelDetailDto, LocationDto, RoomAttributeDto,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Field-ownership-tagged merge for catalog entities.
///
/// Every field of an entity is either upstream-owned (name, description,
/// images, facility links and other provider content) or local-owned
/// (internal id, resolved foreign keys, manual flags). Sync always overwrites
/// the former and never touches the latter; `apply_upstream` is the only
/// place upstream data enters a stored row.
pub trait UpstreamOwned {
    type Source;

    /// Build a fresh row from provider data, assigning a new local id.
    fn from_upstream(source: &Self::Source) -> Self;

    /// Overwrite the upstream-owned fields from `source`. Returns whether
    /// anything actually changed, so sync can report unchanged rows.
    fn apply_upstream(&mut self, source: &Self::Source) -> bool;
}

macro_rules! overwrite_if_changed {
    ($changed:ident, $field:expr, $value:expr) => {
        if $field != $value {
            $field = $value;
            $changed = true;
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

impl UpstreamOwned for Currency {
    type Source = CurrencyDto;

    fn from_upstream(source: &CurrencyDto) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: source.code.clone(),
            name: source.name.clone(),
            updated_at: Utc::now(),
        }
    }

    fn apply_upstream(&mut self, source: &CurrencyDto) -> bool {
        let mut changed = false;
        overwrite_if_changed!(changed, self.name, source.name.clone());
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardType {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

impl UpstreamOwned for BoardType {
    type Source = BoardTypeDto;

    fn from_upstream(source: &BoardTypeDto) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: source.code.clone(),
            name: source.name.clone(),
            updated_at: Utc::now(),
        }
    }

    fn apply_upstream(&mut self, source: &BoardTypeDto) -> bool {
        let mut changed = false;
        overwrite_if_changed!(changed, self.name, source.name.clone());
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UpstreamOwned for Facility {
    type Source = FacilityDto;

    fn from_upstream(source: &FacilityDto) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: source.code.clone(),
            name: source.name.clone(),
            description: source.description.clone(),
            updated_at: Utc::now(),
        }
    }

    fn apply_upstream(&mut self, source: &FacilityDto) -> bool {
        let mut changed = false;
        overwrite_if_changed!(changed, self.name, source.name.clone());
        overwrite_if_changed!(changed, self.description, source.description.clone());
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomAttribute {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

impl UpstreamOwned for RoomAttribute {
    type Source = RoomAttributeDto;

    fn from_upstream(source: &RoomAttributeDto) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: source.code.clone(),
            name: source.name.clone(),
            updated_at: Utc::now(),
        }
    }

    fn apply_upstream(&mut self, source: &RoomAttributeDto) -> bool {
        let mut changed = false;
        overwrite_if_changed!(changed, self.name, source.name.clone());
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub country_code: String,
    pub parent_code: Option<String>,
    /// Resolved link to the parent location row. Local-owned.
    pub parent_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl UpstreamOwned for Location {
    type Source = LocationDto;

    fn from_upstream(source: &LocationDto) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: source.code.clone(),
            name: source.name.clone(),
            country_code: source.country_code.clone(),
            parent_code: source.parent_code.clone(),
            parent_id: None,
            updated_at: Utc::now(),
        }
    }

    fn apply_upstream(&mut self, source: &LocationDto) -> bool {
        let mut changed = false;
        overwrite_if_changed!(changed, self.name, source.name.clone());
        overwrite_if_changed!(changed, self.country_code, source.country_code.clone());
        overwrite_if_changed!(changed, self.parent_code, source.parent_code.clone());
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<i32>,
    pub images: Vec<String>,
    pub facility_codes: Vec<String>,
    pub location_code: String,
    /// Resolved link to the location row. Local-owned.
    pub location_id: Option<Uuid>,
    /// Resolved links to facility rows. Local-owned.
    pub facility_ids: Vec<Uuid>,
    /// Set by an operator to pin manual content edits. Local-owned.
    pub is_manually_curated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UpstreamOwned for Hotel {
    type Source = HotelDetailDto;

    fn from_upstream(source: &HotelDetailDto) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code: source.code.clone(),
            name: source.name.clone(),
            description: source.description.clone(),
            category: source.category,
            images: source.images.clone(),
            facility_codes: source.facility_codes.clone(),
            location_code: source.location_code.clone(),
            location_id: None,
            facility_ids: Vec::new(),
            is_manually_curated: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_upstream(&mut self, source: &HotelDetailDto) -> bool {
        let mut changed = false;
        overwrite_if_changed!(changed, self.name, source.name.clone());
        overwrite_if_changed!(changed, self.description, source.description.clone());
        overwrite_if_changed!(changed, self.category, source.category);
        overwrite_if_changed!(changed, self.images, source.images.clone());
        overwrite_if_changed!(changed, self.facility_codes, source.facility_codes.clone());
        overwrite_if_changed!(changed, self.location_code, source.location_code.clone());
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}
