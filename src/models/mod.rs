//! Data models
//!
//! This module contains all data structures used throughout the Banyuanyar CMS.
//! Models represent:
//! - Database entities (User, Session, News, Event, Tourism*, Umkm, Gallery, Media, ...)
//! - Input types accepted by the services
//! - Pagination types shared by the list endpoints

mod event;
mod gallery;
mod media;
mod news;
mod official;
mod pagination;
mod potential;
mod profile;
mod session;
mod tourism;
mod umkm;
mod user;

pub use event::{Event, EventInput, EventPhase};
pub use gallery::{Gallery, GalleryDetail, GalleryInput};
pub use media::{EntityType, Media, NewMedia};
pub use news::{News, NewsCategory, NewsCategoryInput, NewsFilter, NewsInput, NewsStatus};
pub use official::{GovernmentOfficial, OfficialInput};
pub use pagination::{ListParams, PagedResult};
pub use potential::{Achievement, AchievementInput, PotentialInput, VillagePotential};
pub use profile::{ProfileEntry, VillageProfile};
pub use session::Session;
pub use tourism::{
    PackageFilter, TourismCategory, TourismCategoryInput, TourismHouse, TourismHouseInput,
    TourismPackage, TourismPackageInput,
};
pub use umkm::{Umkm, UmkmDetail, UmkmInput, UmkmProduct, UmkmProductInput};
pub use user::{CreateUserInput, UpdateUserInput, User, UserRole};

/// A stored enum column held a value the model does not know.
#[derive(Debug, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct InvalidValue {
    pub kind: &'static str,
    pub value: String,
}

impl InvalidValue {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Check that an optional coordinate pair is within WGS84 bounds.
///
/// Either both values are present or neither is.
pub fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), String> {
    match (latitude, longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(format!("Latitude must be between -90 and 90, got {}", lat));
            }
            if !(-180.0..=180.0).contains(&lng) {
                return Err(format!("Longitude must be between -180 and 180, got {}", lng));
            }
            Ok(())
        }
        _ => Err("Latitude and longitude must be provided together".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(None, None).is_ok());
        assert!(validate_coordinates(Some(-7.55), Some(110.82)).is_ok());
        assert!(validate_coordinates(Some(90.0), Some(-180.0)).is_ok());
        assert!(validate_coordinates(Some(91.0), Some(110.0)).is_err());
        assert!(validate_coordinates(Some(-7.5), Some(181.0)).is_err());
        assert!(validate_coordinates(Some(-7.5), None).is_err());
    }

    #[test]
    fn test_invalid_value_message() {
        let err = InvalidValue::new("user role", "superuser");
        assert_eq!(err.to_string(), "invalid user role: superuser");
    }
}
