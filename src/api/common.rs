//! Common API utilities and shared types
//!
//! Pagination queries, list envelopes and the cover/image wrappers used by
//! list and detail endpoints.

use serde::{Deserialize, Serialize};

use crate::api::middleware::ApiError;
use crate::models::{
    Achievement, EntityType, Event, Gallery, GovernmentOfficial, ListParams, Media, News,
    PagedResult, TourismHouse, TourismPackage, Umkm, UmkmProduct, VillagePotential,
};
use crate::services::MediaService;

// ============================================================================
// Pagination
// ============================================================================

pub fn default_page() -> u32 {
    1
}

pub fn default_per_page() -> u32 {
    20
}

/// Admin pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl PaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

/// Page envelope returned by every paged list
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> PageResponse<T> {
    /// Swap the items of `page`, keeping its counters
    pub fn with_items<U>(page: PagedResult<U>, items: Vec<T>) -> Self {
        Self {
            total_pages: page.total_pages(),
            has_next: page.has_next(),
            has_prev: page.has_prev(),
            items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
        }
    }
}

impl<T> From<PagedResult<T>> for PageResponse<T> {
    fn from(mut page: PagedResult<T>) -> Self {
        let items = std::mem::take(&mut page.items);
        Self::with_items(page, items)
    }
}

/// Treat blank query values as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ============================================================================
// Media wrappers
// ============================================================================

/// Records that own media rows
pub trait MediaOwner {
    const ENTITY_TYPE: EntityType;
    fn owner_id(&self) -> i64;
}

macro_rules! media_owner {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(impl MediaOwner for $ty {
            const ENTITY_TYPE: EntityType = EntityType::$kind;
            fn owner_id(&self) -> i64 {
                self.id
            }
        })*
    };
}

media_owner! {
    News => News,
    Event => Event,
    TourismPackage => TourismPackage,
    TourismHouse => TourismHouse,
    Umkm => Umkm,
    UmkmProduct => UmkmProduct,
    Gallery => Gallery,
    VillagePotential => Potential,
    Achievement => Achievement,
    GovernmentOfficial => Official,
}

/// List item with its first image
#[derive(Debug, Serialize)]
pub struct WithCover<T> {
    #[serde(flatten)]
    pub item: T,
    pub cover: Option<Media>,
}

/// Detail record with every image in display order
#[derive(Debug, Serialize)]
pub struct WithImages<T> {
    #[serde(flatten)]
    pub item: T,
    pub images: Vec<Media>,
}

/// Pair each item with its cover using one media query
pub async fn with_covers<T: MediaOwner>(
    media: &MediaService,
    items: Vec<T>,
) -> Result<Vec<WithCover<T>>, ApiError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = items.iter().map(MediaOwner::owner_id).collect();
    let mut covers = media.covers_for(T::ENTITY_TYPE, &ids).await?;
    Ok(items
        .into_iter()
        .map(|item| {
            let cover = covers.remove(&item.owner_id());
            WithCover { item, cover }
        })
        .collect())
}

/// Same as [`with_covers`] for a paged result
pub async fn paged_with_covers<T: MediaOwner>(
    media: &MediaService,
    mut page: PagedResult<T>,
) -> Result<PageResponse<WithCover<T>>, ApiError> {
    let items = with_covers(media, std::mem::take(&mut page.items)).await?;
    Ok(PageResponse::with_items(page, items))
}

pub async fn with_images<T: MediaOwner>(
    media: &MediaService,
    item: T,
) -> Result<WithImages<T>, ApiError> {
    let images = media.list_for_entity(T::ENTITY_TYPE, item.owner_id()).await?;
    Ok(WithImages { item, images })
}
