//! # Banner Service
//!
//! Banners and promotions: position-scoped storefront listings, admin CRUD,
//! and pairwise reordering.
//!
//! ## Reordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  display_order: A=1  B=2  C=3          (position group "hero")          │
//! │                                                                         │
//! │  move_banner(B, Up)   → swap A and B's order values → B=1  A=2  C=3    │
//! │  move_banner(C, Up)   → swap A and C's order values → B=1  C=2  A=3    │
//! │                                                                         │
//! │  Each move is exactly two single-row updates; moving past the edge of  │
//! │  the group is a no-op.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use oprema_core::validation::{validate_discount_percent, validate_localized};
use oprema_core::{Banner, BannerPosition, Localized, ValidationError};
use oprema_store::{new_row_id, BannerCommand, BannerPatch, BannerRow, Command, QueryRouter};

use crate::error::{ErrorCode, ServiceError, ServiceResult};
use crate::mapping::{banner_from_row, double_option, parse_first, parse_rows};

// =============================================================================
// Inputs
// =============================================================================

/// Admin form payload for creating a banner (or, with `discount_percent`,
/// a promotion).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBanner {
    pub title: Localized,
    #[serde(default)]
    pub description: Localized,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub position: BannerPosition,
    /// Omitted: appended at the end of the position group.
    #[serde(default)]
    pub display_order: Option<i64>,
    #[serde(default)]
    pub discount_percent: Option<i64>,
}

fn default_active() -> bool {
    true
}

/// Partial banner update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BannerUpdate {
    pub title: Option<Localized>,
    pub description: Option<Localized>,
    #[serde(deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub target_url: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub position: Option<BannerPosition>,
    pub display_order: Option<i64>,
    #[serde(deserialize_with = "double_option")]
    pub discount_percent: Option<Option<i64>>,
}

/// Direction for pairwise reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

fn patch_from_update(update: BannerUpdate) -> BannerPatch {
    let mut patch = BannerPatch::default();
    if let Some(title) = update.title {
        patch.title_sr = Some(title.sr);
        patch.title_en = Some(title.en);
    }
    if let Some(description) = update.description {
        patch.description_sr = Some(description.sr);
        patch.description_en = Some(description.en);
    }
    patch.image_url = update.image_url;
    patch.target_url = update.target_url;
    patch.is_active = update.is_active;
    patch.position = update.position;
    patch.display_order = update.display_order;
    patch.discount_percent = update.discount_percent;
    patch
}

// =============================================================================
// Service
// =============================================================================

/// Banner and promotion use cases over the query router.
#[derive(Debug, Clone)]
pub struct BannerService {
    router: QueryRouter,
}

impl BannerService {
    pub fn new(router: QueryRouter) -> Self {
        BannerService { router }
    }

    // -------------------------------------------------------------------------
    // Reads (degrade silently)
    // -------------------------------------------------------------------------

    /// Storefront listing: active banners in a position slot, in display
    /// order.
    pub async fn get_banners(&self, position: Option<BannerPosition>) -> Vec<Banner> {
        self.fetch(position, true).await
    }

    /// Admin listing: everything, including inactive banners.
    pub async fn list_all(&self) -> Vec<Banner> {
        self.fetch(None, false).await
    }

    /// Storefront promotion strip: active promo-slot banners that carry a
    /// discount.
    pub async fn get_promotions(&self) -> Vec<Banner> {
        self.fetch(Some(BannerPosition::Promo), true)
            .await
            .into_iter()
            .filter(Banner::is_promotion)
            .collect()
    }

    async fn fetch(&self, position: Option<BannerPosition>, only_active: bool) -> Vec<Banner> {
        let result: ServiceResult<Vec<Banner>> = async {
            let rows = self
                .router
                .execute(Command::Banner(BannerCommand::List {
                    position,
                    only_active,
                }))
                .await?;
            Ok(parse_rows::<BannerRow>(rows)?
                .into_iter()
                .map(banner_from_row)
                .collect())
        }
        .await;

        match result {
            Ok(banners) => banners,
            Err(err) => {
                warn!(error = %err, "banner listing failed, returning empty list");
                Vec::new()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Writes (surface errors)
    // -------------------------------------------------------------------------

    pub async fn create_banner(&self, input: NewBanner) -> ServiceResult<Banner> {
        validate_localized("title", &input.title)?;
        if let Some(percent) = input.discount_percent {
            validate_discount_percent(percent)?;
        }

        let display_order = match input.display_order {
            Some(order) => order,
            // Append at the end of the position group.
            None => {
                let group = self.fetch(Some(input.position), false).await;
                group.iter().map(|b| b.display_order).max().unwrap_or(0) + 1
            }
        };

        let now = Utc::now();
        let row = BannerRow {
            id: new_row_id(),
            title_sr: input.title.sr,
            title_en: input.title.en,
            description_sr: input.description.sr,
            description_en: input.description.en,
            image_url: input.image_url,
            target_url: input.target_url,
            is_active: input.is_active,
            position: input.position,
            display_order,
            discount_percent: input.discount_percent,
            created_at: now,
            updated_at: now,
        };
        info!(id = %row.id, position = %row.position, "creating banner");

        let rows = self
            .router
            .execute(Command::Banner(BannerCommand::Insert(Box::new(row))))
            .await?;
        let row = parse_first::<BannerRow>(rows)?
            .ok_or_else(|| ServiceError::new(ErrorCode::Internal, "insert returned no row"))?;
        Ok(banner_from_row(row))
    }

    /// Creating a promotion is creating a banner that must carry a
    /// discount.
    pub async fn create_promotion(&self, input: NewBanner) -> ServiceResult<Banner> {
        if input.discount_percent.is_none() {
            return Err(ValidationError::Required {
                field: "discountPercent".to_string(),
            }
            .into());
        }
        self.create_banner(input).await
    }

    pub async fn update_banner(&self, id: &str, update: BannerUpdate) -> ServiceResult<Banner> {
        if let Some(title) = &update.title {
            validate_localized("title", title)?;
        }
        if let Some(Some(percent)) = update.discount_percent {
            validate_discount_percent(percent)?;
        }

        let rows = self
            .router
            .execute(Command::Banner(BannerCommand::Update {
                id: id.to_string(),
                patch: patch_from_update(update),
            }))
            .await?;
        let row =
            parse_first::<BannerRow>(rows)?.ok_or_else(|| ServiceError::not_found("Banner", id))?;
        Ok(banner_from_row(row))
    }

    pub async fn delete_banner(&self, id: &str) -> ServiceResult<()> {
        let rows = self
            .router
            .execute(Command::Banner(BannerCommand::Delete { id: id.to_string() }))
            .await?;
        info!(id = %id, removed = rows.len(), "delete_banner");
        Ok(())
    }

    /// Pairwise reorder: swaps `display_order` with the neighbor in the
    /// banner's position group. Moving past the edge is a no-op.
    pub async fn move_banner(&self, id: &str, direction: MoveDirection) -> ServiceResult<()> {
        let all = self.list_all().await;
        let Some(banner) = all.iter().find(|b| b.id == id) else {
            return Err(ServiceError::not_found("Banner", id));
        };

        // The group arrives already sorted by display_order.
        let group: Vec<&Banner> = all.iter().filter(|b| b.position == banner.position).collect();
        let Some(index) = group.iter().position(|b| b.id == id) else {
            return Err(ServiceError::not_found("Banner", id));
        };

        let neighbor_index = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < group.len() => index + 1,
            _ => {
                debug!(id = %id, ?direction, "move at group edge, nothing to do");
                return Ok(());
            }
        };
        let neighbor = group[neighbor_index];

        self.set_display_order(&banner.id, neighbor.display_order).await?;
        self.set_display_order(&neighbor.id, banner.display_order).await?;
        info!(id = %id, with = %neighbor.id, "banner order swapped");
        Ok(())
    }

    async fn set_display_order(&self, id: &str, display_order: i64) -> ServiceResult<()> {
        let patch = BannerPatch {
            display_order: Some(display_order),
            ..Default::default()
        };
        self.router
            .execute(Command::Banner(BannerCommand::Update {
                id: id.to_string(),
                patch,
            }))
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oprema_store::{DbConfig, DirectBackend, StorageHandle};

    async fn direct_service() -> BannerService {
        let backend = DirectBackend::connect(DbConfig::in_memory()).await.unwrap();
        BannerService::new(QueryRouter::with_backend(StorageHandle::Direct(backend)))
    }

    fn hero_banner(title: &str, order: i64) -> NewBanner {
        NewBanner {
            title: Localized::new(title, title),
            description: Localized::default(),
            image_url: None,
            target_url: None,
            is_active: true,
            position: BannerPosition::Hero,
            display_order: Some(order),
            discount_percent: None,
        }
    }

    async fn hero_titles(service: &BannerService) -> Vec<String> {
        service
            .get_banners(Some(BannerPosition::Hero))
            .await
            .into_iter()
            .map(|b| b.title.sr)
            .collect()
    }

    #[tokio::test]
    async fn test_pairwise_moves_compose() {
        let service = direct_service().await;
        service.create_banner(hero_banner("A", 1)).await.unwrap();
        let b = service.create_banner(hero_banner("B", 2)).await.unwrap();
        let c = service.create_banner(hero_banner("C", 3)).await.unwrap();

        assert_eq!(hero_titles(&service).await, vec!["A", "B", "C"]);

        service.move_banner(&b.id, MoveDirection::Up).await.unwrap();
        assert_eq!(hero_titles(&service).await, vec!["B", "A", "C"]);

        service.move_banner(&c.id, MoveDirection::Up).await.unwrap();
        assert_eq!(hero_titles(&service).await, vec!["B", "C", "A"]);
    }

    #[tokio::test]
    async fn test_move_at_edge_is_noop() {
        let service = direct_service().await;
        let a = service.create_banner(hero_banner("A", 1)).await.unwrap();
        service.create_banner(hero_banner("B", 2)).await.unwrap();

        service.move_banner(&a.id, MoveDirection::Up).await.unwrap();
        assert_eq!(hero_titles(&service).await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_moves_stay_inside_position_group() {
        let service = direct_service().await;
        service.create_banner(hero_banner("A", 1)).await.unwrap();
        let mut promo = hero_banner("P", 1);
        promo.position = BannerPosition::Promo;
        promo.discount_percent = Some(20);
        let promo = service.create_promotion(promo).await.unwrap();

        // The only promo banner cannot move anywhere.
        service
            .move_banner(&promo.id, MoveDirection::Up)
            .await
            .unwrap();
        service
            .move_banner(&promo.id, MoveDirection::Down)
            .await
            .unwrap();
        assert_eq!(hero_titles(&service).await, vec!["A"]);
    }

    #[tokio::test]
    async fn test_promotions_require_discount() {
        let service = direct_service().await;
        let err = service
            .create_promotion(hero_banner("No discount", 1))
            .await
            .unwrap_err();
        assert!(matches!(err.code, ErrorCode::ValidationError));

        let mut promo = hero_banner("Akcija", 1);
        promo.position = BannerPosition::Promo;
        promo.discount_percent = Some(15);
        service.create_promotion(promo).await.unwrap();

        let promotions = service.get_promotions().await;
        assert_eq!(promotions.len(), 1);
        assert_eq!(promotions[0].discount_percent, Some(15));
    }

    #[tokio::test]
    async fn test_new_banner_appends_to_group_end() {
        let service = direct_service().await;
        service.create_banner(hero_banner("A", 5)).await.unwrap();

        let mut appended = hero_banner("B", 0);
        appended.display_order = None;
        let banner = service.create_banner(appended).await.unwrap();
        assert_eq!(banner.display_order, 6);
    }

    #[tokio::test]
    async fn test_inactive_banners_hidden_from_storefront() {
        let service = direct_service().await;
        let mut hidden = hero_banner("Skriveni", 1);
        hidden.is_active = false;
        service.create_banner(hidden).await.unwrap();

        assert!(service.get_banners(Some(BannerPosition::Hero)).await.is_empty());
        assert_eq!(service.list_all().await.len(), 1);
    }
}
