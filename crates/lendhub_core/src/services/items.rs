//! crates/lendhub_core/src/services/items.rs
//!
//! The item catalog: owner-scoped CRUD, free-text search, and comment
//! creation gated on a finished booking. Read responses are decorated with
//! transient last/next booking annotations that are never persisted.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::domain::{
    Comment, ItemPatch, ItemView, NewComment, NewItem, Page, ShortBooking,
};
use crate::ports::{PortError, PortResult, Storage};
use crate::services::{require_item, require_request, require_user};

#[derive(Clone)]
pub struct ItemService {
    storage: Arc<dyn Storage>,
}

impl ItemService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(&self, owner_id: i64, new: NewItem) -> PortResult<ItemView> {
        require_user(self.storage.as_ref(), owner_id).await?;
        if let Some(request_id) = new.request_id {
            require_request(self.storage.as_ref(), request_id).await?;
        }
        let item = self.storage.create_item(owner_id, &new).await?;
        debug!(item_id = item.id, owner_id, "item created");
        Ok(ItemView::bare(item))
    }

    /// Partial update: only fields present in the patch are applied, and
    /// only by the owner.
    pub async fn update(
        &self,
        item_id: i64,
        actor_id: i64,
        patch: ItemPatch,
    ) -> PortResult<ItemView> {
        let mut item = require_item(self.storage.as_ref(), item_id).await?;
        if item.owner_id != actor_id {
            return Err(PortError::not_found("item", item_id));
        }

        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(available) = patch.available {
            item.available = available;
        }

        let item = self.storage.save_item(&item).await?;
        Ok(ItemView::bare(item))
    }

    /// Comments are attached for everyone; the booking annotations only for
    /// the owner. A booker never sees booking data on the item itself.
    pub async fn get_by_id(&self, item_id: i64, viewer_id: i64) -> PortResult<ItemView> {
        let item = require_item(self.storage.as_ref(), item_id).await?;
        let comments = self.storage.list_comments_for_item(item_id).await?;

        let mut view = ItemView {
            item,
            last_booking: None,
            next_booking: None,
            comments,
        };
        if view.item.owner_id == viewer_id {
            self.annotate(&mut view).await?;
        }
        Ok(view)
    }

    /// The owner's items, id ascending, each with annotations and comments.
    pub async fn get_by_owner(&self, owner_id: i64, page: Page) -> PortResult<Vec<ItemView>> {
        require_user(self.storage.as_ref(), owner_id).await?;
        let items = self.storage.list_items_by_owner(owner_id, page).await?;

        let mut views = Vec::with_capacity(items.len());
        for item in items {
            let comments = self.storage.list_comments_for_item(item.id).await?;
            let mut view = ItemView {
                item,
                last_booking: None,
                next_booking: None,
                comments,
            };
            self.annotate(&mut view).await?;
            views.push(view);
        }
        Ok(views)
    }

    /// Blank input returns an empty list without touching storage.
    pub async fn search(&self, text: &str, page: Page) -> PortResult<Vec<ItemView>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let items = self.storage.search_items(text, page).await?;
        Ok(items.into_iter().map(ItemView::bare).collect())
    }

    /// A user may comment only after at least one of their bookings for the
    /// item has ended.
    pub async fn add_comment(
        &self,
        item_id: i64,
        author_id: i64,
        new: NewComment,
    ) -> PortResult<Comment> {
        let author = require_user(self.storage.as_ref(), author_id).await?;
        let item = require_item(self.storage.as_ref(), item_id).await?;

        let now = Utc::now();
        let finished = self
            .storage
            .count_finished_bookings(item.id, author.id, now)
            .await?;
        if finished == 0 {
            return Err(PortError::Validation(format!(
                "user {} has no finished booking for item {}",
                author.id, item.id
            )));
        }

        self.storage
            .create_comment(item.id, author.id, &author.name, &new.text, now)
            .await
    }

    /// Deletion is restricted to the owner and returns the deleted record.
    pub async fn delete(&self, item_id: i64, actor_id: i64) -> PortResult<ItemView> {
        let item = require_item(self.storage.as_ref(), item_id).await?;
        if item.owner_id != actor_id {
            return Err(PortError::not_found("item", item_id));
        }
        self.storage.delete_item(item_id).await?;
        debug!(item_id, "item deleted");
        Ok(ItemView::bare(item))
    }

    async fn annotate(&self, view: &mut ItemView) -> PortResult<()> {
        let now = Utc::now();
        view.last_booking = self
            .storage
            .last_booking_for_item(view.item.id, now)
            .await?
            .as_ref()
            .map(ShortBooking::from);
        view.next_booking = self
            .storage
            .next_booking_for_item(view.item.id, now)
            .await?
            .as_ref()
            .map(ShortBooking::from);
        Ok(())
    }
}
