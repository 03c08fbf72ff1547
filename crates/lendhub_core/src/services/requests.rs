//! crates/lendhub_core/src/services/requests.rs
//!
//! The request board. Requests are immutable once created; the list of
//! catalog items fulfilling a request is resolved at read time from the
//! items' back-references, never stored.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::domain::{Item, ItemRequest, NewRequest, Page, RequestView};
use crate::ports::{PortError, PortResult, Storage};
use crate::services::require_user;

#[derive(Clone)]
pub struct RequestService {
    storage: Arc<dyn Storage>,
}

impl RequestService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(&self, user_id: i64, new: NewRequest) -> PortResult<RequestView> {
        require_user(self.storage.as_ref(), user_id).await?;
        let request = self
            .storage
            .create_request(user_id, &new.description, Utc::now())
            .await?;
        debug!(request_id = request.id, user_id, "request created");
        Ok(RequestView {
            request,
            items: Vec::new(),
        })
    }

    /// The caller's own requests, newest first, with fulfilling items.
    pub async fn get_own(&self, user_id: i64) -> PortResult<Vec<RequestView>> {
        require_user(self.storage.as_ref(), user_id).await?;
        let requests = self.storage.list_requests_by_user(user_id).await?;
        self.with_items(requests).await
    }

    /// Everyone else's requests, newest first, with fulfilling items.
    pub async fn get_others(&self, user_id: i64, page: Page) -> PortResult<Vec<RequestView>> {
        require_user(self.storage.as_ref(), user_id).await?;
        let requests = self
            .storage
            .list_requests_excluding_user(user_id, page)
            .await?;
        self.with_items(requests).await
    }

    pub async fn get_by_id(&self, request_id: i64, user_id: i64) -> PortResult<RequestView> {
        require_user(self.storage.as_ref(), user_id).await?;
        let request = self
            .storage
            .find_request(request_id)
            .await?
            .ok_or_else(|| PortError::not_found("request", request_id))?;
        let items = self.storage.list_items_by_request(request_id).await?;
        Ok(RequestView { request, items })
    }

    /// Resolves fulfilling items for a whole listing with one grouped query.
    async fn with_items(&self, requests: Vec<ItemRequest>) -> PortResult<Vec<RequestView>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_request: HashMap<i64, Vec<Item>> = HashMap::new();
        for item in self.storage.list_items_with_request().await? {
            if let Some(request_id) = item.request_id {
                by_request.entry(request_id).or_default().push(item);
            }
        }

        Ok(requests
            .into_iter()
            .map(|request| {
                let items = by_request.remove(&request.id).unwrap_or_default();
                RequestView { request, items }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewItem, NewUser};
    use crate::services::memory::MemoryStorage;

    struct Fixture {
        service: RequestService,
        storage: Arc<MemoryStorage>,
        asker: i64,
        lister: i64,
    }

    async fn fixture() -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let asker = storage
            .create_user(&NewUser {
                name: "asker".into(),
                email: "asker@example.com".into(),
            })
            .await
            .unwrap();
        let lister = storage
            .create_user(&NewUser {
                name: "lister".into(),
                email: "lister@example.com".into(),
            })
            .await
            .unwrap();
        Fixture {
            service: RequestService::new(storage.clone()),
            storage,
            asker: asker.id,
            lister: lister.id,
        }
    }

    #[tokio::test]
    async fn create_requires_an_existing_user() {
        let f = fixture().await;
        let err = f
            .service
            .create(
                9999,
                NewRequest {
                    description: "need a drill".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn own_requests_carry_their_fulfilling_items() {
        let f = fixture().await;
        let view = f
            .service
            .create(
                f.asker,
                NewRequest {
                    description: "need a drill".into(),
                },
            )
            .await
            .unwrap();

        // Another user lists an item against the request.
        let item = f
            .storage
            .create_item(
                f.lister,
                &NewItem {
                    name: "Drill".into(),
                    description: "cordless".into(),
                    available: true,
                    request_id: Some(view.request.id),
                },
            )
            .await
            .unwrap();

        let own = f.service.get_own(f.asker).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].request.id, view.request.id);
        assert_eq!(own[0].items, vec![item]);
    }

    #[tokio::test]
    async fn unanswered_requests_have_an_empty_item_list() {
        let f = fixture().await;
        f.service
            .create(
                f.asker,
                NewRequest {
                    description: "need a tent".into(),
                },
            )
            .await
            .unwrap();

        let own = f.service.get_own(f.asker).await.unwrap();
        assert_eq!(own.len(), 1);
        assert!(own[0].items.is_empty());
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_exclude_the_caller_for_others() {
        let f = fixture().await;
        let first = f
            .service
            .create(
                f.asker,
                NewRequest {
                    description: "need a drill".into(),
                },
            )
            .await
            .unwrap();
        let second = f
            .service
            .create(
                f.asker,
                NewRequest {
                    description: "need a ladder".into(),
                },
            )
            .await
            .unwrap();
        f.service
            .create(
                f.lister,
                NewRequest {
                    description: "need a saw".into(),
                },
            )
            .await
            .unwrap();

        let own = f.service.get_own(f.asker).await.unwrap();
        let ids: Vec<i64> = own.iter().map(|v| v.request.id).collect();
        assert_eq!(ids, vec![second.request.id, first.request.id]);

        let others = f.service.get_others(f.lister, Page::none()).await.unwrap();
        let ids: Vec<i64> = others.iter().map(|v| v.request.id).collect();
        assert_eq!(ids, vec![second.request.id, first.request.id]);

        let none_foreign = f.service.get_others(f.asker, Page::none()).await.unwrap();
        assert_eq!(none_foreign.len(), 1);
    }

    #[tokio::test]
    async fn get_by_id_resolves_items_and_rejects_unknown_ids() {
        let f = fixture().await;
        let view = f
            .service
            .create(
                f.asker,
                NewRequest {
                    description: "need a drill".into(),
                },
            )
            .await
            .unwrap();

        let found = f.service.get_by_id(view.request.id, f.lister).await.unwrap();
        assert_eq!(found.request.description, "need a drill");

        let err = f.service.get_by_id(9999, f.lister).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
