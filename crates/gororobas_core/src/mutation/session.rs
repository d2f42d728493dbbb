//! Session capability bound to one store client.

use super::{AuthorizationError, SessionCapability, StoreClient};
use crate::model::field::EntityId;
use std::time::{SystemTime, UNIX_EPOCH};

/// Session issued by the authentication collaborator for one request.
///
/// Valid while the principal is set and `now < expires_at_ms`.
#[derive(Debug)]
pub struct BoundSession<C> {
    principal: EntityId,
    expires_at_ms: i64,
    client: C,
}

impl<C: StoreClient> BoundSession<C> {
    pub fn new(principal: EntityId, expires_at_ms: i64, client: C) -> Self {
        Self {
            principal,
            expires_at_ms,
            client,
        }
    }

    pub fn principal(&self) -> EntityId {
        self.principal
    }

    pub fn expires_at_ms(&self) -> i64 {
        self.expires_at_ms
    }

    /// Authorization check against an explicit clock reading.
    pub fn authorize_at(&self, now_ms: i64) -> Result<(), AuthorizationError> {
        if self.principal.is_nil() {
            return Err(AuthorizationError::NotSignedIn);
        }
        if now_ms >= self.expires_at_ms {
            return Err(AuthorizationError::Expired {
                expires_at_ms: self.expires_at_ms,
            });
        }
        Ok(())
    }

    /// Gives the client back once the request is over.
    pub fn into_client(self) -> C {
        self.client
    }
}

impl<C: StoreClient> SessionCapability for BoundSession<C> {
    type Client = C;

    fn authorize(&self) -> Result<(), AuthorizationError> {
        self.authorize_at(now_epoch_ms())
    }

    fn client(&mut self) -> &mut C {
        &mut self.client
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::BoundSession;
    use crate::changeset::ChangeSet;
    use crate::model::field::{EntityId, EntityKind};
    use crate::mutation::{AuthorizationError, StoreClient, StoreError};
    use uuid::Uuid;

    struct NullStore;

    impl StoreClient for NullStore {
        fn update_fields(&mut self, _id: EntityId, _changes: &ChangeSet) -> Result<(), StoreError> {
            Ok(())
        }

        fn delete_entities(
            &mut self,
            _kind: EntityKind,
            _ids: &[EntityId],
        ) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    #[test]
    fn nil_principal_is_not_signed_in() {
        let session = BoundSession::new(Uuid::nil(), i64::MAX, NullStore);
        assert_eq!(
            session.authorize_at(0),
            Err(AuthorizationError::NotSignedIn)
        );
    }

    #[test]
    fn expiry_is_exclusive() {
        let session = BoundSession::new(Uuid::new_v4(), 1_000, NullStore);
        assert!(session.authorize_at(999).is_ok());
        assert_eq!(
            session.authorize_at(1_000),
            Err(AuthorizationError::Expired {
                expires_at_ms: 1_000
            })
        );
    }
}
